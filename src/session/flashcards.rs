use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 一张问答闪卡。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        normalize_answer(answer) == normalize_answer(&self.back)
    }
}

/// 忽略大小写、首尾空白，并把连续空白压成一个空格。
pub fn normalize_answer(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 按随机顺序循环出题，一轮出完后重新洗序。
#[derive(Debug, Clone)]
pub struct FlashcardCycler {
    cards: Vec<Flashcard>,
    order: Vec<usize>,
    pos: usize,
}

impl FlashcardCycler {
    pub fn new<R: Rng + ?Sized>(cards: Vec<Flashcard>, rng: &mut R) -> Self {
        let mut cycler = Self {
            order: (0..cards.len()).collect(),
            cards,
            pos: 0,
        };
        cycler.order.shuffle(rng);
        cycler
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Flashcard> {
        if self.cards.is_empty() {
            return None;
        }
        if self.pos >= self.order.len() {
            self.order.shuffle(rng);
            self.pos = 0;
        }
        let card = self
            .order
            .get(self.pos)
            .and_then(|&index| self.cards.get(index))
            .cloned();
        self.pos += 1;
        card
    }
}
