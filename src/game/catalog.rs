use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 卡牌在整副牌中的唯一标识。
pub type CardId = u32;

/// 所有卡牌的统一法力消耗。
pub const CARD_COST: u32 = 5;
/// 元素攻击牌的基础伤害。
pub const BOLT_POWER: i32 = 12;
/// 每种卡牌的张数。
pub const COPIES_PER_CARD: usize = 5;
/// 整副牌的张数。
pub const DECK_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Ice,
    Chaos,
}

impl Element {
    /// Boss 抗性的候选集合。
    pub const ALL: [Element; 4] = [Element::Fire, Element::Water, Element::Ice, Element::Chaos];
    /// 可被护盾抵挡、也是 Boss 普通攻击使用的基础元素。
    pub const BASIC: [Element; 3] = [Element::Fire, Element::Water, Element::Ice];

    pub fn as_str(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Ice => "ice",
            Element::Chaos => "chaos",
        }
    }

    pub fn is_basic(self) -> bool {
        !matches!(self, Element::Chaos)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn random_basic<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::BASIC[rng.gen_range(0..Self::BASIC.len())]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Attack,
    Block,
    Draw,
    RandomEffect,
}

/// 对战中使用的卡牌，创建后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub kind: CardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    pub cost: u32,
    #[serde(default)]
    pub power: i32,
    pub description: String,
}

impl Card {
    pub fn new(
        id: CardId,
        name: impl Into<String>,
        kind: CardKind,
        element: Option<Element>,
        power: i32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            element,
            cost: CARD_COST,
            power,
            description: description.into(),
        }
    }

    pub fn bolt(id: CardId, element: Element) -> Self {
        let name = match element {
            Element::Fire => "Fire Bolt",
            Element::Water => "Water Bolt",
            Element::Ice => "Ice Bolt",
            Element::Chaos => "Chaos Bolt",
        };
        Self::new(
            id,
            name,
            CardKind::Attack,
            Some(element),
            BOLT_POWER,
            format!("Deal {element} damage to the boss."),
        )
    }

    pub fn ward(id: CardId, element: Element) -> Self {
        let name = match element {
            Element::Fire => "Fire Ward",
            Element::Water => "Water Ward",
            Element::Ice => "Ice Ward",
            Element::Chaos => "Chaos Ward",
        };
        Self::new(
            id,
            name,
            CardKind::Block,
            Some(element),
            0,
            format!("Block the next {element} attack."),
        )
    }

    pub fn quick_study(id: CardId) -> Self {
        Self::new(id, "Quick Study", CardKind::Draw, None, 0, "Draw 2 cards.")
    }

    pub fn chaos_rune(id: CardId) -> Self {
        Self::new(
            id,
            "Chaos Rune",
            CardKind::RandomEffect,
            Some(Element::Chaos),
            0,
            "Trigger a random effect.",
        )
    }

    /// 手牌展示用的短文本。
    pub fn short_text(&self) -> String {
        match self.element {
            Some(element) => format!("{} ({element})", self.name),
            None => self.name.clone(),
        }
    }
}

/// 构建固定的 40 张初始牌组（未洗牌）。
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    let mut next_id: CardId = 0;
    let mut next = || {
        next_id += 1;
        next_id
    };

    for _ in 0..COPIES_PER_CARD {
        deck.push(Card::bolt(next(), Element::Ice));
        deck.push(Card::bolt(next(), Element::Fire));
        deck.push(Card::bolt(next(), Element::Water));
    }

    for _ in 0..COPIES_PER_CARD {
        deck.push(Card::quick_study(next()));
    }

    for _ in 0..COPIES_PER_CARD {
        for element in Element::BASIC {
            deck.push(Card::ward(next(), element));
        }
    }

    for _ in 0..COPIES_PER_CARD {
        deck.push(Card::chaos_rune(next()));
    }

    deck
}
