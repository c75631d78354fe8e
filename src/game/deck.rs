use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::Card;

/// 一次抽牌的结果。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawReport {
    pub drawn: usize,
    pub reshuffled: bool,
}

/// 抽牌堆、手牌与弃牌堆，三者共同持有同一副牌。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Piles {
    /// 牌顶在末尾。
    pub draw_pile: Vec<Card>,
    pub hand: Vec<Card>,
    pub discard_pile: Vec<Card>,
}

impl Piles {
    pub fn new<R: Rng + ?Sized>(mut deck: Vec<Card>, rng: &mut R) -> Self {
        deck.shuffle(rng);
        Self {
            draw_pile: deck,
            hand: Vec::new(),
            discard_pile: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.draw_pile.len() + self.hand.len() + self.discard_pile.len()
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile
            .iter()
            .chain(self.hand.iter())
            .chain(self.discard_pile.iter())
    }

    fn reshuffle_discard<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.draw_pile.append(&mut self.discard_pile);
        self.draw_pile.shuffle(rng);
    }

    /// 从抽牌堆抽至多 `count` 张牌到手牌。
    ///
    /// 抽牌堆耗尽时会把弃牌堆整体洗回，每次调用最多一次；两堆都空时少抽不报错。
    pub fn draw<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> DrawReport {
        let mut report = DrawReport::default();
        for _ in 0..count {
            if self.draw_pile.is_empty() {
                if report.reshuffled || self.discard_pile.is_empty() {
                    break;
                }
                self.reshuffle_discard(rng);
                report.reshuffled = true;
            }

            match self.draw_pile.pop() {
                Some(card) => {
                    self.hand.push(card);
                    report.drawn += 1;
                }
                None => break,
            }
        }
        report
    }

    /// 把手牌中指定位置的牌移入弃牌堆，返回该牌的副本。
    pub fn discard(&mut self, hand_index: usize) -> Option<Card> {
        if hand_index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(hand_index);
        self.discard_pile.push(card.clone());
        Some(card)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::game::catalog::{build_deck, DECK_SIZE};

    fn piles(seed: u64) -> (Piles, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let piles = Piles::new(build_deck(), &mut rng);
        (piles, rng)
    }

    #[test]
    fn new_piles_hold_the_whole_deck_in_draw_pile() {
        let (piles, _) = piles(1);
        assert_eq!(piles.draw_pile.len(), DECK_SIZE);
        assert!(piles.hand.is_empty());
        assert!(piles.discard_pile.is_empty());
    }

    #[test]
    fn draw_takes_from_the_top() {
        let (mut piles, mut rng) = piles(2);
        let top = piles.draw_pile.last().cloned().expect("deck should not be empty");

        let report = piles.draw(3, &mut rng);

        assert_eq!(report, DrawReport { drawn: 3, reshuffled: false });
        assert_eq!(piles.hand.first(), Some(&top));
        assert_eq!(piles.total(), DECK_SIZE);
    }

    #[test]
    fn empty_draw_pile_reshuffles_discard_once() {
        let (mut piles, mut rng) = piles(3);
        piles.draw(DECK_SIZE, &mut rng);
        for _ in 0..10 {
            piles.discard(0).expect("hand should have cards");
        }
        assert!(piles.draw_pile.is_empty());

        let report = piles.draw(4, &mut rng);

        assert!(report.reshuffled);
        assert_eq!(report.drawn, 4);
        assert!(piles.discard_pile.is_empty(), "discard should be emptied by reshuffle");
        assert_eq!(piles.draw_pile.len(), 6);
        assert_eq!(piles.total(), DECK_SIZE);
    }

    #[test]
    fn drawing_with_both_piles_empty_yields_fewer_cards() {
        let (mut piles, mut rng) = piles(4);
        piles.draw(DECK_SIZE - 2, &mut rng);

        let report = piles.draw(5, &mut rng);

        assert_eq!(report, DrawReport { drawn: 2, reshuffled: false });
        assert_eq!(piles.hand.len(), DECK_SIZE);
        assert_eq!(piles.draw(1, &mut rng).drawn, 0);
    }

    #[test]
    fn discard_moves_card_out_of_hand() {
        let (mut piles, mut rng) = piles(5);
        piles.draw(2, &mut rng);
        let expected = piles.hand[1].clone();

        let card = piles.discard(1).expect("index 1 should be valid");

        assert_eq!(card, expected);
        assert_eq!(piles.hand.len(), 1);
        assert_eq!(piles.discard_pile, vec![expected]);
        assert!(piles.discard(5).is_none());
        assert_eq!(piles.total(), DECK_SIZE);
    }
}
