use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{CardId, Element, DECK_SIZE};
use super::config::BattleConfig;
use super::deck::Piles;

/// 每个基础元素一面护盾，只有“已架起/未架起”两种状态，不叠加。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shields {
    pub fire: bool,
    pub water: bool,
    pub ice: bool,
}

impl Shields {
    fn slot_mut(&mut self, element: Element) -> Option<&mut bool> {
        match element {
            Element::Fire => Some(&mut self.fire),
            Element::Water => Some(&mut self.water),
            Element::Ice => Some(&mut self.ice),
            Element::Chaos => None,
        }
    }

    pub fn is_armed(&self, element: Element) -> bool {
        match element {
            Element::Fire => self.fire,
            Element::Water => self.water,
            Element::Ice => self.ice,
            Element::Chaos => false,
        }
    }

    /// 架起护盾，返回是否是新架起的。混沌元素没有护盾。
    pub fn arm(&mut self, element: Element) -> bool {
        match self.slot_mut(element) {
            Some(slot) if !*slot => {
                *slot = true;
                true
            }
            _ => false,
        }
    }

    /// 消耗一面护盾，返回是否成功格挡。
    pub fn consume(&mut self, element: Element) -> bool {
        if !self.is_armed(element) {
            return false;
        }
        if let Some(slot) = self.slot_mut(element) {
            *slot = false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub hp: i32,
    pub max_hp: i32,
    pub mana: u32,
    #[serde(default)]
    pub shields: Shields,
}

impl Player {
    pub fn new(max_hp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mana: 0,
            shields: Shields::default(),
        }
    }

    /// 回复生命，不超过上限，返回实际回复量。
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Boss {
    pub hp: i32,
    pub max_hp: i32,
    pub resistant_to: Element,
}

impl Boss {
    pub fn new(max_hp: i32, resistant_to: Element) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            resistant_to,
        }
    }

    /// 计算本回合某元素造成的伤害：被抗性元素伤害减半（向下取整）。
    pub fn damage_after_resistance(&self, base: i32, element: Element) -> (i32, bool) {
        if element == self.resistant_to {
            (base.div_euclid(2), true)
        } else {
            (base, false)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player,
    Boss,
}

/// 固定容量的对战日志，满了之后丢弃最早的一行。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawBattleLog")]
pub struct BattleLog {
    capacity: usize,
    lines: VecDeque<String>,
}

/// 反序列化时的原始形态，转换时重新套用容量约束。
#[derive(Deserialize)]
struct RawBattleLog {
    capacity: usize,
    #[serde(default)]
    lines: VecDeque<String>,
}

impl From<RawBattleLog> for BattleLog {
    fn from(raw: RawBattleLog) -> Self {
        let mut log = BattleLog::new(raw.capacity);
        for line in raw.lines {
            log.push(line);
        }
        log
    }
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("card count is {actual}, expected {expected}")]
    CardCountMismatch { expected: usize, actual: usize },
    #[error("card {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("game_over flag and winner disagree")]
    OutcomeMismatch,
    #[error("hp {value} is outside 0..={max}")]
    HealthOutOfRange { value: i32, max: i32 },
}

/// 对战的完整状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleState {
    pub player: Player,
    pub boss: Boss,
    pub piles: Piles,
    /// 第一次开始回合前为 0。
    pub turn_number: u32,
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub log: BattleLog,
}

impl BattleState {
    pub fn new(config: &BattleConfig, piles: Piles, resistance: Element) -> Self {
        Self {
            player: Player::new(config.player_max_hp),
            boss: Boss::new(config.boss_max_hp, resistance),
            piles,
            turn_number: 0,
            game_over: false,
            winner: None,
            log: BattleLog::new(config.log_capacity),
        }
    }

    pub fn record(&mut self, line: impl Into<String>) {
        self.log.push(line);
    }

    pub fn is_finished(&self) -> bool {
        self.game_over
    }

    /// 检查胜负。Boss 先判定，双方同时倒下时玩家获胜；结果一旦确定不再改变。
    pub fn check_game_over(&mut self) -> Option<Winner> {
        if self.game_over {
            return self.winner;
        }

        if self.boss.hp <= 0 {
            self.boss.hp = 0;
            self.player.hp = self.player.hp.max(0);
            self.declare_winner(Winner::Player, "Boss defeated!");
        } else if self.player.hp <= 0 {
            self.player.hp = 0;
            self.declare_winner(Winner::Boss, "Player defeated!");
        }

        self.winner
    }

    fn declare_winner(&mut self, winner: Winner, line: &str) {
        self.game_over = true;
        self.winner = Some(winner);
        self.record(line);
        tracing::info!(turn = self.turn_number, ?winner, "battle finished");
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let total = self.piles.total();
        if total != DECK_SIZE {
            return Err(IntegrityError::CardCountMismatch {
                expected: DECK_SIZE,
                actual: total,
            });
        }

        let mut seen = HashSet::with_capacity(DECK_SIZE);
        for card in self.piles.iter_all() {
            if !seen.insert(card.id) {
                return Err(IntegrityError::DuplicateCardId { card_id: card.id });
            }
        }

        if self.game_over != self.winner.is_some() {
            return Err(IntegrityError::OutcomeMismatch);
        }

        for (value, max) in [
            (self.player.hp, self.player.max_hp),
            (self.boss.hp, self.boss.max_hp),
        ] {
            if value > max || (self.game_over && value < 0) {
                return Err(IntegrityError::HealthOutOfRange { value, max });
            }
        }

        Ok(())
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            turn: self.turn_number,
            player: PlayerView {
                hp: self.player.hp,
                max_hp: self.player.max_hp,
                mana: self.player.mana,
                shields: self.player.shields,
            },
            boss: BossView {
                hp: self.boss.hp,
                max_hp: self.boss.max_hp,
                resistant_to: self.boss.resistant_to,
            },
            hand: self.piles.hand.iter().map(|card| card.short_text()).collect(),
            draw_pile: self.piles.draw_pile.len(),
            discard_pile: self.piles.discard_pile.len(),
            log: self.log.lines().map(str::to_owned).collect(),
            game_over: self.game_over,
            winner: self.winner,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub hp: i32,
    pub max_hp: i32,
    pub mana: u32,
    pub shields: Shields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BossView {
    pub hp: i32,
    pub max_hp: i32,
    pub resistant_to: Element,
}

/// 给宿主层渲染用的只读快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleSnapshot {
    pub turn: u32,
    pub player: PlayerView,
    pub boss: BossView,
    pub hand: Vec<String>,
    pub draw_pile: usize,
    pub discard_pile: usize,
    pub log: Vec<String>,
    pub game_over: bool,
    pub winner: Option<Winner>,
}
