use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    catalog::{build_deck, Card, Element},
    config::BattleConfig,
    deck::Piles,
    effects::{self, EffectResolution},
    state::{BattleState, Winner},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("Invalid card: index {index} is outside a hand of {hand_size}.")]
    InvalidCardIndex { index: isize, hand_size: usize },
    #[error("Not enough mana (need {required}, have {available}).")]
    InsufficientMana { required: u32, available: u32 },
    #[error("Game is already over.")]
    GameAlreadyOver,
}

/// 回合开始时的结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnStart {
    pub turn: u32,
    pub resistance: Element,
    pub drawn: usize,
    pub reshuffled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayOutcome {
    pub card: Card,
    pub resolution: EffectResolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl PlayOutcome {
    pub fn message(&self) -> &str {
        &self.resolution.message
    }
}

/// Boss 回合的行动。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BossAction {
    pub element: Element,
    pub damage: i32,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

/// 回合控制器，持有随机源和数值配置。
pub struct RuleEngine {
    config: BattleConfig,
    rng: SmallRng,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_config(BattleConfig::default(), SmallRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(BattleConfig::default(), SmallRng::seed_from_u64(seed))
    }

    pub fn with_config(config: BattleConfig, rng: SmallRng) -> Self {
        Self { config, rng }
    }

    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn ensure_integrity(state: &BattleState) {
        debug_assert!(
            state.integrity_check().is_ok(),
            "battle invariant violated: {:?}",
            state.integrity_check()
        );
    }

    pub fn new_battle(&mut self) -> BattleState {
        let piles = Piles::new(build_deck(), &mut self.rng);
        let resistance = Element::random(&mut self.rng);
        let mut state = BattleState::new(&self.config, piles, resistance);
        state.record(format!(
            "Battle begins: the boss has {} HP.",
            state.boss.max_hp
        ));
        tracing::debug!(boss_hp = state.boss.hp, %resistance, "battle created");
        Self::ensure_integrity(&state);
        state
    }

    /// 开始新回合：轮换 Boss 抗性并抽牌。对局结束后调用不做任何事。
    pub fn start_turn(&mut self, state: &mut BattleState) -> Option<TurnStart> {
        if state.is_finished() {
            return None;
        }

        state.turn_number += 1;
        let first_turn = state.turn_number == 1;

        let resistance = Element::random(&mut self.rng);
        state.boss.resistant_to = resistance;
        state.record(format!(
            "Turn {}: Boss resists {resistance} (50% damage).",
            state.turn_number
        ));

        let count = if first_turn {
            self.config.opening_hand.saturating_sub(state.piles.hand.len())
        } else {
            self.config.draw_per_turn
        };
        let report = state.piles.draw(count, &mut self.rng);
        let mut line = match report.drawn {
            1 => "Drew 1 card".to_string(),
            n => format!("Drew {n} cards"),
        };
        if report.reshuffled {
            line.push_str(" after reshuffling the discard pile");
        }
        line.push('.');
        state.record(line);

        tracing::debug!(
            turn = state.turn_number,
            %resistance,
            drawn = report.drawn,
            reshuffled = report.reshuffled,
            "turn started"
        );
        Self::ensure_integrity(state);

        Some(TurnStart {
            turn: state.turn_number,
            resistance,
            drawn: report.drawn,
            reshuffled: report.reshuffled,
        })
    }

    /// 答对闪卡时由外部调用，返回新的法力值。
    pub fn grant_mana(&self, state: &mut BattleState, amount: u32) -> Result<u32, RuleError> {
        if state.is_finished() {
            tracing::warn!("mana granted after the battle ended");
            return Err(RuleError::GameAlreadyOver);
        }
        state.player.mana = state.player.mana.saturating_add(amount);
        state.record(format!("Correct! +{amount} mana."));
        Ok(state.player.mana)
    }

    pub fn play_card(
        &mut self,
        state: &mut BattleState,
        hand_index: isize,
    ) -> Result<PlayOutcome, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameAlreadyOver);
        }

        let hand_size = state.piles.hand.len();
        let index = usize::try_from(hand_index)
            .ok()
            .filter(|&index| index < hand_size)
            .ok_or(RuleError::InvalidCardIndex {
                index: hand_index,
                hand_size,
            })?;

        let cost = state.piles.hand[index].cost;
        let available = state.player.mana;
        if available < cost {
            tracing::warn!(required = cost, available, "card rejected for lack of mana");
            return Err(RuleError::InsufficientMana {
                required: cost,
                available,
            });
        }

        state.player.mana -= cost;
        let card = state
            .piles
            .discard(index)
            .ok_or(RuleError::InvalidCardIndex {
                index: hand_index,
                hand_size,
            })?;

        let resolution = effects::resolve(&card, state, &self.config, &mut self.rng);
        let winner = state.check_game_over();

        tracing::debug!(
            card = %card.name,
            mana = state.player.mana,
            boss_hp = state.boss.hp,
            "card played"
        );
        Self::ensure_integrity(state);

        Ok(PlayOutcome {
            card,
            resolution,
            winner,
        })
    }

    /// 结束玩家回合，Boss 发动一次基础元素攻击。不会自动开始下一回合。
    pub fn end_turn_and_boss_acts(&mut self, state: &mut BattleState) -> Option<BossAction> {
        if state.is_finished() {
            return None;
        }

        let element = Element::random_basic(&mut self.rng);
        let blocked = state.player.shields.consume(element);
        let damage = if blocked { 0 } else { self.config.boss_damage };

        if blocked {
            state.record(format!("Boss casts {element}! Blocked by ward."));
        } else {
            state.player.hp -= damage;
            state.record(format!("Boss casts {element}! Player takes {damage}."));
        }

        let winner = state.check_game_over();
        tracing::debug!(%element, damage, blocked, player_hp = state.player.hp, "boss acted");
        Self::ensure_integrity(state);

        Some(BossAction {
            element,
            damage,
            blocked,
            winner,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::game::catalog::{CardKind, DECK_SIZE};

    fn started(seed: u64) -> (RuleEngine, BattleState) {
        let mut engine = RuleEngine::with_seed(seed);
        let mut state = engine.new_battle();
        engine.start_turn(&mut state).expect("first turn should start");
        (engine, state)
    }

    /// 把符合条件的一张牌从抽牌堆或弃牌堆换到手牌首位，保持总数不变。
    fn put_in_hand(state: &mut BattleState, pred: impl Fn(&Card) -> bool) {
        if let Some(pos) = state.piles.hand.iter().position(|card| pred(card)) {
            let card = state.piles.hand.remove(pos);
            state.piles.hand.insert(0, card);
            return;
        }
        let pos = state
            .piles
            .draw_pile
            .iter()
            .position(|card| pred(card))
            .expect("matching card should be in the draw pile");
        let card = state.piles.draw_pile.remove(pos);
        state.piles.hand.insert(0, card);
    }

    fn is_bolt(element: Element) -> impl Fn(&Card) -> bool {
        move |card: &Card| card.kind == CardKind::Attack && card.element == Some(element)
    }

    #[test]
    fn first_turn_draws_opening_hand() {
        let (_, state) = started(1);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.piles.hand.len(), 5);
        assert_eq!(state.piles.draw_pile.len(), DECK_SIZE - 5);
    }

    #[test]
    fn later_turns_draw_one_card() {
        let (mut engine, mut state) = started(2);
        let turn = engine.start_turn(&mut state).expect("second turn should start");
        assert_eq!(turn.turn, 2);
        assert_eq!(turn.drawn, 1);
        assert_eq!(state.piles.hand.len(), 6);
    }

    #[test]
    fn fire_bolt_against_fire_resistance_is_halved() {
        let (mut engine, mut state) = started(3);
        put_in_hand(&mut state, is_bolt(Element::Fire));
        state.boss.resistant_to = Element::Fire;
        state.player.mana = 5;

        let outcome = engine.play_card(&mut state, 0).expect("play should succeed");

        assert_eq!(state.player.mana, 0);
        assert_eq!(state.boss.hp, 84);
        assert_eq!(outcome.card.name, "Fire Bolt");
        assert!(state.piles.discard_pile.contains(&outcome.card));
        assert_eq!(state.piles.total(), DECK_SIZE);
    }

    #[test]
    fn invalid_index_leaves_state_unchanged() {
        let (mut engine, mut state) = started(4);
        state.player.mana = 10;
        let before = state.clone();
        let len = state.piles.hand.len() as isize;

        for index in [-1, len] {
            let err = engine
                .play_card(&mut state, index)
                .expect_err("out of range index should fail");
            assert!(matches!(err, RuleError::InvalidCardIndex { .. }));
        }
        assert_eq!(state, before);
    }

    #[test]
    fn insufficient_mana_is_rejected() {
        let (mut engine, mut state) = started(5);
        state.player.mana = 4;
        let before = state.clone();

        let err = engine.play_card(&mut state, 0).expect_err("4 mana is not enough");

        assert_eq!(
            err,
            RuleError::InsufficientMana {
                required: 5,
                available: 4
            }
        );
        assert_eq!(state, before);
    }

    /// Boss 下一次攻击的元素：克隆随机源预演一次抽取，不影响引擎本身。
    fn next_boss_element(engine: &mut RuleEngine) -> Element {
        Element::random_basic(&mut engine.rng_mut().clone())
    }

    /// 找到一个开局后 Boss 第一击满足条件的种子。
    fn started_with_boss_roll(pred: impl Fn(Element) -> bool) -> (RuleEngine, BattleState) {
        (0..1_000)
            .map(started)
            .find_map(|(mut engine, state)| {
                pred(next_boss_element(&mut engine)).then_some((engine, state))
            })
            .expect("some seed should produce the wanted boss roll")
    }

    #[test]
    fn water_shield_blocks_water_attack() {
        let (mut engine, mut state) = started_with_boss_roll(|e| e == Element::Water);
        state.player.shields.water = true;

        let action = engine
            .end_turn_and_boss_acts(&mut state)
            .expect("boss should act");

        assert_eq!(action.element, Element::Water);
        assert!(action.blocked);
        assert_eq!(action.damage, 0);
        assert_eq!(state.player.hp, 60);
        assert!(!state.player.shields.water);
        assert!(!state.player.shields.fire);
        assert!(!state.player.shields.ice);
        assert_eq!(state.log.last(), Some("Boss casts water! Blocked by ward."));
    }

    #[test]
    fn block_consumes_only_the_matching_shield() {
        let (mut engine, mut state) = started_with_boss_roll(|e| e == Element::Water);
        state.player.shields.water = true;
        state.player.shields.ice = true;

        let action = engine
            .end_turn_and_boss_acts(&mut state)
            .expect("boss should act");

        assert!(action.blocked);
        assert!(!state.player.shields.water);
        assert!(state.player.shields.ice, "unrelated shield must stay armed");
        assert!(!state.player.shields.fire);
    }

    #[test]
    fn mismatched_shield_survives_the_attack() {
        let (mut engine, mut state) = started_with_boss_roll(|e| e != Element::Water);
        state.player.shields.water = true;

        let action = engine
            .end_turn_and_boss_acts(&mut state)
            .expect("boss should act");

        assert_ne!(action.element, Element::Water);
        assert!(!action.blocked);
        assert_eq!(action.damage, 10);
        assert_eq!(state.player.hp, 50);
        assert!(state.player.shields.water);
    }

    #[test]
    fn resistance_can_be_chaos_but_boss_never_casts_it() {
        let config = BattleConfig {
            player_max_hp: 100_000,
            ..BattleConfig::default()
        };
        let mut engine = RuleEngine::with_config(config, SmallRng::seed_from_u64(77));
        let mut state = engine.new_battle();
        let mut resistances = HashSet::new();
        let mut attacks = HashSet::new();

        for _ in 0..400 {
            let turn = engine.start_turn(&mut state).expect("battle should continue");
            resistances.insert(turn.resistance);
            let action = engine
                .end_turn_and_boss_acts(&mut state)
                .expect("boss should act");
            attacks.insert(action.element);
        }

        assert_eq!(resistances.len(), Element::ALL.len());
        assert!(resistances.contains(&Element::Chaos));
        assert!(!attacks.contains(&Element::Chaos));
        assert_eq!(attacks.len(), Element::BASIC.len());
    }

    #[test]
    fn unshielded_player_takes_boss_damage() {
        let (mut engine, mut state) = started(7);

        let action = engine
            .end_turn_and_boss_acts(&mut state)
            .expect("boss should act");

        assert!(!action.blocked);
        assert!(action.element.is_basic());
        assert_eq!(state.player.hp, 50);
    }

    #[test]
    fn lethal_attack_ends_the_game() {
        let (mut engine, mut state) = started(8);
        put_in_hand(&mut state, is_bolt(Element::Ice));
        state.boss.resistant_to = Element::Fire;
        state.boss.hp = 5;
        state.player.mana = 5;

        let outcome = engine.play_card(&mut state, 0).expect("play should succeed");

        assert_eq!(outcome.winner, Some(Winner::Player));
        assert!(state.game_over);
        assert_eq!(state.boss.hp, 0);
    }

    #[test]
    fn finished_game_ignores_every_operation() {
        let (mut engine, mut state) = started(9);
        state.player.hp = 10;
        engine.end_turn_and_boss_acts(&mut state);
        assert_eq!(state.winner, Some(Winner::Boss));
        state.player.mana = 50;
        let before = state.clone();

        assert_eq!(engine.play_card(&mut state, 0), Err(RuleError::GameAlreadyOver));
        assert_eq!(engine.grant_mana(&mut state, 3), Err(RuleError::GameAlreadyOver));
        assert!(engine.end_turn_and_boss_acts(&mut state).is_none());
        assert!(engine.start_turn(&mut state).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn grant_mana_accumulates() {
        let (engine, mut state) = started(10);
        assert_eq!(engine.grant_mana(&mut state, 3), Ok(3));
        assert_eq!(engine.grant_mana(&mut state, 3), Ok(6));
        assert_eq!(state.log.last(), Some("Correct! +3 mana."));
    }

    #[test]
    fn same_seed_replays_identically() {
        let (_, a) = started(42);
        let (_, b) = started(42);
        assert_eq!(a, b);
    }
}
