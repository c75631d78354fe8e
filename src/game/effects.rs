use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::{Card, CardKind, Element};
use super::config::BattleConfig;
use super::state::BattleState;

/// 混沌符文可能触发的五种效果，等概率抽取。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RandomEffect {
    Heal,
    Mana,
    ChaosBolt,
    Draw,
    Ward,
}

impl RandomEffect {
    pub const ALL: [RandomEffect; 5] = [
        RandomEffect::Heal,
        RandomEffect::Mana,
        RandomEffect::ChaosBolt,
        RandomEffect::Draw,
        RandomEffect::Ward,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for RandomEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RandomEffect::Heal => "heal",
            RandomEffect::Mana => "mana",
            RandomEffect::ChaosBolt => "chaos bolt",
            RandomEffect::Draw => "draw",
            RandomEffect::Ward => "ward",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EffectOutcome {
    Damage {
        amount: i32,
        element: Element,
        resisted: bool,
    },
    ShieldArmed {
        element: Element,
        newly_armed: bool,
    },
    CardsDrawn {
        requested: usize,
        drawn: usize,
        reshuffled: bool,
    },
    Healed {
        amount: i32,
    },
    ManaGained {
        amount: u32,
    },
    /// 卡牌缺少结算所需的元素。
    Fizzled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectResolution {
    pub message: String,
    pub outcome: EffectOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled: Option<RandomEffect>,
}

impl EffectResolution {
    fn new(message: String, outcome: EffectOutcome) -> Self {
        Self {
            message,
            outcome,
            rolled: None,
        }
    }
}

fn strike(state: &mut BattleState, base: i32, element: Element) -> (i32, EffectOutcome) {
    let (amount, resisted) = state.boss.damage_after_resistance(base, element);
    state.boss.hp -= amount;
    (
        amount,
        EffectOutcome::Damage {
            amount,
            element,
            resisted,
        },
    )
}

fn draw_cards<R: Rng + ?Sized>(
    state: &mut BattleState,
    count: usize,
    rng: &mut R,
) -> (String, EffectOutcome) {
    let report = state.piles.draw(count, rng);
    let mut message = match report.drawn {
        1 => "Drew 1 card".to_string(),
        n => format!("Drew {n} cards"),
    };
    if report.reshuffled {
        message.push_str(" (reshuffled discard into draw pile)");
    }
    message.push('.');
    (
        message,
        EffectOutcome::CardsDrawn {
            requested: count,
            drawn: report.drawn,
            reshuffled: report.reshuffled,
        },
    )
}

fn arm_shield(state: &mut BattleState, element: Element) -> EffectOutcome {
    let newly_armed = state.player.shields.arm(element);
    EffectOutcome::ShieldArmed {
        element,
        newly_armed,
    }
}

/// 结算混沌符文的某个具体效果。
pub fn apply_random_effect<R: Rng + ?Sized>(
    effect: RandomEffect,
    state: &mut BattleState,
    config: &BattleConfig,
    rng: &mut R,
) -> EffectResolution {
    let (message, outcome) = match effect {
        RandomEffect::Heal => {
            let amount = state.player.heal(config.heal_amount);
            (
                format!("Chaos Rune: healed player for {amount}."),
                EffectOutcome::Healed { amount },
            )
        }
        RandomEffect::Mana => {
            let amount = config.mana_bonus;
            state.player.mana = state.player.mana.saturating_add(amount);
            (
                format!("Chaos Rune: gained {amount} mana."),
                EffectOutcome::ManaGained { amount },
            )
        }
        RandomEffect::ChaosBolt => {
            let (amount, outcome) = strike(state, config.chaos_damage, Element::Chaos);
            let message = if matches!(outcome, EffectOutcome::Damage { resisted: true, .. }) {
                format!("Chaos Rune: boss resisted chaos, dealt {amount} damage.")
            } else {
                format!("Chaos Rune: dealt {amount} chaos damage.")
            };
            (message, outcome)
        }
        RandomEffect::Draw => {
            let (drawn, outcome) = draw_cards(state, 1, rng);
            (format!("Chaos Rune: {drawn}"), outcome)
        }
        RandomEffect::Ward => {
            let element = Element::random_basic(rng);
            let outcome = arm_shield(state, element);
            (
                format!("Chaos Rune: {element} shield prepared."),
                outcome,
            )
        }
    };

    EffectResolution {
        message,
        outcome,
        rolled: Some(effect),
    }
}

/// 结算一张已打出的牌，并写入恰好一行日志。
pub fn resolve<R: Rng + ?Sized>(
    card: &Card,
    state: &mut BattleState,
    config: &BattleConfig,
    rng: &mut R,
) -> EffectResolution {
    let resolution = match (card.kind, card.element) {
        (CardKind::Attack, Some(element)) => {
            let (amount, outcome) = strike(state, card.power, element);
            let message = if matches!(outcome, EffectOutcome::Damage { resisted: true, .. }) {
                format!("Boss resisted {element}! {} hits for {amount}.", card.name)
            } else {
                format!("{} hits boss for {amount}.", card.name)
            };
            EffectResolution::new(message, outcome)
        }
        (CardKind::Block, Some(element)) if element.is_basic() => {
            let outcome = arm_shield(state, element);
            EffectResolution::new(
                format!("Shield prepared: block next {element} attack."),
                outcome,
            )
        }
        (CardKind::Draw, _) => {
            let (message, outcome) = draw_cards(state, config.draw_card_count, rng);
            EffectResolution::new(message, outcome)
        }
        (CardKind::RandomEffect, _) => {
            let effect = RandomEffect::random(rng);
            apply_random_effect(effect, state, config, rng)
        }
        (CardKind::Attack | CardKind::Block, _) => EffectResolution::new(
            format!("{} fizzled.", card.name),
            EffectOutcome::Fizzled,
        ),
    };

    state.record(resolution.message.clone());
    resolution
}
