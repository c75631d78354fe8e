use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::DECK_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid battle config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid battle config: `{field}` {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// 对战数值配置，JSON 中缺省的字段使用默认值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BattleConfig {
    pub player_max_hp: i32,
    pub boss_max_hp: i32,
    pub boss_damage: i32,
    /// 第一回合补到的手牌数。
    pub opening_hand: usize,
    pub draw_per_turn: usize,
    pub draw_card_count: usize,
    pub heal_amount: i32,
    pub mana_bonus: u32,
    pub chaos_damage: i32,
    pub log_capacity: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            player_max_hp: 60,
            boss_max_hp: 90,
            boss_damage: 10,
            opening_hand: 5,
            draw_per_turn: 1,
            draw_card_count: 2,
            heal_amount: 8,
            mana_bonus: 5,
            chaos_damage: 16,
            log_capacity: 8,
        }
    }
}

impl BattleConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_max_hp <= 0 {
            return Err(ConfigError::Invalid {
                field: "player_max_hp",
                reason: "must be positive",
            });
        }
        if self.boss_max_hp <= 0 {
            return Err(ConfigError::Invalid {
                field: "boss_max_hp",
                reason: "must be positive",
            });
        }
        if self.boss_damage < 0 || self.heal_amount < 0 || self.chaos_damage < 0 {
            return Err(ConfigError::Invalid {
                field: "boss_damage/heal_amount/chaos_damage",
                reason: "must not be negative",
            });
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "log_capacity",
                reason: "must hold at least one line",
            });
        }
        if self.opening_hand > DECK_SIZE {
            return Err(ConfigError::Invalid {
                field: "opening_hand",
                reason: "cannot exceed the deck size",
            });
        }
        Ok(())
    }
}
