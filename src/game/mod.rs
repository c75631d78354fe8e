//! 对战核心逻辑模块（牌组、结算、回合状态机等）。

pub mod catalog;
pub mod config;
pub mod deck;
pub mod effects;
pub mod rules;
pub mod state;

pub use catalog::{build_deck, Card, CardId, CardKind, Element, CARD_COST, DECK_SIZE};
pub use config::{BattleConfig, ConfigError};
pub use deck::{DrawReport, Piles};
pub use effects::{apply_random_effect, resolve, EffectOutcome, EffectResolution, RandomEffect};
pub use rules::{BossAction, PlayOutcome, RuleEngine, RuleError, TurnStart};
pub use state::{
    BattleLog,
    BattleSnapshot,
    BattleState,
    Boss,
    BossView,
    IntegrityError,
    Player,
    PlayerView,
    Shields,
    Winner,
};
