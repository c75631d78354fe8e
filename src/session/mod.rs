//! 闪卡答题驱动的对局会话层（答题、出牌、Boss 回合的阶段流转）。

pub mod flashcards;
pub mod flow;

pub use flashcards::{normalize_answer, Flashcard, FlashcardCycler};
pub use flow::{BattleSession, SessionConfig, SessionError, SessionPhase, SessionSnapshot};
