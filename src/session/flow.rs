use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flashcards::{Flashcard, FlashcardCycler};
use crate::game::{BattleSnapshot, BattleState, BossAction, PlayOutcome, RuleEngine, RuleError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub questions_per_turn: u32,
    pub mana_per_answer: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            questions_per_turn: 3,
            mana_per_answer: 3,
        }
    }
}

/// 会话阶段：先答题攒法力，再出牌，直到分出胜负。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Questions,
    Play,
    GameOver,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Questions => "questions",
            SessionPhase::Play => "play",
            SessionPhase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Error)]
#[serde(tag = "type", content = "detail")]
pub enum SessionError {
    #[error("Not allowed during the {actual} phase (expected {expected}).")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub questions_left: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub message: String,
    pub battle: BattleSnapshot,
}

/// 一局完整游戏：闪卡答题换法力，再驱动对战引擎。
pub struct BattleSession {
    engine: RuleEngine,
    state: BattleState,
    cycler: FlashcardCycler,
    config: SessionConfig,
    phase: SessionPhase,
    questions_left: u32,
    current: Option<Flashcard>,
    message: String,
}

impl BattleSession {
    pub fn new(cards: Vec<Flashcard>, mut engine: RuleEngine, config: SessionConfig) -> Self {
        let mut state = engine.new_battle();
        engine.start_turn(&mut state);

        let mut cycler = FlashcardCycler::new(cards, engine.rng_mut());
        let current = cycler.next(engine.rng_mut());
        let message = format!(
            "Answer {} questions to gain mana (+{} each correct).",
            config.questions_per_turn, config.mana_per_answer
        );

        let mut session = Self {
            engine,
            state,
            cycler,
            phase: SessionPhase::Questions,
            questions_left: config.questions_per_turn,
            current,
            message,
            config,
        };
        if session.questions_left == 0 {
            session.phase = SessionPhase::Play;
        }
        session
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current.as_ref().map(|card| card.front.as_str())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn ensure_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// 提交当前问题的答案，返回是否答对。
    pub fn submit_answer(&mut self, answer: &str) -> Result<bool, SessionError> {
        self.ensure_phase(SessionPhase::Questions)?;

        let correct = match &self.current {
            None => {
                self.message = "No questions available.".to_string();
                false
            }
            Some(card) if card.is_correct(answer) => {
                let amount = self.config.mana_per_answer;
                self.engine.grant_mana(&mut self.state, amount)?;
                self.message = format!("Correct! +{amount} mana.");
                true
            }
            Some(_) => {
                self.state.record("Wrong. +0 mana.");
                self.message = "Wrong. +0 mana.".to_string();
                false
            }
        };

        self.questions_left = self.questions_left.saturating_sub(1);
        if self.questions_left == 0 {
            self.phase = SessionPhase::Play;
            self.message.push_str(" Now you can play cards.");
        } else {
            self.current = self.cycler.next(self.engine.rng_mut());
        }

        Ok(correct)
    }

    pub fn play_card(&mut self, hand_index: isize) -> Result<PlayOutcome, SessionError> {
        self.ensure_phase(SessionPhase::Play)?;

        match self.engine.play_card(&mut self.state, hand_index) {
            Ok(outcome) => {
                self.message = outcome.message().to_string();
                if self.state.is_finished() {
                    self.phase = SessionPhase::GameOver;
                }
                Ok(outcome)
            }
            Err(error) => {
                self.message = error.to_string();
                Err(error.into())
            }
        }
    }

    /// Boss 行动；对局未结束时立即开始下一回合并回到答题阶段。
    pub fn end_turn(&mut self) -> Result<BossAction, SessionError> {
        self.ensure_phase(SessionPhase::Play)?;

        let action = self
            .engine
            .end_turn_and_boss_acts(&mut self.state)
            .ok_or(RuleError::GameAlreadyOver)?;

        if self.state.is_finished() {
            self.phase = SessionPhase::GameOver;
            self.message = "Game over.".to_string();
            return Ok(action);
        }

        self.engine.start_turn(&mut self.state);
        self.questions_left = self.config.questions_per_turn;
        self.phase = if self.questions_left == 0 {
            SessionPhase::Play
        } else {
            SessionPhase::Questions
        };
        self.current = self.cycler.next(self.engine.rng_mut());
        self.message = "New turn: answer questions to gain mana.".to_string();
        Ok(action)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            questions_left: self.questions_left,
            question: match self.phase {
                SessionPhase::Questions => self.current_question().map(str::to_owned),
                _ => None,
            },
            message: self.message.clone(),
            battle: self.state.snapshot(),
        }
    }
}
