pub mod game;
pub mod session;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub use game::{
    build_deck, BattleConfig, BattleSnapshot, BattleState, BossAction, Card, CardKind,
    ConfigError, EffectOutcome, EffectResolution, Element, PlayOutcome, RandomEffect, RuleEngine,
    RuleError, Winner,
};
pub use session::{
    normalize_answer, BattleSession, Flashcard, SessionConfig, SessionError, SessionPhase,
    SessionSnapshot,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    serde_json::to_string(&error)
        .map(|json| JsValue::from_str(&json))
        .unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

/// 宿主（浏览器）持有的一局游戏。
#[wasm_bindgen]
pub struct ManaBossGame {
    session: BattleSession,
}

#[wasm_bindgen]
impl ManaBossGame {
    #[wasm_bindgen(constructor)]
    pub fn new(
        flashcards_json: Option<String>,
        config_json: Option<String>,
        seed: Option<u32>,
    ) -> Result<ManaBossGame, JsValue> {
        let cards: Vec<Flashcard> = match flashcards_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => Vec::new(),
        };
        let config = match config_json {
            Some(json) => BattleConfig::from_json(&json).map_err(serde_to_js_error)?,
            None => BattleConfig::default(),
        };
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(u64::from(seed)),
            None => SmallRng::from_entropy(),
        };

        let message = format!("Mana Boss: new battle with {} flashcards.", cards.len());
        web_sys::console::log_1(&message.into());

        let engine = RuleEngine::with_config(config, rng);
        let session = BattleSession::new(cards, engine, SessionConfig::default());

        Ok(ManaBossGame { session })
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.snapshot()).map_err(JsValue::from)
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot())
    }

    pub fn submit_answer(&mut self, answer: &str) -> Result<bool, JsValue> {
        self.session.submit_answer(answer).map_err(to_js_error)
    }

    pub fn play_card(&mut self, hand_index: i32) -> Result<String, JsValue> {
        let outcome = self
            .session
            .play_card(hand_index as isize)
            .map_err(to_js_error)?;
        to_json(&outcome)
    }

    pub fn end_turn(&mut self) -> Result<String, JsValue> {
        let action = self.session.end_turn().map_err(to_js_error)?;
        to_json(&action)
    }
}

/// 返回未洗牌的 40 张标准牌组，供前端展示图鉴。
#[wasm_bindgen(js_name = "buildDeck")]
pub fn build_deck_js() -> Result<JsValue, JsValue> {
    to_value(&build_deck()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "normalizeAnswer")]
pub fn normalize_answer_js(text: &str) -> String {
    normalize_answer(text)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
