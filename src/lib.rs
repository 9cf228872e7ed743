//! Whack-a-Bruin core crate.
//!
//! A grid of holes spawns bruins (whack them for points) and bombs (whacking
//! one costs points) until the countdown runs out. The gameplay state machine
//! lives in [`game`] and is host-independent; [`board`] mounts it in the browser
//! on a canvas with DOM overlays for the status bar and controls.

use wasm_bindgen::prelude::*;

mod board;
pub mod game;

pub use game::{
    GameConfig, HoleEvent, HoleId, OccupantKind, Outcome, RoundController, RoundError, RoundEvent,
    RoundPhase, RoundSummary,
};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Mounts the board with the default configuration. The round itself starts
/// from the Start button.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    board::start_board_mode(GameConfig::default())
}

/// Same as [`start_game`] with a JSON config; omitted fields keep their defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config: GameConfig =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("bad config: {e}")))?;
    board::start_board_mode(config)
}

/// Ends the running round early.
#[wasm_bindgen]
pub fn end_game() -> Result<(), JsValue> {
    match board::with_round(|round| round.end()) {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(JsValue::from_str(&e.to_string())),
        None => Err(JsValue::from_str("board not mounted")),
    }
}

/// Summary of the last finished round as JSON, if there is one.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn last_summary_json() -> Option<String> {
    board::with_round(|round| round.summary())
        .flatten()
        .and_then(|s| serde_json::to_string(&s).ok())
}
