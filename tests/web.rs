// Browser smoke test; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;
use whack_a_bruin::game::{DelayWindow, GameConfig, OccupantKind, RoundController, RoundPhase};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn board_mounts_in_document() {
    whack_a_bruin::start_game().unwrap();
    let doc = web_sys::window().unwrap().document().unwrap();
    assert!(doc.get_element_by_id("wab-board").is_some());
    assert!(doc.get_element_by_id("wab-status").is_some());
    assert!(whack_a_bruin::end_game().is_err());
}

#[wasm_bindgen_test]
fn round_plays_out_under_wasm() {
    let mut round = RoundController::new(GameConfig {
        holes: 1,
        columns: 1,
        time_limit_secs: 2,
        bruin_delay: DelayWindow::exactly(100),
        bomb_delay: DelayWindow::exactly(100_000),
        seed: Some(1),
        ..GameConfig::default()
    })
    .unwrap();
    round.start().unwrap();
    round.advance_to(200);
    assert!(round.click(whack_a_bruin::HoleId(0), OccupantKind::Bruin));
    round.advance_to(2_000);
    assert_eq!(round.phase(), RoundPhase::Finished);
    assert_eq!(round.state().whack_count, 1);
}
