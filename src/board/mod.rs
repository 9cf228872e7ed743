//! Browser front-end: a canvas grid of holes plus DOM overlays for the header,
//! status bar, start/end button and the end-of-round summary.
//!
//! The [`RoundController`] lives in a thread-local next to the canvas. Each
//! animation frame maps `performance.now()` onto the controller's virtual clock,
//! fires whatever timers fell due, drains lifecycle events into score popups,
//! and redraws. Mouse clicks on the canvas resolve to a hole and become
//! `click(hole, kind)` calls.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, window};

use crate::game::{
    GameConfig, HoleEvent, HoleId, HolePhase, HoleView, OccupantKind, Outcome, RoundController,
    RoundPhase, clog,
};

const CANVAS_PX: u32 = 480;
const FLASH_MS: f64 = 600.0;

// Score popup over a hole after an outcome lands.
struct Flash {
    hole: HoleId,
    text: String,
    color: &'static str,
    start_ms: f64,
}

struct BoardState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    round: RoundController,
    /// performance.now() that maps to virtual time 0.
    origin_ms: f64,
    hover_hole: Option<HoleId>,
    flashes: Vec<Flash>,
}

thread_local! {
    static BOARD_STATE: std::cell::RefCell<Option<BoardState>> = const { std::cell::RefCell::new(None) };
}

/// Runs `f` against the live controller, if the board has been mounted.
pub(crate) fn with_round<R>(f: impl FnOnce(&mut RoundController) -> R) -> Option<R> {
    BOARD_STATE.with(|cell| cell.borrow_mut().as_mut().map(|st| f(&mut st.round)))
}

pub fn start_board_mode(config: GameConfig) -> Result<(), JsValue> {
    let round = RoundController::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;

    // Remount: swap in the new controller, keep canvas and listeners.
    let remounted = BOARD_STATE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(st) => {
            st.round = round;
            st.flashes.clear();
            None
        }
        None => Some(round),
    });
    let Some(round) = remounted else {
        return Ok(());
    };

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    ensure_overlay(
        &doc,
        "wab-header",
        "h1",
        "text-align:center; font-family:'Fira Code', monospace; color:#ffd166; margin:18px 0 6px;",
    )?
    .set_text_content(Some("Whack-a-Bruin"));
    ensure_overlay(
        &doc,
        "wab-status",
        "div",
        "display:flex; justify-content:center; gap:28px; font-family:'Fira Code', monospace; font-size:18px; color:#f4f4f4; margin:6px 0;",
    )?;
    let button = ensure_overlay(
        &doc,
        "wab-start",
        "div",
        "width:160px; margin:8px auto; padding:8px 0; text-align:center; cursor:pointer; font-family:'Fira Code', monospace; background:#2f6f3e; color:#fff; border-radius:8px; user-select:none;",
    )?;
    button.set_text_content(Some("Start Game"));

    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("wab-board") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("wab-board");
        c.set_width(CANVAS_PX);
        c.set_height(CANVAS_PX);
        c.set_attribute("style", "display:block; margin:10px auto; border-radius:18px; border:2px solid #222; background:#3b5d2a; cursor:crosshair;").ok();
        body.append_child(&c)?;
        c
    };
    ensure_overlay(
        &doc,
        "wab-summary",
        "div",
        "display:none; width:420px; margin:10px auto; padding:10px; text-align:center; font-family:'Fira Code', monospace; background:rgba(0,0,0,0.55); border:1px solid #333; border-radius:8px; color:#ffd166;",
    )?;

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    let origin_ms = win.performance().map(|p| p.now()).unwrap_or(0.0);
    BOARD_STATE.with(|b| {
        b.replace(Some(BoardState {
            canvas: canvas.clone(),
            ctx,
            round,
            origin_ms,
            hover_hole: None,
            flashes: Vec::new(),
        }))
    });

    // Whack
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
            BOARD_STATE.with(|cell| {
                if let Some(st) = cell.borrow_mut().as_mut() {
                    let Some(hole) = hole_at(st, x, y) else {
                        return;
                    };
                    // Catch up to the click instant before reading the hole.
                    let now = virtual_now(st);
                    st.round.advance_to(now);
                    let shown = st.round.hole(hole).and_then(|h| h.occupant_kind());
                    if let Some(kind) = shown {
                        st.round.click_at(now, hole, kind);
                    }
                }
            });
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Hover highlight
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
            BOARD_STATE.with(|cell| {
                if let Some(st) = cell.borrow_mut().as_mut() {
                    st.hover_hole = hole_at(st, x, y);
                }
            });
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            BOARD_STATE.with(|cell| {
                if let Some(st) = cell.borrow_mut().as_mut() {
                    st.hover_hole = None;
                }
            });
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Start / End / Play Again
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            let result = with_round(|round| match round.phase() {
                RoundPhase::Playing => round.end(),
                RoundPhase::Idle | RoundPhase::Finished => round.start(),
            });
            if let Some(Err(e)) = result {
                clog(&format!("whack-a-bruin: {e}"));
            }
            BOARD_STATE.with(|cell| {
                if let Some(st) = cell.borrow_mut().as_mut() {
                    st.flashes.clear();
                }
            });
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    start_board_loop();
    Ok(())
}

fn ensure_overlay(doc: &Document, id: &str, tag: &str, style: &str) -> Result<Element, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let el = doc.create_element(tag)?;
    el.set_id(id);
    el.set_attribute("style", style).ok();
    body.append_child(&el)?;
    Ok(el)
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_board_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        BOARD_STATE.with(|state_cell| {
            if let Some(state) = state_cell.borrow_mut().as_mut() {
                board_tick(state, ts);
            }
        });
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

// --- Tick & Rendering --------------------------------------------------------

fn virtual_ms(state: &BoardState, now: f64) -> u64 {
    (now - state.origin_ms).max(0.0) as u64
}

/// Virtual time of an input event handled between frames.
fn virtual_now(state: &BoardState) -> u64 {
    let now = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(state.origin_ms);
    virtual_ms(state, now).max(state.round.now_ms())
}

fn board_tick(state: &mut BoardState, now: f64) {
    let virtual_ms = virtual_ms(state, now);
    state.round.advance_to(virtual_ms);

    let cfg = state.round.config();
    let (points, penalty) = (cfg.bruin_points, cfg.bomb_penalty);
    for ev in state.round.drain_events() {
        let HoleEvent::Resolved(outcome) = ev.event else {
            continue;
        };
        let (text, color) = match outcome {
            Outcome::BruinWhacked => (format!("+{points}"), "#ffd166"),
            Outcome::BombWhacked => (format!("-{penalty}"), "#ff4d4d"),
            Outcome::BruinEscaped => ("miss".to_string(), "#c0c0c0"),
        };
        state.flashes.push(Flash {
            hole: ev.hole,
            text,
            color,
            start_ms: now,
        });
    }
    state.flashes.retain(|f| now - f.start_ms < FLASH_MS);

    render_board(state, now);
    update_overlays(&state.round);
}

fn cell_size(state: &BoardState) -> (f64, f64) {
    let cfg = state.round.config();
    (
        state.canvas.width() as f64 / cfg.columns as f64,
        state.canvas.height() as f64 / cfg.rows() as f64,
    )
}

fn hole_at(state: &BoardState, x: f64, y: f64) -> Option<HoleId> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let (cw, ch) = cell_size(state);
    let col = (x / cw).floor() as u16;
    let row = (y / ch).floor() as u16;
    let cfg = state.round.config();
    if col >= cfg.columns {
        return None;
    }
    let idx = row.checked_mul(cfg.columns)?.checked_add(col)?;
    (idx < cfg.holes).then_some(HoleId(idx))
}

fn cell_origin(state: &BoardState, hole: HoleId) -> (f64, f64) {
    let (cw, ch) = cell_size(state);
    let cols = state.round.config().columns;
    let col = hole.0 % cols;
    let row = hole.0 / cols;
    (col as f64 * cw, row as f64 * ch)
}

/// 0.0 = fully down in the hole, 1.0 = fully up.
fn lift(view: &HoleView, enter_ms: u64, exit_ms: u64) -> f64 {
    let progress = |span: u64| {
        if span == 0 {
            1.0
        } else {
            (view.phase_elapsed_ms as f64 / span as f64).clamp(0.0, 1.0)
        }
    };
    match view.phase {
        HolePhase::Empty => 0.0,
        HolePhase::Spawning => progress(enter_ms),
        HolePhase::Displayed => 1.0,
        HolePhase::Resolving => 1.0 - progress(exit_ms),
    }
}

fn render_board(state: &mut BoardState, now: f64) {
    let w = state.canvas.width() as f64;
    let h = state.canvas.height() as f64;
    let (cw, ch) = cell_size(state);
    let (enter_ms, exit_ms) = {
        let cfg = state.round.config();
        (cfg.enter_ms, cfg.exit_ms)
    };

    state.ctx.set_fill_style_str("#3b5d2a");
    state.ctx.fill_rect(0.0, 0.0, w, h);

    for view in state.round.hole_views() {
        let (px, py) = cell_origin(state, view.hole);
        let cx = px + cw / 2.0;
        let hole_y = py + ch * 0.68;

        if state.hover_hole == Some(view.hole) {
            state.ctx.set_stroke_style_str("rgba(255,240,150,0.55)");
            state.ctx.set_line_width(3.0);
            state.ctx.stroke_rect(px + 1.5, py + 1.5, cw - 3.0, ch - 3.0);
        }

        // Hole mouth
        state.ctx.set_fill_style_str("#1c120b");
        state.ctx.begin_path();
        state
            .ctx
            .ellipse(cx, hole_y, cw * 0.36, ch * 0.12, 0.0, 0.0, std::f64::consts::TAU)
            .ok();
        state.ctx.fill();

        if let Some(kind) = view.occupant {
            let rise = lift(&view, enter_ms, exit_ms) * ch * 0.38;
            let glyph = match kind {
                OccupantKind::Bruin => "🐻",
                OccupantKind::Bomb => "💣",
            };
            state.ctx.set_font(&format!("{}px serif", (ch * 0.42) as u32));
            state.ctx.fill_text(glyph, cx, hole_y - rise).ok();
            // Front lip hides the part still below ground
            state.ctx.set_fill_style_str("#3b5d2a");
            state.ctx.fill_rect(px, hole_y + ch * 0.02, cw, ch * 0.3);
            state.ctx.set_fill_style_str("#4f3521");
            state.ctx.begin_path();
            state
                .ctx
                .ellipse(cx, hole_y, cw * 0.36, ch * 0.05, 0.0, 0.0, std::f64::consts::PI)
                .ok();
            state.ctx.fill();
        }
    }

    // Score popups drift upward and fade
    state.ctx.set_font("bold 22px 'Fira Code', monospace");
    for flash in &state.flashes {
        let t = ((now - flash.start_ms) / FLASH_MS).clamp(0.0, 1.0);
        let (px, py) = cell_origin(state, flash.hole);
        state.ctx.set_global_alpha(1.0 - t);
        state.ctx.set_fill_style_str(flash.color);
        state
            .ctx
            .fill_text(&flash.text, px + cw / 2.0, py + ch * (0.3 - 0.2 * t))
            .ok();
    }
    state.ctx.set_global_alpha(1.0);

    if state.round.phase() == RoundPhase::Idle {
        state.ctx.set_fill_style_str("rgba(0,0,0,0.35)");
        state.ctx.fill_rect(0.0, 0.0, w, h);
        state.ctx.set_fill_style_str("#ffffff");
        state.ctx.set_font("24px 'Fira Code', monospace");
        state.ctx.fill_text("Press Start Game", w / 2.0, h / 2.0).ok();
    }
}

fn update_overlays(round: &RoundController) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    let status = round.status();
    if let Some(el) = doc.get_element_by_id("wab-status") {
        el.set_inner_html(&format!(
            "<span>⏱ {}</span><span>⭐ {}</span><span>💥 {}</span>",
            status.time_label, status.score, status.whack_count
        ));
    }
    if let Some(el) = doc.get_element_by_id("wab-start") {
        let label = match status.phase {
            RoundPhase::Idle => "Start Game",
            RoundPhase::Playing => "End Game",
            RoundPhase::Finished => "Play Again",
        };
        el.set_text_content(Some(label));
    }
    if let Some(el) = doc.get_element_by_id("wab-summary") {
        match round.summary() {
            Some(s) if status.phase == RoundPhase::Finished => {
                el.set_inner_html(&format!(
                    "Round over!<br>Score {} · Whacks {} · Bombs {} · Escapes {} · Accuracy {:.0}%",
                    s.score,
                    s.whack_count,
                    s.bomb_hit_count,
                    s.escape_count,
                    s.accuracy * 100.0
                ));
                el.set_attribute("style", &summary_style(true)).ok();
            }
            _ => {
                el.set_attribute("style", &summary_style(false)).ok();
            }
        }
    }
}

fn summary_style(visible: bool) -> String {
    format!(
        "display:{}; width:420px; margin:10px auto; padding:10px; text-align:center; font-family:'Fira Code', monospace; background:rgba(0,0,0,0.55); border:1px solid #333; border-radius:8px; color:#ffd166;",
        if visible { "block" } else { "none" }
    )
}
