//! Host-independent game core.
//!
//! Nothing in here touches the DOM or a wall clock: time only moves when the host
//! calls [`RoundController::advance_to`], which makes every round replayable from a
//! seed. The browser front-end in `crate::board` is one such host; the integration
//! tests are another.

pub mod clock;
pub mod config;
pub mod hole;
pub mod occupancy;
pub mod round;
pub mod view;

pub use clock::{Scheduler, TimerEvent, TimerId};
pub use config::{ConfigError, DelayWindow, GameConfig};
pub use hole::{HoleController, HoleEnv, HolePhase};
pub use occupancy::Occupancy;
pub use round::{RoundController, RoundError, RoundPhase, RoundState, RoundSummary};
pub use view::{FixedTransitions, HoleView, StatusView, Transition, TransitionPlayer, format_time};

/// Index of a hole on the board, in `0..config.holes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoleId(pub u16);

impl HoleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What can pop out of a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OccupantKind {
    /// Rewarded target.
    Bruin,
    /// Penalized target. Letting it withdraw costs nothing.
    Bomb,
}

impl OccupantKind {
    pub const ALL: [OccupantKind; 2] = [OccupantKind::Bruin, OccupantKind::Bomb];

    /// Slot for per-kind arrays.
    pub fn slot(self) -> usize {
        match self {
            OccupantKind::Bruin => 0,
            OccupantKind::Bomb => 1,
        }
    }
}

/// Score-affecting result of one occupant's life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    BruinWhacked,
    BombWhacked,
    BruinEscaped,
}

/// Lifecycle notification emitted by a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HoleEvent {
    Appeared(OccupantKind),
    Resolved(Outcome),
}

/// Journal entry: which hole, which occupant instance, what happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundEvent {
    pub hole: HoleId,
    /// Per-hole occupant serial; pairs an `Appeared` with its `Resolved`.
    pub serial: u32,
    pub event: HoleEvent,
}

/// Browser console logging. Native builds (tests, tooling) stay silent.
pub(crate) fn clog(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(msg));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = msg;
}
