//! Seam between the core and whatever draws it.
//!
//! The core asks a [`TransitionPlayer`] to start enter/exit animations and
//! schedules the completion itself, so no animation engine leaks in here. Going
//! the other way, the view reads [`StatusView`] and [`HoleView`] snapshots.

use super::hole::HolePhase;
use super::round::RoundPhase;
use super::{HoleId, OccupantKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Enter,
    Exit,
}

pub trait TransitionPlayer {
    /// Start `transition` for the occupant of `hole`. Returns how long it runs
    /// (ms); the core resumes the hole's lifecycle once that elapses.
    fn play(&mut self, hole: HoleId, kind: OccupantKind, transition: Transition) -> u64;

    /// The hole was cleared mid-animation (round end).
    fn cancel(&mut self, _hole: HoleId) {}
}

/// Fixed-duration tweens. The canvas renderer interpolates from
/// [`HoleView::phase_elapsed_ms`] so it needs nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedTransitions {
    pub enter_ms: u64,
    pub exit_ms: u64,
}

impl TransitionPlayer for FixedTransitions {
    fn play(&mut self, _hole: HoleId, _kind: OccupantKind, transition: Transition) -> u64 {
        match transition {
            Transition::Enter => self.enter_ms,
            Transition::Exit => self.exit_ms,
        }
    }
}

/// Status bar snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusView {
    pub phase: RoundPhase,
    pub time_remaining: u32,
    pub time_label: String,
    pub score: i64,
    pub whack_count: u32,
    pub bomb_hit_count: u32,
    pub escape_count: u32,
}

/// Per-hole render snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoleView {
    pub hole: HoleId,
    pub occupant: Option<OccupantKind>,
    pub phase: HolePhase,
    pub phase_elapsed_ms: u64,
}

/// `mm:ss`, e.g. `00:17`. Minutes keep growing past 59.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_clock_label() {
        assert_eq!(format_time(17), "00:17");
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(600), "10:00");
        assert_eq!(format_time(6_000), "100:00");
    }

    #[test]
    fn fixed_transitions_report_durations() {
        let mut t = FixedTransitions { enter_ms: 150, exit_ms: 180 };
        assert_eq!(t.play(HoleId(0), OccupantKind::Bruin, Transition::Enter), 150);
        assert_eq!(t.play(HoleId(0), OccupantKind::Bomb, Transition::Exit), 180);
    }
}
