//! Round controller: countdown, scoring, and the board of holes.

use thiserror::Error;

use super::clock::{TimerEvent, TimerId};
use super::config::{ConfigError, GameConfig};
use super::hole::{HoleController, HoleEnv};
use super::occupancy::Occupancy;
use super::view::{FixedTransitions, HoleView, StatusView, TransitionPlayer, format_time};
use super::{HoleEvent, HoleId, OccupantKind, Outcome, RoundEvent, clog};

const TICK_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundPhase {
    Idle,
    Playing,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub score: i64,
    pub whack_count: u32,
    pub bomb_hit_count: u32,
    /// Bruins that withdrew unclicked.
    pub escape_count: u32,
    pub time_remaining: u32,
    pub phase: RoundPhase,
}

impl RoundState {
    fn fresh(time_limit_secs: u32, phase: RoundPhase) -> Self {
        Self {
            score: 0,
            whack_count: 0,
            bomb_hit_count: 0,
            escape_count: 0,
            time_remaining: time_limit_secs,
            phase,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Playing
    }
}

/// Frozen at the moment the round finishes.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundSummary {
    pub score: i64,
    pub whack_count: u32,
    pub bomb_hit_count: u32,
    pub escape_count: u32,
    /// Whacked share of resolved bruins, 0.0 when none resolved.
    pub accuracy: f64,
}

impl RoundSummary {
    fn of(state: &RoundState) -> Self {
        let resolved = state.whack_count + state.escape_count;
        let accuracy = if resolved == 0 {
            0.0
        } else {
            state.whack_count as f64 / resolved as f64
        };
        Self {
            score: state.score,
            whack_count: state.whack_count,
            bomb_hit_count: state.bomb_hit_count,
            escape_count: state.escape_count,
            accuracy,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("a round is already in progress")]
    AlreadyPlaying,
    #[error("no round in progress")]
    NotPlaying,
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

pub struct RoundController {
    state: RoundState,
    env: HoleEnv,
    holes: Vec<HoleController>,
    countdown: Option<TimerId>,
    journal: Vec<RoundEvent>,
    summary: Option<RoundSummary>,
}

impl RoundController {
    pub fn new(config: GameConfig) -> Result<Self, RoundError> {
        let transitions = FixedTransitions {
            enter_ms: config.enter_ms,
            exit_ms: config.exit_ms,
        };
        Self::with_transitions(config, Box::new(transitions))
    }

    pub fn with_transitions(
        config: GameConfig,
        transitions: Box<dyn TransitionPlayer>,
    ) -> Result<Self, RoundError> {
        config.validate()?;
        let holes = (0..config.holes).map(|i| HoleController::new(HoleId(i))).collect();
        let state = RoundState::fresh(config.time_limit_secs, RoundPhase::Idle);
        Ok(Self {
            state,
            env: HoleEnv::new(config, transitions),
            holes,
            countdown: None,
            journal: Vec::new(),
            summary: None,
        })
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.env.config
    }

    pub fn now_ms(&self) -> u64 {
        self.env.clock.now_ms()
    }

    pub fn holes(&self) -> &[HoleController] {
        &self.holes
    }

    pub fn hole(&self, id: HoleId) -> Option<&HoleController> {
        self.holes.get(id.index())
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.env.occupancy
    }

    /// Timers still queued, countdown included.
    pub fn pending_timers(&self) -> usize {
        self.env.clock.pending_len()
    }

    pub fn summary(&self) -> Option<RoundSummary> {
        self.summary
    }

    /// Lifecycle journal of the current round.
    pub fn events(&self) -> &[RoundEvent] {
        &self.journal
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.journal)
    }

    /// Idle/Finished -> Playing, with every counter reset.
    pub fn start(&mut self) -> Result<(), RoundError> {
        if self.state.is_playing() {
            clog("whack-a-bruin: start ignored, round already running");
            return Err(RoundError::AlreadyPlaying);
        }
        self.state = RoundState::fresh(self.env.config.time_limit_secs, RoundPhase::Playing);
        self.env.occupancy.reset();
        self.journal.clear();
        self.summary = None;
        self.env.clock.cancel_slot(&mut self.countdown);
        for hole in self.holes.iter_mut() {
            hole.on_round_start(&mut self.env);
        }
        self.countdown = Some(self.env.clock.schedule(TICK_MS, TimerEvent::CountdownTick));
        clog(&format!(
            "whack-a-bruin: round started ({} holes, {}s)",
            self.holes.len(),
            self.state.time_remaining
        ));
        Ok(())
    }

    /// One second of countdown. Hitting zero finishes the round in the same call.
    pub fn tick(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        if self.state.time_remaining == 0 {
            self.finish();
        }
    }

    /// Early termination; the clock reads zero just as on timeout.
    pub fn end(&mut self) -> Result<(), RoundError> {
        if !self.state.is_playing() {
            return Err(RoundError::NotPlaying);
        }
        self.state.time_remaining = 0;
        self.finish();
        Ok(())
    }

    /// Applies one outcome. Ignored (returns false) unless a round is running.
    pub fn report_outcome(&mut self, outcome: Outcome) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let cfg = &self.env.config;
        match outcome {
            Outcome::BruinWhacked => {
                self.state.score += i64::from(cfg.bruin_points);
                self.state.whack_count += 1;
            }
            Outcome::BombWhacked => {
                self.state.score -= i64::from(cfg.bomb_penalty);
                self.state.bomb_hit_count += 1;
            }
            Outcome::BruinEscaped => self.state.escape_count += 1,
        }
        true
    }

    /// Player input: `kind` was clicked in `hole`.
    pub fn click(&mut self, hole: HoleId, kind: OccupantKind) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        match self.holes.get_mut(hole.index()) {
            Some(h) => h.on_player_click(kind, &mut self.env),
            None => false,
        }
    }

    /// Click stamped at `now_ms`: timers already due by then fire first, so a
    /// lifetime that elapsed before the click wins the race.
    pub fn click_at(&mut self, now_ms: u64, hole: HoleId, kind: OccupantKind) -> bool {
        self.advance_to(now_ms);
        self.click(hole, kind)
    }

    /// Fires every timer due at or before `now_ms`, in order.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((_, event)) = self.env.clock.pop_due(now_ms) {
            self.dispatch(event);
        }
        self.env.clock.settle(now_ms);
    }

    pub fn advance_by(&mut self, delta_ms: u64) {
        self.advance_to(self.now_ms().saturating_add(delta_ms));
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            phase: self.state.phase,
            time_remaining: self.state.time_remaining,
            time_label: format_time(self.state.time_remaining),
            score: self.state.score,
            whack_count: self.state.whack_count,
            bomb_hit_count: self.state.bomb_hit_count,
            escape_count: self.state.escape_count,
        }
    }

    pub fn hole_views(&self) -> Vec<HoleView> {
        let now = self.now_ms();
        self.holes.iter().map(|h| h.view(now)).collect()
    }

    fn finish(&mut self) {
        self.state.phase = RoundPhase::Finished;
        self.env.clock.cancel_slot(&mut self.countdown);
        for hole in self.holes.iter_mut() {
            hole.on_round_end(&mut self.env);
        }
        let summary = RoundSummary::of(&self.state);
        self.summary = Some(summary);
        clog(&format!(
            "whack-a-bruin: round finished score={} whacks={} bombs={} escapes={}",
            summary.score, summary.whack_count, summary.bomb_hit_count, summary.escape_count
        ));
    }

    fn dispatch(&mut self, event: TimerEvent) {
        let hole = match event {
            TimerEvent::CountdownTick => {
                self.countdown = None;
                self.tick();
                if self.state.is_playing() {
                    self.countdown =
                        Some(self.env.clock.schedule(TICK_MS, TimerEvent::CountdownTick));
                }
                return;
            }
            TimerEvent::SpawnAttempt { hole, .. }
            | TimerEvent::Lifetime { hole, .. }
            | TimerEvent::TransitionDone { hole, .. } => hole,
        };
        let Some(h) = self.holes.get_mut(hole.index()) else {
            return;
        };
        if let Some(ev) = h.fire(event, &mut self.env) {
            self.record(ev);
        }
    }

    fn record(&mut self, ev: RoundEvent) {
        self.journal.push(ev);
        if let HoleEvent::Resolved(outcome) = ev.event {
            self.report_outcome(outcome);
        }
    }
}
