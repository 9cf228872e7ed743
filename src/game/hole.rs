//! Per-hole occupant lifecycle.
//!
//! ```text
//!            admit              enter done          click / lifetime        exit done
//!   Empty ─────────► Spawning ───────────► Displayed ───────────► Resolving ─────────► Empty
//!                       └──────────── click / lifetime ──────────────┘
//! ```
//!
//! A hole owns every timer handle it schedules and cancels them all on round
//! end. The first of click or lifetime expiry stamps the occupant's
//! resolution; the loser finds it already stamped and does nothing, so each
//! occupant yields at most one outcome.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::clock::{Scheduler, TimerEvent, TimerId};
use super::config::GameConfig;
use super::occupancy::Occupancy;
use super::view::{HoleView, Transition, TransitionPlayer};
use super::{HoleEvent, HoleId, OccupantKind, Outcome, RoundEvent};

/// Everything a hole needs from the round while handling a callback.
pub struct HoleEnv {
    pub clock: Scheduler,
    pub occupancy: Occupancy,
    pub rng: ChaCha8Rng,
    pub config: GameConfig,
    pub transitions: Box<dyn TransitionPlayer>,
}

impl HoleEnv {
    pub fn new(config: GameConfig, transitions: Box<dyn TransitionPlayer>) -> Self {
        Self {
            clock: Scheduler::new(),
            occupancy: Occupancy::new(config.max_bruins, config.max_bombs),
            rng: ChaCha8Rng::seed_from_u64(config.resolved_seed()),
            config,
            transitions,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HolePhase {
    Empty,
    /// Occupant admitted, enter transition playing.
    Spawning,
    Displayed,
    /// Resolved by click or expiry, exit transition playing.
    Resolving,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Whacked,
    Expired,
}

#[derive(Clone, Copy, Debug)]
struct Occupant {
    kind: OccupantKind,
    serial: u32,
    resolution: Option<Resolution>,
}

impl Occupant {
    fn outcome(&self) -> Option<Outcome> {
        match (self.kind, self.resolution?) {
            (OccupantKind::Bruin, Resolution::Whacked) => Some(Outcome::BruinWhacked),
            (OccupantKind::Bomb, Resolution::Whacked) => Some(Outcome::BombWhacked),
            (OccupantKind::Bruin, Resolution::Expired) => Some(Outcome::BruinEscaped),
            // bombs just sink back
            (OccupantKind::Bomb, Resolution::Expired) => None,
        }
    }
}

#[derive(Debug)]
pub struct HoleController {
    id: HoleId,
    phase: HolePhase,
    phase_since_ms: u64,
    occupant: Option<Occupant>,
    next_serial: u32,
    active: bool,
    spawn_timers: [Option<TimerId>; 2],
    lifetime_timer: Option<TimerId>,
    transition_timer: Option<TimerId>,
}

impl HoleController {
    pub fn new(id: HoleId) -> Self {
        Self {
            id,
            phase: HolePhase::Empty,
            phase_since_ms: 0,
            occupant: None,
            next_serial: 0,
            active: false,
            spawn_timers: [None, None],
            lifetime_timer: None,
            transition_timer: None,
        }
    }

    pub fn id(&self) -> HoleId {
        self.id
    }

    pub fn phase(&self) -> HolePhase {
        self.phase
    }

    pub fn occupant_kind(&self) -> Option<OccupantKind> {
        self.occupant.map(|o| o.kind)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Serial of the current occupant, if any.
    pub fn serial(&self) -> Option<u32> {
        self.occupant.map(|o| o.serial)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_pending_spawn(&self, kind: OccupantKind) -> bool {
        self.spawn_timers[kind.slot()].is_some()
    }

    /// Number of timer handles this hole currently holds.
    pub fn pending_timers(&self) -> usize {
        self.spawn_timers.iter().flatten().count()
            + self.lifetime_timer.iter().count()
            + self.transition_timer.iter().count()
    }

    pub fn view(&self, now_ms: u64) -> HoleView {
        HoleView {
            hole: self.id,
            occupant: self.occupant_kind(),
            phase: self.phase,
            phase_elapsed_ms: now_ms.saturating_sub(self.phase_since_ms),
        }
    }

    pub fn on_round_start(&mut self, env: &mut HoleEnv) {
        self.cancel_timers(&mut env.clock);
        self.occupant = None;
        self.set_phase(HolePhase::Empty, env.clock.now_ms());
        self.active = true;
        for kind in OccupantKind::ALL {
            self.schedule_spawn(kind, env);
        }
    }

    /// Routes a fired timer to the matching handler.
    pub fn fire(&mut self, event: TimerEvent, env: &mut HoleEnv) -> Option<RoundEvent> {
        match event {
            TimerEvent::SpawnAttempt { kind, .. } => self.attempt_spawn(kind, env),
            TimerEvent::Lifetime { serial, .. } => {
                self.on_expire(serial, env);
                None
            }
            TimerEvent::TransitionDone { serial, .. } => self.on_transition_done(serial, env),
            TimerEvent::CountdownTick => None,
        }
    }

    /// Admits `kind` if the hole is free and the round-wide cap allows it. The
    /// attempt loop renews itself either way.
    pub fn attempt_spawn(&mut self, kind: OccupantKind, env: &mut HoleEnv) -> Option<RoundEvent> {
        if !self.active {
            return None;
        }
        self.spawn_timers[kind.slot()] = None;
        // short-circuit: a busy hole must not claim a slot
        let admitted = !self.is_occupied() && env.occupancy.try_admit(kind);
        self.schedule_spawn(kind, env);
        if !admitted {
            return None;
        }

        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        self.occupant = Some(Occupant {
            kind,
            serial,
            resolution: None,
        });
        self.set_phase(HolePhase::Spawning, env.clock.now_ms());

        let lifetime = env.config.lifetime_ms(kind);
        self.lifetime_timer = Some(env.clock.schedule(
            lifetime,
            TimerEvent::Lifetime {
                hole: self.id,
                serial,
            },
        ));
        let enter_ms = env.transitions.play(self.id, kind, Transition::Enter);
        self.transition_timer = Some(env.clock.schedule(
            enter_ms,
            TimerEvent::TransitionDone {
                hole: self.id,
                serial,
            },
        ));

        Some(self.event(serial, HoleEvent::Appeared(kind)))
    }

    /// Player clicked the displayed `kind`. Returns false when the click
    /// changed nothing (empty hole, wrong kind, already resolving).
    pub fn on_player_click(&mut self, kind: OccupantKind, env: &mut HoleEnv) -> bool {
        if !self.active {
            return false;
        }
        let Some(occupant) = self.occupant.as_mut() else {
            return false;
        };
        if occupant.kind != kind || occupant.resolution.is_some() {
            return false;
        }
        occupant.resolution = Some(Resolution::Whacked);
        env.clock.cancel_slot(&mut self.lifetime_timer);
        self.begin_exit(env);
        true
    }

    /// Lifetime elapsed. A no-op if the occupant was already whacked or has
    /// since been replaced.
    pub fn on_expire(&mut self, serial: u32, env: &mut HoleEnv) {
        self.lifetime_timer = None;
        let Some(occupant) = self.occupant.as_mut() else {
            return;
        };
        if occupant.serial != serial || occupant.resolution.is_some() {
            return;
        }
        occupant.resolution = Some(Resolution::Expired);
        self.begin_exit(env);
    }

    pub fn on_transition_done(&mut self, serial: u32, env: &mut HoleEnv) -> Option<RoundEvent> {
        self.transition_timer = None;
        let occupant = self.occupant?;
        if occupant.serial != serial {
            return None;
        }
        let now = env.clock.now_ms();
        match self.phase {
            HolePhase::Spawning => {
                self.set_phase(HolePhase::Displayed, now);
                None
            }
            HolePhase::Resolving => {
                self.occupant = None;
                self.set_phase(HolePhase::Empty, now);
                env.occupancy.release(occupant.kind);
                occupant
                    .outcome()
                    .map(|outcome| self.event(serial, HoleEvent::Resolved(outcome)))
            }
            HolePhase::Empty | HolePhase::Displayed => None,
        }
    }

    /// Stops scheduling and drops any occupant without reporting it.
    pub fn on_round_end(&mut self, env: &mut HoleEnv) {
        self.active = false;
        self.cancel_timers(&mut env.clock);
        if let Some(occupant) = self.occupant.take() {
            env.occupancy.release(occupant.kind);
            env.transitions.cancel(self.id);
        }
        self.set_phase(HolePhase::Empty, env.clock.now_ms());
    }

    fn begin_exit(&mut self, env: &mut HoleEnv) {
        let Some(occupant) = self.occupant else {
            return;
        };
        // an unfinished enter tween is superseded
        env.clock.cancel_slot(&mut self.transition_timer);
        self.set_phase(HolePhase::Resolving, env.clock.now_ms());
        let exit_ms = env.transitions.play(self.id, occupant.kind, Transition::Exit);
        self.transition_timer = Some(env.clock.schedule(
            exit_ms,
            TimerEvent::TransitionDone {
                hole: self.id,
                serial: occupant.serial,
            },
        ));
    }

    fn schedule_spawn(&mut self, kind: OccupantKind, env: &mut HoleEnv) {
        let delay = env.config.spawn_window(kind).sample(&mut env.rng);
        let id = env
            .clock
            .schedule(delay, TimerEvent::SpawnAttempt { hole: self.id, kind });
        if let Some(stale) = self.spawn_timers[kind.slot()].replace(id) {
            env.clock.cancel(stale);
        }
    }

    fn cancel_timers(&mut self, clock: &mut Scheduler) {
        for slot in self.spawn_timers.iter_mut() {
            clock.cancel_slot(slot);
        }
        clock.cancel_slot(&mut self.lifetime_timer);
        clock.cancel_slot(&mut self.transition_timer);
    }

    fn set_phase(&mut self, phase: HolePhase, now_ms: u64) {
        self.phase = phase;
        self.phase_since_ms = now_ms;
    }

    fn event(&self, serial: u32, event: HoleEvent) -> RoundEvent {
        RoundEvent {
            hole: self.id,
            serial,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::DelayWindow;
    use crate::game::view::FixedTransitions;

    fn env_with(bruin_delay: u64, bomb_delay: u64) -> HoleEnv {
        let config = GameConfig {
            holes: 1,
            columns: 1,
            bruin_delay: DelayWindow::exactly(bruin_delay),
            bomb_delay: DelayWindow::exactly(bomb_delay),
            bruin_lifetime_ms: 1_000,
            bomb_lifetime_ms: 1_000,
            enter_ms: 100,
            exit_ms: 100,
            seed: Some(1),
            ..GameConfig::default()
        };
        let transitions = FixedTransitions {
            enter_ms: config.enter_ms,
            exit_ms: config.exit_ms,
        };
        HoleEnv::new(config, Box::new(transitions))
    }

    fn run_until(hole: &mut HoleController, env: &mut HoleEnv, until_ms: u64) -> Vec<RoundEvent> {
        let mut out = Vec::new();
        while let Some((_, ev)) = env.clock.pop_due(until_ms) {
            out.extend(hole.fire(ev, env));
        }
        env.clock.settle(until_ms);
        out
    }

    #[test]
    fn spawns_then_displays_after_enter() {
        let mut env = env_with(200, 1_000_000);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);

        let events = run_until(&mut hole, &mut env, 200);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, HoleEvent::Appeared(OccupantKind::Bruin));
        assert_eq!(hole.phase(), HolePhase::Spawning);
        assert_eq!(env.occupancy.active_bruins(), 1);

        run_until(&mut hole, &mut env, 300);
        assert_eq!(hole.phase(), HolePhase::Displayed);
        assert_eq!(hole.view(350).phase_elapsed_ms, 50);
    }

    #[test]
    fn busy_hole_defers_other_kind() {
        let mut env = env_with(100, 150);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);

        run_until(&mut hole, &mut env, 150);
        assert_eq!(hole.occupant_kind(), Some(OccupantKind::Bruin));
        assert_eq!(env.occupancy.active_bombs(), 0);
        assert!(hole.has_pending_spawn(OccupantKind::Bomb));
    }

    #[test]
    fn exhausted_cap_retries_later() {
        let mut env = env_with(100, 1_000_000);
        env.occupancy.try_admit(OccupantKind::Bruin);
        env.occupancy.try_admit(OccupantKind::Bruin);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);

        assert!(run_until(&mut hole, &mut env, 100).is_empty());
        assert!(!hole.is_occupied());
        assert!(hole.has_pending_spawn(OccupantKind::Bruin));

        env.occupancy.release(OccupantKind::Bruin);
        let events = run_until(&mut hole, &mut env, 200);
        assert_eq!(events[0].event, HoleEvent::Appeared(OccupantKind::Bruin));
    }

    #[test]
    fn click_wins_over_inflight_expiry() {
        let mut env = env_with(100, 1_000_000);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);
        run_until(&mut hole, &mut env, 300);
        let serial = hole.serial().unwrap();

        assert!(hole.on_player_click(OccupantKind::Bruin, &mut env));
        assert!(!hole.on_player_click(OccupantKind::Bruin, &mut env));
        hole.on_expire(serial, &mut env);
        assert_eq!(hole.phase(), HolePhase::Resolving);

        let events = run_until(&mut hole, &mut env, 2_000);
        let resolved: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.event, HoleEvent::Resolved(_)) && e.serial == serial)
            .collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].event, HoleEvent::Resolved(Outcome::BruinWhacked));
    }

    #[test]
    fn wrong_kind_click_is_ignored() {
        let mut env = env_with(100, 1_000_000);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);
        run_until(&mut hole, &mut env, 150);
        assert!(!hole.on_player_click(OccupantKind::Bomb, &mut env));
        assert_eq!(hole.phase(), HolePhase::Spawning);
    }

    #[test]
    fn expired_bomb_vanishes_silently() {
        let mut env = env_with(1_000_000, 700);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);
        // appears at 700, expires at 1700, gone at 1800, next attempt at 2100
        let events = run_until(&mut hole, &mut env, 2_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, HoleEvent::Appeared(OccupantKind::Bomb));
        assert!(!hole.is_occupied());
        assert_eq!(env.occupancy.active_bombs(), 0);
    }

    #[test]
    fn round_end_cancels_everything() {
        let mut env = env_with(100, 100);
        let mut hole = HoleController::new(HoleId(0));
        hole.on_round_start(&mut env);
        run_until(&mut hole, &mut env, 150);
        assert!(hole.is_occupied());

        hole.on_round_end(&mut env);
        assert_eq!(hole.pending_timers(), 0);
        assert_eq!(env.clock.pending_len(), 0);
        assert_eq!(hole.phase(), HolePhase::Empty);
        assert_eq!(env.occupancy.active_bruins() + env.occupancy.active_bombs(), 0);
        assert!(run_until(&mut hole, &mut env, 10_000).is_empty());
        assert!(hole.attempt_spawn(OccupantKind::Bruin, &mut env).is_none());
    }
}
