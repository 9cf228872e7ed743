//! Tunable round constants.

use rand::Rng;
use thiserror::Error;

use super::OccupantKind;

/// Inclusive range of milliseconds a spawn attempt waits before firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Fixed delay, handy for scripted rounds.
    pub const fn exactly(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Never below 1 ms, so a retry always lands on a later instant.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rng.gen_range(self.min_ms..=self.max_ms)
        };
        ms.max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    pub holes: u16,
    /// Board columns; rows follow from `holes`.
    pub columns: u16,
    pub time_limit_secs: u32,
    pub bruin_points: u32,
    pub bomb_penalty: u32,
    pub max_bruins: u32,
    pub max_bombs: u32,
    pub bruin_delay: DelayWindow,
    pub bomb_delay: DelayWindow,
    pub bruin_lifetime_ms: u64,
    pub bomb_lifetime_ms: u64,
    pub enter_ms: u64,
    pub exit_ms: u64,
    /// Spawn-timing seed. `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            holes: 9,
            columns: 3,
            time_limit_secs: 30,
            bruin_points: 100,
            bomb_penalty: 50,
            max_bruins: 2,
            max_bombs: 1,
            bruin_delay: DelayWindow::new(600, 2_400),
            bomb_delay: DelayWindow::new(2_000, 6_000),
            bruin_lifetime_ms: 1_200,
            bomb_lifetime_ms: 1_600,
            enter_ms: 150,
            exit_ms: 180,
            seed: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board needs at least one hole")]
    NoHoles,
    #[error("board needs at least one column")]
    NoColumns,
    #[error("round time limit must be positive")]
    NoTimeLimit,
    #[error("{kind:?} delay window is inverted ({min_ms} > {max_ms} ms)")]
    InvertedWindow {
        kind: OccupantKind,
        min_ms: u64,
        max_ms: u64,
    },
    #[error("{0:?} delay window must allow a positive delay")]
    ZeroDelayWindow(OccupantKind),
    #[error("{0:?} lifetime must be positive")]
    NoLifetime(OccupantKind),
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.holes == 0 {
            return Err(ConfigError::NoHoles);
        }
        if self.columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        if self.time_limit_secs == 0 {
            return Err(ConfigError::NoTimeLimit);
        }
        for kind in OccupantKind::ALL {
            let w = self.spawn_window(kind);
            if w.min_ms > w.max_ms {
                return Err(ConfigError::InvertedWindow {
                    kind,
                    min_ms: w.min_ms,
                    max_ms: w.max_ms,
                });
            }
            if w.max_ms == 0 {
                return Err(ConfigError::ZeroDelayWindow(kind));
            }
            if self.lifetime_ms(kind) == 0 {
                return Err(ConfigError::NoLifetime(kind));
            }
        }
        Ok(())
    }

    pub fn spawn_window(&self, kind: OccupantKind) -> DelayWindow {
        match kind {
            OccupantKind::Bruin => self.bruin_delay,
            OccupantKind::Bomb => self.bomb_delay,
        }
    }

    pub fn lifetime_ms(&self, kind: OccupantKind) -> u64 {
        match kind {
            OccupantKind::Bruin => self.bruin_lifetime_ms,
            OccupantKind::Bomb => self.bomb_lifetime_ms,
        }
    }

    pub fn rows(&self) -> u16 {
        self.holes.div_ceil(self.columns.max(1))
    }

    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(entropy_seed)
    }
}

/// Seed for unseeded rounds: platform entropy when the `rng` feature is on,
/// otherwise the clock.
pub fn entropy_seed() -> u64 {
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 8];
        if getrandom::getrandom(&mut buf).is_ok() {
            return u64::from_le_bytes(buf);
        }
    }
    clock_seed()
}

#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| (p.now() * 1_000.0) as u64)
        .unwrap_or(0)
        ^ 0x9E37_79B9_7F4A_7C15
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
