//! Round-wide occupancy counters shared by every hole.
//!
//! Holes only touch these through [`Occupancy::try_admit`] and
//! [`Occupancy::release`]; each call is one complete read-modify-write.

use super::OccupantKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupancy {
    active: [u32; 2],
    max: [u32; 2],
}

impl Occupancy {
    pub fn new(max_bruins: u32, max_bombs: u32) -> Self {
        Self {
            active: [0, 0],
            max: [max_bruins, max_bombs],
        }
    }

    /// Claims one slot for `kind` if the cap allows it.
    pub fn try_admit(&mut self, kind: OccupantKind) -> bool {
        let slot = kind.slot();
        if self.active[slot] >= self.max[slot] {
            return false;
        }
        self.active[slot] += 1;
        true
    }

    /// Returns one slot for `kind`. Clamped at zero.
    pub fn release(&mut self, kind: OccupantKind) {
        let slot = kind.slot();
        self.active[slot] = self.active[slot].saturating_sub(1);
    }

    pub fn active(&self, kind: OccupantKind) -> u32 {
        self.active[kind.slot()]
    }

    pub fn max(&self, kind: OccupantKind) -> u32 {
        self.max[kind.slot()]
    }

    pub fn active_bruins(&self) -> u32 {
        self.active(OccupantKind::Bruin)
    }

    pub fn active_bombs(&self) -> u32 {
        self.active(OccupantKind::Bomb)
    }

    pub fn reset(&mut self) {
        self.active = [0, 0];
    }
}
