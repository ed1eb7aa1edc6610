//! Continuous placement/deletion pacing.
//!
//! While a button is held the session commits at most once per
//! `1 / placement_speed` seconds. Placement also refuses to spawn a block on
//! top of the one it just placed while the pointer barely moves.

use std::time::Duration;

use glam::Vec3;

/// Candidates closer than this to the last placement are duplicates.
pub const DUPLICATE_EPSILON: f32 = 0.01;

/// What a commit should do this event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a block at the candidate.
    Place,
    /// Remove the block under the pointer.
    Delete,
}

/// Button-held state plus the commit clock.
#[derive(Debug, Clone, Default)]
pub struct RateController {
    placing: bool,
    deleting: bool,
    /// `None` until the first commit after a press, which opens the gate.
    last_operation: Option<Duration>,
    last_placement: Option<Vec3>,
}

impl RateController {
    /// Idle controller: no button held, gate open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the place button is held.
    pub fn is_placing(&self) -> bool {
        self.placing
    }

    /// Whether the delete button is held.
    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Position of the most recent placement since the place button went down.
    pub fn last_placement(&self) -> Option<Vec3> {
        self.last_placement
    }

    /// Place button went down: forget the last placement and open the gate.
    pub fn press_place(&mut self) {
        self.placing = true;
        self.last_placement = None;
        self.expire();
    }

    /// Place button came up.
    pub fn release_place(&mut self) {
        self.placing = false;
    }

    /// Delete button went down: open the gate.
    pub fn press_delete(&mut self) {
        self.deleting = true;
        self.expire();
    }

    /// Delete button came up.
    pub fn release_delete(&mut self) {
        self.deleting = false;
    }

    /// Force the next [`Self::is_open`] check to pass.
    pub fn expire(&mut self) {
        self.last_operation = None;
    }

    /// The operation a held button asks for; placement wins when both are held.
    pub fn pending(&self) -> Option<Operation> {
        if self.placing {
            Some(Operation::Place)
        } else if self.deleting {
            Some(Operation::Delete)
        } else {
            None
        }
    }

    /// Whether at least `interval` has elapsed since the last commit.
    pub fn is_open(&self, now: Duration, interval: Duration) -> bool {
        match self.last_operation {
            None => true,
            Some(last) => now.saturating_sub(last) >= interval,
        }
    }

    /// Restart the interval at `now`.
    pub fn mark(&mut self, now: Duration) {
        self.last_operation = Some(now);
    }

    /// Whether `candidate` would duplicate the last placement.
    pub fn is_duplicate(&self, candidate: Vec3) -> bool {
        self.last_placement
            .is_some_and(|last| last.distance(candidate) < DUPLICATE_EPSILON)
    }

    /// Remember a committed placement.
    pub fn record_placement(&mut self, position: Vec3) {
        self.last_placement = Some(position);
    }
}
