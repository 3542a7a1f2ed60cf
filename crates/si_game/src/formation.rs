//! Formation sweep: the marching rule for the alien grid.
//!
//! One heading is shared by the whole formation. Each tick the group slides
//! one step along the heading; when the formation's leading column lands on
//! a turnaround x the heading flips and the whole formation drops. The
//! right-edge rule watches the *last* active member, the left-edge rule the
//! *first*, and both rules run every tick in that order.

use crate::stage::{GroupId, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Rightward,
    Leftward,
}

impl Heading {
    /// Signed unit step along x.
    pub fn delta(self) -> f32 {
        match self {
            Heading::Rightward => 1.0,
            Heading::Leftward => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Heading::Rightward => "rightward",
            Heading::Leftward => "leftward",
        }
    }
}

/// Sweep tuning plus the current heading. `descents` counts edge drops.
///
/// The edge rules compare x for exact equality with the turnaround value.
/// Positions stay integral under the default unit step, so the comparison is
/// exact; a step size that never lands on the edge value walks straight past
/// it and the formation never reverses.
#[derive(Debug, Clone)]
pub struct FormationSweep {
    pub heading: Heading,
    pub step_px: f32,
    pub right_edge_x: f32,
    pub left_edge_x: f32,
    pub descent_px: f32,
    pub descents: u32,
}

impl Default for FormationSweep {
    fn default() -> Self {
        Self {
            heading: Heading::Rightward,
            step_px: 1.0,
            right_edge_x: 775.0,
            left_edge_x: 23.0,
            descent_px: 24.0,
            descents: 0,
        }
    }
}

impl FormationSweep {
    /// Advance the formation by one tick: slide along the heading, then run
    /// the right-edge and left-edge rules against the new positions.
    pub fn step(&mut self, stage: &mut Stage, group: GroupId) {
        stage.group_inc_x(group, self.heading.delta() * self.step_px);

        if let Some(last) = stage.group_last_active(group) {
            if stage.sprite(last).x == self.right_edge_x {
                self.heading = Heading::Leftward;
                stage.group_inc_y(group, self.descent_px);
                self.descents += 1;
            }
        }
        if let Some(first) = stage.group_first_active(group) {
            if stage.sprite(first).x == self.left_edge_x {
                self.heading = Heading::Rightward;
                stage.group_inc_y(group, self.descent_px);
                self.descents += 1;
            }
        }
    }
}
