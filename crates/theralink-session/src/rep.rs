//! Repetition state machine
//!
//! Driven once per frame by the smoothed knee angle:
//!
//! ```text
//!            knee < min_squat (from STANDING)
//!   STANDING ───────────────────────────────▶ SQUATTING
//!      ▲                                          │
//!      └──────────────────────────────────────────┘
//!            knee > max_standing: rep if the cycle was short enough
//! ```
//!
//! The machine starts with no stance at all, so a session that begins
//! mid-squat has to stand up once before the first rep can be counted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use theralink_core::{Timestamp, WorkoutConfig};

/// Posture as seen by the rep counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    Standing,
    Squatting,
}

/// Thresholds for one exercise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepThresholds {
    /// Knee angle below which the subject is squatting
    pub min_squat_angle: f32,
    /// Knee angle above which the subject is standing
    pub max_standing_angle: f32,
    /// Down-to-up cycles at or beyond this are tracking artifacts
    pub max_rep_duration: Duration,
}

impl From<&WorkoutConfig> for RepThresholds {
    fn from(config: &WorkoutConfig) -> Self {
        RepThresholds {
            min_squat_angle: config.min_squat_angle,
            max_standing_angle: config.max_standing_angle,
            max_rep_duration: config.max_rep_duration,
        }
    }
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self::from(&WorkoutConfig::default())
    }
}

/// Stance plus the timestamps of the last transitions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RepState {
    /// `None` until the first standing frame
    pub stance: Option<Stance>,
    /// When the current squat began (T_down)
    pub squat_started: Option<Timestamp>,
    /// Last frame seen standing (T_up)
    pub stood_up: Option<Timestamp>,
}

/// Outcome of feeding one angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepTransition {
    /// Angle between thresholds, or squatting deeper; nothing changes
    Hold,
    /// Standing without completing a squat
    Standing,
    /// Dropped below the squat threshold from standing
    DepthReached,
    /// Completed a valid down-up cycle
    RepCounted { cycle: Duration },
    /// Came back up after a cycle too long to be a rep
    RepRejected { cycle: Option<Duration> },
}

/// Counts squat repetitions from a stream of knee angles
#[derive(Debug, Clone)]
pub struct RepCounter {
    thresholds: RepThresholds,
    state: RepState,
}

impl RepCounter {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            state: RepState::default(),
        }
    }

    pub fn thresholds(&self) -> &RepThresholds {
        &self.thresholds
    }

    pub fn state(&self) -> &RepState {
        &self.state
    }

    pub fn stance(&self) -> Option<Stance> {
        self.state.stance
    }

    /// Forget stance and timestamps
    pub fn reset(&mut self) {
        self.state = RepState::default();
    }

    /// Feed one smoothed knee angle observed at `now`
    pub fn update(&mut self, knee_angle: f32, now: Timestamp) -> RepTransition {
        let t = self.thresholds;

        if knee_angle > t.max_standing_angle {
            let previous = self.state.stance.replace(Stance::Standing);
            self.state.stood_up = Some(now);

            if previous != Some(Stance::Squatting) {
                return RepTransition::Standing;
            }

            // Cycle is closed either way so the same squat is never counted twice
            let cycle = self.state.squat_started.take().map(|down| now - down);
            self.state.stood_up = None;

            return match cycle {
                Some(cycle) if cycle < t.max_rep_duration => RepTransition::RepCounted { cycle },
                cycle => RepTransition::RepRejected { cycle },
            };
        }

        if knee_angle < t.min_squat_angle && self.state.stance == Some(Stance::Standing) {
            self.state.stance = Some(Stance::Squatting);
            self.state.squat_started = Some(now);
            return RepTransition::DepthReached;
        }

        RepTransition::Hold
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new(RepThresholds::default())
    }
}
