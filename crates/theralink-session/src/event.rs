//! Workout events and per-frame results
//!
//! Events replace direct side effects: the presentation layer maps them to
//! sounds and notifications.

use serde::{Deserialize, Serialize};

/// Something noteworthy that happened while processing a frame or tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutEvent {
    SessionStarted,
    /// Knee angle dropped below the squat threshold
    DepthReached,
    RepCounted { total: u32, in_set: u32 },
    /// A down-up cycle took too long to be a real rep
    RepRejected { cycle_secs: Option<f64> },
    SetComplete { set: u32 },
    RestStarted { duration_secs: u64 },
    RestEnded { next_set: u32 },
    WorkoutComplete { total_reps: u32 },
    SessionStopped,
}

impl WorkoutEvent {
    /// Event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutEvent::SessionStarted => "session_started",
            WorkoutEvent::DepthReached => "depth_reached",
            WorkoutEvent::RepCounted { .. } => "rep_counted",
            WorkoutEvent::RepRejected { .. } => "rep_rejected",
            WorkoutEvent::SetComplete { .. } => "set_complete",
            WorkoutEvent::RestStarted { .. } => "rest_started",
            WorkoutEvent::RestEnded { .. } => "rest_ended",
            WorkoutEvent::WorkoutComplete { .. } => "workout_complete",
            WorkoutEvent::SessionStopped => "session_stopped",
        }
    }
}

/// What the presentation layer shows after each processed frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameResult {
    pub feedback: String,
    pub reps_in_current_set: u32,
    pub total_reps: u32,
    pub current_set: u32,
    pub rest_active: bool,
    pub remaining_rest_seconds: Option<u64>,
    pub smoothed_knee_angle: Option<f32>,
    pub smoothed_hip_angle: Option<f32>,
    pub session_active: bool,
    pub elapsed_seconds: u64,
    /// Events produced by this frame only
    pub events: Vec<WorkoutEvent>,
}

impl FrameResult {
    pub fn has_event(&self, predicate: impl Fn(&WorkoutEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }

    pub fn rep_counted(&self) -> bool {
        self.has_event(|e| matches!(e, WorkoutEvent::RepCounted { .. }))
    }
}
