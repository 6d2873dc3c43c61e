//! Feedback messages shown to the exerciser

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current coaching message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    StandStraight,
    GetReady,
    GoodDepth,
    RepCounted,
    ControlledSquat,
    SetComplete { set: u32, rest_secs: u64 },
    RestOver,
    WorkoutComplete,
    SessionEnded,
    NoPersonDetected,
    BodyNotVisible,
}

impl Default for Feedback {
    fn default() -> Self {
        Feedback::StandStraight
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::StandStraight => f.write_str("Stand straight"),
            Feedback::GetReady => f.write_str("Get ready!"),
            Feedback::GoodDepth => f.write_str("Good depth"),
            Feedback::RepCounted => f.write_str("Rep counted!"),
            Feedback::ControlledSquat => {
                f.write_str("Keep standing, or perform a controlled squat.")
            }
            Feedback::SetComplete { set, rest_secs } => {
                write!(f, "Set {} complete! Rest for {} seconds.", set, rest_secs)
            }
            Feedback::RestOver => f.write_str("Rest over, start next set."),
            Feedback::WorkoutComplete => f.write_str("Workout complete!"),
            Feedback::SessionEnded => f.write_str("Session ended."),
            Feedback::NoPersonDetected => f.write_str("No person detected. Adjust camera."),
            Feedback::BodyNotVisible => {
                f.write_str("Adjust camera: ensure full body is visible.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_text() {
        assert_eq!(Feedback::RepCounted.to_string(), "Rep counted!");
        assert_eq!(
            Feedback::SetComplete { set: 2, rest_secs: 60 }.to_string(),
            "Set 2 complete! Rest for 60 seconds."
        );
        assert_eq!(Feedback::default().to_string(), "Stand straight");
    }
}
