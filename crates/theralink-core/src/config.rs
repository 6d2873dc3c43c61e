//! Workout configuration
//!
//! All thresholds that drive rep and set detection live here. Defaults match
//! the stock squat program: 3 sets of 10 reps with a one minute rest.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{TheraLinkError, TheraLinkResult};

/// Reps per set
pub const DEFAULT_TARGET_REPS: u32 = 10;
/// Sets per workout
pub const DEFAULT_TARGET_SETS: u32 = 3;
/// Rest between sets
pub const DEFAULT_REST_DURATION: Duration = Duration::from_secs(60);
/// Knee angle (degrees) below which the subject is squatting
pub const DEFAULT_MIN_SQUAT_ANGLE: f32 = 70.0;
/// Knee angle (degrees) above which the subject is standing
pub const DEFAULT_MAX_STANDING_ANGLE: f32 = 160.0;
/// Samples per rolling angle window
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
/// Longest plausible down-to-up cycle
pub const DEFAULT_MAX_REP_DURATION: Duration = Duration::from_secs(10);
/// Roughly ten minutes of history at 30 fps
pub const DEFAULT_MAX_HISTORY_SAMPLES: usize = 18_000;

/// Squat workout parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutConfig {
    pub target_reps: u32,
    pub target_sets: u32,
    #[serde(with = "duration_secs")]
    pub rest_duration: Duration,
    pub min_squat_angle: f32,
    pub max_standing_angle: f32,
    pub smoothing_window: usize,
    #[serde(with = "duration_secs")]
    pub max_rep_duration: Duration,
    /// Upper bound on recorded angle samples; 0 disables the history
    pub max_history_samples: usize,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        WorkoutConfig {
            target_reps: DEFAULT_TARGET_REPS,
            target_sets: DEFAULT_TARGET_SETS,
            rest_duration: DEFAULT_REST_DURATION,
            min_squat_angle: DEFAULT_MIN_SQUAT_ANGLE,
            max_standing_angle: DEFAULT_MAX_STANDING_ANGLE,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            max_rep_duration: DEFAULT_MAX_REP_DURATION,
            max_history_samples: DEFAULT_MAX_HISTORY_SAMPLES,
        }
    }
}

impl WorkoutConfig {
    pub fn with_target_reps(mut self, reps: u32) -> Self {
        self.target_reps = reps;
        self
    }

    pub fn with_target_sets(mut self, sets: u32) -> Self {
        self.target_sets = sets;
        self
    }

    pub fn with_rest_duration(mut self, rest: Duration) -> Self {
        self.rest_duration = rest;
        self
    }

    pub fn with_angle_thresholds(mut self, min_squat: f32, max_standing: f32) -> Self {
        self.min_squat_angle = min_squat;
        self.max_standing_angle = max_standing;
        self
    }

    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    pub fn with_max_rep_duration(mut self, ceiling: Duration) -> Self {
        self.max_rep_duration = ceiling;
        self
    }

    pub fn with_max_history_samples(mut self, samples: usize) -> Self {
        self.max_history_samples = samples;
        self
    }

    /// Total reps across all sets
    pub fn total_rep_target(&self) -> u32 {
        self.target_reps.saturating_mul(self.target_sets)
    }

    /// Check that the thresholds describe a workout that can be completed
    pub fn validate(&self) -> TheraLinkResult<()> {
        if self.target_reps == 0 {
            return Err(TheraLinkError::InvalidConfig(
                "target_reps must be at least 1".into(),
            ));
        }
        if self.target_sets == 0 {
            return Err(TheraLinkError::InvalidConfig(
                "target_sets must be at least 1".into(),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(TheraLinkError::InvalidConfig(
                "smoothing_window must be at least 1".into(),
            ));
        }
        if self.max_rep_duration.is_zero() {
            return Err(TheraLinkError::InvalidConfig(
                "max_rep_duration must be positive".into(),
            ));
        }
        let in_range = |angle: f32| (0.0..=180.0).contains(&angle);
        if !in_range(self.min_squat_angle) || !in_range(self.max_standing_angle) {
            return Err(TheraLinkError::InvalidConfig(format!(
                "angle thresholds must lie in [0, 180], got {} and {}",
                self.min_squat_angle, self.max_standing_angle
            )));
        }
        if self.min_squat_angle >= self.max_standing_angle {
            return Err(TheraLinkError::InvalidConfig(format!(
                "min_squat_angle ({}) must be below max_standing_angle ({})",
                self.min_squat_angle, self.max_standing_angle
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> TheraLinkResult<Self> {
        let config: WorkoutConfig =
            serde_json::from_str(json).map_err(|e| TheraLinkError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TheraLinkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TheraLinkError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> TheraLinkResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TheraLinkError::Serialization(e.to_string()))
    }
}

/// Durations are written as fractional seconds
mod duration_secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
