//! Session summary handed to the storage layer when a workout ends

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use theralink_core::{TheraLinkError, TheraLinkResult};

/// Smoothed angles recorded for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    /// Seconds since session start
    pub t: f64,
    pub knee: f32,
    pub hip: f32,
}

/// Bounded record of smoothed angles; oldest samples dropped first
#[derive(Debug, Clone)]
pub struct AngleHistory {
    capacity: usize,
    samples: VecDeque<AngleSample>,
}

impl AngleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, sample: AngleSample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AngleSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Column layout of the angle history as stored with the session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointAngleHistory {
    pub timestamps: Vec<f64>,
    pub knee_angles: Vec<f32>,
    pub hip_angles: Vec<f32>,
}

impl From<&AngleHistory> for JointAngleHistory {
    fn from(history: &AngleHistory) -> Self {
        let mut columns = JointAngleHistory {
            timestamps: Vec::with_capacity(history.len()),
            knee_angles: Vec::with_capacity(history.len()),
            hip_angles: Vec::with_capacity(history.len()),
        };
        for sample in history.iter() {
            columns.timestamps.push(sample.t);
            columns.knee_angles.push(sample.knee);
            columns.hip_angles.push(sample.hip);
        }
        columns
    }
}

/// Final workout figures for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub reps_achieved: u32,
    /// Reps per set times sets
    pub reps_target: u32,
    pub sets_achieved: u32,
    pub sets_target: u32,
    pub duration_seconds: u64,
    /// Every set was finished
    pub completed: bool,
    /// Last feedback shown
    pub feedback: String,
    pub joint_angle_history: JointAngleHistory,
}

impl SessionSummary {
    pub fn to_json(&self) -> TheraLinkResult<String> {
        serde_json::to_string(self).map_err(|e| TheraLinkError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> TheraLinkResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TheraLinkError::Serialization(e.to_string()))
    }
}
