//! Pose simulator for TheraLink testing
//!
//! Builds full-body landmark snapshots whose knee angle is known exactly,
//! then perturbs them the way a real detector does.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use theralink_core::Timestamp;
use theralink_pose::{Landmark, LandmarkPoint, PoseFrame, PoseSnapshot};

/// Thigh and shin length in normalized image units
const SEGMENT: f32 = 0.2;
/// Shoulder height above the hip
const TORSO: f32 = 0.25;
/// Upper arm and forearm length
const ARM: f32 = 0.12;
/// Horizontal distance between the left and right body halves
const HALF_WIDTH: f32 = 0.1;

/// Ideal pose with the given knee angle on both sides, in degrees
///
/// Image coordinates grow downwards. Each shin is vertical, the thigh is
/// rotated `knee_angle` away from it, the torso stays upright and the arms
/// hang straight down.
pub fn squat_pose(knee_angle: f32) -> PoseSnapshot {
    let theta = knee_angle.clamp(0.0, 180.0).to_radians();
    let mut snapshot = PoseSnapshot::new();

    for (x, left) in [(0.45, true), (0.45 + HALF_WIDTH, false)] {
        let knee = LandmarkPoint::new(x, 0.6);
        let ankle = LandmarkPoint::new(x, 0.6 + SEGMENT);
        let hip = LandmarkPoint::new(x + SEGMENT * theta.sin(), 0.6 + SEGMENT * theta.cos());
        let shoulder = LandmarkPoint::new(hip.x, hip.y - TORSO);
        let elbow = LandmarkPoint::new(shoulder.x, shoulder.y + ARM);
        let wrist = LandmarkPoint::new(shoulder.x, shoulder.y + 2.0 * ARM);
        let heel = LandmarkPoint::new(ankle.x - 0.03, ankle.y + 0.02);
        let toe = LandmarkPoint::new(ankle.x + 0.05, ankle.y + 0.02);
        let hand = LandmarkPoint::new(wrist.x, wrist.y + 0.02);

        let side = if left {
            [
                (Landmark::LeftShoulder, shoulder),
                (Landmark::LeftElbow, elbow),
                (Landmark::LeftWrist, wrist),
                (Landmark::LeftPinky, hand),
                (Landmark::LeftIndex, hand),
                (Landmark::LeftThumb, hand),
                (Landmark::LeftHip, hip),
                (Landmark::LeftKnee, knee),
                (Landmark::LeftAnkle, ankle),
                (Landmark::LeftHeel, heel),
                (Landmark::LeftFootIndex, toe),
            ]
        } else {
            [
                (Landmark::RightShoulder, shoulder),
                (Landmark::RightElbow, elbow),
                (Landmark::RightWrist, wrist),
                (Landmark::RightPinky, hand),
                (Landmark::RightIndex, hand),
                (Landmark::RightThumb, hand),
                (Landmark::RightHip, hip),
                (Landmark::RightKnee, knee),
                (Landmark::RightAnkle, ankle),
                (Landmark::RightHeel, heel),
                (Landmark::RightFootIndex, toe),
            ]
        };
        for (landmark, point) in side {
            snapshot.set(landmark, point);
        }
    }

    // Face sits above the shoulder midpoint
    let (Some(left), Some(right)) = (
        snapshot.get(Landmark::LeftShoulder),
        snapshot.get(Landmark::RightShoulder),
    ) else {
        return snapshot;
    };
    let head = LandmarkPoint::new((left.x + right.x) / 2.0, left.y - 0.1);
    for landmark in &Landmark::all()[..Landmark::LeftShoulder.index()] {
        snapshot.set(*landmark, head);
    }

    snapshot
}

/// Shape of one squat repetition, in frames
#[derive(Clone, Debug)]
pub struct SquatProfile {
    /// Knee angle while standing
    pub standing_angle: f32,
    /// Knee angle at the bottom of the squat
    pub bottom_angle: f32,
    pub stand_frames: usize,
    pub descend_frames: usize,
    pub bottom_frames: usize,
    pub ascend_frames: usize,
}

impl Default for SquatProfile {
    fn default() -> Self {
        SquatProfile {
            standing_angle: 175.0,
            bottom_angle: 60.0,
            stand_frames: 10,
            descend_frames: 6,
            bottom_frames: 10,
            ascend_frames: 6,
        }
    }
}

impl SquatProfile {
    /// Quarter squat that never reaches the depth threshold
    pub fn shallow() -> Self {
        SquatProfile {
            bottom_angle: 110.0,
            ..Self::default()
        }
    }

    /// Knee angles for one repetition, starting upright and ending on the way up
    pub fn rep(&self) -> Vec<f32> {
        let mut angles = Vec::with_capacity(self.frames_per_rep());
        angles.extend(std::iter::repeat(self.standing_angle).take(self.stand_frames));
        angles.extend(ramp(self.standing_angle, self.bottom_angle, self.descend_frames));
        angles.extend(std::iter::repeat(self.bottom_angle).take(self.bottom_frames));
        angles.extend(ramp(self.bottom_angle, self.standing_angle, self.ascend_frames));
        angles
    }

    /// `reps` repetitions followed by a closing stand so the last one completes
    pub fn reps(&self, reps: usize) -> Vec<f32> {
        let mut angles: Vec<f32> = (0..reps).flat_map(|_| self.rep()).collect();
        angles.extend(self.stand());
        angles
    }

    /// Standing still for one stand phase
    pub fn stand(&self) -> Vec<f32> {
        vec![self.standing_angle; self.stand_frames]
    }

    pub fn frames_per_rep(&self) -> usize {
        self.stand_frames + self.descend_frames + self.bottom_frames + self.ascend_frames
    }
}

/// `steps` evenly spaced angles after `from`, ending exactly on `to`
fn ramp(from: f32, to: f32, steps: usize) -> impl Iterator<Item = f32> {
    (1..=steps).map(move |i| from + (to - from) * i as f32 / steps as f32)
}

/// Simulated camera plus pose detector
///
/// Deterministic for a given seed.
pub struct PoseSimulator {
    rng: StdRng,
    /// Max per-coordinate landmark noise
    jitter: f32,
    /// Probability that a frame reports no person
    dropout: f64,
    frame_interval: Duration,
    now: Timestamp,
    frames: u64,
}

impl PoseSimulator {
    /// Noise-free simulator at 30 frames per second
    pub fn new(seed: u64) -> Self {
        PoseSimulator {
            rng: StdRng::seed_from_u64(seed),
            jitter: 0.0,
            dropout: 0.0,
            frame_interval: Duration::from_micros(33_333),
            now: Timestamp::ZERO,
            frames: 0,
        }
    }

    /// Typical webcam tracking quality
    pub fn realistic(seed: u64) -> Self {
        Self::new(seed).with_jitter(0.002).with_dropout(0.05)
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.now = start;
        self
    }

    /// Capture time of the next frame
    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Let time pass without producing frames
    pub fn skip(&mut self, duration: Duration) {
        self.now = self.now + duration;
    }

    /// Next frame showing the subject at `knee_angle`
    pub fn frame(&mut self, knee_angle: f32) -> (PoseFrame, Timestamp) {
        let captured_at = self.now;
        self.now = self.now + self.frame_interval;
        self.frames += 1;

        if self.dropout > 0.0 && self.rng.gen_bool(self.dropout) {
            return (PoseFrame::NoPose, captured_at);
        }

        let mut snapshot = squat_pose(knee_angle);
        if self.jitter > 0.0 {
            for landmark in Landmark::all() {
                if let Some(point) = snapshot.get(*landmark) {
                    let dx = self.rng.gen_range(-self.jitter..=self.jitter);
                    let dy = self.rng.gen_range(-self.jitter..=self.jitter);
                    snapshot.set(*landmark, LandmarkPoint::new(point.x + dx, point.y + dy));
                }
            }
        }
        (PoseFrame::Detected(snapshot), captured_at)
    }

    /// One frame per angle
    pub fn script(&mut self, knee_angles: &[f32]) -> Vec<(PoseFrame, Timestamp)> {
        knee_angles.iter().map(|angle| self.frame(*angle)).collect()
    }

    /// Frames of a subject holding still for `duration`
    pub fn hold(&mut self, knee_angle: f32, duration: Duration) -> Vec<(PoseFrame, Timestamp)> {
        let interval = self.frame_interval.as_micros().max(1);
        let count = duration.as_micros().div_ceil(interval) as usize;
        (0..count).map(|_| self.frame(knee_angle)).collect()
    }
}
