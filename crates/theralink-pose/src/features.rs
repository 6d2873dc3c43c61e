//! Feature extraction - joint angles from a landmark snapshot
//!
//! Each feature is the mean of the left and right side angle. Extraction is
//! all-or-nothing: if any landmark needed by any feature is missing, no
//! feature vector is produced. A half-computed vector mixing real angles with
//! gaps would look like a plausible pose to downstream thresholds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{joint_angle, Landmark, PoseSnapshot, Side};

/// Number of features per vector
pub const FEATURE_COUNT: usize = 5;

/// Joint whose angle is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointFeature {
    Knee,
    Hip,
    Ankle,
    Shoulder,
    Elbow,
}

impl JointFeature {
    /// All features in vector order
    pub fn all() -> &'static [JointFeature] {
        &[
            JointFeature::Knee,
            JointFeature::Hip,
            JointFeature::Ankle,
            JointFeature::Shoulder,
            JointFeature::Elbow,
        ]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            JointFeature::Knee => "knee",
            JointFeature::Hip => "hip",
            JointFeature::Ankle => "ankle",
            JointFeature::Shoulder => "shoulder",
            JointFeature::Elbow => "elbow",
        }
    }

    /// (proximal, vertex, distal) landmarks for one side
    pub fn triple(self, side: Side) -> (Landmark, Landmark, Landmark) {
        use Landmark::*;

        match (self, side) {
            (JointFeature::Knee, Side::Left) => (LeftHip, LeftKnee, LeftAnkle),
            (JointFeature::Knee, Side::Right) => (RightHip, RightKnee, RightAnkle),
            (JointFeature::Hip, Side::Left) => (LeftShoulder, LeftHip, LeftKnee),
            (JointFeature::Hip, Side::Right) => (RightShoulder, RightHip, RightKnee),
            (JointFeature::Ankle, Side::Left) => (LeftKnee, LeftAnkle, LeftHeel),
            (JointFeature::Ankle, Side::Right) => (RightKnee, RightAnkle, RightHeel),
            (JointFeature::Shoulder, Side::Left) => (LeftElbow, LeftShoulder, LeftHip),
            (JointFeature::Shoulder, Side::Right) => (RightElbow, RightShoulder, RightHip),
            (JointFeature::Elbow, Side::Left) => (LeftWrist, LeftElbow, LeftShoulder),
            (JointFeature::Elbow, Side::Right) => (RightWrist, RightElbow, RightShoulder),
        }
    }

    /// Every landmark any feature depends on
    pub fn required_landmarks() -> Vec<Landmark> {
        let mut landmarks: Vec<Landmark> = Self::all()
            .iter()
            .flat_map(|f| Side::both().map(|s| f.triple(s)))
            .flat_map(|(a, b, c)| [a, b, c])
            .collect();
        landmarks.sort();
        landmarks.dedup();
        landmarks
    }
}

/// Bilateral-averaged joint angles, in `JointFeature::all` order
///
/// The all-zero vector is the legacy "no reliable pose" marker, never a real
/// reading; prefer the `Option` returned by [`extract_features`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    pub const ZERO: FeatureVector = FeatureVector([0.0; FEATURE_COUNT]);

    pub fn new(values: [f32; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn get(&self, feature: JointFeature) -> f32 {
        self.0[feature.index()]
    }

    #[inline]
    pub fn knee(&self) -> f32 {
        self.get(JointFeature::Knee)
    }

    #[inline]
    pub fn hip(&self) -> f32 {
        self.get(JointFeature::Hip)
    }

    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

/// Named view of a feature vector, for analytics and persistence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointAngles(BTreeMap<JointFeature, f32>);

impl JointAngles {
    pub fn get(&self, feature: JointFeature) -> Option<f32> {
        self.0.get(&feature).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointFeature, f32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl From<&FeatureVector> for JointAngles {
    fn from(vector: &FeatureVector) -> Self {
        JointAngles(
            JointFeature::all()
                .iter()
                .map(|f| (*f, vector.get(*f)))
                .collect(),
        )
    }
}

/// Non-finite coordinates count as missing landmarks
fn side_angle(snapshot: &PoseSnapshot, feature: JointFeature, side: Side) -> Option<f32> {
    let (a, b, c) = feature.triple(side);
    let point = |landmark: Landmark| {
        snapshot
            .get(landmark)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
    };
    Some(joint_angle(point(a)?, point(b)?, point(c)?)).filter(|angle| angle.is_finite())
}

/// Extract the five joint angles, or `None` if the pose is absent or incomplete
pub fn extract_features(snapshot: Option<&PoseSnapshot>) -> Option<FeatureVector> {
    let snapshot = snapshot?;
    let mut values = [0.0; FEATURE_COUNT];

    for feature in JointFeature::all() {
        let left = side_angle(snapshot, *feature, Side::Left)?;
        let right = side_angle(snapshot, *feature, Side::Right)?;
        values[feature.index()] = (left + right) / 2.0;
    }

    Some(FeatureVector(values))
}

/// Extended extraction returning the named mapping alongside the vector
pub fn extract_joint_angles(snapshot: Option<&PoseSnapshot>) -> Option<(FeatureVector, JointAngles)> {
    let vector = extract_features(snapshot)?;
    let angles = JointAngles::from(&vector);
    Some((vector, angles))
}

/// Legacy zero-fallback form: the zero vector and an empty mapping when no reliable pose
pub fn features_or_zero(snapshot: Option<&PoseSnapshot>) -> (FeatureVector, JointAngles) {
    extract_joint_angles(snapshot).unwrap_or_default()
}
