//! Landmarks - Body keypoints reported by the pose detector
//!
//! Indices follow the 33-point BlazePose topology, so a detector's output
//! array maps onto `Landmark` by position.

use serde::{Deserialize, Serialize};

/// Anatomical keypoint, in detector index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    // Face
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,

    // Arms
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,

    // Hands
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,

    // Legs
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,

    // Feet
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Landmark {
    /// Number of landmarks
    pub const COUNT: usize = 33;

    /// All landmarks in detector order
    pub fn all() -> &'static [Landmark] {
        &[
            Landmark::Nose,
            Landmark::LeftEyeInner,
            Landmark::LeftEye,
            Landmark::LeftEyeOuter,
            Landmark::RightEyeInner,
            Landmark::RightEye,
            Landmark::RightEyeOuter,
            Landmark::LeftEar,
            Landmark::RightEar,
            Landmark::MouthLeft,
            Landmark::MouthRight,
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftElbow,
            Landmark::RightElbow,
            Landmark::LeftWrist,
            Landmark::RightWrist,
            Landmark::LeftPinky,
            Landmark::RightPinky,
            Landmark::LeftIndex,
            Landmark::RightIndex,
            Landmark::LeftThumb,
            Landmark::RightThumb,
            Landmark::LeftHip,
            Landmark::RightHip,
            Landmark::LeftKnee,
            Landmark::RightKnee,
            Landmark::LeftAnkle,
            Landmark::RightAnkle,
            Landmark::LeftHeel,
            Landmark::RightHeel,
            Landmark::LeftFootIndex,
            Landmark::RightFootIndex,
        ]
    }

    /// Detector index of this landmark
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Landmark> {
        Self::all().get(index).copied()
    }
}

/// Body side for bilateral joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn both() -> [Side; 2] {
        [Side::Left, Side::Right]
    }
}

/// Normalized 2D landmark position, x and y in [0, 1] of the frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// All landmarks seen in one frame; any of them may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    /// Indexed by `Landmark::index`
    points: Vec<Option<LandmarkPoint>>,
}

impl Default for PoseSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseSnapshot {
    /// Snapshot with every landmark missing
    pub fn new() -> Self {
        Self {
            points: vec![None; Landmark::COUNT],
        }
    }

    /// Build from a detector output array; entries past `Landmark::COUNT` are ignored
    pub fn from_detector(points: &[Option<LandmarkPoint>]) -> Self {
        let mut snapshot = Self::new();
        for (slot, point) in snapshot.points.iter_mut().zip(points) {
            *slot = *point;
        }
        snapshot
    }

    pub fn with(mut self, landmark: Landmark, point: LandmarkPoint) -> Self {
        self.set(landmark, point);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<LandmarkPoint> {
        self.points.get(landmark.index()).copied().flatten()
    }

    pub fn set(&mut self, landmark: Landmark, point: LandmarkPoint) {
        if let Some(slot) = self.points.get_mut(landmark.index()) {
            *slot = Some(point);
        }
    }

    /// Mark a landmark as not detected
    pub fn clear(&mut self, landmark: Landmark) {
        if let Some(slot) = self.points.get_mut(landmark.index()) {
            *slot = None;
        }
    }

    /// Number of landmarks present
    pub fn detected_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Are all of the given landmarks present?
    pub fn has_all(&self, landmarks: &[Landmark]) -> bool {
        landmarks.iter().all(|l| self.get(*l).is_some())
    }
}

impl FromIterator<(Landmark, LandmarkPoint)> for PoseSnapshot {
    fn from_iter<I: IntoIterator<Item = (Landmark, LandmarkPoint)>>(iter: I) -> Self {
        let mut snapshot = PoseSnapshot::new();
        for (landmark, point) in iter {
            snapshot.set(landmark, point);
        }
        snapshot
    }
}

/// Per-frame detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoseFrame {
    /// A body was found; individual landmarks may still be missing
    Detected(PoseSnapshot),
    /// Nobody in frame, or the detector failed
    NoPose,
}

impl PoseFrame {
    pub fn snapshot(&self) -> Option<&PoseSnapshot> {
        match self {
            PoseFrame::Detected(snapshot) => Some(snapshot),
            PoseFrame::NoPose => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, PoseFrame::Detected(_))
    }
}

impl From<Option<PoseSnapshot>> for PoseFrame {
    fn from(snapshot: Option<PoseSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => PoseFrame::Detected(snapshot),
            None => PoseFrame::NoPose,
        }
    }
}
