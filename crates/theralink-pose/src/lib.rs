//! TheraLink Pose - From landmarks to joint angles
//!
//! The pose detector itself is an external oracle: per frame it either
//! reports normalized 2D landmarks or reports that nobody is visible.
//! This crate turns those snapshots into the angles the rep counter needs.
//!
//! # Pipeline
//!
//! - `landmark`: the 33-point body topology and per-frame snapshots
//! - `angle`: planar interior angle at a joint
//! - `features`: bilateral-averaged knee/hip/ankle/shoulder/elbow angles
//! - `smoothing`: rolling-mean windows that damp per-frame jitter

pub mod angle;
pub mod features;
pub mod landmark;
pub mod smoothing;

pub use angle::*;
pub use features::*;
pub use landmark::*;
pub use smoothing::*;
