//! TheraLink Session - Repetition counting and workout state
//!
//! This crate implements the motion-analysis state machine:
//! - Repetition detection from smoothed knee angles (STANDING ⇄ SQUATTING)
//! - Set completion and rest scheduling
//! - Session lifecycle (start / stop / tick) owning all mutable counters
//! - Per-frame results, events and the persisted session summary
//!
//! The crate performs no I/O. Sounds, rendering and storage subscribe to
//! the events and results it returns.

pub mod event;
pub mod feedback;
pub mod rep;
pub mod session;
pub mod sets;
pub mod summary;

pub use event::*;
pub use feedback::*;
pub use rep::*;
pub use session::*;
pub use sets::*;
pub use summary::*;
