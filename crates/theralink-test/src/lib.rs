//! TheraLink Test Harness - Simulated subjects and workout validation
//!
//! This crate provides:
//! - Synthetic 33-landmark poses for a given knee angle
//! - Seeded pose streams with landmark jitter and detection dropouts
//! - Squat cycle scripts for whole sets and workouts
//! - End-to-end scenarios through the session and the runtime

pub mod simulator;

#[cfg(test)]
mod scenarios;

pub use simulator::*;
