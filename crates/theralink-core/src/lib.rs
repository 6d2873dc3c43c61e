//! TheraLink Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every TheraLink layer:
//! - Time primitives (Timestamp, Clock)
//! - Workout configuration and its defaults
//! - Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod time;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use time::*;
