//! TheraLink Runtime - Frame pipeline and main loop
//!
//! Frame acquisition and presentation run on their own schedules; the
//! workout session is driven by a single task:
//! 1. Apply pending commands (start / stop / summary)
//! 2. Take the most recent frame, discarding anything older
//! 3. Process it through the session
//! 4. Publish the result snapshot and broadcast its events
//! 5. On timer ticks, expire rest periods even without frames

pub mod runtime;
pub mod slot;
pub mod snapshot;
pub mod telemetry;

pub use runtime::*;
pub use slot::*;
pub use snapshot::*;
pub use telemetry::*;
