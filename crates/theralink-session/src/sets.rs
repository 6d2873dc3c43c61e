//! Set and rest scheduling
//!
//! After `target_reps` reps the current set is complete. The session then
//! rests for `rest_duration`, during which frames are not counted, or ends
//! outright if that was the last set.

use std::time::Duration;

use theralink_core::{Timestamp, WorkoutConfig};

use crate::SessionCounters;

/// Result of checking the set after a counted rep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetProgress {
    /// More reps needed in this set
    InProgress,
    /// Set finished, rest period started
    RestStarted { completed_set: u32 },
    /// Final set finished; the session must end
    WorkoutComplete { completed_set: u32 },
}

/// Decides when sets end and rests expire
#[derive(Debug, Clone)]
pub struct SetScheduler {
    target_reps: u32,
    target_sets: u32,
    rest_duration: Duration,
}

impl SetScheduler {
    pub fn new(target_reps: u32, target_sets: u32, rest_duration: Duration) -> Self {
        Self {
            target_reps,
            target_sets,
            rest_duration,
        }
    }

    pub fn rest_duration(&self) -> Duration {
        self.rest_duration
    }

    /// Called after every counted rep
    pub fn on_rep_counted(&self, counters: &mut SessionCounters, now: Timestamp) -> SetProgress {
        if counters.reps_in_current_set < self.target_reps {
            return SetProgress::InProgress;
        }

        counters.current_set += 1;
        let completed_set = counters.current_set;

        if counters.current_set >= self.target_sets {
            return SetProgress::WorkoutComplete { completed_set };
        }

        counters.rest_active = true;
        counters.rest_start_time = Some(now);
        counters.reps_in_current_set = 0;
        SetProgress::RestStarted { completed_set }
    }

    /// End the rest once it has run its course; returns true if it just ended
    pub fn tick(&self, counters: &mut SessionCounters, now: Timestamp) -> bool {
        if !counters.rest_active {
            return false;
        }
        let Some(started) = counters.rest_start_time else {
            return false;
        };
        if now - started < self.rest_duration {
            return false;
        }

        counters.rest_active = false;
        counters.rest_start_time = None;
        counters.reps_in_current_set = 0;
        true
    }

    /// Time left in the current rest, `None` when not resting
    pub fn remaining_rest(&self, counters: &SessionCounters, now: Timestamp) -> Option<Duration> {
        if !counters.rest_active {
            return None;
        }
        let started = counters.rest_start_time?;
        Some(self.rest_duration.saturating_sub(now - started))
    }
}

impl From<&WorkoutConfig> for SetScheduler {
    fn from(config: &WorkoutConfig) -> Self {
        SetScheduler::new(config.target_reps, config.target_sets, config.rest_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters_with_reps(reps: u32) -> SessionCounters {
        SessionCounters {
            session_active: true,
            reps_in_current_set: reps,
            total_reps: reps,
            ..SessionCounters::default()
        }
    }

    #[test]
    fn test_in_progress_below_target() {
        let scheduler = SetScheduler::new(3, 2, Duration::from_secs(60));
        let mut counters = counters_with_reps(2);

        assert_eq!(
            scheduler.on_rep_counted(&mut counters, Timestamp::ZERO),
            SetProgress::InProgress
        );
        assert_eq!(counters.current_set, 0);
        assert!(!counters.rest_active);
    }

    #[test]
    fn test_rest_starts_after_set() {
        let scheduler = SetScheduler::new(3, 2, Duration::from_secs(60));
        let mut counters = counters_with_reps(3);
        let now = Timestamp::from_millis(5000);

        assert_eq!(
            scheduler.on_rep_counted(&mut counters, now),
            SetProgress::RestStarted { completed_set: 1 }
        );
        assert!(counters.rest_active);
        assert_eq!(counters.rest_start_time, Some(now));
        assert_eq!(counters.reps_in_current_set, 0);
        assert_eq!(
            scheduler.remaining_rest(&counters, now + Duration::from_secs(15)),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn test_last_set_completes_workout() {
        let scheduler = SetScheduler::new(1, 1, Duration::from_secs(60));
        let mut counters = counters_with_reps(1);

        assert_eq!(
            scheduler.on_rep_counted(&mut counters, Timestamp::ZERO),
            SetProgress::WorkoutComplete { completed_set: 1 }
        );
        assert!(!counters.rest_active);
    }

    #[test]
    fn test_rest_expires() {
        let scheduler = SetScheduler::new(2, 3, Duration::from_secs(60));
        let mut counters = counters_with_reps(2);
        let start = Timestamp::from_millis(1000);
        scheduler.on_rep_counted(&mut counters, start);

        assert!(!scheduler.tick(&mut counters, start + Duration::from_secs(59)));
        assert!(counters.rest_active);

        assert!(scheduler.tick(&mut counters, start + Duration::from_secs(60)));
        assert!(!counters.rest_active);
        assert_eq!(counters.reps_in_current_set, 0);
        assert!(scheduler.remaining_rest(&counters, start).is_none());

        // Already over
        assert!(!scheduler.tick(&mut counters, start + Duration::from_secs(120)));
    }
}
