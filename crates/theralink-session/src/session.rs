//! Workout session - owns all mutable workout state
//!
//! Every mutation goes through `start`, `stop`, `tick` or one of the frame
//! processing calls. Consumers only ever see a `FrameResult` copy or a
//! shared reference to `SessionCounters`.

use std::time::Duration;

use theralink_core::{TheraLinkResult, Timestamp, WorkoutConfig};
use theralink_pose::{extract_features, AngleSmoother, JointFeature, PoseFrame};
use tracing::{debug, info};

use crate::{
    AngleHistory, AngleSample, Feedback, FrameResult, JointAngleHistory, RepCounter, RepState,
    RepThresholds, RepTransition, SessionSummary, SetProgress, SetScheduler, WorkoutEvent,
};

/// Workout counters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionCounters {
    pub total_reps: u32,
    pub reps_in_current_set: u32,
    /// Completed sets
    pub current_set: u32,
    pub session_active: bool,
    pub rest_active: bool,
    pub rest_start_time: Option<Timestamp>,
    pub elapsed: Duration,
}

impl SessionCounters {
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.as_secs()
    }
}

/// Squat workout orchestrator
pub struct WorkoutSession {
    config: WorkoutConfig,
    counters: SessionCounters,
    started_at: Option<Timestamp>,
    reps: RepCounter,
    scheduler: SetScheduler,
    smoother: AngleSmoother,
    history: AngleHistory,
    feedback: Feedback,
    /// Latest `now` seen by any operation
    last_update: Timestamp,
}

impl WorkoutSession {
    /// Create an idle session; fails if the configuration is unusable
    pub fn new(config: WorkoutConfig) -> TheraLinkResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: WorkoutConfig) -> Self {
        Self {
            counters: SessionCounters::default(),
            started_at: None,
            reps: RepCounter::new(RepThresholds::from(&config)),
            scheduler: SetScheduler::from(&config),
            smoother: AngleSmoother::new(config.smoothing_window),
            history: AngleHistory::new(config.max_history_samples),
            feedback: Feedback::default(),
            last_update: Timestamp::ZERO,
            config,
        }
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn rep_state(&self) -> &RepState {
        self.reps.state()
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn is_active(&self) -> bool {
        self.counters.session_active
    }

    pub fn is_resting(&self) -> bool {
        self.counters.rest_active
    }

    pub fn smoothed_angle(&self, joint: JointFeature) -> Option<f32> {
        self.smoother.value(joint)
    }

    pub fn history(&self) -> &AngleHistory {
        &self.history
    }

    /// Begin a workout; no-op if one is already running
    pub fn start(&mut self, now: Timestamp) -> Vec<WorkoutEvent> {
        self.observe_time(now);
        if self.counters.session_active {
            return Vec::new();
        }

        self.counters = SessionCounters {
            session_active: true,
            ..SessionCounters::default()
        };
        self.started_at = Some(now);
        self.reps.reset();
        self.smoother.clear();
        self.history.clear();
        self.feedback = Feedback::GetReady;

        info!(
            target_reps = self.config.target_reps,
            target_sets = self.config.target_sets,
            "workout session started"
        );
        vec![WorkoutEvent::SessionStarted]
    }

    /// End the workout and return its summary; `None` if nothing was running
    ///
    /// Counters stay readable after stopping.
    pub fn stop(&mut self, now: Timestamp) -> Option<SessionSummary> {
        self.observe_time(now);
        if !self.counters.session_active {
            return None;
        }

        self.feedback = Feedback::SessionEnded;
        self.end_session(now);
        Some(self.summary())
    }

    /// Advance session time and expire a finished rest
    pub fn tick(&mut self, now: Timestamp) -> Vec<WorkoutEvent> {
        self.observe_time(now);
        let mut events = Vec::new();
        if !self.counters.session_active {
            return events;
        }

        if let Some(started) = self.started_at {
            self.counters.elapsed = now - started;
        }

        if self.scheduler.tick(&mut self.counters, now) {
            let next_set = self.counters.current_set + 1;
            info!(next_set, "rest over");
            self.feedback = Feedback::RestOver;
            events.push(WorkoutEvent::RestEnded { next_set });
        }

        events
    }

    /// Process one detector output
    pub fn process_frame(&mut self, frame: &PoseFrame, now: Timestamp) -> FrameResult {
        let mut events = self.tick(now);

        match frame.snapshot() {
            None => self.feedback = Feedback::NoPersonDetected,
            Some(snapshot) => match extract_features(Some(snapshot)) {
                Some(features) => self.observe(features.knee(), features.hip(), now, &mut events),
                None => self.feedback = Feedback::BodyNotVisible,
            },
        }

        self.result(now, events)
    }

    /// Process raw knee and hip angles that were computed elsewhere
    pub fn process_angles(&mut self, knee: f32, hip: f32, now: Timestamp) -> FrameResult {
        let mut events = self.tick(now);
        self.observe(knee, hip, now, &mut events);
        self.result(now, events)
    }

    /// Current state without processing anything
    pub fn snapshot(&self) -> FrameResult {
        self.result(self.last_update, Vec::new())
    }

    /// Summary of the current or most recent workout
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            reps_achieved: self.counters.total_reps,
            reps_target: self.config.total_rep_target(),
            sets_achieved: self.counters.current_set,
            sets_target: self.config.target_sets,
            duration_seconds: self.counters.elapsed_seconds(),
            completed: self.counters.current_set >= self.config.target_sets,
            feedback: self.feedback.to_string(),
            joint_angle_history: JointAngleHistory::from(&self.history),
        }
    }

    fn observe_time(&mut self, now: Timestamp) {
        if now > self.last_update {
            self.last_update = now;
        }
    }

    fn observe(&mut self, knee_raw: f32, hip_raw: f32, now: Timestamp, events: &mut Vec<WorkoutEvent>) {
        if !knee_raw.is_finite() || !hip_raw.is_finite() {
            self.feedback = Feedback::BodyNotVisible;
            return;
        }
        self.smoother.push(JointFeature::Knee, knee_raw);
        self.smoother.push(JointFeature::Hip, hip_raw);
        let (Some(knee), Some(hip)) = (
            self.smoother.value(JointFeature::Knee),
            self.smoother.value(JointFeature::Hip),
        ) else {
            return;
        };

        if !self.counters.session_active {
            return;
        }
        if let Some(started) = self.started_at {
            self.history.record(AngleSample {
                t: (now - started).as_secs_f64(),
                knee,
                hip,
            });
        }
        if self.counters.rest_active {
            return;
        }

        let rest_just_ended = events
            .iter()
            .any(|e| matches!(e, WorkoutEvent::RestEnded { .. }));
        match self.reps.update(knee, now) {
            RepTransition::Hold => {}
            // The frame that ends a rest keeps announcing it
            RepTransition::Standing if !rest_just_ended => {
                self.feedback = Feedback::StandStraight;
            }
            RepTransition::Standing => {}
            RepTransition::DepthReached => {
                self.feedback = Feedback::GoodDepth;
                events.push(WorkoutEvent::DepthReached);
            }
            RepTransition::RepCounted { cycle } => self.count_rep(cycle, now, events),
            RepTransition::RepRejected { cycle } => {
                debug!(?cycle, "squat cycle too long, not counted");
                self.feedback = Feedback::ControlledSquat;
                events.push(WorkoutEvent::RepRejected {
                    cycle_secs: cycle.map(|c| c.as_secs_f64()),
                });
            }
        }
    }

    fn count_rep(&mut self, cycle: Duration, now: Timestamp, events: &mut Vec<WorkoutEvent>) {
        self.counters.total_reps += 1;
        self.counters.reps_in_current_set += 1;
        self.feedback = Feedback::RepCounted;
        debug!(
            in_set = self.counters.reps_in_current_set,
            total = self.counters.total_reps,
            cycle_ms = cycle.as_millis() as u64,
            "rep counted"
        );
        events.push(WorkoutEvent::RepCounted {
            total: self.counters.total_reps,
            in_set: self.counters.reps_in_current_set,
        });

        match self.scheduler.on_rep_counted(&mut self.counters, now) {
            SetProgress::InProgress => {}
            SetProgress::RestStarted { completed_set } => {
                let rest_secs = self.scheduler.rest_duration().as_secs();
                info!(set = completed_set, rest_secs, "set complete, resting");
                self.feedback = Feedback::SetComplete {
                    set: completed_set,
                    rest_secs,
                };
                events.push(WorkoutEvent::SetComplete { set: completed_set });
                events.push(WorkoutEvent::RestStarted {
                    duration_secs: rest_secs,
                });
            }
            SetProgress::WorkoutComplete { completed_set } => {
                info!(
                    set = completed_set,
                    total_reps = self.counters.total_reps,
                    "workout complete"
                );
                self.feedback = Feedback::WorkoutComplete;
                events.push(WorkoutEvent::SetComplete { set: completed_set });
                events.push(WorkoutEvent::WorkoutComplete {
                    total_reps: self.counters.total_reps,
                });
                self.end_session(now);
                events.push(WorkoutEvent::SessionStopped);
            }
        }
    }

    fn end_session(&mut self, now: Timestamp) {
        if let Some(started) = self.started_at {
            self.counters.elapsed = now - started;
        }
        self.counters.session_active = false;
        self.counters.rest_active = false;
        self.counters.rest_start_time = None;

        info!(
            total_reps = self.counters.total_reps,
            sets = self.counters.current_set,
            duration_secs = self.counters.elapsed_seconds(),
            "workout session stopped"
        );
    }

    fn result(&self, now: Timestamp, events: Vec<WorkoutEvent>) -> FrameResult {
        let remaining_rest_seconds = self
            .scheduler
            .remaining_rest(&self.counters, now)
            .map(|left| left.as_secs() + u64::from(left.subsec_nanos() > 0));

        FrameResult {
            feedback: self.feedback.to_string(),
            reps_in_current_set: self.counters.reps_in_current_set,
            total_reps: self.counters.total_reps,
            current_set: self.counters.current_set,
            rest_active: self.counters.rest_active,
            remaining_rest_seconds,
            smoothed_knee_angle: self.smoother.value(JointFeature::Knee),
            smoothed_hip_angle: self.smoother.value(JointFeature::Hip),
            session_active: self.counters.session_active,
            elapsed_seconds: self.counters.elapsed_seconds(),
            events,
        }
    }
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::with_valid_config(WorkoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theralink_pose::PoseSnapshot;

    const HIP: f32 = 170.0;

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    /// Raw angles pass through unsmoothed
    fn unsmoothed(config: WorkoutConfig) -> WorkoutSession {
        WorkoutSession::new(config.with_smoothing_window(1)).unwrap()
    }

    fn feed(session: &mut WorkoutSession, readings: &[(f32, f64)]) -> Vec<FrameResult> {
        readings
            .iter()
            .map(|(knee, secs)| session.process_angles(*knee, HIP, at(*secs)))
            .collect()
    }

    /// One valid squat cycle starting at `t0`
    fn rep_cycle(t0: f64) -> Vec<(f32, f64)> {
        vec![(170.0, t0), (65.0, t0 + 0.5), (65.0, t0 + 1.0), (172.0, t0 + 1.5)]
    }

    #[test]
    fn test_one_rep_counted() {
        let mut session = unsmoothed(WorkoutConfig::default());
        session.start(at(0.0));

        let results = feed(
            &mut session,
            &[(170.0, 0.0), (170.0, 0.5), (65.0, 1.0), (65.0, 1.5), (65.0, 2.0), (172.0, 2.5)],
        );

        let last = results.last().unwrap();
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.reps_in_current_set, 1);
        assert_eq!(last.feedback, "Rep counted!");
        assert!(last.rep_counted());
        assert_eq!(results[2].feedback, "Good depth");
    }

    #[test]
    fn test_slow_cycle_not_counted() {
        let mut session = unsmoothed(WorkoutConfig::default());
        session.start(at(0.0));

        let results = feed(
            &mut session,
            &[(170.0, 0.0), (170.0, 1.0), (65.0, 1.5), (65.0, 6.0), (65.0, 9.0), (172.0, 12.0)],
        );

        let last = results.last().unwrap();
        assert_eq!(last.total_reps, 0);
        assert_eq!(last.feedback, "Keep standing, or perform a controlled squat.");
        assert!(last.has_event(|e| matches!(e, WorkoutEvent::RepRejected { .. })));
    }

    #[test]
    fn test_rest_between_sets() {
        let mut session = unsmoothed(WorkoutConfig::default().with_target_reps(2));
        session.start(at(0.0));

        feed(&mut session, &rep_cycle(0.0));
        let results = feed(&mut session, &rep_cycle(2.0));
        let last = results.last().unwrap();

        assert_eq!(last.total_reps, 2);
        assert_eq!(last.reps_in_current_set, 0);
        assert_eq!(last.current_set, 1);
        assert!(last.rest_active);
        assert_eq!(last.remaining_rest_seconds, Some(60));
        assert_eq!(last.feedback, "Set 1 complete! Rest for 60 seconds.");
        assert!(last.has_event(|e| *e == WorkoutEvent::RestStarted { duration_secs: 60 }));

        let rest_started = at(3.5);
        let events = session.tick(rest_started + Duration::from_secs(61));
        assert_eq!(events, vec![WorkoutEvent::RestEnded { next_set: 2 }]);

        let snapshot = session.snapshot();
        assert!(!snapshot.rest_active);
        assert_eq!(snapshot.reps_in_current_set, 0);
        assert_eq!(snapshot.feedback, "Rest over, start next set.");
        assert!(snapshot.remaining_rest_seconds.is_none());
    }

    #[test]
    fn test_frames_frozen_during_rest() {
        let mut session = unsmoothed(WorkoutConfig::default().with_target_reps(1));
        session.start(at(0.0));
        feed(&mut session, &rep_cycle(0.0));
        assert!(session.is_resting());

        let results = feed(&mut session, &rep_cycle(2.0));
        let last = results.last().unwrap();
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.remaining_rest_seconds, Some(60 - 2));
        assert_eq!(last.smoothed_knee_angle, Some(172.0));
    }

    #[test]
    fn test_final_set_ends_session() {
        let mut session = unsmoothed(
            WorkoutConfig::default()
                .with_target_reps(1)
                .with_target_sets(1),
        );
        session.start(at(0.0));

        let results = feed(&mut session, &rep_cycle(0.0));
        let last = results.last().unwrap();

        assert!(!last.session_active);
        assert!(!last.rest_active);
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.feedback, "Workout complete!");
        assert_eq!(
            last.events,
            vec![
                WorkoutEvent::RepCounted { total: 1, in_set: 1 },
                WorkoutEvent::SetComplete { set: 1 },
                WorkoutEvent::WorkoutComplete { total_reps: 1 },
                WorkoutEvent::SessionStopped,
            ]
        );

        let summary = session.summary();
        assert!(summary.completed);
        assert_eq!(summary.reps_achieved, 1);
        assert_eq!(summary.sets_achieved, 1);
        assert_eq!(summary.reps_target, 1);
    }

    #[test]
    fn test_no_detection_mid_squat_leaves_state() {
        let mut session = unsmoothed(WorkoutConfig::default());
        session.start(at(0.0));
        feed(&mut session, &[(170.0, 0.0), (65.0, 0.5)]);
        let before = *session.rep_state();

        let result = session.process_frame(&PoseFrame::NoPose, at(1.0));
        assert_eq!(*session.rep_state(), before);
        assert_eq!(result.total_reps, 0);
        assert_eq!(result.feedback, "No person detected. Adjust camera.");

        let result = session.process_frame(&PoseFrame::Detected(PoseSnapshot::new()), at(1.2));
        assert_eq!(*session.rep_state(), before);
        assert_eq!(result.feedback, "Adjust camera: ensure full body is visible.");

        // The squat in progress still completes afterwards
        let results = feed(&mut session, &[(172.0, 1.5)]);
        assert_eq!(results[0].total_reps, 1);
    }

    #[test]
    fn test_idle_session_ignores_squats() {
        let mut session = unsmoothed(WorkoutConfig::default());
        let results = feed(&mut session, &rep_cycle(0.0));

        assert_eq!(results.last().unwrap().total_reps, 0);
        assert_eq!(results.last().unwrap().smoothed_knee_angle, Some(172.0));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut session = WorkoutSession::default();
        assert!(session.stop(at(0.0)).is_none());

        assert_eq!(session.start(at(1.0)), vec![WorkoutEvent::SessionStarted]);
        assert!(session.start(at(2.0)).is_empty());

        let summary = session.stop(at(31.0)).unwrap();
        assert_eq!(summary.duration_seconds, 30);
        assert!(!summary.completed);
        assert_eq!(summary.feedback, "Session ended.");
        assert!(session.stop(at(40.0)).is_none());
        assert_eq!(session.counters().elapsed_seconds(), 30);
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut session = unsmoothed(WorkoutConfig::default());
        session.start(at(0.0));
        feed(&mut session, &rep_cycle(0.0));
        session.stop(at(5.0));
        assert_eq!(session.counters().total_reps, 1);

        session.start(at(10.0));
        assert_eq!(session.counters().total_reps, 0);
        assert!(session.rep_state().stance.is_none());
        assert_eq!(session.feedback(), Feedback::GetReady);
        assert!(session.smoothed_angle(JointFeature::Knee).is_none());
    }

    #[test]
    fn test_tick_tracks_elapsed_time() {
        let mut session = WorkoutSession::default();
        session.start(at(5.0));
        session.tick(at(65.4));
        assert_eq!(session.snapshot().elapsed_seconds, 60);
    }

    #[test]
    fn test_history_recorded_while_active() {
        let mut session = unsmoothed(WorkoutConfig::default());
        session.start(at(1.0));
        feed(&mut session, &rep_cycle(1.0));

        let summary = session.stop(at(3.0)).unwrap();
        let history = summary.joint_angle_history;
        assert_eq!(history.knee_angles, vec![170.0, 65.0, 65.0, 172.0]);
        assert_eq!(history.timestamps, vec![0.0, 0.5, 1.0, 1.5]);
        assert!(history.hip_angles.iter().all(|h| *h == HIP));
    }

    #[test]
    fn test_smoothing_damps_single_outlier() {
        let mut session = WorkoutSession::new(WorkoutConfig::default()).unwrap();
        session.start(at(0.0));

        let mut readings: Vec<(f32, f64)> = (0..5).map(|i| (170.0, i as f64 * 0.1)).collect();
        readings.push((40.0, 0.5));
        readings.push((170.0, 0.6));
        let results = feed(&mut session, &readings);

        assert!(results
            .iter()
            .all(|r| !r.has_event(|e| *e == WorkoutEvent::DepthReached)));
        assert_eq!(session.rep_state().stance, Some(crate::Stance::Standing));
    }

    #[test]
    fn test_frame_ending_rest_reports_rest_over() {
        let mut session = unsmoothed(WorkoutConfig::default().with_target_reps(1));
        session.start(at(0.0));
        feed(&mut session, &rep_cycle(0.0));
        assert!(session.is_resting());

        let result = session.process_angles(178.0, HIP, at(70.0));
        assert!(!result.rest_active);
        assert_eq!(result.events, vec![WorkoutEvent::RestEnded { next_set: 2 }]);
        assert_eq!(result.feedback, "Rest over, start next set.");

        // Next standing frame goes back to the usual cue
        let result = session.process_angles(178.0, HIP, at(70.1));
        assert_eq!(result.feedback, "Stand straight");
    }

    #[test]
    fn test_non_finite_angles_are_not_smoothed() {
        let mut session = WorkoutSession::default();
        session.start(at(0.0));

        let result = session.process_angles(f32::NAN, HIP, at(0.0));
        assert_eq!(result.feedback, "Adjust camera: ensure full body is visible.");
        assert!(result.smoothed_knee_angle.is_none());

        for i in 1..5 {
            session.process_angles(170.0, HIP, at(i as f64 * 0.1));
        }
        assert_eq!(session.smoothed_angle(JointFeature::Knee), Some(170.0));

        let summary = session.stop(at(1.0)).unwrap();
        assert_eq!(summary.joint_angle_history.knee_angles.len(), 4);
        let json = summary.to_json().unwrap();
        let parsed: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_frame_with_non_finite_landmark_degrades() {
        let mut session = WorkoutSession::default();
        session.start(at(0.0));

        let mut snapshot = PoseSnapshot::new();
        for landmark in JointFeature::required_landmarks() {
            snapshot.set(landmark, theralink_pose::LandmarkPoint::new(0.5, 0.5));
        }
        snapshot.set(
            theralink_pose::Landmark::LeftKnee,
            theralink_pose::LandmarkPoint::new(f32::NAN, 0.6),
        );
        let result = session.process_frame(&PoseFrame::Detected(snapshot), at(0.1));

        assert_eq!(result.feedback, "Adjust camera: ensure full body is visible.");
        assert!(result.smoothed_knee_angle.is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(WorkoutSession::new(WorkoutConfig::default().with_target_reps(0)).is_err());
    }
}
