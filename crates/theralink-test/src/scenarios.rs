//! End-to-end workout scenarios
//!
//! Simulated subjects drive the whole stack: landmarks through feature
//! extraction, smoothing, rep counting, set scheduling and the runtime.

use std::sync::Arc;
use std::time::Duration;

use theralink_core::{ManualClock, Timestamp, WorkoutConfig};
use theralink_pose::{Landmark, PoseFrame};
use theralink_runtime::{RuntimeConfig, RuntimeHandle, WorkoutRuntime};
use theralink_session::{FrameResult, WorkoutEvent, WorkoutSession};

use crate::{squat_pose, PoseSimulator, SquatProfile};

fn run(session: &mut WorkoutSession, frames: Vec<(PoseFrame, Timestamp)>) -> Vec<FrameResult> {
    frames
        .iter()
        .map(|(frame, t)| session.process_frame(frame, *t))
        .collect()
}

fn count(results: &[FrameResult], event: impl Fn(&WorkoutEvent) -> bool) -> usize {
    results
        .iter()
        .flat_map(|r| r.events.iter())
        .filter(|e| event(e))
        .count()
}

#[test]
fn test_full_workout_with_rest() {
    let config = WorkoutConfig::default()
        .with_target_reps(3)
        .with_target_sets(2)
        .with_rest_duration(Duration::from_secs(5));
    let mut session = WorkoutSession::new(config).unwrap();
    let profile = SquatProfile::default();
    let mut sim = PoseSimulator::new(7);

    session.start(sim.now());

    let first_set = run(&mut session, sim.script(&profile.reps(3)));
    let last = first_set.last().unwrap();
    assert_eq!(last.total_reps, 3);
    assert_eq!(last.current_set, 1);
    assert!(last.rest_active);
    assert_eq!(count(&first_set, |e| matches!(e, WorkoutEvent::RepCounted { .. })), 3);
    assert_eq!(count(&first_set, |e| *e == WorkoutEvent::SetComplete { set: 1 }), 1);

    // Squats during the rest do not count
    let resting = run(&mut session, sim.script(&profile.reps(1)));
    assert_eq!(resting.last().unwrap().total_reps, 3);
    assert!(resting.iter().all(|r| r.rest_active));

    let waiting = run(&mut session, sim.hold(profile.standing_angle, Duration::from_secs(5)));
    assert_eq!(count(&waiting, |e| *e == WorkoutEvent::RestEnded { next_set: 2 }), 1);
    let rest_over = waiting
        .iter()
        .find(|r| r.events.contains(&WorkoutEvent::RestEnded { next_set: 2 }))
        .unwrap();
    assert_eq!(rest_over.feedback, "Rest over, start next set.");
    assert_eq!(waiting.last().unwrap().feedback, "Stand straight");
    assert!(!waiting.last().unwrap().rest_active);

    let second_set = run(&mut session, sim.script(&profile.reps(3)));
    assert_eq!(
        count(&second_set, |e| *e == WorkoutEvent::WorkoutComplete { total_reps: 6 }),
        1
    );
    let last = second_set.last().unwrap();
    assert!(!last.session_active);
    assert_eq!(last.feedback, "Workout complete!");

    let summary = session.summary();
    assert!(summary.completed);
    assert_eq!(summary.reps_achieved, 6);
    assert_eq!(summary.reps_target, 6);
    assert_eq!(summary.sets_achieved, 2);
    assert!(!summary.joint_angle_history.knee_angles.is_empty());
}

#[test]
fn test_counts_through_noise_and_dropouts() {
    for seed in 0..5 {
        let mut session = WorkoutSession::default();
        let mut sim = PoseSimulator::realistic(seed);
        session.start(sim.now());

        let results = run(&mut session, sim.script(&SquatProfile::default().reps(5)));
        assert_eq!(results.last().unwrap().total_reps, 5, "seed {}", seed);
        assert_eq!(
            count(&results, |e| matches!(e, WorkoutEvent::RepRejected { .. })),
            0,
            "seed {}",
            seed
        );
    }
}

#[test]
fn test_shallow_squats_never_count() {
    let mut session = WorkoutSession::default();
    let mut sim = PoseSimulator::new(11);
    session.start(sim.now());

    let results = run(&mut session, sim.script(&SquatProfile::shallow().reps(5)));
    assert_eq!(results.last().unwrap().total_reps, 0);
    assert_eq!(count(&results, |e| *e == WorkoutEvent::DepthReached), 0);
}

#[test]
fn test_slow_squat_rejected_then_normal_rep_counts() {
    let mut session = WorkoutSession::default();
    let mut sim = PoseSimulator::new(5);
    session.start(sim.now());

    // About 13 seconds at the bottom
    let slow = SquatProfile {
        bottom_frames: 400,
        ..SquatProfile::default()
    };
    let results = run(&mut session, sim.script(&slow.reps(1)));
    assert_eq!(results.last().unwrap().total_reps, 0);
    assert_eq!(count(&results, |e| matches!(e, WorkoutEvent::RepRejected { .. })), 1);

    let results = run(&mut session, sim.script(&SquatProfile::default().reps(1)));
    assert_eq!(results.last().unwrap().total_reps, 1);
}

#[test]
fn test_partial_body_keeps_rep_state() {
    let mut session = WorkoutSession::default();
    let profile = SquatProfile::default();
    let mut sim = PoseSimulator::new(9);
    session.start(sim.now());

    // Down to the bottom of a squat
    let bottom_end = profile.stand_frames + profile.descend_frames + profile.bottom_frames;
    let descent = profile.rep()[..bottom_end].to_vec();
    run(&mut session, sim.script(&descent));
    let before = *session.rep_state();

    let mut cropped = squat_pose(profile.bottom_angle);
    cropped.clear(Landmark::LeftAnkle);
    let result = session.process_frame(&PoseFrame::Detected(cropped), sim.now());
    assert_eq!(result.feedback, "Adjust camera: ensure full body is visible.");
    assert_eq!(*session.rep_state(), before);

    let rising: Vec<f32> = profile.rep()[profile.frames_per_rep() - profile.ascend_frames..]
        .iter()
        .copied()
        .chain(profile.stand())
        .collect();
    let results = run(&mut session, sim.script(&rising));
    assert_eq!(results.last().unwrap().total_reps, 1);
}

fn spawn_runtime(config: WorkoutConfig) -> (RuntimeHandle, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let handle = WorkoutRuntime::spawn(
        WorkoutSession::new(config).unwrap(),
        clock.clone(),
        RuntimeConfig {
            tick_interval: Duration::from_millis(5),
            event_capacity: 256,
        },
    );
    (handle, clock)
}

/// Submit one frame and wait until the pipeline has processed it
async fn deliver(handle: &RuntimeHandle, clock: &ManualClock, frame: PoseFrame, at: Timestamp) {
    clock.set(at);
    let before = handle.stats().frames_processed;
    handle.submit_frame(frame, at).unwrap();
    for _ in 0..2000 {
        if handle.stats().frames_processed > before {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("frame at {:?} was never processed", at);
}

async fn wait_for(handle: &RuntimeHandle, check: impl Fn(&FrameResult) -> bool) -> bool {
    for _ in 0..1000 {
        if check(&handle.latest()) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}

#[tokio::test]
async fn test_runtime_counts_reps() {
    let (handle, clock) = spawn_runtime(WorkoutConfig::default());
    let mut events = handle.subscribe();
    let mut sim = PoseSimulator::new(21);

    handle.start().unwrap();
    for (frame, at) in sim.script(&SquatProfile::default().reps(2)) {
        deliver(&handle, &clock, frame, at).await;
    }

    assert_eq!(handle.latest().total_reps, 2);
    assert_eq!(handle.dropped_frames(), 0);

    let mut reps = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let WorkoutEvent::RepCounted { total, .. } = event {
            reps.push(total);
        }
    }
    assert_eq!(reps, vec![1, 2]);

    let summary = handle.shutdown().await.unwrap();
    assert_eq!(summary.reps_achieved, 2);
    assert!(!summary.completed);
}

#[tokio::test]
async fn test_runtime_ends_rest_without_frames() {
    let config = WorkoutConfig::default()
        .with_target_reps(1)
        .with_target_sets(2)
        .with_rest_duration(Duration::from_secs(3));
    let (handle, clock) = spawn_runtime(config);
    let mut sim = PoseSimulator::new(4);

    handle.start().unwrap();
    for (frame, at) in sim.script(&SquatProfile::default().reps(1)) {
        deliver(&handle, &clock, frame, at).await;
    }
    assert!(handle.latest().rest_active);

    clock.advance(Duration::from_secs(3));
    assert!(wait_for(&handle, |r| !r.rest_active).await);

    let latest = handle.latest();
    assert!(latest.session_active);
    assert_eq!(latest.feedback, "Rest over, start next set.");
    assert!(latest.remaining_rest_seconds.is_none());

    let summary = handle.stop().await.unwrap().unwrap();
    assert_eq!(summary.sets_achieved, 1);
    assert!(!summary.completed);
}

#[tokio::test]
async fn test_runtime_keeps_only_latest_frame() {
    let (handle, _clock) = spawn_runtime(WorkoutConfig::default());
    let mut sim = PoseSimulator::new(2);
    handle.start().unwrap();

    // No await between submissions, so the pipeline cannot keep up
    for (frame, at) in sim.script(&[175.0; 100]) {
        handle.submit_frame(frame, at).unwrap();
    }

    let mut drained = false;
    for _ in 0..1000 {
        if handle.stats().frames_processed + handle.dropped_frames() == 100 {
            drained = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(drained);
    assert!(handle.dropped_frames() > 0);
    assert!(handle.latest().smoothed_knee_angle.is_some());

    handle.shutdown().await.unwrap();
}
