//! TheraLink Squat Demo
//!
//! Runs a simulated subject through a complete workout:
//! - Frames from the pose simulator, delivered through the runtime
//! - Rest periods skipped forward on a manual clock
//! - Live feedback and events printed as they happen
//! - Final session summary printed as JSON
//!
//! Usage: `squat-demo [config.json]`

use std::sync::Arc;
use std::time::Duration;

use theralink_core::{Clock, ManualClock, TheraLinkError, TheraLinkResult, WorkoutConfig};
use theralink_runtime::{init_tracing, RuntimeConfig, RuntimeHandle, TelemetryConfig, WorkoutRuntime};
use theralink_session::{WorkoutEvent, WorkoutSession};
use theralink_test::{PoseSimulator, SquatProfile};
use tokio::sync::broadcast;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&TelemetryConfig::default())?;

    let config = match std::env::args().nth(1) {
        Some(path) => WorkoutConfig::from_json_file(&path)?,
        None => WorkoutConfig::default()
            .with_target_reps(5)
            .with_target_sets(2)
            .with_rest_duration(Duration::from_secs(20)),
    };

    println!("TheraLink Squat Demo");
    println!(
        "  {} sets x {} reps, {}s rest",
        config.target_sets,
        config.target_reps,
        config.rest_duration.as_secs()
    );
    println!();

    let clock = Arc::new(ManualClock::default());
    let sets = config.target_sets;
    let reps = config.target_reps as usize;
    let rest = config.rest_duration;

    let handle = WorkoutRuntime::spawn(
        WorkoutSession::new(config)?,
        clock.clone(),
        RuntimeConfig::default(),
    );
    let printer = tokio::spawn(print_events(handle.subscribe()));

    let profile = SquatProfile::default();
    let mut sim = PoseSimulator::realistic(2024);

    handle.start()?;
    for set in 1..=sets {
        info!(set, "simulating set");
        for (frame, at) in sim.script(&profile.reps(reps)) {
            clock.set(at);
            let before = handle.stats().frames_processed;
            handle.submit_frame(frame, at)?;
            wait_processed(&handle, before).await?;
        }

        if !handle.latest().session_active {
            break;
        }
        if handle.latest().rest_active {
            // Nobody in front of the camera while resting
            sim.skip(rest);
            clock.set(sim.now());
            tokio::time::sleep(RuntimeConfig::default().tick_interval * 2).await;
        }
    }

    let summary = handle.shutdown().await?;
    printer.await?;

    println!();
    println!("Session summary at {:?}:", clock.now());
    println!("{}", summary.to_json_pretty()?);
    Ok(())
}

/// Wait for the pipeline to pick up the frame just submitted
async fn wait_processed(handle: &RuntimeHandle, before: u64) -> TheraLinkResult<()> {
    for _ in 0..5000 {
        if handle.stats().frames_processed > before {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    Err(TheraLinkError::Runtime("frame not processed in time".into()))
}

async fn print_events(mut events: broadcast::Receiver<WorkoutEvent>) {
    loop {
        match events.recv().await {
            Ok(WorkoutEvent::RepCounted { total, in_set }) => {
                println!("  rep {} ({} in set)", total, in_set);
            }
            Ok(WorkoutEvent::SetComplete { set }) => println!("  set {} complete", set),
            Ok(WorkoutEvent::RestStarted { duration_secs }) => {
                println!("  resting for {}s", duration_secs);
            }
            Ok(WorkoutEvent::RestEnded { next_set }) => println!("  starting set {}", next_set),
            Ok(WorkoutEvent::WorkoutComplete { total_reps }) => {
                println!("  workout complete: {} reps", total_reps);
            }
            Ok(event) => tracing::debug!(event = event.name(), "event"),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
