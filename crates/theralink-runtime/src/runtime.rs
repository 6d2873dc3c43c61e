//! Workout runtime - drives a `WorkoutSession` from a tokio task

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use theralink_core::{Clock, TheraLinkError, TheraLinkResult, Timestamp};
use theralink_pose::PoseFrame;
use theralink_session::{FrameResult, SessionSummary, WorkoutEvent, WorkoutSession};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{FrameSlot, SnapshotCell};

/// Runtime configuration
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Timer tick interval; bounds how late a rest period can end without frames
    pub tick_interval: Duration,
    /// Events buffered per subscriber before slow subscribers lag
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval: Duration::from_millis(250),
            event_capacity: 64,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub frames_processed: u64,
    pub ticks: u64,
    pub commands: u64,
    pub last_frame_duration: Duration,
}

/// A frame with the time it was captured
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub frame: PoseFrame,
    pub captured_at: Timestamp,
}

enum Command {
    Start,
    Stop(oneshot::Sender<Option<SessionSummary>>),
    Summary(oneshot::Sender<SessionSummary>),
    Shutdown,
}

/// Shared state between the pipeline task and its handle
struct Shared {
    frames: FrameSlot<TimedFrame>,
    snapshot: SnapshotCell<FrameResult>,
    stats: Mutex<RuntimeStats>,
}

/// Entry point for running a session on the tokio runtime
pub struct WorkoutRuntime;

impl WorkoutRuntime {
    /// Spawn the pipeline task; must be called from within a tokio runtime
    pub fn spawn(session: WorkoutSession, clock: Arc<dyn Clock>, config: RuntimeConfig) -> RuntimeHandle {
        let shared = Arc::new(Shared {
            frames: FrameSlot::new(),
            snapshot: SnapshotCell::new(session.snapshot()),
            stats: Mutex::new(RuntimeStats::default()),
        });
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let task = tokio::spawn(run_pipeline(
            session,
            Arc::clone(&clock),
            Arc::clone(&shared),
            commands_rx,
            events_tx.clone(),
            config,
        ));

        RuntimeHandle {
            shared,
            clock,
            commands: commands_tx,
            events: events_tx,
            task,
        }
    }
}

/// Control and observation handle for a running pipeline
pub struct RuntimeHandle {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<WorkoutEvent>,
    task: JoinHandle<SessionSummary>,
}

impl RuntimeHandle {
    /// Hand over a frame captured now; returns `true` if it displaced an unprocessed one
    pub fn submit(&self, frame: PoseFrame) -> TheraLinkResult<bool> {
        self.submit_frame(frame, self.clock.now())
    }

    /// Hand over a frame with its capture time
    pub fn submit_frame(&self, frame: PoseFrame, captured_at: Timestamp) -> TheraLinkResult<bool> {
        self.shared.frames.publish(TimedFrame { frame, captured_at })
    }

    /// Request a session start; applied before the next frame
    pub fn start(&self) -> TheraLinkResult<()> {
        self.send(Command::Start)
    }

    /// Stop the session before the next frame; `None` if it was not running
    pub async fn stop(&self) -> TheraLinkResult<Option<SessionSummary>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Stop(reply))?;
        response.await.map_err(|_| TheraLinkError::PipelineClosed)
    }

    /// Summary of the current or most recent workout
    pub async fn summary(&self) -> TheraLinkResult<SessionSummary> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Summary(reply))?;
        response.await.map_err(|_| TheraLinkError::PipelineClosed)
    }

    /// Latest published frame result
    pub fn latest(&self) -> Arc<FrameResult> {
        self.shared.snapshot.latest()
    }

    /// Number of snapshots published so far
    pub fn snapshot_version(&self) -> u64 {
        self.shared.snapshot.version()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkoutEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.shared.stats.lock().clone()
    }

    /// Frames overwritten before the pipeline got to them
    pub fn dropped_frames(&self) -> u64 {
        self.shared.frames.dropped()
    }

    /// Stop accepting frames, end the pipeline task and return the final summary
    pub async fn shutdown(self) -> TheraLinkResult<SessionSummary> {
        self.shared.frames.close();
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| TheraLinkError::Runtime(e.to_string()))
    }

    fn send(&self, command: Command) -> TheraLinkResult<()> {
        self.commands
            .send(command)
            .map_err(|_| TheraLinkError::PipelineClosed)
    }
}

async fn run_pipeline(
    mut session: WorkoutSession,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<WorkoutEvent>,
    config: RuntimeConfig,
) -> SessionSummary {
    // interval() panics on a zero period
    let period = config.tick_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(tick_ms = period.as_millis() as u64, "workout pipeline running");

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                shared.stats.lock().commands += 1;
                match command {
                    Some(Command::Start) => {
                        let emitted = session.start(clock.now());
                        publish(&shared, &events, session.snapshot(), emitted);
                    }
                    Some(Command::Stop(reply)) => {
                        let summary = session.stop(clock.now());
                        let emitted = if summary.is_some() {
                            vec![WorkoutEvent::SessionStopped]
                        } else {
                            Vec::new()
                        };
                        publish(&shared, &events, session.snapshot(), emitted);
                        let _ = reply.send(summary);
                    }
                    Some(Command::Summary(reply)) => {
                        let _ = reply.send(session.summary());
                    }
                    Some(Command::Shutdown) | None => break,
                }
            }

            frame = shared.frames.take() => {
                let Some(timed) = frame else {
                    break;
                };
                let began = std::time::Instant::now();
                let result = session.process_frame(&timed.frame, timed.captured_at);
                {
                    let mut stats = shared.stats.lock();
                    stats.frames_processed += 1;
                    stats.last_frame_duration = began.elapsed();
                }
                let emitted = result.events.clone();
                publish(&shared, &events, result, emitted);
            }

            _ = ticker.tick() => {
                shared.stats.lock().ticks += 1;
                if !session.is_active() {
                    continue;
                }
                let emitted = session.tick(clock.now());
                publish(&shared, &events, session.snapshot(), emitted);
            }
        }
    }

    shared.frames.close();
    if session.stop(clock.now()).is_some() {
        warn!("pipeline shut down with a session still running");
        let _ = events.send(WorkoutEvent::SessionStopped);
    }
    info!(dropped_frames = shared.frames.dropped(), "workout pipeline stopped");
    session.summary()
}

fn publish(
    shared: &Shared,
    events: &broadcast::Sender<WorkoutEvent>,
    mut result: FrameResult,
    emitted: Vec<WorkoutEvent>,
) {
    for event in &emitted {
        debug!(event = event.name(), "workout event");
        // No subscribers is fine
        let _ = events.send(*event);
    }
    result.events = emitted;
    shared.snapshot.publish(result);
}
