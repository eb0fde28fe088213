//! Background analysis of one buffer.
//!
//! The host submits snapshots from its event loop; a worker thread analyzes
//! them and publishes operations to a [`HighlightSink`]. Only the newest
//! snapshot matters: a submit replaces any snapshot still waiting, and a pass
//! that finishes after a newer submit is dropped without publishing.

use crate::change::Snapshot;
use crate::config::Config;
use crate::session::{BufferSession, HighlightSink};
use crate::{EngineError, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use scopelight_analysis::Analysis;
use scopelight_core::Position;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Work waiting for the worker.
#[derive(Default)]
struct Inbox {
    snapshot: Option<Snapshot>,
    cursor: Option<Position>,
    config: Option<Arc<Config>>,
    /// Bumped on every submit.
    generation: u64,
    /// A pass is running.
    busy: bool,
    shutdown: bool,
}

impl Inbox {
    fn has_work(&self) -> bool {
        self.snapshot.is_some() || self.cursor.is_some() || self.config.is_some()
    }
}

/// State shared between the handle and the worker.
struct Shared {
    inbox: Mutex<Inbox>,
    /// Signals new work or shutdown.
    wake: Condvar,
    /// Signals that the worker ran out of work.
    idle: Condvar,
    committed: RwLock<Arc<Analysis>>,
}

/// Handle to a buffer's analysis worker. Dropping it stops the worker.
pub struct Pipeline {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Start a worker publishing to `sink`.
    pub fn spawn(config: Arc<Config>, sink: impl HighlightSink + 'static) -> Result<Self> {
        let shared = Arc::new(Shared {
            inbox: Mutex::new(Inbox::default()),
            wake: Condvar::new(),
            idle: Condvar::new(),
            committed: RwLock::new(Arc::new(Analysis::empty())),
        });
        let worker = Worker {
            shared: Arc::clone(&shared),
            session: BufferSession::new(config),
            sink: Box::new(sink),
            last_pass: Duration::ZERO,
            last_pass_end: Instant::now(),
        };
        let handle = thread::Builder::new()
            .name("scopelight-worker".into())
            .spawn(move || worker.run())
            .map_err(EngineError::Spawn)?;
        Ok(Self {
            shared,
            worker: Some(handle),
        })
    }

    /// Queue `snapshot`, replacing any snapshot not yet picked up. Change
    /// hints of replaced snapshots are merged so the range stays valid.
    pub fn submit(&self, mut snapshot: Snapshot) -> Result<()> {
        let mut inbox = self.shared.inbox.lock();
        if inbox.shutdown {
            return Err(EngineError::WorkerStopped);
        }
        if let Some(replaced) = inbox.snapshot.take() {
            snapshot.changed = match (replaced.changed, snapshot.changed) {
                (Some(first), Some(second)) => Some(first.merge(second)),
                _ => None,
            };
            tracing::trace!("snapshot replaced before analysis");
        }
        inbox.snapshot = Some(snapshot);
        inbox.generation += 1;
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Move the cursor; selection highlights follow.
    pub fn set_cursor(&self, cursor: Position) -> Result<()> {
        let mut inbox = self.shared.inbox.lock();
        if inbox.shutdown {
            return Err(EngineError::WorkerStopped);
        }
        inbox.cursor = Some(cursor);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Replace the configuration. The committed text is reanalyzed.
    pub fn reconfigure(&self, config: Arc<Config>) -> Result<()> {
        let mut inbox = self.shared.inbox.lock();
        if inbox.shutdown {
            return Err(EngineError::WorkerStopped);
        }
        inbox.config = Some(config);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// The most recently committed analysis.
    pub fn analysis(&self) -> Arc<Analysis> {
        Arc::clone(&self.shared.committed.read())
    }

    /// Block until the worker has no queued work, or `timeout` passes.
    /// Returns whether it went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inbox = self.shared.inbox.lock();
        while (inbox.has_work() || inbox.busy) && !inbox.shutdown {
            if self.shared.idle.wait_until(&mut inbox, deadline).timed_out() {
                return !(inbox.has_work() || inbox.busy);
            }
        }
        true
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        {
            let mut inbox = self.shared.inbox.lock();
            inbox.shutdown = true;
            self.shared.wake.notify_all();
            self.shared.idle.notify_all();
        }
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| EngineError::WorkerStopped),
            None => Ok(()),
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            tracing::warn!(%error, "analysis worker did not stop cleanly");
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// What the worker picked up from the inbox.
enum Job {
    Pass { snapshot: Snapshot, generation: u64 },
    Cursor(Position),
    Reconfigure(Arc<Config>),
    Poll,
    Stop,
}

struct Worker {
    shared: Arc<Shared>,
    session: BufferSession,
    sink: Box<dyn HighlightSink>,
    last_pass: Duration,
    last_pass_end: Instant,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!("analysis worker started");
        loop {
            match self.next_job() {
                Job::Stop => break,
                Job::Pass { snapshot, generation } => self.pass(&snapshot, generation),
                Job::Cursor(cursor) => {
                    let ops = self.session.select(cursor);
                    self.publish(&ops);
                }
                Job::Reconfigure(config) => {
                    let ops = self.session.reconfigure(config, Instant::now());
                    self.commit_analysis();
                    self.publish(&ops);
                }
                Job::Poll => {
                    let ops = self.session.poll(Instant::now());
                    self.publish(&ops);
                }
            }
        }
        tracing::debug!("analysis worker stopped");
    }

    /// Wait for something to do. Configuration changes go first, then
    /// snapshots (after the analysis delay), then the cursor.
    fn next_job(&self) -> Job {
        let mut inbox = self.shared.inbox.lock();
        loop {
            if inbox.shutdown {
                return Job::Stop;
            }
            if let Some(config) = inbox.config.take() {
                inbox.busy = true;
                return Job::Reconfigure(config);
            }
            if inbox.snapshot.is_some() {
                let ready_at = self.ready_at();
                if Instant::now() < ready_at {
                    // New submits during the delay replace the snapshot.
                    self.shared.wake.wait_until(&mut inbox, ready_at);
                    continue;
                }
                if let Some(snapshot) = inbox.snapshot.take() {
                    inbox.busy = true;
                    return Job::Pass {
                        snapshot,
                        generation: inbox.generation,
                    };
                }
            }
            if let Some(cursor) = inbox.cursor.take() {
                inbox.busy = true;
                return Job::Cursor(cursor);
            }

            inbox.busy = false;
            self.shared.idle.notify_all();
            match self.session.deadline() {
                Some(deadline) if Instant::now() >= deadline => return Job::Poll,
                Some(deadline) => {
                    self.shared.wake.wait_until(&mut inbox, deadline);
                }
                None => self.shared.wake.wait(&mut inbox),
            }
        }
    }

    /// The analysis delay: a multiple of how long the last pass took.
    fn ready_at(&self) -> Instant {
        let factor = self.session.config().analysis_delay_factor;
        let delay = Duration::try_from_secs_f64(self.last_pass.as_secs_f64() * factor)
            .unwrap_or(Duration::ZERO);
        self.last_pass_end + delay
    }

    #[tracing::instrument(level = "debug", skip_all, fields(generation = generation))]
    fn pass(&mut self, snapshot: &Snapshot, generation: u64) {
        let started = Instant::now();
        let outcome = self.session.run_pass(snapshot);
        self.last_pass = started.elapsed();
        self.last_pass_end = Instant::now();

        if self.shared.inbox.lock().generation != generation {
            tracing::debug!("discarding stale pass");
            self.session.discard();
            return;
        }
        let ops = self.session.commit(snapshot, outcome, Instant::now());
        self.commit_analysis();
        self.publish(&ops);
    }

    fn commit_analysis(&self) {
        *self.shared.committed.write() = self.session.analysis();
    }

    fn publish(&mut self, ops: &[crate::diff::DiffOp]) {
        if !ops.is_empty() {
            self.sink.publish(ops);
        }
    }
}
