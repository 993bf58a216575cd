//! Threaded session driver
//!
//! Moves a [`Session`] onto its own thread so it has exactly one writer.
//! The host talks to it through commands and reads the latest
//! [`Snapshot`] from a shared slot.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::SessionError;
use crate::session::{Session, Snapshot};

/// How long the driver sleeps when no run is scheduled
const IDLE_WAIT: Duration = Duration::from_millis(250);

type Reply = Sender<Result<(), SessionError>>;

/// Commands accepted by the driver thread
#[derive(Debug)]
enum Command {
    Start { seed: Option<u64>, reply: Reply },
    Resize { width: f32, height: f32 },
    Stop,
    Shutdown,
}

/// Handle to a session running on a background thread
pub struct Runner {
    commands: Sender<Command>,
    snapshot: Arc<RwLock<Snapshot>>,
    worker: Option<JoinHandle<()>>,
}

impl Runner {
    /// Spawn the driver thread, taking ownership of the session
    pub fn spawn(session: Session) -> Result<Self, SessionError> {
        let (commands, inbox) = mpsc::channel();
        let snapshot = Arc::new(RwLock::new(session.snapshot()));
        let published = Arc::clone(&snapshot);

        let worker = thread::Builder::new()
            .name("session".into())
            .spawn(move || drive(session, inbox, published))
            .map_err(|e| {
                log::error!("Failed to spawn session thread: {}", e);
                SessionError::RunnerStopped
            })?;

        Ok(Self {
            commands,
            snapshot,
            worker: Some(worker),
        })
    }

    /// Start (or restart) a run; blocks until the loudness source answers
    pub fn start_game(&self) -> Result<(), SessionError> {
        self.start(None)
    }

    /// Start a run with a fixed obstacle seed
    pub fn start_game_seeded(&self, seed: u64) -> Result<(), SessionError> {
        self.start(Some(seed))
    }

    /// Same as [`Runner::start_game`]
    pub fn reset_game(&self) -> Result<(), SessionError> {
        self.start(None)
    }

    fn start(&self, seed: Option<u64>) -> Result<(), SessionError> {
        let (reply, answer) = mpsc::channel();
        self.commands
            .send(Command::Start { seed, reply })
            .map_err(|_| SessionError::RunnerStopped)?;
        answer.recv().map_err(|_| SessionError::RunnerStopped)?
    }

    pub fn set_screen_size(&self, width: f32, height: f32) -> Result<(), SessionError> {
        self.commands
            .send(Command::Resize { width, height })
            .map_err(|_| SessionError::RunnerStopped)
    }

    /// End the current run and release the loudness source
    pub fn stop(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Stop)
            .map_err(|_| SessionError::RunnerStopped)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stop the driver thread and wait for it
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Session thread panicked");
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.join();
    }
}

fn publish(session: &Session, slot: &RwLock<Snapshot>) {
    let snapshot = session.snapshot();
    *slot.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
}

/// Driver loop: wait for a command or the next deadline, whichever is first
fn drive(mut session: Session, inbox: Receiver<Command>, slot: Arc<RwLock<Snapshot>>) {
    log::debug!("Session thread running");
    loop {
        let wait = session
            .time_until_due(Instant::now())
            .unwrap_or(IDLE_WAIT);

        match inbox.recv_timeout(wait) {
            Ok(Command::Start { seed, reply }) => {
                let now = Instant::now();
                let result = match seed {
                    Some(seed) => session.start_game_seeded(now, seed),
                    None => session.start_game(now),
                };
                publish(&session, &slot);
                let _ = reply.send(result);
            }
            Ok(Command::Resize { width, height }) => {
                session.set_screen_size(width, height);
                publish(&session, &slot);
            }
            Ok(Command::Stop) => {
                session.stop();
                publish(&session, &slot);
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if session.next_deadline().is_some() {
            session.pump(Instant::now());
            publish(&session, &slot);
        }
    }
    session.stop();
    publish(&session, &slot);
    log::debug!("Session thread finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::{ExternalSource, ScriptedSource};
    use crate::sim::GamePhase;
    use crate::tuning::Tuning;

    fn fast_tuning() -> Tuning {
        Tuning {
            countdown_step_ms: 10,
            ..Default::default()
        }
    }

    fn wait_until(runner: &Runner, timeout: Duration, pred: impl Fn(&Snapshot) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if pred(&runner.snapshot()) {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_runner_publishes_countdown_and_running() {
        let session = Session::new(fast_tuning(), Box::new(ExternalSource::default()));
        let runner = Runner::spawn(session).unwrap();
        runner.set_screen_size(1000.0, 1000.0).unwrap();
        runner.start_game().unwrap();

        let snap = runner.snapshot();
        assert!(snap.has_started);
        assert!(snap.running);

        assert!(wait_until(&runner, Duration::from_secs(2), |s| {
            s.phase == GamePhase::Running && !s.obstacles.is_empty()
        }));
        runner.shutdown();
    }

    #[test]
    fn test_runner_reaches_game_over() {
        let session = Session::new(fast_tuning(), Box::new(ScriptedSource::constant(-80.0)));
        let runner = Runner::spawn(session).unwrap();
        runner.set_screen_size(400.0, 400.0).unwrap();
        runner.start_game().unwrap();
        assert!(wait_until(&runner, Duration::from_secs(15), Snapshot::is_game_over));
    }

    #[test]
    fn test_runner_reports_unavailable_source() {
        let session = Session::new(fast_tuning(), Box::new(ScriptedSource::unavailable()));
        let runner = Runner::spawn(session).unwrap();
        let err = runner.start_game().unwrap_err();
        assert!(matches!(err, SessionError::Source(_)));
        assert!(!runner.snapshot().has_started);
    }

    #[test]
    fn test_runner_stop() {
        let session = Session::new(fast_tuning(), Box::new(ExternalSource::default()));
        let runner = Runner::spawn(session).unwrap();
        runner.set_screen_size(1000.0, 1000.0).unwrap();
        runner.start_game().unwrap();
        runner.stop().unwrap();
        assert!(wait_until(&runner, Duration::from_secs(1), |s| !s.running));
    }
}
