//! Scripted loudness source
//!
//! Replays a loudness program on a background thread at a fixed cadence.
//! Stands in for the microphone in headless runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{LoudnessSink, LoudnessSource};
use crate::error::SourceError;

/// Loudness as a function of time since the source started.
/// `None` is a failed read and is delivered as silence.
pub type LoudnessProgram = Box<dyn FnMut(Duration) -> Option<f32> + Send>;

/// Background source replaying a [`LoudnessProgram`]
pub struct ScriptedSource {
    program: Arc<Mutex<LoudnessProgram>>,
    cadence: Duration,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Refuse to start, simulating a missing device
    unavailable: bool,
}

impl ScriptedSource {
    /// Default cadence between readings
    pub const DEFAULT_CADENCE: Duration = Duration::from_millis(30);

    pub fn new<F>(program: F, cadence: Duration) -> Self
    where
        F: FnMut(Duration) -> Option<f32> + Send + 'static,
    {
        let program: LoudnessProgram = Box::new(program);
        Self {
            program: Arc::new(Mutex::new(program)),
            cadence,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            unavailable: false,
        }
    }

    /// A constant level
    pub fn constant(db: f32) -> Self {
        Self::new(move |_| Some(db), Self::DEFAULT_CADENCE)
    }

    /// Bursts of `loud_db` lasting `on` every `period`, `quiet_db` otherwise
    pub fn bursts(loud_db: f32, quiet_db: f32, on: Duration, period: Duration) -> Self {
        let period_ms = period.as_millis().max(1);
        let on_ms = on.as_millis();
        Self::new(
            move |elapsed| {
                let phase = elapsed.as_millis() % period_ms;
                Some(if phase < on_ms { loud_db } else { quiet_db })
            },
            Self::DEFAULT_CADENCE,
        )
    }

    /// A source whose `start` always fails with `DeviceUnavailable`
    pub fn unavailable() -> Self {
        let mut source = Self::constant(crate::consts::SILENCE_FLOOR_DB);
        source.unavailable = true;
        source
    }
}

impl LoudnessSource for ScriptedSource {
    fn start(&mut self, sink: LoudnessSink) -> Result<(), SourceError> {
        if self.unavailable {
            return Err(SourceError::DeviceUnavailable);
        }
        self.stop();

        let running = Arc::new(AtomicBool::new(true));
        let program = Arc::clone(&self.program);
        let cadence = self.cadence;
        let flag = Arc::clone(&running);

        let worker = thread::Builder::new()
            .name("loudness-script".into())
            .spawn(move || {
                let started = Instant::now();
                while flag.load(Ordering::Acquire) {
                    let reading = {
                        let mut guard = program.lock().unwrap_or_else(|e| e.into_inner());
                        let next = &mut *guard;
                        next(started.elapsed())
                    };
                    match reading {
                        Some(db) => sink.push(db),
                        None => sink.push_silence(),
                    }
                    thread::sleep(cadence);
                }
            })
            .map_err(SourceError::Thread)?;

        self.running = running;
        self.worker = Some(worker);
        log::debug!("Scripted loudness source started ({:?} cadence)", self.cadence);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Scripted loudness thread panicked");
            }
            log::debug!("Scripted loudness source stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::Acquire)
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.stop();
    }
}
