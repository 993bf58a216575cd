//! Loudness input
//!
//! A [`LoudnessSource`] samples on its own thread and pushes raw dB
//! readings through a [`LoudnessSink`] into a lock-free [`LoudnessSlot`].
//! The session drains the slot on its own schedule and feeds each new
//! reading to a [`Smoother`], whose value is the only thing physics sees.

pub mod scripted;

#[cfg(feature = "microphone")]
pub mod mic;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::consts::SILENCE_FLOOR_DB;
use crate::error::SourceError;

pub use scripted::ScriptedSource;

#[cfg(feature = "microphone")]
pub use mic::MicrophoneSource;

/// Exponential moving average over loudness readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    alpha: f32,
    floor: f32,
    value: f32,
}

impl Smoother {
    pub fn new(alpha: f32, floor: f32) -> Self {
        Self {
            alpha,
            floor,
            value: floor,
        }
    }

    /// Fold one raw reading into the average
    pub fn update(&mut self, raw: f32) {
        let raw = if raw.is_finite() { raw } else { self.floor };
        self.value = self.alpha * raw + (1.0 - self.alpha) * self.value;
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Back to silence
    pub fn reset(&mut self) {
        self.value = self.floor;
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(0.15, SILENCE_FLOOR_DB)
    }
}

/// Single-slot handoff for the latest raw reading.
///
/// The reading's bits and a 32-bit sequence number share one `AtomicU64`,
/// so a reader always sees a matching (sequence, value) pair and can tell
/// whether anything new arrived since it last looked.
#[derive(Debug)]
pub struct LoudnessSlot {
    packed: AtomicU64,
}

impl LoudnessSlot {
    pub fn new() -> Self {
        Self {
            packed: AtomicU64::new(pack(0, SILENCE_FLOOR_DB)),
        }
    }

    /// Store a reading, bumping the sequence number
    pub fn publish(&self, db: f32) {
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let (seq, _) = unpack(current);
                Some(pack(seq.wrapping_add(1), db))
            });
    }

    /// Latest (sequence, reading)
    pub fn latest(&self) -> (u32, f32) {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

impl Default for LoudnessSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pack(seq: u32, db: f32) -> u64 {
    ((seq as u64) << 32) | db.to_bits() as u64
}

#[inline]
fn unpack(packed: u64) -> (u32, f32) {
    ((packed >> 32) as u32, f32::from_bits(packed as u32))
}

/// Consumer side of a slot: remembers the last sequence it has seen
#[derive(Debug)]
pub struct LoudnessReader {
    slot: Arc<LoudnessSlot>,
    seen: u32,
}

impl LoudnessReader {
    pub fn new(slot: Arc<LoudnessSlot>) -> Self {
        let (seen, _) = slot.latest();
        Self { slot, seen }
    }

    /// The newest reading if one arrived since the last call
    pub fn take(&mut self) -> Option<f32> {
        let (seq, db) = self.slot.latest();
        if seq == self.seen {
            return None;
        }
        self.seen = seq;
        Some(db)
    }

    /// Forget anything published so far
    pub fn skip_pending(&mut self) {
        self.seen = self.slot.latest().0;
    }
}

/// Producer handle given to a source; cheap to clone, never blocks
#[derive(Debug, Clone)]
pub struct LoudnessSink {
    slot: Arc<LoudnessSlot>,
}

impl LoudnessSink {
    pub fn new(slot: Arc<LoudnessSlot>) -> Self {
        Self { slot }
    }

    /// Push a reading; non-finite values count as silence
    pub fn push(&self, db: f32) {
        let db = if db.is_finite() {
            db.max(SILENCE_FLOOR_DB)
        } else {
            SILENCE_FLOOR_DB
        };
        self.slot.publish(db);
    }

    /// Report a failed read
    pub fn push_silence(&self) {
        self.slot.publish(SILENCE_FLOOR_DB);
    }
}

/// Anything that produces loudness readings in the background
pub trait LoudnessSource: Send {
    /// Begin sampling into `sink`. Starting an already running source
    /// restarts it with the new sink.
    fn start(&mut self, sink: LoudnessSink) -> Result<(), SourceError>;

    /// Stop sampling and release the device. Safe to call repeatedly.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Source for hosts that run their own capture and push readings through
/// [`Session::sink`](crate::session::Session::sink) directly
#[derive(Debug, Default)]
pub struct ExternalSource {
    active: bool,
}

impl LoudnessSource for ExternalSource {
    fn start(&mut self, _sink: LoudnessSink) -> Result<(), SourceError> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// RMS level of a sample buffer in dBFS, floored at -160 dB.
/// Samples are expected in `[-1, 1]`.
pub fn amplitude_db(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum / samples.len() as f64).sqrt() as f32;
    Some(20.0 * rms.max(1e-8).log10())
}

/// Same as [`amplitude_db`] for signed 16-bit PCM
pub fn amplitude_db_i16(samples: &[i16]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum / samples.len() as f64).sqrt() as f32;
    Some(20.0 * (rms / 32768.0).max(1e-8).log10())
}
