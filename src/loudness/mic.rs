//! Microphone loudness source (cpal)
//!
//! cpal streams cannot move between threads on every platform, so the
//! stream is built and owned by a dedicated thread that lives until
//! [`LoudnessSource::stop`] is called.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};

use super::{LoudnessSink, LoudnessSource, amplitude_db, amplitude_db_i16};
use crate::error::SourceError;

/// Live microphone input, one reading per capture buffer
#[derive(Default)]
pub struct MicrophoneSource {
    /// Exact input device name, or the host default when None
    device_name: Option<String>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl MicrophoneSource {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            shutdown: None,
            worker: None,
        }
    }

    /// Names of all input devices on the default host
    pub fn list_devices() -> Result<Vec<String>, SourceError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| SourceError::Stream(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

fn open_stream(device_name: Option<&str>, sink: LoudnessSink) -> Result<Stream, SourceError> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(needle) => host
            .input_devices()
            .map_err(|e| SourceError::Stream(e.to_string()))?
            .find(|d| d.name().is_ok_and(|name| name == needle)),
        None => host.default_input_device(),
    }
    .ok_or(SourceError::DeviceUnavailable)?;

    let config = device
        .default_input_config()
        .map_err(|e| SourceError::StreamConfig(e.to_string()))?;
    log::info!(
        "Capturing from {} ({:?}, {} Hz, {} ch)",
        device.name().as_deref().unwrap_or("unknown device"),
        config.sample_format(),
        config.sample_rate().0,
        config.channels()
    );

    let on_error = |err: cpal::StreamError| log::warn!("Microphone stream error: {err}");
    let timeout = Some(Duration::from_millis(30));
    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _| match amplitude_db(data) {
                Some(db) => sink.push(db),
                None => sink.push_silence(),
            },
            on_error,
            timeout,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _| match amplitude_db_i16(data) {
                Some(db) => sink.push(db),
                None => sink.push_silence(),
            },
            on_error,
            timeout,
        ),
        other => {
            return Err(SourceError::StreamConfig(format!(
                "unsupported sample format {other:?}"
            )));
        }
    }
    .map_err(|e| SourceError::StreamConfig(e.to_string()))?;

    stream
        .play()
        .map_err(|e| SourceError::Stream(e.to_string()))?;
    Ok(stream)
}

impl LoudnessSource for MicrophoneSource {
    fn start(&mut self, sink: LoudnessSink) -> Result<(), SourceError> {
        self.stop();

        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        let worker = thread::Builder::new()
            .name("loudness-mic".into())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), sink) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Park until stopped; dropping the stream releases the device
                let _ = shutdown_rx.recv();
                drop(stream);
            })
            .map_err(SourceError::Thread)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.shutdown = Some(shutdown_tx);
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(SourceError::Stream("capture thread exited".into()))
            }
        }
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Microphone capture thread panicked");
            }
            log::info!("Microphone released");
        }
    }

    fn is_active(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.stop();
    }
}
