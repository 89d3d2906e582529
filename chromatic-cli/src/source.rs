//! # Sample Sources
//!
//! Sources deliver mono samples in chunks of whatever size suits them. A
//! [`SourceWorker`] runs a source on its own thread and streams the chunks
//! over a bounded channel, the same way a capture callback would feed the
//! analysis loop.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender};
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::{self, JoinHandle};

/// Frames read from a file per chunk.
const CHUNK_FRAMES: usize = 1024;

/// Chunks buffered between the source thread and the analysis loop.
const CHANNEL_CAPACITY: usize = 16;

/// A producer of normalised mono samples at a fixed rate.
pub trait SampleSource: Send + 'static {
    fn sample_rate(&self) -> u32;

    /// Returns the next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>>;
}

/// Reads a WAV file, mixing all channels down to mono.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    channels: usize,
    scale: f32,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)
            .with_context(|| format!("failed to open WAV file {}", path.display()))?;
        let spec = reader.spec();
        log::info!(
            "Opened {}: {} Hz, {} channel(s), {}-bit {:?}",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );

        if spec.channels == 0 {
            return Err(anyhow!("WAV file {} has no channels", path.display()));
        }
        // Integer PCM is scaled so full scale maps to [-1, 1].
        let scale = match spec.sample_format {
            SampleFormat::Float => 1.0,
            SampleFormat::Int => 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32,
        };

        Ok(Self {
            reader,
            channels: spec.channels as usize,
            scale,
        })
    }
}

impl SampleSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        let wanted = CHUNK_FRAMES * self.channels;
        let interleaved: Vec<f32> = match self.reader.spec().sample_format {
            SampleFormat::Float => self
                .reader
                .samples::<f32>()
                .take(wanted)
                .collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = self.scale;
                self.reader
                    .samples::<i32>()
                    .take(wanted)
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        if interleaved.is_empty() {
            return Ok(None);
        }
        let mono = interleaved
            .chunks(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Ok(Some(mono))
    }
}

/// Synthesises a sine tone.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    total_samples: usize,
    position: usize,
}

impl ToneSource {
    pub fn new(frequency: f32, amplitude: f32, sample_rate: u32, seconds: f32) -> Self {
        Self {
            frequency,
            amplitude,
            sample_rate,
            total_samples: (seconds.max(0.0) * sample_rate as f32) as usize,
            position: 0,
        }
    }
}

impl SampleSource for ToneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        if self.position >= self.total_samples {
            return Ok(None);
        }
        let end = (self.position + CHUNK_FRAMES).min(self.total_samples);
        let step = 2.0 * std::f64::consts::PI * self.frequency as f64 / self.sample_rate as f64;
        let chunk = (self.position..end)
            .map(|i| self.amplitude * (step * i as f64).sin() as f32)
            .collect();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Runs a [`SampleSource`] on a dedicated thread.
///
/// The thread is signalled and joined when the worker is finished or
/// dropped, so the source is released on every exit path.
pub struct SourceWorker {
    chunks: Receiver<Vec<f32>>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<Result<()>>>,
}

impl SourceWorker {
    pub fn spawn(mut source: Box<dyn SampleSource>) -> Result<Self> {
        let (chunk_tx, chunk_rx) = crossbeam_channel::bounded::<Vec<f32>>(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = thread::Builder::new()
            .name("sample-source".into())
            .spawn(move || {
                log::debug!("Source thread started");
                while let Some(chunk) = source.next_chunk()? {
                    crossbeam_channel::select! {
                        send(chunk_tx, chunk) -> res => if res.is_err() {
                            log::debug!("Analysis side hung up");
                            break;
                        },
                        recv(shutdown_rx) -> _ => {
                            log::debug!("Received shutdown signal");
                            break;
                        },
                    }
                }
                log::debug!("Source thread finished");
                Ok(())
            })
            .context("failed to spawn source thread")?;

        Ok(Self {
            chunks: chunk_rx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn chunks(&self) -> &Receiver<Vec<f32>> {
        &self.chunks
    }

    /// Stops the source thread and reports any error it hit while reading.
    pub fn finish(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };
        let _ = self.shutdown_tx.try_send(());
        handle
            .join()
            .map_err(|_| anyhow!("source thread panicked"))?
    }
}

impl Drop for SourceWorker {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            log::error!("Source thread ended with an error: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn drain(source: &mut dyn SampleSource) -> Vec<f32> {
        let mut all = Vec::new();
        while let Some(chunk) = source.next_chunk().unwrap() {
            all.extend(chunk);
        }
        all
    }

    #[test]
    fn tone_source_length_and_amplitude() {
        let mut tone = ToneSource::new(441.0, 0.5, 44_100, 0.1);
        let samples = drain(&mut tone);
        assert_eq!(samples.len(), 4410);
        assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
        assert_eq!(samples[0], 0.0);
        assert!((samples[25] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn stereo_int_wav_is_mixed_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..3000 {
            writer.write_sample(16_384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = WavSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), 8_000);
        let first = source.next_chunk().unwrap().unwrap();
        assert_eq!(first.len(), CHUNK_FRAMES);
        let samples = [first, drain(&mut source)].concat();
        assert_eq!(samples.len(), 3000);
        assert!(samples.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn float_wav_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.1f32, -0.2, 0.3] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = WavSource::open(&path).unwrap();
        assert_eq!(drain(&mut source), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn missing_wav_is_an_error() {
        assert!(WavSource::open(Path::new("/nonexistent/tone.wav")).is_err());
    }

    #[test]
    fn worker_streams_every_chunk() {
        let tone = ToneSource::new(220.0, 0.8, 8_000, 1.0);
        let worker = SourceWorker::spawn(Box::new(tone)).unwrap();
        let total: usize = worker.chunks().iter().map(|c| c.len()).sum();
        assert_eq!(total, 8_000);
        worker.finish().unwrap();
    }

    #[test]
    fn worker_stops_early_when_finished() {
        // A ten minute tone; finishing after one chunk must not wait for the rest.
        let tone = ToneSource::new(220.0, 0.8, 44_100, 600.0);
        let worker = SourceWorker::spawn(Box::new(tone)).unwrap();
        let first = worker.chunks().recv().unwrap();
        assert_eq!(first.len(), CHUNK_FRAMES);
        worker.finish().unwrap();
    }
}
