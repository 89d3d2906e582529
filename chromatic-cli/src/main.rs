//! # Chromatic - command-line tuner
//!
//! Streams audio from a WAV file or a synthetic tone through the tuner
//! core and prints one reading per analysis window.
//!
//! ## Architecture
//! - **Source Thread**: decodes or synthesises samples in chunks
//! - **Communication**: a bounded crossbeam channel carries the chunks
//! - **Main Thread**: accumulates windows and runs one tuner tick per window

mod source;

use anyhow::{bail, Context, Result};
use chromatic_core::{
    cents_deviation, nearest_note, EstimatorConfig, FrameAccumulator, LogObserver, Reading,
    SampleRate, Tuner, DEFAULT_WINDOW_SIZE,
};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use source::{SampleSource, SourceWorker, ToneSource, WavSource};

#[derive(Debug, Parser)]
#[command(name = "chromatic", version, about = "Autocorrelation pitch detection and note naming")]
struct Cli {
    /// Increase log verbosity (-v info, -vv per-frame diagnostics)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse a WAV file window by window
    File {
        /// Path to the WAV file
        path: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Analyse a synthetic sine tone
    Tone {
        /// Tone frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        freq: f32,

        /// Peak amplitude
        #[arg(long, default_value_t = 0.8)]
        amplitude: f32,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,

        /// Duration in seconds
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Print the note nearest to a frequency
    Note {
        /// Frequency in Hz
        hz: f32,
    },
    /// Print the effective estimator configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,

        /// Also write the configuration to this JSON file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// JSON file with estimator thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// RMS level below which a window reads "No signal"
    #[arg(long)]
    silence_threshold: Option<f32>,

    /// Amplitude at or above which window edges are trimmed
    #[arg(long)]
    trim_threshold: Option<f32>,
}

impl ConfigArgs {
    /// Loads the config file, if any, and applies command-line overrides.
    fn resolve(&self) -> Result<EstimatorConfig> {
        let mut config = match &self.config {
            Some(path) => EstimatorConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => EstimatorConfig::default(),
        };
        if let Some(threshold) = self.silence_threshold {
            config.silence_threshold = threshold;
        }
        if let Some(threshold) = self.trim_threshold {
            config.trim_threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct AnalysisArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Analysis window size in samples
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Stop after this many windows
    #[arg(long)]
    max_frames: Option<usize>,

    /// Print one JSON object per window instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::File { path, analysis } => {
            let source = WavSource::open(&path)?;
            run_analysis(Box::new(source), &analysis, cli.verbose >= 2)
        }
        Command::Tone {
            freq,
            amplitude,
            sample_rate,
            seconds,
            analysis,
        } => {
            let source = ToneSource::new(freq, amplitude, sample_rate, seconds);
            run_analysis(Box::new(source), &analysis, cli.verbose >= 2)
        }
        Command::Note { hz } => print_note(hz),
        Command::Config { config, write } => {
            let config = config.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            if let Some(path) = write {
                config
                    .save(&path)
                    .with_context(|| format!("failed to write config to {}", path.display()))?;
                log::info!("Wrote config to {}", path.display());
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

/// Streams a source through the tuner, printing one line per window.
fn run_analysis(
    source: Box<dyn SampleSource>,
    args: &AnalysisArgs,
    trace_frames: bool,
) -> Result<()> {
    let config = args.config.resolve()?;
    let sample_rate =
        SampleRate::new(source.sample_rate()).context("source has an invalid sample rate")?;
    let mut accumulator = FrameAccumulator::new(args.window)?;

    let mut tuner = Tuner::new(config, sample_rate)?;
    if trace_frames {
        tuner = tuner.with_observer(Box::new(LogObserver));
    }
    log::info!(
        "Analysing at {} with {}-sample windows, config {:?}",
        sample_rate,
        args.window,
        config
    );

    let worker = SourceWorker::spawn(source)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let max_frames = args.max_frames.unwrap_or(usize::MAX);
    let mut frame_index = 0usize;
    let mut readings = Vec::new();

    tuner.start();
    'stream: for chunk in worker.chunks().iter() {
        readings.clear();
        accumulator.push(&chunk, |window| readings.push(tuner.process(window)));

        for reading in &readings {
            if frame_index >= max_frames {
                break 'stream;
            }
            let seconds = (frame_index * args.window) as f64 / sample_rate.hz() as f64;
            write_reading(&mut out, frame_index, seconds, reading, args.json)?;
            frame_index += 1;
        }
    }
    tuner.stop();
    out.flush()?;

    if accumulator.pending() > 0 {
        log::info!("Dropped {} trailing samples (partial window)", accumulator.pending());
    }
    log::info!("Analysed {} window(s)", frame_index);
    worker.finish()
}

fn write_reading(
    out: &mut impl Write,
    index: usize,
    seconds: f64,
    reading: &Reading,
    as_json: bool,
) -> io::Result<()> {
    if as_json {
        let line = json!({
            "frame": index,
            "time": seconds,
            "label": reading.label(),
            "reading": reading,
        });
        return writeln!(out, "{}", line);
    }

    match (reading.frequency, reading.cents_deviation) {
        (Some(freq), Some(cents)) => writeln!(
            out,
            "{:>8.3}s  {:<10} {:>8.2} Hz  {:+6.1} cents",
            seconds,
            reading.label(),
            freq,
            cents
        ),
        _ => writeln!(out, "{:>8.3}s  {}", seconds, reading.label()),
    }
}

fn print_note(hz: f32) -> Result<()> {
    let Some((note, target)) = nearest_note(hz) else {
        bail!("frequency must be positive and finite, got {}", hz);
    };
    println!(
        "{}  {:.2} Hz  (target {:.2} Hz, {:+.1} cents)",
        note,
        hz,
        target,
        cents_deviation(hz, target)
    );
    Ok(())
}
