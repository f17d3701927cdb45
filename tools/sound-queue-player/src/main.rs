//! sq-play - play audio through the sound queue
//!
//! # Usage
//!
//! ```bash
//! # Play a 16-bit PCM WAV file
//! sq-play music.wav
//!
//! # Play a 440 Hz test tone for 2 seconds
//! sq-play --tone 440 --seconds 2
//!
//! # Smaller ring, verbose queue metrics
//! RUST_LOG=sound_queue=debug sq-play --latency-ms 20 music.wav
//! ```

mod play;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use source::Source;

/// Play a WAV file or test tone through the sound queue
#[derive(Parser)]
#[command(name = "sq-play")]
#[command(version)]
struct Cli {
    /// 16-bit PCM WAV file to play
    #[arg(required_unless_present = "tone", conflicts_with = "tone")]
    input: Option<PathBuf>,

    /// Play a sine tone at this frequency (Hz) instead of a file
    #[arg(long)]
    tone: Option<f32>,

    /// Tone duration in seconds
    #[arg(long, default_value_t = 2.0)]
    seconds: f32,

    /// Tone sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    rate: u32,

    /// Tone channel count
    #[arg(long, default_value_t = 2)]
    channels: u16,

    /// Override the ring latency target (ms)
    #[arg(long)]
    latency_ms: Option<u32>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => sound_queue::config::load_from(path)?,
        None => sound_queue::config::load(),
    };
    if let Some(latency_ms) = cli.latency_ms {
        config.latency_ms = latency_ms;
    }

    let source = match (&cli.input, cli.tone) {
        (Some(path), _) => Source::from_wav(path)?,
        (None, Some(freq)) => Source::tone(freq, cli.seconds, cli.rate, cli.channels),
        (None, None) => anyhow::bail!("nothing to play: pass a WAV file or --tone"),
    };

    play::play(&source, config)
}
