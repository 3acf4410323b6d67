// Santoor - Command-line front end
//
//   santoor play <melody.json> [--octave N]
//   santoor export <melody.json> <out.wav> [--octave N]
//   santoor keys
//
// `--config <settings.json>` may precede or follow any command. Set RUST_LOG
// for diagnostics.

use clap::{Parser, Subcommand};
use log::warn;
use santoor::input::keymap::KEY_BINDINGS;
use santoor::synth::envelope::EnvelopeParams;
use santoor::{
    AudioExporter, CpalSink, Instrument, Session, Settings, SynthEngine, SystemClock,
    sequencer::persistence::load_from_file,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Longest sleep between scheduler polls during playback
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Parser)]
#[command(name = "santoor")]
#[command(about = "Virtual santoor: replay, export and key bindings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Octave shift, -2..2 (out-of-range values are clamped)
    #[arg(long, global = true, allow_negative_numbers = true)]
    octave: Option<i32>,

    /// Settings file (default: <config dir>/santoor/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Replay a saved melody on the default audio device
    Play {
        /// Melody file (.json)
        melody: PathBuf,
    },

    /// Render a saved melody to a 16-bit stereo WAV
    Export {
        /// Melody file (.json)
        melody: PathBuf,

        /// Output WAV file path
        output: PathBuf,
    },

    /// Print the keyboard bindings
    Keys,
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn Error>> {
    match path {
        Some(path) => Ok(Settings::load_from(path)?),
        None => Ok(Settings::load().unwrap_or_else(|e| {
            warn!("Using default settings: {}", e);
            Settings::default()
        })),
    }
}

fn play(melody: &Path, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let engine = SynthEngine::with_settings(CpalSink::new(), settings.engine_settings());
    let mut session = Session::with_settings(engine, SystemClock::new(), settings);

    let count = session.load_file(melody)?;
    session.ensure_engine();
    if !session.engine().is_initialized() {
        return Err("No audio output available".into());
    }

    println!("Playing {} notes from {}", count, melody.display());
    session.play();
    while session.is_playing() {
        session.tick();
        thread::sleep(MAX_POLL_INTERVAL);
    }

    // Let the last voices and the reverb ring out
    let ring_out = EnvelopeParams::default().total_duration() + settings.impulse_duration_secs;
    thread::sleep(Duration::try_from_secs_f32(ring_out).unwrap_or_default());
    Ok(())
}

fn export(melody: &Path, output: &Path, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let events = load_from_file(melody)?;
    let exporter = AudioExporter::new(settings.export_settings());
    let frames = exporter.export_wav(&events, output)?;
    println!(
        "Exported {} notes ({:.2}s) to {}",
        events.len(),
        frames as f64 / settings.sample_rate as f64,
        output.display()
    );
    Ok(())
}

fn print_keys() {
    for row in KEY_BINDINGS.chunks(7).rev() {
        let line: Vec<String> = row
            .iter()
            .map(|(key, note)| format!("{} {:<3}", key, note))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(octave) = cli.octave {
        settings.octave = octave;
    }

    match &cli.command {
        Commands::Play { melody } => play(melody, &settings),
        Commands::Export { melody, output } => export(melody, output, &settings),
        Commands::Keys => {
            print_keys();
            Ok(())
        }
    }
}
