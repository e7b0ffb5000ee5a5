//! dulcimer - play or bounce the string synth
//!
//! Run with: cargo run -- play
//!      or: cargo run -- render --out strings.wav

mod app;
mod bounce;
mod phrase;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use dulcimer::EngineConfig;
use tracing::level_filters::LevelFilter;

use phrase::Phrase;

#[derive(Parser)]
#[command(name = "dulcimer", version, about = "Physically-informed additive string synth")]
struct Cli {
    /// TOML file with engine and instrument settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Render threads (default: the global rayon pool)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a phrase through the default output device
    Play {
        #[command(flatten)]
        phrase: PhraseArgs,

        /// Loop the phrase until Ctrl+C
        #[arg(long)]
        repeat: bool,
    },
    /// Render a phrase to a WAV file
    Render {
        /// Output path
        #[arg(short, long, default_value = "dulcimer.wav")]
        out: PathBuf,

        #[command(flatten)]
        phrase: PhraseArgs,

        /// Seconds of ring-out appended after the last note
        #[arg(long, default_value_t = 3.0)]
        tail: f64,
    },
}

#[derive(clap::Args)]
struct PhraseArgs {
    /// MIDI notes, comma separated (default: a C major arpeggio)
    #[arg(short, long, value_delimiter = ',')]
    notes: Vec<u8>,

    /// Seconds between note starts
    #[arg(long, default_value_t = 0.35)]
    step: f64,

    /// Seconds each note is held before its note-off
    #[arg(long, default_value_t = 0.3)]
    hold: f64,

    /// Note velocity (1-127)
    #[arg(long, default_value_t = 100)]
    velocity: u8,
}

impl PhraseArgs {
    fn phrase(&self) -> Phrase {
        if self.notes.is_empty() {
            Phrase::arpeggio(self.step, self.hold, self.velocity)
        } else {
            Phrase::from_notes(&self.notes, self.step, self.hold, self.velocity)
        }
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if cli.threads.is_some() {
        config.render_threads = cli.threads;
    }

    match cli.command {
        Command::Play { phrase, repeat } => app::play(config, phrase.phrase(), repeat),
        Command::Render { out, phrase, tail } => {
            bounce::render_to_wav(config, &phrase.phrase(), tail, &out)
        }
    }
}

fn load_config(path: &Path) -> EyreResult<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    let config: EngineConfig = toml::from_str(&text)
        .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(?config, "loaded config");
    Ok(config)
}
