//! Spellcast CLI - replay recorded hand input through the gesture engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use spellcast::casting::{CastingConfig, CastingSession, GestureLibrary, RotationWrap};
use spellcast::script::{self, Replay};

#[derive(Parser, Debug)]
#[command(name = "spellcast", about = "Bimanual VR spell gesture recognition")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a frame script and print the emitted events
    Replay {
        /// Script file, one s-expression per line
        path: PathBuf,

        /// Rotation wraparound: strict or legacy
        #[arg(long, default_value = "strict")]
        rotation_wrap: String,

        /// Simultaneity window for two-handed casts (seconds)
        #[arg(long)]
        dual_hand_delay: Option<f32>,

        /// Print session status after the last command
        #[arg(long)]
        status: bool,
    },
    /// Print the built-in spell library
    Library,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spellcast=info".into()),
        )
        .init();

    let library = Arc::new(GestureLibrary::builtin().context("built-in spell library is invalid")?);

    match cli.command {
        Command::Library => {
            println!("{}", library.to_sexp());
        }
        Command::Replay {
            path,
            rotation_wrap,
            dual_hand_delay,
            status,
        } => {
            let Some(wrap) = RotationWrap::from_str(&rotation_wrap) else {
                bail!("unknown rotation wrap: {rotation_wrap}. Use: strict or legacy");
            };
            let mut config = CastingConfig {
                rotation_wrap: wrap,
                ..Default::default()
            };
            if let Some(delay) = dual_hand_delay {
                config.max_dual_hand_delay_s = delay;
            }

            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let commands = script::parse_script(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            info!("replaying {} command(s) from {}", commands.len(), path.display());

            let mut replay = Replay::new(CastingSession::new(library, config));
            for command in &commands {
                for line in replay.apply(command) {
                    println!("{line}");
                }
            }
            if status {
                println!("{}", replay.session().status_sexp());
            }
        }
    }
    Ok(())
}
