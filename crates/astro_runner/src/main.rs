//! Astro Arena game host.
//!
//! Runs one game with the players reached through a JSON-lines host on
//! stdin/stdout, or checks a recorded replay.
//!
//! # Usage
//!
//! ```bash
//! # Host a game over stdio with the standard rules
//! cargo run -p astro_runner -- run
//!
//! # Custom rules, fixed seed, short game, keep a replay
//! cargo run -p astro_runner -- run --config rules.ron --seed 42 --rounds 200 --replay-out game.replay
//!
//! # Re-run a replay and compare the final state
//! cargo run -p astro_runner -- verify-replay game.replay
//!
//! # Print the default rule set as RON
//! cargo run -p astro_runner -- default-config > rules.ron
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use astro_core::config::GameConfig;
use astro_core::replay::Replay;
use astro_runner::{GameRunner, JsonLinesTransport, Result, RunnerOptions};

#[derive(Parser)]
#[command(name = "astro_runner")]
#[command(about = "Game host for the Astro Arena space strategy contest")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a game over stdin/stdout
    Run {
        /// RON rule set (defaults to the standard rules)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// World seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Write a replay of the game to this file
        #[arg(long)]
        replay_out: Option<PathBuf>,
    },

    /// Re-run a recorded game and check it ends in the recorded state
    VerifyReplay {
        /// Replay file path
        file: PathBuf,
    },

    /// Print the default rule set as RON
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            config,
            seed,
            rounds,
            replay_out,
        } => cmd_run(config, seed, rounds, replay_out),
        Commands::VerifyReplay { file } => cmd_verify_replay(file),
        Commands::DefaultConfig => cmd_default_config(),
    }
}

/// Host a single game on stdio.
fn cmd_run(
    config: Option<PathBuf>,
    seed: u64,
    rounds: Option<u32>,
    replay_out: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => GameConfig::load(&path)?,
        None => GameConfig::default(),
    };
    let options = RunnerOptions {
        config,
        seed,
        rounds,
        record_replay: replay_out.is_some(),
    };

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    let transport = JsonLinesTransport::new(stdin, stdout);

    let summary = GameRunner::new(transport, options)?.run();
    for (name, score) in &summary.scores {
        tracing::info!(player = %name, score, "Final score");
    }

    if let (Some(path), Some(replay)) = (replay_out, &summary.replay) {
        replay.save(&path)?;
    }
    Ok(())
}

/// Re-run a replay and compare hashes.
fn cmd_verify_replay(file: PathBuf) -> Result<()> {
    let replay = Replay::load(&file)?;
    tracing::info!(
        path = %file.display(),
        rounds = replay.duration(),
        players = replay.roster.len(),
        "Verifying replay"
    );

    let world = replay.verify()?;
    println!("Replay verified: {} rounds", world.round());
    println!("Final hash: {:016x}", world.state_hash());
    for (name, score) in world.scores() {
        println!("  {name}: {score}");
    }
    Ok(())
}

/// Print the standard rule set.
fn cmd_default_config() -> Result<()> {
    println!("{}", GameConfig::default().to_ron_string()?);
    Ok(())
}
