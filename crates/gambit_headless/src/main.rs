//! Headless General's Gambit runner.
//!
//! Plays games without graphics. Results go to stdout as JSON lines;
//! logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play the default skirmish
//! cargo run -p gambit_headless -- run
//!
//! # Play a scenario file, watch it in the terminal at 20 Hz, keep scores
//! cargo run -p gambit_headless -- run --scenario archers.ron --ascii --realtime --scores scores.jsonl
//!
//! # Every formation matchup, 64 games, 8 at a time
//! cargo run -p gambit_headless -- batch --count 64 --parallel 8 --output results/
//!
//! # Determinism check
//! cargo run -p gambit_headless -- verify --runs 5
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gambit_core::events::{BattleObserver, NullObserver};
use gambit_headless::{
    ascii_visualizer::{AsciiConfig, AsciiRenderer},
    batch::{run_batch, verify_determinism, BatchConfig},
    game_runner::GameRunner,
    persistence::{JsonLinesScoreStore, ScoreRecord, ScoreStore},
    protocol::Output,
    realtime::{default_interval, run_realtime},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "gambit_headless")]
#[command(about = "Headless General's Gambit runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one full game
    Run {
        /// Scenario file to load (RON)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Append the final score to this JSON lines log
        #[arg(long)]
        scores: Option<PathBuf>,

        /// Draw the battlefield on stderr
        #[arg(long)]
        ascii: bool,

        /// Pace ticks at the real tick rate
        #[arg(long)]
        realtime: bool,
    },

    /// Run every formation matchup across many games
    Batch {
        /// Scenario file to load (RON)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of games to run
        #[arg(short, long, default_value = "16")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify determinism by replaying a scenario
    Verify {
        /// Scenario file to load (RON)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for JSON output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let code = match cli.command {
        Some(Commands::Run {
            scenario,
            scores,
            ascii,
            realtime,
        }) => cmd_run(scenario, scores, ascii, realtime),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
        }) => cmd_batch(scenario, count, parallel, output),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        None => cmd_run(None, None, false, false),
    };
    std::process::exit(code);
}

/// Print one record to stdout.
fn emit(output: &Output) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout
        .write_all(output.to_json_line().as_bytes())
        .and_then(|()| stdout.flush())
    {
        tracing::error!(error = %e, "Failed to write to stdout");
    }
}

/// Load a scenario file, or the built-in skirmish.
fn load_scenario(path: Option<PathBuf>) -> Option<Scenario> {
    let Some(path) = path else {
        return Some(Scenario::skirmish());
    };
    match Scenario::load(&path) {
        Ok(scenario) => {
            tracing::info!(name = %scenario.name, path = %path.display(), "Scenario loaded");
            Some(scenario)
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to load scenario");
            emit(&Output::error(e.to_string()));
            None
        }
    }
}

/// Play one game
fn cmd_run(scenario: Option<PathBuf>, scores: Option<PathBuf>, ascii: bool, realtime: bool) -> i32 {
    let Some(scenario) = load_scenario(scenario) else {
        return 1;
    };

    let mut renderer;
    let mut null = NullObserver;
    let observer: &mut dyn BattleObserver = if ascii {
        let config = AsciiConfig {
            every_n_ticks: if realtime { 1 } else { AsciiConfig::default().every_n_ticks },
            ..AsciiConfig::default()
        };
        renderer = AsciiRenderer::new(config, io::stderr());
        &mut renderer
    } else {
        &mut null
    };

    let result = if realtime {
        run_realtime(&scenario, default_interval(), observer)
    } else {
        GameRunner::new().run_observed(&scenario, observer)
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Game failed");
            emit(&Output::error(e.to_string()));
            return 1;
        }
    };

    for line in Output::from_report(&report) {
        emit(&line);
    }

    if let Some(path) = scores {
        let mut store = JsonLinesScoreStore::new(path);
        if let Err(e) = store.append(&ScoreRecord::now(&report.summary)) {
            tracing::error!(error = %e, path = %store.path().display(), "Failed to save score");
            return 1;
        }
    }
    0
}

/// Run a batch of games for balance testing
fn cmd_batch(scenario: Option<PathBuf>, count: u32, parallel: u32, output: PathBuf) -> i32 {
    let Some(scenario) = load_scenario(scenario) else {
        return 1;
    };

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        scenario = %scenario.name,
        count = count,
        parallel = parallel,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    let config = BatchConfig::new(&scenario.name, count)
        .with_parallel(parallel)
        .with_output(output.clone());
    let results = run_batch(config, &scenario);

    let path = output.join("batch.json");
    if let Err(e) = results.save(&path) {
        tracing::error!(error = %e, path = %path.display(), "Failed to save batch results");
        emit(&Output::error(e.to_string()));
        return 1;
    }

    emit(&Output::Batch {
        games: results.games.len(),
        errors: results.errors.len(),
        output: path.display().to_string(),
    });
    i32::from(!results.errors.is_empty())
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, runs: u32) -> i32 {
    let Some(scenario) = load_scenario(scenario) else {
        return 1;
    };
    tracing::info!("Verifying determinism: {} ({} runs)", scenario.name, runs);

    let report = verify_determinism(&scenario, runs.max(2));
    let deterministic = report.deterministic;
    emit(&Output::Verify(report));

    if deterministic {
        tracing::info!("PASS: All runs produced identical results");
        0
    } else {
        tracing::error!("FAIL: Non-determinism detected");
        1
    }
}
