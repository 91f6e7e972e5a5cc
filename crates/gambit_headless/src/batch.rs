//! Batch game execution for formation balance testing.
//!
//! Runs many games in parallel using rayon. Game `i` plays the scenario
//! with the `i`-th formation matchup from the catalogue (cycling through
//! every player/enemy pairing), so a batch of `16 * k` games covers each
//! matchup `k` times.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gambit_core::formation::Formation;

use crate::game_runner::GameRunner;
use crate::metrics::{BatchSummary, GameMetrics};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Name of the base scenario.
    pub scenario: String,
    /// Number of games to run.
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "Skirmish".to_string(),
            game_count: 16,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create a batch config for `game_count` games of `scenario`.
    #[must_use]
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Builder: set the output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Builder: cap the number of games run at once.
    #[must_use]
    pub fn with_parallel(mut self, parallel: u32) -> Self {
        self.parallel_games = parallel;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Formation matchup the game was playing.
    pub matchup: String,
    /// Error message
    pub message: String,
}

/// Every ordered (player, enemy) pairing from the formation catalogue.
#[must_use]
pub fn formation_matchups() -> Vec<(Formation, Formation)> {
    let catalogue = Formation::catalogue();
    catalogue
        .iter()
        .flat_map(|p| catalogue.iter().map(move |e| (p.clone(), e.clone())))
        .collect()
}

/// Run a batch of games.
pub fn run_batch(config: BatchConfig, scenario: &Scenario) -> BatchResults {
    let start = Instant::now();
    let matchups = formation_matchups();
    let runner = GameRunner::new();

    info!(
        "Starting batch run: {} games of '{}' over {} matchups",
        config.game_count,
        config.scenario,
        matchups.len()
    );

    let play = |i: u32| -> Result<GameMetrics, BatchError> {
        let (player, enemy) = &matchups[i as usize % matchups.len()];
        let game = scenario.clone().with_formations(&player.name, &enemy.name);
        let matchup = format!("{} vs {}", player.name, enemy.name);
        debug!(game = i, %matchup, "Game starting");

        runner
            .run(&game)
            .map(|report| GameMetrics::from_report(format!("game_{i:05}"), &report))
            .map_err(|e| {
                warn!("Game {} failed: {}", i, e);
                BatchError {
                    game_index: i,
                    matchup,
                    message: e.to_string(),
                }
            })
    };

    let run_all = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count).into_par_iter().map(&play).collect()
    };

    // Configure thread pool if specified
    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!("Failed to build thread pool ({}), using the global pool", e);
                run_all()
            }
        }
    } else {
        run_all()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Games played.
    pub runs: u32,
    /// Final state hash of each game.
    pub hashes: Vec<u64>,
    /// True when every run finished with the same hash.
    pub deterministic: bool,
    /// First error, if a run failed outright.
    pub error: Option<String>,
}

/// Play `scenario` `runs` times and compare the final state hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> VerifyReport {
    let runner = GameRunner::new();
    let mut hashes = Vec::with_capacity(runs as usize);

    for run in 0..runs {
        match runner.run(scenario) {
            Ok(report) => hashes.push(report.state_hash),
            Err(e) => {
                warn!(run, "Verification run failed: {}", e);
                return VerifyReport {
                    runs,
                    hashes,
                    deterministic: false,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    VerifyReport {
        runs,
        hashes,
        deterministic,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::config::BattleConfig;

    fn small() -> Scenario {
        let mut scenario = Scenario::skirmish();
        scenario.config = BattleConfig::default()
            .with_troops_per_side(3)
            .with_round_limit(1);
        scenario
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 16);
        assert_eq!(config.parallel_games, 0);
    }

    #[test]
    fn test_matchups_cover_catalogue() {
        let matchups = formation_matchups();
        assert_eq!(matchups.len(), 16);
        assert_eq!(matchups[0].0.name, "Phalanx");
        assert_eq!(matchups[0].1.name, "Phalanx");
        assert_eq!(matchups[1].1.name, "Wedge");
    }

    #[test]
    fn test_batch_runs_every_matchup() {
        let results = run_batch(BatchConfig::new("small", 16).with_parallel(2), &small());
        assert!(results.errors.is_empty());
        assert_eq!(results.games.len(), 16);
        assert_eq!(results.summary.total_games, 16);
        assert_eq!(results.summary.matchup_player_win_rates.len(), 16);
        assert_eq!(results.games[5].game_id, "game_00005");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let a = run_batch(BatchConfig::new("small", 8).with_parallel(1), &small());
        let b = run_batch(BatchConfig::new("small", 8).with_parallel(4), &small());
        assert_eq!(a.games, b.games);
    }

    #[test]
    fn test_results_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("batch.json");
        let results = run_batch(BatchConfig::new("small", 2), &small());

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();

        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.summary.total_games, 2);
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&small(), 3);
        assert!(report.deterministic);
        assert_eq!(report.hashes.len(), 3);
        assert!(report.error.is_none());
    }
}
