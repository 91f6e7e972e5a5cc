//! Headless game runner for balance testing and CI verification.
//!
//! Plays General's Gambit without graphics:
//!
//! - **Scenarios**: RON files describing both sides as free-text prompts
//! - **Batch runs**: every formation matchup, many games, in parallel
//! - **Determinism checks**: replay a scenario and compare state hashes
//! - **Real-time play**: tick-rate pacing with an ASCII battlefield view
//! - **Score log**: one JSON line per finished game
//!
//! # Output
//!
//! - **stdout**: JSON lines, see [`protocol`]
//! - **stderr**: logs (human-readable) and the ASCII view
//!
//! # Example
//!
//! ```bash
//! cargo run -p gambit_headless -- run --scenario scenarios/skirmish.ron
//! cargo run -p gambit_headless -- verify --runs 5
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod persistence;
pub mod protocol;
pub mod realtime;
pub mod scenario;

pub use ascii_visualizer::{render_ascii, AsciiConfig, AsciiRenderer};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, VerifyReport};
pub use game_runner::{run_game, GameReport, GameRunner, GameSession};
pub use metrics::{BatchSummary, GameMetrics};
pub use persistence::{
    JsonLinesScoreStore, MemoryScoreStore, PersistenceError, ScoreRecord, ScoreStore,
};
pub use protocol::Output;
pub use realtime::run_realtime;
pub use scenario::{Scenario, ScenarioError, SideScenario, TerrainSpec};
