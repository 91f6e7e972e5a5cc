//! # Gambit Core
//!
//! Deterministic battle simulation for General's Gambit.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No clock
//! - No system randomness
//! - No floating-point math in the simulation path (uses fixed-point)
//!
//! Two rosters of troops, each led by a general, deploy in formation and
//! fight autonomously until a general falls, both troop lines are wiped
//! out, or the tick cap runs out. A game is a fixed number of such
//! rounds.
//!
//! ## Crate Structure
//!
//! - [`context`] - Game state owner and phase transitions
//! - [`scheduler`] - Fixed-cadence tick driver
//! - [`combatant`] - Combatant records and factory
//! - [`formation`] - Formation bonuses, layouts and deployment
//! - [`targeting`] - Target selection and movement
//! - [`combat`] - Damage resolution
//! - [`state`] - Phases, outcomes and win conditions
//! - [`prompt`] - Free-text prompt heuristics
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod combatant;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod formation;
pub mod math;
pub mod prompt;
pub mod roster;
pub mod scheduler;
pub mod state;
pub mod targeting;
pub mod terrain;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combatant::{
        Archetype, BaseStats, Combatant, CombatantId, CombatantSpec, Kind, Side, WeaponClass,
    };
    pub use crate::config::BattleConfig;
    pub use crate::context::{BattleContext, SideSetup};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{BattleObserver, CombatEvent, CombatantView, NullObserver, TickEvents};
    pub use crate::formation::{Formation, FormationBonus};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::roster::Roster;
    pub use crate::scheduler::TickScheduler;
    pub use crate::state::{BattleState, GameSummary, Phase, RoundOutcome, WinReason};
    pub use crate::terrain::{FlatTerrain, HeightGrid, Terrain};
}
