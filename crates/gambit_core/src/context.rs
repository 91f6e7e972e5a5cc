//! The battle context: sole owner of all game state.
//!
//! [`BattleContext`] holds the round state, both rosters and the active
//! formations, and exposes every phase transition as a method. Transitions
//! are guarded by phase: calling one from the wrong phase is a silent
//! no-op that reports `false` or `None`.
//!
//! # Tick order
//!
//! Each battle tick runs, in this order:
//! 1. **Player pass** - every living player troop in roster order, then
//!    the player general, selects a target and attacks or advances
//! 2. **Enemy pass** - the same for the enemy roster
//! 3. **General duel** - generals within duel range strike each other
//!    if they have not already attacked this tick
//! 4. **End check** - win conditions are evaluated

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat;
use crate::combatant::{Combatant, CombatantId, CombatantSpec, Side};
use crate::config::BattleConfig;
use crate::error::{GameError, Result};
use crate::events::{CombatantView, TickEvents};
use crate::formation::{self, Formation, FormationBonus};
use crate::math::Fixed;
use crate::roster::Roster;
use crate::state::{self, BattleState, GameSummary, Phase, RoundOutcome, WinReason};
use crate::targeting;
use crate::terrain::Terrain;

/// What a side fields each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSetup {
    /// Spec every troop is built from.
    pub troop: CombatantSpec,
    /// Spec for the general; `None` uses a default melee general.
    #[serde(default)]
    pub general: Option<CombatantSpec>,
    /// Chosen formation; `None` uses a neutral grid.
    #[serde(default)]
    pub formation: Option<Formation>,
}

impl SideSetup {
    /// Troops of one archetype under a default general.
    #[must_use]
    pub fn of(archetype: &str) -> Self {
        Self {
            troop: CombatantSpec::troop(archetype, Side::Player),
            general: Some(CombatantSpec::general(archetype, Side::Player)),
            formation: None,
        }
    }

    /// Builder: set the formation.
    #[must_use]
    pub fn with_formation(mut self, formation: Formation) -> Self {
        self.formation = Some(formation);
        self
    }

    /// Builder: set the general spec.
    #[must_use]
    pub fn with_general(mut self, general: CombatantSpec) -> Self {
        self.general = Some(general);
        self
    }

    fn general_spec(&self, side: Side) -> CombatantSpec {
        self.general.clone().unwrap_or_else(|| {
            tracing::warn!(side = side.label(), "No general configured, using default");
            CombatantSpec::general("melee", side)
        })
    }

    fn formation_or_default(&self, side: Side) -> Formation {
        self.formation.clone().unwrap_or_else(|| {
            tracing::warn!(side = side.label(), "No formation chosen, using neutral grid");
            Formation::default()
        })
    }
}

impl Default for SideSetup {
    fn default() -> Self {
        Self::of("melee")
    }
}

/// All state for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleContext {
    config: BattleConfig,
    state: BattleState,
    player: Roster,
    enemy: Roster,
    player_setup: SideSetup,
    enemy_setup: SideSetup,
    player_formation: Formation,
    enemy_formation: Formation,
    history: Vec<RoundOutcome>,
}

impl BattleContext {
    /// Create a new game in the `Setup` phase with default setups.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        let player_setup = SideSetup::default();
        let enemy_setup = SideSetup::default();
        let player = build_roster(Side::Player, &player_setup, &config);
        let enemy = build_roster(Side::Enemy, &enemy_setup, &config);
        Self {
            config,
            state: BattleState::default(),
            player,
            enemy,
            player_setup,
            enemy_setup,
            player_formation: Formation::default(),
            enemy_formation: Formation::default(),
            history: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Simulation constants.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Round bookkeeping.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// A side's roster.
    #[must_use]
    pub fn roster(&self, side: Side) -> &Roster {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    /// Mutable access to a side's roster, for scripted setups and tests.
    pub fn roster_mut(&mut self, side: Side) -> &mut Roster {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// A side's setup.
    #[must_use]
    pub fn setup(&self, side: Side) -> &SideSetup {
        match side {
            Side::Player => &self.player_setup,
            Side::Enemy => &self.enemy_setup,
        }
    }

    /// Formation in effect for the current (or last) battle.
    #[must_use]
    pub fn formation(&self, side: Side) -> &Formation {
        match side {
            Side::Player => &self.player_formation,
            Side::Enemy => &self.enemy_formation,
        }
    }

    /// Outcomes of every finished battle this game.
    #[must_use]
    pub fn history(&self) -> &[RoundOutcome] {
        &self.history
    }

    /// Final results, available once the game is over.
    #[must_use]
    pub fn summary(&self) -> Option<GameSummary> {
        (self.state.phase == Phase::GameOver)
            .then(|| GameSummary::from_state(&self.state, self.config.round_limit))
    }

    /// Render views of every combatant, player roster first.
    #[must_use]
    pub fn views(&self) -> Vec<CombatantView> {
        self.player
            .iter()
            .chain(self.enemy.iter())
            .map(CombatantView::from)
            .collect()
    }

    // ========================================================================
    // Phase transitions
    // ========================================================================

    /// Replace a side's setup. Allowed in `Setup` and `FormationSelect`;
    /// rebuilds that side's roster.
    pub fn set_side(&mut self, side: Side, setup: SideSetup) -> bool {
        if !matches!(self.state.phase, Phase::Setup | Phase::FormationSelect) {
            return false;
        }
        let roster = build_roster(side, &setup, &self.config);
        match side {
            Side::Player => {
                self.player_setup = setup;
                self.player = roster;
            }
            Side::Enemy => {
                self.enemy_setup = setup;
                self.enemy = roster;
            }
        }
        true
    }

    /// `Setup -> FormationSelect`.
    pub fn enter_formation_select(&mut self) -> bool {
        if self.state.phase != Phase::Setup {
            return false;
        }
        self.state.phase = Phase::FormationSelect;
        tracing::info!(round = self.state.round, "Formation select");
        true
    }

    /// Pick a side's formation for the coming battle. Allowed in `Setup`
    /// and `FormationSelect`.
    pub fn choose_formation(&mut self, side: Side, formation: Formation) -> bool {
        if !matches!(self.state.phase, Phase::Setup | Phase::FormationSelect) {
            return false;
        }
        match side {
            Side::Player => self.player_setup.formation = Some(formation),
            Side::Enemy => self.enemy_setup.formation = Some(formation),
        }
        true
    }

    /// `FormationSelect -> Battle`.
    ///
    /// Rebuilds both rosters from their setups, locks in the formations,
    /// deploys both sides and resets the battle clock. Returns `false`
    /// from any other phase, which makes a duplicate start a no-op.
    pub fn start_battle(&mut self, terrain: &dyn Terrain) -> bool {
        if self.state.phase != Phase::FormationSelect {
            return false;
        }

        self.player = build_roster(Side::Player, &self.player_setup, &self.config);
        self.enemy = build_roster(Side::Enemy, &self.enemy_setup, &self.config);
        self.player_formation = self.player_setup.formation_or_default(Side::Player);
        self.enemy_formation = self.enemy_setup.formation_or_default(Side::Enemy);

        formation::deploy(&mut self.player, &self.player_formation, &self.config, terrain);
        formation::deploy(&mut self.enemy, &self.enemy_formation, &self.config, terrain);

        self.state.battle_elapsed_ticks = 0;
        self.state.phase = Phase::Battle;

        tracing::info!(
            round = self.state.round,
            player_formation = %self.player_formation.name,
            enemy_formation = %self.enemy_formation.name,
            "Battle started"
        );
        true
    }

    /// Advance the battle by one tick.
    ///
    /// Does nothing outside the `Battle` phase.
    pub fn tick(&mut self, terrain: &dyn Terrain) -> TickEvents {
        if self.state.phase != Phase::Battle {
            return TickEvents::default();
        }

        self.state.battle_elapsed_ticks += 1;
        let mut events = TickEvents {
            tick: self.state.battle_elapsed_ticks,
            ..TickEvents::default()
        };

        self.run_side(Side::Player, terrain, &mut events);
        self.run_side(Side::Enemy, terrain, &mut events);
        self.run_general_duel(&mut events);

        #[cfg(feature = "debug-validation")]
        if let Err(e) = self.validate_invariants() {
            tracing::error!(error = %e, "Invariant violated");
        }

        events.outcome = self.check_battle_end();
        events
    }

    /// Evaluate the win conditions and end the battle if one holds.
    ///
    /// A no-op once the phase has left `Battle`.
    pub fn check_battle_end(&mut self) -> Option<RoundOutcome> {
        if self.state.phase != Phase::Battle {
            return None;
        }
        let (winner, reason) = state::evaluate(
            &self.player,
            &self.enemy,
            self.state.battle_elapsed_ticks,
            &self.config,
        )?;
        self.end_battle(winner, reason)
    }

    /// `Battle -> End`: award the round and record its outcome.
    ///
    /// A no-op once the phase has left `Battle`, so a round is scored at
    /// most once.
    pub fn end_battle(&mut self, winner: Side, reason: WinReason) -> Option<RoundOutcome> {
        if self.state.phase != Phase::Battle {
            return None;
        }

        self.state.award(winner);
        self.state.phase = Phase::End;

        let outcome = RoundOutcome {
            round: self.state.round,
            winner,
            reason,
            ticks: self.state.battle_elapsed_ticks,
            player_hp: self.player.aggregate_hp(),
            enemy_hp: self.enemy.aggregate_hp(),
        };
        self.history.push(outcome.clone());

        tracing::info!(
            round = outcome.round,
            winner = winner.label(),
            reason = ?reason,
            ticks = outcome.ticks,
            player_score = self.state.player_score,
            enemy_score = self.state.enemy_score,
            "Battle ended"
        );
        Some(outcome)
    }

    /// `End -> FormationSelect`, or `End -> GameOver` once the round
    /// limit is passed. Returns the new phase.
    pub fn advance_round(&mut self) -> Option<Phase> {
        if self.state.phase != Phase::End {
            return None;
        }

        self.state.round += 1;
        self.state.phase = if self.state.round > self.config.round_limit {
            tracing::info!(
                player_score = self.state.player_score,
                enemy_score = self.state.enemy_score,
                "Game over"
            );
            Phase::GameOver
        } else {
            tracing::info!(round = self.state.round, "Next round");
            Phase::FormationSelect
        };
        Some(self.state.phase)
    }

    /// Return to `Setup` with round 1 and zero scores. Setups are kept.
    pub fn restart(&mut self) {
        self.state = BattleState::default();
        self.history.clear();
        self.player = build_roster(Side::Player, &self.player_setup, &self.config);
        self.enemy = build_roster(Side::Enemy, &self.enemy_setup, &self.config);
        tracing::info!("Game restarted");
    }

    // ========================================================================
    // Tick passes
    // ========================================================================

    fn run_side(&mut self, side: Side, terrain: &dyn Terrain, events: &mut TickEvents) {
        let bonus = self.formation(side).bonus;
        let step = self.config.move_step * bonus.speed;
        let (own, foe) = match side {
            Side::Player => (&mut self.player, &mut self.enemy),
            Side::Enemy => (&mut self.enemy, &mut self.player),
        };

        for troop in &mut own.troops {
            act(troop, &bonus, step, foe, terrain, events);
        }
        act(&mut own.general, &bonus, step, foe, terrain, events);
    }

    fn run_general_duel(&mut self, events: &mut TickEvents) {
        let player_bonus = self.player_formation.bonus;
        let enemy_bonus = self.enemy_formation.bonus;
        let range = self.config.general_duel_range;
        let (pg, eg) = (&mut self.player.general, &mut self.enemy.general);

        if !pg.is_alive() || !eg.is_alive() {
            return;
        }
        if pg.position.distance_squared(eg.position) > range.saturating_mul(range) {
            return;
        }

        duel_strike(pg, &player_bonus, eg, events);
        duel_strike(eg, &enemy_bonus, pg, events);
    }

    // ========================================================================
    // Determinism support
    // ========================================================================

    /// Hash of the full game state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.phase.hash(&mut hasher);
        self.state.round.hash(&mut hasher);
        self.state.player_score.hash(&mut hasher);
        self.state.enemy_score.hash(&mut hasher);
        self.state.battle_elapsed_ticks.hash(&mut hasher);

        for c in self.player.iter().chain(self.enemy.iter()) {
            c.id.hash(&mut hasher);
            c.hp.to_bits().hash(&mut hasher);
            c.cooldown.hash(&mut hasher);
            c.position.x.to_bits().hash(&mut hasher);
            c.position.z.to_bits().hash(&mut hasher);
            c.height.to_bits().hash(&mut hasher);
            c.facing.x.to_bits().hash(&mut hasher);
            c.facing.z.to_bits().hash(&mut hasher);
        }

        self.history.len().hash(&mut hasher);
        hasher.finish()
    }

    /// Check invariants that must hold between ticks.
    pub fn validate_invariants(&self) -> Result<()> {
        for c in self.player.iter().chain(self.enemy.iter()) {
            if c.hp < Fixed::ZERO || c.hp > c.max_hp {
                return Err(GameError::InvalidState(format!(
                    "combatant {} has hp {} outside [0, {}]",
                    c.id, c.hp, c.max_hp
                )));
            }
            if !c.is_alive() && c.visible {
                return Err(GameError::InvalidState(format!(
                    "dead combatant {} is still visible",
                    c.id
                )));
            }
        }
        if self.state.round == 0 {
            return Err(GameError::InvalidState("round must start at 1".to_string()));
        }
        Ok(())
    }

    /// Serialize the whole context to bytes.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize context: {e}")))
    }

    /// Restore a context from [`BattleContext::snapshot`] bytes.
    pub fn restore(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize context: {e}")))
    }
}

impl Default for BattleContext {
    fn default() -> Self {
        Self::new(BattleConfig::default())
    }
}

fn build_roster(side: Side, setup: &SideSetup, config: &BattleConfig) -> Roster {
    // Player ids start at 0, enemy ids follow the whole player roster.
    let first_id = match side {
        Side::Player => 0,
        Side::Enemy => {
            CombatantId::try_from(config.troops_per_side + 1).unwrap_or(CombatantId::MAX / 2)
        }
    };
    Roster::build(
        side,
        &setup.troop,
        &setup.general_spec(side),
        config.troops_per_side,
        first_id,
    )
}

/// One combatant's turn: pick a target, then attack or advance.
fn act(
    c: &mut Combatant,
    bonus: &FormationBonus,
    step: Fixed,
    foe: &mut Roster,
    terrain: &dyn Terrain,
    events: &mut TickEvents,
) {
    if !c.is_alive() {
        return;
    }

    if let Some(target) = targeting::select_target(c.position, foe) {
        let defender = foe.get_mut(target);
        targeting::face(c, defender.position);

        if !c.in_range_of(defender) {
            targeting::advance(c, defender.position, step, terrain);
        } else if c.cooldown <= 0 {
            combat::resolve(c, bonus, defender, &mut events.combat);
            c.cooldown = c.attack_rate;
        }
    }

    c.cooldown = c.cooldown.saturating_sub(1);
}

fn duel_strike(
    attacker: &mut Combatant,
    bonus: &FormationBonus,
    defender: &mut Combatant,
    events: &mut TickEvents,
) {
    if !attacker.is_alive() || attacker.cooldown > 0 || events.attacked(attacker.id) {
        return;
    }
    targeting::face(attacker, defender.position);
    // The regular pass has already ticked this cooldown down, so land
    // where a reset-then-decrement would.
    if combat::resolve(attacker, bonus, defender, &mut events.combat).is_some() {
        attacker.cooldown = attacker.attack_rate.saturating_sub(1);
    }
}
