//! Battle orchestration: turn order, round lifecycle and victory checks
//!
//! Each round: every unit in the turn order takes one turn -> round end
//! (status damage -> status countdown -> flag reset -> prune the fallen ->
//! victory check).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::movement;
use crate::battle::resolution::{apply_status_damage, AttackKind, AttackResult, CombatResolver, HealResult};
use crate::battle::units::{CombatUnit, StatusEffect};
use crate::core::config::{BattleOptions, CombatConfig};
use crate::core::error::{Result, TacticsError};
use crate::core::types::{BattleId, Side, UnitId};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Setup,
    PlayerTurn,
    EnemyTurn,
    Victory,
    Defeat,
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat)
    }

    /// Turn phase for a unit of the given side
    fn for_side(side: Side) -> Self {
        match side {
            Side::Player => BattlePhase::PlayerTurn,
            _ => BattlePhase::EnemyTurn,
        }
    }
}

/// Battle result, terminal once it leaves `Ongoing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleResult {
    #[default]
    Ongoing,
    PlayerVictory,
    PlayerDefeat,
    Retreat,
}

/// One slot in the turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrderEntry {
    pub unit_id: UnitId,
    /// Speed captured when the order was built
    pub speed: i32,
    pub has_acted: bool,
}

/// What ends the battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryConditions {
    pub defeat_all_enemies: bool,
    /// Losing this unit loses the battle
    pub protect_unit: Option<UnitId>,
    /// Holding out past this many rounds wins the battle
    pub survive_rounds: Option<u32>,
}

impl Default for VictoryConditions {
    fn default() -> Self {
        Self {
            defeat_all_enemies: true,
            protect_unit: None,
            survive_rounds: None,
        }
    }
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    UnitMoved { unit_id: UnitId, from: HexCoord, to: HexCoord },
    Attacked { attacker: UnitId, defender: UnitId, hit: bool, damage: i32 },
    Healed { healer: UnitId, target: UnitId, amount: i32 },
    Waited { unit_id: UnitId },
    UnitJoined { unit_id: UnitId, position: HexCoord },
    StatusDamage { unit_id: UnitId, status: StatusEffect, damage: i32 },
    StatusExpired { unit_id: UnitId, status: StatusEffect },
    UnitFell { unit_id: UnitId },
    RoundEnded { round: u32 },
    Retreated,
    BattleEnded { result: BattleResult },
}

/// Ordered log of everything that happened in a battle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, round: u32) {
        self.events.push(BattleEvent {
            round,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Snapshot of one unit for the outcome report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub current_hp: i32,
    pub max_hp: i32,
}

impl From<&CombatUnit> for UnitSummary {
    fn from(unit: &CombatUnit) -> Self {
        Self {
            id: unit.id.clone(),
            name: unit.name.clone(),
            side: unit.side,
            current_hp: unit.current_hp,
            max_hp: unit.max_hp,
        }
    }
}

/// What the strategic layer receives when a battle ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub battle_id: BattleId,
    pub result: BattleResult,
    /// Rounds fully played
    pub rounds: u32,
    pub survivors: Vec<UnitSummary>,
    pub fallen: Vec<UnitSummary>,
}

/// A single tactical encounter
#[derive(Debug, Clone)]
pub struct Battle {
    pub id: BattleId,
    pub grid: BattleGrid,
    pub round: u32,
    pub phase: BattlePhase,
    pub result: BattleResult,
    pub victory_conditions: VictoryConditions,
    pub(crate) turn_order: Vec<TurnOrderEntry>,
    pub(crate) turn_index: usize,
    pub(crate) options: BattleOptions,
    pub(crate) resolver: CombatResolver,
    pub(crate) seed: u64,
    pub(crate) log: BattleEventLog,
    pub(crate) fallen: Vec<CombatUnit>,
}

impl Battle {
    pub fn new(
        grid: BattleGrid,
        victory_conditions: VictoryConditions,
        options: BattleOptions,
        config: CombatConfig,
        seed: u64,
    ) -> Self {
        let resolver = CombatResolver::new(config, options.melee_range, seed);
        Self {
            id: BattleId::new(),
            grid,
            round: 1,
            phase: BattlePhase::Setup,
            result: BattleResult::Ongoing,
            victory_conditions,
            turn_order: Vec::new(),
            turn_index: 0,
            options,
            resolver,
            seed,
            log: BattleEventLog::new(),
            fallen: Vec::new(),
        }
    }

    /// Default rules: defeat all enemies, standard options and tunables
    pub fn with_seed(grid: BattleGrid, seed: u64) -> Self {
        Self::new(
            grid,
            VictoryConditions::default(),
            BattleOptions::default(),
            CombatConfig::default(),
            seed,
        )
    }

    /// Is the battle finished?
    pub fn is_over(&self) -> bool {
        self.result != BattleResult::Ongoing
    }

    pub fn options(&self) -> &BattleOptions {
        &self.options
    }

    pub fn combat_config(&self) -> &CombatConfig {
        self.resolver.config()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn event_log(&self) -> &BattleEventLog {
        &self.log
    }

    /// Units removed from the grid at earlier round ends
    pub fn fallen(&self) -> &[CombatUnit] {
        &self.fallen
    }

    fn log_event(&mut self, event_type: BattleEventType, description: String) {
        self.log.push(event_type, description, self.round);
    }

    fn ensure_ongoing(&self) -> Result<()> {
        if self.is_over() {
            Err(TacticsError::BattleOver)
        } else {
            Ok(())
        }
    }

    /// Living units sorted by effective speed, fastest first. Ties keep
    /// placement order.
    fn build_turn_order(&self) -> Vec<TurnOrderEntry> {
        let mut order: Vec<TurnOrderEntry> = self
            .grid
            .units()
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| TurnOrderEntry {
                unit_id: u.id.clone(),
                speed: u.total_speed(),
                has_acted: false,
            })
            .collect();
        order.sort_by(|a, b| b.speed.cmp(&a.speed));
        order
    }

    fn update_phase(&mut self) {
        if self.is_over() {
            return;
        }
        self.phase = match self.current_unit() {
            Some(unit) => BattlePhase::for_side(unit.side),
            None => BattlePhase::PlayerTurn,
        };
    }

    /// Build the turn order and enter the first turn
    pub fn start_battle(&mut self) {
        self.turn_order = self.build_turn_order();
        self.turn_index = 0;
        self.update_phase();

        let description = format!(
            "Battle begins with {} units on a {}x{} field",
            self.turn_order.len(),
            self.grid.width,
            self.grid.height
        );
        info!(battle = %self.id.0, units = self.turn_order.len(), "battle started");
        self.log_event(BattleEventType::BattleStarted, description);
    }

    pub fn turn_order(&self) -> &[TurnOrderEntry] {
        &self.turn_order
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn current_unit_id(&self) -> Option<&UnitId> {
        self.turn_order.get(self.turn_index).map(|e| &e.unit_id)
    }

    pub fn current_unit(&self) -> Option<&CombatUnit> {
        self.current_unit_id().and_then(|id| self.grid.unit(id))
    }

    /// Finish the current turn and advance. Returns the unit whose turn it
    /// now is, or `None` once the battle is over.
    pub fn next_turn(&mut self) -> Option<UnitId> {
        if self.is_over() {
            return None;
        }

        if let Some(entry) = self.turn_order.get_mut(self.turn_index) {
            entry.has_acted = true;
        }
        self.turn_index += 1;

        if self.turn_index >= self.turn_order.len() {
            self.end_round();
        }

        self.update_phase();
        if self.is_over() {
            return None;
        }
        self.current_unit_id().cloned()
    }

    /// Round-end processing, then start the next round
    fn end_round(&mut self) {
        let ended = self.round;
        let config = self.resolver.config().clone();
        let mut events = Vec::new();

        for unit in self.grid.units_mut() {
            if !unit.is_alive() {
                continue;
            }
            for (status, damage) in apply_status_damage(&config, unit) {
                events.push((
                    BattleEventType::StatusDamage {
                        unit_id: unit.id.clone(),
                        status,
                        damage,
                    },
                    format!("{} suffers {} damage from {:?}", unit.name, damage, status),
                ));
            }
            for status in unit.update_status_effects() {
                events.push((
                    BattleEventType::StatusExpired {
                        unit_id: unit.id.clone(),
                        status,
                    },
                    format!("{} is no longer {:?}", unit.name, status),
                ));
            }
            unit.reset_turn_flags();
        }
        for (event_type, description) in events {
            self.log_event(event_type, description);
        }

        self.round += 1;
        self.turn_index = 0;
        for entry in &mut self.turn_order {
            entry.has_acted = false;
        }

        self.remove_fallen();

        if self.options.recompute_turn_order_each_round {
            self.turn_order = self.build_turn_order();
        }

        self.log.push(
            BattleEventType::RoundEnded { round: ended },
            format!("Round {} ends", ended),
            ended,
        );
        info!(round = ended, units = self.grid.unit_count(), "round ended");

        self.check_victory_conditions();
    }

    /// Take dead units off the grid and out of the turn order
    fn remove_fallen(&mut self) {
        let dead: Vec<UnitId> = self
            .grid
            .units()
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id.clone())
            .collect();

        for id in dead {
            if let Some(unit) = self.grid.remove_unit(&id) {
                self.log_event(
                    BattleEventType::UnitFell { unit_id: id.clone() },
                    format!("{} has fallen", unit.name),
                );
                self.fallen.push(unit);
            }
            self.turn_order.retain(|e| e.unit_id != id);
        }
    }

    fn has_living(&self, side: Side) -> bool {
        !self.grid.living_units_of(side).is_empty()
    }

    /// Evaluate victory and defeat. First match wins.
    pub fn check_victory_conditions(&mut self) {
        if self.is_over() {
            return;
        }

        let result = if !self.has_living(Side::Player) {
            Some(BattleResult::PlayerDefeat)
        } else if self.victory_conditions.defeat_all_enemies && !self.has_living(Side::Enemy) {
            Some(BattleResult::PlayerVictory)
        } else if self
            .victory_conditions
            .protect_unit
            .as_ref()
            .is_some_and(|id| !self.grid.unit(id).is_some_and(|u| u.is_alive()))
        {
            Some(BattleResult::PlayerDefeat)
        } else if self
            .victory_conditions
            .survive_rounds
            .is_some_and(|rounds| self.round > rounds)
        {
            Some(BattleResult::PlayerVictory)
        } else {
            None
        };

        if let Some(result) = result {
            self.end_battle(result);
        }
    }

    fn end_battle(&mut self, result: BattleResult) {
        self.result = result;
        self.phase = match result {
            BattleResult::PlayerVictory => BattlePhase::Victory,
            _ => BattlePhase::Defeat,
        };
        info!(battle = %self.id.0, ?result, round = self.round, "battle ended");
        self.log_event(
            BattleEventType::BattleEnded { result },
            format!("Battle ended: {:?}", result),
        );
    }

    // === ACTIONS ===

    /// Place a unit on the field. Once the battle has started a living unit
    /// also joins the end of the turn order and acts this round.
    pub fn add_unit(&mut self, unit: CombatUnit, position: HexCoord) -> Result<()> {
        self.ensure_ongoing()?;
        let entry = TurnOrderEntry {
            unit_id: unit.id.clone(),
            speed: unit.total_speed(),
            has_acted: false,
        };
        let joins_order = self.phase != BattlePhase::Setup && unit.is_alive();
        let name = unit.name.clone();
        self.grid.add_unit(unit, position)?;

        if joins_order {
            debug!(unit = %entry.unit_id, "unit joined the turn order");
            self.turn_order.push(entry.clone());
            if self.turn_order.len() == 1 {
                self.turn_index = 0;
                self.update_phase();
            }
            self.log_event(
                BattleEventType::UnitJoined {
                    unit_id: entry.unit_id,
                    position,
                },
                format!("{} joins the battle at ({}, {})", name, position.x, position.y),
            );
        }
        Ok(())
    }

    /// Move a unit along a legal path
    pub fn move_unit(&mut self, id: &UnitId, destination: HexCoord) -> Result<Vec<HexCoord>> {
        self.ensure_ongoing()?;
        let path = movement::move_unit(&mut self.grid, id, destination)?;
        if let (Some(from), Some(name)) = (path.first().copied(), self.grid.unit(id).map(|u| u.name.clone())) {
            self.log_event(
                BattleEventType::UnitMoved {
                    unit_id: id.clone(),
                    from,
                    to: destination,
                },
                format!("{} moves to ({}, {})", name, destination.x, destination.y),
            );
        }
        Ok(path)
    }

    /// Physical attack
    pub fn attack(&mut self, attacker: &UnitId, defender: &UnitId) -> Result<AttackResult> {
        self.resolve_attack(attacker, defender, AttackKind::Physical)
    }

    /// Magical attack. `spell_power` defaults to the configured base.
    pub fn cast(
        &mut self,
        attacker: &UnitId,
        defender: &UnitId,
        spell_power: Option<i32>,
    ) -> Result<AttackResult> {
        let spell_power = spell_power.unwrap_or(self.resolver.config().default_spell_power);
        self.resolve_attack(attacker, defender, AttackKind::Magical { spell_power })
    }

    fn resolve_attack(
        &mut self,
        attacker: &UnitId,
        defender: &UnitId,
        kind: AttackKind,
    ) -> Result<AttackResult> {
        self.ensure_ongoing()?;
        let result = self
            .resolver
            .execute_attack(&mut self.grid, attacker, defender, kind)?;
        self.log_event(
            BattleEventType::Attacked {
                attacker: attacker.clone(),
                defender: defender.clone(),
                hit: result.hit,
                damage: result.damage,
            },
            format!("{} -> {}: {}", attacker, defender, result.message),
        );
        Ok(result)
    }

    pub fn heal(
        &mut self,
        healer: &UnitId,
        target: &UnitId,
        heal_power: Option<i32>,
    ) -> Result<HealResult> {
        self.ensure_ongoing()?;
        let result = self.resolver.heal(&mut self.grid, healer, target, heal_power)?;
        self.log_event(
            BattleEventType::Healed {
                healer: healer.clone(),
                target: target.clone(),
                amount: result.amount,
            },
            format!("{} heals {} for {}", healer, target, result.amount),
        );
        Ok(result)
    }

    /// Give up the rest of the unit's turn
    pub fn wait(&mut self, id: &UnitId) -> Result<()> {
        self.ensure_ongoing()?;
        let unit = self
            .grid
            .unit_mut(id)
            .ok_or_else(|| TacticsError::UnknownUnit(id.clone()))?;
        unit.consume_turn();
        let description = format!("{} waits", unit.name);
        self.log_event(BattleEventType::Waited { unit_id: id.clone() }, description);
        Ok(())
    }

    /// The player side withdraws. Terminal.
    pub fn retreat(&mut self) -> Result<()> {
        self.ensure_ongoing()?;
        self.log_event(BattleEventType::Retreated, "The player forces retreat".into());
        self.end_battle(BattleResult::Retreat);
        Ok(())
    }

    // === QUERIES ===

    pub fn can_move(&self, id: &UnitId) -> bool {
        !self.is_over() && self.grid.unit(id).is_some_and(|u| u.can_move())
    }

    pub fn can_act(&self, id: &UnitId) -> bool {
        !self.is_over() && self.grid.unit(id).is_some_and(|u| u.can_act())
    }

    pub fn can_target(&self, attacker: &UnitId, defender: &UnitId) -> bool {
        self.resolver.can_target(&self.grid, attacker, defender)
    }

    pub fn targets_in_range(&self, attacker: &UnitId) -> Vec<UnitId> {
        self.resolver.targets_in_range(&self.grid, attacker)
    }

    pub fn units_by_side(&self, side: Side) -> Vec<&CombatUnit> {
        self.grid.units_by_side(side)
    }

    /// One line per turn-order slot, current unit marked with `>`
    pub fn turn_order_display(&self) -> Vec<String> {
        self.turn_order
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if i == self.turn_index { '>' } else { ' ' };
                let name = self
                    .grid
                    .unit(&entry.unit_id)
                    .map(|u| u.name.as_str())
                    .unwrap_or("?");
                let acted = if entry.has_acted { " (done)" } else { "" };
                format!("{} {} [SPD {}]{}", marker, name, entry.speed, acted)
            })
            .collect()
    }

    /// Outcome summary for the strategic layer
    pub fn report(&self) -> BattleReport {
        let survivors = self
            .grid
            .units()
            .iter()
            .filter(|u| u.is_alive())
            .map(UnitSummary::from)
            .collect();
        let fallen = self
            .fallen
            .iter()
            .chain(self.grid.units().iter().filter(|u| !u.is_alive()))
            .map(UnitSummary::from)
            .collect();

        BattleReport {
            battle_id: self.id,
            result: self.result,
            rounds: self.round.saturating_sub(1),
            survivors,
            fallen,
        }
    }
}
