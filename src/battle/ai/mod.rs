//! AI control for non-player units
//!
//! Architecture: strategy traits + data
//! - `TargetSelector` and `MovePlanner` are the swappable decisions
//! - `UnitPolicy` composes one of each
//! - `AiController` holds a default policy plus per-unit overrides and
//!   drives a unit's whole turn through the battle's public actions
//! - `AiPersonality` (TOML) picks the policy family and aggression

mod basic;
mod personality;
mod scoring;
mod tactical;

pub use basic::{ClosestApproach, LowestHealthTargeting};
pub use personality::{load_personality, load_personality_from, AiPersonality, BehaviorConfig, PolicyKind};
pub use scoring::{
    aggression_adjustment, evaluate_position, nearest_ally, nearest_hostile, target_score,
    ScoreWeights,
};
pub use tactical::{PositionalMovement, ThreatTargeting};

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::battle::battle_map::BattleGrid;
use crate::battle::execution::{Battle, BattlePhase, BattleReport};
use crate::battle::hex::HexCoord;
use crate::battle::units::CombatUnit;
use crate::core::types::UnitId;

/// Picks which of the in-range candidates to attack
pub trait TargetSelector: fmt::Debug + Send + Sync {
    fn select_target(
        &self,
        grid: &BattleGrid,
        attacker: &CombatUnit,
        candidates: &[&CombatUnit],
    ) -> Option<UnitId>;
}

/// Picks a destination among the unit's reachable cells
pub trait MovePlanner: fmt::Debug + Send + Sync {
    fn choose_move(&self, grid: &BattleGrid, unit: &CombatUnit) -> Option<HexCoord>;
}

/// One targeting strategy and one movement strategy
#[derive(Debug, Clone)]
pub struct UnitPolicy {
    pub targeting: Arc<dyn TargetSelector>,
    pub movement: Arc<dyn MovePlanner>,
}

impl UnitPolicy {
    pub fn new(targeting: Arc<dyn TargetSelector>, movement: Arc<dyn MovePlanner>) -> Self {
        Self { targeting, movement }
    }

    /// Weakest target in reach, otherwise close on the nearest enemy
    pub fn basic() -> Self {
        Self::new(Arc::new(LowestHealthTargeting), Arc::new(ClosestApproach))
    }

    /// Threat-weighted targeting with positional movement
    pub fn tactical(aggression: f32) -> Self {
        Self::new(
            Arc::new(ThreatTargeting::default()),
            Arc::new(PositionalMovement::new(aggression)),
        )
    }

    pub fn from_personality(personality: &AiPersonality) -> Self {
        match personality.policy {
            PolicyKind::Basic => Self::basic(),
            PolicyKind::Tactical => Self::tactical(personality.behavior.aggression),
        }
    }
}

impl Default for UnitPolicy {
    fn default() -> Self {
        Self::basic()
    }
}

/// Acts for AI-controlled units
#[derive(Debug, Clone, Default)]
pub struct AiController {
    pub default_policy: UnitPolicy,
    overrides: AHashMap<UnitId, UnitPolicy>,
}

impl AiController {
    pub fn new(default_policy: UnitPolicy) -> Self {
        Self {
            default_policy,
            overrides: AHashMap::new(),
        }
    }

    pub fn with_override(mut self, id: impl Into<UnitId>, policy: UnitPolicy) -> Self {
        self.set_policy(id, policy);
        self
    }

    pub fn set_policy(&mut self, id: impl Into<UnitId>, policy: UnitPolicy) {
        self.overrides.insert(id.into(), policy);
    }

    pub fn policy_for(&self, id: &UnitId) -> &UnitPolicy {
        self.overrides.get(id).unwrap_or(&self.default_policy)
    }

    /// Play one unit's turn: attack if something is in reach (and stop
    /// there), otherwise move and try again. The unit's turn is spent
    /// afterwards whatever happened.
    ///
    /// Units not under AI control, or unable to take a turn, are left
    /// untouched. Returns a line per action taken.
    pub fn take_turn(&self, battle: &mut Battle, id: &UnitId) -> Vec<String> {
        let mut messages = Vec::new();

        let Some(unit) = battle.grid.unit(id) else {
            return messages;
        };
        if !unit.is_ai_controlled || !unit.is_ready() || battle.is_over() {
            return messages;
        }

        let policy = self.policy_for(id).clone();

        if battle.can_act(id) {
            if let Some(msg) = try_attack(battle, id, &policy) {
                messages.push(msg);
                end_turn(battle, id);
                return messages;
            }
        }

        if battle.can_move(id) {
            if let Some(msg) = try_move(battle, id, &policy) {
                messages.push(msg);
            }
        }

        if battle.can_act(id) {
            if let Some(msg) = try_attack(battle, id, &policy) {
                messages.push(msg);
            }
        }

        end_turn(battle, id);
        messages
    }

    /// Play the battle out with every unit under this controller.
    ///
    /// Units without AI control pass. Stops once the battle ends or
    /// `max_rounds` rounds have been played.
    pub fn auto_resolve(&self, battle: &mut Battle, max_rounds: u32) -> BattleReport {
        if battle.phase == BattlePhase::Setup {
            battle.start_battle();
        }

        while !battle.is_over() && battle.round <= max_rounds {
            if let Some(id) = battle.current_unit_id().cloned() {
                for msg in self.take_turn(battle, &id) {
                    debug!(unit = %id, round = battle.round, "{}", msg);
                }
            }
            battle.next_turn();
        }

        battle.report()
    }
}

fn end_turn(battle: &mut Battle, id: &UnitId) {
    if let Some(unit) = battle.grid.unit_mut(id) {
        unit.consume_turn();
    }
}

fn try_attack(battle: &mut Battle, id: &UnitId, policy: &UnitPolicy) -> Option<String> {
    let targets = battle.targets_in_range(id);
    if targets.is_empty() {
        return None;
    }

    let (target, attacker_name, target_name) = {
        let attacker = battle.grid.unit(id)?;
        let candidates: Vec<&CombatUnit> =
            targets.iter().filter_map(|t| battle.grid.unit(t)).collect();
        let target = policy
            .targeting
            .select_target(&battle.grid, attacker, &candidates)?;
        let target_name = battle.grid.unit(&target)?.name.clone();
        (target, attacker.name.clone(), target_name)
    };

    debug!(unit = %id, target = %target, "AI attacks");
    match battle.attack(id, &target) {
        Ok(result) if result.hit => {
            let mut msg = format!("{} attacks {} for {} damage!", attacker_name, target_name, result.damage);
            if result.critical {
                msg.push_str(" Critical hit!");
            }
            if result.defender_defeated {
                msg.push_str(&format!(" {} is defeated!", target_name));
            }
            Some(msg)
        }
        Ok(_) => Some(format!("{} attacks {} but misses!", attacker_name, target_name)),
        Err(err) => {
            warn!(unit = %id, target = %target, error = %err, "AI attack rejected");
            None
        }
    }
}

fn try_move(battle: &mut Battle, id: &UnitId, policy: &UnitPolicy) -> Option<String> {
    let destination = {
        let unit = battle.grid.unit(id)?;
        policy.movement.choose_move(&battle.grid, unit)?
    };

    debug!(unit = %id, to = ?destination, "AI moves");
    match battle.move_unit(id, destination) {
        Ok(_) => {
            let name = battle.grid.unit(id)?.name.clone();
            Some(format!("{} moves to ({}, {})", name, destination.x, destination.y))
        }
        Err(err) => {
            warn!(unit = %id, to = ?destination, error = %err, "AI move rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::execution::BattleResult;
    use crate::battle::units::StatusEffect;
    use crate::core::types::Side;

    fn duel(enemy_pos: HexCoord) -> Battle {
        let mut grid = BattleGrid::new(10, 10);
        grid.add_unit(
            CombatUnit::new("orc", "Orc", Side::Enemy).ai_controlled(),
            enemy_pos,
        )
        .unwrap();
        grid.add_unit(
            CombatUnit::new("hero", "Hero", Side::Player).with_stats(10, 10, 5),
            HexCoord::new(2, 4),
        )
        .unwrap();
        let mut battle = Battle::with_seed(grid, 9);
        battle.start_battle();
        battle
    }

    fn orc() -> UnitId {
        UnitId::from("orc")
    }

    #[test]
    fn test_player_unit_untouched() {
        let mut battle = duel(HexCoord::new(8, 4));
        let hero = UnitId::from("hero");
        let before = battle.grid.unit(&hero).unwrap().clone();

        let messages = AiController::default().take_turn(&mut battle, &hero);
        assert!(messages.is_empty());
        assert_eq!(battle.grid.unit(&hero).unwrap(), &before);
    }

    #[test]
    fn test_stunned_unit_skipped_without_mutation() {
        let mut battle = duel(HexCoord::new(3, 4));
        battle.grid.unit_mut(&orc()).unwrap().add_status(StatusEffect::Stunned, 1);
        let before = battle.grid.units().to_vec();
        let events = battle.event_log().len();

        let messages = AiController::default().take_turn(&mut battle, &orc());
        assert!(messages.is_empty());
        assert_eq!(battle.grid.units(), before.as_slice());
        assert_eq!(battle.event_log().len(), events);
    }

    #[test]
    fn test_adjacent_target_attacked_without_moving() {
        let mut battle = duel(HexCoord::new(3, 4));
        let messages = AiController::default().take_turn(&mut battle, &orc());

        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Orc attacks Hero"));
        let orc = battle.grid.unit(&orc()).unwrap();
        assert_eq!(orc.position, Some(HexCoord::new(3, 4)));
        assert!(orc.has_moved && orc.has_acted);
    }

    #[test]
    fn test_distant_unit_moves_closer() {
        let mut battle = duel(HexCoord::new(8, 4));
        let messages = AiController::default().take_turn(&mut battle, &orc());

        assert_eq!(messages.len(), 1);
        let orc = battle.grid.unit(&orc()).unwrap();
        assert_eq!(orc.position.unwrap().distance(&HexCoord::new(2, 4)), 3);
        assert!(orc.has_moved && orc.has_acted);
    }

    #[test]
    fn test_moves_then_attacks_when_in_reach() {
        let mut battle = duel(HexCoord::new(5, 4));
        let messages = AiController::default().take_turn(&mut battle, &orc());

        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Orc moves to"));
        assert!(messages[1].starts_with("Orc attacks Hero"));
        let orc = battle.grid.unit(&orc()).unwrap();
        assert_eq!(orc.position.unwrap().distance(&HexCoord::new(2, 4)), 1);
    }

    #[test]
    fn test_override_policy_used() {
        let controller = AiController::default().with_override("orc", UnitPolicy::tactical(0.2));
        // Keeps its distance instead of advancing
        let mut battle = duel(HexCoord::new(8, 4));
        controller.take_turn(&mut battle, &orc());
        let orc_pos = battle.grid.unit(&orc()).unwrap().position.unwrap();
        assert!(orc_pos.distance(&HexCoord::new(2, 4)) >= 6);
    }

    #[test]
    fn test_policy_from_personality() {
        let personality = AiPersonality {
            name: "test".into(),
            policy: PolicyKind::Tactical,
            behavior: BehaviorConfig { aggression: 0.9 },
        };
        let policy = UnitPolicy::from_personality(&personality);
        assert!(format!("{:?}", policy.movement).contains("PositionalMovement"));
    }

    #[test]
    fn test_auto_resolve_finishes_battle() {
        let mut grid = BattleGrid::new(10, 10);
        grid.add_unit(
            CombatUnit::new("champion", "Champion", Side::Player)
                .with_hp(1000)
                .with_stats(60, 30, 12)
                .ai_controlled(),
            HexCoord::new(2, 4),
        )
        .unwrap();
        grid.add_unit(
            CombatUnit::new("grunt", "Grunt", Side::Enemy)
                .with_hp(1)
                .ai_controlled(),
            HexCoord::new(6, 4),
        )
        .unwrap();
        let mut battle = Battle::with_seed(grid, 21);

        let report = AiController::default().auto_resolve(&mut battle, 50);
        assert_eq!(report.result, BattleResult::PlayerVictory);
        assert_eq!(report.fallen.len(), 1);
        assert_eq!(report.survivors[0].id, UnitId::from("champion"));
    }

    #[test]
    fn test_auto_resolve_respects_round_limit() {
        let mut grid = BattleGrid::new(10, 10);
        grid.add_unit(CombatUnit::new("a", "A", Side::Player), HexCoord::new(0, 0))
            .unwrap();
        grid.add_unit(CombatUnit::new("b", "B", Side::Enemy), HexCoord::new(9, 9))
            .unwrap();
        let mut battle = Battle::with_seed(grid, 1);

        // Nobody is AI controlled, so nothing happens
        let report = AiController::default().auto_resolve(&mut battle, 3);
        assert_eq!(report.result, BattleResult::Ongoing);
        assert_eq!(battle.round, 4);
        assert_eq!(report.rounds, 3);
    }
}
