//! Combat units and the status effects they carry
//!
//! A `CombatUnit` is the battle-only view of a roster unit: stat block,
//! position, per-round flags and timed statuses. The grid owns every unit;
//! other systems borrow them.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    BLESSED_STAT_MULTIPLIER, HASTE_SPEED_MULTIPLIER, SLOW_SPEED_MULTIPLIER,
};
use crate::battle::hex::{HexCoord, HexDirection};
use crate::core::types::{Element, Side, UnitId};

pub const STATUS_COUNT: usize = 10;

/// Timed conditions affecting combat units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    Poisoned,
    Burning,
    Frozen,
    Paralyzed,
    Charmed,
    Sleeping,
    Stunned,
    Blessed,
    Hasted,
    Slowed,
}

impl StatusEffect {
    pub fn all() -> [StatusEffect; STATUS_COUNT] {
        [
            StatusEffect::Poisoned,
            StatusEffect::Burning,
            StatusEffect::Frozen,
            StatusEffect::Paralyzed,
            StatusEffect::Charmed,
            StatusEffect::Sleeping,
            StatusEffect::Stunned,
            StatusEffect::Blessed,
            StatusEffect::Hasted,
            StatusEffect::Slowed,
        ]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Does this status stop the unit from taking its turn?
    pub fn is_incapacitating(&self) -> bool {
        matches!(
            self,
            StatusEffect::Stunned | StatusEffect::Sleeping | StatusEffect::Paralyzed
        )
    }
}

/// Remaining rounds for every status, indexed by `StatusEffect::index`.
/// Zero means inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSet {
    remaining: [u8; STATUS_COUNT],
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, status: StatusEffect) -> bool {
        self.remaining[status.index()] > 0
    }

    /// Rounds left on a status (0 if inactive)
    pub fn remaining(&self, status: StatusEffect) -> u8 {
        self.remaining[status.index()]
    }

    /// Apply or refresh a status. A zero duration is ignored.
    pub fn add(&mut self, status: StatusEffect, duration: u8) {
        if duration > 0 {
            self.remaining[status.index()] = duration;
        }
    }

    pub fn remove(&mut self, status: StatusEffect) {
        self.remaining[status.index()] = 0;
    }

    /// Count every active status down one round. Returns the statuses that
    /// expired in this pass.
    pub fn tick(&mut self) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        for status in StatusEffect::all() {
            let slot = &mut self.remaining[status.index()];
            if *slot > 0 {
                *slot -= 1;
                if *slot == 0 {
                    expired.push(status);
                }
            }
        }
        expired
    }
}

/// Unit in tactical combat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatUnit {
    // Identity
    pub id: UnitId,
    pub name: String,
    pub side: Side,

    // Position (None when not on the grid)
    pub position: Option<HexCoord>,
    pub facing: HexDirection,

    // Pools
    pub max_hp: i32,
    pub current_hp: i32,
    pub max_mp: i32,
    pub current_mp: i32,

    // Combat stats
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub speed: i32,

    // Equipment bonuses
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub speed_bonus: i32,

    // Movement
    pub move_range: u32,
    pub jump_height: u32,
    pub has_moved: bool,
    pub has_acted: bool,

    pub element: Option<Element>,
    pub statuses: StatusSet,

    /// Ability ids owned by the strategic layer; carried through untouched
    #[serde(default)]
    pub abilities: Vec<String>,

    pub is_ai_controlled: bool,
}

impl CombatUnit {
    /// A unit with the baseline stat block (100 HP, 50 MP, 10 across the board)
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            side,
            position: None,
            facing: HexDirection::default(),
            max_hp: 100,
            current_hp: 100,
            max_mp: 50,
            current_mp: 50,
            attack: 10,
            defense: 10,
            magic_attack: 10,
            magic_defense: 10,
            speed: 10,
            attack_bonus: 0,
            defense_bonus: 0,
            speed_bonus: 0,
            move_range: 3,
            jump_height: 1,
            has_moved: false,
            has_acted: false,
            element: None,
            statuses: StatusSet::new(),
            abilities: Vec::new(),
            is_ai_controlled: false,
        }
    }

    /// Set max and current HP together
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.max_hp = hp;
        self.current_hp = hp;
        self
    }

    pub fn with_stats(mut self, attack: i32, defense: i32, speed: i32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self.speed = speed;
        self
    }

    pub fn with_magic(mut self, magic_attack: i32, magic_defense: i32) -> Self {
        self.magic_attack = magic_attack;
        self.magic_defense = magic_defense;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_movement(mut self, move_range: u32, jump_height: u32) -> Self {
        self.move_range = move_range;
        self.jump_height = jump_height;
        self
    }

    pub fn ai_controlled(mut self) -> Self {
        self.is_ai_controlled = true;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Alive and not incapacitated by a status
    pub fn is_ready(&self) -> bool {
        self.is_alive()
            && !StatusEffect::all()
                .iter()
                .any(|s| s.is_incapacitating() && self.statuses.has(*s))
    }

    pub fn can_move(&self) -> bool {
        self.is_ready() && !self.has_moved
    }

    pub fn can_act(&self) -> bool {
        self.is_ready() && !self.has_acted
    }

    pub fn has_status(&self, status: StatusEffect) -> bool {
        self.statuses.has(status)
    }

    pub fn add_status(&mut self, status: StatusEffect, duration: u8) {
        self.statuses.add(status, duration);
    }

    pub fn remove_status(&mut self, status: StatusEffect) {
        self.statuses.remove(status);
    }

    /// Count statuses down one round, clearing any that reach zero
    pub fn update_status_effects(&mut self) -> Vec<StatusEffect> {
        self.statuses.tick()
    }

    /// Deal damage (at least 1). HP never drops below 0.
    /// Returns the damage dealt.
    pub fn take_damage(&mut self, damage: i32) -> i32 {
        let actual = damage.max(1);
        self.current_hp = (self.current_hp - actual).max(0);
        actual
    }

    /// Restore HP without exceeding max. Returns HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.clamp(0, self.missing_hp());
        self.current_hp += restored;
        restored
    }

    /// Spend MP if enough is available
    pub fn consume_mp(&mut self, amount: i32) -> bool {
        if self.current_mp >= amount {
            self.current_mp -= amount;
            true
        } else {
            false
        }
    }

    pub fn restore_mp(&mut self, amount: i32) -> i32 {
        let old = self.current_mp;
        self.current_mp = (self.current_mp + amount.max(0)).min(self.max_mp);
        self.current_mp - old
    }

    pub fn missing_hp(&self) -> i32 {
        (self.max_hp - self.current_hp).max(0)
    }

    pub fn total_attack(&self) -> i32 {
        let total = self.attack + self.attack_bonus;
        if self.has_status(StatusEffect::Blessed) {
            (total as f32 * BLESSED_STAT_MULTIPLIER) as i32
        } else {
            total
        }
    }

    pub fn total_defense(&self) -> i32 {
        let total = self.defense + self.defense_bonus;
        if self.has_status(StatusEffect::Blessed) {
            (total as f32 * BLESSED_STAT_MULTIPLIER) as i32
        } else {
            total
        }
    }

    /// Speed with bonus, haste and slow applied
    pub fn total_speed(&self) -> i32 {
        let mut total = self.speed + self.speed_bonus;
        if self.has_status(StatusEffect::Hasted) {
            total = (total as f32 * HASTE_SPEED_MULTIPLIER) as i32;
        }
        if self.has_status(StatusEffect::Slowed) {
            total = (total as f32 * SLOW_SPEED_MULTIPLIER) as i32;
        }
        total
    }

    pub fn reset_turn_flags(&mut self) {
        self.has_moved = false;
        self.has_acted = false;
    }

    /// Mark the whole turn as spent
    pub fn consume_turn(&mut self) {
        self.has_moved = true;
        self.has_acted = true;
    }

    /// HP as a percentage (0-100)
    pub fn hp_percentage(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f32 / self.max_hp as f32 * 100.0
    }
}
