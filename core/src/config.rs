//! Tunable parameters of a simulation session.

use serde::{Deserialize, Serialize};

use crate::{Bounds, Vec2};

/// Tunables shared by the world and the systems.
///
/// Every field has a default so configuration files only need to list the
/// values they override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Rectangle every unit is clamped to.
    pub battlefield: Bounds,
    /// Rectangle allies are clamped to while preparing and placed into.
    pub placement_zone: Bounds,
    /// Centre of the player castle.
    pub player_castle: Vec2,
    /// Centre of the enemy castle.
    pub enemy_castle: Vec2,
    /// Radius units must reach to strike a castle.
    pub castle_radius: f32,
    /// Maximum HP of the player castle.
    pub player_castle_hp: u32,
    /// Maximum HP of the enemy castle on wave 0.
    pub enemy_castle_base_hp: u32,
    /// Additional enemy castle HP per wave index.
    pub enemy_castle_hp_per_wave: u32,
    /// X coordinate allies retreat to while defending.
    pub rear_line_x: f32,
    /// Maximum allies, queued and deployed combined.
    pub global_unit_cap: usize,
    /// Maximum allies owned by a single viewer.
    pub per_viewer_cap: usize,
    /// Gold granted when leaving the title screen.
    pub starting_gold: u32,
    /// Gold accrued per second of battle.
    pub gold_per_second: u32,
    /// Ledger score spent by an ultimate.
    pub ultimate_cost: u64,
    /// Seconds a defeated unit stays on the field.
    pub death_duration_secs: f32,
    /// Seconds a defend order lasts before reverting to attack.
    pub defend_duration_secs: f32,
    /// Radius used for same-team separation.
    pub collision_radius: f32,
    /// Largest cosmetic size multiplier reachable through levels.
    pub max_size_scale: f32,
    /// Number of entries kept in the kill log.
    pub kill_log_capacity: usize,
    /// Seed feeding combat and placement randomness.
    pub rng_seed: u64,
}

impl SimConfig {
    /// Maximum HP of the enemy castle for the provided wave index.
    #[must_use]
    pub fn enemy_castle_hp(&self, wave: u32) -> u32 {
        self.enemy_castle_base_hp
            .saturating_add(self.enemy_castle_hp_per_wave.saturating_mul(wave))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            battlefield: Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(40.0, 20.0)),
            placement_zone: Bounds::new(Vec2::new(1.0, 1.0), Vec2::new(12.0, 19.0)),
            player_castle: Vec2::new(2.0, 10.0),
            enemy_castle: Vec2::new(38.0, 10.0),
            castle_radius: 1.5,
            player_castle_hp: 1000,
            enemy_castle_base_hp: 500,
            enemy_castle_hp_per_wave: 250,
            rear_line_x: 5.0,
            global_unit_cap: 30,
            per_viewer_cap: 3,
            starting_gold: 100,
            gold_per_second: 1,
            ultimate_cost: 100,
            death_duration_secs: 1.0,
            defend_duration_secs: 8.0,
            collision_radius: 0.4,
            max_size_scale: 1.6,
            kill_log_capacity: 8,
            rng_seed: 0x5eed_cafe_d00d_2024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_castle_grows_with_wave() {
        let config = SimConfig::default();
        assert_eq!(config.enemy_castle_hp(0), 500);
        assert_eq!(config.enemy_castle_hp(4), 1500);
    }
}
