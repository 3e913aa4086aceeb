//! Static stat table, buff multipliers, progression curve, and final scoring.

use crate::UnitType;

/// Multiplier applied to core stats on every level-up.
pub const LEVEL_STAT_MULTIPLIER: f32 = 1.08;
/// Fraction of the new maximum HP restored on every level-up.
pub const LEVEL_UP_HEAL_FRACTION: f32 = 0.3;
/// Cosmetic size growth applied on every level-up.
pub const LEVEL_SIZE_GROWTH: f32 = 1.04;
/// Maximum number of level-ups a single XP grant may trigger.
pub const MAX_LEVEL_UPS_PER_GRANT: u32 = 5;
/// Upper bound on XP gained from a single event.
pub const XP_GRANT_CAP: u32 = 500;

/// Stat multiplier granted by channel membership.
pub const MEMBER_MULTIPLIER: f32 = 1.2;
/// Stat multiplier granted by a subscription.
pub const SUBSCRIBER_MULTIPLIER: f32 = 1.15;
/// Stat multiplier granted to allies by each like milestone.
pub const MILESTONE_MULTIPLIER: f32 = 1.05;
/// Stat multipliers per paid chat tier.
pub const SUPER_CHAT_MULTIPLIERS: [f32; 5] = [1.1, 1.2, 1.35, 1.5, 1.75];
/// Stat multipliers per gift tier.
pub const GIFT_MULTIPLIERS: [f32; 6] = [1.05, 1.15, 1.3, 1.5, 1.8, 2.2];
/// Highest team level that still improves the team buff.
pub const MAX_TEAM_LEVEL: u8 = 5;
/// Fraction of max HP regenerated per second by subscriber units.
pub const SUBSCRIBER_AUTO_HEAL_RATE: f32 = 0.01;
/// Fraction of max HP regenerated per second by top gift tier units.
pub const TOP_GIFT_AUTO_HEAL_RATE: f32 = 0.02;
/// Seconds between two aura pulses.
pub const AURA_PERIOD_SECS: f32 = 3.0;
/// Damage reduction granted while the team buff window is open.
pub const TEAM_BUFF_DAMAGE_REDUCTION: f32 = 0.2;
/// Length of the team buff window.
pub const TEAM_BUFF_SECS: f32 = 10.0;
/// Upper bound on the effective damage reduction of any unit.
pub const MAX_DAMAGE_REDUCTION: f32 = 0.9;
/// Maximum HP multiplier applied to wave bosses.
pub const BOSS_HP_MULTIPLIER: f32 = 3.0;
/// Attack multiplier applied to wave bosses.
pub const BOSS_ATTACK_MULTIPLIER: f32 = 1.5;

/// Base attributes of a unit type at level 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseStats {
    /// Maximum hit points.
    pub max_hp: u32,
    /// Damage per attack.
    pub attack_power: u32,
    /// Reach of attacks or heals.
    pub attack_range: f32,
    /// Seconds between two attacks.
    pub attack_interval: f32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Fraction of incoming damage ignored.
    pub damage_reduction: f32,
    /// Hit points restored per heal.
    pub heal_amount: u32,
    /// Gold price in the shop.
    pub gold_cost: u32,
}

/// Looks up the base stats of a unit type.
#[must_use]
pub const fn base_stats(kind: UnitType) -> BaseStats {
    match kind {
        UnitType::Warrior => BaseStats {
            max_hp: 120,
            attack_power: 12,
            attack_range: 1.2,
            attack_interval: 1.0,
            move_speed: 2.0,
            damage_reduction: 0.1,
            heal_amount: 0,
            gold_cost: 30,
        },
        UnitType::Lancer => BaseStats {
            max_hp: 100,
            attack_power: 14,
            attack_range: 1.6,
            attack_interval: 1.2,
            move_speed: 2.2,
            damage_reduction: 0.05,
            heal_amount: 0,
            gold_cost: 40,
        },
        UnitType::Archer => BaseStats {
            max_hp: 70,
            attack_power: 10,
            attack_range: 6.0,
            attack_interval: 1.3,
            move_speed: 1.8,
            damage_reduction: 0.0,
            heal_amount: 0,
            gold_cost: 40,
        },
        UnitType::Monk => BaseStats {
            max_hp: 80,
            attack_power: 4,
            attack_range: 4.0,
            attack_interval: 1.5,
            move_speed: 1.8,
            damage_reduction: 0.0,
            heal_amount: 15,
            gold_cost: 50,
        },
        UnitType::Mage => BaseStats {
            max_hp: 65,
            attack_power: 18,
            attack_range: 5.5,
            attack_interval: 1.8,
            move_speed: 1.6,
            damage_reduction: 0.0,
            heal_amount: 0,
            gold_cost: 60,
        },
        UnitType::Knight => BaseStats {
            max_hp: 180,
            attack_power: 20,
            attack_range: 1.3,
            attack_interval: 1.0,
            move_speed: 2.0,
            damage_reduction: 0.2,
            heal_amount: 0,
            gold_cost: 100,
        },
    }
}

/// Scales an integral stat, never shrinking it.
#[must_use]
pub fn scale_stat(value: u32, factor: f32) -> u32 {
    let scaled = (value as f32 * factor).round();
    (scaled as u32).max(value)
}

/// Damage left after applying a damage reduction fraction; never below 1.
#[must_use]
pub fn damage_after_reduction(raw: u32, damage_reduction: f32) -> u32 {
    let reduction = damage_reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
    let reduced = (raw as f32 * (1.0 - reduction)).round() as u32;
    reduced.max(1)
}

/// XP required to advance from `level` to the next one.
#[must_use]
pub const fn xp_to_next_level(level: u32) -> u32 {
    50 + level.saturating_mul(level)
}

/// XP actually credited to a unit of the provided type for a raw gain.
#[must_use]
pub fn xp_gain(kind: UnitType, raw: u32) -> u32 {
    let adjusted = if kind == UnitType::Archer { raw / 2 } else { raw };
    adjusted.min(XP_GRANT_CAP)
}

/// Outcome of applying an XP grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    /// Level after the grant.
    pub level: u32,
    /// XP toward the next level after the grant.
    pub xp: u32,
    /// Number of level-ups the grant triggered.
    pub level_ups: u32,
}

/// Adds `gain` XP to a unit at `level` holding `xp`.
///
/// At most [`MAX_LEVEL_UPS_PER_GRANT`] level-ups happen; leftover XP is
/// clamped just below the next threshold.
#[must_use]
pub fn advance_level(level: u32, xp: u32, gain: u32) -> LevelProgress {
    let mut level = level.max(1);
    let mut xp = xp.saturating_add(gain);
    let mut level_ups = 0;
    while level_ups < MAX_LEVEL_UPS_PER_GRANT && xp >= xp_to_next_level(level) {
        xp -= xp_to_next_level(level);
        level += 1;
        level_ups += 1;
    }
    let threshold = xp_to_next_level(level);
    if xp >= threshold {
        xp = threshold - 1;
    }
    LevelProgress {
        level,
        xp,
        level_ups,
    }
}

/// Multiplier granted when a tiered buff moves from `from` to `to`.
///
/// Tier `-1` means the buff was never granted. Returns `None` for downgrades,
/// repeats, and tiers outside the table.
#[must_use]
pub fn tier_transition_factor(table: &[f32], from: i8, to: i8) -> Option<f32> {
    if to <= from || to < 0 {
        return None;
    }
    let target = *table.get(usize::try_from(to).ok()?)?;
    if from < 0 {
        return Some(target);
    }
    let current = *table.get(usize::try_from(from).ok()?)?;
    Some(target / current)
}

/// Stat multiplier granted by a team level.
#[must_use]
pub fn team_multiplier(level: u8) -> f32 {
    1.0 + 0.1 * f32::from(level.min(MAX_TEAM_LEVEL))
}

/// Multiplier granted when the team level moves from `from` to `to`.
#[must_use]
pub fn team_transition_factor(from: u8, to: u8) -> Option<f32> {
    let to = to.min(MAX_TEAM_LEVEL);
    if to <= from {
        return None;
    }
    Some(team_multiplier(to) / team_multiplier(from))
}

/// Periodic heal emitted by high tier gift units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuraGrant {
    /// Fraction of each recipient's max HP restored per pulse.
    pub heal_fraction: f32,
    /// Attack multiplier granted to recipients until the next pulse.
    pub attack_multiplier: f32,
    /// Radius of the aura.
    pub radius: f32,
}

/// Aura granted by a gift tier, if any.
#[must_use]
pub const fn gift_aura(tier: i8) -> Option<AuraGrant> {
    match tier {
        3 => Some(AuraGrant {
            heal_fraction: 0.03,
            attack_multiplier: 1.05,
            radius: 3.0,
        }),
        4 => Some(AuraGrant {
            heal_fraction: 0.05,
            attack_multiplier: 1.1,
            radius: 3.5,
        }),
        5 => Some(AuraGrant {
            heal_fraction: 0.08,
            attack_multiplier: 1.15,
            radius: 4.0,
        }),
        _ => None,
    }
}

/// XP bonus granted to every living ally when wave `wave` is cleared.
#[must_use]
pub const fn wave_clear_bonus_xp(wave: u32) -> u32 {
    20 + wave * 5
}

/// Inputs to the end-of-match score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreInputs {
    /// Wave index reached.
    pub wave_index: u32,
    /// Enemies killed during the session.
    pub total_kills: u32,
    /// Remaining player castle HP.
    pub castle_hp: u32,
    /// Seconds elapsed since the session started.
    pub elapsed_seconds: f32,
    /// Allies alive when the match ended.
    pub living_allies: u32,
    /// Whether the player castle never took damage.
    pub castle_untouched: bool,
}

impl ScoreInputs {
    /// Computes the final score and rank.
    #[must_use]
    pub fn final_score(&self) -> FinalScore {
        let time_bonus = (3000.0 - self.elapsed_seconds.max(0.0) * 5.0).max(0.0) as u64;
        let score = u64::from(self.wave_index) * 1000
            + u64::from(self.total_kills) * 100
            + u64::from(self.castle_hp) * 10
            + time_bonus
            + u64::from(self.living_allies) * 50
            + if self.castle_untouched { 5000 } else { 0 };
        FinalScore {
            score,
            rank: Rank::for_score(score),
        }
    }
}

/// Final score and rank of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalScore {
    /// Total points.
    pub score: u64,
    /// Letter rank.
    pub rank: Rank,
}

/// Letter rank awarded on the result screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    /// Below 5000 points.
    D,
    /// At least 5000 points.
    C,
    /// At least 12000 points.
    B,
    /// At least 20000 points.
    A,
    /// At least 30000 points.
    S,
}

impl Rank {
    /// Resolves the rank for a score.
    #[must_use]
    pub const fn for_score(score: u64) -> Self {
        if score >= 30_000 {
            Self::S
        } else if score >= 20_000 {
            Self::A
        } else if score >= 12_000 {
            Self::B
        } else if score >= 5_000 {
            Self::C
        } else {
            Self::D
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_score_matches_reference_match() {
        let inputs = ScoreInputs {
            wave_index: 3,
            total_kills: 10,
            castle_hp: 200,
            elapsed_seconds: 100.0,
            living_allies: 4,
            castle_untouched: true,
        };
        let result = inputs.final_score();
        assert_eq!(result.score, 13_700);
        assert_eq!(result.rank, Rank::B);
    }

    #[test]
    fn time_bonus_never_goes_negative() {
        let inputs = ScoreInputs {
            wave_index: 0,
            total_kills: 0,
            castle_hp: 0,
            elapsed_seconds: 10_000.0,
            living_allies: 0,
            castle_untouched: false,
        };
        assert_eq!(inputs.final_score().score, 0);
        assert_eq!(inputs.final_score().rank, Rank::D);
    }

    #[test]
    fn damage_never_drops_below_one() {
        for raw in [1, 2, 5, 17, 400] {
            for reduction in [0.0, 0.25, 0.5, 0.89, 0.999] {
                assert!(damage_after_reduction(raw, reduction) >= 1);
            }
        }
        assert_eq!(damage_after_reduction(10, 0.25), 8);
    }

    #[test]
    fn level_curve_grows_quadratically() {
        assert_eq!(xp_to_next_level(1), 51);
        assert_eq!(xp_to_next_level(10), 150);
    }

    #[test]
    fn huge_grant_caps_level_ups_and_leftover() {
        let progress = advance_level(1, 0, 100_000);
        assert_eq!(progress.level_ups, MAX_LEVEL_UPS_PER_GRANT);
        assert_eq!(progress.level, 6);
        assert_eq!(progress.xp, xp_to_next_level(6) - 1);
    }

    #[test]
    fn partial_grant_keeps_remainder() {
        let progress = advance_level(1, 40, 20);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp, 9);
        assert_eq!(progress.level_ups, 1);
    }

    #[test]
    fn archer_gains_are_halved_then_capped() {
        assert_eq!(xp_gain(UnitType::Archer, 30), 15);
        assert_eq!(xp_gain(UnitType::Warrior, 30), 30);
        assert_eq!(xp_gain(UnitType::Warrior, 9_000), XP_GRANT_CAP);
    }

    #[test]
    fn tier_transitions_are_monotonic() {
        assert_eq!(tier_transition_factor(&SUPER_CHAT_MULTIPLIERS, -1, 0), Some(1.1));
        assert!(tier_transition_factor(&SUPER_CHAT_MULTIPLIERS, 2, 2).is_none());
        assert!(tier_transition_factor(&SUPER_CHAT_MULTIPLIERS, 3, 1).is_none());
        assert!(tier_transition_factor(&SUPER_CHAT_MULTIPLIERS, 1, 9).is_none());

        let stepwise = tier_transition_factor(&GIFT_MULTIPLIERS, -1, 1).unwrap_or_default()
            * tier_transition_factor(&GIFT_MULTIPLIERS, 1, 4).unwrap_or_default();
        assert!((stepwise - GIFT_MULTIPLIERS[4]).abs() < 1e-5);
    }

    #[test]
    fn team_levels_beyond_maximum_are_ignored() {
        assert!(team_transition_factor(MAX_TEAM_LEVEL, 9).is_none());
        let factor = team_transition_factor(0, 2).unwrap_or_default();
        assert!((factor - 1.2).abs() < 1e-5);
    }

    #[test]
    fn scaling_never_shrinks_stats() {
        assert_eq!(scale_stat(0, 1.5), 0);
        assert_eq!(scale_stat(100, 1.08), 108);
        assert_eq!(scale_stat(3, 1.01), 3);
    }
}
