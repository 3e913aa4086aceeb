use serde::{Deserialize, Serialize};

use crate::ViewerId;

/// Cumulative per-viewer data consulted when units are created or buffed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerStats {
    /// Whether the viewer is a channel member.
    pub is_member: bool,
    /// Highest paid chat tier, `-1` when none.
    pub super_chat_tier: i8,
    /// Highest gift tier, `-1` when none.
    pub gift_tier: i8,
    /// Team level, `0` when the viewer never joined.
    pub team_level: u8,
    /// Whether the viewer subscribed.
    pub is_subscriber: bool,
    /// Best unit level recorded for the viewer.
    pub best_level: u32,
    /// XP of the best recorded unit.
    pub best_xp: u32,
    /// Spendable score earned through combat.
    pub score: u64,
}

impl Default for ViewerStats {
    fn default() -> Self {
        Self {
            is_member: false,
            super_chat_tier: -1,
            gift_tier: -1,
            team_level: 0,
            is_subscriber: false,
            best_level: 1,
            best_xp: 0,
            score: 0,
        }
    }
}

/// Per-viewer ledger the world consults and updates.
///
/// Implementations own persistence; the world only calls these operations
/// while applying commands.
pub trait ViewerLedger {
    /// Returns the stats recorded for the viewer, or defaults when unknown.
    fn stats(&self, viewer: &ViewerId) -> ViewerStats;

    /// Deducts `cost` from the viewer's score when it is covered.
    ///
    /// Returns `false` and leaves the score untouched otherwise.
    fn try_spend_score(&mut self, viewer: &ViewerId, cost: u64) -> bool;

    /// Records a unit level reached by one of the viewer's units.
    fn update_best_level(&mut self, viewer: &ViewerId, level: u32, xp: u32);

    /// Lowers the viewer's best level by one and resets its XP.
    fn apply_death_penalty(&mut self, viewer: &ViewerId);

    /// Records that the viewer summoned a unit under the provided name.
    fn record_summon(&mut self, viewer: &ViewerId, owner: &str);
}
