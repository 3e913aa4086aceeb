#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory viewer ledger with per-mode JSON saves.
//!
//! The ledger scores viewers from world outcome events, records platform
//! buffs so newly placed units inherit them, and persists the run progress
//! together with every viewer entry.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use stream_siege_core::{
    Command, Event, GameMode, Team, ViewerId, ViewerLedger, ViewerStats,
};
use thiserror::Error;

/// Version written into every save document.
pub const SAVE_VERSION: u32 = 1;

const SCORE_PER_DAMAGE: u64 = 1;
const SCORE_PER_HEAL: u64 = 1;
const SCORE_PER_KILL: u64 = 50;

/// Failures raised while reading or writing a save.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The save file could not be read, written, or removed.
    #[error("failed to access save file {path}: {source}")]
    Io {
        /// Path of the save file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The save file is not a valid save document.
    #[error("save file {path} is malformed: {source}")]
    Parse {
        /// Path of the save file.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The save file was written by an incompatible version.
    #[error("save file {path} has unsupported version {found}")]
    UnsupportedVersion {
        /// Path of the save file.
        path: PathBuf,
        /// Version found in the document.
        found: u32,
    },
}

/// Ledger entry of a single viewer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerEntry {
    /// Display name last used by the viewer.
    pub name: String,
    /// Number of units the viewer summoned.
    pub summons: u32,
    /// Buff and progression data.
    pub stats: ViewerStats,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveDocument {
    version: u32,
    wave_index: u32,
    total_kills: u32,
    viewers: BTreeMap<ViewerId, ViewerEntry>,
}

/// Viewer ledger kept in memory for the duration of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryLedger {
    viewers: BTreeMap<ViewerId, ViewerEntry>,
    wave_index: u32,
    total_kills: u32,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry recorded for the viewer, if any.
    #[must_use]
    pub fn entry(&self, viewer: &ViewerId) -> Option<&ViewerEntry> {
        self.viewers.get(viewer)
    }

    /// Spendable score of the viewer.
    #[must_use]
    pub fn score(&self, viewer: &ViewerId) -> u64 {
        self.entry(viewer).map_or(0, |entry| entry.stats.score)
    }

    /// Adds score to a viewer outside of combat, for rewards granted by adapters.
    pub fn credit(&mut self, viewer: &ViewerId, points: u64) {
        if viewer.is_anonymous() {
            return;
        }
        let entry = self.entry_mut(viewer);
        entry.stats.score = entry.stats.score.saturating_add(points);
    }

    /// Wave index and total kills of the persisted run.
    #[must_use]
    pub const fn progress(&self) -> (u32, u32) {
        (self.wave_index, self.total_kills)
    }

    fn entry_mut(&mut self, viewer: &ViewerId) -> &mut ViewerEntry {
        self.viewers.entry(viewer.clone()).or_default()
    }

    /// Folds world outcome events into viewer scores and run progress.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::DamageDealt { viewer, amount, .. } => {
                    self.credit(viewer, u64::from(*amount) * SCORE_PER_DAMAGE);
                }
                Event::HealPerformed { viewer, amount, .. } => {
                    self.credit(viewer, u64::from(*amount) * SCORE_PER_HEAL);
                }
                Event::UnitKilled {
                    viewer,
                    victim_team: Team::Enemy,
                    ..
                } => {
                    self.total_kills = self.total_kills.saturating_add(1);
                    self.credit(viewer, SCORE_PER_KILL);
                }
                Event::WaveCleared { wave, .. } => {
                    self.wave_index = wave.saturating_add(1);
                }
                _ => {}
            }
        }
    }

    /// Records the platform buff carried by a command before the world applies it.
    ///
    /// Tiers only ever go up; commands that are not platform buffs are ignored.
    pub fn record_grant(&mut self, command: &Command) {
        match command {
            Command::GrantMembership { viewer } => self.entry_mut(viewer).stats.is_member = true,
            Command::GrantSuperChat { viewer, tier, .. } => {
                let stats = &mut self.entry_mut(viewer).stats;
                stats.super_chat_tier = stats.super_chat_tier.max(*tier);
            }
            Command::GrantGift { viewer, tier, .. } => {
                let stats = &mut self.entry_mut(viewer).stats;
                stats.gift_tier = stats.gift_tier.max(*tier);
            }
            Command::GrantSubscription { viewer } => {
                self.entry_mut(viewer).stats.is_subscriber = true;
            }
            Command::GrantTeamJoin { viewer, level } => {
                let stats = &mut self.entry_mut(viewer).stats;
                stats.team_level = stats.team_level.max(*level);
            }
            _ => {}
        }
    }

    /// Path of the save slot for a mode inside `directory`.
    #[must_use]
    pub fn save_path(directory: &Path, mode: GameMode) -> PathBuf {
        directory.join(format!("{}.json", mode.save_key()))
    }

    /// Writes the ledger into the mode's save slot.
    pub fn save(&self, directory: &Path, mode: GameMode) -> Result<PathBuf, LedgerError> {
        let path = Self::save_path(directory, mode);
        let document = SaveDocument {
            version: SAVE_VERSION,
            wave_index: self.wave_index,
            total_kills: self.total_kills,
            viewers: self.viewers.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document).map_err(|source| LedgerError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(directory).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), viewers = self.viewers.len(), "ledger saved");
        Ok(path)
    }

    /// Reads the mode's save slot.
    pub fn load(directory: &Path, mode: GameMode) -> Result<Self, LedgerError> {
        let path = Self::save_path(directory, mode);
        let bytes = fs::read(&path).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        let document: SaveDocument =
            serde_json::from_slice(&bytes).map_err(|source| LedgerError::Parse {
                path: path.clone(),
                source,
            })?;
        if document.version != SAVE_VERSION {
            return Err(LedgerError::UnsupportedVersion {
                path,
                found: document.version,
            });
        }
        tracing::info!(path = %path.display(), wave = document.wave_index, "ledger loaded");
        Ok(Self {
            viewers: document.viewers,
            wave_index: document.wave_index,
            total_kills: document.total_kills,
        })
    }

    /// Reads the mode's save slot, falling back to an empty ledger.
    #[must_use]
    pub fn load_or_default(directory: &Path, mode: GameMode) -> Self {
        match Self::load(directory, mode) {
            Ok(ledger) => ledger,
            Err(LedgerError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable save");
                Self::default()
            }
        }
    }

    /// Removes the mode's save slot; a missing slot is not an error.
    pub fn delete_save(directory: &Path, mode: GameMode) -> Result<(), LedgerError> {
        let path = Self::save_path(directory, mode);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "save deleted");
                Ok(())
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LedgerError::Io { path, source }),
        }
    }
}

impl ViewerLedger for MemoryLedger {
    fn stats(&self, viewer: &ViewerId) -> ViewerStats {
        self.entry(viewer)
            .map(|entry| entry.stats.clone())
            .unwrap_or_default()
    }

    fn try_spend_score(&mut self, viewer: &ViewerId, cost: u64) -> bool {
        let Some(entry) = self.viewers.get_mut(viewer) else {
            return cost == 0;
        };
        match entry.stats.score.checked_sub(cost) {
            Some(remaining) => {
                entry.stats.score = remaining;
                true
            }
            None => false,
        }
    }

    fn update_best_level(&mut self, viewer: &ViewerId, level: u32, xp: u32) {
        let stats = &mut self.entry_mut(viewer).stats;
        if (level, xp) > (stats.best_level, stats.best_xp) {
            stats.best_level = level;
            stats.best_xp = xp;
        }
    }

    fn apply_death_penalty(&mut self, viewer: &ViewerId) {
        let stats = &mut self.entry_mut(viewer).stats;
        stats.best_level = stats.best_level.saturating_sub(1).max(1);
        stats.best_xp = 0;
    }

    fn record_summon(&mut self, viewer: &ViewerId, owner: &str) {
        let entry = self.entry_mut(viewer);
        entry.summons = entry.summons.saturating_add(1);
        owner.clone_into(&mut entry.name);
    }
}
