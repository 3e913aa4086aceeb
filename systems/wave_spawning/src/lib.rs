#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave spawner that trickles enemies onto the battlefield.
//!
//! Each wave (and each reinforcement round) draws its roster from a ChaCha
//! stream seeded by hashing the global seed together with the wave index, so
//! replays of the same session always meet the same enemies.

use std::{
    collections::{BTreeSet, VecDeque},
    time::Duration,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use stream_siege_core::{
    config::SimConfig, Bounds, Command, Event, Team, UnitId, UnitType, Vec2,
};

const BASE_WAVE_SIZE: u32 = 3;
const WAVE_SIZE_GROWTH: u32 = 2;
const MAX_WAVE_SIZE: u32 = 30;
const BASE_REINFORCEMENTS: u32 = 2;
const BOSS_LEVEL_BONUS: u32 = 2;
const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_millis(1200);

const LABEL_WAVE: &str = "wave";
const LABEL_REINFORCEMENT: &str = "reinforcement";

/// Configuration parameters required to construct the spawner.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
    spawn_area: Bounds,
}

impl Config {
    /// Creates a configuration from an explicit cadence, seed, and spawn rectangle.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64, spawn_area: Bounds) -> Self {
        Self {
            spawn_interval,
            rng_seed,
            spawn_area,
        }
    }

    /// Spawns enemies in a strip just in front of the enemy castle.
    #[must_use]
    pub fn from_sim_config(config: &SimConfig) -> Self {
        let field = config.battlefield;
        let front = config.enemy_castle.x - config.castle_radius;
        let area = Bounds::new(
            field.clamp(Vec2::new(front - 2.0, field.min.y + 1.0)),
            field.clamp(Vec2::new(front, field.max.y - 1.0)),
        );
        Self::new(DEFAULT_SPAWN_INTERVAL, config.rng_seed, area)
    }
}

/// Number of enemies scheduled for a regular wave.
#[must_use]
pub fn wave_size(wave: u32) -> u32 {
    BASE_WAVE_SIZE
        .saturating_add(wave.saturating_mul(WAVE_SIZE_GROWTH))
        .min(MAX_WAVE_SIZE)
}

/// Number of enemies sent when a wave is cleared while the enemy castle stands.
#[must_use]
pub fn reinforcement_size(wave: u32) -> u32 {
    BASE_REINFORCEMENTS
        .saturating_add(wave)
        .min(MAX_WAVE_SIZE / 2)
}

/// Level of regular enemies in a wave.
#[must_use]
pub const fn enemy_level(wave: u32) -> u32 {
    1 + wave / 2
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PlannedSpawn {
    kind: UnitType,
    position: Vec2,
    boss: bool,
    level: u32,
}

/// Pure system that turns wave requests into timed `Command::SpawnEnemy`
/// batches and reports when a wave has been wiped out.
#[derive(Debug)]
pub struct WaveSpawning {
    config: Config,
    schedule: VecDeque<PlannedSpawn>,
    accumulator: Duration,
    active: bool,
    reported: bool,
    pending: usize,
    alive: BTreeSet<UnitId>,
    total: usize,
    reinforcement_round: u32,
}

impl WaveSpawning {
    /// Creates an idle spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            schedule: VecDeque::new(),
            accumulator: Duration::ZERO,
            active: false,
            reported: false,
            pending: 0,
            alive: BTreeSet::new(),
            total: 0,
            reinforcement_round: 0,
        }
    }

    /// Enemies currently alive on the field.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.alive.len()
    }

    /// Enemies scheduled for the running wave, reinforcements included.
    #[must_use]
    pub const fn total_in_wave(&self) -> usize {
        self.total
    }

    /// Reports whether a wave is being spawned or fought.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Consumes world events and emits spawn and wave-cleared commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::WaveStarted { wave, spawn_boss } => self.begin_wave(*wave, *spawn_boss),
                Event::ReinforcementsRequested { wave } => self.begin_reinforcements(*wave),
                Event::SpawningHalted => self.halt(),
                Event::WaveCleared { .. } => {
                    self.active = false;
                    self.schedule.clear();
                }
                Event::UnitDeployed {
                    unit,
                    team: Team::Enemy,
                    ..
                } => {
                    self.pending = self.pending.saturating_sub(1);
                    let _ = self.alive.insert(*unit);
                }
                Event::UnitKilled {
                    victim,
                    victim_team: Team::Enemy,
                    ..
                } => {
                    let _ = self.alive.remove(victim);
                }
                Event::UnitRemoved { unit } => {
                    let _ = self.alive.remove(unit);
                }
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                _ => {}
            }
        }

        if !self.active {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        while !self.schedule.is_empty() && self.accumulator >= self.config.spawn_interval {
            self.accumulator -= self.config.spawn_interval;
            let Some(spawn) = self.schedule.pop_front() else {
                break;
            };
            self.pending += 1;
            out.push(Command::SpawnEnemy {
                kind: spawn.kind,
                position: spawn.position,
                boss: spawn.boss,
                level: spawn.level,
            });
        }

        if self.schedule.is_empty() && self.pending == 0 && self.alive.is_empty() && !self.reported
        {
            self.reported = true;
            tracing::debug!(total = self.total, "all scheduled enemies defeated");
            out.push(Command::ReportWaveCleared);
        }
    }

    fn begin_wave(&mut self, wave: u32, spawn_boss: bool) {
        let seed = derive_seed(self.config.rng_seed, wave, LABEL_WAVE, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let level = enemy_level(wave);
        let mut plan: Vec<PlannedSpawn> = (0..wave_size(wave))
            .map(|_| self.plan_spawn(&mut rng, wave, level, false))
            .collect();
        if spawn_boss {
            plan.push(self.plan_spawn(&mut rng, wave, level + BOSS_LEVEL_BONUS, true));
        }

        self.reinforcement_round = 0;
        self.alive.clear();
        self.pending = 0;
        self.total = plan.len();
        self.start(plan);
        tracing::info!(wave, enemies = self.total, spawn_boss, "wave scheduled");
    }

    fn begin_reinforcements(&mut self, wave: u32) {
        self.reinforcement_round += 1;
        let seed = derive_seed(
            self.config.rng_seed,
            wave,
            LABEL_REINFORCEMENT,
            self.reinforcement_round,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let level = enemy_level(wave);
        let plan: Vec<PlannedSpawn> = (0..reinforcement_size(wave))
            .map(|_| self.plan_spawn(&mut rng, wave, level, false))
            .collect();
        self.total += plan.len();
        tracing::info!(
            wave,
            round = self.reinforcement_round,
            enemies = plan.len(),
            "reinforcements scheduled"
        );
        self.start(plan);
    }

    fn start(&mut self, plan: Vec<PlannedSpawn>) {
        self.schedule = plan.into();
        self.accumulator = self.config.spawn_interval;
        self.active = true;
        self.reported = false;
    }

    fn halt(&mut self) {
        self.schedule.clear();
        self.alive.clear();
        self.accumulator = Duration::ZERO;
        self.active = false;
        self.pending = 0;
        self.total = 0;
    }

    fn plan_spawn(&self, rng: &mut ChaCha8Rng, wave: u32, level: u32, boss: bool) -> PlannedSpawn {
        let roster = roster_for(wave);
        let kind = if boss {
            UnitType::Knight
        } else {
            roster[rng.gen_range(0..roster.len())]
        };
        let area = self.config.spawn_area;
        let position = Vec2::new(
            rng.gen_range(area.min.x..=area.max.x),
            rng.gen_range(area.min.y..=area.max.y),
        );
        PlannedSpawn {
            kind,
            position,
            boss,
            level,
        }
    }
}

fn roster_for(wave: u32) -> &'static [UnitType] {
    const OPENING: [UnitType; 3] = [UnitType::Warrior, UnitType::Lancer, UnitType::Archer];
    const MIDGAME: [UnitType; 4] = [
        UnitType::Warrior,
        UnitType::Lancer,
        UnitType::Archer,
        UnitType::Mage,
    ];
    const LATE: [UnitType; 5] = [
        UnitType::Warrior,
        UnitType::Lancer,
        UnitType::Archer,
        UnitType::Mage,
        UnitType::Knight,
    ];
    match wave {
        0 => &OPENING,
        1 | 2 => &MIDGAME,
        _ => &LATE,
    }
}

fn derive_seed(global_seed: u64, wave: u32, label: &str, round: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(round.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
