#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Stream Siege.
//!
//! The world owns both rosters, the placement queue, the economy, the two
//! castles, and every running timed task. It changes only through [`apply`]
//! and is observed only through [`query`].

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stream_siege_core::{
    config::SimConfig, CastleSnapshot, Command, Event, GameMode, GamePhase, LifeState, Team,
    UnitId, Vec2, ViewerId, ViewerLedger, WELCOME_BANNER,
};

mod combat;
mod economy;
mod orchestrator;
mod queue;
mod tasks;
mod terrain;
mod unit;

use economy::Economy;
use queue::PlacementQueue;
use tasks::{Ability, Flight, Projectile};
use terrain::Terrain;
use unit::{ModifierSource, TimedModifier, Unit};

/// Speed at which a defeated unit drifts along its fling direction.
const CORPSE_DRIFT_SPEED: f32 = 1.5;
/// Offset used to separate units that occupy exactly the same point.
const COINCIDENT_PUSH: Vec2 = Vec2::new(1.0, 0.0);

#[derive(Clone, Copy, Debug)]
struct Castle {
    team: Team,
    position: Vec2,
    radius: f32,
    hp: u32,
    max_hp: u32,
    damaged: bool,
}

impl Castle {
    fn new(team: Team, position: Vec2, radius: f32, max_hp: u32) -> Self {
        Self {
            team,
            position,
            radius,
            hp: max_hp,
            max_hp,
            damaged: false,
        }
    }

    fn reset(&mut self, max_hp: u32) {
        self.max_hp = max_hp;
        self.hp = max_hp;
        self.damaged = false;
    }

    fn snapshot(&self) -> CastleSnapshot {
        CastleSnapshot {
            team: self.team,
            position: self.position,
            radius: self.radius,
            hp: self.hp,
            max_hp: self.max_hp,
        }
    }
}

/// Represents the authoritative Stream Siege world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimConfig,
    terrain: Terrain,
    phase: GamePhase,
    mode: Option<GameMode>,
    wave_index: u32,
    units: Vec<Unit>,
    next_unit_id: u32,
    queue: PlacementQueue,
    economy: Economy,
    player_castle: Castle,
    enemy_castle: Castle,
    elapsed: f32,
    last_dt: f32,
    ultimate_used: BTreeSet<ViewerId>,
    milestones: BTreeSet<u32>,
    projectiles: Vec<Projectile>,
    flights: Vec<Flight>,
    abilities: Vec<Ability>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world on the title screen using the provided tunables.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let player_castle = Castle::new(
            Team::Ally,
            config.player_castle,
            config.castle_radius,
            config.player_castle_hp,
        );
        let enemy_castle = Castle::new(
            Team::Enemy,
            config.enemy_castle,
            config.castle_radius,
            config.enemy_castle_hp(0),
        );
        Self {
            banner: WELCOME_BANNER,
            terrain: Terrain::default(),
            phase: GamePhase::Title,
            mode: None,
            wave_index: 0,
            units: Vec::new(),
            next_unit_id: 0,
            queue: PlacementQueue::default(),
            economy: Economy::new(config.kill_log_capacity),
            player_castle,
            enemy_castle,
            elapsed: 0.0,
            last_dt: 0.0,
            ultimate_used: BTreeSet::new(),
            milestones: BTreeSet::new(),
            projectiles: Vec::new(),
            flights: Vec::new(),
            abilities: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == id)
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    fn castle(&self, team: Team) -> &Castle {
        match team {
            Team::Ally => &self.player_castle,
            Team::Enemy => &self.enemy_castle,
        }
    }

    fn castle_mut(&mut self, team: Team) -> &mut Castle {
        match team {
            Team::Ally => &mut self.player_castle,
            Team::Enemy => &mut self.enemy_castle,
        }
    }

    fn advance(&mut self, ledger: &mut dyn ViewerLedger, dt: f32, out_events: &mut Vec<Event>) {
        if !self.phase.accepts_commands() {
            return;
        }
        self.elapsed += dt;
        self.last_dt = dt;

        if self.phase == GamePhase::Battle
            && self
                .economy
                .accrue_battle_time(dt, self.config.gold_per_second)
        {
            out_events.push(Event::GoldChanged {
                gold: self.economy.gold(),
            });
        }

        self.advance_units(dt, out_events);
        self.advance_tasks(ledger, dt, out_events);
        self.separate_units();
        self.clamp_units();
    }

    fn advance_units(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let battlefield = self.config.battlefield;
        let mut pulses = Vec::new();
        for unit in &mut self.units {
            match unit.state {
                LifeState::Dead => {
                    unit.death_timer -= dt;
                    unit.position =
                        battlefield.clamp(unit.position + unit.fling * CORPSE_DRIFT_SPEED * dt);
                }
                LifeState::Active => {
                    let outcome = unit.advance_timers(dt);
                    if outcome.stance_reverted {
                        out_events.push(Event::StanceChanged {
                            unit: unit.id,
                            stance: unit.stance,
                        });
                    }
                    if let Some(aura) = outcome.aura_pulse {
                        pulses.push((unit.id, unit.viewer.clone(), unit.team, unit.position, aura));
                    }
                }
                LifeState::InQueue => {}
            }
        }

        for (source, viewer, team, center, aura) in pulses {
            for unit in self.units.iter_mut().filter(|unit| {
                unit.team == team && unit.is_alive() && unit.position.distance(center) <= aura.radius
            }) {
                let amount = (unit.max_hp as f32 * aura.heal_fraction).round() as u32;
                let restored = unit.restore(amount);
                unit.add_modifier(TimedModifier::attack(
                    ModifierSource::Aura,
                    aura.attack_multiplier,
                    stream_siege_core::stats::AURA_PERIOD_SECS,
                ));
                if restored > 0 {
                    out_events.push(Event::HealPerformed {
                        healer: source,
                        viewer: viewer.clone(),
                        target: unit.id,
                        amount: restored,
                    });
                }
            }
        }

        let mut index = 0;
        while index < self.units.len() {
            let unit = &self.units[index];
            if unit.state == LifeState::Dead && unit.death_timer <= 0.0 {
                let removed = self.units.remove(index);
                out_events.push(Event::UnitRemoved { unit: removed.id });
            } else {
                index += 1;
            }
        }
    }

    /// Pushes overlapping same-team units apart in proportion to their overlap.
    fn separate_units(&mut self) {
        let base_radius = self.config.collision_radius;
        let mut pushes = vec![Vec2::ZERO; self.units.len()];
        for first in 0..self.units.len() {
            for second in (first + 1)..self.units.len() {
                let a = &self.units[first];
                let b = &self.units[second];
                if a.team != b.team || !a.is_alive() || !b.is_alive() || a.airborne || b.airborne {
                    continue;
                }
                let minimum = a.collision_radius(base_radius) + b.collision_radius(base_radius);
                let offset = a.position - b.position;
                let distance = offset.length();
                if distance >= minimum {
                    continue;
                }
                let direction = offset.try_normalize().unwrap_or(COINCIDENT_PUSH);
                let push = direction * (minimum - distance) * 0.5;
                pushes[first] += push;
                pushes[second] -= push;
            }
        }
        for (unit, push) in self.units.iter_mut().zip(pushes) {
            if push == Vec2::ZERO {
                continue;
            }
            let next = unit.position + push;
            if unit.team == Team::Ally && !self.terrain.is_walkable(next) {
                continue;
            }
            unit.position = next;
        }
    }

    fn clamp_units(&mut self) {
        let battlefield = self.config.battlefield;
        let placement = self.config.placement_zone;
        let preparing = self.phase == GamePhase::Preparation;
        for unit in &mut self.units {
            unit.position = battlefield.clamp(unit.position);
            if preparing && unit.team == Team::Ally {
                unit.position = placement.clamp(unit.position);
            }
        }
    }

    fn move_unit(&mut self, id: UnitId, to: Vec2) {
        if !self.phase.accepts_commands() {
            return;
        }
        let battlefield = self.config.battlefield;
        let placement = self.config.placement_zone;
        let preparing = self.phase == GamePhase::Preparation;
        let step_budget = self.last_dt;
        let Some(index) = self.unit_index(id) else {
            return;
        };
        let unit = &self.units[index];
        if !unit.can_act() {
            return;
        }
        let offset = to - unit.position;
        let max_step = unit.move_speed() * step_budget + 1e-4;
        let mut next = if offset.length() > max_step {
            unit.position + offset.normalize_or_zero() * max_step
        } else {
            to
        };
        next = battlefield.clamp(next);
        if unit.team == Team::Ally {
            if preparing {
                next = placement.clamp(next);
            }
            if !self.terrain.is_walkable(next) {
                return;
            }
        }
        self.units[index].position = next;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Business-rule refusals leave the world untouched and are reported through
/// [`Event::CommandRejected`].
pub fn apply(
    world: &mut World,
    ledger: &mut dyn ViewerLedger,
    command: Command,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::ConfigureTerrain { blocked } => {
            world.terrain = Terrain::new(blocked);
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(ledger, dt.as_secs_f32(), out_events);
        }
        Command::SelectMode { mode } => world.select_mode(mode, out_events),
        Command::RestoreProgress { wave, total_kills } => {
            world.restore_progress(wave, total_kills, out_events);
        }
        Command::ResetToTitle => world.reset_to_title(out_events),
        Command::StartWave => world.start_wave(out_events),
        Command::SummonUnit { unit } => world.enqueue(ledger, unit, false, out_events),
        Command::PurchaseUnit { unit } => world.enqueue(ledger, unit, true, out_events),
        Command::PlaceQueued { ticket, position } => {
            world.place_queued(ledger, ticket, position, out_events);
        }
        Command::PlaceAllQueued => world.place_all_queued(ledger, out_events),
        Command::BeginDrag { ticket } => world.begin_drag(ticket, out_events),
        Command::DropDragged { position } => world.drop_dragged(ledger, position, out_events),
        Command::CancelDrag => world.cancel_drag(out_events),
        Command::SpawnEnemy {
            kind,
            position,
            boss,
            level,
        } => world.spawn_enemy(kind, position, boss, level, out_events),
        Command::ReportWaveCleared => world.report_wave_cleared(ledger, out_events),
        Command::SetStance { viewer, stance } => world.set_stance(&viewer, stance, out_events),
        Command::CastUltimate { viewer } => world.cast_ultimate(ledger, &viewer, out_events),
        Command::MoveUnit { unit, to } => world.move_unit(unit, to),
        Command::Attack { attacker, target } => {
            world.resolve_attack(ledger, attacker, target, out_events);
        }
        Command::Heal { healer, target } => world.resolve_heal(ledger, healer, target, out_events),
        Command::StrikeCastle { attacker } => world.strike_castle(attacker, out_events),
        Command::GrantMembership { viewer } => world.upgrade_viewer_units(
            &viewer,
            stream_siege_core::BuffSource::Member,
            out_events,
            Unit::grant_member,
        ),
        Command::GrantSuperChat { viewer, tier, .. } => world.upgrade_viewer_units(
            &viewer,
            stream_siege_core::BuffSource::SuperChat,
            out_events,
            |unit| unit.grant_super_chat(tier),
        ),
        Command::GrantGift { viewer, tier, .. } => world.upgrade_viewer_units(
            &viewer,
            stream_siege_core::BuffSource::Gift,
            out_events,
            |unit| unit.grant_gift(tier),
        ),
        Command::GrantSubscription { viewer } => world.upgrade_viewer_units(
            &viewer,
            stream_siege_core::BuffSource::Subscriber,
            out_events,
            Unit::grant_subscriber,
        ),
        Command::GrantTeamJoin { viewer, level } => world.upgrade_viewer_units(
            &viewer,
            stream_siege_core::BuffSource::TeamJoin,
            out_events,
            |unit| unit.grant_team(level),
        ),
        Command::ReachLikeMilestone { index } => world.reach_like_milestone(index, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use stream_siege_core::{
        config::SimConfig, Bounds, CastleSnapshot, GameMode, GamePhase, QueueTicket, QueuedUnit,
        Team, UnitId, UnitSnapshot, UnitView, Vec2, ViewerId,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Tunables the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimConfig {
        &world.config
    }

    /// Currently active phase.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Mode selected on the title screen, if any.
    #[must_use]
    pub fn mode(world: &World) -> Option<GameMode> {
        world.mode
    }

    /// Index of the current wave.
    #[must_use]
    pub fn wave_index(world: &World) -> u32 {
        world.wave_index
    }

    /// Gold available for purchases.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.economy.gold()
    }

    /// Session score accumulated from kills, battle time, and cleared waves.
    #[must_use]
    pub fn economy_score(world: &World) -> u64 {
        world.economy.score()
    }

    /// Enemies killed during the session.
    #[must_use]
    pub fn total_kills(world: &World) -> u32 {
        world.economy.total_kills()
    }

    /// Most recent kill descriptions, oldest first.
    #[must_use]
    pub fn kill_log(world: &World) -> Vec<String> {
        world.economy.kill_log().map(str::to_owned).collect()
    }

    /// Seconds elapsed since the mode was selected.
    #[must_use]
    pub fn elapsed_seconds(world: &World) -> f32 {
        world.elapsed
    }

    /// Captures a read-only view of every unit on the field, living or dying.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Snapshot of a single unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world.unit(id).map(|unit| unit.snapshot())
    }

    /// Number of living units on a team.
    #[must_use]
    pub fn living_count(world: &World, team: Team) -> usize {
        world.living(team)
    }

    /// Snapshot of the castle owned by a team.
    #[must_use]
    pub fn castle(world: &World, team: Team) -> CastleSnapshot {
        world.castle(team).snapshot()
    }

    /// Entries waiting in the placement queue, in arrival order.
    #[must_use]
    pub fn queue(world: &World) -> Vec<(QueueTicket, QueuedUnit)> {
        world
            .queue
            .entries()
            .map(|(ticket, unit)| (ticket, unit.clone()))
            .collect()
    }

    /// Entry currently being dragged, if any.
    #[must_use]
    pub fn dragging(world: &World) -> Option<(QueueTicket, QueuedUnit)> {
        world
            .queue
            .dragging()
            .map(|(ticket, unit)| (ticket, unit.clone()))
    }

    /// Reports whether an allied unit may stand at the point.
    #[must_use]
    pub fn is_walkable(world: &World, point: Vec2) -> bool {
        world.config.battlefield.contains(point) && world.terrain.is_walkable(point)
    }

    /// Rectangles allies cannot enter.
    #[must_use]
    pub fn blocked_terrain(world: &World) -> &[Bounds] {
        world.terrain.blocked()
    }

    /// Reports whether the viewer already cast their ultimate this wave.
    #[must_use]
    pub fn ultimate_used(world: &World, viewer: &ViewerId) -> bool {
        world.ultimate_used.contains(viewer)
    }

    /// Number of ultimate sequences currently running.
    #[must_use]
    pub fn active_ultimates(world: &World) -> usize {
        world.abilities.len()
    }
}
