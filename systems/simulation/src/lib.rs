#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame loop that wires the world, the viewer ledger, and every system.
//!
//! Commands from adapters go through [`Simulation::apply`] or
//! [`Simulation::chat`]; [`Simulation::update`] advances the clock and pumps
//! targeting, combat, movement, and wave spawning in that order. Systems that
//! track state from events receive every event produced since their previous
//! run, including those caused by adapter commands.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use stream_siege_core::{
    config::SimConfig, CastleSnapshot, Command, Event, GamePhase, Team, UnitTarget, ViewerId,
};
use stream_siege_ledger::MemoryLedger;
use stream_siege_system_chat_commands::{ChatCommands, ChatLine, Locale};
use stream_siege_system_combat::Combat;
use stream_siege_system_movement::Movement;
use stream_siege_system_targeting::Targeting;
use stream_siege_system_wave_spawning::{Config as SpawnConfig, WaveSpawning};
use stream_siege_world::{self as world, query, World};

/// Owns a session and drives it one frame at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    ledger: MemoryLedger,
    targeting: Targeting,
    combat: Combat,
    movement: Movement,
    spawning: WaveSpawning,
    chat: ChatCommands,
    save_dir: Option<PathBuf>,
    targets: Vec<UnitTarget>,
    movement_inbox: Vec<Event>,
    spawner_inbox: Vec<Event>,
    frame: Vec<Event>,
}

impl Simulation {
    /// Creates a session on the title screen.
    ///
    /// With a `save_dir`, selecting a mode loads that mode's save, clearing a
    /// wave writes it, and losing the match deletes it.
    #[must_use]
    pub fn new(config: SimConfig, locale: Locale, save_dir: Option<PathBuf>) -> Self {
        let spawning = WaveSpawning::new(SpawnConfig::from_sim_config(&config));
        Self {
            world: World::new(config),
            ledger: MemoryLedger::new(),
            targeting: Targeting::new(),
            combat: Combat::new(),
            movement: Movement::new(),
            spawning,
            chat: ChatCommands::new(locale),
            save_dir,
            targets: Vec::new(),
            movement_inbox: Vec::new(),
            spawner_inbox: Vec::new(),
            frame: Vec::new(),
        }
    }

    /// Authoritative world state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Viewer ledger of the session.
    #[must_use]
    pub const fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    /// Mutable viewer ledger, for rewards granted outside of combat.
    pub fn ledger_mut(&mut self) -> &mut MemoryLedger {
        &mut self.ledger
    }

    /// Reports whether the session reached the result screen.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        query::phase(&self.world) == GamePhase::Result
    }

    /// Directory holding the per-mode saves, if persistence is enabled.
    #[must_use]
    pub fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }

    /// Applies a command and feeds the resulting events to the ledger and the systems.
    pub fn apply(&mut self, command: Command) {
        let selecting = matches!(command, Command::SelectMode { .. });
        self.ledger.record_grant(&command);

        let mut events = Vec::new();
        world::apply(&mut self.world, &mut self.ledger, command, &mut events);
        self.ledger.observe(&events);
        self.persist(&events);

        let entered_preparation = events.contains(&Event::PhaseChanged {
            phase: GamePhase::Preparation,
        });
        self.dispatch(events);

        if selecting && entered_preparation {
            self.resume_saved_run();
        }
    }

    /// Interprets a chat line and applies the command it requests.
    pub fn chat(&mut self, viewer: ViewerId, name: &str, text: &str) {
        let line = ChatLine::new(viewer, name, text);
        let mut commands = Vec::new();
        self.chat
            .handle(query::phase(&self.world), &line, &mut commands);
        self.apply_all(commands);
    }

    /// Advances the session by `dt` and returns every event produced since the previous update.
    pub fn update(&mut self, dt: Duration) -> Vec<Event> {
        self.apply(Command::Tick { dt });

        let phase = query::phase(&self.world);
        let units = query::unit_view(&self.world);
        let castles = castle_snapshots(&self.world);
        self.targeting.handle(phase, &units, &mut self.targets);
        let mut commands = Vec::new();
        self.combat
            .handle(phase, &units, &self.targets, &castles, &mut commands);
        self.apply_all(commands.drain(..));

        let inbox = std::mem::take(&mut self.movement_inbox);
        let units = query::unit_view(&self.world);
        let castles = castle_snapshots(&self.world);
        let world = &self.world;
        let rear_line_x = query::config(world).rear_line_x;
        self.movement.handle(
            &inbox,
            &units,
            &self.targets,
            &castles,
            rear_line_x,
            |point| query::is_walkable(world, point),
            &mut commands,
        );
        self.apply_all(commands.drain(..));

        let inbox = std::mem::take(&mut self.spawner_inbox);
        self.spawning.handle(&inbox, &mut commands);
        self.apply_all(commands);

        std::mem::take(&mut self.frame)
    }

    fn apply_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.apply(command);
        }
    }

    fn dispatch(&mut self, events: Vec<Event>) {
        self.movement_inbox.extend(events.iter().cloned());
        self.spawner_inbox.extend(events.iter().cloned());
        self.frame.extend(events);
    }

    fn persist(&self, events: &[Event]) {
        let Some(dir) = self.save_dir.as_deref() else {
            return;
        };
        for event in events {
            match event {
                Event::SaveInvalidated { mode } => {
                    if let Err(error) = MemoryLedger::delete_save(dir, *mode) {
                        tracing::warn!(%error, "failed to delete save");
                    }
                }
                Event::WaveCleared { wave, .. } => {
                    let Some(mode) = query::mode(&self.world) else {
                        continue;
                    };
                    match self.ledger.save(dir, mode) {
                        Ok(path) => tracing::debug!(wave, path = %path.display(), "autosaved"),
                        Err(error) => tracing::warn!(%error, "failed to save progress"),
                    }
                }
                _ => {}
            }
        }
    }

    fn resume_saved_run(&mut self) {
        let (Some(dir), Some(mode)) = (self.save_dir.as_deref(), query::mode(&self.world)) else {
            return;
        };
        self.ledger = MemoryLedger::load_or_default(dir, mode);
        let (wave, total_kills) = self.ledger.progress();
        if wave == 0 {
            return;
        }
        tracing::info!(mode = mode.save_key(), wave, "resuming saved run");
        self.apply(Command::RestoreProgress { wave, total_kills });
    }
}

fn castle_snapshots(world: &World) -> [CastleSnapshot; 2] {
    [
        query::castle(world, Team::Ally),
        query::castle(world, Team::Enemy),
    ]
}
