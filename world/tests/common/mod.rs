#![allow(dead_code)]

use std::time::Duration;

use stream_siege_core::{
    config::SimConfig, Bounds, Command, Event, GameMode, QueuedUnit, Rejection, UnitId, UnitType,
    Vec2, ViewerId,
};
use stream_siege_ledger::MemoryLedger;
use stream_siege_world::{self as world, World};

pub struct Harness {
    pub world: World,
    pub ledger: MemoryLedger,
}

impl Harness {
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: World::new(config),
            ledger: MemoryLedger::new(),
        }
    }

    /// Harness already past the title screen.
    pub fn preparing(config: SimConfig) -> Self {
        let mut harness = Self::new(config);
        let _ = harness.apply(Command::SelectMode {
            mode: GameMode::Offline,
        });
        harness
    }

    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, &mut self.ledger, command, &mut events);
        events
    }

    pub fn tick(&mut self, seconds: f32) -> Vec<Event> {
        self.apply(Command::Tick {
            dt: Duration::from_secs_f32(seconds),
        })
    }

    pub fn deploy(&mut self, kind: UnitType, viewer: &str, position: Vec2) -> UnitId {
        let events = self.apply(Command::SummonUnit {
            unit: QueuedUnit::new(kind, viewer, ViewerId::new(viewer)),
        });
        let ticket = events
            .iter()
            .find_map(|event| match event {
                Event::UnitQueued { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("unit queued");
        let events = self.apply(Command::PlaceQueued {
            ticket,
            position: Some(position),
        });
        deployed(&events).expect("unit deployed")
    }

    pub fn spawn_enemy(&mut self, kind: UnitType, position: Vec2) -> UnitId {
        let events = self.apply(Command::SpawnEnemy {
            kind,
            position,
            boss: false,
            level: 1,
        });
        deployed(&events).expect("enemy deployed")
    }
}

/// Battlefield where allies may be placed anywhere and castles sit close together.
pub fn open_field() -> SimConfig {
    let battlefield = Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(40.0, 20.0));
    SimConfig {
        battlefield,
        placement_zone: battlefield,
        ..SimConfig::default()
    }
}

pub fn deployed(events: &[Event]) -> Option<UnitId> {
    events.iter().find_map(|event| match event {
        Event::UnitDeployed { unit, .. } => Some(*unit),
        _ => None,
    })
}

pub fn rejections(events: &[Event]) -> Vec<Rejection> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::CommandRejected { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}
