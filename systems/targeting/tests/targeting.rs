use stream_siege_core::{
    config::SimConfig, Bounds, Command, Event, GameMode, GamePhase, QueuedUnit, UnitId,
    UnitTarget, UnitType, UnitView, Vec2, ViewerId,
};
use stream_siege_ledger::MemoryLedger;
use stream_siege_system_targeting::Targeting;
use stream_siege_world::{self as world, query, World};

struct Field {
    world: World,
    ledger: MemoryLedger,
}

impl Field {
    fn battle() -> Self {
        let battlefield = Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(40.0, 20.0));
        let mut field = Self {
            world: World::new(SimConfig {
                battlefield,
                placement_zone: battlefield,
                ..SimConfig::default()
            }),
            ledger: MemoryLedger::new(),
        };
        let _ = field.apply(Command::SelectMode {
            mode: GameMode::Offline,
        });
        let _ = field.ally(UnitType::Warrior, "anchor", Vec2::new(1.0, 1.0));
        let _ = field.apply(Command::StartWave);
        field
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, &mut self.ledger, command, &mut events);
        events
    }

    fn ally(&mut self, kind: UnitType, viewer: &str, position: Vec2) -> UnitId {
        let events = self.apply(Command::SummonUnit {
            unit: QueuedUnit::new(kind, viewer, ViewerId::new(viewer)),
        });
        let ticket = events
            .iter()
            .find_map(|event| match event {
                Event::UnitQueued { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("queued");
        let events = self.apply(Command::PlaceQueued {
            ticket,
            position: Some(position),
        });
        deployed(&events)
    }

    fn enemy(&mut self, kind: UnitType, position: Vec2) -> UnitId {
        let events = self.apply(Command::SpawnEnemy {
            kind,
            position,
            boss: false,
            level: 1,
        });
        deployed(&events)
    }

    fn targets(&self) -> Vec<UnitTarget> {
        let mut out = Vec::new();
        Targeting::new().handle(
            query::phase(&self.world),
            &query::unit_view(&self.world),
            &mut out,
        );
        out
    }
}

fn deployed(events: &[Event]) -> UnitId {
    events
        .iter()
        .find_map(|event| match event {
            Event::UnitDeployed { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("deployed")
}

fn target_of(targets: &[UnitTarget], unit: UnitId) -> Option<UnitId> {
    targets
        .iter()
        .find(|assignment| assignment.unit == unit)
        .map(|assignment| assignment.target)
}

#[test]
fn fighters_pick_the_nearest_enemy_and_ties_follow_roster_order() {
    let mut field = Field::battle();
    let archer = field.ally(UnitType::Archer, "alice", Vec2::new(10.0, 10.0));
    let first = field.enemy(UnitType::Warrior, Vec2::new(12.0, 10.0));
    let second = field.enemy(UnitType::Warrior, Vec2::new(10.0, 12.0));
    let far = field.enemy(UnitType::Mage, Vec2::new(30.0, 10.0));

    let targets = field.targets();
    assert_eq!(target_of(&targets, archer), Some(first));
    let assignment = targets
        .iter()
        .find(|assignment| assignment.unit == archer)
        .expect("archer assignment");
    assert!((assignment.distance - 2.0).abs() < 1e-5);

    assert_eq!(target_of(&targets, second), Some(archer));
    assert_eq!(target_of(&targets, far), Some(archer));
}

#[test]
fn enemies_target_the_closest_ally() {
    let mut field = Field::battle();
    let near = field.ally(UnitType::Lancer, "alice", Vec2::new(20.0, 10.0));
    let enemy = field.enemy(UnitType::Warrior, Vec2::new(22.0, 10.0));

    assert_eq!(target_of(&field.targets(), enemy), Some(near));
}

#[test]
fn monks_pick_the_most_wounded_other_ally() {
    let mut field = Field::battle();
    let monk = field.ally(UnitType::Monk, "healer", Vec2::new(10.0, 10.0));
    let scratched = field.ally(UnitType::Warrior, "a", Vec2::new(10.0, 14.0));
    let wounded = field.ally(UnitType::Warrior, "b", Vec2::new(10.0, 6.0));
    let lancer = field.enemy(UnitType::Lancer, Vec2::new(11.0, 6.0));
    let archer = field.enemy(UnitType::Archer, Vec2::new(11.0, 14.0));

    let _ = field.apply(Command::Attack {
        attacker: lancer,
        target: wounded,
    });
    let _ = field.apply(Command::Attack {
        attacker: archer,
        target: scratched,
    });
    let wounded_missing = query::unit(&field.world, wounded)
        .expect("wounded")
        .missing_hp();
    let scratched_missing = query::unit(&field.world, scratched)
        .expect("scratched")
        .missing_hp();
    assert!(wounded_missing > scratched_missing);

    assert_eq!(target_of(&field.targets(), monk), Some(wounded));
}

#[test]
fn healers_fall_back_to_the_first_ally_when_nobody_is_hurt() {
    let mut field = Field::battle();
    let anchor = query::unit_view(&field.world)
        .iter()
        .next()
        .expect("anchor")
        .id;
    let monk = field.ally(UnitType::Monk, "healer", Vec2::new(10.0, 10.0));
    let _ = field.ally(UnitType::Warrior, "a", Vec2::new(10.0, 14.0));

    assert_eq!(target_of(&field.targets(), monk), Some(anchor));
}

#[test]
fn nothing_is_targeted_back_on_the_title_screen() {
    let mut field = Field::battle();
    let _ = field.ally(UnitType::Archer, "alice", Vec2::new(10.0, 10.0));
    let _ = field.enemy(UnitType::Warrior, Vec2::new(12.0, 10.0));
    assert!(!field.targets().is_empty());

    let _ = field.apply(Command::ResetToTitle);
    assert_eq!(query::phase(&field.world), GamePhase::Title);
    assert!(field.targets().is_empty());
}

#[test]
fn casting_units_are_skipped() {
    let mut field = Field::battle();
    let alice = ViewerId::new("alice");
    let warrior = field.ally(UnitType::Warrior, "alice", Vec2::new(10.0, 10.0));
    let _ = field.enemy(UnitType::Warrior, Vec2::new(12.0, 10.0));
    field.ledger.credit(&alice, 100);
    let _ = field.apply(Command::CastUltimate { viewer: alice });

    assert_eq!(target_of(&field.targets(), warrior), None);
}

#[test]
fn stunned_or_airborne_units_are_skipped() {
    let mut field = Field::battle();
    let warrior = field.ally(UnitType::Warrior, "alice", Vec2::new(10.0, 10.0));
    let enemy = field.enemy(UnitType::Warrior, Vec2::new(12.0, 10.0));

    let snapshots = query::unit_view(&field.world)
        .into_vec()
        .into_iter()
        .map(|mut snapshot| {
            if snapshot.id == warrior {
                snapshot.can_act = false;
            }
            snapshot
        })
        .collect();
    let mut out = Vec::new();
    Targeting::new().handle(
        query::phase(&field.world),
        &UnitView::from_snapshots(snapshots),
        &mut out,
    );
    assert_eq!(target_of(&out, warrior), None);
    assert_eq!(target_of(&out, enemy), Some(warrior));
}
