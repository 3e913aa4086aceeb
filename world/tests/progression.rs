mod common;

use common::{open_field, rejections, Harness};
use stream_siege_core::{
    stats, BuffSource, Command, Event, Rejection, UltimateKind, UnitType, Vec2, ViewerId,
    ViewerLedger,
};
use stream_siege_world::query;

fn buffs(events: &[Event]) -> Vec<BuffSource> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::BuffApplied { source, .. } => Some(*source),
            _ => None,
        })
        .collect()
}

#[test]
fn new_units_start_from_the_viewers_best_level_and_tiers() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    harness.ledger.update_best_level(&alice, 4, 10);
    harness.ledger.record_grant(&Command::GrantMembership {
        viewer: alice.clone(),
    });

    let veteran = harness.deploy(UnitType::Warrior, "alice", Vec2::new(5.0, 5.0));
    let rookie = harness.deploy(UnitType::Warrior, "bob", Vec2::new(5.0, 8.0));
    let veteran = query::unit(&harness.world, veteran).expect("veteran");
    let rookie = query::unit(&harness.world, rookie).expect("rookie");

    assert_eq!(veteran.level, 4);
    assert_eq!(veteran.xp, 10);
    assert_eq!(veteran.hp, veteran.max_hp);
    assert_eq!(rookie.level, 1);
    assert!(veteran.max_hp > rookie.max_hp);
    assert!(veteran.attack_power > rookie.attack_power);
}

#[test]
fn repeated_or_lower_grants_are_no_ops() {
    let mut harness = Harness::preparing(open_field());
    let unit = harness.deploy(UnitType::Lancer, "alice", Vec2::new(5.0, 5.0));
    let alice = ViewerId::new("alice");

    let events = harness.apply(Command::GrantSuperChat {
        viewer: alice.clone(),
        tier: 2,
        amount: 1000,
    });
    assert_eq!(buffs(&events), vec![BuffSource::SuperChat]);
    let upgraded = query::unit(&harness.world, unit).expect("unit");

    for tier in [0, 1, 2] {
        let events = harness.apply(Command::GrantSuperChat {
            viewer: alice.clone(),
            tier,
            amount: 100,
        });
        assert!(buffs(&events).is_empty());
    }
    let events = harness.apply(Command::GrantMembership {
        viewer: alice.clone(),
    });
    assert_eq!(buffs(&events), vec![BuffSource::Member]);
    let events = harness.apply(Command::GrantMembership { viewer: alice });
    assert!(buffs(&events).is_empty());

    let after = query::unit(&harness.world, unit).expect("unit");
    assert!(after.max_hp > upgraded.max_hp);
}

#[test]
fn top_gift_tier_unlocks_rainbow_and_regeneration() {
    let mut harness = Harness::preparing(open_field());
    let unit = harness.deploy(UnitType::Archer, "gifter", Vec2::new(5.0, 5.0));
    let events = harness.apply(Command::GrantGift {
        viewer: ViewerId::new("gifter"),
        tier: 5,
        coins: 30_000,
    });
    assert_eq!(buffs(&events), vec![BuffSource::Gift]);
    let snapshot = query::unit(&harness.world, unit).expect("unit");
    assert!(snapshot.rainbow);
    assert_eq!(
        snapshot.max_hp,
        stats::scale_stat(70, stats::GIFT_MULTIPLIERS[5])
    );
}

#[test]
fn like_milestones_apply_once_per_index() {
    let mut harness = Harness::preparing(open_field());
    let first = harness.deploy(UnitType::Warrior, "a", Vec2::new(5.0, 5.0));
    let _ = harness.deploy(UnitType::Monk, "b", Vec2::new(5.0, 8.0));

    let events = harness.apply(Command::ReachLikeMilestone { index: 1 });
    assert_eq!(buffs(&events).len(), 2);
    let boosted = query::unit(&harness.world, first).expect("unit").max_hp;

    let events = harness.apply(Command::ReachLikeMilestone { index: 1 });
    assert!(buffs(&events).is_empty());
    assert_eq!(query::unit(&harness.world, first).expect("unit").max_hp, boosted);

    let late = harness.deploy(UnitType::Warrior, "c", Vec2::new(5.0, 11.0));
    assert_eq!(query::unit(&harness.world, late).expect("unit").max_hp, boosted);
}

#[test]
fn team_join_grants_timed_damage_reduction() {
    let mut harness = Harness::preparing(open_field());
    let unit = harness.deploy(UnitType::Mage, "alice", Vec2::new(5.0, 5.0));
    let _ = harness.apply(Command::GrantTeamJoin {
        viewer: ViewerId::new("alice"),
        level: 2,
    });
    let shielded = query::unit(&harness.world, unit).expect("unit");
    assert!((shielded.damage_reduction - stats::TEAM_BUFF_DAMAGE_REDUCTION).abs() < 1e-5);

    for _ in 0..((stats::TEAM_BUFF_SECS as usize) + 1) {
        let _ = harness.tick(1.0);
    }
    let expired = query::unit(&harness.world, unit).expect("unit");
    assert!(expired.damage_reduction.abs() < 1e-5);
}

#[test]
fn ultimate_needs_enough_ledger_score() {
    let mut harness = Harness::preparing(open_field());
    let _ = harness.deploy(UnitType::Warrior, "alice", Vec2::new(5.0, 5.0));
    let _ = harness.apply(Command::StartWave);
    let alice = ViewerId::new("alice");
    harness.ledger.credit(&alice, 50);

    let events = harness.apply(Command::CastUltimate {
        viewer: alice.clone(),
    });
    assert_eq!(rejections(&events), vec![Rejection::InsufficientScore]);
    assert_eq!(harness.ledger.score(&alice), 50);
    assert!(!query::ultimate_used(&harness.world, &alice));
}

#[test]
fn ultimate_is_once_per_wave_and_uses_the_best_unit() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    let _ = harness.deploy(UnitType::Warrior, "alice", Vec2::new(5.0, 5.0));
    harness.ledger.update_best_level(&alice, 3, 0);
    let mage = harness.deploy(UnitType::Mage, "alice", Vec2::new(5.0, 8.0));
    let _ = harness.apply(Command::StartWave);
    harness.ledger.credit(&alice, 250);

    let events = harness.apply(Command::CastUltimate {
        viewer: alice.clone(),
    });
    assert!(events.contains(&Event::UltimateCast {
        viewer: alice.clone(),
        unit: mage,
        kind: UltimateKind::Meteor,
    }));
    assert_eq!(harness.ledger.score(&alice), 150);
    assert!(query::ultimate_used(&harness.world, &alice));

    let events = harness.apply(Command::CastUltimate {
        viewer: alice.clone(),
    });
    assert_eq!(rejections(&events), vec![Rejection::UltimateAlreadyUsed]);
    assert_eq!(harness.ledger.score(&alice), 150);
}

#[test]
fn ultimate_without_living_units_is_rejected() {
    let mut harness = Harness::preparing(open_field());
    let _ = harness.deploy(UnitType::Warrior, "alice", Vec2::new(5.0, 5.0));
    let _ = harness.apply(Command::StartWave);
    let bob = ViewerId::new("bob");
    harness.ledger.credit(&bob, 500);

    let events = harness.apply(Command::CastUltimate {
        viewer: bob.clone(),
    });
    assert_eq!(rejections(&events), vec![Rejection::NoLivingUnit]);
    assert_eq!(harness.ledger.score(&bob), 500);
}

#[test]
fn whirlwind_hits_nearby_enemies_and_then_finishes() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    let warrior = harness.deploy(UnitType::Warrior, "alice", Vec2::new(10.0, 10.0));
    let _ = harness.apply(Command::StartWave);
    let near = harness.spawn_enemy(UnitType::Knight, Vec2::new(11.5, 10.0));
    let far = harness.spawn_enemy(UnitType::Knight, Vec2::new(20.0, 10.0));
    harness.ledger.credit(&alice, 100);
    let _ = harness.apply(Command::CastUltimate { viewer: alice });

    let mut hits_near = 0;
    let mut hits_far = 0;
    let mut finished = false;
    for _ in 0..30 {
        for event in harness.tick(0.1) {
            match event {
                Event::DamageDealt { target, .. } if target == near => hits_near += 1,
                Event::DamageDealt { target, .. } if target == far => hits_far += 1,
                Event::UltimateFinished { unit } if unit == warrior => finished = true,
                _ => {}
            }
        }
    }
    assert_eq!(hits_near, 5);
    assert_eq!(hits_far, 0);
    assert!(finished);
    assert_eq!(query::active_ultimates(&harness.world), 0);
    assert!(query::unit(&harness.world, warrior).expect("caster").can_act);
}

#[test]
fn sanctuary_window_is_stripped_when_the_next_wave_starts() {
    let config = stream_siege_core::config::SimConfig {
        enemy_castle: Vec2::new(10.0, 10.0),
        enemy_castle_base_hp: 1,
        enemy_castle_hp_per_wave: 0,
        ..open_field()
    };
    let mut harness = Harness::preparing(config);
    let monk_owner = ViewerId::new("alice");
    let monk = harness.deploy(UnitType::Monk, "alice", Vec2::new(5.0, 5.0));
    let striker = harness.deploy(UnitType::Warrior, "bob", Vec2::new(9.0, 10.0));
    let _ = harness.apply(Command::StartWave);
    harness.ledger.credit(&monk_owner, 100);
    let _ = harness.apply(Command::CastUltimate { viewer: monk_owner });
    let _ = harness.tick(0.1);

    let shielded = query::unit(&harness.world, striker).expect("striker");
    assert!(shielded.damage_reduction > 0.5);

    let _ = harness.apply(Command::StrikeCastle { attacker: striker });
    let _ = harness.apply(Command::ReportWaveCleared);
    let _ = harness.apply(Command::StartWave);

    for id in [monk, striker] {
        let unit = query::unit(&harness.world, id).expect("unit");
        let base = stats::base_stats(unit.kind).damage_reduction;
        assert!((unit.damage_reduction - base).abs() < 1e-5);
    }
}

fn hits_on(events: &[Event], target: stream_siege_core::UnitId) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::DamageDealt { target: hit, .. } if *hit == target))
        .count()
}

fn spawn(
    harness: &mut Harness,
    kind: UnitType,
    position: Vec2,
    level: u32,
) -> stream_siege_core::UnitId {
    let events = harness.apply(Command::SpawnEnemy {
        kind,
        position,
        boss: false,
        level,
    });
    common::deployed(&events).expect("enemy deployed")
}

#[test]
fn piercing_dash_strikes_each_enemy_on_the_line_once() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    let lancer = harness.deploy(UnitType::Lancer, "alice", Vec2::new(10.0, 10.0));
    let _ = harness.apply(Command::StartWave);
    let first = spawn(&mut harness, UnitType::Archer, Vec2::new(13.0, 10.0), 1);
    let second = spawn(&mut harness, UnitType::Archer, Vec2::new(15.0, 10.0), 1);
    let aside = spawn(&mut harness, UnitType::Archer, Vec2::new(13.0, 14.0), 1);
    harness.ledger.credit(&alice, 100);
    let events = harness.apply(Command::CastUltimate { viewer: alice });
    assert!(events.contains(&Event::UltimateCast {
        viewer: ViewerId::new("alice"),
        unit: lancer,
        kind: UltimateKind::PiercingDash,
    }));

    let mut log = Vec::new();
    for _ in 0..10 {
        log.extend(harness.tick(0.1));
    }
    assert_eq!(hits_on(&log, first), 1);
    assert_eq!(hits_on(&log, second), 1);
    assert_eq!(hits_on(&log, aside), 0);
    assert!(log.contains(&Event::UltimateFinished { unit: lancer }));
    let lancer = query::unit(&harness.world, lancer).expect("lancer");
    assert!(lancer.position.x > 15.0);
    assert!((lancer.position.y - 10.0).abs() < 1e-4);
}

#[test]
fn arrow_rain_volleys_hit_the_five_nearest_enemies() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    let archer = harness.deploy(UnitType::Archer, "alice", Vec2::new(10.0, 10.0));
    let _ = harness.apply(Command::StartWave);
    let nearest: Vec<_> = (0..5)
        .map(|step| {
            spawn(
                &mut harness,
                UnitType::Knight,
                Vec2::new(12.0 + step as f32, 10.0),
                1,
            )
        })
        .collect();
    let sixth = spawn(&mut harness, UnitType::Knight, Vec2::new(17.5, 10.0), 1);
    let distant = spawn(&mut harness, UnitType::Knight, Vec2::new(23.0, 10.0), 1);
    harness.ledger.credit(&alice, 100);
    let _ = harness.apply(Command::CastUltimate { viewer: alice });

    let mut log = Vec::new();
    for _ in 0..30 {
        log.extend(harness.tick(0.1));
    }
    for enemy in nearest {
        assert_eq!(hits_on(&log, enemy), 6);
    }
    assert_eq!(hits_on(&log, sixth), 0);
    assert_eq!(hits_on(&log, distant), 0);
    assert!(log.contains(&Event::UltimateFinished { unit: archer }));
}

#[test]
fn rally_boosts_the_caster_and_pulses_around_it() {
    let mut harness = Harness::preparing(open_field());
    let alice = ViewerId::new("alice");
    harness.ledger.record_grant(&Command::GrantSubscription {
        viewer: alice.clone(),
    });
    let knight = harness.deploy(UnitType::Knight, "alice", Vec2::new(10.0, 10.0));
    let _ = harness.apply(Command::StartWave);
    let near = spawn(&mut harness, UnitType::Knight, Vec2::new(11.5, 10.0), 8);
    let far = spawn(&mut harness, UnitType::Knight, Vec2::new(14.0, 10.0), 8);
    let before = query::unit(&harness.world, knight).expect("knight").attack_power;
    harness.ledger.credit(&alice, 100);
    let _ = harness.apply(Command::CastUltimate { viewer: alice });

    let mut log = harness.tick(0.1);
    let rallied = query::unit(&harness.world, knight).expect("knight");
    assert_eq!(rallied.attack_power, stats::scale_stat(before, 1.5));
    assert!(!rallied.can_act);

    for _ in 0..29 {
        log.extend(harness.tick(0.1));
    }
    assert_eq!(hits_on(&log, near), 4);
    assert_eq!(hits_on(&log, far), 0);
    assert!(log.contains(&Event::UltimateFinished { unit: knight }));
    assert!(query::unit(&harness.world, knight).expect("knight").can_act);
}
