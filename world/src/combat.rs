use rand::Rng;
use stream_siege_core::{
    BehaviorClass, Event, GamePhase, Team, UnitId, Vec2, ViewerId, ViewerLedger,
};

use crate::{tasks::Flight, tasks::Projectile, unit::Unit, World};

/// Slack applied to range checks so units at the exact edge still connect.
const RANGE_EPSILON: f32 = 1e-3;
/// Chance a ready boss attack turns into a knockback.
const KNOCKBACK_CHANCE: f64 = 0.2;
/// Internal cooldown between two boss knockbacks.
const KNOCKBACK_COOLDOWN_SECS: f32 = 5.0;
/// Extra reach of a lancer pierce beyond its attack range.
const PIERCE_EXTRA_REACH: f32 = 1.0;
/// Half-width of the band a lancer pierce travels along.
const PIERCE_HALF_WIDTH: f32 = 0.6;

impl World {
    pub(crate) fn resolve_attack(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        attacker: UnitId,
        target: UnitId,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_commands() {
            return;
        }
        let Some(attacker_index) = self.unit_index(attacker) else {
            return;
        };
        let Some(target_index) = self.unit_index(target) else {
            return;
        };
        let source = &self.units[attacker_index];
        let victim = &self.units[target_index];
        if !source.can_act()
            || source.cooldown > 0.0
            || source.kind.is_healer()
            || !victim.is_alive()
            || victim.team == source.team
        {
            return;
        }
        let origin = source.position;
        let target_position = victim.position;
        if origin.distance(target_position) > source.attack_range + RANGE_EPSILON {
            return;
        }

        let behavior = source.kind.behavior();
        let viewer = source.viewer.clone();
        let power = source.attack_power();
        let range = source.attack_range;
        let team = source.team;
        let knockback_ready = source.boss && source.knockback_cooldown <= 0.0;
        self.units[attacker_index].cooldown = self.units[attacker_index].attack_interval;

        match behavior {
            BehaviorClass::RangedMagic => {
                self.projectiles
                    .push(Projectile::new(attacker, viewer, target, origin, power));
                out_events.push(Event::ProjectileLaunched {
                    caster: attacker,
                    target,
                });
                return;
            }
            BehaviorClass::MeleePierce => {
                let pierced = self.pierce_targets(team, origin, target, target_position, range);
                let _ = self.deal_damage(ledger, attacker, &viewer, target, power, out_events);
                for id in pierced {
                    let _ =
                        self.deal_damage(ledger, attacker, &viewer, id, (power / 2).max(1), out_events);
                }
            }
            BehaviorClass::MeleeBruiser
            | BehaviorClass::RangedPhysical
            | BehaviorClass::Elite
            | BehaviorClass::Healer => {
                let _ = self.deal_damage(ledger, attacker, &viewer, target, power, out_events);
            }
        }

        if knockback_ready && self.rng.gen_bool(KNOCKBACK_CHANCE) {
            self.launch_knockback(attacker, target, out_events);
        }
    }

    /// Enemies further along the strike axis than the primary target and inside the pierce band.
    fn pierce_targets(
        &self,
        team: Team,
        origin: Vec2,
        primary: UnitId,
        primary_position: Vec2,
        range: f32,
    ) -> Vec<UnitId> {
        let Some(axis) = (primary_position - origin).try_normalize() else {
            return Vec::new();
        };
        let primary_along = (primary_position - origin).dot(axis);
        self.units
            .iter()
            .filter(|unit| unit.id != primary && unit.team != team && unit.is_alive())
            .filter(|unit| {
                let relative = unit.position - origin;
                let along = relative.dot(axis);
                let lateral = (relative - axis * along).length();
                along > primary_along
                    && along <= range + PIERCE_EXTRA_REACH
                    && lateral <= PIERCE_HALF_WIDTH
            })
            .map(|unit| unit.id)
            .collect()
    }

    fn launch_knockback(&mut self, attacker: UnitId, target: UnitId, out_events: &mut Vec<Event>) {
        let Some(attacker_position) = self.unit(attacker).map(|unit| unit.position) else {
            return;
        };
        let Some(victim) = self.unit_mut(target) else {
            return;
        };
        if !victim.is_alive() || victim.airborne || victim.casting {
            return;
        }
        let direction = (victim.position - attacker_position)
            .try_normalize()
            .unwrap_or_else(|| victim.team.default_fling());
        victim.airborne = true;
        let origin = victim.position;
        self.flights.push(Flight::new(target, origin, direction));
        if let Some(boss) = self.unit_mut(attacker) {
            boss.knockback_cooldown = KNOCKBACK_COOLDOWN_SECS;
        }
        out_events.push(Event::KnockbackLaunched { attacker, target });
    }

    pub(crate) fn resolve_heal(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        healer: UnitId,
        target: UnitId,
        out_events: &mut Vec<Event>,
    ) {
        if healer == target || !self.phase.accepts_commands() {
            return;
        }
        let Some(healer_index) = self.unit_index(healer) else {
            return;
        };
        let Some(target_index) = self.unit_index(target) else {
            return;
        };
        let source = &self.units[healer_index];
        let patient = &self.units[target_index];
        if !source.can_act()
            || source.cooldown > 0.0
            || !source.kind.is_healer()
            || !patient.is_alive()
            || patient.team != source.team
            || source.position.distance(patient.position) > source.attack_range + RANGE_EPSILON
        {
            return;
        }
        let heal = source.heal_amount;
        let viewer = source.viewer.clone();
        let amount = self.units[target_index].restore(heal);
        if amount == 0 {
            return;
        }
        self.units[healer_index].cooldown = self.units[healer_index].attack_interval;
        out_events.push(Event::HealPerformed {
            healer,
            viewer,
            target,
            amount,
        });
        self.award_xp(ledger, healer, amount, out_events);
    }

    pub(crate) fn strike_castle(&mut self, attacker: UnitId, out_events: &mut Vec<Event>) {
        if self.phase != GamePhase::Battle {
            return;
        }
        let Some(index) = self.unit_index(attacker) else {
            return;
        };
        let unit = &self.units[index];
        if !unit.can_act() || unit.cooldown > 0.0 || unit.kind.is_healer() {
            return;
        }
        let castle_team = unit.team.opponent();
        let castle = self.castle(castle_team);
        if castle.hp == 0
            || unit.position.distance(castle.position)
                > unit.attack_range + castle.radius + RANGE_EPSILON
        {
            return;
        }
        let power = unit.attack_power();
        self.units[index].cooldown = self.units[index].attack_interval;

        let castle = self.castle_mut(castle_team);
        let amount = power.min(castle.hp);
        castle.hp -= amount;
        castle.damaged = true;
        let remaining = castle.hp;
        out_events.push(Event::CastleDamaged {
            team: castle_team,
            amount,
            remaining,
        });
        if remaining > 0 {
            return;
        }
        out_events.push(Event::CastleDestroyed { team: castle_team });
        if castle_team == Team::Ally {
            self.end_match(out_events);
        }
    }

    /// Applies damage from `attacker` and resolves the kill; returns whether the target died.
    pub(crate) fn deal_damage(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        attacker: UnitId,
        viewer: &ViewerId,
        target: UnitId,
        raw: u32,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(index) = self.unit_index(target) else {
            return false;
        };
        let Some(amount) = self.units[index].take_damage(raw) else {
            return false;
        };
        out_events.push(Event::DamageDealt {
            attacker,
            viewer: viewer.clone(),
            target,
            amount,
        });
        self.award_xp(ledger, attacker, amount, out_events);
        if self.units[index].team == Team::Ally {
            self.award_xp(ledger, target, amount, out_events);
        }
        if self.units[index].hp > 0 {
            return false;
        }
        self.kill_unit(ledger, index, Some(attacker), viewer, out_events);
        true
    }

    fn kill_unit(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        index: usize,
        killer: Option<UnitId>,
        killer_viewer: &ViewerId,
        out_events: &mut Vec<Event>,
    ) {
        let killer_unit = killer.and_then(|id| self.unit(id));
        let killer_position = killer_unit.map(|unit| unit.position);
        let killer_label = killer_unit.map(describe);

        let death_duration = self.config.death_duration_secs;
        let victim = &mut self.units[index];
        let fling = killer_position
            .and_then(|position| (victim.position - position).try_normalize())
            .unwrap_or_else(|| victim.team.default_fling());
        victim.kill(fling, death_duration);

        let victim_id = victim.id;
        let victim_team = victim.team;
        let victim_viewer = victim.viewer.clone();
        let bounty = victim.max_hp / 2;
        let victim_label = describe(victim);

        out_events.push(Event::UnitKilled {
            killer,
            viewer: killer_viewer.clone(),
            victim: victim_id,
            victim_team,
        });
        tracing::debug!(victim = victim_id.get(), ?victim_team, "unit killed");

        match victim_team {
            Team::Ally if !victim_viewer.is_anonymous() => {
                ledger.apply_death_penalty(&victim_viewer);
            }
            Team::Ally => {}
            Team::Enemy => self.economy.record_enemy_kill(),
        }
        let entry = match killer_label {
            Some(killer_label) => format!("{killer_label} defeated {victim_label}"),
            None => format!("{victim_label} fell"),
        };
        self.economy.log_kill(entry);

        if let Some(killer) = killer {
            self.award_xp(ledger, killer, bounty, out_events);
        }
    }

    pub(crate) fn award_xp(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        id: UnitId,
        raw: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        if unit.grant_xp(raw) == 0 {
            return;
        }
        let level = unit.level;
        let xp = unit.xp;
        let team = unit.team;
        let viewer = unit.viewer.clone();
        out_events.push(Event::LeveledUp { unit: id, level });
        if team == Team::Ally && !viewer.is_anonymous() {
            ledger.update_best_level(&viewer, level, xp);
        }
    }
}

fn describe(unit: &Unit) -> String {
    match (unit.team, unit.owner.is_empty()) {
        (Team::Enemy, _) => format!("Enemy {}", unit.kind.label()),
        (Team::Ally, true) => unit.kind.label().to_owned(),
        (Team::Ally, false) => format!("{}'s {}", unit.owner, unit.kind.label()),
    }
}
