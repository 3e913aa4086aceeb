//! Cooperative timed tasks advanced once per tick.
//!
//! Every task re-checks the liveness of the units it touches, and abilities
//! also re-check the phase, before committing any state change.

use stream_siege_core::{
    Event, GamePhase, Team, UltimateKind, UnitId, Vec2, ViewerId, ViewerLedger,
};

use crate::{
    unit::{ModifierSource, TimedModifier},
    World,
};

const PROJECTILE_SPEED: f32 = 12.0;
const PROJECTILE_HIT_RADIUS: f32 = 0.25;

const FLIGHT_DISTANCE: f32 = 3.0;
const FLIGHT_SECS: f32 = 0.4;
const LANDING_STUN_SECS: f32 = 0.5;
const SCATTER_RADIUS: f32 = 0.8;
const SCATTER_STUN_SECS: f32 = 0.3;
const SCATTER_NUDGE: f32 = 0.5;

/// Homing bolt that re-targets the live position of its target.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    caster: UnitId,
    viewer: ViewerId,
    target: UnitId,
    position: Vec2,
    damage: u32,
}

impl Projectile {
    pub(crate) fn new(
        caster: UnitId,
        viewer: ViewerId,
        target: UnitId,
        position: Vec2,
        damage: u32,
    ) -> Self {
        Self {
            caster,
            viewer,
            target,
            position,
            damage,
        }
    }
}

/// Straight-line launch of a unit hit by a boss knockback.
#[derive(Clone, Debug)]
pub(crate) struct Flight {
    unit: UnitId,
    origin: Vec2,
    direction: Vec2,
    elapsed: f32,
    scattered: Vec<UnitId>,
}

impl Flight {
    pub(crate) fn new(unit: UnitId, origin: Vec2, direction: Vec2) -> Self {
        Self {
            unit,
            origin,
            direction,
            elapsed: 0.0,
            scattered: Vec::new(),
        }
    }
}

/// Mechanical profile of an ultimate.
#[derive(Clone, Copy, Debug)]
struct AbilityProfile {
    pulses: u32,
    interval: f32,
    radius: f32,
    multiplier: f32,
}

const fn profile(kind: UltimateKind) -> AbilityProfile {
    match kind {
        UltimateKind::Whirlwind => AbilityProfile {
            pulses: 5,
            interval: 0.5,
            radius: 2.5,
            multiplier: 1.5,
        },
        UltimateKind::PiercingDash => AbilityProfile {
            pulses: 0,
            interval: 0.6,
            radius: 0.9,
            multiplier: 3.0,
        },
        UltimateKind::ArrowRain => AbilityProfile {
            pulses: 6,
            interval: 0.4,
            radius: 8.0,
            multiplier: 1.0,
        },
        UltimateKind::Sanctuary => AbilityProfile {
            pulses: 1,
            interval: 1.0,
            radius: 0.0,
            multiplier: 0.0,
        },
        UltimateKind::Meteor => AbilityProfile {
            pulses: 3,
            interval: 0.7,
            radius: 2.5,
            multiplier: 2.0,
        },
        UltimateKind::Rally => AbilityProfile {
            pulses: 4,
            interval: 0.5,
            radius: 2.0,
            multiplier: 2.0,
        },
    }
}

const DASH_DISTANCE: f32 = 6.0;
const ARROW_RAIN_TARGETS: usize = 5;
const SANCTUARY_HEAL_FRACTION: f32 = 0.4;
const SANCTUARY_DAMAGE_REDUCTION: f32 = 0.5;
const SANCTUARY_SECS: f32 = 8.0;
const RALLY_ATTACK_MULTIPLIER: f32 = 1.5;
const RALLY_SECS: f32 = 6.0;
const METEOR_FALLBACK_REACH: f32 = 4.0;

/// Running ultimate sequence. The caster's own AI is suspended until it ends.
#[derive(Clone, Debug)]
pub(crate) struct Ability {
    caster: UnitId,
    viewer: ViewerId,
    kind: UltimateKind,
    started: bool,
    elapsed: f32,
    pulses_done: u32,
    anchor: Vec2,
    direction: Vec2,
    struck: Vec<UnitId>,
}

impl Ability {
    pub(crate) fn new(caster: UnitId, viewer: ViewerId, kind: UltimateKind) -> Self {
        Self {
            caster,
            viewer,
            kind,
            started: false,
            elapsed: 0.0,
            pulses_done: 0,
            anchor: Vec2::ZERO,
            direction: Vec2::X,
            struck: Vec::new(),
        }
    }

    pub(crate) fn caster(&self) -> UnitId {
        self.caster
    }

    fn duration(&self) -> f32 {
        let profile = profile(self.kind);
        match self.kind {
            UltimateKind::PiercingDash => profile.interval,
            _ => profile.interval * profile.pulses as f32,
        }
    }
}

enum Step {
    Continue,
    Finished,
}

impl World {
    pub(crate) fn advance_tasks(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) {
        self.advance_projectiles(ledger, dt, out_events);
        self.advance_flights(dt);
        self.advance_abilities(ledger, dt, out_events);
    }

    fn advance_projectiles(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) {
        let projectiles = std::mem::take(&mut self.projectiles);
        let mut in_flight = Vec::with_capacity(projectiles.len());
        for mut projectile in projectiles {
            let Some(target_position) = self
                .unit(projectile.target)
                .filter(|unit| unit.is_alive())
                .map(|unit| unit.position)
            else {
                continue;
            };
            let offset = target_position - projectile.position;
            let step = PROJECTILE_SPEED * dt;
            if offset.length() <= step + PROJECTILE_HIT_RADIUS {
                let _ = self.deal_damage(
                    ledger,
                    projectile.caster,
                    &projectile.viewer,
                    projectile.target,
                    projectile.damage,
                    out_events,
                );
                continue;
            }
            projectile.position += offset.normalize_or_zero() * step;
            in_flight.push(projectile);
        }
        in_flight.append(&mut self.projectiles);
        self.projectiles = in_flight;
    }

    fn advance_flights(&mut self, dt: f32) {
        let flights = std::mem::take(&mut self.flights);
        let battlefield = self.config.battlefield;
        for mut flight in flights {
            let Some(unit) = self.unit_mut(flight.unit).filter(|unit| unit.is_alive()) else {
                continue;
            };
            flight.elapsed += dt;
            let progress = (flight.elapsed / FLIGHT_SECS).min(1.0);
            let position =
                battlefield.clamp(flight.origin + flight.direction * FLIGHT_DISTANCE * progress);
            unit.position = position;
            let team = unit.team;
            if progress >= 1.0 {
                unit.airborne = false;
                unit.stun = unit.stun.max(LANDING_STUN_SECS);
            }

            let side = Vec2::new(-flight.direction.y, flight.direction.x);
            for other in &mut self.units {
                if other.id == flight.unit
                    || other.team != team
                    || !other.is_alive()
                    || flight.scattered.contains(&other.id)
                    || other.position.distance(position) > SCATTER_RADIUS
                {
                    continue;
                }
                let sign = if (other.position - position).dot(side) >= 0.0 {
                    1.0
                } else {
                    -1.0
                };
                other.stun = other.stun.max(SCATTER_STUN_SECS);
                other.position = battlefield.clamp(other.position + side * sign * SCATTER_NUDGE);
                flight.scattered.push(other.id);
            }

            if progress < 1.0 {
                self.flights.push(flight);
            }
        }
    }

    fn advance_abilities(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) {
        let abilities = std::mem::take(&mut self.abilities);
        for mut ability in abilities {
            let caster_alive = self
                .unit(ability.caster)
                .is_some_and(|unit| unit.is_alive());
            let step = if caster_alive && self.phase == GamePhase::Battle {
                self.step_ability(ledger, &mut ability, dt, out_events)
            } else {
                Step::Finished
            };
            match step {
                Step::Continue => self.abilities.push(ability),
                Step::Finished => self.finish_ability(&ability, out_events),
            }
        }
    }

    fn finish_ability(&mut self, ability: &Ability, out_events: &mut Vec<Event>) {
        if let Some(unit) = self.unit_mut(ability.caster) {
            unit.casting = false;
        }
        out_events.push(Event::UltimateFinished {
            unit: ability.caster,
        });
    }

    /// Aborts every running ultimate and removes ultimate buffs from allies.
    pub(crate) fn cancel_ultimates(&mut self, out_events: &mut Vec<Event>) {
        for ability in std::mem::take(&mut self.abilities) {
            self.finish_ability(&ability, out_events);
        }
        for unit in self.units.iter_mut().filter(|unit| unit.team == Team::Ally) {
            unit.strip_modifiers(ModifierSource::Ultimate);
        }
    }

    fn step_ability(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        ability: &mut Ability,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) -> Step {
        let Some(caster) = self.unit(ability.caster) else {
            return Step::Finished;
        };
        let caster_position = caster.position;
        let team = caster.team;
        let power = caster.attack_power();
        let profile = profile(ability.kind);

        if !ability.started {
            ability.started = true;
            self.begin_ability(ability, caster_position, team);
        }

        if ability.kind == UltimateKind::PiercingDash {
            let speed = DASH_DISTANCE / profile.interval;
            let battlefield = self.config.battlefield;
            let next = battlefield.clamp(caster_position + ability.direction * speed * dt);
            if let Some(unit) = self.unit_mut(ability.caster) {
                unit.position = next;
            }
            let crossed: Vec<UnitId> = self
                .living_enemies_of(team)
                .filter(|unit| {
                    !ability.struck.contains(&unit.id)
                        && unit.position.distance(next) <= profile.radius
                })
                .map(|unit| unit.id)
                .collect();
            let damage = scaled(power, profile.multiplier);
            for id in crossed {
                ability.struck.push(id);
                let _ =
                    self.deal_damage(ledger, ability.caster, &ability.viewer, id, damage, out_events);
            }
        } else {
            while ability.pulses_done < profile.pulses
                && ability.elapsed >= profile.interval * ability.pulses_done as f32
            {
                self.pulse_ability(ledger, ability, power, team, out_events);
                ability.pulses_done += 1;
                if !self.unit(ability.caster).is_some_and(|unit| unit.is_alive()) {
                    return Step::Finished;
                }
            }
        }

        ability.elapsed += dt;
        if ability.elapsed >= ability.duration() {
            Step::Finished
        } else {
            Step::Continue
        }
    }

    fn begin_ability(&mut self, ability: &mut Ability, caster_position: Vec2, team: Team) {
        let nearest = self
            .living_enemies_of(team)
            .min_by(|a, b| {
                a.position
                    .distance_squared(caster_position)
                    .total_cmp(&b.position.distance_squared(caster_position))
            })
            .map(|unit| unit.position);
        let forward = team.default_fling() * -1.0;
        ability.direction = nearest
            .and_then(|position| (position - caster_position).try_normalize())
            .unwrap_or(forward);
        ability.anchor = nearest.unwrap_or(caster_position + forward * METEOR_FALLBACK_REACH);

        match ability.kind {
            UltimateKind::Rally => {
                if let Some(unit) = self.unit_mut(ability.caster) {
                    unit.add_modifier(TimedModifier::attack(
                        ModifierSource::Ultimate,
                        RALLY_ATTACK_MULTIPLIER,
                        RALLY_SECS,
                    ));
                }
            }
            UltimateKind::Whirlwind
            | UltimateKind::PiercingDash
            | UltimateKind::ArrowRain
            | UltimateKind::Sanctuary
            | UltimateKind::Meteor => {}
        }
    }

    fn pulse_ability(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        ability: &Ability,
        power: u32,
        team: Team,
        out_events: &mut Vec<Event>,
    ) {
        let profile = profile(ability.kind);
        let Some(caster_position) = self.unit(ability.caster).map(|unit| unit.position) else {
            return;
        };
        let damage = scaled(power, profile.multiplier);
        let targets: Vec<UnitId> = match ability.kind {
            UltimateKind::Whirlwind | UltimateKind::Rally => self
                .living_enemies_of(team)
                .filter(|unit| unit.position.distance(caster_position) <= profile.radius)
                .map(|unit| unit.id)
                .collect(),
            UltimateKind::Meteor => self
                .living_enemies_of(team)
                .filter(|unit| unit.position.distance(ability.anchor) <= profile.radius)
                .map(|unit| unit.id)
                .collect(),
            UltimateKind::ArrowRain => {
                let mut candidates: Vec<(f32, UnitId)> = self
                    .living_enemies_of(team)
                    .map(|unit| (unit.position.distance(caster_position), unit.id))
                    .filter(|(distance, _)| *distance <= profile.radius)
                    .collect();
                candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                candidates
                    .into_iter()
                    .take(ARROW_RAIN_TARGETS)
                    .map(|(_, id)| id)
                    .collect()
            }
            UltimateKind::Sanctuary => {
                self.sanctify(ledger, ability, team, out_events);
                Vec::new()
            }
            UltimateKind::PiercingDash => Vec::new(),
        };
        for id in targets {
            let _ = self.deal_damage(ledger, ability.caster, &ability.viewer, id, damage, out_events);
        }
    }

    fn sanctify(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        ability: &Ability,
        team: Team,
        out_events: &mut Vec<Event>,
    ) {
        let mut healed = Vec::new();
        for unit in self
            .units
            .iter_mut()
            .filter(|unit| unit.team == team && unit.is_alive())
        {
            let amount = (unit.max_hp as f32 * SANCTUARY_HEAL_FRACTION).round() as u32;
            let restored = unit.restore(amount);
            unit.add_modifier(TimedModifier::damage_reduction(
                ModifierSource::Ultimate,
                SANCTUARY_DAMAGE_REDUCTION,
                SANCTUARY_SECS,
            ));
            if restored > 0 {
                healed.push((unit.id, restored));
            }
        }
        let mut total = 0;
        for (target, amount) in healed {
            total += amount;
            out_events.push(Event::HealPerformed {
                healer: ability.caster,
                viewer: ability.viewer.clone(),
                target,
                amount,
            });
        }
        self.award_xp(ledger, ability.caster, total, out_events);
    }

    fn living_enemies_of(&self, team: Team) -> impl Iterator<Item = &crate::unit::Unit> {
        self.units
            .iter()
            .filter(move |unit| unit.team != team && unit.is_alive())
    }
}

fn scaled(power: u32, multiplier: f32) -> u32 {
    ((power as f32 * multiplier).round() as u32).max(1)
}
