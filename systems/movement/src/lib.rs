#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that proposes one step per unit per tick.
//!
//! Units chase their target until it is in range. Without a target, enemies
//! march on the player castle, defending allies fall back to the rear line,
//! and attacking allies advance on the enemy castle while a battle is on.
//! Allied steps respect terrain and slide along blocked axes; enemy steps
//! ignore terrain.

use stream_siege_core::{
    CastleSnapshot, Command, Event, GamePhase, Stance, Team, UnitSnapshot, UnitTarget, UnitView,
    Vec2,
};

/// Distance under which a unit counts as standing on its goal.
const ARRIVAL_TOLERANCE: f32 = 0.05;

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug)]
pub struct Movement {
    phase: GamePhase,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            phase: GamePhase::Title,
        }
    }
}

impl Movement {
    /// Creates a movement system that waits for the first phase change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit `Command::MoveUnit`.
    ///
    /// Steps are only proposed for frames that advanced time; their length is
    /// the unit's speed multiplied by the elapsed time.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        units: &UnitView,
        targets: &[UnitTarget],
        castles: &[CastleSnapshot],
        rear_line_x: f32,
        is_walkable: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(Vec2) -> bool,
    {
        let mut dt = None;
        for event in events {
            match event {
                Event::PhaseChanged { phase } => self.phase = *phase,
                Event::TimeAdvanced { dt: elapsed } => dt = Some(elapsed.as_secs_f32()),
                _ => {}
            }
        }

        if !self.phase.accepts_commands() {
            return;
        }
        let Some(dt) = dt.filter(|dt| *dt > 0.0) else {
            return;
        };

        for unit in units.iter().filter(|unit| unit.can_act) {
            let target = targets
                .binary_search_by_key(&unit.id, |target| target.unit)
                .ok()
                .map(|index| &targets[index]);
            let Some(goal) = self.select_goal(unit, target, units, castles, rear_line_x) else {
                continue;
            };
            let Some(next) = step_toward(unit, goal, dt, &is_walkable) else {
                continue;
            };
            out.push(Command::MoveUnit {
                unit: unit.id,
                to: next,
            });
        }
    }

    fn select_goal(
        &self,
        unit: &UnitSnapshot,
        target: Option<&UnitTarget>,
        units: &UnitView,
        castles: &[CastleSnapshot],
        rear_line_x: f32,
    ) -> Option<Vec2> {
        if target.is_some_and(|target| target.distance <= unit.attack_range) {
            return None;
        }

        if unit.team == Team::Ally && unit.stance == Stance::Defend {
            let rear = Vec2::new(rear_line_x, unit.position.y);
            return (rear.distance(unit.position) > ARRIVAL_TOLERANCE).then_some(rear);
        }

        if let Some(target) = target {
            return units.get(target.target).map(|snapshot| snapshot.position);
        }

        let marching = match unit.team {
            Team::Enemy => true,
            Team::Ally => self.phase == GamePhase::Battle,
        };
        if !marching {
            return None;
        }
        let castle = castles
            .iter()
            .find(|castle| castle.team == unit.team.opponent() && castle.hp > 0)?;
        let reach = unit.attack_range + castle.radius;
        (unit.position.distance(castle.position) > reach).then_some(castle.position)
    }
}

fn step_toward<F>(unit: &UnitSnapshot, goal: Vec2, dt: f32, is_walkable: &F) -> Option<Vec2>
where
    F: Fn(Vec2) -> bool,
{
    let offset = goal - unit.position;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return None;
    }
    let step = offset / distance * (unit.move_speed * dt).min(distance);
    let straight = unit.position + step;
    if unit.team == Team::Enemy || is_walkable(straight) {
        return Some(straight);
    }

    [
        unit.position + Vec2::new(step.x, 0.0),
        unit.position + Vec2::new(0.0, step.y),
    ]
    .into_iter()
    .find(|candidate| *candidate != unit.position && is_walkable(*candidate))
}
