#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks a target for every unit able to act.
//!
//! Fighters pick the nearest living enemy. Healers pick the other living ally
//! missing the most hit points. Ties fall to the earlier unit in roster order.

use stream_siege_core::{GamePhase, Team, UnitId, UnitTarget, UnitView, Vec2};

/// Targeting system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct Targeting {
    candidates: Vec<Candidate>,
}

impl Targeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for the provided unit view.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Nothing is produced outside of preparation and battle.
    pub fn handle(&mut self, phase: GamePhase, units: &UnitView, out: &mut Vec<UnitTarget>) {
        out.clear();
        if !phase.accepts_commands() {
            return;
        }

        self.prepare_candidates(units);
        if self.candidates.is_empty() {
            return;
        }

        for unit in units.iter().filter(|unit| unit.can_act) {
            let best = if unit.kind.is_healer() {
                self.neediest_ally(unit.id, unit.team, unit.position)
            } else {
                self.nearest_enemy(unit.team, unit.position)
            };
            if let Some((target, distance)) = best {
                out.push(UnitTarget {
                    unit: unit.id,
                    target,
                    distance,
                });
            }
        }
    }

    fn prepare_candidates(&mut self, units: &UnitView) {
        self.candidates.clear();
        self.candidates.extend(
            units
                .iter()
                .filter(|unit| unit.is_alive())
                .map(|unit| Candidate {
                    id: unit.id,
                    team: unit.team,
                    position: unit.position,
                    missing_hp: unit.missing_hp(),
                }),
        );
    }

    fn nearest_enemy(&self, team: Team, origin: Vec2) -> Option<(UnitId, f32)> {
        let mut best: Option<(UnitId, f32)> = None;
        for candidate in self.candidates.iter().filter(|c| c.team != team) {
            let distance = candidate.position.distance(origin);
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((candidate.id, distance)),
            }
        }
        best
    }

    fn neediest_ally(&self, healer: UnitId, team: Team, origin: Vec2) -> Option<(UnitId, f32)> {
        let mut best: Option<&Candidate> = None;
        for candidate in self
            .candidates
            .iter()
            .filter(|c| c.team == team && c.id != healer)
        {
            match best {
                Some(current) if candidate.missing_hp <= current.missing_hp => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|candidate| (candidate.id, candidate.position.distance(origin)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: UnitId,
    team: Team,
    position: Vec2,
    missing_hp: u32,
}
