#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns targeting data into attack, heal, and siege commands.

use stream_siege_core::{CastleSnapshot, Command, GamePhase, UnitSnapshot, UnitTarget, UnitView};

/// Combat system that queues actions for units whose cooldown has elapsed.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::Attack`, `Command::Heal`, and `Command::StrikeCastle`
    /// entries for units ready to act.
    ///
    /// `targets` must be in roster order, as produced by the targeting system.
    /// Castles are only struck during battle, and only by units without a
    /// target in reach.
    pub fn handle(
        &mut self,
        phase: GamePhase,
        units: &UnitView,
        targets: &[UnitTarget],
        castles: &[CastleSnapshot],
        out: &mut Vec<Command>,
    ) {
        if !phase.accepts_commands() {
            return;
        }

        self.scratch.clear();

        for unit in units
            .iter()
            .filter(|unit| unit.can_act && unit.cooldown_ready)
        {
            let in_reach =
                find_target(targets, unit).filter(|target| target.distance <= unit.attack_range);
            if let Some(target) = in_reach {
                self.scratch.push(if unit.kind.is_healer() {
                    Command::Heal {
                        healer: unit.id,
                        target: target.target,
                    }
                } else {
                    Command::Attack {
                        attacker: unit.id,
                        target: target.target,
                    }
                });
                continue;
            }

            if phase == GamePhase::Battle
                && !unit.kind.is_healer()
                && castles.iter().any(|castle| castle_in_reach(unit, castle))
            {
                self.scratch.push(Command::StrikeCastle { attacker: unit.id });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_target<'a>(targets: &'a [UnitTarget], unit: &UnitSnapshot) -> Option<&'a UnitTarget> {
    targets
        .binary_search_by_key(&unit.id, |target| target.unit)
        .ok()
        .map(|index| &targets[index])
}

fn castle_in_reach(unit: &UnitSnapshot, castle: &CastleSnapshot) -> bool {
    castle.team == unit.team.opponent()
        && castle.hp > 0
        && unit.position.distance(castle.position) <= unit.attack_range + castle.radius
}
