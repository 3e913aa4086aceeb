//! Phase state machine, placement queue discipline, and viewer buffs.

use rand::Rng;
use stream_siege_core::{
    stats::{self, ScoreInputs},
    BuffSource, Event, GameMode, GamePhase, LifeState, QueueTicket, QueuedUnit, Rejection, Stance,
    Team, UnitId, UnitType, Vec2, ViewerId, ViewerLedger,
};

use crate::{tasks::Ability, unit::Unit, World};

/// Every wave whose index satisfies `(wave + 1) % BOSS_WAVE_PERIOD == 0` spawns a boss.
const BOSS_WAVE_PERIOD: u32 = 5;
/// Attempts made to find a random walkable placement before giving up.
const PLACEMENT_ATTEMPTS: usize = 32;

impl World {
    pub(crate) fn reject(&self, reason: Rejection, out_events: &mut Vec<Event>) {
        tracing::debug!(?reason, phase = ?self.phase, "command rejected");
        out_events.push(Event::CommandRejected { reason });
    }

    fn set_phase(&mut self, phase: GamePhase, out_events: &mut Vec<Event>) {
        tracing::info!(from = ?self.phase, to = ?phase, wave = self.wave_index, "phase changed");
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    pub(crate) fn select_mode(&mut self, mode: GameMode, out_events: &mut Vec<Event>) {
        if self.phase != GamePhase::Title {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        self.mode = Some(mode);
        self.economy.grant_gold(self.config.starting_gold);
        self.set_phase(GamePhase::Preparation, out_events);
        out_events.push(Event::GoldChanged {
            gold: self.economy.gold(),
        });
    }

    pub(crate) fn restore_progress(
        &mut self,
        wave: u32,
        total_kills: u32,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase != GamePhase::Preparation {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        tracing::info!(wave, total_kills, "restoring saved progress");
        self.wave_index = wave;
        self.economy.restore_kills(total_kills);
        self.enemy_castle.reset(self.config.enemy_castle_hp(wave));
    }

    pub(crate) fn reset_to_title(&mut self, out_events: &mut Vec<Event>) {
        let config = self.config.clone();
        let terrain = self.terrain.clone();
        *self = World::new(config);
        self.terrain = terrain;
        out_events.push(Event::SpawningHalted);
        self.set_phase(GamePhase::Title, out_events);
    }

    pub(crate) fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != GamePhase::Preparation {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if self.living(Team::Ally) == 0 {
            self.reject(Rejection::NoLivingAllies, out_events);
            return;
        }
        self.ultimate_used.clear();
        self.cancel_ultimates(out_events);
        self.enemy_castle
            .reset(self.config.enemy_castle_hp(self.wave_index));
        self.set_phase(GamePhase::Battle, out_events);
        let spawn_boss = (self.wave_index + 1) % BOSS_WAVE_PERIOD == 0;
        out_events.push(Event::WaveStarted {
            wave: self.wave_index,
            spawn_boss,
        });
    }

    pub(crate) fn report_wave_cleared(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase != GamePhase::Battle {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if self.enemy_castle.hp > 0 {
            tracing::info!(wave = self.wave_index, "enemy castle stands, requesting reinforcements");
            out_events.push(Event::ReinforcementsRequested {
                wave: self.wave_index,
            });
            return;
        }

        let cleared = self.wave_index;
        let bonus_xp = stats::wave_clear_bonus_xp(cleared);
        self.wave_index += 1;
        self.economy.record_wave_cleared();
        let survivors: Vec<UnitId> = self
            .units
            .iter()
            .filter(|unit| unit.team == Team::Ally && unit.is_alive())
            .map(|unit| unit.id)
            .collect();
        for id in survivors {
            self.award_xp(ledger, id, bonus_xp, out_events);
        }
        tracing::info!(wave = cleared, bonus_xp, "wave cleared");
        out_events.push(Event::WaveCleared {
            wave: cleared,
            bonus_xp,
        });
        self.set_phase(GamePhase::Preparation, out_events);
    }

    pub(crate) fn end_match(&mut self, out_events: &mut Vec<Event>) {
        let inputs = ScoreInputs {
            wave_index: self.wave_index,
            total_kills: self.economy.total_kills(),
            castle_hp: self.player_castle.hp,
            elapsed_seconds: self.elapsed,
            living_allies: u32::try_from(self.living(Team::Ally)).unwrap_or(u32::MAX),
            castle_untouched: !self.player_castle.damaged,
        };
        let result = inputs.final_score();
        tracing::info!(score = result.score, rank = ?result.rank, "match ended");
        self.cancel_ultimates(out_events);
        out_events.push(Event::SpawningHalted);
        self.set_phase(GamePhase::Result, out_events);
        out_events.push(Event::MatchEnded { result });
        if let Some(mode) = self.mode {
            out_events.push(Event::SaveInvalidated { mode });
        }
    }

    pub(crate) fn living(&self, team: Team) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.team == team && unit.is_alive())
            .count()
    }

    fn check_caps(&self, viewer: &ViewerId) -> Result<(), Rejection> {
        if self.queue.held() + self.living(Team::Ally) >= self.config.global_unit_cap {
            return Err(Rejection::GlobalCapReached);
        }
        if !viewer.is_anonymous() {
            let owned = self.queue.held_by(viewer)
                + self
                    .units
                    .iter()
                    .filter(|unit| unit.team == Team::Ally && unit.is_alive())
                    .filter(|unit| &unit.viewer == viewer)
                    .count();
            if owned >= self.config.per_viewer_cap {
                return Err(Rejection::ViewerCapReached);
            }
        }
        Ok(())
    }

    pub(crate) fn enqueue(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        unit: QueuedUnit,
        purchase: bool,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if unit.kind.requires_subscription() && !ledger.stats(&unit.viewer).is_subscriber {
            self.reject(Rejection::SubscriptionRequired, out_events);
            return;
        }
        if let Err(reason) = self.check_caps(&unit.viewer) {
            self.reject(reason, out_events);
            return;
        }
        if purchase {
            let cost = stats::base_stats(unit.kind).gold_cost;
            if !self.economy.try_spend(cost) {
                self.reject(Rejection::InsufficientGold, out_events);
                return;
            }
            out_events.push(Event::GoldChanged {
                gold: self.economy.gold(),
            });
        }
        if !unit.viewer.is_anonymous() {
            ledger.record_summon(&unit.viewer, &unit.owner);
        }
        let ticket = self.queue.push(unit.clone());
        out_events.push(Event::UnitQueued { ticket, unit });
        out_events.push(Event::QueueChanged {
            queued: self.queue.waiting(),
        });
    }

    fn random_placement(&mut self) -> Option<Vec2> {
        let zone = self.config.placement_zone;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let candidate = Vec2::new(
                self.rng.gen_range(zone.min.x..=zone.max.x),
                self.rng.gen_range(zone.min.y..=zone.max.y),
            );
            if self.terrain.is_walkable(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn valid_placement(&self, position: Vec2) -> bool {
        self.config.placement_zone.contains(position)
            && self.config.battlefield.contains(position)
            && self.terrain.is_walkable(position)
    }

    pub(crate) fn place_queued(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        ticket: QueueTicket,
        position: Option<Vec2>,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if !self.queue.tickets().contains(&ticket) {
            self.reject(Rejection::QueueEntryMissing, out_events);
            return;
        }
        let position = match position {
            Some(position) if self.valid_placement(position) => position,
            Some(_) => {
                self.reject(Rejection::NotWalkable, out_events);
                return;
            }
            None => match self.random_placement() {
                Some(position) => position,
                None => {
                    self.reject(Rejection::NotWalkable, out_events);
                    return;
                }
            },
        };
        if let Some(unit) = self.queue.take(ticket) {
            let _ = self.deploy(ledger, unit, position, out_events);
        }
    }

    pub(crate) fn place_all_queued(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        for ticket in self.queue.tickets() {
            self.place_queued(ledger, ticket, None, out_events);
        }
    }

    pub(crate) fn begin_drag(&mut self, ticket: QueueTicket, out_events: &mut Vec<Event>) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if self.queue.dragging().is_some() {
            self.reject(Rejection::DragConflict, out_events);
            return;
        }
        if !self.queue.begin_drag(ticket) {
            self.reject(Rejection::QueueEntryMissing, out_events);
            return;
        }
        out_events.push(Event::QueueChanged {
            queued: self.queue.waiting(),
        });
    }

    pub(crate) fn drop_dragged(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) {
        let Some((ticket, unit)) = self.queue.take_dragged() else {
            self.reject(Rejection::DragConflict, out_events);
            return;
        };
        if !self.phase.accepts_commands() || !self.valid_placement(position) {
            let reason = if self.phase.accepts_commands() {
                Rejection::NotWalkable
            } else {
                Rejection::WrongPhase
            };
            self.queue.restore(ticket, unit);
            self.reject(reason, out_events);
            out_events.push(Event::QueueChanged {
                queued: self.queue.waiting(),
            });
            return;
        }
        let _ = self.deploy(ledger, unit, position, out_events);
    }

    pub(crate) fn cancel_drag(&mut self, out_events: &mut Vec<Event>) {
        let Some((ticket, unit)) = self.queue.take_dragged() else {
            self.reject(Rejection::DragConflict, out_events);
            return;
        };
        self.queue.restore(ticket, unit);
        out_events.push(Event::QueueChanged {
            queued: self.queue.waiting(),
        });
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.wrapping_add(1);
        id
    }

    /// Converts a queue entry into a live ally seeded from the viewer's ledger entry.
    fn deploy(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        queued: QueuedUnit,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) -> UnitId {
        let id = self.allocate_unit_id();
        let mut unit = Unit::new(
            id,
            queued.kind,
            Team::Ally,
            queued.viewer.clone(),
            position,
            self.config.max_size_scale,
        );
        unit.owner = queued.owner;
        unit.appearance = queued.appearance;

        if !queued.viewer.is_anonymous() {
            let record = ledger.stats(&queued.viewer);
            unit.promote_to(record.best_level);
            unit.xp = record
                .best_xp
                .min(stats::xp_to_next_level(unit.level).saturating_sub(1));
            if record.is_member {
                let _ = unit.grant_member();
            }
            let _ = unit.grant_super_chat(record.super_chat_tier);
            let _ = unit.grant_gift(record.gift_tier);
            let _ = unit.grant_team(record.team_level);
            if record.is_subscriber {
                let _ = unit.grant_subscriber();
            }
        }
        for _ in 0..self.milestones.len() {
            unit.grant_milestone(false);
        }
        unit.state = LifeState::Active;

        let kind = unit.kind;
        self.units.push(unit);
        out_events.push(Event::UnitDeployed {
            unit: id,
            kind,
            team: Team::Ally,
            position,
        });
        out_events.push(Event::QueueChanged {
            queued: self.queue.waiting(),
        });
        id
    }

    pub(crate) fn spawn_enemy(
        &mut self,
        kind: UnitType,
        position: Vec2,
        boss: bool,
        level: u32,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase != GamePhase::Battle {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        let id = self.allocate_unit_id();
        let position = self.config.battlefield.clamp(position);
        let mut unit = Unit::new(
            id,
            kind,
            Team::Enemy,
            ViewerId::anonymous(),
            position,
            self.config.max_size_scale,
        );
        unit.promote_to(level);
        if boss {
            unit.make_boss();
        }
        unit.state = LifeState::Active;
        self.units.push(unit);
        out_events.push(Event::UnitDeployed {
            unit: id,
            kind,
            team: Team::Enemy,
            position,
        });
    }

    pub(crate) fn set_stance(
        &mut self,
        viewer: &ViewerId,
        stance: Stance,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        let defend_secs = self.config.defend_duration_secs;
        let mut changed = Vec::new();
        for unit in self
            .units
            .iter_mut()
            .filter(|unit| unit.team == Team::Ally && unit.is_alive() && &unit.viewer == viewer)
        {
            unit.set_stance(stance, defend_secs);
            changed.push(unit.id);
        }
        if changed.is_empty() {
            self.reject(Rejection::NoLivingUnit, out_events);
            return;
        }
        out_events.extend(
            changed
                .into_iter()
                .map(|unit| Event::StanceChanged { unit, stance }),
        );
    }

    pub(crate) fn cast_ultimate(
        &mut self,
        ledger: &mut dyn ViewerLedger,
        viewer: &ViewerId,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase != GamePhase::Battle {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if self.ultimate_used.contains(viewer) {
            self.reject(Rejection::UltimateAlreadyUsed, out_events);
            return;
        }
        let best = self
            .units
            .iter()
            .filter(|unit| unit.team == Team::Ally && unit.is_alive() && &unit.viewer == viewer)
            .filter(|unit| !self.abilities.iter().any(|ability| ability.caster() == unit.id))
            .max_by(|a, b| a.level.cmp(&b.level).then(b.id.cmp(&a.id)))
            .map(|unit| (unit.id, unit.kind.ultimate()));
        let Some((caster, kind)) = best else {
            self.reject(Rejection::NoLivingUnit, out_events);
            return;
        };
        if !ledger.try_spend_score(viewer, self.config.ultimate_cost) {
            self.reject(Rejection::InsufficientScore, out_events);
            return;
        }
        let _ = self.ultimate_used.insert(viewer.clone());
        if let Some(unit) = self.unit_mut(caster) {
            unit.casting = true;
        }
        self.abilities
            .push(Ability::new(caster, viewer.clone(), kind));
        tracing::info!(viewer = viewer.as_str(), ?kind, "ultimate cast");
        out_events.push(Event::UltimateCast {
            viewer: viewer.clone(),
            unit: caster,
            kind,
        });
    }

    /// Upgrades every living ally the viewer owns; emits one event per changed unit.
    pub(crate) fn upgrade_viewer_units(
        &mut self,
        viewer: &ViewerId,
        source: BuffSource,
        out_events: &mut Vec<Event>,
        mut upgrade: impl FnMut(&mut Unit) -> bool,
    ) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        for unit in self
            .units
            .iter_mut()
            .filter(|unit| unit.team == Team::Ally && unit.is_alive() && &unit.viewer == viewer)
        {
            if upgrade(unit) {
                out_events.push(Event::BuffApplied {
                    unit: unit.id,
                    source,
                });
            }
        }
    }

    pub(crate) fn reach_like_milestone(&mut self, index: u32, out_events: &mut Vec<Event>) {
        if !self.phase.accepts_commands() {
            self.reject(Rejection::WrongPhase, out_events);
            return;
        }
        if !self.milestones.insert(index) {
            return;
        }
        tracing::info!(index, "like milestone reached");
        for unit in self
            .units
            .iter_mut()
            .filter(|unit| unit.team == Team::Ally && unit.is_alive())
        {
            unit.grant_milestone(true);
            out_events.push(Event::BuffApplied {
                unit: unit.id,
                source: BuffSource::Milestone,
            });
        }
    }
}
