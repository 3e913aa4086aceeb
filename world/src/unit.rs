use stream_siege_core::{
    stats::{
        self, AuraGrant, BaseStats, GIFT_MULTIPLIERS, LEVEL_SIZE_GROWTH, LEVEL_STAT_MULTIPLIER,
        LEVEL_UP_HEAL_FRACTION, MAX_DAMAGE_REDUCTION, MEMBER_MULTIPLIER, MILESTONE_MULTIPLIER,
        SUBSCRIBER_AUTO_HEAL_RATE, SUBSCRIBER_MULTIPLIER, SUPER_CHAT_MULTIPLIERS,
        TEAM_BUFF_DAMAGE_REDUCTION, TEAM_BUFF_SECS, TOP_GIFT_AUTO_HEAL_RATE,
    },
    Appearance, LifeState, Stance, Team, UnitId, UnitSnapshot, UnitType, Vec2, ViewerId,
};

/// Seconds of invincibility granted by a like milestone.
const MILESTONE_INVINCIBILITY_SECS: f32 = 3.0;

/// Origin of a timed stat modifier. At most one modifier per source is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ModifierSource {
    TeamBuff,
    Ultimate,
    Aura,
}

/// Temporary stat change that expires on its own.
///
/// Attack and speed multipliers compose multiplicatively, damage reduction
/// bonuses add up and the sum is clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TimedModifier {
    pub(crate) source: ModifierSource,
    pub(crate) attack_multiplier: f32,
    pub(crate) speed_multiplier: f32,
    pub(crate) damage_reduction: f32,
    pub(crate) remaining: f32,
}

impl TimedModifier {
    pub(crate) const fn damage_reduction(source: ModifierSource, amount: f32, secs: f32) -> Self {
        Self {
            source,
            attack_multiplier: 1.0,
            speed_multiplier: 1.0,
            damage_reduction: amount,
            remaining: secs,
        }
    }

    pub(crate) const fn attack(source: ModifierSource, multiplier: f32, secs: f32) -> Self {
        Self {
            source,
            attack_multiplier: multiplier,
            speed_multiplier: 1.0,
            damage_reduction: 0.0,
            remaining: secs,
        }
    }
}

/// Outcome of one regeneration or modifier step.
#[derive(Debug, Default)]
pub(crate) struct TimerOutcome {
    pub(crate) stance_reverted: bool,
    pub(crate) aura_pulse: Option<AuraGrant>,
}

#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitType,
    pub(crate) team: Team,
    pub(crate) owner: String,
    pub(crate) viewer: ViewerId,
    pub(crate) appearance: Appearance,
    pub(crate) position: Vec2,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    base_attack_power: u32,
    attack_power: u32,
    pub(crate) attack_range: f32,
    pub(crate) attack_interval: f32,
    base_move_speed: f32,
    move_speed: f32,
    base_damage_reduction: f32,
    damage_reduction: f32,
    pub(crate) heal_amount: u32,
    pub(crate) level: u32,
    pub(crate) xp: u32,
    pub(crate) state: LifeState,
    pub(crate) stance: Stance,
    defend_remaining: f32,
    pub(crate) cooldown: f32,
    pub(crate) stun: f32,
    pub(crate) airborne: bool,
    pub(crate) casting: bool,
    invincible: f32,
    pub(crate) knockback_cooldown: f32,
    pub(crate) death_timer: f32,
    pub(crate) fling: Vec2,
    pub(crate) boss: bool,
    pub(crate) size_scale: f32,
    max_size_scale: f32,
    is_member: bool,
    super_chat_tier: i8,
    gift_tier: i8,
    team_level: u8,
    is_subscriber: bool,
    aura: Option<AuraGrant>,
    aura_timer: f32,
    auto_heal_rate: f32,
    heal_carry: f32,
    rainbow: bool,
    modifiers: Vec<TimedModifier>,
}

impl Unit {
    pub(crate) fn new(
        id: UnitId,
        kind: UnitType,
        team: Team,
        viewer: ViewerId,
        position: Vec2,
        max_size_scale: f32,
    ) -> Self {
        let BaseStats {
            max_hp,
            attack_power,
            attack_range,
            attack_interval,
            move_speed,
            damage_reduction,
            heal_amount,
            ..
        } = stats::base_stats(kind);
        Self {
            id,
            kind,
            team,
            owner: String::new(),
            viewer,
            appearance: Appearance::default(),
            position,
            hp: max_hp,
            max_hp,
            base_attack_power: attack_power,
            attack_power,
            attack_range,
            attack_interval,
            base_move_speed: move_speed,
            move_speed,
            base_damage_reduction: damage_reduction,
            damage_reduction,
            heal_amount,
            level: 1,
            xp: 0,
            state: LifeState::InQueue,
            stance: Stance::Attack,
            defend_remaining: 0.0,
            cooldown: 0.0,
            stun: 0.0,
            airborne: false,
            casting: false,
            invincible: 0.0,
            knockback_cooldown: 0.0,
            death_timer: 0.0,
            fling: Vec2::ZERO,
            boss: false,
            size_scale: 1.0,
            max_size_scale,
            is_member: false,
            super_chat_tier: -1,
            gift_tier: -1,
            team_level: 0,
            is_subscriber: false,
            aura: None,
            aura_timer: 0.0,
            auto_heal_rate: 0.0,
            heal_carry: 0.0,
            rainbow: false,
            modifiers: Vec::new(),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state == LifeState::Active && self.hp > 0
    }

    /// Whether the unit may target, move, and attack.
    pub(crate) fn can_act(&self) -> bool {
        self.is_alive() && self.stun <= 0.0 && !self.airborne && !self.casting
    }

    pub(crate) fn attack_power(&self) -> u32 {
        self.attack_power
    }

    pub(crate) fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub(crate) fn collision_radius(&self, base: f32) -> f32 {
        base * self.size_scale
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            team: self.team,
            viewer: self.viewer.clone(),
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            attack_power: self.attack_power,
            damage_reduction: self.damage_reduction,
            heal_amount: self.heal_amount,
            attack_range: self.attack_range,
            move_speed: self.move_speed,
            level: self.level,
            xp: self.xp,
            stance: self.stance,
            state: self.state,
            cooldown_ready: self.cooldown <= 0.0,
            can_act: self.can_act(),
            boss: self.boss,
            size_scale: self.size_scale,
            appearance: self.appearance,
            rainbow: self.rainbow,
        }
    }

    /// Raises the unit to `level` without the level-up heal, ending at full HP.
    pub(crate) fn promote_to(&mut self, level: u32) {
        while self.level < level {
            self.scale_level_stats();
            self.grow();
            self.level += 1;
        }
        self.hp = self.max_hp;
    }

    pub(crate) fn make_boss(&mut self) {
        self.boss = true;
        self.max_hp = stats::scale_stat(self.max_hp, stats::BOSS_HP_MULTIPLIER);
        self.hp = self.max_hp;
        self.base_attack_power =
            stats::scale_stat(self.base_attack_power, stats::BOSS_ATTACK_MULTIPLIER);
        self.size_scale = self.max_size_scale;
        self.recompute();
    }

    fn scale_core_stats(&mut self, factor: f32) {
        self.max_hp = stats::scale_stat(self.max_hp, factor);
        self.base_attack_power = stats::scale_stat(self.base_attack_power, factor);
        self.heal_amount = stats::scale_stat(self.heal_amount, factor);
        self.recompute();
    }

    /// Level growth also speeds the unit up; buffs leave speed alone.
    fn scale_level_stats(&mut self) {
        self.base_move_speed *= LEVEL_STAT_MULTIPLIER;
        self.scale_core_stats(LEVEL_STAT_MULTIPLIER);
    }

    fn grow(&mut self) {
        self.size_scale = (self.size_scale * LEVEL_SIZE_GROWTH).min(self.max_size_scale);
    }

    /// Multiplies core stats once and tops HP up by the max HP increase.
    fn apply_multiplier(&mut self, factor: f32) {
        let previous_max = self.max_hp;
        self.scale_core_stats(factor);
        let increase = self.max_hp - previous_max;
        self.hp = self.hp.saturating_add(increase).min(self.max_hp);
    }

    /// Applies incoming damage and returns the HP actually removed.
    ///
    /// Returns `None` when the unit is dead or invincible.
    pub(crate) fn take_damage(&mut self, raw: u32) -> Option<u32> {
        if !self.is_alive() || self.invincible > 0.0 {
            return None;
        }
        let amount = stats::damage_after_reduction(raw, self.damage_reduction);
        let removed = amount.min(self.hp);
        self.hp -= removed;
        Some(removed)
    }

    /// Restores HP up to the maximum and returns the amount restored.
    pub(crate) fn restore(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let restored = amount.min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }

    /// Credits XP and returns the number of level-ups.
    pub(crate) fn grant_xp(&mut self, raw: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let gain = stats::xp_gain(self.kind, raw);
        if gain == 0 {
            return 0;
        }
        let progress = stats::advance_level(self.level, self.xp, gain);
        for _ in 0..progress.level_ups {
            self.level_up();
        }
        self.level = progress.level;
        self.xp = progress.xp;
        progress.level_ups
    }

    fn level_up(&mut self) {
        self.scale_level_stats();
        let heal = (self.max_hp as f32 * LEVEL_UP_HEAL_FRACTION).round() as u32;
        self.hp = self.hp.saturating_add(heal).min(self.max_hp);
        self.grow();
    }

    pub(crate) fn kill(&mut self, fling: Vec2, death_duration: f32) {
        self.hp = 0;
        self.state = LifeState::Dead;
        self.fling = fling;
        self.death_timer = death_duration;
        self.casting = false;
        self.airborne = false;
    }

    pub(crate) fn set_stance(&mut self, stance: Stance, defend_secs: f32) {
        self.stance = stance;
        self.defend_remaining = match stance {
            Stance::Defend => defend_secs,
            Stance::Attack => 0.0,
        };
    }

    pub(crate) fn grant_member(&mut self) -> bool {
        if self.is_member {
            return false;
        }
        self.is_member = true;
        self.apply_multiplier(MEMBER_MULTIPLIER);
        true
    }

    pub(crate) fn grant_super_chat(&mut self, tier: i8) -> bool {
        let Some(factor) =
            stats::tier_transition_factor(&SUPER_CHAT_MULTIPLIERS, self.super_chat_tier, tier)
        else {
            return false;
        };
        self.super_chat_tier = tier;
        self.apply_multiplier(factor);
        true
    }

    pub(crate) fn grant_gift(&mut self, tier: i8) -> bool {
        let Some(factor) = stats::tier_transition_factor(&GIFT_MULTIPLIERS, self.gift_tier, tier)
        else {
            return false;
        };
        self.gift_tier = tier;
        self.apply_multiplier(factor);
        if let Some(aura) = stats::gift_aura(tier) {
            self.aura = Some(aura);
        }
        if usize::try_from(tier).ok() == Some(GIFT_MULTIPLIERS.len() - 1) {
            self.auto_heal_rate = self.auto_heal_rate.max(TOP_GIFT_AUTO_HEAL_RATE);
            self.rainbow = true;
        }
        true
    }

    pub(crate) fn grant_team(&mut self, level: u8) -> bool {
        let Some(factor) = stats::team_transition_factor(self.team_level, level) else {
            return false;
        };
        self.team_level = level.min(stats::MAX_TEAM_LEVEL);
        self.apply_multiplier(factor);
        self.add_modifier(TimedModifier::damage_reduction(
            ModifierSource::TeamBuff,
            TEAM_BUFF_DAMAGE_REDUCTION,
            TEAM_BUFF_SECS,
        ));
        true
    }

    pub(crate) fn grant_subscriber(&mut self) -> bool {
        if self.is_subscriber {
            return false;
        }
        self.is_subscriber = true;
        self.apply_multiplier(SUBSCRIBER_MULTIPLIER);
        self.auto_heal_rate = self.auto_heal_rate.max(SUBSCRIBER_AUTO_HEAL_RATE);
        true
    }

    pub(crate) fn grant_milestone(&mut self, invincible: bool) {
        self.apply_multiplier(MILESTONE_MULTIPLIER);
        if invincible {
            self.invincible = self.invincible.max(MILESTONE_INVINCIBILITY_SECS);
        }
    }

    /// Installs a modifier, replacing any modifier from the same source.
    pub(crate) fn add_modifier(&mut self, modifier: TimedModifier) {
        self.modifiers.retain(|held| held.source != modifier.source);
        self.modifiers.push(modifier);
        self.recompute();
    }

    pub(crate) fn strip_modifiers(&mut self, source: ModifierSource) {
        let before = self.modifiers.len();
        self.modifiers.retain(|held| held.source != source);
        if self.modifiers.len() != before {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let mut attack = 1.0;
        let mut speed = 1.0;
        let mut reduction = self.base_damage_reduction;
        for modifier in &self.modifiers {
            attack *= modifier.attack_multiplier;
            speed *= modifier.speed_multiplier;
            reduction += modifier.damage_reduction;
        }
        self.attack_power = stats::scale_stat(self.base_attack_power, attack);
        self.move_speed = self.base_move_speed * speed;
        self.damage_reduction = reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
    }

    /// Advances per-unit timers of a living unit.
    pub(crate) fn advance_timers(&mut self, dt: f32) -> TimerOutcome {
        let mut outcome = TimerOutcome::default();
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.stun = (self.stun - dt).max(0.0);
        self.invincible = (self.invincible - dt).max(0.0);
        self.knockback_cooldown = (self.knockback_cooldown - dt).max(0.0);

        let held = self.modifiers.len();
        for modifier in &mut self.modifiers {
            modifier.remaining -= dt;
        }
        self.modifiers.retain(|modifier| modifier.remaining > 0.0);
        if self.modifiers.len() != held {
            self.recompute();
        }

        if self.stance == Stance::Defend {
            self.defend_remaining -= dt;
            if self.defend_remaining <= 0.0 {
                self.set_stance(Stance::Attack, 0.0);
                outcome.stance_reverted = true;
            }
        }

        if self.auto_heal_rate > 0.0 && self.hp < self.max_hp {
            self.heal_carry += self.max_hp as f32 * self.auto_heal_rate * dt;
            let whole = self.heal_carry.floor();
            if whole >= 1.0 {
                self.heal_carry -= whole;
                let _ = self.restore(whole as u32);
            }
        }

        if let Some(aura) = self.aura {
            self.aura_timer += dt;
            if self.aura_timer >= stats::AURA_PERIOD_SECS {
                self.aura_timer -= stats::AURA_PERIOD_SECS;
                outcome.aura_pulse = Some(aura);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(kind: UnitType) -> Unit {
        let mut unit = Unit::new(
            UnitId::new(1),
            kind,
            Team::Ally,
            ViewerId::new("viewer"),
            Vec2::ZERO,
            1.6,
        );
        unit.state = LifeState::Active;
        unit
    }

    #[test]
    fn lower_or_equal_tiers_leave_stats_unchanged() {
        let mut unit = active(UnitType::Warrior);
        assert!(unit.grant_super_chat(2));
        let snapshot = unit.snapshot();
        assert!(!unit.grant_super_chat(2));
        assert!(!unit.grant_super_chat(0));
        assert_eq!(unit.snapshot(), snapshot);

        assert!(unit.grant_gift(4));
        let snapshot = unit.snapshot();
        assert!(!unit.grant_gift(3));
        assert_eq!(unit.snapshot(), snapshot);
    }

    #[test]
    fn buffs_top_up_hp_by_the_max_increase() {
        let mut unit = active(UnitType::Warrior);
        unit.hp = 50;
        assert!(unit.grant_member());
        assert_eq!(unit.max_hp, 144);
        assert_eq!(unit.hp, 74);
    }

    #[test]
    fn overlapping_modifiers_expire_independently() {
        let mut unit = active(UnitType::Warrior);
        let base = unit.damage_reduction;
        unit.add_modifier(TimedModifier::damage_reduction(
            ModifierSource::TeamBuff,
            0.2,
            2.0,
        ));
        unit.add_modifier(TimedModifier::damage_reduction(
            ModifierSource::Ultimate,
            0.5,
            5.0,
        ));
        assert!((unit.damage_reduction - (base + 0.7).min(MAX_DAMAGE_REDUCTION)).abs() < 1e-5);

        let _ = unit.advance_timers(3.0);
        assert!((unit.damage_reduction - (base + 0.5)).abs() < 1e-5);

        let _ = unit.advance_timers(3.0);
        assert!((unit.damage_reduction - base).abs() < 1e-5);
    }

    #[test]
    fn invincible_units_ignore_damage() {
        let mut unit = active(UnitType::Lancer);
        unit.grant_milestone(true);
        assert_eq!(unit.take_damage(50), None);
        let _ = unit.advance_timers(3.5);
        assert!(unit.take_damage(50).is_some());
    }

    #[test]
    fn defend_stance_reverts_after_its_window() {
        let mut unit = active(UnitType::Archer);
        unit.set_stance(Stance::Defend, 1.0);
        assert!(!unit.advance_timers(0.5).stance_reverted);
        assert!(unit.advance_timers(0.6).stance_reverted);
        assert_eq!(unit.stance, Stance::Attack);
    }

    #[test]
    fn subscriber_regenerates_missing_hp() {
        let mut unit = active(UnitType::Knight);
        assert!(unit.grant_subscriber());
        unit.hp = 10;
        let _ = unit.advance_timers(1.0);
        assert!(unit.hp > 10);
        assert!(unit.hp <= unit.max_hp);
    }

    #[test]
    fn level_ups_heal_and_grow_within_caps() {
        let mut unit = active(UnitType::Warrior);
        unit.hp = 1;
        let ups = unit.grant_xp(51);
        assert_eq!(ups, 1);
        assert_eq!(unit.level, 2);
        assert_eq!(unit.max_hp, 130);
        assert_eq!(unit.hp, 1 + 39);
        assert!(unit.size_scale > 1.0 && unit.size_scale <= 1.6);
        let base = stats::base_stats(UnitType::Warrior);
        assert!((unit.move_speed() - base.move_speed * LEVEL_STAT_MULTIPLIER).abs() < 1e-5);
        assert!((unit.attack_range - base.attack_range).abs() < 1e-5);
    }
}
