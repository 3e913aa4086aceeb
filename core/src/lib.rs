#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stream Siege battle simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to deterministically. Systems
//! consume event streams, query immutable snapshots such as [`UnitView`], and
//! respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
mod ledger;
pub mod stats;

pub use glam::Vec2;
pub use ledger::{ViewerLedger, ViewerStats};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Stream Siege.";

/// Side of the battle a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Units summoned by viewers or bought in the shop.
    Ally,
    /// Units produced by the wave spawner.
    Enemy,
}

impl Team {
    /// Returns the team this team fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }

    /// Direction a fallen unit is flung when no killer is known.
    #[must_use]
    pub const fn default_fling(self) -> Vec2 {
        match self {
            Self::Ally => Vec2::new(-1.0, 0.0),
            Self::Enemy => Vec2::new(1.0, 0.0),
        }
    }
}

/// Playable unit archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Sturdy melee fighter.
    Warrior,
    /// Melee fighter whose strikes pierce through a line of enemies.
    Lancer,
    /// Ranged physical attacker.
    Archer,
    /// Healer that mends the most wounded ally.
    Monk,
    /// Ranged caster firing homing projectiles.
    Mage,
    /// Elite melee fighter reserved for subscribers.
    Knight,
}

impl UnitType {
    /// Every unit type in declaration order.
    pub const ALL: [UnitType; 6] = [
        Self::Warrior,
        Self::Lancer,
        Self::Archer,
        Self::Monk,
        Self::Mage,
        Self::Knight,
    ];

    /// AI behaviour class driving target selection and attack resolution.
    #[must_use]
    pub const fn behavior(self) -> BehaviorClass {
        match self {
            Self::Warrior => BehaviorClass::MeleeBruiser,
            Self::Lancer => BehaviorClass::MeleePierce,
            Self::Archer => BehaviorClass::RangedPhysical,
            Self::Monk => BehaviorClass::Healer,
            Self::Mage => BehaviorClass::RangedMagic,
            Self::Knight => BehaviorClass::Elite,
        }
    }

    /// Ultimate ability performed by units of this type.
    #[must_use]
    pub const fn ultimate(self) -> UltimateKind {
        match self {
            Self::Warrior => UltimateKind::Whirlwind,
            Self::Lancer => UltimateKind::PiercingDash,
            Self::Archer => UltimateKind::ArrowRain,
            Self::Monk => UltimateKind::Sanctuary,
            Self::Mage => UltimateKind::Meteor,
            Self::Knight => UltimateKind::Rally,
        }
    }

    /// Reports whether the owning viewer must be a subscriber to create the unit.
    #[must_use]
    pub const fn requires_subscription(self) -> bool {
        matches!(self, Self::Knight)
    }

    /// Reports whether the unit heals allies instead of attacking enemies.
    #[must_use]
    pub const fn is_healer(self) -> bool {
        matches!(self.behavior(), BehaviorClass::Healer)
    }

    /// Human readable name used in kill logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Lancer => "Lancer",
            Self::Archer => "Archer",
            Self::Monk => "Monk",
            Self::Mage => "Mage",
            Self::Knight => "Knight",
        }
    }
}

/// Behaviour classes shared by unit types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorClass {
    /// Single-target melee.
    MeleeBruiser,
    /// Melee with a pierce cone behind the primary target.
    MeleePierce,
    /// Instant ranged hit.
    RangedPhysical,
    /// Heals the most wounded ally.
    Healer,
    /// Delayed ranged hit carried by a homing projectile.
    RangedMagic,
    /// Subscriber-gated single-target melee.
    Elite,
}

/// Ultimate abilities, one per unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UltimateKind {
    /// Repeated spinning strikes around the caster.
    Whirlwind,
    /// A dash passing through enemies with amplified damage.
    PiercingDash,
    /// Volleys raining on the nearest enemies.
    ArrowRain,
    /// Team-wide heal followed by a damage-reduction window.
    Sanctuary,
    /// Explosions centred on the enemy closest to the caster.
    Meteor,
    /// Attack boost for the caster plus area strikes.
    Rally,
}

/// Phases of the orchestrated session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Mode selection; no units or economy exist yet.
    Title,
    /// Between waves; allies may be placed and the next wave started.
    Preparation,
    /// A wave is being fought.
    Battle,
    /// Terminal scoring screen after the player castle fell.
    Result,
}

impl GamePhase {
    /// Reports whether viewer commands and placements are accepted.
    #[must_use]
    pub const fn accepts_commands(self) -> bool {
        matches!(self, Self::Preparation | Self::Battle)
    }
}

/// Streaming platform or offline mode a session was started for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Session driven by a YouTube live chat.
    YouTube,
    /// Session driven by a TikTok live.
    TikTok,
    /// Local session without a platform feed.
    Offline,
}

impl GameMode {
    /// Key identifying the per-mode save slot.
    #[must_use]
    pub const fn save_key(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::TikTok => "tiktok",
            Self::Offline => "offline",
        }
    }
}

/// Behavioural stance of an allied unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stance {
    /// Advance and engage.
    Attack,
    /// Retreat to the rear line for a limited time.
    Defend,
}

/// Lifecycle state of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifeState {
    /// Summoned but not yet placed on the field.
    InQueue,
    /// Fighting on the field.
    Active,
    /// Defeated and playing the death sequence.
    Dead,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an entry waiting in the placement queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueTicket(u32);

impl QueueTicket {
    /// Creates a new ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Platform identifier of a viewer. Empty for NPC and shop-bought units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewerId(String);

impl ViewerId {
    /// Wraps the provided platform identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identifier used for units no viewer owns.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(String::new())
    }

    /// Reports whether the identifier is empty.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cosmetic variant chosen when a unit was summoned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Appearance {
    variant: u16,
}

impl Appearance {
    /// Creates an appearance from a palette variant index.
    #[must_use]
    pub const fn new(variant: u16) -> Self {
        Self { variant }
    }

    /// Palette variant index.
    #[must_use]
    pub const fn variant(&self) -> u16 {
        self.variant
    }
}

/// Unit awaiting placement on the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedUnit {
    /// Type of unit that will be created.
    pub kind: UnitType,
    /// Display name of the owner.
    pub owner: String,
    /// Viewer owning the unit, anonymous for shop purchases.
    pub viewer: ViewerId,
    /// Cosmetic appearance preserved through drag and drop.
    pub appearance: Appearance,
}

impl QueuedUnit {
    /// Creates a queue entry.
    #[must_use]
    pub fn new(kind: UnitType, owner: impl Into<String>, viewer: ViewerId) -> Self {
        Self {
            kind,
            owner: owner.into(),
            viewer,
            appearance: Appearance::default(),
        }
    }

    /// Replaces the appearance of the entry.
    #[must_use]
    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }
}

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Corner with the smallest coordinates.
    pub min: Vec2,
    /// Corner with the largest coordinates.
    pub max: Vec2,
}

impl Bounds {
    /// Creates a rectangle from two corners.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clamps the point into the rectangle.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Buff sources that can upgrade a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuffSource {
    /// Channel membership.
    Member,
    /// Paid chat message tier.
    SuperChat,
    /// Gift tier.
    Gift,
    /// Team join level.
    TeamJoin,
    /// Subscription.
    Subscriber,
    /// Global like milestone.
    Milestone,
}

/// Reasons a command was refused. Rejections never mutate the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The command is not accepted in the current phase.
    WrongPhase,
    /// The global ally population cap is reached.
    GlobalCapReached,
    /// The viewer already owns the maximum number of units.
    ViewerCapReached,
    /// The unit type requires a subscription.
    SubscriptionRequired,
    /// Not enough gold for the purchase.
    InsufficientGold,
    /// No living ally is deployed.
    NoLivingAllies,
    /// The viewer owns no living unit.
    NoLivingUnit,
    /// The viewer already used their ultimate this wave.
    UltimateAlreadyUsed,
    /// The viewer's ledger score does not cover the cost.
    InsufficientScore,
    /// The referenced queue entry does not exist.
    QueueEntryMissing,
    /// The requested position cannot hold a unit.
    NotWalkable,
    /// A drag is already in progress, or none is when one is required.
    DragConflict,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the set of rectangles allied units cannot walk through.
    ConfigureTerrain {
        /// Blocked rectangles.
        blocked: Vec<Bounds>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Leaves the title screen for the provided mode.
    SelectMode {
        /// Mode the session runs in.
        mode: GameMode,
    },
    /// Resumes a saved run while preparing the first wave.
    RestoreProgress {
        /// Wave index to continue from.
        wave: u32,
        /// Kills accumulated by the saved run.
        total_kills: u32,
    },
    /// Discards the session and returns to the title screen.
    ResetToTitle,
    /// Starts the current wave.
    StartWave,
    /// Enqueues a unit summoned by chat or a platform event.
    SummonUnit {
        /// Unit to enqueue.
        unit: QueuedUnit,
    },
    /// Enqueues a unit paid for with gold.
    PurchaseUnit {
        /// Unit to enqueue.
        unit: QueuedUnit,
    },
    /// Places a queued unit on the field.
    PlaceQueued {
        /// Entry to place.
        ticket: QueueTicket,
        /// Chosen position, or a randomized walkable one when absent.
        position: Option<Vec2>,
    },
    /// Places every queued unit at randomized walkable positions.
    PlaceAllQueued,
    /// Lifts a queue entry for drag placement.
    BeginDrag {
        /// Entry being dragged.
        ticket: QueueTicket,
    },
    /// Drops the dragged entry at the provided position.
    DropDragged {
        /// Drop position.
        position: Vec2,
    },
    /// Returns the dragged entry to the queue.
    CancelDrag,
    /// Creates an enemy unit on behalf of the wave spawner.
    SpawnEnemy {
        /// Type of enemy.
        kind: UnitType,
        /// Spawn position.
        position: Vec2,
        /// Whether the enemy is a wave boss.
        boss: bool,
        /// Starting level.
        level: u32,
    },
    /// Wave spawner notice that every enemy of the wave was defeated.
    ReportWaveCleared,
    /// Changes the stance of every living ally owned by the viewer.
    SetStance {
        /// Viewer issuing the order.
        viewer: ViewerId,
        /// Requested stance.
        stance: Stance,
    },
    /// Casts the viewer's ultimate with their best living unit.
    CastUltimate {
        /// Viewer casting.
        viewer: ViewerId,
    },
    /// Moves a unit to a new position.
    MoveUnit {
        /// Unit to move.
        unit: UnitId,
        /// Destination after this tick.
        to: Vec2,
    },
    /// Resolves an attack from one unit against an enemy.
    Attack {
        /// Attacking unit.
        attacker: UnitId,
        /// Attacked unit.
        target: UnitId,
    },
    /// Resolves a heal from a healer onto an ally.
    Heal {
        /// Healing unit.
        healer: UnitId,
        /// Healed unit.
        target: UnitId,
    },
    /// Resolves an attack against the opposing castle.
    StrikeCastle {
        /// Attacking unit.
        attacker: UnitId,
    },
    /// Viewer became a channel member.
    GrantMembership {
        /// Viewer receiving the buff.
        viewer: ViewerId,
    },
    /// Viewer sent a paid chat message.
    GrantSuperChat {
        /// Viewer receiving the buff.
        viewer: ViewerId,
        /// Tier resolved from the amount, 0..=4.
        tier: i8,
        /// Paid amount in the platform's minor currency.
        amount: u32,
    },
    /// Viewer sent a gift.
    GrantGift {
        /// Viewer receiving the buff.
        viewer: ViewerId,
        /// Tier resolved from the coin value, 0..=5.
        tier: i8,
        /// Coin value of the gift.
        coins: u32,
    },
    /// Viewer subscribed.
    GrantSubscription {
        /// Viewer receiving the buff.
        viewer: ViewerId,
    },
    /// Viewer joined the streamer's team.
    GrantTeamJoin {
        /// Viewer receiving the buff.
        viewer: ViewerId,
        /// Team level reached.
        level: u8,
    },
    /// The stream reached a like milestone.
    ReachLikeMilestone {
        /// Milestone index; each index applies once.
        index: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the session entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: GamePhase,
    },
    /// Requests enemy spawning for a wave.
    WaveStarted {
        /// Wave index.
        wave: u32,
        /// Whether the wave includes a boss.
        spawn_boss: bool,
    },
    /// Requests a reinforcement-only respawn while the enemy castle stands.
    ReinforcementsRequested {
        /// Wave index.
        wave: u32,
    },
    /// Requests that any pending spawns be dropped.
    SpawningHalted,
    /// Reports that a wave was cleared.
    WaveCleared {
        /// Index of the cleared wave.
        wave: u32,
        /// XP granted to every living ally.
        bonus_xp: u32,
    },
    /// Confirms that a unit entered the placement queue.
    UnitQueued {
        /// Ticket of the new entry.
        ticket: QueueTicket,
        /// Entry contents.
        unit: QueuedUnit,
    },
    /// Reports the queue length after any change.
    QueueChanged {
        /// Entries waiting, excluding a dragged entry.
        queued: usize,
    },
    /// Confirms that a unit was placed on the field.
    UnitDeployed {
        /// Identifier of the new unit.
        unit: UnitId,
        /// Type of the unit.
        kind: UnitType,
        /// Team of the unit.
        team: Team,
        /// Placement position.
        position: Vec2,
    },
    /// Damage was applied to a unit.
    DamageDealt {
        /// Attacking unit.
        attacker: UnitId,
        /// Viewer owning the attacker.
        viewer: ViewerId,
        /// Damaged unit.
        target: UnitId,
        /// Damage after reduction.
        amount: u32,
    },
    /// A heal restored hit points.
    HealPerformed {
        /// Healing unit.
        healer: UnitId,
        /// Viewer owning the healer.
        viewer: ViewerId,
        /// Healed unit.
        target: UnitId,
        /// Hit points restored.
        amount: u32,
    },
    /// A unit was defeated.
    UnitKilled {
        /// Killing unit, if still known.
        killer: Option<UnitId>,
        /// Viewer owning the killer.
        viewer: ViewerId,
        /// Defeated unit.
        victim: UnitId,
        /// Team of the defeated unit.
        victim_team: Team,
    },
    /// A defeated unit finished its death sequence and left the roster.
    UnitRemoved {
        /// Removed unit.
        unit: UnitId,
    },
    /// A unit gained a level.
    LeveledUp {
        /// Unit that levelled.
        unit: UnitId,
        /// New level.
        level: u32,
    },
    /// A boss launched a unit.
    KnockbackLaunched {
        /// Boss performing the knockback.
        attacker: UnitId,
        /// Launched unit.
        target: UnitId,
    },
    /// A homing projectile left its caster.
    ProjectileLaunched {
        /// Casting unit.
        caster: UnitId,
        /// Tracked unit.
        target: UnitId,
    },
    /// A castle took damage.
    CastleDamaged {
        /// Owner of the castle.
        team: Team,
        /// Damage applied.
        amount: u32,
        /// Remaining hit points.
        remaining: u32,
    },
    /// A castle fell.
    CastleDestroyed {
        /// Owner of the castle.
        team: Team,
    },
    /// Gold changed.
    GoldChanged {
        /// Current gold.
        gold: u32,
    },
    /// A buff upgraded a unit.
    BuffApplied {
        /// Upgraded unit.
        unit: UnitId,
        /// Source of the buff.
        source: BuffSource,
    },
    /// A unit's stance changed.
    StanceChanged {
        /// Affected unit.
        unit: UnitId,
        /// New stance.
        stance: Stance,
    },
    /// A viewer cast their ultimate.
    UltimateCast {
        /// Casting viewer.
        viewer: ViewerId,
        /// Unit performing the ability.
        unit: UnitId,
        /// Ability performed.
        kind: UltimateKind,
    },
    /// An ultimate sequence ended, either completed or aborted.
    UltimateFinished {
        /// Unit that performed the ability.
        unit: UnitId,
    },
    /// The match ended with the provided score.
    MatchEnded {
        /// Final score and rank.
        result: stats::FinalScore,
    },
    /// The persisted save for the mode must be discarded.
    SaveInvalidated {
        /// Mode whose save is invalid.
        mode: GameMode,
    },
    /// A command was refused without effect.
    CommandRejected {
        /// Reason for the refusal.
        reason: Rejection,
    },
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Type of the unit.
    pub kind: UnitType,
    /// Team of the unit.
    pub team: Team,
    /// Viewer owning the unit.
    pub viewer: ViewerId,
    /// Current position.
    pub position: Vec2,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Effective attack power including timed modifiers.
    pub attack_power: u32,
    /// Effective damage reduction including timed modifiers.
    pub damage_reduction: f32,
    /// Hit points restored per heal.
    pub heal_amount: u32,
    /// Attack or heal range.
    pub attack_range: f32,
    /// Effective movement speed in units per second.
    pub move_speed: f32,
    /// Current level.
    pub level: u32,
    /// XP toward the next level.
    pub xp: u32,
    /// Current stance.
    pub stance: Stance,
    /// Lifecycle state.
    pub state: LifeState,
    /// Whether the attack cooldown has elapsed.
    pub cooldown_ready: bool,
    /// Whether the unit may target, move, and attack this tick.
    pub can_act: bool,
    /// Whether the unit is a wave boss.
    pub boss: bool,
    /// Cosmetic size multiplier.
    pub size_scale: f32,
    /// Cosmetic appearance chosen at summon time.
    pub appearance: Appearance,
    /// Whether the rainbow cosmetic is unlocked.
    pub rainbow: bool,
}

impl UnitSnapshot {
    /// Hit points missing from the maximum.
    #[must_use]
    pub const fn missing_hp(&self) -> u32 {
        self.max_hp.saturating_sub(self.hp)
    }

    /// Reports whether the unit is on the field and alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == LifeState::Active && self.hp > 0
    }
}

/// Read-only snapshot describing every unit on the field in roster order.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in roster order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a castle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastleSnapshot {
    /// Team owning the castle.
    pub team: Team,
    /// Centre of the castle.
    pub position: Vec2,
    /// Radius units must reach to strike the castle.
    pub radius: f32,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
}

/// Target chosen for a unit during the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTarget {
    /// Acting unit.
    pub unit: UnitId,
    /// Selected enemy, or ally for healers.
    pub target: UnitId,
    /// Distance between the two units.
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_normalise_corners_and_clamp() {
        let bounds = Bounds::new(Vec2::new(10.0, 4.0), Vec2::new(0.0, 0.0));
        assert_eq!(bounds.min, Vec2::new(0.0, 0.0));
        assert_eq!(bounds.max, Vec2::new(10.0, 4.0));
        assert_eq!(bounds.clamp(Vec2::new(12.0, -3.0)), Vec2::new(10.0, 0.0));
        assert!(bounds.contains(Vec2::new(10.0, 4.0)));
        assert!(!bounds.contains(Vec2::new(10.1, 4.0)));
    }

    #[test]
    fn only_knights_require_subscription() {
        let gated: Vec<UnitType> = UnitType::ALL
            .into_iter()
            .filter(|kind| kind.requires_subscription())
            .collect();
        assert_eq!(gated, vec![UnitType::Knight]);
    }

    #[test]
    fn unit_view_lookup_follows_identifier_order() {
        let view = UnitView::from_snapshots(vec![snapshot(7), snapshot(2), snapshot(4)]);
        let order: Vec<u32> = view.iter().map(|unit| unit.id.get()).collect();
        assert_eq!(order, vec![2, 4, 7]);
        assert_eq!(view.get(UnitId::new(4)).map(|unit| unit.id), Some(UnitId::new(4)));
        assert!(view.get(UnitId::new(5)).is_none());
    }

    #[test]
    fn commands_are_only_accepted_between_title_and_result() {
        assert!(!GamePhase::Title.accepts_commands());
        assert!(GamePhase::Preparation.accepts_commands());
        assert!(GamePhase::Battle.accepts_commands());
        assert!(!GamePhase::Result.accepts_commands());
    }

    fn snapshot(id: u32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: UnitType::Warrior,
            team: Team::Ally,
            viewer: ViewerId::anonymous(),
            position: Vec2::ZERO,
            hp: 10,
            max_hp: 10,
            attack_power: 1,
            damage_reduction: 0.0,
            heal_amount: 0,
            attack_range: 1.0,
            move_speed: 1.0,
            level: 1,
            xp: 0,
            stance: Stance::Attack,
            state: LifeState::Active,
            cooldown_ready: true,
            can_act: true,
            boss: false,
            size_scale: 1.0,
            appearance: Appearance::default(),
            rainbow: false,
        }
    }
}
