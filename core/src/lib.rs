#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fleetcrawl engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative run, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the run executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of offers presented when a boon gate is picked.
pub const BOON_OFFER_COUNT: u32 = 3;

/// Reward kinds placed into a freshly entered room's bag when no explicit
/// template is configured.
pub const DEFAULT_REWARD_BAG: [RewardKind; 7] = [
    RewardKind::Boon,
    RewardKind::Money,
    RewardKind::Upgrade,
    RewardKind::ReliefNode,
    RewardKind::Boon,
    RewardKind::Money,
    RewardKind::Upgrade,
];

/// Commands that express all permissible run mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the engine one step, consuming any pending pick.
    Tick {
        /// Clock stamp supplied by the owning simulation for this step.
        tick: Tick,
    },
    /// Marks the active room as finished; the end condition itself (combat
    /// resolved, timer elapsed) is owned by the excluded simulation.
    CompleteRoom {
        /// Clock stamp at which the room's end condition was met.
        tick: Tick,
    },
    /// Writes a gate pick into the run's single-slot mailbox.
    ChooseGate {
        /// Zero-based index into the open gate's option list.
        index: u32,
    },
    /// Writes a boon offer pick into the run's single-slot mailbox.
    ChooseBoonOffer {
        /// Zero-based index into the presented boon offers.
        index: u32,
    },
    /// Proposes the next room once the previous one has been cleared.
    EnterRoom {
        /// Requested room kind; Combat or Relief only, since the boss
        /// cadence is owned by the run itself.
        kind: RoomKind,
        /// Clock stamp at which the room opens.
        tick: Tick,
    },
}

/// Events broadcast by the run after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the engine clock advanced by one step.
    TimeAdvanced {
        /// Clock stamp carried by the step.
        tick: Tick,
    },
    /// Confirms that the active room finished and its gate is about to open.
    RoomCompleted {
        /// Index of the room that finished.
        room_index: RoomIndex,
        /// Kind of the room that finished.
        kind: RoomKind,
        /// Clock stamp recorded as the room's end tick.
        tick: Tick,
    },
    /// Announces the resolved gate menu for a completed room.
    GateOpened {
        /// Index of the room whose gate opened.
        room_index: RoomIndex,
        /// Kind of the room whose gate opened.
        kind: RoomKind,
        /// Concrete menu of choices, in presentation order.
        options: Vec<GateOption>,
    },
    /// Reports that a gate pick write was rejected.
    GatePickRejected {
        /// Index supplied by the rejected write.
        index: u32,
        /// Specific reason the write failed.
        reason: PickError,
    },
    /// Announces the boon offers that follow a picked boon gate.
    BoonOffersPresented {
        /// Index of the room presenting the offers.
        room_index: RoomIndex,
        /// God whose boons are on offer.
        god: BoonGod,
        /// Number of offers presented.
        offer_count: u32,
    },
    /// Reports that a boon offer pick write was rejected.
    BoonPickRejected {
        /// Index supplied by the rejected write.
        index: u32,
        /// Specific reason the write failed.
        reason: PickError,
    },
    /// Confirms that a picked gate option was granted and ledgered.
    RewardApplied {
        /// Ledger entry appended for the grant.
        grant: RewardGrant,
        /// Gate option index the grant was derived from.
        picked_index: u32,
    },
    /// Confirms that a boon offer was resolved into a permanent choice.
    BoonChosen {
        /// Index of the room the choice was made in.
        room_index: RoomIndex,
        /// The selection appended to the run's boon choices.
        choice: BoonChoice,
        /// Offer index the selection was derived from.
        offer_index: u32,
        /// Clock stamp of the consuming engine step.
        tick: Tick,
    },
    /// Announces that a room is fully resolved and the run awaits entry.
    RoomCleared {
        /// Index of the cleared room.
        room_index: RoomIndex,
        /// Clock stamp of the consuming engine step.
        tick: Tick,
        /// Whether the boss cadence forces the next room to be a boss.
        next_is_boss: bool,
    },
    /// Confirms that the next room was created.
    RoomEntered {
        /// Index assigned to the new room.
        room_index: RoomIndex,
        /// Kind the room was created with, after cadence enforcement.
        kind: RoomKind,
        /// Clock stamp recorded as the room's start tick.
        tick: Tick,
    },
    /// Reports that a room entry proposal was rejected.
    RoomEntryRejected {
        /// Kind supplied by the rejected proposal.
        kind: RoomKind,
        /// Specific reason the proposal failed.
        reason: EntryError,
    },
}

/// Discrete simulation clock stamp owned by the external tick subsystem.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tick(u32);

impl Tick {
    /// Clock origin used for freshly created runs.
    pub const ZERO: Tick = Tick(0);

    /// Creates a clock stamp from a raw tick count.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw tick count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the stamp advanced by `ticks`, saturating at the maximum.
    #[must_use]
    pub const fn saturating_add(self, ticks: u32) -> Self {
        Self(self.0.saturating_add(ticks))
    }
}

/// Immutable seed that is the sole source of a run's pseudo-randomness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunSeed(u32);

impl RunSeed {
    /// Creates a run seed from a raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw seed value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based index of a room within a run; monotonically non-decreasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomIndex(u32);

impl RoomIndex {
    /// Creates a room index from a raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw index value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the room that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Kinds of rooms a run progresses through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// Standard encounter room with hostile waves.
    Combat,
    /// Low-intensity room with a reduced gate.
    Relief,
    /// Cadence-forced boss encounter.
    Boss,
}

impl RoomKind {
    /// Reports whether the room is a boss encounter.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        matches!(self, Self::Boss)
    }
}

/// Thematic kinds a gate slot can present, indexed by slot ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Gate leading to a god's boon offers.
    Boon,
    /// Gate leading to a blueprint reward.
    Blueprint,
    /// Gate leading to a relief reward.
    Relief,
}

impl GateKind {
    /// Stable numeric discriminant used in salted hash derivations.
    #[must_use]
    pub const fn index(&self) -> u32 {
        match self {
            Self::Boon => 0,
            Self::Blueprint => 1,
            Self::Relief => 2,
        }
    }
}

/// Reward categories a gate option can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    /// Permanent run-scoped buff choice.
    Boon,
    /// Credits added to the run's currency.
    Money,
    /// One upgrade point.
    Upgrade,
    /// One relief token.
    ReliefNode,
}

impl RewardKind {
    /// Stable numeric discriminant used in digest folds.
    #[must_use]
    pub const fn index(&self) -> u32 {
        match self {
            Self::Boon => 0,
            Self::Money => 1,
            Self::Upgrade => 2,
            Self::ReliefNode => 3,
        }
    }
}

/// Thematic god grouping a boon belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoonGod {
    /// Defensive boons.
    Athena,
    /// Aggression boons.
    Ares,
    /// Precision boons.
    Artemis,
    /// Mobility boons.
    Hermes,
    /// Fleet boons.
    Poseidon,
    /// Storm boons.
    Zeus,
}

impl BoonGod {
    /// Number of gods in the pantheon.
    pub const COUNT: u32 = 6;

    /// Stable numeric discriminant used in salted hash derivations.
    #[must_use]
    pub const fn index(&self) -> u32 {
        match self {
            Self::Athena => 0,
            Self::Ares => 1,
            Self::Artemis => 2,
            Self::Hermes => 3,
            Self::Poseidon => 4,
            Self::Zeus => 5,
        }
    }

    /// Maps a rotation index onto the pantheon; indices past the table fold
    /// onto the final god.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Athena,
            1 => Self::Ares,
            2 => Self::Artemis,
            3 => Self::Hermes,
            4 => Self::Poseidon,
            _ => Self::Zeus,
        }
    }
}

/// Identifier naming one boon in the configured catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoonId(String);

impl BoonId {
    /// Creates a boon identifier from a raw name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed, versionable ordered table of boon identifiers supplied at run
/// creation. The excluded content system owns what each identifier means;
/// this core only reproduces selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoonCatalog {
    entries: [BoonId; Self::LEN],
}

impl BoonCatalog {
    /// Number of identifiers in a catalog.
    pub const LEN: usize = 4;

    /// Creates a catalog from an ordered identifier table.
    #[must_use]
    pub const fn new(entries: [BoonId; Self::LEN]) -> Self {
        Self { entries }
    }

    /// Retrieves the identifier at the provided rotation slot.
    #[must_use]
    pub fn entry(&self, index: usize) -> &BoonId {
        &self.entries[index % Self::LEN]
    }
}

impl Default for BoonCatalog {
    fn default() -> Self {
        Self::new([
            BoonId::new("chain_lightning"),
            BoonId::new("missile_volley"),
            BoonId::new("boost_cooldown"),
            BoonId::new("shield_regen"),
        ])
    }
}

/// Concrete, already-resolved choice offered by a room's gate.
///
/// The payload is typed per reward kind so that a boon offer without a god
/// cannot be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateOption {
    /// Offers the boons of one god.
    Boon {
        /// God whose boons the gate leads to.
        god: BoonGod,
        /// Salt recorded at generation time; feeds amount rolls and digests.
        roll_salt: u32,
    },
    /// Offers a credit payout.
    Money {
        /// Salt recorded at generation time; feeds amount rolls and digests.
        roll_salt: u32,
    },
    /// Offers an upgrade point.
    Upgrade {
        /// Salt recorded at generation time; feeds amount rolls and digests.
        roll_salt: u32,
    },
    /// Offers a relief token.
    Relief {
        /// Salt recorded at generation time; feeds amount rolls and digests.
        roll_salt: u32,
    },
}

impl GateOption {
    /// Reward category the option grants when picked.
    #[must_use]
    pub const fn reward_kind(&self) -> RewardKind {
        match self {
            Self::Boon { .. } => RewardKind::Boon,
            Self::Money { .. } => RewardKind::Money,
            Self::Upgrade { .. } => RewardKind::Upgrade,
            Self::Relief { .. } => RewardKind::ReliefNode,
        }
    }

    /// God attached to the option, present only for boon offers.
    #[must_use]
    pub const fn god(&self) -> Option<BoonGod> {
        match self {
            Self::Boon { god, .. } => Some(*god),
            _ => None,
        }
    }

    /// Salt recorded when the option was generated.
    #[must_use]
    pub const fn roll_salt(&self) -> u32 {
        match self {
            Self::Boon { roll_salt, .. }
            | Self::Money { roll_salt }
            | Self::Upgrade { roll_salt }
            | Self::Relief { roll_salt } => *roll_salt,
        }
    }
}

/// Ledger entry recording one applied reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGrant {
    /// Room the reward was granted in.
    pub room_index: RoomIndex,
    /// Category of the granted reward.
    pub reward: RewardKind,
    /// God attached to the grant, present only for boon grants.
    pub god: Option<BoonGod>,
    /// Magnitude of the grant; zero for boon grants.
    pub amount: u32,
    /// Clock stamp of the engine step that applied the grant.
    pub tick: Tick,
}

/// Permanent boon selection accumulated by a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoonChoice {
    /// God the boon belongs to.
    pub god: BoonGod,
    /// Identifier of the chosen boon.
    pub boon: BoonId,
}

/// Explicit configuration captured at run creation; the core never reads
/// ambient process state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    seed: RunSeed,
    boss_every_rooms: NonZeroU32,
    catalog: BoonCatalog,
    reward_bag: Vec<RewardKind>,
}

impl RunConfig {
    /// Creates a configuration with the default reward bag template.
    #[must_use]
    pub fn new(seed: RunSeed, boss_every_rooms: NonZeroU32, catalog: BoonCatalog) -> Self {
        Self {
            seed,
            boss_every_rooms,
            catalog,
            reward_bag: DEFAULT_REWARD_BAG.to_vec(),
        }
    }

    /// Replaces the reward bag template cloned into each entered room.
    #[must_use]
    pub fn with_reward_bag(mut self, reward_bag: Vec<RewardKind>) -> Self {
        self.reward_bag = reward_bag;
        self
    }

    /// Seed the run derives every pseudo-random decision from.
    #[must_use]
    pub const fn seed(&self) -> RunSeed {
        self.seed
    }

    /// Boss cadence measured in rooms.
    #[must_use]
    pub const fn boss_every_rooms(&self) -> NonZeroU32 {
        self.boss_every_rooms
    }

    /// Boon catalog selections are resolved against.
    #[must_use]
    pub const fn catalog(&self) -> &BoonCatalog {
        &self.catalog
    }

    /// Reward bag template cloned into each entered room.
    #[must_use]
    pub fn reward_bag(&self) -> &[RewardKind] {
        &self.reward_bag
    }
}

/// Reasons a pick mailbox write may be rejected by the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PickError {
    /// No gate is currently open, so a gate pick has nothing to target.
    #[error("no gate is open")]
    GateClosed,
    /// No boon offers are currently presented.
    #[error("no boon offers are presented")]
    NoOfferOpen,
    /// The supplied index lies outside the presented options.
    #[error("pick index out of range")]
    OutOfRange,
    /// An earlier pick is still waiting to be consumed.
    #[error("a pick is already pending")]
    AlreadyPending,
}

/// Reasons a room entry proposal may be rejected by the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum EntryError {
    /// The current room has not been cleared yet.
    #[error("a room is still active")]
    RoomActive,
    /// Boss rooms are created by cadence only, never by proposal.
    #[error("boss rooms cannot be proposed")]
    OffCadenceBoss,
}

#[cfg(test)]
mod tests {
    use super::{
        BoonCatalog, BoonGod, BoonId, EntryError, GateOption, PickError, RewardGrant, RewardKind,
        RoomIndex, RoomKind, RunSeed, Tick,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tick_round_trips_through_bincode() {
        assert_round_trip(&Tick::new(42));
    }

    #[test]
    fn gate_option_round_trips_through_bincode() {
        assert_round_trip(&GateOption::Boon {
            god: BoonGod::Artemis,
            roll_salt: 0xA102_1042,
        });
        assert_round_trip(&GateOption::Money { roll_salt: 7 });
    }

    #[test]
    fn reward_grant_round_trips_through_bincode() {
        assert_round_trip(&RewardGrant {
            room_index: RoomIndex::new(3),
            reward: RewardKind::Money,
            god: None,
            amount: 35,
            tick: Tick::new(960),
        });
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PickError::OutOfRange);
        assert_round_trip(&EntryError::OffCadenceBoss);
    }

    #[test]
    fn catalog_round_trips_through_bincode() {
        assert_round_trip(&BoonCatalog::default());
    }

    #[test]
    fn tick_saturates_instead_of_wrapping() {
        assert_eq!(Tick::new(u32::MAX).saturating_add(5), Tick::new(u32::MAX));
        assert_eq!(Tick::ZERO.saturating_add(3), Tick::new(3));
    }

    #[test]
    fn god_rotation_covers_pantheon_and_folds_overflow() {
        let gods: Vec<BoonGod> = (0..BoonGod::COUNT).map(BoonGod::from_index).collect();
        for (index, god) in gods.iter().enumerate() {
            assert_eq!(god.index(), index as u32);
        }
        assert_eq!(BoonGod::from_index(17), BoonGod::Zeus);
    }

    #[test]
    fn catalog_entry_wraps_past_table_length() {
        let catalog = BoonCatalog::default();
        assert_eq!(catalog.entry(0), catalog.entry(BoonCatalog::LEN));
    }

    #[test]
    fn gate_option_reward_kinds_match_variants() {
        let boon = GateOption::Boon {
            god: BoonGod::Zeus,
            roll_salt: 1,
        };
        assert_eq!(boon.reward_kind(), RewardKind::Boon);
        assert_eq!(boon.god(), Some(BoonGod::Zeus));
        let relief = GateOption::Relief { roll_salt: 9 };
        assert_eq!(relief.reward_kind(), RewardKind::ReliefNode);
        assert_eq!(relief.god(), None);
    }

    #[test]
    fn room_index_advances_monotonically() {
        let index = RoomIndex::new(4);
        assert_eq!(index.next(), RoomIndex::new(5));
        assert!(RoomKind::Boss.is_boss());
        assert_eq!(RunSeed::new(9).get(), 9);
        assert_eq!(BoonId::new("surge").as_str(), "surge");
    }
}
