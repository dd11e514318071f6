#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state management for Fleetcrawl.
//!
//! A [`Run`] is mutated exclusively through [`apply`], one command at a time,
//! by a single logical thread of control. Resolution itself is delegated to
//! the pure gate-resolution system; this crate owns the progression state
//! machine, the pick mailboxes, the append-only reward ledger, and the
//! integrity digest.

use std::num::NonZeroU32;

use fleetcrawl_core::{
    BoonCatalog, BoonChoice, BoonGod, Command, EntryError, Event, GateOption, PickError,
    RewardGrant, RewardKind, RoomIndex, RoomKind, RunConfig, RunSeed, Tick, BOON_OFFER_COUNT,
};
use fleetcrawl_system_gate_resolution as resolution;

const DIGEST_SEED_SALT_A: u32 = 0x9E37_79B9;
const DIGEST_SEED_SALT_B: u32 = 0x85EB_CA6B;
const DIGEST_SEED_SALT_C: u32 = 0xC2B2_AE35;

const MONEY_BASE_AMOUNT: u32 = 20;
const MONEY_ROLL_SPAN: u32 = 31;

/// Represents one seeded play-through and its progression state.
#[derive(Debug)]
pub struct Run {
    seed: RunSeed,
    boss_every_rooms: NonZeroU32,
    rooms_until_boss: u32,
    room_index: RoomIndex,
    digest: u32,
    credits: u32,
    upgrade_points: u32,
    relief_count: u32,
    ledger: RewardLedger,
    boon_choices: Vec<BoonChoice>,
    catalog: BoonCatalog,
    bag_template: Vec<RewardKind>,
    room: Room,
    phase: Phase,
    pending_gate_pick: Option<u32>,
    pending_boon_pick: Option<u32>,
}

impl Run {
    /// Creates a new run from explicit configuration, entering room zero.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let seed = config.seed();
        let boss_every_rooms = config.boss_every_rooms();
        let bag_template = config.reward_bag().to_vec();

        // Room zero passes through the same countdown as every later room,
        // so a cadence of one opens directly on a boss.
        let rooms_until_boss = boss_every_rooms.get().saturating_sub(1);
        let opening_kind = if rooms_until_boss == 0 {
            RoomKind::Boss
        } else {
            RoomKind::Combat
        };

        Self {
            seed,
            boss_every_rooms,
            rooms_until_boss,
            room_index: RoomIndex::new(0),
            digest: resolution::mix(
                seed.get(),
                DIGEST_SEED_SALT_A,
                DIGEST_SEED_SALT_B,
                DIGEST_SEED_SALT_C,
            ),
            credits: 0,
            upgrade_points: 0,
            relief_count: 0,
            ledger: RewardLedger::default(),
            boon_choices: Vec::new(),
            catalog: config.catalog().clone(),
            room: Room::new(opening_kind, Tick::ZERO, bag_template.clone()),
            bag_template,
            phase: Phase::InRoom,
            pending_gate_pick: None,
            pending_boon_pick: None,
        }
    }

    fn complete_room(&mut self, tick: Tick, out_events: &mut Vec<Event>) {
        if self.phase != Phase::InRoom || self.room.completed {
            return;
        }

        self.room.completed = true;
        self.room.end_tick = Some(tick);

        let options = resolution::generate_gate_options(
            self.seed,
            self.room_index,
            self.room.kind,
            &mut self.room.reward_bag,
            &self.bag_template,
        );
        for option in &options {
            self.digest = resolution::mix(
                self.digest,
                option.reward_kind().index(),
                god_digest_index(option.god()),
                option.roll_salt(),
            );
        }

        self.room.gate_options = options.clone();
        self.phase = Phase::GateOpen;

        out_events.push(Event::RoomCompleted {
            room_index: self.room_index,
            kind: self.room.kind,
            tick,
        });
        out_events.push(Event::GateOpened {
            room_index: self.room_index,
            kind: self.room.kind,
            options,
        });
    }

    fn queue_gate_pick(&mut self, index: u32, out_events: &mut Vec<Event>) {
        let reason = if self.phase != Phase::GateOpen {
            Some(PickError::GateClosed)
        } else if index as usize >= self.room.gate_options.len() {
            Some(PickError::OutOfRange)
        } else if self.pending_gate_pick.is_some() {
            Some(PickError::AlreadyPending)
        } else {
            None
        };

        match reason {
            Some(reason) => out_events.push(Event::GatePickRejected { index, reason }),
            None => self.pending_gate_pick = Some(index),
        }
    }

    fn queue_boon_pick(&mut self, index: u32, out_events: &mut Vec<Event>) {
        let reason = if !matches!(self.phase, Phase::BoonOffer { .. }) {
            Some(PickError::NoOfferOpen)
        } else if index >= BOON_OFFER_COUNT {
            Some(PickError::OutOfRange)
        } else if self.pending_boon_pick.is_some() {
            Some(PickError::AlreadyPending)
        } else {
            None
        };

        match reason {
            Some(reason) => out_events.push(Event::BoonPickRejected { index, reason }),
            None => self.pending_boon_pick = Some(index),
        }
    }

    fn step(&mut self, tick: Tick, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { tick });

        match self.phase {
            Phase::GateOpen => self.consume_gate_pick(tick, out_events),
            Phase::BoonOffer { .. } => self.consume_boon_pick(tick, out_events),
            Phase::InRoom | Phase::Cleared => {}
        }
    }

    fn consume_gate_pick(&mut self, tick: Tick, out_events: &mut Vec<Event>) {
        let Some(index) = self.pending_gate_pick.take() else {
            return;
        };
        let Some(option) = self.room.gate_options.get(index as usize).copied() else {
            debug_assert!(false, "queued pick must lie within the gate options");
            return;
        };

        self.digest = resolution::mix(
            self.digest,
            self.room_index.get().wrapping_add(1),
            index,
            option.reward_kind().index(),
        );

        match option {
            GateOption::Boon { god, .. } => {
                self.phase = Phase::BoonOffer {
                    picked_index: index,
                    god,
                };
                out_events.push(Event::BoonOffersPresented {
                    room_index: self.room_index,
                    god,
                    offer_count: BOON_OFFER_COUNT,
                });
            }
            GateOption::Money { roll_salt } => {
                let amount = MONEY_BASE_AMOUNT + roll_salt % MONEY_ROLL_SPAN;
                self.grant_reward(RewardKind::Money, None, amount, tick, index, out_events);
                self.clear_and_advance(tick, out_events);
            }
            GateOption::Upgrade { .. } => {
                self.grant_reward(RewardKind::Upgrade, None, 1, tick, index, out_events);
                self.clear_and_advance(tick, out_events);
            }
            GateOption::Relief { .. } => {
                self.grant_reward(RewardKind::ReliefNode, None, 1, tick, index, out_events);
                self.clear_and_advance(tick, out_events);
            }
        }
    }

    fn consume_boon_pick(&mut self, tick: Tick, out_events: &mut Vec<Event>) {
        let Phase::BoonOffer { picked_index, god } = self.phase else {
            return;
        };
        let Some(offer_index) = self.pending_boon_pick.take() else {
            return;
        };

        let boon = resolution::resolve_boon_offer_at(
            &self.catalog,
            self.seed,
            self.room_index,
            offer_index,
        )
        .clone();
        self.digest = resolution::mix(
            self.digest,
            offer_index,
            resolution::hash_ident(boon.as_str()),
            tick.get(),
        );

        let choice = BoonChoice { god, boon };
        self.boon_choices.push(choice.clone());
        out_events.push(Event::BoonChosen {
            room_index: self.room_index,
            choice,
            offer_index,
            tick,
        });

        self.grant_reward(RewardKind::Boon, Some(god), 0, tick, picked_index, out_events);
        self.clear_and_advance(tick, out_events);
    }

    fn grant_reward(
        &mut self,
        reward: RewardKind,
        god: Option<BoonGod>,
        amount: u32,
        tick: Tick,
        picked_index: u32,
        out_events: &mut Vec<Event>,
    ) {
        match reward {
            RewardKind::Boon => {}
            RewardKind::Money => self.credits = self.credits.saturating_add(amount),
            RewardKind::Upgrade => {
                self.upgrade_points = self.upgrade_points.saturating_add(amount);
            }
            RewardKind::ReliefNode => self.relief_count = self.relief_count.saturating_add(amount),
        }

        let grant = RewardGrant {
            room_index: self.room_index,
            reward,
            god,
            amount,
            tick,
        };
        self.ledger.append(grant.clone());
        self.digest = resolution::mix(self.digest, god_digest_index(god), amount, tick.get());
        out_events.push(Event::RewardApplied {
            grant,
            picked_index,
        });
    }

    fn clear_and_advance(&mut self, tick: Tick, out_events: &mut Vec<Event>) {
        self.pending_gate_pick = None;
        self.pending_boon_pick = None;

        let cleared_index = self.room_index;
        if self.room.kind.is_boss() {
            self.rooms_until_boss = self.boss_every_rooms.get();
        }
        self.room_index = self.room_index.next();
        self.phase = Phase::Cleared;

        out_events.push(Event::RoomCleared {
            room_index: cleared_index,
            tick,
            next_is_boss: self.rooms_until_boss == 1,
        });
    }

    fn enter_room(&mut self, kind: RoomKind, tick: Tick, out_events: &mut Vec<Event>) {
        let reason = if self.phase != Phase::Cleared {
            Some(EntryError::RoomActive)
        } else if kind.is_boss() {
            Some(EntryError::OffCadenceBoss)
        } else {
            None
        };
        if let Some(reason) = reason {
            out_events.push(Event::RoomEntryRejected { kind, reason });
            return;
        }

        self.rooms_until_boss = self.rooms_until_boss.saturating_sub(1);
        let kind = if self.rooms_until_boss == 0 {
            RoomKind::Boss
        } else {
            kind
        };

        self.room = Room::new(kind, tick, self.bag_template.clone());
        self.phase = Phase::InRoom;
        out_events.push(Event::RoomEntered {
            room_index: self.room_index,
            kind,
            tick,
        });
    }
}

/// Applies the provided command to the run, mutating state deterministically.
pub fn apply(run: &mut Run, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { tick } => run.step(tick, out_events),
        Command::CompleteRoom { tick } => run.complete_room(tick, out_events),
        Command::ChooseGate { index } => run.queue_gate_pick(index, out_events),
        Command::ChooseBoonOffer { index } => run.queue_boon_pick(index, out_events),
        Command::EnterRoom { kind, tick } => run.enter_room(kind, tick, out_events),
    }
}

/// Append-only audit trail of every reward granted to a run.
///
/// Entries are never mutated, reordered, or truncated after being appended;
/// replaying the same command script from scratch reproduces the same log.
#[derive(Debug, Default)]
pub struct RewardLedger {
    entries: Vec<RewardGrant>,
}

impl RewardLedger {
    fn append(&mut self, grant: RewardGrant) {
        self.entries.push(grant);
    }

    /// Immutable view of the ledger entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[RewardGrant] {
        &self.entries
    }

    /// Number of grants ever applied to the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether any reward has been granted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sums the granted amounts of the provided reward kind.
    #[must_use]
    pub fn total_amount(&self, reward: RewardKind) -> u32 {
        self.entries
            .iter()
            .filter(|grant| grant.reward == reward)
            .fold(0, |sum, grant| sum.saturating_add(grant.amount))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    InRoom,
    GateOpen,
    BoonOffer { picked_index: u32, god: BoonGod },
    Cleared,
}

#[derive(Clone, Debug)]
struct Room {
    kind: RoomKind,
    start_tick: Tick,
    end_tick: Option<Tick>,
    completed: bool,
    reward_bag: Vec<RewardKind>,
    gate_options: Vec<GateOption>,
}

impl Room {
    fn new(kind: RoomKind, start_tick: Tick, reward_bag: Vec<RewardKind>) -> Self {
        Self {
            kind,
            start_tick,
            end_tick: None,
            completed: false,
            reward_bag,
            gate_options: Vec::new(),
        }
    }
}

/// Query functions that provide read-only access to the run state.
pub mod query {
    use super::{Phase, RewardLedger, Run};
    use fleetcrawl_core::{BoonChoice, GateOption, RoomIndex, RoomKind, RunSeed, Tick};

    /// Seed the run was created with.
    #[must_use]
    pub fn seed(run: &Run) -> RunSeed {
        run.seed
    }

    /// Captures a read-only snapshot of the run's progression counters.
    #[must_use]
    pub fn progress(run: &Run) -> RunProgress {
        RunProgress {
            room_index: run.room_index,
            boss_every_rooms: run.boss_every_rooms.get(),
            rooms_until_boss: run.rooms_until_boss,
            awaiting_gate_resolve: matches!(run.phase, Phase::GateOpen | Phase::BoonOffer { .. }),
            digest: run.digest,
        }
    }

    /// Captures a read-only snapshot of the run's accrued resources.
    #[must_use]
    pub fn resources(run: &Run) -> Resources {
        Resources {
            credits: run.credits,
            upgrade_points: run.upgrade_points,
            relief_count: run.relief_count,
        }
    }

    /// Provides read-only access to the append-only reward ledger.
    #[must_use]
    pub fn reward_ledger(run: &Run) -> &RewardLedger {
        &run.ledger
    }

    /// Boon selections accumulated by the run, in pick order.
    #[must_use]
    pub fn boon_choices(run: &Run) -> &[BoonChoice] {
        &run.boon_choices
    }

    /// Gate menu of the current room; empty until the room completes.
    #[must_use]
    pub fn gate_options(run: &Run) -> &[GateOption] {
        &run.room.gate_options
    }

    /// Captures a read-only snapshot of the current room.
    #[must_use]
    pub fn room(run: &Run) -> RoomSnapshot {
        RoomSnapshot {
            kind: run.room.kind,
            start_tick: run.room.start_tick,
            end_tick: run.room.end_tick,
            completed: run.room.completed,
        }
    }

    /// Read-only snapshot of a run's progression counters.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RunProgress {
        /// Index of the room currently in progress or awaiting entry.
        pub room_index: RoomIndex,
        /// Configured boss cadence in rooms.
        pub boss_every_rooms: u32,
        /// Rooms remaining until the cadence forces a boss.
        pub rooms_until_boss: u32,
        /// True exactly while a completed room's gate awaits resolution.
        pub awaiting_gate_resolve: bool,
        /// Running checksum over every resolved offer and applied reward.
        pub digest: u32,
    }

    /// Read-only snapshot of a run's accrued resources.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Resources {
        /// Credits granted by money rewards.
        pub credits: u32,
        /// Points granted by upgrade rewards.
        pub upgrade_points: u32,
        /// Tokens granted by relief rewards.
        pub relief_count: u32,
    }

    /// Read-only snapshot of the run's current room.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RoomSnapshot {
        /// Kind the room was created with.
        pub kind: RoomKind,
        /// Clock stamp at which the room opened.
        pub start_tick: Tick,
        /// Clock stamp at which the room completed, if it has.
        pub end_tick: Option<Tick>,
        /// Whether the room's end condition has been met.
        pub completed: bool,
    }
}

const fn god_digest_index(god: Option<BoonGod>) -> u32 {
    match god {
        None => 0,
        Some(god) => god.index() + 1,
    }
}
