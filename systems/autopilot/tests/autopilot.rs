use std::num::NonZeroU32;

use fleetcrawl_core::{
    BoonCatalog, BoonGod, Command, Event, GateOption, RoomIndex, RoomKind, RunConfig, RunSeed,
    Tick, BOON_OFFER_COUNT,
};
use fleetcrawl_run::{self as run, query, Run};
use fleetcrawl_system_autopilot::{Autopilot, Config};

fn gate_opened(room: u32) -> Event {
    Event::GateOpened {
        room_index: RoomIndex::new(room),
        kind: RoomKind::Combat,
        options: vec![
            GateOption::Boon {
                god: BoonGod::Zeus,
                roll_salt: 1,
            },
            GateOption::Money { roll_salt: 2 },
            GateOption::Upgrade { roll_salt: 3 },
        ],
    }
}

fn time_advanced(tick: u32) -> Event {
    Event::TimeAdvanced {
        tick: Tick::new(tick),
    }
}

#[test]
fn emits_resolver_pick_after_patience_window() {
    let mut autopilot = Autopilot::new(Config::new(RunSeed::new(42), 2));
    let mut commands = Vec::new();

    autopilot.handle(&[gate_opened(0)], &mut commands);
    assert!(commands.is_empty(), "must wait out the patience window");

    autopilot.handle(&[time_advanced(1)], &mut commands);
    assert!(commands.is_empty(), "one tick is not enough at patience two");

    autopilot.handle(&[time_advanced(2)], &mut commands);
    // Auto gate ordinal for seed 42, room 0, three gates is pinned at 0.
    assert_eq!(commands, vec![Command::ChooseGate { index: 0 }]);

    commands.clear();
    autopilot.handle(&[time_advanced(3)], &mut commands);
    assert!(commands.is_empty(), "a decision is emitted exactly once");
}

#[test]
fn zero_patience_resolves_on_the_opening_event() {
    let mut autopilot = Autopilot::new(Config::new(RunSeed::new(42), 0));
    let mut commands = Vec::new();

    autopilot.handle(&[gate_opened(0)], &mut commands);
    assert_eq!(commands, vec![Command::ChooseGate { index: 0 }]);
}

#[test]
fn boon_offers_resolve_to_the_auto_offer_index() {
    let mut autopilot = Autopilot::new(Config::new(RunSeed::new(42), 0));
    let mut commands = Vec::new();

    autopilot.handle(
        &[Event::BoonOffersPresented {
            room_index: RoomIndex::new(0),
            god: BoonGod::Zeus,
            offer_count: BOON_OFFER_COUNT,
        }],
        &mut commands,
    );
    // Auto offer index for seed 42, room 0, boon gate is pinned at 0.
    assert_eq!(commands, vec![Command::ChooseBoonOffer { index: 0 }]);
}

#[test]
fn interactive_resolution_disarms_the_fallback() {
    let mut autopilot = Autopilot::new(Config::new(RunSeed::new(42), 3));
    let mut commands = Vec::new();

    autopilot.handle(&[gate_opened(0)], &mut commands);
    autopilot.handle(
        &[Event::RoomCleared {
            room_index: RoomIndex::new(0),
            tick: Tick::new(5),
            next_is_boss: false,
        }],
        &mut commands,
    );
    autopilot.handle(
        &[time_advanced(6), time_advanced(7), time_advanced(8)],
        &mut commands,
    );
    assert!(commands.is_empty(), "a resolved window must not be re-picked");
}

#[test]
fn unattended_gate_resolves_through_the_run() {
    let seed = RunSeed::new(42);
    let mut game = Run::new(RunConfig::new(
        seed,
        NonZeroU32::new(5).expect("non-zero cadence"),
        BoonCatalog::default(),
    ));
    let mut autopilot = Autopilot::new(Config::new(seed, 0));

    let mut events = Vec::new();
    run::apply(
        &mut game,
        Command::CompleteRoom {
            tick: Tick::new(240),
        },
        &mut events,
    );

    // Feed events back and forth until the autopilot has nothing to add.
    let mut tick = 240;
    while query::progress(&game).room_index == RoomIndex::new(0) {
        let mut commands = Vec::new();
        autopilot.handle(&events, &mut commands);
        events.clear();
        for command in commands {
            run::apply(&mut game, command, &mut events);
        }

        tick += 1;
        run::apply(
            &mut game,
            Command::Tick {
                tick: Tick::new(tick),
            },
            &mut events,
        );
        assert!(tick < 300, "autopilot failed to resolve the gate");
    }

    assert!(!query::progress(&game).awaiting_gate_resolve);
    assert_eq!(query::reward_ledger(&game).len(), 1);
}
