#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Fleetcrawl run.
//!
//! The driver owns the clock and the room end conditions, feeds commands into
//! the authoritative run, and routes the resulting events through the
//! autopilot and the director until the command stream drains. Every
//! noteworthy event is rendered as a stable `key=value` line for telemetry
//! scraping.

use std::num::NonZeroU32;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fleetcrawl_core::{
    BoonCatalog, BoonChoice, Command, Event, RoomKind, RunConfig, RunSeed, Tick,
};
use fleetcrawl_run::{self as run, query, Run};
use fleetcrawl_system_autopilot::{Autopilot, Config as AutopilotConfig};
use fleetcrawl_system_director::Director;
use fleetcrawl_system_gate_resolution::{resolve_auto_gate_ordinal, resolve_gate_kind};
use serde::Serialize;

const COMBAT_TICKS: u32 = 240;
const RELIEF_TICKS: u32 = 120;
const BOSS_TICKS: u32 = 360;

/// Arguments accepted by the headless driver.
#[derive(Debug, Parser)]
#[command(name = "fleetcrawl", about = "Headless roguelike run driver")]
struct Args {
    /// Run seed; a random one is drawn when omitted.
    #[arg(long)]
    seed: Option<u32>,
    /// Boss cadence in rooms.
    #[arg(long, default_value_t = 3)]
    boss_every: u32,
    /// Number of rooms to resolve before stopping.
    #[arg(long, default_value_t = 6)]
    rooms: u32,
    /// Ticks the autopilot waits for an interactive pick before resolving.
    #[arg(long, default_value_t = 1)]
    patience: u32,
    /// Replay the identical script and compare the resulting digests.
    #[arg(long)]
    verify: bool,
    /// Emit a JSON summary instead of per-event lines.
    #[arg(long)]
    summary_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let seed = RunSeed::new(args.seed.unwrap_or_else(rand::random));
    let boss_every =
        NonZeroU32::new(args.boss_every).context("--boss-every must be at least 1")?;
    if args.rooms == 0 {
        bail!("--rooms must be at least 1");
    }

    let outcome = drive(seed, boss_every, args.patience, args.rooms, !args.summary_json)?;

    if args.verify {
        let replayed = drive(seed, boss_every, args.patience, args.rooms, false)?;
        if replayed.digest != outcome.digest {
            bail!(
                "determinism violation: digest {:#010x} diverged to {:#010x} on replay",
                outcome.digest,
                replayed.digest
            );
        }
        println!("[fleetcrawl] verify=ok digest={:#010x}", outcome.digest);
    }

    if args.summary_json {
        let summary = Summary::from_outcome(seed, &outcome);
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
    } else {
        println!(
            "[fleetcrawl] run_end=1 seed={} rooms={} credits={} upgrades={} relief={} boons={} digest={:#010x}",
            seed.get(),
            outcome.rooms_resolved,
            outcome.credits,
            outcome.upgrade_points,
            outcome.relief_count,
            outcome.boons.len(),
            outcome.digest
        );
    }

    Ok(())
}

struct Outcome {
    rooms_resolved: u32,
    credits: u32,
    upgrade_points: u32,
    relief_count: u32,
    boons: Vec<BoonChoice>,
    digest: u32,
}

/// JSON rendering of a finished drive.
#[derive(Debug, Serialize)]
struct Summary {
    seed: u32,
    rooms_resolved: u32,
    credits: u32,
    upgrade_points: u32,
    relief_count: u32,
    boons: Vec<String>,
    digest: String,
}

impl Summary {
    fn from_outcome(seed: RunSeed, outcome: &Outcome) -> Self {
        Self {
            seed: seed.get(),
            rooms_resolved: outcome.rooms_resolved,
            credits: outcome.credits,
            upgrade_points: outcome.upgrade_points,
            relief_count: outcome.relief_count,
            boons: outcome
                .boons
                .iter()
                .map(|choice| format!("{}:{}", god_label(choice.god), choice.boon.as_str()))
                .collect(),
            digest: format!("{:#010x}", outcome.digest),
        }
    }
}

fn drive(
    seed: RunSeed,
    boss_every: NonZeroU32,
    patience: u32,
    rooms: u32,
    print_events: bool,
) -> Result<Outcome> {
    let mut game = Run::new(RunConfig::new(seed, boss_every, BoonCatalog::default()));
    let mut autopilot = Autopilot::new(AutopilotConfig::new(seed, patience));
    let mut director = Director::new();

    let per_room = BOSS_TICKS + patience.saturating_add(8).saturating_mul(4);
    let tick_limit = rooms
        .saturating_add(1)
        .saturating_mul(per_room);

    let mut tick = 0u32;
    while query::progress(&game).room_index.get() < rooms {
        tick += 1;
        if tick >= tick_limit {
            bail!("run stalled after {tick} ticks without resolving {rooms} rooms");
        }

        let room = query::room(&game);
        if !room.completed && tick >= room.start_tick.get() + room_duration(room.kind) {
            dispatch(
                &mut game,
                Command::CompleteRoom {
                    tick: Tick::new(tick),
                },
                &mut autopilot,
                &mut director,
                seed,
                print_events,
            );
        }

        dispatch(
            &mut game,
            Command::Tick {
                tick: Tick::new(tick),
            },
            &mut autopilot,
            &mut director,
            seed,
            print_events,
        );
    }

    let resources = query::resources(&game);
    Ok(Outcome {
        rooms_resolved: query::progress(&game).room_index.get(),
        credits: resources.credits,
        upgrade_points: resources.upgrade_points,
        relief_count: resources.relief_count,
        boons: query::boon_choices(&game).to_vec(),
        digest: query::progress(&game).digest,
    })
}

fn dispatch(
    game: &mut Run,
    command: Command,
    autopilot: &mut Autopilot,
    director: &mut Director,
    seed: RunSeed,
    print_events: bool,
) {
    let mut events = Vec::new();
    run::apply(game, command, &mut events);

    loop {
        if events.is_empty() {
            break;
        }
        if print_events {
            for event in &events {
                print_event(event, seed);
            }
        }

        let mut commands = Vec::new();
        autopilot.handle(&events, &mut commands);
        director.handle(&events, &mut commands);
        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            let mut generated = Vec::new();
            run::apply(game, command, &mut generated);
            events.extend(generated);
        }
    }
}

fn print_event(event: &Event, seed: RunSeed) {
    match event {
        Event::RoomCompleted {
            room_index,
            kind,
            tick,
        } => println!(
            "[fleetcrawl] room_complete=1 room={} kind={} tick={}",
            room_index.get(),
            kind_label(*kind),
            tick.get()
        ),
        Event::GateOpened {
            room_index,
            kind,
            options,
        } => {
            // Preview what an unattended resolution would choose, the same
            // way a gate marker UI would.
            let auto = resolve_auto_gate_ordinal(seed, *room_index, options.len() as u32);
            let themes: Vec<&str> = (0..options.len() as u32)
                .map(|ordinal| gate_label(resolve_gate_kind(*kind, ordinal)))
                .collect();
            println!(
                "[fleetcrawl] gate_open=1 room={} gates=[{}] auto={}",
                room_index.get(),
                themes.join(","),
                auto
            );
        }
        Event::BoonOffersPresented {
            room_index,
            god,
            offer_count,
        } => println!(
            "[fleetcrawl] boon_offers=1 room={} god={} count={}",
            room_index.get(),
            god_label(*god),
            offer_count
        ),
        Event::BoonChosen {
            room_index,
            choice,
            offer_index,
            ..
        } => println!(
            "[fleetcrawl] boon_pick=1 room={} god={} id={} offer={}",
            room_index.get(),
            god_label(choice.god),
            choice.boon.as_str(),
            offer_index
        ),
        Event::RewardApplied {
            grant,
            picked_index,
        } => println!(
            "[fleetcrawl] reward=1 room={} kind={} amount={} picked={} tick={}",
            grant.room_index.get(),
            reward_label(grant.reward),
            grant.amount,
            picked_index,
            grant.tick.get()
        ),
        Event::RoomCleared {
            room_index,
            next_is_boss,
            ..
        } => println!(
            "[fleetcrawl] room_clear=1 room={} next_boss={}",
            room_index.get(),
            u8::from(*next_is_boss)
        ),
        Event::RoomEntered {
            room_index,
            kind,
            tick,
        } => println!(
            "[fleetcrawl] room_enter=1 room={} kind={} tick={}",
            room_index.get(),
            kind_label(*kind),
            tick.get()
        ),
        Event::GatePickRejected { index, reason } => println!(
            "[fleetcrawl] gate_pick_rejected=1 index={index} reason=\"{reason}\""
        ),
        Event::BoonPickRejected { index, reason } => println!(
            "[fleetcrawl] boon_pick_rejected=1 index={index} reason=\"{reason}\""
        ),
        Event::RoomEntryRejected { kind, reason } => println!(
            "[fleetcrawl] room_entry_rejected=1 kind={} reason=\"{reason}\"",
            kind_label(*kind)
        ),
        Event::TimeAdvanced { .. } => {}
    }
}

fn room_duration(kind: RoomKind) -> u32 {
    match kind {
        RoomKind::Combat => COMBAT_TICKS,
        RoomKind::Relief => RELIEF_TICKS,
        RoomKind::Boss => BOSS_TICKS,
    }
}

fn kind_label(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Combat => "combat",
        RoomKind::Relief => "relief",
        RoomKind::Boss => "boss",
    }
}

fn gate_label(kind: fleetcrawl_core::GateKind) -> &'static str {
    match kind {
        fleetcrawl_core::GateKind::Boon => "boon",
        fleetcrawl_core::GateKind::Blueprint => "blueprint",
        fleetcrawl_core::GateKind::Relief => "relief",
    }
}

fn reward_label(reward: fleetcrawl_core::RewardKind) -> &'static str {
    match reward {
        fleetcrawl_core::RewardKind::Boon => "boon",
        fleetcrawl_core::RewardKind::Money => "money",
        fleetcrawl_core::RewardKind::Upgrade => "upgrade",
        fleetcrawl_core::RewardKind::ReliefNode => "relief",
    }
}

fn god_label(god: fleetcrawl_core::BoonGod) -> &'static str {
    match god {
        fleetcrawl_core::BoonGod::Athena => "athena",
        fleetcrawl_core::BoonGod::Ares => "ares",
        fleetcrawl_core::BoonGod::Artemis => "artemis",
        fleetcrawl_core::BoonGod::Hermes => "hermes",
        fleetcrawl_core::BoonGod::Poseidon => "poseidon",
        fleetcrawl_core::BoonGod::Zeus => "zeus",
    }
}
