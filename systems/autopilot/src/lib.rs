#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic autopilot that supplies fallback picks for unattended runs.
//!
//! The autopilot never inspects the run's mailbox. It watches the event
//! stream, waits a configured number of ticks for an interactive pick to
//! resolve the window, and then emits the pure resolver's answer as an
//! ordinary command. A collision with a late interactive pick surfaces as a
//! harmless rejection event on the run side.

use fleetcrawl_core::{Command, Event, GateKind, RoomIndex, RunSeed};
use fleetcrawl_system_gate_resolution::{resolve_auto_gate_ordinal, resolve_auto_offer_index};

/// Configuration parameters required to construct the autopilot.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    seed: RunSeed,
    patience: u32,
}

impl Config {
    /// Creates a new configuration from the run seed and the number of ticks
    /// to wait before auto-resolving an open window.
    #[must_use]
    pub const fn new(seed: RunSeed, patience: u32) -> Self {
        Self { seed, patience }
    }
}

/// Pure system that deterministically resolves unattended pick windows.
#[derive(Debug)]
pub struct Autopilot {
    seed: RunSeed,
    patience: u32,
    pending: Option<PendingDecision>,
}

impl Autopilot {
    /// Creates a new autopilot using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            seed: config.seed,
            patience: config.patience,
            pending: None,
        }
    }

    /// Consumes run events and emits fallback pick commands once the
    /// configured patience window lapses.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GateOpened {
                    room_index,
                    options,
                    ..
                } => {
                    self.pending = Some(PendingDecision::Gate {
                        room_index: *room_index,
                        option_count: options.len() as u32,
                        ticks_waited: 0,
                    });
                    self.maybe_emit(out);
                }
                Event::BoonOffersPresented {
                    room_index,
                    offer_count,
                    ..
                } => {
                    self.pending = Some(PendingDecision::BoonOffer {
                        room_index: *room_index,
                        offer_count: *offer_count,
                        ticks_waited: 0,
                    });
                    self.maybe_emit(out);
                }
                Event::TimeAdvanced { .. } => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.wait_one_tick();
                    }
                    self.maybe_emit(out);
                }
                Event::RewardApplied { .. } | Event::RoomCleared { .. } => {
                    self.pending = None;
                }
                _ => {}
            }
        }
    }

    fn maybe_emit(&mut self, out: &mut Vec<Command>) {
        let Some(pending) = self.pending else {
            return;
        };
        if pending.ticks_waited() < self.patience {
            return;
        }

        out.push(match pending {
            PendingDecision::Gate {
                room_index,
                option_count,
                ..
            } => Command::ChooseGate {
                index: resolve_auto_gate_ordinal(self.seed, room_index, option_count),
            },
            PendingDecision::BoonOffer {
                room_index,
                offer_count,
                ..
            } => Command::ChooseBoonOffer {
                index: resolve_auto_offer_index(
                    self.seed,
                    room_index,
                    GateKind::Boon,
                    offer_count,
                ),
            },
        });
        self.pending = None;
    }
}

#[derive(Clone, Copy, Debug)]
enum PendingDecision {
    Gate {
        room_index: RoomIndex,
        option_count: u32,
        ticks_waited: u32,
    },
    BoonOffer {
        room_index: RoomIndex,
        offer_count: u32,
        ticks_waited: u32,
    },
}

impl PendingDecision {
    fn wait_one_tick(&mut self) {
        match self {
            Self::Gate { ticks_waited, .. } | Self::BoonOffer { ticks_waited, .. } => {
                *ticks_waited = ticks_waited.saturating_add(1);
            }
        }
    }

    fn ticks_waited(&self) -> u32 {
        match self {
            Self::Gate { ticks_waited, .. } | Self::BoonOffer { ticks_waited, .. } => *ticks_waited,
        }
    }
}
