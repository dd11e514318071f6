#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Room-kind policy for rooms the boss cadence does not claim.
//!
//! The run only fixes the boss cadence; which non-boss room follows a cleared
//! one is policy, and it lives here rather than in the progression core. The
//! director proposes a relief room after a relief-node grant and a combat
//! room otherwise. Proposals are validated by the run, which overrides the
//! kind whenever the cadence forces a boss.

use fleetcrawl_core::{Command, Event, RewardKind, RoomKind};

/// Pure system that answers `RoomCleared` events with entry proposals.
#[derive(Debug, Default)]
pub struct Director {
    last_grant: Option<RewardKind>,
}

impl Director {
    /// Creates a new director with no grant history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes run events and emits `EnterRoom` proposals for cleared rooms.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RewardApplied { grant, .. } => {
                    self.last_grant = Some(grant.reward);
                }
                Event::RoomCleared { tick, .. } => {
                    let kind = match self.last_grant {
                        Some(RewardKind::ReliefNode) => RoomKind::Relief,
                        _ => RoomKind::Combat,
                    };
                    out.push(Command::EnterRoom { kind, tick: *tick });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Director;
    use fleetcrawl_core::{
        Command, Event, RewardGrant, RewardKind, RoomIndex, RoomKind, Tick,
    };

    fn cleared(room: u32, tick: u32) -> Event {
        Event::RoomCleared {
            room_index: RoomIndex::new(room),
            tick: Tick::new(tick),
            next_is_boss: false,
        }
    }

    fn applied(reward: RewardKind) -> Event {
        Event::RewardApplied {
            grant: RewardGrant {
                room_index: RoomIndex::new(0),
                reward,
                god: None,
                amount: 1,
                tick: Tick::new(10),
            },
            picked_index: 0,
        }
    }

    #[test]
    fn proposes_combat_by_default() {
        let mut director = Director::new();
        let mut commands = Vec::new();
        director.handle(&[cleared(0, 240)], &mut commands);
        assert_eq!(
            commands,
            vec![Command::EnterRoom {
                kind: RoomKind::Combat,
                tick: Tick::new(240),
            }]
        );
    }

    #[test]
    fn proposes_relief_after_a_relief_node_grant() {
        let mut director = Director::new();
        let mut commands = Vec::new();
        director.handle(
            &[applied(RewardKind::ReliefNode), cleared(0, 240)],
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![Command::EnterRoom {
                kind: RoomKind::Relief,
                tick: Tick::new(240),
            }]
        );
    }

    #[test]
    fn reverts_to_combat_once_a_different_grant_lands() {
        let mut director = Director::new();
        let mut commands = Vec::new();
        director.handle(
            &[
                applied(RewardKind::ReliefNode),
                cleared(0, 240),
                applied(RewardKind::Money),
                cleared(1, 500),
            ],
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![
                Command::EnterRoom {
                    kind: RoomKind::Relief,
                    tick: Tick::new(240),
                },
                Command::EnterRoom {
                    kind: RoomKind::Combat,
                    tick: Tick::new(500),
                },
            ]
        );
    }

    #[test]
    fn ignores_unrelated_events() {
        let mut director = Director::new();
        let mut commands = Vec::new();
        director.handle(
            &[Event::TimeAdvanced {
                tick: Tick::new(1),
            }],
            &mut commands,
        );
        assert!(commands.is_empty());
    }
}
