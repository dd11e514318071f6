#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure deterministic gate and offer resolution.
//!
//! Every function here derives its entropy exclusively from the run seed and
//! small integer coordinates through a stateless FNV-1a mixer. There is no
//! stream position and no call counter, so any function can be invoked any
//! number of times, in any order, and re-derive the same answer for the same
//! coordinates. UI previews, autopilot fallbacks, and replay verification all
//! agree because they all call the same derivations.

use fleetcrawl_core::{
    BoonCatalog, BoonGod, BoonId, GateKind, GateOption, RewardKind, RoomIndex, RoomKind, RunSeed,
};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

const SALT_AUTO_GATE: u32 = 0x4F1B_BCDD;
const SALT_AUTO_GATE_TAIL: u32 = 0x7F4A_7C15;
const SALT_AUTO_OFFER_TAIL: u32 = 0xC3A5_C85C;
const SALT_ROTATION_TAIL: u32 = 0xA5A5_A5A5;
const SALT_RANGE_TAIL: u32 = 0xD1B5_4A35;
const SALT_GATE_ROLL_BASE: u32 = 0xA102_1000;

const OFFER_KIND_BIAS: u32 = 101;
const ROTATION_KIND_BIAS: u32 = 17;
const GOD_ROLL_SALT_BIAS: u32 = 0x500;
const FALLBACK_SALT_BIAS: u32 = 0x900;
const MAX_DRAW_ATTEMPTS: u32 = 48;

/// Folds four integers into a uniformly distributed 32-bit value.
///
/// FNV-1a accumulation: starting from the offset basis, each input in order
/// is XORed into the accumulator, which is then multiplied by the FNV prime
/// with unsigned wraparound. Bit-identical on every platform.
#[must_use]
pub const fn mix(a: u32, b: u32, c: u32, d: u32) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    hash = (hash ^ a).wrapping_mul(FNV_PRIME);
    hash = (hash ^ b).wrapping_mul(FNV_PRIME);
    hash = (hash ^ c).wrapping_mul(FNV_PRIME);
    hash = (hash ^ d).wrapping_mul(FNV_PRIME);
    hash
}

/// Hashes an identifier's bytes with the same FNV-1a parameters as [`mix`].
#[must_use]
pub fn hash_ident(ident: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in ident.bytes() {
        hash = (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives a value in `[min, max)` from the run coordinates and a salt.
///
/// Returns `min` when the span is empty.
#[must_use]
pub fn deterministic_range(
    seed: RunSeed,
    room_index: RoomIndex,
    salt: u32,
    min: u32,
    max: u32,
) -> u32 {
    if max <= min {
        return min;
    }

    let hash = mix(
        seed.get(),
        room_index.get().wrapping_add(1),
        salt,
        seed.get() ^ salt ^ SALT_RANGE_TAIL,
    );
    min + hash % (max - min)
}

/// Number of gate options a room of the provided kind presents.
#[must_use]
pub const fn resolve_gate_count(kind: RoomKind) -> u32 {
    match kind {
        RoomKind::Relief => 2,
        RoomKind::Combat | RoomKind::Boss => 3,
    }
}

/// Thematic kind of the gate at the provided slot ordinal.
///
/// Ordinals outside the room's gate count are a caller contract violation
/// and are not defended against here.
#[must_use]
pub const fn resolve_gate_kind(kind: RoomKind, ordinal: u32) -> GateKind {
    if matches!(kind, RoomKind::Relief) {
        return match ordinal {
            0 => GateKind::Boon,
            _ => GateKind::Blueprint,
        };
    }

    match ordinal {
        0 => GateKind::Boon,
        1 => GateKind::Blueprint,
        _ => GateKind::Relief,
    }
}

/// Gate ordinal the autopilot picks when no interactive pick arrives.
#[must_use]
pub fn resolve_auto_gate_ordinal(seed: RunSeed, room_index: RoomIndex, gate_count: u32) -> u32 {
    if gate_count <= 1 {
        return 0;
    }

    mix(
        seed.get(),
        room_index.get().wrapping_add(1),
        SALT_AUTO_GATE,
        SALT_AUTO_GATE_TAIL,
    ) % gate_count
}

/// Offer index the autopilot picks when no interactive pick arrives.
#[must_use]
pub fn resolve_auto_offer_index(
    seed: RunSeed,
    room_index: RoomIndex,
    gate_kind: GateKind,
    offer_count: u32,
) -> u32 {
    if offer_count <= 1 {
        return 0;
    }

    mix(
        seed.get(),
        room_index.get().wrapping_add(1),
        gate_kind.index() + OFFER_KIND_BIAS,
        SALT_AUTO_OFFER_TAIL,
    ) % offer_count
}

/// Boon identifier presented at the provided offer slot.
///
/// The catalog rotation starts at a seed-derived entry and the offer index is
/// clamped to `[0, 2]` against the four-entry catalog, so offer index 3 folds
/// onto 2. The clamp is a designed behavior, not error recovery.
#[must_use]
pub fn resolve_boon_offer_at(
    catalog: &BoonCatalog,
    seed: RunSeed,
    room_index: RoomIndex,
    offer_index: u32,
) -> &BoonId {
    let clamped = offer_index.min(2);
    let slot = (boon_rotation_start(seed, room_index) + clamped) % BoonCatalog::LEN as u32;
    catalog.entry(slot as usize)
}

fn boon_rotation_start(seed: RunSeed, room_index: RoomIndex) -> u32 {
    mix(
        seed.get(),
        room_index.get().wrapping_add(1),
        GateKind::Boon.index() + ROTATION_KIND_BIAS,
        SALT_ROTATION_TAIL,
    ) % BoonCatalog::LEN as u32
}

/// Resolves the concrete gate menu for a completed room.
///
/// Exactly [`resolve_gate_count`] options are drawn from the bag with salted
/// lookups. Non-boon reward kinds appear at most once per gate and boon
/// offers carry pairwise distinct gods; drawn items are removed from the bag,
/// which is refilled from the template whenever it runs dry. The template
/// must not be empty — bag content policy is caller configuration.
#[must_use]
pub fn generate_gate_options(
    seed: RunSeed,
    room_index: RoomIndex,
    room_kind: RoomKind,
    bag: &mut Vec<RewardKind>,
    template: &[RewardKind],
) -> Vec<GateOption> {
    debug_assert!(!template.is_empty(), "reward bag template must not be empty");

    let gate_count = resolve_gate_count(room_kind);
    let mut options = Vec::with_capacity(gate_count as usize);
    let mut offered_rewards = 0u32;
    let mut offered_gods = 0u32;

    for slot in 0..gate_count {
        let mut emitted = false;
        for attempt in 0..MAX_DRAW_ATTEMPTS {
            if bag.is_empty() {
                refill_bag(bag, template);
            }
            if bag.is_empty() {
                break;
            }

            let salt = SALT_GATE_ROLL_BASE + slot * 131 + attempt * 17;
            let index =
                deterministic_range(seed, room_index, salt, 0, bag.len() as u32) as usize;
            let Some(option) = admit_candidate(
                bag[index],
                salt,
                seed,
                room_index,
                slot,
                attempt,
                offered_rewards,
                offered_gods,
            ) else {
                continue;
            };

            record_offer(option, &mut offered_rewards, &mut offered_gods);
            options.push(option);
            let _ = bag.remove(index);
            emitted = true;
            break;
        }

        if !emitted {
            push_fallback_option(
                seed,
                room_index,
                slot,
                &mut offered_rewards,
                &mut offered_gods,
                bag,
                template,
                &mut options,
            );
        }
    }

    options
}

fn refill_bag(bag: &mut Vec<RewardKind>, template: &[RewardKind]) {
    bag.extend_from_slice(template);
}

#[allow(clippy::too_many_arguments)]
fn admit_candidate(
    candidate: RewardKind,
    salt: u32,
    seed: RunSeed,
    room_index: RoomIndex,
    slot: u32,
    attempt: u32,
    offered_rewards: u32,
    offered_gods: u32,
) -> Option<GateOption> {
    match candidate {
        RewardKind::Boon => roll_distinct_god(seed, room_index, slot, attempt, offered_gods)
            .map(|god| GateOption::Boon {
                god,
                roll_salt: salt,
            }),
        RewardKind::Money => {
            kind_available(offered_rewards, candidate).then_some(GateOption::Money { roll_salt: salt })
        }
        RewardKind::Upgrade => kind_available(offered_rewards, candidate)
            .then_some(GateOption::Upgrade { roll_salt: salt }),
        RewardKind::ReliefNode => kind_available(offered_rewards, candidate)
            .then_some(GateOption::Relief { roll_salt: salt }),
    }
}

fn kind_available(offered_rewards: u32, kind: RewardKind) -> bool {
    offered_rewards & (1 << kind.index()) == 0
}

fn record_offer(option: GateOption, offered_rewards: &mut u32, offered_gods: &mut u32) {
    match option.god() {
        Some(god) => *offered_gods |= 1 << god.index(),
        None => *offered_rewards |= 1 << option.reward_kind().index(),
    }
}

fn roll_distinct_god(
    seed: RunSeed,
    room_index: RoomIndex,
    slot: u32,
    attempt: u32,
    offered_gods: u32,
) -> Option<BoonGod> {
    let salt = SALT_GATE_ROLL_BASE + GOD_ROLL_SALT_BIAS + slot * 31 + attempt * 17;
    let start = deterministic_range(seed, room_index, salt, 0, BoonGod::COUNT);

    for step in 0..BoonGod::COUNT {
        let god = BoonGod::from_index((start + step) % BoonGod::COUNT);
        if offered_gods & (1 << god.index()) == 0 {
            return Some(god);
        }
    }

    None
}

#[allow(clippy::too_many_arguments)]
fn push_fallback_option(
    seed: RunSeed,
    room_index: RoomIndex,
    slot: u32,
    offered_rewards: &mut u32,
    offered_gods: &mut u32,
    bag: &mut Vec<RewardKind>,
    template: &[RewardKind],
    options: &mut Vec<GateOption>,
) {
    if bag.is_empty() {
        refill_bag(bag, template);
    }

    for index in 0..bag.len() {
        let salt = SALT_GATE_ROLL_BASE + FALLBACK_SALT_BIAS + slot * 53 + index as u32;
        let Some(option) = admit_candidate(
            bag[index],
            salt,
            seed,
            room_index,
            slot,
            index as u32,
            *offered_rewards,
            *offered_gods,
        ) else {
            continue;
        };

        record_offer(option, offered_rewards, offered_gods);
        options.push(option);
        let _ = bag.remove(index);
        return;
    }

    // Distinctness is best-effort: a degenerate template (a single repeated
    // kind) still fills every slot so the gate count invariant holds.
    if let Some(candidate) = bag.first().copied() {
        let salt = SALT_GATE_ROLL_BASE + FALLBACK_SALT_BIAS + slot * 53;
        let option = match candidate {
            RewardKind::Boon => GateOption::Boon {
                god: BoonGod::Zeus,
                roll_salt: salt,
            },
            RewardKind::Money => GateOption::Money { roll_salt: salt },
            RewardKind::Upgrade => GateOption::Upgrade { roll_salt: salt },
            RewardKind::ReliefNode => GateOption::Relief { roll_salt: salt },
        };
        options.push(option);
        let _ = bag.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcrawl_core::DEFAULT_REWARD_BAG;

    const SEED: RunSeed = RunSeed::new(42);
    const ROOM: RoomIndex = RoomIndex::new(0);

    #[test]
    fn mixer_matches_pinned_fixtures() {
        assert_eq!(mix(1, 2, 3, 4), 0x5734_a87d);
        assert_eq!(mix(0, 0, 0, 0), 0x4b95_f515);
    }

    #[test]
    fn mixer_is_stateless_across_repeated_calls() {
        let first = mix(0xdead_beef, 7, 11, 13);
        for _ in 0..32 {
            assert_eq!(mix(0xdead_beef, 7, 11, 13), first);
        }
    }

    #[test]
    fn ident_hash_matches_pinned_fixture() {
        assert_eq!(hash_ident("surge.lattice"), 0xd3b4_5b35);
        assert_eq!(hash_ident(""), 2_166_136_261);
    }

    #[test]
    fn gate_count_law_holds() {
        assert_eq!(resolve_gate_count(RoomKind::Relief), 2);
        assert_eq!(resolve_gate_count(RoomKind::Combat), 3);
        assert_eq!(resolve_gate_count(RoomKind::Boss), 3);
    }

    #[test]
    fn gate_kind_law_holds_for_relief_rooms() {
        assert_eq!(resolve_gate_kind(RoomKind::Relief, 0), GateKind::Boon);
        assert_eq!(resolve_gate_kind(RoomKind::Relief, 1), GateKind::Blueprint);
    }

    #[test]
    fn gate_kind_law_holds_for_standard_rooms() {
        for kind in [RoomKind::Combat, RoomKind::Boss] {
            assert_eq!(resolve_gate_kind(kind, 0), GateKind::Boon);
            assert_eq!(resolve_gate_kind(kind, 1), GateKind::Blueprint);
            assert_eq!(resolve_gate_kind(kind, 2), GateKind::Relief);
        }
    }

    #[test]
    fn auto_gate_ordinal_matches_pinned_fixtures() {
        assert_eq!(resolve_auto_gate_ordinal(SEED, ROOM, 3), 0);
        assert_eq!(resolve_auto_gate_ordinal(SEED, RoomIndex::new(5), 3), 2);
        assert_eq!(resolve_auto_gate_ordinal(RunSeed::new(7), ROOM, 2), 1);
    }

    #[test]
    fn auto_gate_ordinal_degenerates_to_zero_for_single_gates() {
        assert_eq!(resolve_auto_gate_ordinal(SEED, ROOM, 1), 0);
        assert_eq!(resolve_auto_gate_ordinal(SEED, ROOM, 0), 0);
    }

    #[test]
    fn auto_offer_index_matches_pinned_fixtures() {
        assert_eq!(resolve_auto_offer_index(SEED, ROOM, GateKind::Boon, 3), 0);
        assert_eq!(
            resolve_auto_offer_index(SEED, ROOM, GateKind::Blueprint, 3),
            1
        );
        assert_eq!(resolve_auto_offer_index(SEED, ROOM, GateKind::Boon, 1), 0);
    }

    #[test]
    fn resolvers_rederive_identically_across_calls() {
        for _ in 0..16 {
            assert_eq!(
                resolve_auto_gate_ordinal(SEED, ROOM, 3),
                resolve_auto_gate_ordinal(SEED, ROOM, 3)
            );
            assert_eq!(
                resolve_auto_offer_index(SEED, ROOM, GateKind::Boon, 3),
                resolve_auto_offer_index(SEED, ROOM, GateKind::Boon, 3)
            );
        }
    }

    #[test]
    fn boon_rotation_walks_catalog_from_seeded_start() {
        let catalog = BoonCatalog::default();
        // Rotation start for seed 42, room 0 lands on slot 2.
        assert_eq!(
            resolve_boon_offer_at(&catalog, SEED, ROOM, 0),
            catalog.entry(2)
        );
        assert_eq!(
            resolve_boon_offer_at(&catalog, SEED, ROOM, 1),
            catalog.entry(3)
        );
        assert_eq!(
            resolve_boon_offer_at(&catalog, SEED, ROOM, 2),
            catalog.entry(0)
        );
    }

    #[test]
    fn boon_offer_index_three_folds_onto_two() {
        let catalog = BoonCatalog::default();
        for room in 0..12 {
            let room = RoomIndex::new(room);
            assert_eq!(
                resolve_boon_offer_at(&catalog, SEED, room, 3),
                resolve_boon_offer_at(&catalog, SEED, room, 2)
            );
        }
    }

    #[test]
    fn boon_offers_stay_within_catalog_for_any_index() {
        let catalog = BoonCatalog::default();
        for offer in 0..8 {
            let resolved = resolve_boon_offer_at(&catalog, SEED, ROOM, offer);
            assert!((0..BoonCatalog::LEN).any(|slot| catalog.entry(slot) == resolved));
        }
    }

    #[test]
    fn generated_gate_counts_match_room_kind() {
        for (kind, expected) in [
            (RoomKind::Combat, 3),
            (RoomKind::Boss, 3),
            (RoomKind::Relief, 2),
        ] {
            let mut bag = DEFAULT_REWARD_BAG.to_vec();
            let options =
                generate_gate_options(SEED, ROOM, kind, &mut bag, &DEFAULT_REWARD_BAG);
            assert_eq!(options.len(), expected);
        }
    }

    #[test]
    fn generated_options_are_deterministic() {
        let mut first_bag = DEFAULT_REWARD_BAG.to_vec();
        let mut second_bag = DEFAULT_REWARD_BAG.to_vec();
        let first =
            generate_gate_options(SEED, ROOM, RoomKind::Combat, &mut first_bag, &DEFAULT_REWARD_BAG);
        let second = generate_gate_options(
            SEED,
            ROOM,
            RoomKind::Combat,
            &mut second_bag,
            &DEFAULT_REWARD_BAG,
        );
        assert_eq!(first, second);
        assert_eq!(first_bag, second_bag);
    }

    #[test]
    fn generated_options_keep_non_boon_kinds_distinct() {
        for seed in [3u32, 42, 777, 0xF17E_CAFE] {
            for room in 0..6 {
                let mut bag = DEFAULT_REWARD_BAG.to_vec();
                let options = generate_gate_options(
                    RunSeed::new(seed),
                    RoomIndex::new(room),
                    RoomKind::Combat,
                    &mut bag,
                    &DEFAULT_REWARD_BAG,
                );

                let mut kinds = 0u32;
                let mut gods = 0u32;
                for option in &options {
                    match option.god() {
                        Some(god) => {
                            assert_eq!(gods & (1 << god.index()), 0, "duplicate god offered");
                            gods |= 1 << god.index();
                        }
                        None => {
                            let bit = 1 << option.reward_kind().index();
                            assert_eq!(kinds & bit, 0, "duplicate reward kind offered");
                            kinds |= bit;
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn generation_consumes_drawn_items_from_the_bag() {
        let mut bag = DEFAULT_REWARD_BAG.to_vec();
        let before = bag.len();
        let options =
            generate_gate_options(SEED, ROOM, RoomKind::Combat, &mut bag, &DEFAULT_REWARD_BAG);
        assert_eq!(before - bag.len(), options.len());
    }

    #[test]
    fn degenerate_template_still_fills_every_slot() {
        let template = [RewardKind::Money];
        let mut bag = template.to_vec();
        let options =
            generate_gate_options(SEED, ROOM, RoomKind::Combat, &mut bag, &template);
        assert_eq!(options.len(), 3);
    }
}
