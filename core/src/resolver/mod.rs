//! Target Resolver (spec §4.4): Temple TGT clustering, boss checkpoint
//! selection, arena-object anchor fallback, and unique-monster candidate
//! scoring.
//!
//! Grounded on the teacher's `triggers::matchers` (selector-based entity
//! matching) and `boss::definition` (weighted candidate scoring), adapted
//! from a config-driven DSL to the fixed scoring rules spec.md specifies.

mod cluster;

use crate::error::RecoveryEvent;
use crate::world::{Entity, GridPos, Subtype};

pub use cluster::cluster_first;

/// Static-scene target point offset applied to raw Temple TGT hits before
/// clustering (spec §4.4).
const TEMPLE_TGT_OFFSET: (f32, f32) = (11.5, 11.5);
const TEMPLE_CLUSTER_RADIUS: f32 = 100.0;

/// Arena anchor metadata whitelist (spec §4.4, GLOSSARY).
const ARENA_ANCHOR_PATTERNS: &[(&str, f32)] = &[
    ("BossArenaBlocker", 3.0),
    ("BossForceFieldDoorVisuals", 2.0),
    ("BossArenaLocker", 2.0),
];

/// Find the Temple by clustering raw TGT hits (already offset by the
/// caller's `get_tgt_locations` call) and returning the first cluster.
pub fn resolve_temple(tgt_hits: &[GridPos]) -> Option<GridPos> {
    let offset: Vec<GridPos> = tgt_hits
        .iter()
        .map(|p| p.offset(TEMPLE_TGT_OFFSET.0, TEMPLE_TGT_OFFSET.1))
        .collect();
    cluster_first(&offset, TEMPLE_CLUSTER_RADIUS).into_iter().next()
}

struct ScoredCandidate<'a> {
    entity: &'a Entity,
    score: f32,
}

/// Boss checkpoint selection: entities whose metadata matches
/// `Checkpoint_Endgame_Boss` exactly (substring, case-insensitive), scored
/// and filtered against the abandoned list.
pub fn resolve_boss_checkpoint(
    entities: &[Entity],
    player: GridPos,
    temple: Option<GridPos>,
    radar_boss_endpoint: Option<GridPos>,
    is_abandoned: impl Fn(GridPos) -> bool,
) -> Option<GridPos> {
    let mut best: Option<ScoredCandidate> = None;
    for entity in entities {
        if !entity.metadata_contains("Checkpoint_Endgame_Boss") {
            continue;
        }
        if is_abandoned(entity.grid) {
            continue;
        }
        let score = checkpoint_score(entity, player, temple, radar_boss_endpoint);
        if best.as_ref().map(|b| score > b.score).unwrap_or(true) {
            best = Some(ScoredCandidate { entity, score });
        }
    }
    best.map(|b| b.entity.grid)
}

fn checkpoint_score(
    entity: &Entity,
    player: GridPos,
    temple: Option<GridPos>,
    radar_boss_endpoint: Option<GridPos>,
) -> f32 {
    let dist_player = entity.grid.distance_to(player);
    let dist_temple = temple.map(|t| entity.grid.distance_to(t)).unwrap_or(0.0);
    let dist_radar = radar_boss_endpoint.map(|r| entity.grid.distance_to(r)).unwrap_or(0.0);
    0.10 * dist_player + 0.15 * dist_temple - 1.2 * dist_radar
}

/// Arena anchor fallback, used when the checkpoint entity is hidden.
/// Rejects entities whose grid position is within 1u of the origin.
pub fn resolve_arena_anchor(
    entities: &[Entity],
    player: GridPos,
    temple: Option<GridPos>,
    radar_boss_endpoint: Option<GridPos>,
    is_abandoned: impl Fn(GridPos) -> bool,
    mut on_invalid: impl FnMut(RecoveryEvent),
) -> Option<GridPos> {
    let mut best: Option<ScoredCandidate> = None;
    for entity in entities {
        let Some((_, weight)) = ARENA_ANCHOR_PATTERNS.iter().find(|(p, _)| entity.metadata_contains(p)) else {
            continue;
        };
        if entity.grid.distance_to(GridPos::ZERO) < 1.0 {
            on_invalid(RecoveryEvent::InvalidAnchor { entity_id: entity.id });
            continue;
        }
        if is_abandoned(entity.grid) {
            continue;
        }
        let dist_player = entity.grid.distance_to(player);
        let dist_temple = temple.map(|t| entity.grid.distance_to(t)).unwrap_or(0.0);
        let dist_radar = radar_boss_endpoint.map(|r| entity.grid.distance_to(r)).unwrap_or(0.0);
        let score = weight + 0.08 * dist_player + 0.10 * dist_temple - 1.0 * dist_radar;
        if best.as_ref().map(|b| score > b.score).unwrap_or(true) {
            best = Some(ScoredCandidate { entity, score });
        }
    }
    best.map(|b| b.entity.grid)
}

/// Eligibility filter shared with the engagement detector's "boss-approach
/// candidate" check (spec §4.4/§4.5): a live, non-friendly unique whose
/// metadata names it as a monster and not a checkpoint/renderable prop.
pub(crate) fn is_eligible_monster(entity: &Entity) -> bool {
    entity.subtype == Subtype::MonsterUnique
        && entity.is_alive
        && entity.subtype != Subtype::MonsterFriendly
        && entity.metadata_contains("/monsters/")
        && !entity.metadata_contains("checkpoint")
        && !entity.metadata_contains("renderable")
}

/// Boss unique candidate selection: prefer a locked `candidate_id`,
/// otherwise the nearest-to-player unique within the anchor radius.
pub fn resolve_boss_unique_candidate<'a>(
    entities: &'a [Entity],
    player: GridPos,
    anchor: GridPos,
    anchor_radius: f32,
    locked_candidate_id: Option<u64>,
) -> Option<&'a Entity> {
    let eligible: Vec<&Entity> = entities.iter().filter(|e| is_eligible_monster(e)).collect();

    if let Some(locked) = locked_candidate_id {
        if let Some(e) = eligible.iter().find(|e| e.id == locked) {
            return Some(e);
        }
    }

    eligible
        .into_iter()
        .filter(|e| e.grid.distance_to(anchor) <= anchor_radius)
        .min_by(|a, b| {
            a.grid.distance_to(player).partial_cmp(&b.grid.distance_to(player)).unwrap()
        })
}

/// Likely-map-boss boolean predicate (spec §4.4), threshold >= 5.
pub fn likely_map_boss_score(entity: &Entity, radar_boss_endpoint: Option<GridPos>) -> i32 {
    let mut score = 0;
    if entity.has_stat("map_boss_scaling") {
        score += 6;
    }
    if entity.has_stat("underling") {
        score -= 4;
    }
    if entity.metadata_contains("mapboss") || entity.metadata_contains("endgame_boss") {
        score += 4;
    }
    if entity.cannot_be_damaged || entity.is_hidden {
        score += 1;
    }
    if let Some(endpoint) = radar_boss_endpoint {
        let d = entity.grid.distance_to(endpoint);
        if d <= 120.0 {
            score += 4;
        } else if d <= 220.0 {
            score += 2;
        }
    }
    score
}

pub fn is_likely_map_boss(entity: &Entity, radar_boss_endpoint: Option<GridPos>) -> bool {
    likely_map_boss_score(entity, radar_boss_endpoint) >= 5
}

/// A boss target within 80u of the temple is assumed mistaken and dropped.
pub fn reject_if_near_temple(target: GridPos, temple: Option<GridPos>) -> Option<RecoveryEvent> {
    if let Some(temple) = temple {
        if target.distance_to(temple) < 80.0 {
            return Some(RecoveryEvent::RejectedTarget { target });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EntityKind;

    fn monster(id: u64, grid: GridPos) -> Entity {
        Entity {
            id,
            kind: EntityKind::Monster,
            rarity: 3,
            subtype: Subtype::MonsterUnique,
            grid,
            world: (0.0, 0.0, 0.0),
            hp_cur: 1000,
            hp_max: 1000,
            is_alive: true,
            is_targetable: true,
            cannot_be_damaged: false,
            is_hidden: false,
            metadata_path: "/monsters/map_boss_001".to_string(),
            bounds: (1.0, 1.0),
            rotation: None,
            stat_keys: Default::default(),
        }
    }

    #[test]
    fn temple_cluster_applies_offset() {
        let hits = vec![GridPos::new(250.5, 260.5)];
        let temple = resolve_temple(&hits).unwrap();
        assert_eq!(temple, GridPos::new(262.0, 272.0));
    }

    #[test]
    fn boss_near_temple_is_rejected() {
        let target = GridPos::new(350.0, 300.0);
        let temple = GridPos::new(300.0, 300.0);
        assert!(reject_if_near_temple(target, Some(temple)).is_some());
    }

    #[test]
    fn boss_far_from_temple_is_accepted() {
        let target = GridPos::new(1000.0, 1000.0);
        let temple = GridPos::new(300.0, 300.0);
        assert!(reject_if_near_temple(target, Some(temple)).is_none());
    }

    #[test]
    fn unique_candidate_prefers_locked_id_over_distance() {
        let entities = vec![monster(1, GridPos::new(0.0, 0.0)), monster(2, GridPos::new(500.0, 0.0))];
        let player = GridPos::new(0.0, 0.0);
        let picked = resolve_boss_unique_candidate(&entities, player, player, 1000.0, Some(2)).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn invalid_anchor_near_origin_is_rejected() {
        let mut entity = monster(9, GridPos::new(0.5, 0.5));
        entity.metadata_path = "BossArenaBlocker".to_string();
        let mut rejected = false;
        let result = resolve_arena_anchor(
            &[entity],
            GridPos::new(100.0, 100.0),
            None,
            None,
            |_| false,
            |_event| rejected = true,
        );
        assert!(result.is_none());
        assert!(rejected);
    }
}
