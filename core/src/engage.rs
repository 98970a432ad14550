//! Engagement Detector (spec §4.5): decides whether the local player is
//! already fighting a nearby unique, so approach states can short-circuit
//! straight into `FIGHT_BOSS`.
//!
//! Grounded on the teacher's `boss::phase::PhaseTrigger` (a 350ms-throttled
//! poll gate feeding incremental HP-delta detection) and
//! `signal_processor::combat_state` (sliding per-entity sample windows).

use hashbrown::HashMap;
use std::time::{Duration, Instant};

use crate::resolver;
use crate::world::{Entity, GridPos, Subtype};

const PROBE_INTERVAL: Duration = Duration::from_millis(350);
const HP_SAMPLE_TTL_SECS: f32 = 12.0;
const HP_CHANGE_WINDOW_SECS: f32 = 4.0;
const PROBE_RADIUS: f32 = 280.0;
const TARGETABLE_OPEN_RADIUS: f32 = 120.0;
const ENGAGE_THRESHOLD: f32 = 100.0;
const LOCKED_CANDIDATE_BONUS: f32 = 50.0;
const LIKELY_BOSS_BONUS: f32 = 25.0;

/// A bucketed key for the engagement score cache. The spec leaves the exact
/// cache key unspecified and instructs not to guess further than "key it by
/// (distance_bucket, timestamp_bucket)" — 20u distance buckets and 350ms
/// timestamp buckets, matching the probe interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngageCacheKey {
    distance_bucket: i32,
    timestamp_bucket: i64,
}

impl EngageCacheKey {
    fn new(distance: f32, now: Instant, epoch: Instant) -> Self {
        let distance_bucket = (distance / 20.0).floor() as i32;
        let timestamp_bucket = (now.duration_since(epoch).as_millis() / 350) as i64;
        Self { distance_bucket, timestamp_bucket }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedScore {
    score: f32,
    is_engaged: bool,
}

/// Per-tick engagement evaluation state, owned by `Mapper`.
#[derive(Debug)]
pub struct EngageDetector {
    epoch: Instant,
    last_probe_at: Option<Instant>,
    /// entity id -> (hp, sampled_at), pruned on a 12s TTL.
    hp_samples: HashMap<u64, (i64, Instant)>,
    score_cache: HashMap<EngageCacheKey, CachedScore>,
}

impl EngageDetector {
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            last_probe_at: None,
            hp_samples: HashMap::new(),
            score_cache: HashMap::new(),
        }
    }

    fn due(&self, now: Instant) -> bool {
        self.last_probe_at.map(|at| now.duration_since(at) >= PROBE_INTERVAL).unwrap_or(true)
    }

    /// Evaluate engagement against alive uniques within `PROBE_RADIUS` of
    /// `player`. Throttled to once per 350ms; returns the previous verdict
    /// (or `false` if none yet) in between.
    ///
    /// Spec §4.5 steps 2 and 5: a candidate must be a boss-approach
    /// candidate (`resolver::is_eligible_monster`), a likely map boss
    /// (`resolver::is_likely_map_boss`), and within `anchor_radius` of
    /// `anchor`; the locked candidate and likely-boss score then get bonuses.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &mut self,
        now: Instant,
        player: GridPos,
        entities: &[Entity],
        radar_boss_endpoint: Option<GridPos>,
        anchor: GridPos,
        anchor_radius: f32,
        locked_candidate_id: Option<u64>,
    ) -> Option<(u64, f32)> {
        if !self.due(now) {
            return self.best_cached(player, entities, anchor, anchor_radius, now);
        }
        self.last_probe_at = Some(now);
        self.hp_samples.retain(|_, (_, at)| now.duration_since(*at).as_secs_f32() < HP_SAMPLE_TTL_SECS);

        let mut best: Option<(u64, f32)> = None;
        for entity in entities {
            if !self.is_candidate(entity, player, anchor, anchor_radius, radar_boss_endpoint) {
                continue;
            }
            let distance = entity.grid.distance_to(player);

            let score = self.score_entity(entity, distance, now, radar_boss_endpoint, locked_candidate_id);
            let key = EngageCacheKey::new(distance, now, self.epoch);
            self.score_cache.insert(key, CachedScore { score, is_engaged: score >= ENGAGE_THRESHOLD });

            self.hp_samples.insert(entity.id, (entity.hp_cur, now));

            if score >= ENGAGE_THRESHOLD && best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((entity.id, score));
            }
        }
        best
    }

    fn is_candidate(
        &self,
        entity: &Entity,
        player: GridPos,
        anchor: GridPos,
        anchor_radius: f32,
        radar_boss_endpoint: Option<GridPos>,
    ) -> bool {
        if entity.grid.distance_to(player) > PROBE_RADIUS {
            return false;
        }
        if entity.grid.distance_to(anchor) > anchor_radius {
            return false;
        }
        resolver::is_eligible_monster(entity) && resolver::is_likely_map_boss(entity, radar_boss_endpoint)
    }

    fn best_cached(
        &self,
        player: GridPos,
        entities: &[Entity],
        anchor: GridPos,
        anchor_radius: f32,
        now: Instant,
    ) -> Option<(u64, f32)> {
        let mut best: Option<(u64, f32)> = None;
        for entity in entities {
            if entity.subtype != Subtype::MonsterUnique || !entity.is_alive {
                continue;
            }
            if entity.grid.distance_to(anchor) > anchor_radius {
                continue;
            }
            let distance = entity.grid.distance_to(player);
            let key = EngageCacheKey::new(distance, now, self.epoch);
            if let Some(cached) = self.score_cache.get(&key) {
                if cached.is_engaged && best.as_ref().map(|(_, s)| cached.score > *s).unwrap_or(true) {
                    best = Some((entity.id, cached.score));
                }
            }
        }
        best
    }

    /// Weighted engagement score for one candidate (spec §4.5 steps 4-5).
    fn score_entity(
        &self,
        entity: &Entity,
        distance: f32,
        now: Instant,
        radar_boss_endpoint: Option<GridPos>,
        locked_candidate_id: Option<u64>,
    ) -> f32 {
        let mut score = 0.0;
        let hp_not_full = entity.hp_fraction() < 0.999;
        if hp_not_full {
            score += 80.0;
        }

        let hp_changing = self
            .hp_samples
            .get(&entity.id)
            .map(|(prior_hp, at)| {
                now.duration_since(*at).as_secs_f32() <= HP_CHANGE_WINDOW_SECS
                    && (*prior_hp - entity.hp_cur).abs() >= 1
            })
            .unwrap_or(false);
        if hp_changing {
            score += 70.0;
        }

        let targetable_open = entity.is_targetable && distance < TARGETABLE_OPEN_RADIUS;
        if targetable_open {
            score += 30.0;
        }

        score -= 0.2 * distance;

        if hp_not_full && hp_changing {
            score += 15.0;
        }
        if targetable_open && hp_changing {
            score += 10.0;
        }

        if locked_candidate_id == Some(entity.id) {
            score += LOCKED_CANDIDATE_BONUS;
        }
        if resolver::is_likely_map_boss(entity, radar_boss_endpoint) {
            score += LIKELY_BOSS_BONUS;
        }

        score
    }
}
