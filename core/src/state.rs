//! The data model from spec §3, consolidated into fields of the owned
//! [`crate::Mapper`] struct rather than the ~100 module-scope variables the
//! source carries (spec §9 Design Notes).

use std::time::Instant;

use hashbrown::HashMap;

use crate::world::GridPos;

/// The nine states of the objective state machine (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    FindTemple,
    WalkTemple,
    ClearTemple,
    FindBoss,
    WalkBossCheckpoint,
    WalkBossMelee,
    FightBoss,
    Complete,
}

impl Default for State {
    fn default() -> Self {
        State::Idle
    }
}

#[derive(Debug, Clone, Default)]
pub struct TempleState {
    pub known: bool,
    pub pos: GridPos,
    pub cleared: bool,
    pub no_hostiles_since: Option<Instant>,
    pub center_seen_at: Option<Instant>,
    /// When the no-hostiles-but-not-at-centre phase began; spec §9
    /// consolidates the source's 8s/14s dual watchdog into a single ≤14s
    /// total-time budget measured from here.
    pub clear_phase_started_at: Option<Instant>,
}

impl TempleState {
    pub fn reset(&mut self) {
        *self = TempleState::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Checkpoint,
    ArenaAnchor,
    RadarBoss,
    None,
}

#[derive(Debug, Clone)]
pub struct BossState {
    pub target: Option<GridPos>,
    pub target_source: TargetSource,
    pub candidate_id: Option<u64>,
    pub entity_id: Option<u64>,
    pub dead: bool,
    pub checkpoint_reached: bool,
    pub hp_samples: HashMap<u64, (i64, Instant)>,
    /// Failed targets; a position within 50u of any entry here is
    /// unreachable and may not be re-selected.
    pub abandoned: Vec<GridPos>,
    /// Set when the boss was encountered while still walking to the temple,
    /// so that `FIGHT_BOSS` resumes the temple objective on completion.
    pub resume_temple_after_boss: bool,
    /// Timestamps bookkeeping for watchdogs (checkpoint stall/unreachable,
    /// fight inactivity).
    pub checkpoint_commit_at: Option<Instant>,
    pub checkpoint_best_distance: Option<f32>,
    pub checkpoint_best_distance_at: Option<Instant>,
    pub fight_last_activity_at: Option<Instant>,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            target: None,
            target_source: TargetSource::None,
            candidate_id: None,
            entity_id: None,
            dead: false,
            checkpoint_reached: false,
            hp_samples: HashMap::new(),
            abandoned: Vec::new(),
            resume_temple_after_boss: false,
            checkpoint_commit_at: None,
            checkpoint_best_distance: None,
            checkpoint_best_distance_at: None,
            fight_last_activity_at: None,
        }
    }
}

impl BossState {
    pub fn reset(&mut self) {
        *self = BossState::default();
    }

    /// A position within 50u of an abandoned entry is unreachable.
    pub fn is_abandoned(&self, pos: GridPos) -> bool {
        self.abandoned.iter().any(|a| a.distance_to(pos) < 50.0)
    }

    pub fn abandon(&mut self, pos: GridPos) {
        if !self.is_abandoned(pos) {
            self.abandoned.push(pos);
        }
    }

    /// Prune HP samples older than 12s (spec §4.5 step 3).
    pub fn prune_hp_samples(&mut self, now: Instant) {
        self.hp_samples.retain(|_, (_, at)| now.duration_since(*at).as_secs_f32() < 12.0);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathState {
    pub waypoints: Vec<GridPos>,
    pub cursor: usize,
    pub last_repath: Option<Instant>,
    pub target: GridPos,
    pub target_name: String,
    pub committed_at: Option<Instant>,
    pub stuck_counter: u32,
    pub last_moved_at: Option<Instant>,
    pub last_known_pos: Option<GridPos>,
    /// Rate-limit gates for emitted packets (spec §4.3/§5). These live here,
    /// not on `PathWalker`, because a fresh `PathWalker` is constructed every
    /// tick and must not reset them.
    pub last_move_emit_at: Option<Instant>,
    pub last_stop_emit_at: Option<Instant>,
}

impl PathState {
    /// `waypoints.cursor <= waypoints.len()`; on overrun, clear and
    /// re-request (spec §3 invariants).
    pub fn current_waypoint(&self) -> Option<GridPos> {
        if self.cursor < self.waypoints.len() {
            Some(self.waypoints[self.cursor])
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.cursor = 0;
    }
}

/// A small fixed-capacity ring buffer of recently used orbit sectors, used
/// to avoid immediately re-picking the last few sectors (spec §4.6).
#[derive(Debug, Clone, Default)]
pub struct RecentSectors {
    buf: [u8; 4],
    len: usize,
    next: usize,
}

impl RecentSectors {
    pub fn push(&mut self, sector: u8) {
        self.buf[self.next] = sector;
        self.next = (self.next + 1) % self.buf.len();
        self.len = (self.len + 1).min(self.buf.len());
    }

    pub fn contains(&self, sector: u8) -> bool {
        self.buf[..self.len].contains(&sector)
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.next = 0;
    }
}

#[derive(Debug, Clone)]
pub struct OrbitState {
    pub direction: i8,
    pub blocked_count: u32,
    pub reverse_until: Option<Instant>,
    pub recent_sectors: RecentSectors,
    /// Micro-stall detection: position sampled on orbit waypoint checks.
    pub last_position: Option<GridPos>,
    pub last_position_at: Option<Instant>,
    pub consecutive_micro_stalls: u32,
    pub current_waypoint: Option<GridPos>,
    pub waypoint_set_at: Option<Instant>,
    pub dodge_last_emit_at: Option<Instant>,
    pub emergency_dodge_last_emit_at: Option<Instant>,
    pub engaged_at: Option<Instant>,
}

impl Default for OrbitState {
    fn default() -> Self {
        Self {
            direction: 1,
            blocked_count: 0,
            reverse_until: None,
            recent_sectors: RecentSectors::default(),
            last_position: None,
            last_position_at: None,
            consecutive_micro_stalls: 0,
            current_waypoint: None,
            waypoint_set_at: None,
            dodge_last_emit_at: None,
            emergency_dodge_last_emit_at: None,
            engaged_at: None,
        }
    }
}

impl OrbitState {
    /// Reset on entering FIGHT_BOSS: random initial direction, empty
    /// sector history (spec §4.2 transition invariants).
    pub fn reset_for_fight(&mut self, now: Instant, direction: i8) {
        *self = OrbitState::default();
        self.direction = direction;
        self.engaged_at = Some(now);
    }

    pub fn flip_direction(&mut self) {
        self.direction = -self.direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_sectors_tracks_last_four() {
        let mut rs = RecentSectors::default();
        for s in [1, 2, 3, 4, 5] {
            rs.push(s);
        }
        assert!(!rs.contains(1), "oldest sector should have been evicted");
        assert!(rs.contains(2));
        assert!(rs.contains(5));
    }

    #[test]
    fn abandoned_merge_radius() {
        let mut boss = BossState::default();
        boss.abandon(GridPos::new(100.0, 100.0));
        assert!(boss.is_abandoned(GridPos::new(130.0, 100.0)));
        assert!(!boss.is_abandoned(GridPos::new(200.0, 100.0)));
    }
}
