//! Path-follow Walker (spec §4.3): commit/step contract over a 3-tier
//! pathfinder fallback, waypoint advance, stuck detection, and rate-limited
//! movement emission.
//!
//! Grounded on the teacher's `signal_processor::combat_state` dispatch for
//! the step/advance contract, and on
//! `examples/other_examples/.../backend-src-player-state.rs` for the
//! stuck/nudge/reroute counters.

pub mod solver;

use std::time::{Duration, Instant};

use mapper_types::MapperSettings;
use rand::Rng;

use crate::error::RecoveryEvent;
use crate::geometry::move_towards;
use crate::intent::Intent;
use crate::state::PathState;
use crate::world::{GridPos, WorldApi};

pub use solver::{solve, PathSource};

const STUCK_POSITION_DELTA: f32 = 2.0;
const STUCK_FAILURE_LIMIT: u32 = 5;
const MOVE_PACKET_GAP: Duration = Duration::from_millis(120);
const STOP_PACKET_GAP: Duration = Duration::from_millis(300);
const DODGE_BURST_SUPPRESSION: Duration = Duration::from_millis(520);

/// Outcome of a single `PathWalker::step` call, feeding the state machine's
/// own transition logic (e.g. `WALK_TEMPLE` watches for `Arrived`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStepResult {
    Moving,
    Arrived,
    Stuck,
    NoPath,
}

/// Outcome of a single stuck-recovery attempt (spec §4.3/§7 "Stuck" row).
enum StuckRecovery {
    /// A BFS re-route replaced the waypoint list; fall through to normal
    /// waypoint-follow logic this same tick.
    Rerouted,
    /// BFS failed; a one-off nudge packet was emitted and the path cleared.
    Nudged(Vec<Intent>),
}

/// Committing to a new target resets cursor/counters and requests a fresh
/// route from [`solve`]; `repath` re-requests without resetting stuck
/// counters, used on periodic refresh.
pub struct PathWalker<'a> {
    state: &'a mut PathState,
    settings: &'a MapperSettings,
}

impl<'a> PathWalker<'a> {
    pub fn new(state: &'a mut PathState, settings: &'a MapperSettings) -> Self {
        Self { state, settings }
    }

    pub fn commit(&mut self, now: Instant, target: GridPos, target_name: impl Into<String>, waypoints: Vec<GridPos>) {
        self.state.clear();
        self.state.waypoints = waypoints;
        self.state.target = target;
        self.state.target_name = target_name.into();
        self.state.committed_at = Some(now);
        self.state.stuck_counter = 0;
        self.state.last_moved_at = Some(now);
        self.state.last_known_pos = None;
    }

    /// Whether a periodic repath is due (spec: "re-derive the route on a
    /// fixed interval as a correctness net, not just on failure").
    pub fn repath_due(&self, now: Instant) -> bool {
        self.state
            .last_repath
            .map(|at| now.duration_since(at).as_millis() as u64 >= self.settings.repath_interval_ms)
            .unwrap_or(true)
    }

    pub fn mark_repathed(&mut self, now: Instant) {
        self.state.last_repath = Some(now);
    }

    /// Advance the walk by one tick, returning what happened and any
    /// movement intents to dispatch (already rate-limited). `world` backs
    /// the stuck-recovery BFS re-route attempt.
    pub fn step(&mut self, now: Instant, player: GridPos, world: &dyn WorldApi) -> (PathStepResult, Vec<Intent>, Option<RecoveryEvent>) {
        if self.state.waypoints.is_empty() {
            return (PathStepResult::NoPath, Vec::new(), Some(RecoveryEvent::NoPath { target: self.state.target }));
        }

        let newly_stuck = self.track_stuck(now, player);
        if self.state.stuck_counter > STUCK_FAILURE_LIMIT {
            return (PathStepResult::Stuck, Vec::new(), Some(RecoveryEvent::Stuck { consecutive: self.state.stuck_counter }));
        }

        if newly_stuck {
            if let StuckRecovery::Nudged(intents) = self.attempt_stuck_recovery(now, player, world) {
                return (PathStepResult::Moving, intents, None);
            }
        }

        loop {
            let Some(wp) = self.state.current_waypoint() else {
                break;
            };
            let is_final = self.state.cursor + 1 >= self.state.waypoints.len();
            let threshold = if is_final { self.settings.arrival_threshold } else { self.settings.waypoint_threshold };
            if player.distance_to(wp) < threshold {
                self.state.cursor += 1;
                continue;
            }
            break;
        }

        let Some(wp) = self.state.current_waypoint() else {
            return (PathStepResult::Arrived, Vec::new(), None);
        };

        let intents = self.emit_move(now, player, wp);
        (PathStepResult::Moving, intents, None)
    }

    /// Attempt BFS re-route to the current target; fall back to a one-off
    /// nudge packet and clear the path on failure (spec §4.3/§7).
    fn attempt_stuck_recovery(&mut self, now: Instant, player: GridPos, world: &dyn WorldApi) -> StuckRecovery {
        if let Ok(path) = world.find_path_bfs(player, self.state.target) {
            if !path.is_empty() {
                self.state.waypoints = path;
                self.state.cursor = 0;
                return StuckRecovery::Rerouted;
            }
        }

        let mut rng = rand::thread_rng();
        let angle_deg: f32 = rng.gen_range(0.0..360.0);
        let distance = self.settings.stuck_move_distance;
        self.state.clear();
        StuckRecovery::Nudged(self.emit_move_gated(now, angle_deg, distance))
    }

    /// Returns `true` the tick the stuck counter is freshly incremented
    /// (player hasn't moved `STUCK_POSITION_DELTA` units in
    /// `stuck_timeout_ms`).
    fn track_stuck(&mut self, now: Instant, player: GridPos) -> bool {
        let Some(last_pos) = self.state.last_known_pos else {
            self.state.last_known_pos = Some(player);
            self.state.last_moved_at = Some(now);
            return false;
        };
        let Some(last_moved) = self.state.last_moved_at else {
            self.state.last_moved_at = Some(now);
            return false;
        };
        let elapsed_ms = now.duration_since(last_moved).as_millis() as u64;
        if elapsed_ms < self.settings.stuck_timeout_ms {
            return false;
        }
        let newly_stuck = if player.distance_to(last_pos) < STUCK_POSITION_DELTA {
            self.state.stuck_counter += 1;
            true
        } else {
            self.state.stuck_counter = 0;
            false
        };
        self.state.last_known_pos = Some(player);
        self.state.last_moved_at = Some(now);
        newly_stuck
    }

    fn emit_move(&mut self, now: Instant, player: GridPos, waypoint: GridPos) -> Vec<Intent> {
        let (angle, dist) = move_towards(player, waypoint, self.settings.max_move_distance);
        self.emit_move_gated(now, angle, dist)
    }

    fn emit_move_gated(&mut self, now: Instant, angle_deg: f32, distance_units: f32) -> Vec<Intent> {
        if let Some(last) = self.state.last_move_emit_at {
            if now.duration_since(last) < MOVE_PACKET_GAP.max(Duration::from_millis(self.settings.move_packet_gap_ms())) {
                return Vec::new();
            }
        }
        self.state.last_move_emit_at = Some(now);
        vec![Intent::Move { screen_angle_deg: angle_deg, distance_units }]
    }

    pub fn emit_stop(&mut self, now: Instant) -> Vec<Intent> {
        if let Some(last) = self.state.last_stop_emit_at {
            if now.duration_since(last) < STOP_PACKET_GAP {
                return Vec::new();
            }
        }
        self.state.last_stop_emit_at = Some(now);
        vec![Intent::Stop]
    }
}

/// Suppression window applied to ordinary movement packets right after a
/// dodge burst fires, so the kite's own repositioning doesn't fight the
/// just-emitted roll.
pub fn dodge_suppression_until(now: Instant) -> Instant {
    now + DODGE_BURST_SUPPRESSION
}
