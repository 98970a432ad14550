//! Combat Kite (spec §4.6): reposition logic for `FIGHT_BOSS`, covering ring
//! reposition, orbit stepping, fence-escape widening, and the dodge/roll
//! burst handled by [`dodge`].
//!
//! Grounded on the teacher's `signal_processor::combat_state` dispatch
//! pattern: a match on a small state enum, each arm a free function taking
//! `&mut OrbitState` and returning the intents for this tick.

pub mod dodge;

use std::time::{Duration, Instant};

use rand::Rng;

use crate::geometry::{angle_of, dot, move_towards, normalize, point_on_ring, sub};
use crate::intent::Intent;
use crate::state::OrbitState;
use crate::world::GridPos;

const RING_REPOSITION_RADIUS: f32 = 120.0;
const RING_ARRIVAL_THRESHOLD: f32 = 18.0;
const MICRO_STALL_DISTANCE: f32 = 2.5;
const MICRO_STALL_SECS: f32 = 2.2;

const ORBIT_SECTORS: u8 = 16;
const ORBIT_RADIUS_BASE: f32 = 58.0;
const ORBIT_RADIUS_JITTER: f32 = 10.0;
const ORBIT_WAYPOINT_EXPIRE: Duration = Duration::from_millis(2600);
const ORBIT_WAYPOINT_EXPIRE_CRAMPED: Duration = Duration::from_millis(3400);

const FENCE_ESCAPE_ANGLE_STEPS: [f32; 4] = [1.0, 1.25, 1.5, 1.8];
const FENCE_ESCAPE_RADII: [f32; 2] = [76.0, 108.0];
const FENCE_ESCAPE_CLEARANCE: f32 = 6.0;

/// What the kite decided to do this tick; `mapper.rs` turns this into a
/// `Vec<Intent>` alongside any dodge-burst intents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KiteStep {
    Idle,
    MoveTo { screen_angle_deg: f32, distance_units: f32 },
}

/// Entry point called every `FIGHT_BOSS` tick once engaged; `is_walkable`
/// lets fence-escape probe for clearance without touching `WorldApi`
/// directly (keeps this module pure/testable).
pub fn step(
    orbit: &mut OrbitState,
    now: Instant,
    player: GridPos,
    boss: GridPos,
    max_move_distance: f32,
    use_wide_orbit: bool,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> KiteStep {
    let distance = player.distance_to(boss);
    track_micro_stall(orbit, now, player);

    if distance > RING_REPOSITION_RADIUS {
        return ring_reposition(player, boss, max_move_distance);
    }

    orbit_kite(orbit, now, player, boss, max_move_distance, use_wide_orbit, is_walkable)
}

fn track_micro_stall(orbit: &mut OrbitState, now: Instant, player: GridPos) {
    let Some(last_pos) = orbit.last_position else {
        orbit.last_position = Some(player);
        orbit.last_position_at = Some(now);
        return;
    };
    let Some(last_at) = orbit.last_position_at else {
        orbit.last_position_at = Some(now);
        return;
    };
    let elapsed = now.duration_since(last_at).as_secs_f32();
    if elapsed < MICRO_STALL_SECS {
        return;
    }
    if player.distance_to(last_pos) < MICRO_STALL_DISTANCE {
        orbit.consecutive_micro_stalls += 1;
        if orbit.consecutive_micro_stalls >= 2 {
            orbit.flip_direction();
            orbit.consecutive_micro_stalls = 0;
        }
    } else {
        orbit.consecutive_micro_stalls = 0;
    }
    orbit.last_position = Some(player);
    orbit.last_position_at = Some(now);
}

/// Direct-commit repositioning back towards ring distance when the boss has
/// drifted beyond `RING_REPOSITION_RADIUS`.
fn ring_reposition(player: GridPos, boss: GridPos, max_move_distance: f32) -> KiteStep {
    let target = point_on_ring(boss, angle_of(boss, player), RING_REPOSITION_RADIUS - RING_ARRIVAL_THRESHOLD);
    if player.distance_to(target) < RING_ARRIVAL_THRESHOLD {
        return KiteStep::Idle;
    }
    let (angle, dist) = move_towards(player, target, max_move_distance);
    KiteStep::MoveTo { screen_angle_deg: angle, distance_units: dist }
}

fn orbit_kite(
    orbit: &mut OrbitState,
    now: Instant,
    player: GridPos,
    boss: GridPos,
    max_move_distance: f32,
    use_wide_orbit: bool,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> KiteStep {
    let expired = orbit
        .waypoint_set_at
        .map(|at| now.duration_since(at) > waypoint_expiry(use_wide_orbit))
        .unwrap_or(true);
    let arrived = orbit
        .current_waypoint
        .map(|wp| player.distance_to(wp) < RING_ARRIVAL_THRESHOLD)
        .unwrap_or(true);

    if expired || arrived || orbit.current_waypoint.is_none() {
        if let Some(wp) = pick_orbit_waypoint(orbit, now, player, boss, is_walkable) {
            orbit.current_waypoint = Some(wp);
            orbit.waypoint_set_at = Some(now);
        } else if let Some(wp) = fence_escape(player, boss, is_walkable) {
            orbit.current_waypoint = Some(wp);
            orbit.waypoint_set_at = Some(now);
        } else {
            return KiteStep::Idle;
        }
    }

    let wp = orbit.current_waypoint.unwrap();
    let (angle, dist) = move_towards(player, wp, max_move_distance);
    KiteStep::MoveTo { screen_angle_deg: angle, distance_units: dist }
}

fn waypoint_expiry(use_wide_orbit: bool) -> Duration {
    if use_wide_orbit {
        ORBIT_WAYPOINT_EXPIRE_CRAMPED
    } else {
        ORBIT_WAYPOINT_EXPIRE
    }
}

/// Choose the next orbit sector: step 2-5 sectors (jittered, signed by
/// `orbit.direction`) from the current angle, skipping the last
/// `ORBIT_SKIP_LAST_SECTORS` recently visited.
fn pick_orbit_waypoint(
    orbit: &mut OrbitState,
    _now: Instant,
    player: GridPos,
    boss: GridPos,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> Option<GridPos> {
    let current_angle = angle_of(boss, player);
    let current_sector = angle_to_sector(current_angle);

    let mut rng = rand::thread_rng();
    let jitter: i32 = rng.gen_range(2..=5);
    let step = jitter * orbit.direction as i32;
    let candidate_sector = ((current_sector as i32 + step).rem_euclid(ORBIT_SECTORS as i32)) as u8;

    if orbit.recent_sectors.contains(candidate_sector) {
        return None;
    }

    let radius = ORBIT_RADIUS_BASE + rng.gen_range(-ORBIT_RADIUS_JITTER..=ORBIT_RADIUS_JITTER);
    let angle = sector_to_angle(candidate_sector);
    let point = point_on_ring(boss, angle, radius);

    if !is_walkable(point) {
        return None;
    }

    orbit.recent_sectors.push(candidate_sector);
    Some(point)
}

fn angle_to_sector(angle_rad: f32) -> u8 {
    let tau = std::f32::consts::TAU;
    let normalized = angle_rad.rem_euclid(tau);
    ((normalized / tau) * ORBIT_SECTORS as f32) as u8 % ORBIT_SECTORS
}

fn sector_to_angle(sector: u8) -> f32 {
    (sector as f32 / ORBIT_SECTORS as f32) * std::f32::consts::TAU
}

/// Widened angle/radius search used when normal orbit sectors are all
/// boxed in by terrain (spec §4.6 "fence-escape").
fn fence_escape(player: GridPos, boss: GridPos, is_walkable: &dyn Fn(GridPos) -> bool) -> Option<GridPos> {
    let current_angle = angle_of(boss, player);
    for &step in &FENCE_ESCAPE_ANGLE_STEPS {
        for &radius in &FENCE_ESCAPE_RADII {
            for sign in [1.0f32, -1.0] {
                let angle = current_angle + sign * step;
                let point = point_on_ring(boss, angle, radius);
                if is_walkable(point) && clearance_ok(point, is_walkable) {
                    return Some(point);
                }
            }
        }
    }
    None
}

fn clearance_ok(point: GridPos, is_walkable: &dyn Fn(GridPos) -> bool) -> bool {
    let probes = [
        GridPos::new(point.x + FENCE_ESCAPE_CLEARANCE, point.y),
        GridPos::new(point.x - FENCE_ESCAPE_CLEARANCE, point.y),
        GridPos::new(point.x, point.y + FENCE_ESCAPE_CLEARANCE),
        GridPos::new(point.x, point.y - FENCE_ESCAPE_CLEARANCE),
    ];
    probes.iter().all(|p| is_walkable(*p))
}

/// Whether `point` is behind the boss relative to its facing, used by the
/// dodge burst's behind-only filter (dot product < -0.12).
pub fn is_behind(boss_facing: (f32, f32), boss: GridPos, point: GridPos) -> bool {
    let to_point = normalize(sub(point, boss));
    dot(boss_facing, to_point) < -0.12
}

pub fn intent_from_step(step: KiteStep) -> Vec<Intent> {
    match step {
        KiteStep::Idle => Vec::new(),
        KiteStep::MoveTo { screen_angle_deg, distance_units } => {
            vec![Intent::Move { screen_angle_deg, distance_units }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beyond_ring_radius_triggers_reposition() {
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(200.0, 0.0);
        match ring_reposition(player, boss, 40.0) {
            KiteStep::MoveTo { .. } => {}
            KiteStep::Idle => panic!("expected reposition move"),
        }
    }

    #[test]
    fn sector_round_trip_is_consistent() {
        for s in 0..ORBIT_SECTORS {
            let angle = sector_to_angle(s);
            assert_eq!(angle_to_sector(angle), s);
        }
    }

    #[test]
    fn micro_stall_flips_direction_after_two() {
        let mut orbit = OrbitState::default();
        let t0 = Instant::now();
        let pos = GridPos::new(0.0, 0.0);
        track_micro_stall(&mut orbit, t0, pos);
        track_micro_stall(&mut orbit, t0 + Duration::from_millis(2300), pos);
        assert_eq!(orbit.direction, 1, "single stall should not flip yet");
        track_micro_stall(&mut orbit, t0 + Duration::from_millis(4600), pos);
        assert_eq!(orbit.direction, -1, "second consecutive stall should flip direction");
    }

    #[test]
    fn behind_filter_rejects_front_facing_point() {
        let boss = GridPos::new(0.0, 0.0);
        let facing = (1.0, 0.0);
        let in_front = GridPos::new(10.0, 0.0);
        assert!(!is_behind(facing, boss, in_front));
        let behind = GridPos::new(-10.0, 0.0);
        assert!(is_behind(facing, boss, behind));
    }
}
