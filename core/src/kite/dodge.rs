//! Behind-dodge burst and emergency roll-out (spec §4.6), the two
//! channeled-skill triggers layered on top of [`super::step`]'s
//! positioning.
//!
//! Grounded on `examples/other_examples/.../backend-src-player-state.rs`'s
//! stuck/unstuck timer pattern, adapted to the gated-burst semantics here.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use mapper_types::MapperSettings;

use crate::geometry::{dot, iso_unit_delta, normalize, point_on_ring, sub};
use crate::intent::Intent;
use crate::state::OrbitState;
use crate::world::GridPos;

const DODGE_GATE: Duration = Duration::from_millis(800);
const POST_ENGAGE_DELAY: Duration = Duration::from_millis(500);
const BEHIND_DOT_THRESHOLD: f32 = -0.12;
const POST_DODGE_SUPPRESSION: Duration = Duration::from_millis(520);

const CRAMPED_CORNER_RADIUS: f32 = 44.0;
const EMERGENCY_AWAY_DOT_THRESHOLD: f32 = 0.4;
const EMERGENCY_SUPPRESSION: Duration = Duration::from_millis(140);
const EMERGENCY_RADII: [f32; 3] = [68.0, 82.0, 96.0];
const EMERGENCY_MID_RADIUS: f32 = 82.0;

const BEHIND_RADIUS_STEP: f32 = 8.0;
const OPEN_SAMPLE_RADIUS: f32 = 12.0;
const OPEN_SAMPLE_COUNT: u32 = 8;
const WALL_SAMPLE_RADIUS: f32 = 4.0;
const WALL_SAMPLE_COUNT: u32 = 4;

const DODGE_ROLL_SKILL_SLOT: u8 = 4;

/// A burst of movement the dodge/roll system wants to emit this tick, plus
/// how long to suppress ordinary movement packets afterwards.
pub struct DodgeOutcome {
    pub intents: Vec<Intent>,
    pub suppress_movement_until: Option<Instant>,
}

/// Fraction (0..1) of `samples` points on a ring of `radius` around `center`
/// that are walkable; used as a rough openness/clearance proxy since the
/// world only exposes a point-wise `is_walkable` query.
fn nearby_walkable_fraction(is_walkable: &dyn Fn(GridPos) -> bool, center: GridPos, radius: f32, samples: u32) -> f32 {
    let mut walkable = 0;
    for i in 0..samples {
        let angle = (i as f32 / samples as f32) * TAU;
        if is_walkable(point_on_ring(center, angle, radius)) {
            walkable += 1;
        }
    }
    walkable as f32 / samples as f32
}

/// Behind-dodge burst: rolls away when the boss is attacking from behind
/// and we're cramped, gated to once per 800ms and only after 500ms of
/// having been engaged.
pub fn behind_dodge(
    orbit: &mut OrbitState,
    now: Instant,
    player: GridPos,
    boss: GridPos,
    boss_facing: (f32, f32),
    settings: &MapperSettings,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> Option<DodgeOutcome> {
    if !settings.boss_dodge_roll_enabled {
        return None;
    }
    let engaged_at = orbit.engaged_at?;
    if now.duration_since(engaged_at) < POST_ENGAGE_DELAY {
        return None;
    }
    if let Some(last) = orbit.dodge_last_emit_at {
        if now.duration_since(last) < DODGE_GATE {
            return None;
        }
    }

    let to_player = normalize(sub(player, boss));
    if dot(boss_facing, to_player) >= BEHIND_DOT_THRESHOLD {
        return None;
    }
    if player.distance_to(boss) > settings.boss_dodge_roll_distance {
        return None;
    }

    let landing = pick_behind_landing(orbit, boss, boss_facing, settings, is_walkable)?;

    orbit.dodge_last_emit_at = Some(now);
    let (dx, dy) = iso_unit_delta(player, landing);
    Some(DodgeOutcome {
        intents: vec![Intent::ChanneledSkill { skill_bytes: Vec::new(), dx, dy, slot: DODGE_ROLL_SKILL_SLOT }],
        suppress_movement_until: Some(now + POST_DODGE_SUPPRESSION),
    })
}

/// Candidate generation/scoring for the behind-dodge landing spot (spec
/// §4.6): an arc of angles behind the boss's facing, each tried at three
/// radii around `boss_dodge_roll_distance`, filtered to walkable spots
/// genuinely behind the boss and scored by clearance, side continuity with
/// the current orbit direction, wall-hug penalty, and radius deviation.
fn pick_behind_landing(
    orbit: &mut OrbitState,
    boss: GridPos,
    boss_facing: (f32, f32),
    settings: &MapperSettings,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> Option<GridPos> {
    let behind_angle = (-boss_facing.1).atan2(-boss_facing.0);
    let base_radius = settings.boss_dodge_roll_distance;
    let angle_offsets_deg = [0.0, settings.boss_dodge_behind_min_deg, settings.boss_dodge_behind_max_deg];
    let radii = [base_radius, base_radius - BEHIND_RADIUS_STEP, base_radius + BEHIND_RADIUS_STEP];

    let mut best: Option<(f32, GridPos, i8)> = None;
    for &angle_deg in &angle_offsets_deg {
        for &radius in &radii {
            if radius <= 0.0 {
                continue;
            }
            let angle_rad = behind_angle + angle_deg.to_radians();
            let landing = point_on_ring(boss, angle_rad, radius);
            if !is_walkable(landing) {
                continue;
            }
            let to_landing = normalize(sub(landing, boss));
            if dot(boss_facing, to_landing) >= BEHIND_DOT_THRESHOLD {
                continue;
            }

            let side: i8 = if angle_deg < 0.0 {
                -1
            } else if angle_deg > 0.0 {
                1
            } else {
                orbit.direction
            };

            let clearance = nearby_walkable_fraction(is_walkable, landing, OPEN_SAMPLE_RADIUS, OPEN_SAMPLE_COUNT);
            let wall_hug = 1.0 - nearby_walkable_fraction(is_walkable, landing, WALL_SAMPLE_RADIUS, WALL_SAMPLE_COUNT);
            let side_bias = if side == orbit.direction { 5.0 } else { 0.0 };
            let radius_deviation_penalty = (radius - base_radius).abs() * 0.5;

            let score = clearance * 10.0 + side_bias - wall_hug * 15.0 - radius_deviation_penalty;
            if best.as_ref().map(|(s, _, _)| score > *s).unwrap_or(true) {
                best = Some((score, landing, side));
            }
        }
    }

    let (_, landing, side) = best?;
    orbit.direction = side;
    Some(landing)
}

/// Emergency roll-out: when cramped into a corner (< 44u clearance from the
/// boss-opposite direction) with a clear escape direction, roll out
/// regardless of the behind-dodge gate. Candidate landings are generated
/// away from the boss at three radii, filtered to walkable spots whose
/// away-dot clears the threshold, and scored by openness.
pub fn emergency_roll_out(
    orbit: &mut OrbitState,
    now: Instant,
    player: GridPos,
    boss: GridPos,
    is_walkable: &dyn Fn(GridPos) -> bool,
) -> Option<DodgeOutcome> {
    if let Some(last) = orbit.emergency_dodge_last_emit_at {
        if now.duration_since(last) < EMERGENCY_SUPPRESSION {
            return None;
        }
    }

    let clearance = nearby_walkable_fraction(is_walkable, player, CRAMPED_CORNER_RADIUS, OPEN_SAMPLE_COUNT);
    if clearance >= 0.5 {
        return None;
    }

    let away = normalize(sub(player, boss));
    if away == (0.0, 0.0) {
        return None;
    }
    let away_angle = away.1.atan2(away.0);

    let mut best: Option<(f32, GridPos)> = None;
    for &radius in &EMERGENCY_RADII {
        let candidate = point_on_ring(player, away_angle, radius);
        if !is_walkable(candidate) {
            continue;
        }
        let to_candidate = normalize(sub(candidate, boss));
        if dot(to_candidate, away) <= EMERGENCY_AWAY_DOT_THRESHOLD {
            continue;
        }
        let openness = nearby_walkable_fraction(is_walkable, candidate, OPEN_SAMPLE_RADIUS, OPEN_SAMPLE_COUNT);
        let radius_deviation_penalty = (radius - EMERGENCY_MID_RADIUS).abs() * 0.05;
        let score = openness - radius_deviation_penalty;
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, candidate));
        }
    }
    let (_, landing) = best?;

    orbit.emergency_dodge_last_emit_at = Some(now);
    let (dx, dy) = iso_unit_delta(player, landing);
    Some(DodgeOutcome {
        intents: vec![Intent::ChanneledSkill { skill_bytes: Vec::new(), dx, dy, slot: DODGE_ROLL_SKILL_SLOT }],
        suppress_movement_until: Some(now + EMERGENCY_SUPPRESSION),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MapperSettings {
        MapperSettings::default()
    }

    fn walkable_everywhere(_p: GridPos) -> bool {
        true
    }

    #[test]
    fn behind_dodge_fires_when_attacked_from_behind_and_close() {
        let mut orbit = OrbitState::default();
        let t0 = Instant::now();
        orbit.engaged_at = Some(t0);
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(20.0, 0.0);
        let boss_facing = (1.0, 0.0);
        let now = t0 + Duration::from_millis(600);
        let outcome = behind_dodge(&mut orbit, now, player, boss, boss_facing, &settings(), &walkable_everywhere);
        assert!(outcome.is_some());
    }

    #[test]
    fn behind_dodge_locks_orbit_direction_to_chosen_side() {
        let mut orbit = OrbitState::default();
        orbit.direction = -1;
        let t0 = Instant::now();
        orbit.engaged_at = Some(t0);
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(20.0, 0.0);
        let boss_facing = (1.0, 0.0);
        let now = t0 + Duration::from_millis(600);
        let outcome = behind_dodge(&mut orbit, now, player, boss, boss_facing, &settings(), &walkable_everywhere);
        assert!(outcome.is_some());
        assert!(orbit.direction == 1 || orbit.direction == -1);
    }

    #[test]
    fn behind_dodge_respects_gate() {
        let mut orbit = OrbitState::default();
        let t0 = Instant::now();
        orbit.engaged_at = Some(t0);
        orbit.dodge_last_emit_at = Some(t0 + Duration::from_millis(600));
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(20.0, 0.0);
        let boss_facing = (1.0, 0.0);
        let now = t0 + Duration::from_millis(900);
        let outcome = behind_dodge(&mut orbit, now, player, boss, boss_facing, &settings(), &walkable_everywhere);
        assert!(outcome.is_none(), "gate should prevent re-firing within 800ms");
    }

    #[test]
    fn behind_dodge_finds_no_landing_when_nothing_is_walkable() {
        let mut orbit = OrbitState::default();
        let t0 = Instant::now();
        orbit.engaged_at = Some(t0);
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(20.0, 0.0);
        let boss_facing = (1.0, 0.0);
        let now = t0 + Duration::from_millis(600);
        let outcome = behind_dodge(&mut orbit, now, player, boss, boss_facing, &settings(), &|_| false);
        assert!(outcome.is_none());
    }

    #[test]
    fn emergency_roll_out_requires_cramped_corner() {
        let mut orbit = OrbitState::default();
        let now = Instant::now();
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(60.0, 0.0);
        let outcome = emergency_roll_out(&mut orbit, now, player, boss, &walkable_everywhere);
        assert!(outcome.is_none(), "open ground should not trigger an emergency roll");
    }

    #[test]
    fn emergency_roll_out_fires_when_surrounded_except_one_escape() {
        let mut orbit = OrbitState::default();
        let now = Instant::now();
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(10.0, 0.0);
        // Only the away-from-boss direction (negative x) is walkable.
        let is_walkable = |p: GridPos| p.x < player.x - 1.0;
        let outcome = emergency_roll_out(&mut orbit, now, player, boss, &is_walkable);
        assert!(outcome.is_some());
        assert!(orbit.emergency_dodge_last_emit_at.is_some());
    }

    #[test]
    fn emergency_roll_out_respects_suppression_gate() {
        let mut orbit = OrbitState::default();
        orbit.emergency_dodge_last_emit_at = Some(Instant::now());
        let now = orbit.emergency_dodge_last_emit_at.unwrap() + Duration::from_millis(50);
        let player = GridPos::new(0.0, 0.0);
        let boss = GridPos::new(10.0, 0.0);
        let is_walkable = |p: GridPos| p.x < player.x - 1.0;
        let outcome = emergency_roll_out(&mut orbit, now, player, boss, &is_walkable);
        assert!(outcome.is_none(), "suppression window should block re-firing");
    }
}
