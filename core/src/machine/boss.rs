//! FIND_BOSS, WALK_BOSS_CHECKPOINT, WALK_BOSS_MELEE, FIGHT_BOSS, and
//! COMPLETE handlers.

use std::time::Instant;

use mapper_types::MapperSettings;

use crate::geometry::move_towards;
use crate::intent::Intent;
use crate::kite;
use crate::kite::dodge;
use crate::machine::Transition;
use crate::mapper::Mapper;
use crate::path::{solve, PathStepResult, PathWalker};
use crate::resolver;
use crate::state::{State, TargetSource};
use crate::world::{AreaInfo, EntityFilter, EntityKind, GridPos, WorldApi};

const ASTAR_ITER_HINT: u32 = 150_000;
const CHECKPOINT_STALL_SECS: f32 = 5.0;
const CHECKPOINT_UNREACHABLE_SECS: f32 = 32.0;
const FIGHT_INACTIVITY_SECS: f32 = 30.0;
const FIND_BOSS_SCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3);

pub(crate) fn radar_boss_endpoint(world: &dyn WorldApi) -> Option<GridPos> {
    world.radar_paths().into_iter().find(|p| p.name.to_ascii_lowercase().contains("boss")).map(|p| p.target)
}

pub fn handle_find_boss(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    let due = mapper
        .boss
        .checkpoint_best_distance_at
        .map(|at| now.duration_since(at) >= FIND_BOSS_SCAN_INTERVAL)
        .unwrap_or(true);
    if !due {
        return Transition::stay(Vec::new());
    }
    mapper.boss.checkpoint_best_distance_at = Some(now);

    let temple = if mapper.temple.known { Some(mapper.temple.pos) } else { None };
    let radar_boss = radar_boss_endpoint(world);
    let entities = world.entities(&EntityFilter { alive_only: true, max_distance: Some(settings.boss_search_radius), ..Default::default() });

    if let Some(pos) = resolver::resolve_boss_checkpoint(&entities, player, temple, radar_boss, |p| mapper.boss.is_abandoned(p)) {
        if let Some(event) = resolver::reject_if_near_temple(pos, temple) {
            return Transition::stay(Vec::new()).recovery(event);
        }
        mapper.boss.target = Some(pos);
        mapper.boss.target_source = TargetSource::Checkpoint;
        return Transition::go(State::WalkBossCheckpoint);
    }

    let mut invalid_events = Vec::new();
    let anchor = resolver::resolve_arena_anchor(&entities, player, temple, radar_boss, |p| mapper.boss.is_abandoned(p), |e| invalid_events.push(e));
    if let Some(pos) = anchor {
        if let Some(event) = resolver::reject_if_near_temple(pos, temple) {
            invalid_events.push(event);
        } else {
            mapper.boss.target = Some(pos);
            mapper.boss.target_source = TargetSource::ArenaAnchor;
            let mut t = Transition::go(State::WalkBossCheckpoint);
            t.recoveries = invalid_events;
            return t;
        }
    }

    if let Some(pos) = radar_boss {
        mapper.boss.target = Some(pos);
        mapper.boss.target_source = TargetSource::RadarBoss;
        let mut t = Transition::go(State::WalkBossCheckpoint);
        t.recoveries = invalid_events;
        return t;
    }

    let mut t = Transition::stay(explore_forward(settings, player, &entities));
    t.recoveries = invalid_events;
    t
}

/// No target chosen yet: continue forward exploration following the
/// nearest targetable hostile's heading, or hold if none visible.
fn explore_forward(settings: &MapperSettings, player: GridPos, entities: &[crate::world::Entity]) -> Vec<Intent> {
    let heading = entities
        .iter()
        .filter(|e| e.is_targetable && e.kind == EntityKind::Monster)
        .min_by(|a, b| a.grid.distance_to(player).partial_cmp(&b.grid.distance_to(player)).unwrap())
        .map(|e| e.grid);
    let Some(heading) = heading else {
        return Vec::new();
    };
    let (angle, dist) = move_towards(player, heading, settings.max_move_distance);
    vec![Intent::Move { screen_angle_deg: angle, distance_units: dist }]
}

pub fn handle_walk_boss_checkpoint(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    let Some(target) = mapper.boss.target else {
        return Transition::go(State::FindBoss);
    };

    let scan_radius = settings.boss_fight_radius * 2.0;
    let nearby = world.entities(&EntityFilter { kind: Some(EntityKind::Monster), alive_only: true, max_distance: Some(scan_radius), ..Default::default() });
    let radar_boss = radar_boss_endpoint(world);
    if let Some((entity_id, _)) = mapper.engage.evaluate(now, player, &nearby, radar_boss, target, scan_radius, mapper.boss.candidate_id) {
        mapper.boss.entity_id = Some(entity_id);
        return Transition::go(State::FightBoss);
    }

    if mapper.path.waypoints.is_empty() || mapper.path.target.distance_to(target) > 1.0 {
        mapper.boss.checkpoint_commit_at = Some(now);
        mapper.boss.checkpoint_best_distance = None;
        match solve(world, player, target, ASTAR_ITER_HINT) {
            Ok((waypoints, _)) => {
                let mut walker = PathWalker::new(&mut mapper.path, settings);
                walker.commit(now, target, "boss-checkpoint", waypoints);
            }
            Err(event) => return Transition::stay(Vec::new()).recovery(event),
        }
    }

    let distance_now = player.distance_to(target);
    let improved = mapper.boss.checkpoint_best_distance.map(|best| distance_now < best - 1.0).unwrap_or(true);
    if improved {
        mapper.boss.checkpoint_best_distance = Some(distance_now);
        mapper.boss.checkpoint_best_distance_at = Some(now);
    }
    let stalled = mapper
        .boss
        .checkpoint_best_distance_at
        .map(|at| now.duration_since(at).as_secs_f32() >= CHECKPOINT_STALL_SECS)
        .unwrap_or(false);
    let unreachable = mapper
        .boss
        .checkpoint_commit_at
        .map(|at| now.duration_since(at).as_secs_f32() >= CHECKPOINT_UNREACHABLE_SECS)
        .unwrap_or(false);

    if unreachable {
        mapper.boss.abandon(target);
        let event = crate::error::RecoveryEvent::Unreachable { target };
        return Transition::go(State::FindBoss).recovery(event);
    }

    let mut walker = PathWalker::new(&mut mapper.path, settings);
    let (result, mut intents, recovery) = walker.step(now, player, world);
    match result {
        PathStepResult::Arrived => return Transition::go_with(State::WalkBossMelee, intents),
        PathStepResult::Stuck if stalled => {
            mapper.boss.abandon(target);
            let event = crate::error::RecoveryEvent::Unreachable { target };
            return Transition::go(State::FindBoss).recovery(event);
        }
        _ => {}
    }
    let mut t = Transition::stay(std::mem::take(&mut intents));
    if let Some(e) = recovery {
        t = t.recovery(e);
    }
    t
}

pub fn handle_walk_boss_melee(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    let anchor = mapper.boss.target.unwrap_or(player);
    let entities = world.entities(&EntityFilter { kind: Some(EntityKind::Monster), alive_only: true, max_distance: Some(settings.boss_search_radius), ..Default::default() });
    let candidate = resolver::resolve_boss_unique_candidate(&entities, player, anchor, settings.boss_search_radius, mapper.boss.candidate_id);

    let Some(candidate) = candidate else {
        return Transition::stay(Vec::new());
    };
    mapper.boss.candidate_id = Some(candidate.id);
    let distance = player.distance_to(candidate.grid);

    let immune_close = candidate.cannot_be_damaged && distance < 20.0;
    let damageable_close = !candidate.cannot_be_damaged && distance < 50.0;
    let held_targetable = candidate.is_targetable
        && !candidate.cannot_be_damaged
        && mapper
            .path
            .committed_at
            .map(|at| now.duration_since(at).as_millis() >= 900)
            .unwrap_or(false);

    if immune_close || damageable_close || held_targetable {
        mapper.boss.entity_id = Some(candidate.id);
        return Transition::go(State::FightBoss);
    }

    let stand_point = crate::geometry::point_on_ring(candidate.grid, crate::geometry::angle_of(candidate.grid, player), 30.0);
    if mapper.path.waypoints.is_empty() || mapper.path.target.distance_to(stand_point) > 5.0 {
        match solve(world, player, stand_point, ASTAR_ITER_HINT) {
            Ok((waypoints, _)) => {
                let mut walker = PathWalker::new(&mut mapper.path, settings);
                walker.commit(now, stand_point, "boss-melee-stand", waypoints);
            }
            Err(event) => return Transition::stay(Vec::new()).recovery(event),
        }
    }

    let mut walker = PathWalker::new(&mut mapper.path, settings);
    let (_result, intents, recovery) = walker.step(now, player, world);
    let mut t = Transition::stay(intents);
    if let Some(e) = recovery {
        t = t.recovery(e);
    }
    t
}

pub fn handle_fight_boss(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
    area: &AreaInfo,
) -> Transition {
    let _ = area;
    let Some(entity_id) = mapper.boss.entity_id else {
        return Transition::go(State::FindBoss);
    };

    let entities = world.entities(&EntityFilter { kind: Some(EntityKind::Monster), alive_only: false, max_distance: Some(settings.boss_fight_radius * 3.0), ..Default::default() });
    let Some(boss) = entities.iter().find(|e| e.id == entity_id) else {
        return finish_fight(mapper, player, now);
    };

    if !boss.is_alive || boss.hp_cur <= 0 {
        mapper.boss.dead = true;
        return finish_fight(mapper, player, now);
    }

    let prior_hp = mapper.boss.hp_samples.get(&boss.id).map(|(hp, _)| *hp);
    mapper.boss.hp_samples.insert(boss.id, (boss.hp_cur, now));
    mapper.boss.prune_hp_samples(now);
    if mapper.boss.fight_last_activity_at.is_none() || prior_hp.map(|hp| hp != boss.hp_cur).unwrap_or(true) {
        mapper.boss.fight_last_activity_at = Some(now);
    }
    let inactive = mapper
        .boss
        .fight_last_activity_at
        .map(|at| now.duration_since(at).as_secs_f32() >= FIGHT_INACTIVITY_SECS)
        .unwrap_or(false);
    if inactive {
        mapper.boss.entity_id = None;
        return Transition::go(State::FindBoss);
    }

    let boss_facing = boss.rotation.unwrap_or_else(|| crate::geometry::normalize(crate::geometry::sub(player, boss.grid)));

    let step = kite::step(&mut mapper.orbit, now, player, boss.grid, settings.max_move_distance, settings.fight_use_wide_orbit, &|p| world.is_walkable(p));
    let mut intents = kite::intent_from_step(step);

    // Emergency roll-out takes priority over the behind-dodge burst: being
    // cramped into a corner is a harder constraint than the boss's facing.
    if let Some(outcome) = dodge::emergency_roll_out(&mut mapper.orbit, now, player, boss.grid, &|p| world.is_walkable(p)) {
        intents = outcome.intents;
    } else if let Some(outcome) = dodge::behind_dodge(&mut mapper.orbit, now, player, boss.grid, boss_facing, settings, &|p| world.is_walkable(p)) {
        intents = outcome.intents;
    }

    Transition::stay(intents)
}

fn finish_fight(mapper: &mut Mapper, _player: GridPos, _now: Instant) -> Transition {
    if mapper.boss.resume_temple_after_boss && !mapper.temple.cleared {
        mapper.boss.reset();
        Transition::go(State::FindTemple)
    } else {
        Transition::go(State::Complete)
    }
}

pub fn handle_complete(mapper: &mut Mapper, settings: &MapperSettings, now: Instant) -> Transition {
    let mut walker = PathWalker::new(&mut mapper.path, settings);
    Transition::stay(walker.emit_stop(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_boss_scan_interval_matches_spec() {
        assert_eq!(FIND_BOSS_SCAN_INTERVAL, std::time::Duration::from_secs(3));
    }
}
