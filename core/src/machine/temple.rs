//! IDLE, FIND_TEMPLE, WALK_TEMPLE, and CLEAR_TEMPLE handlers.

use std::time::Instant;

use mapper_types::MapperSettings;

use crate::machine::boss::radar_boss_endpoint;
use crate::machine::Transition;
use crate::mapper::Mapper;
use crate::path::{solve, PathWalker};
use crate::path::PathStepResult;
use crate::resolver;
use crate::state::State;
use crate::world::{EntityFilter, EntityKind, GridPos, WorldApi};

const ASTAR_ITER_HINT: u32 = 120_000;

pub fn handle_idle() -> Transition {
    Transition::go(State::FindTemple)
}

pub fn handle_find_temple(mapper: &mut Mapper, world: &dyn WorldApi, now: Instant) -> Transition {
    if beacon_signal_active(world) {
        mapper.temple.cleared = true;
        return Transition::go(State::FindBoss);
    }

    let hits = world.tgt_locations("waygatedevice");
    if let Some(pos) = resolver::resolve_temple(&hits) {
        mapper.temple.known = true;
        mapper.temple.pos = pos;
        mapper.temple.center_seen_at = None;
        mapper.temple.clear_phase_started_at = None;
        return Transition::go(State::WalkTemple);
    }

    let _ = now;
    Transition::go(State::FindBoss)
}

/// A vaal-chest being opened or a beacon/waygate-activated buff present
/// means the temple encounter has already started elsewhere.
fn beacon_signal_active(world: &dyn WorldApi) -> bool {
    if let Some(player) = world.local_player() {
        if player.buffs.iter().any(|b| {
            let n = b.name.to_ascii_lowercase();
            n.contains("beacon") || n.contains("waygate-activated")
        }) {
            return true;
        }
    }
    world.entities(&EntityFilter { lightweight: true, ..Default::default() }).iter().any(|e| {
        e.metadata_contains("vaalchest") && !e.is_alive
    })
}

pub fn handle_walk_temple(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    if mapper.temple.pos.is_sentinel() {
        mapper.temple.reset();
        return Transition::go(State::FindTemple);
    }

    let scan_radius = settings.boss_fight_radius * 2.0;
    let nearby = world.entities(&EntityFilter {
        kind: Some(EntityKind::Monster),
        alive_only: true,
        max_distance: Some(scan_radius),
        ..Default::default()
    });
    let radar_boss = radar_boss_endpoint(world);
    if let Some((entity_id, _)) = mapper.engage.evaluate(now, player, &nearby, radar_boss, mapper.temple.pos, scan_radius, mapper.boss.candidate_id) {
        mapper.boss.entity_id = Some(entity_id);
        mapper.boss.resume_temple_after_boss = true;
        return Transition::go(State::WalkBossMelee);
    }

    if mapper.path.waypoints.is_empty() || mapper.path.target.distance_to(mapper.temple.pos) > 1.0 {
        return commit_temple_path(mapper, world, settings, now, player);
    }

    let mut walker = PathWalker::new(&mut mapper.path, settings);
    let (result, intents, recovery) = walker.step(now, player, world);
    match result {
        PathStepResult::Arrived => Transition::go_with(State::ClearTemple, intents),
        PathStepResult::Stuck => {
            mapper.temple.reset();
            let mut t = Transition::go_with(State::FindTemple, intents);
            if let Some(e) = recovery {
                t = t.recovery(e);
            }
            t
        }
        PathStepResult::NoPath => {
            let mut t = Transition::stay(intents);
            if let Some(e) = recovery {
                t = t.recovery(e);
            }
            t
        }
        PathStepResult::Moving => Transition::stay(intents),
    }
}

fn commit_temple_path(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    match solve(world, player, mapper.temple.pos, ASTAR_ITER_HINT) {
        Ok((waypoints, _source)) => {
            let mut walker = PathWalker::new(&mut mapper.path, settings);
            walker.commit(now, mapper.temple.pos, "temple", waypoints);
            Transition::stay(Vec::new())
        }
        Err(event) => Transition::stay(Vec::new()).recovery(event),
    }
}

pub fn handle_clear_temple(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
) -> Transition {
    if beacon_signal_active(world) {
        mapper.temple.cleared = true;
        return Transition::go(State::FindBoss);
    }

    if mapper.temple.clear_phase_started_at.is_none() {
        mapper.temple.clear_phase_started_at = Some(now);
    }

    let hostiles = world.entities(&EntityFilter {
        kind: Some(EntityKind::Monster),
        alive_only: true,
        max_distance: Some(settings.temple_clear_radius * 2.0),
        ..Default::default()
    });
    let hostiles: Vec<_> = hostiles
        .into_iter()
        .filter(|e| e.grid.distance_to(mapper.temple.pos) <= settings.temple_clear_radius * 2.0)
        .collect();

    let at_centre = player.distance_to(mapper.temple.pos) < 15.0;
    if at_centre {
        mapper.temple.center_seen_at = Some(now);
    }

    if hostiles.is_empty() {
        let since = *mapper.temple.no_hostiles_since.get_or_insert(now);
        let sustained = now.duration_since(since).as_secs_f32() >= 12.0;
        let seen_centre = mapper.temple.center_seen_at.is_some();
        if sustained && seen_centre {
            mapper.temple.cleared = true;
            return Transition::go(State::FindBoss);
        }
    } else {
        mapper.temple.no_hostiles_since = None;
    }

    let elapsed = now.duration_since(mapper.temple.clear_phase_started_at.unwrap()).as_millis() as u64;
    if elapsed >= settings.temple_clear_time_ms.max(60_000) {
        mapper.temple.cleared = true;
        return Transition::go(State::FindBoss);
    }

    let walk_target = hostiles
        .iter()
        .min_by(|a, b| {
            a.grid.distance_to(player).partial_cmp(&b.grid.distance_to(player)).unwrap()
        })
        .map(|e| e.grid)
        .unwrap_or(mapper.temple.pos);

    if mapper.path.waypoints.is_empty() || mapper.path.target.distance_to(walk_target) > 5.0 {
        match solve(world, player, walk_target, ASTAR_ITER_HINT) {
            Ok((waypoints, _)) => {
                let mut walker = PathWalker::new(&mut mapper.path, settings);
                walker.commit(now, walk_target, "temple-clear", waypoints);
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
