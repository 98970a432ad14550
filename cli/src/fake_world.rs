//! An in-memory [`WorldApi`]/[`PacketSink`] pair for local experimentation
//! with the REPL: no game process attached, state is whatever the operator
//! pokes in via CLI commands.

use std::time::Duration;

use mapper_core::world::{
    AreaInfo, Entity, EntityFilter, MovementLock, PacketSink, Player, RadarPath, WorldApi,
};
use mapper_core::GridPos;

pub struct FakeWorld {
    pub player: Player,
    pub area: AreaInfo,
    pub area_change_count: u64,
    pub entities: Vec<Entity>,
    pub radar_paths: Vec<RadarPath>,
    pub tgt_locations: Vec<(String, GridPos)>,
    pub lock: MovementLock,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self {
            player: Player { grid: GridPos::new(100.0, 100.0), ..Default::default() },
            area: AreaInfo { area_name: "Map_Alpha".to_string(), area_id: 1, is_valid: true },
            area_change_count: 0,
            entities: Vec::new(),
            radar_paths: Vec::new(),
            tgt_locations: Vec::new(),
            lock: MovementLock::default(),
        }
    }
}

impl WorldApi for FakeWorld {
    fn local_player(&self) -> Option<Player> {
        Some(self.player.clone())
    }

    fn entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|e| filter.kind.map(|k| k == e.kind).unwrap_or(true))
            .filter(|e| !filter.alive_only || e.is_alive)
            .filter(|e| {
                filter
                    .metadata_substring
                    .as_ref()
                    .map(|s| e.metadata_contains(s))
                    .unwrap_or(true)
            })
            .filter(|e| {
                filter
                    .max_distance
                    .map(|d| e.grid.distance_to(self.player.grid) <= d)
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    fn find_path(&self, _from: GridPos, to: GridPos, _max_iters: u32) -> Result<Vec<GridPos>, mapper_core::world::PathSolverError> {
        Ok(vec![to])
    }

    fn find_path_bfs(&self, _from: GridPos, to: GridPos) -> Result<Vec<GridPos>, mapper_core::world::PathSolverError> {
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

    fn is_walkable(&self, _pos: GridPos) -> bool {
        true
    }

    fn movement_lock(&self) -> MovementLock {
        self.lock
    }
}

/// Logs emitted intents instead of sending packets anywhere.
#[derive(Default)]
pub struct LoggingSink {
    pub last_move: Option<(f32, f32)>,
    pub stop_count: u32,
    pub channeled_count: u32,
}

impl PacketSink for LoggingSink {
    fn move_at_angle(&mut self, screen_angle_deg: f32, distance_units: f32) -> bool {
        self.last_move = Some((screen_angle_deg, distance_units));
        tracing::info!(target: "mapper_cli", "move_at_angle({screen_angle_deg:.1}, {distance_units:.1})");
        true
    }

    fn stop_movement(&mut self) -> bool {
        self.stop_count += 1;
        tracing::info!(target: "mapper_cli", "stop_movement()");
        true
    }

    fn execute_channeled_skill(&mut self, _skill_bytes: &[u8], dx: f32, dy: f32, slot: u8) -> bool {
        self.channeled_count += 1;
        tracing::info!(target: "mapper_cli", "execute_channeled_skill(slot={slot}, dx={dx:.2}, dy={dy:.2})");
        true
    }
}

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
