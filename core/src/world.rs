//! Data model and capability traits for the external world.
//!
//! Everything in this module is a read-only snapshot type or an interface to
//! a collaborator the CORE does not implement: the memory reader, the
//! pathfinder primitives, and the packet transport. Production wires one
//! concrete backend to [`WorldApi`] and [`PacketSink`]; tests substitute
//! fakes. No dynamic dispatch is required — `Mapper` is generic over `W`.

use std::time::Duration;

/// A position in game grid units. `(0, 0)` is the sentinel meaning
/// "uninitialised" and must never be committed as a real target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPos {
    pub x: f32,
    pub y: f32,
}

impl GridPos {
    pub const ZERO: GridPos = GridPos { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// `(0,0)` is a sentinel for "uninitialised"; never a real target.
    pub fn is_sentinel(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn distance_to(self, other: GridPos) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Entity kind, per the data model in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Monster,
    Player,
    Npc,
    Chest,
    Shrine,
    Item,
    Other,
}

/// Monster subtype, narrowing `EntityKind::Monster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    MonsterUnique,
    MonsterRare,
    MonsterMagic,
    MonsterFriendly,
    None,
}

/// A read-only entity snapshot, refreshed fresh every tick.
#[derive(Debug, Clone)]
pub struct Entity {
    /// 0 means absent/invalid.
    pub id: u64,
    pub kind: EntityKind,
    pub rarity: u8,
    pub subtype: Subtype,
    pub grid: GridPos,
    pub world: (f32, f32, f32),
    pub hp_cur: i64,
    pub hp_max: i64,
    pub is_alive: bool,
    pub is_targetable: bool,
    pub cannot_be_damaged: bool,
    pub is_hidden: bool,
    pub metadata_path: String,
    pub bounds: (f32, f32),
    pub rotation: Option<(f32, f32)>,
    /// Stat keys present on this entity (map-boss scaling, underling, ...).
    pub stat_keys: std::collections::HashSet<String>,
}

impl Entity {
    pub fn hp_fraction(&self) -> f32 {
        if self.hp_max <= 0 {
            1.0
        } else {
            (self.hp_cur as f32 / self.hp_max as f32).clamp(0.0, 1.0)
        }
    }

    pub fn metadata_contains(&self, needle: &str) -> bool {
        self.metadata_path.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
    }

    pub fn has_stat(&self, key: &str) -> bool {
        self.stat_keys.contains(key)
    }
}

/// A buff/charge on the local player.
#[derive(Debug, Clone)]
pub struct Buff {
    pub name: String,
    pub time_left: Duration,
    pub charges: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Player {
    pub grid: GridPos,
    pub world: (f32, f32, f32),
    pub hp_cur: i64,
    pub hp_max: i64,
    pub es_cur: i64,
    pub es_max: i64,
    pub mana_cur: i64,
    pub mana_max: i64,
    pub buffs: Vec<Buff>,
    pub player_name: String,
}

/// A named, sparse/downsampled path precomputed by a sibling visualisation
/// plugin.
#[derive(Debug, Clone)]
pub struct RadarPath {
    pub name: String,
    pub target: GridPos,
    pub path: Vec<GridPos>,
}

#[derive(Debug, Clone, Default)]
pub struct AreaInfo {
    pub area_name: String,
    pub area_id: u64,
    pub is_valid: bool,
}

impl AreaInfo {
    /// Non-map hub guard: hideout/town/encampment areas get no movement.
    pub fn is_non_map_hub(&self) -> bool {
        let name = self.area_name.to_ascii_lowercase();
        name.contains("hideout") || name.contains("town") || name.contains("encampment")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MovementLock {
    pub locked: bool,
    pub remaining: Duration,
}

impl Default for MovementLock {
    fn default() -> Self {
        Self { locked: false, remaining: Duration::ZERO }
    }
}

/// Filter passed to [`WorldApi::entities`].
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub kind: Option<EntityKind>,
    pub alive_only: bool,
    pub metadata_substring: Option<String>,
    pub max_distance: Option<f32>,
    /// Omit expensive stat/buff components when true.
    pub lightweight: bool,
}

/// Why a path-tier computation failed, feeding the §4.3 tier fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSolverError {
    NoPath,
    /// Native pathfinder threw; fall through to the next tier.
    SolverException,
}

/// Inbound capability surface: the memory reader, pathfinder, and radar
/// plugin the CORE consumes but does not implement.
pub trait WorldApi {
    fn local_player(&self) -> Option<Player>;
    fn entities(&self, filter: &EntityFilter) -> Vec<Entity>;
    fn find_path(&self, from: GridPos, to: GridPos, max_iters: u32) -> Result<Vec<GridPos>, PathSolverError>;
    fn find_path_bfs(&self, from: GridPos, to: GridPos) -> Result<Vec<GridPos>, PathSolverError>;
    fn radar_paths(&self) -> Vec<RadarPath>;
    fn tgt_locations(&self, name_substring: &str) -> Vec<GridPos>;
    fn area_info(&self) -> AreaInfo;
    fn area_change_count(&self) -> u64;
    fn is_walkable(&self, pos: GridPos) -> bool;
    fn movement_lock(&self) -> MovementLock;
}

/// Outbound capability surface: the packet transport.
pub trait PacketSink {
    fn move_at_angle(&mut self, screen_angle_deg: f32, distance_units: f32) -> bool;
    fn stop_movement(&mut self) -> bool;
    fn execute_channeled_skill(&mut self, skill_bytes: &[u8], dx: f32, dy: f32, slot: u8) -> bool;
}
