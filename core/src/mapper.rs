//! The consolidated [`Mapper`] struct (spec §9 Design Notes): every piece
//! of state the source scattered across ~100 module-scope variables, owned
//! here and passed by exclusive reference. `tick` is the Scheduler
//! (spec §4.1): it is a pure-ish function of `(&mut Mapper, &dyn WorldApi)
//! -> Vec<Intent>`, with no async/generators — yielding to a peer lock is
//! just returning early from the current tick.

use std::time::Instant;

use mapper_types::MapperSettings;

use crate::debug_log::DedupLog;
use crate::engage::EngageDetector;
use crate::error::RecoveryEvent;
use crate::intent::Intent;
use crate::machine;
use crate::settings::SettingsStore;
use crate::state::{BossState, OrbitState, PathState, State, TempleState};
use crate::world::WorldApi;

pub struct Mapper {
    pub state: State,
    pub temple: TempleState,
    pub boss: BossState,
    pub path: PathState,
    pub orbit: OrbitState,
    pub engage: EngageDetector,
    pub log: DedupLog,
    pub settings_store: SettingsStore,
    area_change_count: u64,
    fight_last_throttle_at: Option<Instant>,
}

impl Mapper {
    pub fn new(now: Instant) -> Self {
        Self {
            state: State::default(),
            temple: TempleState::default(),
            boss: BossState::default(),
            path: PathState::default(),
            orbit: OrbitState::default(),
            engage: EngageDetector::new(now),
            log: DedupLog::new(),
            settings_store: SettingsStore::new(),
            area_change_count: 0,
            fight_last_throttle_at: None,
        }
    }

    pub fn settings(&self) -> &MapperSettings {
        self.settings_store.settings()
    }

    /// Full reset on area change or non-map hub entry (spec §4.1 steps 2-3).
    fn reset_all(&mut self) {
        self.state = State::default();
        self.temple.reset();
        self.boss.reset();
        self.path.clear();
        self.orbit = OrbitState::default();
    }

    /// Run one Scheduler tick (spec §4.1). `identity` selects the
    /// per-player settings profile.
    pub fn tick(&mut self, now: Instant, world: &dyn WorldApi, identity: &str) -> Vec<Intent> {
        self.settings_store.ensure_identity(identity);
        let settings = self.settings_store.settings().clone();

        if !settings.enabled {
            return Vec::new();
        }

        let Some(player) = world.local_player() else {
            self.log.emit(now, RecoveryEvent::NoSnapshot.to_string());
            return Vec::new();
        };

        let area = world.area_info();
        if area.is_non_map_hub() {
            self.reset_all();
            self.log.emit(now, RecoveryEvent::NonMapArea { area_name: area.area_name.clone() }.to_string());
            let mut walker = crate::path::PathWalker::new(&mut self.path, &settings);
            return walker.emit_stop(now);
        }

        let area_change_count = world.area_change_count();
        if area_change_count != self.area_change_count {
            self.area_change_count = area_change_count;
            self.reset_all();
        }

        let lock = world.movement_lock();
        if lock.locked {
            let remaining_ms = lock.remaining.as_millis() as u64;
            self.log.emit(now, RecoveryEvent::PeerLock { remaining_ms }.to_string());
            return Vec::new();
        }

        if self.state == State::FightBoss {
            let due = self
                .fight_last_throttle_at
                .map(|at| now.duration_since(at).as_millis() as u64 >= settings.fight_entity_scan_interval_ms)
                .unwrap_or(true);
            if !due {
                return Vec::new();
            }
            self.fight_last_throttle_at = Some(now);
        }

        machine::dispatch(self, world, &settings, now, player.grid, &area)
    }
}
