//! Shared configuration types for the mapper core
//!
//! These types are serialized to disk with `confy` and shared between the
//! `mapper-core` engine and the `mapper-cli` front-end, so neither needs to
//! depend on the other for settings plumbing.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Hotkey / modifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Modifier bitmask for the enable/disable hotkey.
pub mod modifier_bits {
    pub const SHIFT: u8 = 0b001;
    pub const CTRL: u8 = 0b010;
    pub const ALT: u8 = 0b100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeySettings {
    /// Virtual key code of the toggle hotkey.
    pub key: u32,
    /// Bitmask of [`modifier_bits`].
    pub modifiers: u8,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self { key: 0x70 /* F1 */, modifiers: 0 }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serde default helpers
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_move_interval_ms() -> u64 {
    120
}
fn default_repath_interval_ms() -> u64 {
    3000
}
fn default_waypoint_threshold() -> f32 {
    8.0
}
fn default_arrival_threshold() -> f32 {
    20.0
}
fn default_stuck_timeout_ms() -> u64 {
    3000
}
fn default_stuck_move_distance() -> f32 {
    20.0
}
fn default_max_move_distance() -> f32 {
    40.0
}
fn default_temple_clear_radius() -> f32 {
    60.0
}
fn default_temple_clear_time_ms() -> u64 {
    12_000
}
fn default_boss_search_radius() -> f32 {
    280.0
}
fn default_boss_fight_radius() -> f32 {
    120.0
}
fn default_fight_entity_scan_interval_ms() -> u64 {
    150
}
fn default_boss_dodge_roll_interval_ms() -> u64 {
    800
}
fn default_boss_dodge_roll_distance() -> f32 {
    46.0
}
fn default_boss_dodge_behind_min_deg() -> f32 {
    0.0
}
fn default_boss_dodge_behind_max_deg() -> f32 {
    35.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapper settings
// ─────────────────────────────────────────────────────────────────────────────

/// Persisted, per player-identity settings for the mapper. Matches the
/// external interface surface described for the core engine: a single
/// enable toggle, a hotkey, and the tunables consumed by the path walker,
/// target resolver, and combat kite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    pub enabled: bool,
    pub hotkey: HotkeySettings,

    pub move_interval_ms: u64,
    pub repath_interval_ms: u64,
    pub waypoint_threshold: f32,
    pub arrival_threshold: f32,
    pub stuck_timeout_ms: u64,
    pub stuck_move_distance: f32,
    pub max_move_distance: f32,

    pub temple_clear_radius: f32,
    pub temple_clear_time_ms: u64,

    pub boss_search_radius: f32,
    pub boss_fight_radius: f32,
    pub fight_entity_scan_interval_ms: u64,
    #[serde(default)]
    pub fight_use_wide_orbit: bool,

    #[serde(default = "default_true")]
    pub boss_dodge_roll_enabled: bool,
    pub boss_dodge_roll_interval_ms: u64,
    pub boss_dodge_roll_distance: f32,
    pub boss_dodge_behind_min_deg: f32,
    pub boss_dodge_behind_max_deg: f32,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hotkey: HotkeySettings::default(),
            move_interval_ms: default_move_interval_ms(),
            repath_interval_ms: default_repath_interval_ms(),
            waypoint_threshold: default_waypoint_threshold(),
            arrival_threshold: default_arrival_threshold(),
            stuck_timeout_ms: default_stuck_timeout_ms(),
            stuck_move_distance: default_stuck_move_distance(),
            max_move_distance: default_max_move_distance(),
            temple_clear_radius: default_temple_clear_radius(),
            temple_clear_time_ms: default_temple_clear_time_ms(),
            boss_search_radius: default_boss_search_radius(),
            boss_fight_radius: default_boss_fight_radius(),
            fight_entity_scan_interval_ms: default_fight_entity_scan_interval_ms(),
            fight_use_wide_orbit: false,
            boss_dodge_roll_enabled: true,
            boss_dodge_roll_interval_ms: default_boss_dodge_roll_interval_ms(),
            boss_dodge_roll_distance: default_boss_dodge_roll_distance(),
            boss_dodge_behind_min_deg: default_boss_dodge_behind_min_deg(),
            boss_dodge_behind_max_deg: default_boss_dodge_behind_max_deg(),
        }
    }
}

impl MapperSettings {
    /// Minimum gap between movement packets, honoring the hard floor of 120ms
    /// regardless of how aggressively `move_interval_ms` is configured.
    pub fn move_packet_gap_ms(&self) -> u64 {
        self.move_interval_ms.max(120)
    }
}
