//! The CORE of an automated map-running controller (spec §1): an
//! objective state machine, path walker, target resolver, engagement
//! detector, and combat kite, consolidated into one owned [`Mapper`].
//!
//! External collaborators (the memory reader, pathfinder primitives,
//! packet transport) are modeled as the [`world::WorldApi`] and
//! [`world::PacketSink`] traits; production wires one concrete backend,
//! tests substitute fakes.

pub mod debug_log;
pub mod engage;
pub mod error;
pub mod geometry;
pub mod intent;
pub mod kite;
pub mod machine;
pub mod mapper;
pub mod path;
pub mod resolver;
pub mod settings;
pub mod state;
pub mod world;

pub use error::{ConfigError, RecoveryEvent};
pub use intent::Intent;
pub use mapper::Mapper;
pub use settings::SettingsStore;
pub use state::State;
pub use world::{Entity, GridPos, PacketSink, WorldApi};
