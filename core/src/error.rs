//! Error taxonomy (spec §7). All of these are recovered locally and are
//! never surfaced as `Err` from the main tick loop — they are *decisions*,
//! logged via [`crate::debug_log::DedupLog`], not failures. Genuine fallible
//! boundaries (settings persistence) use [`ConfigError`] instead.

use std::fmt;

use mapper_types::{MapperSettings};

/// A locally-recovered condition encountered during a tick. Constructing one
/// of these does not unwind anything; callers log it and keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryEvent {
    /// Host reader returned no player this tick.
    NoSnapshot,
    /// Pathfinder returned empty for the current commit.
    NoPath { target: crate::world::GridPos },
    /// Player position has not moved despite an active commit.
    Stuck { consecutive: u32 },
    /// A commit has consistently produced `NoPath`; added to the abandoned
    /// list.
    Unreachable { target: crate::world::GridPos },
    /// An entity reported a grid position within 1 unit of the origin.
    InvalidAnchor { entity_id: u64 },
    /// A boss target landed within 80u of the temple and was dropped.
    RejectedTarget { target: crate::world::GridPos },
    /// The native pathfinder threw; falling through to the next solver
    /// tier.
    PathSolverException,
    /// A sibling automation module is holding movement.
    PeerLock { remaining_ms: u64 },
    /// Current area is a non-map hub (hideout/town/encampment).
    NonMapArea { area_name: String },
}

impl fmt::Display for RecoveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryEvent::NoSnapshot => write!(f, "no snapshot this tick, skipping"),
            RecoveryEvent::NoPath { target } => {
                write!(f, "no path to ({:.1}, {:.1})", target.x, target.y)
            }
            RecoveryEvent::Stuck { consecutive } => {
                write!(f, "stuck, consecutive={consecutive}")
            }
            RecoveryEvent::Unreachable { target } => {
                write!(f, "target ({:.1}, {:.1}) marked unreachable", target.x, target.y)
            }
            RecoveryEvent::InvalidAnchor { entity_id } => {
                write!(f, "entity {entity_id} has invalid anchor position")
            }
            RecoveryEvent::RejectedTarget { target } => {
                write!(f, "boss target ({:.1}, {:.1}) too close to temple, rejected", target.x, target.y)
            }
            RecoveryEvent::PathSolverException => write!(f, "native pathfinder threw"),
            RecoveryEvent::PeerLock { remaining_ms } => {
                write!(f, "peer lock held, {remaining_ms}ms remaining")
            }
            RecoveryEvent::NonMapArea { area_name } => {
                write!(f, "non-map area '{area_name}', resetting")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}

pub(crate) fn save_settings(identity: &str, settings: &MapperSettings) -> Result<(), ConfigError> {
    confy::store("mapper", Some(identity), settings.clone()).map_err(ConfigError::Save)
}
