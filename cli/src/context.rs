//! Shared state for the REPL: the owned [`Mapper`], the fake world/sink
//! pair it ticks against, and the player identity used for settings
//! persistence.

use std::sync::Arc;
use std::time::Instant;

use mapper_core::Mapper;
use tokio::sync::Mutex;

use crate::fake_world::{FakeWorld, LoggingSink};

#[derive(Clone)]
pub struct CliContext {
    pub inner: Arc<Mutex<Inner>>,
}

pub struct Inner {
    pub mapper: Mapper,
    pub world: FakeWorld,
    pub sink: LoggingSink,
    pub identity: String,
}

impl CliContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                mapper: Mapper::new(Instant::now()),
                world: FakeWorld::default(),
                sink: LoggingSink::default(),
                identity: "local-player".to_string(),
            })),
        }
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
