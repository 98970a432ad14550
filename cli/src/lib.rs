pub mod commands;
pub mod context;
pub mod fake_world;

pub use context::CliContext;
