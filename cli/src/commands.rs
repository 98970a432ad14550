//! REPL command implementations. The user-facing surface is intentionally
//! small (spec §6): enable/disable, skip-to-boss, and reset; the remaining
//! commands exist only to drive the [`crate::fake_world::FakeWorld`] for
//! local experimentation.

use std::time::Instant;

use mapper_core::state::State;
use mapper_core::GridPos;

use crate::context::CliContext;

pub async fn enable(ctx: &CliContext) {
    let mut inner = ctx.inner.lock().await;
    let identity = inner.identity.clone();
    inner.mapper.settings_store.ensure_identity(&identity);
    let _ = inner.mapper.settings_store.update(|s| s.enabled = true);
    println!("mapper enabled");
}

pub async fn disable(ctx: &CliContext) {
    let mut inner = ctx.inner.lock().await;
    let identity = inner.identity.clone();
    inner.mapper.settings_store.ensure_identity(&identity);
    let _ = inner.mapper.settings_store.update(|s| s.enabled = false);
    println!("mapper disabled");
}

/// Jumps directly into FIND_BOSS, skipping the temple objective (used for
/// maps where the temple mechanic isn't present this run).
pub async fn skip_to_boss(ctx: &CliContext) {
    let mut inner = ctx.inner.lock().await;
    inner.mapper.temple.cleared = true;
    inner.mapper.state = State::FindBoss;
    println!("state -> FIND_BOSS");
}

pub async fn reset(ctx: &CliContext) {
    let mut inner = ctx.inner.lock().await;
    inner.mapper = mapper_core::Mapper::new(Instant::now());
    println!("mapper reset to IDLE");
}

pub async fn status(ctx: &CliContext) {
    let inner = ctx.inner.lock().await;
    println!("state: {:?}", inner.mapper.state);
    println!("enabled: {}", inner.mapper.settings().enabled);
    println!("player: ({:.1}, {:.1})", inner.world.player.grid.x, inner.world.player.grid.y);
    println!("area: {} (change_count={})", inner.world.area.area_name, inner.world.area_change_count);
    if inner.mapper.temple.known {
        println!("temple: ({:.1}, {:.1}) cleared={}", inner.mapper.temple.pos.x, inner.mapper.temple.pos.y, inner.mapper.temple.cleared);
    }
    if let Some(target) = inner.mapper.boss.target {
        println!("boss target: ({:.1}, {:.1})", target.x, target.y);
    }
}

pub async fn tick(ctx: &CliContext) {
    let mut inner = ctx.inner.lock().await;
    let identity = inner.identity.clone();
    let now = Instant::now();
    let intents = inner.mapper.tick(now, &inner.world, &identity);
    mapper_core::intent::dispatch(&intents, &mut inner.sink);
    println!("tick emitted {} intent(s)", intents.len());
}

pub async fn set_player(ctx: &CliContext, x: f32, y: f32) {
    let mut inner = ctx.inner.lock().await;
    inner.world.player.grid = GridPos::new(x, y);
    println!("player moved to ({x:.1}, {y:.1})");
}

pub async fn set_area(ctx: &CliContext, name: String) {
    let mut inner = ctx.inner.lock().await;
    inner.world.area.area_name = name.clone();
    inner.world.area_change_count += 1;
    println!("area set to {name}");
}

pub fn exit() {
    println!("quitting...");
}
