use std::io::Write;

use clap::{Parser, Subcommand};
use mapper_cli::{commands, CliContext};

#[tokio::main]
async fn main() -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("MAPPER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let ctx = CliContext::new();

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "error: {err}").map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

fn readline() -> Result<String, String> {
    write!(std::io::stdout(), "mapper> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(|e| e.to_string())?;
    Ok(line)
}

#[derive(Parser)]
#[command(version, about = "mapper control REPL")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enable the mapper.
    Enable,
    /// Disable the mapper.
    Disable,
    /// Skip straight to FIND_BOSS, bypassing the temple objective.
    SkipToBoss,
    /// Reset the mapper to IDLE.
    Reset,
    /// Print current state, settings, and world snapshot.
    Status,
    /// Run one Scheduler tick against the fake world.
    Tick,
    /// Move the fake player to (x, y).
    SetPlayer { x: f32, y: f32 },
    /// Change the fake area name (bumps the area-change counter).
    SetArea { name: String },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("invalid quoting")?;
    args.insert(0, "mapper".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Enable) => commands::enable(ctx).await,
        Some(Commands::Disable) => commands::disable(ctx).await,
        Some(Commands::SkipToBoss) => commands::skip_to_boss(ctx).await,
        Some(Commands::Reset) => commands::reset(ctx).await,
        Some(Commands::Status) => commands::status(ctx).await,
        Some(Commands::Tick) => commands::tick(ctx).await,
        Some(Commands::SetPlayer { x, y }) => commands::set_player(ctx, x, y).await,
        Some(Commands::SetArea { name }) => commands::set_area(ctx, name).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
