//! # roles_server
//!
//! Host process for custom roles. It owns the game event buses, the ability
//! instances and the role catalog, and serializes every role request through
//! one service task.
//!
//! ## Startup Sequence
//!
//! 1. Load the role catalog (built-in, or JSON from `--catalog`).
//! 2. Build abilities and roles; always-on roles enable their abilities.
//! 3. Start the role service.
//! 4. Run the scripted demo: players join, get roles, move and take hits.

mod abilities;
mod catalog;
mod config;
mod roster;
mod service;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{DEFAULT_COMMAND_BUFFER, ServerConfig};
use service::{RoleService, RoleServiceHandle};

#[derive(Parser)]
#[command(name = "roles_server", about = "Custom roles host with a scripted demo")]
struct Args {
    /// Path to a JSON role catalog
    #[arg(short, long, env = "ROLES_CATALOG")]
    catalog: Option<PathBuf>,

    /// Capacity of the role service command channel
    #[arg(long, env = "ROLES_COMMAND_BUFFER", default_value_t = DEFAULT_COMMAND_BUFFER)]
    command_buffer: usize,

    /// Number of players the demo joins
    #[arg(short, long, default_value_t = 4)]
    players: usize,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let config = ServerConfig::new()
            .with_command_buffer(self.command_buffer)
            .with_demo_players(self.players);
        match self.catalog {
            Some(path) => config.with_catalog_path(path),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roles_server=info".parse()?))
        .init();

    let config = Args::parse().into_config();
    info!(?config, "roles server starting");

    let catalog = config.catalog()?;
    let (service, handle) = RoleService::new(&config, &catalog)?;
    let task = service.spawn();

    run_demo(&handle, &config).await?;

    handle.shutdown().await?;
    task.await?;
    info!("roles server shut down");
    Ok(())
}

/// Drive the service through a short match.
async fn run_demo(handle: &RoleServiceHandle, config: &ServerConfig) -> Result<()> {
    let mut players = Vec::with_capacity(config.demo_players);
    for n in 0..config.demo_players {
        players.push(handle.join(format!("player-{}", n + 1)).await?);
    }

    let roles = ["Scout", "Medic"];
    for (player, role) in players.iter().zip(roles.iter().cycle()) {
        if let Err(err) = handle.attach(*player, role).await {
            warn!(%player, role, %err, "attach failed");
        }
    }

    // A second grant for the same player is refused.
    if let Some(&first) = players.first()
        && let Err(err) = handle.attach(first, "Medic").await
    {
        info!(player = %first, %err, "duplicate grant refused");
    }

    for (step, player) in players.iter().enumerate() {
        let depth = if step % 2 == 0 { -2.0 } else { 3.0 };
        handle.moved(*player, Vec3::new(step as f32, depth, 0.0)).await?;
        handle.hurt(*player, 10.0 * (step as f32 + 1.0)).await?;
    }

    if let Some(&first) = players.first() {
        let role = handle.detach(first).await?;
        info!(player = %first, %role, "role revoked");
    }

    let report = handle.reload().await?;
    info!(disabled = report.disabled, reenabled = report.reenabled, "reload complete");

    for player in &players {
        handle.moved(*player, Vec3::ZERO).await?;
    }

    let stats = handle.stats().await?;
    info!(stats = %serde_json::to_string(&stats)?, "demo finished");
    Ok(())
}
