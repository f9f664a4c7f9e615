use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::middleware::{FrontDoorConfig, MemoryPendingStore, MemorySessionStore, spawn_sweeper};
use crate::server;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub sweep_interval: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is malformed or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = FrontDoorConfig::from_env().context("Invalid identity provider configuration")?;
    if !config.is_login_configured() {
        warn!("Identity provider is not fully configured; /auth/login will answer 500");
    }

    let pending = Arc::new(MemoryPendingStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let sweeper = spawn_sweeper(pending.clone(), sessions.clone(), args.sweep_interval);

    let app = server::router(config, pending, sessions);

    info!(port = args.port, "Starting auth front door");
    let result = server::serve(app, args.port).await;

    sweeper.abort();
    result
}
