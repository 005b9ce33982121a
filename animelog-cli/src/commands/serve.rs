//! `animelog serve`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use animelog_core::AnimelogConfig;
use animelog_server::auth::TokenIssuer;
use animelog_server::db::{self, migrations};
use animelog_server::jikan::JikanClient;
use animelog_server::{run_server, AppState, ServerConfig};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides ANIMELOG_BIND and the config file)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Port only, keeping the configured host
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Accept requests from any origin (development only)
    #[arg(long)]
    pub cors_permissive: bool,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Config file to read instead of ~/.animelog/config.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Do not create or update the schema on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn apply(&self, config: &mut AnimelogConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.bind.set_port(port);
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
    }
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = crate::config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing::info!(bind = %config.server.bind, "Starting animelog server");

    let pool = db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    if args.skip_migrations {
        tracing::warn!("Skipping migrations");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let metadata = JikanClient::new(&config.jikan).context("Failed to build Jikan client")?;
    let tokens = TokenIssuer::with_days(&config.auth.jwt_secret, config.auth.token_ttl_days);
    let state = AppState::new(pool, tokens, Arc::new(metadata));

    run_server(state, ServerConfig::from(config.server))
        .await
        .context("Server error")?;

    Ok(())
}
