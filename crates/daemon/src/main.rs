//! Switchboard daemon - HTTP gateway entry point

mod logging;
mod services;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use settings::AppConfig;
use switchboard_api_http::{GatewayHandler, HttpServer};
use switchboard_core::port::id_provider::UuidProvider;
use switchboard_core::port::time_provider::SystemTimeProvider;
use switchboard_core::port::TimeProvider;
use switchboard_core::{ConverterRegistry, Dispatcher};
use switchboard_infra_sqlite::{
    create_pool, run_migrations, SqliteAuthorizer, SqliteEntityRepository, SqliteMemberRepository,
    SqliteTokenAuthenticator,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "switchboard-daemon", version, about = "Switchboard HTTP gateway")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = settings::CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve HTTP requests (default)
    Serve,
    /// Create a member with an access token, then exit
    AddMember {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
        /// Permission code to grant; repeatable
        #[arg(long = "grant")]
        grants: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Configuration, then logging
    let config = AppConfig::load(args.config.as_deref())?;
    let _log_guard = logging::init(&config.log)?;

    info!("Switchboard v{} starting...", VERSION);

    // 2. Database
    if let Some(parent) = config.database.file_path().as_deref().and_then(|p| p.parent()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let database_url = config.database.resolved_url();
    info!(database_url = %database_url, "Initializing database...");

    let pool = create_pool(&database_url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let types = Arc::new(config.type_hierarchy()?);
    let entities = Arc::new(SqliteEntityRepository::new(
        pool.clone(),
        types.clone(),
        time_provider.clone(),
    ));
    let members = SqliteMemberRepository::new(pool.clone(), time_provider);

    if let Some(Command::AddMember {
        email,
        token,
        grants,
    }) = args.command
    {
        let member_id = members.create(&email).await?;
        members.set_token(member_id, &token).await?;
        for code in &grants {
            members.grant(member_id, code).await?;
        }
        info!(member_id, email = %email, grants = ?grants, "Member created");
        println!("{}:{}", member_id, token);
        return Ok(());
    }

    let locator = services::locator(entities.clone());
    info!(services = ?locator.names(), "Services registered");

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(locator),
        Arc::new(SqliteAuthorizer::new(pool.clone())),
        entities,
        types,
        Arc::new(ConverterRegistry::defaults(config.dispatch.xml_declaration)),
    ));
    let handler = Arc::new(GatewayHandler::new(
        dispatcher,
        Arc::new(SqliteTokenAuthenticator::new(
            members,
            config.dispatch.allow_public_access,
        )),
        Arc::new(UuidProvider),
        config.dispatch.routes(),
    ));

    // 4. Serve until Ctrl+C
    let server = HttpServer::bind(&config.server.addr(), handler)
        .await?
        .with_max_body_bytes(config.server.max_body_bytes);
    info!("System ready. Press Ctrl+C to shutdown");

    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    pool.close().await;
    info!("Shutdown complete.");

    Ok(())
}
