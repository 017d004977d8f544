use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use diesel_migrations::MigrationHarness;
use hotel_api_gateway::auth::TokenKeys;
use hotel_api_gateway::{AppState, app};
use hotel_booking_service::store::{BookingStore, MemoryBookingStore, PgBookingStore};
use hotel_core::config::{AppConfig, NotificationSink};
use hotel_core::notification::{LogNotifier, Notifier, OutboxNotifier};
use hotel_core::{Role, establish_connection};
use hotel_dining_service::pricing::PricingRates;
use hotel_dining_service::store::{DiningStore, MemoryDiningStore, PgDiningStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Keep all data in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Print a signed access token, for local testing
    IssueToken {
        #[arg(long)]
        user_id: Option<Uuid>,
        #[arg(long, default_value = "admin")]
        role: Role,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    match cli.command {
        Commands::Serve { in_memory } => serve(&config, in_memory).await,
        Commands::Migrate => migrate(&config),
        Commands::IssueToken { user_id, role } => {
            let tokens = TokenKeys::new(config.require_secret_key()?);
            let user_id = user_id.unwrap_or_else(Uuid::new_v4);
            let token = tokens.issue(user_id, role)?;
            println!("{token}");
            Ok(())
        }
    }
}

fn notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(match config.notification_sink {
        NotificationSink::Log => Arc::new(LogNotifier),
        NotificationSink::Outbox => Arc::new(OutboxNotifier::new(establish_connection(
            config.require_database_url()?,
        )?)),
    })
}

async fn serve(config: &AppConfig, in_memory: bool) -> anyhow::Result<()> {
    let tokens = TokenKeys::new(config.require_secret_key()?);
    let (dining_store, booking_store): (Arc<dyn DiningStore>, Arc<dyn BookingStore>) = if in_memory {
        warn!("serving from in-memory stores, data is lost on exit");
        (
            Arc::new(MemoryDiningStore::new()),
            Arc::new(MemoryBookingStore::new()),
        )
    } else {
        let database_url = config.require_database_url()?;
        (
            Arc::new(PgDiningStore::new(establish_connection(database_url)?)),
            Arc::new(PgBookingStore::new(establish_connection(database_url)?)),
        )
    };

    let state = AppState::new(
        dining_store,
        booking_store,
        notifier(config)?,
        PricingRates::from(config),
        tokens,
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let mut conn = establish_connection(config.require_database_url()?)?;
    for (name, migrations) in [
        ("core", hotel_core::MIGRATIONS),
        ("dining", hotel_dining_service::MIGRATIONS),
        ("booking", hotel_booking_service::MIGRATIONS),
    ] {
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|e| anyhow!("{name} migrations failed: {e}"))?;
        info!(set = name, applied = applied.len(), "migrations applied");
    }
    Ok(())
}
