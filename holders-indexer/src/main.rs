//! Holders Indexer CLI
//!
//! Entry point for the indexer binary. Provides subcommands for:
//! - `run` - Start every configured chain's poller plus the query API
//!   (backfill vs. live mode is per-chain config, see `CHAIN_<ID>_POLLER_MODE`)
//! - `migrate` - Run database migrations

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use holders_indexer::api::{self, ApiState};
use holders_indexer::config::Settings;
use holders_indexer::indexer::ChainPoller;
use holders_indexer::ports::HoldersCache;
use holders_indexer::store::{PostgresStore, TtlHoldersCache};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "holders-indexer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Deployment environment, selects `config/<environment>.toml`.
    #[arg(short, long, default_value = "development")]
    environment: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every configured chain's poller and the query API.
    Run,
    /// Run pending database migrations and exit.
    Migrate,
    /// Print the binary version and exit.
    Version,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            error!(error = %err, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> ExitCode {
    let settings = match Settings::load(&cli.environment) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(errors) = settings.validate() {
        for message in errors {
            error!(message, "invalid configuration");
        }
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Version => {
            println!("holders-indexer {}", holders_indexer::VERSION);
            ExitCode::SUCCESS
        }
        Commands::Migrate => run_migrate(&settings).await,
        Commands::Run => run_indexer(&settings).await,
    }
}

async fn connect(settings: &Settings) -> Result<PostgresStore, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(settings.database.connect_timeout())
        .idle_timeout(settings.database.idle_timeout())
        .connect(&settings.database.url)
        .await?;

    Ok(PostgresStore::new(pool))
}

async fn run_migrate(settings: &Settings) -> ExitCode {
    let store = match connect(settings).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    match store.run_migrations().await {
        Ok(()) => {
            info!("migrations applied");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "migration failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_indexer(settings: &Settings) -> ExitCode {
    if settings.metrics.enabled {
        if let Err(err) = metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(
                settings
                    .metrics
                    .socket_addr()
                    .parse::<std::net::SocketAddr>()
                    .unwrap_or_else(|_| ([0, 0, 0, 0], 9090).into()),
            )
            .install()
        {
            warn!(error = %err, "failed to install prometheus exporter, continuing without metrics");
        }
    }

    let store = match connect(settings).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = store.run_migrations().await {
        error!(error = %err, "failed to run migrations on startup");
        return ExitCode::FAILURE;
    }

    let store = Arc::new(store);
    let shutdown = CancellationToken::new();

    let supported_chain_ids: Arc<[u64]> = settings
        .chains
        .iter()
        .filter(|c| c.supported)
        .map(|c| c.chain_id)
        .collect::<Vec<_>>()
        .into();

    let cache: Arc<dyn HoldersCache> = Arc::new(TtlHoldersCache::new());

    let api_state = ApiState {
        store: Arc::clone(&store),
        cache,
        supported_chain_ids,
    };

    let app = api::router(api_state);
    let listener = match tokio::net::TcpListener::bind(settings.api.socket_addr()).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %settings.api.socket_addr(), "failed to bind API listener");
            return ExitCode::FAILURE;
        }
    };

    let api_shutdown = shutdown.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { api_shutdown.cancelled().await })
            .await
        {
            error!(error = %err, "API server exited with error");
        }
    });

    let mut poller_handles = Vec::new();
    for chain in settings.chains.iter().filter(|c| c.supported).cloned() {
        let poller = match ChainPoller::new(
            chain.clone(),
            Arc::clone(&store),
            settings.indexer.clone(),
            shutdown.clone(),
        ) {
            Ok(poller) => poller,
            Err(err) => {
                error!(chain_id = chain.chain_id, error = %err, "failed to construct chain poller");
                return ExitCode::FAILURE;
            }
        };

        poller_handles.push(tokio::spawn(async move {
            if let Err(err) = poller.run().await {
                error!(chain_id = chain.chain_id, error = %err, "chain poller exited with error");
            }
        }));
    }

    if settings.indexer.once {
        for handle in poller_handles {
            let _ = handle.await;
        }
        shutdown.cancel();
        let _ = api_handle.await;
        return ExitCode::SUCCESS;
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return ExitCode::FAILURE;
    }

    info!("shutdown signal received, stopping pollers and API");
    shutdown.cancel();

    for handle in poller_handles {
        let _ = handle.await;
    }
    let _ = api_handle.await;

    ExitCode::SUCCESS
}
