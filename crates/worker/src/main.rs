use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentra_engine::evaluation::EvaluationCycle;
use sentra_engine::gateway::DataSourceRegistry;
use sentra_engine::ingestion::IngestionScheduler;
use sentra_engine::ports::{
    AssetRepository, MetricDataRepository, RuleFilter, RuleRepository, SignalStateRepository,
    UnitOfWorkProvider,
};
use sentra_engine::runner::{run_evaluation_loop, run_ingestion_loop};
use sentra_sources::{HttpGatewayConfig, HttpJsonGateway};

mod config;

use config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentra_worker=debug,sentra_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        ingestion_interval_secs = config.ingestion_interval.as_secs(),
        evaluation_interval_secs = config.evaluation_interval.as_secs(),
        sources = config.data_sources.len(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = sentra_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    sentra_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Data-source registry ---
    let mut registry = DataSourceRegistry::new();
    for source in &config.data_sources {
        let gateway = HttpJsonGateway::new(HttpGatewayConfig {
            url: source.url.clone(),
            api_key: source.api_key.clone(),
            timeout: config.source_timeout,
        });
        tracing::info!(code = %source.code, url = %source.url, "Registered data source");
        registry.register(source.code.clone(), Arc::new(gateway));
    }
    let registry = Arc::new(registry);

    // --- Engines ---
    let store = Arc::new(sentra_db::store::PgStore::new(pool));

    let scheduler = Arc::new(IngestionScheduler::new(
        Arc::clone(&store) as Arc<dyn AssetRepository>,
        registry,
        Arc::clone(&store) as Arc<dyn UnitOfWorkProvider>,
    ));
    let evaluation = Arc::new(EvaluationCycle::new(
        Arc::clone(&store) as Arc<dyn RuleRepository>,
        Arc::clone(&store) as Arc<dyn MetricDataRepository>,
        Arc::clone(&store) as Arc<dyn SignalStateRepository>,
        Arc::clone(&store) as Arc<dyn UnitOfWorkProvider>,
    ));

    // --- Engine loops ---
    let cancel = CancellationToken::new();

    let ingestion_handle = tokio::spawn(run_ingestion_loop(
        scheduler,
        config.ingestion_interval,
        cancel.clone(),
    ));
    let evaluation_handle = tokio::spawn(run_evaluation_loop(
        evaluation,
        RuleFilter::default(),
        config.evaluation_interval,
        cancel.clone(),
    ));

    tracing::info!("Worker started (ingestion + evaluation loops running)");

    // --- Shutdown ---
    shutdown_signal().await;
    cancel.cancel();

    let _ = ingestion_handle.await;
    let _ = evaluation_handle.await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
