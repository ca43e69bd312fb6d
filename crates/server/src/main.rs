//! `ecss-server` bootstrap (spec §4.H, §6): load configuration, select a
//! job store backend, acquire the single-process advisory lock, seed the
//! scheduler engine from the store, then serve the REST API while the
//! engine runs in its own background task.

use std::sync::Arc;

use clap::Parser;
use ecss_core::Config;
use ecss_launcher::{EcsLauncher, TaskLauncher};
use ecss_scheduler::{AdvisoryLock, SchedulerEngine, Shutdown, DEFAULT_TICK_INTERVAL};
use ecss_store::{select_backend, JobStore};
use ecss_trigger::{QueueDepthTrigger, SqsDepthProbe, TriggerRegistry};
use ecss_server::cli::Cli;
use ecss_server::state::AppState;
use tokio::sync::mpsc;

/// Page size used only for the boot-time full scan; unrelated to the
/// API's own pagination default.
const BOOT_SCAN_PAGE: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ecss_core::config::load_dotenv();
    let cli = Cli::parse();
    let config = cli.apply_to(Config::from_env());

    let _log_guard = ecss_core::logging::init(&config.log);
    config.log_summary();

    // Required at runtime (spec §6 `ECS_CLUSTER`): refuse to start
    // without a target cluster rather than silently no-op launching.
    let cluster = config.cluster.ecs_cluster.clone().ok_or_else(|| {
        tracing::error!("ECSS_ECS_CLUSTER is required; refusing to start");
        anyhow::anyhow!("missing required ECS_CLUSTER configuration")
    })?;

    let store: Arc<dyn JobStore> = select_backend(&config).await?;

    let holder = format!("{}-{}", config.cluster.name.clone().unwrap_or_else(|| "ecss-server".to_string()), std::process::id());
    let lock = Arc::new(AdvisoryLock::new(store.clone(), holder));
    lock.acquire().await.map_err(|err| {
        tracing::error!(error = %err, "refusing to start scheduler loop");
        anyhow::anyhow!(err)
    })?;

    let mut registry = TriggerRegistry::new();
    registry.register("sqs", Arc::new(QueueDepthTrigger::new(Arc::new(SqsDepthProbe::new(&config.aws)))));
    let triggers = Arc::new(registry);

    let launcher: Arc<dyn TaskLauncher> = Arc::new(EcsLauncher::new(&config.aws, cluster));

    let mut engine = SchedulerEngine::new();
    engine.sync_from_store(load_all_jobs(store.as_ref()).await?);
    tracing::info!(jobs = engine.len(), "scheduler engine seeded from store");

    let (mutations_tx, mutations_rx) = mpsc::channel(256);
    let shutdown = Shutdown::default();

    let scheduler_handle = tokio::spawn(ecss_scheduler::run(
        engine,
        mutations_rx,
        store.clone(),
        triggers.clone(),
        launcher,
        lock,
        shutdown.clone(),
        DEFAULT_TICK_INTERVAL,
    ));

    let state = Arc::new(AppState::new(store, mutations_tx, triggers, config.clone()));
    let app = ecss_server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("ecss-server listening on http://{addr}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown)).await?;

    scheduler_handle.await?;
    tracing::info!("ecss-server exited cleanly");
    Ok(())
}

/// Full store scan at boot (spec §4.C "the engine reads it once at
/// boot"), paginated so no backend needs an unbounded-limit code path.
async fn load_all_jobs(store: &dyn JobStore) -> anyhow::Result<Vec<ecss_core::Job>> {
    let mut jobs = Vec::new();
    let mut skip = 0;
    loop {
        let page = store.list(skip, BOOT_SCAN_PAGE).await?;
        let got = page.items.len();
        jobs.extend(page.items);
        if got < BOOT_SCAN_PAGE || jobs.len() >= page.total {
            break;
        }
        skip += got;
    }
    Ok(jobs)
}

/// Wait for SIGINT or SIGTERM, then request scheduler shutdown. Also
/// handed to `axum::serve` as its graceful-shutdown future so the HTTP
/// listener and the tick loop stop on the same signal.
async fn shutdown_signal(shutdown: Shutdown) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for ctrl_c");
    }

    tracing::info!("shutdown signal received");
    shutdown.trigger();
}
