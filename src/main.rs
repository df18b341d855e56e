use std::sync::Arc;

use gophermart::accrual::intake::IntakeService;
use gophermart::accrual::repository_sqlx::SqlxAccrualRepository;
use gophermart::balance::engine::BalanceEngine;
use gophermart::balance::repository_sqlx::SqlxBalanceRepository;
use gophermart::config::AppConfig;
use gophermart::db::Db;
use gophermart::execution::scorer::ScorerClient;
use gophermart::execution::worker::WorkerPool;
use gophermart::http::{self, state::AppState};
use gophermart::logger::init_tracing;
use gophermart::metrics::counters::Counters;
use gophermart::scheduler::accrual_scheduler::AccrualScheduler;
use gophermart::users::repository_sqlx::SqlxUserRepository;
use gophermart::users::service::UserService;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    let cfg = AppConfig::load();

    tracing::info!(run_address = %cfg.run_address, "starting gophermart");

    let db = Db::connect(&cfg.database_uri).await?;
    db.migrate().await?;

    let reset = db.recover_uncommitted().await?;
    if reset > 0 {
        tracing::warn!(reset, "cleared stale processing locks left by a previous run");
    }

    let accrual_repo = Arc::new(SqlxAccrualRepository::new(db.pool.clone()));
    let balance_repo = Arc::new(SqlxBalanceRepository::new(db.pool.clone()));
    let user_repo = Arc::new(SqlxUserRepository::new(db.pool.clone()));

    let user_service = Arc::new(UserService::new(user_repo, cfg.jwt_secret_key.clone()));
    let intake_service = Arc::new(IntakeService::new(accrual_repo.clone()));
    let balance_engine = Arc::new(BalanceEngine::new(balance_repo));

    let counters = Counters::default();
    let shutdown = CancellationToken::new();

    let (batch_tx, batch_rx) = mpsc::channel(cfg.process_accruals_buffer_size);

    let scorer = Arc::new(ScorerClient::new(cfg.accrual_system_address.clone()));
    let worker_pool = Arc::new(WorkerPool::new(accrual_repo.clone(), scorer, counters.clone()));
    let worker_handles = worker_pool.spawn(
        batch_rx,
        cfg.process_accruals_worker_pool_size,
        shutdown.clone(),
    );

    let scheduler = AccrualScheduler::new(
        accrual_repo,
        cfg.process_accruals_batch_max_size,
        counters,
    );
    let scheduler_shutdown = shutdown.clone();
    let scheduler_interval = cfg.get_new_accruals_interval;
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(batch_tx, scheduler_interval, scheduler_shutdown).await;
    });

    let state = AppState {
        user_service,
        intake_service,
        balance_engine,
        jwt_secret: cfg.jwt_secret_key.clone(),
    };

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(cfg.run_address.as_str()).await?;

    tracing::info!(run_address = %cfg.run_address, "listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    scheduler_handle.await?;
    for handle in worker_handles {
        handle.await?;
    }

    Ok(())
}
