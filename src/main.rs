use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::jobs::{MonthlyPayrollJob, Scheduler};
use payroll_engine::services::{InMemoryDirectory, LogNotifier, SystemClock};
use payroll_engine::store::DocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_dir = std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let loader = ConfigLoader::load(&config_dir)
        .and_then(ConfigLoader::with_env_overrides)
        .with_context(|| format!("failed to load configuration from '{}'", config_dir))?;
    let config = loader.config().clone();
    let settings = &config.settings;

    info!(
        environment = ?settings.server.environment,
        employees = config.employees.len(),
        rule_sets = config.rule_sets.len(),
        "Configuration loaded"
    );

    let store = match &settings.database.snapshot_path {
        Some(path) => DocumentStore::open(path).await?,
        None => DocumentStore::new(),
    };
    let store = Arc::new(store);
    let directory = Arc::new(InMemoryDirectory::new(config.employees.clone()));
    let clock = Arc::new(SystemClock);
    let notifier = Arc::new(LogNotifier::new(settings.mail.host.clone()));

    let state = AppState::new(settings, store, directory, clock.clone(), notifier);

    let seeded = state.rules().seed_rule_sets(config.rule_sets.clone()).await?;
    let defaults = state.rules().bootstrap_defaults().await?;
    info!(seeded_rule_sets = seeded, default_rules = defaults, "Rule store ready");

    let scheduler = Scheduler::new(
        clock,
        Duration::from_secs(settings.payroll.scheduler_poll_seconds.max(1)),
    )
    .register(Arc::new(MonthlyPayrollJob::new(
        state.payroll().clone(),
        settings.payroll.batch_day_of_month,
    )));
    tokio::spawn(scheduler.run());

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_address))?;
    info!("Listening on http://{}", settings.server.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
