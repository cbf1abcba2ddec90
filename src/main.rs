mod app;
mod audit;
mod auth;
mod config;
mod dates;
mod digest;
mod error;
mod insights;
mod logs;
mod notify;
mod rate_limit;
mod state;
mod trackables;
mod transfer;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "healthtrack=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    // Held for the lifetime of the process; dropping it stops the digest job.
    let _scheduler = digest::start_scheduler(
        app_state.db.clone(),
        app_state.notifier.clone(),
        &app_state.config.digest_schedule,
    )
    .await?;

    let app = app::build_app(app_state);
    app::serve(app).await
}
