use loginkit::{app, config::AppConfig, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    // Run migrations when backed by postgres
    if let Some(db) = &app_state.db {
        if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }

    let config = app_state.config.clone();
    let router = app::build_app(app_state);
    app::serve(router, &config).await
}
