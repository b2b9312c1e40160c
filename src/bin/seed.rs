//! Inserts the demo account into the configured user store.

use loginkit::{config::AppConfig, seed, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let state = AppState::init(AppConfig::from_env()?).await?;
    if let Some(db) = &state.db {
        sqlx::migrate!("./migrations").run(db).await?;
    }

    match seed::seed_demo_user(state.users.as_ref()).await? {
        seed::SeedOutcome::Created => tracing::info!("seeded {}", seed::DEMO_EMAIL),
        seed::SeedOutcome::AlreadyPresent => tracing::info!("nothing to seed"),
    }
    Ok(())
}
