use postboard::{app, state::AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "postboard=debug,axum=info,tower_http=info";

/// Text logs by default; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => fmt.with_target(false).json().init(),
        _ => fmt.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    if let Some(db) = &state.db {
        if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }

    let addr = state.config.bind_addr;
    app::serve(app::build_app(state), addr).await
}
