use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use todo_notes::{config::Config, create_app, db, AppState};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.environment.default_log_filter())),
        )
        .init();

    let db = match db::init_db(&config.database_path) {
        Ok(db) => db,
        Err(err) => {
            error!(path = %config.database_path.display(), ?err, "Failed to open database");
            std::process::exit(1);
        }
    };

    let state = AppState {
        db,
        frontend_dir: config.frontend_dir().map(Arc::from),
    };
    let app = create_app(state);
    let addr = (Ipv4Addr::UNSPECIFIED, config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|err| panic!("Failed to bind to port {}: {err}", config.port));

    info!(environment = ?config.environment, "running on {addr:?}");

    axum::serve(listener, app).await.expect("failed serving");
}
