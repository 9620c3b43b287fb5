use std::sync::Arc;

use clap::Parser;
use livros::config::{Cli, Config};
use livros::db::Database;
use livros::handler::AppState;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("livros.svc starting");

    let cfg = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?args.config_path, "failed to load config file");
        std::process::exit(1);
    });

    let db_path = cfg.database_path();
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(error = %e, path = ?dir, "failed to create data directory");
            std::process::exit(1);
        }
    }

    let db = Arc::new(Database::new(&db_path).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?db_path, "failed to setup database");
        std::process::exit(1);
    }));

    let cors = livros::cors_layer(cfg.app.frontend_origin.as_deref()).unwrap_or_else(|e| {
        tracing::error!(error = %e, origin = ?cfg.app.frontend_origin, "invalid frontend origin");
        std::process::exit(1);
    });

    let app = livros::app(AppState { db }, cors);
    let address = format!("0.0.0.0:{}", cfg.app.get_port());

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("livros.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server stopped unexpectedly");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
    }

    tracing::info!("livros.svc going off, shutdown complete");
}
