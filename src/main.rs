use std::sync::Arc;

use log::info;
use quiz_match_api::{ConnectionRegistry, JwtAuthenticationService};
use quiz_match_app::{build_application, config::MatchConfig};
use quiz_persistence_sqlite::{SqliteUserRepository, create_user_db_pool};

mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }

    logs::init_logger();

    let config = MatchConfig::from_env();
    info!("Match configuration: {:?}", config);

    let database_url =
        std::env::var("QUIZ_DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.db".to_string());
    let pool = create_user_db_pool(&database_url)
        .await
        .expect("Failed to open user database");

    let user_repo = Arc::new(SqliteUserRepository::new(pool));
    let connections = Arc::new(ConnectionRegistry::new());
    let authentication_service = Arc::new(JwtAuthenticationService::from_env());

    let app = Arc::new(build_application(
        user_repo,
        connections.clone(),
        authentication_service,
        &config,
    ));

    info!("Starting application");

    let http_app = tokio::spawn(async move {
        quiz_match_api::run(app, connections, shutdown_signal()).await;
    });

    if let Err(e) = http_app.await {
        log::error!("HTTP API task failed: {}", e);
    }
}
