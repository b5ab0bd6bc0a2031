use feed_api::{AppState, Config};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize logging
    feed_api::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::from_config(&config);
    // Aborted with the runtime on shutdown
    let _pruner = state.spawn_limiter_pruning();
    let app = feed_api::app(state, &config);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");

    info!("Server running on http://{}", config.bind_addr);
    info!("API Endpoints:");
    info!("  GET    /health                 - Health check");
    info!("  POST   /auth/signup            - Create account");
    info!("  POST   /auth/login             - Login");
    info!("  GET    /users/me               - Get current user (auth)");
    info!("  GET    /posts                  - Global feed, newest first");
    info!("  POST   /posts                  - Create post (auth, rate limited)");
    info!("  GET    /posts/:id              - Get specific post");
    info!("  GET    /users/:user_id/posts   - Posts by one author");
    info!("  GET    /profiles/:username     - Public profile");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}
