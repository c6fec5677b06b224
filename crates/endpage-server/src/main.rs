use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use endpage_api::media::MediaStore;
use endpage_api::{AppStateInner, router};
use endpage_store::{PageStore, UserStore};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "default-jwt-secret",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "endpage=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("ENDPAGE_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: ENDPAGE_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Tokens signed with a guessable secret are forgeable.");
        eprintln!("       Set it to a random string in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("ENDPAGE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ENDPAGE_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;
    let data_dir: PathBuf = std::env::var("ENDPAGE_DATA_DIR")
        .unwrap_or_else(|_| "./data".into())
        .into();
    let upload_dir: PathBuf = std::env::var("ENDPAGE_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads".into())
        .into();
    let max_upload_bytes: u64 = std::env::var("ENDPAGE_MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10 * 1024 * 1024); // 10 MiB

    // Init stores (repairs missing/empty files to header-only)
    let users = UserStore::open(data_dir.join("users.csv")).await?;
    let pages = PageStore::open(data_dir.join("pages.csv")).await?;
    let media = MediaStore::new(&upload_dir).await?;

    let state = Arc::new(AppStateInner {
        users,
        pages,
        media,
        jwt_secret,
        max_upload_bytes,
    });

    // Body cap sits above the upload limit so the gate can answer with a
    // JSON error instead of a connection reset.
    let app = router(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize + 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("endpage server listening on {}", addr);
    info!(
        "Data dir: {}, uploads: {}",
        data_dir.display(),
        upload_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
