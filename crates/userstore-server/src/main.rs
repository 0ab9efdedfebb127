//! userstore server — application entry point.

mod http;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use userstore_db::{DbManager, SurrealUserRepository};

use crate::http::AppState;
use crate::settings::{ListenConfig, ListenKind, LogConfig, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.log)?;

    info!("Starting userstore server...");

    let manager = DbManager::connect(&settings.database)
        .await
        .context("failed to connect to SurrealDB")?;
    userstore_db::run_migrations(manager.client(), &settings.database.table)
        .await
        .context("failed to prepare user table")?;

    let repo = SurrealUserRepository::new(manager.client().clone(), &settings.database.table);
    let shutdown = CancellationToken::new();
    let app = http::router(Arc::new(AppState {
        repo,
        shutdown: shutdown.clone(),
    }));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
            }
            shutdown.cancel();
        }
    });

    serve(app, &settings.listen, shutdown).await?;

    info!("userstore server stopped.");
    Ok(())
}

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::try_new(&log.filter).context("invalid log filter")?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn serve(
    app: axum::Router,
    listen: &ListenConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let stop = shutdown.cancelled_owned();
    match listen.kind {
        ListenKind::Tcp => {
            let address = format!("{}:{}", listen.bind_ip, listen.port);
            let listener = tokio::net::TcpListener::bind(&address)
                .await
                .with_context(|| format!("failed to listen on {address}"))?;
            info!(address = %address, "Server is listening on TCP");
            axum::serve(listener, app)
                .with_graceful_shutdown(stop)
                .await?;
        }
        ListenKind::Sock => {
            let path = socket_path()?;
            // A socket left behind by an unclean exit blocks bind.
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
            }
            let listener = tokio::net::UnixListener::bind(&path)
                .with_context(|| format!("failed to listen on {}", path.display()))?;
            info!(path = %path.display(), "Server is listening on unix socket");
            axum::serve(listener, app)
                .with_graceful_shutdown(stop)
                .await?;
        }
    }
    Ok(())
}

/// `app.sock` in the directory holding the executable.
fn socket_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join("app.sock"))
}
