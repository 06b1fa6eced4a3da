use community_portal::{
    FileStorage, HttpPortalApi, MemoryStorage, Portal, StorageState,
    config::{ClientConfig, Env},
    shell::Shell,
};
use std::{process::ExitCode, sync::Arc};
use tokio::io::{BufReader, stdin, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point of the terminal client: configuration, logging, storage, API client,
/// session restore, then the interactive shell.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration (fail-fast on missing production settings)
    dotenv::dotenv().ok();
    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 2. Logging filter. RUST_LOG wins when set.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "community_portal=debug".into());

    // 3. Log format per environment. Logs go to stderr so they never interleave with
    // shell output on stdout.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    tracing::info!("Client starting in {:?} mode against {}", config.env, config.api_url);

    // 4. Storage. An empty STORAGE_PATH keeps everything in memory for this run only.
    let storage: StorageState = if config.storage_path.as_os_str().is_empty() {
        tracing::warn!("STORAGE_PATH is empty; the session will not survive a restart");
        Arc::new(MemoryStorage::new())
    } else {
        tracing::debug!(path = %config.storage_path.display(), "storage ready");
        Arc::new(FileStorage::new(&config.storage_path))
    };

    // 5. API client
    let api = match HttpPortalApi::new(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::error!("failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 6. Portal context and session restore
    let portal = Portal::new(config, storage, api);
    match portal.restore_session() {
        Some(session) => tracing::info!(user_id = %session.user.id, "session restored"),
        None => tracing::debug!("no stored session"),
    }

    // 7. Interactive shell
    let mut shell = Shell::new(portal, BufReader::new(stdin()), stdout());
    if let Err(e) = shell.run().await {
        tracing::error!("shell terminated: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
