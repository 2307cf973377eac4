use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use metro_server::config::AppConfig;
use metro_server::domain::SystemClock;
use metro_server::reference::{FileKvStore, ReferenceCache};
use metro_server::repository::ScheduleRepository;
use metro_server::service::ScheduleService;
use metro_server::store::spawn_bootstrap;
use metro_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("metro_server=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // The database opens in the background; requests wait on the gate.
    let gate = spawn_bootstrap(config.store_config());

    let references = ReferenceCache::new(
        gate.clone(),
        FileKvStore::new(&config.cache_dir),
        config.data_version.clone(),
    );
    let repository = ScheduleRepository::new(gate.clone(), &config.repository_config());
    let service = ScheduleService::new(gate.clone(), references, repository, Arc::new(SystemClock))
        .with_fix_options(config.fix_options());

    let app = create_router(AppState::new(service));

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(
        addr = %config.bind,
        database = %config.database.display(),
        cache_dir = %config.cache_dir.display(),
        "metro server listening"
    );

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // A database that never opens is fatal.
    if let Err(e) = gate.wait().await {
        error!(error = %e, "schedule database unavailable, shutting down");
        return ExitCode::FAILURE;
    }

    match server.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(error = %e, "server error");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "server task failed");
            ExitCode::FAILURE
        }
    }
}
