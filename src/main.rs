use std::{process, sync::Arc, time::Duration};

use aula::{
    application::AppError,
    cache::{InvalidationCoordinator, KeyValueStore, MemoryStore, RedisStore},
    config,
    infra::{
        InfraError,
        http::{GatewayState, build_router},
        telemetry,
    },
    realtime::RealtimeState,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = init_store(&settings).await?;
    let coordinator = Arc::new(InvalidationCoordinator::new(store));

    let state = GatewayState {
        realtime: RealtimeState::new(),
        coordinator,
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::unexpected(InfraError::from(err).to_string()))?;
    info!(addr = %settings.server.addr, "Gateway listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn init_store(settings: &config::Settings) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match settings.cache.url.as_deref() {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .map_err(|err| AppError::unexpected(format!("cache store unavailable: {err}")))?;
            info!("Connected to external cache store");
            Ok(Arc::new(store))
        }
        None => {
            info!("No cache store configured; using the in-process store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    info!(grace_seconds = grace.as_secs(), "Shutdown signal received");
}
