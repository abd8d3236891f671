use std::sync::Arc;

use freshet::metrics::encode_metrics;
use freshet::metrics::register_custom_metrics;
use freshet::metrics::REGISTRY;
use freshet::CollectionService;
use freshet::FetchError;
use freshet::ReqwestTransport;
use freshet::Result;
use freshet::Settings;
use futures::StreamExt;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    // Optional config file as first argument, otherwise FRESHET_CONFIG / env only
    let path = std::env::args().nth(1);
    let settings = Settings::load(path.as_deref())?;

    // Initializing Logs
    init_observability();
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        warn!("metrics not registered: {}", e);
    }

    // Initializing Shutdown Signal
    let (graceful_tx, mut graceful_rx) = watch::channel(());

    let transport = ReqwestTransport::new(settings.endpoint.request_timeout()).map_err(FetchError::from)?;
    let service = CollectionService::from_settings(&settings, Arc::new(transport))?;

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let mut index = service.index();
    loop {
        tokio::select! {
            next = index.next() => match next {
                Some(index) => info!(items = index.len(), "index updated"),
                None => break,
            },
            _ = graceful_rx.changed() => break,
        }
    }

    debug!("final metrics:\n{}", encode_metrics(&REGISTRY));
    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    if graceful_tx.send(()).is_err() {
        warn!("shutdown signal receiver already gone");
    }
    info!("Shutdown completed");
    Ok(())
}

fn init_observability() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
