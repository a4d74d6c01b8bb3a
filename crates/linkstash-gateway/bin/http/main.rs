use anyhow::Context;
use clap::Parser;
use linkstash_gateway::config::{open_storage, Cli};
use linkstash_gateway::{App, AppState};
use linkstash_generator::RandomGenerator;
use linkstash_shortener::{DeletionWorker, ShortenerService};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    linkstash_telemetry::init(config.log_format)?;

    let backend = config.storage_backend();
    info!(
        server_address = %config.server_address,
        base_url = %config.base_url,
        storage_backend = %backend,
        "starting linkstash"
    );

    let storage = match open_storage(&backend).await {
        Ok(storage) => storage,
        Err(err) => {
            error!(error = %err, storage_backend = %backend, "failed to open storage");
            return Err(err).context("open storage");
        }
    };

    let (queue, worker) = DeletionWorker::spawn(storage.clone(), config.delete_queue_capacity);
    let generator = RandomGenerator::builder()
        .length(usize::from(config.id_length))
        .build();
    let shortener = ShortenerService::new(storage, generator, queue, config.base_url);
    let router = App::router(AppState::new(shortener));

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("bind {}", config.server_address))?;
    info!(listen_addr = %listener.local_addr()?, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    // The router owned the last queue handle, so the worker now drains.
    info!("http server stopped, draining deletion queue");
    let stats = worker.join().await;
    info!(
        completed = stats.completed,
        failed = stats.failed,
        "shutdown complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
