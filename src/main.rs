use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::connect_to_db;
use crate::infrastructure::media::ffmpeg::FfmpegTranscoder;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::video::repository::VideoRepository;
use crate::modules::video::storage_path::StorageLayout;
use crate::state::AppState;
use crate::workers::pipeline::{ConversionPipeline, PipelineSettings};
use crate::workers::scheduler::{ConversionScheduler, SchedulerSettings};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting video conversion service...");

    let config = AppConfig::new().context("failed to load configuration")?;

    let db = connect_to_db(&config.database_url, config.conversion_max_concurrent)
        .await
        .context("failed to connect to PostgreSQL")?;

    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.storage_base_url,
    );
    for bucket in [&config.minio_bucket, &config.minio_thumbnails_bucket] {
        storage
            .ensure_bucket(bucket)
            .await
            .with_context(|| format!("failed to prepare bucket '{}'", bucket))?;
    }

    tokio::fs::create_dir_all(&config.conversion_temp_dir)
        .await
        .with_context(|| format!("failed to create {}", config.conversion_temp_dir.display()))?;

    let transcoder = FfmpegTranscoder::new(&config.ffmpeg_bin, &config.ffprobe_bin);
    if let Err(e) = transcoder.verify() {
        warn!(
            error = %e,
            "Media tools not found, conversions will fail until they are installed"
        );
    }

    let repository = Arc::new(VideoRepository::new(db));
    let pipeline = Arc::new(ConversionPipeline::new(
        repository.clone(),
        Arc::new(storage),
        Arc::new(transcoder),
        PipelineSettings::from_config(&config),
    ));
    let scheduler = Arc::new(ConversionScheduler::new(
        pipeline,
        SchedulerSettings::from_config(&config),
    ));
    scheduler.start();

    let layout = StorageLayout::from_config(&config);
    let app = app::create_app(AppState::new(repository, scheduler.clone(), layout));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    scheduler.stop();
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
