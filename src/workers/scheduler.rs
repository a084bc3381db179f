use super::claims::ClaimSet;
use super::error::{ConversionError, ConversionResult};
use super::pipeline::ConversionPipeline;
use crate::config::settings::AppConfig;
use crate::modules::video::model::{NewVideoFile, Video, VideoQuality};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub poll_interval: Duration,
    pub max_concurrent: usize,
    /// Age after which an unclaimed "processing" video is handed back to the queue.
    pub stale_after: Option<Duration>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_concurrent: 5,
            stale_after: None,
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.conversion_interval,
            max_concurrent: config.conversion_max_concurrent,
            stale_after: Some(config.conversion_stale_after).filter(|d| !d.is_zero()),
        }
    }
}

/// Polls the repository for uploaded videos and hands each one to its own worker task.
pub struct ConversionScheduler {
    pipeline: Arc<ConversionPipeline>,
    claims: ClaimSet,
    settings: SchedulerSettings,
    shutdown: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ConversionScheduler {
    pub fn new(pipeline: Arc<ConversionPipeline>, settings: SchedulerSettings) -> Self {
        Self {
            pipeline,
            claims: ClaimSet::new(),
            settings,
            shutdown: CancellationToken::new(),
            poller: Mutex::new(None),
        }
    }

    /// Spawns the polling task. The first cycle runs one interval after start.
    pub fn start(self: &Arc<Self>) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.is_some() {
            warn!("Conversion scheduler already started");
            return;
        }
        if self.shutdown.is_cancelled() {
            warn!("Conversion scheduler was stopped and cannot be restarted");
            return;
        }

        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            max_concurrent = self.settings.max_concurrent,
            "Starting conversion scheduler"
        );

        let scheduler = Arc::clone(self);
        let token = self.shutdown.clone();
        *poller = Some(tokio::spawn(async move {
            let period = scheduler.settings.poll_interval;
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        scheduler.poll_once().await;
                    }
                }
            }
            info!("Conversion scheduler stopped");
        }));
    }

    /// Signals the polling task to exit. Running workers are left to finish on their own.
    pub fn stop(&self) {
        self.shutdown.cancel();
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if handle.is_some() {
            info!(in_flight = self.claims.len(), "Stopping conversion scheduler");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
            && self
                .poller
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    pub fn active_conversions(&self) -> Vec<Uuid> {
        self.claims.ids()
    }

    pub fn max_concurrent(&self) -> usize {
        self.settings.max_concurrent
    }

    /// One discovery cycle. Returns how many workers were dispatched.
    pub async fn poll_once(&self) -> usize {
        let repository = self.pipeline.repository();

        if let Some(stale_after) = self.settings.stale_after {
            match repository
                .release_stale_processing(stale_after, &self.claims.ids())
                .await
            {
                Ok(0) => {}
                Ok(released) => warn!(released, "Released stale conversions"),
                Err(e) => error!(error = %e, "Failed to release stale conversions"),
            }
        }

        let active = self.claims.len();
        let limit = self.settings.max_concurrent;
        debug!(active, limit, "Checking for videos to convert");
        if active >= limit {
            info!(active, limit, "Concurrency limit reached, skipping cycle");
            return 0;
        }

        let candidates = match repository.videos_for_conversion(limit - active).await {
            Ok(videos) => videos,
            Err(e) => {
                error!(error = %e, "Failed to fetch videos for conversion");
                return 0;
            }
        };
        debug!(found = candidates.len(), "Fetched conversion candidates");

        let mut dispatched = 0;
        for video in candidates {
            if self.shutdown.is_cancelled() || self.claims.len() >= limit {
                break;
            }

            let Some(guard) = self.claims.try_claim(video.id) else {
                debug!(video_id = %video.id, "Video is already being converted, skipping");
                continue;
            };

            // Dropping the guard on failure gives the id back.
            if let Err(e) = repository.claim_for_conversion(video.id).await {
                warn!(video_id = %video.id, error = %e, "Failed to claim video");
                continue;
            }

            let pipeline = Arc::clone(&self.pipeline);
            tokio::spawn(async move {
                let _guard = guard;
                pipeline.process(&video).await;
            });
            dispatched += 1;
        }

        if dispatched > 0 {
            info!(dispatched, active = self.claims.len(), "Dispatched conversions");
        }
        dispatched
    }

    /// Produces a single quality on demand, refusing videos that are already in flight.
    pub async fn convert_video(
        &self,
        video: &Video,
        quality: &VideoQuality,
    ) -> ConversionResult<NewVideoFile> {
        let _guard = self
            .claims
            .try_claim(video.id)
            .ok_or(ConversionError::AlreadyConverting(video.id))?;

        info!(video_id = %video.id, quality = %quality.name, "Starting manual conversion");
        self.pipeline.convert_single(video, quality).await
    }
}
