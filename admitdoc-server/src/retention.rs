//! Background retention sweep for the status store.
//!
//! The pipeline core never deletes status entries; how long terminal
//! outcomes stick around is a deployment decision. When a TTL is configured
//! the server owns that policy through this sweeper.

use std::sync::Arc;
use std::time::Duration;

use admitdoc_pipeline::RenderPipeline;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the periodic sweep when a TTL is configured. Returns `None` when
/// retention is unlimited (`status_ttl_minutes = 0`).
pub fn spawn_retention_sweeper(
    pipeline: Arc<RenderPipeline>,
    cfg: &admitdoc_config::RetentionConfig,
) -> Option<JoinHandle<()>> {
    if cfg.status_ttl_minutes == 0 {
        return None;
    }

    let ttl = chrono::Duration::minutes(cfg.status_ttl_minutes as i64);
    let sweep_interval = Duration::from_secs(cfg.sweep_interval_secs.max(1));

    info!(
        ttl_minutes = cfg.status_ttl_minutes,
        sweep_interval_secs = cfg.sweep_interval_secs,
        "status retention sweeper started"
    );

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let purged = pipeline.store().purge_older_than(Utc::now() - ttl).await;
            if purged > 0 {
                debug!(purged, "purged expired render statuses");
            }
        }
    }))
}
