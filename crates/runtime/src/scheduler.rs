//! Background worker applying scheduled status changes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::Actor;
use domain::content::{ChangeContentStatus, ContentCommand};
use projections::ContentEntity;
use tokio_util::sync::CancellationToken;

use crate::cms::Cms;
use crate::error::Result;

/// Periodically changes the status of content whose scheduled time has come.
///
/// The change is submitted as the actor that scheduled it. A failing item is
/// logged and the sweep moves on to the next one.
pub struct ContentScheduler {
    cms: Arc<Cms>,
    interval: Duration,
}

impl ContentScheduler {
    pub fn new(cms: Arc<Cms>, interval: Duration) -> Self {
        Self { cms, interval }
    }

    /// Runs sweeps until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(Utc::now(), &cancel).await {
                        tracing::error!(error = %e, "scheduled status sweep failed");
                    }
                }
            }
        }

        tracing::info!("content scheduler stopped");
    }

    /// Applies every status change due at `now`. Returns the number of
    /// items visited.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn sweep(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<usize> {
        let visited = self
            .cms
            .contents()
            .query_scheduled_without_data(now, cancel, |content| self.apply(content))
            .await?;

        if visited > 0 {
            tracing::info!(visited, "scheduled status sweep complete");
        }
        Ok(visited)
    }

    async fn apply(&self, content: ContentEntity) {
        let Some(status) = content.scheduled_to else {
            return;
        };
        let actor = content
            .scheduled_by
            .as_deref()
            .and_then(Actor::parse)
            .unwrap_or_else(|| Actor::client("scheduler"));

        let command = ChangeContentStatus::new(actor, content.id, status);
        match self.cms.submit(ContentCommand::ChangeStatus(command)).await {
            Ok(result) if result.succeeded => {
                tracing::debug!(content_id = %content.id, %status, "scheduled status applied");
            }
            Ok(result) => {
                tracing::warn!(
                    content_id = %content.id,
                    %status,
                    message = result.message.as_deref().unwrap_or_default(),
                    "scheduled status rejected"
                );
            }
            Err(e) => {
                tracing::error!(content_id = %content.id, error = %e, "scheduled status failed");
            }
        }
    }
}
