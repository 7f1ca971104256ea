//! Share-link access recording.
//!
//! Accesses are recorded either inline, in the same transaction as the
//! validation, or through a bounded queue drained by [`AccessRecorder`].
//! The queue applies backpressure: a full queue makes the sender wait
//! instead of dropping the event. With the queue, `view_count` lags the
//! validation slightly, so quotas become soft.

use canopy_core::error::CoreError;
use canopy_core::types::DbId;
use canopy_db::repositories::ShareLinkRepo;
use canopy_db::DbPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One admitted share-link access, already sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub share_link_id: DbId,
    pub ip_address: String,
    pub user_agent: String,
}

/// Where admitted accesses go.
#[derive(Debug, Clone, Default)]
pub enum AccessSink {
    /// Write inside the validating transaction.
    #[default]
    Inline,
    /// Hand off to the background recorder.
    Queued(AccessRecorderHandle),
}

/// Sending half of the recorder queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AccessRecorderHandle {
    sender: mpsc::Sender<AccessEvent>,
}

impl AccessRecorderHandle {
    /// Enqueue an event, waiting while the queue is full.
    pub async fn record(&self, event: AccessEvent) -> Result<(), CoreError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| CoreError::Internal("share access recorder has shut down".into()))
    }
}

/// Background task that persists queued accesses.
pub struct AccessRecorder;

impl AccessRecorder {
    /// Create the queue and spawn the drain loop.
    ///
    /// The loop stops when `cancel` fires (after draining what is already
    /// queued) or when every handle is dropped.
    pub fn spawn(
        pool: DbPool,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (AccessRecorderHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(Self::run(pool, receiver, cancel));
        (AccessRecorderHandle { sender }, task)
    }

    /// Drain loop. Persistence failures are logged and the loop continues.
    pub async fn run(
        pool: DbPool,
        mut receiver: mpsc::Receiver<AccessEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Share access recorder started");
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => Self::persist(&pool, &event).await,
                    None => {
                        tracing::info!("Share access queue closed, recorder shutting down");
                        return;
                    }
                },
                _ = cancel.cancelled() => break,
            }
        }

        receiver.close();
        let mut drained = 0usize;
        while let Some(event) = receiver.recv().await {
            Self::persist(&pool, &event).await;
            drained += 1;
        }
        tracing::info!(drained, "Share access recorder stopped");
    }

    async fn persist(pool: &DbPool, event: &AccessEvent) {
        if let Err(e) = ShareLinkRepo::record_access(
            pool,
            event.share_link_id,
            &event.ip_address,
            &event.user_agent,
        )
        .await
        {
            tracing::error!(
                error = %e,
                share_link_id = event.share_link_id,
                "Failed to record share access"
            );
        }
    }
}
