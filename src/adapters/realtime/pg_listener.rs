//! Bridges Postgres `LISTEN/NOTIFY` into the in-process change feed.
//!
//! Triggers on the watched tables call `pg_notify(<channel>, json)` with
//! `{table, type, record, old_record}`; see the migrations.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::watch;

use crate::domain::foundation::DomainError;

use super::change_feed::{decode_notification, ChangeFeed};

/// Notification channel the triggers publish on.
pub const CHANGE_CHANNEL: &str = "membergate_changes";

pub struct PgChangeListener {
    pool: PgPool,
    feed: Arc<ChangeFeed>,
}

impl PgChangeListener {
    pub fn new(pool: PgPool, feed: Arc<ChangeFeed>) -> Self {
        Self { pool, feed }
    }

    /// Forwards notifications until shutdown is signalled.
    ///
    /// Lost connections are re-established by `PgListener` on the next
    /// receive; the loop only backs off briefly after an error.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to open listener: {}", e)))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|e| DomainError::database(format!("Failed to LISTEN: {}", e)))?;

        tracing::info!(channel = CHANGE_CHANNEL, "Change listener started");

        loop {
            tokio::select! {
                notification = listener.recv() => match notification {
                    Ok(notification) => match decode_notification(notification.payload()) {
                        Some((topic, change)) => {
                            let delivered = self.feed.publish(topic, change).await;
                            tracing::debug!(?topic, delivered, "Change forwarded");
                        }
                        None => {
                            tracing::debug!(payload = notification.payload(), "Ignoring change notification");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Change listener receive failed");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Change listener shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
