use std::time::Duration;

use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::CdcError;

const MIN_RECONNECT: Duration = Duration::from_secs(10);
const MAX_RECONNECT: Duration = Duration::from_secs(60);
const CHANNEL_CAPACITY: usize = 128;

/// Subscribe to one notify channel and stream its payloads into a bounded
/// channel.
///
/// Transport loss is retried with 10 s..60 s backoff. A terminal transport
/// error (bad credentials, unknown database) cancels the process token:
/// without the change stream the engine state becomes unobservable and the
/// agent must not silently diverge.
///
/// Payloads may be re-delivered or observed out of order across the
/// set/delete channel pair after a reconnect; consumers are required to be
/// idempotent.
pub async fn listen(
    db_url: &str,
    channel: &str,
    cancel: CancellationToken,
) -> Result<mpsc::Receiver<String>, CdcError> {
    let mut listener = PgListener::connect(db_url).await?;
    listener.listen(channel).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let db_url = db_url.to_string();
    let channel = channel.to_string();
    tokio::spawn(async move {
        let mut backoff = MIN_RECONNECT;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(channel = %channel, "cdc listener stopped");
                    return;
                }
                next = listener.recv() => match next {
                    Ok(notification) => {
                        backoff = MIN_RECONNECT;
                        if tx.send(notification.payload().to_string()).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        if is_terminal(&e) {
                            error!(channel = %channel, error = %e, "fatal cdc transport error, shutting down");
                            cancel.cancel();
                            return;
                        }
                        warn!(channel = %channel, error = %e, "cdc transport lost, reconnecting");
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(backoff) => {}
                        }
                        backoff = (backoff * 2).min(MAX_RECONNECT);
                        if let Ok(mut replacement) = PgListener::connect(&db_url).await {
                            if replacement.listen(&channel).await.is_ok() {
                                listener = replacement;
                            }
                        }
                        // on failure the next recv() error repeats the cycle
                    }
                }
            }
        }
    });
    Ok(rx)
}

// Errors no amount of reconnecting will fix.
fn is_terminal(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Configuration(_) | sqlx::Error::Tls(_) => true,
        sqlx::Error::Database(db) => {
            // invalid_authorization_specification / invalid_catalog_name
            matches!(db.code().as_deref(), Some(code) if code.starts_with("28") || code == "3D000")
        }
        _ => false,
    }
}
