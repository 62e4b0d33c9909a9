//! Change feed and standing queries.
//!
//! Every document mutation publishes the touched collection on a broadcast
//! channel. A standing query subscribes before taking its first snapshot,
//! then re-runs whenever its collection changes and yields only snapshots
//! that differ from the last one it delivered.

use backend_core::{BackendError, Document, Query, SnapshotStream};
use futures::stream;
use sqlx::SqlitePool;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::documents::query_documents;

/// Buffered change notifications per subscriber before it lags.
const FEED_CAPACITY: usize = 256;

/// Broadcast of collection names touched by writes.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<String>,
}

impl ChangeFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Announce that `collection` changed.
    pub fn publish(&self, collection: &str) {
        // No receivers is fine: nobody is listening.
        let _ = self.sender.send(collection.to_string());
    }

    /// Receive future announcements.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Number of live standing queries.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

struct ListenState {
    pool: SqlitePool,
    query: Query,
    changes: broadcast::Receiver<String>,
    primed: bool,
    last: Option<Vec<Document>>,
}

/// Open a standing query over `pool`, fed by `feed`.
///
/// The returned stream holds no background task; dropping it detaches the
/// listener.
pub fn listen(pool: SqlitePool, feed: &ChangeFeed, query: Query) -> SnapshotStream {
    let state = ListenState {
        pool,
        changes: feed.subscribe(),
        query,
        primed: false,
        last: None,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if !state.primed {
            state.primed = true;
            return match query_documents(&state.pool, &state.query).await {
                Ok(snapshot) => {
                    state.last = Some(snapshot.clone());
                    Some((Ok(snapshot), state))
                }
                // `last` stays unset so the next successful query is delivered
                // even when it is empty.
                Err(e) => Some((Err(BackendError::from(e)), state)),
            };
        }

        loop {
            match state.changes.recv().await {
                Ok(collection) if collection == state.query.collection => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, collection = %state.query.collection, "Change feed lagged, re-querying");
                }
                Err(RecvError::Closed) => {
                    debug!(collection = %state.query.collection, "Change feed closed");
                    return None;
                }
            }

            match query_documents(&state.pool, &state.query).await {
                Ok(snapshot) => {
                    if state.last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    state.last = Some(snapshot.clone());
                    return Some((Ok(snapshot), state));
                }
                Err(e) => return Some((Err(BackendError::from(e)), state)),
            }
        }
    }))
}
