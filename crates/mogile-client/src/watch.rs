//! Tracker event stream.
//!
//! A watch holds one dedicated connection to one tracker, switched into
//! event mode with the raw `!watch` line. The tracker then pushes a
//! line per event. Cache invalidation events look like
//! `... [cache][client_id] payload`; the id lets a client recognize and
//! skip events it caused itself.

use std::time::Duration;

use tracing::{debug, warn};

use mogile_pool::{TrackerConn, TrackerPool};
use mogile_proto::command;
use mogile_types::defaults;

/// Dial deadline for the event connection. Short because the stream
/// retries forever anyway.
const WATCH_CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// A live event stream from one tracker.
///
/// Reconnects on every failure after a short pause and never gives up;
/// drop the value to stop watching.
pub struct Watch {
    pool: TrackerPool,
    tracker: usize,
    client_id: Option<String>,
    conn: Option<TrackerConn>,
}

impl Watch {
    pub(crate) fn new(pool: TrackerPool, tracker: usize, client_id: Option<String>) -> Self {
        Self {
            pool,
            tracker,
            client_id,
            conn: None,
        }
    }

    /// Next raw event line, terminator stripped.
    pub async fn next_line(&mut self) -> String {
        loop {
            if self.conn.is_none() {
                match self.pool.checkout_at(self.tracker, WATCH_CONNECT_TIMEOUT).await {
                    Ok(mut conn) => {
                        if let Err(err) = conn
                            .send_raw(command::WATCH_LINE, WATCH_CONNECT_TIMEOUT)
                            .await
                        {
                            warn!(error = %err, "failed to send watch command");
                        }
                        self.conn = Some(conn);
                    }
                    Err(err) => {
                        debug!(
                            tracker = %self.pool.tracker_addr(self.tracker),
                            error = %err,
                            "watch dial failed"
                        );
                    }
                }
            }
            if let Some(conn) = self.conn.as_mut() {
                match conn.wait_line().await {
                    Ok(line) => {
                        // stray NULs precede some lines on the wire
                        let line = line
                            .trim_end_matches(['\r', '\n'])
                            .trim_start_matches('\0');
                        return line.to_string();
                    }
                    Err(err) => {
                        warn!(error = %err, "watch read failed, reconnecting");
                        self.conn = None;
                    }
                }
            }
            tokio::time::sleep(defaults::WATCH_RETRY_WAIT).await;
        }
    }

    /// Next cache invalidation payload from some other client.
    ///
    /// Skips non-cache lines and this client's own echoes.
    pub async fn next_cache_event(&mut self) -> String {
        loop {
            let line = self.next_line().await;
            if let Some(payload) = parse_cache_line(&line, self.client_id.as_deref()) {
                return payload;
            }
        }
    }
}

/// Extract the payload of a `[cache][id] payload` line. Returns `None`
/// for non-cache lines and for events stamped with `own_id`.
fn parse_cache_line(line: &str, own_id: Option<&str>) -> Option<String> {
    let start = line.find("[cache][")? + "[cache][".len();
    let rest = &line[start..];
    let id_end = rest.find([']', ' ']).unwrap_or(rest.len());
    if own_id == Some(&rest[..id_end]) {
        return None;
    }
    Some(rest.get(id_end + 2..)?.to_string())
}
