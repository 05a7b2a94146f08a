//! Tracker membership, connection reuse, and dispatch.
//!
//! Every tracker starts active. A failed dial moves it to the inactive
//! list; a background maintenance task probes inactive trackers back to
//! life and expires idle connections. Requests walk the active set from
//! a random starting point so load spreads without coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use mogile_proto::{command, Params, Response};
use mogile_types::{defaults, TrackerAddr};

use crate::conn::TrackerConn;
use crate::error::{PoolError, PoolResult};

/// Pool tunables.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Dial and per-exchange deadline.
    pub timeout: Duration,
    /// Idle connections older than this are dropped by maintenance.
    pub connection_expire: Duration,
    /// Pause between maintenance passes.
    pub maintenance_interval: Duration,
    /// Disable to run without the background maintenance task.
    pub maintenance: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            timeout: defaults::TRACKER_TIMEOUT,
            connection_expire: defaults::CONNECTION_EXPIRE,
            maintenance_interval: defaults::MAINTENANCE_INTERVAL,
            maintenance: true,
        }
    }
}

/// Shared handle to the tracker pool. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TrackerPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    trackers: Vec<Tracker>,
    membership: RwLock<Membership>,
    config: PoolConfig,
    maintenance_started: AtomicBool,
}

#[derive(Debug)]
struct Tracker {
    addr: TrackerAddr,
    /// Idle connections, most recently used at the back.
    idle: Mutex<Vec<TrackerConn>>,
}

#[derive(Debug)]
struct Membership {
    active: Vec<usize>,
    inactive: Vec<usize>,
}

/// What checkout produced, so failure handling can tell a stale pooled
/// connection from a broken tracker.
enum Checkout {
    Pooled(TrackerConn),
    Fresh(TrackerConn),
}

impl TrackerPool {
    /// Build a pool over `addrs`. Every tracker starts active.
    pub fn new(addrs: Vec<TrackerAddr>, config: PoolConfig) -> Self {
        let trackers: Vec<Tracker> = addrs
            .into_iter()
            .map(|addr| Tracker {
                addr,
                idle: Mutex::new(Vec::new()),
            })
            .collect();
        let membership = Membership {
            active: (0..trackers.len()).collect(),
            inactive: Vec::new(),
        };
        Self {
            inner: Arc::new(PoolInner {
                trackers,
                membership: RwLock::new(membership),
                config,
                maintenance_started: AtomicBool::new(false),
            }),
        }
    }

    /// Send `cmd` to whichever active tracker answers first.
    ///
    /// A failure on a pooled connection retries the same tracker, since
    /// the connection was likely stale; a failure on a fresh connection
    /// moves on to the next tracker. A failed dial deactivates the
    /// tracker. Once every active tracker has been tried the last
    /// failure is returned.
    pub async fn request(&self, cmd: &str, params: &Params) -> PoolResult<Response> {
        self.ensure_maintenance();
        let inner = &self.inner;
        let active = inner.snapshot_active();
        if active.is_empty() {
            warn!(cmd, "no active trackers");
            return Err(PoolError::NoTrackers);
        }
        let mut last_err = PoolError::NoTrackers;
        for idx in random_walk(&active) {
            loop {
                match inner.checkout(idx, inner.config.timeout).await {
                    Ok(Checkout::Pooled(mut conn)) => {
                        match conn.request(cmd, params, inner.config.timeout).await {
                            Ok(resp) => {
                                inner.checkin(idx, conn);
                                return Ok(resp);
                            }
                            Err(err) => {
                                debug!(
                                    tracker = %inner.trackers[idx].addr,
                                    error = %err,
                                    "pooled connection failed, retrying tracker"
                                );
                                last_err = err;
                            }
                        }
                    }
                    Ok(Checkout::Fresh(mut conn)) => {
                        match conn.request(cmd, params, inner.config.timeout).await {
                            Ok(resp) => {
                                inner.checkin(idx, conn);
                                return Ok(resp);
                            }
                            Err(err) => {
                                warn!(
                                    tracker = %inner.trackers[idx].addr,
                                    error = %err,
                                    "request failed on fresh connection"
                                );
                                last_err = err;
                            }
                        }
                        break;
                    }
                    Err(err) => {
                        last_err = err;
                        break;
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Take a connection to one specific tracker, pooled or fresh.
    ///
    /// The event stream uses this with its own, much shorter dial
    /// deadline. A failed dial deactivates the tracker, same as during
    /// dispatch.
    pub async fn checkout_at(
        &self,
        idx: usize,
        connect_timeout: Duration,
    ) -> PoolResult<TrackerConn> {
        self.ensure_maintenance();
        match self.inner.checkout(idx, connect_timeout).await? {
            Checkout::Pooled(conn) | Checkout::Fresh(conn) => Ok(conn),
        }
    }

    /// Pick a random active tracker index.
    pub fn pick_active(&self) -> Option<usize> {
        let active = self.inner.snapshot_active();
        if active.is_empty() {
            return None;
        }
        let pick = rand::thread_rng().gen_range(0..active.len());
        Some(active[pick])
    }

    /// Address of the tracker at `idx`.
    pub fn tracker_addr(&self, idx: usize) -> &TrackerAddr {
        &self.inner.trackers[idx].addr
    }

    pub fn tracker_count(&self) -> usize {
        self.inner.trackers.len()
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .membership
            .read()
            .expect("pool lock poisoned")
            .active
            .len()
    }

    /// Idle connections currently pooled for the tracker at `idx`.
    pub fn idle_count(&self, idx: usize) -> usize {
        self.inner.trackers[idx]
            .idle
            .lock()
            .expect("idle stack poisoned")
            .len()
    }

    /// Run one maintenance pass now. Probes inactive trackers and
    /// expires stale idle connections.
    pub async fn maintain(&self) {
        self.inner.probe_inactive().await;
        self.inner.expire_idle();
    }

    fn ensure_maintenance(&self) {
        if !self.inner.config.maintenance {
            return;
        }
        if self
            .inner
            .maintenance_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let weak = Arc::downgrade(&self.inner);
            tokio::spawn(maintenance_loop(weak));
        }
    }
}

/// Runs until every pool handle is gone.
async fn maintenance_loop(weak: Weak<PoolInner>) {
    loop {
        let interval = {
            let Some(inner) = weak.upgrade() else { return };
            inner.config.maintenance_interval
        };
        tokio::time::sleep(interval).await;
        let Some(inner) = weak.upgrade() else { return };
        inner.probe_inactive().await;
        inner.expire_idle();
    }
}

impl PoolInner {
    fn snapshot_active(&self) -> Vec<usize> {
        self.membership
            .read()
            .expect("pool lock poisoned")
            .active
            .clone()
    }

    fn snapshot_inactive(&self) -> Vec<usize> {
        self.membership
            .read()
            .expect("pool lock poisoned")
            .inactive
            .clone()
    }

    async fn checkout(&self, idx: usize, connect_timeout: Duration) -> PoolResult<Checkout> {
        if let Some(conn) = self.pop_idle(idx) {
            return Ok(Checkout::Pooled(conn));
        }
        match TrackerConn::connect(&self.trackers[idx].addr, connect_timeout).await {
            Ok(conn) => Ok(Checkout::Fresh(conn)),
            Err(err) => {
                warn!(
                    tracker = %self.trackers[idx].addr,
                    error = %err,
                    "dial failed, deactivating tracker"
                );
                self.deactivate(idx);
                Err(err)
            }
        }
    }

    fn pop_idle(&self, idx: usize) -> Option<TrackerConn> {
        self.trackers[idx]
            .idle
            .lock()
            .expect("idle stack poisoned")
            .pop()
    }

    fn checkin(&self, idx: usize, mut conn: TrackerConn) {
        conn.touch();
        self.trackers[idx]
            .idle
            .lock()
            .expect("idle stack poisoned")
            .push(conn);
    }

    /// Move a tracker to the inactive list and drop its idle
    /// connections. Safe to call repeatedly.
    fn deactivate(&self, idx: usize) {
        let moved = {
            let mut membership = self.membership.write().expect("pool lock poisoned");
            match membership.active.iter().position(|&i| i == idx) {
                Some(pos) => {
                    membership.active.remove(pos);
                    membership.inactive.push(idx);
                    true
                }
                None => false,
            }
        };
        if moved {
            info!(tracker = %self.trackers[idx].addr, "tracker deactivated");
            self.trackers[idx]
                .idle
                .lock()
                .expect("idle stack poisoned")
                .clear();
        }
    }

    fn activate(&self, idx: usize) {
        let moved = {
            let mut membership = self.membership.write().expect("pool lock poisoned");
            match membership.inactive.iter().position(|&i| i == idx) {
                Some(pos) => {
                    membership.inactive.remove(pos);
                    membership.active.push(idx);
                    true
                }
                None => false,
            }
        };
        if moved {
            info!(tracker = %self.trackers[idx].addr, "tracker active");
        }
    }

    /// Send a faux `get_paths` to each inactive tracker. Any well
    /// formed reply, `ERR` included, proves the tracker is answering
    /// and reactivates it; the probe connection is kept.
    async fn probe_inactive(&self) {
        let inactive = self.snapshot_inactive();
        if inactive.is_empty() {
            return;
        }
        let mut params = Params::new();
        params.add("domain", "ping_domain");
        params.add("key", "ping_key");
        params.add("noverify", "1");
        for idx in random_walk(&inactive) {
            let addr = &self.trackers[idx].addr;
            let mut conn = match TrackerConn::connect(addr, self.config.timeout).await {
                Ok(conn) => conn,
                Err(err) => {
                    debug!(tracker = %addr, error = %err, "probe dial failed");
                    continue;
                }
            };
            match conn
                .request(command::GET_PATHS, &params, self.config.timeout)
                .await
            {
                Ok(_) => {
                    info!(tracker = %addr, "tracker answered probe");
                    self.activate(idx);
                    self.checkin(idx, conn);
                }
                Err(err) => {
                    debug!(
                        tracker = %addr,
                        error = %err,
                        "probe failed after connect, tracker stays inactive"
                    );
                }
            }
        }
    }

    /// Drop idle connections that have gone unused past the expiry
    /// window. Oldest sit at the front of each stack.
    fn expire_idle(&self) {
        let Some(cutoff) = Instant::now().checked_sub(self.config.connection_expire) else {
            return;
        };
        for idx in self.snapshot_active() {
            let mut idle = self.trackers[idx]
                .idle
                .lock()
                .expect("idle stack poisoned");
            let stale = idle
                .iter()
                .position(|conn| conn.last_used() >= cutoff)
                .unwrap_or(idle.len());
            if stale > 0 {
                idle.drain(..stale);
                debug!(
                    tracker = %self.trackers[idx].addr,
                    dropped = stale,
                    "expired idle connections"
                );
            }
        }
    }
}

/// Visit each index once, starting at a random position.
fn random_walk(indices: &[usize]) -> impl Iterator<Item = usize> + '_ {
    let len = indices.len();
    let start = if len == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..len)
    };
    (0..len).map(move |i| indices[(start + i) % len])
}
