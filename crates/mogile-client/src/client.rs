//! High-level storage client.
//!
//! A [`StorageClient`] binds one domain to a set of trackers and turns
//! store/fetch/delete calls into tracker exchanges plus HTTP transfers
//! against the storage nodes the trackers point at. The client owns no
//! content state; every operation is a fresh conversation with the
//! backend.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use mogile_pool::{PoolConfig, PoolError, TrackerPool};
use mogile_proto::{command, Params, Response};
use mogile_types::{defaults, Domain, Key, StorageClass, TrackerAddr};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::node::{Download, NodeClient};
use crate::watch::Watch;

/// Upload destination reserved by a `create_open` exchange.
struct Destination {
    path: String,
    fid: String,
    devid: String,
}

/// Client for one domain across a set of tracker hosts.
///
/// Store operations reserve a destination with the tracker, `PUT` the
/// content to a storage node over HTTP, and commit the upload back to
/// the tracker. Fetch operations resolve candidate URLs and try them in
/// order. All operations are async and safe to issue concurrently.
#[derive(Debug)]
pub struct StorageClient {
    domain: Domain,
    config: ClientConfig,
    pool: TrackerPool,
    node: NodeClient,
}

impl StorageClient {
    /// Build a client from `config`, validating it first.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let domain = Domain::new(config.domain.as_str())?;
        let mut addrs = Vec::with_capacity(config.hosts.len());
        for host in &config.hosts {
            addrs.push(host.parse::<TrackerAddr>()?);
        }
        let pool_config = PoolConfig {
            timeout: config.tracker_timeout,
            maintenance: config.maintenance,
            ..PoolConfig::default()
        };
        let pool = TrackerPool::new(addrs, pool_config);
        let node = NodeClient::new(config.node_timeout)?;
        debug!(domain = %domain, trackers = pool.tracker_count(), "storage client ready");
        Ok(Self {
            domain,
            config,
            pool,
            node,
        })
    }

    /// The domain every key of this client lives in.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- Store operations ----

    /// Store `data` under `key`, overwriting any prior content.
    pub async fn store_content(
        &self,
        key: &Key,
        class: &StorageClass,
        data: impl Into<Bytes>,
    ) -> ClientResult<()> {
        self.store_payload(key, class, data.into(), None).await
    }

    /// Store `data` and stamp the commit with a modification time.
    pub async fn store_content_with_mtime(
        &self,
        key: &Key,
        class: &StorageClass,
        data: impl Into<Bytes>,
        mtime: DateTime<Utc>,
    ) -> ClientResult<()> {
        self.store_payload(key, class, data.into(), Some(mtime)).await
    }

    /// Store a local file under `key`. Returns the byte count sent.
    pub async fn store_file(
        &self,
        key: &Key,
        class: &StorageClass,
        path: impl AsRef<Path>,
    ) -> ClientResult<u64> {
        let data = fs::read(path).await?;
        let size = data.len() as u64;
        self.store_payload(key, class, Bytes::from(data), None).await?;
        Ok(size)
    }

    /// Store a local file and stamp the commit with a modification time.
    pub async fn store_file_with_mtime(
        &self,
        key: &Key,
        class: &StorageClass,
        path: impl AsRef<Path>,
        mtime: DateTime<Utc>,
    ) -> ClientResult<u64> {
        let data = fs::read(path).await?;
        let size = data.len() as u64;
        self.store_payload(key, class, Bytes::from(data), Some(mtime))
            .await?;
        Ok(size)
    }

    /// Read `reader` to exhaustion, then store the collected bytes.
    ///
    /// A read failure surfaces as [`ClientError::Io`] without touching
    /// the network.
    pub async fn store_reader<R>(
        &self,
        key: &Key,
        class: &StorageClass,
        mut reader: R,
    ) -> ClientResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let size = data.len() as u64;
        self.store_payload(key, class, Bytes::from(data), None).await?;
        Ok(size)
    }

    /// The store loop: reserve, upload, commit, with retries.
    ///
    /// A failed upload or commit keeps the reserved destination for one
    /// more attempt; the attempt after that asks the tracker for a
    /// fresh one.
    async fn store_payload(
        &self,
        key: &Key,
        class: &StorageClass,
        body: Bytes,
        mtime: Option<DateTime<Utc>>,
    ) -> ClientResult<()> {
        let mut open_params = Params::new();
        open_params
            .add("domain", self.domain.as_str())
            .add("class", class.as_str())
            .add("key", key.as_str());

        let size = body.len();
        let mut call_tracker = true;
        let mut dest: Option<Destination> = None;
        let mut last_err: Option<ClientError> = None;
        let mut attempt = 0;
        while attempt < self.config.max_retries {
            let outcome: ClientResult<()> = async {
                if call_tracker {
                    dest = Some(self.create_open(&open_params).await?);
                    call_tracker = false;
                } else {
                    call_tracker = true;
                }
                let Some(target) = dest.as_ref() else {
                    return Err(ClientError::BadResponse(
                        "no upload destination reserved".into(),
                    ));
                };
                self.node.put(&target.path, body.clone()).await?;
                self.create_close(key, target, size, mtime).await
            }
            .await;
            match outcome {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(key = %key, attempt, error = %err, "store attempt failed");
                    last_err = Some(err);
                }
            }
            attempt += 1;
            if attempt < self.config.max_retries {
                tokio::time::sleep(self.config.retry_wait).await;
            }
        }
        Err(last_err
            .unwrap_or_else(|| ClientError::Config("max_retries must be at least 1".into())))
    }

    // ---- Fetch operations ----

    /// Fetch the content stored under `key` into memory.
    pub async fn get_file_data(&self, key: &Key) -> ClientResult<Vec<u8>> {
        let paths = self.get_paths(key, true).await?;
        let mut last_err = None;
        for (i, path) in paths.iter().enumerate() {
            match self.node.get_bytes(path).await {
                Ok(data) => {
                    if i != 0 {
                        info!(key = %key, path = %path, attempt = i + 1, "fetched after fallback");
                    }
                    return Ok(data);
                }
                Err(err) => {
                    warn!(key = %key, path = %path, error = %err, "fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(no_path_worked(last_err))
    }

    /// Fetch the content stored under `key` into a local file,
    /// creating parent directories as needed. Returns the byte count.
    pub async fn get_file(&self, key: &Key, dest: impl AsRef<Path>) -> ClientResult<u64> {
        let paths = self.get_paths(key, true).await?;
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut last_err = None;
        for (i, path) in paths.iter().enumerate() {
            // truncate per attempt so a partial body never survives
            let outcome: ClientResult<u64> = async {
                let mut file = fs::File::create(dest).await?;
                let written = self.node.get_to_writer(path, &mut file).await?;
                file.flush().await?;
                Ok(written)
            }
            .await;
            match outcome {
                Ok(written) => {
                    if i != 0 {
                        info!(key = %key, path = %path, attempt = i + 1, "fetched after fallback");
                    }
                    return Ok(written);
                }
                Err(err) => {
                    warn!(key = %key, path = %path, error = %err, "fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(no_path_worked(last_err))
    }

    /// Fetch into memory when the body fits `max_buffer_size`, spilling
    /// larger bodies to a temporary file.
    pub async fn get_file_or_data(&self, key: &Key) -> ClientResult<Download> {
        let paths = self.get_paths(key, true).await?;
        let mut last_err = None;
        for (i, path) in paths.iter().enumerate() {
            match self.node.get_spilled(path, self.config.max_buffer_size).await {
                Ok(download) => {
                    if i != 0 {
                        info!(key = %key, path = %path, attempt = i + 1, "fetched after fallback");
                    }
                    return Ok(download);
                }
                Err(err) => {
                    warn!(key = %key, path = %path, error = %err, "fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(no_path_worked(last_err))
    }

    /// Resolve the fetchable URLs for `key`, best candidate first.
    ///
    /// `noverify` skips the tracker's per-device liveness check; the
    /// fetch operations always pass it and recover by falling through
    /// to the next path instead.
    pub async fn get_paths(&self, key: &Key, noverify: bool) -> ClientResult<Vec<String>> {
        let mut params = Params::new();
        params
            .add("domain", self.domain.as_str())
            .add("noverify", if noverify { "1" } else { "0" })
            .add("key", key.as_str());
        let reply = self.pool.request(command::GET_PATHS, &params).await?;
        let fields = self.ok_fields_for(key, reply)?;
        let count: usize = fields
            .get("paths")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                ClientError::BadResponse("get_paths reply carries no usable path count".into())
            })?;
        if count == 0 || count >= defaults::MAX_PATHS {
            return Err(ClientError::BadResponse(format!(
                "get_paths reply claims {count} paths"
            )));
        }
        let mut paths = Vec::with_capacity(count);
        for i in 1..=count {
            let name = format!("path{i}");
            match fields.get(&name) {
                Some(path) => paths.push(path.to_string()),
                None => {
                    return Err(ClientError::BadResponse(format!(
                        "get_paths reply carries no {name}"
                    )))
                }
            }
        }
        Ok(paths)
    }

    // ---- Key management ----

    /// Remove `key` from the domain. Deleting a missing key is an
    /// error, not a no-op.
    pub async fn delete(&self, key: &Key) -> ClientResult<()> {
        let mut params = Params::new();
        params
            .add("domain", self.domain.as_str())
            .add("key", key.as_str());
        if let Some(id) = &self.config.client_id {
            params.add("client_id", id.as_str());
        }
        let reply = self.pool.request(command::DELETE, &params).await?;
        self.ok_fields_for(key, reply)?;
        Ok(())
    }

    /// Rename `from` to `to` within the domain.
    pub async fn rename(&self, from: &Key, to: &Key) -> ClientResult<()> {
        let mut params = Params::new();
        params
            .add("domain", self.domain.as_str())
            .add("from_key", from.as_str())
            .add("to_key", to.as_str());
        if let Some(id) = &self.config.client_id {
            params.add("client_id", id.as_str());
        }
        let reply = self.pool.request(command::RENAME, &params).await?;
        self.ok_fields_for(from, reply)?;
        Ok(())
    }

    // ---- Events and diagnostics ----

    /// Open a tracker event stream bound to one active tracker.
    pub fn watch(&self) -> ClientResult<Watch> {
        let tracker = self
            .pool
            .pick_active()
            .ok_or(ClientError::Transport(PoolError::NoTrackers))?;
        Ok(Watch::new(
            self.pool.clone(),
            tracker,
            self.config.client_id.clone(),
        ))
    }

    /// Ask a tracker to hold this request for `duration`. Exercises
    /// timeout handling against a live deployment.
    pub async fn sleep(&self, duration: Duration) -> ClientResult<()> {
        let mut params = Params::new();
        params.add("duration", duration.as_secs().to_string());
        let reply = self.pool.request(command::SLEEP, &params).await?;
        ok_fields(reply)?;
        Ok(())
    }

    // ---- Tracker exchanges ----

    async fn create_open(&self, params: &Params) -> ClientResult<Destination> {
        let reply = self.pool.request(command::CREATE_OPEN, params).await?;
        let fields = ok_fields(reply)?;
        Ok(Destination {
            path: open_field(&fields, "path")?,
            fid: open_field(&fields, "fid")?,
            devid: open_field(&fields, "devid")?,
        })
    }

    async fn create_close(
        &self,
        key: &Key,
        dest: &Destination,
        size: usize,
        mtime: Option<DateTime<Utc>>,
    ) -> ClientResult<()> {
        let mut params = Params::new();
        if let Some(mtime) = mtime {
            params.add("mtime", mtime.timestamp().to_string());
        }
        params
            .add("fid", dest.fid.as_str())
            .add("devid", dest.devid.as_str())
            .add("size", size.to_string())
            .add("domain", self.domain.as_str())
            .add("path", dest.path.as_str())
            .add("key", key.as_str());
        if let Some(id) = &self.config.client_id {
            params.add("client_id", id.as_str());
        }
        let reply = self.pool.request(command::CREATE_CLOSE, &params).await?;
        ok_fields(reply)?;
        Ok(())
    }

    /// Like [`ok_fields`], but maps the tracker's `unknown_key` code to
    /// [`ClientError::NotFound`] for `key`.
    fn ok_fields_for(&self, key: &Key, reply: Response) -> ClientResult<Params> {
        match reply {
            Response::Ok(fields) => Ok(fields),
            Response::Error { code, .. } if code == "unknown_key" => Err(ClientError::NotFound {
                domain: self.domain.to_string(),
                key: key.to_string(),
            }),
            Response::Error { code, message } => Err(ClientError::Tracker { code, message }),
        }
    }
}

/// Unwrap an `OK` reply or surface the tracker's error.
fn ok_fields(reply: Response) -> ClientResult<Params> {
    match reply {
        Response::Ok(fields) => Ok(fields),
        Response::Error { code, message } => Err(ClientError::Tracker { code, message }),
    }
}

fn open_field(fields: &Params, name: &str) -> ClientResult<String> {
    match fields.get(name) {
        Some(value) => Ok(value.to_string()),
        None => Err(ClientError::BadResponse(format!(
            "create_open reply carries no {name}"
        ))),
    }
}

/// get_paths guarantees at least one path, so the fallback is only for
/// completeness.
fn no_path_worked(last_err: Option<ClientError>) -> ClientError {
    last_err.unwrap_or_else(|| ClientError::BadResponse("get_paths returned no paths".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, VecDeque};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes as AxumBytes;
    use axum::extract::{Path as UrlPath, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Scripted tracker: pops one canned reply per request line, shared
    /// across connections, and records every request it sees.
    struct FakeTracker {
        port: u16,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeTracker {
        async fn start(replies: Vec<String>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let queue = Arc::new(Mutex::new(VecDeque::from(replies)));
            let log = Arc::clone(&requests);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        return;
                    };
                    let log = Arc::clone(&log);
                    let queue = Arc::clone(&queue);
                    tokio::spawn(async move {
                        let mut stream = BufReader::new(stream);
                        loop {
                            let mut line = String::new();
                            if stream.read_line(&mut line).await.unwrap_or(0) == 0 {
                                return;
                            }
                            log.lock().unwrap().push(line.trim_end().to_string());
                            let reply = queue.lock().unwrap().pop_front();
                            let Some(reply) = reply else { return };
                            let wire = format!("{reply}\r\n");
                            if stream.get_mut().write_all(wire.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                    });
                }
            });
            Self { port, requests }
        }

        fn host(&self) -> String {
            format!("127.0.0.1:{}", self.port)
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    type Blobs = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    async fn put_blob(
        State(blobs): State<Blobs>,
        UrlPath(path): UrlPath<String>,
        body: AxumBytes,
    ) -> StatusCode {
        blobs.lock().unwrap().insert(path, body.to_vec());
        StatusCode::CREATED
    }

    async fn get_blob(
        State(blobs): State<Blobs>,
        UrlPath(path): UrlPath<String>,
    ) -> axum::response::Response {
        match blobs.lock().unwrap().get(&path) {
            Some(bytes) => bytes.clone().into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn fake_node() -> (SocketAddr, Blobs) {
        let blobs: Blobs = Arc::default();
        let app = Router::new()
            .route("/*path", get(get_blob).put(put_blob))
            .with_state(Arc::clone(&blobs));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, blobs)
    }

    fn test_config(hosts: Vec<String>) -> ClientConfig {
        ClientConfig {
            retry_wait: Duration::ZERO,
            maintenance: false,
            ..ClientConfig::new("test", hosts)
        }
    }

    fn key(name: &str) -> Key {
        Key::new(name).unwrap()
    }

    #[tokio::test]
    async fn stores_and_fetches_content() {
        let (node_addr, blobs) = fake_node().await;
        let url = format!("http://{node_addr}/dev1/0/0000000123.fid");
        let tracker = FakeTracker::start(vec![
            format!("OK path={url}&fid=123&devid=1"),
            "OK ".to_string(),
            format!("OK paths=1&path1={url}"),
        ])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let key = key("/some_path2/some_file");
        let class = StorageClass::from("testclass");

        client
            .store_content(&key, &class, &b"A bunch of text to store"[..])
            .await
            .unwrap();
        assert_eq!(
            blobs.lock().unwrap().get("dev1/0/0000000123.fid"),
            Some(&b"A bunch of text to store".to_vec())
        );

        let fetched = client.get_file_data(&key).await.unwrap();
        assert_eq!(fetched, b"A bunch of text to store");

        let requests = tracker.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0],
            "create_open domain=test&class=testclass&key=%2fsome_path2%2fsome_file"
        );
        assert!(requests[1].starts_with("create_close fid=123&devid=1&size=24&domain=test&path="));
        assert!(requests[1].ends_with("&key=%2fsome_path2%2fsome_file"));
        assert_eq!(
            requests[2],
            "get_paths domain=test&noverify=1&key=%2fsome_path2%2fsome_file"
        );
    }

    #[tokio::test]
    async fn second_store_replaces_what_fetch_returns() {
        let (node_addr, _blobs) = fake_node().await;
        let first = format!("http://{node_addr}/dev1/0/0000000123.fid");
        let second = format!("http://{node_addr}/dev1/0/0000000124.fid");
        let tracker = FakeTracker::start(vec![
            format!("OK path={first}&fid=123&devid=1"),
            "OK ".to_string(),
            format!("OK path={second}&fid=124&devid=1"),
            "OK ".to_string(),
            format!("OK paths=1&path1={second}"),
        ])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let key = key("rewritten");
        let class = StorageClass::default();

        client
            .store_content(&key, &class, &b"old bytes"[..])
            .await
            .unwrap();
        client
            .store_content(&key, &class, &b"new bytes"[..])
            .await
            .unwrap();

        let fetched = client.get_file_data(&key).await.unwrap();
        assert_eq!(fetched, b"new bytes");
    }

    #[tokio::test]
    async fn tracker_error_on_open_is_retried() {
        let (node_addr, _blobs) = fake_node().await;
        let url = format!("http://{node_addr}/dev2/5.fid");
        let tracker = FakeTracker::start(vec![
            "ERR no_devices no+devices+available".to_string(),
            format!("OK path={url}&fid=5&devid=2"),
            "OK ".to_string(),
        ])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        client
            .store_content(&key("retry-me"), &StorageClass::default(), &b"x"[..])
            .await
            .unwrap();

        let commands: Vec<String> = tracker
            .requests()
            .iter()
            .map(|r| r.split(' ').next().unwrap_or("").to_string())
            .collect();
        assert_eq!(commands, ["create_open", "create_open", "create_close"]);
    }

    #[tokio::test]
    async fn failed_upload_reuses_the_reserved_destination() {
        // nothing listens on the node port, so every PUT fails
        let tracker = FakeTracker::start(vec![
            "OK path=http://127.0.0.1:1/dev1/9.fid&fid=9&devid=1".to_string(),
        ])
        .await;

        let mut config = test_config(vec![tracker.host()]);
        config.node_timeout = Duration::from_millis(500);
        let client = StorageClient::new(config).unwrap();
        let err = client
            .store_content(&key("doomed"), &StorageClass::default(), &b"x"[..])
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Http(_)), "got {err}");
        // the second attempt reused the destination instead of asking again
        assert_eq!(tracker.requests().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_open_reply_asks_again() {
        let reply = "OK path=http://127.0.0.1:1/dev1/9.fid&fid=9".to_string();
        let tracker = FakeTracker::start(vec![reply.clone(), reply]).await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let err = client
            .store_content(&key("half"), &StorageClass::default(), &b"x"[..])
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::BadResponse(_)), "got {err}");
        assert_eq!(tracker.requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_falls_back_across_paths() {
        let (node_addr, blobs) = fake_node().await;
        blobs
            .lock()
            .unwrap()
            .insert("dev2/good.fid".to_string(), b"healthy copy".to_vec());
        let good = format!("http://{node_addr}/dev2/good.fid");
        let tracker = FakeTracker::start(vec![format!(
            "OK paths=2&path1=http://127.0.0.1:1/dead.fid&path2={good}"
        )])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let fetched = client.get_file_data(&key("replicated")).await.unwrap();
        assert_eq!(fetched, b"healthy copy");
        assert_eq!(tracker.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_key_maps_to_not_found() {
        let tracker =
            FakeTracker::start(vec!["ERR unknown_key unknown_key".to_string()]).await;
        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();

        let err = client.get_file_data(&key("/nope")).await.unwrap_err();
        match err {
            ClientError::NotFound { domain, key } => {
                assert_eq!(domain, "test");
                assert_eq!(key, "/nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn delete_and_rename_send_client_id() {
        let tracker =
            FakeTracker::start(vec!["OK ".to_string(), "OK ".to_string()]).await;
        let mut config = test_config(vec![tracker.host()]);
        config.client_id = Some("tester".to_string());
        let client = StorageClient::new(config).unwrap();

        client.delete(&key("old")).await.unwrap();
        client.rename(&key("a"), &key("b")).await.unwrap();

        let requests = tracker.requests();
        assert_eq!(requests[0], "delete domain=test&key=old&client_id=tester");
        assert_eq!(
            requests[1],
            "rename domain=test&from_key=a&to_key=b&client_id=tester"
        );
    }

    #[tokio::test]
    async fn delete_of_missing_key_is_not_found() {
        let tracker =
            FakeTracker::start(vec!["ERR unknown_key unknown_key".to_string()]).await;
        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let err = client.delete(&key("ghost")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }), "got {err}");
    }

    #[tokio::test]
    async fn unusable_path_counts_are_rejected() {
        let tracker = FakeTracker::start(vec![
            "OK paths=0".to_string(),
            "OK paths=2&path1=http://a/1".to_string(),
        ])
        .await;
        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();

        let err = client.get_paths(&key("k"), true).await.unwrap_err();
        assert!(matches!(err, ClientError::BadResponse(_)), "got {err}");

        let err = client.get_paths(&key("k"), true).await.unwrap_err();
        assert!(matches!(err, ClientError::BadResponse(_)), "got {err}");
    }

    #[tokio::test]
    async fn get_file_writes_to_disk() {
        let (node_addr, blobs) = fake_node().await;
        blobs
            .lock()
            .unwrap()
            .insert("dev1/disk.fid".to_string(), b"on disk".to_vec());
        let url = format!("http://{node_addr}/dev1/disk.fid");
        let tracker = FakeTracker::start(vec![format!("OK paths=1&path1={url}")]).await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/deeper/file.bin");
        let written = client.get_file(&key("k"), &dest).await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(std::fs::read(&dest).unwrap(), b"on disk");
    }

    #[tokio::test]
    async fn oversized_fetch_spills_to_a_temp_file() {
        let (node_addr, blobs) = fake_node().await;
        let body: Vec<u8> = (0..4096u32).map(|i| (i % 13) as u8).collect();
        blobs
            .lock()
            .unwrap()
            .insert("dev1/big.fid".to_string(), body.clone());
        let url = format!("http://{node_addr}/dev1/big.fid");
        let tracker = FakeTracker::start(vec![format!("OK paths=1&path1={url}")]).await;

        let mut config = test_config(vec![tracker.host()]);
        config.max_buffer_size = 64;
        let client = StorageClient::new(config).unwrap();

        let download = client.get_file_or_data(&key("big")).await.unwrap();
        assert!(matches!(download, Download::Spilled { .. }));
        assert_eq!(download.into_bytes().unwrap(), body);
    }

    #[tokio::test]
    async fn store_reader_counts_bytes() {
        let (node_addr, _blobs) = fake_node().await;
        let url = format!("http://{node_addr}/dev3/r.fid");
        let tracker = FakeTracker::start(vec![
            format!("OK path={url}&fid=7&devid=3"),
            "OK ".to_string(),
        ])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let sent = client
            .store_reader(&key("streamed"), &StorageClass::default(), &b"from a reader"[..])
            .await
            .unwrap();
        assert_eq!(sent, 13);
    }

    #[tokio::test]
    async fn stamped_store_sends_mtime_first() {
        let (node_addr, _blobs) = fake_node().await;
        let url = format!("http://{node_addr}/dev1/t.fid");
        let tracker = FakeTracker::start(vec![
            format!("OK path={url}&fid=4&devid=1"),
            "OK ".to_string(),
        ])
        .await;

        let client = StorageClient::new(test_config(vec![tracker.host()])).unwrap();
        let mtime = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        client
            .store_content_with_mtime(&key("stamped"), &StorageClass::default(), &b"x"[..], mtime)
            .await
            .unwrap();

        let close = &tracker.requests()[1];
        assert!(
            close.starts_with("create_close mtime=1700000000&fid=4&devid=1&size=1"),
            "got {close}"
        );
    }

    #[tokio::test]
    async fn watch_skips_its_own_echoes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            stream
                .get_mut()
                .write_all(b"[cache][me] delete test /own\r\n[cache][peer] delete test /theirs\r\n")
                .await
                .unwrap();
            // keep the socket open while the events are consumed
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut config = test_config(vec![format!("127.0.0.1:{port}")]);
        config.client_id = Some("me".to_string());
        let client = StorageClient::new(config).unwrap();
        let mut watch = client.watch().unwrap();
        assert_eq!(watch.next_cache_event().await, "delete test /theirs");
    }

    #[test]
    fn construction_rejects_bad_configs() {
        let err = StorageClient::new(test_config(Vec::new())).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "got {err}");

        let err =
            StorageClient::new(test_config(vec!["not-an-address".to_string()])).unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)), "got {err}");

        let mut config = test_config(vec!["127.0.0.1:7001".to_string()]);
        config.domain = String::new();
        let err = StorageClient::new(config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "got {err}");
    }
}
