//! HTTP transfers to and from storage nodes.
//!
//! Trackers hand out plain HTTP URLs; this module moves the bytes.
//! Uploads are buffered bodies. Downloads stream chunk by chunk and
//! spill to a temporary file once they outgrow the configured buffer.

use std::io::{Read, Seek, Write};
use std::time::Duration;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ClientError, ClientResult};

/// Idle HTTP connections per storage node kept for reuse.
const POOL_IDLE_PER_HOST: usize = 3;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetched content, in memory or spilled to disk.
#[derive(Debug)]
pub enum Download {
    /// The body fit within the configured buffer size.
    Bytes(Vec<u8>),
    /// The body outgrew the buffer and was streamed to a temporary
    /// file, already rewound to the start. The file is removed when
    /// the value is dropped.
    Spilled { file: NamedTempFile, size: u64 },
}

impl Download {
    pub fn size(&self) -> u64 {
        match self {
            Download::Bytes(bytes) => bytes.len() as u64,
            Download::Spilled { size, .. } => *size,
        }
    }

    /// Read the whole download into memory regardless of where it
    /// landed.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            Download::Bytes(bytes) => Ok(bytes),
            Download::Spilled { mut file, size } => {
                let mut out = Vec::with_capacity(size as usize);
                file.as_file_mut().read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }
}

/// Shared HTTP client for every storage node.
///
/// reqwest pools connections per host, so one client covers the whole
/// fleet. Only the connect phase carries a deadline; transfer time is
/// unbounded because body sizes are.
#[derive(Debug)]
pub(crate) struct NodeClient {
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_IDLE_PER_HOST)
            .build()?;
        Ok(Self { http })
    }

    /// PUT `body` to a path handed out by the tracker.
    pub async fn put(&self, url: &str, body: Bytes) -> ClientResult<()> {
        let resp = self.http.put(url).body(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::NodeStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// GET a path fully into memory.
    pub async fn get_bytes(&self, url: &str) -> ClientResult<Vec<u8>> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::NodeStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// GET a path, streaming the body into `writer`. Returns the byte
    /// count written.
    pub async fn get_to_writer<W>(&self, url: &str, writer: &mut W) -> ClientResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::NodeStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    /// GET a path, buffering up to `max_buffer` bytes in memory and
    /// diverting the whole body to a temp file beyond that.
    pub async fn get_spilled(&self, url: &str, max_buffer: usize) -> ClientResult<Download> {
        let mut resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::NodeStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let mut buffer: Vec<u8> = Vec::new();
        let mut spill: Option<(NamedTempFile, u64)> = None;
        while let Some(chunk) = resp.chunk().await? {
            match spill.as_mut() {
                Some((file, size)) => {
                    file.write_all(&chunk)?;
                    *size += chunk.len() as u64;
                }
                None if buffer.len() + chunk.len() > max_buffer => {
                    let mut file = NamedTempFile::new()?;
                    file.write_all(&buffer)?;
                    file.write_all(&chunk)?;
                    let size = (buffer.len() + chunk.len()) as u64;
                    buffer = Vec::new();
                    spill = Some((file, size));
                }
                None => buffer.extend_from_slice(&chunk),
            }
        }
        match spill {
            Some((mut file, size)) => {
                file.as_file_mut().rewind()?;
                Ok(Download::Spilled { file, size })
            }
            None => Ok(Download::Bytes(buffer)),
        }
    }
}
