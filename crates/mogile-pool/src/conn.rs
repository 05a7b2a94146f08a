//! A single buffered tracker connection.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use mogile_proto::{build_request, parse_terminated, Params, Response};
use mogile_types::TrackerAddr;

use crate::error::{PoolError, PoolResult};

/// One TCP connection to a tracker.
///
/// Reads go through a `BufReader` because a reply can arrive split
/// across several segments; `read_line` keeps pulling until the
/// trailing newline shows up.
#[derive(Debug)]
pub struct TrackerConn {
    addr: TrackerAddr,
    stream: BufReader<TcpStream>,
    last_used: Instant,
}

impl TrackerConn {
    /// Dial a tracker, bounded by `connect_timeout`.
    pub async fn connect(addr: &TrackerAddr, connect_timeout: Duration) -> PoolResult<Self> {
        let stream = timeout(connect_timeout, TcpStream::connect((addr.host(), addr.port())))
            .await
            .map_err(|_| PoolError::Timeout(connect_timeout))?
            .map_err(|source| PoolError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        Ok(Self {
            addr: addr.clone(),
            stream: BufReader::new(stream),
            last_used: Instant::now(),
        })
    }

    pub fn addr(&self) -> &TrackerAddr {
        &self.addr
    }

    /// Send one command and parse the single-line reply.
    ///
    /// An `ERR` reply is a completed exchange, not a transport failure;
    /// the connection stays usable either way.
    pub async fn request(
        &mut self,
        cmd: &str,
        params: &Params,
        limit: Duration,
    ) -> PoolResult<Response> {
        let line = build_request(cmd, params);
        self.send_raw(&line, limit).await?;
        let reply = self.read_line(limit).await?;
        Ok(parse_terminated(&reply)?)
    }

    /// Write an already terminated line.
    pub async fn send_raw(&mut self, line: &str, limit: Duration) -> PoolResult<()> {
        timeout(limit, async {
            let stream = self.stream.get_mut();
            stream.write_all(line.as_bytes()).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| PoolError::Timeout(limit))??;
        Ok(())
    }

    /// Read one line, terminator included, within `limit`.
    pub async fn read_line(&mut self, limit: Duration) -> PoolResult<String> {
        timeout(limit, self.wait_line())
            .await
            .map_err(|_| PoolError::Timeout(limit))?
    }

    /// Read one line with no deadline. The event stream uses this;
    /// silence there is normal.
    pub async fn wait_line(&mut self) -> PoolResult<String> {
        let mut line = String::new();
        let read = self.stream.read_line(&mut line).await?;
        if read == 0 {
            return Err(PoolError::Closed);
        }
        Ok(line)
    }

    /// Stamp the connection as just used.
    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// When the connection last completed an exchange.
    pub fn last_used(&self) -> Instant {
        self.last_used
    }
}
