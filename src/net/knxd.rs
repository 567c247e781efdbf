//! knxd transport.
//!
//! Implements the bus transport traits against a running knxd (or eibd)
//! daemon. Each [`KnxdConnection`] is its own socket, mirroring how the
//! daemon scopes associations to client connections:
//!
//! - a listener opens `EIB_OPEN_T_GROUP` for its address and then only
//!   receives `EIB_APDU_PACKET`s
//! - a writer lazily opens a write-only `EIB_OPEN_GROUPCON` on its first
//!   write and sends `EIB_GROUP_PACKET`s to any destination
//!
//! Connection URLs follow the knxd client convention: `ip:<host>[:<port>]`
//! or `local:<socket path>`.

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::net::transport::{BusConnection, BusConnector};
use crate::protocol::knxd::{self, Message, MessageType, KNXD_DEFAULT_PORT};
use core::fmt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `ip:<host>[:<port>]`
    Tcp {
        /// Host name or address
        host: String,
        /// TCP port
        port: u16,
    },
    /// `local:<path>`
    Unix(PathBuf),
}

impl core::str::FromStr for Endpoint {
    type Err = KnxError;

    fn from_str(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("ip:") {
            let (host, port) = match rest.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse::<u16>().map_err(|_| {
                        KnxError::unsupported_endpoint(format!("invalid port in {url:?}"))
                    })?;
                    (host, port)
                }
                None => (rest, KNXD_DEFAULT_PORT),
            };
            if host.is_empty() {
                return Err(KnxError::unsupported_endpoint(format!("missing host in {url:?}")));
            }
            return Ok(Self::Tcp {
                host: host.to_owned(),
                port,
            });
        }
        if let Some(path) = url.strip_prefix("local:") {
            if path.is_empty() {
                return Err(KnxError::unsupported_endpoint(format!("missing path in {url:?}")));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        Err(KnxError::unsupported_endpoint(format!(
            "{url:?} (expected ip:<host>[:<port>] or local:<path>)"
        )))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "ip:{host}:{port}"),
            Self::Unix(path) => write!(f, "local:{}", path.display()),
        }
    }
}

trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

#[cfg(unix)]
async fn connect_unix(path: &Path) -> Result<Box<dyn Stream>> {
    let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
        log::debug!("knxd connect to {}: {e}", path.display());
        KnxError::connect_failed()
    })?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn connect_unix(path: &Path) -> Result<Box<dyn Stream>> {
    Err(KnxError::unsupported_endpoint(format!(
        "local socket {} on a non-unix target",
        path.display()
    )))
}

/// Connector for a knxd daemon.
#[derive(Debug)]
pub struct KnxdConnector {
    endpoint: Endpoint,
    closed: CancellationToken,
}

impl KnxdConnector {
    /// Create a connector from a knxd connection URL.
    ///
    /// No connection is attempted until [`BusConnector::connect`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unsupported URLs.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            endpoint: url.parse()?,
            closed: CancellationToken::new(),
        })
    }

    /// Parsed endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl BusConnector for KnxdConnector {
    type Connection = KnxdConnection;

    async fn connect(&self) -> Result<KnxdConnection> {
        if self.closed.is_cancelled() {
            return Err(KnxError::transport_closed());
        }
        let stream: Box<dyn Stream> = match &self.endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).await.map_err(|e| {
                    log::debug!("knxd connect to {}: {e}", self.endpoint);
                    KnxError::connect_failed()
                })?;
                Box::new(stream)
            }
            Endpoint::Unix(path) => connect_unix(path).await?,
        };
        log::trace!("connected to knxd at {}", self.endpoint);
        Ok(KnxdConnection {
            stream,
            mode: Mode::Idle,
            closed: self.closed.child_token(),
            scratch: Vec::new(),
        })
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Listening(GroupAddress),
    Writing,
}

/// One socket to knxd.
pub struct KnxdConnection {
    stream: Box<dyn Stream>,
    mode: Mode,
    closed: CancellationToken,
    /// Payload of the last received message
    scratch: Vec<u8>,
}

impl fmt::Debug for KnxdConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnxdConnection")
            .field("mode", &self.mode)
            .field("closed", &self.closed.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl KnxdConnection {
    async fn send(&mut self, request: &[u8]) -> Result<()> {
        self.stream.write_all(request).await.map_err(|e| {
            log::debug!("knxd write: {e}");
            KnxError::write_failed()
        })
    }

    /// Read one message into `scratch`.
    async fn receive(&mut self) -> Result<()> {
        let mut prefix = [0u8; knxd::LENGTH_PREFIX_SIZE];
        self.stream.read_exact(&mut prefix).await.map_err(|e| {
            log::debug!("knxd read: {e}");
            KnxError::read_failed()
        })?;
        self.scratch.resize(usize::from(u16::from_be_bytes(prefix)), 0);
        self.stream.read_exact(&mut self.scratch).await.map_err(|e| {
            log::debug!("knxd read: {e}");
            KnxError::read_failed()
        })?;
        Ok(())
    }

    async fn open(&mut self, request: &[u8], kind: MessageType) -> Result<()> {
        self.send(request).await?;
        self.receive().await?;
        if Message::parse(&self.scratch)?.is_ack_for(kind) {
            Ok(())
        } else {
            Err(KnxError::open_failed())
        }
    }
}

impl BusConnection for KnxdConnection {
    async fn open_group_listener(&mut self, address: GroupAddress) -> Result<()> {
        if self.mode != Mode::Idle {
            return Err(KnxError::invalid_state());
        }
        self.open(&knxd::open_t_group(address), MessageType::OpenTGroup)
            .await?;
        self.mode = Mode::Listening(address);
        Ok(())
    }

    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<(usize, IndividualAddress)> {
        if !matches!(self.mode, Mode::Listening(_)) {
            return Err(KnxError::invalid_state());
        }
        let closed = self.closed.clone();
        loop {
            tokio::select! {
                received = self.receive() => received?,
                _ = closed.cancelled() => return Err(KnxError::transport_closed()),
            }
            let message = Message::parse(&self.scratch)?;
            match message.as_apdu() {
                Ok((source, apdu)) => {
                    let len = apdu.len().min(buf.len());
                    buf[..len].copy_from_slice(&apdu[..len]);
                    return Ok((len, source));
                }
                Err(_) => log::trace!("ignoring knxd message {:#06x}", message.code),
            }
        }
    }

    async fn write_frame(&mut self, destination: GroupAddress, apdu: &[u8]) -> Result<()> {
        match self.mode {
            Mode::Idle => {
                self.open(&knxd::open_group_socket(), MessageType::OpenGroupCon)
                    .await?;
                self.mode = Mode::Writing;
                self.send(&knxd::group_packet(destination, apdu)).await
            }
            Mode::Writing => self.send(&knxd::group_packet(destination, apdu)).await,
            Mode::Listening(_) => Err(KnxError::invalid_state()),
        }
    }
}
