// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Length-prefixed APDU transport, as exposed by the speculos emulator
//!
//! Requests are framed as `LEN (u32 BE) ‖ APDU`, responses as
//! `N (u32 BE) ‖ DATA (N bytes) ‖ SW (2 bytes)`.
//!

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

use exchange_pki_apdu::{status::StatusWord, ApduError};

use crate::Error;

/// Default APDU port exposed by speculos
pub const DEFAULT_APDU_PORT: u16 = 9999;

/// Length of the frame length header
pub const FRAME_HEADER_LEN: usize = 4;

/// Upper bound on response data, larger frames are rejected before allocation
pub const MAX_RESPONSE_LEN: usize = 64 * 1024;

/// Response APDU
#[derive(Clone, PartialEq, Debug)]
pub struct Rapdu {
    pub data: Vec<u8>,
    pub status: u16,
}

impl Rapdu {
    /// Resolve the status word if known
    pub fn status_word(&self) -> Option<StatusWord> {
        StatusWord::from_raw(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusWord::Success as u16
    }

    /// Return response data, or [Error::Status] for non-success responses
    pub fn into_result(self) -> Result<Vec<u8>, Error> {
        match self.is_success() {
            true => Ok(self.data),
            false => Err(Error::Status(self.status)),
        }
    }
}

/// Frame a request payload with its big-endian length
pub fn encode_request(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let n = u32::try_from(payload.len()).map_err(|_| ApduError::ElementTooLong(payload.len()))?;

    let mut b = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    b.extend_from_slice(&n.to_be_bytes());
    b.extend_from_slice(payload);

    Ok(b)
}

/// Read exactly `n` bytes, accumulating partial reads
///
/// A zero length read before `n` bytes are received means the peer closed
/// the connection, returning [Error::ConnectionClosed].
pub async fn read_exact_or_closed<R: AsyncRead + Unpin>(
    r: &mut R,
    n: usize,
) -> Result<Vec<u8>, Error> {
    let mut buff = vec![0u8; n];
    let mut received = 0;

    while received < n {
        let read = r.read(&mut buff[received..]).await?;
        if read == 0 {
            return Err(Error::ConnectionClosed {
                expected: n,
                received,
            });
        }
        received += read;
    }

    Ok(buff)
}

/// Read a framed response
pub async fn read_response<R: AsyncRead + Unpin>(r: &mut R) -> Result<Rapdu, Error> {
    let h = read_exact_or_closed(r, FRAME_HEADER_LEN).await?;
    let n = u32::from_be_bytes([h[0], h[1], h[2], h[3]]) as usize;

    if n > MAX_RESPONSE_LEN {
        return Err(Error::UnexpectedResponse);
    }

    let mut data = read_exact_or_closed(r, n + 2).await?;
    let status = u16::from_be_bytes([data[n], data[n + 1]]);
    data.truncate(n);

    Ok(Rapdu { data, status })
}

/// Exchange trait for APDU transports
#[async_trait]
pub trait Exchange {
    /// Send a command APDU and await the response, bounded by `timeout`
    async fn exchange(&mut self, command: &[u8], timeout: Duration) -> Result<Rapdu, Error>;
}

/// Framed transport over any async stream
///
/// A failed or timed out exchange leaves the stream out of step with the
/// device, so the stream is shut down and later exchanges return
/// [Error::TransportFailed].
pub struct StreamTransport<S> {
    s: S,
    failed: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> StreamTransport<S> {
    pub fn new(s: S) -> Self {
        Self { s, failed: false }
    }

    /// Check whether the transport has been closed after a failed exchange
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Send one framed request and read its response
    async fn send_recv(&mut self, req: &[u8]) -> Result<Rapdu, Error> {
        self.s.write_all(req).await?;
        self.s.flush().await?;

        read_response(&mut self.s).await
    }

    /// Close the stream so late responses are never read as replies
    async fn fail(&mut self, e: Error) -> Error {
        warn!("Exchange failed ({}), closing transport", e);

        self.failed = true;
        let _ = self.s.shutdown().await;

        e
    }
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Exchange for StreamTransport<S> {
    async fn exchange(&mut self, command: &[u8], timeout: Duration) -> Result<Rapdu, Error> {
        if self.failed {
            return Err(Error::TransportFailed);
        }

        let req = encode_request(command)?;

        debug!("TX: {}", hex::encode(command));

        let r = match tokio::time::timeout(timeout, self.send_recv(&req)).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => return Err(self.fail(e).await),
            Err(e) => return Err(self.fail(e.into()).await),
        };

        debug!("RX: {} ({:#06x})", hex::encode(&r.data), r.status);

        Ok(r)
    }
}

/// Options for connecting to a TCP device
#[derive(Clone, PartialEq, Debug)]
pub struct TcpOptions {
    pub addr: IpAddr,
    pub port: u16,
    /// Timeout for connection and per-exchange deadlines
    pub timeout: Duration,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_APDU_PORT,
            timeout: Duration::from_secs(5),
        }
    }
}

impl TcpOptions {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// TCP device transport
pub type TcpTransport = StreamTransport<TcpStream>;

impl TcpTransport {
    /// Connect to a TCP device (speculos or the mock device)
    pub async fn connect(opts: &TcpOptions) -> Result<Self, Error> {
        debug!("Connecting to {}", opts.socket_addr());

        let s = tokio::time::timeout(opts.timeout, TcpStream::connect(opts.socket_addr())).await??;
        s.set_nodelay(true)?;

        Ok(Self::new(s))
    }
}
