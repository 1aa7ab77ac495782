// Copyright (c) 2022-2023 The MobileCoin Foundation

use exchange_pki_apdu::{status::StatusWord, ApduError};
use tokio::time::error::Elapsed;

/// Exchange PKI API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// APDU encode / decode error
    #[error("APDU error: {0}")]
    Apdu(#[from] ApduError),

    /// Transport IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection closed mid-frame
    #[error("Connection closed (expected {expected} bytes, received {received})")]
    ConnectionClosed { expected: usize, received: usize },

    /// Request timeout
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// Transport closed following a failed or timed out exchange
    #[error("Transport failed, reconnect to continue")]
    TransportFailed,

    /// Invalid private or public key material
    #[error("Invalid key object")]
    InvalidKey,

    /// Malformed (non-DER) signature
    #[error("Invalid signature encoding")]
    InvalidSignature,

    /// Signature did not verify against the expected key
    #[error("Signature verification failed")]
    SignVerificationFail,

    /// Device returned a non-success status word
    #[error("Device returned status {0:#06x}")]
    Status(u16),

    /// Unexpected APDU response
    #[error("Unexpected APDU response")]
    UnexpectedResponse,

    /// Hex decoding error
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl Error {
    /// Resolve the device status word for [Error::Status] responses
    pub fn status_word(&self) -> Option<StatusWord> {
        match self {
            Error::Status(s) => StatusWord::from_raw(*s),
            _ => None,
        }
    }
}

impl From<StatusWord> for Error {
    fn from(s: StatusWord) -> Self {
        Error::Status(s as u16)
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::RequestTimeout
    }
}
