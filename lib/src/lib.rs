// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Exchange partner credential library (and CLI)
//!
//! Builds and signs partner credentials, currency configurations and trusted
//! name descriptors, and delivers them to exchange devices over the speculos
//! APDU transport.

/// Re-export `exchange-pki-apdu` for consumers
pub use exchange_pki_apdu::{self as apdu};

pub mod authority;
pub use authority::{PublicKey, SigningAuthority};

pub mod root;
pub use root::{TrustedRoot, LEDGER_TEST_PRIVATE_KEY_HEX, LEDGER_TEST_PUBLIC_KEY};

pub mod currency;
pub use currency::CurrencyConfiguration;

pub mod transport;
pub use transport::{Exchange, Rapdu, TcpOptions, TcpTransport};

mod handle;
pub use handle::{ExchangeHandle, DEFAULT_REQUEST_TIMEOUT};

mod error;
pub use error::Error;

/// Connect to a TCP device with the provided options
pub async fn connect_tcp(opts: &TcpOptions) -> Result<ExchangeHandle<TcpTransport>, Error> {
    let t = TcpTransport::connect(opts).await?;

    Ok(ExchangeHandle::from(t).with_timeout(opts.timeout))
}
