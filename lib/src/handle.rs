// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for connected exchange devices
//!
//! This provides methods for interacting with the device
//! and is generic over [Exchange] transports

use std::{sync::Arc, time::Duration};

use encdec::{DecodeOwned, Encode};
use log::debug;
use tokio::sync::Mutex;

use exchange_pki_apdu::{
    command::build_command,
    partner::{
        AddressCheck, ChallengeResp, CheckPartnerReq, CheckPayoutAddressReq,
        CheckRefundAddressReq, GetChallengeReq, GetVersionReq, SetPartnerKeyReq,
        StartNewTransactionReq, TrustedNameReq, VersionResp,
    },
    ApduError, ApduStatic, Rate, SubCommand,
};

use crate::{
    authority::SigningAuthority,
    transport::{Exchange, Rapdu},
    Error,
};

/// Default timeout for APDU requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchange handle for a connected device.
///
/// This is generic over [Exchange] types to support different
/// underlying transports. Requests are serialised, one command is sent
/// and its response read before the next is issued.
pub struct ExchangeHandle<T: Exchange> {
    /// Transport for communication
    t: Arc<Mutex<T>>,
    /// Exchange rate (`P1`)
    rate: Rate,
    /// Exchange flow (`P2`)
    subcommand: SubCommand,
    /// Timeout for APDU requests
    request_timeout: Duration,
}

/// Create an [ExchangeHandle] wrapper from a type implementing [Exchange]
impl<T: Exchange> From<T> for ExchangeHandle<T> {
    fn from(t: T) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
            rate: Rate::default(),
            subcommand: SubCommand::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl<T: Exchange> Clone for ExchangeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            t: self.t.clone(),
            rate: self.rate,
            subcommand: self.subcommand,
            request_timeout: self.request_timeout,
        }
    }
}

impl<T: Exchange + Send> ExchangeHandle<T> {
    /// Set the rate and flow used for subsequent requests
    pub fn with_flow(mut self, rate: Rate, subcommand: SubCommand) -> Self {
        self.rate = rate;
        self.subcommand = subcommand;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn subcommand(&self) -> SubCommand {
        self.subcommand
    }

    /// Send a pre-encoded command APDU, returning the raw response
    pub async fn exchange_raw(&self, command: &[u8]) -> Result<Rapdu, Error> {
        self.t
            .lock()
            .await
            .exchange(command, self.request_timeout)
            .await
    }

    /// Issue a request with the configured rate and flow, returning response data
    async fn request<R>(&self, req: &R) -> Result<Vec<u8>, Error>
    where
        R: ApduStatic + Encode<Error = ApduError>,
    {
        let c = build_command(req, self.rate as u8, self.subcommand as u8)?;

        let r = self.exchange_raw(&c).await?;
        if !r.is_success() {
            debug!(
                "Request {:#04x} failed with status {:#06x} ({:?})",
                R::INS,
                r.status,
                r.status_word()
            );
        }

        r.into_result()
    }

    /// Issue a request and decode the response object
    async fn request_decode<R, A>(&self, req: &R) -> Result<A, Error>
    where
        R: ApduStatic + Encode<Error = ApduError>,
        A: DecodeOwned<Output = A, Error = ApduError>,
    {
        let d = self.request(req).await?;

        let (a, _n) = A::decode_owned(&d).map_err(|_| Error::UnexpectedResponse)?;

        Ok(a)
    }

    /// Fetch the application version
    pub async fn get_version(&self) -> Result<VersionResp, Error> {
        debug!("Requesting app version");

        self.request_decode(&GetVersionReq).await
    }

    /// Start a new exchange transaction, returning the device transaction id
    pub async fn init_transaction(&self) -> Result<Vec<u8>, Error> {
        debug!(
            "Starting transaction (rate: {}, subcommand: {})",
            self.rate, self.subcommand
        );

        self.request(&StartNewTransactionReq).await
    }

    /// Send encoded partner credentials
    pub async fn set_partner_key(&self, credentials: &[u8]) -> Result<(), Error> {
        debug!("Setting partner key: {}", hex::encode(credentials));

        self.request(&SetPartnerKeyReq::new(credentials))
            .await
            .map(|_| ())
    }

    /// Send the root signature over the partner credentials
    pub async fn check_partner_key(&self, signature: &[u8]) -> Result<(), Error> {
        debug!("Checking partner key");

        self.request(&CheckPartnerReq::new(signature))
            .await
            .map(|_| ())
    }

    /// Check the payout address using a signed currency configuration
    pub async fn check_payout_address(&self, check: AddressCheck<'_>) -> Result<(), Error> {
        debug!("Checking payout address");

        self.request(&CheckPayoutAddressReq(check))
            .await
            .map(|_| ())
    }

    /// Check the refund address using a signed currency configuration
    pub async fn check_refund_address(&self, check: AddressCheck<'_>) -> Result<(), Error> {
        debug!("Checking refund address");

        self.request(&CheckRefundAddressReq(check))
            .await
            .map(|_| ())
    }

    /// Fetch a fresh challenge for trusted name descriptors
    pub async fn get_challenge(&self) -> Result<u32, Error> {
        let r: ChallengeResp = self.request_decode(&GetChallengeReq).await?;

        debug!("Received challenge: {:#010x}", r.challenge);

        Ok(r.challenge)
    }

    /// Send a signed trusted name descriptor
    pub async fn send_trusted_name_descriptor(&self, descriptor: &[u8]) -> Result<(), Error> {
        debug!("Sending trusted name descriptor: {}", hex::encode(descriptor));

        self.request(&TrustedNameReq::new(descriptor))
            .await
            .map(|_| ())
    }

    /// Register a partner with the device, sending the partner credentials
    /// for the current flow followed by the root signature over them
    pub async fn register_partner(
        &self,
        partner: &SigningAuthority,
        root: &SigningAuthority,
    ) -> Result<(), Error> {
        let credentials = partner.credentials_for(self.subcommand);

        debug!(
            "Registering partner '{}' ({}) for {}",
            partner.name(),
            partner.curve(),
            self.subcommand
        );

        self.set_partner_key(credentials).await?;

        let signature = root.sign(credentials);
        self.check_partner_key(&signature).await
    }
}
