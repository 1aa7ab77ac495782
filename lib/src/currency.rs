// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signed currency configurations for payout / refund address checks

use exchange_pki_apdu::{
    currency::{encode_currency_config, encode_sub_config},
    partner::AddressCheck,
};

use crate::{authority::SigningAuthority, root::sign_currency_conf, Error};

/// Currency configuration bundle, a CAL style configuration and derivation path
#[derive(Clone, PartialEq, Debug)]
pub struct CurrencyConfiguration {
    /// Main ticker
    pub ticker: String,
    /// Encoded currency configuration
    pub conf: Vec<u8>,
    /// Packed derivation path (`count ‖ (u32 BE)*count`)
    pub packed_path: Vec<u8>,
}

impl CurrencyConfiguration {
    /// Build a bundle from configuration parts
    pub fn new(
        ticker: &str,
        application: &str,
        sub_config: &[u8],
        packed_path: &[u8],
    ) -> Result<Self, Error> {
        let conf = encode_currency_config(ticker, application, sub_config)?;

        Ok(Self {
            ticker: ticker.to_string(),
            conf,
            packed_path: packed_path.to_vec(),
        })
    }

    /// Build an Ethereum-style bundle, where the sub-configuration carries a chain id
    pub fn evm(
        ticker: &str,
        application: &str,
        decimals: u8,
        chain_id: u64,
        packed_path: &[u8],
    ) -> Result<Self, Error> {
        let sub = encode_sub_config(ticker, decimals, Some(chain_id))?;
        Self::new(ticker, application, &sub, packed_path)
    }

    /// Sign the configuration, defaulting to the test root where no signer is provided
    pub fn sign(&self, signer: Option<&SigningAuthority>) -> Result<Vec<u8>, Error> {
        sign_currency_conf(&self.conf, signer)
    }

    /// Encode the signed configuration payload as sent with address checks
    ///
    /// `len(conf) ‖ conf ‖ signature(conf) ‖ len(path) ‖ path`
    pub fn get_conf_for_ticker(&self, signer: Option<&SigningAuthority>) -> Result<Vec<u8>, Error> {
        let signature = self.sign(signer)?;
        let check = AddressCheck::new(&self.conf, &signature, &self.packed_path);

        Ok(exchange_pki_apdu::encode_vec(&check)?)
    }
}
