// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Currency configuration encodings
//!
//! A currency configuration describes the coin application used to check
//! payout and refund addresses for an exchange, and is signed by the
//! trusted root before being sent to the device.

use alloc::vec::Vec;

use encdec::{Decode, Encode};

use crate::{
    helpers::{lp, raw},
    ApduError,
};

/// Currency configuration
///
/// ## Encoding
///
/// Each field is prefixed by a single length byte, and so must not exceed 255 bytes.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  TICKER_LEN   |                 TICKER...                     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    APP_LEN    |               APPLICATION...                  /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    SUB_LEN    |                SUB_CONFIG...                  /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CurrencyConfig<'a> {
    /// Main ticker for the currency
    pub ticker: &'a str,
    /// Name of the coin application handling the currency
    pub application: &'a str,
    /// Application specific sub-configuration (may be empty)
    pub sub_config: &'a [u8],
}

impl<'a> CurrencyConfig<'a> {
    pub fn new(ticker: &'a str, application: &'a str, sub_config: &'a [u8]) -> Self {
        Self {
            ticker,
            application,
            sub_config,
        }
    }

    /// Parse a complete currency configuration, rejecting trailing data
    pub fn parse(buff: &'a [u8]) -> Result<Self, ApduError> {
        let (c, n) = Self::decode(buff)?;
        if n != buff.len() {
            return Err(ApduError::InvalidEncoding);
        }
        Ok(c)
    }

    /// Encode currency configuration to a new buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, ApduError> {
        crate::encode_vec(self)
    }
}

impl<'a> Encode for CurrencyConfig<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        let mut n = 0;

        n += lp::enc_len(self.ticker.as_bytes())?;
        n += lp::enc_len(self.application.as_bytes())?;
        n += lp::enc_len(self.sub_config)?;

        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut index = 0;

        index += lp::enc(self.ticker.as_bytes(), &mut buff[index..])?;
        index += lp::enc(self.application.as_bytes(), &mut buff[index..])?;
        index += lp::enc(self.sub_config, &mut buff[index..])?;

        Ok(index)
    }
}

impl<'a> Decode<'a> for CurrencyConfig<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (ticker, n) = lp::dec_str(&buff[index..])?;
        index += n;

        let (application, n) = lp::dec_str(&buff[index..])?;
        index += n;

        let (sub_config, n) = lp::dec(&buff[index..])?;
        index += n;

        Ok((
            Self {
                ticker,
                application,
                sub_config,
            },
            index,
        ))
    }
}

/// Asset used to pay network fees, optionally appended to chain sub-configurations
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FeesAsset<'a> {
    pub ticker: &'a str,
    pub decimals: Option<u8>,
}

/// Coin sub-configuration
///
/// ## Encoding
///
/// `CHAIN_ID` is present only when set, and the fees asset fields may only
/// follow a `CHAIN_ID`. Consumers must not assume a fixed size.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  TICKER_LEN   |                 TICKER...                     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   DECIMALS    |          CHAIN_ID (optional, u64 BE)          /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /               |   FEES_LEN    |          FEES_TICKER...       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | FEES_DECIMALS |
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SubConfig<'a> {
    pub ticker: &'a str,
    pub decimals: u8,
    pub chain_id: Option<u64>,
    pub fees: Option<FeesAsset<'a>>,
}

impl<'a> SubConfig<'a> {
    /// Create a new sub-configuration without a chain id
    pub fn new(ticker: &'a str, decimals: u8) -> Self {
        Self {
            ticker,
            decimals,
            chain_id: None,
            fees: None,
        }
    }

    /// Set the chain id
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Set the network fees asset (requires a chain id)
    pub fn with_fees_asset(mut self, ticker: &'a str, decimals: Option<u8>) -> Self {
        self.fees = Some(FeesAsset { ticker, decimals });
        self
    }

    /// Encode sub-configuration to a new buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, ApduError> {
        crate::encode_vec(self)
    }
}

impl<'a> Encode for SubConfig<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        let mut n = lp::enc_len(self.ticker.as_bytes())? + 1;

        match (self.chain_id, &self.fees) {
            (None, None) => (),
            (None, Some(_)) => return Err(ApduError::InvalidEncoding),
            (Some(_), None) => n += 8,
            (Some(_), Some(f)) => {
                n += 8;
                n += lp::enc_len(f.ticker.as_bytes())?;
                n += f.decimals.map(|_| 1).unwrap_or(0);
            }
        }

        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        // Check length up front, also validates field combinations
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        index += lp::enc(self.ticker.as_bytes(), &mut buff[index..])?;

        buff[index] = self.decimals;
        index += 1;

        if let Some(chain_id) = self.chain_id {
            index += raw::enc(&chain_id.to_be_bytes(), &mut buff[index..])?;
        }

        if let Some(f) = &self.fees {
            index += lp::enc(f.ticker.as_bytes(), &mut buff[index..])?;

            if let Some(d) = f.decimals {
                buff[index] = d;
                index += 1;
            }
        }

        Ok(index)
    }
}

impl<'a> Decode<'a> for SubConfig<'a> {
    type Output = Self;
    type Error = ApduError;

    /// Decode a sub-configuration, consuming the whole buffer
    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (ticker, n) = lp::dec_str(buff)?;
        index += n;

        let decimals = *buff.get(index).ok_or(ApduError::InvalidLength)?;
        index += 1;

        let mut s = Self::new(ticker, decimals);

        // Optional chain id
        if index < buff.len() {
            let (c, n) = raw::dec(&buff[index..], 8)?;
            let mut b = [0u8; 8];
            b.copy_from_slice(c);

            s.chain_id = Some(u64::from_be_bytes(b));
            index += n;
        }

        // Optional fees asset
        if index < buff.len() {
            let (ticker, n) = lp::dec_str(&buff[index..])?;
            index += n;

            let decimals = buff.get(index).copied();
            index += decimals.map(|_| 1).unwrap_or(0);

            s.fees = Some(FeesAsset { ticker, decimals });
        }

        if index != buff.len() {
            return Err(ApduError::InvalidEncoding);
        }

        Ok((s, index))
    }
}

/// Encode a coin sub-configuration
pub fn encode_sub_config(
    ticker: &str,
    decimals: u8,
    chain_id: Option<u64>,
) -> Result<Vec<u8>, ApduError> {
    SubConfig {
        ticker,
        decimals,
        chain_id,
        fees: None,
    }
    .to_vec()
}

/// Decode a coin sub-configuration
pub fn decode_sub_config(buff: &[u8]) -> Result<SubConfig, ApduError> {
    SubConfig::decode(buff).map(|(s, _n)| s)
}

/// Encode a currency configuration from its main ticker, application name and sub-configuration
pub fn encode_currency_config(
    main_ticker: &str,
    application_name: &str,
    sub_config: &[u8],
) -> Result<Vec<u8>, ApduError> {
    CurrencyConfig::new(main_ticker, application_name, sub_config).to_vec()
}
