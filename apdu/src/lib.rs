// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for the Exchange partner credential protocol
//!
//! This module provides the wire encodings used to register swap / sell / fund
//! partners with an Exchange application: DER-style TLV records for trusted
//! name descriptors, length-prefixed currency configurations, partner
//! credentials, and the command / status word definitions for the APDU
//! exchange itself.
//!
//! Multi-byte integers are big-endian throughout.
//!

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::vec::Vec;

use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

pub mod command;
pub mod credential;
pub mod currency;
pub mod partner;
pub mod prelude;
pub mod status;
pub mod tlv;
pub mod trusted_name;

mod error;
pub use error::ApduError;

mod helpers;

/// Exchange APDU Class
pub const EXCHANGE_CLA: u8 = 0xe0;

/// Maximum data length for a short command APDU
pub const MAX_APDU_DATA: usize = 255;

/// Encode an object to a new buffer
pub fn encode_vec<E: encdec::Encode<Error = ApduError>>(e: &E) -> Result<Vec<u8>, ApduError> {
    let mut b = alloc::vec![0u8; e.encode_len()?];
    let n = e.encode(&mut b)?;
    b.truncate(n);
    Ok(b)
}

/// Static APDU header information, used to build command APDUs
pub trait ApduStatic {
    /// Class ID for APDU commands
    const CLA: u8;

    /// Instruction ID for APDU commands
    const INS: u8;
}

/// Exchange APDU instruction codes
#[derive(
    Copy, Clone, Debug, PartialEq, Display, EnumString, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    GetVersion = 0x02,

    /// Start a new exchange transaction, returning the device nonce
    StartNewTransaction = 0x03,

    /// Register a partner credential
    SetPartnerKey = 0x04,

    /// Check the root signature over the registered partner credential
    CheckPartner = 0x05,

    /// Submit the partner transaction proposal
    ProcessTransactionResponse = 0x06,

    /// Check the partner signature over the transaction proposal
    CheckTransactionSignature = 0x07,

    /// Check the payout address against a signed currency configuration
    CheckPayoutAddress = 0x08,

    /// Check the refund address against a signed currency configuration
    CheckRefundAddress = 0x09,

    /// Hand over to the coin application for signing
    StartSigningTransaction = 0x0a,

    /// Fetch a single-use challenge for trusted name descriptors
    GetChallenge = 0x10,

    /// Submit a signed trusted name descriptor
    SendTrustedNameDescriptor = 0x11,
}

/// Exchange rate type, carried in `P1`
#[derive(
    Copy, Clone, Debug, PartialEq, Default, Display, EnumString, EnumVariantNames, TryFromPrimitive,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Rate {
    #[default]
    Fixed = 0x00,
    Floating = 0x01,
}

/// Exchange flow, carried in `P2`
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Default,
    Display,
    EnumString,
    EnumVariantNames,
    EnumIter,
    TryFromPrimitive,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum SubCommand {
    #[default]
    Swap = 0x00,
    Sell = 0x01,
    Fund = 0x02,
    SwapNg = 0x03,
    SellNg = 0x04,
    FundNg = 0x05,
}

impl SubCommand {
    /// NG flows carry an explicit curve identifier in partner credentials
    pub fn is_ng(&self) -> bool {
        matches!(self, Self::SwapNg | Self::SellNg | Self::FundNg)
    }

    /// Curve expected by the device for partner keys in this flow
    pub fn partner_curve(&self) -> Curve {
        match self {
            Self::Swap => Curve::Secp256k1,
            _ => Curve::Secp256r1,
        }
    }
}

/// Elliptic curves supported for partner and root keys
#[derive(
    Copy, Clone, Debug, PartialEq, Display, EnumString, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Curve {
    Secp256k1 = 0x00,
    Secp256r1 = 0x01,
}

impl Curve {
    /// Length of an uncompressed SEC1 point on this curve
    pub const fn point_len(&self) -> usize {
        65
    }
}
