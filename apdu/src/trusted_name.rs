// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Trusted name descriptors
//!
//! A trusted name descriptor binds a display name to an address on a given
//! chain, and is sent to the device (following a challenge request) to
//! replace a raw payout or refund address in the review flow.
//!
//! Descriptors are a sequence of [tlv] records, terminated by a DER ECDSA
//! signature over every preceding record:
//!
//! ```text
//! 01 01 03                STRUCTURE_TYPE (trusted name)
//! 02 01 02                VERSION
//! 70 01 06                TRUSTED_NAME_TYPE (context address)
//! 71 01 06                TRUSTED_NAME_SOURCE (dynamic resolver)
//! 20 LL ...               TRUSTED_NAME
//! 23 LL ...               CHAIN_ID
//! 22 LL ...               ADDRESS
//! 73 LL ...               SOURCE_CONTRACT (optional)
//! 12 04 XX XX XX XX       CHALLENGE
//! 13 01 00                SIGNER_KEY_ID (test)
//! 14 01 01                SIGNER_ALGO (ECDSA / SHA256)
//! 15 LL 30 ...            DER_SIGNATURE
//! ```
//!
//! Complete descriptors must fit a single APDU.
//!
//! [tlv]: crate::tlv

use alloc::vec::Vec;

use num_enum::TryFromPrimitive;
use strum::{Display, EnumString, EnumVariantNames};

use crate::{
    tlv::{format_tlv, FieldTag, Tlv, TlvReader, TlvValue},
    ApduError, MAX_APDU_DATA,
};

/// Structure type for trusted name descriptors
pub const STRUCTURE_TYPE_TRUSTED_NAME: u8 = 0x03;

/// Supported descriptor version
pub const TRUSTED_NAME_VERSION: u8 = 0x02;

/// Maximum length of trusted name and address fields
pub const TRUSTED_NAME_MAX_LEN: usize = 44;

/// Trusted name type
#[derive(Copy, Clone, Debug, PartialEq, Display, EnumString, EnumVariantNames, TryFromPrimitive)]
#[repr(u8)]
pub enum TrustedNameType {
    Eoa = 0x01,
    SmartContract = 0x02,
    Collection = 0x03,
    Token = 0x04,
    Wallet = 0x05,
    ContextAddress = 0x06,
}

/// Trusted name source
#[derive(Copy, Clone, Debug, PartialEq, Display, EnumString, EnumVariantNames, TryFromPrimitive)]
#[repr(u8)]
pub enum TrustedNameSource {
    LocalAddressBook = 0x00,
    CryptoAssetList = 0x01,
    Ens = 0x02,
    UnstoppableDomains = 0x03,
    Freename = 0x04,
    Dns = 0x05,
    DynamicResolver = 0x06,
}

/// Key used to sign the descriptor
#[derive(
    Copy, Clone, Debug, PartialEq, Default, Display, EnumString, EnumVariantNames, TryFromPrimitive,
)]
#[repr(u8)]
pub enum SignerKeyId {
    #[default]
    Test = 0x00,
    Prod = 0x03,
}

/// Signature algorithm identifier
pub const SIGNER_ALGO_ECDSA_SHA256: u8 = 0x01;

/// Trusted name descriptor builder
///
/// Every field is optional so malformed descriptors can be produced to
/// exercise device rejections, [TrustedNameDescriptor::new] populates
/// the standard fields.
#[derive(Clone, PartialEq, Debug)]
pub struct TrustedNameDescriptor<'a> {
    pub structure_type: Option<u8>,
    pub version: Option<u8>,
    pub name_type: Option<u8>,
    pub name_source: Option<u8>,
    pub trusted_name: Option<&'a [u8]>,
    pub chain_id: Option<u64>,
    pub address: Option<&'a [u8]>,
    pub source_contract: Option<&'a [u8]>,
    pub challenge: Option<u32>,
    pub key_id: Option<u8>,
    pub algo: Option<u8>,
}

impl<'a> TrustedNameDescriptor<'a> {
    /// Create a standard descriptor binding `trusted_name` to `address`
    pub fn new(trusted_name: &'a [u8], address: &'a [u8], chain_id: u64, challenge: u32) -> Self {
        Self {
            structure_type: Some(STRUCTURE_TYPE_TRUSTED_NAME),
            version: Some(TRUSTED_NAME_VERSION),
            name_type: Some(TrustedNameType::ContextAddress as u8),
            name_source: Some(TrustedNameSource::DynamicResolver as u8),
            trusted_name: Some(trusted_name),
            chain_id: Some(chain_id),
            address: Some(address),
            source_contract: None,
            challenge: Some(challenge),
            key_id: Some(SignerKeyId::Test as u8),
            algo: Some(SIGNER_ALGO_ECDSA_SHA256),
        }
    }

    /// Set the (optional) source contract
    pub fn with_source_contract(mut self, source_contract: &'a [u8]) -> Self {
        self.source_contract = Some(source_contract);
        self
    }

    /// Set the signer key id
    pub fn with_key_id(mut self, key_id: SignerKeyId) -> Self {
        self.key_id = Some(key_id as u8);
        self
    }

    /// Drop a field from the descriptor
    pub fn without(mut self, tag: FieldTag) -> Self {
        match tag {
            FieldTag::StructureType => self.structure_type = None,
            FieldTag::Version => self.version = None,
            FieldTag::TrustedNameType => self.name_type = None,
            FieldTag::TrustedNameSource => self.name_source = None,
            FieldTag::TrustedName => self.trusted_name = None,
            FieldTag::ChainId => self.chain_id = None,
            FieldTag::Address => self.address = None,
            FieldTag::TrustedNameSourceContract => self.source_contract = None,
            FieldTag::Challenge => self.challenge = None,
            FieldTag::SignerKeyId => self.key_id = None,
            FieldTag::SignerAlgo => self.algo = None,
            _ => (),
        }
        self
    }

    /// Build the signed portion of the descriptor (every record preceding the signature)
    pub fn signed_payload(&self) -> Vec<u8> {
        let int = |v: u8| TlvValue::Int(v as u64);

        // Challenges are always sent as four bytes
        let challenge = self.challenge.map(u32::to_be_bytes);

        let fields = [
            (FieldTag::StructureType, self.structure_type.map(int)),
            (FieldTag::Version, self.version.map(int)),
            (FieldTag::TrustedNameType, self.name_type.map(int)),
            (FieldTag::TrustedNameSource, self.name_source.map(int)),
            (FieldTag::TrustedName, self.trusted_name.map(TlvValue::Bytes)),
            (FieldTag::ChainId, self.chain_id.map(TlvValue::Int)),
            (FieldTag::Address, self.address.map(TlvValue::Bytes)),
            (
                FieldTag::TrustedNameSourceContract,
                self.source_contract.map(TlvValue::Bytes),
            ),
            (
                FieldTag::Challenge,
                challenge.as_ref().map(|c| TlvValue::Bytes(&c[..])),
            ),
            (FieldTag::SignerKeyId, self.key_id.map(int)),
            (FieldTag::SignerAlgo, self.algo.map(int)),
        ];

        fields
            .iter()
            .filter_map(|(t, v)| v.map(|v| format_tlv(*t, v)))
            .flatten()
            .collect()
    }

    /// Build the complete descriptor, appending the provided DER signature over [Self::signed_payload]
    pub fn with_signature(&self, signature: &[u8]) -> Result<Vec<u8>, ApduError> {
        let mut b = self.signed_payload();
        b.extend_from_slice(&format_tlv(FieldTag::DerSignature, signature));

        if b.len() > MAX_APDU_DATA {
            return Err(ApduError::ElementTooLong(b.len()));
        }

        Ok(b)
    }
}

/// Fetch a single byte integer value
fn small(t: &Tlv) -> Result<u8, ApduError> {
    u8::try_from(t.as_int()?).map_err(|_| ApduError::InvalidEncoding)
}

/// Parsed trusted name descriptor, borrowing from the underlying buffer
#[derive(Clone, PartialEq, Debug)]
pub struct TrustedNameInfo<'a> {
    pub version: u8,
    pub name_type: u8,
    pub name_source: u8,
    pub trusted_name: &'a [u8],
    pub chain_id: u64,
    pub address: &'a [u8],
    pub source_contract: Option<&'a [u8]>,
    pub challenge: Option<u32>,
    pub key_id: u8,
    pub algo: u8,
    /// Records covered by the signature
    pub signed: &'a [u8],
    /// DER encoded signature
    pub signature: &'a [u8],
}

impl<'a> TrustedNameInfo<'a> {
    /// Parse a descriptor, checking required records are present and the signature is last
    pub fn parse(buff: &'a [u8]) -> Result<Self, ApduError> {
        let mut structure_type = None;
        let mut version = None;
        let mut name_type = None;
        let mut name_source = None;
        let mut trusted_name = None;
        let mut chain_id = None;
        let mut address = None;
        let mut source_contract = None;
        let mut challenge = None;
        let mut key_id = None;
        let mut algo = None;
        let mut signature = None;

        let mut r = TlvReader::new(buff);
        let mut signed_len = 0;

        while let Some(t) = r.next() {
            let t = t?;

            // Signature must be the final record
            if signature.is_some() {
                return Err(ApduError::InvalidEncoding);
            }

            match t.field() {
                Some(FieldTag::StructureType) => structure_type = Some(small(&t)?),
                Some(FieldTag::Version) => version = Some(small(&t)?),
                Some(FieldTag::TrustedNameType) => name_type = Some(small(&t)?),
                Some(FieldTag::TrustedNameSource) => name_source = Some(small(&t)?),
                Some(FieldTag::TrustedName) => trusted_name = Some(t.value),
                Some(FieldTag::ChainId) => chain_id = Some(t.as_int()?),
                Some(FieldTag::Address) => address = Some(t.value),
                Some(FieldTag::TrustedNameSourceContract) => source_contract = Some(t.value),
                Some(FieldTag::Challenge) => {
                    if t.value.len() > 4 {
                        return Err(ApduError::InvalidEncoding);
                    }
                    challenge = Some(t.as_int()? as u32);
                }
                Some(FieldTag::SignerKeyId) => key_id = Some(small(&t)?),
                Some(FieldTag::SignerAlgo) => algo = Some(small(&t)?),
                Some(FieldTag::DerSignature) => {
                    signature = Some(t.value);
                    continue;
                }
                _ => return Err(ApduError::InvalidEncoding),
            }

            signed_len = r.offset();
        }

        let missing = |t: FieldTag| ApduError::MissingTag(t as u8);

        if structure_type.ok_or(missing(FieldTag::StructureType))? != STRUCTURE_TYPE_TRUSTED_NAME {
            return Err(ApduError::InvalidEncoding);
        }

        Ok(Self {
            version: version.ok_or(missing(FieldTag::Version))?,
            name_type: name_type.ok_or(missing(FieldTag::TrustedNameType))?,
            name_source: name_source.ok_or(missing(FieldTag::TrustedNameSource))?,
            trusted_name: trusted_name.ok_or(missing(FieldTag::TrustedName))?,
            chain_id: chain_id.ok_or(missing(FieldTag::ChainId))?,
            address: address.ok_or(missing(FieldTag::Address))?,
            source_contract,
            challenge,
            key_id: key_id.ok_or(missing(FieldTag::SignerKeyId))?,
            algo: algo.ok_or(missing(FieldTag::SignerAlgo))?,
            signed: &buff[..signed_len],
            signature: signature.ok_or(missing(FieldTag::DerSignature))?,
        })
    }
}
