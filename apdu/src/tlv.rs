// Copyright (c) 2022-2023 The MobileCoin Foundation

//! DER-style TLV records, used for trusted name descriptors
//!
//! Both the tag and the length of each record use the DER minimal length
//! encoding: values below `0x80` are a single byte, larger values are
//! prefixed with `0x80 | n` where `n` is the number of big-endian bytes
//! that follow.
//!
//! ```text
//! +--------------+--------------+----------------------------+
//! | DER(TAG)     | DER(LEN)     | VALUE (LEN bytes)          |
//! +--------------+--------------+----------------------------+
//! ```
//!
//! Every [FieldTag] is below `0x80` so tags are in practice a single byte.

use alloc::vec::Vec;

use encdec::{Decode, Encode};
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::ApduError;

/// Trusted name descriptor field tags
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumVariantNames,
    EnumIter,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum FieldTag {
    StructureType = 0x01,
    Version = 0x02,
    NotValidAfter = 0x10,
    Challenge = 0x12,
    SignerKeyId = 0x13,
    SignerAlgo = 0x14,
    DerSignature = 0x15,
    TrustedName = 0x20,
    ChainId = 0x23,
    Address = 0x22,
    TrustedNameType = 0x70,
    TrustedNameSource = 0x71,
    TrustedNameNftId = 0x72,
    TrustedNameSourceContract = 0x73,
}

impl From<FieldTag> for u64 {
    fn from(t: FieldTag) -> Self {
        t as u8 as u64
    }
}

/// TLV value, normalised to bytes on encode
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TlvValue<'a> {
    /// Unsigned integer, encoded as minimal big-endian bytes (at least one)
    Int(u64),
    /// UTF-8 text
    Text(&'a str),
    /// Raw bytes
    Bytes(&'a [u8]),
}

impl<'a> TlvValue<'a> {
    /// Length of the normalised value in bytes
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => be_len(*v),
            Self::Text(s) => s.len(),
            Self::Bytes(b) => b.len(),
        }
    }

    /// Check whether the normalised value is empty (integers never are)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write normalised value bytes to the provided buffer
    pub fn write(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = self.len();
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        match self {
            Self::Int(v) => buff[..n].copy_from_slice(&v.to_be_bytes()[8 - n..]),
            Self::Text(s) => buff[..n].copy_from_slice(s.as_bytes()),
            Self::Bytes(b) => buff[..n].copy_from_slice(b),
        }

        Ok(n)
    }

    /// Normalise value to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = alloc::vec![0u8; self.len()];
        // Buffer is sized from `len()` so this cannot fail
        let _ = self.write(&mut b);
        b
    }
}

impl From<u64> for TlvValue<'_> {
    fn from(v: u64) -> Self {
        Self::Int(v)
    }
}

impl<'a> From<&'a str> for TlvValue<'a> {
    fn from(v: &'a str) -> Self {
        Self::Text(v)
    }
}

impl<'a> From<&'a [u8]> for TlvValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(v)
    }
}

/// Number of bytes in the minimal big-endian representation of `v`
fn be_len(v: u64) -> usize {
    let bits = 64 - v.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

/// Compute the DER minimal length encoded size of `v`
pub fn der_encode_len(v: u64) -> usize {
    match v {
        0..=0x7f => 1,
        _ => 1 + be_len(v),
    }
}

/// Write the DER minimal length encoding of `v` to the provided buffer
pub fn der_encode_into(v: u64, buff: &mut [u8]) -> Result<usize, ApduError> {
    let n = der_encode_len(v);
    if buff.len() < n {
        return Err(ApduError::InvalidLength);
    }

    if v < 0x80 {
        buff[0] = v as u8;
        return Ok(1);
    }

    let m = n - 1;
    buff[0] = 0x80 | m as u8;
    buff[1..n].copy_from_slice(&v.to_be_bytes()[8 - m..]);

    Ok(n)
}

/// Encode `v` using the DER minimal length encoding
pub fn der_encode(v: u64) -> Vec<u8> {
    let mut b = alloc::vec![0u8; der_encode_len(v)];
    // Buffer is sized from `der_encode_len` so this cannot fail
    let _ = der_encode_into(v, &mut b);
    b
}

/// Decode a DER minimal length encoded value, returning the value and bytes consumed
///
/// Non-minimal encodings are rejected.
pub fn der_decode(buff: &[u8]) -> Result<(u64, usize), ApduError> {
    let b0 = *buff.first().ok_or(ApduError::InvalidLength)?;

    if b0 < 0x80 {
        return Ok((b0 as u64, 1));
    }

    let m = (b0 & 0x7f) as usize;
    if m == 0 || m > 8 {
        return Err(ApduError::InvalidEncoding);
    }
    if buff.len() < 1 + m {
        return Err(ApduError::InvalidLength);
    }

    let d = &buff[1..][..m];
    if d[0] == 0 {
        return Err(ApduError::InvalidEncoding);
    }

    let v = d.iter().fold(0u64, |a, b| (a << 8) | *b as u64);
    if v < 0x80 {
        return Err(ApduError::InvalidEncoding);
    }

    Ok((v, 1 + m))
}

/// Encode a TLV record with the provided tag and value
pub fn format_tlv<'a>(tag: impl Into<u64>, value: impl Into<TlvValue<'a>>) -> Vec<u8> {
    let tag = tag.into();
    let value = value.into();

    if tag >= 0x80 {
        #[cfg(feature = "log")]
        log::warn!("TLV tag {tag:#x} uses long-form DER encoding, check verifier support");
    }

    let len = value.len() as u64;

    let mut b = Vec::with_capacity(der_encode_len(tag) + der_encode_len(len) + value.len());
    b.extend_from_slice(&der_encode(tag));
    b.extend_from_slice(&der_encode(len));
    b.extend_from_slice(&value.to_bytes());

    b
}

/// Decoded TLV record, borrowing the value from the underlying buffer
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tlv<'a> {
    pub tag: u64,
    pub value: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Resolve record tag to a known [FieldTag]
    pub fn field(&self) -> Option<FieldTag> {
        u8::try_from(self.tag)
            .ok()
            .and_then(|t| FieldTag::try_from(t).ok())
    }

    /// Interpret value as a big-endian unsigned integer
    pub fn as_int(&self) -> Result<u64, ApduError> {
        if self.value.is_empty() || self.value.len() > 8 {
            return Err(ApduError::InvalidEncoding);
        }

        Ok(self
            .value
            .iter()
            .fold(0u64, |a, b| (a << 8) | *b as u64))
    }

    /// Interpret value as UTF-8 text
    pub fn as_str(&self) -> Result<&'a str, ApduError> {
        let s = core::str::from_utf8(self.value)?;
        Ok(s)
    }
}

impl<'a> Encode for Tlv<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(der_encode_len(self.tag) + der_encode_len(self.value.len() as u64) + self.value.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut index = 0;

        index += der_encode_into(self.tag, &mut buff[index..])?;
        index += der_encode_into(self.value.len() as u64, &mut buff[index..])?;

        if buff.len() < index + self.value.len() {
            return Err(ApduError::InvalidLength);
        }
        buff[index..][..self.value.len()].copy_from_slice(self.value);
        index += self.value.len();

        Ok(index)
    }
}

impl<'a> Decode<'a> for Tlv<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (tag, n) = der_decode(&buff[index..])?;
        index += n;

        let (len, n) = der_decode(&buff[index..])?;
        index += n;

        let len = usize::try_from(len).map_err(|_| ApduError::InvalidLength)?;
        if len > buff.len() - index {
            return Err(ApduError::InvalidLength);
        }

        let value = &buff[index..][..len];
        index += len;

        Ok((Self { tag, value }, index))
    }
}

/// Iterator over a sequence of TLV records
pub struct TlvReader<'a> {
    buff: &'a [u8],
    index: usize,
}

impl<'a> TlvReader<'a> {
    pub fn new(buff: &'a [u8]) -> Self {
        Self { buff, index: 0 }
    }

    /// Offset of the next record in the underlying buffer
    pub fn offset(&self) -> usize {
        self.index
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = Result<Tlv<'a>, ApduError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.buff.len() {
            return None;
        }

        match Tlv::decode(&self.buff[self.index..]) {
            Ok((t, n)) => {
                self.index += n;
                Some(Ok(t))
            }
            Err(e) => {
                // Stop iterating on malformed input
                self.index = self.buff.len();
                Some(Err(e))
            }
        }
    }
}
