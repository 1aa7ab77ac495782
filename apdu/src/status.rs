// Copyright (c) 2022-2023 The MobileCoin Foundation

//! APDU response status words

use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Exchange application status words
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
#[repr(u16)]
pub enum StatusWord {
    Success = 0x9000,
    IncorrectCommandData = 0x6a80,
    DeserializationFailed = 0x6a81,
    WrongTransactionId = 0x6a82,
    InvalidAddress = 0x6a83,
    UserRefused = 0x6a84,
    InternalError = 0x6a85,
    WrongP2 = 0x6a86,
    ClassNotSupported = 0x6e00,
    InvalidInstruction = 0x6d00,
    /// Signature did not verify against the expected public key
    SignVerificationFail = 0x9d1a,
}

impl StatusWord {
    /// Resolve a raw status word, returning `None` for unrecognised values
    pub fn from_raw(v: u16) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Encode to big-endian bytes as appended to responses
    pub fn to_bytes(&self) -> [u8; 2] {
        (*self as u16).to_be_bytes()
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}
