// Copyright (c) 2022-2023 The MobileCoin Foundation

/// APDU encoding / decoding errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum ApduError {
    /// Buffer too short for encode / decode
    #[cfg_attr(feature = "thiserror", error("Invalid buffer length"))]
    InvalidLength,

    /// Element does not fit a one byte length prefix
    #[cfg_attr(
        feature = "thiserror",
        error("Element length {0} exceeds one byte length prefix")
    )]
    ElementTooLong(usize),

    /// Malformed encoding
    #[cfg_attr(feature = "thiserror", error("Invalid encoding"))]
    InvalidEncoding,

    /// Invalid UTF-8 in string field
    #[cfg_attr(feature = "thiserror", error("Invalid utf8 string"))]
    InvalidUtf8,

    /// Unrecognised curve identifier
    #[cfg_attr(feature = "thiserror", error("Unrecognised curve identifier: {0:#04x}"))]
    InvalidCurve(u8),

    /// Required TLV record missing
    #[cfg_attr(feature = "thiserror", error("Missing TLV record: {0:#04x}"))]
    MissingTag(u8),

    /// Underlying encdec error
    #[cfg_attr(feature = "thiserror", error("Encdec error"))]
    Encdec,
}

impl From<encdec::Error> for ApduError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => Self::InvalidLength,
            #[allow(unreachable_patterns)]
            _ => Self::Encdec,
        }
    }
}

impl From<core::str::Utf8Error> for ApduError {
    fn from(_: core::str::Utf8Error) -> Self {
        Self::InvalidUtf8
    }
}
