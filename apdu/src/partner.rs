// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Exchange request / response APDUs
//!
//! Requests carry opaque, pre-encoded payloads (credentials, signatures,
//! currency configurations), responses are decoded from the device reply.

use encdec::{Decode, DecodeOwned, Encode};

use crate::{
    helpers::{lp, raw},
    ApduError, ApduStatic, Instruction, EXCHANGE_CLA,
};

/// Helper macro for requests with no payload
macro_rules! empty_req {
    ($(#[$meta:meta])* $name:ident, $ins:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Debug, Default)]
        pub struct $name;

        impl ApduStatic for $name {
            const CLA: u8 = EXCHANGE_CLA;
            const INS: u8 = $ins as u8;
        }

        impl Encode for $name {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(0)
            }

            fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
                Ok(0)
            }
        }

        impl DecodeOwned for $name {
            type Output = Self;
            type Error = ApduError;

            fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
                Ok((Self, 0))
            }
        }
    };
}

/// Helper macro for requests carrying a single raw payload
macro_rules! raw_req {
    ($(#[$meta:meta])* $name:ident, $field:ident, $ins:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Debug)]
        pub struct $name<'a> {
            pub $field: &'a [u8],
        }

        impl<'a> $name<'a> {
            pub fn new($field: &'a [u8]) -> Self {
                Self { $field }
            }
        }

        impl<'a> ApduStatic for $name<'a> {
            const CLA: u8 = EXCHANGE_CLA;
            const INS: u8 = $ins as u8;
        }

        impl<'a> Encode for $name<'a> {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(self.$field.len())
            }

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                raw::enc(self.$field, buff)
            }
        }

        impl<'a> Decode<'a> for $name<'a> {
            type Output = Self;
            type Error = ApduError;

            fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
                Ok((Self { $field: buff }, buff.len()))
            }
        }
    };
}

empty_req!(
    /// Fetch application version
    GetVersionReq,
    Instruction::GetVersion
);

empty_req!(
    /// Start a new exchange transaction, the response contains the transaction id
    StartNewTransactionReq,
    Instruction::StartNewTransaction
);

empty_req!(
    /// Fetch a trusted name challenge
    GetChallengeReq,
    Instruction::GetChallenge
);

raw_req!(
    /// Register partner credentials (legacy or NG encoding per flow)
    SetPartnerKeyReq,
    credentials,
    Instruction::SetPartnerKey
);

raw_req!(
    /// Root signature over the registered partner credentials
    CheckPartnerReq,
    signature,
    Instruction::CheckPartner
);

raw_req!(
    /// Signed trusted name descriptor
    TrustedNameReq,
    descriptor,
    Instruction::SendTrustedNameDescriptor
);

/// Signed currency configuration used to check payout / refund addresses
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   CONF_LEN    |          CURRENCY CONFIGURATION...            /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     0x30      |    SIG_LEN    |     DER SIGNATURE BODY...     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   PATH_LEN    |         PACKED DERIVATION PATH...             /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The DER signature is self-delimiting, its length is the DER sequence header.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AddressCheck<'a> {
    pub conf: &'a [u8],
    pub signature: &'a [u8],
    pub packed_path: &'a [u8],
}

impl<'a> AddressCheck<'a> {
    pub fn new(conf: &'a [u8], signature: &'a [u8], packed_path: &'a [u8]) -> Self {
        Self {
            conf,
            signature,
            packed_path,
        }
    }
}

impl<'a> Encode for AddressCheck<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(lp::enc_len(self.conf)? + self.signature.len() + lp::enc_len(self.packed_path)?)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut index = 0;

        index += lp::enc(self.conf, &mut buff[index..])?;
        index += raw::enc(self.signature, &mut buff[index..])?;
        index += lp::enc(self.packed_path, &mut buff[index..])?;

        Ok(index)
    }
}

impl<'a> Decode<'a> for AddressCheck<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (conf, n) = lp::dec(buff)?;
        index += n;

        // DER signature, `0x30 LEN ...`
        if buff.len() < index + 2 || buff[index] != 0x30 {
            return Err(ApduError::InvalidEncoding);
        }
        let (signature, n) = raw::dec(&buff[index..], buff[index + 1] as usize + 2)?;
        index += n;

        let (packed_path, n) = lp::dec(&buff[index..])?;
        index += n;

        Ok((
            Self {
                conf,
                signature,
                packed_path,
            },
            index,
        ))
    }
}

/// Helper macro for address check requests
macro_rules! address_req {
    ($(#[$meta:meta])* $name:ident, $ins:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Debug)]
        pub struct $name<'a>(pub AddressCheck<'a>);

        impl<'a> ApduStatic for $name<'a> {
            const CLA: u8 = EXCHANGE_CLA;
            const INS: u8 = $ins as u8;
        }

        impl<'a> Encode for $name<'a> {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                self.0.encode_len()
            }

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                self.0.encode(buff)
            }
        }

        impl<'a> Decode<'a> for $name<'a> {
            type Output = Self;
            type Error = ApduError;

            fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
                AddressCheck::decode(buff).map(|(a, n)| (Self(a), n))
            }
        }
    };
}

address_req!(
    /// Check the payout address
    CheckPayoutAddressReq,
    Instruction::CheckPayoutAddress
);

address_req!(
    /// Check the refund address
    CheckRefundAddressReq,
    Instruction::CheckRefundAddress
);

/// Application version response
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct VersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl core::fmt::Display for VersionResp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Encode for VersionResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(3)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        raw::enc(&[self.major, self.minor, self.patch], buff)
    }
}

impl DecodeOwned for VersionResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (d, n) = raw::dec(buff, 3)?;
        Ok((
            Self {
                major: d[0],
                minor: d[1],
                patch: d[2],
            },
            n,
        ))
    }
}

/// Trusted name challenge response (`u32`, big-endian)
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ChallengeResp {
    pub challenge: u32,
}

impl Encode for ChallengeResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        raw::enc(&self.challenge.to_be_bytes(), buff)
    }
}

impl DecodeOwned for ChallengeResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (d, n) = raw::dec(buff, 4)?;
        let challenge = u32::from_be_bytes([d[0], d[1], d[2], d[3]]);
        Ok((Self { challenge }, n))
    }
}
