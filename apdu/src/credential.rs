// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Partner credential encodings
//!
//! Credentials bind a partner name to a public key, and are signed by the
//! trusted root so the device can authenticate the partner.

use encdec::{Decode, Encode};

use crate::{
    helpers::{lp, raw},
    ApduError, Curve,
};

/// Length of an uncompressed SEC1 point
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Tag byte for uncompressed SEC1 points
const UNCOMPRESSED_TAG: u8 = 0x04;

fn check_point(p: &[u8]) -> Result<(), ApduError> {
    if p.len() != UNCOMPRESSED_POINT_LEN {
        return Err(ApduError::InvalidLength);
    }
    if p[0] != UNCOMPRESSED_TAG {
        return Err(ApduError::InvalidEncoding);
    }
    Ok(())
}

/// Legacy partner credential, used for non-NG flows
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   NAME_LEN    |                   NAME...                     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     0x04      |        UNCOMPRESSED POINT (X ‖ Y, 64 bytes)   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Credential<'a> {
    pub name: &'a str,
    pub public_key: &'a [u8],
}

impl<'a> Credential<'a> {
    pub fn new(name: &'a str, public_key: &'a [u8]) -> Self {
        Self { name, public_key }
    }
}

impl<'a> Encode for Credential<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        check_point(self.public_key)?;
        Ok(lp::enc_len(self.name.as_bytes())? + UNCOMPRESSED_POINT_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        check_point(self.public_key)?;

        let mut index = 0;

        index += lp::enc(self.name.as_bytes(), &mut buff[index..])?;
        index += raw::enc(self.public_key, &mut buff[index..])?;

        Ok(index)
    }
}

impl<'a> Decode<'a> for Credential<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (name, n) = lp::dec_str(buff)?;
        index += n;

        let (public_key, n) = raw::dec(&buff[index..], UNCOMPRESSED_POINT_LEN)?;
        check_point(public_key)?;
        index += n;

        Ok((Self { name, public_key }, index))
    }
}

/// NG partner credential, carrying an explicit curve identifier
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   NAME_LEN    |                   NAME...                     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     CURVE     |     0x04      |   UNCOMPRESSED POINT...       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CredentialNg<'a> {
    pub name: &'a str,
    pub curve: Curve,
    pub public_key: &'a [u8],
}

impl<'a> CredentialNg<'a> {
    pub fn new(name: &'a str, curve: Curve, public_key: &'a [u8]) -> Self {
        Self {
            name,
            curve,
            public_key,
        }
    }
}

impl<'a> Encode for CredentialNg<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        check_point(self.public_key)?;
        Ok(lp::enc_len(self.name.as_bytes())? + 1 + UNCOMPRESSED_POINT_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        check_point(self.public_key)?;

        let mut index = 0;

        index += lp::enc(self.name.as_bytes(), &mut buff[index..])?;

        if buff.len() <= index {
            return Err(ApduError::InvalidLength);
        }
        buff[index] = self.curve as u8;
        index += 1;

        index += raw::enc(self.public_key, &mut buff[index..])?;

        Ok(index)
    }
}

impl<'a> Decode<'a> for CredentialNg<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (name, n) = lp::dec_str(buff)?;
        index += n;

        let c = *buff.get(index).ok_or(ApduError::InvalidLength)?;
        let curve = Curve::try_from(c).map_err(|_| ApduError::InvalidCurve(c))?;
        index += 1;

        let (public_key, n) = raw::dec(&buff[index..], UNCOMPRESSED_POINT_LEN)?;
        check_point(public_key)?;
        index += n;

        Ok((
            Self {
                name,
                curve,
                public_key,
            },
            index,
        ))
    }
}
