// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command and response APDU framing

use alloc::vec::Vec;

use encdec::{Decode, Encode};

use crate::{status::StatusWord, ApduError, ApduStatic, MAX_APDU_DATA};

/// Length of the command APDU header (`CLA INS P1 P2 LC`)
pub const HEADER_LEN: usize = 5;

/// Short command APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      CLA      |      INS      |      P1       |      P2       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      LC       |               DATA (LC bytes)...              /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Command<'a> {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: &'a [u8],
}

impl<'a> Command<'a> {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: &'a [u8]) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
        }
    }
}

impl<'a> Encode for Command<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        if self.data.len() > MAX_APDU_DATA {
            return Err(ApduError::ElementTooLong(self.data.len()));
        }
        Ok(HEADER_LEN + self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.cla;
        buff[1] = self.ins;
        buff[2] = self.p1;
        buff[3] = self.p2;
        buff[4] = self.data.len() as u8;
        buff[HEADER_LEN..][..self.data.len()].copy_from_slice(self.data);

        Ok(n)
    }
}

impl<'a> Decode<'a> for Command<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < HEADER_LEN {
            return Err(ApduError::InvalidLength);
        }

        let lc = buff[4] as usize;
        if buff.len() < HEADER_LEN + lc {
            return Err(ApduError::InvalidLength);
        }

        Ok((
            Self {
                cla: buff[0],
                ins: buff[1],
                p1: buff[2],
                p2: buff[3],
                data: &buff[HEADER_LEN..][..lc],
            },
            HEADER_LEN + lc,
        ))
    }
}

/// Build a command APDU for the provided request object
pub fn build_command<R>(req: &R, p1: u8, p2: u8) -> Result<Vec<u8>, ApduError>
where
    R: ApduStatic + Encode<Error = ApduError>,
{
    let data = crate::encode_vec(req)?;
    crate::encode_vec(&Command::new(R::CLA, R::INS, p1, p2, &data))
}

/// Response APDU, data followed by a big-endian status word
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Response<'a> {
    pub data: &'a [u8],
    pub status: u16,
}

impl<'a> Response<'a> {
    pub fn new(data: &'a [u8], status: StatusWord) -> Self {
        Self {
            data,
            status: status as u16,
        }
    }

    /// Resolve the status word if known
    pub fn status_word(&self) -> Option<StatusWord> {
        StatusWord::from_raw(self.status)
    }
}

impl<'a> Encode for Response<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.data.len() + 2)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.data.len();
        if buff.len() < n + 2 {
            return Err(ApduError::InvalidLength);
        }

        buff[..n].copy_from_slice(self.data);
        buff[n..][..2].copy_from_slice(&self.status.to_be_bytes());

        Ok(n + 2)
    }
}

impl<'a> Decode<'a> for Response<'a> {
    type Output = Self;
    type Error = ApduError;

    /// Decode a response, consuming the whole buffer
    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        let n = buff.len() - 2;
        let status = u16::from_be_bytes([buff[n], buff[n + 1]]);

        Ok((
            Self {
                data: &buff[..n],
                status,
            },
            buff.len(),
        ))
    }
}
