// Copyright (c) 2022-2023 The MobileCoin Foundation

/// encdec helper module for one-byte length prefixed fields
pub(crate) mod lp {
    use crate::ApduError;

    /// Check a field fits a one byte length prefix
    pub fn check(d: &[u8]) -> Result<u8, ApduError> {
        u8::try_from(d.len()).map_err(|_| ApduError::ElementTooLong(d.len()))
    }

    pub fn enc(d: &[u8], buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = check(d)?;

        if buff.len() < d.len() + 1 {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = n;
        buff[1..][..d.len()].copy_from_slice(d);

        Ok(d.len() + 1)
    }

    pub fn enc_len(d: &[u8]) -> Result<usize, ApduError> {
        check(d)?;
        Ok(d.len() + 1)
    }

    pub fn dec(buff: &[u8]) -> Result<(&[u8], usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let n = buff[0] as usize;
        if buff.len() < n + 1 {
            return Err(ApduError::InvalidLength);
        }

        Ok((&buff[1..][..n], n + 1))
    }

    pub fn dec_str(buff: &[u8]) -> Result<(&str, usize), ApduError> {
        let (d, n) = dec(buff)?;
        let s = core::str::from_utf8(d)?;
        Ok((s, n))
    }
}

/// encdec helper module for raw byte fields (length implicit)
pub(crate) mod raw {
    use crate::ApduError;

    pub fn enc(d: &[u8], buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < d.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..d.len()].copy_from_slice(d);

        Ok(d.len())
    }

    pub fn dec(buff: &[u8], n: usize) -> Result<(&[u8], usize), ApduError> {
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        Ok((&buff[..n], n))
    }
}
