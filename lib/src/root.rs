// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Trusted root signer
//!
//! Devices built in test mode embed [LEDGER_TEST_PUBLIC_KEY] as their trust
//! anchor, so data signed with the matching fixed test key is accepted while
//! data signed with a random root is rejected with `SignVerificationFail`.

use exchange_pki_apdu::Curve;

use crate::{
    authority::{PublicKey, SigningAuthority},
    Error,
};

/// Private key of the test-mode trusted root, a public test fixture
pub const LEDGER_TEST_PRIVATE_KEY_HEX: &str =
    "b1ed47ef58f782e2bc4d5abe70ef66d9009c2957967017054470e0f3e10f5833";

/// Uncompressed public key embedded in test-mode devices
pub const LEDGER_TEST_PUBLIC_KEY: [u8; 65] = [
    0x04, 0x20, 0xda, 0x62, 0x00, 0x3c, 0x0c, 0xe0, 0x97, 0xe3, 0x36, 0x44, 0xa1, 0x0f, 0xe4, 0xc3,
    0x04, 0x54, 0x06, 0x9a, 0x44, 0x54, 0xf0, 0xfa, 0x9d, 0x4e, 0x84, 0xf4, 0x50, 0x91, 0x42, 0x9b,
    0x52, 0x20, 0xaf, 0x9e, 0x35, 0xc0, 0xb2, 0xd9, 0x28, 0x93, 0x80, 0x13, 0x73, 0x07, 0xde, 0x4d,
    0xd1, 0xd4, 0x18, 0x42, 0x8c, 0xf2, 0x1a, 0x93, 0xb3, 0x35, 0x61, 0xbb, 0x09, 0xd8, 0x8f, 0xe5,
    0x79,
];

/// Name carried in root credentials
pub const ROOT_NAME: &str = "ledger_test_signer";

/// Curve used by the trusted root
pub const ROOT_CURVE: Curve = Curve::Secp256k1;

/// Factory for trusted root [SigningAuthority] objects
pub struct TrustedRoot;

impl TrustedRoot {
    /// Load the root from a hex encoded private key, normally [LEDGER_TEST_PRIVATE_KEY_HEX]
    pub fn from_fixed_test_key(key_hex: &str) -> Result<SigningAuthority, Error> {
        let secret = hex::decode(key_hex)?;
        SigningAuthority::from_secret(ROOT_CURVE, ROOT_NAME, &secret)
    }

    /// Load the root using the documented test key
    pub fn test_key() -> Result<SigningAuthority, Error> {
        Self::from_fixed_test_key(LEDGER_TEST_PRIVATE_KEY_HEX)
    }

    /// Create a root with a random key, not recognised by any device
    pub fn from_random_key() -> Result<SigningAuthority, Error> {
        SigningAuthority::create(ROOT_CURVE, ROOT_NAME)
    }

    /// Trust anchor as embedded in test-mode devices
    pub fn test_public_key() -> Result<PublicKey, Error> {
        PublicKey::from_sec1_bytes(ROOT_CURVE, &LEDGER_TEST_PUBLIC_KEY)
    }
}

/// Sign a currency configuration with the provided signer, or the test root if none is given
pub fn sign_currency_conf(
    conf: &[u8],
    signer: Option<&SigningAuthority>,
) -> Result<Vec<u8>, Error> {
    match signer {
        Some(s) => Ok(s.sign(conf)),
        None => Ok(TrustedRoot::test_key()?.sign(conf)),
    }
}
