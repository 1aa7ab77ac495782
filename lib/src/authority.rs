// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing authorities for partner and root keys
//!
//! A [SigningAuthority] owns an ECDSA key pair on one of the supported
//! [Curve]s along with the partner credentials derived from it. The private
//! key never leaves the authority, callers may only request signatures.

use k256::{
    ecdsa::signature::{RandomizedSigner, Verifier},
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand_core::OsRng;

use exchange_pki_apdu::{
    credential::{Credential, CredentialNg, UNCOMPRESSED_POINT_LEN},
    encode_vec, Curve, SubCommand,
};

use crate::Error;

/// Length of private scalars on supported curves
pub const SECRET_LEN: usize = 32;

/// Private key, one variant per supported curve
enum KeyPair {
    K1(k256::ecdsa::SigningKey),
    R1(p256::ecdsa::SigningKey),
}

impl KeyPair {
    fn random(curve: Curve) -> Self {
        match curve {
            Curve::Secp256k1 => Self::K1(k256::ecdsa::SigningKey::random(&mut OsRng)),
            Curve::Secp256r1 => Self::R1(p256::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    /// Load a key from big-endian scalar bytes (left-padded to [SECRET_LEN])
    fn from_secret(curve: Curve, secret: &[u8]) -> Result<Self, Error> {
        if secret.is_empty() || secret.len() > SECRET_LEN {
            return Err(Error::InvalidKey);
        }

        let mut b = [0u8; SECRET_LEN];
        b[SECRET_LEN - secret.len()..].copy_from_slice(secret);

        let k = match curve {
            Curve::Secp256k1 => Self::K1(
                k256::ecdsa::SigningKey::from_slice(&b).map_err(|_| Error::InvalidKey)?,
            ),
            Curve::Secp256r1 => Self::R1(
                p256::ecdsa::SigningKey::from_slice(&b).map_err(|_| Error::InvalidKey)?,
            ),
        };

        Ok(k)
    }

    fn public_key(&self) -> PublicKey {
        match self {
            Self::K1(k) => PublicKey::K1(*k.verifying_key()),
            Self::R1(k) => PublicKey::R1(*k.verifying_key()),
        }
    }

    /// ECDSA / SHA-256 with RFC6979 nonces hedged with OS randomness
    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            Self::K1(k) => {
                let s: k256::ecdsa::Signature = k.sign_with_rng(&mut OsRng, payload);
                s.to_der().as_bytes().to_vec()
            }
            Self::R1(k) => {
                let s: p256::ecdsa::Signature = k.sign_with_rng(&mut OsRng, payload);
                s.to_der().as_bytes().to_vec()
            }
        }
    }
}

/// Public key on a supported curve, used to verify authority signatures
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum PublicKey {
    K1(k256::ecdsa::VerifyingKey),
    R1(p256::ecdsa::VerifyingKey),
}

impl PublicKey {
    /// Parse a SEC1 encoded (compressed or uncompressed) point
    pub fn from_sec1_bytes(curve: Curve, b: &[u8]) -> Result<Self, Error> {
        let k = match curve {
            Curve::Secp256k1 => Self::K1(
                k256::ecdsa::VerifyingKey::from_sec1_bytes(b).map_err(|_| Error::InvalidKey)?,
            ),
            Curve::Secp256r1 => Self::R1(
                p256::ecdsa::VerifyingKey::from_sec1_bytes(b).map_err(|_| Error::InvalidKey)?,
            ),
        };
        Ok(k)
    }

    pub fn curve(&self) -> Curve {
        match self {
            Self::K1(_) => Curve::Secp256k1,
            Self::R1(_) => Curve::Secp256r1,
        }
    }

    /// Uncompressed SEC1 encoding (`0x04 ‖ X ‖ Y`)
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let mut b = [0u8; UNCOMPRESSED_POINT_LEN];
        match self {
            Self::K1(k) => b.copy_from_slice(k.as_affine().to_encoded_point(false).as_bytes()),
            Self::R1(k) => b.copy_from_slice(k.as_affine().to_encoded_point(false).as_bytes()),
        }
        b
    }

    /// Compressed SEC1 encoding (`0x02 | 0x03 ‖ X`)
    pub fn to_compressed(&self) -> Vec<u8> {
        match self {
            Self::K1(k) => k.as_affine().to_encoded_point(true).as_bytes().to_vec(),
            Self::R1(k) => k.as_affine().to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Verify a DER encoded ECDSA / SHA-256 signature over `payload`
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error> {
        match self {
            Self::K1(k) => {
                let s = k256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                k.verify(payload, &s)
            }
            Self::R1(k) => {
                let s = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                k.verify(payload, &s)
            }
        }
        .map_err(|_| Error::SignVerificationFail)
    }
}

/// Named ECDSA key pair with derived partner credentials
pub struct SigningAuthority {
    name: String,
    key: KeyPair,
    public_key: PublicKey,
    credentials: Vec<u8>,
    credentials_ng: Vec<u8>,
}

impl SigningAuthority {
    /// Create an authority with a freshly generated key
    pub fn create(curve: Curve, name: &str) -> Result<Self, Error> {
        Self::from_key(name, KeyPair::random(curve))
    }

    /// Create an authority from an existing big-endian private scalar
    pub fn from_secret(curve: Curve, name: &str, secret: &[u8]) -> Result<Self, Error> {
        Self::from_key(name, KeyPair::from_secret(curve, secret)?)
    }

    fn from_key(name: &str, key: KeyPair) -> Result<Self, Error> {
        let public_key = key.public_key();
        let point = public_key.to_uncompressed();

        let credentials = encode_vec(&Credential::new(name, &point))?;
        let credentials_ng = encode_vec(&CredentialNg::new(name, public_key.curve(), &point))?;

        log::debug!(
            "New signing authority '{}' ({}): {}",
            name,
            public_key.curve(),
            hex::encode(point)
        );

        Ok(Self {
            name: name.to_string(),
            key,
            public_key,
            credentials,
            credentials_ng,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self) -> Curve {
        self.public_key.curve()
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Legacy credentials (`len ‖ name ‖ point`)
    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    /// NG credentials (`len ‖ name ‖ curve ‖ point`)
    pub fn credentials_ng(&self) -> &[u8] {
        &self.credentials_ng
    }

    /// Credentials in the form expected by the provided flow
    pub fn credentials_for(&self, subcommand: SubCommand) -> &[u8] {
        match subcommand.is_ng() {
            true => &self.credentials_ng,
            false => &self.credentials,
        }
    }

    /// Sign `payload`, returning a DER encoded signature
    ///
    /// Nonces are hedged so repeated calls return distinct signatures
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.key.sign(payload)
    }
}

impl core::fmt::Debug for SigningAuthority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigningAuthority")
            .field("name", &self.name)
            .field("curve", &self.curve())
            .field("public_key", &hex::encode(self.public_key.to_uncompressed()))
            .finish()
    }
}
