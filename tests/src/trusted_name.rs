// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Trusted name descriptor tests

use log::info;

use exchange_pki::{
    apdu::{
        status::StatusWord,
        tlv::FieldTag,
        trusted_name::{SignerKeyId, TrustedNameDescriptor},
    },
    Error, Exchange, ExchangeHandle, SigningAuthority, TrustedRoot,
};

pub const NAME: &[u8] = b"bob.eth";
pub const ADDRESS: &[u8] = b"0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
pub const CHAIN_ID: u64 = 1;

/// Sign a descriptor with the provided root
fn signed(d: &TrustedNameDescriptor, root: &SigningAuthority) -> anyhow::Result<Vec<u8>> {
    let s = root.sign(&d.signed_payload());
    Ok(d.with_signature(&s)?)
}

/// Expect a descriptor to be rejected by the device
async fn rejected<T>(d: &ExchangeHandle<T>, descriptor: &[u8], case: &str) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    match d.send_trusted_name_descriptor(descriptor).await {
        Err(Error::Status(s)) => {
            info!("{}: rejected with {:?}", case, StatusWord::from_raw(s));
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(_) => Err(anyhow::anyhow!("{}: descriptor accepted", case)),
    }
}

/// Send a valid descriptor, then check replays and malformed descriptors are rejected
pub async fn test<T>(t: T) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    let d = ExchangeHandle::from(t);
    let root = TrustedRoot::test_key()?;

    // Valid descriptor for the current challenge
    let challenge = d.get_challenge().await?;
    let desc = TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge);
    let valid = signed(&desc, &root)?;

    d.send_trusted_name_descriptor(&valid).await?;

    // Replays are rejected once the challenge rolls
    rejected(&d, &valid, "replay").await?;

    // Stale challenge
    let challenge = d.get_challenge().await?;
    let desc = TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge.wrapping_add(1));
    rejected(&d, &signed(&desc, &root)?, "wrong challenge").await?;

    // Missing challenge
    let challenge = d.get_challenge().await?;
    let desc =
        TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge).without(FieldTag::Challenge);
    rejected(&d, &signed(&desc, &root)?, "missing challenge").await?;

    // Missing required field
    let challenge = d.get_challenge().await?;
    let desc =
        TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge).without(FieldTag::Address);
    rejected(&d, &signed(&desc, &root)?, "missing address").await?;

    // Production key id on a test device
    let challenge = d.get_challenge().await?;
    let desc = TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge)
        .with_key_id(SignerKeyId::Prod);
    rejected(&d, &signed(&desc, &root)?, "prod key id").await?;

    // Signed by an unknown root
    let challenge = d.get_challenge().await?;
    let desc = TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge);
    let other = TrustedRoot::from_random_key()?;
    rejected(&d, &signed(&desc, &other)?, "random root").await?;

    // Valid again with a fresh challenge
    let challenge = d.get_challenge().await?;
    let desc = TrustedNameDescriptor::new(NAME, ADDRESS, CHAIN_ID, challenge);
    d.send_trusted_name_descriptor(&signed(&desc, &root)?).await?;

    Ok(())
}
