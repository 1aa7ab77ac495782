// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Payout / refund address checks with signed currency configurations

use log::info;

use exchange_pki::{
    apdu::{partner::AddressCheck, status::StatusWord, Rate, SubCommand},
    currency::CurrencyConfiguration,
    Exchange, ExchangeHandle, SigningAuthority, TrustedRoot,
};

/// Packed `m/44'/60'/0'/0/0` derivation path
pub const ETH_PACKED_PATH: [u8; 21] = [
    0x05, 0x80, 0x00, 0x00, 0x2c, 0x80, 0x00, 0x00, 0x3c, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Ethereum mainnet configuration
pub fn eth() -> anyhow::Result<CurrencyConfiguration> {
    let c = CurrencyConfiguration::evm("ETH", "Ethereum", 18, 1, &ETH_PACKED_PATH)?;
    Ok(c)
}

/// Check payout and refund addresses using configurations signed by the test root,
/// then check a configuration signed by a random root is rejected
pub async fn test<T>(t: T) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    let d = ExchangeHandle::from(t).with_flow(Rate::Fixed, SubCommand::SwapNg);
    let root = TrustedRoot::test_key()?;
    let partner = SigningAuthority::create(SubCommand::SwapNg.partner_curve(), "partner")?;

    d.init_transaction().await?;
    d.register_partner(&partner, &root).await?;

    let c = eth()?;
    info!("currency configuration: {}", hex::encode(&c.conf));

    let signature = c.sign(None)?;
    let check = AddressCheck::new(&c.conf, &signature, &c.packed_path);

    d.check_payout_address(check).await?;
    d.check_refund_address(check).await?;

    // Configuration signed by an unknown root
    let other = TrustedRoot::from_random_key()?;
    let signature = c.sign(Some(&other))?;
    let check = AddressCheck::new(&c.conf, &signature, &c.packed_path);

    match d.check_payout_address(check).await {
        Err(e) if e.status_word() == Some(StatusWord::SignVerificationFail) => Ok(()),
        r => Err(anyhow::anyhow!("unexpected response: {:?}", r)),
    }
}
