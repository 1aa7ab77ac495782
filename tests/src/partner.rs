// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Partner registration tests

use log::info;
use strum::IntoEnumIterator;

use exchange_pki::{
    apdu::{status::StatusWord, Rate, SubCommand},
    Error, Exchange, ExchangeHandle, SigningAuthority, TrustedRoot,
};

/// Register a partner signed by the test root for every flow
pub async fn test<T>(t: T) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    let d = ExchangeHandle::from(t);
    let root = TrustedRoot::test_key()?;

    for subcommand in SubCommand::iter() {
        let d = d.clone().with_flow(Rate::Fixed, subcommand);

        let partner = SigningAuthority::create(subcommand.partner_curve(), "partner")?;

        info!(
            "registering partner ({}) for {}",
            partner.curve(),
            subcommand
        );

        let id = d.init_transaction().await?;
        info!("transaction id: {}", hex::encode(&id));

        d.register_partner(&partner, &root).await?;
    }

    Ok(())
}

/// Check partner credentials signed by an unknown root are rejected
pub async fn wrong_root<T>(t: T, subcommand: SubCommand) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    let d = ExchangeHandle::from(t).with_flow(Rate::Floating, subcommand);

    let partner = SigningAuthority::create(subcommand.partner_curve(), "partner")?;
    let root = TrustedRoot::from_random_key()?;

    d.init_transaction().await?;

    let r = d.register_partner(&partner, &root).await;

    info!("registration with random root: {:?}", r);

    match r {
        Err(e) if e.status_word() == Some(StatusWord::SignVerificationFail) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("unexpected error: {}", e)),
        Ok(_) => Err(anyhow::anyhow!("partner signed by random root accepted")),
    }
}

/// Check tampered credentials fail verification
pub async fn tampered<T>(t: T) -> anyhow::Result<()>
where
    T: Exchange + Send,
{
    let d = ExchangeHandle::from(t).with_flow(Rate::Fixed, SubCommand::SellNg);

    let partner = SigningAuthority::create(SubCommand::SellNg.partner_curve(), "partner")?;
    let other = SigningAuthority::create(SubCommand::SellNg.partner_curve(), "partner")?;
    let root = TrustedRoot::test_key()?;

    d.init_transaction().await?;

    // Send one partner's credentials with a signature over another's
    d.set_partner_key(partner.credentials_ng()).await?;
    let r = d
        .check_partner_key(&root.sign(other.credentials_ng()))
        .await;

    match r {
        Err(Error::Status(s)) if s == StatusWord::SignVerificationFail as u16 => Ok(()),
        r => Err(anyhow::anyhow!("unexpected response: {:?}", r)),
    }
}
