// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for exchange partner credentials and trusted data

use std::{net::IpAddr, path::Path, time::Duration};

use clap::Parser;
use log::{debug, info, LevelFilter};
use serde::Serialize;

use exchange_pki::{
    apdu::{
        currency::SubConfig, partner::AddressCheck, trusted_name::TrustedNameDescriptor, Curve,
        Rate, SubCommand,
    },
    connect_tcp,
    currency::CurrencyConfiguration,
    ExchangeHandle, SigningAuthority, TcpOptions, TcpTransport, TrustedRoot,
};

mod helpers;
use helpers::*;

/// Exchange partner credential utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Device (speculos) address
    #[clap(long, env = "SPECULOS_ADDR", default_value = "127.0.0.1")]
    addr: IpAddr,

    /// Device (speculos) APDU port
    #[clap(long, env = "SPECULOS_APDU_PORT", default_value = "9999")]
    port: u16,

    /// Timeout for device requests in milliseconds
    #[clap(long, default_value = "5000")]
    timeout_ms: u64,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// Generate (or load) a signing authority and print its credentials
    Credentials {
        /// Partner name
        #[clap(long)]
        name: String,

        /// Key curve
        #[clap(long, default_value = "secp256r1")]
        curve: Curve,

        /// Hex encoded private key (random if not provided)
        #[clap(long)]
        secret: Option<HexData>,

        /// Write credentials to JSON file
        #[clap(long)]
        output: Option<String>,
    },

    /// Sign a payload with the test root (or a provided key)
    Sign {
        /// Hex encoded payload
        #[clap(long)]
        payload: HexData,

        /// Hex encoded private key (test root if not provided)
        #[clap(long)]
        secret: Option<HexData>,

        /// Key curve for provided private keys
        #[clap(long, default_value = "secp256k1")]
        curve: Curve,
    },

    /// Build and sign a currency configuration
    CurrencyConfig {
        /// Main ticker
        #[clap(long)]
        ticker: String,

        /// Application name
        #[clap(long)]
        application: String,

        /// Sub-configuration ticker (main ticker if not provided)
        #[clap(long)]
        sub_ticker: Option<String>,

        /// Decimals
        #[clap(long, default_value = "18")]
        decimals: u8,

        /// Chain id (EVM currencies)
        #[clap(long)]
        chain_id: Option<u64>,

        /// Packed derivation path (`count ‖ (u32 BE)*count`), defaults to m/44'/60'/0'/0/0
        #[clap(long, default_value = "058000002c8000003c800000000000000000000000")]
        packed_path: HexData,

        /// Sign with a random root, rejected by devices
        #[clap(long)]
        random_root: bool,

        /// Write configuration to JSON file
        #[clap(long)]
        output: Option<String>,
    },

    /// Build a signed trusted name descriptor and send it to the device
    TrustedName {
        /// Trusted name
        #[clap(long)]
        name: String,

        /// Hex encoded address
        #[clap(long)]
        address: HexData,

        /// Chain id
        #[clap(long, default_value = "1")]
        chain_id: u64,

        /// Challenge, fetched from the device when not provided
        #[clap(long)]
        challenge: Option<u32>,

        /// Build the descriptor without sending it
        #[clap(long)]
        offline: bool,
    },

    /// Start a transaction and register a fresh partner
    RegisterPartner {
        /// Partner name
        #[clap(long, default_value = "partner")]
        name: String,

        /// Exchange rate
        #[clap(long, default_value = "fixed")]
        rate: Rate,

        /// Exchange flow
        #[clap(long, default_value = "swap_ng")]
        subcommand: SubCommand,

        /// Sign partner credentials with a random root, rejected by devices
        #[clap(long)]
        random_root: bool,
    },

    /// Send a raw hex encoded command APDU
    Raw {
        /// Command APDU
        apdu: HexData,
    },
}

/// Credential output object
#[derive(Clone, PartialEq, Debug, Serialize)]
struct CredentialInfo {
    name: String,
    curve: String,
    public_key: String,
    credentials: String,
    credentials_ng: String,
}

/// Currency configuration output object
#[derive(Clone, PartialEq, Debug, Serialize)]
struct CurrencyInfo {
    ticker: String,
    conf: String,
    signature: String,
    packed_path: String,
    payload: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())?;

    let opts = TcpOptions {
        addr: args.addr,
        port: args.port,
        timeout: Duration::from_millis(args.timeout_ms),
    };

    debug!("Executing command: {:?}", args.cmd);

    match args.cmd {
        Actions::Credentials {
            name,
            curve,
            secret,
            output,
        } => {
            let a = match secret {
                Some(s) => SigningAuthority::from_secret(curve, &name, s.as_ref())?,
                None => SigningAuthority::create(curve, &name)?,
            };

            let i = CredentialInfo {
                name: a.name().to_string(),
                curve: a.curve().to_string(),
                public_key: hex::encode(a.public_key().to_uncompressed()),
                credentials: hex::encode(a.credentials()),
                credentials_ng: hex::encode(a.credentials_ng()),
            };

            info!("public key: {}", i.public_key);
            info!("credentials: {}", i.credentials);
            info!("credentials (ng): {}", i.credentials_ng);

            if let Some(o) = output {
                write_output(&o, &i).await?;
            }
        }
        Actions::Sign {
            payload,
            secret,
            curve,
        } => {
            let a = match secret {
                Some(s) => SigningAuthority::from_secret(curve, "signer", s.as_ref())?,
                None => TrustedRoot::test_key()?,
            };

            let s = a.sign(payload.as_ref());

            info!("signature: {}", hex::encode(s));
        }
        Actions::CurrencyConfig {
            ticker,
            application,
            sub_ticker,
            decimals,
            chain_id,
            packed_path,
            random_root,
            output,
        } => {
            let mut sub = SubConfig::new(sub_ticker.as_deref().unwrap_or(&ticker), decimals);
            if let Some(id) = chain_id {
                sub = sub.with_chain_id(id);
            }

            let c = CurrencyConfiguration::new(
                &ticker,
                &application,
                &sub.to_vec()?,
                packed_path.as_ref(),
            )?;

            let root = match random_root {
                true => Some(TrustedRoot::from_random_key()?),
                false => None,
            };
            let signature = c.sign(root.as_ref())?;
            let payload = exchange_pki::apdu::encode_vec(&AddressCheck::new(
                &c.conf,
                &signature,
                &c.packed_path,
            ))?;

            let i = CurrencyInfo {
                ticker: c.ticker.clone(),
                conf: hex::encode(&c.conf),
                signature: hex::encode(&signature),
                packed_path: hex::encode(&c.packed_path),
                payload: hex::encode(&payload),
            };

            info!("conf: {}", i.conf);
            info!("signature: {}", i.signature);
            info!("payload: {}", i.payload);

            if let Some(o) = output {
                write_output(&o, &i).await?;
            }
        }
        Actions::TrustedName {
            name,
            address,
            chain_id,
            challenge,
            offline,
        } => {
            let t = match offline {
                true => None,
                false => Some(connect(&opts).await?),
            };

            let challenge = match (challenge, &t) {
                (Some(c), _) => c,
                (None, Some(t)) => t.get_challenge().await?,
                (None, None) => return Err(anyhow::anyhow!("offline mode requires a challenge")),
            };

            let d = TrustedNameDescriptor::new(name.as_bytes(), address.as_ref(), chain_id, challenge);
            let root = TrustedRoot::test_key()?;
            let descriptor = d.with_signature(&root.sign(&d.signed_payload()))?;

            info!("descriptor: {}", hex::encode(&descriptor));

            if let Some(t) = t {
                t.send_trusted_name_descriptor(&descriptor).await?;
                info!("descriptor accepted");
            }
        }
        Actions::RegisterPartner {
            name,
            rate,
            subcommand,
            random_root,
        } => {
            let t = connect(&opts).await?.with_flow(rate, subcommand);

            let partner = SigningAuthority::create(subcommand.partner_curve(), &name)?;
            let root = match random_root {
                true => TrustedRoot::from_random_key()?,
                false => TrustedRoot::test_key()?,
            };

            let v = t.get_version().await?;
            info!("app version: {}", v);

            let id = t.init_transaction().await?;
            info!("transaction id: {}", hex::encode(&id));

            t.register_partner(&partner, &root).await?;
            info!("partner '{}' registered", partner.name());
        }
        Actions::Raw { apdu } => {
            let t = connect(&opts).await?;

            let r = t.exchange_raw(apdu.as_ref()).await?;

            info!("data: {}", hex::encode(&r.data));
            info!("status: {:#06x} ({:?})", r.status, r.status_word());
        }
    }

    Ok(())
}

/// Connect to the configured device
async fn connect(opts: &TcpOptions) -> anyhow::Result<ExchangeHandle<TcpTransport>> {
    debug!("Connecting to {}", opts.socket_addr());

    let t = connect_tcp(opts).await?;

    Ok(t)
}

/// Helper to write output files if `--output` argument is provided
async fn write_output(file_name: &str, value: &impl Serialize) -> anyhow::Result<()> {
    debug!("Writing output to '{}'", file_name);

    // Determine format from file name
    let p = Path::new(file_name);
    match p.extension().and_then(|e| e.to_str()) {
        // Encode to JSON for `.json` files
        Some("json") => {
            let s = serde_json::to_string_pretty(value)?;
            tokio::fs::write(p, s).await?;
        }
        _ => return Err(anyhow::anyhow!("unsupported output file format")),
    }

    Ok(())
}
