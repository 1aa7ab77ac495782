// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::str::FromStr;

use log::LevelFilter;
use simplelog::SimpleLogger;

use exchange_pki::TcpTransport;
use exchange_pki_tests::mock::MockDevice;

/// Setup logging and a mock device with a connected transport
pub async fn setup() -> anyhow::Result<(MockDevice, TcpTransport)> {
    // Setup logging
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());

    // Start device and connect
    let d = MockDevice::spawn().await?;
    let t = d.connect().await?;

    Ok((d, t))
}
