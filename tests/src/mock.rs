// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Mock exchange device
//!
//! Speaks the speculos APDU framing over TCP and implements the partner
//! credential, currency configuration and trusted name checks of a
//! test-mode device, verifying signatures against the embedded test root.

use std::net::{Ipv4Addr, SocketAddr};

use encdec::Decode;
use log::{debug, warn};
use rand::Rng;
use tokio::{io::AsyncWriteExt, net::TcpListener, net::TcpStream, task::JoinHandle};

use exchange_pki::{
    transport::{read_exact_or_closed, FRAME_HEADER_LEN},
    Error, PublicKey, TcpOptions, TcpTransport, TrustedRoot,
};
use exchange_pki_apdu::{
    command::Command,
    credential::{Credential, CredentialNg},
    currency::CurrencyConfig,
    encode_vec,
    partner::{AddressCheck, ChallengeResp, VersionResp},
    status::StatusWord,
    trusted_name::{
        SignerKeyId, TrustedNameInfo, TrustedNameSource, TrustedNameType,
        SIGNER_ALGO_ECDSA_SHA256, TRUSTED_NAME_MAX_LEN, TRUSTED_NAME_VERSION,
    },
    ApduError, Instruction, Rate, SubCommand, EXCHANGE_CLA, MAX_APDU_DATA,
};

/// Largest accepted request frame, a short APDU header plus maximum data
pub const MAX_REQUEST_LEN: usize = 5 + MAX_APDU_DATA;

/// Mock device configuration
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Version reported by the device
    pub version: VersionResp,
    /// Trust anchor for partner credentials, currency configurations and trusted names
    pub root: PublicKey,
    /// Use a fixed challenge, as test-mode firmware does
    pub fixed_challenge: Option<u32>,
}

impl MockConfig {
    /// Configuration matching a test-mode device
    pub fn test_mode() -> Result<Self, Error> {
        Ok(Self {
            version: VersionResp {
                major: 4,
                minor: 0,
                patch: 0,
            },
            root: TrustedRoot::test_public_key()?,
            fixed_challenge: None,
        })
    }
}

/// Device transaction state
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum State {
    #[default]
    Idle,
    Started,
    PartnerKeySet,
    PartnerChecked,
}

/// Mock device state machine, one instance per connection
#[derive(Debug)]
pub struct MockState {
    cfg: MockConfig,
    state: State,
    subcommand: SubCommand,
    credentials: Vec<u8>,
    challenge: u32,
}

impl MockState {
    pub fn new(cfg: MockConfig) -> Self {
        let challenge = cfg.fixed_challenge.unwrap_or_else(rand::random);

        Self {
            cfg,
            state: State::Idle,
            subcommand: SubCommand::default(),
            credentials: vec![],
            challenge,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Handle a command APDU, returning response data and status
    pub fn handle(&mut self, buff: &[u8]) -> (Vec<u8>, StatusWord) {
        match self.dispatch(buff) {
            Ok(d) => (d, StatusWord::Success),
            Err(sw) => (vec![], sw),
        }
    }

    fn dispatch(&mut self, buff: &[u8]) -> Result<Vec<u8>, StatusWord> {
        let (c, n) = Command::decode(buff).map_err(|_| StatusWord::IncorrectCommandData)?;
        if n != buff.len() {
            return Err(StatusWord::IncorrectCommandData);
        }

        if c.cla != EXCHANGE_CLA {
            return Err(StatusWord::ClassNotSupported);
        }

        let ins = Instruction::try_from(c.ins).map_err(|_| StatusWord::InvalidInstruction)?;

        debug!(
            "mock: {} (p1: {:#04x}, p2: {:#04x}, state: {:?})",
            ins, c.p1, c.p2, self.state
        );

        match ins {
            Instruction::GetVersion => Ok(encode(&self.cfg.version)),
            Instruction::StartNewTransaction => self.start(c.p1, c.p2),
            Instruction::SetPartnerKey => self.set_partner_key(c.p2, c.data),
            Instruction::CheckPartner => self.check_partner(c.p2, c.data),
            Instruction::CheckPayoutAddress | Instruction::CheckRefundAddress => {
                self.check_address(c.p2, c.data)
            }
            Instruction::GetChallenge => Ok(encode(&ChallengeResp {
                challenge: self.challenge,
            })),
            Instruction::SendTrustedNameDescriptor => self.trusted_name(c.data),
            _ => Err(StatusWord::InvalidInstruction),
        }
    }

    fn start(&mut self, p1: u8, p2: u8) -> Result<Vec<u8>, StatusWord> {
        Rate::try_from(p1).map_err(|_| StatusWord::IncorrectCommandData)?;
        let subcommand = SubCommand::try_from(p2).map_err(|_| StatusWord::WrongP2)?;

        self.state = State::Started;
        self.subcommand = subcommand;
        self.credentials.clear();

        // Legacy swaps use a short printable id, other flows a random nonce
        let mut rng = rand::thread_rng();
        let id: Vec<u8> = match subcommand {
            SubCommand::Swap => (0..10).map(|_| rng.gen_range(b'A'..=b'Z')).collect(),
            _ => rng.gen::<[u8; 32]>().to_vec(),
        };

        Ok(id)
    }

    /// Check the transaction state and flow
    fn check_flow(&self, p2: u8, expected: State) -> Result<(), StatusWord> {
        if self.state != expected {
            return Err(StatusWord::InvalidInstruction);
        }
        if p2 != self.subcommand as u8 {
            return Err(StatusWord::WrongP2);
        }
        Ok(())
    }

    fn set_partner_key(&mut self, p2: u8, data: &[u8]) -> Result<Vec<u8>, StatusWord> {
        self.check_flow(p2, State::Started)?;

        let (curve, point, n) = match self.subcommand.is_ng() {
            true => {
                let (c, n) =
                    CredentialNg::decode(data).map_err(|_| StatusWord::IncorrectCommandData)?;
                (c.curve, c.public_key, n)
            }
            false => {
                let (c, n) =
                    Credential::decode(data).map_err(|_| StatusWord::IncorrectCommandData)?;
                (self.subcommand.partner_curve(), c.public_key, n)
            }
        };
        if n != data.len() {
            return Err(StatusWord::IncorrectCommandData);
        }

        PublicKey::from_sec1_bytes(curve, point).map_err(|_| StatusWord::IncorrectCommandData)?;

        self.credentials = data.to_vec();
        self.state = State::PartnerKeySet;

        Ok(vec![])
    }

    fn check_partner(&mut self, p2: u8, signature: &[u8]) -> Result<Vec<u8>, StatusWord> {
        self.check_flow(p2, State::PartnerKeySet)?;

        if let Err(e) = self.cfg.root.verify(&self.credentials, signature) {
            warn!("mock: partner credential rejected: {}", e);
            return Err(StatusWord::SignVerificationFail);
        }

        self.state = State::PartnerChecked;

        Ok(vec![])
    }

    fn check_address(&mut self, p2: u8, data: &[u8]) -> Result<Vec<u8>, StatusWord> {
        self.check_flow(p2, State::PartnerChecked)?;

        let (c, n) = AddressCheck::decode(data).map_err(|_| StatusWord::IncorrectCommandData)?;
        if n != data.len() {
            return Err(StatusWord::IncorrectCommandData);
        }

        CurrencyConfig::parse(c.conf).map_err(|_| StatusWord::IncorrectCommandData)?;

        if let Err(e) = self.cfg.root.verify(c.conf, c.signature) {
            warn!("mock: currency configuration rejected: {}", e);
            return Err(StatusWord::SignVerificationFail);
        }

        Ok(vec![])
    }

    /// Check a trusted name descriptor, the challenge is rolled after every attempt
    fn trusted_name(&mut self, data: &[u8]) -> Result<Vec<u8>, StatusWord> {
        let r = self.verify_descriptor(data);

        self.challenge = self.cfg.fixed_challenge.unwrap_or_else(rand::random);

        match r {
            Ok(_) => Ok(vec![]),
            Err(e) => {
                warn!("mock: trusted name rejected: {}", e);
                Err(StatusWord::InternalError)
            }
        }
    }

    fn verify_descriptor(&self, data: &[u8]) -> anyhow::Result<()> {
        let i = TrustedNameInfo::parse(data)?;

        if i.version != TRUSTED_NAME_VERSION {
            anyhow::bail!("unsupported version: {}", i.version);
        }
        if i.name_type != TrustedNameType::ContextAddress as u8 {
            anyhow::bail!("unsupported name type: {}", i.name_type);
        }
        if i.name_source != TrustedNameSource::DynamicResolver as u8 {
            anyhow::bail!("unsupported name source: {}", i.name_source);
        }
        if i.trusted_name.len() > TRUSTED_NAME_MAX_LEN || i.address.len() > TRUSTED_NAME_MAX_LEN {
            anyhow::bail!("name or address too long");
        }
        if i.challenge != Some(self.challenge) {
            anyhow::bail!("challenge mismatch: {:x?}", i.challenge);
        }
        if i.key_id != SignerKeyId::Test as u8 {
            anyhow::bail!("unknown key id: {}", i.key_id);
        }
        if i.algo != SIGNER_ALGO_ECDSA_SHA256 {
            anyhow::bail!("unsupported algorithm: {}", i.algo);
        }

        self.cfg.root.verify(i.signed, i.signature)?;

        Ok(())
    }
}

/// Encode a response object, objects used here always fit a response
fn encode<E: encdec::Encode<Error = ApduError>>(e: &E) -> Vec<u8> {
    encode_vec(e).unwrap_or_default()
}

/// Mock device listening on a local TCP port
pub struct MockDevice {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockDevice {
    /// Start a test-mode mock device
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(MockConfig::test_mode()?).await
    }

    /// Start a mock device with the provided configuration
    pub async fn spawn_with(cfg: MockConfig) -> anyhow::Result<Self> {
        let l = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)).await?;
        let addr = l.local_addr()?;

        debug!("mock: listening on {}", addr);

        let task = tokio::spawn(async move {
            while let Ok((s, peer)) = l.accept().await {
                debug!("mock: connection from {}", peer);

                let cfg = cfg.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve(s, MockState::new(cfg)).await {
                        warn!("mock: connection error: {}", e);
                    }
                });
            }
        });

        Ok(Self { addr, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connection options for this device
    pub fn tcp_options(&self) -> TcpOptions {
        TcpOptions {
            addr: self.addr.ip(),
            port: self.addr.port(),
            ..Default::default()
        }
    }

    /// Connect a new transport to this device
    pub async fn connect(&self) -> Result<TcpTransport, Error> {
        TcpTransport::connect(&self.tcp_options()).await
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve framed requests until the peer disconnects
async fn serve(mut s: TcpStream, mut state: MockState) -> Result<(), Error> {
    loop {
        let h = match read_exact_or_closed(&mut s, FRAME_HEADER_LEN).await {
            Ok(h) => h,
            Err(Error::ConnectionClosed { received: 0, .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        let n = u32::from_be_bytes([h[0], h[1], h[2], h[3]]) as usize;

        // Drop connections announcing oversized requests
        if n > MAX_REQUEST_LEN {
            return Err(Error::UnexpectedResponse);
        }

        let cmd = read_exact_or_closed(&mut s, n).await?;
        let (data, sw) = state.handle(&cmd);

        let mut resp = Vec::with_capacity(FRAME_HEADER_LEN + data.len() + 2);
        resp.extend_from_slice(&(data.len() as u32).to_be_bytes());
        resp.extend_from_slice(&data);
        resp.extend_from_slice(&sw.to_bytes());

        s.write_all(&resp).await?;
    }
}

#[cfg(test)]
mod test {
    use exchange_pki::SigningAuthority;
    use exchange_pki_apdu::{
        command::build_command,
        partner::{GetChallengeReq, SetPartnerKeyReq, StartNewTransactionReq, TrustedNameReq},
        Curve,
    };
    use tokio::io::AsyncReadExt;

    use super::*;

    fn mock() -> MockState {
        MockState::new(MockConfig::test_mode().unwrap())
    }

    #[test]
    fn rejects_unknown_commands() {
        let mut m = mock();

        assert_eq!(
            m.handle(&[0xb0, 0x02, 0x00, 0x00, 0x00]).1,
            StatusWord::ClassNotSupported
        );
        assert_eq!(
            m.handle(&[EXCHANGE_CLA, 0x7f, 0x00, 0x00, 0x00]).1,
            StatusWord::InvalidInstruction
        );
        assert_eq!(
            m.handle(&[EXCHANGE_CLA, 0x02, 0x00]).1,
            StatusWord::IncorrectCommandData
        );

        // Transaction processing is not modelled
        for ins in [
            Instruction::ProcessTransactionResponse,
            Instruction::CheckTransactionSignature,
        ] {
            assert_eq!(
                m.handle(&[EXCHANGE_CLA, ins as u8, 0x00, 0x00, 0x00]).1,
                StatusWord::InvalidInstruction
            );
        }
    }

    #[test]
    fn partner_key_requires_transaction() {
        let mut m = mock();
        let p = SigningAuthority::create(Curve::Secp256k1, "p").unwrap();

        let c = build_command(&SetPartnerKeyReq::new(p.credentials()), 0, 0).unwrap();
        assert_eq!(m.handle(&c).1, StatusWord::InvalidInstruction);

        let s = build_command(&StartNewTransactionReq, 0, 0).unwrap();
        let (id, sw) = m.handle(&s);
        assert_eq!(sw, StatusWord::Success);
        assert_eq!(id.len(), 10);
        assert_eq!(m.state(), State::Started);

        // Flow must match the started transaction
        let c_ng = build_command(&SetPartnerKeyReq::new(p.credentials()), 0, 3).unwrap();
        assert_eq!(m.handle(&c_ng).1, StatusWord::WrongP2);

        assert_eq!(m.handle(&c).1, StatusWord::Success);
        assert_eq!(m.state(), State::PartnerKeySet);
    }

    #[test]
    fn fixed_challenge() {
        let mut cfg = MockConfig::test_mode().unwrap();
        cfg.fixed_challenge = Some(0xdeadbeef);
        let mut m = MockState::new(cfg);

        let c = build_command(&GetChallengeReq, 0, 0).unwrap();
        let (d, sw) = m.handle(&c);
        assert_eq!(sw, StatusWord::Success);
        assert_eq!(d, [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn malformed_descriptor() {
        let mut cfg = MockConfig::test_mode().unwrap();
        cfg.fixed_challenge = Some(0xdeadbeef);
        let mut m = MockState::new(cfg);

        // Length field overflowing the descriptor
        let d = [0x22, 0x88, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00];
        let c = build_command(&TrustedNameReq::new(&d), 0, 0).unwrap();
        assert_eq!(m.handle(&c).1, StatusWord::InternalError);

        // Device keeps serving
        let c = build_command(&GetChallengeReq, 0, 0).unwrap();
        assert_eq!(m.handle(&c).1, StatusWord::Success);
    }

    #[tokio::test]
    async fn oversized_request_closes_connection() {
        let d = MockDevice::spawn().await.unwrap();
        let mut s = TcpStream::connect(d.addr()).await.unwrap();

        s.write_all(&[0xff, 0xff, 0xff, 0xff]).await.unwrap();

        let mut b = [0u8; 8];
        let n = s.read(&mut b).await.unwrap();
        assert_eq!(n, 0);

        // Other connections are unaffected
        let mut t = d.connect().await.unwrap();
        let c = build_command(&GetChallengeReq, 0, 0).unwrap();
        let r = exchange_pki::Exchange::exchange(&mut t, &c, std::time::Duration::from_secs(1))
            .await
            .unwrap();
        assert!(r.is_success());
    }
}
