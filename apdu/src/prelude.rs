//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    command::{build_command, Command, Response},
    credential::{Credential, CredentialNg},
    currency::{
        decode_sub_config, encode_currency_config, encode_sub_config, CurrencyConfig, FeesAsset,
        SubConfig,
    },
    partner::{
        AddressCheck, ChallengeResp, CheckPartnerReq, CheckPayoutAddressReq, CheckRefundAddressReq,
        GetChallengeReq, GetVersionReq, SetPartnerKeyReq, StartNewTransactionReq, TrustedNameReq,
        VersionResp,
    },
    status::StatusWord,
    tlv::{der_decode, der_encode, format_tlv, FieldTag, Tlv, TlvReader, TlvValue},
    trusted_name::{SignerKeyId, TrustedNameDescriptor, TrustedNameInfo},
    ApduError, ApduStatic, Curve, Instruction, Rate, SubCommand,
};
