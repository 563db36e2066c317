//! Multikey public keys and their `did:key` verification methods.

use alloc::string::String;
use alloc::vec::Vec;

use lazy_static::lazy_static;

use common_crypto::bbs_crypto::BBS_PUBLIC_KEY_LEN;
use common_crypto::ecdsa::P256_PUBLIC_KEY_LEN;
use common_types::log_error;
use common_types::ProofError;

use crate::decode_multibase_base58btc;
use crate::multibase_base58btc;
use crate::Cryptosuite;

pub const P256_PUB_CODEC: u64 = 0x1200;
pub const BLS12_381_G2_PUB_CODEC: u64 = 0xeb;
pub const P256_PRIV_CODEC: u64 = 0x1306;

/// Length of a compressed P-256 key with its multicodec prefix.
pub const P256_MULTIKEY_LEN: usize = 2 + P256_PUBLIC_KEY_LEN;

lazy_static! {
    pub static ref P256_CODEC_PREFIX: Vec<u8> =
        unsigned_varint::encode::u64(P256_PUB_CODEC, &mut [0u8; 10]).to_vec();
    pub static ref BLS12_381_G2_CODEC_PREFIX: Vec<u8> =
        unsigned_varint::encode::u64(BLS12_381_G2_PUB_CODEC, &mut [0u8; 10]).to_vec();
    pub static ref P256_PRIV_CODEC_PREFIX: Vec<u8> =
        unsigned_varint::encode::u64(P256_PRIV_CODEC, &mut [0u8; 10]).to_vec();
}

fn codec_prefix(suite: Cryptosuite) -> &'static [u8] {
    match suite {
        Cryptosuite::EcdsaSd2023 => P256_CODEC_PREFIX.as_slice(),
        Cryptosuite::Bbs2023 => BLS12_381_G2_CODEC_PREFIX.as_slice(),
    }
}

fn key_len(suite: Cryptosuite) -> usize {
    match suite {
        Cryptosuite::EcdsaSd2023 => P256_PUBLIC_KEY_LEN,
        Cryptosuite::Bbs2023 => BBS_PUBLIC_KEY_LEN,
    }
}

/// Prefixes `key` with the multicodec of the suite's key type.
pub fn prefixed_public_key(suite: Cryptosuite, key: &[u8]) -> Vec<u8> {
    [codec_prefix(suite), key].concat()
}

pub fn encode_public_key_multibase(suite: Cryptosuite, key: &[u8]) -> Result<String, ProofError> {
    multibase_base58btc(&prefixed_public_key(suite, key))
}

/// `did:key:<mb>#<mb>` for a raw public key.
pub fn did_key_verification_method(suite: Cryptosuite, key: &[u8]) -> Result<String, ProofError> {
    let multibase = encode_public_key_multibase(suite, key)?;
    Ok(format!("did:key:{multibase}#{multibase}"))
}

/// Strips and checks the multicodec prefix of a decoded multikey.
pub fn strip_codec_prefix(
    suite: Cryptosuite,
    prefixed: &[u8],
    err: fn(String) -> ProofError,
) -> Result<Vec<u8>, ProofError> {
    let key = prefixed
        .strip_prefix(codec_prefix(suite))
        .ok_or_else(|| log_error!(err(format!("key is not a {suite} multikey"))))?;
    if key.len() != key_len(suite) {
        return Err(log_error!(err(format!(
            "{suite} public key must be {} bytes, found {}",
            key_len(suite),
            key.len()
        ))));
    }
    Ok(key.to_vec())
}

/// The raw public key named by a `did:key:` verification method, checked against the suite.
pub fn public_key_from_verification_method(
    verification_method: &str,
    suite: Cryptosuite,
) -> Result<Vec<u8>, ProofError> {
    let encoded = verification_method
        .strip_prefix("did:key:")
        .ok_or_else(|| {
            log_error!(ProofError::MalformedInput(format!(
                "unsupported verification method {verification_method}"
            )))
        })?;
    let encoded = match encoded.split_once('#') {
        Some((key, _fragment)) => key,
        None => encoded,
    };
    let bytes = decode_multibase_base58btc(encoded)?;
    strip_codec_prefix(suite, &bytes, ProofError::MalformedInput)
}
