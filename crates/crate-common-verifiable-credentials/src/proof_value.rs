//! `proofValue` encoding: `u` + base64url-no-pad of a 3-byte header tag followed by a CBOR array.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use base64::prelude::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde_bytes::ByteBuf;
use serde_bytes::Bytes;

use common_crypto::bbs_crypto::BBS_PUBLIC_KEY_LEN;
use common_crypto::bbs_crypto::BBS_SIGNATURE_LEN;
use common_crypto::ecdsa::P256_SIGNATURE_LEN;
use common_crypto::SHA256_LEN;
use common_types::cbor::to_vec_with_prefix;
use common_types::log_error;
use common_types::ProofError;

use crate::json_pointer::JsonPointerBuf;
use crate::multikey::P256_MULTIKEY_LEN;
use crate::Cryptosuite;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofHeader {
    EcdsaSdBase,
    EcdsaSdDerived,
    BbsBase,
    BbsDerived,
}

impl ProofHeader {
    pub const fn tag(self) -> [u8; 3] {
        match self {
            ProofHeader::EcdsaSdBase => [0xd9, 0x5d, 0x00],
            ProofHeader::EcdsaSdDerived => [0xd9, 0x5d, 0x01],
            ProofHeader::BbsBase => [0xd9, 0x5d, 0x02],
            ProofHeader::BbsDerived => [0xd9, 0x5d, 0x03],
        }
    }

    pub fn from_tag(tag: &[u8]) -> Result<Self, ProofError> {
        match tag {
            [0xd9, 0x5d, 0x00] => Ok(ProofHeader::EcdsaSdBase),
            [0xd9, 0x5d, 0x01] => Ok(ProofHeader::EcdsaSdDerived),
            [0xd9, 0x5d, 0x02] => Ok(ProofHeader::BbsBase),
            [0xd9, 0x5d, 0x03] => Ok(ProofHeader::BbsDerived),
            _ => Err(log_error!(ProofError::InvalidProofEncoding(format!(
                "unknown proof header {tag:02x?}"
            )))),
        }
    }

    pub fn is_base(self) -> bool {
        matches!(self, ProofHeader::EcdsaSdBase | ProofHeader::BbsBase)
    }

    pub fn cryptosuite(self) -> Cryptosuite {
        match self {
            ProofHeader::EcdsaSdBase | ProofHeader::EcdsaSdDerived => Cryptosuite::EcdsaSd2023,
            ProofHeader::BbsBase | ProofHeader::BbsDerived => Cryptosuite::Bbs2023,
        }
    }
}

fn decode_multibase(proof_value: &str) -> Result<Vec<u8>, ProofError> {
    let encoded = proof_value.strip_prefix('u').ok_or_else(|| {
        log_error!(ProofError::InvalidProofEncoding(
            "proofValue is not multibase base64url".into()
        ))
    })?;
    BASE64_URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        log_error!(ProofError::InvalidProofEncoding(format!(
            "could not decode proofValue - {e}"
        )))
    })
}

fn encode_multibase(bytes: &[u8]) -> String {
    let mut multi = String::with_capacity(1 + bytes.len() * 4 / 3 + 1);
    multi.push('u');
    BASE64_URL_SAFE_NO_PAD.encode_string(bytes, &mut multi);
    multi
}

fn decode_header(proof_value: &str) -> Result<(ProofHeader, Vec<u8>), ProofError> {
    let bytes = decode_multibase(proof_value)?;
    if bytes.len() < 3 {
        return Err(log_error!(ProofError::InvalidProofEncoding(
            "proofValue is shorter than its header".into()
        )));
    }
    Ok((ProofHeader::from_tag(&bytes[..3])?, bytes))
}

/// Reads only the header of a `proofValue`: `true` for a base proof, `false` for a derived one.
pub fn is_base(proof_value: &str) -> Result<bool, ProofError> {
    decode_header(proof_value).map(|(header, _)| header.is_base())
}

pub fn proof_header(proof_value: &str) -> Result<ProofHeader, ProofError> {
    decode_header(proof_value).map(|(header, _)| header)
}

fn decode_components<T: DeserializeOwned>(
    proof_value: &str,
    expected: ProofHeader,
) -> Result<T, ProofError> {
    let (header, bytes) = decode_header(proof_value)?;
    if header != expected {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "expected a {expected:?} proof, found {header:?}"
        ))));
    }
    serde_cbor::from_slice(&bytes[3..]).map_err(|e| {
        log_error!(ProofError::InvalidProofEncoding(format!(
            "could not decode {expected:?} components - {e}"
        )))
    })
}

fn encode_components<S: serde::Serialize>(
    header: ProofHeader,
    components: &S,
) -> Result<String, ProofError> {
    let bytes = to_vec_with_prefix(&header.tag(), components)?;
    Ok(encode_multibase(&bytes))
}

fn check_len(what: &str, bytes: &[u8], len: usize) -> Result<(), ProofError> {
    if bytes.len() != len {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "{what} must be {len} bytes, found {}",
            bytes.len()
        ))));
    }
    Ok(())
}

fn parse_mandatory_pointers(pointers: Vec<String>) -> Result<Vec<JsonPointerBuf>, ProofError> {
    pointers
        .into_iter()
        .map(|p| {
            JsonPointerBuf::new(p).map_err(|e| {
                log_error!(ProofError::InvalidProofEncoding(format!(
                    "bad mandatory pointer - {e}"
                )))
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EcdsaSdBaseProof {
    pub base_signature: Vec<u8>,
    /// Multikey prefixed ephemeral public key.
    pub public_key: Vec<u8>,
    pub hmac_key: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
    pub mandatory_pointers: Vec<JsonPointerBuf>,
}

impl EcdsaSdBaseProof {
    pub fn to_proof_value(&self) -> Result<String, ProofError> {
        let signatures: Vec<&Bytes> = self.signatures.iter().map(|s| Bytes::new(s)).collect();
        encode_components(
            ProofHeader::EcdsaSdBase,
            &(
                Bytes::new(&self.base_signature),
                Bytes::new(&self.public_key),
                Bytes::new(&self.hmac_key),
                signatures,
                &self.mandatory_pointers,
            ),
        )
    }

    pub fn from_proof_value(s: &str) -> Result<Self, ProofError> {
        let (base_signature, public_key, hmac_key, signatures, mandatory_pointers): (
            ByteBuf,
            ByteBuf,
            ByteBuf,
            Vec<ByteBuf>,
            Vec<String>,
        ) = decode_components(s, ProofHeader::EcdsaSdBase)?;
        check_len("ephemeral public key", &public_key, P256_MULTIKEY_LEN)?;
        check_len("HMAC key", &hmac_key, SHA256_LEN)?;
        Ok(Self {
            base_signature: base_signature.into_vec(),
            public_key: public_key.into_vec(),
            hmac_key: hmac_key.into_vec(),
            signatures: signatures.into_iter().map(ByteBuf::into_vec).collect(),
            mandatory_pointers: parse_mandatory_pointers(mandatory_pointers)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EcdsaSdDerivedProof {
    pub base_signature: Vec<u8>,
    pub public_key: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
    /// `c14nN` number to the raw HMAC digest used as that node's label.
    pub label_map: BTreeMap<usize, Vec<u8>>,
    pub mandatory_indexes: Vec<usize>,
}

impl EcdsaSdDerivedProof {
    pub fn to_proof_value(&self) -> Result<String, ProofError> {
        let signatures: Vec<&Bytes> = self.signatures.iter().map(|s| Bytes::new(s)).collect();
        let label_map: BTreeMap<usize, &Bytes> = self
            .label_map
            .iter()
            .map(|(k, v)| (*k, Bytes::new(v)))
            .collect();
        encode_components(
            ProofHeader::EcdsaSdDerived,
            &(
                Bytes::new(&self.base_signature),
                Bytes::new(&self.public_key),
                signatures,
                label_map,
                &self.mandatory_indexes,
            ),
        )
    }

    /// Decodes and checks every length before any signature work is done.
    pub fn from_proof_value(s: &str) -> Result<Self, ProofError> {
        let (base_signature, public_key, signatures, label_map, mandatory_indexes): (
            ByteBuf,
            ByteBuf,
            Vec<ByteBuf>,
            BTreeMap<usize, ByteBuf>,
            Vec<usize>,
        ) = decode_components(s, ProofHeader::EcdsaSdDerived)?;
        check_len("base signature", &base_signature, P256_SIGNATURE_LEN)?;
        check_len("ephemeral public key", &public_key, P256_MULTIKEY_LEN)?;
        for signature in &signatures {
            check_len("statement signature", signature, P256_SIGNATURE_LEN)?;
        }
        for value in label_map.values() {
            check_len("label map value", value, SHA256_LEN)?;
        }
        Ok(Self {
            base_signature: base_signature.into_vec(),
            public_key: public_key.into_vec(),
            signatures: signatures.into_iter().map(ByteBuf::into_vec).collect(),
            label_map: label_map
                .into_iter()
                .map(|(k, v)| (k, v.into_vec()))
                .collect(),
            mandatory_indexes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BbsBaseProof {
    pub signature: Vec<u8>,
    /// proofHash followed by mandatoryHash.
    pub header: Vec<u8>,
    pub public_key: Vec<u8>,
    pub hmac_key: Vec<u8>,
    pub mandatory_pointers: Vec<JsonPointerBuf>,
}

impl BbsBaseProof {
    pub fn to_proof_value(&self) -> Result<String, ProofError> {
        encode_components(
            ProofHeader::BbsBase,
            &(
                Bytes::new(&self.signature),
                Bytes::new(&self.header),
                Bytes::new(&self.public_key),
                Bytes::new(&self.hmac_key),
                &self.mandatory_pointers,
            ),
        )
    }

    pub fn from_proof_value(s: &str) -> Result<Self, ProofError> {
        let (signature, header, public_key, hmac_key, mandatory_pointers): (
            ByteBuf,
            ByteBuf,
            ByteBuf,
            ByteBuf,
            Vec<String>,
        ) = decode_components(s, ProofHeader::BbsBase)?;
        check_len("BBS signature", &signature, BBS_SIGNATURE_LEN)?;
        check_len("BBS header", &header, 2 * SHA256_LEN)?;
        check_len("BBS public key", &public_key, BBS_PUBLIC_KEY_LEN)?;
        check_len("HMAC key", &hmac_key, SHA256_LEN)?;
        Ok(Self {
            signature: signature.into_vec(),
            header: header.into_vec(),
            public_key: public_key.into_vec(),
            hmac_key: hmac_key.into_vec(),
            mandatory_pointers: parse_mandatory_pointers(mandatory_pointers)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BbsDerivedProof {
    pub proof: Vec<u8>,
    /// `c14nN` number to `bM` number.
    pub label_map: BTreeMap<usize, usize>,
    pub mandatory_indexes: Vec<usize>,
    pub selective_indexes: Vec<usize>,
    pub presentation_header: Vec<u8>,
}

impl BbsDerivedProof {
    pub fn to_proof_value(&self) -> Result<String, ProofError> {
        encode_components(
            ProofHeader::BbsDerived,
            &(
                Bytes::new(&self.proof),
                &self.label_map,
                &self.mandatory_indexes,
                &self.selective_indexes,
                Bytes::new(&self.presentation_header),
            ),
        )
    }

    pub fn from_proof_value(s: &str) -> Result<Self, ProofError> {
        let (proof, label_map, mandatory_indexes, selective_indexes, presentation_header): (
            ByteBuf,
            BTreeMap<usize, usize>,
            Vec<usize>,
            Vec<usize>,
            ByteBuf,
        ) = decode_components(s, ProofHeader::BbsDerived)?;
        Ok(Self {
            proof: proof.into_vec(),
            label_map,
            mandatory_indexes,
            selective_indexes,
            presentation_header: presentation_header.into_vec(),
        })
    }
}
