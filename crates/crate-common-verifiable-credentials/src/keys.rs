//! Issuer key material and the service configuration built from it.
//!
//! Keys are read from the two JSON files an issuer deployment keeps:
//! `{"publicKeyMultibase", "privateKeyMultibase"}` for the P-256 key and
//! `{"publicKeyHex", "privateKeyHex"}` for the BBS key.

use alloc::string::String;
use std::path::Path;

use log::info;
use serde::Deserialize;
use serde::Serialize;

use common_crypto::ecdsa::P256KeyPair;
use common_types::decode_hex;
use common_types::log_error;
use common_types::ProofError;

use crate::bbs::BbsKeyPair;
use crate::decode_multibase_base58btc;
use crate::multibase_base58btc;
use crate::multikey::encode_public_key_multibase;
use crate::multikey::strip_codec_prefix;
use crate::multikey::P256_PRIV_CODEC_PREFIX;
use crate::Cryptosuite;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SdKeyMaterialFile {
    pub public_key_multibase: String,
    pub private_key_multibase: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BbsKeyMaterialFile {
    pub public_key_hex: String,
    pub private_key_hex: String,
}

fn key_material_error(what: &str, e: impl core::fmt::Display) -> ProofError {
    log_error!(ProofError::KeyMaterial(format!("{what}: {e}")))
}

fn read_file(path: &Path) -> Result<String, ProofError> {
    std::fs::read_to_string(path)
        .map_err(|e| key_material_error(&format!("could not read {}", path.display()), e))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The issuer's long-term keys for both suites.
#[derive(Clone)]
pub struct IssuerKeyMaterial {
    pub ecdsa: P256KeyPair,
    pub bbs: BbsKeyPair,
}

impl IssuerKeyMaterial {
    pub fn generate() -> Self {
        Self {
            ecdsa: P256KeyPair::generate(),
            bbs: BbsKeyPair::generate(),
        }
    }

    /// Parses both key files. A public key that does not belong to its private key is rejected.
    pub fn from_strs(sd_json: &str, bbs_json: &str) -> Result<Self, ProofError> {
        let sd: SdKeyMaterialFile = serde_json::from_str(sd_json)
            .map_err(|e| key_material_error("bad SD key material", e))?;
        let bbs: BbsKeyMaterialFile = serde_json::from_str(bbs_json)
            .map_err(|e| key_material_error("bad BBS key material", e))?;
        Ok(Self {
            ecdsa: ecdsa_key_pair(&sd)?,
            bbs: bbs_key_pair(&bbs)?,
        })
    }

    pub fn from_files(sd_path: &Path, bbs_path: &Path) -> Result<Self, ProofError> {
        Self::from_strs(&read_file(sd_path)?, &read_file(bbs_path)?)
    }

    pub fn sd_key_material(&self) -> Result<SdKeyMaterialFile, ProofError> {
        let private = [
            P256_PRIV_CODEC_PREFIX.as_slice(),
            &self.ecdsa.secret_bytes(),
        ]
        .concat();
        Ok(SdKeyMaterialFile {
            public_key_multibase: encode_public_key_multibase(
                Cryptosuite::EcdsaSd2023,
                &self.ecdsa.public_key(),
            )?,
            private_key_multibase: multibase_base58btc(&private)?,
        })
    }

    pub fn bbs_key_material(&self) -> BbsKeyMaterialFile {
        BbsKeyMaterialFile {
            public_key_hex: to_hex(&self.bbs.public_key()),
            private_key_hex: to_hex(&self.bbs.secret_bytes()),
        }
    }
}

fn ecdsa_key_pair(file: &SdKeyMaterialFile) -> Result<P256KeyPair, ProofError> {
    let private = decode_multibase_base58btc(&file.private_key_multibase)
        .map_err(|e| key_material_error("bad privateKeyMultibase", e))?;
    let secret = private
        .strip_prefix(P256_PRIV_CODEC_PREFIX.as_slice())
        .ok_or_else(|| {
            log_error!(ProofError::KeyMaterial(
                "privateKeyMultibase is not a P-256 private key".into()
            ))
        })?;
    let key_pair = P256KeyPair::from_secret_bytes(secret)?;

    let public = decode_multibase_base58btc(&file.public_key_multibase)
        .map_err(|e| key_material_error("bad publicKeyMultibase", e))?;
    let public = strip_codec_prefix(Cryptosuite::EcdsaSd2023, &public, ProofError::KeyMaterial)?;
    if public != key_pair.public_key() {
        return Err(log_error!(ProofError::KeyMaterial(
            "publicKeyMultibase does not match privateKeyMultibase".into()
        )));
    }
    Ok(key_pair)
}

fn bbs_key_pair(file: &BbsKeyMaterialFile) -> Result<BbsKeyPair, ProofError> {
    let secret = decode_hex(&file.private_key_hex)
        .map_err(|e| key_material_error("bad privateKeyHex", e))?;
    let key_pair = BbsKeyPair::from_secret_bytes(&secret)?;
    let public = decode_hex(&file.public_key_hex)
        .map_err(|e| key_material_error("bad publicKeyHex", e))?;
    if public != key_pair.public_key() {
        return Err(log_error!(ProofError::KeyMaterial(
            "publicKeyHex does not match privateKeyHex".into()
        )));
    }
    Ok(key_pair)
}

/// Everything an `SdService` needs, built once at startup.
#[derive(Clone)]
pub struct ServiceConfig {
    pub keys: IssuerKeyMaterial,
}

impl ServiceConfig {
    pub fn new(keys: IssuerKeyMaterial) -> Self {
        Self { keys }
    }

    pub fn from_key_files(sd_path: &Path, bbs_path: &Path) -> Result<Self, ProofError> {
        let keys = IssuerKeyMaterial::from_files(sd_path, bbs_path)?;
        info!(
            "loaded issuer keys from {} and {}",
            sd_path.display(),
            bbs_path.display()
        );
        Ok(Self::new(keys))
    }
}
