//! P-256 ECDSA over SHA-256, in the shapes the ecdsa-sd-2023 suite needs: 33 byte compressed
//! public keys and 64 byte `r || s` signatures.

use alloc::vec::Vec;

use log::debug;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::Signature;
use p256::ecdsa::SigningKey;
use p256::ecdsa::VerifyingKey;

use common_types::log_error;
use common_types::ProofError;

use crate::rng::SdRng;
use crate::sha256;

pub const P256_PUBLIC_KEY_LEN: usize = 33;
pub const P256_SECRET_KEY_LEN: usize = 32;
pub const P256_SIGNATURE_LEN: usize = 64;

#[derive(Clone)]
pub struct P256KeyPair {
    secret: SigningKey,
}

impl P256KeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SigningKey::random(&mut SdRng::new()),
        }
    }

    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, ProofError> {
        let secret = SigningKey::from_slice(secret).map_err(|e| {
            log_error!(ProofError::KeyMaterial(format!(
                "invalid P-256 secret key: {e}"
            )))
        })?;
        Ok(Self { secret })
    }

    pub fn secret_bytes(&self) -> [u8; P256_SECRET_KEY_LEN] {
        self.secret.to_bytes().into()
    }

    /// SEC1 compressed point.
    pub fn public_key(&self) -> [u8; P256_PUBLIC_KEY_LEN] {
        compress(self.secret.verifying_key())
    }

    /// Signs `sha256(data)`.
    pub fn sign(&self, data: &[u8]) -> Result<[u8; P256_SIGNATURE_LEN], ProofError> {
        let signature: Signature = self.secret.sign_prehash(&sha256(data)).map_err(|e| {
            log_error!(ProofError::KeyMaterial(format!("P-256 signing failed: {e}")))
        })?;
        Ok(signature.to_bytes().into())
    }
}

fn compress(key: &VerifyingKey) -> [u8; P256_PUBLIC_KEY_LEN] {
    let point = key.to_encoded_point(true);
    let mut out = [0u8; P256_PUBLIC_KEY_LEN];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Parses a SEC1 encoded public key, compressed or not.
pub fn p256_public_key(public: &[u8]) -> Result<VerifyingKey, ProofError> {
    VerifyingKey::from_sec1_bytes(public).map_err(|_| {
        log_error!(ProofError::InvalidProofEncoding(
            "invalid P-256 public key".into()
        ))
    })
}

pub fn compress_p256_public_key(public: &[u8]) -> Result<Vec<u8>, ProofError> {
    Ok(compress(&p256_public_key(public)?).to_vec())
}

/// Checks a signature over `sha256(data)`. A signature that cannot even be parsed is reported as
/// a failed verification, an unusable key is an error.
pub fn p256_verify(public: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, ProofError> {
    let key = p256_public_key(public)?;
    let signature = match Signature::from_slice(signature) {
        Ok(signature) => signature,
        Err(_) => {
            debug!("P-256 signature of {} bytes is malformed", signature.len());
            return Ok(false);
        }
    };
    Ok(key.verify_prehash(&sha256(data), &signature).is_ok())
}
