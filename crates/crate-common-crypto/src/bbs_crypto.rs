use alloc::boxed::Box;
use alloc::vec::Vec;
use std::sync::Once;

use log::debug;
use rand_core::RngCore;
use zkryptium::bbsplus::keys::BBSplusPublicKey;
use zkryptium::bbsplus::keys::BBSplusSecretKey;
use zkryptium::schemes::algorithms::BbsBls12381Sha256;
use zkryptium::schemes::generics::PoKSignature;
use zkryptium::schemes::generics::Signature;
use zkryptium::utils::pluggable_rng::set_pluggable_rng_maker;
use zkryptium::utils::pluggable_rng::PluggableRng;

use common_types::log_error;
use common_types::ProofError;

use crate::rng::SdRng;

pub const BBS_SECRET_KEY_LEN: usize = 32;
pub const BBS_PUBLIC_KEY_LEN: usize = 96;
pub const BBS_SIGNATURE_LEN: usize = 80;

struct SdRngMaker;

impl PluggableRng for SdRngMaker {
    fn new_rng(&self) -> Box<dyn RngCore> {
        Box::new(SdRng::new())
    }
}

static RNG_INSTALLED: Once = Once::new();

/// Proof generation draws its blinding factors through zkryptium's pluggable rng; this points it
/// at the OS random source. Safe to call any number of times.
pub fn install_rng_for_bbs() {
    RNG_INSTALLED.call_once(|| set_pluggable_rng_maker(Box::new(SdRngMaker)));
}

pub fn bbs_generate_key_pair() -> ([u8; BBS_SECRET_KEY_LEN], [u8; BBS_PUBLIC_KEY_LEN]) {
    let mut wide = [0u8; 64];
    SdRng::new().fill_bytes(&mut wide);
    let private = bls12_381_plus::Scalar::from_bytes_wide(&wide);
    let public = bls12_381_plus::G2Affine::from(bls12_381_plus::G2Projective::GENERATOR * private);
    (private.to_be_bytes(), public.to_compressed())
}

pub fn bbs_public_key(secret: &[u8]) -> Result<[u8; BBS_PUBLIC_KEY_LEN], ProofError> {
    let bad_key = || log_error!(ProofError::KeyMaterial("invalid BBS secret key".into()));
    let bytes = <&[u8; BBS_SECRET_KEY_LEN]>::try_from(secret).map_err(|_| bad_key())?;
    let private: bls12_381_plus::Scalar =
        Option::from(bls12_381_plus::Scalar::from_be_bytes(bytes)).ok_or_else(bad_key)?;
    let public = bls12_381_plus::G2Affine::from(bls12_381_plus::G2Projective::GENERATOR * private);
    Ok(public.to_compressed())
}

fn secret_key(secret: &[u8]) -> Result<BBSplusSecretKey, ProofError> {
    BBSplusSecretKey::from_bytes(secret)
        .map_err(|e| log_error!(ProofError::KeyMaterial(format!("invalid BBS secret key: {e}"))))
}

fn public_key(public: &[u8]) -> Result<BBSplusPublicKey, ProofError> {
    BBSplusPublicKey::from_bytes(public).map_err(|e| {
        log_error!(ProofError::InvalidProofEncoding(format!(
            "invalid BBS public key: {e}"
        )))
    })
}

pub fn bbs_sign(
    secret: &[u8],
    public: &[u8],
    header: &[u8],
    messages: &[Vec<u8>],
) -> Result<[u8; BBS_SIGNATURE_LEN], ProofError> {
    let sk = secret_key(secret)?;
    let pk = public_key(public)?;
    Signature::<BbsBls12381Sha256>::sign(Some(messages), &sk, &pk, Some(header))
        .map(|s| s.to_bytes())
        .map_err(|e| log_error!(ProofError::KeyMaterial(format!("BBS signing failed: {e}"))))
}

/// A signature that does not decode verifies as false.
pub fn bbs_verify(
    public: &[u8],
    signature: &[u8],
    header: &[u8],
    messages: &[Vec<u8>],
) -> Result<bool, ProofError> {
    let pk = public_key(public)?;
    let Ok(signature) = <&[u8; BBS_SIGNATURE_LEN]>::try_from(signature) else {
        debug!("BBS signature has length {}", signature.len());
        return Ok(false);
    };
    let Ok(signature) = Signature::<BbsBls12381Sha256>::from_bytes(signature) else {
        debug!("BBS signature does not decode");
        return Ok(false);
    };
    Ok(signature.verify(&pk, Some(messages), Some(header)).is_ok())
}

/// Derives a proof disclosing `messages[i]` for every `i` in `disclosed_indexes`.
pub fn bbs_proof_gen(
    public: &[u8],
    signature: &[u8],
    header: &[u8],
    presentation_header: &[u8],
    messages: &[Vec<u8>],
    disclosed_indexes: &[usize],
) -> Result<Vec<u8>, ProofError> {
    install_rng_for_bbs();
    let pk = public_key(public)?;
    PoKSignature::<BbsBls12381Sha256>::proof_gen(
        &pk,
        signature,
        Some(header),
        Some(presentation_header),
        Some(messages),
        Some(disclosed_indexes),
    )
    .map(|proof| proof.to_bytes())
    .map_err(|e| {
        log_error!(ProofError::InvalidProofEncoding(format!(
            "could not generate BBS proof: {e}"
        )))
    })
}

pub fn bbs_proof_verify(
    public: &[u8],
    proof: &[u8],
    header: &[u8],
    presentation_header: &[u8],
    disclosed_messages: &[Vec<u8>],
    disclosed_indexes: &[usize],
) -> Result<bool, ProofError> {
    let pk = public_key(public)?;
    let Ok(proof) = PoKSignature::<BbsBls12381Sha256>::from_bytes(proof) else {
        debug!("BBS proof does not decode");
        return Ok(false);
    };
    Ok(proof
        .proof_verify(
            &pk,
            Some(disclosed_messages),
            Some(disclosed_indexes),
            Some(header),
            Some(presentation_header),
        )
        .is_ok())
}
