//! Proof sets and proof chains.
//!
//! A document may carry several proofs. A proof naming `previousProof` was computed over the
//! document with the proofs it depends on attached, so each proof is verified against that same
//! composition.

use alloc::string::String;
use alloc::vec::Vec;

use log::debug;
use log::info;
use serde_json::Map;
use serde_json::Value;

use common_crypto::ecdsa::P256KeyPair;
use common_crypto::generate_random;
use common_types::log_error;
use common_types::ProofError;

use crate::bbs;
use crate::bbs::BbsKeyPair;
use crate::bbs::BbsSignOptions;
use crate::ecdsa_sd;
use crate::ecdsa_sd::SignOptions;
use crate::expect_cryptosuite;
use crate::json_pointer::JsonPointerBuf;
use crate::multikey::did_key_verification_method;
use crate::multikey::public_key_from_verification_method;
use crate::new_proof_config;
use crate::proof_str;
use crate::proof_value::is_base;
use crate::Cryptosuite;
use crate::StaticLoader;

/// Issuer key and mandatory pointers for one new proof.
pub enum ProofSigner<'a> {
    EcdsaSd {
        key_pair: &'a P256KeyPair,
        mandatory_pointers: &'a [JsonPointerBuf],
    },
    Bbs {
        key_pair: &'a BbsKeyPair,
        mandatory_pointers: &'a [JsonPointerBuf],
    },
}

impl ProofSigner<'_> {
    pub fn cryptosuite(&self) -> Cryptosuite {
        match self {
            ProofSigner::EcdsaSd { .. } => Cryptosuite::EcdsaSd2023,
            ProofSigner::Bbs { .. } => Cryptosuite::Bbs2023,
        }
    }

    fn verification_method(&self) -> Result<String, ProofError> {
        match self {
            ProofSigner::EcdsaSd { key_pair, .. } => {
                did_key_verification_method(self.cryptosuite(), &key_pair.public_key())
            }
            ProofSigner::Bbs { key_pair, .. } => {
                did_key_verification_method(self.cryptosuite(), &key_pair.public_key())
            }
        }
    }

    async fn sign(
        &self,
        document: &Value,
        proof_config: Value,
        loader: &mut StaticLoader,
    ) -> Result<Value, ProofError> {
        match *self {
            ProofSigner::EcdsaSd {
                key_pair,
                mandatory_pointers,
            } => {
                let options = SignOptions {
                    proof_config: Some(proof_config),
                    ..Default::default()
                };
                ecdsa_sd::sign_base(document, key_pair, mandatory_pointers, options, loader).await
            }
            ProofSigner::Bbs {
                key_pair,
                mandatory_pointers,
            } => {
                let options = BbsSignOptions {
                    proof_config: Some(proof_config),
                    ..Default::default()
                };
                bbs::sign_base(document, key_pair, mandatory_pointers, options, loader).await
            }
        }
    }
}

/// Splits a document into its unsecured part and its proofs, whether `proof` is an object, an
/// array or absent.
fn split_proofs(document: &Value) -> Result<(Map<String, Value>, Vec<Value>), ProofError> {
    let mut unsecured = document
        .as_object()
        .cloned()
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document is not an object".into())))?;
    let proofs = match unsecured.remove("proof") {
        None => Vec::new(),
        Some(Value::Array(proofs)) => proofs,
        Some(proof) => vec![proof],
    };
    if let Some(bad) = proofs.iter().position(|p| !p.is_object()) {
        return Err(log_error!(ProofError::MalformedInput(format!(
            "proof {bad} is not an object"
        ))));
    }
    Ok((unsecured, proofs))
}

fn previous_proof_ids(proof: &Value) -> Result<Vec<&str>, ProofError> {
    match proof.get("previousProof") {
        None => Ok(Vec::new()),
        Some(Value::String(id)) => Ok(vec![id.as_str()]),
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| {
                id.as_str().ok_or_else(|| {
                    log_error!(ProofError::MalformedInput(
                        "previousProof entries must be strings".into()
                    ))
                })
            })
            .collect(),
        Some(_) => Err(log_error!(ProofError::MalformedInput(
            "previousProof must be a string or an array".into()
        ))),
    }
}

fn resolve<'a>(proofs: &'a [Value], ids: &[&str]) -> Result<Vec<&'a Value>, ProofError> {
    ids.iter()
        .map(|&id| {
            proofs
                .iter()
                .find(|p| p.get("id").and_then(Value::as_str) == Some(id))
                .ok_or_else(|| {
                    log_error!(ProofError::UnresolvedProofDependency(format!(
                        "no proof with id {id}"
                    )))
                })
        })
        .collect()
}

/// The unsecured document with `dependencies` attached as its proofs.
fn compose(unsecured: &Map<String, Value>, dependencies: Vec<&Value>) -> Value {
    let mut composed = unsecured.clone();
    if !dependencies.is_empty() {
        composed.insert(
            "proof".into(),
            Value::Array(dependencies.into_iter().cloned().collect()),
        );
    }
    Value::Object(composed)
}

/// Verifies one proof of either suite against `document`, which must not carry the proof itself.
/// The issuer key comes from the proof's `did:key` verification method.
pub(crate) async fn verify_single_proof(
    document: &Value,
    proof: &Value,
    suite: Cryptosuite,
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    expect_cryptosuite(proof, suite)?;
    let public_key =
        public_key_from_verification_method(proof_str(proof, "verificationMethod")?, suite)?;
    let base = is_base(proof_str(proof, "proofValue")?)?;
    match (suite, base) {
        (Cryptosuite::EcdsaSd2023, true) => {
            ecdsa_sd::verify_base_proof(document, proof, &public_key, loader).await
        }
        (Cryptosuite::EcdsaSd2023, false) => {
            ecdsa_sd::verify_derived_proof(document, proof, &public_key, loader).await
        }
        (Cryptosuite::Bbs2023, true) => {
            bbs::verify_base_proof(document, proof, &public_key, loader).await
        }
        (Cryptosuite::Bbs2023, false) => {
            bbs::verify_derived_proof(document, proof, &public_key, loader).await
        }
    }
}

/// Verifies every proof on `document`, in order, each against the document composed with the
/// proofs it names as `previousProof`. Stops at the first proof that fails.
pub async fn verify_proof_set(
    document: &Value,
    suite: Cryptosuite,
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    let (unsecured, proofs) = split_proofs(document)?;
    if proofs.is_empty() {
        return Err(log_error!(ProofError::MalformedInput(
            "document has no proof".into()
        )));
    }
    for (i, proof) in proofs.iter().enumerate() {
        expect_cryptosuite(proof, suite)?;
        let dependencies = resolve(&proofs, &previous_proof_ids(proof)?)?;
        debug!("proof {i} depends on {} proofs", dependencies.len());
        let composed = compose(&unsecured, dependencies);
        if !verify_single_proof(&composed, proof, suite, loader).await? {
            info!("proof {i} of {} failed", proofs.len());
            return Ok(false);
        }
    }
    info!("all {} proofs verified", proofs.len());
    Ok(true)
}

fn new_proof_id() -> Result<String, ProofError> {
    let bytes: [u8; 16] = generate_random(16)?
        .try_into()
        .map_err(|_| log_error!(ProofError::KeyMaterial("short random read".into())))?;
    Ok(uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .urn()
        .to_string())
}

/// Adds a base proof to `document` alongside the proofs it already has. The new proof covers the
/// document with the proofs named by `previous_proof_ids` attached, and records them as its
/// `previousProof`.
pub async fn add_chained_proof(
    document: &Value,
    previous_proof_ids: &[&str],
    signer: &ProofSigner<'_>,
    loader: &mut StaticLoader,
) -> Result<Value, ProofError> {
    let (unsecured, mut proofs) = split_proofs(document)?;
    let composed = compose(&unsecured, resolve(&proofs, previous_proof_ids)?);

    let mut proof_config = new_proof_config(signer.cryptosuite(), signer.verification_method()?)?;
    let id = new_proof_id()?;
    if let Some(config) = proof_config.as_object_mut() {
        config.insert("id".into(), id.clone().into());
        match previous_proof_ids {
            [] => {}
            [single] => {
                config.insert("previousProof".into(), (*single).into());
            }
            many => {
                config.insert("previousProof".into(), many.to_vec().into());
            }
        }
    }

    let mut signed = signer.sign(&composed, proof_config, loader).await?;
    let proof = signed
        .as_object_mut()
        .and_then(|map| map.remove("proof"))
        .ok_or_else(|| log_error!(ProofError::MalformedInput("signing produced no proof".into())))?;
    proofs.push(proof);
    info!(
        "added proof {id} after {} previous, {} proofs in total",
        previous_proof_ids.len(),
        proofs.len()
    );

    let mut secured = unsecured;
    secured.insert("proof".into(), Value::Array(proofs));
    Ok(Value::Object(secured))
}
