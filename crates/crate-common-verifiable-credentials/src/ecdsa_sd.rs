//! The `ecdsa-sd-2023` cryptosuite.
//!
//! An issuer signs every non-mandatory statement with a one-time P-256 key, and binds that key,
//! the proof configuration and the mandatory statements together with its long-term key. A holder
//! drops the signatures of statements it does not reveal.

use alloc::collections::BTreeMap;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use base64::prelude::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use log::debug;
use log::info;
use serde_json::Value;

use common_crypto::ecdsa::p256_verify;
use common_crypto::ecdsa::P256KeyPair;
use common_crypto::generate_random;
use common_crypto::SHA256_LEN;
use common_types::log_error;
use common_types::ProofError;

use crate::attach_proof;
use crate::canonicalize::ExplicitLabeler;
use crate::canonicalize::HmacLabeler;
use crate::document_context;
use crate::expect_cryptosuite;
use crate::group::canonicalize_and_group;
use crate::group::canonicalize_with_labeler;
use crate::group::hash_proof_config;
use crate::group::hash_statements;
use crate::group::verifier_label_map;
use crate::group::DisclosureIndexes;
use crate::group::GroupName;
use crate::json_pointer::JsonPointerBuf;
use crate::multikey::did_key_verification_method;
use crate::multikey::prefixed_public_key;
use crate::multikey::strip_codec_prefix;
use crate::new_proof_config;
use crate::proof_str;
use crate::proof_value::EcdsaSdBaseProof;
use crate::proof_value::EcdsaSdDerivedProof;
use crate::select::select_json_ld;
use crate::split_proof;
use crate::Cryptosuite;
use crate::StaticLoader;

const SUITE: Cryptosuite = Cryptosuite::EcdsaSd2023;

/// Overrides for values `sign_base` otherwise creates itself.
#[derive(Default)]
pub struct SignOptions {
    /// Used as is, without `@context`.
    pub proof_config: Option<Value>,
    pub hmac_key: Option<Vec<u8>>,
    /// Must never be reused across documents.
    pub ephemeral_key: Option<P256KeyPair>,
}

fn base_signature_input(
    proof_hash: &[u8; SHA256_LEN],
    prefixed_ephemeral_key: &[u8],
    mandatory_hash: &[u8; SHA256_LEN],
) -> Vec<u8> {
    [&proof_hash[..], prefixed_ephemeral_key, &mandatory_hash[..]].concat()
}

/// Adds a base proof to `document`, leaving `mandatory_pointers` always disclosed.
pub async fn sign_base(
    document: &Value,
    key_pair: &P256KeyPair,
    mandatory_pointers: &[JsonPointerBuf],
    options: SignOptions,
    loader: &mut StaticLoader,
) -> Result<Value, ProofError> {
    let proof_config = match options.proof_config {
        Some(config) => config,
        None => new_proof_config(
            SUITE,
            did_key_verification_method(SUITE, &key_pair.public_key())?,
        )?,
    };
    let proof_hash = hash_proof_config(&proof_config, document_context(document)?, loader).await?;

    let hmac_key = match options.hmac_key {
        Some(key) if key.len() == SHA256_LEN => key,
        Some(key) => {
            return Err(log_error!(ProofError::KeyMaterial(format!(
                "HMAC key must be {SHA256_LEN} bytes, found {}",
                key.len()
            ))))
        }
        None => generate_random(SHA256_LEN)?,
    };
    let ephemeral = options.ephemeral_key.unwrap_or_else(P256KeyPair::generate);

    let grouped = canonicalize_and_group(
        document,
        &HmacLabeler::new(&hmac_key),
        &[(GroupName::Mandatory, mandatory_pointers)],
        loader,
    )
    .await?;
    let mandatory = grouped.group(GroupName::Mandatory)?;
    let mandatory_hash = hash_statements(mandatory.matching.values());

    let signatures = mandatory
        .non_matching
        .values()
        .map(|statement| ephemeral.sign(statement.as_bytes()).map(|s| s.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;

    let public_key = prefixed_public_key(SUITE, &ephemeral.public_key());
    let base_signature =
        key_pair.sign(&base_signature_input(&proof_hash, &public_key, &mandatory_hash))?;

    let proof_value = EcdsaSdBaseProof {
        base_signature: base_signature.to_vec(),
        public_key,
        hmac_key,
        signatures,
        mandatory_pointers: mandatory_pointers.to_vec(),
    }
    .to_proof_value()?;
    info!(
        "{SUITE} base proof over {} statements, {} mandatory",
        grouped.statements.len(),
        mandatory.matching.len()
    );
    attach_proof(document.clone(), proof_config, proof_value)
}

/// Builds the reveal document for `selective_pointers` (plus the issuer's mandatory pointers)
/// from a document carrying a base proof.
pub async fn derive(
    document: &Value,
    selective_pointers: &[JsonPointerBuf],
    loader: &mut StaticLoader,
) -> Result<Value, ProofError> {
    if selective_pointers.is_empty() {
        return Err(log_error!(ProofError::MalformedInput("nothing selected".into())));
    }
    let (unsecured, proof) = split_proof(document)?;
    expect_cryptosuite(&proof, SUITE)?;
    let base = EcdsaSdBaseProof::from_proof_value(proof_str(&proof, "proofValue")?)?;

    let combined_pointers = [base.mandatory_pointers.as_slice(), selective_pointers].concat();
    let reveal_document = select_json_ld(&unsecured, &combined_pointers)?.ok_or_else(|| {
        log_error!(ProofError::MalformedInput("nothing selected".into()))
    })?;

    let grouped = canonicalize_and_group(
        &unsecured,
        &HmacLabeler::new(&base.hmac_key),
        &[
            (GroupName::Mandatory, base.mandatory_pointers.as_slice()),
            (GroupName::Selective, selective_pointers),
            (GroupName::Combined, combined_pointers.as_slice()),
        ],
        loader,
    )
    .await?;
    let indexes = DisclosureIndexes::new(&grouped)?;

    let signatures = indexes
        .selective_in_non_mandatory
        .iter()
        .map(|&i| {
            base.signatures.get(i).cloned().ok_or_else(|| {
                log_error!(ProofError::InvalidProofEncoding(format!(
                    "base proof has no signature for statement {i}"
                )))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let label_map = verifier_label_map(&grouped)?
        .into_iter()
        .map(|(n, label)| {
            label
                .suffix()
                .strip_prefix('u')
                .and_then(|digest| BASE64_URL_SAFE_NO_PAD.decode(digest).ok())
                .map(|digest| (n, digest))
                .ok_or_else(|| {
                    log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                        "label {label} is not an HMAC label"
                    )))
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    debug!(
        "{SUITE} derive: {} of {} signatures kept, {} labels",
        signatures.len(),
        base.signatures.len(),
        label_map.len()
    );
    let proof_value = EcdsaSdDerivedProof {
        base_signature: base.base_signature,
        public_key: base.public_key,
        signatures,
        label_map,
        mandatory_indexes: indexes.mandatory_in_combined,
    }
    .to_proof_value()?;
    attach_proof(reveal_document, proof, proof_value)
}

/// Checks a document secured with a base proof against the issuer's raw public key.
pub async fn verify_base(
    document: &Value,
    public_key: &[u8],
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    let (unsecured, proof) = split_proof(document)?;
    verify_base_proof(&unsecured, &proof, public_key, loader).await
}

pub(crate) async fn verify_base_proof(
    unsecured: &Value,
    proof: &Value,
    public_key: &[u8],
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    expect_cryptosuite(proof, SUITE)?;
    let base = EcdsaSdBaseProof::from_proof_value(proof_str(proof, "proofValue")?)?;
    let ephemeral_key = strip_codec_prefix(SUITE, &base.public_key, ProofError::InvalidProofEncoding)?;

    let proof_hash = hash_proof_config(proof, document_context(unsecured)?, loader).await?;
    let grouped = canonicalize_and_group(
        unsecured,
        &HmacLabeler::new(&base.hmac_key),
        &[(GroupName::Mandatory, base.mandatory_pointers.as_slice())],
        loader,
    )
    .await?;
    let mandatory = grouped.group(GroupName::Mandatory)?;
    let mandatory_hash = hash_statements(mandatory.matching.values());

    let mut verified = p256_verify(
        public_key,
        &base_signature_input(&proof_hash, &base.public_key, &mandatory_hash),
        &base.base_signature,
    )?;
    if base.signatures.len() != mandatory.non_matching.len() {
        debug!(
            "{} signatures for {} non-mandatory statements",
            base.signatures.len(),
            mandatory.non_matching.len()
        );
        verified = false;
    }
    for (statement, signature) in mandatory.non_matching.values().zip(&base.signatures) {
        verified &= p256_verify(&ephemeral_key, statement.as_bytes(), signature)?;
    }
    info!("{SUITE} base proof verified: {verified}");
    Ok(verified)
}

/// Checks a reveal document produced by [`derive`] against the issuer's raw public key.
pub async fn verify_derived(
    document: &Value,
    public_key: &[u8],
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    let (unsecured, proof) = split_proof(document)?;
    verify_derived_proof(&unsecured, &proof, public_key, loader).await
}

pub(crate) async fn verify_derived_proof(
    unsecured: &Value,
    proof: &Value,
    public_key: &[u8],
    loader: &mut StaticLoader,
) -> Result<bool, ProofError> {
    expect_cryptosuite(proof, SUITE)?;
    let derived = EcdsaSdDerivedProof::from_proof_value(proof_str(proof, "proofValue")?)?;
    let ephemeral_key =
        strip_codec_prefix(SUITE, &derived.public_key, ProofError::InvalidProofEncoding)?;

    let labeler = ExplicitLabeler::from_hmac_digests(&derived.label_map)?;
    let (statements, _) = canonicalize_with_labeler(unsecured, &labeler, loader).await?;

    let mandatory_indexes: BTreeSet<usize> = derived.mandatory_indexes.iter().copied().collect();
    if let Some(&out_of_range) = mandatory_indexes.range(statements.len()..).next() {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "mandatory index {out_of_range} out of range for {} statements",
            statements.len()
        ))));
    }
    let (mandatory, non_mandatory): (Vec<(usize, &String)>, Vec<(usize, &String)>) = statements
        .iter()
        .enumerate()
        .partition(|(i, _)| mandatory_indexes.contains(i));
    if derived.signatures.len() != non_mandatory.len() {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "{} signatures for {} non-mandatory statements",
            derived.signatures.len(),
            non_mandatory.len()
        ))));
    }

    let proof_hash = hash_proof_config(proof, document_context(unsecured)?, loader).await?;
    let mandatory_hash = hash_statements(mandatory.iter().map(|(_, s)| *s));

    let mut verified = p256_verify(
        public_key,
        &base_signature_input(&proof_hash, &derived.public_key, &mandatory_hash),
        &derived.base_signature,
    )?;
    for ((_, statement), signature) in non_mandatory.iter().zip(&derived.signatures) {
        verified &= p256_verify(&ephemeral_key, statement.as_bytes(), signature)?;
    }
    info!("{SUITE} derived proof verified: {verified}");
    Ok(verified)
}


#[cfg(test)]
mod async_tests {
    use serde_json::json;

    use common_async::expect_ready;

    use super::test_keys::*;
    use super::*;
    use crate::contexts::new_static_loader;
    use crate::group::test_vectors::*;
    use crate::json_pointer::parse_pointers;
    use crate::proof_value::is_base;

    fn proof_config() -> Value {
        json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-sd-2023",
            "created": "2023-08-15T23:36:38Z",
            "verificationMethod": did_key_verification_method(SUITE, &issuer_key().public_key()).unwrap(),
            "proofPurpose": "assertionMethod"
        })
    }

    fn fixed_options() -> SignOptions {
        SignOptions {
            proof_config: Some(proof_config()),
            hmac_key: Some(HMAC_KEY.to_vec()),
            ephemeral_key: Some(ephemeral_key()),
        }
    }

    fn sign(document: &Value, mandatory: &[JsonPointerBuf], options: SignOptions) -> Value {
        let mut loader = new_static_loader();
        expect_ready(sign_base(document, &issuer_key(), mandatory, options, &mut loader))
            .expect("future was not ready")
            .unwrap()
    }

    fn derive_from(document: &Value, selective: &[JsonPointerBuf]) -> Result<Value, ProofError> {
        let mut loader = new_static_loader();
        expect_ready(derive(document, selective, &mut loader)).expect("future was not ready")
    }

    fn check_base(document: &Value, public_key: &[u8]) -> Result<bool, ProofError> {
        let mut loader = new_static_loader();
        expect_ready(verify_base(document, public_key, &mut loader))
            .expect("future was not ready")
    }

    fn check_derived(document: &Value, public_key: &[u8]) -> Result<bool, ProofError> {
        let mut loader = new_static_loader();
        expect_ready(verify_derived(document, public_key, &mut loader))
            .expect("future was not ready")
    }

    fn signed_windsurf() -> Value {
        sign(
            &windsurf_credential(),
            &windsurf_mandatory_pointers(),
            fixed_options(),
        )
    }

    fn proof_value(document: &Value) -> &str {
        document["proof"]["proofValue"].as_str().unwrap()
    }

    #[test]
    fn test_sign_and_verify_base() {
        let signed = signed_windsurf();
        assert_eq!(is_base(proof_value(&signed)), Ok(true));
        assert_eq!(signed["proof"]["created"], "2023-08-15T23:36:38Z");
        assert!(signed["proof"].get("@context").is_none());

        let base = EcdsaSdBaseProof::from_proof_value(proof_value(&signed)).unwrap();
        assert_eq!(base.signatures.len(), 28 - 14);
        assert_eq!(base.hmac_key, HMAC_KEY);
        assert_eq!(base.mandatory_pointers, windsurf_mandatory_pointers());

        let public_key = issuer_key().public_key();
        assert_eq!(check_base(&signed, &public_key), Ok(true));
    }

    #[test]
    fn test_sign_is_deterministic_with_fixed_options() {
        assert_eq!(signed_windsurf(), signed_windsurf());
    }

    #[test]
    fn test_default_options() {
        let signed = sign(&windsurf_credential(), &[], SignOptions::default());
        let proof = &signed["proof"];
        assert_eq!(proof["cryptosuite"], "ecdsa-sd-2023");
        assert_eq!(proof["type"], "DataIntegrityProof");
        assert_eq!(proof["proofPurpose"], "assertionMethod");
        assert!(proof["verificationMethod"]
            .as_str()
            .unwrap()
            .starts_with("did:key:zDna"));
        assert_eq!(check_base(&signed, &issuer_key().public_key()), Ok(true));

        // fresh HMAC and ephemeral keys for every signature
        let again = sign(&windsurf_credential(), &[], SignOptions::default());
        let a = EcdsaSdBaseProof::from_proof_value(proof_value(&signed)).unwrap();
        let b = EcdsaSdBaseProof::from_proof_value(proof_value(&again)).unwrap();
        assert_ne!(a.hmac_key, b.hmac_key);
        assert_ne!(a.public_key, b.public_key);
    }

    #[test]
    fn test_no_mandatory_pointers() {
        let signed = sign(&windsurf_credential(), &[], fixed_options());
        let base = EcdsaSdBaseProof::from_proof_value(proof_value(&signed)).unwrap();
        assert_eq!(base.signatures.len(), 28);
        let public_key = issuer_key().public_key();
        assert_eq!(check_base(&signed, &public_key), Ok(true));

        let selective = parse_pointers(["/credentialSubject/sailNumber"]).unwrap();
        let derived = derive_from(&signed, &selective).unwrap();
        assert_eq!(check_derived(&derived, &public_key), Ok(true));
    }

    #[test]
    fn test_derive_and_verify() {
        let signed = signed_windsurf();
        let derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        assert_eq!(is_base(proof_value(&derived)), Ok(false));

        let subject = &derived["credentialSubject"];
        assert_eq!(subject["sailNumber"], "Earth101");
        assert_eq!(subject["boards"].as_array().unwrap().len(), 2);
        // only the mandatory sails are revealed
        let sails = subject["sails"].as_array().unwrap();
        assert_eq!(sails.len(), 2);
        assert!(sails.iter().all(|s| s["sailName"] == "Lahaina"));
        assert_eq!(derived["proof"]["created"], signed["proof"]["created"]);

        let public_key = issuer_key().public_key();
        assert_eq!(check_derived(&derived, &public_key), Ok(true));
    }

    #[test]
    fn test_minimal_disclosure_for_several_selections() {
        let signed = signed_windsurf();
        let public_key = issuer_key().public_key();
        for selection in [
            vec!["/credentialSubject/boards/0"],
            vec!["/credentialSubject/sails/3"],
            vec!["/credentialSubject/boards/1", "/credentialSubject/sails/0/year"],
        ] {
            let selective = parse_pointers(selection.iter().copied()).unwrap();
            let derived = derive_from(&signed, &selective).unwrap();
            assert_eq!(check_derived(&derived, &public_key), Ok(true), "{selection:?}");

            let derived_proof =
                EcdsaSdDerivedProof::from_proof_value(proof_value(&derived)).unwrap();
            let mandatory = windsurf_mandatory_pointers();
            let mut loader = new_static_loader();
            let grouped = expect_ready(canonicalize_and_group(
                &windsurf_credential(),
                &HmacLabeler::new(&HMAC_KEY),
                &[
                    (GroupName::Mandatory, mandatory.as_slice()),
                    (GroupName::Selective, selective.as_slice()),
                ],
                &mut loader,
            ))
            .unwrap()
            .unwrap();
            let m = grouped.group(GroupName::Mandatory).unwrap();
            let s = grouped.group(GroupName::Selective).unwrap();
            let disclosed = s
                .matching
                .keys()
                .filter(|k| m.non_matching.contains_key(k))
                .count();
            assert_eq!(derived_proof.signatures.len(), disclosed, "{selection:?}");
        }
    }

    #[test]
    fn test_nothing_selected() {
        let signed = signed_windsurf();
        assert!(matches!(
            derive_from(&signed, &[]),
            Err(ProofError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_wrong_public_key() {
        let signed = signed_windsurf();
        let other = ephemeral_key().public_key();
        assert_eq!(check_base(&signed, &other), Ok(false));
        let derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        assert_eq!(check_derived(&derived, &other), Ok(false));
        assert!(matches!(
            check_derived(&derived, &[1, 2, 3]),
            Err(ProofError::InvalidProofEncoding(_))
        ));
    }

    #[test]
    fn test_tampering_is_detected() {
        let public_key = issuer_key().public_key();
        let signed = signed_windsurf();

        let mut mandatory_changed = signed.clone();
        mandatory_changed["credentialSubject"]["sailNumber"] = json!("Earth102");
        assert_eq!(check_base(&mandatory_changed, &public_key), Ok(false));

        let mut optional_changed = signed.clone();
        optional_changed["credentialSubject"]["sails"][0]["year"] = json!(2022);
        assert_eq!(check_base(&optional_changed, &public_key), Ok(false));

        let mut config_changed = signed.clone();
        config_changed["proof"]["created"] = json!("2024-01-01T00:00:00Z");
        assert_eq!(check_base(&config_changed, &public_key), Ok(false));

        let derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        let mut revealed_changed = derived.clone();
        revealed_changed["credentialSubject"]["boards"][1]["brand"] = json!("Naish");
        assert_eq!(check_derived(&revealed_changed, &public_key), Ok(false));
    }

    fn with_proof_value(document: &Value, proof_value: String) -> Value {
        let mut document = document.clone();
        document["proof"]["proofValue"] = proof_value.into();
        document
    }

    #[test]
    fn test_flipped_base_proof_bytes() {
        let public_key = issuer_key().public_key();
        let signed = signed_windsurf();
        let base = EcdsaSdBaseProof::from_proof_value(proof_value(&signed)).unwrap();

        let mut statement_signature = base.clone();
        statement_signature.signatures[0][0] ^= 0x01;
        let mut last_signature = base.clone();
        let last = last_signature.signatures.len() - 1;
        last_signature.signatures[last][40] ^= 0x80;
        let mut base_signature = base.clone();
        base_signature.base_signature[0] ^= 0x01;
        let mut hmac_key = base;
        hmac_key.hmac_key[0] ^= 0x01;

        for tampered in [statement_signature, last_signature, base_signature, hmac_key] {
            let document = with_proof_value(&signed, tampered.to_proof_value().unwrap());
            assert_eq!(check_base(&document, &public_key), Ok(false));
        }
    }

    #[test]
    fn test_flipped_derived_proof_bytes() {
        let public_key = issuer_key().public_key();
        let derived = derive_from(&signed_windsurf(), &windsurf_selective_pointers()).unwrap();
        let components = EcdsaSdDerivedProof::from_proof_value(proof_value(&derived)).unwrap();
        assert!(!components.signatures.is_empty());

        let mut statement_signature = components.clone();
        statement_signature.signatures[0][0] ^= 0x01;
        let mut base_signature = components.clone();
        base_signature.base_signature[0] ^= 0x01;
        let mut label = components;
        label.label_map.get_mut(&0).unwrap()[0] ^= 0x01;

        for tampered in [statement_signature, base_signature, label] {
            let document = with_proof_value(&derived, tampered.to_proof_value().unwrap());
            assert_eq!(check_derived(&document, &public_key), Ok(false));
        }
    }

    #[test]
    fn test_hmac_key_length() {
        let mut loader = new_static_loader();
        for len in [0, 31, 33, 64] {
            let options = SignOptions {
                hmac_key: Some(vec![0x11; len]),
                ..fixed_options()
            };
            let result = expect_ready(sign_base(
                &windsurf_credential(),
                &issuer_key(),
                &windsurf_mandatory_pointers(),
                options,
                &mut loader,
            ))
            .unwrap();
            assert!(matches!(result, Err(ProofError::KeyMaterial(_))), "{len}");
        }
    }

    #[test]
    fn test_bad_label_map_value() {
        let signed = signed_windsurf();
        let mut derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        let mut components = EcdsaSdDerivedProof::from_proof_value(proof_value(&derived)).unwrap();
        components.label_map.insert(0, vec![0; 31]);
        derived["proof"]["proofValue"] = components.to_proof_value().unwrap().into();
        assert!(matches!(
            check_derived(&derived, &issuer_key().public_key()),
            Err(ProofError::InvalidProofEncoding(_))
        ));
    }

    #[test]
    fn test_bad_derived_structure() {
        let signed = signed_windsurf();
        let derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        let components = EcdsaSdDerivedProof::from_proof_value(proof_value(&derived)).unwrap();
        let public_key = issuer_key().public_key();

        let mut fewer_signatures = components.clone();
        fewer_signatures.signatures.pop();
        let mut out_of_range = components.clone();
        out_of_range.mandatory_indexes.push(1000);
        let mut missing_label = components;
        missing_label.label_map.remove(&0);

        for broken in [fewer_signatures, out_of_range, missing_label] {
            let mut document = derived.clone();
            document["proof"]["proofValue"] = broken.to_proof_value().unwrap().into();
            assert!(matches!(
                check_derived(&document, &public_key),
                Err(ProofError::InvalidProofEncoding(_))
            ));
        }
    }

    #[test]
    fn test_wrong_proof_kind() {
        let public_key = issuer_key().public_key();
        let signed = signed_windsurf();
        let derived = derive_from(&signed, &windsurf_selective_pointers()).unwrap();
        assert!(matches!(
            check_base(&derived, &public_key),
            Err(ProofError::InvalidProofEncoding(_))
        ));
        assert!(matches!(
            check_derived(&signed, &public_key),
            Err(ProofError::InvalidProofEncoding(_))
        ));

        let mut other_suite = signed.clone();
        other_suite["proof"]["cryptosuite"] = json!("bbs-2023");
        assert!(matches!(
            check_base(&other_suite, &public_key),
            Err(ProofError::CryptosuiteMismatch(_))
        ));
    }
}
