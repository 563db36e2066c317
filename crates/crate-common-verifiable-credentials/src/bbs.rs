//! The `bbs-2023` cryptosuite.
//!
//! One BBS signature covers every non-mandatory statement. A holder turns it into a proof of
//! knowledge that discloses only the selected statements, so derived proofs are unlinkable.

use alloc::collections::BTreeMap;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use log::debug;
use log::info;
use serde_json::Value;

use common_crypto::bbs_crypto::bbs_generate_key_pair;
use common_crypto::bbs_crypto::bbs_proof_gen;
use common_crypto::bbs_crypto::bbs_proof_verify;
use common_crypto::bbs_crypto::bbs_public_key;
use common_crypto::bbs_crypto::bbs_sign;
use common_crypto::bbs_crypto::bbs_verify;
use common_crypto::bbs_crypto::BBS_PUBLIC_KEY_LEN;
use common_crypto::bbs_crypto::BBS_SECRET_KEY_LEN;
use common_crypto::constant_time_eq;
use common_crypto::generate_random;
use common_crypto::SHA256_LEN;
use common_types::log_error;
use common_types::strict_uint;
use common_types::ProofError;

use crate::attach_proof;
use crate::canonicalize::ExplicitLabeler;
use crate::canonicalize::ShuffledHmacLabeler;
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
use crate::new_proof_config;
use crate::proof_str;
use crate::proof_value::BbsBaseProof;
use crate::proof_value::BbsDerivedProof;
use crate::select::select_json_ld;
use crate::split_proof;
use crate::Cryptosuite;
use crate::StaticLoader;

const SUITE: Cryptosuite = Cryptosuite::Bbs2023;

#[derive(Clone)]
pub struct BbsKeyPair {
    secret: [u8; BBS_SECRET_KEY_LEN],
    public: [u8; BBS_PUBLIC_KEY_LEN],
}

impl BbsKeyPair {
    pub fn generate() -> Self {
        let (secret, public) = bbs_generate_key_pair();
        Self { secret, public }
    }

    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, ProofError> {
        let public = bbs_public_key(secret)?;
        let secret = <[u8; BBS_SECRET_KEY_LEN]>::try_from(secret)
            .map_err(|_| log_error!(ProofError::KeyMaterial("invalid BBS secret key".into())))?;
        Ok(Self { secret, public })
    }

    pub fn secret_bytes(&self) -> [u8; BBS_SECRET_KEY_LEN] {
        self.secret
    }

    pub fn public_key(&self) -> [u8; BBS_PUBLIC_KEY_LEN] {
        self.public
    }
}

#[derive(Default)]
pub struct BbsSignOptions {
    /// Used as is, without `@context`.
    pub proof_config: Option<Value>,
    pub hmac_key: Option<Vec<u8>>,
}

fn bbs_header(proof_hash: &[u8; SHA256_LEN], mandatory_hash: &[u8; SHA256_LEN]) -> Vec<u8> {
    [&proof_hash[..], &mandatory_hash[..]].concat()
}

fn to_messages<'a, I>(statements: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = &'a String>,
{
    statements.into_iter().map(|s| s.as_bytes().to_vec()).collect()
}

pub async fn sign_base(
    document: &Value,
    key_pair: &BbsKeyPair,
    mandatory_pointers: &[JsonPointerBuf],
    options: BbsSignOptions,
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

    let grouped = canonicalize_and_group(
        document,
        &ShuffledHmacLabeler::new(&hmac_key),
        &[(GroupName::Mandatory, mandatory_pointers)],
        loader,
    )
    .await?;
    let mandatory = grouped.group(GroupName::Mandatory)?;
    let header = bbs_header(&proof_hash, &hash_statements(mandatory.matching.values()));
    let signature = bbs_sign(
        &key_pair.secret,
        &key_pair.public,
        &header,
        &to_messages(mandatory.non_matching.values()),
    )?;

    let proof_value = BbsBaseProof {
        signature: signature.to_vec(),
        header,
        public_key: key_pair.public.to_vec(),
        hmac_key,
        mandatory_pointers: mandatory_pointers.to_vec(),
    }
    .to_proof_value()?;
    info!(
        "{SUITE} base proof over {} messages, {} mandatory statements",
        mandatory.non_matching.len(),
        mandatory.matching.len()
    );
    attach_proof(document.clone(), proof_config, proof_value)
}

/// Builds the reveal document and an unlinkable proof of knowledge for it.
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
    let base = BbsBaseProof::from_proof_value(proof_str(&proof, "proofValue")?)?;

    let combined_pointers = [base.mandatory_pointers.as_slice(), selective_pointers].concat();
    let reveal_document = select_json_ld(&unsecured, &combined_pointers)?.ok_or_else(|| {
        log_error!(ProofError::MalformedInput("nothing selected".into()))
    })?;

    let grouped = canonicalize_and_group(
        &unsecured,
        &ShuffledHmacLabeler::new(&base.hmac_key),
        &[
            (GroupName::Mandatory, base.mandatory_pointers.as_slice()),
            (GroupName::Selective, selective_pointers),
            (GroupName::Combined, combined_pointers.as_slice()),
        ],
        loader,
    )
    .await?;
    let indexes = DisclosureIndexes::new(&grouped)?;
    let mandatory = grouped.group(GroupName::Mandatory)?;

    let presentation_header = Vec::new();
    let proof_of_knowledge = bbs_proof_gen(
        &base.public_key,
        &base.signature,
        &base.header,
        &presentation_header,
        &to_messages(mandatory.non_matching.values()),
        &indexes.selective_in_non_mandatory,
    )?;

    let label_map = verifier_label_map(&grouped)?
        .into_iter()
        .map(|(n, label)| {
            label
                .suffix()
                .strip_prefix('b')
                .and_then(strict_uint::<usize>)
                .map(|m| (n, m))
                .ok_or_else(|| {
                    log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                        "label {label} is not a ranked label"
                    )))
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    debug!(
        "{SUITE} derive: disclosing {} of {} messages",
        indexes.selective_in_non_mandatory.len(),
        mandatory.non_matching.len()
    );
    let proof_value = BbsDerivedProof {
        proof: proof_of_knowledge,
        label_map,
        mandatory_indexes: indexes.mandatory_in_combined,
        selective_indexes: indexes.selective_in_non_mandatory,
        presentation_header,
    }
    .to_proof_value()?;
    attach_proof(reveal_document, proof, proof_value)
}

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
    let base = BbsBaseProof::from_proof_value(proof_str(proof, "proofValue")?)?;

    let proof_hash = hash_proof_config(proof, document_context(unsecured)?, loader).await?;
    let grouped = canonicalize_and_group(
        unsecured,
        &ShuffledHmacLabeler::new(&base.hmac_key),
        &[(GroupName::Mandatory, base.mandatory_pointers.as_slice())],
        loader,
    )
    .await?;
    let mandatory = grouped.group(GroupName::Mandatory)?;
    let header = bbs_header(&proof_hash, &hash_statements(mandatory.matching.values()));
    if !constant_time_eq(&header, &base.header) {
        info!("{SUITE} base proof header does not match the document");
        return Ok(false);
    }

    let verified = bbs_verify(
        public_key,
        &base.signature,
        &header,
        &to_messages(mandatory.non_matching.values()),
    )?;
    info!("{SUITE} base proof verified: {verified}");
    Ok(verified)
}

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
    let derived = BbsDerivedProof::from_proof_value(proof_str(proof, "proofValue")?)?;

    let labeler = ExplicitLabeler::from_ranks(&derived.label_map)?;
    let (statements, _) = canonicalize_with_labeler(unsecured, &labeler, loader).await?;

    let mandatory_indexes: BTreeSet<usize> = derived.mandatory_indexes.iter().copied().collect();
    if let Some(&out_of_range) = mandatory_indexes.range(statements.len()..).next() {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "mandatory index {out_of_range} out of range for {} statements",
            statements.len()
        ))));
    }
    let (mandatory, disclosed): (Vec<(usize, &String)>, Vec<(usize, &String)>) = statements
        .iter()
        .enumerate()
        .partition(|(i, _)| mandatory_indexes.contains(i));
    if disclosed.len() != derived.selective_indexes.len() {
        return Err(log_error!(ProofError::InvalidProofEncoding(format!(
            "{} disclosed statements for {} selective indexes",
            disclosed.len(),
            derived.selective_indexes.len()
        ))));
    }

    let proof_hash = hash_proof_config(proof, document_context(unsecured)?, loader).await?;
    let header = bbs_header(
        &proof_hash,
        &hash_statements(mandatory.iter().map(|(_, s)| *s)),
    );
    let verified = bbs_proof_verify(
        public_key,
        &derived.proof,
        &header,
        &derived.presentation_header,
        &to_messages(disclosed.iter().map(|(_, s)| *s)),
        &derived.selective_indexes,
    )?;
    info!("{SUITE} derived proof verified: {verified}");
    Ok(verified)
}
