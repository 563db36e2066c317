//! Selective disclosure Data Integrity proofs: the `ecdsa-sd-2023` and `bbs-2023` cryptosuites,
//! proof sets and chains, and a request facade over them.

#[macro_use]
extern crate alloc;

pub mod bbs;
mod canonicalize;
pub mod check;
mod contexts;
pub mod ecdsa_sd;
pub mod group;
mod json_pointer;
pub mod keys;
pub mod multikey;
pub mod proof_chain;
mod proof_value;
mod select;
pub mod service;
mod skolemize;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use chrono::DateTime;
use serde_json::Value;

use common_types::log_error;
use common_types::time::get_current_time_ms;
use common_types::ProofError;

pub use crate::canonicalize::ExplicitLabeler;
pub use crate::canonicalize::HmacLabeler;
pub use crate::canonicalize::LabelMapFactory;
pub use crate::canonicalize::ShuffledHmacLabeler;
pub use crate::contexts::new_static_loader;
pub use crate::contexts::StaticLoader;
pub use crate::json_pointer::parse_pointers;
pub use crate::json_pointer::JsonPointer;
pub use crate::json_pointer::JsonPointerBuf;
pub use crate::proof_value::is_base;
pub use crate::proof_value::ProofHeader;
pub use crate::select::default_selective_pointers;
pub use crate::select::select_json_ld;

pub const CREDENTIALS_CONTEXT_V2_URL: &str = "https://www.w3.org/ns/credentials/v2";
pub const CREDENTIALS_EXAMPLES_V2_URL: &str = "https://www.w3.org/ns/credentials/examples/v2";
pub const DATA_INTEGRITY_V2_URL: &str = "https://w3id.org/security/data-integrity/v2";

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const ASSERTION_METHOD: &str = "assertionMethod";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cryptosuite {
    EcdsaSd2023,
    Bbs2023,
}

impl Cryptosuite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cryptosuite::EcdsaSd2023 => "ecdsa-sd-2023",
            Cryptosuite::Bbs2023 => "bbs-2023",
        }
    }
}

impl fmt::Display for Cryptosuite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cryptosuite {
    type Err = ProofError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ecdsa-sd-2023" => Ok(Cryptosuite::EcdsaSd2023),
            "bbs-2023" => Ok(Cryptosuite::Bbs2023),
            _ => Err(log_error!(ProofError::CryptosuiteMismatch(format!(
                "unsupported cryptosuite {s}"
            )))),
        }
    }
}

pub fn now_rfc3339() -> Result<String, ProofError> {
    use chrono::format::SecondsFormat;
    let now = get_current_time_ms()?;
    DateTime::from_timestamp_millis(now)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true /* use_z */))
        .ok_or_else(|| log_error!(ProofError::KeyMaterial(format!("invalid time {now}"))))
}

pub fn multibase_base58btc(b: &[u8]) -> Result<String, ProofError> {
    // We want to prepare our buffer with 'z' before writing base58 into it. Doing this neatly
    // leads to bs58 aggressively overallocating, so we can be a little tricky...
    let max_b58_len = b.len() * 138 / 100 + 1;
    let mut buf = vec![0; 1 + max_b58_len]; // + 'z'
    buf[0] = b'z';
    let n = bs58::encode(b)
        .onto(&mut buf[1..])
        .map_err(|e| log_error!(ProofError::KeyMaterial(format!("bs58 encode failed: {e}"))))?;
    buf.truncate(n + 1);
    String::from_utf8(buf).map_err(|_| {
        log_error!(ProofError::KeyMaterial(
            "bs58 produced non-utf8 output".into()
        ))
    })
}

pub fn decode_multibase_base58btc(encoded: &str) -> Result<Vec<u8>, ProofError> {
    let encoded = encoded.strip_prefix('z').ok_or_else(|| {
        log_error!(ProofError::MalformedInput(
            "multibase string does not have base58 prefix".into()
        ))
    })?;
    bs58::decode(encoded).into_vec().map_err(|_| {
        log_error!(ProofError::MalformedInput(
            "failed to decode base58 string".into()
        ))
    })
}

/// Returns a copy of `document` whose `@context` also names the data integrity context, unless
/// credentials v2 (which already defines the proof terms) or the data integrity context is
/// present.
pub fn inject_data_integrity_context(document: &Value) -> Result<Value, ProofError> {
    let mut document = document.clone();
    let context = document
        .get_mut("@context")
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document has no @context".into())))?;
    if let Value::String(single) = context {
        *context = Value::Array(vec![Value::String(core::mem::take(single))]);
    }
    let entries = context.as_array_mut().ok_or_else(|| {
        log_error!(ProofError::MalformedInput(
            "@context is not a string or array".into()
        ))
    })?;
    if !entries.iter().any(|c| {
        matches!(
            c.as_str(),
            Some(DATA_INTEGRITY_V2_URL | CREDENTIALS_CONTEXT_V2_URL)
        )
    }) {
        entries.push(DATA_INTEGRITY_V2_URL.into());
    }
    Ok(document)
}

/// Splits a secured document into a copy without `proof` and the proof object itself.
pub(crate) fn split_proof(document: &Value) -> Result<(Value, Value), ProofError> {
    let mut unsecured = document.clone();
    let proof = unsecured
        .as_object_mut()
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document is not an object".into())))?
        .remove("proof")
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document has no proof".into())))?;
    if !proof.is_object() {
        return Err(log_error!(ProofError::MalformedInput(
            "proof is not an object".into()
        )));
    }
    Ok((unsecured, proof))
}

pub(crate) fn proof_str<'a>(proof: &'a Value, field: &str) -> Result<&'a str, ProofError> {
    proof
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| log_error!(ProofError::MalformedInput(format!("proof has no {field}"))))
}

pub(crate) fn document_context(document: &Value) -> Result<&Value, ProofError> {
    document
        .get("@context")
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document has no @context".into())))
}

/// Fails with `CryptosuiteMismatch` unless `proof` names `suite`.
pub(crate) fn expect_cryptosuite(proof: &Value, suite: Cryptosuite) -> Result<(), ProofError> {
    let found = proof_str(proof, "cryptosuite")?;
    if found != suite.as_str() {
        return Err(log_error!(ProofError::CryptosuiteMismatch(format!(
            "expected {suite}, found {found}"
        ))));
    }
    Ok(())
}

/// The proof configuration an issuer uses when none is supplied.
pub fn new_proof_config(suite: Cryptosuite, verification_method: String) -> Result<Value, ProofError> {
    Ok(serde_json::json!({
        "type": DATA_INTEGRITY_PROOF,
        "cryptosuite": suite.as_str(),
        "created": now_rfc3339()?,
        "verificationMethod": verification_method,
        "proofPurpose": ASSERTION_METHOD,
    }))
}

/// Attaches `proof_config` plus `proofValue` as the document's `proof`.
pub(crate) fn attach_proof(
    mut document: Value,
    mut proof_config: Value,
    proof_value: String,
) -> Result<Value, ProofError> {
    let proof = proof_config.as_object_mut().ok_or_else(|| {
        log_error!(ProofError::MalformedInput("proof is not an object".into()))
    })?;
    proof.remove("@context");
    proof.insert("proofValue".into(), proof_value.into());
    document
        .as_object_mut()
        .ok_or_else(|| log_error!(ProofError::MalformedInput("document is not an object".into())))?
        .insert("proof".into(), proof_config);
    Ok(document)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_multibase_base58btc() {
        // From https://datatracker.ietf.org/doc/html/draft-multiformats-multibase-03#section-3.1
        let out = multibase_base58btc(r#"Multibase is awesome! \o/"#.as_bytes()).unwrap();
        assert_eq!(out, "zYAjKoNbau5KiqmHPmSxYCvn66dA1vLmwbt");
        assert_eq!(out.capacity(), 36);
        assert_eq!(out.len(), 35);
        assert_eq!(
            decode_multibase_base58btc(&out).unwrap(),
            br"Multibase is awesome! \o/"
        );

        for (ch, len) in (0..=256).flat_map(|len| [(0u8, len), (0xffu8, len)]) {
            let bytes = vec![ch; len];
            let _ = multibase_base58btc(&bytes).unwrap();
        }
        assert!(matches!(
            decode_multibase_base58btc("uAAAA"),
            Err(ProofError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_cryptosuite_names() {
        for suite in [Cryptosuite::EcdsaSd2023, Cryptosuite::Bbs2023] {
            assert_eq!(suite.as_str().parse::<Cryptosuite>(), Ok(suite));
        }
        assert!(matches!(
            "ecdsa-rdfc-2019".parse::<Cryptosuite>(),
            Err(ProofError::CryptosuiteMismatch(_))
        ));
    }

    #[test]
    fn test_inject_data_integrity_context() {
        let v2 = json!({"@context": [CREDENTIALS_CONTEXT_V2_URL], "type": "X"});
        assert_eq!(inject_data_integrity_context(&v2).unwrap(), v2);

        let other = json!({"@context": "https://example.org/ctx", "type": "X"});
        let injected = inject_data_integrity_context(&other).unwrap();
        assert_eq!(
            injected["@context"],
            json!(["https://example.org/ctx", DATA_INTEGRITY_V2_URL])
        );
        // the caller's copy is left alone
        assert_eq!(other["@context"], json!("https://example.org/ctx"));

        assert!(matches!(
            inject_data_integrity_context(&json!({"type": "X"})),
            Err(ProofError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_split_proof() {
        let doc = json!({"a": 1, "proof": {"type": DATA_INTEGRITY_PROOF}});
        let (unsecured, proof) = split_proof(&doc).unwrap();
        assert_eq!(unsecured, json!({"a": 1}));
        assert_eq!(proof_str(&proof, "type").unwrap(), DATA_INTEGRITY_PROOF);
        assert!(matches!(
            proof_str(&proof, "proofValue"),
            Err(ProofError::MalformedInput(_))
        ));
        assert!(split_proof(&json!({"a": 1})).is_err());
        assert!(split_proof(&json!({"proof": []})).is_err());
    }

    #[test]
    fn test_expect_cryptosuite() {
        let proof = json!({"cryptosuite": "bbs-2023"});
        assert!(expect_cryptosuite(&proof, Cryptosuite::Bbs2023).is_ok());
        assert!(matches!(
            expect_cryptosuite(&proof, Cryptosuite::EcdsaSd2023),
            Err(ProofError::CryptosuiteMismatch(_))
        ));
    }

    #[test]
    fn test_attach_proof() {
        let config = new_proof_config(Cryptosuite::EcdsaSd2023, "did:key:z1#z1".into()).unwrap();
        let mut with_context = config.clone();
        with_context["@context"] = json!([CREDENTIALS_CONTEXT_V2_URL]);
        let secured = attach_proof(json!({"a": 1}), with_context, "uAA".into()).unwrap();
        let proof = &secured["proof"];
        assert!(proof.get("@context").is_none());
        assert_eq!(proof["proofValue"], "uAA");
        assert_eq!(proof["created"], config["created"]);
        assert_eq!(proof["proofPurpose"], ASSERTION_METHOD);
    }

    #[test]
    fn test_now_rfc3339() {
        let now = now_rfc3339().unwrap();
        assert!(now.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&now).is_ok());
        assert!(!now.contains('.'));
    }
}
