//! Shape checks run on every request before any canonicalization.

use chrono::DateTime;
use serde_json::Value;

use common_types::log_error;
use common_types::validation::validate_uri;
use common_types::validation::MAX_URI_LEN;
use common_types::ProofError;

use crate::CREDENTIALS_CONTEXT_V2_URL;
use crate::DATA_INTEGRITY_PROOF;

fn malformed(msg: impl Into<alloc::string::String>) -> ProofError {
    log_error!(ProofError::MalformedInput(msg.into()))
}

fn check_context(value: Option<&Value>) -> Result<(), ProofError> {
    let first = match value {
        Some(Value::String(context)) => context.as_str(),
        Some(Value::Array(contexts)) => contexts
            .first()
            .ok_or_else(|| malformed("Empty @context"))?
            .as_str()
            .ok_or_else(|| malformed("First element of @context must be a string"))?,
        _ => return Err(malformed("Missing @context")),
    };
    if first != CREDENTIALS_CONTEXT_V2_URL {
        return Err(malformed(format!(
            "{CREDENTIALS_CONTEXT_V2_URL} needs to be first in the list of contexts"
        )));
    }
    Ok(())
}

fn check_type(value: Option<&Value>, expected: &str) -> Result<(), ProofError> {
    match value {
        Some(Value::String(val)) if val == expected => Ok(()),
        Some(Value::Array(val)) if val.iter().any(|v| v == expected) => Ok(()),
        _ => Err(malformed(format!("\"type\" must include `{expected}`"))),
    }
}

fn check_uri(value: &Value, field: &str) -> Result<(), ProofError> {
    match value.as_str() {
        Some(uri) if validate_uri(uri, MAX_URI_LEN) => Ok(()),
        _ => Err(malformed(format!("\"{field}\" must be a URI"))),
    }
}

fn check_date(value: Option<&Value>, field: &str) -> Result<(), ProofError> {
    match value {
        None => Ok(()),
        Some(Value::String(date)) if DateTime::parse_from_rfc3339(date).is_ok() => Ok(()),
        Some(_) => Err(malformed(format!(
            "\"{field}\" must be a valid RFC3339 date"
        ))),
    }
}

fn check_string(proof: &Value, field: &str) -> Result<(), ProofError> {
    match proof.get(field) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(malformed(format!("proof: \"{field}\" must be a string"))),
        None => Err(malformed(format!("proof: \"{field}\" property is required"))),
    }
}

/// The document must look like a credential before it is signed, derived from or verified.
pub fn check_credential(credential: &Value) -> Result<(), ProofError> {
    if !credential.is_object() {
        return Err(malformed("credential must be an object"));
    }
    check_context(credential.get("@context"))?;
    check_type(credential.get("type"), "VerifiableCredential")?;

    match credential.get("issuer") {
        Some(Value::Object(issuer)) => match issuer.get("id") {
            Some(id) => check_uri(id, "issuer.id")?,
            None => return Err(malformed("\"issuer.id\" property is required")),
        },
        Some(issuer) => check_uri(issuer, "issuer")?,
        None => return Err(malformed("\"issuer\" property is required")),
    }

    let subject = credential
        .get("credentialSubject")
        .ok_or_else(|| malformed("\"credentialSubject\" property is required"))?;
    if let Some(id) = subject.get("id") {
        check_uri(id, "credentialSubject.id")?;
    }

    check_date(credential.get("validFrom"), "validFrom")?;
    check_date(credential.get("validUntil"), "validUntil")?;
    Ok(())
}

/// Checks the fields every Data Integrity proof needs. Which suite it names is checked later.
pub fn check_proof(proof: &Value) -> Result<(), ProofError> {
    if !proof.is_object() {
        return Err(malformed("proof must be an object"));
    }
    match proof.get("type") {
        Some(Value::String(t)) if t == DATA_INTEGRITY_PROOF => {}
        _ => {
            return Err(malformed(format!(
                "proof: \"type\" must be `{DATA_INTEGRITY_PROOF}`"
            )))
        }
    }
    for field in [
        "cryptosuite",
        "proofValue",
        "verificationMethod",
        "proofPurpose",
    ] {
        check_string(proof, field)?;
    }
    check_date(proof.get("created"), "created")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::group::test_vectors::windsurf_credential;

    fn rejected(result: Result<(), ProofError>, msg: &str) {
        assert_eq!(result, Err(ProofError::MalformedInput(msg.into())));
    }

    #[test]
    fn test_check_credential() {
        let credential = windsurf_credential();
        assert_eq!(check_credential(&credential), Ok(()));

        let mut cred = credential.clone();
        cred["issuer"] = json!({"id": "did:example:12345", "name": "Race Committee"});
        cred["credentialSubject"]["id"] = json!("did:example:ebfeb1f712ebc6f1c276e12ec21");
        cred["validFrom"] = json!("2010-01-01T19:23:24Z");
        assert_eq!(check_credential(&cred), Ok(()));

        let mut cred = credential.clone();
        cred["@context"] = json!("https://www.w3.org/ns/credentials/v2");
        assert_eq!(check_credential(&cred), Ok(()));

        let mut cred = credential.clone();
        cred["@context"] = json!(["https://www.w3.org/2018/credentials/v1"]);
        rejected(
            check_credential(&cred),
            "https://www.w3.org/ns/credentials/v2 needs to be first in the list of contexts",
        );

        let mut cred = credential.clone();
        cred["@context"] = json!([]);
        rejected(check_credential(&cred), "Empty @context");

        let mut cred = credential.clone();
        cred["type"] = json!(["AlumniCredential"]);
        rejected(
            check_credential(&cred),
            "\"type\" must include `VerifiableCredential`",
        );

        let mut cred = credential.clone();
        cred["issuer"] = json!("12345");
        rejected(check_credential(&cred), "\"issuer\" must be a URI");

        let mut cred = credential.clone();
        cred["issuer"] = json!({"name": "nobody"});
        rejected(check_credential(&cred), "\"issuer.id\" property is required");

        let mut cred = credential.clone();
        cred["credentialSubject"]["id"] = json!("12345");
        rejected(
            check_credential(&cred),
            "\"credentialSubject.id\" must be a URI",
        );

        let mut cred = credential.clone();
        cred.as_object_mut().unwrap().remove("credentialSubject");
        rejected(
            check_credential(&cred),
            "\"credentialSubject\" property is required",
        );

        let mut cred = credential;
        cred["validUntil"] = json!("next tuesday");
        rejected(
            check_credential(&cred),
            "\"validUntil\" must be a valid RFC3339 date",
        );

        rejected(check_credential(&json!([1])), "credential must be an object");
    }

    #[test]
    fn test_check_proof() {
        let proof = json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-sd-2023",
            "created": "2023-08-15T23:36:38Z",
            "verificationMethod": "did:key:zDnaepBuvsQ8cpsWrVKw8fbpGpvPeNSjVPTWoq6cRqaYzBKVP#zDnaepBuvsQ8cpsWrVKw8fbpGpvPeNSjVPTWoq6cRqaYzBKVP",
            "proofPurpose": "assertionMethod",
            "proofValue": "u2V0AhVhA"
        });
        assert_eq!(check_proof(&proof), Ok(()));

        let mut no_created = proof.clone();
        no_created.as_object_mut().unwrap().remove("created");
        assert_eq!(check_proof(&no_created), Ok(()));

        let mut bad = proof.clone();
        bad["type"] = json!("Ed25519Signature2020");
        rejected(
            check_proof(&bad),
            "proof: \"type\" must be `DataIntegrityProof`",
        );

        let mut bad = proof.clone();
        bad.as_object_mut().unwrap().remove("proofValue");
        rejected(check_proof(&bad), "proof: \"proofValue\" property is required");

        let mut bad = proof.clone();
        bad["cryptosuite"] = json!(7);
        rejected(check_proof(&bad), "proof: \"cryptosuite\" must be a string");

        let mut bad = proof;
        bad["created"] = json!("yesterday");
        rejected(check_proof(&bad), "\"created\" must be a valid RFC3339 date");
    }
}
