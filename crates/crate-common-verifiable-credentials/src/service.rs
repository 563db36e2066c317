//! Request facade: one entry point per issuer/holder/verifier operation, with input checks,
//! context injection and per-request log correlation in front of the suites.

use core::fmt;

use log::info;
use log::warn;
use serde_json::Value;
use uuid::Uuid;

use common_crypto::bbs_crypto::install_rng_for_bbs;
use common_crypto::generate_random;
use common_types::log_error;
use common_types::ProofError;

use crate::bbs;
use crate::bbs::BbsSignOptions;
use crate::check::check_credential;
use crate::check::check_proof;
use crate::ecdsa_sd;
use crate::ecdsa_sd::SignOptions;
use crate::inject_data_integrity_context;
use crate::json_pointer::JsonPointerBuf;
use crate::keys::ServiceConfig;
use crate::proof_chain::add_chained_proof;
use crate::proof_chain::verify_proof_set;
use crate::proof_chain::verify_single_proof;
use crate::proof_chain::ProofSigner;
use crate::proof_str;
use crate::proof_value::proof_header;
use crate::split_proof;
use crate::Cryptosuite;
use crate::new_static_loader;
use crate::StaticLoader;

/// Per-request state: a correlation id for the logs and a private copy of the context loader.
pub struct RequestContext {
    pub correlation_id: Uuid,
    loader: StaticLoader,
}

impl RequestContext {
    pub fn new() -> Result<Self, ProofError> {
        let bytes: [u8; 16] = generate_random(16)?
            .try_into()
            .map_err(|_| log_error!(ProofError::KeyMaterial("short random read".into())))?;
        Ok(Self {
            correlation_id: uuid::Builder::from_random_bytes(bytes).into_uuid(),
            loader: new_static_loader(),
        })
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[req={}]", self.correlation_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub verified: bool,
    pub correlation_id: Uuid,
}

impl VerifyOutcome {
    /// `VerificationFailed` for a proof that did not verify.
    pub fn into_result(self) -> Result<Uuid, ProofError> {
        if self.verified {
            Ok(self.correlation_id)
        } else {
            Err(log_error!(ProofError::VerificationFailed))
        }
    }
}

/// The HTTP status a web front end reports for an error.
pub fn http_status(error: &ProofError) -> u16 {
    match error {
        ProofError::MalformedInput(_)
        | ProofError::InvalidProofEncoding(_)
        | ProofError::CryptosuiteMismatch(_)
        | ProofError::UnresolvedProofDependency(_)
        | ProofError::VerificationFailed => 400,
        ProofError::UnderlyingCanonicalizationFailure(_) | ProofError::KeyMaterial(_) => 500,
    }
}

fn proof_object(credential: &Value) -> Result<&Value, ProofError> {
    match credential.get("proof") {
        Some(proof @ Value::Object(_)) => Ok(proof),
        Some(_) => Err(log_error!(ProofError::MalformedInput(
            "proof must be a single object".into()
        ))),
        None => Err(log_error!(ProofError::MalformedInput(
            "no proof on credential".into()
        ))),
    }
}

fn proof_suite(proof: &Value) -> Result<Cryptosuite, ProofError> {
    proof_str(proof, "cryptosuite")?.parse()
}

/// Which kind of proof a verify call accepts.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Accept {
    Base,
    Derived,
    Any,
}

pub struct SdService {
    config: ServiceConfig,
}

impl SdService {
    pub fn new(config: ServiceConfig) -> Self {
        install_rng_for_bbs();
        Self { config }
    }

    fn signer<'a>(
        &'a self,
        suite: Cryptosuite,
        mandatory_pointers: &'a [JsonPointerBuf],
    ) -> ProofSigner<'a> {
        match suite {
            Cryptosuite::EcdsaSd2023 => ProofSigner::EcdsaSd {
                key_pair: &self.config.keys.ecdsa,
                mandatory_pointers,
            },
            Cryptosuite::Bbs2023 => ProofSigner::Bbs {
                key_pair: &self.config.keys.bbs,
                mandatory_pointers,
            },
        }
    }

    /// Adds a base proof. No mandatory pointers means every statement is selectively disclosable.
    pub async fn issue(
        &self,
        suite: Cryptosuite,
        credential: &Value,
        mandatory_pointers: Option<&[JsonPointerBuf]>,
    ) -> Result<Value, ProofError> {
        let mut ctx = RequestContext::new()?;
        info!("{ctx} issue {suite}");
        check_credential(credential)?;
        let document = inject_data_integrity_context(credential)?;
        let mandatory_pointers = mandatory_pointers.unwrap_or_default();
        let signed = match suite {
            Cryptosuite::EcdsaSd2023 => {
                ecdsa_sd::sign_base(
                    &document,
                    &self.config.keys.ecdsa,
                    mandatory_pointers,
                    SignOptions::default(),
                    &mut ctx.loader,
                )
                .await?
            }
            Cryptosuite::Bbs2023 => {
                bbs::sign_base(
                    &document,
                    &self.config.keys.bbs,
                    mandatory_pointers,
                    BbsSignOptions::default(),
                    &mut ctx.loader,
                )
                .await?
            }
        };
        info!("{ctx} issued {suite} credential");
        Ok(signed)
    }

    /// Adds one more proof to a credential, after the proofs named in `previous_proof_ids`.
    pub async fn issue_chained(
        &self,
        suite: Cryptosuite,
        credential: &Value,
        previous_proof_ids: &[&str],
        mandatory_pointers: Option<&[JsonPointerBuf]>,
    ) -> Result<Value, ProofError> {
        let mut ctx = RequestContext::new()?;
        info!(
            "{ctx} issue {suite} after {} previous proofs",
            previous_proof_ids.len()
        );
        check_credential(credential)?;
        let document = inject_data_integrity_context(credential)?;
        let signer = self.signer(suite, mandatory_pointers.unwrap_or_default());
        add_chained_proof(&document, previous_proof_ids, &signer, &mut ctx.loader).await
    }

    pub async fn derive(
        &self,
        credential: &Value,
        selective_pointers: Option<&[JsonPointerBuf]>,
    ) -> Result<Value, ProofError> {
        let mut ctx = RequestContext::new()?;
        info!("{ctx} derive");
        check_credential(credential)?;
        let selective_pointers = selective_pointers
            .ok_or_else(|| log_error!(ProofError::MalformedInput("nothing selected".into())))?;
        let proof = proof_object(credential)?;
        check_proof(proof)?;
        let suite = proof_suite(proof)?;
        let document = inject_data_integrity_context(credential)?;
        let derived = match suite {
            Cryptosuite::EcdsaSd2023 => {
                ecdsa_sd::derive(&document, selective_pointers, &mut ctx.loader).await?
            }
            Cryptosuite::Bbs2023 => {
                bbs::derive(&document, selective_pointers, &mut ctx.loader).await?
            }
        };
        info!(
            "{ctx} derived {suite} credential revealing {} pointers",
            selective_pointers.len()
        );
        Ok(derived)
    }

    /// Verifies a derived proof. A base proof is reported as not verified.
    pub async fn verify(&self, credential: &Value) -> Result<VerifyOutcome, ProofError> {
        self.verify_one(credential, Accept::Derived).await
    }

    /// Verifies a base proof. A derived proof is reported as not verified.
    pub async fn verify_base(&self, credential: &Value) -> Result<VerifyOutcome, ProofError> {
        self.verify_one(credential, Accept::Base).await
    }

    /// Verifies whatever the credential carries: a base or derived proof, or a set or chain of
    /// proofs of one suite.
    pub async fn verify_any(&self, credential: &Value) -> Result<VerifyOutcome, ProofError> {
        match credential.get("proof") {
            Some(Value::Array(proofs)) => {
                let mut ctx = RequestContext::new()?;
                info!("{ctx} verify set of {} proofs", proofs.len());
                check_credential(credential)?;
                for proof in proofs {
                    check_proof(proof)?;
                }
                let suite = proofs.first().map(proof_suite).transpose()?.ok_or_else(|| {
                    log_error!(ProofError::MalformedInput("no proof on credential".into()))
                })?;
                let document = inject_data_integrity_context(credential)?;
                let verified = verify_proof_set(&document, suite, &mut ctx.loader).await?;
                info!("{ctx} {suite} proof set verified: {verified}");
                Ok(VerifyOutcome {
                    verified,
                    correlation_id: ctx.correlation_id,
                })
            }
            _ => self.verify_one(credential, Accept::Any).await,
        }
    }

    async fn verify_one(
        &self,
        credential: &Value,
        accept: Accept,
    ) -> Result<VerifyOutcome, ProofError> {
        let mut ctx = RequestContext::new()?;
        info!("{ctx} verify");
        check_credential(credential)?;
        let proof = proof_object(credential)?;
        check_proof(proof)?;
        let suite = proof_suite(proof)?;
        let header = proof_header(proof_str(proof, "proofValue")?)?;
        if header.cryptosuite() != suite {
            return Err(log_error!(ProofError::CryptosuiteMismatch(format!(
                "proof names {suite} but its value is a {} proof",
                header.cryptosuite()
            ))));
        }

        let verified = match (accept, header.is_base()) {
            (Accept::Derived, true) => {
                warn!("{ctx} not a derived proof");
                false
            }
            (Accept::Base, false) => {
                warn!("{ctx} not a base proof");
                false
            }
            _ => {
                let document = inject_data_integrity_context(credential)?;
                let (unsecured, proof) = split_proof(&document)?;
                verify_single_proof(&unsecured, &proof, suite, &mut ctx.loader).await?
            }
        };
        info!("{ctx} {suite} {header:?} proof verified: {verified}");
        Ok(VerifyOutcome {
            verified,
            correlation_id: ctx.correlation_id,
        })
    }
}

#[cfg(test)]
mod async_tests {
    use serde_json::json;

    use common_async::expect_ready;

    use super::*;
    use crate::group::test_vectors::*;
    use crate::json_pointer::parse_pointers;
    use crate::keys::IssuerKeyMaterial;
    use crate::proof_value::is_base;

    const SUITES: [Cryptosuite; 2] = [Cryptosuite::EcdsaSd2023, Cryptosuite::Bbs2023];

    fn service() -> SdService {
        SdService::new(ServiceConfig::new(IssuerKeyMaterial::generate()))
    }

    fn issue(service: &SdService, suite: Cryptosuite, mandatory: &[JsonPointerBuf]) -> Value {
        expect_ready(service.issue(suite, &windsurf_credential(), Some(mandatory)))
            .expect("future was not ready")
            .unwrap()
    }

    fn derive(service: &SdService, credential: &Value) -> Value {
        let selective = windsurf_selective_pointers();
        expect_ready(service.derive(credential, Some(selective.as_slice())))
            .expect("future was not ready")
            .unwrap()
    }

    fn verified(result: Option<Result<VerifyOutcome, ProofError>>) -> bool {
        result.expect("future was not ready").unwrap().verified
    }

    #[test]
    fn test_issue_derive_verify() {
        let service = service();
        for suite in SUITES {
            let signed = issue(&service, suite, &windsurf_mandatory_pointers());
            assert_eq!(signed["proof"]["cryptosuite"], suite.as_str());
            let derived = derive(&service, &signed);

            assert!(verified(expect_ready(service.verify(&derived))), "{suite}");
            assert!(!verified(expect_ready(service.verify(&signed))), "{suite}");
            assert!(verified(expect_ready(service.verify_base(&signed))), "{suite}");
            assert!(!verified(expect_ready(service.verify_base(&derived))), "{suite}");
            assert!(verified(expect_ready(service.verify_any(&signed))), "{suite}");
            assert!(verified(expect_ready(service.verify_any(&derived))), "{suite}");
        }
    }

    #[test]
    fn test_default_mandatory_pointers() {
        let service = service();
        let signed = expect_ready(service.issue(
            Cryptosuite::EcdsaSd2023,
            &windsurf_credential(),
            None,
        ))
        .unwrap()
        .unwrap();
        assert_eq!(
            is_base(signed["proof"]["proofValue"].as_str().unwrap()),
            Ok(true)
        );
        assert!(verified(expect_ready(service.verify_base(&signed))));
    }

    #[test]
    fn test_tampered_credential_fails() {
        let service = service();
        for suite in SUITES {
            let signed = issue(&service, suite, &[]);
            let mut derived = derive(&service, &signed);
            derived["credentialSubject"]["boards"][0]["brand"] = json!("Naish");
            let outcome = expect_ready(service.verify(&derived)).unwrap().unwrap();
            assert!(!outcome.verified);
            assert_eq!(outcome.into_result(), Err(ProofError::VerificationFailed));
        }
    }

    #[test]
    fn test_correlation_ids_differ() {
        let service = service();
        let signed = issue(&service, Cryptosuite::Bbs2023, &[]);
        let a = expect_ready(service.verify_base(&signed)).unwrap().unwrap();
        let b = expect_ready(service.verify_base(&signed)).unwrap().unwrap();
        assert_ne!(a.correlation_id, b.correlation_id);
        assert_eq!(a.into_result(), Ok(a.correlation_id));
    }

    #[test]
    fn test_bad_requests() {
        let service = service();
        let signed = issue(&service, Cryptosuite::EcdsaSd2023, &[]);

        let err = expect_ready(service.derive(&signed, None)).unwrap().unwrap_err();
        assert_eq!(err, ProofError::MalformedInput("nothing selected".into()));
        assert_eq!(http_status(&err), 400);

        let unsigned = windsurf_credential();
        assert!(matches!(
            expect_ready(service.verify(&unsigned)).unwrap(),
            Err(ProofError::MalformedInput(_))
        ));

        let mut not_a_credential = windsurf_credential();
        not_a_credential["type"] = json!(["Windsurfer"]);
        assert!(matches!(
            expect_ready(service.issue(Cryptosuite::Bbs2023, &not_a_credential, None)).unwrap(),
            Err(ProofError::MalformedInput(_))
        ));

        let mut unknown_suite = signed.clone();
        unknown_suite["proof"]["cryptosuite"] = json!("eddsa-rdfc-2022");
        assert!(matches!(
            expect_ready(service.verify_base(&unknown_suite)).unwrap(),
            Err(ProofError::CryptosuiteMismatch(_))
        ));

        let mut relabelled = signed;
        relabelled["proof"]["cryptosuite"] = json!("bbs-2023");
        assert!(matches!(
            expect_ready(service.verify_base(&relabelled)).unwrap(),
            Err(ProofError::CryptosuiteMismatch(_))
        ));
    }

    #[test]
    fn test_proof_chain_through_service() {
        let service = service();
        let once = expect_ready(service.issue_chained(
            Cryptosuite::Bbs2023,
            &windsurf_credential(),
            &[],
            None,
        ))
        .unwrap()
        .unwrap();
        let first_id = once["proof"][0]["id"].as_str().unwrap().to_string();
        let mandatory = parse_pointers(["/issuer"]).unwrap();
        let twice = expect_ready(service.issue_chained(
            Cryptosuite::Bbs2023,
            &once,
            &[&first_id],
            Some(mandatory.as_slice()),
        ))
        .unwrap()
        .unwrap();
        assert!(verified(expect_ready(service.verify_any(&twice))));

        let mut broken = twice;
        broken["proof"][1]["previousProof"] = json!("urn:uuid:missing");
        assert!(matches!(
            expect_ready(service.verify_any(&broken)).unwrap(),
            Err(ProofError::UnresolvedProofDependency(_))
        ));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(http_status(&ProofError::VerificationFailed), 400);
        assert_eq!(
            http_status(&ProofError::InvalidProofEncoding("x".into())),
            400
        );
        assert_eq!(
            http_status(&ProofError::UnderlyingCanonicalizationFailure("x".into())),
            500
        );
        assert_eq!(http_status(&ProofError::KeyMaterial("x".into())), 500);
    }
}
