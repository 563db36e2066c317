//! Common types and functions shared by the selective disclosure crates

#[macro_use]
extern crate alloc;

/// Functions for cbor
pub mod cbor;

/// common macros
pub mod macros;

/// common definitions for getting the current time
pub mod time;

/// field validation helpers
pub mod validation;

use alloc::string::String;
use core::error::Error;
use core::fmt;
use core::str::FromStr;

/// Every failure a proof operation can report.
///
/// `VerificationFailed` is the only kind that does not mean "the request could not be evaluated";
/// the verifiers themselves return `Ok(false)` and only the request layer turns that into this
/// variant.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ProofError {
    /// Missing document, proof or selection, or a document of the wrong shape.
    MalformedInput(String),
    /// Bad header tag, wrong component count or types, wrong byte lengths.
    InvalidProofEncoding(String),
    /// The proof's cryptosuite does not match the suite doing the verifying.
    CryptosuiteMismatch(String),
    /// A `previousProof` reference names a proof that is not present.
    UnresolvedProofDependency(String),
    VerificationFailed,
    /// Context resolution, JSON-LD expansion or RDF conversion failed.
    UnderlyingCanonicalizationFailure(String),
    /// Key material could not be loaded, parsed or used.
    KeyMaterial(String),
}

impl ProofError {
    /// Short, stable name for the error kind, used in logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ProofError::MalformedInput(_) => "MalformedInput",
            ProofError::InvalidProofEncoding(_) => "InvalidProofEncoding",
            ProofError::CryptosuiteMismatch(_) => "CryptosuiteMismatch",
            ProofError::UnresolvedProofDependency(_) => "UnresolvedProofDependency",
            ProofError::VerificationFailed => "VerificationFailed",
            ProofError::UnderlyingCanonicalizationFailure(_) => {
                "UnderlyingCanonicalizationFailure"
            }
            ProofError::KeyMaterial(_) => "KeyMaterial",
        }
    }
}

impl Error for ProofError {}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProofError::MalformedInput(msg) => write!(f, "Malformed Input {}", msg),
            ProofError::InvalidProofEncoding(msg) => write!(f, "Invalid Proof Encoding {}", msg),
            ProofError::CryptosuiteMismatch(msg) => write!(f, "Cryptosuite Mismatch {}", msg),
            ProofError::UnresolvedProofDependency(msg) => {
                write!(f, "Unresolved Proof Dependency {}", msg)
            }
            ProofError::VerificationFailed => write!(f, "Verification failed"),
            ProofError::UnderlyingCanonicalizationFailure(msg) => {
                write!(f, "Canonicalization Failure {}", msg)
            }
            ProofError::KeyMaterial(msg) => write!(f, "Key Material Error {}", msg),
        }
    }
}

// Parses an unsigned int, but only allows the normal form.  Ie, "+0001" is not allowed.
pub fn strict_uint<T>(s: &str) -> Option<T>
where
    T: From<u8> + FromStr + num_traits::sign::Unsigned,
{
    match s.as_bytes() {
        [] => None,
        [b @ b'0'..=b'9'] => Some((b - b'0').into()),
        [b'1'..=b'9', ..] => s.parse().ok(),
        _ => None,
    }
}

/// Panics if input.len() != N * 2.
pub const fn hex_array<const N: usize>(input: &str) -> [u8; N] {
    const fn digit(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'A'..=b'F' => b - b'A' + 10,
            b'a'..=b'f' => b - b'a' + 10,
            _ => panic!("invalid hex digit"),
        }
    }

    if input.len() < N * 2 {
        panic!("input is too short");
    } else if input.len() > N * 2 {
        panic!("input is too long");
    }

    let input = input.as_bytes();

    let mut i = 0;
    let mut out = [0u8; N];
    loop {
        if i >= N {
            return out;
        }
        out[i] = (digit(input[2 * i]) << 4) + digit(input[2 * i + 1]);
        i += 1;
    }
}

/// Runtime counterpart of [`hex_array`] for data read from configuration.
pub fn decode_hex(input: &str) -> Result<alloc::vec::Vec<u8>, ProofError> {
    if input.len() % 2 != 0 {
        return Err(ProofError::MalformedInput(
            "hex string has odd length".into(),
        ));
    }
    (0..input.len())
        .step_by(2)
        .map(|i| {
            input
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ProofError::MalformedInput(format!("invalid hex at offset {i}")))
        })
        .collect()
}
