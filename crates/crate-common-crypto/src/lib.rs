//! Cryptographic primitives used by the selective disclosure suites.
//! Hashing, HMAC and randomness are backed by RustCrypto crates, BBS by zkryptium.

#[macro_use]
extern crate alloc;

use alloc::vec::Vec;

use hmac::Hmac;
use hmac::Mac;
use log::error;
use rand_core::OsRng;
use rand_core::RngCore;
use sha2::Digest;
use sha2::Sha256;

use common_types::log_error;
use common_types::ProofError;

pub mod bbs_crypto;
pub mod ecdsa;
pub mod rng;

pub const SHA256_LEN: usize = 32;

pub fn sha256<D>(data: D) -> [u8; SHA256_LEN]
where
    D: AsRef<[u8]>,
{
    Sha256::digest(data.as_ref()).into()
}

/// Fills a new buffer of `len` bytes from the operating system's random source.
pub fn generate_random(len: usize) -> Result<Vec<u8>, ProofError> {
    let mut buf = vec![0u8; len];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        error!("random source failed: {e}");
        log_error!(ProofError::KeyMaterial("random source unavailable".into()))
    })?;
    Ok(buf)
}

/// Compare two slices of bytes in constant time. This exists for the sake of comparing hashes
/// recomputed during verification, avoiding time-based side channel attacks.
#[inline]
pub fn constant_time_eq<A, B>(a: A, b: B) -> bool
where
    A: AsRef<[u8]>,
    B: AsRef<[u8]>,
{
    let a = a.as_ref();
    let b = b.as_ref();

    if a.len() != b.len() {
        return false;
    }

    #[inline(never)]
    fn eq_inner(a: &[u8], b: &[u8]) -> bool {
        assert_eq!(a.len(), b.len());
        use core::ptr::read_volatile;
        0 == a.iter().zip(b).fold(
            0,
            core::hint::black_box(|agg, (a, b)| {
                // Safety: references yielded from a/b.iter() must be safe to read.
                agg | unsafe { read_volatile(a as *const u8) ^ read_volatile(b as *const u8) }
            }),
        )
    }

    eq_inner(a, b)
}

pub struct HmacSha256Writer(Hmac<Sha256>);

impl HmacSha256Writer {
    pub fn new(key: &[u8]) -> Result<Self, ProofError> {
        let mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| log_error!(ProofError::KeyMaterial(format!("invalid hmac key: {e}"))))?;
        Ok(Self(mac))
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.0.update(buf);
    }

    pub fn finalize(self) -> [u8; SHA256_LEN] {
        self.0.finalize().into_bytes().into()
    }
}

#[derive(Default)]
pub struct Sha256Writer(Sha256);

impl Sha256Writer {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.0.update(buf);
    }

    pub fn finalize(self) -> [u8; SHA256_LEN] {
        self.0.finalize().into()
    }
}
