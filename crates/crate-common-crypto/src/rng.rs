use core::num::NonZeroU32;

use log::error;
use rand_core::CryptoRng;
use rand_core::Error;
use rand_core::OsRng;
use rand_core::RngCore;

const RNG_FAILURE_CODE: NonZeroU32 = match NonZeroU32::new(Error::CUSTOM_START) {
    Some(code) => code,
    None => panic!("custom rng error code is zero"),
};

/// The randomness used for key generation, HMAC keys and BBS blinding.
#[derive(Default, Clone, Copy)]
pub struct SdRng;

impl SdRng {
    pub fn new() -> Self {
        Self
    }
}

impl RngCore for SdRng {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.try_fill_bytes(dest) {
            panic!("fill_bytes failed: {}", err);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            error!("os random source failed: {e}");
            Error::from(RNG_FAILURE_CODE)
        })
    }
}

impl CryptoRng for SdRng {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sd_rng_fills() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        SdRng::new().fill_bytes(&mut a);
        SdRng::new().fill_bytes(&mut b);
        assert_ne!(a, b);
        assert_ne!(SdRng.next_u64(), SdRng.next_u64());
    }
}
