use alloc::vec::Vec;

use serde::Serialize;

use crate::ProofError;

/// Writes `prefix` followed by the CBOR encoding of `s`.
///
/// Built without its `"std"` feature, [`serde_cbor::to_vec`] is not available, even though
/// nothing about writing into a `Vec` needs `std::io`.
pub fn to_vec_with_prefix<S: Serialize>(prefix: &[u8], s: &S) -> Result<Vec<u8>, ProofError> {
    let mut v = VecWriter(Vec::with_capacity(512));
    v.0.extend_from_slice(prefix);
    let mut ser = serde_cbor::ser::Serializer::new(&mut v);
    s.serialize(&mut ser)
        .map_err(|e| ProofError::InvalidProofEncoding(format!("serialize failed - {e}")))?;
    Ok(v.0)
}

struct VecWriter(Vec<u8>);

impl serde_cbor::ser::Write for VecWriter {
    type Error = serde_cbor::Error;
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.0.extend_from_slice(buf);
        Ok(())
    }
}
