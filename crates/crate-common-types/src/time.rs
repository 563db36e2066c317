use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::ProofError;

/// Milliseconds since the unix epoch.
pub fn get_current_time_ms() -> Result<i64, ProofError> {
    let since_the_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ProofError::KeyMaterial(format!("system clock before epoch: {e}")))?;
    i64::try_from(since_the_epoch.as_millis())
        .map_err(|_| ProofError::KeyMaterial("system clock out of range".into()))
}
