pub use ::log;

/// Logs an error where it is created and evaluates to it.
///
/// A failed verification is an ordinary answer rather than a fault, so it is only logged at
/// debug level.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal, $err:expr) => {{
        let err = $err;
        if err != $crate::ProofError::VerificationFailed {
            $crate::macros::log::error!($fmt, err);
        } else {
            $crate::macros::log::debug!($fmt, err);
        }
        err
    }};
    ($err:expr) => {
        $crate::log_error!("error: {}", $err)
    };
}
