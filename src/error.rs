//! Errors returned by a binding run.

use thiserror::Error;

use crate::coerce::CoercionError;
use crate::crypto::CryptoError;

/// Failure classes of a binding run. Every class is fatal to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidTarget,
    RequiredKeyMissing,
    DecryptionFailed,
    CoercionFailed,
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("cannot bind into {type_name}: {reason}")]
    InvalidTarget {
        type_name: &'static str,
        reason: String,
    },
    #[error("required key {key} is missing")]
    RequiredKeyMissing { key: String },
    #[error("field {key} is marked as encrypted but no decrypter is provided")]
    DecrypterMissing { key: String },
    #[error("decryption failed for {key}: {source}")]
    DecryptionFailed {
        key: String,
        #[source]
        source: CryptoError,
    },
    #[error("invalid value for {key}: {source}")]
    CoercionFailed {
        key: String,
        #[source]
        source: CoercionError,
    },
}

impl BindError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            BindError::RequiredKeyMissing { .. } => ErrorKind::RequiredKeyMissing,
            BindError::DecrypterMissing { .. } | BindError::DecryptionFailed { .. } => {
                ErrorKind::DecryptionFailed
            }
            BindError::CoercionFailed { .. } => ErrorKind::CoercionFailed,
        }
    }

    /// Lookup key of the field that failed, if the failure is field level.
    pub fn key(&self) -> Option<&str> {
        match self {
            BindError::InvalidTarget { .. } => None,
            BindError::RequiredKeyMissing { key }
            | BindError::DecrypterMissing { key }
            | BindError::DecryptionFailed { key, .. }
            | BindError::CoercionFailed { key, .. } => Some(key),
        }
    }
}
