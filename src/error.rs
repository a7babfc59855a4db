//! Error handling for the white-box decryption engine
//!
//! Every failure is fatal for the decryption attempt it occurs in: decryption is
//! deterministic, so nothing is retried and no partial plaintext is produced.

use std::path::PathBuf;

/// Decryption engine error
#[derive(Debug, thiserror::Error)]
pub enum WhiteboxError {
    /// One of the three input artifacts does not exist on disk
    #[error("missing {name} artifact at {}", path.display())]
    MissingArtifact {
        /// Artifact role (public key, white-box table, ciphertext)
        name: &'static str,
        /// Path that was probed
        path: PathBuf,
    },

    /// Reading or writing an artifact file failed
    #[error("I/O error on {name} artifact at {}: {source}", path.display())]
    Io {
        /// Artifact role
        name: &'static str,
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// An artifact exists but could not be parsed or has the wrong shape
    #[error("malformed {name} artifact: {reason}")]
    MalformedArtifact {
        /// Artifact role
        name: &'static str,
        /// Human readable cause
        reason: String,
    },

    /// Arithmetic between ring elements of different degree, modulus or domain
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// Forward transform requested on an element already in evaluation form
    #[error("ring element is already in evaluation (NTT) form")]
    AlreadyTransformed,

    /// Inverse transform requested on an element in coefficient form
    #[error("ring element is not in evaluation (NTT) form")]
    NotTransformed,

    /// Modular inverse requested for a value sharing a factor with the modulus
    #[error("{value} is not invertible modulo {modulus}")]
    NotInvertible {
        /// Value that has no inverse
        value: u64,
        /// Modulus the inverse was requested under
        modulus: u64,
    },

    /// Lookup index or table shape does not match the key material
    #[error("corrupt white-box table: {0}")]
    CorruptWhiteBoxTable(String),

    /// Ring degree is not a power of two
    #[error("invalid ring degree {0}: must be a power of two")]
    InvalidDegree(usize),

    /// Integrity digest stored in the table does not match its contents
    #[error("checksum mismatch for `{field}`")]
    ChecksumMismatch {
        /// Table field whose digest failed
        field: &'static str,
    },

    /// Bit sequence contains something other than 0 or 1
    #[error("invalid bit {value:?} at position {index}")]
    InvalidBit {
        /// Position in the input
        index: usize,
        /// Offending value, rendered
        value: String,
    },
}

impl WhiteboxError {
    pub(crate) fn malformed(name: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, WhiteboxError>;

/// Create a `CorruptWhiteBoxTable` error with format string support
macro_rules! corrupt_table {
    ($($arg:tt)*) => {
        $crate::error::WhiteboxError::CorruptWhiteBoxTable(format!($($arg)*))
    };
}

pub(crate) use corrupt_table;
