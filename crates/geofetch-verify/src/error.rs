use crate::Algorithm;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("{algorithm} digest mismatch: expected {expected}, got {actual}")]
    Mismatch {
        algorithm: Algorithm,
        expected:  String,
        actual:    String,
    },

    #[error("malformed integrity token: {0}")]
    InvalidFormat(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("{algorithm} digest must be {expected} bytes, got {actual}")]
    InvalidDigestLength {
        algorithm: Algorithm,
        expected:  usize,
        actual:    usize,
    },
}

pub type Result<T> = std::result::Result<T, VerificationError>;
