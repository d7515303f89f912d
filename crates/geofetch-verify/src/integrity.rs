//! Subresource integrity tokens (`<algorithm>-<base64 digest>`).

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use crate::{Algorithm, Result, VerificationError, Verifier};

/// An expected digest for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Integrity {
    algorithm: Algorithm,
    digest:    Vec<u8>,
}

impl Integrity {
    /// Build from a raw digest, checking its length against the algorithm.
    pub fn new(algorithm: Algorithm, digest: Vec<u8>) -> Result<Self> {
        if digest.len() != algorithm.digest_len() {
            return Err(VerificationError::InvalidDigestLength {
                algorithm,
                expected: algorithm.digest_len(),
                actual: digest.len(),
            });
        }
        Ok(Self { algorithm, digest })
    }

    /// Build from a base64 digest value as it appears after the `-` of an SRI token.
    pub fn from_base64(algorithm: Algorithm, value: &str) -> Result<Self> {
        let value = value.trim();
        let digest = STANDARD
            .decode(value)
            .or_else(|_| STANDARD_NO_PAD.decode(value))
            .map_err(|e| VerificationError::InvalidFormat(format!("bad base64 digest: {e}")))?;
        Self::new(algorithm, digest)
    }

    /// Digest `data` and wrap the result.
    pub fn compute(algorithm: Algorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(data),
        }
    }

    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    pub fn digest(&self) -> &[u8] { &self.digest }

    pub fn digest_base64(&self) -> String { STANDARD.encode(&self.digest) }

    pub fn to_sri(&self) -> String { format!("{}-{}", self.algorithm, self.digest_base64()) }

    /// One-shot verification of a complete buffer.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let mut verifier = self.verifier();
        verifier.update(data);
        verifier.finish()
    }

    /// Incremental verifier for data that arrives in chunks.
    pub fn verifier(&self) -> Verifier { Verifier::new(self.clone()) }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_sri()) }
}

impl FromStr for Integrity {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        // SRI allows `?opts` after the digest; they carry no meaning here.
        let token = token.split_once('?').map_or(token, |(t, _)| t);
        let (algorithm, value) = token
            .split_once('-')
            .ok_or_else(|| VerificationError::InvalidFormat("missing algorithm prefix".into()))?;
        Self::from_base64(algorithm.parse()?, value)
    }
}
