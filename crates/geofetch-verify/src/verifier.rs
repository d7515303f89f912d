use crate::{AnyHasher, Hasher, Integrity, Result, VerificationError};

/// Hashes data as it passes through and checks it against an expected digest.
///
/// Feed every chunk to [`Verifier::update`] while the body is being read, so
/// the bytes are touched once and never need a second pass.
pub struct Verifier {
    expected: Integrity,
    hasher:   AnyHasher,
    bytes:    u64,
}

impl Verifier {
    pub fn new(expected: Integrity) -> Self {
        let hasher = expected.algorithm().hasher();
        Self {
            expected,
            hasher,
            bytes: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes += data.len() as u64;
    }

    pub fn bytes_processed(&self) -> u64 { self.bytes }

    pub fn expected(&self) -> &Integrity { &self.expected }

    /// Finalize and compare byte-for-byte against the expected digest.
    pub fn finish(self) -> Result<()> {
        let actual = self.hasher.finalize();
        if actual == self.expected.digest() {
            Ok(())
        } else {
            let actual = Integrity::new(self.expected.algorithm(), actual)?;
            Err(VerificationError::Mismatch {
                algorithm: self.expected.algorithm(),
                expected:  self.expected.digest_base64(),
                actual:    actual.digest_base64(),
            })
        }
    }
}
