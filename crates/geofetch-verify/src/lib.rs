//! Subresource integrity primitives for fetched geography documents.
//!
//! Provides incremental hashing and SRI token handling without enforcing any
//! registry or policy. A [`Verifier`] is fed chunks while a response body is
//! streamed, so the digest is ready the moment the last byte arrives.
//!
//! # Example
//!
//! ```
//! use geofetch_verify::Integrity;
//!
//! let expected: Integrity = "sha256-uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek=".parse().unwrap();
//!
//! let mut verifier = expected.verifier();
//! verifier.update(b"hello ");
//! verifier.update(b"world");
//! verifier.finish().unwrap();
//! ```

pub use self::algorithm::Algorithm;
pub use self::error::{Result, VerificationError};
pub use self::hasher::{AnyHasher, DigestHasher, Hasher, Sha256Hasher, Sha384Hasher, Sha512Hasher};
pub use self::integrity::Integrity;
pub use self::verifier::Verifier;

mod algorithm;
mod error;
mod hasher;
mod integrity;
mod verifier;
