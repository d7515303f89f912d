//! Secure fetching of remote geography documents.
//!
//! Turns an untrusted URL into a validated, size-bounded, optionally
//! integrity-checked [`GeographyDocument`] (TopoJSON `Topology` or GeoJSON
//! `FeatureCollection`).
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - `data` - Immutable configuration, integrity records and document types
//! - `core` - Pure decisions: URL policy, address classification, content checks
//! - `effects` - I/O operations behind the [`HttpClient`] trait
//!
//! [`GeoFetcher`] wires the stages together:
//!
//! validate URL → plan integrity → request (redirects re-validated, at most
//! [`MAX_REDIRECTS`]) → status and content-type gate → bounded streaming read
//! with hashing → integrity verdict → parse → cache.
//!
//! # Key Features
//!
//! - **SSRF defense**: private, reserved and embedded-IPv4 literals are refused on every hop
//! - **Streaming size cap**: the body is cut off the moment it passes the limit, whatever `Content-Length` says
//! - **Single-pass integrity**: SRI digests are computed while the body streams
//! - **Single-flight cache**: concurrent callers for one URL share one fetch
//!
//! # Example
//!
//! ```no_run
//! use geofetch::{GeoFetcher, RuntimeMode};
//!
//! # async fn run() -> geofetch::Result<()> {
//! let geo = GeoFetcher::new(RuntimeMode::from_env())?;
//! geo.registry().add_sri(
//!     "https://cdn.example.com/us-states.json",
//!     "sha384-/b2OdaZ/KfcBpOBAOF4uI5hjA+oQI5IRr5B/y7g1eLPkF8txzmRu/QgZ3YwIjeG9",
//!     true,
//! )?;
//! let doc = geo.get_or_fetch("https://cdn.example.com/us-states.json").await?;
//! println!("{}", doc.summary());
//! # Ok(())
//! # }
//! ```

mod core;
mod data;
mod effects;
mod error;
mod pipeline;
mod registry;
mod settings;

pub use crate::core::{
    IntegrityPlan, accept_header, canonical_url, check_content_type, is_private_host, is_private_ip, is_redirect,
    parse_document, validate_url,
};
pub use data::{
    ConfigOverride, DocumentKind, FeatureCollection, GeographyDocument, RUNTIME_MODE_ENV,
    RuntimeMode, SecurityConfig, SriPolicy, SriRecord, Topology,
};
pub use effects::{
    BodyStream, BoxError, BoxStream, CachePolicy, Fetcher, HttpClient, HttpRequest, HttpResponse,
    MAX_REDIRECTS, RequestCache, precheck_content_length, read_bounded,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use error::{Cause, ErrorKind, FetchError, Result, SecurityReason};
pub use pipeline::GeoFetcher;
pub use registry::IntegrityRegistry;
pub use settings::ConfigStore;

pub use geofetch_verify::{Algorithm, Integrity};
pub use tokio_util::sync::CancellationToken;
