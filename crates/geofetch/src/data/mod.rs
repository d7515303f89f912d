//! Immutable data types: configuration, integrity records and documents.

pub mod config;
pub mod document;
pub mod sri;

pub use config::{ConfigOverride, RUNTIME_MODE_ENV, RuntimeMode, SecurityConfig};
pub use document::{DocumentKind, FeatureCollection, GeographyDocument, Topology};
pub use sri::{SriPolicy, SriRecord};
