//! Pure decisions: URL policy, address classification, content checks,
//! integrity planning and document shaping. Nothing here performs I/O.

mod address;
mod canonical;
mod content_type;
mod document;
mod integrity;
mod redirect;
mod validate;

pub use address::{is_private_host, is_private_ip};
pub use canonical::canonical_url;
pub use content_type::{accept_header, check_content_type};
pub use document::parse_document;
pub use integrity::{IntegrityPlan, lookup as lookup_integrity, plan as plan_integrity};
pub use redirect::{is_redirect, resolve_location};
pub use validate::validate_url;
