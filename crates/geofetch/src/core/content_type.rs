use crate::data::SecurityConfig;
use crate::error::{FetchError, Result};

/// Reject responses whose declared `Content-Type` is not an allowed geography type.
///
/// Matching is a case-insensitive substring test so parameters such as
/// `; charset=utf-8` do not matter. Advisory only: a hostile server can lie.
pub fn check_content_type(header: Option<&str>, config: &SecurityConfig) -> Result<()> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| FetchError::validation("response has no Content-Type header"))?;
    let lowered = header.to_ascii_lowercase();

    let allowed = config
        .allowed_content_types
        .iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .any(|t| lowered.contains(&t));

    if allowed {
        Ok(())
    } else {
        Err(FetchError::validation(format!("content type {header} is not allowed")))
    }
}

/// `Accept` header value built from the content-type allowlist.
pub fn accept_header(config: &SecurityConfig) -> String {
    config
        .allowed_content_types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
