use url::Url;

use crate::error::{FetchError, Result, SecurityReason};

/// Returns `true` if the HTTP status code indicates a redirect.
///
/// # Recognized Redirect Codes
///
/// - 301: Moved Permanently
/// - 302: Found
/// - 303: See Other
/// - 307: Temporary Redirect
/// - 308: Permanent Redirect
///
/// # Examples
///
/// ```
/// use geofetch::is_redirect;
///
/// assert!(is_redirect(301));
/// assert!(is_redirect(302));
/// assert!(!is_redirect(200));
/// assert!(!is_redirect(304));
/// ```
pub fn is_redirect(status: u16) -> bool { matches!(status, 301 | 302 | 303 | 307 | 308) }

/// Resolve a `Location` value against the URL that produced it.
pub fn resolve_location(current: &Url, location: Option<&str>) -> Result<Url> {
    let location = location.map(str::trim).filter(|l| !l.is_empty()).ok_or_else(|| {
        FetchError::security(SecurityReason::Redirect, "redirect response without Location header")
            .with_url(current.as_str())
    })?;
    current.join(location).map_err(|e| {
        FetchError::security(
            SecurityReason::Redirect,
            format!("redirect Location could not be resolved: {location}"),
        )
        .with_url(current.as_str())
        .with_source(e)
    })
}
