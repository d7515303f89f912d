//! URL canonicalization for integrity lookups.

use url::Url;

/// Canonical key for `raw`: credentials and fragment removed, trailing
/// dot dropped from the host. Default ports are already elided by parsing.
///
/// Returns `None` when `raw` is not an absolute URL.
pub fn canonical_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_fragment(None);
    if !url.username().is_empty() || url.password().is_some() {
        url.set_username("").ok()?;
        url.set_password(None).ok()?;
    }
    if let Some(host) = url.host_str().filter(|h| h.len() > 1 && h.ends_with('.')) {
        let host = host.trim_end_matches('.').to_string();
        url.set_host(Some(&host)).ok()?;
    }
    Some(url.into())
}
