//! URL security validation (SSRF defense).

use tracing::warn;
use url::Url;

use super::address::{is_localhost_name, is_loopback_literal, is_private_host, normalize_host};
use crate::data::{RuntimeMode, SecurityConfig};
use crate::error::{FetchError, Result, SecurityReason};

/// Check `raw` against the protocol and address policy.
///
/// Every failure is a typed [`FetchError`]; attacker-controlled input cannot
/// make this panic. Returns the parsed URL on success.
pub fn validate_url(raw: &str, config: &SecurityConfig, mode: RuntimeMode) -> Result<Url> {
    let result = check(raw, config, mode);
    if let Err(err) = &result {
        warn!(url = %raw, kind = %err.kind(), reason = ?err.reason(), "rejected URL");
    }
    result
}

fn check(raw: &str, config: &SecurityConfig, mode: RuntimeMode) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::validation("URL must be a non-empty string"));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        FetchError::validation(format!("malformed URL: {e}"))
            .with_url(raw)
            .with_source(e)
    })?;
    let host = url.host_str().map(normalize_host).unwrap_or_default();

    let scheme = url.scheme();
    let loopback_exempt =
        config.allow_http_localhost && !mode.is_production() && is_loopback_literal(&host);

    if config.strict_https_only {
        if scheme != "https" {
            return Err(FetchError::security(
                SecurityReason::DisallowedProtocol,
                format!("only https is allowed, got {scheme}"),
            )
            .with_url(raw));
        }
    } else {
        if !config.allows_protocol(scheme) {
            return Err(FetchError::security(
                SecurityReason::DisallowedProtocol,
                format!("protocol {scheme} is not allowed"),
            )
            .with_url(raw));
        }
        if scheme == "http" && !loopback_exempt {
            return Err(FetchError::security(
                SecurityReason::DisallowedProtocol,
                "plain http is only allowed for localhost during development",
            )
            .with_url(raw));
        }
    }

    if host.is_empty() {
        return Err(FetchError::validation("URL has no host").with_url(raw));
    }

    if !loopback_exempt && is_private_host(&host) {
        return Err(FetchError::security(
            SecurityReason::PrivateAddress,
            "requests to private or reserved addresses are not allowed",
        )
        .with_url(raw));
    }

    if mode.is_production() && is_localhost_name(&host) {
        return Err(FetchError::security(
            SecurityReason::ProductionLocalhost,
            "localhost is not allowed in production",
        )
        .with_url(raw));
    }

    Ok(url)
}
