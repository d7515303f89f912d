use bytes::Bytes;
use geofetch_verify::Verifier;
use tracing::debug;
use url::Url;

use super::http::{HttpClient, HttpRequest, HttpResponse};
use super::reader::{precheck_content_length, read_bounded};
use crate::core::{accept_header, check_content_type, is_redirect, resolve_location, validate_url};
use crate::data::{RuntimeMode, SecurityConfig};
use crate::error::{FetchError, Result, SecurityReason};

/// Redirects followed before the chain is treated as abuse.
pub const MAX_REDIRECTS: usize = 5;

/// Issues requests and follows redirects, validating every hop.
pub struct Fetcher<C: HttpClient> {
    pub(crate) client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self { Self { client } }

    pub fn client(&self) -> &C { &self.client }

    /// Request `url`, following up to [`MAX_REDIRECTS`] redirects.
    ///
    /// `url` must already have passed [`validate_url`]; each `Location`
    /// target is validated here before it is requested. Returns the final
    /// URL and its non-redirect response.
    pub async fn open(
        &self,
        url: Url,
        config: &SecurityConfig,
        mode: RuntimeMode,
    ) -> Result<(Url, HttpResponse)> {
        let accept = accept_header(config);
        let mut current = url;
        let mut redirects = 0;

        loop {
            let request = HttpRequest {
                url:    strip_credentials(current.clone()),
                accept: accept.clone(),
            };
            let response = self.client.send(request).await.map_err(|e| {
                FetchError::load(format!("request failed: {e}"))
                    .with_url(current.as_str())
                    .with_source(e)
            })?;

            if !is_redirect(response.status) {
                return Ok((current, response));
            }

            let next = resolve_location(&current, response.location.as_deref())?;
            // Releases the connection; the redirect body is never read.
            drop(response);

            if redirects == MAX_REDIRECTS {
                return Err(FetchError::security(
                    SecurityReason::Redirect,
                    format!("too many redirects (limit {MAX_REDIRECTS})"),
                )
                .with_url(current.as_str()));
            }
            redirects += 1;

            let next = validate_url(next.as_str(), config, mode).map_err(|e| e.or_url(next.as_str()))?;
            debug!(from = %current, to = %next, hop = redirects, "following redirect");
            current = next;
        }
    }

    /// Fetch `url` and return its body, bounded by the configured size cap.
    ///
    /// Enforces a 2xx status and the content-type allowlist before any body
    /// byte is read. `verifier`, when given, sees exactly the returned bytes.
    pub async fn fetch(
        &self,
        url: Url,
        config: &SecurityConfig,
        mode: RuntimeMode,
        verifier: Option<&mut Verifier>,
    ) -> Result<Bytes> {
        let (final_url, response) = self.open(url, config, mode).await?;
        let at = |e: FetchError| e.or_url(final_url.as_str());

        if !response.is_success() {
            return Err(at(FetchError::load(format!(
                "unexpected HTTP status {}",
                response.status
            ))));
        }
        check_content_type(response.content_type.as_deref(), config).map_err(at)?;
        precheck_content_length(response.content_length, config.max_response_size_bytes).map_err(at)?;

        read_bounded(
            response.body,
            config.max_response_size_bytes,
            response.content_length,
            verifier,
        )
        .await
        .map_err(at)
    }
}

/// Drop any `user:pass@` part so credentials are never sent.
fn strip_credentials(mut url: Url) -> Url {
    if !url.username().is_empty() || url.password().is_some() {
        // Only fails for URLs without a host, which never pass validation.
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    url
}
