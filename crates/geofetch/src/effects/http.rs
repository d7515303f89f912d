use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Type-erased body read error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, BoxError>>;

/// A single GET request. Credentials are never carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url:    Url,
    /// Value for the `Accept` header.
    pub accept: String,
}

/// Status line, the headers the pipeline inspects, and the unread body.
pub struct HttpResponse {
    pub status:         u16,
    pub content_type:   Option<String>,
    pub content_length: Option<u64>,
    pub location:       Option<String>,
    pub body:           BodyStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations must NOT follow redirects: the fetcher needs every raw
/// 3xx response so it can validate the next hop itself.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted clients in tests
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `request` and return the response with its body still streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed (DNS failure,
    /// connection error, TLS failure). HTTP error statuses are responses,
    /// not errors.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = std::result::Result<HttpResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;
    use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, LOCATION};
    use reqwest::redirect::Policy;

    use super::*;
    use crate::error::{FetchError, Result};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with automatic redirects disabled.
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .map_err(|e| {
                    FetchError::configuration("failed to build HTTP client").with_source(e)
                })?;
            Ok(Self { client })
        }

        /// Wrap an existing client. It must be built with `Policy::none()`.
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    fn header(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn send(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, Self::Error> {
            let response = self
                .client
                .get(request.url)
                .header(ACCEPT, request.accept)
                .send()
                .await?;

            let headers = response.headers();
            let content_type = header(headers, CONTENT_TYPE);
            let location = header(headers, LOCATION);
            let content_length = header(headers, CONTENT_LENGTH).and_then(|v| v.trim().parse().ok());
            let status = response.status().as_u16();

            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| Box::new(e) as BoxError));

            Ok(HttpResponse {
                status,
                content_type,
                content_length,
                location,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
