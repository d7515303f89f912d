//! I/O: the HTTP client seam, the redirect-validating fetcher, the bounded
//! body reader and the single-flight cache.

mod cache;
mod fetcher;
mod http;
mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CachePolicy, RequestCache};
pub use fetcher::{Fetcher, MAX_REDIRECTS};
pub use http::{BodyStream, BoxError, BoxStream, HttpClient, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use reader::{precheck_content_length, read_bounded};
