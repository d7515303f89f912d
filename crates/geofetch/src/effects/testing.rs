//! Scripted [`HttpClient`] for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use parking_lot::Mutex;

use super::http::{BoxError, HttpClient, HttpRequest, HttpResponse};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(String);

#[derive(Debug, Clone)]
enum Body {
    Full(Bytes),
    Endless,
}

/// One canned response.
#[derive(Debug, Clone)]
pub struct Scripted {
    status:         u16,
    content_type:   Option<String>,
    content_length: Option<u64>,
    location:       Option<String>,
    body:           Body,
}

impl Scripted {
    pub fn json(body: &str) -> Self {
        Self {
            status:         200,
            content_type:   Some("application/json".into()),
            content_length: Some(body.len() as u64),
            location:       None,
            body:           Body::Full(Bytes::copy_from_slice(body.as_bytes())),
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            content_type: None,
            content_length: Some(0),
            location: Some(location.into()),
            body: Body::Full(Bytes::new()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self { status, ..Self::json("{}") }
    }

    /// A body that never ends and declares no length.
    pub fn endless() -> Self {
        Self {
            content_length: None,
            body: Body::Endless,
            ..Self::json("")
        }
    }

    pub fn content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(String::from);
        self
    }

    pub fn content_length(mut self, len: Option<u64>) -> Self {
        self.content_length = len;
        self
    }

    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }
}

#[derive(Default)]
struct ScriptState {
    routes:   Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay:    Mutex<Option<Duration>>,
}

/// Answers from a fixed route table and records every request.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    state: Arc<ScriptState>,
}

impl ScriptedClient {
    pub fn new() -> Self { Self::default() }

    pub fn route(self, url: &str, response: Scripted) -> Self {
        self.state.routes.lock().insert(url.to_string(), response);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock() = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> { self.state.requests.lock().clone() }

    pub fn request_count(&self) -> usize { self.state.requests.lock().len() }

    pub fn requested(&self, url: &str) -> bool {
        self.state.requests.lock().iter().any(|r| r.url.as_str() == url)
    }
}

impl HttpClient for ScriptedClient {
    type Error = MockError;

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, MockError> {
        self.state.requests.lock().push(request.clone());
        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .state
            .routes
            .lock()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| MockError(format!("connection refused: {}", request.url)))?;

        let body: super::http::BodyStream = match scripted.body {
            Body::Full(bytes) => Box::pin(stream::iter([Ok::<_, BoxError>(bytes)])),
            Body::Endless => Box::pin(stream::repeat_with(|| {
                Ok::<_, BoxError>(Bytes::from_static(&[b' '; 64 * 1024]))
            })),
        };

        Ok(HttpResponse {
            status: scripted.status,
            content_type: scripted.content_type,
            content_length: scripted.content_length,
            location: scripted.location,
            body,
        })
    }
}
