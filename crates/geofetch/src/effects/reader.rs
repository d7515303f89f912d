//! Size-capped body reading.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use geofetch_verify::Verifier;
use tracing::{debug, warn};

use super::http::BodyStream;
use crate::error::{FetchError, Result};

const INITIAL_CAPACITY_LIMIT: u64 = 1024 * 1024;

fn too_large(max: u64) -> FetchError {
    FetchError::validation(format!("response exceeds maximum size of {max} bytes"))
}

/// Fast-path rejection on a declared `Content-Length`. Never authoritative.
pub fn precheck_content_length(declared: Option<u64>, max: u64) -> Result<()> {
    match declared {
        Some(len) if len > max => {
            warn!(declared = len, max, "declared content length over limit");
            Err(too_large(max))
        }
        _ => Ok(()),
    }
}

/// Read `body` to the end, failing as soon as more than `max` bytes arrive.
///
/// The stream is dropped on overflow, which cancels the underlying
/// transfer. Every accepted chunk is also fed to `verifier`.
pub async fn read_bounded(
    mut body: BodyStream,
    max: u64,
    size_hint: Option<u64>,
    mut verifier: Option<&mut Verifier>,
) -> Result<Bytes> {
    let capacity = size_hint.unwrap_or(0).min(max).min(INITIAL_CAPACITY_LIMIT);
    let mut buf = BytesMut::with_capacity(usize::try_from(capacity).unwrap_or(0));
    let mut total: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            FetchError::load(format!("failed to read response body: {e}")).with_cause(e.into())
        })?;
        total = total.saturating_add(chunk.len() as u64);
        if total > max {
            drop(body);
            warn!(bytes = total, max, "response body over limit, aborting read");
            return Err(too_large(max));
        }
        if let Some(v) = verifier.as_deref_mut() {
            v.update(&chunk);
        }
        buf.extend_from_slice(&chunk);
    }

    debug!(bytes = total, "response body read");
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::stream;
    use geofetch_verify::{Algorithm, Integrity};

    use super::*;
    use crate::effects::http::BoxError;
    use crate::error::ErrorKind;

    fn chunks(parts: Vec<&'static [u8]>) -> BodyStream {
        Box::pin(stream::iter(parts.into_iter().map(|p| Ok::<_, BoxError>(Bytes::from_static(p)))))
    }

    #[test]
    fn test_precheck() {
        precheck_content_length(None, 10).unwrap();
        precheck_content_length(Some(10), 10).unwrap();
        let err = precheck_content_length(Some(11), 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_reads_within_limit() {
        let body = read_bounded(chunks(vec![b"hello ", b"world"]), 11, None, None).await.unwrap();
        assert_eq!(&body[..], b"hello world");
    }

    #[tokio::test]
    async fn test_stops_pulling_after_overflow() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        // An endless body that never declares its length.
        let endless = stream::repeat_with(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(Bytes::from_static(&[0u8; 1024]))
        });

        let err = read_bounded(Box::pin(endless), 4096, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(pulled.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_size_hint_is_not_trusted() {
        let err = read_bounded(chunks(vec![b"0123456789", b"0123456789"]), 16, Some(4), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("16 bytes"));
    }

    #[tokio::test]
    async fn test_feeds_verifier() {
        let expected = Integrity::compute(Algorithm::Sha256, b"hello world");
        let mut verifier = expected.verifier();
        read_bounded(chunks(vec![b"hello", b" world"]), 100, Some(11), Some(&mut verifier))
            .await
            .unwrap();
        assert_eq!(verifier.bytes_processed(), 11);
        verifier.finish().unwrap();
    }

    #[tokio::test]
    async fn test_stream_error_is_load_error() {
        let failing: BodyStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"{")),
            Err::<Bytes, BoxError>("connection reset".into()),
        ]));
        let err = read_bounded(failing, 100, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }
}
