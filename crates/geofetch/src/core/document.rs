//! Turning a verified body into a [`GeographyDocument`].

use serde_json::Value;

use crate::data::{DocumentKind, FeatureCollection, GeographyDocument, Topology};
use crate::error::{FetchError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse and shape-check a geography document.
///
/// Text that is not JSON is a parse error; JSON that is not a `Topology` or
/// `FeatureCollection` object is a validation error.
pub fn parse_document(body: &[u8]) -> Result<GeographyDocument> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let text = std::str::from_utf8(body)
        .map_err(|e| FetchError::parse("response body is not valid UTF-8").with_source(e))?;

    let value: Value = serde_json::from_str(text)
        .map_err(|e| FetchError::parse(format!("invalid JSON: {e}")).with_source(e))?;

    let Value::Object(mut object) = value else {
        return Err(FetchError::validation("geography document must be a JSON object"));
    };

    let kind = match object.remove("type") {
        Some(Value::String(name)) => DocumentKind::from_type_name(&name).ok_or_else(|| {
            FetchError::validation(format!(
                "unsupported geography type {name:?}, expected Topology or FeatureCollection"
            ))
        })?,
        Some(_) => return Err(FetchError::validation("geography document type must be a string")),
        None => return Err(FetchError::validation("geography document has no type")),
    };

    let rest = Value::Object(object);
    let shape_error = |e: serde_json::Error| {
        FetchError::validation(format!("malformed {kind}: {e}")).with_source(e)
    };
    match kind {
        DocumentKind::Topology => serde_json::from_value::<Topology>(rest)
            .map(GeographyDocument::Topology)
            .map_err(shape_error),
        DocumentKind::FeatureCollection => serde_json::from_value::<FeatureCollection>(rest)
            .map(GeographyDocument::FeatureCollection)
            .map_err(shape_error),
    }
}
