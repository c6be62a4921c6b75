//! HTTP rendering of assembled documents

use crate::core::cache::CacheableMetadata;
use crate::normalizer::{JSONAPI_MEDIA_TYPE, ResourceResponse};
use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Space-separated cache tags of the document
pub const CACHE_TAGS_HEADER: &str = "x-cache-tags";

/// Space-separated cache contexts of the document
pub const CACHE_CONTEXTS_HEADER: &str = "x-cache-contexts";

impl ResourceResponse {
    /// Render with a specific status (e.g. 201 after a create)
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let headers = cache_headers(&self.cacheability);

        let mut response = Json(self.document).into_response();
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSONAPI_MEDIA_TYPE),
        );
        response.headers_mut().extend(headers);
        response
    }
}

impl IntoResponse for ResourceResponse {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::OK)
    }
}

/// Headers exposing the drained cache metadata
pub fn cache_headers(metadata: &CacheableMetadata) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let values = [
        (HeaderName::from_static(CACHE_TAGS_HEADER), metadata.tags().join(" ")),
        (HeaderName::from_static(CACHE_CONTEXTS_HEADER), metadata.contexts().join(" ")),
        (header::CACHE_CONTROL, metadata.max_age().cache_control()),
    ];

    for (name, value) in values {
        if value.is_empty() {
            continue;
        }
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "skipping cache header with invalid characters"),
        }
    }

    headers
}
