//! Error objects
//!
//! One generic [`ErrorObject`] builder, parameterized by status, title and
//! detail. Access denials and request-level failures are both expressed
//! through it.

use crate::core::access::AccessError;
use crate::core::error::JsonApiError;
use axum::http::StatusCode;
use serde::Serialize;

/// A JSON:API error object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<ErrorLinks>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSource {
    pub pointer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLinks {
    pub info: String,
}

impl ErrorObject {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            id: None,
            status: status.as_u16(),
            code: None,
            title: title.into(),
            detail: None,
            source: None,
            links: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_detail(mut self, message: impl Into<String>) -> Self {
        self.detail = Some(ErrorDetail {
            message: message.into(),
        });
        self
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source = Some(ErrorSource {
            pointer: pointer.into(),
        });
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.links = Some(ErrorLinks { info: info.into() });
        self
    }

    /// Error object for a denied entity
    ///
    /// The title is the status text. `detail.message` carries the checker's
    /// reason when it gave one, otherwise the caller's access-denied message.
    pub fn access_denied(error: &AccessError, message: &str) -> Self {
        let status = error.status();
        let detail = match &error.reason {
            Some(reason) if !reason.is_empty() => reason.as_str(),
            _ => message,
        };

        let object = ErrorObject::new(status, status.canonical_reason().unwrap_or("Forbidden"))
            .with_id(error.error_id())
            .with_detail(detail)
            .with_pointer(error.pointer.clone());

        match info_url(status) {
            Some(url) => object.with_info(url),
            None => object,
        }
    }

    /// Error object for a request-level failure
    pub fn from_exception(error: &JsonApiError) -> Self {
        let status = error.status_code();
        let object = ErrorObject::new(status, status.canonical_reason().unwrap_or("Error"))
            .with_code(error.error_code())
            .with_detail(error.to_string());

        match info_url(status) {
            Some(url) => object.with_info(url),
            None => object,
        }
    }
}

/// Reference describing an HTTP status code
pub fn info_url(status: StatusCode) -> Option<&'static str> {
    let url = match status.as_u16() {
        400 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.1",
        401 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.2",
        403 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.4",
        404 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.5",
        405 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.6",
        406 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.7",
        409 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.10",
        415 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.4.16",
        422 => "https://tools.ietf.org/html/rfc4918#section-11.2",
        500 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.5.1",
        503 => "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#sec10.5.4",
        _ => return None,
    };
    Some(url)
}
