//! # Error Taxonomy
//!
//! Failures surfaced by the request pipeline. Inside the retry loop every
//! variant is treated the same way; the taxonomy only matters to callers
//! inspecting the final error, and to tests asserting on status codes.

use reqwest::Response;
use thiserror::Error;

use crate::tokens::manager::TokenError;

/// Errors raised by the XOne client layer.
#[derive(Debug, Error)]
pub enum XoneError {
    /// HTTP 403.
    #[error("{0}")]
    Unauthorized(String),

    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Any other non-2xx response. `message` already embeds the status
    /// code, or the transport's own status line when the body was empty.
    #[error("{message}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Status code plus response text.
        message: String,
    },

    /// Transport-level failure (connect, timeout, body decode).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Token seam failure; folded into the retry loop like any other.
    #[error("{0}")]
    Token(#[from] TokenError),

    /// The requested environment name is not part of the configuration.
    #[error("unknown XOne environment: {0}")]
    UnknownEnvironment(String),

    /// The base endpoint or a joined URL did not parse.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A configured header value (origin, token) is not a legal header.
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// A parsed payload was unpacked as a stream handle.
    #[error("response body was parsed, not streamed")]
    NotStreamed,

    /// All attempts failed; wraps the last recorded failure.
    #[error("Client request failed for {method} {url}: {message}")]
    Failed {
        /// HTTP method of the failed request.
        method: String,
        /// Full request URL.
        url: String,
        /// Message of the last recorded failure.
        message: String,
    },

    /// The attempt loop never ran, so no failure was ever recorded. Only
    /// reachable with a negative `max_retries`.
    #[error("Client request failed for {method} {url} without any exception")]
    FailedWithoutError {
        /// HTTP method of the failed request.
        method: String,
        /// Full request URL.
        url: String,
    },
}

/// True for statuses in the 2xx range.
pub fn is_ok(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Classifies a response: 2xx passes through untouched, anything else is
/// turned into the matching error variant. The failure message is
/// `"{status}: {text}"`, falling back to the transport's own status-line
/// message when the body is empty.
pub async fn check_response(resp: Response) -> Result<Response, XoneError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let status_line = resp.error_for_status_ref().err().map(|e| e.to_string());
    let text = resp.text().await.unwrap_or_default();
    let message = if text.is_empty() {
        status_line.unwrap_or_else(|| status.to_string())
    } else {
        format!("{}: {}", status.as_u16(), text)
    };

    Err(match status.as_u16() {
        403 => XoneError::Unauthorized(message),
        404 => XoneError::NotFound(message),
        other => XoneError::Status {
            status: other,
            message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_ok_bounds() {
        assert!(is_ok(200));
        assert!(is_ok(299));
        assert!(!is_ok(199));
        assert!(!is_ok(300));
        assert!(!is_ok(404));
    }

    #[test]
    fn final_error_message_embeds_method_url_and_cause() {
        let err = XoneError::Failed {
            method: "GET".into(),
            url: "https://xone.example.com/api/Csa/v1/x".into(),
            message: "403: forbidden".into(),
        };
        let text = err.to_string();
        assert!(text.contains("GET"));
        assert!(text.contains("https://xone.example.com/api/Csa/v1/x"));
        assert!(text.contains("403"));
    }
}
