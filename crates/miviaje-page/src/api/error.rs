use miviaje_core::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    /// The body wasn't the JSON the caller expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Bytes of a failed response body kept for diagnostics
const ERROR_BODY_PREVIEW: usize = 200;

impl ApiError {
    pub fn http(status: u16, body: &str) -> Self {
        let mut end = body.len().min(ERROR_BODY_PREVIEW);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        ApiError::Http {
            status,
            body: body[..end].to_string(),
        }
    }

    /// Status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message() {
        let err = ApiError::http(404, "no existe");
        assert_eq!(err.to_string(), "HTTP error! status: 404");
        assert_eq!(err.status(), Some(404));
        assert!(matches!(err, ApiError::Http { body, .. } if body == "no existe"));
    }

    #[test]
    fn test_body_preview_stops_on_char_boundary() {
        let body = "ñ".repeat(150);
        let ApiError::Http { body: preview, .. } = ApiError::http(500, &body) else {
            panic!("expected http error");
        };
        assert_eq!(preview, "ñ".repeat(100));
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = ApiError::from(FetchError::Unreachable("Failed to fetch".to_string()));
        assert_eq!(err.status(), None);
    }
}
