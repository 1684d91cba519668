use thiserror::Error;

/// Failure of a single remote store call.
///
/// Cloneable so one failed fetch can be handed to every caller sharing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl StoreError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut cut = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => StoreError::NotFound(truncated),
            429 => StoreError::Unavailable("rate limited".to_string()),
            _ => StoreError::Unavailable(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Map a transport failure. Timeouts, refused connections and bodies that
    /// fail to decode all count as the store being unavailable.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Unavailable("request timed out".to_string())
        } else if err.is_decode() {
            StoreError::Unavailable(format!("malformed response: {}", err))
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }

    pub fn trip_not_found(id: &str) -> Self {
        StoreError::NotFound(format!("trip {}", id))
    }

    pub fn entry_not_found(trip_id: &str, entry_id: &str) -> Self {
        StoreError::NotFound(format!("entry {} of trip {}", entry_id, trip_id))
    }
}
