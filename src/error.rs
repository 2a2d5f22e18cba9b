use thiserror::Error;

/// Errors raised while talking to the hosted backend.
///
/// Every variant ends up as the same HTTP 400 at the route boundary; the
/// variants only exist so logs can tell a rejected call from a broken one.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The service answered with a non-success status.
    ///
    /// Displays as the bare remote message so it can be relayed verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset)
    #[error("Connection error: {0}")]
    Transport(String),

    /// The service answered with a body that is not JSON
    #[error("Invalid response from backend: {0}")]
    Decode(String),

    /// The client could not be built from the supplied settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Build an `Api` error from a status code and an error body.
    ///
    /// Supabase services disagree on where the message lives: PostgREST
    /// uses `message`, GoTrue uses `msg` or `error_description`, and older
    /// endpoints only set `error`. The first present string wins; the raw
    /// body and finally the status reason are the fallbacks.
    pub fn from_response(status: http::StatusCode, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|value| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            })
            .map(str::to_string)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        BackendError::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Whether the failure came from the service rejecting the call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Api { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}
