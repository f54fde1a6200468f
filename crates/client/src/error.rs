//! Client error types.

/// Errors produced while talking to the management or deployment APIs.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid resource id \"{id}\": {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl ClientError {
    /// Builds an API error from a failed response body.
    ///
    /// The deployment service sometimes answers with a JSON error body
    /// while labelling it `text/plain` (or the reverse), so the body is
    /// checked for a JSON message regardless of `content_type` before
    /// falling back to the raw text.
    pub fn from_response_body(status: u16, content_type: Option<&str>, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("request failed ({})", content_type.unwrap_or("no content type"))
            } else {
                trimmed.to_string()
            }
        });
        ClientError::Api { status, message }
    }

    /// Returns the HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Passes successful responses through, converting failures to
/// [`ClientError::Api`] with the extracted body message.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::from_response_body(
        status.as_u16(),
        content_type.as_deref(),
        &body,
    ))
}

/// Pulls a human-readable message out of an error body.
///
/// Recognises the resource manager shape (`{"error": {"message": ..}}`)
/// and the Kudu shapes (`{"Message": ..}`, `{"message": ..}`).
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let candidates = [
        value.pointer("/error/message"),
        value.get("Message"),
        value.get("message"),
        value.get("ExceptionMessage"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
