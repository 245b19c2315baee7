//! Errors surfaced by the Elder HTTP client.

use thiserror::Error;

use super::api_types::ErrorBody;

/// Client-observable failure of an API call.
///
/// `Display` is what the user sees: the server's own message when it sent
/// one, otherwise a generic line for the failure class.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Request could not complete (connect, TLS, timeout, body read)
  #[error("Network error: could not reach the Elder API")]
  Transport(#[source] reqwest::Error),

  /// Server answered with a non-success status
  #[error("{}", server_message(.status, .message))]
  Server { status: u16, message: Option<String> },

  /// Payload did not match the expected shape
  #[error("Unexpected response from {endpoint}: {reason}")]
  Decode { endpoint: String, reason: String },

  #[error("Invalid API URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

fn server_message(status: &u16, message: &Option<String>) -> String {
  match message {
    Some(m) => m.clone(),
    None => format!("Request failed with status {}", status),
  }
}

impl ApiError {
  /// Build a server error from a status code and raw body.
  pub fn from_response(status: u16, body: &[u8]) -> Self {
    let message = serde_json::from_slice::<ErrorBody>(body)
      .ok()
      .and_then(ErrorBody::into_message)
      .or_else(|| {
        let text = String::from_utf8_lossy(body).trim().to_string();
        // HTML error pages from proxies are not worth showing
        if text.is_empty() || text.starts_with('<') || text.len() > 200 {
          None
        } else {
          Some(text)
        }
      });
    ApiError::Server { status, message }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Server { status, .. } => Some(*status),
      ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }

  /// Line shown in notifications and error panes.
  pub fn user_message(&self) -> String {
    self.to_string()
  }

  pub fn is_transport(&self) -> bool {
    matches!(self, ApiError::Transport(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_server_message_is_verbatim() {
    let err = ApiError::from_response(400, br#"{"error": "Source and target must differ"}"#);
    assert_eq!(err.to_string(), "Source and target must differ");
    assert_eq!(err.status(), Some(400));
  }

  #[test]
  fn test_message_and_detail_fields() {
    let err = ApiError::from_response(409, br#"{"message": "Label exists"}"#);
    assert_eq!(err.to_string(), "Label exists");
    let err = ApiError::from_response(422, br#"{"detail": "dry_run must be boolean"}"#);
    assert_eq!(err.to_string(), "dry_run must be boolean");
  }

  #[test]
  fn test_plain_text_body() {
    let err = ApiError::from_response(403, b"forbidden");
    assert_eq!(err.to_string(), "forbidden");
  }

  #[test]
  fn test_generic_message_without_body() {
    let err = ApiError::from_response(502, b"<html>Bad Gateway</html>");
    assert_eq!(err.to_string(), "Request failed with status 502");
    let err = ApiError::from_response(500, b"");
    assert_eq!(err.to_string(), "Request failed with status 500");
  }
}
