//! HTTP error classification shared by the chat and transcription calls

use super::ApiError;
use reqwest::Response;
use serde_json::Value;

/// Pull `error.message` out of an `{"error":{"message":"..."}}` body
pub fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(str::to_string)
}

/// Map a non-2xx status and its body onto the error taxonomy
pub fn classify_failure(status: u16, body: &str) -> ApiError {
    match status {
        429 => ApiError::RateLimited,
        401 => {
            let message = error_message(body)
                .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
                .unwrap_or_else(|| reason(status));
            ApiError::Auth(message)
        }
        _ => ApiError::Http { status },
    }
}

/// Pass a successful response through; read the body of a failed one and classify it
pub async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &body))
}

/// Canonical reason phrase for a status, or the bare code
pub fn reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":{"message":"invalid key"}}"#),
            Some("invalid key".to_string())
        );
        assert_eq!(error_message(r#"{"error":"nope"}"#), None);
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_rate_limited() {
        assert!(matches!(classify_failure(429, ""), ApiError::RateLimited));
    }

    #[test]
    fn test_auth_uses_error_message() {
        match classify_failure(401, r#"{"error":{"message":"invalid key"}}"#) {
            ApiError::Auth(msg) => assert_eq!(msg, "invalid key"),
            other => panic!("Expected Auth, got {:?}", other),
        }
    }

    #[test]
    fn test_auth_falls_back_to_reason() {
        match classify_failure(401, "") {
            ApiError::Auth(msg) => assert_eq!(msg, "Unauthorized"),
            other => panic!("Expected Auth, got {:?}", other),
        }
    }

    #[test]
    fn test_other_status() {
        assert!(matches!(
            classify_failure(503, "down"),
            ApiError::Http { status: 503 }
        ));
    }
}
