//! Typed request/response shapes for the Subtext backend.
//!
//! The backend speaks camelCase JSON; every endpoint gets an explicit shape
//! here so unchecked JSON never reaches the session layer.

use serde::{Deserialize, Serialize};

/// Session material returned by signup/login/refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token for renewing access (may be absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix timestamp in seconds (may be absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

/// Request body for POST /auth/signup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// Request body for POST /auth/login.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from POST /auth/signup and POST /auth/login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Absent when the backend requires e.g. email confirmation first.
    #[serde(default)]
    pub session: Option<SessionPayload>,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

/// Request body for POST /auth/refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from POST /auth/refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub session: Option<SessionPayload>,
}

/// Subscription detail inside the status response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetail {
    #[serde(default)]
    pub tier: Option<String>,
}

/// Monthly usage counters. `limit == -1` means unlimited.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsagePayload {
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub remaining: i64,
}

/// Response from GET /subscription/status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    #[serde(default)]
    pub has_subscription: bool,
    #[serde(default)]
    pub subscription: Option<SubscriptionDetail>,
    #[serde(default)]
    pub usage: Option<UsagePayload>,
}

/// Request body for POST /subscriptions/create.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest<'a> {
    pub subscription_id: &'a str,
    pub tier: &'a str,
}

/// Request body for POST /subscriptions/cancel.
#[derive(Debug, Serialize)]
pub struct CancelSubscriptionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

/// Response from subscription create/cancel.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub success: bool,
}

/// Request body for POST /analyze.
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub messages: &'a [String],
}

/// Response from POST /analyze.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    #[serde(default)]
    pub behavior_type: Option<String>,
    pub hidden_intent: String,
    pub strategic_reply: String,
}

/// One OCR page result (OCR.space passthrough shape).
#[derive(Debug, Clone, Deserialize)]
pub struct OcrParsedResult {
    #[serde(default, rename = "ParsedText")]
    pub parsed_text: Option<String>,
}

/// Response from POST /ocr.
///
/// The backend either proxies the OCR provider's `ParsedResults` array or
/// flattens it into a plain `text` field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default, rename = "ParsedResults")]
    pub parsed_results: Option<Vec<OcrParsedResult>>,
    #[serde(default)]
    pub text: Option<String>,
}

impl OcrResponse {
    /// Returns the extracted text, preferring the provider passthrough shape.
    pub fn extracted_text(&self) -> Option<String> {
        if let Some(results) = &self.parsed_results
            && let Some(text) = results.first().and_then(|r| r.parsed_text.as_deref())
            && !text.trim().is_empty()
        {
            return Some(text.to_string());
        }
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(std::string::ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: session payload round-trips camelCase field names.
    #[test]
    fn test_session_payload_camel_case() {
        let json = r#"{"accessToken":"at","refreshToken":"rt","expiresAt":1700000000}"#;
        let session: SessionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "at");
        assert_eq!(session.refresh_token.as_deref(), Some("rt"));
        assert_eq!(session.expires_at, Some(1_700_000_000));

        let out = serde_json::to_string(&session).unwrap();
        assert!(out.contains("accessToken"));
        assert!(out.contains("expiresAt"));
    }

    /// Test: optional session fields may be missing.
    #[test]
    fn test_session_payload_optional_fields() {
        let json = r#"{"accessToken":"at"}"#;
        let session: SessionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.expires_at, None);
    }

    /// Test: status response tolerates a minimal body.
    #[test]
    fn test_subscription_status_defaults() {
        let status: SubscriptionStatusResponse = serde_json::from_str("{}").unwrap();
        assert!(!status.has_subscription);
        assert!(status.subscription.is_none());
        assert!(status.usage.is_none());
    }

    /// Test: OCR extraction prefers ParsedResults over the flat field.
    #[test]
    fn test_ocr_extracted_text_prefers_parsed_results() {
        let json = r#"{"ParsedResults":[{"ParsedText":"hey, are we still on?"}],"text":"ignored"}"#;
        let ocr: OcrResponse = serde_json::from_str(json).unwrap();
        assert_eq!(ocr.extracted_text().as_deref(), Some("hey, are we still on?"));
    }

    /// Test: OCR extraction falls back to the flat field, ignoring blanks.
    #[test]
    fn test_ocr_extracted_text_fallback() {
        let json = r#"{"ParsedResults":[{"ParsedText":"  "}],"text":"from flat field"}"#;
        let ocr: OcrResponse = serde_json::from_str(json).unwrap();
        assert_eq!(ocr.extracted_text().as_deref(), Some("from flat field"));

        let empty: OcrResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.extracted_text(), None);
    }

    /// Test: cancel request omits a missing reason.
    #[test]
    fn test_cancel_request_omits_reason() {
        let body = serde_json::to_string(&CancelSubscriptionRequest {
            reason: None,
        })
        .unwrap();
        assert_eq!(body, "{}");
    }
}
