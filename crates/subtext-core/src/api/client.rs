//! Request executor for the Subtext backend.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiResult};
use super::types::{
    AnalysisResponse, AnalyzeRequest, AuthResponse, CancelSubscriptionRequest,
    CreateSubscriptionRequest, LoginRequest, MutationResponse, OcrResponse, RefreshRequest,
    RefreshResponse, SignupRequest, SubscriptionStatusResponse,
};

/// Standard User-Agent header for Subtext API requests.
pub const USER_AGENT: &str = concat!("subtext/", env!("CARGO_PKG_VERSION"));

/// Thin HTTP gateway: attaches bearer auth when given a token, normalizes
/// non-2xx responses into [`ApiError`], never retries.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Executes a request and normalizes the response.
    async fn execute<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> ApiResult<R> {
        let response = request
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::debug!(%status, path, "backend call failed");
            return Err(ApiError::http_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(format!("Failed to parse response from {path}: {e}")))
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
        bearer: Option<&str>,
    ) -> ApiResult<R> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.execute(request, path).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str, bearer: Option<&str>) -> ApiResult<R> {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.execute(request, path).await
    }

    /// POST /auth/signup
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ApiResult<AuthResponse> {
        self.post_json(
            "/auth/signup",
            &SignupRequest {
                email,
                password,
                full_name,
            },
            None,
        )
        .await
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post_json(
            "/auth/login",
            &LoginRequest {
                email,
                password,
            },
            None,
        )
        .await
    }

    /// POST /auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        self.post_json(
            "/auth/refresh",
            &RefreshRequest {
                refresh_token,
            },
            None,
        )
        .await
    }

    /// POST /auth/logout (best effort; the caller clears local state either way)
    pub async fn logout(&self, access_token: &str) -> ApiResult<()> {
        let request = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({}));

        let response = request
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }
        Ok(())
    }

    /// GET /subscription/status
    pub async fn subscription_status(
        &self,
        access_token: &str,
    ) -> ApiResult<SubscriptionStatusResponse> {
        self.get_json("/subscription/status", Some(access_token)).await
    }

    /// GET /subscriptions/plans (public; display-only shape)
    pub async fn subscription_plans(&self) -> ApiResult<serde_json::Value> {
        self.get_json("/subscriptions/plans", None).await
    }

    /// POST /subscriptions/create
    pub async fn create_subscription(
        &self,
        access_token: &str,
        subscription_id: &str,
        tier: &str,
    ) -> ApiResult<MutationResponse> {
        self.post_json(
            "/subscriptions/create",
            &CreateSubscriptionRequest {
                subscription_id,
                tier,
            },
            Some(access_token),
        )
        .await
    }

    /// POST /subscriptions/cancel
    pub async fn cancel_subscription(
        &self,
        access_token: &str,
        reason: Option<&str>,
    ) -> ApiResult<MutationResponse> {
        self.post_json(
            "/subscriptions/cancel",
            &CancelSubscriptionRequest {
                reason,
            },
            Some(access_token),
        )
        .await
    }

    /// POST /analyze
    pub async fn analyze(
        &self,
        access_token: &str,
        messages: &[String],
    ) -> ApiResult<AnalysisResponse> {
        self.post_json(
            "/analyze",
            &AnalyzeRequest {
                messages,
            },
            Some(access_token),
        )
        .await
    }

    /// POST /ocr (multipart screenshot upload)
    pub async fn ocr(
        &self,
        access_token: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<OcrResponse> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| ApiError::parse(format!("Invalid MIME type {mime_type}: {e}")))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self
            .http
            .post(self.url("/ocr"))
            .bearer_auth(access_token)
            .multipart(form);

        self.execute(request, "/ocr").await
    }
}
