use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, header};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    error::ApiError,
    models::{
        Event, ForgotPasswordRequest, LoginRequest, LoginResponse, OwnerProfile, Participation,
        ProjectDetails, ProjectSummary, RegisterRequest, ResetPasswordRequest, VerifyCodeRequest,
    },
};

/// PortalApi
///
/// Contract for every call the client makes to the remote API. Views and forms only
/// see this trait, so the test suite can stand in for the network with a mock that
/// records calls and returns canned responses.
#[async_trait]
pub trait PortalApi: Send + Sync {
    // --- Auth ---
    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<(), ApiError>;
    async fn verify_code(&self, req: &VerifyCodeRequest) -> Result<(), ApiError>;
    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError>;

    // --- Projects ---
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError>;
    /// `Ok(None)` when the API answers without a record (empty or `null` body).
    async fn get_project(&self, id: &str) -> Result<Option<ProjectDetails>, ApiError>;

    // --- Events ---
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;
    async fn get_event(&self, id: &str) -> Result<Option<Event>, ApiError>;
    async fn participate(&self, event_id: &str) -> Result<(), ApiError>;
    async fn my_participation(&self, event_id: &str) -> Result<Participation, ApiError>;

    // --- Owners ---
    async fn get_owner(&self, id: &str) -> Result<Option<OwnerProfile>, ApiError>;

    /// Sets (or with `None` drops) the bearer token attached to every later request.
    fn set_bearer(&self, token: Option<String>);
}

/// ApiState
///
/// The shared handle to the API client used across the portal context.
pub type ApiState = Arc<dyn PortalApi>;

/// HttpPortalApi
///
/// The concrete `PortalApi` backed by `reqwest`. One instance lives for the whole
/// process; the bearer token set after login is the client-wide default authorization
/// header.
pub struct HttpPortalApi {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<String>>,
}

impl HttpPortalApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            bearer: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let request_id = Uuid::new_v4().to_string();
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-request-id", &request_id);
        if let Some(token) = self.bearer.read().as_deref() {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        (builder, request_id)
    }

    /// send
    ///
    /// Executes one request inside an `api_request` span and maps every non-2xx answer
    /// to `ApiError::Status`, keeping the server's `message` when its body carries one.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let (mut builder, request_id) = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %path,
            req_id = %request_id,
        );

        async move {
            let response = builder.send().await.map_err(|e| {
                tracing::error!("transport failure: {}", e);
                ApiError::from(e)
            })?;

            let status = response.status();
            tracing::debug!(status = status.as_u16(), "response received");
            if status.is_success() {
                return Ok(response);
            }

            let message = response
                .text()
                .await
                .ok()
                .and_then(|raw| extract_message(&raw));
            tracing::warn!(status = status.as_u16(), ?message, "request rejected");
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
        .instrument(span)
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.json::<T>().await?)
    }

    /// Like `get_json`, but an empty or `null` body decodes to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let response = self.send(Method::GET, path, None).await?;
        let raw = response.text().await?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<T>>(&raw).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(Method::POST, path, Some(value)).await
    }

    async fn post_empty<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.post_json(path, body).await.map(|_| ())
    }
}

/// extract_message
///
/// Pulls a human-readable message out of an error body. The API answers validation
/// failures with either `{"message": "..."}` or `{"message": ["...", "..."]}`.
pub fn extract_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        self.post_empty("/auth/register", req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self.post_json("/auth/login", req).await?;
        Ok(response.json::<LoginResponse>().await?)
    }

    async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<(), ApiError> {
        self.post_empty("/auth/forgot-password", req).await
    }

    async fn verify_code(&self, req: &VerifyCodeRequest) -> Result<(), ApiError> {
        self.post_empty("/auth/reset-password/verify-code", req).await
    }

    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.post_empty("/auth/reset-password", req).await
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        self.get_json("/projects").await
    }

    async fn get_project(&self, id: &str) -> Result<Option<ProjectDetails>, ApiError> {
        self.get_optional(&format!("/projects/{}", id)).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get_json("/events").await
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, ApiError> {
        self.get_optional(&format!("/events/{}", id)).await
    }

    async fn participate(&self, event_id: &str) -> Result<(), ApiError> {
        self.send(Method::POST, &format!("/events/{}/participate", event_id), None)
            .await
            .map(|_| ())
    }

    async fn my_participation(&self, event_id: &str) -> Result<Participation, ApiError> {
        self.get_json(&format!("/events/{}/my-participation", event_id))
            .await
    }

    async fn get_owner(&self, id: &str) -> Result<Option<OwnerProfile>, ApiError> {
        self.get_optional(&format!("/owners/{}", id)).await
    }

    fn set_bearer(&self, token: Option<String>) {
        *self.bearer.write() = token;
    }
}
