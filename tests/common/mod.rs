#![allow(dead_code)]

use async_trait::async_trait;
use community_portal::{
    ApiError, PortalApi,
    models::{
        Event, ForgotPasswordRequest, LoginRequest, LoginResponse, OwnerProfile, Participation,
        PersonName, ProjectDetails, ProjectSummary, RegisterRequest, ResetPasswordRequest,
        VerifyCodeRequest,
    },
};
use jsonwebtoken::{EncodingKey, Header, encode};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

// --- Tokens ---

/// Signs arbitrary claims. The client never checks the signature, so any secret will do.
pub fn token_with(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

/// A token for user 7 with the given role, valid for an hour.
pub fn token_for(role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    token_with(json!({
        "sub": 7,
        "email": "ada@example.com",
        "name": "Ada Lovelace",
        "role": role,
        "iat": now,
        "exp": now + 3600,
    }))
}

// --- Mock API ---

/// MockApi
///
/// Records every call, answers with canned data and fails on demand. Failures and
/// delays are keyed by call signature, e.g. `get_project:2`.
pub struct MockApi {
    calls: Mutex<Vec<String>>,
    bearer: Mutex<Option<String>>,
    failures: Mutex<HashMap<String, (u16, Option<String>)>>,
    delays: Mutex<HashMap<String, Duration>>,
    missing: Mutex<HashSet<String>>,
    pub login_token: Mutex<String>,
    pub registered: Mutex<Vec<RegisterRequest>>,
    pub verify_requests: Mutex<Vec<VerifyCodeRequest>>,
    pub reset_requests: Mutex<Vec<ResetPasswordRequest>>,
    pub projects: Vec<ProjectSummary>,
    pub events: Vec<Event>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            calls: Mutex::default(),
            bearer: Mutex::default(),
            failures: Mutex::default(),
            delays: Mutex::default(),
            missing: Mutex::default(),
            login_token: Mutex::new(token_for("owner")),
            registered: Mutex::default(),
            verify_requests: Mutex::default(),
            reset_requests: Mutex::default(),
            projects: vec![
                ProjectSummary {
                    id: 1,
                    name: "Solar Roofs".to_string(),
                    short_info: "Community energy".to_string(),
                    image_url: None,
                },
                ProjectSummary {
                    id: 2,
                    name: "Urban Garden".to_string(),
                    short_info: "Fresh food downtown".to_string(),
                    image_url: None,
                },
            ],
            events: vec![sample_event(1, "Spring Meetup"), sample_event(2, "Hackathon")],
        }
    }
}

pub fn sample_event(id: i64, name: &str) -> Event {
    Event {
        id,
        name: name.to_string(),
        category: "tech".to_string(),
        city: "Nablus".to_string(),
        street: "Main St".to_string(),
        status: "upcoming".to_string(),
        ..Event::default()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, call: &str, status: u16, message: Option<&str>) -> Self {
        self.failures
            .lock()
            .insert(call.to_string(), (status, message.map(str::to_string)));
        self
    }

    pub fn delay(self, call: &str, delay: Duration) -> Self {
        self.delays.lock().insert(call.to_string(), delay);
        self
    }

    /// The call succeeds but answers without a record.
    pub fn missing(self, call: &str) -> Self {
        self.missing.lock().insert(call.to_string());
        self
    }

    fn is_missing(&self, call: &str) -> bool {
        self.missing.lock().contains(call)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.lock().clone()
    }

    async fn enter(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().push(call.clone());
        let delay = self.delays.lock().get(&call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().get(&call).cloned() {
            Some((status, message)) => Err(ApiError::Status { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortalApi for MockApi {
    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        self.enter("register".to_string()).await?;
        self.registered.lock().push(req.clone());
        Ok(())
    }

    async fn login(&self, _req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.enter("login".to_string()).await?;
        Ok(LoginResponse {
            token: self.login_token.lock().clone(),
        })
    }

    async fn forgot_password(&self, _req: &ForgotPasswordRequest) -> Result<(), ApiError> {
        self.enter("forgot_password".to_string()).await
    }

    async fn verify_code(&self, req: &VerifyCodeRequest) -> Result<(), ApiError> {
        self.enter("verify_code".to_string()).await?;
        self.verify_requests.lock().push(req.clone());
        Ok(())
    }

    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.enter("reset_password".to_string()).await?;
        self.reset_requests.lock().push(req.clone());
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        self.enter("list_projects".to_string()).await?;
        Ok(self.projects.clone())
    }

    async fn get_project(&self, id: &str) -> Result<Option<ProjectDetails>, ApiError> {
        let call = format!("get_project:{}", id);
        self.enter(call.clone()).await?;
        if self.is_missing(&call) {
            return Ok(None);
        }
        Ok(Some(ProjectDetails {
            id: id.parse().unwrap_or_default(),
            name: format!("Project {}", id),
            ..ProjectDetails::default()
        }))
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.enter("list_events".to_string()).await?;
        Ok(self.events.clone())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, ApiError> {
        let call = format!("get_event:{}", id);
        self.enter(call.clone()).await?;
        if self.is_missing(&call) {
            return Ok(None);
        }
        let id: i64 = id.parse().unwrap_or_default();
        Ok(Some(
            self.events
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .unwrap_or_else(|| sample_event(id, "Unlisted")),
        ))
    }

    async fn participate(&self, event_id: &str) -> Result<(), ApiError> {
        self.enter(format!("participate:{}", event_id)).await
    }

    async fn my_participation(&self, event_id: &str) -> Result<Participation, ApiError> {
        self.enter(format!("my_participation:{}", event_id)).await?;
        Ok(Participation {
            participating: false,
            status: None,
        })
    }

    async fn get_owner(&self, id: &str) -> Result<Option<OwnerProfile>, ApiError> {
        let call = format!("get_owner:{}", id);
        self.enter(call.clone()).await?;
        if self.is_missing(&call) {
            return Ok(None);
        }
        Ok(Some(OwnerProfile {
            id: id.parse().ok(),
            bio: "Builds things".to_string(),
            birth_date: Some("1990-04-12".to_string()),
            user: PersonName {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: None,
            },
            ..OwnerProfile::default()
        }))
    }

    fn set_bearer(&self, token: Option<String>) {
        *self.bearer.lock() = token;
    }
}
