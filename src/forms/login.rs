use validator::Validate;

use super::{Draft, FormState, SubmitOutcome, rejection_message};
use crate::{
    api::PortalApi,
    auth::SessionStore,
    error::{ApiError, SessionError},
    models::LoginRequest,
    routes::Route,
};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const TOKEN_UNREADABLE: &str = "Authentication error. Please try again.";
pub const LOGIN_FAILED: &str = "An error occurred during login. Please try again.";

#[derive(Debug, Clone, Default, Validate)]
pub struct LoginDraft {
    #[validate(
        length(min = 1, code = "required", message = "Email is required"),
        email(message = "Please enter a valid email")
    )]
    pub email: String,

    #[validate(length(min = 1, code = "required", message = "Password is required"))]
    pub password: String,
}

impl Draft for LoginDraft {
    const FIELDS: &'static [&'static str] = &["email", "password"];

    fn set(&mut self, field: &str, value: &str) -> bool {
        match field {
            "email" => self.email = value.to_string(),
            "password" => self.password = value.to_string(),
            _ => return false,
        }
        true
    }
}

/// LoginForm
///
/// `/login`. A successful login writes the session and makes its token the default
/// bearer header for every later request.
pub type LoginForm = FormState<LoginDraft>;

impl LoginForm {
    pub async fn submit(&mut self, api: &dyn PortalApi, session: &SessionStore) -> SubmitOutcome {
        if let Some(outcome) = self.begin_submit() {
            return outcome;
        }
        let request = LoginRequest {
            email: self.draft.email.clone(),
            password: self.draft.password.clone(),
        };

        let response = match api.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("login failed: {}", e);
                return self.finish_err(login_message(&e));
            }
        };

        match session.establish(&response.token) {
            Ok(established) => {
                api.set_bearer(Some(established.token));
                self.finish_ok(Route::Home)
            }
            Err(SessionError::InvalidToken(e)) => {
                tracing::error!("login token rejected: {}", e);
                self.finish_err(TOKEN_UNREADABLE.to_string())
            }
            Err(SessionError::Storage(e)) => {
                tracing::error!("session could not be persisted: {}", e);
                self.finish_err(LOGIN_FAILED.to_string())
            }
        }
    }
}

fn login_message(err: &ApiError) -> String {
    rejection_message(err, &[(401, INVALID_CREDENTIALS)], LOGIN_FAILED)
}
