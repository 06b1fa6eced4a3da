use chrono::NaiveDate;
use validator::{Validate, ValidationError};

use super::{Draft, FormState, REQUIRED, SubmitOutcome};
use crate::{
    api::PortalApi,
    models::{RegisterRequest, Role},
    routes::Route,
};

pub const REGISTER_FAILED: &str = "An error occurred during registration. Please try again.";

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// RegisterDraft
///
/// Raw input of the registration form. `role` and `birth_date` stay strings until the
/// schema accepts them.
#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterDraft {
    #[validate(length(min = 1, code = "required", message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, code = "required", message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, code = "required", message = "Bio is required"))]
    pub bio: String,

    #[validate(
        length(min = 1, code = "required", message = "Email is required"),
        email(message = "Please enter a valid email")
    )]
    pub email: String,

    #[validate(
        custom(function = "password_required"),
        length(min = 8, message = "Password must be at least 8 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, code = "required", message = "Password confirmation is required"),
        must_match(other = "password", message = "Passwords must match")
    )]
    pub password_verify: String,

    #[validate(
        length(min = 1, code = "required", message = "Role is required"),
        custom(function = "validate_role")
    )]
    pub role: String,

    #[validate(
        length(min = 1, code = "required", message = "Birth date is required"),
        custom(function = "validate_birth_date")
    )]
    pub birth_date: String,
}

/// Required-rule for password fields, which already carry a `length` rule of their own.
pub(crate) fn password_required(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() {
        return Ok(());
    }
    let mut err = ValidationError::new(REQUIRED);
    err.message = Some("Password is required".into());
    Err(err)
}

fn validate_role(value: &str) -> Result<(), ValidationError> {
    if Role::parse(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("role");
    err.message = Some("Role must be one of: owner, user, investor".into());
    Err(err)
}

fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("date");
    err.message = Some("Please enter a valid date".into());
    Err(err)
}

impl Draft for RegisterDraft {
    const FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "bio",
        "email",
        "birth_date",
        "role",
        "password",
        "password_verify",
    ];

    fn set(&mut self, field: &str, value: &str) -> bool {
        let slot = match field {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "bio" => &mut self.bio,
            "email" => &mut self.email,
            "password" => &mut self.password,
            "password_verify" => &mut self.password_verify,
            "role" => &mut self.role,
            "birth_date" => &mut self.birth_date,
            _ => return false,
        };
        *slot = value.to_string();
        true
    }
}

impl RegisterDraft {
    /// Converts an accepted draft into the request body. `None` if the draft would not
    /// pass validation.
    pub fn to_request(&self) -> Option<RegisterRequest> {
        Some(RegisterRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            password_verify: self.password_verify.clone(),
            role: Role::parse(&self.role)?,
            birth_date: NaiveDate::parse_from_str(&self.birth_date, BIRTH_DATE_FORMAT).ok()?,
        })
    }
}

/// RegisterForm
///
/// `/register`. On success the user is sent to `/login`; registration does not sign in.
pub type RegisterForm = FormState<RegisterDraft>;

impl RegisterForm {
    pub async fn submit(&mut self, api: &dyn PortalApi) -> SubmitOutcome {
        if let Some(outcome) = self.begin_submit() {
            return outcome;
        }
        let Some(request) = self.draft.to_request() else {
            return self.finish_err(REGISTER_FAILED.to_string());
        };

        match api.register(&request).await {
            Ok(()) => {
                tracing::info!(email = %request.email, role = %request.role, "registration accepted");
                self.finish_ok(Route::Login)
            }
            Err(e) => {
                tracing::error!("registration failed: {}", e);
                self.finish_err(REGISTER_FAILED.to_string())
            }
        }
    }
}
