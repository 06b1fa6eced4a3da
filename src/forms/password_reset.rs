//! The three password-reset steps.
//!
//! State is carried between the steps through persistent storage: the email entered on
//! the first step and the code accepted on the second are read back by the last one,
//! which clears both once the API accepts the new password.

use validator::{Validate, ValidationError};

use super::{Draft, FormState, REQUIRED, SubmitOutcome, rejection_message};
use crate::{
    api::PortalApi,
    error::StorageError,
    models::{ForgotPasswordRequest, ResetPasswordRequest, VerifyCodeRequest},
    routes::Route,
    storage::{LocalStorage, keys},
};

pub const UNKNOWN_EMAIL: &str = "Invalid email address or user not found";
pub const BAD_CODE: &str = "Invalid or expired code";
pub const BAD_RESET: &str = "Invalid request. Please try again.";
pub const RESET_FALLBACK: &str = "An error occurred. Please try again later.";

// --- Step 1: forgot password ---

#[derive(Debug, Clone, Default, Validate)]
pub struct ForgotPasswordDraft {
    #[validate(
        length(min = 1, code = "required", message = "Email is required"),
        email(message = "Please enter a valid email")
    )]
    pub email: String,
}

impl Draft for ForgotPasswordDraft {
    const FIELDS: &'static [&'static str] = &["email"];

    fn set(&mut self, field: &str, value: &str) -> bool {
        if field != "email" {
            return false;
        }
        self.email = value.to_string();
        true
    }
}

/// ForgotPasswordForm
///
/// `/forgotpassword`. Sends the reset code and remembers the email for the next steps.
pub type ForgotPasswordForm = FormState<ForgotPasswordDraft>;

impl ForgotPasswordForm {
    pub async fn submit(&mut self, api: &dyn PortalApi, storage: &dyn LocalStorage) -> SubmitOutcome {
        if let Some(outcome) = self.begin_submit() {
            return outcome;
        }
        let email = self.draft.email.clone();

        if let Err(e) = api
            .forgot_password(&ForgotPasswordRequest {
                email: email.clone(),
            })
            .await
        {
            tracing::error!("reset code request failed: {}", e);
            return self.finish_err(rejection_message(
                &e,
                &[(400, UNKNOWN_EMAIL)],
                RESET_FALLBACK,
            ));
        }

        if let Err(e) = storage.set(keys::FORGOT_PASSWORD_EMAIL, &email) {
            return self.storage_failure(e);
        }
        self.finish_ok(Route::EnterCode)
    }
}

// --- Step 2: enter code ---

#[derive(Debug, Clone, Default, Validate)]
pub struct EnterCodeDraft {
    #[validate(
        custom(function = "code_required"),
        length(equal = 6, message = "Code must be exactly 6 digits")
    )]
    pub code: String,
}

fn code_required(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() {
        return Ok(());
    }
    let mut err = ValidationError::new(REQUIRED);
    err.message = Some("Code is required".into());
    Err(err)
}

impl Draft for EnterCodeDraft {
    const FIELDS: &'static [&'static str] = &["code"];

    fn set(&mut self, field: &str, value: &str) -> bool {
        if field != "code" {
            return false;
        }
        self.code = value.to_string();
        true
    }
}

/// EnterCodeForm
///
/// `/entercode`. Verifies the emailed code against the remembered email.
pub type EnterCodeForm = FormState<EnterCodeDraft>;

impl EnterCodeForm {
    /// The address the code was sent to, as remembered by the previous step.
    pub fn email(storage: &dyn LocalStorage) -> Option<String> {
        storage.get(keys::FORGOT_PASSWORD_EMAIL).ok().flatten()
    }

    pub async fn submit(&mut self, api: &dyn PortalApi, storage: &dyn LocalStorage) -> SubmitOutcome {
        if let Some(outcome) = self.begin_submit() {
            return outcome;
        }
        let code = self.draft.code.clone();
        let request = VerifyCodeRequest {
            email: Self::email(storage),
            code: code.clone(),
        };

        if let Err(e) = api.verify_code(&request).await {
            tracing::error!("code verification failed: {}", e);
            return self.finish_err(rejection_message(&e, &[(400, BAD_CODE)], RESET_FALLBACK));
        }

        if let Err(e) = storage.set(keys::VERIFICATION_CODE, &code) {
            return self.storage_failure(e);
        }
        self.finish_ok(Route::ResetPassword)
    }
}

// --- Step 3: new password ---

#[derive(Debug, Clone, Default, Validate)]
pub struct ResetPasswordDraft {
    #[validate(
        custom(function = "crate::forms::register::password_required"),
        length(min = 8, message = "Password must be at least 8 characters")
    )]
    pub new_password: String,

    #[validate(
        length(min = 1, code = "required", message = "Password confirmation is required"),
        must_match(other = "new_password", message = "Passwords must match")
    )]
    pub new_password_verify: String,
}

impl Draft for ResetPasswordDraft {
    const FIELDS: &'static [&'static str] = &["new_password", "new_password_verify"];

    fn set(&mut self, field: &str, value: &str) -> bool {
        match field {
            "new_password" => self.new_password = value.to_string(),
            "new_password_verify" => self.new_password_verify = value.to_string(),
            _ => return false,
        }
        true
    }
}

/// ResetPasswordForm
///
/// `/restpassword`. Sends the new password with the remembered email and code.
pub type ResetPasswordForm = FormState<ResetPasswordDraft>;

impl ResetPasswordForm {
    pub async fn submit(&mut self, api: &dyn PortalApi, storage: &dyn LocalStorage) -> SubmitOutcome {
        if let Some(outcome) = self.begin_submit() {
            return outcome;
        }
        let request = ResetPasswordRequest {
            email: storage.get(keys::FORGOT_PASSWORD_EMAIL).ok().flatten(),
            code: storage.get(keys::VERIFICATION_CODE).ok().flatten(),
            new_password: self.draft.new_password.clone(),
            new_password_verify: self.draft.new_password_verify.clone(),
        };

        if let Err(e) = api.reset_password(&request).await {
            tracing::error!("password reset failed: {}", e);
            return self.finish_err(rejection_message(&e, &[(400, BAD_RESET)], RESET_FALLBACK));
        }

        for key in [keys::FORGOT_PASSWORD_EMAIL, keys::VERIFICATION_CODE] {
            if let Err(e) = storage.remove(key) {
                tracing::warn!(key, "could not clear reset state: {}", e);
            }
        }
        tracing::info!("password reset completed");
        self.finish_ok(Route::Login)
    }
}

impl<D: Draft> FormState<D> {
    fn storage_failure(&mut self, err: StorageError) -> SubmitOutcome {
        tracing::error!("could not persist reset state: {}", err);
        self.finish_err(RESET_FALLBACK.to_string())
    }
}
