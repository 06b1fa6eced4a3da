//! Schema-validated auth forms.
//!
//! Each form keeps a draft, validates the whole draft on submit (every field, never
//! stopping at the first failure), shows one message per failed field and maps API
//! failures to a single form-level message.

pub mod login;
pub mod password_reset;
pub mod register;

use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use crate::{error::ApiError, routes::Route};

pub use login::{LoginDraft, LoginForm};
pub use password_reset::{
    EnterCodeDraft, EnterCodeForm, ForgotPasswordDraft, ForgotPasswordForm, ResetPasswordDraft,
    ResetPasswordForm,
};
pub use register::{RegisterDraft, RegisterForm};

/// Error code of the "field is empty" rule. It outranks every other rule on a field.
pub const REQUIRED: &str = "required";

/// Field name -> the one message shown under that field.
pub type FieldErrors = BTreeMap<String, String>;

/// Draft
///
/// The editable side of a form: a fixed set of string fields addressed by name.
pub trait Draft: Validate + Default {
    /// Field names in display order.
    const FIELDS: &'static [&'static str];

    /// Writes a field. Returns `false` for a name the draft does not have.
    fn set(&mut self, field: &str, value: &str) -> bool;
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; see `FormState::errors`. No request was sent.
    Invalid,
    /// A submission is already in flight. No request was sent.
    Busy,
    /// The API refused or could not be reached; see `FormState::form_error`.
    Rejected,
    /// Success; the form asks to navigate here.
    Navigate(Route),
}

/// FormState
///
/// Draft plus the inline, form-level and in-flight state shared by every auth form.
#[derive(Debug, Default)]
pub struct FormState<D> {
    pub draft: D,
    errors: FieldErrors,
    form_error: Option<String>,
    submitting: bool,
}

impl<D: Draft> FormState<D> {
    pub fn new() -> Self {
        Self {
            draft: D::default(),
            errors: FieldErrors::new(),
            form_error: None,
            submitting: false,
        }
    }

    /// Edits a field, clearing that field's message and the form-level message.
    pub fn set_field(&mut self, field: &str, value: &str) -> bool {
        if !self.draft.set(field, value) {
            return false;
        }
        self.errors.remove(field);
        self.form_error = None;
        true
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Runs the schema over the whole draft and replaces the inline messages.
    pub fn validate(&mut self) -> bool {
        match self.draft.validate() {
            Ok(()) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                self.errors = first_messages(&errors);
                tracing::debug!(fields = ?self.errors.keys().collect::<Vec<_>>(), "draft rejected");
                false
            }
        }
    }

    /// begin_submit
    ///
    /// Clears the form-level message and validates. Returns the outcome to report
    /// immediately, or `None` when the caller should go ahead and send the request.
    pub(crate) fn begin_submit(&mut self) -> Option<SubmitOutcome> {
        if self.submitting {
            return Some(SubmitOutcome::Busy);
        }
        self.form_error = None;
        if !self.validate() {
            return Some(SubmitOutcome::Invalid);
        }
        self.submitting = true;
        None
    }

    pub(crate) fn finish_ok(&mut self, to: Route) -> SubmitOutcome {
        self.submitting = false;
        self.draft = D::default();
        SubmitOutcome::Navigate(to)
    }

    pub(crate) fn finish_err(&mut self, message: String) -> SubmitOutcome {
        self.submitting = false;
        self.form_error = Some(message);
        SubmitOutcome::Rejected
    }
}

/// first_messages
///
/// Collapses validator output to one message per field: the "required" rule if it
/// failed, otherwise the first failed rule in declaration order.
pub fn first_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let chosen = errs
                .iter()
                .find(|e| e.code == REQUIRED)
                .or_else(|| errs.first())?;
            let message = chosen
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| chosen.code.to_string());
            Some((field.to_string(), message))
        })
        .collect()
}

/// rejection_message
///
/// Known statuses first, then whatever message the server sent, then the fallback.
pub fn rejection_message(err: &ApiError, known: &[(u16, &str)], fallback: &str) -> String {
    if let Some(status) = err.status() {
        if let Some((_, message)) = known.iter().find(|(code, _)| *code == status) {
            return message.to_string();
        }
    }
    err.server_message()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
