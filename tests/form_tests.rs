mod common;

use common::MockApi;
use community_portal::{
    FileStorage, MemoryStorage, StorageState,
    auth::SessionStore,
    forms::{
        EnterCodeForm, ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm,
        SubmitOutcome, login, password_reset, register,
    },
    models::Role,
    routes::Route,
    storage::{LocalStorage, keys},
};
use std::sync::Arc;

fn filled_register() -> RegisterForm {
    let mut form = RegisterForm::new();
    for (field, value) in [
        ("first_name", "Ada"),
        ("last_name", "Lovelace"),
        ("bio", "Analyst"),
        ("email", "ada@example.com"),
        ("password", "difference-engine"),
        ("password_verify", "difference-engine"),
        ("role", "investor"),
        ("birth_date", "1815-12-10"),
    ] {
        assert!(form.set_field(field, value));
    }
    form
}

fn filled_login(email: &str, password: &str) -> LoginForm {
    let mut form = LoginForm::new();
    form.set_field("email", email);
    form.set_field("password", password);
    form
}

#[cfg(test)]
mod register_tests {
    use super::*;

    #[tokio::test]
    async fn test_mismatched_passwords_block_submit() {
        let api = MockApi::new();
        let mut form = filled_register();
        form.set_field("password_verify", "something-else");

        assert_eq!(form.submit(&api).await, SubmitOutcome::Invalid);
        assert_eq!(form.errors().len(), 1);
        assert_eq!(
            form.errors().get("password_verify").map(String::as_str),
            Some("Passwords must match")
        );
        assert_eq!(api.count("register"), 0);
    }

    #[tokio::test]
    async fn test_every_field_is_validated() {
        let api = MockApi::new();
        let mut form = RegisterForm::new();

        assert_eq!(form.submit(&api).await, SubmitOutcome::Invalid);
        let errors = form.errors();
        assert_eq!(errors.len(), 8);
        // Empty beats every other rule on the same field.
        assert_eq!(errors["password"], "Password is required");
        assert_eq!(errors["email"], "Email is required");
        assert_eq!(errors["role"], "Role is required");
    }

    #[tokio::test]
    async fn test_field_rules() {
        let api = MockApi::new();
        let mut form = filled_register();
        form.set_field("email", "not-an-email");
        form.set_field("password", "short");
        form.set_field("password_verify", "short");
        form.set_field("role", "admin");
        form.set_field("birth_date", "10/12/1815");

        assert_eq!(form.submit(&api).await, SubmitOutcome::Invalid);
        let errors = form.errors();
        assert_eq!(errors["email"], "Please enter a valid email");
        assert_eq!(errors["password"], "Password must be at least 8 characters");
        assert_eq!(errors["role"], "Role must be one of: owner, user, investor");
        assert_eq!(errors["birth_date"], "Please enter a valid date");
        assert!(!errors.contains_key("password_verify"));
    }

    #[tokio::test]
    async fn test_editing_a_field_clears_its_message() {
        let api = MockApi::new();
        let mut form = RegisterForm::new();
        form.submit(&api).await;
        assert!(form.errors().contains_key("bio"));

        form.set_field("bio", "x");
        assert!(!form.errors().contains_key("bio"));
        assert!(form.errors().contains_key("email"));
        assert!(!form.set_field("nickname", "x"));
    }

    #[tokio::test]
    async fn test_success_navigates_to_login() {
        let api = MockApi::new();
        let mut form = filled_register();

        assert_eq!(form.submit(&api).await, SubmitOutcome::Navigate(Route::Login));
        let sent = api.registered.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].role, Role::Investor);
        assert_eq!(sent[0].birth_date.to_string(), "1815-12-10");
        // Draft resets after success.
        assert!(form.draft.email.is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_shows_generic_message() {
        let api = MockApi::new().fail("register", 409, Some("Email already in use"));
        let mut form = filled_register();

        assert_eq!(form.submit(&api).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(register::REGISTER_FAILED));
        assert!(!form.is_submitting());
    }
}

#[cfg(test)]
mod login_tests {
    use super::*;

    fn session() -> (SessionStore, StorageState) {
        let storage: StorageState = Arc::new(MemoryStorage::new());
        (SessionStore::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_login_establishes_session_and_bearer() {
        let api = MockApi::new();
        let (store, storage) = session();
        let mut form = filled_login("ada@example.com", "pw");

        assert_eq!(
            form.submit(&api, &store).await,
            SubmitOutcome::Navigate(Route::Home)
        );

        let token = storage.get(keys::TOKEN).unwrap().unwrap();
        assert_eq!(api.bearer(), Some(token));
        let user: serde_json::Value =
            serde_json::from_str(&storage.get(keys::USER).unwrap().unwrap()).unwrap();
        assert_eq!(user["role"], "owner");
        assert_eq!(store.current().unwrap().role(), Role::Owner);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_invalid_credentials() {
        let api = MockApi::new().fail("login", 401, Some("Unauthorized"));
        let (store, storage) = session();
        let mut form = filled_login("ada@example.com", "wrong");

        assert_eq!(form.submit(&api, &store).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(login::INVALID_CREDENTIALS));
        assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
        assert_eq!(api.bearer(), None);
    }

    #[tokio::test]
    async fn test_server_message_is_used_for_other_statuses() {
        let api = MockApi::new().fail("login", 403, Some("Account locked"));
        let (store, _) = session();
        let mut form = filled_login("ada@example.com", "pw");

        form.submit(&api, &store).await;
        assert_eq!(form.form_error(), Some("Account locked"));
    }

    #[tokio::test]
    async fn test_fallback_message() {
        let api = MockApi::new().fail("login", 500, None);
        let (store, _) = session();
        let mut form = filled_login("ada@example.com", "pw");

        form.submit(&api, &store).await;
        assert_eq!(form.form_error(), Some(login::LOGIN_FAILED));
    }

    #[tokio::test]
    async fn test_undecodable_token_is_rejected() {
        let api = MockApi::new();
        *api.login_token.lock() = "garbage".to_string();
        let (store, storage) = session();
        let mut form = filled_login("ada@example.com", "pw");

        assert_eq!(form.submit(&api, &store).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(login::TOKEN_UNREADABLE));
        assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_fault_is_not_reported_as_bad_token() {
        let api = MockApi::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = SessionStore::new(Arc::new(FileStorage::new(&path)));
        let mut form = filled_login("ada@example.com", "pw");

        assert_eq!(form.submit(&api, &store).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(login::LOGIN_FAILED));
        assert_eq!(api.bearer(), None);
    }

    #[tokio::test]
    async fn test_invalid_email_sends_nothing() {
        let api = MockApi::new();
        let (store, _) = session();
        let mut form = filled_login("nope", "");

        assert_eq!(form.submit(&api, &store).await, SubmitOutcome::Invalid);
        assert_eq!(form.errors()["email"], "Please enter a valid email");
        assert_eq!(form.errors()["password"], "Password is required");
        assert!(api.calls().is_empty());
    }
}

#[cfg(test)]
mod password_reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_reset_flow_uses_storage_between_steps() {
        let api = MockApi::new();
        let storage = MemoryStorage::new();

        let mut forgot = ForgotPasswordForm::new();
        forgot.set_field("email", "ada@example.com");
        assert_eq!(
            forgot.submit(&api, &storage).await,
            SubmitOutcome::Navigate(Route::EnterCode)
        );
        assert_eq!(
            storage.get(keys::FORGOT_PASSWORD_EMAIL).unwrap().as_deref(),
            Some("ada@example.com")
        );

        let mut code = EnterCodeForm::new();
        code.set_field("code", "123456");
        assert_eq!(
            code.submit(&api, &storage).await,
            SubmitOutcome::Navigate(Route::ResetPassword)
        );
        let verified = api.verify_requests.lock().clone();
        assert_eq!(verified[0].email.as_deref(), Some("ada@example.com"));
        assert_eq!(
            storage.get(keys::VERIFICATION_CODE).unwrap().as_deref(),
            Some("123456")
        );

        let mut reset = ResetPasswordForm::new();
        reset.set_field("new_password", "new-password");
        reset.set_field("new_password_verify", "new-password");
        assert_eq!(
            reset.submit(&api, &storage).await,
            SubmitOutcome::Navigate(Route::Login)
        );
        let sent = api.reset_requests.lock().clone();
        assert_eq!(sent[0].email.as_deref(), Some("ada@example.com"));
        assert_eq!(sent[0].code.as_deref(), Some("123456"));

        assert_eq!(storage.get(keys::FORGOT_PASSWORD_EMAIL).unwrap(), None);
        assert_eq!(storage.get(keys::VERIFICATION_CODE).unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let api = MockApi::new().fail("forgot_password", 400, Some("User not found"));
        let storage = MemoryStorage::new();
        let mut form = ForgotPasswordForm::new();
        form.set_field("email", "ghost@example.com");

        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(password_reset::UNKNOWN_EMAIL));
        assert_eq!(storage.get(keys::FORGOT_PASSWORD_EMAIL).unwrap(), None);
    }

    #[tokio::test]
    async fn test_code_must_have_six_characters() {
        let api = MockApi::new();
        let storage = MemoryStorage::new();
        let mut form = EnterCodeForm::new();

        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Invalid);
        assert_eq!(form.errors()["code"], "Code is required");

        form.set_field("code", "12345");
        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Invalid);
        assert_eq!(form.errors()["code"], "Code must be exactly 6 digits");
        assert_eq!(api.count("verify_code"), 0);
    }

    #[tokio::test]
    async fn test_bad_code() {
        let api = MockApi::new().fail("verify_code", 400, None);
        let storage = MemoryStorage::with_entries([(keys::FORGOT_PASSWORD_EMAIL, "a@b.co")]);
        let mut form = EnterCodeForm::new();
        form.set_field("code", "000000");

        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(password_reset::BAD_CODE));
        assert_eq!(storage.get(keys::VERIFICATION_CODE).unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_mismatch_and_rejection() {
        let api = MockApi::new().fail("reset_password", 400, None);
        let storage = MemoryStorage::with_entries([
            (keys::FORGOT_PASSWORD_EMAIL, "a@b.co"),
            (keys::VERIFICATION_CODE, "123456"),
        ]);
        let mut form = ResetPasswordForm::new();
        form.set_field("new_password", "new-password");
        form.set_field("new_password_verify", "other-password");

        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Invalid);
        assert_eq!(form.errors()["new_password_verify"], "Passwords must match");

        form.set_field("new_password_verify", "new-password");
        assert_eq!(form.submit(&api, &storage).await, SubmitOutcome::Rejected);
        assert_eq!(form.form_error(), Some(password_reset::BAD_RESET));
        // Rejected resets keep the remembered state for another attempt.
        assert!(storage.get(keys::VERIFICATION_CODE).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unexpected_failure_uses_fallback() {
        let api = MockApi::new().fail("forgot_password", 503, None);
        let storage = MemoryStorage::new();
        let mut form = ForgotPasswordForm::new();
        form.set_field("email", "ada@example.com");

        form.submit(&api, &storage).await;
        assert_eq!(form.form_error(), Some(password_reset::RESET_FALLBACK));
    }
}
