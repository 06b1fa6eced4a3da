mod common;

use common::{token_for, token_with};
use community_portal::{
    MemoryStorage, SessionError, StorageState,
    auth::{SessionStore, decode_claims},
    models::Role,
    storage::{LocalStorage, keys},
};
use serde_json::json;
use std::sync::Arc;

fn store() -> (SessionStore, StorageState) {
    let storage: StorageState = Arc::new(MemoryStorage::new());
    (SessionStore::new(storage.clone()), storage)
}

#[test]
fn test_decode_claims_without_secret() {
    let claims = decode_claims(&token_for("investor")).unwrap();
    assert_eq!(claims.sub, "7");
    assert_eq!(claims.role, Role::Investor);
    assert_eq!(claims.name, "Ada Lovelace");
}

#[test]
fn test_decode_claims_accepts_string_subject_and_missing_exp() {
    let claims = decode_claims(&token_with(json!({ "sub": "abc", "role": "user" }))).unwrap();
    assert_eq!(claims.sub, "abc");
    assert!(claims.exp.is_none());
    assert!(!claims.is_expired_at(i64::MAX));
}

#[test]
fn test_decode_claims_rejects_garbage() {
    assert!(matches!(
        decode_claims("not-a-jwt"),
        Err(SessionError::InvalidToken(_))
    ));
}

#[test]
fn test_unknown_role_claim_decodes_to_unknown() {
    let claims = decode_claims(&token_with(json!({ "sub": 1, "role": "admin" }))).unwrap();
    assert_eq!(claims.role, Role::Unknown);
}

#[test]
fn test_missing_role_claim_decodes_to_unknown() {
    let (session, _) = store();
    let established = session
        .establish(&token_with(json!({ "sub": 4, "email": "x@y.z" })))
        .unwrap();
    assert_eq!(established.role(), Role::Unknown);
    assert_eq!(session.current().unwrap().role(), Role::Unknown);
}

#[test]
fn test_establish_writes_token_and_user() {
    let (session, storage) = store();
    let token = token_for("owner");

    let established = session.establish(&token).unwrap();
    assert_eq!(established.role(), Role::Owner);
    assert_eq!(established.bearer(), format!("Bearer {}", token));

    assert_eq!(storage.get(keys::TOKEN).unwrap(), Some(token));
    let user: serde_json::Value =
        serde_json::from_str(&storage.get(keys::USER).unwrap().unwrap()).unwrap();
    assert_eq!(user["role"], "owner");
    assert_eq!(user["email"], "ada@example.com");
}

#[test]
fn test_establish_with_bad_token_writes_nothing() {
    let (session, storage) = store();
    assert!(session.establish("garbage").is_err());
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER).unwrap(), None);
}

#[test]
fn test_current_requires_both_keys() {
    let (session, storage) = store();
    assert!(session.current().is_none());

    storage.set(keys::TOKEN, "tok").unwrap();
    assert!(session.current().is_none(), "token without user is no session");

    storage
        .set(keys::USER, r#"{"id":3,"email":"x@y.z","name":"X","role":"investor"}"#)
        .unwrap();
    let current = session.current().unwrap();
    assert_eq!(current.user.id, "3");
    assert_eq!(current.role(), Role::Investor);
}

#[test]
fn test_malformed_user_record_is_no_session() {
    let (session, storage) = store();
    storage.set(keys::TOKEN, "tok").unwrap();
    storage.set(keys::USER, "{not json").unwrap();
    assert!(session.current().is_none());
    assert!(!session.is_authenticated());
}

#[test]
fn test_empty_token_is_no_session() {
    let (session, storage) = store();
    storage.set(keys::TOKEN, "").unwrap();
    storage
        .set(keys::USER, r#"{"id":"1","role":"user"}"#)
        .unwrap();
    assert!(session.current().is_none());
}

#[test]
fn test_clear_keeps_reset_keys() {
    let (session, storage) = store();
    session.establish(&token_for("user")).unwrap();
    storage.set(keys::FORGOT_PASSWORD_EMAIL, "a@b.co").unwrap();

    session.clear().unwrap();
    assert!(session.current().is_none());
    assert_eq!(
        storage.get(keys::FORGOT_PASSWORD_EMAIL).unwrap().as_deref(),
        Some("a@b.co")
    );
}

#[test]
fn test_restore_drops_expired_session() {
    let (session, storage) = store();
    let token = token_with(json!({ "sub": 1, "role": "user", "exp": 1_000 }));
    session.establish(&token).unwrap();

    assert!(session.restore(999).is_some());
    assert!(session.restore(1_000).is_none());
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
}

#[test]
fn test_restore_keeps_session_with_unreadable_claims() {
    let storage: StorageState = Arc::new(MemoryStorage::with_entries([
        (keys::TOKEN, "opaque-token"),
        (keys::USER, r#"{"id":"5","role":"owner"}"#),
    ]));
    let session = SessionStore::new(storage);
    let restored = session.restore(chrono::Utc::now().timestamp()).unwrap();
    assert_eq!(restored.token, "opaque-token");
}
