use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    error::SessionError,
    models::{Role, SessionUser, string_or_number},
    storage::{StorageState, keys},
};

/// Claims
///
/// The payload the API signs into every login token. The client never holds the
/// signing secret, so these claims are read optimistically: the signature is not
/// checked here, the API checks it on every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id.
    #[serde(deserialize_with = "string_or_number")]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Expiration Time (exp), seconds since the epoch. Absent on non-expiring tokens.
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        matches!(self.exp, Some(exp) if exp <= now_secs)
    }

    fn to_user(&self) -> SessionUser {
        SessionUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// decode_claims
///
/// Reads the claims of a JWT without verifying its signature or expiry. Fails only
/// when the token is structurally malformed or its payload is not a claims object.
pub fn decode_claims(token: &str) -> Result<Claims, SessionError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

/// Session
///
/// A token together with the user record derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }

    /// The header value the API expects on authenticated requests.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// SessionStore
///
/// Explicit session context handed to guards and components. It owns no cached copy:
/// every read goes back to storage, so a logout performed by another shell sharing the
/// same storage file is observed on the next navigation.
#[derive(Clone)]
pub struct SessionStore {
    storage: StorageState,
}

impl SessionStore {
    pub fn new(storage: StorageState) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageState {
        &self.storage
    }

    /// current
    ///
    /// The present session, or `None`. A missing token, an empty token, a missing user
    /// record and an unparsable user record all count as "no session". Storage failures
    /// are logged and treated the same way so that a guard never faults.
    pub fn current(&self) -> Option<Session> {
        let token = match self.storage.get(keys::TOKEN) {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!("session token unreadable: {}", e);
                return None;
            }
        };

        let raw_user = match self.storage.get(keys::USER) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("token present without a user record");
                return None;
            }
            Err(e) => {
                tracing::warn!("session user unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<SessionUser>(&raw_user) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                tracing::warn!("stored user record is malformed: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// establish
    ///
    /// Decodes the login token, writes `token` and `user`, and returns the new session.
    /// Nothing is written when the token cannot be decoded.
    pub fn establish(&self, token: &str) -> Result<Session, SessionError> {
        let claims = decode_claims(token)?;
        let user = claims.to_user();
        let serialized = serde_json::to_string(&user)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        self.storage.set(keys::TOKEN, token)?;
        self.storage.set(keys::USER, &serialized)?;

        tracing::info!(user_id = %user.id, role = %user.role, "session established");
        Ok(Session {
            token: token.to_string(),
            user,
        })
    }

    /// Removes the session keys. Password-reset keys are left alone.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.storage.remove(keys::TOKEN)?;
        self.storage.remove(keys::USER)?;
        tracing::info!("session cleared");
        Ok(())
    }

    /// restore
    ///
    /// Startup check: returns the stored session unless its token has expired, in which
    /// case the keys are cleared. Tokens whose claims cannot be read keep working until
    /// the API rejects them.
    pub fn restore(&self, now_secs: i64) -> Option<Session> {
        let session = self.current()?;
        match decode_claims(&session.token) {
            Ok(claims) if claims.is_expired_at(now_secs) => {
                tracing::info!(user_id = %session.user.id, "stored session expired");
                if let Err(e) = self.clear() {
                    tracing::warn!("could not clear expired session: {}", e);
                }
                None
            }
            Ok(_) => Some(session),
            Err(e) => {
                tracing::debug!("stored token claims unreadable: {}", e);
                Some(session)
            }
        }
    }
}
