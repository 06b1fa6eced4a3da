use super::{GuardDecision, Route};
use crate::{auth::Session, models::Role};

/// require_role
///
/// Allows the navigation when the session's role grants the capability that `required`
/// identifies. An absent session is simply not authorized and is redirected home like
/// any other mismatch.
pub fn require_role(session: Option<&Session>, required: Role) -> GuardDecision {
    let Some(session) = session else {
        return GuardDecision::Redirect(Route::Home);
    };

    if required != Role::Unknown && session.role().can(required.capability()) {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(Route::Home)
    }
}
