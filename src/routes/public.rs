use super::{GuardDecision, Route, RouteKind};
use crate::auth::Session;

/// Routes that a signed-in session is kept away from.
pub fn public_only_routes() -> [RouteKind; 5] {
    [
        RouteKind::Register,
        RouteKind::Login,
        RouteKind::ForgotPassword,
        RouteKind::EnterCode,
        RouteKind::ResetPassword,
    ]
}

/// public_only
///
/// Sends an authenticated session to the home route; renders otherwise.
pub fn public_only(session: Option<&Session>) -> GuardDecision {
    match session {
        Some(_) => GuardDecision::Redirect(Route::Home),
        None => GuardDecision::Allow,
    }
}
