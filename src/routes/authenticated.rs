use super::{GuardDecision, Route, RouteKind};
use crate::auth::Session;

/// Where unauthenticated navigation to a protected page ends up.
pub const LANDING: Route = Route::Login;

/// Routes that require a session.
pub fn protected_routes() -> [RouteKind; 6] {
    [
        RouteKind::AllProjects,
        RouteKind::AllEvents,
        RouteKind::Project,
        RouteKind::Event,
        RouteKind::Owner,
        RouteKind::Profile,
    ]
}

/// protected
///
/// Renders only when a session (and therefore a token) is present.
pub fn protected(session: Option<&Session>) -> GuardDecision {
    match session {
        Some(_) => GuardDecision::Allow,
        None => GuardDecision::Redirect(LANDING),
    }
}
