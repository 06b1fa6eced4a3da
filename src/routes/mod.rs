/// Route Module Index
///
/// Navigation surface of the client. A path is parsed into a `Route`, the route's
/// guards are looked up in the `RouteTable`, and each guard reads the session context
/// to either allow the navigation or redirect it.
///
/// The guard modules mirror the three access levels.

/// Pages only reachable without a session (login, registration, password reset).
pub mod public;

/// Pages that require a session.
pub mod authenticated;

/// Pages restricted to a role.
pub mod owner;

use std::collections::HashMap;
use std::fmt;

use crate::{auth::Session, models::Role};

/// Route
///
/// Every navigable page. Path parameters are kept as opaque strings and handed to the
/// API unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Register,
    Login,
    ForgotPassword,
    EnterCode,
    ResetPassword,
    AllProjects,
    AllEvents,
    Project(String),
    Event(String),
    Owner(String),
    Profile,
    NotFound(String),
}

/// The parameter-free identity of a route, used as the guard table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Home,
    Register,
    Login,
    ForgotPassword,
    EnterCode,
    ResetPassword,
    AllProjects,
    AllEvents,
    Project,
    Event,
    Owner,
    Profile,
    NotFound,
}

impl Route {
    /// parse
    ///
    /// Maps a path to a route. Query strings, fragments and a trailing slash are ignored;
    /// parameterised routes need exactly one non-empty segment after their prefix.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["register"] => Route::Register,
            ["login"] => Route::Login,
            ["forgotpassword"] => Route::ForgotPassword,
            ["entercode"] => Route::EnterCode,
            ["restpassword"] => Route::ResetPassword,
            ["allprojects"] => Route::AllProjects,
            ["allevents"] => Route::AllEvents,
            ["project", id] => Route::Project(id.to_string()),
            ["event", id] => Route::Event(id.to_string()),
            ["owner", id] => Route::Owner(id.to_string()),
            ["profile"] => Route::Profile,
            _ => Route::NotFound(format!("/{}", segments.join("/"))),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Register => "/register".to_string(),
            Route::Login => "/login".to_string(),
            Route::ForgotPassword => "/forgotpassword".to_string(),
            Route::EnterCode => "/entercode".to_string(),
            Route::ResetPassword => "/restpassword".to_string(),
            Route::AllProjects => "/allprojects".to_string(),
            Route::AllEvents => "/allevents".to_string(),
            Route::Project(id) => format!("/project/{}", id),
            Route::Event(id) => format!("/event/{}", id),
            Route::Owner(id) => format!("/owner/{}", id),
            Route::Profile => "/profile".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Home => RouteKind::Home,
            Route::Register => RouteKind::Register,
            Route::Login => RouteKind::Login,
            Route::ForgotPassword => RouteKind::ForgotPassword,
            Route::EnterCode => RouteKind::EnterCode,
            Route::ResetPassword => RouteKind::ResetPassword,
            Route::AllProjects => RouteKind::AllProjects,
            Route::AllEvents => RouteKind::AllEvents,
            Route::Project(_) => RouteKind::Project,
            Route::Event(_) => RouteKind::Event,
            Route::Owner(_) => RouteKind::Owner,
            Route::Profile => RouteKind::Profile,
            Route::NotFound(_) => RouteKind::NotFound,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Guard
///
/// A gate in front of a route. Guards only read the session; they never write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Protected,
    PublicOnly,
    Role(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

impl Guard {
    pub fn check(&self, session: Option<&Session>) -> GuardDecision {
        match self {
            Guard::Protected => authenticated::protected(session),
            Guard::PublicOnly => public::public_only(session),
            Guard::Role(role) => owner::require_role(session, *role),
        }
    }
}

/// Outcome of running a route's guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Allow(Route),
    Redirect { from: Route, to: Route },
}

/// RouteTable
///
/// Guards per route. The default table places the password-reset and sign-in pages
/// behind the public-only guard and every listing, detail and profile page behind the
/// protected guard. Role restrictions are added with `restrict`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    guards: HashMap<RouteKind, Vec<Guard>>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut guards = HashMap::new();
        for kind in public::public_only_routes() {
            guards.insert(kind, vec![Guard::PublicOnly]);
        }
        for kind in authenticated::protected_routes() {
            guards.insert(kind, vec![Guard::Protected]);
        }
        Self { guards }
    }
}

impl RouteTable {
    /// An empty table: every route is reachable.
    pub fn open() -> Self {
        Self {
            guards: HashMap::new(),
        }
    }

    /// Appends a role restriction after the route's existing guards.
    pub fn restrict(mut self, kind: RouteKind, role: Role) -> Self {
        self.guards.entry(kind).or_default().push(Guard::Role(role));
        self
    }

    pub fn guards_for(&self, kind: RouteKind) -> &[Guard] {
        self.guards.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// resolve
    ///
    /// Runs the route's guards in order against one snapshot of the session; the first
    /// redirect wins.
    pub fn resolve(&self, route: Route, session: Option<&Session>) -> Resolution {
        for guard in self.guards_for(route.kind()) {
            if let GuardDecision::Redirect(to) = guard.check(session) {
                tracing::debug!(from = %route, to = %to, ?guard, "navigation redirected");
                return Resolution::Redirect { from: route, to };
            }
        }
        Resolution::Allow(route)
    }
}
