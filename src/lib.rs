// --- Module Structure ---

// Core client services and components.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod storage;
pub mod views;

// Navigation surface and guards (public-only, protected, role-restricted).
pub mod routes;

// Terminal front end driving the portal.
pub mod shell;

use chrono::Utc;

use auth::{Session, SessionStore};
use forms::{EnterCodeForm, ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};
use routes::{Resolution, Route, RouteTable};
use views::{EventDetailView, EventListView, OwnerProfileView, ProjectDetailView, ProjectListView};

// --- Public Re-exports ---

pub use api::{ApiState, HttpPortalApi, PortalApi};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, SessionError, StorageError};
pub use storage::{FileStorage, MemoryStorage, StorageState};

/// Redirect hops followed before a navigation is abandoned.
const MAX_REDIRECTS: usize = 4;

/// Portal
///
/// The client's single context object. Guards, forms and views receive their
/// collaborators from here explicitly; nothing reads global state.
#[derive(Clone)]
pub struct Portal {
    /// The loaded, immutable configuration.
    pub config: ClientConfig,
    /// Session context over persistent storage.
    pub session: SessionStore,
    /// Remote API client shared by every component.
    pub api: ApiState,
    /// Guards per route.
    pub routes: RouteTable,
}

impl Portal {
    pub fn new(config: ClientConfig, storage: StorageState, api: ApiState) -> Self {
        Self {
            config,
            session: SessionStore::new(storage),
            api,
            routes: RouteTable::default(),
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn storage(&self) -> &StorageState {
        self.session.storage()
    }

    /// restore_session
    ///
    /// Startup step: drops an expired stored session and, for a live one, installs its
    /// token as the default bearer header.
    pub fn restore_session(&self) -> Option<Session> {
        let session = self.session.restore(Utc::now().timestamp());
        self.api.set_bearer(session.as_ref().map(|s| s.token.clone()));
        session
    }

    /// Ends the session and stops sending its token.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.clear()?;
        self.api.set_bearer(None);
        Ok(())
    }

    /// navigate
    ///
    /// Resolves a path through the route guards, following redirects, and mounts the
    /// screen of the final route. The session is read afresh for every hop.
    pub fn navigate(&self, path: &str) -> Navigation {
        let requested = Route::parse(path);
        let mut route = requested.clone();
        let mut redirects = Vec::new();

        loop {
            let session = self.session.current();
            match self.routes.resolve(route, session.as_ref()) {
                Resolution::Allow(allowed) => {
                    tracing::info!(path = %allowed, "navigated");
                    return Navigation {
                        requested,
                        redirects,
                        screen: Screen::mount(allowed, self),
                    };
                }
                Resolution::Redirect { to, .. } if redirects.len() < MAX_REDIRECTS => {
                    redirects.push(to.clone());
                    route = to;
                }
                Resolution::Redirect { from, to } => {
                    tracing::warn!(from = %from, to = %to, "redirect limit reached");
                    return Navigation {
                        requested,
                        redirects,
                        screen: Screen::Home,
                    };
                }
            }
        }
    }
}

/// Navigation
///
/// Result of one navigation request.
pub struct Navigation {
    pub requested: Route,
    /// Every redirect target in the order it was applied.
    pub redirects: Vec<Route>,
    pub screen: Screen,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }

    /// The route that was finally rendered.
    pub fn landed_on(&self) -> Route {
        self.redirects
            .last()
            .cloned()
            .unwrap_or_else(|| self.requested.clone())
    }
}

/// Screen
///
/// A mounted page: the component instance behind a route.
pub enum Screen {
    Home,
    Register(RegisterForm),
    Login(LoginForm),
    ForgotPassword(ForgotPasswordForm),
    EnterCode(EnterCodeForm),
    ResetPassword(ResetPasswordForm),
    AllProjects(ProjectListView),
    AllEvents(EventListView),
    Project { id: String, view: ProjectDetailView },
    Event { id: String, view: EventDetailView },
    Owner { id: String, view: OwnerProfileView },
    Profile(Option<Session>),
    NotFound(String),
}

impl Screen {
    fn mount(route: Route, portal: &Portal) -> Screen {
        let api = portal.api.clone();
        match route {
            Route::Home => Screen::Home,
            Route::Register => Screen::Register(RegisterForm::new()),
            Route::Login => Screen::Login(LoginForm::new()),
            Route::ForgotPassword => Screen::ForgotPassword(ForgotPasswordForm::new()),
            Route::EnterCode => Screen::EnterCode(EnterCodeForm::new()),
            Route::ResetPassword => Screen::ResetPassword(ResetPasswordForm::new()),
            Route::AllProjects => Screen::AllProjects(ProjectListView::new(api)),
            Route::AllEvents => Screen::AllEvents(EventListView::new(api)),
            Route::Project(id) => Screen::Project {
                id,
                view: ProjectDetailView::new(api),
            },
            Route::Event(id) => Screen::Event {
                id,
                view: EventDetailView::new(api),
            },
            Route::Owner(id) => Screen::Owner {
                id,
                view: OwnerProfileView::new(api),
            },
            Route::Profile => Screen::Profile(portal.session.current()),
            Route::NotFound(path) => Screen::NotFound(path),
        }
    }

    /// activate
    ///
    /// Issues the screen's on-mount request, if it has one. Forms and static pages do
    /// nothing.
    pub async fn activate(&self) {
        match self {
            Screen::AllProjects(view) => view.load().await,
            Screen::AllEvents(view) => view.load().await,
            Screen::Project { id, view } => view.open(id).await,
            Screen::Event { id, view } => {
                view.open(id).await;
                if view.state().data().is_some() {
                    view.load_participation().await;
                }
            }
            Screen::Owner { id, view } => view.open(Some(id)).await,
            _ => {}
        }
    }

    /// Cancels any in-flight request; called when the screen is replaced.
    pub fn unmount(&self) {
        match self {
            Screen::AllProjects(view) => view.unmount(),
            Screen::AllEvents(view) => view.unmount(),
            Screen::Project { view, .. } => view.unmount(),
            Screen::Event { view, .. } => view.unmount(),
            Screen::Owner { view, .. } => view.unmount(),
            _ => {}
        }
    }
}
