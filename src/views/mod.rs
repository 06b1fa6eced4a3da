//! Fetch-and-render views.
//!
//! Every view owns a `Resource`: the three-state `FetchState` plus the `RequestScope`
//! that ties in-flight requests to the view's lifetime and to the route parameter it
//! was opened with. Views are cheap `Clone` handles over shared state so a shell can
//! start a load and read the state from elsewhere.

pub mod events;
pub mod owners;
pub mod projects;

use parking_lot::RwLock;
use std::{future::Future, sync::Arc};
use tokio::sync::watch;

use crate::error::ApiError;

pub use events::{EventDetailView, EventListView, Notice};
pub use owners::OwnerProfileView;
pub use projects::{ProjectDetailView, ProjectListView};

/// FetchState
///
/// The three mutually exclusive states of a fetching view.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Failed(String),
    Loaded(T),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// RequestScope
///
/// Generation counter shared by a view and its in-flight requests. `begin` starts a
/// new generation, which supersedes every earlier ticket; `cancel` supersedes them
/// without starting a new one. Dropping the scope cancels as well.
pub struct RequestScope {
    generation: watch::Sender<u64>,
}

impl Default for RequestScope {
    fn default() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        let mut issued = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            issued = *g;
        });
        Ticket {
            generation: issued,
            current: self.generation.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.generation.send_modify(|g| *g += 1);
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Ticket
///
/// One request's claim on its scope.
pub struct Ticket {
    generation: u64,
    current: watch::Receiver<u64>,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        *self.current.borrow() == self.generation
    }

    /// run
    ///
    /// Drives `fut` until it completes or the ticket is superseded, whichever comes
    /// first. A superseded request is dropped mid-flight and yields `None`.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if !self.is_current() {
            return None;
        }
        let mut watcher = self.current.clone();
        let generation = self.generation;

        tokio::select! {
            out = fut => self.is_current().then_some(out),
            _ = superseded(&mut watcher, generation) => None,
        }
    }
}

async fn superseded(watcher: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if watcher.changed().await.is_err() {
            return;
        }
        if *watcher.borrow_and_update() != generation {
            return;
        }
    }
}

/// Resource
///
/// Shared fetch state plus its request scope.
pub struct Resource<T> {
    state: Arc<RwLock<FetchState<T>>>,
    scope: Arc<RequestScope>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(FetchState::Loading)),
            scope: Arc::new(RequestScope::new()),
        }
    }
}

impl<T: Clone> Resource<T> {
    pub fn state(&self) -> FetchState<T> {
        self.state.read().clone()
    }

    pub fn set(&self, state: FetchState<T>) {
        *self.state.write() = state;
    }

    /// Supersedes any in-flight request. The current state is left as it is.
    pub fn cancel(&self) {
        self.scope.cancel();
    }

    /// load
    ///
    /// Puts the view into `Loading`, awaits `fut` under a fresh ticket and applies the
    /// outcome only if no later load or cancellation superseded it. Errors are mapped
    /// through `on_error` and never returned.
    pub async fn load<Fut, M>(&self, fut: Fut, on_error: M)
    where
        Fut: Future<Output = Result<T, ApiError>>,
        M: FnOnce(&ApiError) -> String,
    {
        let ticket = self.scope.begin();
        self.set(FetchState::Loading);

        match ticket.run(fut).await {
            None => tracing::debug!("superseded response discarded"),
            Some(Ok(data)) => self.set(FetchState::Loaded(data)),
            Some(Err(e)) => {
                tracing::error!("fetch failed: {}", e);
                self.set(FetchState::Failed(on_error(&e)));
            }
        }
    }

    /// load_record
    ///
    /// Detail-page load. A request that fails shows `fallback`; one that succeeds without
    /// a record shows `not_found`.
    pub async fn load_record<Fut>(&self, fut: Fut, not_found: &str, fallback: &str)
    where
        Fut: Future<Output = Result<Option<T>, ApiError>>,
    {
        let ticket = self.scope.begin();
        self.set(FetchState::Loading);

        match ticket.run(fut).await {
            None => tracing::debug!("superseded response discarded"),
            Some(Ok(Some(data))) => self.set(FetchState::Loaded(data)),
            Some(Ok(None)) => {
                tracing::info!("record not found");
                self.set(FetchState::Failed(not_found.to_string()));
            }
            Some(Err(e)) => {
                tracing::error!("fetch failed: {}", e);
                self.set(FetchState::Failed(fallback.to_string()));
            }
        }
    }
}
