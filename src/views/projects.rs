use parking_lot::RwLock;
use std::sync::Arc;

use super::{FetchState, Resource};
use crate::{
    api::ApiState,
    models::{ProjectDetails, ProjectSummary},
};

pub const PROJECTS_FAILED: &str = "Failed to fetch projects. Please try again later.";
pub const PROJECT_FAILED: &str = "Failed to fetch project details. Please try again later.";
pub const PROJECT_NOT_FOUND: &str = "Project not found";

/// ProjectListView
///
/// `/allprojects`: one `GET /projects` on mount, then client-side search over the
/// loaded cards.
#[derive(Clone)]
pub struct ProjectListView {
    api: ApiState,
    resource: Resource<Vec<ProjectSummary>>,
    search: Arc<RwLock<String>>,
}

impl ProjectListView {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: Resource::default(),
            search: Arc::default(),
        }
    }

    pub async fn load(&self) {
        self.resource
            .load(self.api.list_projects(), |_| PROJECTS_FAILED.to_string())
            .await;
    }

    pub fn state(&self) -> FetchState<Vec<ProjectSummary>> {
        self.resource.state()
    }

    /// Loaded projects; empty while loading or after a failure.
    pub fn projects(&self) -> Vec<ProjectSummary> {
        self.resource.state().data().cloned().unwrap_or_default()
    }

    pub fn set_search(&self, term: &str) {
        *self.search.write() = term.to_string();
    }

    /// Projects matching the current search term.
    pub fn visible(&self) -> Vec<ProjectSummary> {
        let term = self.search.read().clone();
        self.projects()
            .into_iter()
            .filter(|p| p.matches(&term))
            .collect()
    }

    pub fn unmount(&self) {
        self.resource.cancel();
    }
}

/// ProjectDetailView
///
/// `/project/:id`. Re-fetches whenever it is opened with a different id.
#[derive(Clone)]
pub struct ProjectDetailView {
    api: ApiState,
    resource: Resource<ProjectDetails>,
    param: Arc<RwLock<Option<String>>>,
}

impl ProjectDetailView {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: Resource::default(),
            param: Arc::default(),
        }
    }

    /// open
    ///
    /// Loads the project unless this exact id is already loaded.
    pub async fn open(&self, id: &str) {
        let unchanged = self.param.read().as_deref() == Some(id);
        if unchanged && self.resource.state().data().is_some() {
            return;
        }
        *self.param.write() = Some(id.to_string());
        self.resource
            .load_record(self.api.get_project(id), PROJECT_NOT_FOUND, PROJECT_FAILED)
            .await;
    }

    pub fn current_id(&self) -> Option<String> {
        self.param.read().clone()
    }

    pub fn state(&self) -> FetchState<ProjectDetails> {
        self.resource.state()
    }

    pub fn unmount(&self) {
        self.resource.cancel();
    }
}
