use chrono::{Datelike, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use super::{FetchState, Resource};
use crate::{api::ApiState, models::OwnerProfile};

pub const PROFILE_FAILED: &str = "Failed to load profile";
pub const PROFILE_NOT_FOUND: &str = "Profile not found";
pub const MISSING_OWNER_ID: &str = "User ID not provided";

/// OwnerProfileView
///
/// `/owner/:id`. The request goes out with the session's bearer token.
#[derive(Clone)]
pub struct OwnerProfileView {
    api: ApiState,
    resource: Resource<OwnerProfile>,
    param: Arc<RwLock<Option<String>>>,
}

impl OwnerProfileView {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: Resource::default(),
            param: Arc::default(),
        }
    }

    /// open
    ///
    /// A missing or blank id fails immediately without a request.
    pub async fn open(&self, id: Option<&str>) {
        let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
            self.resource.cancel();
            self.resource
                .set(FetchState::Failed(MISSING_OWNER_ID.to_string()));
            return;
        };

        let unchanged = self.param.read().as_deref() == Some(id);
        if unchanged && self.resource.state().data().is_some() {
            return;
        }
        *self.param.write() = Some(id.to_string());
        self.resource
            .load_record(self.api.get_owner(id), PROFILE_NOT_FOUND, PROFILE_FAILED)
            .await;
    }

    pub fn state(&self) -> FetchState<OwnerProfile> {
        self.resource.state()
    }

    /// The owner's age this calendar year, once loaded.
    pub fn age(&self) -> Option<i32> {
        self.resource
            .state()
            .data()
            .and_then(|profile| profile.age_in(Utc::now().year()))
    }

    pub fn unmount(&self) {
        self.resource.cancel();
    }
}
