use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use super::{FetchState, Resource};
use crate::{
    api::ApiState,
    models::{Event, Participation},
};

pub const EVENTS_FAILED: &str = "Failed to fetch events. Please try again later.";
pub const EVENT_FAILED: &str = "Failed to fetch event details. Please try again later.";
pub const EVENT_NOT_FOUND: &str = "Event not found";
pub const REGISTER_OK: &str = "Successfully registered for the event!";
pub const REGISTER_FAILED: &str = "Failed to register for the event. Please try again.";

/// One-off feedback shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

/// `Mar 05, 2025`
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

/// `18:30`, 24-hour clock.
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

/// EventListView
///
/// `/allevents`: one `GET /events` on mount, client-side search by name.
#[derive(Clone)]
pub struct EventListView {
    api: ApiState,
    resource: Resource<Vec<Event>>,
    search: Arc<RwLock<String>>,
}

impl EventListView {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: Resource::default(),
            search: Arc::default(),
        }
    }

    pub async fn load(&self) {
        self.resource
            .load(self.api.list_events(), |_| EVENTS_FAILED.to_string())
            .await;
    }

    pub fn state(&self) -> FetchState<Vec<Event>> {
        self.resource.state()
    }

    /// Loaded events; empty while loading or after a failure.
    pub fn events(&self) -> Vec<Event> {
        self.resource.state().data().cloned().unwrap_or_default()
    }

    pub fn set_search(&self, term: &str) {
        *self.search.write() = term.to_string();
    }

    pub fn visible(&self) -> Vec<Event> {
        let term = self.search.read().clone();
        self.events()
            .into_iter()
            .filter(|e| e.matches(&term))
            .collect()
    }

    pub fn unmount(&self) {
        self.resource.cancel();
    }
}

/// EventDetailView
///
/// `/event/:id`: event details with an image gallery, the caller's participation and
/// the register-attendance action.
#[derive(Clone)]
pub struct EventDetailView {
    api: ApiState,
    resource: Resource<Event>,
    param: Arc<RwLock<Option<String>>>,
    selected_image: Arc<AtomicUsize>,
    registering: Arc<AtomicBool>,
    participation: Arc<RwLock<Option<Participation>>>,
}

impl EventDetailView {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: Resource::default(),
            param: Arc::default(),
            selected_image: Arc::default(),
            registering: Arc::default(),
            participation: Arc::default(),
        }
    }

    /// open
    ///
    /// Loads the event unless this id is already loaded, then selects its cover image.
    pub async fn open(&self, id: &str) {
        let unchanged = self.param.read().as_deref() == Some(id);
        if unchanged && self.resource.state().data().is_some() {
            return;
        }
        *self.param.write() = Some(id.to_string());
        *self.participation.write() = None;

        self.resource
            .load_record(self.api.get_event(id), EVENT_NOT_FOUND, EVENT_FAILED)
            .await;

        if let FetchState::Loaded(event) = self.resource.state() {
            self.selected_image
                .store(event.cover_index(), Ordering::Relaxed);
        }
    }

    pub fn state(&self) -> FetchState<Event> {
        self.resource.state()
    }

    pub fn selected_image(&self) -> usize {
        self.selected_image.load(Ordering::Relaxed)
    }

    /// Selects a gallery image. Out-of-range indexes are ignored.
    pub fn select_image(&self, index: usize) -> bool {
        let in_range = self
            .resource
            .state()
            .data()
            .is_some_and(|event| index < event.images.len());
        if in_range {
            self.selected_image.store(index, Ordering::Relaxed);
        }
        in_range
    }

    pub fn is_registering(&self) -> bool {
        self.registering.load(Ordering::Acquire)
    }

    /// register
    ///
    /// Registers attendance for the open event. Returns `None` without a request while
    /// a previous registration is still in flight.
    pub async fn register(&self) -> Option<Notice> {
        let Some(id) = self.param.read().clone() else {
            return Some(Notice::Failure(REGISTER_FAILED.to_string()));
        };
        if self
            .registering
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(event_id = %id, "registration already in flight");
            return None;
        }

        let outcome = self.api.participate(&id).await;
        self.registering.store(false, Ordering::Release);

        Some(match outcome {
            Ok(()) => {
                tracing::info!(event_id = %id, "registered for event");
                self.apply_participation(
                    &id,
                    Participation {
                        participating: true,
                        status: None,
                    },
                );
                Notice::Success(REGISTER_OK.to_string())
            }
            Err(e) => {
                tracing::error!(event_id = %id, "event registration failed: {}", e);
                Notice::Failure(REGISTER_FAILED.to_string())
            }
        })
    }

    /// Fetches the caller's participation in the open event. Failures leave it unknown,
    /// and an answer that arrives after the view moved to another event is dropped.
    pub async fn load_participation(&self) -> Option<Participation> {
        let id = self.param.read().clone()?;
        match self.api.my_participation(&id).await {
            Ok(participation) => self
                .apply_participation(&id, participation.clone())
                .then_some(participation),
            Err(e) => {
                tracing::warn!(event_id = %id, "participation lookup failed: {}", e);
                None
            }
        }
    }

    /// Stores `participation` if `event_id` is still the open event.
    fn apply_participation(&self, event_id: &str, participation: Participation) -> bool {
        let param = self.param.read();
        if param.as_deref() != Some(event_id) {
            tracing::debug!(event_id, "participation for a previous event discarded");
            return false;
        }
        *self.participation.write() = Some(participation);
        true
    }

    pub fn participation(&self) -> Option<Participation> {
        self.participation.read().clone()
    }

    pub fn unmount(&self) {
        self.resource.cancel();
    }
}
