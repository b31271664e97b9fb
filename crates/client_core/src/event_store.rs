//! Observable event collection plus the list/create/update/delete actions.
//!
//! `loading` belongs to the most recently started action. Any failure that is
//! not a superseded list sets `error` and notifies. List responses are
//! sequenced: a list that settles after a newer list was started is dropped
//! without touching state. Mutation results target a single item and always
//! apply.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{Event, EventId},
    protocol::{EventPayload, ListEventsParams, PaginationMeta},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{api::EventApi, error::ApiError, notify::Notifier};

pub const MSG_EVENT_CREATED: &str = "Event created successfully!";
pub const MSG_EVENT_UPDATED: &str = "Event updated successfully!";
pub const MSG_EVENT_DELETED: &str = "Event deleted successfully!";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventState {
    pub events: Vec<Event>,
    pub meta: Option<PaginationMeta>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct EventStore {
    api: Arc<dyn EventApi>,
    notifier: Notifier,
    state: watch::Sender<EventState>,
    op_seq: AtomicU64,
    fetch_seq: AtomicU64,
}

/// Clears `loading` on drop, unless a newer action has taken it over.
struct OperationGuard<'a> {
    store: &'a EventStore,
    ticket: u64,
}

impl OperationGuard<'_> {
    fn is_latest(&self) -> bool {
        self.store.op_seq.load(Ordering::SeqCst) == self.ticket
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if self.is_latest() {
            self.store.state.send_modify(|state| state.loading = false);
        }
    }
}

impl EventStore {
    pub fn new(api: Arc<dyn EventApi>, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(EventState::default());
        Self {
            api,
            notifier,
            state,
            op_seq: AtomicU64::new(0),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<EventState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> EventState {
        self.state.borrow().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Replaces the collection and pagination meta with the server's page.
    pub async fn fetch_events(&self, params: &ListEventsParams) {
        let _guard = self.begin_operation();
        let ticket = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.api.list(params).await;
        if self.fetch_seq.load(Ordering::SeqCst) != ticket {
            debug!("events: dropping superseded list response ticket={ticket}");
            return;
        }

        match result {
            Ok(page) => {
                debug!("events: loaded count={}", page.data.len());
                self.state.send_modify(|state| {
                    state.events = page.data;
                    state.meta = page.meta;
                });
            }
            Err(err) => self.fail("list", err),
        }
    }

    pub async fn add_event(&self, payload: &EventPayload) {
        let _guard = self.begin_operation();
        match self.api.create(payload).await {
            Ok(event) => {
                info!("events: created id={}", event.id);
                self.state.send_modify(|state| state.events.insert(0, event));
                self.notifier.success(MSG_EVENT_CREATED);
            }
            Err(err) => self.fail("create", err),
        }
    }

    /// Swaps the matching item for the server's copy, keeping its position.
    pub async fn update_event(&self, id: &EventId, payload: &EventPayload) {
        let _guard = self.begin_operation();
        match self.api.update(id, payload).await {
            Ok(updated) => {
                info!("events: updated id={id}");
                self.state.send_modify(|state| {
                    for event in state.events.iter_mut().filter(|event| &event.id == id) {
                        *event = updated.clone();
                    }
                });
                self.notifier.success(MSG_EVENT_UPDATED);
            }
            Err(err) => self.fail("update", err),
        }
    }

    pub async fn delete_event(&self, id: &EventId) {
        let _guard = self.begin_operation();
        match self.api.delete(id).await {
            Ok(()) => {
                info!("events: deleted id={id}");
                self.state
                    .send_modify(|state| state.events.retain(|event| &event.id != id));
                self.notifier.success(MSG_EVENT_DELETED);
            }
            Err(err) => self.fail("delete", err),
        }
    }

    fn begin_operation(&self) -> OperationGuard<'_> {
        let ticket = self.op_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        OperationGuard {
            store: self,
            ticket,
        }
    }

    fn fail(&self, action: &str, err: ApiError) {
        warn!("events: {action} failed: {err}");
        let message = err.message.clone();
        self.state.send_modify(|state| state.error = Some(message));
        self.notifier.error(err.message);
    }
}

#[cfg(test)]
#[path = "tests/event_store_tests.rs"]
mod tests;
