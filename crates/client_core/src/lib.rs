//! Client data layer for the events app: HTTP wrappers for the auth and event
//! resources, the two observable stores built on them, and the small runtime
//! helpers (notifications, persistence, debounce) they share.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::info;

pub mod api;
pub mod auth_store;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event_store;
pub mod http;
pub mod notify;
pub mod persist;

pub use api::{AuthApi, EventApi, HttpAuthApi, HttpEventApi};
pub use auth_store::{AuthState, AuthStore};
pub use config::ClientSettings;
pub use debounce::Debouncer;
pub use error::ApiError;
pub use event_store::{EventState, EventStore};
pub use http::{HttpClient, SessionCredential, TransportError};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use persist::{MemoryStateStore, StateStore};

/// Both stores wired to one HTTP client, one credential slot and one
/// notification channel.
pub struct EventdeskClient {
    http: HttpClient,
    notifier: Notifier,
    auth: Arc<AuthStore>,
    events: Arc<EventStore>,
}

impl EventdeskClient {
    /// Builds the production stack and restores the persisted session.
    pub async fn connect(
        settings: &ClientSettings,
        persistence: Arc<dyn StateStore>,
    ) -> Result<Self> {
        let credential = SessionCredential::new();
        let http = HttpClient::from_settings(settings, credential.clone())
            .context("failed to build api client")?;
        let notifier = Notifier::new();
        let client = Self::with_apis(
            http.clone(),
            Arc::new(HttpAuthApi::new(http.clone())),
            Arc::new(HttpEventApi::new(http)),
            persistence,
            notifier,
        )
        .await;
        info!(
            "client: ready api_base_url={} authenticated={}",
            client.http.base_url(),
            client.auth.is_authenticated()
        );
        Ok(client)
    }

    /// Like [`EventdeskClient::connect`] but with caller-supplied APIs.
    pub async fn with_apis(
        http: HttpClient,
        auth_api: Arc<dyn AuthApi>,
        event_api: Arc<dyn EventApi>,
        persistence: Arc<dyn StateStore>,
        notifier: Notifier,
    ) -> Self {
        let auth = AuthStore::restore(
            auth_api,
            persistence,
            http.credential().clone(),
            notifier.clone(),
        )
        .await;
        let events = EventStore::new(event_api, notifier.clone());
        Self {
            http,
            notifier,
            auth: Arc::new(auth),
            events: Arc::new(events),
        }
    }

    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    pub fn events(&self) -> &Arc<EventStore> {
        &self.events
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
