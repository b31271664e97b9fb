//! Session state: current user, token, and the actions that change them.
//!
//! Session-changing actions (login, register, logout) each start a new
//! generation. A network call only gets to write state if its generation is
//! still current when it settles, so a slow login can never resurrect a
//! session the user already replaced or logged out of.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};
use shared::{
    domain::User,
    protocol::{LoginRequest, RegisterRequest},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::{api::AuthApi, http::SessionCredential, notify::Notifier, persist::StateStore};

pub const AUTH_STORAGE_KEY: &str = "auth-storage";

pub const MSG_LOGGED_IN: &str = "Logged in successfully";
pub const MSG_REGISTERED: &str = "Registered and logged in successfully";
pub const MSG_LOGGED_OUT: &str = "Logged out";
pub const MSG_SESSION_EXPIRED: &str = "Session expired";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
}

/// The slice of [`AuthState`] that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl PersistedAuth {
    fn from_state(state: &AuthState) -> Self {
        Self {
            token: state.token.clone(),
            is_authenticated: state.is_authenticated,
        }
    }

    /// A session counts only when both the flag and the token are present.
    fn normalized(self) -> Self {
        match self.token {
            Some(token) if self.is_authenticated && !token.is_empty() => Self {
                token: Some(token),
                is_authenticated: true,
            },
            _ => Self::default(),
        }
    }
}

pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    persistence: Arc<dyn StateStore>,
    credential: SessionCredential,
    notifier: Notifier,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    loading_tickets: AtomicU64,
    loading_owner: AtomicU64,
    fetch_tickets: AtomicU64,
    last_persisted: Mutex<Option<PersistedAuth>>,
}

struct LoadingGuard<'a> {
    store: &'a AuthStore,
    ticket: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.loading_owner.load(Ordering::SeqCst) == self.ticket {
            self.store.state.send_modify(|state| state.loading = false);
        }
    }
}

impl AuthStore {
    /// Builds a store with empty state and nothing restored.
    pub fn new(
        api: Arc<dyn AuthApi>,
        persistence: Arc<dyn StateStore>,
        credential: SessionCredential,
        notifier: Notifier,
    ) -> Self {
        Self::with_state(api, persistence, credential, notifier, AuthState::default())
    }

    /// Builds a store from the persisted projection. `user` always starts
    /// empty and `loading` false; call [`AuthStore::fetch_current_user`] to
    /// repopulate the user.
    pub async fn restore(
        api: Arc<dyn AuthApi>,
        persistence: Arc<dyn StateStore>,
        credential: SessionCredential,
        notifier: Notifier,
    ) -> Self {
        let restored = load_persisted(persistence.as_ref()).await;
        debug!(
            "auth: restored session authenticated={}",
            restored.is_authenticated
        );
        let state = AuthState {
            user: None,
            token: restored.token,
            is_authenticated: restored.is_authenticated,
            loading: false,
        };
        Self::with_state(api, persistence, credential, notifier, state)
    }

    fn with_state(
        api: Arc<dyn AuthApi>,
        persistence: Arc<dyn StateStore>,
        credential: SessionCredential,
        notifier: Notifier,
        state: AuthState,
    ) -> Self {
        credential.set(state.token.clone());
        let (state, _) = watch::channel(state);
        Self {
            api,
            persistence,
            credential,
            notifier,
            state,
            generation: AtomicU64::new(0),
            loading_tickets: AtomicU64::new(0),
            loading_owner: AtomicU64::new(0),
            fetch_tickets: AtomicU64::new(0),
            last_persisted: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    pub async fn login_user(&self, credentials: &LoginRequest) {
        let generation = self.begin_session_change();
        let _loading = self.begin_loading();

        match self.api.login(credentials).await {
            Ok(response) => {
                if !self.is_current(generation) {
                    debug!("auth: dropping superseded login response");
                    return;
                }
                self.apply(|state| {
                    state.token = Some(response.token);
                    state.is_authenticated = true;
                });
                self.persist().await;

                // A newer user fetch can supersede this one. The toast follows
                // the resulting session, not which fetch applied.
                self.refresh_user(generation).await;
                if self.is_current(generation) && self.is_authenticated() {
                    info!("auth: login succeeded");
                    self.notifier.success(MSG_LOGGED_IN);
                }
            }
            Err(err) => {
                if !self.is_current(generation) {
                    debug!("auth: dropping superseded login failure");
                    return;
                }
                warn!("auth: login failed: {err}");
                self.notifier.error(err.message);
                self.apply(|state| {
                    state.token = None;
                    state.is_authenticated = false;
                });
                self.persist().await;
            }
        }
    }

    pub async fn register_user(&self, payload: &RegisterRequest) {
        let generation = self.begin_session_change();
        let _loading = self.begin_loading();

        match self.api.register(payload).await {
            Ok(response) => {
                if !self.is_current(generation) {
                    debug!("auth: dropping superseded register response");
                    return;
                }
                self.apply(|state| {
                    state.user = response.user;
                    state.token = Some(response.token);
                    state.is_authenticated = true;
                });
                self.persist().await;
                info!("auth: registration succeeded");
                self.notifier.success(MSG_REGISTERED);
            }
            Err(err) => {
                if !self.is_current(generation) {
                    debug!("auth: dropping superseded register failure");
                    return;
                }
                warn!("auth: registration failed: {err}");
                self.notifier.error(err.message);
                self.apply(|state| {
                    state.token = None;
                    state.is_authenticated = false;
                });
                self.persist().await;
            }
        }
    }

    /// Clears the local session. Nothing is sent to the server; the await
    /// only covers writing the cleared projection.
    pub async fn logout(&self) {
        self.begin_session_change();
        self.apply(|state| {
            state.user = None;
            state.token = None;
            state.is_authenticated = false;
        });
        info!("auth: logged out");
        self.notifier.info(MSG_LOGGED_OUT);
        self.persist().await;
    }

    /// Refreshes the user from the server. Leaves `loading` alone.
    pub async fn fetch_current_user(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.refresh_user(generation).await;
    }

    async fn refresh_user(&self, generation: u64) {
        let ticket = self.fetch_tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.fetch_current_user().await;

        if !self.is_current(generation) || self.fetch_tickets.load(Ordering::SeqCst) != ticket {
            debug!("auth: dropping superseded user fetch");
            return;
        }

        match result {
            Ok(user) => {
                self.apply(|state| {
                    state.user = Some(user);
                    state.is_authenticated = true;
                });
                self.persist().await;
            }
            Err(err) => {
                warn!("auth: session check failed: {err}");
                self.notifier.error(MSG_SESSION_EXPIRED);
                self.apply(|state| {
                    state.user = None;
                    state.token = None;
                    state.is_authenticated = false;
                });
                self.persist().await;
            }
        }
    }

    fn begin_session_change(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        let ticket = self.loading_tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading_owner.store(ticket, Ordering::SeqCst);
        self.state.send_modify(|state| state.loading = true);
        LoadingGuard {
            store: self,
            ticket,
        }
    }

    /// Mutates state and mirrors the token into the shared credential.
    fn apply(&self, change: impl FnOnce(&mut AuthState)) {
        self.state.send_modify(change);
        let token = self.state.borrow().token.clone();
        self.credential.set(token);
    }

    async fn persist(&self) {
        let mut last = self.last_persisted.lock().await;
        let projection = PersistedAuth::from_state(&self.state.borrow());
        if last.as_ref() == Some(&projection) {
            return;
        }

        let value = match serde_json::to_value(&projection) {
            Ok(value) => value,
            Err(err) => {
                warn!("auth: failed to encode session projection: {err}");
                return;
            }
        };
        match self.persistence.save(AUTH_STORAGE_KEY, &value).await {
            Ok(()) => *last = Some(projection),
            Err(err) => warn!("auth: failed to persist session: {err:#}"),
        }
    }
}

async fn load_persisted(persistence: &dyn StateStore) -> PersistedAuth {
    match persistence.load(AUTH_STORAGE_KEY).await {
        Ok(Some(value)) => match serde_json::from_value::<PersistedAuth>(value) {
            Ok(persisted) => persisted.normalized(),
            Err(err) => {
                warn!("auth: discarding unreadable persisted session: {err}");
                PersistedAuth::default()
            }
        },
        Ok(None) => PersistedAuth::default(),
        Err(err) => {
            warn!("auth: failed to load persisted session: {err:#}");
            PersistedAuth::default()
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_store_tests.rs"]
mod tests;
