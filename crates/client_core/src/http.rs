//! Preconfigured JSON client for the Eventdesk API.
//!
//! Every request is built against the configured base URL and carries the
//! session token currently held in [`SessionCredential`], if any. The auth
//! store is the only writer of that slot; everything else just reads it.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::ErrorBody;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientSettings;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Setup(String),
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Message the server put in its error body, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Status {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Network(err) if err.is_timeout())
    }
}

/// Shared slot for the bearer token attached to outgoing requests.
#[derive(Clone)]
pub struct SessionCredential {
    slot: Arc<watch::Sender<Option<String>>>,
}

impl Default for SessionCredential {
    fn default() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }
}

impl SessionCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn set(&self, token: Option<String>) {
        self.slot.send_if_modified(|current| {
            if *current == token {
                return false;
            }
            *current = token;
            true
        });
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.slot.subscribe()
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("present", &self.slot.borrow().is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    base_url: Url,
    credential: SessionCredential,
}

impl HttpClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credential: SessionCredential,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| TransportError::InvalidUrl(format!("{base_url}: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(format!(
                "{base_url}: api base url must start with http:// or https://"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Setup(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            credential,
        })
    }

    pub fn from_settings(
        settings: &ClientSettings,
        credential: SessionCredential,
    ) -> Result<Self, TransportError> {
        Self::new(
            &settings.api_base_url,
            settings.request_timeout(),
            credential,
        )
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL, keeping any path prefix the base has.
    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim().trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined).map_err(|err| TransportError::InvalidUrl(format!("{joined}: {err}")))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let request = self.request(Method::GET, path)?;
        let response = self.send(request, Method::GET, path).await?;
        decode_json(response).await
    }

    pub async fn get_json_with_query<Q: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, TransportError> {
        let request = self.request(Method::GET, path)?.query(query);
        let response = self.send(request, Method::GET, path).await?;
        decode_json(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let request = self.request(Method::POST, path)?.json(body);
        let response = self.send(request, Method::POST, path).await?;
        decode_json(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let request = self.request(Method::PUT, path)?.json(body);
        let response = self.send(request, Method::PUT, path).await?;
        decode_json(response).await
    }

    /// Sends a DELETE and ignores whatever body comes back.
    pub async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let request = self.request(Method::DELETE, path)?;
        self.send(request, Method::DELETE, path).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint(path)?;
        let builder = self.http.request(method, url);
        Ok(match self.credential.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<Response, TransportError> {
        debug!("http: {method} {path}");
        let response = request.send().await.map_err(|err| {
            warn!("http: {method} {path} transport failure: {err}");
            TransportError::Network(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body);
        warn!(
            "http: {method} {path} failed status={} server_message={}",
            status.as_u16(),
            message.is_some()
        );
        Err(TransportError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|err| TransportError::Decode(err.to_string()))
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.user_message().map(str::to_string))
}
