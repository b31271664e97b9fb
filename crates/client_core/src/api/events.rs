use async_trait::async_trait;
use shared::{
    domain::{Event, EventId},
    protocol::{EventEnvelope, EventPayload, ListEventsParams, ListEventsResponse},
};
use tracing::warn;

use crate::{error::ApiError, http::HttpClient};

pub const EVENTS_PATH: &str = "/events";

pub const LIST_FALLBACK: &str = "Failed to fetch events";
pub const CREATE_FALLBACK: &str = "Failed to create event";
pub const UPDATE_FALLBACK: &str = "Failed to update event";
pub const DELETE_FALLBACK: &str = "Failed to delete event";

#[async_trait]
pub trait EventApi: Send + Sync {
    async fn list(&self, params: &ListEventsParams) -> Result<ListEventsResponse, ApiError>;
    async fn create(&self, payload: &EventPayload) -> Result<Event, ApiError>;
    async fn update(&self, id: &EventId, payload: &EventPayload) -> Result<Event, ApiError>;
    async fn delete(&self, id: &EventId) -> Result<(), ApiError>;
}

pub struct HttpEventApi {
    http: HttpClient,
}

impl HttpEventApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn event_path(id: &EventId) -> String {
    format!("{EVENTS_PATH}/{}", urlencoding::encode(id.as_str()))
}

#[async_trait]
impl EventApi for HttpEventApi {
    async fn list(&self, params: &ListEventsParams) -> Result<ListEventsResponse, ApiError> {
        self.http
            .get_json_with_query(EVENTS_PATH, params)
            .await
            .map_err(|err| {
                warn!("events: list error: {err}");
                ApiError::resolve(&err, LIST_FALLBACK)
            })
    }

    async fn create(&self, payload: &EventPayload) -> Result<Event, ApiError> {
        self.http
            .post_json::<_, EventEnvelope>(EVENTS_PATH, payload)
            .await
            .map(|envelope| envelope.data)
            .map_err(|err| {
                warn!("events: create error: {err}");
                ApiError::resolve(&err, CREATE_FALLBACK)
            })
    }

    async fn update(&self, id: &EventId, payload: &EventPayload) -> Result<Event, ApiError> {
        self.http
            .put_json::<_, EventEnvelope>(&event_path(id), payload)
            .await
            .map(|envelope| envelope.data)
            .map_err(|err| {
                warn!("events: update error id={id}: {err}");
                ApiError::resolve(&err, UPDATE_FALLBACK)
            })
    }

    async fn delete(&self, id: &EventId) -> Result<(), ApiError> {
        self.http.delete(&event_path(id)).await.map_err(|err| {
            warn!("events: delete error id={id}: {err}");
            ApiError::resolve(&err, DELETE_FALLBACK)
        })
    }
}
