use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Event, User, UserRole};

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Body returned by `/auth/login` and `/auth/register`.
///
/// Registration puts the user under `data`, login under `user`; both land in
/// [`AuthResponse::user`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub token: String,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListEventsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Server pagination descriptor. Unknown fields are kept so the store can
/// hand the whole thing back to views untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListEventsResponse {
    pub data: Vec<Event>,
    #[serde(default)]
    pub meta: Option<PaginationMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub data: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_accepts_data_alias_from_register() {
        let raw = r#"{
            "data": {"_id": "u1", "name": "Ada", "email": "ada@example.com", "role": "ADMIN"},
            "token": "tok"
        }"#;
        let parsed: AuthResponse = serde_json::from_str(raw).expect("parse");
        let user = parsed.user.expect("user");
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(parsed.token, "tok");
    }

    #[test]
    fn login_response_without_user_parses() {
        let parsed: AuthResponse = serde_json::from_str(r#"{"token":"abc"}"#).expect("parse");
        assert!(parsed.user.is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let request = LoginRequest {
            email: "ada@example.com".into(),
            password: "Sup3r$ecret".into(),
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("Sup3r$ecret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn pagination_meta_keeps_unknown_fields() {
        let raw = r#"{"page":2,"limit":10,"total":35,"totalPages":4,"hasNext":true}"#;
        let meta: PaginationMeta = serde_json::from_str(raw).expect("parse");
        assert_eq!(meta.total_pages, Some(4));
        assert_eq!(meta.extra.get("hasNext"), Some(&Value::Bool(true)));

        let echoed = serde_json::to_value(&meta).expect("encode");
        assert_eq!(echoed["hasNext"], Value::Bool(true));
        assert_eq!(echoed["totalPages"], 4);
    }

    #[test]
    fn list_params_skip_absent_fields() {
        let params = ListEventsParams {
            page: Some(1),
            search: Some("sync".into()),
            ..ListEventsParams::default()
        };
        let encoded = serde_json::to_value(&params).expect("encode");
        assert_eq!(encoded, serde_json::json!({"page": 1, "search": "sync"}));
    }

    #[test]
    fn event_accepts_plain_id_field() {
        let raw = r#"{"id":"e9","title":"t","description":"d","date":"2030-01-01","location":"l"}"#;
        let event: Event = serde_json::from_str(raw).expect("parse");
        assert_eq!(event.id.as_str(), "e9");
    }
}
