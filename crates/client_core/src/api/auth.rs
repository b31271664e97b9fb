use async_trait::async_trait;
use shared::{
    domain::User,
    protocol::{AuthResponse, LoginRequest, RegisterRequest},
};
use tracing::warn;

use crate::{error::ApiError, http::HttpClient};

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const ME_PATH: &str = "/auth/me";

pub const REGISTER_FALLBACK: &str = "Registration failed";
pub const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
pub const FETCH_USER_FALLBACK: &str = "Failed to fetch user data";

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError>;
    /// Uses whatever token the HTTP client currently attaches.
    async fn fetch_current_user(&self) -> Result<User, ApiError>;
}

pub struct HttpAuthApi {
    http: HttpClient,
}

impl HttpAuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .post_json(REGISTER_PATH, payload)
            .await
            .map_err(|err| {
                warn!("auth: register error: {err}");
                ApiError::resolve(&err, REGISTER_FALLBACK)
            })
    }

    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .post_json(LOGIN_PATH, credentials)
            .await
            .map_err(|err| {
                warn!("auth: login error: {err}");
                ApiError::resolve(&err, LOGIN_FALLBACK)
            })
    }

    async fn fetch_current_user(&self) -> Result<User, ApiError> {
        self.http.get_json(ME_PATH).await.map_err(|err| {
            warn!("auth: fetch user error: {err}");
            ApiError::resolve(&err, FETCH_USER_FALLBACK)
        })
    }
}
