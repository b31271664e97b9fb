//! Typed wrappers over the remote API. Each module exposes an injectable
//! trait plus its HTTP implementation; every failure comes back as
//! [`ApiError`](crate::error::ApiError) with the message already resolved.

pub mod auth;
pub mod events;

pub use auth::{AuthApi, HttpAuthApi};
pub use events::{EventApi, HttpEventApi};
