//! Types shared between the Eventdesk client crates: domain records, the
//! JSON wire protocol, the server error body, and form validation.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod validation;
