//! Data Models Module
//!
//! This module contains all data structures used throughout the aid service.
//! It includes accounts, aid requests, token claims and request/response types.

pub mod account;
pub mod aid_request;
pub mod auth;
pub mod requests;

// Re-export commonly used types
pub use account::*;
pub use aid_request::*;
pub use auth::*;
pub use requests::*;
