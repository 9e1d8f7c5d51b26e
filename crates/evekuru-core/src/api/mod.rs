//! HTTP client module for the remote event-reception endpoint.
//!
//! This module provides the `ApiClient` for talking to the deployed
//! web app backing an event: one URL, POST only, JSON in and JSON out.
//!
//! The endpoint only honors simple requests, so JSON payloads travel
//! with a plain-text content type rather than application/json.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
