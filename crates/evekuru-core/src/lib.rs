//! Core library for the evekuru organizer console.
//!
//! The evekuru backend is a spreadsheet-backed web app; organizers sign
//! in once per event and keep a 24-hour session on disk. This crate
//! carries everything below the console surface:
//!
//! - `storage`: key-value ports (process-local and file-backed)
//! - `auth`: the session store over those ports and the access gate
//! - `api`: the endpoint client (login and raw action calls)
//! - `config`: on-disk configuration and data paths

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthGate, AuthOutcome, AutoLogin, PersistedSession, SessionRecord, SessionStore};
pub use config::Config;
pub use storage::{FileStore, MemoryStore, StoragePort};
