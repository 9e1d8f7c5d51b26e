//! Session lifecycle and access decisions.
//!
//! This module provides:
//! - `SessionStore`: the organizer's identity record across the tab-local
//!   and persistent scopes, with a 24-hour expiry on the durable copy
//! - `AuthGate`: admits or rejects access based on what the store holds
//!
//! Gate outcomes are plain values; navigating on them is the caller's job.

pub mod gate;
pub mod session;

pub use gate::{AuthGate, AuthOutcome, AutoLogin};
pub use session::{PersistedSession, SessionRecord, SessionStore};
