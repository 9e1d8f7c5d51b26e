use anyhow::Result;
use tracing::{debug, info};

use super::session::{SessionRecord, SessionStore};

/// Decision for a protected view: proceed with the session, or send the
/// organizer to the login view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(SessionRecord),
    Unauthenticated,
}

/// Decision for the login view: a valid persisted session lets the
/// organizer skip straight past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoLogin {
    Resume(SessionRecord),
    Stay,
}

/// Access decisions over the session store.
///
/// The gate only decides and tends the store (promotion, expiry cleanup);
/// it never navigates. Callers act on the returned value.
pub struct AuthGate;

impl AuthGate {
    /// Admit or reject entry to a protected view.
    ///
    /// A tab-local session is admitted immediately; that scope carries no
    /// expiry, so none is checked. Otherwise a still-valid persisted
    /// session is promoted into the tab-local scope, which also restamps
    /// the persistent expiry another 24 hours out. An expired session
    /// clears both scopes.
    pub fn guard(store: &SessionStore) -> Result<AuthOutcome> {
        if let Some(record) = store.read_tab_local()? {
            debug!(event = %record.event_name, "Tab-local session present");
            return Ok(AuthOutcome::Authenticated(record));
        }

        match store.read_persistent()? {
            Some(persisted) if !persisted.is_expired() => {
                let record = persisted.record;
                store.save(&record)?;
                debug!(event = %record.event_name, "Promoted persisted session");
                Ok(AuthOutcome::Authenticated(record))
            }
            Some(_) => {
                info!("Persisted session expired, clearing both scopes");
                store.clear()?;
                Ok(AuthOutcome::Unauthenticated)
            }
            None => Ok(AuthOutcome::Unauthenticated),
        }
    }

    /// Offer to skip the login view when a valid persisted session exists.
    ///
    /// An expired session is fully cleared here as well, so both entry
    /// points leave storage in the same state.
    pub fn check_auto_login(store: &SessionStore) -> Result<AutoLogin> {
        match store.read_persistent()? {
            Some(persisted) if !persisted.is_expired() => {
                let record = persisted.record;
                store.save(&record)?;
                info!(event = %record.event_name, "Resuming persisted session");
                Ok(AutoLogin::Resume(record))
            }
            Some(_) => {
                info!("Persisted session expired, clearing both scopes");
                store.clear()?;
                Ok(AutoLogin::Stay)
            }
            None => Ok(AutoLogin::Stay),
        }
    }
}
