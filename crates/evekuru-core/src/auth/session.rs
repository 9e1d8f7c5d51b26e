use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::StoragePort;

/// Persistent-store key holding the serialized session entry.
pub const SESSION_KEY: &str = "evekuru.session";

/// Tab-local store keys, one per identity field.
pub const KEY_SHEET_ID: &str = "sheetId";
pub const KEY_EVENT_NAME: &str = "eventName";
pub const KEY_EXPORT_ID: &str = "exportId";

/// Session lifetime in hours.
/// Every save restamps the expiry, so an organizer who keeps working
/// never has to log back in during an event day.
const SESSION_TTL_HOURS: i64 = 24;

/// The organizer's working context for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Spreadsheet backing the event. Never empty in a stored session.
    #[serde(rename = "sheetId")]
    pub sheet_id: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    /// Identifier of the published export for this event.
    #[serde(rename = "exportId")]
    pub export_id: String,
}

/// A `SessionRecord` as it sits in the persistent store, carrying the
/// absolute expiry in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(flatten)]
    pub record: SessionRecord,
    #[serde(rename = "expiry")]
    pub expiry_ms: i64,
}

impl PersistedSession {
    /// Expired means `now >= expiry`; a session is valid only while the
    /// expiry is strictly in the future.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() >= self.expiry_ms
    }

    pub fn time_until_expiry(&self) -> Duration {
        let remaining_ms = self.expiry_ms.saturating_sub(Utc::now().timestamp_millis());
        Duration::milliseconds(remaining_ms.max(0))
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes()
    }
}

/// Dual-scope store for the session record.
///
/// The tab-local port holds the three identity fields as individual keys
/// and carries no expiry of its own; the persistent port holds one
/// serialized `PersistedSession` and is the source of truth across
/// restarts.
pub struct SessionStore {
    tab_local: Box<dyn StoragePort>,
    persistent: Box<dyn StoragePort>,
}

impl SessionStore {
    pub fn new(tab_local: Box<dyn StoragePort>, persistent: Box<dyn StoragePort>) -> Self {
        Self {
            tab_local,
            persistent,
        }
    }

    /// Write the record into both scopes. The persistent copy is stamped
    /// with a fresh expiry of now + 24h, so saving an existing session
    /// extends it.
    ///
    /// Callers guarantee `sheet_id` is non-empty.
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        self.tab_local.set(KEY_SHEET_ID, &record.sheet_id)?;
        self.tab_local.set(KEY_EVENT_NAME, &record.event_name)?;
        self.tab_local.set(KEY_EXPORT_ID, &record.export_id)?;

        let persisted = PersistedSession {
            record: record.clone(),
            expiry_ms: Utc::now().timestamp_millis()
                + Duration::hours(SESSION_TTL_HOURS).num_milliseconds(),
        };
        let contents = serde_json::to_string(&persisted).context("Failed to serialize session")?;
        self.persistent.set(SESSION_KEY, &contents)?;

        debug!(event = %record.event_name, "Session saved");
        Ok(())
    }

    /// Erase both scopes. Safe to call with no session present.
    pub fn clear(&self) -> Result<()> {
        self.tab_local.remove(KEY_SHEET_ID)?;
        self.tab_local.remove(KEY_EVENT_NAME)?;
        self.tab_local.remove(KEY_EXPORT_ID)?;
        self.persistent.remove(SESSION_KEY)?;
        Ok(())
    }

    /// Read the tab-local scope. Present only when `sheetId` holds a
    /// non-empty value; expiry is never consulted here.
    pub fn read_tab_local(&self) -> Result<Option<SessionRecord>> {
        let sheet_id = match self.tab_local.get(KEY_SHEET_ID)? {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };
        Ok(Some(SessionRecord {
            sheet_id,
            event_name: self.tab_local.get(KEY_EVENT_NAME)?.unwrap_or_default(),
            export_id: self.tab_local.get(KEY_EXPORT_ID)?.unwrap_or_default(),
        }))
    }

    /// Read the persistent scope without checking expiry. A malformed
    /// entry is reported as absent so corrupted storage never takes down
    /// startup.
    pub fn read_persistent(&self) -> Result<Option<PersistedSession>> {
        let contents = match self.persistent.get(SESSION_KEY)? {
            Some(contents) => contents,
            None => return Ok(None),
        };
        match serde_json::from_str(&contents) {
            Ok(persisted) => Ok(Some(persisted)),
            Err(e) => {
                warn!(error = %e, "Discarding malformed session entry");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> SessionStore {
        SessionStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }

    fn record() -> SessionRecord {
        SessionRecord {
            sheet_id: "1aBcDeFgHiJkLmNoP".to_string(),
            event_name: "Autumn Craft Market".to_string(),
            export_id: "exp-0042".to_string(),
        }
    }

    #[test]
    fn test_save_then_read_tab_local() {
        let store = store();
        store.save(&record()).unwrap();
        let read = store.read_tab_local().unwrap().unwrap();
        assert_eq!(read, record());
    }

    #[test]
    fn test_save_stamps_expiry_a_day_out() {
        let store = store();
        let before = Utc::now().timestamp_millis();
        store.save(&record()).unwrap();
        let after = Utc::now().timestamp_millis();

        let persisted = store.read_persistent().unwrap().unwrap();
        let ttl_ms = Duration::hours(24).num_milliseconds();
        assert!(persisted.expiry_ms >= before + ttl_ms);
        assert!(persisted.expiry_ms <= after + ttl_ms);
        assert!(!persisted.is_expired());
    }

    #[test]
    fn test_saving_again_extends_expiry() {
        let store = store();
        store.save(&record()).unwrap();
        let first = store.read_persistent().unwrap().unwrap();
        store.save(&record()).unwrap();
        let second = store.read_persistent().unwrap().unwrap();
        assert!(second.expiry_ms >= first.expiry_ms);
        assert_eq!(second.record, first.record);
    }

    #[test]
    fn test_empty_sheet_id_reads_as_absent() {
        let tab_local = MemoryStore::new();
        tab_local.set(KEY_SHEET_ID, "").unwrap();
        tab_local.set(KEY_EVENT_NAME, "Orphaned").unwrap();
        let store = SessionStore::new(Box::new(tab_local), Box::new(MemoryStore::new()));
        assert!(store.read_tab_local().unwrap().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = store();
        store.save(&record()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.read_tab_local().unwrap().is_none());
        assert!(store.read_persistent().unwrap().is_none());
    }

    #[test]
    fn test_malformed_persistent_entry_reads_as_absent() {
        let persistent = MemoryStore::new();
        persistent.set(SESSION_KEY, "{not valid json").unwrap();
        let store = SessionStore::new(Box::new(MemoryStore::new()), Box::new(persistent));
        assert!(store.read_persistent().unwrap().is_none());
    }

    #[test]
    fn test_persisted_entry_uses_camel_case_keys() {
        let persisted = PersistedSession {
            record: record(),
            expiry_ms: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&persisted).unwrap();
        assert_eq!(value["sheetId"], "1aBcDeFgHiJkLmNoP");
        assert_eq!(value["eventName"], "Autumn Craft Market");
        assert_eq!(value["exportId"], "exp-0042");
        assert_eq!(value["expiry"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_expiry_in_the_past_means_expired() {
        let persisted = PersistedSession {
            record: record(),
            expiry_ms: Utc::now().timestamp_millis() - 1,
        };
        assert!(persisted.is_expired());
        assert_eq!(persisted.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_expiry_in_the_future_means_valid() {
        let persisted = PersistedSession {
            record: record(),
            expiry_ms: Utc::now().timestamp_millis() + Duration::hours(1).num_milliseconds(),
        };
        assert!(!persisted.is_expired());
        assert!(persisted.minutes_until_expiry() > 0);
    }

    #[test]
    fn test_extreme_expiry_values_stay_clamped() {
        // A hand-edited store entry can still parse with an absurd expiry
        let corrupt = PersistedSession {
            record: record(),
            expiry_ms: i64::MIN,
        };
        assert!(corrupt.is_expired());
        assert_eq!(corrupt.minutes_until_expiry(), 0);

        let far_future = PersistedSession {
            record: record(),
            expiry_ms: i64::MAX,
        };
        assert!(!far_future.is_expired());
        assert!(far_future.minutes_until_expiry() > 0);
    }
}
