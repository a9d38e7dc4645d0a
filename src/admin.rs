//! Maintenance operations.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::events;
use crate::store::Store;
use crate::types::EventKind;

/// Wipes every table. The reset event is appended afterwards so the
/// audit trail records that the wipe happened.
pub fn reset_database(store: &dyn Store, now: DateTime<Utc>) -> Result<()> {
    store.reset()?;
    events::record(store, EventKind::DatabaseReset, None, None, "Database reset", now)
}
