//! Event emission for lifecycle transitions. The trail is append-only
//! and consumed by external audit tooling; nothing in the core reads it
//! back for decisions.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::store::Store;
use crate::types::{EventKind, EventLog};

pub(crate) fn record(
    store: &dyn Store,
    kind: EventKind,
    session_id: Option<i64>,
    match_id: Option<i64>,
    description: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    store.append_event(&EventLog {
        id: 0,
        kind,
        session_id,
        match_id,
        description: Some(description.into()),
        timestamp: now,
    })?;
    Ok(())
}

/// Most recent events, newest first, bounded by `limit`.
pub fn recent_events(store: &dyn Store, limit: i64) -> Result<Vec<EventLog>> {
    store.list_events(limit)
}

/// Full event trail for one session, oldest first.
pub fn session_events(store: &dyn Store, session_id: i64) -> Result<Vec<EventLog>> {
    store.list_session_events(session_id)
}
