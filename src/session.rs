//! Session lifecycle manager. At most one session is active at a time;
//! opening a new one closes the previous session and its running match
//! through the forced match-close path.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::events;
use crate::matches;
use crate::store::Store;
use crate::types::{EventKind, Session};

/// Parses a `YYYY-MM-DD` session date from the request layer.
pub fn parse_session_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

fn close_session(store: &dyn Store, session: &mut Session, now: DateTime<Utc>) -> Result<()> {
    for mut m in store.list_active_session_matches(session.id)? {
        matches::force_close(store, &mut m, "session ended", now)?;
    }

    session.is_active = false;
    session.end_time = Some(now);
    store.update_session(session)?;

    events::record(
        store,
        EventKind::SessionEnd,
        Some(session.id),
        None,
        format!("Session ended: {}", session.date),
        now,
    )
}

/// Opens the session for `date`. Any other active session is closed
/// first, including its running match.
pub fn start_session(store: &dyn Store, date: NaiveDate, now: DateTime<Utc>) -> Result<Session> {
    if store.get_session_by_date(date)?.is_some() {
        return Err(Error::DuplicateSessionDate);
    }

    if let Some(mut active) = store.get_active_session()? {
        close_session(store, &mut active, now)?;
    }

    let created = store.create_session(&Session {
        id: 0,
        date,
        start_time: Some(now),
        end_time: None,
        is_active: true,
        created_at: now,
    })?;

    events::record(
        store,
        EventKind::SessionStart,
        Some(created.id),
        None,
        format!("Session started: {date}"),
        now,
    )?;

    crate::stats::recompute_global(store, now, &crate::stats::StatsPolicy::default())?;
    Ok(created)
}

/// Closes a session, force-closing any match still running in it. The
/// forced close is not a result entry: match winners stay whatever was
/// already recorded.
pub fn end_session(store: &dyn Store, session_id: i64, now: DateTime<Utc>) -> Result<Session> {
    let mut session = store.get_session(session_id)?.ok_or(Error::NotFound)?;
    if !session.is_active {
        return Err(Error::SessionAlreadyEnded);
    }

    close_session(store, &mut session, now)?;
    crate::stats::recompute_global(store, now, &crate::stats::StatsPolicy::default())?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_date_accepts_iso_dates() {
        let date = parse_session_date("2024-06-02").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn parse_session_date_rejects_garbage() {
        assert!(matches!(
            parse_session_date("02/06/2024"),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            parse_session_date("not-a-date"),
            Err(Error::InvalidDate(_))
        ));
    }
}
