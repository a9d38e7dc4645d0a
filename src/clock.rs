//! Clock engine.
//!
//! There is no background ticking task. A match carries a timer triple
//! (accumulated seconds, status, last-update instant) and elapsed time is
//! reconstructed on demand from that triple and a caller-supplied "now".

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Stopped,
}

impl TimerStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimerStatus::Running => "running",
            TimerStatus::Stopped => "stopped",
        }
    }
}

impl ToSql for TimerStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TimerStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "running" => Ok(TimerStatus::Running),
            "stopped" => Ok(TimerStatus::Stopped),
            other => Err(FromSqlError::Other(
                format!("invalid timer status: {other}").into(),
            )),
        }
    }
}

/// The persisted timer triple. `last_update` is `None` when the stored
/// instant could not be parsed; `elapsed` then falls back to the last
/// accumulated value instead of failing the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub seconds: i64,
    pub status: TimerStatus,
    pub last_update: Option<DateTime<Utc>>,
}

impl Timer {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            seconds: 0,
            status: TimerStatus::Stopped,
            last_update: Some(now),
        }
    }

    /// Seconds elapsed as of `now`. Constant while stopped; while running,
    /// the accumulated value plus whole seconds since the last update.
    /// Clock skew (`now` before `last_update`) contributes zero.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> i64 {
        match (self.status, self.last_update) {
            (TimerStatus::Stopped, _) => self.seconds,
            (TimerStatus::Running, Some(since)) => {
                self.seconds + (now - since).num_seconds().max(0)
            }
            (TimerStatus::Running, None) => {
                tracing::warn!("timer running without a usable last_update; reporting accumulated value");
                self.seconds
            }
        }
    }

    /// Starts the timer. Idempotent when already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Running {
            return;
        }
        self.status = TimerStatus::Running;
        self.last_update = Some(now);
    }

    /// Pauses the timer, folding the running span into `seconds`.
    /// Idempotent when already stopped.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Stopped {
            return;
        }
        self.seconds = self.elapsed(now);
        self.status = TimerStatus::Stopped;
        self.last_update = Some(now);
    }

    /// Zeroes the timer regardless of prior state.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.seconds = 0;
        self.status = TimerStatus::Stopped;
        self.last_update = Some(now);
    }
}

fn active_match(store: &dyn Store, match_id: i64) -> Result<Match> {
    let m = store.get_match(match_id)?.ok_or(Error::NotFound)?;
    if !m.is_active {
        return Err(Error::MatchNotActive);
    }
    Ok(m)
}

pub fn start_timer(store: &dyn Store, match_id: i64, now: DateTime<Utc>) -> Result<Match> {
    let mut m = active_match(store, match_id)?;
    m.timer.start(now);
    store.update_match(&m)?;
    Ok(m)
}

pub fn pause_timer(store: &dyn Store, match_id: i64, now: DateTime<Utc>) -> Result<Match> {
    let mut m = active_match(store, match_id)?;
    m.timer.pause(now);
    store.update_match(&m)?;
    Ok(m)
}

pub fn reset_timer(store: &dyn Store, match_id: i64, now: DateTime<Utc>) -> Result<Match> {
    let mut m = active_match(store, match_id)?;
    m.timer.reset(now);
    store.update_match(&m)?;
    Ok(m)
}

/// Current elapsed seconds for an active match. Pure read; may be called
/// repeatedly and concurrently without side effects.
pub fn timer_elapsed(store: &dyn Store, match_id: i64, now: DateTime<Utc>) -> Result<i64> {
    let m = active_match(store, match_id)?;
    Ok(m.timer.elapsed(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn stopped_timer_is_constant() {
        let timer = Timer::new(at(0));
        assert_eq!(timer.elapsed(at(0)), 0);
        assert_eq!(timer.elapsed(at(500)), 0);
    }

    #[test]
    fn running_timer_advances_with_now() {
        let mut timer = Timer::new(at(0));
        timer.start(at(0));
        assert_eq!(timer.elapsed(at(1)), 1);
        assert_eq!(timer.elapsed(at(90)), 90);
    }

    #[test]
    fn pause_folds_elapsed_and_start_resumes() {
        // Run 0..90, pause, restart at 200, read at 250 -> 140.
        let mut timer = Timer::new(at(0));
        timer.start(at(0));
        timer.pause(at(90));
        assert_eq!(timer.seconds, 90);
        assert_eq!(timer.status, TimerStatus::Stopped);
        timer.start(at(200));
        assert_eq!(timer.elapsed(at(250)), 140);
    }

    #[test]
    fn pause_then_start_at_same_instant_is_neutral() {
        let mut timer = Timer::new(at(0));
        timer.start(at(0));
        let before = timer.elapsed(at(60));
        timer.pause(at(60));
        timer.start(at(60));
        assert_eq!(timer.elapsed(at(60)), before);
    }

    #[test]
    fn start_is_idempotent() {
        let mut timer = Timer::new(at(0));
        timer.start(at(0));
        timer.start(at(50));
        // A second start must not move the reference instant.
        assert_eq!(timer.elapsed(at(100)), 100);
    }

    #[test]
    fn clock_skew_is_clamped() {
        let mut timer = Timer::new(at(100));
        timer.start(at(100));
        assert_eq!(timer.elapsed(at(40)), 0);
        timer.pause(at(40));
        assert_eq!(timer.seconds, 0);
    }

    #[test]
    fn reset_zeroes_any_state() {
        let mut timer = Timer::new(at(0));
        timer.start(at(0));
        timer.pause(at(75));
        timer.start(at(80));
        timer.reset(at(90));
        assert_eq!(timer.seconds, 0);
        assert_eq!(timer.status, TimerStatus::Stopped);
        assert_eq!(timer.elapsed(at(300)), 0);
    }

    #[test]
    fn missing_last_update_degrades_to_accumulated() {
        let timer = Timer {
            seconds: 42,
            status: TimerStatus::Running,
            last_update: None,
        };
        assert_eq!(timer.elapsed(at(1000)), 42);
    }
}
