use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::Team;
use crate::clock::Timer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub is_goalkeeper: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub session_id: i64,
    pub match_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub orange_score: i64,
    pub black_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Team>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timer: Timer,
    pub created_at: DateTime<Utc>,
}

impl Match {
    #[must_use]
    pub fn score(&self, team: Team) -> i64 {
        match team {
            Team::Orange => self.orange_score,
            Team::Black => self.black_score,
        }
    }

    pub(crate) fn score_mut(&mut self, team: Team) -> &mut i64 {
        match team {
            Team::Orange => &mut self.orange_score,
            Team::Black => &mut self.black_score,
        }
    }
}

/// A player's assignment to one team within one match. `goals_conceded`
/// is only meaningful for entries flagged `is_goalkeeper`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: i64,
    pub player_id: i64,
    pub match_id: i64,
    pub team: Team,
    pub is_goalkeeper: bool,
    pub goals_conceded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub match_id: i64,
    pub scorer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<i64>,
    pub team: Team,
    pub scored_at: DateTime<Utc>,
}

/// A manually back-filled per-player record for one date. The goal,
/// assist, and concession fields carry detail-level numbers; the two
/// retroactive fields are bulk counts with no event detail behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalStat {
    pub id: i64,
    pub player_id: i64,
    pub date: NaiveDate,
    pub goals: i64,
    pub assists: i64,
    pub goals_conceded: i64,
    pub retroactive_matches: i64,
    pub retroactive_sessions: i64,
}

impl HistoricalStat {
    /// True when the record carries only bulk match/session counts.
    #[must_use]
    pub fn is_retroactive_only(&self) -> bool {
        self.goals == 0
            && self.assists == 0
            && self.goals_conceded == 0
            && (self.retroactive_matches > 0 || self.retroactive_sessions > 0)
    }
}

/// Derived singleton, recomputed from scratch after mutating operations.
/// Never authoritative on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub orange_wins: i64,
    pub black_wins: i64,
    pub orange_goals: i64,
    pub black_goals: i64,
    pub total_sessions: i64,
    pub total_matches: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    MatchStart,
    MatchEnd,
    Goal,
    GoalRemoved,
    PlayersUpdated,
    HistoricalStat,
    HistoricalStatDelete,
    RetroactiveMatches,
    DatabaseReset,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SessionStart => "session_start",
            EventKind::SessionEnd => "session_end",
            EventKind::MatchStart => "match_start",
            EventKind::MatchEnd => "match_end",
            EventKind::Goal => "goal",
            EventKind::GoalRemoved => "goal_removed",
            EventKind::PlayersUpdated => "players_updated",
            EventKind::HistoricalStat => "historical_stat",
            EventKind::HistoricalStatDelete => "historical_stat_delete",
            EventKind::RetroactiveMatches => "retroactive_matches",
            EventKind::DatabaseReset => "database_reset",
        }
    }
}

impl ToSql for EventKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EventKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "session_start" => Ok(EventKind::SessionStart),
            "session_end" => Ok(EventKind::SessionEnd),
            "match_start" => Ok(EventKind::MatchStart),
            "match_end" => Ok(EventKind::MatchEnd),
            "goal" => Ok(EventKind::Goal),
            "goal_removed" => Ok(EventKind::GoalRemoved),
            "players_updated" => Ok(EventKind::PlayersUpdated),
            "historical_stat" => Ok(EventKind::HistoricalStat),
            "historical_stat_delete" => Ok(EventKind::HistoricalStatDelete),
            "retroactive_matches" => Ok(EventKind::RetroactiveMatches),
            "database_reset" => Ok(EventKind::DatabaseReset),
            other => Err(FromSqlError::Other(
                format!("invalid event kind: {other}").into(),
            )),
        }
    }
}

/// Append-only audit entry emitted on every successful lifecycle
/// transition. Consumed externally; never interpreted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub id: i64,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}
