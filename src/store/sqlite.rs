use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::clock::Timer;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Lenient variant for the timer reference instant: an unparseable value
/// becomes `None` so the clock engine can fall back to the accumulated
/// seconds instead of inventing a reference point.
fn parse_timer_instant(s: Option<String>) -> Option<DateTime<Utc>> {
    let s = s?;
    match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Invalid timer instant in database: '{}' - {}", s, e);
            None
        }
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| {
        tracing::error!("Invalid date in database: '{}' - {}", s, e);
        NaiveDate::default()
    })
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

const PLAYER_COLS: &str = "id, name, is_goalkeeper, photo_url, created_at, updated_at";

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        is_goalkeeper: row.get(2)?,
        photo_url: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const SESSION_COLS: &str = "id, date, start_time, end_time, is_active, created_at";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        date: parse_date(&row.get::<_, String>(1)?),
        start_time: row.get::<_, Option<String>>(2)?.map(|s| parse_datetime(&s)),
        end_time: row.get::<_, Option<String>>(3)?.map(|s| parse_datetime(&s)),
        is_active: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const MATCH_COLS: &str = "id, session_id, match_number, start_time, end_time, orange_score, \
     black_score, winner_team, is_active, timer_seconds, timer_status, timer_last_update, created_at";

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        session_id: row.get(1)?,
        match_number: row.get(2)?,
        start_time: row.get::<_, Option<String>>(3)?.map(|s| parse_datetime(&s)),
        end_time: row.get::<_, Option<String>>(4)?.map(|s| parse_datetime(&s)),
        orange_score: row.get(5)?,
        black_score: row.get(6)?,
        winner: row.get(7)?,
        is_active: row.get(8)?,
        timer: Timer {
            seconds: row.get(9)?,
            status: row.get(10)?,
            last_update: parse_timer_instant(row.get(11)?),
        },
        created_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

const ROSTER_COLS: &str = "id, player_id, match_id, team, is_goalkeeper, goals_conceded";

fn roster_from_row(row: &Row<'_>) -> rusqlite::Result<RosterEntry> {
    Ok(RosterEntry {
        id: row.get(0)?,
        player_id: row.get(1)?,
        match_id: row.get(2)?,
        team: row.get(3)?,
        is_goalkeeper: row.get(4)?,
        goals_conceded: row.get(5)?,
    })
}

const GOAL_COLS: &str = "id, match_id, scorer_id, assistant_id, team, scored_at";

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        match_id: row.get(1)?,
        scorer_id: row.get(2)?,
        assistant_id: row.get(3)?,
        team: row.get(4)?,
        scored_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const HISTORICAL_COLS: &str = "id, player_id, date, goals, assists, goals_conceded, \
     retroactive_matches, retroactive_sessions";

fn historical_from_row(row: &Row<'_>) -> rusqlite::Result<HistoricalStat> {
    Ok(HistoricalStat {
        id: row.get(0)?,
        player_id: row.get(1)?,
        date: parse_date(&row.get::<_, String>(2)?),
        goals: row.get(3)?,
        assists: row.get(4)?,
        goals_conceded: row.get(5)?,
        retroactive_matches: row.get(6)?,
        retroactive_sessions: row.get(7)?,
    })
}

const EVENT_COLS: &str = "id, kind, session_id, match_id, description, timestamp";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventLog> {
    Ok(EventLog {
        id: row.get(0)?,
        kind: row.get(1)?,
        session_id: row.get(2)?,
        match_id: row.get(3)?,
        description: row.get(4)?,
        timestamp: parse_datetime(&row.get::<_, String>(5)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Player operations

    fn create_player(&self, player: &Player) -> Result<Player> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO players (name, is_goalkeeper, photo_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                player.name,
                player.is_goalkeeper,
                player.photo_url,
                format_datetime(&player.created_at),
                format_datetime(&player.updated_at),
            ],
        )?;
        Ok(Player {
            id: conn.last_insert_rowid(),
            ..player.clone()
        })
    }

    fn get_player(&self, id: i64) -> Result<Option<Player>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PLAYER_COLS} FROM players WHERE id = ?1"),
            params![id],
            player_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {PLAYER_COLS} FROM players ORDER BY name"))?;
        let rows = stmt.query_map([], player_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_player(&self, player: &Player) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE players SET name = ?1, is_goalkeeper = ?2, photo_url = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                player.name,
                player.is_goalkeeper,
                player.photo_url,
                format_datetime(&player.updated_at),
                player.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_player(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM players WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn player_has_history(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM goals WHERE scorer_id = ?1 OR assistant_id = ?1)
                  + (SELECT COUNT(*) FROM roster_entries WHERE player_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<Session> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (date, start_time, end_time, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                format_date(&session.date),
                session.start_time.as_ref().map(format_datetime),
                session.end_time.as_ref().map(format_datetime),
                session.is_active,
                format_datetime(&session.created_at),
            ],
        )?;
        Ok(Session {
            id: conn.last_insert_rowid(),
            ..session.clone()
        })
    }

    fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLS} FROM sessions WHERE id = ?1"),
            params![id],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_session_by_date(&self, date: NaiveDate) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLS} FROM sessions WHERE date = ?1"),
            params![format_date(&date)],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_active_session(&self) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLS} FROM sessions WHERE is_active = 1 LIMIT 1"),
            [],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {SESSION_COLS} FROM sessions ORDER BY date DESC"))?;
        let rows = stmt.query_map([], session_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_session(&self, session: &Session) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE sessions SET date = ?1, start_time = ?2, end_time = ?3, is_active = ?4
             WHERE id = ?5",
            params![
                format_date(&session.date),
                session.start_time.as_ref().map(format_datetime),
                session.end_time.as_ref().map(format_datetime),
                session.is_active,
                session.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Match operations

    fn create_match(&self, m: &Match) -> Result<Match> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO matches (session_id, match_number, start_time, end_time, orange_score,
                                  black_score, winner_team, is_active, timer_seconds, timer_status,
                                  timer_last_update, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                m.session_id,
                m.match_number,
                m.start_time.as_ref().map(format_datetime),
                m.end_time.as_ref().map(format_datetime),
                m.orange_score,
                m.black_score,
                m.winner,
                m.is_active,
                m.timer.seconds,
                m.timer.status,
                m.timer.last_update.as_ref().map(format_datetime),
                format_datetime(&m.created_at),
            ],
        )?;
        Ok(Match {
            id: conn.last_insert_rowid(),
            ..m.clone()
        })
    }

    fn get_match(&self, id: i64) -> Result<Option<Match>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {MATCH_COLS} FROM matches WHERE id = ?1"),
            params![id],
            match_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_session_matches(&self, session_id: i64) -> Result<Vec<Match>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLS} FROM matches WHERE session_id = ?1 ORDER BY match_number"
        ))?;
        let rows = stmt.query_map(params![session_id], match_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_active_session_matches(&self, session_id: i64) -> Result<Vec<Match>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLS} FROM matches WHERE session_id = ?1 AND is_active = 1
             ORDER BY match_number"
        ))?;
        let rows = stmt.query_map(params![session_id], match_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_player_matches(&self, player_id: i64) -> Result<Vec<Match>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.session_id, m.match_number, m.start_time, m.end_time, m.orange_score,
                    m.black_score, m.winner_team, m.is_active, m.timer_seconds, m.timer_status,
                    m.timer_last_update, m.created_at
             FROM matches m
             JOIN roster_entries r ON r.match_id = m.id
             WHERE r.player_id = ?1
             ORDER BY m.id",
        )?;
        let rows = stmt.query_map(params![player_id], match_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn max_match_number(&self, session_id: i64) -> Result<i32> {
        let conn = self.conn();
        let max: Option<i32> = conn.query_row(
            "SELECT MAX(match_number) FROM matches WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    fn update_match(&self, m: &Match) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE matches SET start_time = ?1, end_time = ?2, orange_score = ?3,
                                black_score = ?4, winner_team = ?5, is_active = ?6,
                                timer_seconds = ?7, timer_status = ?8, timer_last_update = ?9
             WHERE id = ?10",
            params![
                m.start_time.as_ref().map(format_datetime),
                m.end_time.as_ref().map(format_datetime),
                m.orange_score,
                m.black_score,
                m.winner,
                m.is_active,
                m.timer.seconds,
                m.timer.status,
                m.timer.last_update.as_ref().map(format_datetime),
                m.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Roster operations

    fn insert_roster_entry(&self, entry: &RosterEntry) -> Result<RosterEntry> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO roster_entries (player_id, match_id, team, is_goalkeeper, goals_conceded)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.player_id,
                entry.match_id,
                entry.team,
                entry.is_goalkeeper,
                entry.goals_conceded,
            ],
        )?;
        Ok(RosterEntry {
            id: conn.last_insert_rowid(),
            ..entry.clone()
        })
    }

    fn list_match_roster(&self, match_id: i64) -> Result<Vec<RosterEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROSTER_COLS} FROM roster_entries WHERE match_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![match_id], roster_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_player_roster(&self, player_id: i64) -> Result<Vec<RosterEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROSTER_COLS} FROM roster_entries WHERE player_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![player_id], roster_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_roster_entries(&self) -> Result<Vec<RosterEntry>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {ROSTER_COLS} FROM roster_entries ORDER BY id"))?;
        let rows = stmt.query_map([], roster_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE roster_entries SET team = ?1, is_goalkeeper = ?2, goals_conceded = ?3
             WHERE id = ?4",
            params![entry.team, entry.is_goalkeeper, entry.goals_conceded, entry.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn replace_match_roster(&self, match_id: i64, entries: &[RosterEntry]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM roster_entries WHERE match_id = ?1",
            params![match_id],
        )?;

        for entry in entries {
            tx.execute(
                "INSERT INTO roster_entries (player_id, match_id, team, is_goalkeeper, goals_conceded)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.player_id,
                    match_id,
                    entry.team,
                    entry.is_goalkeeper,
                    entry.goals_conceded,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // Goal operations

    fn create_goal(&self, goal: &Goal) -> Result<Goal> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO goals (match_id, scorer_id, assistant_id, team, scored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                goal.match_id,
                goal.scorer_id,
                goal.assistant_id,
                goal.team,
                format_datetime(&goal.scored_at),
            ],
        )?;
        Ok(Goal {
            id: conn.last_insert_rowid(),
            ..goal.clone()
        })
    }

    fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {GOAL_COLS} FROM goals WHERE id = ?1"),
            params![id],
            goal_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_match_goals(&self, match_id: i64) -> Result<Vec<Goal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLS} FROM goals WHERE match_id = ?1 ORDER BY scored_at"
        ))?;
        let rows = stmt.query_map(params![match_id], goal_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_goals(&self) -> Result<Vec<Goal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {GOAL_COLS} FROM goals ORDER BY id"))?;
        let rows = stmt.query_map([], goal_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_goal(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Aggregate counts

    fn count_players(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_sessions(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_matches(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_goals(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM goals", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_team_wins(&self, team: Team) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM matches WHERE winner_team = ?1",
            params![team],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_team_goals(&self, team: Team) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM goals WHERE team = ?1",
            params![team],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Historical stat operations

    fn create_historical_stat(&self, stat: &HistoricalStat) -> Result<HistoricalStat> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO historical_stats (player_id, date, goals, assists, goals_conceded,
                                           retroactive_matches, retroactive_sessions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                stat.player_id,
                format_date(&stat.date),
                stat.goals,
                stat.assists,
                stat.goals_conceded,
                stat.retroactive_matches,
                stat.retroactive_sessions,
            ],
        )?;
        Ok(HistoricalStat {
            id: conn.last_insert_rowid(),
            ..stat.clone()
        })
    }

    fn get_historical_stat(&self, id: i64) -> Result<Option<HistoricalStat>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {HISTORICAL_COLS} FROM historical_stats WHERE id = ?1"),
            params![id],
            historical_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_historical_stat_by_date(
        &self,
        player_id: i64,
        date: NaiveDate,
    ) -> Result<Option<HistoricalStat>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {HISTORICAL_COLS} FROM historical_stats WHERE player_id = ?1 AND date = ?2"
            ),
            params![player_id, format_date(&date)],
            historical_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_player_historical_stats(&self, player_id: i64) -> Result<Vec<HistoricalStat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORICAL_COLS} FROM historical_stats WHERE player_id = ?1 ORDER BY date"
        ))?;
        let rows = stmt.query_map(params![player_id], historical_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_historical_stats(&self) -> Result<Vec<HistoricalStat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORICAL_COLS} FROM historical_stats ORDER BY date"
        ))?;
        let rows = stmt.query_map([], historical_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_historical_stat(&self, stat: &HistoricalStat) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE historical_stats SET goals = ?1, assists = ?2, goals_conceded = ?3,
                                         retroactive_matches = ?4, retroactive_sessions = ?5
             WHERE id = ?6",
            params![
                stat.goals,
                stat.assists,
                stat.goals_conceded,
                stat.retroactive_matches,
                stat.retroactive_sessions,
                stat.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_historical_stat(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM historical_stats WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Global stats singleton

    fn get_global_stats(&self) -> Result<Option<GlobalStats>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT orange_wins, black_wins, orange_goals, black_goals, total_sessions,
                    total_matches, updated_at
             FROM global_stats WHERE id = 1",
            [],
            |row| {
                Ok(GlobalStats {
                    orange_wins: row.get(0)?,
                    black_wins: row.get(1)?,
                    orange_goals: row.get(2)?,
                    black_goals: row.get(3)?,
                    total_sessions: row.get(4)?,
                    total_matches: row.get(5)?,
                    updated_at: parse_datetime(&row.get::<_, String>(6)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn put_global_stats(&self, stats: &GlobalStats) -> Result<()> {
        self.conn().execute(
            "INSERT INTO global_stats (id, orange_wins, black_wins, orange_goals, black_goals,
                                       total_sessions, total_matches, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (id) DO UPDATE SET
                orange_wins = excluded.orange_wins,
                black_wins = excluded.black_wins,
                orange_goals = excluded.orange_goals,
                black_goals = excluded.black_goals,
                total_sessions = excluded.total_sessions,
                total_matches = excluded.total_matches,
                updated_at = excluded.updated_at",
            params![
                stats.orange_wins,
                stats.black_wins,
                stats.orange_goals,
                stats.black_goals,
                stats.total_sessions,
                stats.total_matches,
                format_datetime(&stats.updated_at),
            ],
        )?;
        Ok(())
    }

    // Event log

    fn append_event(&self, event: &EventLog) -> Result<EventLog> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO event_log (kind, session_id, match_id, description, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.kind,
                event.session_id,
                event.match_id,
                event.description,
                format_datetime(&event.timestamp),
            ],
        )?;
        Ok(EventLog {
            id: conn.last_insert_rowid(),
            ..event.clone()
        })
    }

    fn list_events(&self, limit: i64) -> Result<Vec<EventLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_log ORDER BY timestamp DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], event_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_session_events(&self, session_id: i64) -> Result<Vec<EventLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_log WHERE session_id = ?1 ORDER BY timestamp, id"
        ))?;
        let rows = stmt.query_map(params![session_id], event_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn reset(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // Children before parents so foreign keys hold throughout.
        tx.execute("DELETE FROM goals", [])?;
        tx.execute("DELETE FROM roster_entries", [])?;
        tx.execute("DELETE FROM historical_stats", [])?;
        tx.execute("DELETE FROM event_log", [])?;
        tx.execute("DELETE FROM matches", [])?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute("DELETE FROM players", [])?;
        tx.execute("DELETE FROM global_stats", [])?;

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn sample_player(name: &str) -> Player {
        Player {
            id: 0,
            name: name.to_string(),
            is_goalkeeper: false,
            photo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"players".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"matches".to_string()));
        assert!(tables.contains(&"roster_entries".to_string()));
        assert!(tables.contains(&"goals".to_string()));
        assert!(tables.contains(&"historical_stats".to_string()));
        assert!(tables.contains(&"global_stats".to_string()));
        assert!(tables.contains(&"event_log".to_string()));
    }

    #[test]
    fn test_player_crud() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let created = store.create_player(&sample_player("Rafael")).unwrap();
        assert!(created.id > 0);

        let fetched = store.get_player(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Rafael");
        assert!(!fetched.is_goalkeeper);

        let mut updated = fetched.clone();
        updated.is_goalkeeper = true;
        store.update_player(&updated).unwrap();
        assert!(store.get_player(created.id).unwrap().unwrap().is_goalkeeper);

        assert!(store.delete_player(created.id).unwrap());
        assert!(store.get_player(created.id).unwrap().is_none());
    }

    #[test]
    fn test_session_unique_date() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let session = Session {
            id: 0,
            date,
            start_time: Some(Utc::now()),
            end_time: None,
            is_active: true,
            created_at: Utc::now(),
        };
        store.create_session(&session).unwrap();

        let result = store.create_session(&session);
        assert!(matches!(result, Err(Error::Database(_))));

        let by_date = store.get_session_by_date(date).unwrap().unwrap();
        assert!(by_date.is_active);
        assert_eq!(store.get_active_session().unwrap().unwrap().id, by_date.id);
    }

    #[test]
    fn test_match_round_trips_timer_triple() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let session = store
            .create_session(&Session {
                id: 0,
                date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                start_time: Some(Utc::now()),
                end_time: None,
                is_active: true,
                created_at: Utc::now(),
            })
            .unwrap();

        let started = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let m = store
            .create_match(&Match {
                id: 0,
                session_id: session.id,
                match_number: 1,
                start_time: Some(started),
                end_time: None,
                orange_score: 0,
                black_score: 0,
                winner: None,
                is_active: true,
                timer: Timer {
                    seconds: 90,
                    status: crate::clock::TimerStatus::Running,
                    last_update: Some(started),
                },
                created_at: started,
            })
            .unwrap();

        let fetched = store.get_match(m.id).unwrap().unwrap();
        assert_eq!(fetched.timer.seconds, 90);
        assert_eq!(fetched.timer.status, crate::clock::TimerStatus::Running);
        assert_eq!(fetched.timer.last_update, Some(started));
        assert_eq!(store.max_match_number(session.id).unwrap(), 1);
    }

    #[test]
    fn test_malformed_timer_instant_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let session = store
            .create_session(&Session {
                id: 0,
                date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                start_time: None,
                end_time: None,
                is_active: true,
                created_at: Utc::now(),
            })
            .unwrap();
        let m = store
            .create_match(&Match {
                id: 0,
                session_id: session.id,
                match_number: 1,
                start_time: None,
                end_time: None,
                orange_score: 0,
                black_score: 0,
                winner: None,
                is_active: true,
                timer: Timer::new(Utc::now()),
                created_at: Utc::now(),
            })
            .unwrap();

        store
            .conn()
            .execute(
                "UPDATE matches SET timer_last_update = 'garbage' WHERE id = ?1",
                params![m.id],
            )
            .unwrap();

        let fetched = store.get_match(m.id).unwrap().unwrap();
        assert_eq!(fetched.timer.last_update, None);
    }

    #[test]
    fn test_replace_match_roster_is_atomic_swap() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let p1 = store.create_player(&sample_player("P1")).unwrap();
        let p2 = store.create_player(&sample_player("P2")).unwrap();
        let session = store
            .create_session(&Session {
                id: 0,
                date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                start_time: None,
                end_time: None,
                is_active: true,
                created_at: Utc::now(),
            })
            .unwrap();
        let m = store
            .create_match(&Match {
                id: 0,
                session_id: session.id,
                match_number: 1,
                start_time: None,
                end_time: None,
                orange_score: 0,
                black_score: 0,
                winner: None,
                is_active: true,
                timer: Timer::new(Utc::now()),
                created_at: Utc::now(),
            })
            .unwrap();

        store
            .insert_roster_entry(&RosterEntry {
                id: 0,
                player_id: p1.id,
                match_id: m.id,
                team: Team::Orange,
                is_goalkeeper: true,
                goals_conceded: 2,
            })
            .unwrap();

        store
            .replace_match_roster(
                m.id,
                &[RosterEntry {
                    id: 0,
                    player_id: p2.id,
                    match_id: m.id,
                    team: Team::Black,
                    is_goalkeeper: false,
                    goals_conceded: 0,
                }],
            )
            .unwrap();

        let roster = store.list_match_roster(m.id).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].player_id, p2.id);
        assert_eq!(roster[0].team, Team::Black);
    }

    #[test]
    fn test_historical_stat_unique_per_player_date() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let p = store.create_player(&sample_player("P3")).unwrap();
        let stat = HistoricalStat {
            id: 0,
            player_id: p.id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            goals: 2,
            assists: 0,
            goals_conceded: 0,
            retroactive_matches: 3,
            retroactive_sessions: 1,
        };
        store.create_historical_stat(&stat).unwrap();
        assert!(matches!(
            store.create_historical_stat(&stat),
            Err(Error::Database(_))
        ));
    }

    #[test]
    fn test_global_stats_upsert() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.get_global_stats().unwrap().is_none());

        let stats = GlobalStats {
            orange_wins: 2,
            black_wins: 1,
            orange_goals: 7,
            black_goals: 5,
            total_sessions: 3,
            total_matches: 4,
            updated_at: Utc::now(),
        };
        store.put_global_stats(&stats).unwrap();
        store
            .put_global_stats(&GlobalStats {
                orange_wins: 3,
                ..stats.clone()
            })
            .unwrap();

        let fetched = store.get_global_stats().unwrap().unwrap();
        assert_eq!(fetched.orange_wins, 3);
        assert_eq!(fetched.total_matches, 4);
    }

    #[test]
    fn test_reset_clears_everything() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_player(&sample_player("P1")).unwrap();
        store
            .create_session(&Session {
                id: 0,
                date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                start_time: None,
                end_time: None,
                is_active: true,
                created_at: Utc::now(),
            })
            .unwrap();

        store.reset().unwrap();

        assert_eq!(store.count_players().unwrap(), 0);
        assert_eq!(store.count_sessions().unwrap(), 0);
        assert!(store.list_events(10).unwrap().is_empty());
    }
}
