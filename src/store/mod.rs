mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::*;

/// Store defines the record-store interface the core operates against.
/// Implementations are expected to serialize conflicting writes; the core
/// itself takes no locks.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Player operations
    fn create_player(&self, player: &Player) -> Result<Player>;
    fn get_player(&self, id: i64) -> Result<Option<Player>>;
    fn list_players(&self) -> Result<Vec<Player>>;
    fn update_player(&self, player: &Player) -> Result<()>;
    fn delete_player(&self, id: i64) -> Result<bool>;
    fn player_has_history(&self, id: i64) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<Session>;
    fn get_session(&self, id: i64) -> Result<Option<Session>>;
    fn get_session_by_date(&self, date: NaiveDate) -> Result<Option<Session>>;
    fn get_active_session(&self) -> Result<Option<Session>>;
    fn list_sessions(&self) -> Result<Vec<Session>>;
    fn update_session(&self, session: &Session) -> Result<()>;

    // Match operations
    fn create_match(&self, m: &Match) -> Result<Match>;
    fn get_match(&self, id: i64) -> Result<Option<Match>>;
    fn list_session_matches(&self, session_id: i64) -> Result<Vec<Match>>;
    fn list_active_session_matches(&self, session_id: i64) -> Result<Vec<Match>>;
    fn list_player_matches(&self, player_id: i64) -> Result<Vec<Match>>;
    fn max_match_number(&self, session_id: i64) -> Result<i32>;
    fn update_match(&self, m: &Match) -> Result<()>;

    // Roster operations
    fn insert_roster_entry(&self, entry: &RosterEntry) -> Result<RosterEntry>;
    fn list_match_roster(&self, match_id: i64) -> Result<Vec<RosterEntry>>;
    fn list_player_roster(&self, player_id: i64) -> Result<Vec<RosterEntry>>;
    fn list_roster_entries(&self) -> Result<Vec<RosterEntry>>;
    fn update_roster_entry(&self, entry: &RosterEntry) -> Result<()>;
    fn replace_match_roster(&self, match_id: i64, entries: &[RosterEntry]) -> Result<()>;

    // Goal operations
    fn create_goal(&self, goal: &Goal) -> Result<Goal>;
    fn get_goal(&self, id: i64) -> Result<Option<Goal>>;
    fn list_match_goals(&self, match_id: i64) -> Result<Vec<Goal>>;
    fn list_goals(&self) -> Result<Vec<Goal>>;
    fn delete_goal(&self, id: i64) -> Result<bool>;

    // Aggregate counts used by the global-stats recompute
    fn count_players(&self) -> Result<i64>;
    fn count_sessions(&self) -> Result<i64>;
    fn count_matches(&self) -> Result<i64>;
    fn count_goals(&self) -> Result<i64>;
    fn count_team_wins(&self, team: Team) -> Result<i64>;
    fn count_team_goals(&self, team: Team) -> Result<i64>;

    // Historical stat operations
    fn create_historical_stat(&self, stat: &HistoricalStat) -> Result<HistoricalStat>;
    fn get_historical_stat(&self, id: i64) -> Result<Option<HistoricalStat>>;
    fn get_historical_stat_by_date(
        &self,
        player_id: i64,
        date: NaiveDate,
    ) -> Result<Option<HistoricalStat>>;
    fn list_player_historical_stats(&self, player_id: i64) -> Result<Vec<HistoricalStat>>;
    fn list_historical_stats(&self) -> Result<Vec<HistoricalStat>>;
    fn update_historical_stat(&self, stat: &HistoricalStat) -> Result<()>;
    fn delete_historical_stat(&self, id: i64) -> Result<bool>;

    // Global stats singleton
    fn get_global_stats(&self) -> Result<Option<GlobalStats>>;
    fn put_global_stats(&self, stats: &GlobalStats) -> Result<()>;

    // Event log
    fn append_event(&self, event: &EventLog) -> Result<EventLog>;
    fn list_events(&self, limit: i64) -> Result<Vec<EventLog>>;
    fn list_session_events(&self, session_id: i64) -> Result<Vec<EventLog>>;

    /// Deletes every row in every table. Used by the database-reset
    /// maintenance operation only.
    fn reset(&self) -> Result<()>;
}
