//! Manually back-filled statistics for dates with no detailed match
//! records, including bulk retroactive match/session counts.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::events;
use crate::store::Store;
use crate::types::{EventKind, HistoricalStat};

/// Caller-supplied payload for one back-filled record.
#[derive(Debug, Clone)]
pub struct HistoricalEntry {
    pub player_id: i64,
    pub date: NaiveDate,
    pub goals: i64,
    pub assists: i64,
    pub goals_conceded: i64,
    pub retroactive_matches: i64,
    pub retroactive_sessions: i64,
}

impl HistoricalEntry {
    fn is_retroactive_only(&self) -> bool {
        self.goals == 0
            && self.assists == 0
            && self.goals_conceded == 0
            && (self.retroactive_matches > 0 || self.retroactive_sessions > 0)
    }
}

fn next_unused_date(store: &dyn Store, player_id: i64, mut date: NaiveDate) -> Result<NaiveDate> {
    while store.get_historical_stat_by_date(player_id, date)?.is_some() {
        date = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::InvalidDate(date.to_string()))?;
    }
    Ok(date)
}

/// Records a back-filled stat. A second entry for an occupied (player,
/// date) slot accumulates into the existing record; retroactive-only
/// batches instead shift forward to the next free date so each batch
/// stays a distinct row.
pub fn add_historical_stat(
    store: &dyn Store,
    entry: &HistoricalEntry,
    now: DateTime<Utc>,
) -> Result<HistoricalStat> {
    let player = store
        .get_player(entry.player_id)?
        .ok_or(Error::PlayerNotFound(entry.player_id))?;

    let existing = store.get_historical_stat_by_date(entry.player_id, entry.date)?;
    let retro_only = entry.is_retroactive_only();

    let stat = match existing {
        Some(mut current) if !retro_only => {
            current.goals += entry.goals;
            current.assists += entry.assists;
            current.goals_conceded += entry.goals_conceded;
            current.retroactive_matches += entry.retroactive_matches;
            current.retroactive_sessions += entry.retroactive_sessions;
            store.update_historical_stat(&current)?;
            current
        }
        other => {
            let date = if other.is_some() {
                next_unused_date(store, entry.player_id, entry.date)?
            } else {
                entry.date
            };
            store.create_historical_stat(&HistoricalStat {
                id: 0,
                player_id: entry.player_id,
                date,
                goals: entry.goals,
                assists: entry.assists,
                goals_conceded: entry.goals_conceded,
                retroactive_matches: entry.retroactive_matches,
                retroactive_sessions: entry.retroactive_sessions,
            })?
        }
    };

    let kind = if retro_only {
        EventKind::RetroactiveMatches
    } else {
        EventKind::HistoricalStat
    };
    events::record(
        store,
        kind,
        None,
        None,
        format!("Historical stats recorded for {} ({})", player.name, stat.date),
        now,
    )?;

    crate::stats::recompute_global(store, now, &crate::stats::StatsPolicy::default())?;
    Ok(stat)
}

pub fn delete_historical_stat(store: &dyn Store, id: i64, now: DateTime<Utc>) -> Result<()> {
    let stat = store.get_historical_stat(id)?.ok_or(Error::NotFound)?;
    store.delete_historical_stat(id)?;

    events::record(
        store,
        EventKind::HistoricalStatDelete,
        None,
        None,
        format!(
            "Historical stats deleted for player {} ({})",
            stat.player_id, stat.date
        ),
        now,
    )?;

    crate::stats::recompute_global(store, now, &crate::stats::StatsPolicy::default())?;
    Ok(())
}
