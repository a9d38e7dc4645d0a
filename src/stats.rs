//! Stats aggregator.
//!
//! Read-only views over stored entities. Per-player totals merge three
//! disjoint sources without double counting: live match data (goals and
//! roster entries), back-filled historical records, and bulk retroactive
//! match/session counts (which only ever contribute to the match and
//! session tallies, never to goals or assists).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{GlobalStats, Team};

/// Which sources a leaderboard draws from. There is no obviously right
/// default, so it is an explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardScope {
    /// Live match data only.
    Regular,
    /// Live match data plus historical records.
    Combined,
}

/// Tunable policy choices the aggregator cannot decide on its own.
/// Historical records carry no team label, so their goals are split
/// evenly between the two teams with any odd leftover going to
/// `tie_break`. The split is a modeling simplification, not a verified
/// business rule.
#[derive(Debug, Clone, Copy)]
pub struct StatsPolicy {
    pub tie_break: Team,
}

impl Default for StatsPolicy {
    fn default() -> Self {
        Self {
            tie_break: Team::Orange,
        }
    }
}

/// Merged per-player totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerStats {
    pub matches: i64,
    pub sessions: i64,
    pub goals: i64,
    pub assists: i64,
    pub goals_conceded: i64,
    pub goalkeeper_matches: i64,
    pub wins: i64,
    pub losses: i64,
    pub goalkeeper_average: f64,
}

/// One row of the all-players stats listing.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub player_id: i64,
    pub name: String,
    pub is_goalkeeper: bool,
    pub matches: i64,
    pub sessions: i64,
    pub goals: i64,
    pub assists: i64,
    pub goals_conceded: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScorerEntry {
    pub player_id: i64,
    pub name: String,
    pub goals: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantEntry {
    pub player_id: i64,
    pub name: String,
    pub assists: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalkeeperEntry {
    pub player_id: i64,
    pub name: String,
    pub matches: i64,
    pub goals_conceded: i64,
    pub average: f64,
}

/// Headline block for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub top_scorer: Option<ScorerEntry>,
    pub top_assistant: Option<AssistantEntry>,
    pub top_goalkeeper: Option<GoalkeeperEntry>,
    pub total_players: i64,
    pub total_sessions: i64,
    pub total_matches: i64,
    pub total_goals: i64,
    pub avg_goals_per_match: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    matches: i64,
    sessions: i64,
    goals: i64,
    assists: i64,
    goals_conceded: i64,
    gk_matches: i64,
    hist_goals: i64,
    hist_assists: i64,
    hist_conceded: i64,
    retro_matches: i64,
    retro_sessions: i64,
}

impl Tally {
    fn total_goals(&self, scope: LeaderboardScope) -> i64 {
        match scope {
            LeaderboardScope::Regular => self.goals,
            LeaderboardScope::Combined => self.goals + self.hist_goals,
        }
    }

    fn total_assists(&self, scope: LeaderboardScope) -> i64 {
        match scope {
            LeaderboardScope::Regular => self.assists,
            LeaderboardScope::Combined => self.assists + self.hist_assists,
        }
    }

    fn total_conceded(&self, scope: LeaderboardScope) -> i64 {
        match scope {
            LeaderboardScope::Regular => self.goals_conceded,
            LeaderboardScope::Combined => self.goals_conceded + self.hist_conceded,
        }
    }

    /// Goals conceded per match as goalkeeper. The denominator is always
    /// the regular goalkeeper match count; zero denominator reports 0.
    fn gk_average(&self, scope: LeaderboardScope) -> f64 {
        if self.gk_matches == 0 {
            return 0.0;
        }
        self.total_conceded(scope) as f64 / self.gk_matches as f64
    }
}

/// One tally per player id, merged from goals, roster entries, matches,
/// and historical records.
fn collect_tallies(store: &dyn Store) -> Result<HashMap<i64, Tally>> {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    let mut session_sets: HashMap<i64, HashSet<i64>> = HashMap::new();

    let mut match_index = HashMap::new();
    let roster = store.list_roster_entries()?;
    for entry in &roster {
        if !match_index.contains_key(&entry.match_id) {
            let m = store
                .get_match(entry.match_id)?
                .ok_or(Error::NotFound)?;
            match_index.insert(entry.match_id, m);
        }
    }

    for entry in &roster {
        let tally = tallies.entry(entry.player_id).or_default();
        tally.matches += 1;
        if entry.is_goalkeeper {
            tally.gk_matches += 1;
            tally.goals_conceded += entry.goals_conceded;
        }

        let m = &match_index[&entry.match_id];
        session_sets
            .entry(entry.player_id)
            .or_default()
            .insert(m.session_id);
    }

    for goal in store.list_goals()? {
        tallies.entry(goal.scorer_id).or_default().goals += 1;
        if let Some(assistant_id) = goal.assistant_id {
            tallies.entry(assistant_id).or_default().assists += 1;
        }
    }

    for stat in store.list_historical_stats()? {
        let tally = tallies.entry(stat.player_id).or_default();
        tally.hist_goals += stat.goals;
        tally.hist_assists += stat.assists;
        tally.hist_conceded += stat.goals_conceded;
        tally.retro_matches += stat.retroactive_matches;
        tally.retro_sessions += stat.retroactive_sessions;
    }

    for (player_id, sessions) in session_sets {
        tallies.entry(player_id).or_default().sessions = sessions.len() as i64;
    }

    Ok(tallies)
}

/// Merged totals for one player. Matches and sessions include the
/// retroactive bulk counts; goals, assists, and concessions include
/// historical detail; wins and losses come from decided regular matches
/// only.
pub fn player_stats(store: &dyn Store, player_id: i64) -> Result<PlayerStats> {
    if store.get_player(player_id)?.is_none() {
        return Err(Error::PlayerNotFound(player_id));
    }

    let roster = store.list_player_roster(player_id)?;
    let matches = store.list_player_matches(player_id)?;
    let team_by_match: HashMap<i64, Team> =
        roster.iter().map(|e| (e.match_id, e.team)).collect();

    let mut stats = PlayerStats {
        matches: roster.len() as i64,
        ..PlayerStats::default()
    };

    let mut sessions = HashSet::new();
    for m in &matches {
        sessions.insert(m.session_id);
        if let (Some(winner), Some(team)) = (m.winner, team_by_match.get(&m.id)) {
            if winner == *team {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
        }
    }
    stats.sessions = sessions.len() as i64;

    for entry in &roster {
        if entry.is_goalkeeper {
            stats.goalkeeper_matches += 1;
            stats.goals_conceded += entry.goals_conceded;
        }
    }

    for goal in store.list_goals()? {
        if goal.scorer_id == player_id {
            stats.goals += 1;
        }
        if goal.assistant_id == Some(player_id) {
            stats.assists += 1;
        }
    }

    for hist in store.list_player_historical_stats(player_id)? {
        stats.goals += hist.goals;
        stats.assists += hist.assists;
        stats.goals_conceded += hist.goals_conceded;
        stats.matches += hist.retroactive_matches;
        stats.sessions += hist.retroactive_sessions;
    }

    stats.goalkeeper_average = if stats.goalkeeper_matches > 0 {
        stats.goals_conceded as f64 / stats.goalkeeper_matches as f64
    } else {
        0.0
    };

    Ok(stats)
}

/// One merged stats row per registered player, including players with no
/// recorded activity yet.
pub fn player_list(store: &dyn Store) -> Result<Vec<PlayerSummary>> {
    let tallies = collect_tallies(store)?;
    let scope = LeaderboardScope::Combined;

    let mut rows = Vec::new();
    for player in store.list_players()? {
        let tally = tallies.get(&player.id).copied().unwrap_or_default();
        rows.push(PlayerSummary {
            player_id: player.id,
            name: player.name,
            is_goalkeeper: player.is_goalkeeper,
            matches: tally.matches + tally.retro_matches,
            sessions: tally.sessions + tally.retro_sessions,
            goals: tally.total_goals(scope),
            assists: tally.total_assists(scope),
            goals_conceded: tally.total_conceded(scope),
        });
    }
    Ok(rows)
}

fn named_tallies(store: &dyn Store) -> Result<Vec<(i64, String, Tally)>> {
    let tallies = collect_tallies(store)?;
    let mut rows = Vec::new();
    for player in store.list_players()? {
        let tally = tallies.get(&player.id).copied().unwrap_or_default();
        rows.push((player.id, player.name, tally));
    }
    Ok(rows)
}

/// Ranked goal scorers, best first. Players without a single goal in
/// scope are omitted.
pub fn top_scorers(store: &dyn Store, scope: LeaderboardScope) -> Result<Vec<ScorerEntry>> {
    let mut entries: Vec<ScorerEntry> = named_tallies(store)?
        .into_iter()
        .filter(|(_, _, t)| t.total_goals(scope) > 0)
        .map(|(player_id, name, t)| ScorerEntry {
            player_id,
            name,
            goals: t.total_goals(scope),
        })
        .collect();
    entries.sort_by(|a, b| b.goals.cmp(&a.goals).then(a.name.cmp(&b.name)));
    Ok(entries)
}

pub fn top_assistants(store: &dyn Store, scope: LeaderboardScope) -> Result<Vec<AssistantEntry>> {
    let mut entries: Vec<AssistantEntry> = named_tallies(store)?
        .into_iter()
        .filter(|(_, _, t)| t.total_assists(scope) > 0)
        .map(|(player_id, name, t)| AssistantEntry {
            player_id,
            name,
            assists: t.total_assists(scope),
        })
        .collect();
    entries.sort_by(|a, b| b.assists.cmp(&a.assists).then(a.name.cmp(&b.name)));
    Ok(entries)
}

/// Goalkeepers ranked by average goals conceded per match, best (lowest)
/// first. Only players with at least one regular goalkeeper appearance
/// qualify.
pub fn top_goalkeepers(store: &dyn Store, scope: LeaderboardScope) -> Result<Vec<GoalkeeperEntry>> {
    let mut entries: Vec<GoalkeeperEntry> = named_tallies(store)?
        .into_iter()
        .filter(|(_, _, t)| t.gk_matches > 0)
        .map(|(player_id, name, t)| GoalkeeperEntry {
            player_id,
            name,
            matches: t.gk_matches,
            goals_conceded: t.total_conceded(scope),
            average: t.gk_average(scope),
        })
        .collect();
    entries.sort_by(|a, b| {
        a.average
            .partial_cmp(&b.average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.name.cmp(&b.name))
    });
    Ok(entries)
}

/// Recomputes the global singleton from scratch. Historical goals carry
/// no team label, so they are apportioned evenly with the odd leftover
/// going to `policy.tie_break`.
pub fn recompute_global(
    store: &dyn Store,
    now: DateTime<Utc>,
    policy: &StatsPolicy,
) -> Result<GlobalStats> {
    let mut orange_goals = store.count_team_goals(Team::Orange)?;
    let mut black_goals = store.count_team_goals(Team::Black)?;

    let historical_goals: i64 = store
        .list_historical_stats()?
        .iter()
        .map(|s| s.goals)
        .sum();
    orange_goals += historical_goals / 2;
    black_goals += historical_goals / 2;
    match policy.tie_break {
        Team::Orange => orange_goals += historical_goals % 2,
        Team::Black => black_goals += historical_goals % 2,
    }

    let stats = GlobalStats {
        orange_wins: store.count_team_wins(Team::Orange)?,
        black_wins: store.count_team_wins(Team::Black)?,
        orange_goals,
        black_goals,
        total_sessions: store.count_sessions()?,
        total_matches: store.count_matches()?,
        updated_at: now,
    };
    store.put_global_stats(&stats)?;
    Ok(stats)
}

/// The stored global singleton, or zeroes when nothing has been
/// recomputed yet.
pub fn global_stats(store: &dyn Store, now: DateTime<Utc>) -> Result<GlobalStats> {
    Ok(store.get_global_stats()?.unwrap_or(GlobalStats {
        orange_wins: 0,
        black_wins: 0,
        orange_goals: 0,
        black_goals: 0,
        total_sessions: 0,
        total_matches: 0,
        updated_at: now,
    }))
}

/// Headline numbers plus the top scorer/assistant/goalkeeper trio.
pub fn dashboard(store: &dyn Store, scope: LeaderboardScope) -> Result<DashboardStats> {
    let total_matches = store.count_matches()?;
    let total_goals = store.count_goals()?;

    Ok(DashboardStats {
        top_scorer: top_scorers(store, scope)?.into_iter().next(),
        top_assistant: top_assistants(store, scope)?.into_iter().next(),
        top_goalkeeper: top_goalkeepers(store, scope)?.into_iter().next(),
        total_players: store.count_players()?,
        total_sessions: store.count_sessions()?,
        total_matches,
        total_goals,
        avg_goals_per_match: if total_matches > 0 {
            total_goals as f64 / total_matches as f64
        } else {
            0.0
        },
    })
}
