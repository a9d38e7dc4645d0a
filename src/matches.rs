//! Match lifecycle manager.
//!
//! Enforces the at-most-one-active-match-per-session invariant at every
//! entry point that could violate it, and keeps team scores and roster
//! concession counts consistent under goal add/remove.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Timer;
use crate::error::{Error, Result};
use crate::events;
use crate::store::Store;
use crate::types::{EventKind, Goal, Match, Player, RosterEntry, Session, Team};

/// One side's lineup as supplied by the caller. `goals_conceded` is only
/// honored by [`replace_roster`] (mid-match substitutions carry the count
/// forward); match creation always starts entries at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSelection {
    pub player_id: i64,
    #[serde(default)]
    pub is_goalkeeper: bool,
    #[serde(default)]
    pub goals_conceded: i64,
}

/// Read view of a match with resolved player names.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    #[serde(rename = "match")]
    pub inner: Match,
    pub orange_team: Vec<RosterView>,
    pub black_team: Vec<RosterView>,
    pub goals: Vec<GoalView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterView {
    pub player_id: i64,
    pub name: String,
    pub is_goalkeeper: bool,
    pub goals_conceded: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    pub id: i64,
    pub team: Team,
    pub scorer_id: i64,
    pub scorer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_name: Option<String>,
    pub scored_at: DateTime<Utc>,
}

fn require_match(store: &dyn Store, match_id: i64) -> Result<Match> {
    store.get_match(match_id)?.ok_or(Error::NotFound)
}

fn require_player(store: &dyn Store, player_id: i64) -> Result<Player> {
    store
        .get_player(player_id)?
        .ok_or(Error::PlayerNotFound(player_id))
}

/// Closes a still-running match without entering a result. The winner
/// stays whatever was already recorded and the timer freezes at its last
/// stored value.
pub(crate) fn force_close(
    store: &dyn Store,
    m: &mut Match,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    m.is_active = false;
    m.end_time = Some(now);
    store.update_match(m)?;
    events::record(
        store,
        EventKind::MatchEnd,
        Some(m.session_id),
        Some(m.id),
        format!("Match {} ended ({reason})", m.match_number),
        now,
    )
}

/// Creates the next match in a session, closing any match still running
/// there first. Fails with `SessionClosed` on an inactive session and
/// `PlayerNotFound` if a roster references an unknown player.
pub fn create_match(
    store: &dyn Store,
    session_id: i64,
    orange: &[RosterSelection],
    black: &[RosterSelection],
    now: DateTime<Utc>,
) -> Result<Match> {
    let session: Session = store.get_session(session_id)?.ok_or(Error::NotFound)?;
    if !session.is_active {
        return Err(Error::SessionClosed);
    }

    for selection in orange.iter().chain(black) {
        require_player(store, selection.player_id)?;
    }

    for mut active in store.list_active_session_matches(session_id)? {
        force_close(store, &mut active, "new match started", now)?;
    }

    let match_number = store.max_match_number(session_id)? + 1;
    let created = store.create_match(&Match {
        id: 0,
        session_id,
        match_number,
        start_time: Some(now),
        end_time: None,
        orange_score: 0,
        black_score: 0,
        winner: None,
        is_active: true,
        timer: Timer::new(now),
        created_at: now,
    })?;

    for (team, selections) in [(Team::Orange, orange), (Team::Black, black)] {
        for selection in selections {
            store.insert_roster_entry(&RosterEntry {
                id: 0,
                player_id: selection.player_id,
                match_id: created.id,
                team,
                is_goalkeeper: selection.is_goalkeeper,
                goals_conceded: 0,
            })?;
        }
    }

    events::record(
        store,
        EventKind::MatchStart,
        Some(session_id),
        Some(created.id),
        format!("Match {match_number} started"),
        now,
    )?;

    Ok(created)
}

/// Records the result and closes the match. The timer is left frozen at
/// its last stored value; there is no implicit pause.
pub fn end_match(
    store: &dyn Store,
    match_id: i64,
    winner: Option<Team>,
    now: DateTime<Utc>,
) -> Result<Match> {
    let mut m = require_match(store, match_id)?;
    if !m.is_active {
        return Err(Error::MatchAlreadyEnded);
    }

    m.winner = winner;
    m.is_active = false;
    m.end_time = Some(now);
    store.update_match(&m)?;

    let result = match winner {
        Some(team) => format!("{team} won"),
        None => "draw".to_string(),
    };
    events::record(
        store,
        EventKind::MatchEnd,
        Some(m.session_id),
        Some(m.id),
        format!("Match {} ended: {result}", m.match_number),
        now,
    )?;

    crate::stats::recompute_global(store, now, &crate::stats::StatsPolicy::default())?;
    Ok(m)
}

/// Appends a goal, bumps the scoring team's score, and increments
/// `goals_conceded` on every opposing roster entry. Scorer and assistant
/// are not required to differ; callers wanting that rule enforce it
/// upstream.
pub fn add_goal(
    store: &dyn Store,
    match_id: i64,
    team: Team,
    scorer_id: i64,
    assistant_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(Goal, Match)> {
    let mut m = require_match(store, match_id)?;
    if !m.is_active {
        return Err(Error::MatchEnded);
    }

    let scorer = require_player(store, scorer_id)?;
    let assistant = match assistant_id {
        Some(id) => Some(require_player(store, id)?),
        None => None,
    };

    let goal = store.create_goal(&Goal {
        id: 0,
        match_id,
        scorer_id,
        assistant_id,
        team,
        scored_at: now,
    })?;

    *m.score_mut(team) += 1;
    store.update_match(&m)?;

    for mut entry in store.list_match_roster(match_id)? {
        if entry.team == team.opponent() {
            entry.goals_conceded += 1;
            store.update_roster_entry(&entry)?;
        }
    }

    let assist_text = assistant
        .map(|a| format!(" (assist by {})", a.name))
        .unwrap_or_default();
    events::record(
        store,
        EventKind::Goal,
        Some(m.session_id),
        Some(match_id),
        format!("{team} goal: {}{assist_text}", scorer.name),
        now,
    )?;

    Ok((goal, m))
}

/// Removes a goal, reversing the score and concession increments its
/// addition applied. The decrements mirror [`add_goal`] over the current
/// roster, floored at zero.
pub fn remove_goal(
    store: &dyn Store,
    match_id: i64,
    goal_id: i64,
    now: DateTime<Utc>,
) -> Result<Match> {
    let mut m = require_match(store, match_id)?;
    let goal = store.get_goal(goal_id)?.ok_or(Error::NotFound)?;
    if goal.match_id != match_id {
        return Err(Error::GoalNotInMatch);
    }
    if !m.is_active {
        return Err(Error::MatchEnded);
    }

    let score = m.score_mut(goal.team);
    *score = (*score - 1).max(0);
    store.update_match(&m)?;

    for mut entry in store.list_match_roster(match_id)? {
        if entry.team == goal.team.opponent() && entry.goals_conceded > 0 {
            entry.goals_conceded -= 1;
            store.update_roster_entry(&entry)?;
        }
    }

    store.delete_goal(goal_id)?;

    events::record(
        store,
        EventKind::GoalRemoved,
        Some(m.session_id),
        Some(match_id),
        format!("{} goal removed", goal.team),
        now,
    )?;

    Ok(m)
}

/// Atomically swaps out the full roster of a running match. Scores and
/// already-recorded goals are left untouched.
pub fn replace_roster(
    store: &dyn Store,
    match_id: i64,
    orange: &[RosterSelection],
    black: &[RosterSelection],
    now: DateTime<Utc>,
) -> Result<Vec<RosterEntry>> {
    let m = require_match(store, match_id)?;
    if !m.is_active {
        return Err(Error::MatchEnded);
    }

    for selection in orange.iter().chain(black) {
        require_player(store, selection.player_id)?;
    }

    let mut entries = Vec::with_capacity(orange.len() + black.len());
    for (team, selections) in [(Team::Orange, orange), (Team::Black, black)] {
        for selection in selections {
            entries.push(RosterEntry {
                id: 0,
                player_id: selection.player_id,
                match_id,
                team,
                is_goalkeeper: selection.is_goalkeeper,
                goals_conceded: if selection.is_goalkeeper {
                    selection.goals_conceded
                } else {
                    0
                },
            });
        }
    }
    store.replace_match_roster(match_id, &entries)?;

    events::record(
        store,
        EventKind::PlayersUpdated,
        Some(m.session_id),
        Some(match_id),
        "Match roster updated",
        now,
    )?;

    store.list_match_roster(match_id)
}

/// Match read view with resolved names for both rosters and the goal list.
pub fn match_detail(store: &dyn Store, match_id: i64) -> Result<MatchDetail> {
    let m = require_match(store, match_id)?;
    let roster = store.list_match_roster(match_id)?;

    let mut orange_team = Vec::new();
    let mut black_team = Vec::new();
    for entry in &roster {
        let player = require_player(store, entry.player_id)?;
        let view = RosterView {
            player_id: entry.player_id,
            name: player.name,
            is_goalkeeper: entry.is_goalkeeper,
            goals_conceded: if entry.is_goalkeeper {
                entry.goals_conceded
            } else {
                0
            },
        };
        match entry.team {
            Team::Orange => orange_team.push(view),
            Team::Black => black_team.push(view),
        }
    }

    let mut goals = Vec::new();
    for goal in store.list_match_goals(match_id)? {
        let scorer = require_player(store, goal.scorer_id)?;
        let assistant = match goal.assistant_id {
            Some(id) => Some(require_player(store, id)?),
            None => None,
        };
        goals.push(GoalView {
            id: goal.id,
            team: goal.team,
            scorer_id: goal.scorer_id,
            scorer_name: scorer.name,
            assistant_id: goal.assistant_id,
            assistant_name: assistant.map(|a| a.name),
            scored_at: goal.scored_at,
        });
    }

    Ok(MatchDetail {
        inner: m,
        orange_team,
        black_team,
        goals,
    })
}
