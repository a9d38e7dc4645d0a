mod common;

use common::{at, date, seed_players, test_store};

use pelada::admin;
use pelada::history::{self, HistoricalEntry};
use pelada::matches::{self, RosterSelection};
use pelada::session;
use pelada::stats::{self, LeaderboardScope, StatsPolicy};
use pelada::store::Store;
use pelada::types::{EventKind, Team};

fn selection(player_id: i64, is_goalkeeper: bool) -> RosterSelection {
    RosterSelection {
        player_id,
        is_goalkeeper,
        goals_conceded: 0,
    }
}

fn historical(player_id: i64, d: &str) -> HistoricalEntry {
    HistoricalEntry {
        player_id,
        date: date(d),
        goals: 0,
        assists: 0,
        goals_conceded: 0,
        retroactive_matches: 0,
        retroactive_sessions: 0,
    }
}

#[test]
fn player_totals_merge_regular_and_historical_sources() {
    // P3 plays one regular match and scores once, then a historical
    // record adds 2 goals, 3 retroactive matches, and 1 retroactive
    // session.
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P3", "P4"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, false)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m.id, Team::Orange, ps[0].id, None, at(20)).unwrap();

    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 2,
            retroactive_matches: 3,
            retroactive_sessions: 1,
            ..historical(ps[0].id, "2024-01-01")
        },
        at(30),
    )
    .unwrap();

    let p3 = stats::player_stats(store, ps[0].id).unwrap();
    assert_eq!(p3.matches, 1 + 3);
    assert_eq!(p3.sessions, 1 + 1);
    assert_eq!(p3.goals, 1 + 2);
    assert_eq!(p3.assists, 0);
}

#[test]
fn goalkeeper_average_uses_regular_matches_as_denominator() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["GK", "P2"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, true)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m.id, Team::Black, ps[1].id, None, at(20)).unwrap();
    matches::add_goal(store, m.id, Team::Black, ps[1].id, None, at(30)).unwrap();

    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals_conceded: 4,
            ..historical(ps[0].id, "2024-01-07")
        },
        at(40),
    )
    .unwrap();

    let gk = stats::player_stats(store, ps[0].id).unwrap();
    assert_eq!(gk.goalkeeper_matches, 1);
    assert_eq!(gk.goals_conceded, 2 + 4);
    assert!((gk.goalkeeper_average - 6.0).abs() < f64::EPSILON);

    // A player with no goalkeeper appearances reports 0, not NaN.
    let outfield = stats::player_stats(store, ps[1].id).unwrap();
    assert_eq!(outfield.goalkeeper_matches, 0);
    assert_eq!(outfield.goalkeeper_average, 0.0);
}

#[test]
fn wins_and_losses_come_from_decided_matches() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P1", "P2"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m1 = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, false)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::end_match(store, m1.id, Some(Team::Orange), at(20)).unwrap();

    let m2 = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, false)],
        &[selection(ps[1].id, false)],
        at(30),
    )
    .unwrap();
    matches::end_match(store, m2.id, None, at(40)).unwrap();

    let p1 = stats::player_stats(store, ps[0].id).unwrap();
    assert_eq!(p1.wins, 1);
    assert_eq!(p1.losses, 0);
    let p2 = stats::player_stats(store, ps[1].id).unwrap();
    assert_eq!(p2.wins, 0);
    assert_eq!(p2.losses, 1);
}

#[test]
fn leaderboard_scope_is_explicit() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["Live", "Backfill"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, false)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m.id, Team::Orange, ps[0].id, None, at(20)).unwrap();

    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 5,
            ..historical(ps[1].id, "2024-01-01")
        },
        at(30),
    )
    .unwrap();

    let regular = stats::top_scorers(store, LeaderboardScope::Regular).unwrap();
    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].name, "Live");

    let combined = stats::top_scorers(store, LeaderboardScope::Combined).unwrap();
    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0].name, "Backfill");
    assert_eq!(combined[0].goals, 5);
}

#[test]
fn top_goalkeepers_rank_by_lowest_average() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["Tight", "Leaky", "Striker"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m1 = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, true)],
        &[selection(ps[2].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m1.id, Team::Black, ps[2].id, None, at(20)).unwrap();
    matches::end_match(store, m1.id, Some(Team::Black), at(30)).unwrap();

    let m2 = matches::create_match(
        store,
        s.id,
        &[selection(ps[1].id, true)],
        &[selection(ps[2].id, false)],
        at(40),
    )
    .unwrap();
    for i in 0..3 {
        matches::add_goal(store, m2.id, Team::Black, ps[2].id, None, at(50 + i)).unwrap();
    }

    let board = stats::top_goalkeepers(store, LeaderboardScope::Regular).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].name, "Tight");
    assert!((board[0].average - 1.0).abs() < f64::EPSILON);
    assert_eq!(board[1].name, "Leaky");
    assert!((board[1].average - 3.0).abs() < f64::EPSILON);
}

#[test]
fn historical_entries_accumulate_per_date() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P1"]);

    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 2,
            assists: 1,
            ..historical(ps[0].id, "2024-01-01")
        },
        at(0),
    )
    .unwrap();
    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 3,
            ..historical(ps[0].id, "2024-01-01")
        },
        at(10),
    )
    .unwrap();

    let rows = store.list_player_historical_stats(ps[0].id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].goals, 5);
    assert_eq!(rows[0].assists, 1);
}

#[test]
fn retroactive_only_batches_shift_to_a_free_date() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P1"]);

    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 1,
            ..historical(ps[0].id, "2024-01-01")
        },
        at(0),
    )
    .unwrap();
    let shifted = history::add_historical_stat(
        store,
        &HistoricalEntry {
            retroactive_matches: 4,
            retroactive_sessions: 2,
            ..historical(ps[0].id, "2024-01-01")
        },
        at(10),
    )
    .unwrap();

    assert_eq!(shifted.date, date("2024-01-02"));

    let rows = store.list_player_historical_stats(ps[0].id).unwrap();
    assert_eq!(rows.len(), 2);

    let p1 = stats::player_stats(store, ps[0].id).unwrap();
    assert_eq!(p1.matches, 4);
    assert_eq!(p1.sessions, 2);
    assert_eq!(p1.goals, 1);
}

#[test]
fn global_stats_recompute_and_apportion_historical_goals() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P1", "P2"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, false)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m.id, Team::Orange, ps[0].id, None, at(20)).unwrap();
    matches::end_match(store, m.id, Some(Team::Orange), at(30)).unwrap();

    // 5 historical goals: 2 each plus the odd one to the tie-break team.
    history::add_historical_stat(
        store,
        &HistoricalEntry {
            goals: 5,
            ..historical(ps[1].id, "2024-01-01")
        },
        at(40),
    )
    .unwrap();

    let global = stats::recompute_global(store, at(50), &StatsPolicy::default()).unwrap();
    assert_eq!(global.orange_wins, 1);
    assert_eq!(global.black_wins, 0);
    assert_eq!(global.orange_goals, 1 + 2 + 1);
    assert_eq!(global.black_goals, 0 + 2);
    assert_eq!(global.total_sessions, 1);
    assert_eq!(global.total_matches, 1);

    let flipped = stats::recompute_global(
        store,
        at(60),
        &StatsPolicy {
            tie_break: Team::Black,
        },
    )
    .unwrap();
    assert_eq!(flipped.orange_goals, 1 + 2);
    assert_eq!(flipped.black_goals, 0 + 2 + 1);
}

#[test]
fn player_list_includes_idle_players() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["Active", "Idle"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(store, s.id, &[selection(ps[0].id, false)], &[], at(10)).unwrap();
    matches::add_goal(store, m.id, Team::Orange, ps[0].id, None, at(20)).unwrap();

    let rows = stats::player_list(store).unwrap();
    assert_eq!(rows.len(), 2);
    let idle = rows.iter().find(|r| r.name == "Idle").unwrap();
    assert_eq!(idle.matches, 0);
    assert_eq!(idle.goals, 0);
    let active = rows.iter().find(|r| r.name == "Active").unwrap();
    assert_eq!(active.matches, 1);
    assert_eq!(active.goals, 1);
}

#[test]
fn dashboard_summarizes_totals() {
    let fixture = test_store();
    let store = &fixture.store;
    let ps = seed_players(store, &["P1", "P2"]);

    let s = session::start_session(store, date("2024-06-02"), at(0)).unwrap();
    let m = matches::create_match(
        store,
        s.id,
        &[selection(ps[0].id, true)],
        &[selection(ps[1].id, false)],
        at(10),
    )
    .unwrap();
    matches::add_goal(store, m.id, Team::Black, ps[1].id, Some(ps[0].id), at(20)).unwrap();

    let dash = stats::dashboard(store, LeaderboardScope::Regular).unwrap();
    assert_eq!(dash.total_players, 2);
    assert_eq!(dash.total_sessions, 1);
    assert_eq!(dash.total_matches, 1);
    assert_eq!(dash.total_goals, 1);
    assert!((dash.avg_goals_per_match - 1.0).abs() < f64::EPSILON);
    assert_eq!(dash.top_scorer.as_ref().unwrap().name, "P2");
    assert_eq!(dash.top_assistant.as_ref().unwrap().name, "P1");
    assert_eq!(dash.top_goalkeeper.as_ref().unwrap().name, "P1");
}

#[test]
fn reset_wipes_data_but_logs_the_event() {
    let fixture = test_store();
    let store = &fixture.store;
    seed_players(store, &["P1"]);
    session::start_session(store, date("2024-06-02"), at(0)).unwrap();

    admin::reset_database(store, at(100)).unwrap();

    assert!(store.list_players().unwrap().is_empty());
    assert!(store.list_sessions().unwrap().is_empty());

    let events = pelada::events::recent_events(store, 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::DatabaseReset);
}
