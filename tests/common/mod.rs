use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use pelada::players;
use pelada::store::SqliteStore;
use pelada::types::Player;

pub struct TestStore {
    pub store: SqliteStore,
    _temp: TempDir,
}

pub fn test_store() -> TestStore {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path().join("pelada.db")).unwrap();
    pelada::store::Store::initialize(&store).unwrap();
    TestStore { store, _temp: temp }
}

/// Deterministic instants: a fixed epoch plus `secs`.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_717_300_000 + secs, 0).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn seed_players(store: &SqliteStore, names: &[&str]) -> Vec<Player> {
    names
        .iter()
        .map(|name| players::create_player(store, name, false, None, at(0)).unwrap())
        .collect()
}
