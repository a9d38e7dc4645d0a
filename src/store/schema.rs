pub const SCHEMA: &str = r#"
-- Registered players. Referenced by goals and roster entries, never owned.
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_goalkeeper INTEGER NOT NULL DEFAULT 0,  -- default position, not per-match
    photo_url TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- One gathering day. The date is the natural key; sessions are closed,
-- never deleted.
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL UNIQUE,      -- YYYY-MM-DD
    start_time TEXT,
    end_time TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

-- One timed game inside a session. Timer state is the stored triple;
-- elapsed time is reconstructed on read.
CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    match_number INTEGER NOT NULL DEFAULT 1,
    start_time TEXT,
    end_time TEXT,
    orange_score INTEGER NOT NULL DEFAULT 0,
    black_score INTEGER NOT NULL DEFAULT 0,
    winner_team TEXT,               -- 'orange', 'black', NULL for a draw
    is_active INTEGER NOT NULL DEFAULT 1,
    timer_seconds INTEGER NOT NULL DEFAULT 0,
    timer_status TEXT NOT NULL DEFAULT 'stopped',
    timer_last_update TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Player-in-match assignment. goals_conceded only matters for entries
-- flagged is_goalkeeper.
CREATE TABLE IF NOT EXISTS roster_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(id),
    match_id INTEGER NOT NULL REFERENCES matches(id),
    team TEXT NOT NULL,
    is_goalkeeper INTEGER NOT NULL DEFAULT 0,
    goals_conceded INTEGER NOT NULL DEFAULT 0,

    UNIQUE(player_id, match_id)
);

CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id INTEGER NOT NULL REFERENCES matches(id),
    scorer_id INTEGER NOT NULL REFERENCES players(id),
    assistant_id INTEGER REFERENCES players(id),
    team TEXT NOT NULL,
    scored_at TEXT DEFAULT (datetime('now'))
);

-- Manually back-filled per-player stats for dates with no match detail.
CREATE TABLE IF NOT EXISTS historical_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(id),
    date TEXT NOT NULL,             -- YYYY-MM-DD
    goals INTEGER NOT NULL DEFAULT 0,
    assists INTEGER NOT NULL DEFAULT 0,
    goals_conceded INTEGER NOT NULL DEFAULT 0,
    retroactive_matches INTEGER NOT NULL DEFAULT 0,
    retroactive_sessions INTEGER NOT NULL DEFAULT 0,

    UNIQUE(player_id, date)
);

-- Derived singleton, recomputed after every mutating operation.
CREATE TABLE IF NOT EXISTS global_stats (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    orange_wins INTEGER NOT NULL DEFAULT 0,
    black_wins INTEGER NOT NULL DEFAULT 0,
    orange_goals INTEGER NOT NULL DEFAULT 0,
    black_goals INTEGER NOT NULL DEFAULT 0,
    total_sessions INTEGER NOT NULL DEFAULT 0,
    total_matches INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Append-only audit trail of lifecycle transitions.
CREATE TABLE IF NOT EXISTS event_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    session_id INTEGER REFERENCES sessions(id),
    match_id INTEGER REFERENCES matches(id),
    description TEXT,
    timestamp TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_matches_session ON matches(session_id);
CREATE INDEX IF NOT EXISTS idx_roster_match ON roster_entries(match_id);
CREATE INDEX IF NOT EXISTS idx_roster_player ON roster_entries(player_id);
CREATE INDEX IF NOT EXISTS idx_goals_match ON goals(match_id);
CREATE INDEX IF NOT EXISTS idx_goals_scorer ON goals(scorer_id);
CREATE INDEX IF NOT EXISTS idx_goals_assistant ON goals(assistant_id);
CREATE INDEX IF NOT EXISTS idx_historical_player ON historical_stats(player_id);
CREATE INDEX IF NOT EXISTS idx_event_log_session ON event_log(session_id);
"#;
