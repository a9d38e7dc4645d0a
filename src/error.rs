use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("session is closed")]
    SessionClosed,

    #[error("session already ended")]
    SessionAlreadyEnded,

    #[error("a session already exists for this date")]
    DuplicateSessionDate,

    #[error("match is ended")]
    MatchEnded,

    #[error("match already ended")]
    MatchAlreadyEnded,

    #[error("match is not active")]
    MatchNotActive,

    #[error("goal does not belong to this match")]
    GoalNotInMatch,

    #[error("invalid winner: {0}")]
    InvalidWinner(String),

    #[error("invalid team: {0}")]
    InvalidTeam(String),

    #[error("player not found: {0}")]
    PlayerNotFound(i64),

    #[error("player has match or goal history")]
    PlayerHasHistory,

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
