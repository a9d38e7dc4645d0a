use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The two fixed sides of every match. There is no third team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Orange,
    Black,
}

impl Team {
    #[must_use]
    pub fn opponent(self) -> Team {
        match self {
            Team::Orange => Team::Black,
            Team::Black => Team::Orange,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Team::Orange => "orange",
            Team::Black => "black",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "orange" => Ok(Team::Orange),
            "black" => Ok(Team::Black),
            other => Err(Error::InvalidTeam(other.to_string())),
        }
    }
}

impl ToSql for Team {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Team {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Parses a winner value as supplied by the request layer: a team label,
/// or empty/absent for a draw. Anything else is rejected.
pub fn parse_winner(value: Option<&str>) -> Result<Option<Team>> {
    match value {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidWinner(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_flips_sides() {
        assert_eq!(Team::Orange.opponent(), Team::Black);
        assert_eq!(Team::Black.opponent(), Team::Orange);
    }

    #[test]
    fn parse_winner_accepts_labels_and_draw() {
        assert_eq!(parse_winner(Some("orange")).unwrap(), Some(Team::Orange));
        assert_eq!(parse_winner(Some("black")).unwrap(), Some(Team::Black));
        assert_eq!(parse_winner(Some("")).unwrap(), None);
        assert_eq!(parse_winner(None).unwrap(), None);
    }

    #[test]
    fn parse_winner_rejects_unknown_labels() {
        assert!(matches!(
            parse_winner(Some("purple")),
            Err(Error::InvalidWinner(_))
        ));
    }
}
