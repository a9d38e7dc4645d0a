mod models;
mod team;

pub use models::*;
pub use team::{Team, parse_winner};
