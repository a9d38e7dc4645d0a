//! Player registry. Players are referenced by goals and roster entries,
//! never owned by them; deletion is refused once any history exists.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Player;

pub fn create_player(
    store: &dyn Store,
    name: &str,
    is_goalkeeper: bool,
    photo_url: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Player> {
    store.create_player(&Player {
        id: 0,
        name: name.to_string(),
        is_goalkeeper,
        photo_url: photo_url.map(str::to_string),
        created_at: now,
        updated_at: now,
    })
}

pub fn update_player(
    store: &dyn Store,
    id: i64,
    name: Option<&str>,
    is_goalkeeper: Option<bool>,
    photo_url: Option<Option<&str>>,
    now: DateTime<Utc>,
) -> Result<Player> {
    let mut player = store.get_player(id)?.ok_or(Error::PlayerNotFound(id))?;

    if let Some(name) = name {
        player.name = name.to_string();
    }
    if let Some(gk) = is_goalkeeper {
        player.is_goalkeeper = gk;
    }
    if let Some(url) = photo_url {
        player.photo_url = url.map(str::to_string);
    }
    player.updated_at = now;

    store.update_player(&player)?;
    Ok(player)
}

/// Fails with `PlayerHasHistory` if the player appears in any goal or
/// roster entry.
pub fn delete_player(store: &dyn Store, id: i64) -> Result<()> {
    if store.get_player(id)?.is_none() {
        return Err(Error::PlayerNotFound(id));
    }
    if store.player_has_history(id)? {
        return Err(Error::PlayerHasHistory);
    }

    store.delete_player(id)?;
    Ok(())
}
