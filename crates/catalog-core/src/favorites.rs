//! Favorite toggle.
//!
//! A (user, entry) pair is either absent or present; [`toggle`] flips it.
//! There is no "set" operation. A concurrent toggle that loses the race
//! (its insert hits an existing pair, or its delete finds nothing left to
//! remove) surfaces as [`CatalogError::Conflict`] and the caller should
//! re-read the current state before retrying. An entry removed between the
//! existence check and the insert is reported as not found.

use serde::Serialize;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::models::FavoriteRelation;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub is_favorite: bool,
}

/// Flip the favorite state of `entry_id` for `user_id`.
pub async fn toggle<S: CatalogStore + ?Sized>(
    store: &S,
    user_id: &str,
    entry_id: &str,
) -> CatalogResult<ToggleOutcome> {
    if store.get_entry(entry_id, None).await?.is_none() {
        return Err(not_found(entry_id));
    }

    if store.favorite_exists(user_id, entry_id).await? {
        if !store.delete_favorite(user_id, entry_id).await? {
            return Err(CatalogError::Conflict(format!(
                "favorite for entry {} was removed concurrently",
                entry_id
            )));
        }
        debug!(user_id, entry_id, "favorite removed");
        return Ok(ToggleOutcome { is_favorite: false });
    }

    let relation = FavoriteRelation {
        user_id: user_id.to_string(),
        entry_id: entry_id.to_string(),
        created_at: chrono::Utc::now().timestamp_millis(),
    };
    let inserted = match store.insert_favorite(&relation).await {
        Ok(inserted) => inserted,
        Err(e) => {
            // the entry may have been replaced by an import since the check
            if store.get_entry(entry_id, None).await?.is_none() {
                return Err(not_found(entry_id));
            }
            return Err(CatalogError::Store(e));
        }
    };
    if !inserted {
        return Err(CatalogError::Conflict(format!(
            "favorite for entry {} was created concurrently",
            entry_id
        )));
    }
    debug!(user_id, entry_id, "favorite added");
    Ok(ToggleOutcome { is_favorite: true })
}

fn not_found(entry_id: &str) -> CatalogError {
    CatalogError::NotFound(format!("catalog entry {}", entry_id))
}
