//! Core data models used throughout Creature Catalog.
//!
//! These types represent the normalized drafts, stored entries, favorite
//! relations, and paginated responses that flow through ingestion and
//! retrieval.

use serde::Serialize;

/// Opaque user identifier supplied by the authentication collaborator.
pub type UserId = String;

/// A normalized catalog record without a store identifier.
///
/// Produced by [`normalize_row`](crate::normalize::normalize_row) at the
/// ingestion boundary; everything downstream works with these typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDraft {
    pub name: String,
    pub type1: String,
    pub type2: Option<String>,
    pub total: i64,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub sp_attack: i64,
    pub sp_defense: i64,
    pub speed: i64,
    pub generation: i64,
    pub legendary: bool,
    pub image: String,
    pub ytb_url: String,
}

impl CatalogDraft {
    /// Attach a store identifier, producing a persisted entry.
    pub fn into_entry(self, id: String) -> CatalogEntry {
        CatalogEntry {
            id,
            name: self.name,
            type1: self.type1,
            type2: self.type2,
            total: self.total,
            hp: self.hp,
            attack: self.attack,
            defense: self.defense,
            sp_attack: self.sp_attack,
            sp_defense: self.sp_defense,
            speed: self.speed,
            generation: self.generation,
            legendary: self.legendary,
            image: self.image,
            ytb_url: self.ytb_url,
        }
    }
}

/// A catalog entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub type1: String,
    pub type2: Option<String>,
    pub total: i64,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub sp_attack: i64,
    pub sp_defense: i64,
    pub speed: i64,
    pub generation: i64,
    pub legendary: bool,
    pub image: String,
    pub ytb_url: String,
}

/// An entry as returned to a caller.
///
/// `is_favorite` is `None` when no caller identity was supplied, which is
/// serialized by omitting the key rather than writing `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// A user's favorite mark on one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRelation {
    pub user_id: UserId,
    pub entry_id: String,
    /// Unix milliseconds.
    pub created_at: i64,
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(type2: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id: "e1".to_string(),
            name: "Mewtwo".to_string(),
            type1: "Psychic".to_string(),
            type2: type2.map(str::to_string),
            total: 680,
            hp: 106,
            attack: 110,
            defense: 90,
            sp_attack: 154,
            sp_defense: 90,
            speed: 130,
            generation: 1,
            legendary: true,
            image: "img".to_string(),
            ytb_url: "ytb".to_string(),
        }
    }

    #[test]
    fn test_view_without_caller_omits_is_favorite() {
        let view = EntryView {
            entry: sample_entry(None),
            is_favorite: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("isFavorite").is_none());
        assert!(json["type2"].is_null());
        assert_eq!(json["spAttack"], 154);
        assert_eq!(json["ytbUrl"], "ytb");
    }

    #[test]
    fn test_view_with_caller_includes_false() {
        let view = EntryView {
            entry: sample_entry(Some("Fighting")),
            is_favorite: Some(false),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isFavorite"], false);
        assert_eq!(json["type2"], "Fighting");
    }
}
