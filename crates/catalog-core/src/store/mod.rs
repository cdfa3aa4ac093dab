//! Storage abstraction for Creature Catalog.
//!
//! The [`CatalogStore`] trait defines every storage operation the query
//! engine, favorite toggle, and ingestion pipeline need, enabling pluggable
//! backends (SQLite in the application crate, [`memory::InMemoryStore`] for
//! tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Catalog replacement
//!
//! Imports replace the whole catalog through an explicit transaction
//! obtained from [`CatalogStore::begin_replace`]:
//!
//! ```text
//! begin_replace ──▶ clear ──▶ insert × N ──▶ commit
//!                      └──────────┴──────▶ rollback (or drop)
//! ```
//!
//! Nothing written through a [`CatalogTransaction`] is visible to readers
//! until [`CatalogTransaction::commit`] returns. Dropping the transaction
//! without committing discards it.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogDraft, EntryView, FavoriteRelation};
use crate::query::CatalogFilter;

/// One paginated read over catalog entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryQuery<'a> {
    pub filter: &'a CatalogFilter,
    pub offset: i64,
    pub limit: i64,
    /// When set, each returned entry is annotated with this user's favorite
    /// status. When `None`, `is_favorite` stays `None`.
    pub viewer: Option<&'a str>,
}

/// A page of entries plus the total number of matching rows, read from a
/// single consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct EntrySlice {
    pub total: i64,
    pub entries: Vec<EntryView>,
}

/// Abstract storage backend for the catalog.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`begin_replace`](CatalogStore::begin_replace) | Start an atomic catalog replacement |
/// | [`list_entries`](CatalogStore::list_entries) | Filtered, paginated entry read |
/// | [`get_entry`](CatalogStore::get_entry) | Single entry by id |
/// | [`list_favorites`](CatalogStore::list_favorites) | A user's favorites, newest first |
/// | [`favorite_exists`](CatalogStore::favorite_exists) | Membership check for one pair |
/// | [`insert_favorite`](CatalogStore::insert_favorite) | Create a relation unless one exists |
/// | [`delete_favorite`](CatalogStore::delete_favorite) | Remove a relation |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Open a replacement transaction.
    async fn begin_replace(&self) -> Result<Box<dyn CatalogTransaction>>;

    /// Count and fetch entries matching the query, ordered by name ascending
    /// (ties broken by id).
    async fn list_entries(&self, query: &EntryQuery<'_>) -> Result<EntrySlice>;

    /// Fetch one entry, annotated for `viewer` when given.
    async fn get_entry(&self, id: &str, viewer: Option<&str>) -> Result<Option<EntryView>>;

    /// Count and fetch a user's favorites ordered by relation creation time,
    /// newest first (ties broken by entry id). Every entry has
    /// `is_favorite == Some(true)`.
    async fn list_favorites(&self, user_id: &str, offset: i64, limit: i64) -> Result<EntrySlice>;

    async fn favorite_exists(&self, user_id: &str, entry_id: &str) -> Result<bool>;

    /// Insert a relation. Returns `false` if the (user, entry) pair already
    /// exists; the existing relation is left untouched.
    async fn insert_favorite(&self, relation: &FavoriteRelation) -> Result<bool>;

    /// Delete a relation. Returns `false` if there was nothing to delete.
    async fn delete_favorite(&self, user_id: &str, entry_id: &str) -> Result<bool>;
}

/// An in-flight catalog replacement.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Delete every favorite relation, then every catalog entry.
    async fn clear(&mut self) -> Result<()>;

    /// Insert one draft under a fresh identifier. Returns `false` when a
    /// uniqueness constraint (entry name) rejects it.
    async fn insert(&mut self, draft: &CatalogDraft) -> Result<bool>;

    /// Make all changes visible atomically.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all changes.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
