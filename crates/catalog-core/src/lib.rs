//! # Creature Catalog Core
//!
//! Runtime-agnostic logic for Creature Catalog: data models, field
//! normalization, store abstraction, the query engine, and the favorite
//! toggle.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage is reached
//! only through the [`store::CatalogStore`] trait, so the same query and
//! favorite logic runs against SQLite in the application crate and against
//! [`store::memory::InMemoryStore`] in tests.

pub mod error;
pub mod favorites;
pub mod models;
pub mod normalize;
pub mod query;
pub mod store;

pub use error::CatalogError;
pub use models::{CatalogDraft, CatalogEntry, EntryView, FavoriteRelation, Page, UserId};
