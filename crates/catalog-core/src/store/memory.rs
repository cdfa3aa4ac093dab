//! In-memory [`CatalogStore`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. A replacement transaction works on
//! a private copy of the state and swaps it in under one write lock on
//! commit, so readers see either the old catalog or the new one.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CatalogDraft, CatalogEntry, EntryView, FavoriteRelation};

use super::{CatalogStore, CatalogTransaction, EntryQuery, EntrySlice};

#[derive(Debug, Clone, Default)]
struct State {
    entries: Vec<CatalogEntry>,
    favorites: Vec<FavoriteRelation>,
}

impl State {
    fn is_favorite(&self, user_id: &str, entry_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|f| f.user_id == user_id && f.entry_id == entry_id)
    }

    fn view(&self, entry: &CatalogEntry, viewer: Option<&str>) -> EntryView {
        EntryView {
            entry: entry.clone(),
            is_favorite: viewer.map(|user| self.is_favorite(user, &entry.id)),
        }
    }
}

/// In-memory catalog store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| anyhow!("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| anyhow!("store lock poisoned"))
    }
}

fn window<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn begin_replace(&self) -> Result<Box<dyn CatalogTransaction>> {
        let staged = self.read()?.clone();
        Ok(Box::new(InMemoryTransaction {
            target: self.state.clone(),
            staged,
        }))
    }

    async fn list_entries(&self, query: &EntryQuery<'_>) -> Result<EntrySlice> {
        let state = self.read()?;
        let mut matching: Vec<&CatalogEntry> = state
            .entries
            .iter()
            .filter(|e| query.filter.matches(e))
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let entries = window(matching, query.offset, query.limit)
            .into_iter()
            .map(|e| state.view(e, query.viewer))
            .collect();
        Ok(EntrySlice { total, entries })
    }

    async fn get_entry(&self, id: &str, viewer: Option<&str>) -> Result<Option<EntryView>> {
        let state = self.read()?;
        Ok(state
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| state.view(e, viewer)))
    }

    async fn list_favorites(&self, user_id: &str, offset: i64, limit: i64) -> Result<EntrySlice> {
        let state = self.read()?;
        let mut relations: Vec<&FavoriteRelation> = state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .collect();
        relations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.entry_id.cmp(&b.entry_id))
        });

        let total = relations.len() as i64;
        let entries = window(relations, offset, limit)
            .into_iter()
            .filter_map(|f| state.entries.iter().find(|e| e.id == f.entry_id))
            .map(|e| EntryView {
                entry: e.clone(),
                is_favorite: Some(true),
            })
            .collect();
        Ok(EntrySlice { total, entries })
    }

    async fn favorite_exists(&self, user_id: &str, entry_id: &str) -> Result<bool> {
        Ok(self.read()?.is_favorite(user_id, entry_id))
    }

    async fn insert_favorite(&self, relation: &FavoriteRelation) -> Result<bool> {
        let mut state = self.write()?;
        if !state.entries.iter().any(|e| e.id == relation.entry_id) {
            return Err(anyhow!(
                "favorite references unknown entry {}",
                relation.entry_id
            ));
        }
        if state.is_favorite(&relation.user_id, &relation.entry_id) {
            return Ok(false);
        }
        state.favorites.push(relation.clone());
        Ok(true)
    }

    async fn delete_favorite(&self, user_id: &str, entry_id: &str) -> Result<bool> {
        let mut state = self.write()?;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.user_id == user_id && f.entry_id == entry_id));
        Ok(state.favorites.len() != before)
    }
}

/// Replacement transaction over a private copy of the store state.
struct InMemoryTransaction {
    target: Arc<RwLock<State>>,
    staged: State,
}

#[async_trait]
impl CatalogTransaction for InMemoryTransaction {
    async fn clear(&mut self) -> Result<()> {
        self.staged.favorites.clear();
        self.staged.entries.clear();
        Ok(())
    }

    async fn insert(&mut self, draft: &CatalogDraft) -> Result<bool> {
        if self.staged.entries.iter().any(|e| e.name == draft.name) {
            return Ok(false);
        }
        let entry = draft.clone().into_entry(Uuid::new_v4().to_string());
        self.staged.entries.push(entry);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { target, staged } = *self;
        let mut state = target.write().map_err(|_| anyhow!("store lock poisoned"))?;
        *state = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
