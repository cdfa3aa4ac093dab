//! SQLite-backed [`CatalogStore`] implementation.
//!
//! Reads are built with [`QueryBuilder`] so the filtered listing, the single
//! entry lookup, and the favorites listing share one column list and one row
//! mapper. When a viewer is supplied, an `EXISTS` sub-select over
//! `favorites` is appended to the same query shape.
//!
//! Count and page queries for one listing run inside a single read
//! transaction, so `total` and `entries` come from the same snapshot.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use catalog_core::models::{CatalogDraft, CatalogEntry, EntryView, FavoriteRelation};
use catalog_core::query::CatalogFilter;
use catalog_core::store::{CatalogStore, CatalogTransaction, EntryQuery, EntrySlice};

const ENTRY_COLUMNS: &str = "e.id, e.name, e.type1, e.type2, e.total, e.hp, e.attack, \
     e.defense, e.sp_attack, e.sp_defense, e.speed, e.generation, e.legendary, e.image, e.ytb_url";

/// SQLite implementation of the [`CatalogStore`] trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Append the select list, optionally annotated for `viewer`.
fn push_select<'a>(qb: &mut QueryBuilder<'a, Sqlite>, viewer: Option<&str>) {
    qb.push("SELECT ").push(ENTRY_COLUMNS);
    if let Some(user_id) = viewer {
        qb.push(
            ", EXISTS (SELECT 1 FROM favorites f WHERE f.entry_id = e.id AND f.user_id = ",
        )
        .push_bind(user_id.to_string())
        .push(") AS is_favorite");
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Append `WHERE` predicates for every active filter.
fn push_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &CatalogFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        qb.push(" AND (e.name_lc LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR e.type1_lc LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR COALESCE(e.type2_lc, '') LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(type1) = &filter.type1 {
        qb.push(" AND e.type1_lc = ").push_bind(type1.to_lowercase());
    }
    if let Some(type2) = &filter.type2 {
        qb.push(" AND e.type2_lc = ").push_bind(type2.to_lowercase());
    }
    if let Some(generation) = filter.generation {
        qb.push(" AND e.generation = ").push_bind(generation);
    }
    if let Some(legendary) = filter.legendary {
        qb.push(" AND e.legendary = ").push_bind(legendary);
    }
}

fn row_to_view(row: &SqliteRow, annotated: bool) -> Result<EntryView> {
    let entry = CatalogEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        type1: row.try_get("type1")?,
        type2: row.try_get("type2")?,
        total: row.try_get("total")?,
        hp: row.try_get("hp")?,
        attack: row.try_get("attack")?,
        defense: row.try_get("defense")?,
        sp_attack: row.try_get("sp_attack")?,
        sp_defense: row.try_get("sp_defense")?,
        speed: row.try_get("speed")?,
        generation: row.try_get("generation")?,
        legendary: row.try_get::<i64, _>("legendary")? != 0,
        image: row.try_get("image")?,
        ytb_url: row.try_get("ytb_url")?,
    };
    let is_favorite = if annotated {
        Some(row.try_get::<i64, _>("is_favorite")? != 0)
    } else {
        None
    };
    Ok(EntryView { entry, is_favorite })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn begin_replace(&self) -> Result<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn list_entries(&self, query: &EntryQuery<'_>) -> Result<EntrySlice> {
        let mut tx = self.pool.begin().await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM catalog_entries e");
        push_filter(&mut count, query.filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new("");
        push_select(&mut select, query.viewer);
        select.push(" FROM catalog_entries e");
        push_filter(&mut select, query.filter);
        select
            .push(" ORDER BY e.name ASC, e.id ASC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows = select.build().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        let annotated = query.viewer.is_some();
        let entries = rows
            .iter()
            .map(|row| row_to_view(row, annotated))
            .collect::<Result<Vec<_>>>()?;
        Ok(EntrySlice { total, entries })
    }

    async fn get_entry(&self, id: &str, viewer: Option<&str>) -> Result<Option<EntryView>> {
        let mut select = QueryBuilder::<Sqlite>::new("");
        push_select(&mut select, viewer);
        select
            .push(" FROM catalog_entries e WHERE e.id = ")
            .push_bind(id.to_string());
        let row = select.build().fetch_optional(&self.pool).await?;

        row.map(|r| row_to_view(&r, viewer.is_some())).transpose()
    }

    async fn list_favorites(&self, user_id: &str, offset: i64, limit: i64) -> Result<EntrySlice> {
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM favorites f
            JOIN catalog_entries e ON e.id = f.entry_id
            WHERE f.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT ");
        select.push(ENTRY_COLUMNS);
        select
            .push(
                ", 1 AS is_favorite FROM favorites f \
                 JOIN catalog_entries e ON e.id = f.entry_id WHERE f.user_id = ",
            )
            .push_bind(user_id.to_string())
            .push(" ORDER BY f.created_at DESC, f.entry_id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = select.build().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        let entries = rows
            .iter()
            .map(|row| row_to_view(row, true))
            .collect::<Result<Vec<_>>>()?;
        Ok(EntrySlice { total, entries })
    }

    async fn favorite_exists(&self, user_id: &str, entry_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM favorites WHERE user_id = ? AND entry_id = ?")
            .bind(user_id)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_favorite(&self, relation: &FavoriteRelation) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, entry_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, entry_id) DO NOTHING
            "#,
        )
        .bind(&relation.user_id)
        .bind(&relation.entry_id)
        .bind(relation.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_favorite(&self, user_id: &str, entry_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND entry_id = ?")
            .bind(user_id)
            .bind(entry_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// A catalog replacement running inside one SQLite write transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl CatalogTransaction for SqliteTransaction {
    async fn clear(&mut self) -> Result<()> {
        let favorites = sqlx::query("DELETE FROM favorites")
            .execute(&mut *self.tx)
            .await?;
        let entries = sqlx::query("DELETE FROM catalog_entries")
            .execute(&mut *self.tx)
            .await?;
        debug!(
            favorites = favorites.rows_affected(),
            entries = entries.rows_affected(),
            "catalog cleared"
        );
        Ok(())
    }

    async fn insert(&mut self, draft: &CatalogDraft) -> Result<bool> {
        let id = Uuid::new_v4().to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO catalog_entries (id, name, type1, type2, name_lc, type1_lc, type2_lc,
                                         total, hp, attack, defense, sp_attack, sp_defense,
                                         speed, generation, legendary, image, ytb_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.type1)
        .bind(&draft.type2)
        .bind(draft.name.to_lowercase())
        .bind(draft.type1.to_lowercase())
        .bind(draft.type2.as_ref().map(|t| t.to_lowercase()))
        .bind(draft.total)
        .bind(draft.hp)
        .bind(draft.attack)
        .bind(draft.defense)
        .bind(draft.sp_attack)
        .bind(draft.sp_defense)
        .bind(draft.speed)
        .bind(draft.generation)
        .bind(draft.legendary)
        .bind(&draft.image)
        .bind(&draft.ytb_url)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
