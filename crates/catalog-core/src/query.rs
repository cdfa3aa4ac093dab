//! Catalog query engine: filtering, pagination, and favorite annotation.
//!
//! The engine operates entirely through the [`CatalogStore`] trait. Callers
//! build a [`CatalogFilter`] and a [`PageRequest`] (usually via
//! [`ListQuery::parse`] from raw string parameters) and receive a
//! [`Page`] envelope.
//!
//! # Favorite annotation
//!
//! | Caller identity | `is_favorite` on each entry |
//! |-----------------|-----------------------------|
//! | absent          | `None` (omitted from JSON)  |
//! | present         | `Some(true)` / `Some(false)` for that caller |
//!
//! [`list_favorites`] always yields `Some(true)`.

use serde::Deserialize;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogEntry, EntryView, Page};
use crate::store::{CatalogStore, EntryQuery};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Optional, AND-combined catalog filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring over name, type1, or type2.
    pub search: Option<String>,
    /// Case-insensitive exact match.
    pub type1: Option<String>,
    /// Case-insensitive exact match.
    pub type2: Option<String>,
    pub generation: Option<i64>,
    pub legendary: Option<bool>,
}

impl CatalogFilter {
    /// Trim string filters and drop the blank ones.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        CatalogFilter {
            search: clean(self.search),
            type1: clean(self.type1),
            type2: clean(self.type2),
            generation: self.generation,
            legendary: self.legendary,
        }
    }

    /// Evaluate the filter against one entry.
    ///
    /// Backends that cannot push predicates down (the in-memory store) use
    /// this directly; the SQLite store compiles the same rules to SQL.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = entry.name.to_lowercase().contains(&needle)
                || entry.type1.to_lowercase().contains(&needle)
                || entry
                    .type2
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        if let Some(type1) = &self.type1 {
            if entry.type1.to_lowercase() != type1.to_lowercase() {
                return false;
            }
        }
        if let Some(type2) = &self.type2 {
            match &entry.type2 {
                Some(t) if t.to_lowercase() == type2.to_lowercase() => {}
                _ => return false,
            }
        }
        if let Some(generation) = self.generation {
            if entry.generation != generation {
                return false;
            }
        }
        if let Some(legendary) = self.legendary {
            if entry.legendary != legendary {
                return false;
            }
        }
        true
    }
}

/// A validated page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Validate with the built-in defaults (limit 10, max 100).
    pub fn new(page: Option<i64>, limit: Option<i64>) -> CatalogResult<Self> {
        Self::with_limits(page, limit, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Validate against a configured default and maximum limit.
    pub fn with_limits(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: i64,
        max_limit: i64,
    ) -> CatalogResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(default_limit);
        if page < 1 {
            return Err(CatalogError::validation("page", "must be at least 1"));
        }
        if !(1..=max_limit).contains(&limit) {
            return Err(CatalogError::validation(
                "limit",
                format!("must be between 1 and {}", max_limit),
            ));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Wrap one page of results in the response envelope.
    pub fn envelope<T>(&self, data: Vec<T>, total: i64) -> Page<T> {
        Page {
            data,
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total, self.limit),
        }
    }
}

/// `ceil(total / limit)`; zero when there are no rows.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Raw, string-typed list parameters as they arrive from a query string or
/// the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub type1: Option<String>,
    pub type2: Option<String>,
    pub generation: Option<String>,
    pub legendary: Option<String>,
}

impl ListQuery {
    /// Parse into a filter and page request, reporting the first bad field.
    pub fn parse(
        &self,
        default_limit: i64,
        max_limit: i64,
    ) -> CatalogResult<(CatalogFilter, PageRequest)> {
        let page = parse_int("page", self.page.as_deref())?;
        let limit = parse_int("limit", self.limit.as_deref())?;
        let generation = parse_int("generation", self.generation.as_deref())?;
        let legendary = match blank_to_none(self.legendary.as_deref()) {
            None => None,
            Some(v) if v.eq_ignore_ascii_case("true") => Some(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Some(false),
            Some(_) => {
                return Err(CatalogError::validation(
                    "legendary",
                    "must be true or false",
                ))
            }
        };

        let filter = CatalogFilter {
            search: self.search.clone(),
            type1: self.type1.clone(),
            type2: self.type2.clone(),
            generation,
            legendary,
        }
        .normalized();

        let page = PageRequest::with_limits(page, limit, default_limit, max_limit)?;
        Ok((filter, page))
    }
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_int(field: &str, value: Option<&str>) -> CatalogResult<Option<i64>> {
    match blank_to_none(value) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| CatalogError::validation(field, "must be an integer")),
    }
}

/// List catalog entries matching `filter`, ordered by name ascending.
pub async fn list<S: CatalogStore + ?Sized>(
    store: &S,
    filter: &CatalogFilter,
    page: PageRequest,
    caller: Option<&str>,
) -> CatalogResult<Page<EntryView>> {
    let slice = store
        .list_entries(&EntryQuery {
            filter,
            offset: page.offset(),
            limit: page.limit(),
            viewer: caller,
        })
        .await?;
    Ok(page.envelope(slice.entries, slice.total))
}

/// Fetch one entry by identifier.
pub async fn get_by_id<S: CatalogStore + ?Sized>(
    store: &S,
    id: &str,
    caller: Option<&str>,
) -> CatalogResult<EntryView> {
    store
        .get_entry(id, caller)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("catalog entry {}", id)))
}

/// List the caller's favorites, most recently favorited first.
pub async fn list_favorites<S: CatalogStore + ?Sized>(
    store: &S,
    caller: &str,
    page: PageRequest,
) -> CatalogResult<Page<EntryView>> {
    let slice = store
        .list_favorites(caller, page.offset(), page.limit())
        .await?;
    Ok(page.envelope(slice.entries, slice.total))
}
