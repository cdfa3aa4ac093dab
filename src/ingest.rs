//! CSV ingestion pipeline.
//!
//! Streams a CSV source row by row, normalizes each row into a
//! [`CatalogDraft`], and replaces the whole catalog in one store transaction:
//!
//! ```text
//! CSV bytes ──▶ RawRow ──▶ normalize_row ──▶ drafts
//!                                              │
//!            begin_replace ◀───────────────────┘
//!                 │
//!            clear ──▶ insert × N ──▶ commit
//! ```
//!
//! Parsing finishes before the transaction opens, so a malformed file never
//! touches the store. A store failure after that point rolls back. In both
//! cases the caller gets [`CatalogError::Ingestion`] and the previous
//! catalog (with its favorites) is left as it was.

use anyhow::Result;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use catalog_core::normalize::{normalize_row, RawRow};
use catalog_core::store::CatalogStore;
use catalog_core::{CatalogDraft, CatalogError};
use catalog_core::error::CatalogResult;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Result of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success: bool,
    /// Entries written to the catalog.
    pub count: usize,
    /// Rows dropped: missing a name or primary type, or a duplicate name.
    pub skipped: usize,
}

/// Drafts parsed from one CSV source.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub drafts: Vec<CatalogDraft>,
    /// Rows that could not be normalized.
    pub incomplete: usize,
}

/// Parse a CSV stream into drafts.
///
/// The first record is the header. Records may have fewer or more fields
/// than the header; extra fields are ignored.
pub fn parse_csv<R: Read>(source: R) -> CatalogResult<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Ingestion(format!("malformed CSV header: {}", e)))?
        .clone();

    let mut parsed = ParsedCsv::default();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| CatalogError::Ingestion(format!("malformed CSV: {}", e)))?;

        let row = RawRow::from_pairs(headers.iter().zip(record.iter()));
        match normalize_row(&row) {
            Some(draft) => parsed.drafts.push(draft),
            None => {
                // index is zero-based and excludes the header line
                warn!(row = index + 2, "row has no name or primary type, skipping");
                parsed.incomplete += 1;
            }
        }
    }

    Ok(parsed)
}

/// Replace the catalog with `parsed` in a single transaction.
pub async fn apply<S: CatalogStore + ?Sized>(
    store: &S,
    parsed: ParsedCsv,
) -> CatalogResult<ImportSummary> {
    let mut tx = store.begin_replace().await.map_err(store_failure)?;

    let written = async {
        tx.clear().await?;
        let mut count = 0usize;
        let mut duplicates = 0usize;
        for draft in &parsed.drafts {
            if tx.insert(draft).await? {
                count += 1;
            } else {
                warn!(name = %draft.name, "duplicate entry name, skipping");
                duplicates += 1;
            }
        }
        anyhow::Ok((count, duplicates))
    }
    .await;

    let (count, duplicates) = match written {
        Ok(counts) => counts,
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                error!(error = %rollback, "rollback failed");
            }
            return Err(store_failure(e));
        }
    };
    tx.commit().await.map_err(store_failure)?;

    let summary = ImportSummary {
        success: true,
        count,
        skipped: parsed.incomplete + duplicates,
    };
    info!(count = summary.count, skipped = summary.skipped, "catalog replaced");
    Ok(summary)
}

fn store_failure(e: anyhow::Error) -> CatalogError {
    error!(error = %e, "import aborted by store failure");
    CatalogError::Ingestion("could not write the catalog; previous data kept".to_string())
}

/// Import from any byte stream. Parsing runs on the calling thread.
pub async fn import_reader<S, R>(store: &S, source: R) -> CatalogResult<ImportSummary>
where
    S: CatalogStore + ?Sized,
    R: Read,
{
    let parsed = parse_csv(source)?;
    apply(store, parsed).await
}

/// Import a CSV file, parsing it on a blocking thread.
pub async fn import_file<S: CatalogStore + ?Sized>(
    store: &S,
    path: &Path,
) -> CatalogResult<ImportSummary> {
    let path: PathBuf = path.to_path_buf();
    let parsed = tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path).map_err(|e| {
            CatalogError::Ingestion(format!("cannot open {}: {}", path.display(), e))
        })?;
        parse_csv(std::io::BufReader::new(file))
    })
    .await
    .map_err(|e| CatalogError::Ingestion(format!("parser task failed: {}", e)))??;

    apply(store, parsed).await
}

/// `catalog import <file>`: replace the catalog from a local CSV file.
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    info!(path = %path.display(), "importing catalog");
    let summary = import_file(&store, path).await?;

    println!(
        "Imported {} entries ({} skipped)",
        summary.count, summary.skipped
    );

    pool.close().await;
    Ok(())
}
