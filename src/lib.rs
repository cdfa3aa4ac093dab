//! # Creature Catalog
//!
//! A catalog service for creature records: bulk CSV import, filtered and
//! paginated browsing, and per-user favorites.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌───────────┐
//! │  CSV file / │──▶│  Ingestion  │──▶│  SQLite   │
//! │  upload     │   │ (normalize) │   │ (WAL)     │
//! └─────────────┘   └─────────────┘   └─────┬─────┘
//!                                           │
//!                       ┌───────────────────┤
//!                       ▼                   ▼
//!                  ┌──────────┐       ┌──────────┐
//!                  │   CLI    │       │   HTTP   │
//!                  │ (catalog)│       │  (axum)  │
//!                  └──────────┘       └──────────┘
//! ```
//!
//! Filtering, pagination, favorite annotation, and the favorite toggle live
//! in the runtime-agnostic `catalog_core` crate and reach storage only
//! through its `CatalogStore` trait. This crate supplies the SQLite backend
//! and the outer surfaces.
//!
//! ## Quick Start
//!
//! ```bash
//! catalog init
//! catalog import ./pokemon.csv
//! catalog list --type1 grass --generation 1
//! catalog toggle <id> --user alice
//! catalog serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema bootstrap |
//! | [`sqlite_store`] | SQLite `CatalogStore` backend |
//! | [`ingest`] | CSV ingestion pipeline |
//! | [`auth`] | Caller identification |
//! | [`catalog`] | CLI read and favorite commands |
//! | [`server`] | HTTP server |

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod server;
pub mod sqlite_store;

pub use catalog_core;
