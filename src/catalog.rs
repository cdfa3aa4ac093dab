//! Catalog read and favorite commands for the CLI.
//!
//! Thin wrappers around the core query engine and favorite toggle, bound to
//! the configured SQLite database. Results go to stdout.

use anyhow::Result;

use catalog_core::favorites;
use catalog_core::query::{self, ListQuery};
use catalog_core::{EntryView, Page};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    Ok(SqliteStore::new(pool))
}

fn types(view: &EntryView) -> String {
    match &view.entry.type2 {
        Some(t2) => format!("{}/{}", view.entry.type1, t2),
        None => view.entry.type1.clone(),
    }
}

fn print_page(page: &Page<EntryView>) {
    println!(
        "page {}/{} ({} total, limit {})",
        page.page, page.total_pages, page.total, page.limit
    );
    for view in &page.data {
        let mut flags = String::new();
        if view.entry.legendary {
            flags.push_str(" legendary");
        }
        if view.is_favorite == Some(true) {
            flags.push_str(" favorite");
        }
        println!(
            "{}  {:<16} {:<18} gen {}{}",
            view.entry.id,
            view.entry.name,
            types(view),
            view.entry.generation,
            flags
        );
    }
}

/// `catalog list`
pub async fn run_list(config: &Config, params: ListQuery, user: Option<&str>) -> Result<()> {
    let (filter, page) = params.parse(config.query.default_limit, config.query.max_limit)?;
    let store = open_store(config).await?;
    let result = query::list(&store, &filter, page, user).await?;
    print_page(&result);
    store.pool().close().await;
    Ok(())
}

/// `catalog get <id>`
pub async fn run_get(config: &Config, id: &str, user: Option<&str>) -> Result<()> {
    let store = open_store(config).await?;
    let view = query::get_by_id(&store, id, user).await;
    store.pool().close().await;
    let view = view?;
    let entry = &view.entry;

    println!("--- Entry ---");
    println!("id:          {}", entry.id);
    println!("name:        {}", entry.name);
    println!("types:       {}", types(&view));
    println!("generation:  {}", entry.generation);
    println!("legendary:   {}", entry.legendary);
    if let Some(is_favorite) = view.is_favorite {
        println!("favorite:    {}", is_favorite);
    }
    println!();

    println!("--- Stats ---");
    println!("total:       {}", entry.total);
    println!("hp:          {}", entry.hp);
    println!("attack:      {}", entry.attack);
    println!("defense:     {}", entry.defense);
    println!("sp_attack:   {}", entry.sp_attack);
    println!("sp_defense:  {}", entry.sp_defense);
    println!("speed:       {}", entry.speed);
    println!();

    println!("--- Media ---");
    println!("image:       {}", entry.image);
    println!("ytb_url:     {}", entry.ytb_url);

    Ok(())
}

/// `catalog favorites --user <id>`
pub async fn run_favorites(
    config: &Config,
    user: &str,
    page: Option<String>,
    limit: Option<String>,
) -> Result<()> {
    let paging = ListQuery {
        page,
        limit,
        ..Default::default()
    };
    let (_, page) = paging.parse(config.query.default_limit, config.query.max_limit)?;
    let store = open_store(config).await?;
    let result = query::list_favorites(&store, user, page).await?;
    print_page(&result);
    store.pool().close().await;
    Ok(())
}

/// `catalog toggle <id> --user <id>`
pub async fn run_toggle(config: &Config, id: &str, user: &str) -> Result<()> {
    let store = open_store(config).await?;
    let outcome = favorites::toggle(&store, user, id).await;
    store.pool().close().await;
    let outcome = outcome?;
    println!("isFavorite: {}", outcome.is_favorite);
    Ok(())
}
