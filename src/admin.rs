//! Maintenance commands: per-category counts and clear.

use anyhow::Result;

use crate::config::Config;
use crate::migrate;
use crate::models::Category;
use crate::store::Store;

/// Prints the number of stored records per category.
pub async fn run_status(config: &Config) -> Result<()> {
    let store = Store::connect(config).await?;
    migrate::run_migrations(store.pool()).await?;

    println!("{:<10} RECORDS", "CATEGORY");
    for category in Category::ALL {
        let count = store.count(category).await?;
        println!("{:<10} {}", category.label(), count);
    }

    store.close().await;
    Ok(())
}

/// Removes stored records (one category, or all of them) and reports the
/// count removed per category.
pub async fn run_clear(config: &Config, category: Option<Category>) -> Result<()> {
    let store = Store::connect(config).await?;
    migrate::run_migrations(store.pool()).await?;

    let targets: Vec<Category> = match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };

    for category in targets {
        let removed = store.clear(category).await?;
        println!("cleared {:<10} {} records", category.label(), removed);
    }

    store.close().await;
    Ok(())
}
