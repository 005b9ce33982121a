//! `animelog migrate`

use anyhow::{Context, Result};
use clap::Args;

use animelog_server::db::{create_pool, migrations};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Drop legacy unique indexes on mal_id alone and print the resulting indexes
    #[arg(long)]
    pub repair_indexes: bool,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let url = match args.database_url {
        Some(url) => url,
        None => crate::config::load(None)?.database.url,
    };

    let pool = create_pool(&url)
        .await
        .context("Failed to connect to database")?;

    if !args.repair_indexes {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
        println!("✓ Schema is up to date");
        return Ok(());
    }

    let report = migrations::repair_indexes(&pool)
        .await
        .context("Failed to repair indexes")?;

    if report.dropped.is_empty() {
        println!("✓ No legacy indexes found");
    } else {
        for name in &report.dropped {
            println!("✗ Dropped {}", name);
        }
    }

    println!("\nCurrent indexes:");
    for index in &report.indexes {
        println!("  {}.{}: {}", index.table_name, index.index_name, index.definition);
    }

    Ok(())
}
