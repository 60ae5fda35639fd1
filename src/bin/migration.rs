//! Schema management CLI.
//!
//! Reads the database URL from `APP__DATABASE_URL` (or `--database-url`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use news_cms_api::config::init_tracing;
use news_cms_api::db::{establish_connection, DbConfig};
use news_cms_api::migrator::Migrator;

#[derive(Parser)]
#[command(name = "migration", about = "Apply or roll back news-cms-api schema migrations")]
struct Cli {
    #[arg(long, env = "APP__DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations
    Up {
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations (one by default)
    Down {
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and reapply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", false);
    let cli = Cli::parse();

    let db = establish_connection(&DbConfig {
        url: cli.database_url,
        max_connections: 1,
        ..Default::default()
    })
    .await
    .context("failed to connect to database")?;

    match cli.command {
        Command::Up { steps } => {
            Migrator::up(&db, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        Command::Status => Migrator::status(&db).await?,
        Command::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Schema recreated");
        }
    }

    Ok(())
}
