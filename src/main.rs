use anyhow::Context;
use clap::{Parser, Subcommand};
use hi_academy::catalog::Catalog;
use hi_academy::config::Config;
use hi_academy::{logging, seed, server, storage};
use tracing::{error, info, Instrument};

#[derive(Parser)]
#[command(name = "hi_academy")]
#[command(about = "Hi Academy course catalog, enrollment and back office")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or update the database schema
    Migrate,
    /// Insert the sample categories, instructors, courses and lessons
    Seed,
    /// Delete every row from the database
    ClearDatabase {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    let _guard = logging::init_logging(&config.logging.directory);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let span = tracing::info_span!("serve", address = %config.bind_address());
            let storage = storage::open_storage(&config.storage).await?;
            if let Err(e) = server::start_server(storage, config).instrument(span).await {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        Commands::Migrate => {
            migrate(&config).await?;
        }
        Commands::Seed => {
            println!("🌱 Seeding sample data...");
            let storage = storage::open_storage(&config.storage).await?;
            let catalog = Catalog::new(storage, config.storage.upload_root.clone());
            let summary = seed::seed(&catalog).await?;

            info!(?summary, "Seed finished");
            println!("   Categories:  {}", summary.categories);
            println!("   Instructors: {}", summary.instructors);
            println!("   Courses:     {}", summary.courses);
            println!("   Lessons:     {}", summary.lessons);
            println!("✅ Seeding completed");
        }
        Commands::ClearDatabase { yes } => {
            clear_database(&config, yes).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "db")]
async fn migrate(config: &Config) -> anyhow::Result<()> {
    let db = hi_academy::db::DatabaseManager::open(&config.storage.database_path).await?;
    db.run_migrations().await?;
    println!("✅ Schema is up to date at {}", db.path().display());
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn migrate(_config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("Built without the `db` feature; rebuild with `--features db` to use a database")
}

#[cfg(feature = "db")]
async fn clear_database(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!("⚠️  WARNING: This will delete ALL data from the database!");
        println!("Press Enter to continue or Ctrl+C to cancel...");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
    }

    println!("🗑️  Clearing database...");
    let db = hi_academy::db::DatabaseManager::open(&config.storage.database_path).await?;
    db.clear_all_data().await?;
    println!("✅ Database cleared successfully!");
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn clear_database(_config: &Config, _yes: bool) -> anyhow::Result<()> {
    anyhow::bail!("Built without the `db` feature; there is no database to clear")
}
