use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shore_server::db::repositories::HotspotRepository;
use shore_server::db::Database;

/// Tables reported by `check`, in schema order
const TABLES: [&str; 9] = [
    "users",
    "events",
    "event_attendees",
    "posts",
    "post_likes",
    "comments",
    "user_follows",
    "debris_hotspots",
    "sessions",
];

/// Shore Connect database utility
///
/// Creates the schema, loads the debris hotspot survey data and reports on
/// what a database file contains.
#[derive(Parser, Debug)]
#[command(name = "shore-migrate")]
#[command(about = "Initialize and inspect the Shore Connect database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "./shore.db", env = "DATABASE_PATH")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create all tables and indexes (safe to re-run)
    Init {
        /// Skip loading the debris hotspot seed data
        #[arg(long)]
        no_seed: bool,
    },
    /// Print row counts per table and the known hotspots
    Check,
}

fn connect_database(path: &str) -> Result<Database> {
    println!("Connecting to database: {}", path);
    Database::new(path).with_context(|| format!("Failed to open database at {}", path))
}

fn run_init(db: &Database, seed: bool) -> Result<()> {
    db.initialize()?;
    println!("Schema created");

    if seed {
        db.seed_hotspots()?;
        println!(
            "Debris hotspots seeded ({} rows)",
            db.count_rows("debris_hotspots")?
        );
    }

    println!("Database initialized successfully!");
    Ok(())
}

fn run_check(db: &Database) -> Result<()> {
    println!();
    println!("Table Summary");
    println!("=============");
    for table in TABLES {
        let count = db
            .count_rows(table)
            .with_context(|| format!("Table '{}' is missing - run `shore-migrate init`", table))?;
        println!("  {:<16} {}", table, count);
    }

    let hotspots = HotspotRepository::new(db.pool.clone()).list_all()?;
    println!();
    println!("Debris Hotspots");
    println!("===============");
    if hotspots.is_empty() {
        println!("  (none)");
    }
    for hotspot in hotspots {
        println!(
            "  {:<12} {:<32} score {:>4.1}  ({:.4}, {:.4})",
            hotspot.id, hotspot.location, hotspot.debris_score, hotspot.lat, hotspot.lon
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Shore Connect Database Utility");
    println!("==============================");
    println!();

    let db = connect_database(&args.database)?;

    match args.command {
        Command::Init { no_seed } => run_init(&db, !no_seed),
        Command::Check => run_check(&db),
    }
}
