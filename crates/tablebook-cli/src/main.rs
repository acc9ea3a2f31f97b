use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tablebook_cli::commands::book::{exit_code_for, handle_book, BookArgs};
use tablebook_cli::commands::init::handle_init;
use tablebook_cli::commands::list::{build_filter, handle_list};
use tablebook_cli::output::OutputFormat;
use tablebook_lib::{default_database_path, TableNumber};

#[derive(Parser, Debug)]
#[command(author, version, about = "Table reservation booking utilities")]
struct Cli {
    /// Path to the reservation database (defaults to the per-user data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema, optionally importing tables from a JSON fixture.
    Init {
        /// JSON file holding `[{"number": 1, "places": 4}, ...]` or `{"tables": [...]}`.
        #[arg(long)]
        tables: Option<PathBuf>,
    },
    /// Book a table for a time slot and print the reservation id.
    Book {
        /// Table number.
        #[arg(long)]
        table: i64,
        /// Date, YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// Slot start, HH:MM.
        #[arg(long)]
        start: String,
        /// Slot end (exclusive), HH:MM.
        #[arg(long)]
        end: String,
        /// Client name.
        #[arg(long)]
        name: String,
        /// Client phone number.
        #[arg(long)]
        phone: String,
        /// Key that makes retries of this booking return the same reservation.
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// List reservations sorted by table, start time and date.
    List {
        /// Only this table.
        #[arg(long)]
        table: Option<TableNumber>,
        /// Only this date, YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => default_database_path()
            .context("could not determine a data directory; pass --db")?,
    };

    match cli.command {
        Command::Init { tables } => {
            let report = handle_init(&db_path, tables.as_deref())?;
            println!(
                "Database ready at {} ({} table(s) in catalog, {} imported)",
                db_path.display(),
                report.total,
                report.imported
            );
        }
        Command::Book {
            table,
            date,
            start,
            end,
            name,
            phone,
            idempotency_key,
        } => {
            let args = BookArgs {
                table,
                date,
                start,
                end,
                name,
                phone,
                idempotency_key,
            };
            let id = handle_book(&db_path, &args)?;
            println!("{id}");
        }
        Command::List {
            table,
            date,
            format,
        } => {
            let filter = build_filter(table, date.as_deref())?;
            let stdout = io::stdout();
            handle_list(&mut stdout.lock(), &db_path, &filter, format)?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
