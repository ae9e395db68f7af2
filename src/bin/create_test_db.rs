use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use expense_tracker::{Amount, IdempotencyKey, NewExpense, create_expense_and_key, initialize_db};

/// A utility for creating a test database for expense_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const SAMPLE_EXPENSES: [(&str, &str, &str, i64); 6] = [
    ("12.50", "Food", "Lunch", 0),
    ("4.20", "Transport", "Bus fare", 1),
    ("89.99", "Utilities", "Power bill", 3),
    ("23.00", "Food", "Groceries", 5),
    ("15.00", "Entertainment", "", 8),
    ("0.10", "Food", "Gum", 8),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample expenses...");

    let today: Date = OffsetDateTime::now_utc().date();

    for (index, (amount, category, description, days_ago)) in SAMPLE_EXPENSES.iter().enumerate() {
        let new_expense = NewExpense::new(
            Amount::parse(amount)?,
            category,
            description,
            today - Duration::days(*days_ago),
        )?;
        let key = IdempotencyKey::new(&format!("seed-{index}"))?;

        create_expense_and_key(new_expense, &key, &conn)?;
    }

    println!("Success!");

    Ok(())
}
