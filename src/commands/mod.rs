pub mod export;
pub mod init;
pub mod program;
pub mod report;
pub mod reservation;
pub mod room;
pub mod serve;
pub mod user;

use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use retreat::db::Database;
use retreat::models::ReservationStatus;

pub use retreat::reports::fmt_money;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open an initialized database, bringing its schema up to date.
pub fn open_db(db_path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    if !db_path.exists() {
        return Err(format!(
            "no database at {}; run `retreat init` first",
            db_path.display()
        )
        .into());
    }
    let db = Database::open(db_path)?;
    db.migrate()?;
    Ok(db)
}

/// Format a reservation status as a colored string.
pub fn format_status(s: ReservationStatus) -> String {
    match s {
        ReservationStatus::Draft => "draft".yellow().to_string(),
        ReservationStatus::Confirmed => "confirmed".green().to_string(),
        ReservationStatus::Completed => "completed".bright_black().to_string(),
        ReservationStatus::Cancelled => "cancelled".red().to_string(),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a table, or `empty` when there are none.
pub fn print_table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if rows.is_empty() {
        println!("{empty}");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

pub fn heading(text: &str) {
    println!("{}", text.bold());
}
