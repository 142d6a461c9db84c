use std::path::Path;

use super::CmdResult;
use retreat::db::Database;

pub fn run(db_path: &Path, prefix: &str) -> CmdResult {
    let prefix = prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("prefix must be non-empty and alphanumeric, got '{prefix}'").into());
    }
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(db_path)?;
    db.migrate()?;
    db.set_config("prefix", prefix)?;
    db.set_config("version", env!("CARGO_PKG_VERSION"))?;

    println!("Initialized retreat database at {}", db_path.display());
    println!("Reservation prefix: {prefix}");
    println!("Next: `retreat user add <name> --role admin` to create the first login");
    Ok(())
}
