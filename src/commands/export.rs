use chrono::NaiveDate;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{CmdResult, open_db};
use retreat::db::ReservationFilter;
use retreat::export;
use retreat::reports;

/// What to export.
pub enum Target {
    Reservations { all: bool },
    YearMonth { from: NaiveDate, to: NaiveDate },
    Programs { from: NaiveDate, to: NaiveDate },
    Plan { id: String },
}

/// Write the CSV to `output`, or stdout when no file is given.
pub fn run(db_path: &Path, target: Target, output: Option<PathBuf>) -> CmdResult {
    let db = open_db(db_path)?;
    let out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    let mut out = match target {
        Target::Reservations { all } => {
            let filter = ReservationFilter {
                include_cancelled: all,
                ..ReservationFilter::default()
            };
            export::write_reservations(&db, &filter, out)?
        }
        Target::YearMonth { from, to } => {
            let report = reports::year_month_result(&db, from, to)?;
            export::write_year_month(&report, out)?
        }
        Target::Programs { from, to } => {
            let list = reports::program_list(&db, from, to)?;
            export::write_program_list(&list, out)?
        }
        Target::Plan { id } => {
            let plan = retreat::schedule::implementation_plan(&db, &id)?;
            export::write_plan(&plan, out)?
        }
    };
    out.flush()?;

    if let Some(path) = output {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
