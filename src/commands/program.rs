use std::path::Path;
use tabled::Tabled;

use super::{CmdResult, fmt_money, open_db, print_json, print_table};
use retreat::catalog;
use retreat::models::ServiceType;

#[derive(Tabled)]
struct ProgramRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: &'static str,
    #[tabled(rename = "INSTRUCTOR")]
    instructor: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "ACTIVE")]
    active: &'static str,
}

pub fn add(
    db_path: &Path,
    name: &str,
    category: &str,
    instructor: Option<&str>,
    price: i64,
    json: bool,
) -> CmdResult {
    let db = open_db(db_path)?;
    let category = ServiceType::from_str(category)?;
    let program = catalog::add_program(&db, name, category, instructor, price)?;
    if json {
        return print_json(&program);
    }
    println!("Added program #{} {}", program.id, program.name);
    Ok(())
}

pub fn list(db_path: &Path, all: bool, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let programs = db.list_programs(all)?;
    if json {
        return print_json(&programs);
    }
    let rows = programs
        .into_iter()
        .map(|p| ProgramRow {
            id: p.id,
            name: p.name,
            category: p.category.label(),
            instructor: p.instructor.unwrap_or_default(),
            price: fmt_money(p.unit_price),
            active: if p.active { "yes" } else { "no" },
        })
        .collect();
    print_table(rows, "No programs found.");
    Ok(())
}

pub fn set_active(db_path: &Path, id: i64, active: bool, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let program = catalog::set_program_active(&db, id, active)?;
    if json {
        return print_json(&program);
    }
    let state = if active { "offered again" } else { "retired" };
    println!("Program #{} {} {state}", program.id, program.name);
    Ok(())
}
