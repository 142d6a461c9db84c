use std::path::Path;
use tabled::Tabled;

use super::{CmdResult, fmt_money, open_db, print_json, print_table};
use retreat::catalog;

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CAPACITY")]
    capacity: u32,
    #[tabled(rename = "NIGHTLY RATE")]
    rate: String,
    #[tabled(rename = "ACTIVE")]
    active: &'static str,
}

pub fn add(db_path: &Path, name: &str, capacity: u32, rate: i64, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let room = catalog::add_room(&db, name, capacity, rate)?;
    if json {
        return print_json(&room);
    }
    println!("Added room #{} {} (sleeps {})", room.id, room.name, room.capacity);
    Ok(())
}

pub fn list(db_path: &Path, all: bool, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let rooms = db.list_rooms(all)?;
    if json {
        return print_json(&rooms);
    }
    let rows = rooms
        .into_iter()
        .map(|r| RoomRow {
            id: r.id,
            name: r.name,
            capacity: r.capacity,
            rate: fmt_money(r.nightly_rate),
            active: if r.active { "yes" } else { "no" },
        })
        .collect();
    print_table(rows, "No rooms found.");
    Ok(())
}

pub fn set_active(db_path: &Path, id: i64, active: bool, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let room = catalog::set_room_active(&db, id, active)?;
    if json {
        return print_json(&room);
    }
    let state = if active { "reopened" } else { "closed" };
    println!("Room #{} {} {state}", room.id, room.name);
    Ok(())
}
