//! Programs and rooms offered by the facility.

use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Program, Room, ServiceType};

pub fn add_program(
    db: &Database,
    name: &str,
    category: ServiceType,
    instructor: Option<&str>,
    unit_price: i64,
) -> Result<Program> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("program name is required"));
    }
    if unit_price < 0 {
        return Err(Error::validation("unit price cannot be negative"));
    }
    let instructor = instructor.map(str::trim).filter(|s| !s.is_empty());
    let program = db.insert_program(name, category, instructor, unit_price)?;
    info!(id = program.id, name, "program added");
    Ok(program)
}

pub fn add_room(db: &Database, name: &str, capacity: u32, nightly_rate: i64) -> Result<Room> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("room name is required"));
    }
    if capacity == 0 {
        return Err(Error::validation("room capacity must be at least 1"));
    }
    if nightly_rate < 0 {
        return Err(Error::validation("nightly rate cannot be negative"));
    }
    let room = db.insert_room(name, capacity, nightly_rate)?;
    info!(id = room.id, name, "room added");
    Ok(room)
}

/// Stop or resume offering a program. Sessions already booked keep it.
pub fn set_program_active(db: &Database, id: i64, active: bool) -> Result<Program> {
    db.set_program_active(id, active)?;
    info!(id, active, "program availability changed");
    db.get_program(id)?
        .ok_or_else(|| Error::not_found("program", id))
}

/// Close or reopen a room for new assignments.
pub fn set_room_active(db: &Database, id: i64, active: bool) -> Result<Room> {
    db.set_room_active(id, active)?;
    info!(id, active, "room availability changed");
    db.get_room(id)?.ok_or_else(|| Error::not_found("room", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_validates_programs() {
        let db = Database::open_in_memory().unwrap();
        let p = add_program(&db, "  Yoga ", ServiceType::Healing, Some(" "), 15_000).unwrap();
        assert_eq!(p.name, "Yoga");
        assert_eq!(p.instructor, None);
        assert!(matches!(
            add_program(&db, "Yoga", ServiceType::Healing, None, 1),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            add_program(&db, "Tea", ServiceType::Healing, None, -1),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rooms_need_capacity() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            add_room(&db, "Cedar 101", 0, 90_000),
            Err(Error::Validation(_))
        ));
        assert_eq!(add_room(&db, "Cedar 101", 4, 90_000).unwrap().capacity, 4);
    }

    #[test]
    fn retired_entries_leave_the_default_lists() {
        let db = Database::open_in_memory().unwrap();
        let p = add_program(&db, "Yoga", ServiceType::Healing, None, 0).unwrap();
        let r = add_room(&db, "Cedar 101", 4, 0).unwrap();

        assert!(!set_program_active(&db, p.id, false).unwrap().active);
        assert!(!set_room_active(&db, r.id, false).unwrap().active);
        assert!(db.list_programs(false).unwrap().is_empty());
        assert_eq!(db.list_rooms(true).unwrap().len(), 1);

        assert!(set_room_active(&db, r.id, true).unwrap().active);
        assert!(matches!(
            set_program_active(&db, 999, true),
            Err(Error::NotFound(_))
        ));
    }
}
