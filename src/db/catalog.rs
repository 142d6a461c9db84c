use rusqlite::{OptionalExtension, Row, params};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Program, Room, ServiceType};

impl Database {
    // -- Programs --

    pub fn insert_program(
        &self,
        name: &str,
        category: ServiceType,
        instructor: Option<&str>,
        unit_price: i64,
    ) -> Result<Program> {
        self.conn()
            .execute(
                "INSERT INTO programs (name, category, instructor, unit_price, active)
                 VALUES (?1, ?2, ?3, ?4, 1)",
                params![name, category, instructor, unit_price],
            )
            .map_err(|e| unique_conflict(e, "program", name))?;
        Ok(Program {
            id: self.conn().last_insert_rowid(),
            name: name.to_string(),
            category,
            instructor: instructor.map(|s| s.to_string()),
            unit_price,
            active: true,
        })
    }

    pub fn get_program(&self, id: i64) -> Result<Option<Program>> {
        let program = self
            .conn()
            .query_row(
                "SELECT id, name, category, instructor, unit_price, active FROM programs WHERE id = ?1",
                params![id],
                row_to_program,
            )
            .optional()?;
        Ok(program)
    }

    pub fn list_programs(&self, include_inactive: bool) -> Result<Vec<Program>> {
        let sql = if include_inactive {
            "SELECT id, name, category, instructor, unit_price, active FROM programs ORDER BY name ASC"
        } else {
            "SELECT id, name, category, instructor, unit_price, active FROM programs
             WHERE active = 1 ORDER BY name ASC"
        };
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map([], row_to_program)?;
        let mut programs = Vec::new();
        for row in rows {
            programs.push(row?);
        }
        Ok(programs)
    }

    pub fn set_program_active(&self, id: i64, active: bool) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE programs SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("program", id));
        }
        Ok(())
    }

    // -- Rooms --

    pub fn insert_room(&self, name: &str, capacity: u32, nightly_rate: i64) -> Result<Room> {
        self.conn()
            .execute(
                "INSERT INTO rooms (name, capacity, nightly_rate, active) VALUES (?1, ?2, ?3, 1)",
                params![name, capacity, nightly_rate],
            )
            .map_err(|e| unique_conflict(e, "room", name))?;
        Ok(Room {
            id: self.conn().last_insert_rowid(),
            name: name.to_string(),
            capacity,
            nightly_rate,
            active: true,
        })
    }

    pub fn get_room(&self, id: i64) -> Result<Option<Room>> {
        let room = self
            .conn()
            .query_row(
                "SELECT id, name, capacity, nightly_rate, active FROM rooms WHERE id = ?1",
                params![id],
                row_to_room,
            )
            .optional()?;
        Ok(room)
    }

    pub fn list_rooms(&self, include_inactive: bool) -> Result<Vec<Room>> {
        let sql = if include_inactive {
            "SELECT id, name, capacity, nightly_rate, active FROM rooms ORDER BY name ASC"
        } else {
            "SELECT id, name, capacity, nightly_rate, active FROM rooms WHERE active = 1 ORDER BY name ASC"
        };
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map([], row_to_room)?;
        let mut rooms = Vec::new();
        for row in rows {
            rooms.push(row?);
        }
        Ok(rooms)
    }

    pub fn set_room_active(&self, id: i64, active: bool) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE rooms SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("room", id));
        }
        Ok(())
    }
}

/// Turn a UNIQUE violation into a `Conflict`; pass other errors through.
pub(super) fn unique_conflict(err: rusqlite::Error, what: &str, name: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::Conflict(format!("{what} already exists: {name}"))
        }
        _ => Error::Database(err),
    }
}

fn row_to_program(row: &Row) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        instructor: row.get(3)?,
        unit_price: row.get(4)?,
        active: row.get(5)?,
    })
}

fn row_to_room(row: &Row) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        capacity: row.get(2)?,
        nightly_rate: row.get(3)?,
        active: row.get(4)?,
    })
}
