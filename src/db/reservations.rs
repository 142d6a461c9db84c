use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, Row, params};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{
    ExpenseLine, IntakeStage, MealOrder, ParticipantCount, ProgramSession, Reservation,
    ReservationStatus, RoomAssignment,
};

const RESERVATION_COLUMNS: &str = "id, group_name, contact_name, contact_phone, contact_email, region, \
     business_category, service_type, start_date, end_date, status, stage, discount_percent, \
     total_cost, notes, created_at, updated_at";

/// Filters for listing reservations. Dates bound the arrival day, inclusive.
#[derive(Debug, Default, Clone)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_cancelled: bool,
}

impl ReservationFilter {
    /// Everything that actually happened (or will) within a date range.
    pub fn active_between(from: NaiveDate, to: NaiveDate) -> Self {
        ReservationFilter {
            status: None,
            from: Some(from),
            to: Some(to),
            include_cancelled: false,
        }
    }
}

impl Database {
    // -- Reservations --

    pub fn insert_reservation(&self, r: &Reservation) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO reservations ({RESERVATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            ),
            params![
                r.id,
                r.group_name,
                r.contact_name,
                r.contact_phone,
                r.contact_email,
                r.region,
                r.business_category,
                r.service_type,
                r.start_date,
                r.end_date,
                r.status,
                r.stage,
                r.discount_percent,
                r.total_cost,
                r.notes,
                r.created_at,
                r.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_reservation(&self, id: &str) -> Result<Option<Reservation>> {
        let reservation = self
            .conn()
            .query_row(
                &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
                params![id],
                row_to_reservation,
            )
            .optional()?;
        Ok(reservation)
    }

    /// Fetch a reservation or fail with `NotFound`.
    pub fn require_reservation(&self, id: &str) -> Result<Reservation> {
        self.get_reservation(id)?
            .ok_or_else(|| Error::not_found("reservation", id))
    }

    pub fn list_reservations(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
        let mut sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            param_values.push(Box::new(status));
            sql.push_str(&format!(" AND status = ?{}", param_values.len()));
        } else if !filter.include_cancelled {
            param_values.push(Box::new(ReservationStatus::Cancelled));
            sql.push_str(&format!(" AND status != ?{}", param_values.len()));
        }

        if let Some(from) = filter.from {
            param_values.push(Box::new(from));
            sql.push_str(&format!(" AND start_date >= ?{}", param_values.len()));
        }

        if let Some(to) = filter.to {
            param_values.push(Box::new(to));
            sql.push_str(&format!(" AND start_date <= ?{}", param_values.len()));
        }

        sql.push_str(" ORDER BY start_date ASC, created_at ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_ref.as_slice(), row_to_reservation)?;

        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// Overwrite the group information captured on the first intake page.
    pub fn update_group_info(&self, r: &Reservation) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE reservations SET group_name = ?1, contact_name = ?2, contact_phone = ?3,
                contact_email = ?4, region = ?5, business_category = ?6, service_type = ?7,
                start_date = ?8, end_date = ?9, notes = ?10, updated_at = ?11
             WHERE id = ?12",
            params![
                r.group_name,
                r.contact_name,
                r.contact_phone,
                r.contact_email,
                r.region,
                r.business_category,
                r.service_type,
                r.start_date,
                r.end_date,
                r.notes,
                Utc::now(),
                r.id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("reservation", &r.id));
        }
        Ok(())
    }

    pub fn set_status(&self, id: &str, status: ReservationStatus) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("reservation", id));
        }
        Ok(())
    }

    pub fn set_stage(&self, id: &str, stage: IntakeStage) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE reservations SET stage = ?1, updated_at = ?2 WHERE id = ?3",
            params![stage, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("reservation", id));
        }
        Ok(())
    }

    /// Record the final discount and grand total.
    pub fn set_pricing(&self, id: &str, discount_percent: u8, total_cost: Option<i64>) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE reservations SET discount_percent = ?1, total_cost = ?2, updated_at = ?3
             WHERE id = ?4",
            params![discount_percent, total_cost, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("reservation", id));
        }
        Ok(())
    }

    /// Delete a reservation and, through cascades, everything attached to it.
    pub fn delete_reservation(&self, id: &str) -> Result<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM reservations WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::not_found("reservation", id));
        }
        Ok(())
    }

    fn touch(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE reservations SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        Ok(())
    }

    // -- Participants --

    pub fn replace_participants(&self, reservation_id: &str, rows: &[ParticipantCount]) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM participant_counts WHERE reservation_id = ?1",
            params![reservation_id],
        )?;
        for p in rows {
            tx.execute(
                "INSERT INTO participant_counts (reservation_id, participant_type, age_group, male, female)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![reservation_id, p.participant_type, p.age_group, p.male, p.female],
            )?;
        }
        tx.commit()?;
        self.touch(reservation_id)
    }

    pub fn participants(&self, reservation_id: &str) -> Result<Vec<ParticipantCount>> {
        let mut stmt = self.conn().prepare(
            "SELECT participant_type, age_group, male, female FROM participant_counts
             WHERE reservation_id = ?1 ORDER BY participant_type, age_group",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok(ParticipantCount {
                participant_type: row.get(0)?,
                age_group: row.get(1)?,
                male: row.get(2)?,
                female: row.get(3)?,
            })
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    // -- Program sessions --

    /// Replace the scheduled sessions and return them with their new ids.
    pub fn replace_program_sessions(
        &self,
        reservation_id: &str,
        sessions: &[ProgramSession],
    ) -> Result<Vec<ProgramSession>> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM program_sessions WHERE reservation_id = ?1",
            params![reservation_id],
        )?;
        let mut stored = Vec::with_capacity(sessions.len());
        for s in sessions {
            tx.execute(
                "INSERT INTO program_sessions
                    (reservation_id, program_id, date, start_time, end_time, place, participants)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reservation_id,
                    s.program_id,
                    s.date,
                    s.start_time,
                    s.end_time,
                    s.place,
                    s.participants
                ],
            )?;
            stored.push(ProgramSession {
                id: tx.last_insert_rowid(),
                reservation_id: reservation_id.to_string(),
                ..s.clone()
            });
        }
        tx.commit()?;
        self.touch(reservation_id)?;
        Ok(stored)
    }

    pub fn program_sessions(&self, reservation_id: &str) -> Result<Vec<ProgramSession>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, program_id, date, start_time, end_time, place, participants
             FROM program_sessions WHERE reservation_id = ?1
             ORDER BY date ASC, start_time ASC",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok(ProgramSession {
                id: row.get(0)?,
                reservation_id: row.get(1)?,
                program_id: row.get(2)?,
                date: row.get(3)?,
                start_time: row.get(4)?,
                end_time: row.get(5)?,
                place: row.get(6)?,
                participants: row.get(7)?,
            })
        })?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    // -- Lodging: rooms and meals --

    /// Replace room assignments and meal orders together.
    pub fn replace_lodging(
        &self,
        reservation_id: &str,
        rooms: &[RoomAssignment],
        meals: &[MealOrder],
    ) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM room_assignments WHERE reservation_id = ?1",
            params![reservation_id],
        )?;
        tx.execute(
            "DELETE FROM meal_orders WHERE reservation_id = ?1",
            params![reservation_id],
        )?;
        for a in rooms {
            tx.execute(
                "INSERT INTO room_assignments (reservation_id, room_id, check_in, check_out, occupants)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![reservation_id, a.room_id, a.check_in, a.check_out, a.occupants],
            )?;
        }
        for m in meals {
            tx.execute(
                "INSERT INTO meal_orders (reservation_id, date, meal_type, headcount, unit_price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![reservation_id, m.date, m.meal_type, m.headcount, m.unit_price],
            )?;
        }
        tx.commit()?;
        self.touch(reservation_id)
    }

    pub fn room_assignments(&self, reservation_id: &str) -> Result<Vec<RoomAssignment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, room_id, check_in, check_out, occupants
             FROM room_assignments WHERE reservation_id = ?1
             ORDER BY room_id ASC, check_in ASC",
        )?;
        let rows = stmt.query_map(params![reservation_id], row_to_assignment)?;
        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row?);
        }
        Ok(assignments)
    }

    /// Assignments of `room_id` held by other, non-cancelled reservations
    /// whose nights intersect `[check_in, check_out)`.
    pub fn conflicting_assignments(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_reservation: &str,
    ) -> Result<Vec<RoomAssignment>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.reservation_id, a.room_id, a.check_in, a.check_out, a.occupants
             FROM room_assignments a
             JOIN reservations r ON r.id = a.reservation_id
             WHERE a.room_id = ?1
               AND a.check_in < ?3
               AND ?2 < a.check_out
               AND a.reservation_id != ?4
               AND r.status != 'cancelled'
             ORDER BY a.check_in ASC",
        )?;
        let rows = stmt.query_map(
            params![room_id, check_in, check_out, exclude_reservation],
            row_to_assignment,
        )?;
        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row?);
        }
        Ok(assignments)
    }

    pub fn meal_orders(&self, reservation_id: &str) -> Result<Vec<MealOrder>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, date, meal_type, headcount, unit_price
             FROM meal_orders WHERE reservation_id = ?1
             ORDER BY date ASC, CASE meal_type
                 WHEN 'breakfast' THEN 0 WHEN 'lunch' THEN 1 ELSE 2 END",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok(MealOrder {
                id: row.get(0)?,
                reservation_id: row.get(1)?,
                date: row.get(2)?,
                meal_type: row.get(3)?,
                headcount: row.get(4)?,
                unit_price: row.get(5)?,
            })
        })?;
        let mut meals = Vec::new();
        for row in rows {
            meals.push(row?);
        }
        Ok(meals)
    }

    // -- Extra expenses --

    pub fn replace_expenses(&self, reservation_id: &str, lines: &[ExpenseLine]) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM expense_lines WHERE reservation_id = ?1",
            params![reservation_id],
        )?;
        for line in lines {
            tx.execute(
                "INSERT INTO expense_lines (reservation_id, description, amount) VALUES (?1, ?2, ?3)",
                params![reservation_id, line.description, line.amount],
            )?;
        }
        tx.commit()?;
        self.touch(reservation_id)
    }

    pub fn expenses(&self, reservation_id: &str) -> Result<Vec<ExpenseLine>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, description, amount FROM expense_lines
             WHERE reservation_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok(ExpenseLine {
                id: row.get(0)?,
                reservation_id: row.get(1)?,
                description: row.get(2)?,
                amount: row.get(3)?,
            })
        })?;
        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }
}

fn row_to_reservation(row: &Row) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        group_name: row.get(1)?,
        contact_name: row.get(2)?,
        contact_phone: row.get(3)?,
        contact_email: row.get(4)?,
        region: row.get(5)?,
        business_category: row.get(6)?,
        service_type: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        status: row.get(10)?,
        stage: row.get(11)?,
        discount_percent: row.get(12)?,
        total_cost: row.get(13)?,
        notes: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn row_to_assignment(row: &Row) -> rusqlite::Result<RoomAssignment> {
    Ok(RoomAssignment {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        room_id: row.get(2)?,
        check_in: row.get(3)?,
        check_out: row.get(4)?,
        occupants: row.get(5)?,
    })
}
