//! Reservation intake, one page at a time.
//!
//! Page1 captures group information and creates a draft. Pages 2 to 4 fill in
//! participants, programs, and rooms with meals. The final page prices
//! everything and confirms the booking. A page can only be submitted once
//! every earlier page has been, and `Reservation::stage` records the furthest
//! page completed.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    BusinessCategory, ExpenseLine, IntakeStage, MealOrder, MealType, ParticipantCount,
    ProgramSession, Reservation, ReservationStatus, RoomAssignment, ServiceType,
};

pub mod cost;

pub use cost::{CostBreakdown, CostCategory, CostLine, breakdown_for};

/// Largest head count one reservation can carry.
pub const MAX_GROUP_SIZE: u32 = 100_000;

/// Page1: who is coming and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_name: String,
    pub contact_name: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub business_category: BusinessCategory,
    pub service_type: ServiceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Page3: one scheduled program slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInput {
    pub program_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub place: Option<String>,
    pub participants: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInput {
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupants: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealInput {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub headcount: u32,
}

/// Page4: rooms and meals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LodgingInput {
    #[serde(default)]
    pub rooms: Vec<RoomInput>,
    #[serde(default)]
    pub meals: Vec<MealInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub description: String,
    pub amount: i64,
}

/// Final page: extra charges and discount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalInput {
    #[serde(default)]
    pub discount_percent: u8,
    #[serde(default)]
    pub expenses: Vec<ExpenseInput>,
}

/// Page1. Creates a draft when `id` is `None`, otherwise updates the group
/// information of an existing, still editable reservation.
pub fn submit_group_info(db: &Database, id: Option<&str>, info: GroupInfo) -> Result<Reservation> {
    validate_group_info(&info)?;

    let Some(id) = id else {
        let now = Utc::now();
        let reservation = Reservation {
            id: db.generate_id()?,
            group_name: info.group_name.trim().to_string(),
            contact_name: info.contact_name.trim().to_string(),
            contact_phone: non_empty(info.contact_phone),
            contact_email: non_empty(info.contact_email),
            region: non_empty(info.region),
            business_category: info.business_category,
            service_type: info.service_type,
            start_date: info.start_date,
            end_date: info.end_date,
            status: ReservationStatus::Draft,
            stage: IntakeStage::Page1,
            discount_percent: 0,
            total_cost: None,
            notes: non_empty(info.notes),
            created_at: now,
            updated_at: now,
        };
        db.insert_reservation(&reservation)?;
        info!(id = %reservation.id, group = %reservation.group_name, "reservation drafted");
        return Ok(reservation);
    };

    let existing = editable(db, id)?;
    if info.start_date != existing.start_date || info.end_date != existing.end_date {
        ensure_children_within(db, id, info.start_date, info.end_date)?;
    }

    let updated = Reservation {
        group_name: info.group_name.trim().to_string(),
        contact_name: info.contact_name.trim().to_string(),
        contact_phone: non_empty(info.contact_phone),
        contact_email: non_empty(info.contact_email),
        region: non_empty(info.region),
        business_category: info.business_category,
        service_type: info.service_type,
        start_date: info.start_date,
        end_date: info.end_date,
        notes: non_empty(info.notes),
        ..existing
    };
    db.update_group_info(&updated)?;
    reprice_if_confirmed(db, id)
}

/// Page2: replace the participant breakdown.
pub fn submit_participants(db: &Database, id: &str, rows: Vec<ParticipantCount>) -> Result<Reservation> {
    let reservation = editable(db, id)?;
    require_stage(&reservation, IntakeStage::Page2)?;

    let mut seen = HashSet::new();
    for row in &rows {
        if !seen.insert((row.participant_type, row.age_group)) {
            return Err(Error::validation(format!(
                "duplicate participant row: {} / {}",
                row.participant_type, row.age_group
            )));
        }
    }
    let total = rows
        .iter()
        .try_fold(0u32, |acc, row| {
            row.male.checked_add(row.female).and_then(|n| acc.checked_add(n))
        })
        .filter(|total| *total <= MAX_GROUP_SIZE)
        .ok_or_else(|| {
            Error::validation(format!("a group can have at most {MAX_GROUP_SIZE} participants"))
        })?;
    if total == 0 {
        return Err(Error::validation("at least one participant is required"));
    }

    db.replace_participants(id, &rows)?;
    advance(db, &reservation, IntakeStage::Page2)?;
    reprice_if_confirmed(db, id)
}

/// Page3: replace the program schedule.
pub fn submit_programs(db: &Database, id: &str, inputs: Vec<SessionInput>) -> Result<Vec<ProgramSession>> {
    let reservation = editable(db, id)?;
    require_stage(&reservation, IntakeStage::Page3)?;
    let group_size = participant_total(db, id)?;

    let mut sessions: Vec<ProgramSession> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let program = db
            .get_program(input.program_id)?
            .ok_or_else(|| Error::not_found("program", input.program_id))?;
        if !program.active {
            return Err(Error::validation(format!(
                "program is no longer offered: {}",
                program.name
            )));
        }
        if !reservation.covers(input.date) {
            return Err(Error::validation(format!(
                "{} on {} is outside the stay ({} to {})",
                program.name, input.date, reservation.start_date, reservation.end_date
            )));
        }
        if input.end_time <= input.start_time {
            return Err(Error::validation(format!(
                "{} must end after it starts",
                program.name
            )));
        }
        if input.participants == 0 || input.participants > group_size {
            return Err(Error::validation(format!(
                "{} participants must be between 1 and the group size ({group_size})",
                program.name
            )));
        }

        let session = ProgramSession {
            id: 0,
            reservation_id: id.to_string(),
            program_id: input.program_id,
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            place: non_empty(input.place),
            participants: input.participants,
        };
        if let Some(clash) = sessions.iter().find(|s| s.overlaps(&session)) {
            return Err(Error::Conflict(format!(
                "sessions overlap on {}: {}-{} and {}-{}",
                session.date,
                clash.start_time.format("%H:%M"),
                clash.end_time.format("%H:%M"),
                session.start_time.format("%H:%M"),
                session.end_time.format("%H:%M"),
            )));
        }
        sessions.push(session);
    }

    let stored = db.replace_program_sessions(id, &sessions)?;
    advance(db, &reservation, IntakeStage::Page3)?;
    reprice_if_confirmed(db, id)?;
    Ok(stored)
}

/// Page4: replace room assignments and meal orders.
pub fn submit_lodging(db: &Database, id: &str, input: LodgingInput) -> Result<Reservation> {
    let reservation = editable(db, id)?;
    require_stage(&reservation, IntakeStage::Page4)?;

    let mut assignments: Vec<RoomAssignment> = Vec::with_capacity(input.rooms.len());
    for room_input in &input.rooms {
        let room = db
            .get_room(room_input.room_id)?
            .ok_or_else(|| Error::not_found("room", room_input.room_id))?;
        if !room.active {
            return Err(Error::validation(format!("room is closed: {}", room.name)));
        }
        if room_input.check_out <= room_input.check_in {
            return Err(Error::validation(format!(
                "{}: check-out must be after check-in",
                room.name
            )));
        }
        if room_input.check_in < reservation.start_date || room_input.check_out > reservation.end_date {
            return Err(Error::validation(format!(
                "{}: nights {} to {} are outside the stay ({} to {})",
                room.name,
                room_input.check_in,
                room_input.check_out,
                reservation.start_date,
                reservation.end_date
            )));
        }
        if room_input.occupants == 0 || room_input.occupants > room.capacity {
            return Err(Error::validation(format!(
                "{}: occupants must be between 1 and {}",
                room.name, room.capacity
            )));
        }

        let assignment = RoomAssignment {
            id: 0,
            reservation_id: id.to_string(),
            room_id: room.id,
            check_in: room_input.check_in,
            check_out: room_input.check_out,
            occupants: room_input.occupants,
        };
        let double_booked_here = assignments
            .iter()
            .any(|a| a.room_id == room.id && a.overlaps(assignment.check_in, assignment.check_out));
        if double_booked_here {
            return Err(Error::Conflict(format!(
                "{} is assigned twice for overlapping nights",
                room.name
            )));
        }
        let clashes =
            db.conflicting_assignments(room.id, assignment.check_in, assignment.check_out, id)?;
        if let Some(clash) = clashes.first() {
            return Err(Error::Conflict(format!(
                "{} is already booked by {} from {} to {}",
                room.name, clash.reservation_id, clash.check_in, clash.check_out
            )));
        }
        assignments.push(assignment);
    }

    let mut prices: HashMap<MealType, i64> = HashMap::new();
    let mut meals: Vec<MealOrder> = Vec::with_capacity(input.meals.len());
    for meal in &input.meals {
        if !reservation.covers(meal.date) {
            return Err(Error::validation(format!(
                "{} on {} is outside the stay",
                meal.meal_type.label(),
                meal.date
            )));
        }
        if meal.headcount == 0 {
            return Err(Error::validation(format!(
                "{} on {} needs a headcount",
                meal.meal_type.label(),
                meal.date
            )));
        }
        if meals
            .iter()
            .any(|m| m.date == meal.date && m.meal_type == meal.meal_type)
        {
            return Err(Error::validation(format!(
                "{} on {} is ordered twice",
                meal.meal_type.label(),
                meal.date
            )));
        }
        let unit_price = match prices.get(&meal.meal_type) {
            Some(price) => *price,
            None => {
                let price = db.meal_price(meal.meal_type)?;
                prices.insert(meal.meal_type, price);
                price
            }
        };
        meals.push(MealOrder {
            id: 0,
            reservation_id: id.to_string(),
            date: meal.date,
            meal_type: meal.meal_type,
            headcount: meal.headcount,
            unit_price,
        });
    }

    db.replace_lodging(id, &assignments, &meals)?;
    advance(db, &reservation, IntakeStage::Page4)?;
    reprice_if_confirmed(db, id)
}

/// Final page preview: price everything without confirming.
pub fn preview_cost(db: &Database, id: &str, discount_percent: Option<u8>) -> Result<CostBreakdown> {
    breakdown_for(db, id, discount_percent)
}

/// Final page: record extras and discount, price the booking and confirm it.
pub fn confirm(db: &Database, id: &str, input: FinalInput) -> Result<CostBreakdown> {
    let reservation = editable(db, id)?;
    require_stage(&reservation, IntakeStage::Final)?;

    let mut lines = Vec::with_capacity(input.expenses.len());
    for expense in input.expenses {
        let description = expense.description.trim().to_string();
        if description.is_empty() {
            return Err(Error::validation("expense description is required"));
        }
        if expense.amount < 0 {
            return Err(Error::validation(format!(
                "expense amount cannot be negative: {description}"
            )));
        }
        lines.push(ExpenseLine {
            id: 0,
            reservation_id: id.to_string(),
            description,
            amount: expense.amount,
        });
    }
    if input.discount_percent > 100 {
        return Err(Error::validation(format!(
            "discount must be between 0 and 100, got {}",
            input.discount_percent
        )));
    }

    db.replace_expenses(id, &lines)?;
    let breakdown = breakdown_for(db, id, Some(input.discount_percent))?;
    db.set_pricing(id, input.discount_percent, Some(breakdown.total))?;
    db.set_status(id, ReservationStatus::Confirmed)?;
    advance(db, &reservation, IntakeStage::Final)?;
    info!(id, total = breakdown.total, "reservation confirmed");
    Ok(breakdown)
}

/// Manual status change (cancel, complete, reopen).
pub fn change_status(db: &Database, id: &str, next: ReservationStatus) -> Result<Reservation> {
    let reservation = db.require_reservation(id)?;
    if reservation.status == next {
        return Ok(reservation);
    }
    if !reservation.status.can_transition_to(next) {
        return Err(Error::Conflict(format!(
            "cannot move reservation {id} from {} to {next}",
            reservation.status
        )));
    }
    db.set_status(id, next)?;
    if next == ReservationStatus::Draft {
        db.set_pricing(id, reservation.discount_percent, None)?;
    }
    info!(id, from = %reservation.status, to = %next, "reservation status changed");
    db.require_reservation(id)
}

/// Remove a reservation and everything attached to it. Only drafts and
/// cancelled bookings can be discarded; confirmed history stays.
pub fn discard(db: &Database, id: &str) -> Result<()> {
    let reservation = db.require_reservation(id)?;
    if !matches!(
        reservation.status,
        ReservationStatus::Draft | ReservationStatus::Cancelled
    ) {
        return Err(Error::Conflict(format!(
            "reservation {id} is {}; cancel it before deleting",
            reservation.status
        )));
    }
    db.delete_reservation(id)?;
    info!(id, "reservation deleted");
    Ok(())
}

/// Total head count from Page2.
pub fn participant_total(db: &Database, id: &str) -> Result<u32> {
    Ok(db.participants(id)?.iter().map(ParticipantCount::total).sum())
}

fn validate_group_info(info: &GroupInfo) -> Result<()> {
    if info.group_name.trim().is_empty() {
        return Err(Error::validation("group name is required"));
    }
    if info.contact_name.trim().is_empty() {
        return Err(Error::validation("contact name is required"));
    }
    if info.end_date < info.start_date {
        return Err(Error::validation(format!(
            "end date {} is before start date {}",
            info.end_date, info.start_date
        )));
    }
    if let Some(email) = info.contact_email.as_deref().map(str::trim) {
        if !email.is_empty() && !email.contains('@') {
            return Err(Error::validation(format!("invalid contact email: {email}")));
        }
    }
    Ok(())
}

fn editable(db: &Database, id: &str) -> Result<Reservation> {
    let reservation = db.require_reservation(id)?;
    if !reservation.status.is_editable() {
        return Err(Error::Conflict(format!(
            "reservation {id} is {} and can no longer be edited",
            reservation.status
        )));
    }
    Ok(reservation)
}

/// `page` may be submitted once the page before it is complete.
fn require_stage(reservation: &Reservation, page: IntakeStage) -> Result<()> {
    let position = IntakeStage::ALL
        .iter()
        .position(|s| *s == page)
        .unwrap_or_default();
    if position == 0 {
        return Ok(());
    }
    let previous = IntakeStage::ALL[position - 1];
    if reservation.stage < previous {
        return Err(Error::Conflict(format!(
            "complete {} ({}) before {}",
            previous,
            previous.label(),
            page
        )));
    }
    Ok(())
}

/// A confirmed booking keeps its stored total in step with its pages.
fn reprice_if_confirmed(db: &Database, id: &str) -> Result<Reservation> {
    let reservation = db.require_reservation(id)?;
    if reservation.status != ReservationStatus::Confirmed {
        return Ok(reservation);
    }
    let breakdown = breakdown_for(db, id, None)?;
    if reservation.total_cost != Some(breakdown.total) {
        db.set_pricing(id, reservation.discount_percent, Some(breakdown.total))?;
        info!(id, total = breakdown.total, "confirmed reservation repriced");
    }
    db.require_reservation(id)
}

fn advance(db: &Database, reservation: &Reservation, page: IntakeStage) -> Result<Reservation> {
    if page > reservation.stage {
        db.set_stage(&reservation.id, page)?;
    }
    db.require_reservation(&reservation.id)
}

/// Dates may only move if everything already scheduled still fits.
fn ensure_children_within(db: &Database, id: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let inside = |d: NaiveDate| d >= start && d <= end;
    let stray_sessions = db
        .program_sessions(id)?
        .iter()
        .filter(|s| !inside(s.date))
        .count();
    let stray_rooms = db
        .room_assignments(id)?
        .iter()
        .filter(|a| a.check_in < start || a.check_out > end)
        .count();
    let stray_meals = db
        .meal_orders(id)?
        .iter()
        .filter(|m| !inside(m.date))
        .count();
    if stray_sessions + stray_rooms + stray_meals > 0 {
        return Err(Error::validation(format!(
            "new dates would leave {stray_sessions} program sessions, {stray_rooms} room assignments \
             and {stray_meals} meal orders outside the stay"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests;
