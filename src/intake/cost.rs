use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ExpenseLine, MealOrder, Program, ProgramSession, Room, RoomAssignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Program,
    Room,
    Meal,
    Extra,
}

impl CostCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CostCategory::Program => "Program",
            CostCategory::Room => "Room",
            CostCategory::Meal => "Meal",
            CostCategory::Extra => "Extra",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLine {
    pub category: CostCategory,
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub amount: i64,
}

/// Final-page cost breakdown. Amounts are whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub reservation_id: String,
    pub lines: Vec<CostLine>,
    pub program_total: i64,
    pub room_total: i64,
    pub meal_total: i64,
    pub extra_total: i64,
    pub subtotal: i64,
    pub discount_percent: u8,
    pub discount_amount: i64,
    pub total: i64,
}

/// Everything priced on the final page, already loaded.
pub struct PricingInputs<'a> {
    pub reservation_id: &'a str,
    pub sessions: &'a [ProgramSession],
    pub programs: &'a HashMap<i64, Program>,
    pub assignments: &'a [RoomAssignment],
    pub rooms: &'a HashMap<i64, Room>,
    pub meals: &'a [MealOrder],
    pub expenses: &'a [ExpenseLine],
}

pub fn compute_breakdown(inputs: &PricingInputs<'_>, discount_percent: u8) -> Result<CostBreakdown> {
    if discount_percent > 100 {
        return Err(Error::validation(format!(
            "discount must be between 0 and 100, got {discount_percent}"
        )));
    }

    let mut lines = Vec::new();

    for session in inputs.sessions {
        let program = inputs
            .programs
            .get(&session.program_id)
            .ok_or_else(|| Error::not_found("program", session.program_id))?;
        let quantity = i64::from(session.participants);
        lines.push(CostLine {
            category: CostCategory::Program,
            description: format!(
                "{} ({} {})",
                program.name,
                session.date,
                session.start_time.format("%H:%M")
            ),
            quantity,
            unit_price: program.unit_price,
            amount: quantity
                .checked_mul(program.unit_price)
                .ok_or_else(|| too_large(&program.name))?,
        });
    }

    for assignment in inputs.assignments {
        let room = inputs
            .rooms
            .get(&assignment.room_id)
            .ok_or_else(|| Error::not_found("room", assignment.room_id))?;
        let nights = assignment.nights();
        lines.push(CostLine {
            category: CostCategory::Room,
            description: format!(
                "{} ({} to {})",
                room.name, assignment.check_in, assignment.check_out
            ),
            quantity: nights,
            unit_price: room.nightly_rate,
            amount: nights
                .checked_mul(room.nightly_rate)
                .ok_or_else(|| too_large(&room.name))?,
        });
    }

    for meal in inputs.meals {
        let quantity = i64::from(meal.headcount);
        lines.push(CostLine {
            category: CostCategory::Meal,
            description: format!("{} {}", meal.date, meal.meal_type.label()),
            quantity,
            unit_price: meal.unit_price,
            amount: quantity
                .checked_mul(meal.unit_price)
                .ok_or_else(|| too_large(meal.meal_type.label()))?,
        });
    }

    for expense in inputs.expenses {
        lines.push(CostLine {
            category: CostCategory::Extra,
            description: expense.description.clone(),
            quantity: 1,
            unit_price: expense.amount,
            amount: expense.amount,
        });
    }

    let sum = |category: CostCategory| -> Result<i64> {
        lines
            .iter()
            .filter(|l| l.category == category)
            .try_fold(0i64, |acc, l| acc.checked_add(l.amount))
            .ok_or_else(|| too_large(category.label()))
    };
    let program_total = sum(CostCategory::Program)?;
    let room_total = sum(CostCategory::Room)?;
    let meal_total = sum(CostCategory::Meal)?;
    let extra_total = sum(CostCategory::Extra)?;
    let subtotal = [room_total, meal_total, extra_total]
        .into_iter()
        .try_fold(program_total, i64::checked_add)
        .ok_or_else(|| too_large("subtotal"))?;
    // Never more than the subtotal, so it fits back into i64.
    let discount_amount =
        i64::try_from(i128::from(subtotal) * i128::from(discount_percent) / 100)
            .map_err(|_| too_large("discount"))?;

    Ok(CostBreakdown {
        reservation_id: inputs.reservation_id.to_string(),
        lines,
        program_total,
        room_total,
        meal_total,
        extra_total,
        subtotal,
        discount_percent,
        discount_amount,
        total: subtotal - discount_amount,
    })
}

fn too_large(what: &str) -> Error {
    Error::validation(format!("{what}: amount is too large to price"))
}

/// Load a reservation's priced items and compute its breakdown.
pub fn breakdown_for(db: &Database, reservation_id: &str, discount_percent: Option<u8>) -> Result<CostBreakdown> {
    let reservation = db.require_reservation(reservation_id)?;
    let sessions = db.program_sessions(reservation_id)?;
    let assignments = db.room_assignments(reservation_id)?;
    let meals = db.meal_orders(reservation_id)?;
    let expenses = db.expenses(reservation_id)?;

    let programs = db
        .list_programs(true)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect::<HashMap<_, _>>();
    let rooms = db
        .list_rooms(true)?
        .into_iter()
        .map(|r| (r.id, r))
        .collect::<HashMap<_, _>>();

    compute_breakdown(
        &PricingInputs {
            reservation_id,
            sessions: &sessions,
            programs: &programs,
            assignments: &assignments,
            rooms: &rooms,
            meals: &meals,
            expenses: &expenses,
        },
        discount_percent.unwrap_or(reservation.discount_percent),
    )
}
