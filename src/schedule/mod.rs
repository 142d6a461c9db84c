//! Page6 tabs: per-reservation views built from the intake data.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::db::Database;
use crate::error::Result;
use crate::intake::{CostBreakdown, breakdown_for};
use crate::models::{
    AgeGroup, MealType, ParticipantCount, ParticipantType, Program, Reservation, ServiceType,
    SurveyKind,
};

/// A labelled count used by every breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub label: String,
    pub count: u64,
}

impl CountEntry {
    pub fn new(key: &str, label: &str, count: u64) -> Self {
        CountEntry {
            key: key.to_string(),
            label: label.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledSession {
    pub session_id: i64,
    pub program_id: i64,
    pub program_name: String,
    pub category: ServiceType,
    pub instructor: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub place: Option<String>,
    pub participants: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledMeal {
    pub meal_type: MealType,
    pub headcount: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub sessions: Vec<ScheduledSession>,
    pub meals: Vec<ScheduledMeal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub reservation_id: String,
    pub group_name: String,
    pub days: Vec<ScheduleDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomNight {
    pub date: NaiveDate,
    pub occupants: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomOccupancy {
    pub room_id: i64,
    pub room_name: String,
    pub capacity: u32,
    pub nights: Vec<RoomNight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomAssignmentView {
    pub reservation_id: String,
    pub rooms: Vec<RoomOccupancy>,
    pub room_nights: i64,
    /// Most guests lodged on any single night.
    pub peak_occupants: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSummary {
    pub total: u32,
    pub male: u32,
    pub female: u32,
    pub by_type: Vec<CountEntry>,
    pub by_age: Vec<CountEntry>,
    pub rows: Vec<ParticipantCount>,
}

impl ParticipantSummary {
    pub fn from_rows(rows: Vec<ParticipantCount>) -> Self {
        let male = rows.iter().map(|r| r.male).sum();
        let female = rows.iter().map(|r| r.female).sum();
        let by_type = ParticipantType::ALL
            .iter()
            .filter_map(|t| {
                let count: u32 = rows
                    .iter()
                    .filter(|r| r.participant_type == *t)
                    .map(ParticipantCount::total)
                    .sum();
                (count > 0).then(|| CountEntry::new(t.as_str(), t.label(), u64::from(count)))
            })
            .collect();
        let by_age = AgeGroup::ALL
            .iter()
            .filter_map(|a| {
                let count: u32 = rows
                    .iter()
                    .filter(|r| r.age_group == *a)
                    .map(ParticipantCount::total)
                    .sum();
                (count > 0).then(|| CountEntry::new(a.as_str(), a.label(), u64::from(count)))
            })
            .collect();
        ParticipantSummary {
            total: male + female,
            male,
            female,
            by_type,
            by_age,
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImplementationPlan {
    pub reservation: Reservation,
    pub participants: ParticipantSummary,
    pub schedule: ScheduleView,
    pub rooms: RoomAssignmentView,
    pub cost: CostBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub reservation_id: String,
    pub group_name: String,
    pub status: String,
    pub days: usize,
    pub nights: i64,
    pub participants: u32,
    pub room_nights: i64,
    pub meals_served: u64,
    pub meals_by_type: Vec<CountEntry>,
    pub program_sessions: usize,
    pub program_participation: u64,
    pub survey_responses: Vec<CountEntry>,
    pub hrv_readings: usize,
    pub total_cost: Option<i64>,
}

/// Schedule tab: each day of the stay with its sessions and meals.
pub fn schedule(db: &Database, id: &str) -> Result<ScheduleView> {
    let reservation = db.require_reservation(id)?;
    build_schedule(db, &reservation)
}

fn build_schedule(db: &Database, reservation: &Reservation) -> Result<ScheduleView> {
    let programs: HashMap<i64, Program> = db
        .list_programs(true)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let sessions = db.program_sessions(&reservation.id)?;
    let meals = db.meal_orders(&reservation.id)?;

    let days = reservation
        .days()
        .into_iter()
        .map(|date| {
            let mut day_sessions: Vec<ScheduledSession> = sessions
                .iter()
                .filter(|s| s.date == date)
                .map(|s| {
                    let program = programs.get(&s.program_id);
                    ScheduledSession {
                        session_id: s.id,
                        program_id: s.program_id,
                        program_name: program
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| format!("program {}", s.program_id)),
                        category: program.map(|p| p.category).unwrap_or(ServiceType::Other),
                        instructor: program.and_then(|p| p.instructor.clone()),
                        start_time: s.start_time,
                        end_time: s.end_time,
                        place: s.place.clone(),
                        participants: s.participants,
                    }
                })
                .collect();
            day_sessions.sort_by_key(|s| s.start_time);

            let mut day_meals: Vec<ScheduledMeal> = meals
                .iter()
                .filter(|m| m.date == date)
                .map(|m| ScheduledMeal {
                    meal_type: m.meal_type,
                    headcount: m.headcount,
                })
                .collect();
            day_meals.sort_by_key(|m| m.meal_type);

            ScheduleDay {
                date,
                sessions: day_sessions,
                meals: day_meals,
            }
        })
        .collect();

    Ok(ScheduleView {
        reservation_id: reservation.id.clone(),
        group_name: reservation.group_name.clone(),
        days,
    })
}

/// Room assignment tab: nights per room and occupancy per night.
pub fn room_assignment(db: &Database, id: &str) -> Result<RoomAssignmentView> {
    db.require_reservation(id)?;
    let rooms: HashMap<i64, _> = db
        .list_rooms(true)?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let assignments = db.room_assignments(id)?;

    let mut per_room: BTreeMap<String, RoomOccupancy> = BTreeMap::new();
    let mut per_night: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    let mut room_nights = 0;

    for a in &assignments {
        let (name, capacity) = rooms
            .get(&a.room_id)
            .map(|r| (r.name.clone(), r.capacity))
            .unwrap_or_else(|| (format!("room {}", a.room_id), 0));
        let entry = per_room.entry(name.clone()).or_insert_with(|| RoomOccupancy {
            room_id: a.room_id,
            room_name: name,
            capacity,
            nights: Vec::new(),
        });
        for night in a.check_in.iter_days().take_while(|d| *d < a.check_out) {
            entry.nights.push(RoomNight {
                date: night,
                occupants: a.occupants,
            });
            *per_night.entry(night).or_insert(0) += a.occupants;
        }
        room_nights += a.nights();
    }

    let mut rooms: Vec<RoomOccupancy> = per_room.into_values().collect();
    for room in &mut rooms {
        room.nights.sort_by_key(|n| n.date);
    }

    Ok(RoomAssignmentView {
        reservation_id: id.to_string(),
        rooms,
        room_nights,
        peak_occupants: per_night.values().copied().max().unwrap_or(0),
    })
}

/// Implementation plan tab: everything staff need to run the stay.
pub fn implementation_plan(db: &Database, id: &str) -> Result<ImplementationPlan> {
    let reservation = db.require_reservation(id)?;
    let participants = ParticipantSummary::from_rows(db.participants(id)?);
    let schedule = build_schedule(db, &reservation)?;
    let rooms = room_assignment(db, id)?;
    let cost = breakdown_for(db, id, None)?;
    Ok(ImplementationPlan {
        reservation,
        participants,
        schedule,
        rooms,
        cost,
    })
}

/// Usage report tab: what the group actually consumed.
pub fn usage_report(db: &Database, id: &str) -> Result<UsageReport> {
    let reservation = db.require_reservation(id)?;
    let participants: u32 = db
        .participants(id)?
        .iter()
        .map(ParticipantCount::total)
        .sum();
    let assignments = db.room_assignments(id)?;
    let meals = db.meal_orders(id)?;
    let sessions = db.program_sessions(id)?;
    let survey_counts = db.survey_counts(id)?;

    let meals_by_type: Vec<CountEntry> = MealType::ALL
        .iter()
        .map(|t| {
            let served: u64 = meals
                .iter()
                .filter(|m| m.meal_type == *t)
                .map(|m| u64::from(m.headcount))
                .sum();
            CountEntry::new(t.as_str(), t.label(), served)
        })
        .collect();

    let survey_responses = SurveyKind::ALL
        .iter()
        .map(|kind| {
            let count = survey_counts
                .iter()
                .find(|(k, _)| k == kind)
                .map(|(_, c)| *c as u64)
                .unwrap_or(0);
            CountEntry::new(kind.as_str(), kind.label(), count)
        })
        .collect();

    Ok(UsageReport {
        reservation_id: reservation.id.clone(),
        group_name: reservation.group_name.clone(),
        status: reservation.status.to_string(),
        days: reservation.days().len(),
        nights: reservation.nights(),
        participants,
        room_nights: assignments.iter().map(|a| a.nights()).sum(),
        meals_served: meals_by_type.iter().map(|m| m.count).sum(),
        meals_by_type,
        program_sessions: sessions.len(),
        program_participation: sessions.iter().map(|s| u64::from(s.participants)).sum(),
        survey_responses,
        hrv_readings: db.hrv_measurements(id)?.len(),
        total_cost: reservation.total_cost,
    })
}
