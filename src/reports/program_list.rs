use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::{Mean, ScaleResult, check_range};
use crate::db::{Database, ReservationFilter};
use crate::error::Result;
use crate::models::{ServiceType, SurveyKind};

#[derive(Debug, Clone, Serialize)]
pub struct ProgramListEntry {
    pub program_id: i64,
    pub name: String,
    pub category: ServiceType,
    pub instructor: Option<String>,
    pub sessions: usize,
    pub participants: u64,
    pub responses: usize,
    pub scales: Vec<ScaleResult>,
    pub overall: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramList {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub programs: Vec<ProgramListEntry>,
}

#[derive(Default)]
struct Tally {
    sessions: usize,
    participants: u64,
    scales: Vec<Mean>,
    overall: Mean,
}

/// Programs run for reservations arriving in `[from, to]`, with their
/// satisfaction scores. Programs that never ran in the range are left out.
pub fn program_list(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<ProgramList> {
    check_range(from, to)?;
    let scale_count = SurveyKind::Program.scales().len();
    let mut tallies: HashMap<i64, Tally> = HashMap::new();

    for reservation in db.list_reservations(&ReservationFilter::active_between(from, to))? {
        for session in db.program_sessions(&reservation.id)? {
            let tally = tallies.entry(session.program_id).or_default();
            tally.sessions += 1;
            tally.participants += u64::from(session.participants);
        }
        for response in db.surveys(&reservation.id)? {
            let (SurveyKind::Program, Some(program_id)) = (response.kind, response.program_id) else {
                continue;
            };
            let tally = tallies.entry(program_id).or_default();
            if tally.scales.is_empty() {
                tally.scales = vec![Mean::default(); scale_count];
            }
            for (mean, scale) in tally.scales.iter_mut().zip(SurveyKind::Program.scales()) {
                if let Some(v) = response.scale_mean(scale) {
                    mean.add(v);
                }
            }
            if let Some(v) = response.overall_mean() {
                tally.overall.add(v);
            }
        }
    }

    let mut programs: Vec<ProgramListEntry> = db
        .list_programs(true)?
        .into_iter()
        .filter_map(|program| {
            let tally = tallies.remove(&program.id)?;
            let scales = SurveyKind::Program
                .scales()
                .iter()
                .enumerate()
                .map(|(i, scale)| {
                    let mean = tally.scales.get(i).copied().unwrap_or_default();
                    ScaleResult {
                        key: scale.key.to_string(),
                        label: scale.label.to_string(),
                        mean: mean.value(),
                        responses: mean.count(),
                    }
                })
                .collect();
            Some(ProgramListEntry {
                program_id: program.id,
                name: program.name,
                category: program.category,
                instructor: program.instructor,
                sessions: tally.sessions,
                participants: tally.participants,
                responses: tally.overall.count(),
                scales,
                overall: tally.overall.value(),
            })
        })
        .collect();
    programs.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ProgramList { from, to, programs })
}
