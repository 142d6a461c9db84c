use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    HrvMeasurement, MAX_SCORE, MIN_SCORE, ReservationStatus, SurveyKind, SurveyPhase,
    SurveyResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyInput {
    pub kind: SurveyKind,
    pub phase: SurveyPhase,
    pub respondent: String,
    #[serde(default)]
    pub program_id: Option<i64>,
    pub scores: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvInput {
    pub respondent: String,
    pub phase: SurveyPhase,
    pub autonomic_activity: f64,
    pub autonomic_balance: f64,
    pub stress_resistance: f64,
    pub stress_index: f64,
    pub fatigue: f64,
    pub heart_rate: f64,
}

/// Cancelled bookings collect no further responses.
fn ensure_open(db: &Database, reservation_id: &str) -> Result<()> {
    let reservation = db.require_reservation(reservation_id)?;
    if reservation.status == ReservationStatus::Cancelled {
        return Err(Error::Conflict(format!(
            "reservation {reservation_id} is cancelled"
        )));
    }
    Ok(())
}

/// Validate and store one questionnaire.
pub fn record_survey(db: &Database, reservation_id: &str, input: SurveyInput) -> Result<SurveyResponse> {
    ensure_open(db, reservation_id)?;

    let respondent = input.respondent.trim().to_string();
    if respondent.is_empty() {
        return Err(Error::validation("respondent is required"));
    }
    if !input.kind.accepts_phase(input.phase) {
        return Err(Error::validation(format!(
            "{} surveys cannot be recorded with phase {}",
            input.kind, input.phase
        )));
    }

    let expected = input.kind.item_count();
    if input.scores.len() != expected {
        return Err(Error::validation(format!(
            "{} survey expects {expected} scores, got {}",
            input.kind,
            input.scores.len()
        )));
    }
    if let Some((position, score)) = input
        .scores
        .iter()
        .enumerate()
        .find(|(_, s)| !(MIN_SCORE..=MAX_SCORE).contains(*s))
    {
        return Err(Error::validation(format!(
            "item {} scored {score}; scores run from {MIN_SCORE} to {MAX_SCORE}",
            position + 1
        )));
    }

    match (input.kind, input.program_id) {
        (SurveyKind::Program, None) => {
            return Err(Error::validation("program surveys must name a program"));
        }
        (SurveyKind::Program, Some(program_id)) => {
            let scheduled = db
                .program_sessions(reservation_id)?
                .iter()
                .any(|s| s.program_id == program_id);
            if !scheduled {
                return Err(Error::validation(format!(
                    "program {program_id} is not scheduled for reservation {reservation_id}"
                )));
            }
        }
        (_, Some(_)) => {
            return Err(Error::validation(format!(
                "{} surveys are not tied to a program",
                input.kind
            )));
        }
        (_, None) => {}
    }

    let stored = db.insert_survey(&SurveyResponse {
        id: 0,
        reservation_id: reservation_id.to_string(),
        kind: input.kind,
        phase: input.phase,
        respondent,
        program_id: input.program_id,
        scores: input.scores,
        created_at: Utc::now(),
    })?;
    debug!(reservation_id, kind = %stored.kind, phase = %stored.phase, "survey recorded");
    Ok(stored)
}

/// Validate and store one HRV reading.
pub fn record_hrv(db: &Database, reservation_id: &str, input: HrvInput) -> Result<HrvMeasurement> {
    ensure_open(db, reservation_id)?;

    let respondent = input.respondent.trim().to_string();
    if respondent.is_empty() {
        return Err(Error::validation("respondent is required"));
    }
    if input.phase == SurveyPhase::Single {
        return Err(Error::validation("HRV readings are taken pre or post"));
    }
    let values = [
        input.autonomic_activity,
        input.autonomic_balance,
        input.stress_resistance,
        input.stress_index,
        input.fatigue,
        input.heart_rate,
    ];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(Error::validation(
            "HRV readings must be finite, non-negative numbers",
        ));
    }

    let stored = db.insert_hrv(&HrvMeasurement {
        id: 0,
        reservation_id: reservation_id.to_string(),
        respondent,
        phase: input.phase,
        autonomic_activity: input.autonomic_activity,
        autonomic_balance: input.autonomic_balance,
        stress_resistance: input.stress_resistance,
        stress_index: input.stress_index,
        fatigue: input.fatigue,
        heart_rate: input.heart_rate,
        created_at: Utc::now(),
    })?;
    debug!(reservation_id, phase = %stored.phase, "hrv reading recorded");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_reservation;

    fn db_with_reservation() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_reservation(&sample_reservation("rsv-a", "2026-05-01", "2026-05-02"))
            .unwrap();
        db
    }

    fn healing(phase: SurveyPhase, score: u8) -> SurveyInput {
        SurveyInput {
            kind: SurveyKind::Healing,
            phase,
            respondent: "p-01".into(),
            program_id: None,
            scores: vec![score; SurveyKind::Healing.item_count()],
        }
    }

    #[test]
    fn accepts_well_formed_effectiveness_survey() {
        let db = db_with_reservation();
        let stored = record_survey(&db, "rsv-a", healing(SurveyPhase::Pre, 3)).unwrap();
        assert_eq!(stored.scores.len(), 15);
        assert_eq!(db.surveys("rsv-a").unwrap().len(), 1);
    }

    #[test]
    fn rejects_wrong_length_range_and_phase() {
        let db = db_with_reservation();

        let mut short = healing(SurveyPhase::Pre, 3);
        short.scores.pop();
        assert!(matches!(record_survey(&db, "rsv-a", short), Err(Error::Validation(_))));

        assert!(matches!(
            record_survey(&db, "rsv-a", healing(SurveyPhase::Post, 6)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            record_survey(&db, "rsv-a", healing(SurveyPhase::Single, 3)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn program_survey_needs_a_scheduled_program() {
        let db = db_with_reservation();
        let program = db
            .insert_program("Forest walk", crate::models::ServiceType::Healing, None, 0)
            .unwrap();
        let input = SurveyInput {
            kind: SurveyKind::Program,
            phase: SurveyPhase::Single,
            respondent: "p-01".into(),
            program_id: Some(program.id),
            scores: vec![4; 6],
        };
        assert!(matches!(
            record_survey(&db, "rsv-a", input),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn hrv_rejects_negative_readings() {
        let db = db_with_reservation();
        let mut input = HrvInput {
            respondent: "p-01".into(),
            phase: SurveyPhase::Pre,
            autonomic_activity: 98.0,
            autonomic_balance: 1.1,
            stress_resistance: 92.5,
            stress_index: 101.0,
            fatigue: 88.0,
            heart_rate: 72.0,
        };
        assert!(record_hrv(&db, "rsv-a", input.clone()).is_ok());
        input.fatigue = -1.0;
        assert!(matches!(record_hrv(&db, "rsv-a", input), Err(Error::Validation(_))));
    }

    #[test]
    fn cancelled_bookings_take_no_surveys_or_readings() {
        let db = db_with_reservation();
        db.set_status("rsv-a", ReservationStatus::Cancelled).unwrap();
        assert!(matches!(
            record_survey(&db, "rsv-a", healing(SurveyPhase::Pre, 3)),
            Err(Error::Conflict(_))
        ));
        let reading = HrvInput {
            respondent: "p-01".into(),
            phase: SurveyPhase::Pre,
            autonomic_activity: 98.0,
            autonomic_balance: 1.1,
            stress_resistance: 92.5,
            stress_index: 101.0,
            fatigue: 88.0,
            heart_rate: 72.0,
        };
        assert!(matches!(
            record_hrv(&db, "rsv-a", reading),
            Err(Error::Conflict(_))
        ));
        assert!(db.hrv_measurements("rsv-a").unwrap().is_empty());
    }
}
