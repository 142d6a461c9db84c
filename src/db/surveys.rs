use chrono::Utc;
use rusqlite::{Row, params};

use super::Database;
use crate::error::Result;
use crate::models::{HrvMeasurement, SurveyKind, SurveyResponse};

impl Database {
    // -- Questionnaires --

    pub fn insert_survey(&self, response: &SurveyResponse) -> Result<SurveyResponse> {
        let scores = serde_json::to_string(&response.scores)?;
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO survey_responses
                (reservation_id, kind, phase, respondent, program_id, scores, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                response.reservation_id,
                response.kind,
                response.phase,
                response.respondent,
                response.program_id,
                scores,
                now,
            ],
        )?;
        Ok(SurveyResponse {
            id: self.conn().last_insert_rowid(),
            created_at: now,
            ..response.clone()
        })
    }

    pub fn surveys(&self, reservation_id: &str) -> Result<Vec<SurveyResponse>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, kind, phase, respondent, program_id, scores, created_at
             FROM survey_responses WHERE reservation_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![reservation_id], row_to_survey)?;
        let mut responses = Vec::new();
        for row in rows {
            responses.push(row?);
        }
        Ok(responses)
    }

    /// Number of responses per questionnaire kind for one reservation.
    pub fn survey_counts(&self, reservation_id: &str) -> Result<Vec<(SurveyKind, i64)>> {
        let mut stmt = self.conn().prepare(
            "SELECT kind, COUNT(*) FROM survey_responses WHERE reservation_id = ?1
             GROUP BY kind ORDER BY kind",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok((row.get::<_, SurveyKind>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    // -- HRV --

    pub fn insert_hrv(&self, m: &HrvMeasurement) -> Result<HrvMeasurement> {
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO hrv_measurements
                (reservation_id, respondent, phase, autonomic_activity, autonomic_balance,
                 stress_resistance, stress_index, fatigue, heart_rate, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                m.reservation_id,
                m.respondent,
                m.phase,
                m.autonomic_activity,
                m.autonomic_balance,
                m.stress_resistance,
                m.stress_index,
                m.fatigue,
                m.heart_rate,
                now,
            ],
        )?;
        Ok(HrvMeasurement {
            id: self.conn().last_insert_rowid(),
            created_at: now,
            ..m.clone()
        })
    }

    pub fn hrv_measurements(&self, reservation_id: &str) -> Result<Vec<HrvMeasurement>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, reservation_id, respondent, phase, autonomic_activity, autonomic_balance,
                    stress_resistance, stress_index, fatigue, heart_rate, created_at
             FROM hrv_measurements WHERE reservation_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![reservation_id], |row| {
            Ok(HrvMeasurement {
                id: row.get(0)?,
                reservation_id: row.get(1)?,
                respondent: row.get(2)?,
                phase: row.get(3)?,
                autonomic_activity: row.get(4)?,
                autonomic_balance: row.get(5)?,
                stress_resistance: row.get(6)?,
                stress_index: row.get(7)?,
                fatigue: row.get(8)?,
                heart_rate: row.get(9)?,
                created_at: row.get(10)?,
            })
        })?;
        let mut measurements = Vec::new();
        for row in rows {
            measurements.push(row?);
        }
        Ok(measurements)
    }
}

fn row_to_survey(row: &Row) -> rusqlite::Result<SurveyResponse> {
    let raw_scores: String = row.get(6)?;
    let scores: Vec<u8> = serde_json::from_str(&raw_scores).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(SurveyResponse {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        kind: row.get(2)?,
        phase: row.get(3)?,
        respondent: row.get(4)?,
        program_id: row.get(5)?,
        scores,
        created_at: row.get(7)?,
    })
}
