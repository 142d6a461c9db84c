use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use survey::{HrvMetric, Scale, SurveyKind, SurveyPhase, MAX_SCORE, MIN_SCORE};

/// Declares a snake_case string enum with a display label, SQLite
/// conversions and a lenient parser (`-` and `_` are interchangeable).
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($what:literal) {
            $($variant:ident => $key:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            #[allow(clippy::should_implement_trait)]
            pub fn from_str(s: &str) -> Result<Self, crate::error::Error> {
                let normalized = s.trim().to_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($key => Ok($name::$variant),)+
                    _ => Err(crate::error::Error::Validation(format!(
                        "unknown {}: {s}. valid values: {}",
                        $what,
                        [$($key),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                let raw = value.as_str()?;
                $name::from_str(raw)
                    .map_err(|e| rusqlite::types::FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

mod survey;

labeled_enum! {
    /// Lifecycle of a reservation.
    pub enum ReservationStatus ("reservation status") {
        Draft => "draft", "Draft";
        Confirmed => "confirmed", "Confirmed";
        Completed => "completed", "Completed";
        Cancelled => "cancelled", "Cancelled";
    }
}

impl ReservationStatus {
    /// Completed and cancelled reservations no longer accept intake edits.
    pub fn is_editable(&self) -> bool {
        matches!(self, ReservationStatus::Draft | ReservationStatus::Confirmed)
    }

    /// Allowed manual transitions. Confirmation goes through the final
    /// intake page instead.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Draft, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled) | (Confirmed, Draft)
        )
    }
}

labeled_enum! {
    /// Intake pages in the order they must be completed.
    pub enum IntakeStage ("intake stage") {
        Page1 => "page1", "Group information";
        Page2 => "page2", "Participants";
        Page3 => "page3", "Programs";
        Page4 => "page4", "Rooms and meals";
        Final => "final", "Cost and confirmation";
    }
}

labeled_enum! {
    pub enum BusinessCategory ("business category") {
        SocialContribution => "social_contribution", "Social contribution";
        Profit => "profit", "Profit business";
    }
}

labeled_enum! {
    pub enum ServiceType ("service type") {
        Prevention => "prevention", "Prevention";
        Healing => "healing", "Healing";
        Counseling => "counseling", "Counseling";
        Education => "education", "Education";
        Other => "other", "Other";
    }
}

labeled_enum! {
    pub enum ParticipantType ("participant type") {
        General => "general", "General";
        Family => "family", "Family";
        Disabled => "disabled", "Disabled";
        LowIncome => "low_income", "Low income";
        Multicultural => "multicultural", "Multicultural";
        Other => "other", "Other";
    }
}

labeled_enum! {
    pub enum AgeGroup ("age group") {
        Child => "child", "Child";
        Youth => "youth", "Youth";
        Adult => "adult", "Adult";
        Senior => "senior", "Senior";
    }
}

labeled_enum! {
    pub enum MealType ("meal type") {
        Breakfast => "breakfast", "Breakfast";
        Lunch => "lunch", "Lunch";
        Dinner => "dinner", "Dinner";
    }
}

impl MealType {
    /// Config key holding the unit price for this meal.
    pub fn price_key(&self) -> String {
        format!("meal_price.{}", self.as_str())
    }

    pub fn default_price(&self) -> i64 {
        match self {
            MealType::Breakfast => 8_000,
            MealType::Lunch => 10_000,
            MealType::Dinner => 10_000,
        }
    }
}

labeled_enum! {
    pub enum Role ("role") {
        Admin => "admin", "Administrator";
        Staff => "staff", "Staff";
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub group_name: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub region: Option<String>,
    pub business_category: BusinessCategory,
    pub service_type: ServiceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub stage: IntakeStage,
    pub discount_percent: u8,
    pub total_cost: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Nights of the stay; a same-day visit has zero.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Every calendar day from arrival to departure, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .collect()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCount {
    pub participant_type: ParticipantType,
    pub age_group: AgeGroup,
    pub male: u32,
    pub female: u32,
}

impl ParticipantCount {
    pub fn total(&self) -> u32 {
        self.male.saturating_add(self.female)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub category: ServiceType,
    pub instructor: Option<String>,
    pub unit_price: i64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSession {
    pub id: i64,
    pub reservation_id: String,
    pub program_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub place: Option<String>,
    pub participants: u32,
}

impl ProgramSession {
    pub fn overlaps(&self, other: &ProgramSession) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub capacity: u32,
    pub nightly_rate: i64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub id: i64,
    pub reservation_id: String,
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupants: u32,
}

impl RoomAssignment {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Nights are half-open: checking out on the day another group checks
    /// in is not a clash.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealOrder {
    pub id: i64,
    pub reservation_id: String,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub headcount: u32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub id: i64,
    pub reservation_id: String,
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: i64,
    pub reservation_id: String,
    pub kind: SurveyKind,
    pub phase: SurveyPhase,
    pub respondent: String,
    pub program_id: Option<i64>,
    pub scores: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl SurveyResponse {
    /// Mean of the items belonging to `scale`.
    pub fn scale_mean(&self, scale: &Scale) -> Option<f64> {
        let items = self.scores.get(scale.items.clone())?;
        if items.is_empty() {
            return None;
        }
        let sum: u32 = items.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(sum) / items.len() as f64)
    }

    pub fn overall_mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: u32 = self.scores.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(sum) / self.scores.len() as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvMeasurement {
    pub id: i64,
    pub reservation_id: String,
    pub respondent: String,
    pub phase: SurveyPhase,
    pub autonomic_activity: f64,
    pub autonomic_balance: f64,
    pub stress_resistance: f64,
    pub stress_index: f64,
    pub fatigue: f64,
    pub heart_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl HrvMeasurement {
    pub fn value(&self, metric: HrvMetric) -> f64 {
        match metric {
            HrvMetric::AutonomicActivity => self.autonomic_activity,
            HrvMetric::AutonomicBalance => self.autonomic_balance,
            HrvMetric::StressResistance => self.stress_resistance,
            HrvMetric::StressIndex => self.stress_index,
            HrvMetric::Fatigue => self.fatigue,
            HrvMetric::HeartRate => self.heart_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn enum_parsing_is_lenient_about_case_and_dashes() {
        assert_eq!(
            ParticipantType::from_str("Low-Income").unwrap(),
            ParticipantType::LowIncome
        );
        assert_eq!(
            BusinessCategory::from_str(" social_contribution ").unwrap(),
            BusinessCategory::SocialContribution
        );
        let err = ServiceType::from_str("spa").unwrap_err();
        assert!(err.to_string().contains("unknown service type"));
    }

    #[test]
    fn intake_stages_are_ordered() {
        assert!(IntakeStage::Page1 < IntakeStage::Page2);
        assert!(IntakeStage::Page4 < IntakeStage::Final);
        assert_eq!(IntakeStage::ALL.len(), 5);
    }

    #[test]
    fn room_nights_are_half_open() {
        let a = RoomAssignment {
            id: 1,
            reservation_id: "rsv-1".into(),
            room_id: 1,
            check_in: date("2026-05-01"),
            check_out: date("2026-05-03"),
            occupants: 2,
        };
        assert_eq!(a.nights(), 2);
        assert!(!a.overlaps(date("2026-05-03"), date("2026-05-04")));
        assert!(a.overlaps(date("2026-05-02"), date("2026-05-04")));
        assert!(!a.overlaps(date("2026-04-29"), date("2026-05-01")));
    }

    #[test]
    fn status_transitions() {
        assert!(ReservationStatus::Draft.can_transition_to(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Draft.can_transition_to(ReservationStatus::Completed));
        assert!(ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Completed));
        assert!(!ReservationStatus::Completed.can_transition_to(ReservationStatus::Draft));
        assert!(!ReservationStatus::Cancelled.is_editable());
    }

    #[test]
    fn scale_mean_uses_only_scale_items() {
        let response = SurveyResponse {
            id: 1,
            reservation_id: "rsv-1".into(),
            kind: SurveyKind::Program,
            phase: SurveyPhase::Single,
            respondent: "p1".into(),
            program_id: Some(1),
            scores: vec![5, 3, 4, 4, 1, 2],
            created_at: Utc::now(),
        };
        let scales = SurveyKind::Program.scales();
        assert_eq!(response.scale_mean(&scales[0]), Some(4.0));
        assert_eq!(response.scale_mean(&scales[2]), Some(1.5));
        assert_eq!(response.overall_mean(), Some(19.0 / 6.0));
    }
}
