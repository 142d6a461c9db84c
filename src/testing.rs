//! Fixtures shared by unit tests across modules.

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::models::{BusinessCategory, IntakeStage, Reservation, ReservationStatus, ServiceType};

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub(crate) fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("valid time")
}

pub(crate) fn sample_reservation(id: &str, start: &str, end: &str) -> Reservation {
    let now = Utc::now();
    Reservation {
        id: id.to_string(),
        group_name: "Pine Valley School".to_string(),
        contact_name: "Kim".to_string(),
        contact_phone: Some("010-0000-0000".to_string()),
        contact_email: None,
        region: Some("Gangwon".to_string()),
        business_category: BusinessCategory::SocialContribution,
        service_type: ServiceType::Healing,
        start_date: date(start),
        end_date: date(end),
        status: ReservationStatus::Draft,
        stage: IntakeStage::Page1,
        discount_percent: 0,
        total_cost: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
