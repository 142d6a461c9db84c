use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::{Mean, PrePost, ScaleResult, check_range, months_between};
use crate::db::{Database, ReservationFilter};
use crate::error::Result;
use crate::models::{
    AgeGroup, BusinessCategory, HrvMeasurement, HrvMetric, ParticipantCount, ParticipantType,
    Reservation, ReservationStatus, ServiceType, SurveyKind, SurveyPhase, SurveyResponse,
};
use crate::schedule::CountEntry;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Totals {
    pub reservations: usize,
    pub participants: u64,
    pub male: u64,
    pub female: u64,
    pub room_nights: i64,
    pub meals: u64,
    pub program_sessions: usize,
    /// Sum of locked-in totals of confirmed and completed reservations.
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthEntry {
    pub month: String,
    pub reservations: usize,
    pub participants: u64,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Effectiveness {
    pub kind: SurveyKind,
    pub label: String,
    pub pre_responses: usize,
    pub post_responses: usize,
    pub scales: Vec<PrePost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HrvResult {
    pub pre_readings: usize,
    pub post_readings: usize,
    pub metrics: Vec<PrePost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacilitySatisfaction {
    pub responses: usize,
    pub overall: Option<f64>,
    pub scales: Vec<ScaleResult>,
}

/// The Year-Month Result: every non-cancelled reservation arriving in
/// `[from, to]` and the surveys collected from it.
#[derive(Debug, Clone, Serialize)]
pub struct YearMonthResult {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: Totals,
    /// Participants per participant type.
    pub by_participant_type: Vec<CountEntry>,
    /// Participants per age group.
    pub by_age_group: Vec<CountEntry>,
    /// Reservations per service type.
    pub by_service_type: Vec<CountEntry>,
    /// Reservations per business category.
    pub by_business_category: Vec<CountEntry>,
    /// Reservations per region, busiest first.
    pub by_region: Vec<CountEntry>,
    pub by_month: Vec<MonthEntry>,
    pub facility: FacilitySatisfaction,
    pub effectiveness: Vec<Effectiveness>,
    pub hrv: HrvResult,
}

/// Everything loaded for one reservation.
pub(crate) struct ReservationData {
    pub reservation: Reservation,
    pub participants: Vec<ParticipantCount>,
    pub room_nights: i64,
    pub meals: u64,
    pub program_sessions: usize,
    pub surveys: Vec<SurveyResponse>,
    pub hrv: Vec<HrvMeasurement>,
}

pub(crate) fn load_range(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<Vec<ReservationData>> {
    check_range(from, to)?;
    let reservations = db.list_reservations(&ReservationFilter::active_between(from, to))?;
    let mut data = Vec::with_capacity(reservations.len());
    for reservation in reservations {
        let id = reservation.id.clone();
        data.push(ReservationData {
            participants: db.participants(&id)?,
            room_nights: db.room_assignments(&id)?.iter().map(|a| a.nights()).sum(),
            meals: db
                .meal_orders(&id)?
                .iter()
                .map(|m| u64::from(m.headcount))
                .sum(),
            program_sessions: db.program_sessions(&id)?.len(),
            surveys: db.surveys(&id)?,
            hrv: db.hrv_measurements(&id)?,
            reservation,
        });
    }
    debug!(%from, %to, reservations = data.len(), "loaded report range");
    Ok(data)
}

pub fn year_month_result(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<YearMonthResult> {
    let data = load_range(db, from, to)?;
    Ok(aggregate(from, to, &data))
}

pub(crate) fn aggregate(from: NaiveDate, to: NaiveDate, data: &[ReservationData]) -> YearMonthResult {
    let mut totals = Totals {
        reservations: data.len(),
        ..Totals::default()
    };
    let mut by_type: HashMap<ParticipantType, u64> = HashMap::new();
    let mut by_age: HashMap<AgeGroup, u64> = HashMap::new();
    let mut by_service: HashMap<ServiceType, u64> = HashMap::new();
    let mut by_category: HashMap<BusinessCategory, u64> = HashMap::new();
    let mut by_region: HashMap<String, u64> = HashMap::new();
    let mut by_month: BTreeMap<String, MonthEntry> = months_between(from, to)
        .into_iter()
        .map(|month| {
            let entry = MonthEntry {
                month: month.clone(),
                reservations: 0,
                participants: 0,
                revenue: 0,
            };
            (month, entry)
        })
        .collect();

    for item in data {
        let r = &item.reservation;
        let mut head_count = 0u64;
        for p in &item.participants {
            totals.male += u64::from(p.male);
            totals.female += u64::from(p.female);
            head_count += u64::from(p.total());
            *by_type.entry(p.participant_type).or_default() += u64::from(p.total());
            *by_age.entry(p.age_group).or_default() += u64::from(p.total());
        }
        totals.participants += head_count;
        totals.room_nights += item.room_nights;
        totals.meals += item.meals;
        totals.program_sessions += item.program_sessions;
        let revenue = match r.status {
            ReservationStatus::Confirmed | ReservationStatus::Completed => r.total_cost.unwrap_or(0),
            _ => 0,
        };
        totals.revenue += revenue;

        *by_service.entry(r.service_type).or_default() += 1;
        *by_category.entry(r.business_category).or_default() += 1;
        let region = r
            .region
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        *by_region.entry(region).or_default() += 1;

        let month = r.start_date.format("%Y-%m").to_string();
        if let Some(entry) = by_month.get_mut(&month) {
            entry.reservations += 1;
            entry.participants += head_count;
            entry.revenue += revenue;
        }
    }

    let mut regions: Vec<CountEntry> = by_region
        .into_iter()
        .map(|(name, count)| CountEntry::new(&name, &name, count))
        .collect();
    regions.sort_by(|a, b| b.count.cmp(&a.count).then(a.key.cmp(&b.key)));

    let surveys: Vec<&SurveyResponse> = data.iter().flat_map(|d| d.surveys.iter()).collect();
    let readings: Vec<&HrvMeasurement> = data.iter().flat_map(|d| d.hrv.iter()).collect();

    YearMonthResult {
        from,
        to,
        totals,
        by_participant_type: ordered_counts(ParticipantType::ALL, &by_type, |t| {
            (t.as_str(), t.label())
        }),
        by_age_group: ordered_counts(AgeGroup::ALL, &by_age, |a| (a.as_str(), a.label())),
        by_service_type: ordered_counts(ServiceType::ALL, &by_service, |s| {
            (s.as_str(), s.label())
        }),
        by_business_category: ordered_counts(BusinessCategory::ALL, &by_category, |c| {
            (c.as_str(), c.label())
        }),
        by_region: regions,
        by_month: by_month.into_values().collect(),
        facility: facility_satisfaction(&surveys),
        effectiveness: SurveyKind::EFFECTIVENESS
            .iter()
            .map(|kind| effectiveness(*kind, &surveys))
            .collect(),
        hrv: hrv_result(&readings),
    }
}

/// One entry per enum variant, in declaration order, zeros included.
fn ordered_counts<K: Copy + Eq + std::hash::Hash>(
    all: &[K],
    counts: &HashMap<K, u64>,
    names: impl Fn(&K) -> (&'static str, &'static str),
) -> Vec<CountEntry> {
    all.iter()
        .map(|k| {
            let (key, label) = names(k);
            CountEntry::new(key, label, counts.get(k).copied().unwrap_or(0))
        })
        .collect()
}

fn facility_satisfaction(surveys: &[&SurveyResponse]) -> FacilitySatisfaction {
    let responses: Vec<&&SurveyResponse> = surveys
        .iter()
        .filter(|s| s.kind == SurveyKind::Facility)
        .collect();
    let mut overall = Mean::default();
    let scales = SurveyKind::Facility
        .scales()
        .iter()
        .map(|scale| {
            let mut mean = Mean::default();
            for response in &responses {
                if let Some(v) = response.scale_mean(scale) {
                    mean.add(v);
                }
            }
            ScaleResult {
                key: scale.key.to_string(),
                label: scale.label.to_string(),
                mean: mean.value(),
                responses: mean.count(),
            }
        })
        .collect();
    for response in &responses {
        if let Some(v) = response.overall_mean() {
            overall.add(v);
        }
    }
    FacilitySatisfaction {
        responses: responses.len(),
        overall: overall.value(),
        scales,
    }
}

fn effectiveness(kind: SurveyKind, surveys: &[&SurveyResponse]) -> Effectiveness {
    let of_kind: Vec<&&SurveyResponse> = surveys.iter().filter(|s| s.kind == kind).collect();
    let scales = kind
        .scales()
        .iter()
        .map(|scale| {
            let mut pre = Mean::default();
            let mut post = Mean::default();
            for response in &of_kind {
                let Some(v) = response.scale_mean(scale) else {
                    continue;
                };
                match response.phase {
                    SurveyPhase::Pre => pre.add(v),
                    SurveyPhase::Post => post.add(v),
                    SurveyPhase::Single => {}
                }
            }
            PrePost::new(scale.key, scale.label, pre, post)
        })
        .collect();
    Effectiveness {
        kind,
        label: kind.label().to_string(),
        pre_responses: of_kind.iter().filter(|s| s.phase == SurveyPhase::Pre).count(),
        post_responses: of_kind.iter().filter(|s| s.phase == SurveyPhase::Post).count(),
        scales,
    }
}

fn hrv_result(readings: &[&HrvMeasurement]) -> HrvResult {
    let metrics = HrvMetric::ALL
        .iter()
        .map(|metric| {
            let mut pre = Mean::default();
            let mut post = Mean::default();
            for reading in readings {
                match reading.phase {
                    SurveyPhase::Pre => pre.add(reading.value(*metric)),
                    SurveyPhase::Post => post.add(reading.value(*metric)),
                    SurveyPhase::Single => {}
                }
            }
            PrePost::new(metric.as_str(), metric.label(), pre, post)
        })
        .collect();
    HrvResult {
        pre_readings: readings.iter().filter(|r| r.phase == SurveyPhase::Pre).count(),
        post_readings: readings.iter().filter(|r| r.phase == SurveyPhase::Post).count(),
        metrics,
    }
}
