//! Printable HTML pages. Browsers print these to PDF.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Html;

use super::api::RangeQuery;
use super::errors::AppError;
use super::{AppState, with_db};
use crate::error::Error;
use crate::reports::{self, PrePost, YearMonthResult, fmt_mean, fmt_money};
use crate::schedule::{self, CountEntry, ImplementationPlan};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage;

pub async fn index() -> Result<Html<String>, AppError> {
    render(&IndexPage)
}

struct CountRow {
    label: String,
    count: u64,
}

struct CountSection {
    title: &'static str,
    rows: Vec<CountRow>,
}

struct MeanRow {
    label: String,
    mean: String,
    responses: usize,
}

struct PrePostRow {
    label: String,
    pre: String,
    post: String,
    difference: String,
    pre_count: usize,
    post_count: usize,
}

struct PrePostSection {
    title: String,
    rows: Vec<PrePostRow>,
}

#[derive(Template)]
#[template(path = "year_month.html")]
struct YearMonthPage {
    from: String,
    to: String,
    totals: Vec<CountRow>,
    revenue: String,
    sections: Vec<CountSection>,
    months: Vec<CountRow>,
    facility: Vec<MeanRow>,
    facility_overall: String,
    effectiveness: Vec<PrePostSection>,
}

fn count_rows(entries: &[CountEntry]) -> Vec<CountRow> {
    entries
        .iter()
        .map(|e| CountRow {
            label: e.label.clone(),
            count: e.count,
        })
        .collect()
}

fn pre_post_rows(rows: &[PrePost]) -> Vec<PrePostRow> {
    rows.iter()
        .map(|r| PrePostRow {
            label: r.label.clone(),
            pre: fmt_mean(r.pre),
            post: fmt_mean(r.post),
            difference: r
                .difference
                .map(|d| format!("{d:+.2}"))
                .unwrap_or_else(|| "-".to_string()),
            pre_count: r.pre_count,
            post_count: r.post_count,
        })
        .collect()
}

impl From<&YearMonthResult> for YearMonthPage {
    fn from(r: &YearMonthResult) -> Self {
        let t = &r.totals;
        let totals = [
            ("Reservations", t.reservations as u64),
            ("Participants", t.participants),
            ("Male", t.male),
            ("Female", t.female),
            ("Room nights", u64::try_from(t.room_nights).unwrap_or(0)),
            ("Meals served", t.meals),
            ("Program sessions", t.program_sessions as u64),
        ]
        .into_iter()
        .map(|(label, count)| CountRow {
            label: label.to_string(),
            count,
        })
        .collect();

        let mut effectiveness: Vec<PrePostSection> = r
            .effectiveness
            .iter()
            .map(|e| PrePostSection {
                title: e.label.clone(),
                rows: pre_post_rows(&e.scales),
            })
            .collect();
        effectiveness.push(PrePostSection {
            title: "HRV".to_string(),
            rows: pre_post_rows(&r.hrv.metrics),
        });

        YearMonthPage {
            from: r.from.to_string(),
            to: r.to.to_string(),
            totals,
            revenue: fmt_money(t.revenue),
            sections: vec![
                CountSection {
                    title: "Participant type",
                    rows: count_rows(&r.by_participant_type),
                },
                CountSection {
                    title: "Age group",
                    rows: count_rows(&r.by_age_group),
                },
                CountSection {
                    title: "Service type",
                    rows: count_rows(&r.by_service_type),
                },
                CountSection {
                    title: "Business category",
                    rows: count_rows(&r.by_business_category),
                },
                CountSection {
                    title: "Region",
                    rows: count_rows(&r.by_region),
                },
            ],
            months: r
                .by_month
                .iter()
                .map(|m| CountRow {
                    label: m.month.clone(),
                    count: m.reservations as u64,
                })
                .collect(),
            facility: r
                .facility
                .scales
                .iter()
                .map(|s| MeanRow {
                    label: s.label.clone(),
                    mean: fmt_mean(s.mean),
                    responses: s.responses,
                })
                .collect(),
            facility_overall: fmt_mean(r.facility.overall),
            effectiveness,
        }
    }
}

pub async fn year_month(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Html<String>, AppError> {
    let (from, to) = range.resolve();
    let result = with_db(&state, |db| reports::year_month_result(db, from, to))?;
    render(&YearMonthPage::from(&result))
}

struct PlanLine {
    date: String,
    time: String,
    item: String,
    detail: String,
    count: String,
}

struct CostRow {
    category: &'static str,
    description: String,
    quantity: i64,
    unit_price: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "plan.html")]
struct PlanPage {
    id: String,
    group_name: String,
    contact: String,
    period: String,
    service_type: &'static str,
    status: &'static str,
    participants_total: u32,
    participants: Vec<CountRow>,
    schedule: Vec<PlanLine>,
    rooms: Vec<PlanLine>,
    cost: Vec<CostRow>,
    subtotal: String,
    discount: String,
    total: String,
}

impl From<&ImplementationPlan> for PlanPage {
    fn from(plan: &ImplementationPlan) -> Self {
        let r = &plan.reservation;
        let contact = match &r.contact_phone {
            Some(phone) => format!("{} ({phone})", r.contact_name),
            None => r.contact_name.clone(),
        };

        let mut schedule = Vec::new();
        for day in &plan.schedule.days {
            for s in &day.sessions {
                schedule.push(PlanLine {
                    date: day.date.to_string(),
                    time: format!("{}-{}", s.start_time.format("%H:%M"), s.end_time.format("%H:%M")),
                    item: s.program_name.clone(),
                    detail: s.place.clone().unwrap_or_default(),
                    count: s.participants.to_string(),
                });
            }
            for m in &day.meals {
                schedule.push(PlanLine {
                    date: day.date.to_string(),
                    time: String::new(),
                    item: m.meal_type.label().to_string(),
                    detail: String::new(),
                    count: m.headcount.to_string(),
                });
            }
        }

        let rooms = plan
            .rooms
            .rooms
            .iter()
            .flat_map(|room| {
                room.nights.iter().map(move |night| PlanLine {
                    date: night.date.to_string(),
                    time: String::new(),
                    item: room.room_name.clone(),
                    detail: format!("capacity {}", room.capacity),
                    count: night.occupants.to_string(),
                })
            })
            .collect();

        let cost = plan
            .cost
            .lines
            .iter()
            .map(|l| CostRow {
                category: l.category.label(),
                description: l.description.clone(),
                quantity: l.quantity,
                unit_price: fmt_money(l.unit_price),
                amount: fmt_money(l.amount),
            })
            .collect();

        PlanPage {
            id: r.id.clone(),
            group_name: r.group_name.clone(),
            contact,
            period: format!("{} ~ {} ({} nights)", r.start_date, r.end_date, r.nights()),
            service_type: r.service_type.label(),
            status: r.status.label(),
            participants_total: plan.participants.total,
            participants: count_rows(&plan.participants.by_type),
            schedule,
            rooms,
            cost,
            subtotal: fmt_money(plan.cost.subtotal),
            discount: format!(
                "{}% (-{})",
                plan.cost.discount_percent,
                fmt_money(plan.cost.discount_amount)
            ),
            total: fmt_money(plan.cost.total),
        }
    }
}

pub async fn plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let plan = with_db(&state, |db| schedule::implementation_plan(db, &id))?;
    render(&PlanPage::from(&plan))
}

fn render(page: &impl Template) -> Result<Html<String>, AppError> {
    page.render()
        .map(Html)
        .map_err(|e| AppError::from(Error::from(e)))
}
