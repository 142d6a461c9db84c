//! Spreadsheet export. Every export is plain CSV that opens directly in a
//! spreadsheet program.

use serde::Serialize;
use std::io::Write;

use crate::db::{Database, ReservationFilter};
use crate::error::{Error, Result};
use crate::models::Reservation;
use crate::reports::{ProgramList, YearMonthResult, fmt_mean};
use crate::schedule::ImplementationPlan;

#[derive(Debug, Serialize)]
struct ReservationRow<'a> {
    id: &'a str,
    group_name: &'a str,
    contact_name: &'a str,
    contact_phone: Option<&'a str>,
    region: Option<&'a str>,
    business_category: &'static str,
    service_type: &'static str,
    start_date: String,
    end_date: String,
    nights: i64,
    status: &'static str,
    participants: u32,
    total_cost: Option<i64>,
}

/// Reservation list with head counts.
pub fn write_reservations<W: Write>(db: &Database, filter: &ReservationFilter, out: W) -> Result<W> {
    let reservations = db.list_reservations(filter)?;
    let mut wtr = csv::Writer::from_writer(out);
    for r in &reservations {
        let participants = db.participants(&r.id)?.iter().map(|p| p.total()).sum();
        wtr.serialize(reservation_row(r, participants))?;
    }
    if reservations.is_empty() {
        wtr.write_record(RESERVATION_HEADERS)?;
    }
    finish(wtr)
}

const RESERVATION_HEADERS: [&str; 13] = [
    "id",
    "group_name",
    "contact_name",
    "contact_phone",
    "region",
    "business_category",
    "service_type",
    "start_date",
    "end_date",
    "nights",
    "status",
    "participants",
    "total_cost",
];

fn reservation_row(r: &Reservation, participants: u32) -> ReservationRow<'_> {
    ReservationRow {
        id: &r.id,
        group_name: &r.group_name,
        contact_name: &r.contact_name,
        contact_phone: r.contact_phone.as_deref(),
        region: r.region.as_deref(),
        business_category: r.business_category.as_str(),
        service_type: r.service_type.as_str(),
        start_date: r.start_date.to_string(),
        end_date: r.end_date.to_string(),
        nights: r.nights(),
        status: r.status.as_str(),
        participants,
        total_cost: r.total_cost,
    }
}

const REPORT_HEADERS: [&str; 8] = [
    "section", "key", "label", "count", "mean", "pre", "post", "difference",
];

/// One report row; blank cells where a column does not apply.
#[derive(Default)]
struct ReportRow {
    section: String,
    key: String,
    label: String,
    count: String,
    mean: String,
    pre: String,
    post: String,
    difference: String,
}

impl ReportRow {
    fn new(section: &str, key: &str, label: &str) -> Self {
        ReportRow {
            section: section.to_string(),
            key: key.to_string(),
            label: label.to_string(),
            ..ReportRow::default()
        }
    }

    fn count(mut self, count: impl ToString) -> Self {
        self.count = count.to_string();
        self
    }

    fn mean(mut self, mean: Option<f64>) -> Self {
        self.mean = fmt_mean(mean);
        self
    }

    fn pre_post(mut self, pre: Option<f64>, post: Option<f64>, difference: Option<f64>) -> Self {
        self.pre = fmt_mean(pre);
        self.post = fmt_mean(post);
        self.difference = fmt_mean(difference);
        self
    }

    fn write<W: Write>(self, wtr: &mut csv::Writer<W>) -> Result<()> {
        wtr.write_record([
            self.section,
            self.key,
            self.label,
            self.count,
            self.mean,
            self.pre,
            self.post,
            self.difference,
        ])?;
        Ok(())
    }
}

/// Year-Month Result flattened into one sheet, one row per figure.
pub fn write_year_month<W: Write>(report: &YearMonthResult, out: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(REPORT_HEADERS)?;

    let t = &report.totals;
    for (key, value) in [
        ("reservations", t.reservations.to_string()),
        ("participants", t.participants.to_string()),
        ("male", t.male.to_string()),
        ("female", t.female.to_string()),
        ("room_nights", t.room_nights.to_string()),
        ("meals", t.meals.to_string()),
        ("program_sessions", t.program_sessions.to_string()),
        ("revenue", t.revenue.to_string()),
    ] {
        ReportRow::new("totals", key, key).count(value).write(&mut wtr)?;
    }

    for (section, entries) in [
        ("participant_type", &report.by_participant_type),
        ("age_group", &report.by_age_group),
        ("service_type", &report.by_service_type),
        ("business_category", &report.by_business_category),
        ("region", &report.by_region),
    ] {
        for e in entries {
            ReportRow::new(section, &e.key, &e.label)
                .count(e.count)
                .write(&mut wtr)?;
        }
    }
    for m in &report.by_month {
        ReportRow::new("month", &m.month, &m.month)
            .count(m.reservations)
            .write(&mut wtr)?;
    }

    for s in &report.facility.scales {
        ReportRow::new("facility", &s.key, &s.label)
            .count(s.responses)
            .mean(s.mean)
            .write(&mut wtr)?;
    }
    ReportRow::new("facility", "overall_mean", "Overall")
        .count(report.facility.responses)
        .mean(report.facility.overall)
        .write(&mut wtr)?;

    for e in &report.effectiveness {
        for s in &e.scales {
            ReportRow::new(e.kind.as_str(), &s.key, &s.label)
                .count(s.pre_count + s.post_count)
                .pre_post(s.pre, s.post, s.difference)
                .write(&mut wtr)?;
        }
    }
    for m in &report.hrv.metrics {
        ReportRow::new("hrv", &m.key, &m.label)
            .count(m.pre_count + m.post_count)
            .pre_post(m.pre, m.post, m.difference)
            .write(&mut wtr)?;
    }
    finish(wtr)
}

/// Program List, one row per program.
pub fn write_program_list<W: Write>(list: &ProgramList, out: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(out);
    let scales = crate::models::SurveyKind::Program.scales();
    let mut header = vec![
        "program".to_string(),
        "category".to_string(),
        "instructor".to_string(),
        "sessions".to_string(),
        "participants".to_string(),
        "responses".to_string(),
    ];
    header.extend(scales.iter().map(|s| format!("{}_mean", s.key)));
    header.push("overall_mean".to_string());
    wtr.write_record(&header)?;

    for p in &list.programs {
        let mut row = vec![
            p.name.clone(),
            p.category.as_str().to_string(),
            p.instructor.clone().unwrap_or_default(),
            p.sessions.to_string(),
            p.participants.to_string(),
            p.responses.to_string(),
        ];
        row.extend(p.scales.iter().map(|s| fmt_mean(s.mean)));
        row.push(fmt_mean(p.overall));
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

const PLAN_HEADERS: [&str; 6] = ["section", "date", "item", "detail", "quantity", "amount"];

/// A reservation's implementation plan as a printable sheet.
pub fn write_plan<W: Write>(plan: &ImplementationPlan, out: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(PLAN_HEADERS)?;
    let r = &plan.reservation;
    let period = format!("{} ~ {}", r.start_date, r.end_date);

    for (item, detail) in [
        ("group", r.group_name.as_str()),
        ("contact", r.contact_name.as_str()),
        ("period", period.as_str()),
        ("service_type", r.service_type.label()),
        ("status", r.status.label()),
    ] {
        wtr.write_record(["reservation", "", item, detail, "", ""])?;
    }

    for row in &plan.participants.rows {
        let detail = format!("{} / {}", row.participant_type.label(), row.age_group.label());
        let quantity = row.total().to_string();
        wtr.write_record(["participants", "", "group", detail.as_str(), quantity.as_str(), ""])?;
    }

    for day in &plan.schedule.days {
        let date = day.date.to_string();
        for s in &day.sessions {
            let detail = format!(
                "{}-{} {}",
                s.start_time.format("%H:%M"),
                s.end_time.format("%H:%M"),
                s.place.as_deref().unwrap_or("")
            );
            let quantity = s.participants.to_string();
            wtr.write_record([
                "program",
                date.as_str(),
                s.program_name.as_str(),
                detail.trim_end(),
                quantity.as_str(),
                "",
            ])?;
        }
        for m in &day.meals {
            let quantity = m.headcount.to_string();
            wtr.write_record(["meal", date.as_str(), m.meal_type.label(), "", quantity.as_str(), ""])?;
        }
    }

    for room in &plan.rooms.rooms {
        for night in &room.nights {
            let date = night.date.to_string();
            let quantity = night.occupants.to_string();
            wtr.write_record([
                "room",
                date.as_str(),
                room.room_name.as_str(),
                "",
                quantity.as_str(),
                "",
            ])?;
        }
    }

    for line in &plan.cost.lines {
        let quantity = line.quantity.to_string();
        let amount = line.amount.to_string();
        wtr.write_record([
            "cost",
            "",
            line.category.label(),
            line.description.as_str(),
            quantity.as_str(),
            amount.as_str(),
        ])?;
    }
    let discount = format!("{}%", plan.cost.discount_percent);
    let discount_amount = (-plan.cost.discount_amount).to_string();
    let total = plan.cost.total.to_string();
    wtr.write_record(["cost", "", "discount", discount.as_str(), "", discount_amount.as_str()])?;
    wtr.write_record(["cost", "", "total", "", "", total.as_str()])?;
    finish(wtr)
}

fn finish<W: Write>(mut wtr: csv::Writer<W>) -> Result<W> {
    wtr.flush()?;
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Render any export into an in-memory string for HTTP responses.
pub fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
}
