use chrono::NaiveDate;
use std::path::Path;
use tabled::Tabled;

use super::{CmdResult, heading, fmt_money, open_db, print_json, print_table};
use retreat::reports::{self, PrePost, fmt_mean};
use retreat::schedule::CountEntry;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "COUNT")]
    count: u64,
}

#[derive(Tabled)]
struct PrePostRow {
    #[tabled(rename = "SCALE")]
    label: String,
    #[tabled(rename = "PRE")]
    pre: String,
    #[tabled(rename = "POST")]
    post: String,
    #[tabled(rename = "CHANGE")]
    difference: String,
    #[tabled(rename = "N")]
    n: String,
}

#[derive(Tabled)]
struct ProgramRow {
    #[tabled(rename = "PROGRAM")]
    name: String,
    #[tabled(rename = "SESSIONS")]
    sessions: usize,
    #[tabled(rename = "PEOPLE")]
    participants: u64,
    #[tabled(rename = "RESPONSES")]
    responses: usize,
    #[tabled(rename = "INSTRUCTOR")]
    instructor: String,
    #[tabled(rename = "CONTENT")]
    content: String,
    #[tabled(rename = "EFFECT")]
    effectiveness: String,
    #[tabled(rename = "OVERALL")]
    overall: String,
}

fn counts(entries: &[CountEntry]) -> Vec<CountRow> {
    entries
        .iter()
        .filter(|e| e.count > 0)
        .map(|e| CountRow {
            label: e.label.clone(),
            count: e.count,
        })
        .collect()
}

fn pre_post(rows: &[PrePost]) -> Vec<PrePostRow> {
    rows.iter()
        .map(|r| PrePostRow {
            label: r.label.clone(),
            pre: fmt_mean(r.pre),
            post: fmt_mean(r.post),
            difference: r
                .difference
                .map(|d| format!("{d:+.2}"))
                .unwrap_or_else(|| "-".to_string()),
            n: format!("{}/{}", r.pre_count, r.post_count),
        })
        .collect()
}

pub fn year_month(db_path: &Path, from: NaiveDate, to: NaiveDate, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let result = reports::year_month_result(&db, from, to)?;
    if json {
        return print_json(&result);
    }

    let t = &result.totals;
    heading(&format!("Year-Month Result {from} ~ {to}"));
    println!(
        "  {} reservations, {} participants ({} male, {} female)",
        t.reservations, t.participants, t.male, t.female
    );
    println!(
        "  {} room nights, {} meals, {} program sessions, revenue {}",
        t.room_nights,
        t.meals,
        t.program_sessions,
        fmt_money(t.revenue)
    );

    for (title, entries) in [
        ("Participant type", &result.by_participant_type),
        ("Age group", &result.by_age_group),
        ("Service type", &result.by_service_type),
        ("Region", &result.by_region),
    ] {
        println!();
        heading(title);
        print_table(counts(entries), "  none");
    }

    println!();
    heading("Facility satisfaction");
    for s in &result.facility.scales {
        println!("  {:<12} {:>5}  (n={})", s.label, fmt_mean(s.mean), s.responses);
    }
    println!("  {:<12} {:>5}", "Overall", fmt_mean(result.facility.overall));

    for e in &result.effectiveness {
        println!();
        heading(&e.label);
        print_table(pre_post(&e.scales), "  no responses");
    }
    println!();
    heading("HRV");
    print_table(pre_post(&result.hrv.metrics), "  no readings");
    Ok(())
}

pub fn programs(db_path: &Path, from: NaiveDate, to: NaiveDate, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let list = reports::program_list(&db, from, to)?;
    if json {
        return print_json(&list);
    }
    let rows = list
        .programs
        .into_iter()
        .map(|p| {
            let scale = |i: usize| fmt_mean(p.scales.get(i).and_then(|s| s.mean));
            ProgramRow {
                instructor: scale(0),
                content: scale(1),
                effectiveness: scale(2),
                overall: fmt_mean(p.overall),
                name: p.name.clone(),
                sessions: p.sessions,
                participants: p.participants,
                responses: p.responses,
            }
        })
        .collect();
    heading(&format!("Program List {from} ~ {to}"));
    print_table(rows, "No programs ran in this period.");
    Ok(())
}
