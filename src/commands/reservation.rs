use chrono::NaiveDate;
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use super::{CmdResult, format_status, heading, fmt_money, open_db, print_json, print_table};
use retreat::db::ReservationFilter;
use retreat::intake;
use retreat::models::ReservationStatus;
use retreat::schedule;

#[derive(Tabled)]
struct ReservationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "DATES")]
    dates: String,
    #[tabled(rename = "SERVICE")]
    service: &'static str,
    #[tabled(rename = "PEOPLE")]
    people: u32,
    #[tabled(rename = "STATUS")]
    status: &'static str,
    #[tabled(rename = "STAGE")]
    stage: &'static str,
    #[tabled(rename = "TOTAL")]
    total: String,
}

pub fn list(
    db_path: &Path,
    status: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    all: bool,
    json: bool,
) -> CmdResult {
    let db = open_db(db_path)?;
    let status = status.map(ReservationStatus::from_str).transpose()?;
    let filter = ReservationFilter {
        status,
        from,
        to,
        include_cancelled: all || status == Some(ReservationStatus::Cancelled),
    };
    let reservations = db.list_reservations(&filter)?;
    if json {
        return print_json(&reservations);
    }

    let mut rows = Vec::with_capacity(reservations.len());
    for r in reservations {
        rows.push(ReservationRow {
            people: intake::participant_total(&db, &r.id)?,
            id: r.id,
            group: r.group_name,
            dates: format!("{} ~ {}", r.start_date, r.end_date),
            service: r.service_type.label(),
            status: r.status.as_str(),
            stage: r.stage.label(),
            total: r.total_cost.map(fmt_money).unwrap_or_else(|| "-".to_string()),
        });
    }
    print_table(rows, "No reservations found.");
    Ok(())
}

pub fn show(db_path: &Path, id: &str, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let plan = schedule::implementation_plan(&db, id)?;
    if json {
        return print_json(&plan);
    }

    let r = &plan.reservation;
    println!("{}  {}", r.id.bold(), r.group_name);
    println!("  Status:   {} ({})", format_status(r.status), r.stage.label());
    println!("  Dates:    {} ~ {} ({} nights)", r.start_date, r.end_date, r.nights());
    println!("  Contact:  {}", r.contact_name);
    if let Some(phone) = &r.contact_phone {
        println!("  Phone:    {phone}");
    }
    if let Some(region) = &r.region {
        println!("  Region:   {region}");
    }
    println!("  Service:  {} / {}", r.service_type.label(), r.business_category.label());
    println!("  People:   {} ({} male, {} female)", plan.participants.total, plan.participants.male, plan.participants.female);

    if !plan.schedule.days.is_empty() {
        println!();
        heading("Schedule");
        for day in &plan.schedule.days {
            println!("  {}", day.date);
            for s in &day.sessions {
                println!(
                    "    {}-{}  {} ({} people)",
                    s.start_time.format("%H:%M"),
                    s.end_time.format("%H:%M"),
                    s.program_name,
                    s.participants
                );
            }
            for m in &day.meals {
                println!("    {:<11} {} meals", m.meal_type.label(), m.headcount);
            }
        }
    }

    if !plan.rooms.rooms.is_empty() {
        println!();
        heading("Rooms");
        for room in &plan.rooms.rooms {
            println!("  {:<16} {} night(s)", room.room_name, room.nights.len());
        }
    }

    println!();
    heading("Cost");
    for line in &plan.cost.lines {
        println!(
            "  {:<8} {:<28} {:>4} x {:>10} = {:>12}",
            line.category.label(),
            line.description,
            line.quantity,
            fmt_money(line.unit_price),
            fmt_money(line.amount)
        );
    }
    println!("  Subtotal {:>58}", fmt_money(plan.cost.subtotal));
    if plan.cost.discount_percent > 0 {
        println!(
            "  Discount {:>3}% {:>53}",
            plan.cost.discount_percent,
            format!("-{}", fmt_money(plan.cost.discount_amount))
        );
    }
    println!("  {} {:>61}", "Total".bold(), fmt_money(plan.cost.total).bold());
    Ok(())
}

pub fn set_status(db_path: &Path, id: &str, status: &str, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let next = ReservationStatus::from_str(status)?;
    let reservation = intake::change_status(&db, id, next)?;
    if json {
        return print_json(&reservation);
    }
    println!("{} is now {}", reservation.id, format_status(reservation.status));
    Ok(())
}
