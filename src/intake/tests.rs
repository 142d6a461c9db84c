use super::*;
use crate::models::{AgeGroup, ParticipantType};
use crate::testing::{date, time};

fn group_info(start: &str, end: &str) -> GroupInfo {
    GroupInfo {
        group_name: "Maple Senior Center".into(),
        contact_name: "Park".into(),
        contact_phone: Some(" 010-1234-5678 ".into()),
        contact_email: Some("".into()),
        region: Some("Seoul".into()),
        business_category: BusinessCategory::SocialContribution,
        service_type: ServiceType::Healing,
        start_date: date(start),
        end_date: date(end),
        notes: None,
    }
}

fn twelve_adults() -> Vec<ParticipantCount> {
    vec![ParticipantCount {
        participant_type: ParticipantType::General,
        age_group: AgeGroup::Adult,
        male: 5,
        female: 7,
    }]
}

fn session(program_id: i64, day: &str, start: &str, end: &str) -> SessionInput {
    SessionInput {
        program_id,
        date: date(day),
        start_time: time(start),
        end_time: time(end),
        place: None,
        participants: 12,
    }
}

/// Draft with pages 1 to 3 done and one program in the catalog.
fn drafted(db: &Database) -> (Reservation, i64) {
    let program = db
        .insert_program("Forest walk", ServiceType::Healing, Some("Lee"), 20_000)
        .unwrap();
    let r = submit_group_info(db, None, group_info("2026-05-01", "2026-05-03")).unwrap();
    submit_participants(db, &r.id, twelve_adults()).unwrap();
    submit_programs(db, &r.id, vec![session(program.id, "2026-05-01", "10:00", "12:00")]).unwrap();
    (db.require_reservation(&r.id).unwrap(), program.id)
}

#[test]
fn page1_creates_trimmed_draft() {
    let db = Database::open_in_memory().unwrap();
    let r = submit_group_info(&db, None, group_info("2026-05-01", "2026-05-03")).unwrap();
    assert_eq!(r.status, ReservationStatus::Draft);
    assert_eq!(r.stage, IntakeStage::Page1);
    assert_eq!(r.contact_phone.as_deref(), Some("010-1234-5678"));
    assert_eq!(r.contact_email, None);
    assert!(r.id.starts_with("rsv-"));
}

#[test]
fn page1_rejects_reversed_dates_and_blank_names() {
    let db = Database::open_in_memory().unwrap();
    let err = submit_group_info(&db, None, group_info("2026-05-03", "2026-05-01")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let mut blank = group_info("2026-05-01", "2026-05-03");
    blank.group_name = "  ".into();
    assert!(matches!(
        submit_group_info(&db, None, blank),
        Err(Error::Validation(_))
    ));
}

#[test]
fn pages_must_be_completed_in_order() {
    let db = Database::open_in_memory().unwrap();
    let program = db
        .insert_program("Tea ceremony", ServiceType::Healing, None, 10_000)
        .unwrap();
    let r = submit_group_info(&db, None, group_info("2026-05-01", "2026-05-02")).unwrap();

    let err = submit_programs(&db, &r.id, vec![session(program.id, "2026-05-01", "09:00", "10:00")])
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err}");

    let after_page2 = submit_participants(&db, &r.id, twelve_adults()).unwrap();
    assert_eq!(after_page2.stage, IntakeStage::Page2);

    let err = confirm(&db, &r.id, FinalInput::default()).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn resubmitting_an_earlier_page_keeps_the_furthest_stage() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    assert_eq!(r.stage, IntakeStage::Page3);
    let again = submit_participants(&db, &r.id, twelve_adults()).unwrap();
    assert_eq!(again.stage, IntakeStage::Page3);
}

#[test]
fn page2_rejects_empty_and_duplicate_rows() {
    let db = Database::open_in_memory().unwrap();
    let r = submit_group_info(&db, None, group_info("2026-05-01", "2026-05-02")).unwrap();
    assert!(matches!(
        submit_participants(&db, &r.id, vec![]),
        Err(Error::Validation(_))
    ));
    let mut rows = twelve_adults();
    rows.extend(twelve_adults());
    assert!(matches!(
        submit_participants(&db, &r.id, rows),
        Err(Error::Validation(_))
    ));
}

#[test]
fn page3_rejects_overlaps_and_out_of_stay_dates() {
    let db = Database::open_in_memory().unwrap();
    let (r, program) = drafted(&db);

    let overlapping = vec![
        session(program, "2026-05-02", "10:00", "12:00"),
        session(program, "2026-05-02", "11:30", "13:00"),
    ];
    assert!(matches!(
        submit_programs(&db, &r.id, overlapping),
        Err(Error::Conflict(_))
    ));

    let back_to_back = vec![
        session(program, "2026-05-02", "10:00", "12:00"),
        session(program, "2026-05-02", "12:00", "13:00"),
    ];
    assert_eq!(submit_programs(&db, &r.id, back_to_back).unwrap().len(), 2);

    let outside = vec![session(program, "2026-05-04", "10:00", "12:00")];
    assert!(matches!(
        submit_programs(&db, &r.id, outside),
        Err(Error::Validation(_))
    ));

    let mut crowded = session(program, "2026-05-02", "10:00", "12:00");
    crowded.participants = 13;
    assert!(matches!(
        submit_programs(&db, &r.id, vec![crowded]),
        Err(Error::Validation(_))
    ));
}

#[test]
fn page4_blocks_double_booking_across_reservations() {
    let db = Database::open_in_memory().unwrap();
    let room = db.insert_room("Cedar 101", 4, 90_000).unwrap();
    let (first, _) = drafted(&db);
    let second = submit_group_info(&db, None, group_info("2026-05-02", "2026-05-04")).unwrap();
    submit_participants(&db, &second.id, twelve_adults()).unwrap();
    submit_programs(&db, &second.id, vec![]).unwrap();

    let lodging = |check_in: &str, check_out: &str| LodgingInput {
        rooms: vec![RoomInput {
            room_id: room.id,
            check_in: date(check_in),
            check_out: date(check_out),
            occupants: 4,
        }],
        meals: vec![],
    };

    submit_lodging(&db, &first.id, lodging("2026-05-01", "2026-05-03")).unwrap();
    let err = submit_lodging(&db, &second.id, lodging("2026-05-02", "2026-05-04")).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err}");

    // Checking in on the other group's check-out day is fine.
    let ok = submit_lodging(&db, &second.id, lodging("2026-05-03", "2026-05-04")).unwrap();
    assert_eq!(ok.stage, IntakeStage::Page4);
}

#[test]
fn page4_checks_capacity_and_duplicate_meals() {
    let db = Database::open_in_memory().unwrap();
    let room = db.insert_room("Birch 201", 2, 60_000).unwrap();
    let (r, _) = drafted(&db);

    let too_many = LodgingInput {
        rooms: vec![RoomInput {
            room_id: room.id,
            check_in: date("2026-05-01"),
            check_out: date("2026-05-02"),
            occupants: 3,
        }],
        meals: vec![],
    };
    assert!(matches!(
        submit_lodging(&db, &r.id, too_many),
        Err(Error::Validation(_))
    ));

    let lunch = MealInput {
        date: date("2026-05-01"),
        meal_type: MealType::Lunch,
        headcount: 12,
    };
    let twice = LodgingInput {
        rooms: vec![],
        meals: vec![lunch.clone(), lunch],
    };
    assert!(matches!(
        submit_lodging(&db, &r.id, twice),
        Err(Error::Validation(_))
    ));
}

#[test]
fn confirm_prices_and_locks_in_total() {
    let db = Database::open_in_memory().unwrap();
    let room = db.insert_room("Cedar 101", 4, 90_000).unwrap();
    db.set_config("meal_price.dinner", "9000").unwrap();
    let (r, _) = drafted(&db);
    submit_lodging(
        &db,
        &r.id,
        LodgingInput {
            rooms: vec![RoomInput {
                room_id: room.id,
                check_in: date("2026-05-01"),
                check_out: date("2026-05-03"),
                occupants: 4,
            }],
            meals: vec![MealInput {
                date: date("2026-05-01"),
                meal_type: MealType::Dinner,
                headcount: 12,
            }],
        },
    )
    .unwrap();

    let breakdown = confirm(
        &db,
        &r.id,
        FinalInput {
            discount_percent: 50,
            expenses: vec![ExpenseInput {
                description: "Bus rental".into(),
                amount: 100_000,
            }],
        },
    )
    .unwrap();

    // 12 x 20,000 + 2 x 90,000 + 12 x 9,000 + 100,000
    assert_eq!(breakdown.subtotal, 628_000);
    assert_eq!(breakdown.total, 314_000);

    let stored = db.require_reservation(&r.id).unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
    assert_eq!(stored.stage, IntakeStage::Final);
    assert_eq!(stored.total_cost, Some(314_000));
    assert_eq!(stored.discount_percent, 50);
}

#[test]
fn completed_reservations_are_read_only() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    submit_lodging(&db, &r.id, LodgingInput::default()).unwrap();
    confirm(&db, &r.id, FinalInput::default()).unwrap();
    change_status(&db, &r.id, ReservationStatus::Completed).unwrap();

    let err = submit_participants(&db, &r.id, twelve_adults()).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let err = change_status(&db, &r.id, ReservationStatus::Draft).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn moving_dates_must_keep_schedule_inside_stay() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    let err = submit_group_info(&db, Some(&r.id), group_info("2026-05-02", "2026-05-03")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let widened = submit_group_info(&db, Some(&r.id), group_info("2026-04-30", "2026-05-03")).unwrap();
    assert_eq!(widened.start_date, date("2026-04-30"));
    assert_eq!(widened.stage, IntakeStage::Page3);
}

#[test]
fn reopening_clears_the_locked_total() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    submit_lodging(&db, &r.id, LodgingInput::default()).unwrap();
    confirm(&db, &r.id, FinalInput::default()).unwrap();
    let reopened = change_status(&db, &r.id, ReservationStatus::Draft).unwrap();
    assert_eq!(reopened.status, ReservationStatus::Draft);
    assert_eq!(reopened.total_cost, None);
}

#[test]
fn only_drafts_and_cancelled_bookings_can_be_discarded() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    submit_lodging(&db, &r.id, LodgingInput::default()).unwrap();
    confirm(&db, &r.id, FinalInput::default()).unwrap();
    assert!(matches!(discard(&db, &r.id), Err(Error::Conflict(_))));

    change_status(&db, &r.id, ReservationStatus::Cancelled).unwrap();
    discard(&db, &r.id).unwrap();
    assert!(db.get_reservation(&r.id).unwrap().is_none());
    assert!(db.participants(&r.id).unwrap().is_empty());
}

#[test]
fn editing_a_confirmed_booking_reprices_it() {
    let db = Database::open_in_memory().unwrap();
    let (r, program_id) = drafted(&db);
    submit_lodging(&db, &r.id, LodgingInput::default()).unwrap();
    let first = confirm(
        &db,
        &r.id,
        FinalInput {
            discount_percent: 10,
            expenses: vec![],
        },
    )
    .unwrap();
    assert_eq!(first.total, 216_000);

    submit_programs(
        &db,
        &r.id,
        vec![
            session(program_id, "2026-05-01", "10:00", "12:00"),
            session(program_id, "2026-05-01", "14:00", "16:00"),
        ],
    )
    .unwrap();

    let stored = db.require_reservation(&r.id).unwrap();
    let cost = preview_cost(&db, &r.id, None).unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
    assert_eq!(cost.total, 432_000);
    assert_eq!(stored.total_cost, Some(cost.total));

    let report =
        crate::reports::year_month_result(&db, date("2026-01-01"), date("2026-12-31")).unwrap();
    assert_eq!(report.totals.revenue, cost.total);
}

#[test]
fn oversized_groups_are_rejected() {
    let db = Database::open_in_memory().unwrap();
    let r = submit_group_info(&db, None, group_info("2026-05-01", "2026-05-02")).unwrap();
    for (male, female) in [(u32::MAX, 1), (60_000, 50_000)] {
        let rows = vec![ParticipantCount {
            participant_type: ParticipantType::General,
            age_group: AgeGroup::Adult,
            male,
            female,
        }];
        let err = submit_participants(&db, &r.id, rows).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err}");
    }
    assert!(db.participants(&r.id).unwrap().is_empty());
    assert_eq!(db.require_reservation(&r.id).unwrap().stage, IntakeStage::Page1);
}

#[test]
fn confirming_an_unpriceable_booking_fails_cleanly() {
    let db = Database::open_in_memory().unwrap();
    let (r, _) = drafted(&db);
    submit_lodging(&db, &r.id, LodgingInput::default()).unwrap();
    let err = confirm(
        &db,
        &r.id,
        FinalInput {
            discount_percent: 0,
            expenses: vec![
                ExpenseInput {
                    description: "Charter".into(),
                    amount: i64::MAX,
                },
                ExpenseInput {
                    description: "Tip".into(),
                    amount: 1,
                },
            ],
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err}");
    assert_eq!(
        db.require_reservation(&r.id).unwrap().status,
        ReservationStatus::Draft
    );
}
