use chrono::{NaiveDate, NaiveTime};
use cucumber::given;

use crate::RetreatWorld;
use crate::steps::common_steps::open_db;
use retreat::intake::{self, FinalInput, GroupInfo, LodgingInput, SessionInput};
use retreat::models::{
    AgeGroup, BusinessCategory, ParticipantCount, ParticipantType, ServiceType, SurveyKind,
    SurveyPhase,
};
use retreat::surveys::{self, SurveyInput};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date as YYYY-MM-DD")
}

/// A reservation pushed through every intake page and confirmed. The group
/// does one session of program `program` on arrival day.
#[given(
    expr = "a confirmed {string} reservation {string} for {int} people from {string} to {string} doing {string}"
)]
async fn a_confirmed_reservation(
    world: &mut RetreatWorld,
    service: String,
    alias: String,
    people: u32,
    start: String,
    end: String,
    program: String,
) {
    let db = open_db(world);
    let service_type = ServiceType::from_str(&service).expect("service type");
    let program = match db
        .list_programs(true)
        .expect("list programs")
        .into_iter()
        .find(|p| p.name == program)
    {
        Some(p) => p,
        None => retreat::catalog::add_program(&db, &program, service_type, None, 10_000)
            .expect("add program"),
    };

    let r = intake::submit_group_info(
        &db,
        None,
        GroupInfo {
            group_name: format!("Group {alias}"),
            contact_name: "Contact".to_string(),
            contact_phone: None,
            contact_email: None,
            region: Some("Gangwon".to_string()),
            business_category: BusinessCategory::SocialContribution,
            service_type,
            start_date: date(&start),
            end_date: date(&end),
            notes: None,
        },
    )
    .expect("page 1");
    let male = people / 2;
    intake::submit_participants(
        &db,
        &r.id,
        vec![ParticipantCount {
            participant_type: ParticipantType::General,
            age_group: AgeGroup::Adult,
            male,
            female: people - male,
        }],
    )
    .expect("page 2");
    intake::submit_programs(
        &db,
        &r.id,
        vec![SessionInput {
            program_id: program.id,
            date: date(&start),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).expect("time"),
            place: None,
            participants: people,
        }],
    )
    .expect("page 3");
    intake::submit_lodging(&db, &r.id, LodgingInput::default()).expect("page 4");
    intake::confirm(&db, &r.id, FinalInput::default()).expect("final page");

    world.ids.insert(alias, r.id);
}

/// Record matching pre and post questionnaires with flat scores.
#[given(expr = "{string} answered {string} surveys scoring {int} before and {int} after")]
async fn answered_surveys(
    world: &mut RetreatWorld,
    alias: String,
    kind: String,
    pre: u8,
    post: u8,
) {
    let db = open_db(world);
    let id = world.ids.get(&alias).expect("unknown reservation alias").clone();
    let kind = SurveyKind::from_str(&kind).expect("survey kind");
    for (phase, score) in [(SurveyPhase::Pre, pre), (SurveyPhase::Post, post)] {
        surveys::record_survey(
            &db,
            &id,
            SurveyInput {
                kind,
                phase,
                respondent: "respondent-1".to_string(),
                program_id: None,
                scores: vec![score; kind.item_count()],
            },
        )
        .expect("record survey");
    }
}

/// A two-person draft with pages 1 to 3 done, waiting on rooms and meals.
#[given(expr = "a draft reservation {string} from {string} to {string} ready for lodging")]
async fn a_draft_ready_for_lodging(world: &mut RetreatWorld, alias: String, start: String, end: String) {
    let db = open_db(world);
    let r = intake::submit_group_info(
        &db,
        None,
        GroupInfo {
            group_name: format!("Group {alias}"),
            contact_name: "Contact".to_string(),
            contact_phone: None,
            contact_email: None,
            region: None,
            business_category: BusinessCategory::Profit,
            service_type: ServiceType::Healing,
            start_date: date(&start),
            end_date: date(&end),
            notes: None,
        },
    )
    .expect("page 1");
    intake::submit_participants(
        &db,
        &r.id,
        vec![ParticipantCount {
            participant_type: ParticipantType::General,
            age_group: AgeGroup::Adult,
            male: 1,
            female: 1,
        }],
    )
    .expect("page 2");
    intake::submit_programs(&db, &r.id, Vec::new()).expect("page 3");
    world.ids.insert(alias, r.id);
}
