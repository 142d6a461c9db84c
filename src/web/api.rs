use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::AppError;
use super::session::{self, CurrentUser};
use super::{AppState, with_db};
use crate::db::ReservationFilter;
use crate::intake::{
    self, CostBreakdown, FinalInput, GroupInfo, LodgingInput, SessionInput,
};
use crate::models::{
    ExpenseLine, MealOrder, ParticipantCount, Program, ProgramSession, Reservation,
    ReservationStatus, Room, RoomAssignment, ServiceType, User,
};
use crate::reports::{self, ProgramList, YearMonthResult};
use crate::schedule::{self, ImplementationPlan, RoomAssignmentView, ScheduleView, UsageReport};
use crate::surveys::{self, HrvInput, SurveyInput};
use crate::{auth, catalog, export};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (session, user) = with_db(&state, |db| {
        auth::login(db, &body.username, &body.password, state.session_hours)
    })?;
    let cookie = session::session_cookie(&session.token, state.session_hours);
    let body = LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = session::session_token(&headers) {
        with_db(&state, |db| auth::logout(db, &token))?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session::clear_cookie())],
    )
        .into_response())
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewProgram {
    pub name: String,
    pub category: ServiceType,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub unit_price: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewRoom {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub nightly_rate: i64,
}

pub async fn list_programs(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<Program>>, AppError> {
    Ok(Json(with_db(&state, |db| db.list_programs(q.all))?))
}

pub async fn create_program(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewProgram>,
) -> Result<(StatusCode, Json<Program>), AppError> {
    user.require_admin()?;
    let program = with_db(&state, |db| {
        catalog::add_program(
            db,
            &body.name,
            body.category,
            body.instructor.as_deref(),
            body.unit_price,
        )
    })?;
    Ok((StatusCode::CREATED, Json(program)))
}

pub async fn list_rooms(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(with_db(&state, |db| db.list_rooms(q.all))?))
}

pub async fn create_room(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewRoom>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    user.require_admin()?;
    let room = with_db(&state, |db| {
        catalog::add_room(db, &body.name, body.capacity, body.nightly_rate)
    })?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

pub async fn set_program_active(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<Program>, AppError> {
    user.require_admin()?;
    Ok(Json(with_db(&state, |db| {
        catalog::set_program_active(db, id, body.active)
    })?))
}

pub async fn set_room_active(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<Room>, AppError> {
    user.require_admin()?;
    Ok(Json(with_db(&state, |db| {
        catalog::set_room_active(db, id, body.active)
    })?))
}

// ---------------------------------------------------------------------------
// Reservations: intake pages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub all: bool,
}

impl From<ReservationQuery> for ReservationFilter {
    fn from(q: ReservationQuery) -> Self {
        ReservationFilter {
            status: q.status,
            from: q.from,
            to: q.to,
            include_cancelled: q.all || q.status == Some(ReservationStatus::Cancelled),
        }
    }
}

/// A reservation with every page's data.
#[derive(Debug, Serialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub participants: Vec<ParticipantCount>,
    pub programs: Vec<ProgramSession>,
    pub rooms: Vec<RoomAssignment>,
    pub meals: Vec<MealOrder>,
    pub expenses: Vec<ExpenseLine>,
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Query(q): Query<ReservationQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let filter = ReservationFilter::from(q);
    Ok(Json(with_db(&state, |db| db.list_reservations(&filter))?))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Json(body): Json<GroupInfo>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = with_db(&state, |db| intake::submit_group_info(db, None, body))?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReservationDetail>, AppError> {
    let detail = with_db(&state, |db| {
        Ok(ReservationDetail {
            reservation: db.require_reservation(&id)?,
            participants: db.participants(&id)?,
            programs: db.program_sessions(&id)?,
            rooms: db.room_assignments(&id)?,
            meals: db.meal_orders(&id)?,
            expenses: db.expenses(&id)?,
        })
    })?;
    Ok(Json(detail))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GroupInfo>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(with_db(&state, |db| {
        intake::submit_group_info(db, Some(&id), body)
    })?))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    with_db(&state, |db| intake::discard(db, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(rows): Json<Vec<ParticipantCount>>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(with_db(&state, |db| {
        intake::submit_participants(db, &id, rows)
    })?))
}

pub async fn put_programs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(sessions): Json<Vec<SessionInput>>,
) -> Result<Json<Vec<ProgramSession>>, AppError> {
    Ok(Json(with_db(&state, |db| {
        intake::submit_programs(db, &id, sessions)
    })?))
}

pub async fn put_lodging(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LodgingInput>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(with_db(&state, |db| intake::submit_lodging(db, &id, body))?))
}

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    pub discount: Option<u8>,
}

pub async fn get_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CostQuery>,
) -> Result<Json<CostBreakdown>, AppError> {
    Ok(Json(with_db(&state, |db| {
        intake::preview_cost(db, &id, q.discount)
    })?))
}

pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FinalInput>,
) -> Result<Json<CostBreakdown>, AppError> {
    Ok(Json(with_db(&state, |db| intake::confirm(db, &id, body))?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ReservationStatus,
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(with_db(&state, |db| {
        intake::change_status(db, &id, body.status)
    })?))
}

// ---------------------------------------------------------------------------
// Page6 tabs
// ---------------------------------------------------------------------------

pub async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleView>, AppError> {
    Ok(Json(with_db(&state, |db| schedule::schedule(db, &id))?))
}

pub async fn rooms(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoomAssignmentView>, AppError> {
    Ok(Json(with_db(&state, |db| schedule::room_assignment(db, &id))?))
}

pub async fn plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImplementationPlan>, AppError> {
    Ok(Json(with_db(&state, |db| {
        schedule::implementation_plan(db, &id)
    })?))
}

pub async fn usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UsageReport>, AppError> {
    Ok(Json(with_db(&state, |db| schedule::usage_report(db, &id))?))
}

// ---------------------------------------------------------------------------
// Surveys
// ---------------------------------------------------------------------------

pub async fn post_survey(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SurveyInput>,
) -> Result<impl IntoResponse, AppError> {
    let stored = with_db(&state, |db| surveys::record_survey(db, &id, body))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn post_hrv(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<HrvInput>,
) -> Result<impl IntoResponse, AppError> {
    let stored = with_db(&state, |db| surveys::record_hrv(db, &id, body))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// ---------------------------------------------------------------------------
// Reports and exports
// ---------------------------------------------------------------------------

/// Date range for reports; a missing end is filled from the other end's year.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RangeQuery {
    pub fn resolve(&self) -> (NaiveDate, NaiveDate) {
        reports::resolve_range(self.from, self.to, Utc::now().date_naive())
    }
}

pub async fn year_month(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<YearMonthResult>, AppError> {
    let (from, to) = range.resolve();
    Ok(Json(with_db(&state, |db| {
        reports::year_month_result(db, from, to)
    })?))
}

pub async fn programs_report(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<ProgramList>, AppError> {
    let (from, to) = range.resolve();
    Ok(Json(with_db(&state, |db| reports::program_list(db, from, to))?))
}

fn csv_response(filename: &str, bytes: Vec<u8>) -> Result<Response, AppError> {
    let body = export::into_text(bytes)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn export_reservations(
    State(state): State<AppState>,
    Query(q): Query<ReservationQuery>,
) -> Result<Response, AppError> {
    let filter = ReservationFilter::from(q);
    let bytes = with_db(&state, |db| export::write_reservations(db, &filter, Vec::new()))?;
    csv_response("reservations.csv", bytes)
}

pub async fn export_year_month(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Response, AppError> {
    let (from, to) = range.resolve();
    let bytes = with_db(&state, |db| {
        let report = reports::year_month_result(db, from, to)?;
        export::write_year_month(&report, Vec::new())
    })?;
    csv_response(&format!("year-month_{from}_{to}.csv"), bytes)
}

pub async fn export_programs(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Response, AppError> {
    let (from, to) = range.resolve();
    let bytes = with_db(&state, |db| {
        let list = reports::program_list(db, from, to)?;
        export::write_program_list(&list, Vec::new())
    })?;
    csv_response(&format!("programs_{from}_{to}.csv"), bytes)
}

pub async fn export_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let bytes = with_db(&state, |db| {
        let plan = schedule::implementation_plan(db, &id)?;
        export::write_plan(&plan, Vec::new())
    })?;
    csv_response(&format!("plan_{id}.csv"), bytes)
}
