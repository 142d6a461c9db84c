use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::MealType;

mod catalog;
mod reservations;
mod surveys;
mod users;

pub use reservations::ReservationFilter;

/// Latest schema version understood by this build.
pub const SCHEMA_VERSION: i32 = 1;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        debug!(path = %path.display(), "opened database");
        Ok(Database { conn })
    }

    /// Private in-memory database, migrated and ready to use.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Create the schema tables if they don't exist, then run any pending version-gated migrations.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reservations (
                id                TEXT PRIMARY KEY,
                group_name        TEXT NOT NULL,
                contact_name      TEXT NOT NULL,
                contact_phone     TEXT,
                contact_email     TEXT,
                region            TEXT,
                business_category TEXT NOT NULL,
                service_type      TEXT NOT NULL,
                start_date        TEXT NOT NULL,
                end_date          TEXT NOT NULL,
                status            TEXT NOT NULL DEFAULT 'draft',
                stage             TEXT NOT NULL DEFAULT 'page1',
                discount_percent  INTEGER NOT NULL DEFAULT 0,
                total_cost        INTEGER,
                notes             TEXT,
                created_at        TEXT NOT NULL,
                updated_at        TEXT NOT NULL,
                CHECK (end_date >= start_date)
            );

            CREATE TABLE IF NOT EXISTS participant_counts (
                reservation_id   TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                participant_type TEXT NOT NULL,
                age_group        TEXT NOT NULL,
                male             INTEGER NOT NULL DEFAULT 0,
                female           INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (reservation_id, participant_type, age_group)
            );

            CREATE TABLE IF NOT EXISTS programs (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                name       TEXT NOT NULL UNIQUE,
                category   TEXT NOT NULL,
                instructor TEXT,
                unit_price INTEGER NOT NULL DEFAULT 0,
                active     INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS program_sessions (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                program_id     INTEGER NOT NULL REFERENCES programs(id),
                date           TEXT NOT NULL,
                start_time     TEXT NOT NULL,
                end_time       TEXT NOT NULL,
                place          TEXT,
                participants   INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                name         TEXT NOT NULL UNIQUE,
                capacity     INTEGER NOT NULL,
                nightly_rate INTEGER NOT NULL DEFAULT 0,
                active       INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS room_assignments (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                room_id        INTEGER NOT NULL REFERENCES rooms(id),
                check_in       TEXT NOT NULL,
                check_out      TEXT NOT NULL,
                occupants      INTEGER NOT NULL,
                CHECK (check_out > check_in)
            );

            CREATE TABLE IF NOT EXISTS meal_orders (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                date           TEXT NOT NULL,
                meal_type      TEXT NOT NULL,
                headcount      INTEGER NOT NULL,
                unit_price     INTEGER NOT NULL,
                UNIQUE (reservation_id, date, meal_type)
            );

            CREATE TABLE IF NOT EXISTS expense_lines (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                description    TEXT NOT NULL,
                amount         INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS survey_responses (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                kind           TEXT NOT NULL,
                phase          TEXT NOT NULL,
                respondent     TEXT NOT NULL,
                program_id     INTEGER REFERENCES programs(id),
                scores         TEXT NOT NULL,
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hrv_measurements (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id     TEXT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
                respondent         TEXT NOT NULL,
                phase              TEXT NOT NULL,
                autonomic_activity REAL NOT NULL,
                autonomic_balance  REAL NOT NULL,
                stress_resistance  REAL NOT NULL,
                stress_index       REAL NOT NULL,
                fatigue            REAL NOT NULL,
                heart_rate         REAL NOT NULL,
                created_at         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                username      TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role          TEXT NOT NULL DEFAULT 'staff',
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token      TEXT PRIMARY KEY,
                user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations(status);
            CREATE INDEX IF NOT EXISTS idx_sessions_reservation ON program_sessions(reservation_id);
            CREATE INDEX IF NOT EXISTS idx_assignments_reservation ON room_assignments(reservation_id);
            CREATE INDEX IF NOT EXISTS idx_assignments_room ON room_assignments(room_id);
            CREATE INDEX IF NOT EXISTS idx_meals_reservation ON meal_orders(reservation_id);
            CREATE INDEX IF NOT EXISTS idx_surveys_reservation ON survey_responses(reservation_id);
            CREATE INDEX IF NOT EXISTS idx_hrv_reservation ON hrv_measurements(reservation_id);
            ",
        )?;

        // Fresh databases start at version 0.
        self.conn.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES ('schema_version', '0')",
            [],
        )?;

        run_migrations(&self.conn)
    }

    // -- Config --

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Unit price for a meal, falling back to the built-in tariff.
    pub fn meal_price(&self, meal: MealType) -> Result<i64> {
        let configured = self
            .get_config(&meal.price_key())?
            .and_then(|v| v.parse::<i64>().ok());
        Ok(configured.unwrap_or_else(|| meal.default_price()))
    }

    /// Generate a short hash-based reservation ID with the configured prefix.
    pub fn generate_id(&self) -> Result<String> {
        let prefix = self
            .get_config("prefix")?
            .unwrap_or_else(|| "rsv".to_string());
        loop {
            let uuid = uuid::Uuid::new_v4();
            let hash = &format!("{:032x}", uuid.as_u128())[..6];
            let id = format!("{prefix}-{hash}");
            if self.get_reservation(&id)?.is_none() {
                return Ok(id);
            }
        }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Read the current schema version from the config table.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let raw = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match raw {
        Some(v) => v.parse::<i32>().map_err(|e| {
            crate::error::Error::Validation(format!("invalid schema_version value: {e}"))
        }),
        None => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )?;
    Ok(())
}

/// Run all pending schema migrations in order, each inside its own transaction.
fn run_migrations(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version < 1 {
        conn.execute_batch(
            "BEGIN;
             CREATE INDEX IF NOT EXISTS idx_reservations_start ON reservations(start_date);
             CREATE INDEX IF NOT EXISTS idx_sessions_date ON program_sessions(date);
             CREATE INDEX IF NOT EXISTS idx_assignments_dates ON room_assignments(check_in, check_out);
             COMMIT;",
        )?;
        set_schema_version(conn, 1)?;
        info!(version = 1, "applied schema migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent_and_records_version() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        assert_eq!(
            db.get_config("schema_version").unwrap().as_deref(),
            Some("1")
        );
        assert_eq!(get_schema_version(db.conn()).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn meal_price_prefers_config() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.meal_price(MealType::Lunch).unwrap(), 10_000);
        db.set_config("meal_price.lunch", "12000").unwrap();
        assert_eq!(db.meal_price(MealType::Lunch).unwrap(), 12_000);
    }

    #[test]
    fn generated_ids_use_prefix() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("prefix", "hh").unwrap();
        let id = db.generate_id().unwrap();
        assert!(id.starts_with("hh-"));
        assert_eq!(id.len(), 9);
    }
}
