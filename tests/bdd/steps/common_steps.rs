#![allow(deprecated)]
use cucumber::given;

use crate::RetreatWorld;

/// Initialize a fresh retreat database into the world's temp dir.
#[given("a retreat database is initialized")]
async fn a_retreat_database_is_initialized(world: &mut RetreatWorld) {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("retreat.db");

    let output = assert_cmd::Command::cargo_bin("retreat")
        .expect("retreat binary not found")
        .env("RETREAT_DB", &db_path)
        .arg("init")
        .output()
        .expect("failed to run retreat init");

    assert!(
        output.status.success(),
        "retreat init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    world.db_path = Some(db_path);
    // Keep the TempDir alive for the lifetime of the scenario.
    world.db_dir = Some(dir);
}

/// Open a second connection to the scenario database for direct setup.
pub fn open_db(world: &RetreatWorld) -> retreat::db::Database {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set - did you forget 'Given a retreat database is initialized'?");
    retreat::db::Database::open(db_path).expect("open scenario database")
}

/// Create a login directly through the library.
#[given(expr = "a(n) {string} user {string} with password {string}")]
async fn a_user_with_password(world: &mut RetreatWorld, role: String, username: String, password: String) {
    let db = open_db(world);
    let role = retreat::models::Role::from_str(&role).expect("valid role");
    retreat::auth::create_user(&db, &username, &password, role).expect("create user");
}
