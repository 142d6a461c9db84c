use std::path::Path;
use tabled::Tabled;

use super::{CmdResult, open_db, print_json, print_table};
use retreat::auth;
use retreat::models::Role;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

pub fn add(db_path: &Path, username: &str, password: &str, role: &str, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let role = Role::from_str(role)?;
    let user = auth::create_user(&db, username, password, role)?;
    if json {
        return print_json(&user);
    }
    println!("Created {} user {}", user.role, user.username);
    Ok(())
}

pub fn list(db_path: &Path, json: bool) -> CmdResult {
    let db = open_db(db_path)?;
    let users = db.list_users()?;
    if json {
        return print_json(&users);
    }
    let rows = users
        .into_iter()
        .map(|u| UserRow {
            id: u.id,
            username: u.username,
            role: u.role.to_string(),
            created: u.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();
    print_table(rows, "No users yet.");
    Ok(())
}
