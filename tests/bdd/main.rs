mod steps;

use std::collections::HashMap;
use std::path::PathBuf;

use cucumber::World;

/// Shared state carried through each scenario.
#[derive(Debug, Default, World)]
pub struct RetreatWorld {
    /// Temporary directory that owns the database file.
    pub db_dir: Option<tempfile::TempDir>,
    /// Path to the SQLite database file inside `db_dir`.
    pub db_path: Option<PathBuf>,
    /// The raw stdout of the most recent `retreat` invocation.
    pub last_stdout: String,
    /// The raw stderr of the most recent `retreat` invocation.
    pub last_stderr: String,
    /// Exit code of the most recent `retreat` invocation.
    pub last_exit_code: i32,
    /// Alias to id map; `<alias>` in paths and bodies is replaced by the id.
    pub ids: HashMap<String, String>,
    /// Port of the in-process web server, once started.
    pub server_port: Option<u16>,
    pub server_handle: Option<tokio::task::JoinHandle<()>>,
    pub http_client: reqwest::Client,
    /// Session token from the last successful login.
    pub token: Option<String>,
    pub last_response_status: Option<u16>,
    pub last_response_content_type: Option<String>,
    pub last_response_body: Option<String>,
}

impl RetreatWorld {
    /// Replace every `<alias>` with the id remembered under that alias.
    pub fn expand(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (alias, id) in &self.ids {
            out = out.replace(&format!("<{alias}>"), id);
        }
        out
    }
}

#[tokio::main]
async fn main() {
    RetreatWorld::run("tests/features").await;
}
