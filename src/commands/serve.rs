use super::{CmdResult, open_db};
use retreat::config::AppConfig;
use retreat::web;

pub fn run(config: &AppConfig) -> CmdResult {
    // Fail fast on a missing database before binding the port.
    drop(open_db(&config.db_path)?);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(config))?;
    Ok(())
}
