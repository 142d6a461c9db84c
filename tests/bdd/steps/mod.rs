pub mod cli_steps;
pub mod common_steps;
pub mod data_steps;
pub mod web_api_steps;
pub mod web_steps;
