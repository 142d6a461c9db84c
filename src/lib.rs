/// Staff accounts, password hashing and login sessions.
pub mod auth;
/// Program and room catalog maintenance.
pub mod catalog;
/// Environment-driven settings for the server and CLI.
pub mod config;
/// Database layer: open, migrate, CRUD for every table.
pub mod db;
pub mod error;
/// CSV exports of reservations and reports.
pub mod export;
/// Reservation intake pages and final cost breakdown.
pub mod intake;
/// Data types: reservations, catalog, surveys, users.
pub mod models;
/// Year-Month Result and Program List aggregates.
pub mod reports;
/// Per-reservation views: schedule, rooms, implementation plan, usage.
pub mod schedule;
/// Questionnaire and HRV collection.
pub mod surveys;
pub mod telemetry;
/// Axum-based web server and router.
pub mod web;

#[cfg(test)]
pub(crate) mod testing;
