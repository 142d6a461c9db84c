mod commands;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::export::Target;
use retreat::config::AppConfig;
use retreat::telemetry;

#[derive(Parser)]
#[command(
    name = "retreat",
    version,
    about = "Reservations, scheduling and effectiveness reports for a retreat facility"
)]
struct Cli {
    /// Path to the database file (default: .retreat/retreat.db in current dir)
    #[arg(long, env = "RETREAT_DB", global = true)]
    db: Option<PathBuf>,

    /// Output as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init {
        /// Reservation ID prefix (default: "rsv")
        #[arg(long, default_value = "rsv")]
        prefix: String,
    },
    /// Run the web service
    Serve {
        /// Address to bind (overrides RETREAT_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides RETREAT_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage staff logins
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the program catalog
    Program {
        #[command(subcommand)]
        action: ProgramAction,
    },
    /// Manage rooms
    Room {
        #[command(subcommand)]
        action: RoomAction,
    },
    /// Inspect reservations
    Reservation {
        #[command(subcommand)]
        action: ReservationAction,
    },
    /// Aggregate reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Export CSV for spreadsheets
    Export {
        #[command(subcommand)]
        action: ExportAction,
        /// Write to this file instead of stdout
        #[arg(short, long, global = true)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a login
    Add {
        username: String,
        /// Password (at least 8 characters)
        #[arg(long, env = "RETREAT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role (admin, staff)
        #[arg(long, default_value = "staff")]
        role: String,
    },
    /// List logins
    List,
}

#[derive(Subcommand)]
enum ProgramAction {
    /// Add a program
    Add {
        name: String,
        /// Category (prevention, healing, counseling, education, other)
        #[arg(short, long)]
        category: String,
        /// Instructor name
        #[arg(short, long)]
        instructor: Option<String>,
        /// Price per participant per session
        #[arg(long, default_value_t = 0)]
        price: i64,
    },
    /// List programs
    List {
        /// Include inactive programs
        #[arg(short, long)]
        all: bool,
    },
    /// Stop offering a program
    Retire { id: i64 },
    /// Offer a retired program again
    Reopen { id: i64 },
}

#[derive(Subcommand)]
enum RoomAction {
    /// Add a room
    Add {
        name: String,
        /// Maximum guests per night
        #[arg(short, long)]
        capacity: u32,
        /// Price per night
        #[arg(long, default_value_t = 0)]
        rate: i64,
    },
    /// List rooms
    List {
        /// Include inactive rooms
        #[arg(short, long)]
        all: bool,
    },
    /// Close a room to new assignments
    Retire { id: i64 },
    /// Reopen a closed room
    Reopen { id: i64 },
}

#[derive(Subcommand)]
enum ReservationAction {
    /// List reservations (cancelled ones are hidden unless --all)
    List {
        /// Filter by status (draft, confirmed, completed, cancelled)
        #[arg(short, long)]
        status: Option<String>,
        /// Earliest arrival date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest arrival date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Include cancelled reservations
        #[arg(short, long)]
        all: bool,
    },
    /// Show a reservation with its schedule and cost
    Show { id: String },
    /// Change a reservation's status
    Status {
        id: String,
        /// New status (confirmed, completed, cancelled, draft)
        status: String,
    },
}

#[derive(clap::Args)]
struct Range {
    /// First arrival date (default: January 1 of `--to`'s year, or this year)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last arrival date (default: December 31 of `--from`'s year, or this year)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl Range {
    fn resolve(&self) -> (NaiveDate, NaiveDate) {
        retreat::reports::resolve_range(self.from, self.to, Utc::now().date_naive())
    }
}

#[derive(Subcommand)]
enum ReportAction {
    /// Totals, breakdowns, satisfaction and pre/post effectiveness
    YearMonth {
        #[command(flatten)]
        range: Range,
    },
    /// Sessions and satisfaction per program
    Programs {
        #[command(flatten)]
        range: Range,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Reservation list
    Reservations {
        /// Include cancelled reservations
        #[arg(short, long)]
        all: bool,
    },
    /// Year-Month Result, one row per figure
    YearMonth {
        #[command(flatten)]
        range: Range,
    },
    /// Program List
    Programs {
        #[command(flatten)]
        range: Range,
    },
    /// One reservation's implementation plan
    Plan { id: String },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(e) = telemetry::init(&config.telemetry) {
        eprintln!("warning: {e}");
    }

    let db_path = config.db_path.clone();
    let json = cli.json;
    let result = match cli.command {
        Commands::Init { prefix } => commands::init::run(&db_path, &prefix),
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve::run(&config)
        }
        Commands::User { action } => match action {
            UserAction::Add {
                username,
                password,
                role,
            } => commands::user::add(&db_path, &username, &password, &role, json),
            UserAction::List => commands::user::list(&db_path, json),
        },
        Commands::Program { action } => match action {
            ProgramAction::Add {
                name,
                category,
                instructor,
                price,
            } => commands::program::add(
                &db_path,
                &name,
                &category,
                instructor.as_deref(),
                price,
                json,
            ),
            ProgramAction::List { all } => commands::program::list(&db_path, all, json),
            ProgramAction::Retire { id } => commands::program::set_active(&db_path, id, false, json),
            ProgramAction::Reopen { id } => commands::program::set_active(&db_path, id, true, json),
        },
        Commands::Room { action } => match action {
            RoomAction::Add {
                name,
                capacity,
                rate,
            } => commands::room::add(&db_path, &name, capacity, rate, json),
            RoomAction::List { all } => commands::room::list(&db_path, all, json),
            RoomAction::Retire { id } => commands::room::set_active(&db_path, id, false, json),
            RoomAction::Reopen { id } => commands::room::set_active(&db_path, id, true, json),
        },
        Commands::Reservation { action } => match action {
            ReservationAction::List {
                status,
                from,
                to,
                all,
            } => commands::reservation::list(&db_path, status.as_deref(), from, to, all, json),
            ReservationAction::Show { id } => commands::reservation::show(&db_path, &id, json),
            ReservationAction::Status { id, status } => {
                commands::reservation::set_status(&db_path, &id, &status, json)
            }
        },
        Commands::Report { action } => match action {
            ReportAction::YearMonth { range } => {
                let (from, to) = range.resolve();
                commands::report::year_month(&db_path, from, to, json)
            }
            ReportAction::Programs { range } => {
                let (from, to) = range.resolve();
                commands::report::programs(&db_path, from, to, json)
            }
        },
        Commands::Export { action, output } => {
            let target = match action {
                ExportAction::Reservations { all } => Target::Reservations { all },
                ExportAction::YearMonth { range } => {
                    let (from, to) = range.resolve();
                    Target::YearMonth { from, to }
                }
                ExportAction::Programs { range } => {
                    let (from, to) = range.resolve();
                    Target::Programs { from, to }
                }
                ExportAction::Plan { id } => Target::Plan { id },
            };
            commands::export::run(&db_path, target, output)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
