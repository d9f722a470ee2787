//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// YCLIENTS booking API command-line client
#[derive(Parser, Debug)]
#[command(name = "yclients")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON); `YCLIENTS_*` variables otherwise
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Login for the user-token exchange
    #[arg(long, global = true, env = "YCLIENTS_LOGIN")]
    pub login: Option<String>,

    /// Password for the user-token exchange
    #[arg(long, global = true, env = "YCLIENTS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Staff available for booking
    Staff {
        /// Show one staff member instead of the list
        #[arg(long)]
        id: Option<u64>,

        /// Only staff providing this service
        #[arg(long)]
        service: Option<u64>,

        /// Only staff free at this date-time
        #[arg(long)]
        datetime: Option<String>,
    },

    /// Services available for booking
    Services {
        /// Show one service instead of the list
        #[arg(long)]
        id: Option<u64>,

        /// Only services of this staff member
        #[arg(long)]
        staff: Option<u64>,

        /// Only services bookable at this date-time
        #[arg(long)]
        datetime: Option<String>,
    },

    /// Days with free slots
    Days {
        /// Staff member
        #[arg(long)]
        staff: Option<u64>,

        /// Service
        #[arg(long)]
        service: Option<u64>,
    },

    /// Free time slots on one day
    Times {
        /// Staff member
        #[arg(long)]
        staff: u64,

        /// Day (YYYY-MM-DD)
        #[arg(long)]
        day: String,

        /// Service
        #[arg(long)]
        service: Option<u64>,
    },

    /// Book an appointment
    Book {
        /// Appointment id within the booking
        #[arg(long, default_value = "0")]
        booking_id: u64,

        /// Client full name
        #[arg(long)]
        fullname: String,

        /// Client phone
        #[arg(long)]
        phone: String,

        /// Client email
        #[arg(long)]
        email: String,

        /// Service to book
        #[arg(long)]
        service: u64,

        /// Staff member (salon chooses if omitted)
        #[arg(long)]
        staff: Option<u64>,

        /// Appointment start (ISO-8601)
        #[arg(long)]
        datetime: String,

        /// Free-text comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Permissions of the authorized user
    Permissions,

    /// All client records
    Clients {
        /// Page size (defaults to the configured one)
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// All visit records of some clients
    Visits {
        /// Client ids
        #[arg(required = true)]
        clients: Vec<u64>,

        /// Only attended visits
        #[arg(long)]
        attended: bool,

        /// Page size
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Attended-visit summary per client
    Summary {
        /// Client ids
        #[arg(required = true)]
        clients: Vec<u64>,

        /// Page size
        #[arg(long)]
        per_page: Option<u32>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
    /// Text table (record lists only; other responses fall back to JSON)
    Table,
}
