//! CLI argument parsing.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;

/// MERIDA Smart Grow - facilities, plots and irrigation from the terminal.
#[derive(Debug, Parser)]
#[command(name = "merida")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend URL (overrides MERIDA_API_BASE_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Credential cache file.
    #[arg(long, global = true, env = "MERIDA_CREDENTIALS_FILE")]
    pub credentials: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, answering a new-password challenge if one is issued.
    Login(LoginArgs),

    /// Sign out and clear cached credentials.
    Logout,

    /// Show the active session.
    Whoami,

    /// Facility commands.
    #[command(subcommand)]
    Facility(FacilityCommand),

    /// Plot commands.
    #[command(subcommand)]
    Plot(PlotCommand),

    /// Species commands.
    #[command(subcommand)]
    Species(SpeciesCommand),

    /// Irrigation commands.
    #[command(subcommand)]
    Irrigation(IrrigationCommand),

    /// User profile commands.
    #[command(subcommand)]
    User(UserCommand),
}

/// Login arguments.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username or email (prompted if omitted).
    pub username: Option<String>,

    /// Password (prompted if omitted).
    #[arg(long, env = "MERIDA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// New password, for accounts that must change theirs.
    #[arg(long)]
    pub new_password: Option<String>,

    /// Profile attribute sent with a new password, as `name=value`.
    #[arg(long = "attribute", short = 'a', value_name = "NAME=VALUE")]
    pub attributes: Vec<String>,
}

/// Facility commands.
#[derive(Debug, Subcommand)]
pub enum FacilityCommand {
    /// List all facilities.
    List,

    /// Get facility details.
    Get {
        /// Facility ID.
        id: String,
    },

    /// Create a facility.
    Create {
        /// Facility name.
        name: String,

        /// Location.
        #[arg(long)]
        location: String,
    },

    /// Update a facility.
    Update {
        /// Facility ID.
        id: String,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        /// New location.
        #[arg(long)]
        location: Option<String>,
    },

    /// Delete a facility.
    Delete {
        /// Facility ID.
        id: String,

        /// Skip confirmation.
        #[arg(long)]
        force: bool,
    },

    /// List the plots of a facility.
    Plots {
        /// Facility ID.
        id: String,
    },

    /// Show the users responsible for a facility.
    Responsibles {
        /// Facility ID.
        id: String,
    },

    /// Replace the users responsible for a facility.
    SetResponsibles {
        /// Facility ID.
        id: String,

        /// User IDs.
        users: Vec<String>,
    },
}

/// Plot commands.
#[derive(Debug, Subcommand)]
pub enum PlotCommand {
    /// List plots (defaults to the signed-in user's).
    List {
        /// User ID.
        #[arg(long)]
        user: Option<String>,
    },

    /// Get plot details.
    Get {
        /// Plot ID.
        id: String,
    },

    /// Create a plot.
    Create {
        /// Owning facility ID.
        facility: String,

        /// Plot name.
        #[arg(long)]
        name: Option<String>,

        /// Location.
        #[arg(long)]
        location: Option<String>,

        /// MAC address of the sensor node.
        #[arg(long)]
        mac_address: Option<String>,

        /// Species.
        #[arg(long)]
        species: Option<String>,

        /// Area in square meters.
        #[arg(long)]
        area: Option<f64>,
    },

    /// Update a plot.
    Update {
        /// Plot ID.
        id: String,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        /// New location.
        #[arg(long)]
        location: Option<String>,

        /// New species.
        #[arg(long)]
        species: Option<String>,

        /// New area.
        #[arg(long)]
        area: Option<f64>,
    },

    /// Delete a plot.
    Delete {
        /// Plot ID.
        id: String,

        /// Skip confirmation.
        #[arg(long)]
        force: bool,
    },

    /// Show the latest sensor reading.
    State {
        /// Plot ID.
        id: String,
    },

    /// Follow the live sensor reading.
    Watch {
        /// Plot ID.
        id: String,

        /// Stop after this many readings.
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show the reading history.
    History {
        /// Plot ID.
        id: String,

        /// Start of the range (RFC 3339).
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// End of the range (RFC 3339).
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },

    /// Show raw sensor values.
    Sensors {
        /// Plot ID.
        id: String,
    },
}

/// Species commands.
#[derive(Debug, Subcommand)]
pub enum SpeciesCommand {
    /// List all species.
    List,

    /// Create a species.
    Create {
        /// Species name.
        name: String,
    },

    /// Delete a species.
    Delete {
        /// Species ID.
        id: String,

        /// Skip confirmation.
        #[arg(long)]
        force: bool,
    },

    /// Assign a species to a plot.
    Assign {
        /// Species ID.
        species: String,

        /// Plot ID.
        plot: String,

        /// Facility owning the plot.
        #[arg(long)]
        facility: String,
    },
}

/// Irrigation commands.
#[derive(Debug, Subcommand)]
pub enum IrrigationCommand {
    /// List the irrigations of a plot.
    List {
        /// Plot ID.
        plot: String,
    },

    /// Show the last irrigation of a plot.
    Last {
        /// Plot ID.
        plot: String,
    },

    /// Record an irrigation.
    Record {
        /// Plot ID.
        plot: String,

        /// Water volume in liters.
        #[arg(long)]
        water_amount: Option<f64>,

        /// Duration in seconds.
        #[arg(long)]
        duration: Option<f64>,

        /// Irrigation type (manual, automatic, ...).
        #[arg(long = "type")]
        irrigation_type: Option<String>,

        /// Event type.
        #[arg(long)]
        event_type: Option<String>,
    },

    /// Show the recommended irrigation of a plot.
    Recommended {
        /// Plot ID.
        plot: String,
    },

    /// Create or update an irrigation recommendation.
    Recommend {
        /// Plot ID.
        plot: String,

        /// Timestamp of the recommendation to update; creates one if omitted.
        #[arg(long)]
        timestamp: Option<String>,

        /// Water volume in liters.
        #[arg(long)]
        water_amount: Option<f64>,

        /// Duration in seconds.
        #[arg(long)]
        duration: Option<f64>,

        /// Reason.
        #[arg(long)]
        reason: Option<String>,
    },
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Show a user profile (defaults to the signed-in user).
    Get {
        /// User ID.
        id: Option<String>,
    },

    /// Update a user profile.
    Update {
        /// User ID.
        #[arg(long)]
        id: Option<String>,

        /// New display name.
        #[arg(long)]
        name: Option<String>,

        /// New email.
        #[arg(long)]
        email: Option<String>,
    },

    /// List the facilities assigned to a user.
    Facilities {
        /// User ID.
        id: Option<String>,
    },
}
