//! Command implementations.

pub mod auth;
pub mod facility;
pub mod irrigation;
pub mod plot;
pub mod species;
pub mod user;

pub use auth::{run_login, run_logout, run_whoami};
pub use facility::run_facility;
pub use irrigation::run_irrigation;
pub use plot::run_plot;
pub use species::run_species;
pub use user::run_user;

use crate::cli::Command;
use crate::context::Context;
use crate::CliResult;

/// Dispatches a parsed command.
pub async fn run(command: Command, ctx: &Context) -> CliResult<()> {
    match command {
        Command::Login(args) => run_login(args, ctx).await,
        Command::Logout => run_logout(ctx).await,
        Command::Whoami => run_whoami(ctx).await,
        Command::Facility(cmd) => run_facility(cmd, ctx).await,
        Command::Plot(cmd) => run_plot(cmd, ctx).await,
        Command::Species(cmd) => run_species(cmd, ctx).await,
        Command::Irrigation(cmd) => run_irrigation(cmd, ctx).await,
        Command::User(cmd) => run_user(cmd, ctx).await,
    }
}
