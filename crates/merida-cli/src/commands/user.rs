//! User profile commands.

use merida_api::dto::UpdateUser;

use super::facility::FacilityRow;
use crate::cli::UserCommand;
use crate::context::Context;
use crate::output::{output, output_single, success};
use crate::{CliError, CliResult};

/// Runs a user command.
pub async fn run_user(cmd: UserCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        UserCommand::Get { id } => {
            let user_id = ctx.user_or_self(id).await?;
            let user = ctx.queries.user(&user_id).await?;
            output_single(&user, ctx.format)
        }
        UserCommand::Update { id, name, email } => {
            if name.is_none() && email.is_none() {
                return Err(CliError::InvalidArgument("nothing to update; pass --name or --email".to_string()));
            }
            let user_id = ctx.user_or_self(id).await?;
            ctx.queries.update_user(&user_id, &UpdateUser { email, name }).await?;
            success(&format!("User '{user_id}' updated"));
            Ok(())
        }
        UserCommand::Facilities { id } => {
            let user_id = ctx.user_or_self(id).await?;
            let rows: Vec<FacilityRow> = ctx
                .queries
                .client()
                .users()
                .facilities(&user_id)
                .await?
                .into_iter()
                .map(FacilityRow::from)
                .collect();
            output(&rows, ctx.format, |r| r.facility_id.as_str())
        }
    }
}
