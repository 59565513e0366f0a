//! Facility management commands.

use merida_api::dto::{CreateFacility, Facility, UpdateFacility};
use serde::Serialize;
use tabled::Tabled;

use super::plot::PlotRow;
use crate::cli::FacilityCommand;
use crate::context::Context;
use crate::output::{cell, confirm, error, output, output_single, success};
use crate::{CliError, CliResult};

/// Facility representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FacilityRow {
    /// Facility ID.
    #[tabled(rename = "ID")]
    pub facility_id: String,
    /// Name.
    #[tabled(rename = "Name")]
    pub name: String,
    /// Location.
    #[tabled(rename = "Location")]
    pub location: String,
    /// Creation timestamp.
    #[tabled(rename = "Created")]
    pub created_at: String,
}

impl From<Facility> for FacilityRow {
    fn from(facility: Facility) -> Self {
        Self {
            facility_id: facility.facility_id,
            name: facility.name,
            location: cell(facility.location),
            created_at: cell(facility.created_at),
        }
    }
}

/// Runs a facility command.
pub async fn run_facility(cmd: FacilityCommand, ctx: &Context) -> CliResult<()> {
    ctx.require_session().await?;

    match cmd {
        FacilityCommand::List => list_facilities(ctx).await,
        FacilityCommand::Get { id } => {
            let facility = ctx.queries.facility(&id).await?;
            output_single(&facility, ctx.format)
        }
        FacilityCommand::Create { name, location } => create_facility(ctx, name, location).await,
        FacilityCommand::Update { id, name, location } => update_facility(ctx, &id, name, location).await,
        FacilityCommand::Delete { id, force } => delete_facility(ctx, &id, force).await,
        FacilityCommand::Plots { id } => {
            let rows: Vec<PlotRow> = ctx
                .queries
                .facility_plots(&id)
                .await?
                .into_iter()
                .map(PlotRow::from)
                .collect();
            output(&rows, ctx.format, |r| r.plot_id.as_str())
        }
        FacilityCommand::Responsibles { id } => {
            let responsibles = ctx.queries.client().facilities().responsibles(&id).await?;
            output_single(&responsibles, ctx.format)
        }
        FacilityCommand::SetResponsibles { id, users } => {
            ctx.queries.client().facilities().set_responsibles(&id, &users).await?;
            success(&format!("Facility '{}' now has {} responsible user(s)", id, users.len()));
            Ok(())
        }
    }
}

async fn list_facilities(ctx: &Context) -> CliResult<()> {
    let rows: Vec<FacilityRow> = ctx
        .queries
        .facilities()
        .await?
        .into_iter()
        .map(FacilityRow::from)
        .collect();
    output(&rows, ctx.format, |r| r.facility_id.as_str())
}

async fn create_facility(ctx: &Context, name: String, location: String) -> CliResult<()> {
    if name.trim().is_empty() {
        return Err(CliError::InvalidArgument("facility name cannot be empty".to_string()));
    }
    let created = ctx.queries.create_facility(&CreateFacility { name, location }).await?;
    success(&format!("Facility '{}' created ({})", created.name, created.facility_id));
    Ok(())
}

async fn update_facility(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    location: Option<String>,
) -> CliResult<()> {
    let update = UpdateFacility { name, location };
    if update.is_empty() {
        return Err(CliError::InvalidArgument("nothing to update; pass --name or --location".to_string()));
    }
    let updated = ctx.queries.update_facility(id, &update).await?;
    success(&format!("Facility '{}' updated", updated.name));
    Ok(())
}

async fn delete_facility(ctx: &Context, id: &str, force: bool) -> CliResult<()> {
    if !force && !confirm(&format!("Are you sure you want to delete facility '{id}'?"))? {
        error("Operation cancelled");
        return Ok(());
    }
    ctx.queries.delete_facility(id).await?;
    success(&format!("Facility '{id}' deleted"));
    Ok(())
}
