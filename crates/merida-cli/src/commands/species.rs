//! Species catalog commands.

use merida_api::dto::Species;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::SpeciesCommand;
use crate::context::Context;
use crate::output::{confirm, error, output, success};
use crate::{CliError, CliResult};

/// Species representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SpeciesRow {
    /// Species ID.
    #[tabled(rename = "ID")]
    pub species_id: String,
    /// Name.
    #[tabled(rename = "Name")]
    pub name: String,
}

impl From<Species> for SpeciesRow {
    fn from(species: Species) -> Self {
        Self {
            species_id: species.species_id().to_string(),
            name: species.name,
        }
    }
}

/// Runs a species command.
pub async fn run_species(cmd: SpeciesCommand, ctx: &Context) -> CliResult<()> {
    ctx.require_session().await?;

    match cmd {
        SpeciesCommand::List => {
            let rows: Vec<SpeciesRow> = ctx
                .queries
                .species()
                .await?
                .into_iter()
                .map(SpeciesRow::from)
                .collect();
            output(&rows, ctx.format, |r| r.species_id.as_str())
        }
        SpeciesCommand::Create { name } => {
            if name.trim().is_empty() {
                return Err(CliError::InvalidArgument("species name cannot be empty".to_string()));
            }
            let created = ctx.queries.create_species(&name).await?;
            success(&format!("Species '{}' created ({})", created.name, created.species_id()));
            Ok(())
        }
        SpeciesCommand::Delete { id, force } => {
            if !force && !confirm(&format!("Are you sure you want to delete species '{id}'?"))? {
                error("Operation cancelled");
                return Ok(());
            }
            ctx.queries.delete_species(&id).await?;
            success(&format!("Species '{id}' deleted"));
            Ok(())
        }
        SpeciesCommand::Assign {
            species,
            plot,
            facility,
        } => {
            ctx.queries.assign_species(&species, &plot, &facility).await?;
            success(&format!("Species '{species}' assigned to plot '{plot}'"));
            Ok(())
        }
    }
}
