//! Plot commands, including live sensor readings.

use merida_api::dto::{CreatePlot, PlotMetadata, PlotState, UpdatePlot};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::PlotCommand;
use crate::config::OutputFormat;
use crate::context::Context;
use crate::output::{cell, confirm, error, output, output_single, success};
use crate::{CliError, CliResult};

/// Plot representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PlotRow {
    /// Plot ID.
    #[tabled(rename = "ID")]
    pub plot_id: String,
    /// Facility ID.
    #[tabled(rename = "Facility")]
    pub facility_id: String,
    /// Name.
    #[tabled(rename = "Name")]
    pub name: String,
    /// Species.
    #[tabled(rename = "Species")]
    pub species: String,
    /// Area.
    #[tabled(rename = "Area (m²)")]
    pub area: String,
}

impl From<PlotMetadata> for PlotRow {
    fn from(plot: PlotMetadata) -> Self {
        Self {
            plot_id: plot.plot_id,
            facility_id: plot.facility_id,
            name: cell(plot.name),
            species: cell(plot.species),
            area: cell(plot.area),
        }
    }
}

/// Sensor reading for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ReadingRow {
    /// Timestamp.
    #[tabled(rename = "Time")]
    pub timestamp: String,
    /// Temperature.
    #[tabled(rename = "Temp (°C)")]
    pub temperature: String,
    /// Humidity.
    #[tabled(rename = "Humidity (%)")]
    pub humidity: String,
    /// Soil moisture.
    #[tabled(rename = "Soil (%)")]
    pub soil_moisture: String,
    /// Light.
    #[tabled(rename = "Light (lx)")]
    pub light: String,
}

impl From<PlotState> for ReadingRow {
    fn from(state: PlotState) -> Self {
        Self {
            timestamp: state.timestamp,
            temperature: cell(state.temperature),
            humidity: cell(state.humidity),
            soil_moisture: cell(state.soil_moisture),
            light: cell(state.light),
        }
    }
}

fn readings(states: Vec<PlotState>, format: OutputFormat) -> CliResult<()> {
    let rows: Vec<ReadingRow> = states.into_iter().map(ReadingRow::from).collect();
    output(&rows, format, |r| r.timestamp.as_str())
}

/// Runs a plot command.
pub async fn run_plot(cmd: PlotCommand, ctx: &Context) -> CliResult<()> {
    let session = ctx.require_session().await?;

    match cmd {
        PlotCommand::List { user } => {
            let user_id = user.unwrap_or(session.user_id);
            let rows: Vec<PlotRow> = ctx
                .queries
                .plots(&user_id)
                .await?
                .into_iter()
                .map(PlotRow::from)
                .collect();
            output(&rows, ctx.format, |r| r.plot_id.as_str())
        }
        PlotCommand::Get { id } => {
            let plot = ctx.queries.plot(&id).await?;
            output_single(&plot, ctx.format)
        }
        PlotCommand::Create {
            facility,
            name,
            location,
            mac_address,
            species,
            area,
        } => {
            let plot = CreatePlot {
                facility_id: facility,
                name,
                location,
                mac_address,
                species,
                area,
            };
            let created = ctx.queries.create_plot(&plot).await?;
            success(&format!("Plot '{}' created", created.plot_id));
            Ok(())
        }
        PlotCommand::Update {
            id,
            name,
            location,
            species,
            area,
        } => {
            let update = UpdatePlot {
                name,
                location,
                species,
                area,
            };
            if update == UpdatePlot::default() {
                return Err(CliError::InvalidArgument("nothing to update".to_string()));
            }
            ctx.queries.update_plot(&id, &update).await?;
            success(&format!("Plot '{id}' updated"));
            Ok(())
        }
        PlotCommand::Delete { id, force } => {
            if !force && !confirm(&format!("Are you sure you want to delete plot '{id}'?"))? {
                error("Operation cancelled");
                return Ok(());
            }
            ctx.queries.delete_plot(&id).await?;
            success(&format!("Plot '{id}' deleted"));
            Ok(())
        }
        PlotCommand::State { id } => {
            let state = ctx.queries.plot_state(&id).await?;
            output_single(&state, ctx.format)
        }
        PlotCommand::Watch { id, count } => watch(ctx, &id, count).await,
        PlotCommand::History { id, from, to } => {
            let history = ctx.queries.plot_history(&id, from, to).await?;
            readings(history, ctx.format)
        }
        PlotCommand::Sensors { id } => {
            let values = ctx.queries.client().plots().sensor_values(&id).await?;
            readings(values, ctx.format)
        }
    }
}

/// Prints each new reading until `count` is reached or the user interrupts.
async fn watch(ctx: &Context, plot_id: &str, count: Option<usize>) -> CliResult<()> {
    let mut live = ctx.queries.watch_plot_state(plot_id);
    let mut seen = 0usize;

    loop {
        tokio::select! {
            changed = live.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        let reading = live.borrow_and_update().clone();
        if let Some(state) = reading {
            match ctx.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&state)?),
                _ => println!(
                    "{}  temp={} humidity={} soil={} light={}",
                    state.timestamp,
                    cell(state.temperature),
                    cell(state.humidity),
                    cell(state.soil_moisture),
                    cell(state.light),
                ),
            }
            seen += 1;
            if count.is_some_and(|limit| seen >= limit) {
                break;
            }
        }
    }
    Ok(())
}
