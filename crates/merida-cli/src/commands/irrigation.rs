//! Irrigation commands.

use merida_api::dto::{CreateIrrigation, IrrigationEvent, RecommendIrrigation};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::IrrigationCommand;
use crate::context::Context;
use crate::output::{cell, info, output, output_single, success};
use crate::CliResult;

/// Irrigation event for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct IrrigationRow {
    /// Timestamp.
    #[tabled(rename = "Time")]
    pub timestamp: String,
    /// Event type.
    #[tabled(rename = "Event")]
    pub event_type: String,
    /// Irrigation type.
    #[tabled(rename = "Type")]
    pub irrigation_type: String,
    /// Water amount.
    #[tabled(rename = "Water (L)")]
    pub water_amount: String,
    /// Duration.
    #[tabled(rename = "Duration (s)")]
    pub duration: String,
}

impl From<IrrigationEvent> for IrrigationRow {
    fn from(event: IrrigationEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            event_type: cell(event.event_type),
            irrigation_type: cell(event.irrigation_type),
            water_amount: cell(event.water_amount),
            duration: cell(event.duration),
        }
    }
}

/// Runs an irrigation command.
pub async fn run_irrigation(cmd: IrrigationCommand, ctx: &Context) -> CliResult<()> {
    ctx.require_session().await?;
    let irrigation = ctx.queries.client().irrigation();

    match cmd {
        IrrigationCommand::List { plot } => {
            let rows: Vec<IrrigationRow> = ctx
                .queries
                .irrigations(&plot)
                .await?
                .into_iter()
                .map(IrrigationRow::from)
                .collect();
            output(&rows, ctx.format, |r| r.timestamp.as_str())
        }
        IrrigationCommand::Last { plot } => match irrigation.last(&plot).await? {
            Some(event) => output_single(&event, ctx.format),
            None => {
                info(&format!("Plot '{plot}' has no irrigations yet."));
                Ok(())
            }
        },
        IrrigationCommand::Record {
            plot,
            water_amount,
            duration,
            irrigation_type,
            event_type,
        } => {
            let body = CreateIrrigation {
                timestamp: None,
                event_type,
                duration,
                water_amount,
                irrigation_type,
            };
            let event = ctx.queries.record_irrigation(&plot, &body).await?;
            success(&format!("Irrigation recorded for plot '{plot}' at {}", event.timestamp));
            Ok(())
        }
        IrrigationCommand::Recommended { plot } => match irrigation.recommended(&plot).await? {
            Some(recommendation) => output_single(&recommendation, ctx.format),
            None => {
                info(&format!("No recommendation for plot '{plot}'."));
                Ok(())
            }
        },
        IrrigationCommand::Recommend {
            plot,
            timestamp,
            water_amount,
            duration,
            reason,
        } => {
            let body = RecommendIrrigation {
                water_amount,
                duration,
                reason,
            };
            let saved = match timestamp {
                Some(timestamp) => irrigation.update_recommended(&plot, &timestamp, &body).await?,
                None => irrigation.create_recommended(&plot, &body).await?,
            };
            success(&format!("Recommendation saved for plot '{plot}' ({})", saved.timestamp));
            Ok(())
        }
    }
}
