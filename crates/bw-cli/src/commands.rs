//! Subcommands and their output

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bw_client_api::ClientApi;
use bw_core::{CompletionWorkflow, FinalAcceptance, Outcome, ResolutionReport, SideEffect, StatusPoller};
use bw_rest_api_contract::{DefectId, NewDefect};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the trade's status and the actions open to you
    Status,
    /// Report the trade as finished and ask for acceptance
    RequestCompletion(RequestCompletionArgs),
    /// Accept a completion request or send the trade back for rework
    Respond(RespondArgs),
    /// Propose a date for the on-site acceptance inspection
    ScheduleAcceptance(ScheduleAcceptanceArgs),
    /// Accept under reservation, documenting defects from a JSON file
    AcceptWithDefects(AcceptWithDefectsArgs),
    /// List the defects of the current acceptance
    Defects,
    /// Mark defects resolved and report the resolution
    Resolve(ResolveArgs),
    /// Hand the trade back for final acceptance without fixing defects
    Proceed(ProceedArgs),
    /// Sign the trade off after the defect cycle
    FinalAccept(FinalAcceptArgs),
    /// Post a progress update
    Progress(ProgressArgs),
    /// Mark the trade's messages read
    MarkRead,
    /// Follow status changes until interrupted
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct RequestCompletionArgs {
    #[arg(long, default_value = "Gewerk fertiggestellt.")]
    pub message: String,
}

#[derive(Args)]
pub struct RespondArgs {
    /// Request rework instead of accepting
    #[arg(long)]
    pub reject: bool,

    #[arg(long)]
    pub message: Option<String>,

    /// Deadline for the rework (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "reject")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ScheduleAcceptanceArgs {
    /// Day of the inspection (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: NaiveDate,

    /// Local time of the inspection (HH:MM)
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub time: NaiveTime,

    #[arg(long, default_value = "")]
    pub notes: String,
}

impl ScheduleAcceptanceArgs {
    /// The proposed inspection start in UTC, read as local time.
    pub fn proposed_date(&self) -> Result<DateTime<Utc>> {
        let local = self.date.and_time(self.time);
        Local
            .from_local_datetime(&local)
            .single()
            .map(|at| at.with_timezone(&Utc))
            .with_context(|| format!("{local} is not a unique local time"))
    }
}

fn parse_time(value: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{value}', expected HH:MM"))
}

#[derive(Args)]
pub struct AcceptWithDefectsArgs {
    /// JSON array of defects (title, description, severity, room, ...)
    #[arg(long, value_name = "FILE")]
    pub defects: PathBuf,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Defects to mark resolved before submitting
    #[arg(value_name = "DEFECT_ID")]
    pub ids: Vec<i64>,

    #[arg(long, default_value = "Mängel behoben.")]
    pub message: String,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args)]
pub struct ProceedArgs {
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args)]
pub struct FinalAcceptArgs {
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub quality: u8,

    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub timeliness: u8,

    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub overall: u8,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args)]
pub struct ProgressArgs {
    #[arg(value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: u8,

    #[arg(long, default_value = "")]
    pub message: String,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Override the configured poll interval (seconds)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

impl Commands {
    pub async fn execute<C, W>(self, workflow: Arc<CompletionWorkflow<C>>, out: &mut W) -> Result<()>
    where
        C: ClientApi + ?Sized + 'static,
        W: Write,
    {
        match self {
            Commands::Status => print_status(&workflow, out),
            Commands::RequestCompletion(args) => {
                let outcome = workflow.request_completion(&args.message).await?;
                print_outcome(&outcome, out)
            }
            Commands::Respond(args) => {
                let outcome = workflow
                    .respond_to_completion(!args.reject, args.message.as_deref(), args.deadline)
                    .await?;
                print_outcome(&outcome, out)
            }
            Commands::ScheduleAcceptance(args) => {
                let proposed = args.proposed_date()?;
                workflow.schedule_acceptance(proposed, &args.notes).await?;
                writeln!(
                    out,
                    "acceptance appointment proposed for {}",
                    proposed.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                )?;
                Ok(())
            }
            Commands::AcceptWithDefects(args) => {
                let text = std::fs::read_to_string(&args.defects)
                    .with_context(|| format!("failed to read {}", args.defects.display()))?;
                let defects: Vec<NewDefect> = serde_json::from_str(&text)
                    .with_context(|| format!("invalid defect list in {}", args.defects.display()))?;
                let outcome = workflow.accept_with_defects(defects, &args.notes).await?;
                print_outcome(&outcome, out)
            }
            Commands::Defects => print_defects(&workflow, out).await,
            Commands::Resolve(args) => {
                let defects = workflow.defects().await;
                for id in args.ids.into_iter().map(DefectId) {
                    let already = defects.iter().any(|d| d.id == id && d.resolved);
                    if !already {
                        workflow.toggle_defect(id).await?;
                    }
                }
                let outcome = workflow.submit_resolution(&args.message, &args.notes).await?;
                print_outcome(&outcome, out)
            }
            Commands::Proceed(args) => {
                let outcome = workflow.proceed_without_resolution(&args.notes).await?;
                print_outcome(&outcome, out)
            }
            Commands::FinalAccept(args) => {
                let outcome = workflow
                    .final_accept(FinalAcceptance {
                        quality: args.quality,
                        timeliness: args.timeliness,
                        overall: args.overall,
                        notes: args.notes,
                    })
                    .await?;
                print_outcome(&outcome, out)
            }
            Commands::Progress(args) => {
                workflow.update_progress(args.percent, &args.message).await?;
                writeln!(out, "progress: {} %", workflow.progress())?;
                Ok(())
            }
            Commands::MarkRead => {
                workflow.mark_messages_read().await?;
                writeln!(out, "messages marked read")?;
                Ok(())
            }
            Commands::Watch(args) => watch(workflow, args, out).await,
        }
    }
}

fn print_status<C, W>(workflow: &CompletionWorkflow<C>, out: &mut W) -> Result<()>
where
    C: ClientApi + ?Sized,
    W: Write,
{
    let trade = workflow.trade();
    writeln!(out, "trade:    {} (#{})", trade.title, trade.milestone_id)?;
    writeln!(out, "status:   {}", workflow.status())?;
    writeln!(out, "progress: {} %", workflow.progress())?;
    if workflow.has_unread_messages() {
        writeln!(out, "unread messages")?;
    }
    let actions = workflow.available_actions();
    if actions.is_empty() {
        writeln!(out, "actions:  none for the {}", workflow.role())?;
    } else {
        let names: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        writeln!(out, "actions:  {}", names.join(", "))?;
    }
    Ok(())
}

async fn print_defects<C, W>(workflow: &CompletionWorkflow<C>, out: &mut W) -> Result<()>
where
    C: ClientApi + ?Sized,
    W: Write,
{
    let defects = workflow.defects().await;
    if defects.is_empty() {
        writeln!(out, "no defects documented")?;
        return Ok(());
    }
    for defect in defects {
        let mark = if defect.resolved { "x" } else { " " };
        write!(out, "[{mark}] #{} {} ({}", defect.id, defect.title, defect.severity.label())?;
        if let Some(room) = &defect.room {
            write!(out, ", {room}")?;
        }
        writeln!(out, ")")?;
    }
    Ok(())
}

fn print_outcome<W: Write>(outcome: &Outcome, out: &mut W) -> Result<()> {
    if outcome.changed {
        writeln!(out, "{}: {} -> {}", outcome.action, outcome.from, outcome.to)?;
    } else {
        writeln!(out, "{}: trade is already {}, nothing to do", outcome.action, outcome.to)?;
    }
    for effect in &outcome.side_effects {
        if let SideEffect::Failed(error) = effect {
            writeln!(out, "warning: notification not delivered: {error}")?;
        }
    }
    if let Some(report) = &outcome.report {
        print_report(report, out)?;
    }
    Ok(())
}

fn print_report<W: Write>(report: &ResolutionReport, out: &mut W) -> Result<()> {
    if !report.persisted.is_empty() {
        let ids: Vec<String> = report.persisted.iter().map(|id| format!("#{id}")).collect();
        writeln!(out, "saved defects: {}", ids.join(", "))?;
    }
    for failure in &report.failed {
        match failure.defect_id {
            Some(id) => writeln!(out, "warning: defect #{id} ({}) not saved: {}", failure.title, failure.error)?,
            None => writeln!(out, "warning: defect \"{}\" not saved: {}", failure.title, failure.error)?,
        }
    }
    Ok(())
}

async fn watch<C, W>(workflow: Arc<CompletionWorkflow<C>>, args: WatchArgs, out: &mut W) -> Result<()>
where
    C: ClientApi + ?Sized + 'static,
    W: Write,
{
    let poller = match args.interval {
        Some(secs) => StatusPoller::spawn_with_interval(workflow.clone(), Duration::from_secs(secs.max(1))),
        None => StatusPoller::spawn(workflow.clone()),
    };
    let mut changes = workflow.subscribe();
    writeln!(out, "watching trade #{} ({}), Ctrl+C to stop", workflow.milestone_id(), workflow.status())?;
    out.flush()?;

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *changes.borrow_and_update();
                writeln!(
                    out,
                    "{} status: {} (v{})",
                    chrono::Utc::now().format("%H:%M:%S"),
                    snapshot.status,
                    snapshot.version
                )?;
                out.flush()?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    Ok(())
}
