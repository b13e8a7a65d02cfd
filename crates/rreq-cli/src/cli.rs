//! CLI argument definitions for the resource request engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rreq",
    version,
    about = "Resource request desk - track logistics requests through their lifecycle",
    long_about = "Track incident logistics resource requests from draft through approval,\n\
                  fulfillment, and closure, with a full audit trail per request.\n\
                  Each incident gets its own database file under the data directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding per-incident database files.
    #[arg(long = "data-dir", value_name = "DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Incident id (tenant); selects the database file.
    #[arg(long = "incident", value_name = "ID", default_value = "default", global = true)]
    pub incident: String,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a request (status DRAFT unless --status is given).
    Create(CreateArgs),

    /// List requests, newest first.
    List(ListArgs),

    /// Show one request with items, decisions, fulfillments, and audit.
    Show(ShowArgs),

    /// Patch header fields of a request.
    Update(UpdateArgs),

    /// Append or replace line items.
    #[command(subcommand)]
    Item(ItemCommand),

    /// Move a request to a new status.
    Status(StatusArgs),

    /// Record an approval decision (which also moves the status).
    Approve(ApproveArgs),

    /// Manage fulfillment records.
    #[command(subcommand)]
    Fulfill(FulfillCommand),
}

#[derive(Parser)]
pub struct CreateArgs {
    /// Request title.
    pub title: String,

    /// Requesting section (e.g. Operations, Logistics).
    #[arg(long = "section", default_value = "Operations")]
    pub section: String,

    /// Priority: routine, urgent, or immediate.
    #[arg(long = "priority", default_value = "routine")]
    pub priority: String,

    /// Create directly in this status instead of DRAFT.
    #[arg(long = "status")]
    pub status: Option<String>,

    /// Acting user id recorded as the creator.
    #[arg(long = "actor", default_value = "cli")]
    pub actor: String,

    /// Needed-by timestamp (RFC 3339).
    #[arg(long = "needed-by", value_name = "WHEN")]
    pub needed_by: Option<String>,

    #[arg(long = "justification")]
    pub justification: Option<String>,

    #[arg(long = "location", value_name = "WHERE")]
    pub delivery_location: Option<String>,

    #[arg(long = "comms")]
    pub comms_requirements: Option<String>,

    #[arg(long = "links")]
    pub links: Option<String>,

    /// Line item as KIND:QTY:UNIT:DESCRIPTION (repeatable).
    #[arg(long = "item", value_name = "SPEC")]
    pub items: Vec<String>,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Narrow to one or more statuses (repeatable).
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// Narrow to one priority.
    #[arg(long = "priority")]
    pub priority: Option<String>,

    /// Substring match against title and justification.
    #[arg(long = "text")]
    pub text: Option<String>,

    /// Only requests created at or after this time (RFC 3339).
    #[arg(long = "since", value_name = "WHEN")]
    pub since: Option<String>,

    /// Only requests created at or before this time (RFC 3339).
    #[arg(long = "until", value_name = "WHEN")]
    pub until: Option<String>,

    /// Emit JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Request id.
    pub id: i64,

    /// Emit the full aggregate as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Request id.
    pub id: i64,

    /// Acting user id.
    #[arg(long = "actor", default_value = "cli")]
    pub actor: String,

    /// Fail unless the stored version still matches.
    #[arg(long = "expect-version", value_name = "N")]
    pub expect_version: Option<i64>,

    /// New title (only while the request is in DRAFT).
    #[arg(long = "title")]
    pub title: Option<String>,

    /// New requesting section (only while in DRAFT).
    #[arg(long = "section")]
    pub section: Option<String>,

    /// New priority (only while in DRAFT).
    #[arg(long = "priority")]
    pub priority: Option<String>,

    /// New needed-by timestamp (RFC 3339).
    #[arg(long = "needed-by", value_name = "WHEN")]
    pub needed_by: Option<String>,

    #[arg(long = "justification")]
    pub justification: Option<String>,

    #[arg(long = "location", value_name = "WHERE")]
    pub delivery_location: Option<String>,

    #[arg(long = "comms")]
    pub comms_requirements: Option<String>,

    #[arg(long = "links")]
    pub links: Option<String>,
}

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Append items to a request.
    Add(ItemArgs),

    /// Replace all items of a request with a new set.
    Replace(ItemArgs),
}

#[derive(Parser)]
pub struct ItemArgs {
    /// Request id.
    pub id: i64,

    /// Line item as KIND:QTY:UNIT:DESCRIPTION (repeatable).
    #[arg(long = "item", value_name = "SPEC", required = true)]
    pub items: Vec<String>,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Request id.
    pub id: i64,

    /// Target status.
    pub status: String,

    /// Acting user id.
    #[arg(long = "actor", default_value = "cli")]
    pub actor: String,

    /// Optional note recorded alongside the change.
    #[arg(long = "note")]
    pub note: Option<String>,

    /// Fail unless the stored version still matches.
    #[arg(long = "expect-version", value_name = "N")]
    pub expect_version: Option<i64>,
}

#[derive(Parser)]
pub struct ApproveArgs {
    /// Request id.
    pub id: i64,

    /// Action: submit, review, approve, deny, cancel, or reopen.
    pub action: String,

    /// Acting user id.
    #[arg(long = "actor", default_value = "cli")]
    pub actor: String,

    /// Decision note. Required for deny.
    #[arg(long = "note")]
    pub note: Option<String>,
}

#[derive(Subcommand)]
pub enum FulfillCommand {
    /// Open a fulfillment record for a request.
    Assign(FulfillAssignArgs),

    /// Progress an existing fulfillment record.
    Update(FulfillUpdateArgs),
}

#[derive(Parser)]
pub struct FulfillAssignArgs {
    /// Request id.
    pub id: i64,

    #[arg(long = "supplier")]
    pub supplier: Option<String>,

    #[arg(long = "team")]
    pub team: Option<String>,

    #[arg(long = "vehicle")]
    pub vehicle: Option<String>,

    /// Estimated arrival (RFC 3339).
    #[arg(long = "eta", value_name = "WHEN")]
    pub eta: Option<String>,

    #[arg(long = "note")]
    pub note: Option<String>,
}

#[derive(Parser)]
pub struct FulfillUpdateArgs {
    /// Fulfillment id (from `show`).
    pub fulfillment_id: i64,

    /// New fulfillment status.
    pub status: String,

    #[arg(long = "note")]
    pub note: Option<String>,

    /// Estimated arrival (RFC 3339).
    #[arg(long = "eta", value_name = "WHEN")]
    pub eta: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_with_items_parses() {
        let cli = Cli::try_parse_from([
            "rreq",
            "--incident",
            "INC-1",
            "create",
            "Tarps",
            "--priority",
            "urgent",
            "--item",
            "SUPPLY:5:roll:Tarps",
        ])
        .expect("parse");
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.title, "Tarps");
                assert_eq!(args.items.len(), 1);
            }
            _ => panic!("expected create"),
        }
    }
}
