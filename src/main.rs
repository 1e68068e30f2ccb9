mod model;
mod parse;
mod analyze;
mod report;
mod logging;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use anyhow::{Context, Result};
use regex::Regex;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{info, warn};
use crate::parse::ColumnarLogParser;
use crate::analyze::{Action, Analyzer, DateRange, Qualifier, ReportConfig, HTTP_OK};
use crate::model::LogTime;
use crate::report::build_report;

static DATE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[-?\d+:-?\d+:-?\d+:-?\d+\]$").expect("valid date regex"));

/// Web server access log analyzer.
/// Counts accesses per host, or successful retrievals per resource, optionally
/// limited to a date range, and prints them most frequent first.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// webserver: accesses per host; resource: successful GET retrievals per URI
    #[arg(long, value_enum)]
    action: ActionArg,

    /// Access log to analyze
    #[arg(long, value_name = "PATH")]
    file: PathBuf,

    /// Lower date bound, e.g. [29:23:53:27]. Only used together with --maximum_date
    #[arg(long = "minimum_date", value_name = "[D:H:M:S]", value_parser = parse_date_arg)]
    minimum_date: Option<LogTime>,

    /// Upper date bound, e.g. [29:23:54:18]. Only used together with --minimum_date
    #[arg(long = "maximum_date", value_name = "[D:H:M:S]", value_parser = parse_date_arg)]
    maximum_date: Option<LogTime>,

    /// Only print the N most frequent entries
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Save the report as JSON to this path
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Request method counted by the resource report
    #[arg(long, default_value = "GET")]
    method: String,

    /// Response status counted by the resource report
    #[arg(long, default_value = HTTP_OK)]
    status: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Debug, ValueEnum)]
enum ActionArg { Webserver, Resource }
impl From<ActionArg> for Action {
    fn from(v: ActionArg) -> Self {
        match v { ActionArg::Webserver => Action::Webserver, ActionArg::Resource => Action::Resource }
    }
}

fn parse_date_arg(s: &str) -> Result<LogTime, String> {
    if !DATE_ARG.is_match(s) {
        return Err(format!("expected [D:H:M:S], got {s:?}"));
    }
    s.parse().map_err(|e: parse::ParseError| e.to_string())
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // usage goes to stdout, the reason to stderr
            println!("{}", Cli::command().render_long_help());
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}

fn main() -> Result<()> {
    let cli = parse_cli();
    logging::init_logging(&cli.log_level);

    let range = DateRange::from_bounds(cli.minimum_date, cli.maximum_date);
    if range.is_none() && (cli.minimum_date.is_some() || cli.maximum_date.is_some()) {
        warn!("--minimum_date and --maximum_date must be given together, not filtering by date");
    }

    let mut config = ReportConfig::new(cli.action.into()).with_range(range);
    config.qualifier = Qualifier { method: cli.method, status: cli.status };
    info!(action = ?config.action, range = ?config.range, file = %cli.file.display(), "building report");

    let mut parser = ColumnarLogParser::new();
    let mut analyzer = Analyzer::new(config);
    analyzer
        .consume_file(&mut parser, &cli.file)
        .with_context(|| format!("Failed reading {}", cli.file.display()))?;

    let mut report = build_report(&analyzer);
    if let Some(n) = cli.top { report.truncate(n); }
    info!(
        entries = report.entries.len(),
        lines = report.lines_read,
        malformed = report.malformed_lines,
        filtered = report.filtered_out,
        "report ready"
    );

    let mut out = BufWriter::new(std::io::stdout().lock());
    for line in report.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    if let Some(path) = cli.json_out.as_deref() {
        std::fs::write(path, serde_json::to_vec_pretty(&report)?)
            .with_context(|| format!("Saving JSON to {}", path.display()))?;
        info!(path = %path.display(), "saved JSON");
    }

    Ok(())
}
