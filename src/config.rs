use chrono::Weekday;
use clap::Parser;
use std::path::PathBuf;

/// Line-delimited JSON sidecar for the classroom talent ledger.
#[derive(Debug, Clone, Parser)]
#[command(name = "classbookd", version)]
pub struct Config {
    /// Workspace directory to open at startup.
    #[arg(long, env = "CLASSBOOKD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Weekday on which attendance may be recorded.
    #[arg(long, env = "CLASSBOOKD_ATTENDANCE_DAY", default_value = "sun", value_parser = parse_weekday)]
    pub attendance_day: Weekday,

    /// tracing filter directive; CLASSBOOKD_LOG is used when absent.
    #[arg(long)]
    pub log_filter: Option<String>,
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday: {s}"))
}
