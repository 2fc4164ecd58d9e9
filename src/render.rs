//! Output formatting for analysis results.
//!
//! Two mutually exclusive modes, fixed at startup:
//! - Human: colored terminal output, rendered incrementally as each suite
//!   runs, plus a final one-line summary.
//! - Json: nothing is rendered incrementally; a single structured summary
//!   document is written at the end of the run.
//!
//! Either way the same reports are produced and aggregated; the mode only
//! changes what reaches stdout.

use colored::*;
use serde::{Deserialize, Serialize};

use crate::engine::{AggregateTable, Severity, TaggedReport};

/// How results are written for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Render one suite's reports under a header derived from the suite label.
///
/// The header carries a severity indicator computed from the worst report
/// present: Warning or above gets a warning-styled marker, Info-only a
/// neutral one, and a suite with no findings a success-styled check mark.
pub fn suite(mode: OutputMode, label: &str, reports: &[TaggedReport]) {
    if mode == OutputMode::Json {
        return;
    }

    let worst = reports.iter().map(|t| t.report.severity).max();
    let marker = match worst {
        Some(s) if s >= Severity::Warning => "!".yellow().bold(),
        Some(Severity::Info) => "ⓘ".normal(),
        _ => "✔".green(),
    };

    println!(" {} {}", marker, label.blue().bold());

    if !reports.is_empty() {
        println!();
        for tagged in reports {
            print_report(tagged, "   ");
        }
        println!();
    }
}

/// Render a single late-stage report without a suite header.
pub fn single(mode: OutputMode, tagged: &TaggedReport) {
    if mode == OutputMode::Json {
        return;
    }
    print_report(tagged, " ");
}

fn print_report(tagged: &TaggedReport, prefix: &str) {
    let mut lines = tagged.report.message.lines();
    let first = lines.next().unwrap_or("");

    println!("{}{}", prefix, styled_line(tagged.report.severity, first));
    for line in lines {
        println!("{}   {}", prefix, line);
    }
}

fn styled_line(severity: Severity, line: &str) -> ColoredString {
    match severity {
        Severity::Info => format!("- {}", line).normal(),
        Severity::Success => format!("☺  {} ♥", line).green(),
        Severity::Warning => format!("! {}", line).yellow(),
        Severity::Error => format!("✘ {}", line).red(),
        Severity::Critical => format!("✘✘✘ {}", line).red().bold(),
    }
}

/// Print a note that only makes sense in human mode (progress info,
/// suite separators). Suppressed entirely in json mode.
pub fn note(mode: OutputMode, message: &str) {
    if mode == OutputMode::Human {
        println!("{}", message);
    }
}

/// Final one-line verdict for human mode, reflecting the aggregation
/// table. The clean case is intentionally silent here: the level-7
/// qualification rule yields the congratulatory Success report instead.
pub fn summary_line(mode: OutputMode, table: &AggregateTable) {
    if mode == OutputMode::Json {
        return;
    }

    let warnings = table.count(Severity::Warning);
    if table.count(Severity::Critical) > 0 {
        println!(" There are some critical issues in this app :(");
    } else if table.count(Severity::Error) > 0 {
        println!(" Uhoh there are some errors to be fixed :(");
    } else if warnings >= 3 {
        println!(" Still some warnings to be fixed :s");
    } else if warnings > 0 {
        let plural = if warnings == 2 { "s" } else { "" };
        println!(" Only {} warning{} remaining! You can do it!", warnings, plural);
    }
}

/// The machine-readable summary: for each severity bucket, the ordered
/// list of rule-qualified names that fired. Messages are intentionally
/// omitted; only *which checks fired* is reported.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonSummary {
    pub success: Vec<String>,
    pub info: Vec<String>,
    pub warning: Vec<String>,
    pub error: Vec<String>,
    pub critical: Vec<String>,
}

impl JsonSummary {
    pub fn from_table(table: &AggregateTable) -> Self {
        let names = |severity| {
            table
                .origins(severity)
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        Self {
            success: names(Severity::Success),
            info: names(Severity::Info),
            warning: names(Severity::Warning),
            error: names(Severity::Error),
            critical: names(Severity::Critical),
        }
    }
}

/// Write the json summary document to stdout (json mode's only output).
pub fn write_json_summary(table: &AggregateTable) -> anyhow::Result<()> {
    let summary = JsonSummary::from_table(table);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Report;

    fn tag(origin: &'static str, report: Report) -> TaggedReport {
        TaggedReport { origin, report }
    }

    #[test]
    fn test_json_summary_buckets() {
        let mut table = AggregateTable::new();
        table.record(tag("script.unsafe_remove", Report::error("rm -rf")));
        table.record(tag("manifest.fixme_markers", Report::warning("FIXME")));
        table.record(tag("script.unsafe_remove", Report::error("again")));

        let summary = JsonSummary::from_table(&table);
        assert_eq!(
            summary.error,
            vec!["script.unsafe_remove", "script.unsafe_remove"]
        );
        assert_eq!(summary.warning, vec!["manifest.fixme_markers"]);
        assert!(summary.critical.is_empty());
        assert!(summary.success.is_empty());
    }

    #[test]
    fn test_json_summary_roundtrip() {
        let mut table = AggregateTable::new();
        table.record(tag("app.qualify_for_level_7", Report::success("clean")));

        let summary = JsonSummary::from_table(&table);
        let text = serde_json::to_string(&summary).unwrap();
        let parsed: JsonSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, summary);
    }
}
