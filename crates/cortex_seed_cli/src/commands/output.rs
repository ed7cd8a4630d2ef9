use clap::ValueEnum;
use cortex_seed::seed::{KindSummary, RunReport, RunState};
use cortex_seed::ResourceKind;
use serde::Serialize;

/// Output format for run summaries.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct SummaryRow {
    #[tabled(rename = "Kind")]
    pub kind: ResourceKind,
    #[tabled(rename = "Total")]
    pub total: usize,
    #[tabled(rename = "Created")]
    pub created: usize,
    #[tabled(rename = "Skipped")]
    pub skipped: usize,
    #[tabled(rename = "Failed")]
    pub failed: usize,
}

impl From<KindSummary> for SummaryRow {
    fn from(s: KindSummary) -> Self {
        Self {
            kind: s.kind,
            total: s.total,
            created: s.created,
            skipped: s.skipped,
            failed: s.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct FailureRow {
    #[tabled(rename = "Kind")]
    pub kind: ResourceKind,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

#[derive(Debug, Serialize)]
struct ReportJson {
    state: RunState,
    summary: Vec<SummaryRow>,
    failures: Vec<FailureRow>,
    error: Option<String>,
}

pub(crate) fn summary_rows(report: &RunReport) -> Vec<SummaryRow> {
    report.summary().into_iter().map(SummaryRow::from).collect()
}

pub(crate) fn failure_rows(report: &RunReport) -> Vec<FailureRow> {
    report
        .results
        .iter()
        .flat_map(|result| {
            result.failures().into_iter().map(|(name, error)| FailureRow {
                kind: result.kind,
                name: name.to_string(),
                error: error.to_string(),
            })
        })
        .collect()
}

/// Render a finished run in the requested format.
pub(crate) fn render_report(
    report: &RunReport,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let mut out = String::new();
            let rows = summary_rows(report);
            if !rows.is_empty() {
                let mut table = tabled::Table::new(rows);
                table.with(tabled::settings::Style::rounded());
                out.push_str(&table.to_string());
                out.push('\n');
            }

            let failures = failure_rows(report);
            if !failures.is_empty() {
                let mut table = tabled::Table::new(failures);
                table.with(tabled::settings::Style::rounded());
                out.push_str("\nFailures:\n");
                out.push_str(&table.to_string());
                out.push('\n');
            }

            if let Some(error) = &report.error {
                out.push_str(&format!("\nRun aborted: {error}\n"));
            }
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(&ReportJson {
            state: report.state,
            summary: summary_rows(report),
            failures: failure_rows(report),
            error: report.error.as_ref().map(ToString::to_string),
        }),
    }
}

pub(crate) fn print_report(
    report: &RunReport,
    format: OutputFormat,
) -> Result<(), serde_json::Error> {
    let rendered = render_report(report, format)?;
    print!("{rendered}");
    if matches!(format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}
