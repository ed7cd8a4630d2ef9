use std::path::PathBuf;

use cortex_seed::ResourceKind;
use cortex_seed::dataset::{Dataset, DatasetSource, load};
use serde::Serialize;

use crate::commands::output::OutputFormat;
use crate::config::Config;

/// Options for `cortex-seed validate`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ValidateArgs {
    /// Path to the dataset JSON (default from config or ./data.json)
    #[arg(short = 'd', long)]
    pub dataset: Option<PathBuf>,

    /// Directory holding lesson content files
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Serialize, tabled::Tabled)]
struct CountRow {
    #[tabled(rename = "Kind")]
    kind: ResourceKind,
    #[tabled(rename = "Count")]
    count: usize,
}

fn count_rows(dataset: &Dataset) -> Vec<CountRow> {
    ResourceKind::ALL
        .iter()
        .map(|&kind| CountRow {
            kind,
            count: dataset.count(kind),
        })
        .collect()
}

/// Load and validate a dataset without contacting the server.
pub(crate) fn handle_validate(
    args: ValidateArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.dataset.unwrap_or_else(|| config.dataset.path.clone());
    let mut source = DatasetSource::new(path);
    if let Some(dir) = args.content_dir.or_else(|| config.dataset.content_dir.clone()) {
        source = source.with_content_dir(dir);
    }

    let dataset = load(&source)?;
    let rows = count_rows(&dataset);

    match args.output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
            println!("Dataset {} is valid.", source.path.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
