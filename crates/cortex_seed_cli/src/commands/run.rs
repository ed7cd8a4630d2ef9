use std::path::PathBuf;
use std::sync::Arc;

use cortex_seed::dataset::DatasetSource;
use cortex_seed::seed::{SeedOptions, SeedRun};
use cortex_seed::CortexClient;

use crate::commands::output::{OutputFormat, print_report};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Options for `cortex-seed run`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArgs {
    /// Path to the dataset JSON (default from config or ./data.json)
    #[arg(short = 'd', long)]
    pub dataset: Option<PathBuf>,

    /// Directory holding lesson content files (default: lesson_content/ next to the dataset)
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Folder of resource images; images are skipped when unset
    #[arg(short = 'i', long)]
    pub assets: Option<PathBuf>,

    /// API base URL including the /api/v1 prefix
    #[arg(short = 'u', long)]
    pub base_url: Option<String>,

    /// Dry run - list and match without creating anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Maximum concurrent creates per resource kind (default from config or 1)
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Activate the freshly registered admin with this token
    #[arg(long)]
    pub activation_token: Option<String>,

    /// Don't register the admin account before authenticating
    #[arg(long)]
    pub no_register: bool,

    /// Output format for the summary
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl RunArgs {
    /// Merge flags over configuration.
    pub(crate) fn seed_options(&self, config: &Config) -> SeedOptions {
        SeedOptions {
            concurrency: self.concurrency.unwrap_or(config.seed.concurrency).max(1),
            dry_run: self.dry_run || config.seed.dry_run,
            asset_dir: self
                .assets
                .clone()
                .or_else(|| config.dataset.asset_dir.clone()),
            register_admin: config.seed.register_admin && !self.no_register,
            activation_token: self
                .activation_token
                .clone()
                .or_else(|| config.admin.activation_token.clone()),
        }
    }

    pub(crate) fn dataset_source(&self, config: &Config) -> DatasetSource {
        let path = self
            .dataset
            .clone()
            .unwrap_or_else(|| config.dataset.path.clone());
        let source = DatasetSource::new(path);
        match self
            .content_dir
            .clone()
            .or_else(|| config.dataset.content_dir.clone())
        {
            Some(dir) => source.with_content_dir(dir),
            None => source,
        }
    }
}

/// Run a seeding pass. Returns whether anything failed.
pub(crate) async fn handle_run(
    args: RunArgs,
    config: &Config,
) -> Result<bool, Box<dyn std::error::Error>> {
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());
    let options = args.seed_options(config);
    let source = args.dataset_source(config);

    tracing::info!(
        base_url = %base_url,
        dataset = %source.path.display(),
        dry_run = options.dry_run,
        concurrency = options.concurrency,
        "Starting seed run"
    );

    let client = CortexClient::new(&base_url, config.timeout())?;
    let run = SeedRun::new(Arc::new(client), options);

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let report = run.run_source(&source, Some(callback.as_ref())).await;
    reporter.finish();

    print_report(&report, args.output)?;
    Ok(report.has_failures())
}
