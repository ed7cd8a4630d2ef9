//! cortex-seed - populate a Cortex instance from a declarative dataset.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::run::RunArgs;
use crate::commands::validate::ValidateArgs;

#[derive(Parser)]
#[command(name = "cortex-seed")]
#[command(version)]
#[command(about = "Idempotent seeder for the Cortex education platform")]
#[command(
    long_about = "cortex-seed creates users, courses, modules, lessons and roadmaps on a Cortex \
instance from a JSON dataset. Resources that already exist are skipped, so a run can be \
repeated safely; children are linked to the server ids of their parents and images are \
attached from an optional asset folder."
)]
#[command(after_long_help = r#"EXAMPLES
    Seed a local instance from ./data.json:
        $ cortex-seed run

    Seed with images, four creates in flight per kind:
        $ cortex-seed run --dataset seed/data.json --assets seed/images -c 4

    See what would be created without touching anything:
        $ cortex-seed run --dry-run

    Check a dataset offline:
        $ cortex-seed validate --dataset seed/data.json

    Generate shell completions:
        $ cortex-seed completions bash > ~/.local/share/bash-completion/completions/cortex-seed

CONFIGURATION
    cortex-seed reads configuration from, in order:
      1. ~/.config/cortex-seed/config.toml (or $XDG_CONFIG_HOME/cortex-seed/config.toml)
      2. ./cortex-seed.toml
      3. Environment variables (CORTEX_SEED_* prefix, sections separated by __)
      4. .env file in current directory
    Command-line flags override all of the above.

ENVIRONMENT VARIABLES
    CORTEX_SEED_API__BASE_URL            API base URL (default: http://localhost:8080/api/v1)
    CORTEX_SEED_API__TIMEOUT_SECS        Per-request timeout in seconds (default: 30)
    CORTEX_SEED_DATASET__PATH            Dataset JSON (default: data.json)
    CORTEX_SEED_DATASET__CONTENT_DIR     Lesson content directory
    CORTEX_SEED_DATASET__ASSET_DIR       Image folder
    CORTEX_SEED_SEED__CONCURRENCY        Concurrent creates per kind (default: 1)
    CORTEX_SEED_SEED__REGISTER_ADMIN     Register the admin before login (default: true)
    CORTEX_SEED_ADMIN__ACTIVATION_TOKEN  Token used to activate the admin account
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the configured instance from a dataset
    Run(RunArgs),
    /// Load and validate a dataset without contacting the server
    Validate(ValidateArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Structured logging only when progress bars are not drawn
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("cortex_seed=info,cortex_seed_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    tracing::debug!(
        config_path = ?config::Config::default_config_path(),
        "Configuration loaded"
    );

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let failed = commands::run::handle_run(args, &config).await?;
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Validate(args) => commands::validate::handle_validate(args, &config)?,
        Commands::Completions { shell } => commands::meta::handle_completions(shell)?,
        Commands::Man { output } => commands::meta::handle_man(output)?,
    }

    Ok(())
}
