use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "greenlight")]
#[command(version, about = "Production-readiness audit pipeline")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the audit configuration file
    #[arg(long, global = true, default_value = "greenlight.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default configuration template
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration, reporting every violation
    Validate,
    /// Run the audit over a captured analyzer results file
    Run {
        /// Path to the captured analyzer results JSON
        #[arg(short, long)]
        results: PathBuf,

        /// Force sequential execution regardless of configuration
        #[arg(long)]
        sequential: bool,

        /// Abort after the first analyzer error
        #[arg(long)]
        stop_on_error: bool,

        /// Apply the production preset over the configuration
        #[arg(long, conflicts_with = "development")]
        production: bool,

        /// Apply the development preset over the configuration
        #[arg(long)]
        development: bool,

        /// Write the report here instead of the configured output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the scoring breakdown for a saved report
    Breakdown {
        /// Path to a saved comprehensive report JSON
        report: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Init { force } => cmd::config::init(&cli.config, force)?,
        Commands::Validate => cmd::config::validate(&cli.config)?,
        Commands::Run {
            results,
            sequential,
            stop_on_error,
            production,
            development,
            output,
        } => {
            cmd::run::execute(cmd::run::RunArgs {
                config: cli.config,
                results,
                sequential,
                stop_on_error,
                production,
                development,
                output,
                verbose: cli.verbose,
            })
            .await?
        }
        Commands::Breakdown { report } => cmd::report::breakdown(&report)?,
    };

    std::process::exit(code)
}
