// tfdeploy CLI entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tfdeploy_cli::commands;
use tfdeploy_cli::pipeline::Operation;
use tfdeploy_config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "tfdeploy")]
#[command(version)]
#[command(about = "ChatOps for Terraform infrastructure deployments via GitHub PRs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse config and emit settings for an environment, without terraform
    Parse {
        /// Target environment
        #[arg(short, long)]
        environment: String,

        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Execute terraform for an environment
    Execute {
        /// Target environment
        #[arg(short, long)]
        environment: String,

        /// Operation to perform
        #[arg(short, long, value_enum)]
        operation: Operation,

        /// Git commit SHA being deployed
        #[arg(short, long)]
        sha: String,

        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the environment's working directory
        #[arg(short, long)]
        working_dir: Option<PathBuf>,

        /// Print commands without executing
        #[arg(long)]
        dry_run: bool,

        /// Extra terraform args from the trigger comment
        #[arg(long)]
        extra_args: Option<String>,
    },
    /// Validate the configuration file
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// List available environments, comma-separated
    Environments {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Run a built-in hook standalone
    Check {
        /// Built-in hook name: validate, trivy, or tflint
        #[arg(long)]
        hook: String,

        /// Target environment
        #[arg(short, long)]
        environment: String,

        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            environment,
            config,
        } => commands::parse::run(&environment, &config)?,
        Commands::Execute {
            environment,
            operation,
            sha,
            config,
            working_dir,
            dry_run,
            extra_args,
        } => {
            commands::execute::run(commands::execute::ExecuteArgs {
                environment,
                operation,
                sha,
                config_path: config,
                working_dir,
                dry_run,
                extra_args,
            })
            .await?
        }
        Commands::Validate { config } => commands::validate::run(&config)?,
        Commands::Environments { config } => commands::environments::run(&config)?,
        Commands::Check {
            hook,
            environment,
            config,
        } => commands::check::run(&hook, &environment, &config).await?,
    }

    Ok(())
}
