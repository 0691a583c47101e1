//! berth CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};

use crate::config::BerthConfig;
use crate::orchestrator::Orchestrator;
use crate::runtime::DockerRuntime;
use crate::spec::WorkloadSpec;

/// berth - Run a single container against a Docker daemon
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config.toml
    #[arg(short, long, env = "BERTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// berth commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start a container and stop it on Ctrl-C
    Run {
        /// Logical container name
        #[arg(short, long)]
        name: String,

        /// Path to the workload spec
        spec: PathBuf,
    },

    /// Validate a workload spec and show the derived configuration
    Config {
        /// Path to the workload spec
        spec: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Show which configured registry would authorize pulling an image
    Auth {
        /// Image reference
        image: String,
    },
}

/// Output format for `berth config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn execute(self) -> Result<()> {
        let config_path = self.config.unwrap_or_else(BerthConfig::default_path);

        match self.command {
            Commands::Run { name, spec } => {
                let spec = Arc::new(load_spec(&spec)?);
                let config = BerthConfig::load(&config_path)?;
                let runtime = DockerRuntime::connect(config.credential_resolver()?)
                    .await
                    .wrap_err("Failed to connect to Docker daemon")?;
                let orchestrator = Orchestrator::new(Arc::new(runtime));

                let mut container = orchestrator.start(&name, spec).await?;
                println!("{}\t{}", container.id(), container.name());

                tokio::signal::ctrl_c()
                    .await
                    .wrap_err("Failed to listen for Ctrl-C")?;
                container.stop().await;
                Ok(())
            }

            Commands::Config { spec, format } => {
                let spec = load_spec(&spec)?;
                let configs = spec.container_configs()?;
                let rendered = match format {
                    OutputFormat::Yaml => serde_yaml::to_string(&configs)?,
                    OutputFormat::Json => serde_json::to_string_pretty(&configs)?,
                };
                println!("{}", rendered.trim_end());
                Ok(())
            }

            Commands::Auth { image } => {
                let config = BerthConfig::load(&config_path)?;
                let resolver = config.credential_resolver()?;
                match resolver.registry_for(&image) {
                    Some(registry) => println!("{image}: authenticated via {registry}"),
                    None => println!("{image}: anonymous pull"),
                }
                Ok(())
            }
        }
    }
}

fn load_spec(path: &Path) -> Result<WorkloadSpec> {
    WorkloadSpec::from_file(path)
        .wrap_err_with(|| format!("Failed to load workload spec {}", path.display()))
}
