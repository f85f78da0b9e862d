//! BuildWise CLI library

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bw_core::{CompletionWorkflow, Role, WorkflowConfig};
use bw_rest_api_contract::MilestoneId;
use bw_rest_client::{AuthConfig, RestClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

// Re-export CLI types for testing
pub use clap::{Parser, Subcommand, ValueEnum};
pub use commands::Commands;

#[derive(Parser)]
#[command(name = "bw")]
#[command(about = "Drive a BuildWise trade through completion and acceptance")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Base URL of the BuildWise REST API
    #[arg(
        long,
        env = "BUILDWISE_API_URL",
        default_value = "http://localhost:8000/api/v1/"
    )]
    pub server: String,

    /// JWT bearer token
    #[arg(long, env = "BUILDWISE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Workflow configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Trade (milestone) to operate on
    #[arg(short, long, value_name = "ID")]
    pub milestone: i64,

    /// Party you act as
    #[arg(short, long, value_enum)]
    pub role: RoleArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Project owner (Bauträger)
    #[value(alias = "bautraeger")]
    Owner,
    /// Service provider (Dienstleister)
    #[value(alias = "dienstleister")]
    Provider,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Owner => Role::ProjectOwner,
            RoleArg::Provider => Role::ServiceProvider,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<WorkflowConfig> {
        match &self.config {
            Some(path) => WorkflowConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(WorkflowConfig::default()),
        }
    }

    pub fn rest_client(&self, config: &WorkflowConfig) -> Result<RestClient> {
        let url = Url::parse(&self.server).with_context(|| format!("invalid server URL {}", self.server))?;
        let auth = match &self.token {
            Some(token) => AuthConfig::with_bearer(token.clone()),
            None => AuthConfig::default(),
        };
        Ok(RestClient::with_timeout(url, auth, config.request_timeout())?)
    }

    /// Connect, open the trade and run the subcommand.
    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;
        let client = Arc::new(self.rest_client(&config)?);
        debug!(server = %self.server, milestone = self.milestone, role = ?self.role, "opening trade");
        let workflow = CompletionWorkflow::open(
            client,
            MilestoneId(self.milestone),
            self.role.into(),
            config,
        )
        .await?;

        let mut stdout = std::io::stdout();
        self.command.execute(Arc::new(workflow), &mut stdout).await
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
