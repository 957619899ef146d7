use crate::config::PipelineConfig;
use crate::core::etl::Source;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_name, validate_non_empty_string, validate_sql_identifier, Validate,
};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_INPUT_FILE: &str = "sales_data.csv";

#[derive(Debug, Clone, Parser)]
#[command(name = "staged-etl")]
#[command(about = "Extract, transform, validate and load sales records")]
pub struct CliConfig {
    /// Delimited input file with a header row
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Remote resource under the API endpoint; replaces --input
    #[arg(long, conflicts_with = "input")]
    pub resource: Option<String>,

    /// Bearer credential for --resource
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "output.csv")]
    pub output_file: String,

    /// Also write rows to this table in the configured database
    #[arg(long)]
    pub table: Option<String>,

    /// Overrides API_ENDPOINT
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Overrides DATABASE_URL
    #[arg(long)]
    pub database_url: Option<String>,

    /// Overrides OUTPUT_DIR
    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Environment values with explicit flags layered on top.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        self.pipeline_config_with(|key| std::env::var(key).ok())
    }

    pub fn pipeline_config_with<F>(&self, lookup: F) -> Result<PipelineConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = PipelineConfig::from_lookup(lookup)?;
        Ok(PipelineConfig::new(
            self.api_endpoint
                .clone()
                .unwrap_or_else(|| env.api_endpoint().to_string()),
            self.database_url
                .clone()
                .unwrap_or_else(|| env.storage_url().to_string()),
            self.output_dir
                .clone()
                .unwrap_or_else(|| env.output_directory().to_string()),
        )
        .with_request_timeout(env.request_timeout())
        .with_storage_timeout(env.storage_timeout()))
    }

    pub fn source(&self) -> Result<Source> {
        match &self.resource {
            Some(resource) => {
                let credential = self.api_key.clone().ok_or_else(|| {
                    EtlError::InvalidConfigValueError {
                        field: "api_key".to_string(),
                        value: String::new(),
                        reason: "--resource requires --api-key or API_KEY".to_string(),
                    }
                })?;
                Ok(Source::remote(resource.clone(), credential))
            }
            None => Ok(Source::file(
                self.input
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE)),
            )),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_file_name("output_file", &self.output_file)?;

        if let Some(table) = &self.table {
            validate_sql_identifier("table", table)?;
        }

        if let Some(resource) = &self.resource {
            validate_non_empty_string("resource", resource)?;
            if let Some(key) = &self.api_key {
                validate_non_empty_string("api_key", key)?;
            }
        }

        Ok(())
    }
}
