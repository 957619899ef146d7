pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::LocalStorage;
pub use config::PipelineConfig;
pub use core::etl::{EtlPipeline, PipelineRun, PipelineState, Source, Stage};
pub use domain::model::{DataCategory, Metrics, RecordSet};
pub use utils::error::{EtlError, Result};
