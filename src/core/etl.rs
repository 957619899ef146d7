use crate::config::PipelineConfig;
use crate::core::extract::Extractor;
use crate::core::load::Loader;
use crate::core::metrics::MetricsCalculator;
use crate::core::transform::Transformer;
use crate::core::validate::DataValidator;
use crate::domain::model::{Metrics, RecordSet};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Validate,
    Load,
    Metrics,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Validate => "validate",
            Stage::Load => "load",
            Stage::Metrics => "metrics",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Stage::Extract => "Extraction failed",
            Stage::Transform => "Transformation failed",
            Stage::Validate => "Validation failed",
            Stage::Load => "Loading failed",
            Stage::Metrics => "Metrics calculation failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one run. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Extracting,
    Transforming,
    Validating,
    Loading,
    Metrics,
    Done,
    Failed(Stage),
}

impl PipelineState {
    /// The stage running in this state, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Extracting => Some(Stage::Extract),
            PipelineState::Transforming => Some(Stage::Transform),
            PipelineState::Validating => Some(Stage::Validate),
            PipelineState::Loading => Some(Stage::Load),
            PipelineState::Metrics => Some(Stage::Metrics),
            PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    fn next(self) -> Self {
        match self {
            PipelineState::Extracting => PipelineState::Transforming,
            PipelineState::Transforming => PipelineState::Validating,
            PipelineState::Validating => PipelineState::Loading,
            PipelineState::Loading => PipelineState::Metrics,
            PipelineState::Metrics => PipelineState::Done,
            terminal => terminal,
        }
    }

    fn fail(self) -> Self {
        match self.stage() {
            Some(stage) => PipelineState::Failed(stage),
            None => self,
        }
    }
}

/// Where a run reads its records from.
#[derive(Clone)]
pub enum Source {
    File(PathBuf),
    Remote { resource: String, credential: String },
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    pub fn remote(resource: impl Into<String>, credential: impl Into<String>) -> Self {
        Source::Remote {
            resource: resource.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => f.debug_tuple("File").field(path).finish(),
            Source::Remote { resource, .. } => f
                .debug_struct("Remote")
                .field("resource", resource)
                .field("credential", &"<redacted>")
                .finish(),
        }
    }
}

/// Outcome of one run. Failure reasons live in the log stream only.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub state: PipelineState,
    pub metrics: Option<Metrics>,
    pub output_path: Option<String>,
    pub rows_loaded: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    fn start() -> Self {
        Self {
            state: PipelineState::Extracting,
            metrics: None,
            output_path: None,
            rows_loaded: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn advance(&mut self) {
        let next = self.state.next();
        tracing::debug!(from = ?self.state, to = ?next, "pipeline state transition");
        self.state = next;
    }

    fn fail(mut self) -> Self {
        if let Some(stage) = self.state.stage() {
            tracing::error!(stage = %stage, "{}", stage.failure_message());
        }
        self.state = self.state.fail();
        self.finished_at = Some(Utc::now());
        self
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match self.state {
            PipelineState::Failed(stage) => Some(stage),
            _ => None,
        }
    }
}

/// Sequences Extract → Transform → Validate → Load → Metrics, stopping at
/// the first stage that yields no data.
pub struct EtlPipeline {
    config: PipelineConfig,
    extractor: Extractor,
    transformer: Transformer,
    validator: DataValidator,
    loader: Loader,
    metrics_calculator: MetricsCalculator,
    storage_table: Option<String>,
}

impl EtlPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: Extractor::new(config.clone()),
            transformer: Transformer::new(),
            validator: DataValidator::new(),
            loader: Loader::new(config.clone()),
            metrics_calculator: MetricsCalculator::new(),
            storage_table: None,
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(PipelineConfig::from_env()?))
    }

    /// Also write `(price, quantity, total)` rows to `table` during loading.
    pub fn with_storage_table(mut self, table: impl Into<String>) -> Self {
        self.storage_table = Some(table.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, source: &Source, output_file: &str) -> bool {
        self.execute(source, output_file).await.succeeded()
    }

    pub async fn execute(&self, source: &Source, output_file: &str) -> PipelineRun {
        tracing::info!(?source, output_file, "🚀 Starting ETL pipeline");
        let mut run = PipelineRun::start();

        let Some(raw) = self.extract(source).await else {
            return run.fail();
        };
        run.advance();

        let Some(transformed) = self.transformer.transform(&raw) else {
            return run.fail();
        };
        run.advance();

        let Some(validated) = self.validator.clean(&transformed) else {
            return run.fail();
        };
        run.advance();

        if !self.loader.save_to_file(&validated, output_file).await {
            return run.fail();
        }
        run.output_path = Some(self.loader.output_path(output_file));
        if let Some(table) = &self.storage_table {
            if !self.loader.save_to_storage(&validated, table) {
                return run.fail();
            }
        }
        run.rows_loaded = validated.len();
        run.advance();

        run.metrics = self.metrics_calculator.calculate(&validated);
        match &run.metrics {
            Some(metrics) => tracing::info!("Pipeline completed. Metrics: {}", metrics),
            None => tracing::warn!("Metrics unavailable; continuing"),
        }
        run.advance();

        let run = run.finish();
        tracing::info!(
            rows = run.rows_loaded,
            elapsed_ms = run
                .finished_at
                .map(|t| (t - run.started_at).num_milliseconds())
                .unwrap_or_default(),
            "✅ ETL pipeline completed successfully"
        );
        run
    }

    async fn extract(&self, source: &Source) -> Option<RecordSet> {
        match source {
            Source::File(path) => self.extractor.extract_from_file(path),
            Source::Remote {
                resource,
                credential,
            } => self.extractor.extract_from_remote(resource, credential).await,
        }
    }
}
