use anyhow::Context;
use clap::Parser;
use staged_etl::utils::logger;
use staged_etl::utils::validation::Validate;
use staged_etl::{CliConfig, EtlError, EtlPipeline, PipelineConfig, Source};

fn prepare(cli: &CliConfig) -> anyhow::Result<(PipelineConfig, Source)> {
    cli.validate().context("invalid command-line arguments")?;
    let config = cli
        .pipeline_config()
        .context("failed to read pipeline configuration")?;
    config.validate().context("invalid pipeline configuration")?;
    let source = cli.source()?;
    Ok((config, source))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting staged-etl CLI");
    tracing::debug!(
        input = ?cli.input,
        resource = ?cli.resource,
        output_file = %cli.output_file,
        table = ?cli.table,
        "CLI arguments"
    );

    let (config, source) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            if let Some(etl) = e.downcast_ref::<EtlError>() {
                eprintln!("💡 Suggestion: {}", etl.recovery_suggestion());
            }
            std::process::exit(1);
        }
    };

    let mut pipeline = EtlPipeline::new(config);
    if let Some(table) = &cli.table {
        pipeline = pipeline.with_storage_table(table.clone());
    }

    let run = pipeline.execute(&source, &cli.output_file).await;
    if run.succeeded() {
        println!("✅ ETL pipeline completed successfully!");
        if let Some(path) = &run.output_path {
            println!("📁 Output saved to: {}", path);
        }
        if let Some(metrics) = &run.metrics {
            println!("📊 {}", serde_json::to_string(metrics)?);
        }
        Ok(())
    } else {
        let stage = run
            .failed_stage()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        eprintln!("❌ ETL pipeline failed at the {} stage; see the log for details", stage);
        std::process::exit(1);
    }
}
