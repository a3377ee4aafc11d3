mod bootstrap;

use anyhow::{Context, Result};
use channel_core::settings::{PipelineConfig, Settings};
use channel_data::analysis::AnalysisPipeline;
use clap::Parser;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("Channel Analyzer v{} starting", env!("CARGO_PKG_VERSION"));

    let config = PipelineConfig::from_settings(&settings).context("invalid configuration")?;
    tracing::info!(
        "Locale: {}, Timezone: {}",
        config.locale.name,
        config.timezone.name()
    );

    let channel = bootstrap::load_input(&settings)?;
    let pipeline = AnalysisPipeline::new(config)?;
    let analysis = pipeline.run(&channel);

    for line in analysis.summary_lines() {
        tracing::info!("{}", line);
    }

    let document = bootstrap::render_output(&analysis, settings.include_table, settings.pretty)?;
    bootstrap::write_output(settings.output.as_deref(), &document)?;

    Ok(())
}
