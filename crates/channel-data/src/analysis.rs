//! Main analysis pipeline.
//!
//! Canonicalises every scraped record, runs the batch statistics and assembles
//! the [`AnalysisResult`] handed to the report and visualisation consumers.

use chrono::{DateTime, SecondsFormat, Utc};
use channel_core::error::Result;
use channel_core::formatting::{format_count, format_number, percentage};
use channel_core::models::{AnalysisResult, CanonicalRecord, Outcome, RawChannel};
use channel_core::numeric::NumericExtractor;
use channel_core::settings::PipelineConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::{AggregateAnalyzer, AggregateStats};
use crate::canonicalizer::RecordCanonicalizer;

// ── Public types ──────────────────────────────────────────────────────────────

/// Channel-level fields carried through to the result unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub name: String,
    pub subscriber_count: Option<u64>,
}

impl ChannelMetadata {
    /// Extract the metadata of a scraped channel.
    ///
    /// An unparsable subscriber count is dropped rather than reported as 0.
    pub fn from_raw(channel: &RawChannel) -> Self {
        Self {
            name: channel.name.clone(),
            subscriber_count: channel
                .subscriber_count
                .as_deref()
                .and_then(|s| NumericExtractor::try_extract(Some(s)).ok()),
        }
    }
}

/// Facts about how an analysis run was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 reference time relative dates were resolved against.
    pub reference_time: String,
    /// Name of the locale unit table in use.
    pub locale: String,
    /// IANA timezone used for calendar arithmetic.
    pub timezone: String,
    /// Number of records canonicalised.
    pub records_processed: usize,
    /// Records whose upload date could not be resolved.
    pub unknown_upload_dates: usize,
}

/// The complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAnalysis {
    pub analysis: AnalysisResult,
    /// Canonical table, one row per scraped video in scrape order.
    pub records: Vec<CanonicalRecord>,
    pub metadata: AnalysisMetadata,
}

impl ChannelAnalysis {
    /// Read-only view of the canonical records for plotting.
    pub fn canonical_table(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Short human-readable digest of the analysis.
    pub fn summary_lines(&self) -> Vec<String> {
        let a = &self.analysis;
        let mut lines = vec![format!(
            "{}: {} videos, {} total views",
            a.channel_name,
            format_count(a.total_videos as u128),
            format_count(a.total_views)
        )];

        if let Some(subs) = a.subscriber_count {
            lines.push(format!("Subscribers: {}", format_count(u128::from(subs))));
        }

        match &a.average_views {
            Outcome::Ok { value } => {
                lines.push(format!("Average views: {}", format_number(*value, 2)));
            }
            _ => lines.push("Average views: n/a (no videos)".to_string()),
        }

        if let Some(top) = a.most_viewed.first() {
            lines.push(format!(
                "Most viewed: {} ({} views)",
                top.title,
                format_count(u128::from(top.value))
            ));
        }

        let likes = AggregateAnalyzer::total_likes(&self.records);
        if a.total_views > 0 {
            let rate = percentage(likes as f64, a.total_views as f64, 2);
            lines.push(format!("Like rate: {}%", format_number(rate, 2)));
        }

        match &a.upload_frequency_days {
            Outcome::Ok { value } => lines.push(format!(
                "Uploads every {} days on average",
                format_number(*value, 1)
            )),
            Outcome::EmptyDataset => {}
            Outcome::InsufficientDateData { known_dates } => lines.push(format!(
                "Upload frequency: n/a ({known_dates} known upload date(s))"
            )),
        }

        lines
    }
}

// ── AnalysisAssembler ─────────────────────────────────────────────────────────

/// Packs aggregate statistics and channel metadata into an [`AnalysisResult`].
pub struct AnalysisAssembler;

impl AnalysisAssembler {
    pub fn assemble(channel: ChannelMetadata, stats: AggregateStats) -> AnalysisResult {
        AnalysisResult {
            channel_name: channel.name,
            subscriber_count: channel.subscriber_count,
            total_videos: stats.total_videos,
            total_views: stats.total_views,
            average_views: Outcome::from(stats.average_views),
            most_viewed: stats.most_viewed,
            least_viewed: stats.least_viewed,
            most_liked: stats.most_liked,
            upload_frequency_days: Outcome::from(stats.upload_frequency_days),
        }
    }
}

// ── AnalysisPipeline ──────────────────────────────────────────────────────────

/// Raw channel → canonical records → statistics → result.
///
/// Holds only immutable configuration, so one pipeline can be shared across
/// threads and reused for any number of channels.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: PipelineConfig,
    canonicalizer: RecordCanonicalizer,
}

impl AnalysisPipeline {
    /// Validate `config` and build the normalisers it describes.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let canonicalizer = RecordCanonicalizer::from_config(&config)?;
        Ok(Self {
            config,
            canonicalizer,
        })
    }

    /// Analyse `channel` at the configured reference time, or the current
    /// time when none is configured.
    pub fn run(&self, channel: &RawChannel) -> ChannelAnalysis {
        let now = self.config.reference_time.unwrap_or_else(Utc::now);
        self.run_at(channel, now)
    }

    /// Analyse `channel` resolving relative dates against `now`.
    pub fn run_at(&self, channel: &RawChannel, now: DateTime<Utc>) -> ChannelAnalysis {
        info!(
            "Analysing channel \"{}\" ({} videos)",
            channel.name,
            channel.videos.len()
        );

        let records = self.canonicalizer.canonicalize_all(&channel.videos, now);
        let unknown_upload_dates = records.iter().filter(|r| !r.upload_date.is_known()).count();
        if unknown_upload_dates > 0 {
            debug!(
                "{} of {} upload dates could not be resolved",
                unknown_upload_dates,
                records.len()
            );
        }

        let stats = AggregateAnalyzer::analyze(&records);
        let analysis = AnalysisAssembler::assemble(ChannelMetadata::from_raw(channel), stats);
        for condition in analysis.conditions() {
            warn!("Channel \"{}\": {}", analysis.channel_name, condition);
        }

        let metadata = AnalysisMetadata {
            reference_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            locale: self.config.locale.name.clone(),
            timezone: self.config.timezone.name().to_string(),
            records_processed: records.len(),
            unknown_upload_dates,
        };

        ChannelAnalysis {
            analysis,
            records,
            metadata,
        }
    }
}

/// Build a pipeline from `config` and run it once over `channel`.
pub fn analyze_channel(channel: &RawChannel, config: PipelineConfig) -> Result<ChannelAnalysis> {
    Ok(AnalysisPipeline::new(config)?.run(channel))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
