//! Batch statistics over canonical records: totals, averages, rankings and
//! upload cadence.
//!
//! Rankings use a stable sort over scrape order, so records with equal metric
//! values keep their original relative order.

use std::cmp::Ordering;

use channel_core::error::DataCondition;
use channel_core::models::{CanonicalRecord, RankMetric, RankedEntry, RANKING_LIMIT};
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ── AggregateStats ────────────────────────────────────────────────────────────

/// Everything the analyzer derives from one batch of records.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    pub total_videos: usize,
    pub total_views: u128,
    pub average_views: Result<f64, DataCondition>,
    pub most_viewed: Vec<RankedEntry>,
    pub least_viewed: Vec<RankedEntry>,
    pub most_liked: Vec<RankedEntry>,
    pub upload_frequency_days: Result<f64, DataCondition>,
}

// ── AggregateAnalyzer ─────────────────────────────────────────────────────────

/// Stateless collection of batch computations over canonical records.
pub struct AggregateAnalyzer;

impl AggregateAnalyzer {
    /// Run every computation over `records` (in scrape order).
    pub fn analyze(records: &[CanonicalRecord]) -> AggregateStats {
        AggregateStats {
            total_videos: records.len(),
            total_views: Self::total_views(records),
            average_views: Self::average_views(records),
            most_viewed: Self::most_viewed(records),
            least_viewed: Self::least_viewed(records),
            most_liked: Self::most_liked(records),
            upload_frequency_days: Self::upload_frequency_days(records),
        }
    }

    /// Exact sum of views across all records.
    ///
    /// Accumulated in `u128` so even `u64::MAX`-sized counts cannot overflow.
    pub fn total_views(records: &[CanonicalRecord]) -> u128 {
        records.iter().map(|r| u128::from(r.views)).sum()
    }

    /// Exact sum of likes across all records.
    pub fn total_likes(records: &[CanonicalRecord]) -> u128 {
        records.iter().map(|r| u128::from(r.likes)).sum()
    }

    /// Mean views per record; undefined for an empty batch.
    pub fn average_views(records: &[CanonicalRecord]) -> Result<f64, DataCondition> {
        if records.is_empty() {
            return Err(DataCondition::EmptyDataset);
        }
        Ok(Self::total_views(records) as f64 / records.len() as f64)
    }

    /// Up to five records with the most views, descending.
    pub fn most_viewed(records: &[CanonicalRecord]) -> Vec<RankedEntry> {
        Self::rank(records, RankMetric::Views, Ordering::Greater)
    }

    /// Up to five records with the fewest views, ascending.
    pub fn least_viewed(records: &[CanonicalRecord]) -> Vec<RankedEntry> {
        Self::rank(records, RankMetric::Views, Ordering::Less)
    }

    /// Up to five records with the most likes, descending.
    pub fn most_liked(records: &[CanonicalRecord]) -> Vec<RankedEntry> {
        Self::rank(records, RankMetric::Likes, Ordering::Greater)
    }

    /// Mean gap in days between consecutive known upload dates.
    ///
    /// Records with an unknown date are skipped. An empty batch reports
    /// [`DataCondition::EmptyDataset`]; fewer than two known dates report
    /// [`DataCondition::InsufficientDateData`].
    pub fn upload_frequency_days(records: &[CanonicalRecord]) -> Result<f64, DataCondition> {
        if records.is_empty() {
            return Err(DataCondition::EmptyDataset);
        }

        let mut dates: Vec<DateTime<Utc>> =
            records.iter().filter_map(|r| r.upload_date.known()).collect();
        if dates.len() < 2 {
            return Err(DataCondition::InsufficientDateData {
                known_dates: dates.len(),
            });
        }
        dates.sort();

        let gaps: Vec<f64> = dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / MILLIS_PER_DAY)
            .collect();
        Ok(gaps.iter().sum::<f64>() / gaps.len() as f64)
    }

    /// Stable top-N selection.
    ///
    /// `first` is the ordering of a record's metric relative to the others that
    /// should put it earlier: `Greater` for a descending list, `Less` for an
    /// ascending one.
    fn rank(records: &[CanonicalRecord], metric: RankMetric, first: Ordering) -> Vec<RankedEntry> {
        let mut ordered: Vec<&CanonicalRecord> = records.iter().collect();
        // `sort_by` is stable: ties keep scrape order.
        ordered.sort_by(|a, b| {
            let cmp = metric.value_of(a).cmp(&metric.value_of(b));
            if first == Ordering::Greater {
                cmp.reverse()
            } else {
                cmp
            }
        });
        ordered
            .into_iter()
            .take(RANKING_LIMIT)
            .map(|r| RankedEntry::from_record(r, metric))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
