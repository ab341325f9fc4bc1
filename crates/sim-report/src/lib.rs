//! Persisted run artifacts (§6, §9): the `summary` / `time_series` /
//! `collection_info` document produced at the end of a run (or periodically,
//! if a caller chooses to), in the configured output format.
//!
//! Metrics export errors are logged and do not affect the run in progress
//! (§7); callers see them as an `Err` they are free to ignore past logging.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use sim_config::OutputFormat;
use sim_metrics::{ComprehensiveReport, RateSeriesPoint, TimeSeriesPoint};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to serialize report as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesSection {
    pub queue_size: Vec<TimeSeriesPoint>,
    pub events_processed: Vec<TimeSeriesPoint>,
    pub rate: Vec<RateSeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub snapshot_count: usize,
    pub collection_interval: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistedReport {
    pub summary: ComprehensiveReport,
    pub time_series: TimeSeriesSection,
    pub collection_info: CollectionInfo,
}

impl PersistedReport {
    pub fn new(
        summary: ComprehensiveReport,
        queue_size: Vec<TimeSeriesPoint>,
        events_processed: Vec<TimeSeriesPoint>,
        rate: Vec<RateSeriesPoint>,
        collection_interval: f64,
    ) -> Self {
        let snapshot_count = queue_size.len();
        Self {
            summary,
            time_series: TimeSeriesSection {
                queue_size,
                events_processed,
                rate,
            },
            collection_info: CollectionInfo {
                snapshot_count,
                collection_interval,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, ReportError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Flatten the time-series sections into CSV rows. There is no nested
    /// CSV shape for the `summary`/`collection_info` sections, so those are
    /// emitted as a leading comment block; the row data is what a
    /// spreadsheet-driven analysis actually wants.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# snapshot_count={}", self.collection_info.snapshot_count);
        let _ = writeln!(out, "# collection_interval={}", self.collection_info.collection_interval);
        let _ = writeln!(out, "# overall_precision={:.6}", self.summary.overall.precision);
        let _ = writeln!(out, "# overall_recall={:.6}", self.summary.overall.recall);
        let _ = writeln!(out, "series,time,value,events_per_second,simulation_speed_factor");
        for point in &self.time_series.queue_size {
            let _ = writeln!(out, "queue_size,{},{},,", point.time, point.value);
        }
        for point in &self.time_series.events_processed {
            let _ = writeln!(out, "events_processed,{},{},,", point.time, point.value);
        }
        for point in &self.time_series.rate {
            let _ = writeln!(
                out,
                "rate,{},,{},{}",
                point.time, point.events_per_second, point.simulation_speed_factor
            );
        }
        out
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
            OutputFormat::Csv => Ok(self.to_csv()),
        }
    }

    pub fn write_to(&self, path: &Path, format: OutputFormat) -> Result<(), ReportError> {
        let rendered = self.render(format)?;
        std::fs::write(path, rendered).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(target: "report", path = %path.display(), format = ?format, "report written");
        Ok(())
    }
}

/// Best-effort export used by the run driver: logs and swallows the error
/// rather than letting a metrics-export failure affect a run already
/// complete (§7).
pub fn try_export(report: &PersistedReport, path: &Path, format: OutputFormat) {
    if let Err(err) = report.write_to(path, format) {
        error!(target: "report", ?err, path = %path.display(), "failed to export report; partial artifacts preserved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_metrics::MetricsCollector;

    fn sample_report() -> PersistedReport {
        let collector = MetricsCollector::new(0.0);
        let summary = collector.comprehensive_report(10.0);
        PersistedReport::new(
            summary,
            vec![TimeSeriesPoint { time: 1.0, value: 3.0 }],
            vec![TimeSeriesPoint { time: 1.0, value: 1.0 }],
            vec![RateSeriesPoint {
                time: 1.0,
                events_per_second: 2.0,
                simulation_speed_factor: 0.5,
            }],
            10.0,
        )
    }

    #[test]
    fn json_round_trips_through_serde_value() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["collection_info"]["snapshot_count"], 1);
    }

    #[test]
    fn yaml_contains_top_level_sections() {
        let report = sample_report();
        let yaml = report.to_yaml().unwrap();
        assert!(yaml.contains("summary:"));
        assert!(yaml.contains("time_series:"));
        assert!(yaml.contains("collection_info:"));
    }

    #[test]
    fn csv_flattens_each_series_into_rows() {
        let report = sample_report();
        let csv = report.to_csv();
        assert!(csv.contains("queue_size,1,3"));
        assert!(csv.contains("rate,1,,2,0.5"));
    }

    #[test]
    fn write_to_persists_the_chosen_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample_report().write_to(&path, OutputFormat::Json).unwrap();
        assert!(path.exists());
    }
}
