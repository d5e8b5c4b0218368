//! Optional per-load instrumentation.
//!
//! # Responsibility
//! - Record stage durations and structural statistics for one load.
//! - Produce a serializable report for debugging slow or odd documents.
//!
//! # Invariants
//! - A disabled probe records nothing and yields no report.
//! - Recording never fails and never changes the load outcome.

use crate::model::document::DocumentStats;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Diagnostic summary of one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub file: PathBuf,
    pub file_size: u64,
    pub cache_hit: bool,
    pub total_ms: f64,
    pub extract_ms: f64,
    pub parse_ms: f64,
    pub normalize_ms: f64,
    /// Extraction directory; removed by the time the report is read.
    pub temp_dir: Option<PathBuf>,
    pub extracted_files: Vec<String>,
    /// `legacy` or `modern`; absent on cache hits.
    pub generation: Option<String>,
    pub metadata_loaded: bool,
    pub structure: DocumentStats,
    pub errors: Vec<String>,
}

/// Stage recorder that is a no-op when disabled.
#[derive(Debug)]
pub struct LoadProbe {
    started_at: Instant,
    report: Option<LoadReport>,
}

impl LoadProbe {
    pub fn new(enabled: bool, file: &Path) -> Self {
        let report = enabled.then(|| {
            let file_size = std::fs::metadata(file).map(|meta| meta.len()).unwrap_or(0);
            info!(
                "event=load_debug module=diagnostics status=start file={} size={}",
                file.display(),
                file_size
            );
            LoadReport {
                file: file.to_path_buf(),
                file_size,
                ..LoadReport::default()
            }
        });
        Self {
            started_at: Instant::now(),
            report,
        }
    }

    pub fn disabled() -> Self {
        Self {
            started_at: Instant::now(),
            report: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.report.is_some()
    }

    pub fn cache_hit(&mut self, stats: DocumentStats) {
        if let Some(report) = self.report.as_mut() {
            report.cache_hit = true;
            report.structure = stats;
        }
    }

    pub fn extracted(&mut self, elapsed: Duration, temp_dir: &Path, entries: &[String]) {
        if let Some(report) = self.report.as_mut() {
            report.extract_ms = millis(elapsed);
            report.temp_dir = Some(temp_dir.to_path_buf());
            report.extracted_files = entries.to_vec();
            info!(
                "event=load_debug module=diagnostics stage=extract files={} duration_ms={:.3}",
                entries.len(),
                report.extract_ms
            );
        }
    }

    pub fn parsed(&mut self, elapsed: Duration, generation: &str, metadata_loaded: bool) {
        if let Some(report) = self.report.as_mut() {
            report.parse_ms = millis(elapsed);
            report.generation = Some(generation.to_string());
            report.metadata_loaded = metadata_loaded;
            info!(
                "event=load_debug module=diagnostics stage=parse generation={} duration_ms={:.3}",
                generation, report.parse_ms
            );
        }
    }

    pub fn normalized(&mut self, elapsed: Duration, stats: DocumentStats) {
        if let Some(report) = self.report.as_mut() {
            report.normalize_ms = millis(elapsed);
            report.structure = stats;
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        if let Some(report) = self.report.as_mut() {
            report.errors.push(message.into());
        }
    }

    /// Closes the probe, returning the report when enabled.
    pub fn finish(self) -> Option<LoadReport> {
        let mut report = self.report?;
        report.total_ms = millis(self.started_at.elapsed());
        info!(
            "event=load_debug module=diagnostics status=ok sheets={} topics={} max_depth={} total_ms={:.3}",
            report.structure.sheet_count,
            report.structure.topic_count,
            report.structure.max_depth,
            report.total_ms
        );
        Some(report)
    }
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::LoadProbe;
    use crate::model::document::DocumentStats;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn disabled_probe_records_nothing() {
        let mut probe = LoadProbe::disabled();
        probe.extracted(Duration::from_millis(5), Path::new("/tmp/x"), &["a".to_string()]);
        probe.error("ignored");
        assert!(!probe.is_enabled());
        assert!(probe.finish().is_none());
    }

    #[test]
    fn enabled_probe_collects_stage_data() {
        let mut probe = LoadProbe::new(true, Path::new("/nonexistent/doc.xmind"));
        probe.extracted(
            Duration::from_millis(2),
            Path::new("/tmp/mindmap_extract_x"),
            &["content.json".to_string()],
        );
        probe.parsed(Duration::from_millis(3), "modern", false);
        probe.normalized(
            Duration::from_millis(1),
            DocumentStats {
                sheet_count: 1,
                topic_count: 4,
                max_depth: 2,
            },
        );

        let report = probe.finish().unwrap();
        assert_eq!(report.file_size, 0);
        assert_eq!(report.extracted_files, vec!["content.json"]);
        assert_eq!(report.generation.as_deref(), Some("modern"));
        assert_eq!(report.structure.topic_count, 4);
        assert!(report.extract_ms >= 2.0);
        assert!(!report.cache_hit);
    }
}
