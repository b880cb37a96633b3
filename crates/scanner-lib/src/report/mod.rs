//! Report rendering and artifact writing
//!
//! The renderers are pure functions over processed reports plus a stats
//! snapshot; `ReportWriter` handles the timestamped files.

mod csv;
mod html;
mod summary;

pub use csv::{render_csv, CSV_HEADER};
pub use html::render_html;
pub use summary::render_summary;

use crate::models::{StatsSnapshot, StoppedInstanceReport};
use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Count reports by an arbitrary key, most frequent first. Equal counts keep
/// first-seen order, so truncated top-N views are deterministic.
fn count_by<F>(reports: &[StoppedInstanceReport], key: F) -> Vec<(String, usize)>
where
    F: Fn(&StoppedInstanceReport) -> String,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for report in reports {
        let k = key(report);
        if !counts.contains_key(&k) {
            order.push(k.clone());
        }
        *counts.entry(k).or_insert(0) += 1;
    }

    let mut entries: Vec<(String, usize)> = order
        .into_iter()
        .map(|k| {
            let count = counts[&k];
            (k, count)
        })
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Writes timestamped CSV and HTML artifacts into the output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn write_csv(&self, reports: &[StoppedInstanceReport]) -> Result<PathBuf> {
        let path = self.timestamped_path("csv");
        self.write(&path, render_csv(reports)).await?;
        Ok(path)
    }

    pub async fn write_html(
        &self,
        reports: &[StoppedInstanceReport],
        stats: &StatsSnapshot,
    ) -> Result<PathBuf> {
        let path = self.timestamped_path("html");
        self.write(&path, render_html(reports, stats)).await?;
        Ok(path)
    }

    fn timestamped_path(&self, extension: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        self.output_dir
            .join(format!("Stopped_Instances_{timestamp}.{extension}"))
    }

    async fn write(&self, path: &Path, content: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("creating output directory {}", self.output_dir.display()))?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("writing report {}", path.display()))?;
        info!(path = %path.display(), "report saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, shape: &str) -> StoppedInstanceReport {
        StoppedInstanceReport {
            instance_name: name.to_string(),
            instance_id: format!("ocid1.instance.oc1..{name}"),
            shape: shape.to_string(),
            region: "us-ashburn-1".to_string(),
            availability_domain: "AD-1".to_string(),
            compartment_name: "dev".to_string(),
            compartment_id: "ocid1.compartment.oc1..dev".to_string(),
            time_created: "2024-01-01T00:00:00Z".to_string(),
            days_since_created: 10,
            instance_owner: "alice".to_string(),
            fault_domain: "FD-1".to_string(),
            image_id: "ocid1.image.oc1..img".to_string(),
        }
    }

    #[test]
    fn count_by_orders_most_frequent_first() {
        let reports = vec![
            report("a", "small"),
            report("b", "large"),
            report("c", "large"),
            report("d", "medium"),
        ];

        let counts = count_by(&reports, |r| r.shape.clone());
        assert_eq!(counts[0], ("large".to_string(), 2));
        // Ties keep first-seen order.
        assert_eq!(counts[1], ("small".to_string(), 1));
        assert_eq!(counts[2], ("medium".to_string(), 1));
    }

    #[tokio::test]
    async fn writer_creates_timestamped_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let reports = vec![report("a", "small")];

        let csv_path = writer.write_csv(&reports).await.unwrap();
        let html_path = writer
            .write_html(&reports, &StatsSnapshot::default())
            .await
            .unwrap();

        let csv_name = csv_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(csv_name.starts_with("Stopped_Instances_"));
        assert!(csv_name.ends_with(".csv"));
        assert!(html_path.to_string_lossy().ends_with(".html"));

        let csv_content = tokio::fs::read_to_string(&csv_path).await.unwrap();
        assert!(csv_content.starts_with("instance_name,"));
        let html_content = tokio::fs::read_to_string(&html_path).await.unwrap();
        assert!(html_content.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn writer_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports/2024");
        let writer = ReportWriter::new(&nested);

        let path = writer.write_csv(&[]).await.unwrap();
        assert!(path.exists());
    }
}
