use crate::error::{PipelineError, Result};
use crate::reports::{count_rows, product_rows, trend_rows};
use crate::store::{StoredUpload, UploadSink};
use crate::types::{AnalyticsEnvelope, Preview};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const CATEGORY_FILE: &str = "category_breakdown.csv";
pub const LOCATION_FILE: &str = "location_analysis.csv";
pub const PLATFORM_FILE: &str = "platform_distribution.csv";
pub const PRODUCTS_FILE: &str = "top_products.csv";
pub const TRENDS_FILE: &str = "sales_trends.csv";
pub const ENVELOPE_FILE: &str = "analytics.json";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Serialize(e.to_string()))?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Render up to `max_rows` rows as a markdown table, or `(no rows)`.
pub fn table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", table_rows(rows, max_rows));
}

pub fn print_preview(preview: &Preview) {
    println!("Data Preview");
    println!(
        "Format: {} | Records: {} | Columns: {}",
        preview.format.label(),
        format_int(preview.record_count),
        preview.headers.len()
    );
    println!("Detected Columns: {}", preview.headers.join(", "));
    for (i, row) in preview.sample_data.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  {}. {}", i + 1, cells.join(", "));
    }
    println!();
}

/// Console rendering of one envelope: summary cards, insights, then tables.
pub fn print_report(a: &AnalyticsEnvelope, max_rows: usize) {
    println!(
        "{} records processed successfully from {}",
        format_int(a.total_records),
        a.file_name
    );
    println!(
        "Total: {} | Valid: {} | Errors: {} | Processing time: {} ms\n",
        format_int(a.total_records),
        format_int(a.valid_records),
        format_int(a.error_records),
        format_number(a.processing_time_ms, 2)
    );

    if a.insights.is_empty() {
        println!("No insights for this file.\n");
    } else {
        println!("Insights:");
        for insight in &a.insights {
            println!("  {} {}", insight.icon, insight.text);
        }
        println!();
    }

    println!("Category Breakdown");
    preview_table_rows(&count_rows(&a.category_breakdown, a.total_records), max_rows);
    println!("Location Analysis");
    preview_table_rows(&count_rows(&a.location_analysis, a.total_records), max_rows);
    println!("Platform Distribution");
    preview_table_rows(&count_rows(&a.platform_distribution, a.total_records), max_rows);
    println!("Top Products (by revenue)");
    preview_table_rows(&product_rows(&a.top_products), max_rows);
    println!("Sales Trends (orders per day)");
    preview_table_rows(&trend_rows(&a.sales_trends), max_rows);
}

/// Writes every table as CSV plus the whole envelope as JSON into `dir`.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReportExporter { dir: dir.into() }
    }

    pub fn export(&self, a: &AnalyticsEnvelope) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;
        let mut written = Vec::new();

        let tables = [
            (CATEGORY_FILE, &a.category_breakdown),
            (LOCATION_FILE, &a.location_analysis),
            (PLATFORM_FILE, &a.platform_distribution),
        ];
        for (file, table) in tables {
            let path = self.dir.join(file);
            write_csv(&path, &count_rows(table, a.total_records))?;
            written.push(path);
        }

        let path = self.dir.join(PRODUCTS_FILE);
        write_csv(&path, &product_rows(&a.top_products))?;
        written.push(path);

        let path = self.dir.join(TRENDS_FILE);
        write_csv(&path, &trend_rows(&a.sales_trends))?;
        written.push(path);

        let path = self.dir.join(ENVELOPE_FILE);
        write_json(&path, a)?;
        written.push(path);

        info!(dir = %self.dir.display(), files = written.len(), "exported reports");
        Ok(written)
    }
}

impl UploadSink for ReportExporter {
    fn name(&self) -> &str {
        "exporter"
    }

    fn publish(&mut self, payload: &StoredUpload) -> Result<()> {
        self.export(&payload.processed_analytics).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{analyze, AnalysisOptions};
    use crate::types::{CountRow, FileFormat};
    use tempfile::tempdir;

    #[test]
    fn exports_tables_and_envelope() {
        let upload = analyze(
            "orders.csv",
            "item,type,zone\nMilk,Dairy,Z1\nCurd,Dairy,Z2\nChips,Snacks,Z1\n",
            FileFormat::Csv,
            AnalysisOptions::default(),
        )
        .unwrap();
        let dir = tempdir().unwrap();
        let written = ReportExporter::new(dir.path()).export(&upload.analytics).unwrap();
        assert_eq!(written.len(), 6);

        let categories = std::fs::read_to_string(dir.path().join(CATEGORY_FILE)).unwrap();
        let mut lines = categories.lines();
        assert_eq!(lines.next(), Some("Value,Count,SharePct"));
        assert_eq!(lines.next(), Some("Dairy,2,66.7"));
        assert_eq!(lines.next(), Some("Snacks,1,33.3"));

        let json = std::fs::read_to_string(dir.path().join(ENVELOPE_FILE)).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["totalRecords"], 3);
        assert_eq!(v["locationAnalysis"]["Z1"], 2);
    }

    #[test]
    fn empty_tables_render_placeholder() {
        let rows: Vec<CountRow> = Vec::new();
        assert_eq!(table_rows(&rows, 5), "(no rows)");
    }

    #[test]
    fn markdown_table_is_truncated() {
        let rows: Vec<CountRow> = (0..4)
            .map(|i| CountRow {
                value: format!("Z{i}"),
                count: i,
                share_pct: "0.0".into(),
            })
            .collect();
        let out = table_rows(&rows, 2);
        assert!(out.contains("Z1"));
        assert!(!out.contains("Z2"));
        assert!(out.contains("| Value"));
    }
}
