// Pipeline entry point: parse -> detect -> aggregate -> insights -> envelope.
use crate::config::Config;
use crate::detect::detect_fields;
use crate::error::Result;
use crate::insights::generate_insights;
use crate::loader;
use crate::reports::{cell, date_trend, group_count, top_products};
use crate::types::{
    AnalyticsEnvelope, FieldRoles, FileFormat, ParsedUpload, Record, Role, Upload, UploadedData,
};
use crate::util::{parse_date_safe, parse_f64_safe, parse_i64_safe};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub top_products: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions { top_products: 10 }
    }
}

impl From<&Config> for AnalysisOptions {
    fn from(cfg: &Config) -> Self {
        AnalysisOptions {
            top_products: cfg.top_products,
        }
    }
}

/// Parse `content` and derive its analytics. Only a parse failure aborts.
pub fn analyze(
    file_name: &str,
    content: &str,
    format: FileFormat,
    opts: AnalysisOptions,
) -> Result<Upload> {
    let parsed = loader::parse(content, format)?;
    Ok(build(file_name, format, parsed, opts))
}

/// Same as [`analyze`] for a file that has already been parsed (e.g. for
/// a preview). The reported processing time still includes
/// `parsed.parse_time`.
pub fn analyze_parsed(
    file_name: &str,
    format: FileFormat,
    parsed: ParsedUpload,
    opts: AnalysisOptions,
) -> Upload {
    build(file_name, format, parsed, opts)
}

fn build(
    file_name: &str,
    format: FileFormat,
    parsed: ParsedUpload,
    opts: AnalysisOptions,
) -> Upload {
    let started = Instant::now();
    let ParsedUpload {
        headers,
        records,
        record_count,
        parse_time,
    } = parsed;

    let fields = detect_fields(&headers);
    for (role, header) in fields.assigned() {
        info!(role = role.as_str(), header, "detected field");
    }

    let category_breakdown = group_count(&records, fields.category.as_deref());
    let location_analysis = group_count(&records, fields.location.as_deref());
    let platform_distribution = group_count(&records, fields.platform.as_deref());
    let top = top_products(&records, &fields, opts.top_products);
    let sales_trends = date_trend(&records, fields.date.as_deref());
    let insights = generate_insights(
        &category_breakdown,
        &location_analysis,
        &platform_distribution,
        record_count,
    );

    let valid_records = records.iter().filter(|r| is_valid_record(r, &fields)).count();
    let error_records = record_count - valid_records;
    if error_records > 0 {
        warn!(error_records, total = record_count, "records failed validation");
    }

    let processing_time_ms = (parse_time + started.elapsed()).as_secs_f64() * 1000.0;
    info!(
        file = file_name,
        records = record_count,
        valid = valid_records,
        insights = insights.len(),
        processing_time_ms,
        "analytics ready"
    );

    let analytics = AnalyticsEnvelope {
        file_name: file_name.to_string(),
        format,
        headers: headers.clone(),
        fields,
        total_records: record_count,
        valid_records,
        error_records,
        processing_time_ms,
        category_breakdown,
        location_analysis,
        platform_distribution,
        top_products: top,
        sales_trends,
        insights,
        generated_at: Utc::now(),
    };
    let data = UploadedData {
        file_name: file_name.to_string(),
        headers,
        data: records,
        record_count,
    };
    Upload { data, analytics }
}

/// A record is valid when every detected role has a value and the numeric
/// and date roles hold something parseable.
pub fn is_valid_record(record: &Record, fields: &FieldRoles) -> bool {
    fields.assigned().all(|(role, header)| {
        let Some(value) = cell(record, header) else {
            return false;
        };
        match role {
            Role::Quantity => parse_i64_safe(Some(value)).is_some(),
            Role::Price => parse_f64_safe(Some(value)).is_some(),
            Role::Date => parse_date_safe(Some(value)).is_some(),
            _ => true,
        }
    })
}
