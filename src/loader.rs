use crate::error::{PipelineError, Result};
use crate::types::{FileFormat, ParsedUpload, Preview, Record};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

const PREVIEW_ROWS: usize = 3;

/// Raw file content plus what we know about it before parsing.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub file_name: String,
    pub format: FileFormat,
    pub size: u64,
    pub content: String,
}

impl FileFormat {
    /// Derive the format from the file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<FileFormat> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            _ => Err(PipelineError::UnsupportedFormat(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
        }
    }
}

/// Check the extension and size of `path`, then read it as text.
pub fn read_upload(path: impl AsRef<Path>, max_bytes: u64) -> Result<LoadedFile> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(PipelineError::FileTooLarge { size, limit: max_bytes });
    }
    let content = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(file = %file_name, format = format.label(), size, "read upload");
    Ok(LoadedFile { file_name, format, size, content })
}

/// Parse `content` and record how long it took.
pub fn parse(content: &str, format: FileFormat) -> Result<ParsedUpload> {
    let started = Instant::now();
    let mut parsed = match format {
        FileFormat::Csv => parse_csv(content)?,
        FileFormat::Json => parse_json(content)?,
    };
    parsed.parse_time = started.elapsed();
    Ok(parsed)
}

/// Lenient CSV: the first non-blank line is the header, every later
/// non-blank line is zipped positionally against it. Short rows are padded
/// with empty cells and surplus cells are dropped.
///
/// Each line is read on its own, so a quoted cell never spans lines. A line
/// with an unbalanced quote is split on bare commas instead.
pub fn parse_csv(content: &str) -> Result<ParsedUpload> {
    let mut columns: Option<Vec<String>> = None;
    let mut records: Vec<Record> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_line(line, line_no + 1)?;
        match &columns {
            None => columns = Some(row),
            Some(cols) => {
                let mut record = Record::with_capacity(cols.len());
                for (i, header) in cols.iter().enumerate() {
                    let value = row.get(i).cloned().unwrap_or_default();
                    record.insert(header.clone(), value);
                }
                records.push(record);
            }
        }
    }

    let headers = distinct(columns.unwrap_or_default());
    debug!(columns = headers.len(), rows = records.len(), "parsed CSV");
    Ok(ParsedUpload {
        record_count: records.len(),
        headers,
        records,
        ..ParsedUpload::default()
    })
}

/// Trimmed cells of one CSV line.
fn split_line(line: &str, line_no: usize) -> Result<Vec<String>> {
    if line.matches('"').count() % 2 != 0 {
        warn!(line = line_no, "unbalanced quote, splitting on commas");
        return Ok(line.split(',').map(|c| c.trim().to_string()).collect());
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    let mut row = StringRecord::new();
    rdr.read_record(&mut row)?;
    Ok(row.iter().map(str::to_string).collect())
}

/// A JSON array of objects, or a single object treated as a one-row file.
/// Headers come from the first element's keys in document order.
pub fn parse_json(content: &str) -> Result<ParsedUpload> {
    let value: Value = serde_json::from_str(content)?;
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };

    let headers = match items.first() {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    let records: Vec<Record> = items.iter().map(to_record).collect();
    debug!(columns = headers.len(), rows = records.len(), "parsed JSON");
    Ok(ParsedUpload {
        record_count: records.len(),
        headers,
        records,
        ..ParsedUpload::default()
    })
}

/// Summary shown when a file is picked, before any analytics run.
pub fn preview(parsed: &ParsedUpload, format: FileFormat) -> Preview {
    Preview {
        format,
        headers: parsed.headers.clone(),
        record_count: parsed.record_count,
        sample_data: parsed.records.iter().take(PREVIEW_ROWS).cloned().collect(),
    }
}

fn distinct(columns: Vec<String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(columns.len());
    for c in columns {
        if !headers.contains(&c) {
            headers.push(c);
        }
    }
    headers
}

fn to_record(item: &Value) -> Record {
    match item {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), cell_text(v))).collect(),
        _ => Record::new(),
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
