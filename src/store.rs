//! Cross-session propagation of the latest upload.
//!
//! The dashboard pages share one key/value document on disk. The latest
//! upload lives under [`UPLOAD_STORE_KEY`] and is replaced wholesale on
//! every publish.
use crate::error::{PipelineError, Result};
use crate::types::{AnalyticsEnvelope, Upload, UploadedData};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const UPLOAD_STORE_KEY: &str = "digipine_uploaded_data";

/// What other pages read back after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    pub uploaded_data: UploadedData,
    pub processed_analytics: AnalyticsEnvelope,
    pub timestamp: DateTime<Utc>,
}

impl StoredUpload {
    pub fn new(upload: &Upload) -> Self {
        StoredUpload {
            uploaded_data: upload.data.clone(),
            processed_analytics: upload.analytics.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// A consumer of finished uploads. The host decides which sinks receive
/// each upload; nothing is looked up globally.
pub trait UploadSink {
    fn name(&self) -> &str;
    fn publish(&mut self, payload: &StoredUpload) -> Result<()>;
}

/// String-keyed JSON values persisted as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut doc = self.read_document()?;
        match doc.remove(key) {
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| PipelineError::Store(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| PipelineError::Store(format!("{key}: {e}")))?;
        let mut doc = self.read_document()?;
        doc.insert(key.to_string(), value);
        self.write_document(&doc)?;
        debug!(key, path = %self.path.display(), "stored value");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut doc = self.read_document()?;
        let existed = doc.remove(key).is_some();
        if existed {
            self.write_document(&doc)?;
        }
        Ok(existed)
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PipelineError::Store(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(PipelineError::Store(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_document(&self, doc: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(doc)
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl UploadSink for KvStore {
    fn name(&self) -> &str {
        "store"
    }

    fn publish(&mut self, payload: &StoredUpload) -> Result<()> {
        self.put(UPLOAD_STORE_KEY, payload)?;
        info!(
            path = %self.path.display(),
            records = payload.processed_analytics.total_records,
            "published upload"
        );
        Ok(())
    }
}

/// The most recently published upload, if any.
pub fn load_last_upload(store: &KvStore) -> Result<Option<StoredUpload>> {
    store.get(UPLOAD_STORE_KEY)
}

/// Hand `upload` to every sink. A failing sink is reported and does not
/// stop the others; the failures are returned by sink name.
pub fn publish_all(
    sinks: &mut [Box<dyn UploadSink>],
    upload: &Upload,
) -> Vec<(String, PipelineError)> {
    let payload = StoredUpload::new(upload);
    let mut failures = Vec::new();
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.publish(&payload) {
            failures.push((sink.name().to_string(), e));
        }
    }
    failures
}
