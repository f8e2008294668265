//! Upload analytics for the DIGIPINE delivery-zone dashboard.
//!
//! A CSV or JSON upload is parsed into untyped records, its columns are
//! mapped to semantic roles by header keywords, and the records are
//! aggregated into breakdowns, top products, a daily trend and a few
//! insights. Everything lands in one [`AnalyticsEnvelope`], which callers
//! hand to whatever renders or stores it.
pub mod analytics;
pub mod config;
pub mod detect;
pub mod error;
pub mod insights;
pub mod loader;
pub mod output;
pub mod reports;
pub mod store;
pub mod types;
pub mod util;

pub use analytics::{analyze, analyze_parsed, AnalysisOptions};
pub use config::Config;
pub use detect::detect_fields;
pub use error::{PipelineError, Result};
pub use store::{KvStore, StoredUpload, UploadSink, UPLOAD_STORE_KEY};
pub use types::{
    AggregateTable, AnalyticsEnvelope, FieldRoles, FileFormat, Insight, InsightKind, ProductStat,
    Record, Role, Upload, UploadedData,
};
