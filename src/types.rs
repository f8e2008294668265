use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabled::Tabled;

/// One uploaded row or object: header name -> raw cell text, in header order.
pub type Record = IndexMap<String, String>;

/// Distinct value -> occurrence count, in first-seen order.
pub type AggregateTable = IndexMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn label(self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Json => "JSON",
        }
    }
}

/// Output of the tabular parser.
#[derive(Debug, Clone, Default)]
pub struct ParsedUpload {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub record_count: usize,
    /// Time spent turning the file text into records.
    pub parse_time: Duration,
}

/// A quick look at a file before it is processed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    #[serde(rename = "type")]
    pub format: FileFormat,
    pub headers: Vec<String>,
    pub record_count: usize,
    pub sample_data: Vec<Record>,
}

/// Semantic column roles the detector can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Product,
    Category,
    Quantity,
    Price,
    Date,
    Location,
    Platform,
}

impl Role {
    /// Detection priority order.
    pub const ALL: [Role; 7] = [
        Role::Product,
        Role::Category,
        Role::Quantity,
        Role::Price,
        Role::Date,
        Role::Location,
        Role::Platform,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Role::Product => &["product", "item", "name"],
            Role::Category => &["category", "type"],
            Role::Quantity => &["quantity", "amount", "count"],
            Role::Price => &["price", "cost", "revenue"],
            Role::Date => &["date", "time"],
            Role::Location => &["area", "location", "pincode", "zone"],
            Role::Platform => &["platform", "channel", "source"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Product => "product",
            Role::Category => "category",
            Role::Quantity => "quantity",
            Role::Price => "price",
            Role::Date => "date",
            Role::Location => "location",
            Role::Platform => "platform",
        }
    }
}

/// Role -> header name. A role is `None` when no header matched it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRoles {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub platform: Option<String>,
}

impl FieldRoles {
    pub fn get(&self, role: Role) -> Option<&str> {
        self.slot(role).as_deref()
    }

    pub fn set(&mut self, role: Role, header: &str) {
        *self.slot_mut(role) = Some(header.to_string());
    }

    /// Assigned roles with their headers, in priority order.
    pub fn assigned(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|h| (role, h)))
    }

    fn slot(&self, role: Role) -> &Option<String> {
        match role {
            Role::Product => &self.product,
            Role::Category => &self.category,
            Role::Quantity => &self.quantity,
            Role::Price => &self.price,
            Role::Date => &self.date,
            Role::Location => &self.location,
            Role::Platform => &self.platform,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Product => &mut self.product,
            Role::Category => &mut self.category,
            Role::Quantity => &mut self.quantity,
            Role::Price => &mut self.price,
            Role::Date => &mut self.date,
            Role::Location => &mut self.location,
            Role::Platform => &mut self.platform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStat {
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Category,
    Location,
    Platform,
}

impl InsightKind {
    pub fn icon(self) -> &'static str {
        match self {
            InsightKind::Category => "📊",
            InsightKind::Location => "📍",
            InsightKind::Platform => "🚀",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub icon: String,
    pub text: String,
}

/// The complete result of one pipeline call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEnvelope {
    pub file_name: String,
    pub format: FileFormat,
    pub headers: Vec<String>,
    pub fields: FieldRoles,
    pub total_records: usize,
    pub valid_records: usize,
    pub error_records: usize,
    pub processing_time_ms: f64,
    pub category_breakdown: AggregateTable,
    pub location_analysis: AggregateTable,
    pub platform_distribution: AggregateTable,
    pub top_products: Vec<ProductStat>,
    pub sales_trends: Vec<DateCount>,
    pub insights: Vec<Insight>,
    pub generated_at: DateTime<Utc>,
}

/// The parsed file as handed to downstream pages alongside the analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedData {
    pub file_name: String,
    pub headers: Vec<String>,
    pub data: Vec<Record>,
    pub record_count: usize,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub data: UploadedData,
    pub analytics: AnalyticsEnvelope,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountRow {
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Product")]
    #[tabled(rename = "Product")]
    pub product: String,
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity")]
    pub total_quantity: String,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue")]
    pub total_revenue: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: usize,
}
