use crate::types::{AggregateTable, Insight, InsightKind};
use crate::util::share_pct;

/// Short sentences about the leading category, location and platform.
///
/// Empty tables produce no insight. The platform insight only appears when
/// more than one platform is present, since a single-platform file has
/// nothing to compare.
pub fn generate_insights(
    categories: &AggregateTable,
    locations: &AggregateTable,
    platforms: &AggregateTable,
    total: usize,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some((name, count)) = top_entry(categories) {
        insights.push(insight(
            InsightKind::Category,
            format!(
                "{} is your top category with {} orders ({:.1}%)",
                name,
                count,
                share_pct(count, total)
            ),
        ));
    }

    if let Some((name, count)) = top_entry(locations) {
        insights.push(insight(
            InsightKind::Location,
            format!("{} is your strongest market with {} orders", name, count),
        ));
    }

    if platforms.len() > 1 {
        if let Some((name, count)) = top_entry(platforms) {
            insights.push(insight(
                InsightKind::Platform,
                format!("{} drives {:.1}% of your orders", name, share_pct(count, total)),
            ));
        }
    }

    insights
}

/// Highest count in the table; ties go to the key seen first.
pub fn top_entry(table: &AggregateTable) -> Option<(&str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for (key, &count) in table {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key.as_str(), count));
        }
    }
    best
}

fn insight(kind: InsightKind, text: String) -> Insight {
    Insight {
        kind,
        icon: kind.icon().to_string(),
        text,
    }
}
