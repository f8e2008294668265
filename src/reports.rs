use crate::types::{
    AggregateTable, CountRow, DateCount, FieldRoles, ProductRow, ProductStat, Record, TrendRow,
};
use crate::util::{format_number, parse_date_safe, parse_f64_safe, parse_i64_safe, share_pct};
use chrono::NaiveDate;
use indexmap::IndexMap;

pub const UNKNOWN: &str = "Unknown";

/// Cell text for `field`, or `None` when the record lacks it or it is empty.
pub fn cell<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Count records per distinct value of `field`. An unassigned role gives an
/// empty table; empty cells are counted as `"Unknown"`.
pub fn group_count(data: &[Record], field: Option<&str>) -> AggregateTable {
    let mut table = AggregateTable::new();
    let Some(field) = field else {
        return table;
    };
    for r in data {
        let key = cell(r, field).unwrap_or(UNKNOWN);
        match table.get_mut(key) {
            Some(n) => *n += 1,
            None => {
                table.insert(key.to_string(), 1);
            }
        }
    }
    table
}

/// Best-selling products by revenue, at most `limit` of them.
///
/// Quantity defaults to 1 and price to 0 when the column is missing or the
/// cell does not parse. Totals saturate instead of overflowing, so revenue
/// always stays finite. Products with equal revenue keep first-seen order.
pub fn top_products(data: &[Record], fields: &FieldRoles, limit: usize) -> Vec<ProductStat> {
    let Some(product_field) = fields.product.as_deref() else {
        return Vec::new();
    };
    let quantity_field = fields.quantity.as_deref();
    let price_field = fields.price.as_deref();

    let mut stats: IndexMap<String, ProductStat> = IndexMap::new();
    for r in data {
        let name = cell(r, product_field).unwrap_or(UNKNOWN);
        let quantity = parse_i64_safe(quantity_field.and_then(|f| cell(r, f))).unwrap_or(1);
        let price = parse_f64_safe(price_field.and_then(|f| cell(r, f))).unwrap_or(0.0);

        let e = stats.entry(name.to_string()).or_insert_with(|| ProductStat {
            name: name.to_string(),
            total_quantity: 0,
            total_revenue: 0.0,
            order_count: 0,
        });
        let line = clamp_finite(price * quantity as f64);
        e.total_quantity = e.total_quantity.saturating_add(quantity);
        e.total_revenue = clamp_finite(e.total_revenue + line);
        e.order_count += 1;
    }

    let mut ranked: Vec<ProductStat> = stats.into_values().collect();
    rank_by_revenue(&mut ranked);
    ranked.truncate(limit);
    ranked
}

/// Sort descending by revenue. The sort is stable, so ties keep their order.
pub fn rank_by_revenue(products: &mut [ProductStat]) {
    products.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
}

fn clamp_finite(v: f64) -> f64 {
    v.clamp(f64::MIN, f64::MAX)
}

/// Orders per calendar day, in the order days first appear. Records whose
/// date does not parse are left out of this aggregate only.
pub fn date_trend(data: &[Record], field: Option<&str>) -> Vec<DateCount> {
    let Some(field) = field else {
        return Vec::new();
    };
    let mut days: IndexMap<NaiveDate, usize> = IndexMap::new();
    for r in data {
        if let Some(day) = parse_date_safe(r.get(field).map(String::as_str)) {
            *days.entry(day).or_insert(0) += 1;
        }
    }
    days.into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

pub fn count_rows(table: &AggregateTable, total: usize) -> Vec<CountRow> {
    table
        .iter()
        .map(|(value, &count)| CountRow {
            value: value.clone(),
            count,
            share_pct: format_number(share_pct(count, total), 1),
        })
        .collect()
}

pub fn product_rows(products: &[ProductStat]) -> Vec<ProductRow> {
    products
        .iter()
        .enumerate()
        .map(|(idx, p)| ProductRow {
            rank: idx + 1,
            product: p.name.clone(),
            total_quantity: format_number(p.total_quantity as f64, 0),
            total_revenue: format_number(p.total_revenue, 2),
            orders: p.order_count,
        })
        .collect()
}

pub fn trend_rows(trend: &[DateCount]) -> Vec<TrendRow> {
    trend
        .iter()
        .map(|d| TrendRow {
            date: d.date.format("%Y-%m-%d").to_string(),
            orders: d.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn group_count_preserves_first_seen_order() {
        let data = vec![
            rec(&[("zone", "Koramangala")]),
            rec(&[("zone", "HSR")]),
            rec(&[("zone", "Koramangala")]),
            rec(&[("zone", "")]),
            rec(&[]),
        ];
        let table = group_count(&data, Some("zone"));
        let entries: Vec<(&str, usize)> = table.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(entries, vec![("Koramangala", 2), ("HSR", 1), ("Unknown", 2)]);
        assert_eq!(table.values().sum::<usize>(), data.len());
    }

    #[test]
    fn group_count_without_role_is_empty() {
        let data = vec![rec(&[("zone", "HSR")])];
        assert!(group_count(&data, None).is_empty());
    }

    #[test]
    fn top_products_ranks_by_revenue() {
        let fields = FieldRoles {
            product: Some("item".into()),
            quantity: Some("qty".into()),
            price: Some("price".into()),
            ..FieldRoles::default()
        };
        let data = vec![
            rec(&[("item", "Milk"), ("qty", "2"), ("price", "30")]),
            rec(&[("item", "Chips"), ("qty", "x"), ("price", "20")]),
            rec(&[("item", "Ghee"), ("qty", "1"), ("price", "550")]),
            rec(&[("item", "Milk"), ("qty", "3"), ("price", "30")]),
            rec(&[("item", "Chips"), ("qty", "1"), ("price", "n/a")]),
        ];
        let top = top_products(&data, &fields, 10);
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ghee", "Milk", "Chips"]);

        let milk = &top[1];
        assert_eq!(milk.total_quantity, 5);
        assert_eq!(milk.order_count, 2);
        assert!((milk.total_revenue - 150.0).abs() < 1e-9);

        // unparseable quantity defaults to 1, unparseable price to 0
        let chips = &top[2];
        assert_eq!(chips.total_quantity, 2);
        assert!((chips.total_revenue - 20.0).abs() < 1e-9);
    }

    #[test]
    fn top_products_truncates_and_sorts() {
        let fields = FieldRoles {
            product: Some("product".into()),
            price: Some("price".into()),
            ..FieldRoles::default()
        };
        let data: Vec<Record> = (0..15)
            .map(|i| {
                let name = format!("P{i}");
                let price = (i % 4).to_string();
                rec(&[("product", name.as_str()), ("price", price.as_str())])
            })
            .collect();
        let top = top_products(&data, &fields, 10);
        assert_eq!(top.len(), 10);
        assert!(top
            .windows(2)
            .all(|w| w[0].total_revenue >= w[1].total_revenue));
        // ties keep their original order
        assert_eq!(top[0].name, "P3");
        assert_eq!(top[1].name, "P7");
    }

    #[test]
    fn huge_quantities_saturate() {
        let fields = FieldRoles {
            product: Some("product".into()),
            quantity: Some("quantity".into()),
            ..FieldRoles::default()
        };
        let data = vec![
            rec(&[("product", "Big"), ("quantity", "9223372036854775807")]),
            rec(&[("product", "Big"), ("quantity", "1")]),
            rec(&[("product", "Big"), ("quantity", "99999999999999999999.0")]),
        ];
        let top = top_products(&data, &fields, 10);
        assert_eq!(top[0].total_quantity, i64::MAX);
        assert_eq!(top[0].order_count, 3);
    }

    #[test]
    fn revenue_stays_finite() {
        let fields = FieldRoles {
            product: Some("product".into()),
            quantity: Some("quantity".into()),
            price: Some("price".into()),
            ..FieldRoles::default()
        };
        let huge = format!("1{}", "0".repeat(308));
        let data = vec![
            rec(&[("product", "Gold"), ("quantity", "1000"), ("price", huge.as_str())]),
            rec(&[("product", "Gold"), ("quantity", "1000"), ("price", huge.as_str())]),
            rec(&[("product", "Debt"), ("quantity", "-1000"), ("price", huge.as_str())]),
        ];
        let top = top_products(&data, &fields, 10);
        assert_eq!(top[0].name, "Gold");
        assert_eq!(top[0].total_revenue, f64::MAX);
        assert_eq!(top[1].total_revenue, f64::MIN);
        assert!(top.iter().all(|p| p.total_revenue.is_finite()));
    }

    #[test]
    fn ranking_is_total_even_with_nan() {
        let stat = |name: &str, total_revenue: f64| ProductStat {
            name: name.into(),
            total_quantity: 1,
            total_revenue,
            order_count: 1,
        };
        let mut products = vec![
            stat("a", 5.0),
            stat("b", f64::NAN),
            stat("c", 9.0),
            stat("d", 5.0),
        ];
        rank_by_revenue(&mut products);
        let names: Vec<&str> = products
            .iter()
            .filter(|p| !p.total_revenue.is_nan())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(products.len(), 4);
        assert_eq!(names, vec!["c", "a", "d"]);
    }

    #[test]
    fn top_products_without_product_role_is_empty() {
        let data = vec![rec(&[("price", "10")])];
        assert!(top_products(&data, &FieldRoles::default(), 10).is_empty());
    }

    #[test]
    fn date_trend_buckets_by_day_in_first_seen_order() {
        let data = vec![
            rec(&[("order_date", "2024-05-02T09:15:00")]),
            rec(&[("order_date", "2024-05-01")]),
            rec(&[("order_date", "2024-05-02 21:40:00")]),
            rec(&[("order_date", "not a date")]),
            rec(&[]),
        ];
        let trend = date_trend(&data, Some("order_date"));
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(trend[0].count, 2);
        assert_eq!(trend[1].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(trend[1].count, 1);
        assert!(date_trend(&data, None).is_empty());
    }

    #[test]
    fn rows_format_for_display() {
        let mut table = AggregateTable::new();
        table.insert("Zepto".into(), 3);
        table.insert("Blinkit".into(), 1);
        let rows = count_rows(&table, 4);
        assert_eq!(rows[0].share_pct, "75.0");
        assert_eq!(rows[1].share_pct, "25.0");

        let products = vec![ProductStat {
            name: "Ghee".into(),
            total_quantity: 1200,
            total_revenue: 660000.0,
            order_count: 4,
        }];
        let rows = product_rows(&products);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].total_quantity, "1,200");
        assert_eq!(rows[0].total_revenue, "660,000.00");
    }
}
