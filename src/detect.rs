use crate::types::{FieldRoles, Role};

/// Assign semantic roles to headers by keyword substring match.
///
/// Each header gets at most one role: roles are tried in [`Role::ALL`]
/// order and the first whose keywords appear in the lower-cased header
/// wins. When several headers match the same role, the last one scanned
/// keeps it.
pub fn detect_fields<S: AsRef<str>>(headers: &[S]) -> FieldRoles {
    let mut fields = FieldRoles::default();
    for header in headers {
        let header = header.as_ref();
        if let Some(role) = classify(header) {
            fields.set(role, header);
        }
    }
    fields
}

/// The role a single header would receive, if any.
pub fn classify(header: &str) -> Option<Role> {
    let lower = header.to_lowercase();
    Role::ALL
        .into_iter()
        .find(|role| role.keywords().iter().any(|kw| lower.contains(kw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_quick_commerce_headers() {
        let headers = [
            "Product_Name",
            "Category",
            "Quantity",
            "Unit Price",
            "Order Date",
            "Delivery Zone",
            "Platform",
        ];
        let fields = detect_fields(&headers);
        assert_eq!(fields.product.as_deref(), Some("Product_Name"));
        assert_eq!(fields.category.as_deref(), Some("Category"));
        assert_eq!(fields.quantity.as_deref(), Some("Quantity"));
        assert_eq!(fields.price.as_deref(), Some("Unit Price"));
        assert_eq!(fields.date.as_deref(), Some("Order Date"));
        assert_eq!(fields.location.as_deref(), Some("Delivery Zone"));
        assert_eq!(fields.platform.as_deref(), Some("Platform"));
    }

    #[test]
    fn first_matching_role_claims_the_header() {
        // "name" (product) outranks "type" (category) and "zone" (location).
        assert_eq!(classify("zone_type_name"), Some(Role::Product));
        // "amount" is a quantity keyword even though it smells like money.
        assert_eq!(classify("order_amount"), Some(Role::Quantity));
        assert_eq!(classify("customer_id"), None);
    }

    #[test]
    fn last_matching_header_wins_the_role() {
        let fields = detect_fields(&["product_name", "item_name"]);
        assert_eq!(fields.product.as_deref(), Some("item_name"));
    }

    #[test]
    fn no_match_leaves_roles_empty() {
        let fields = detect_fields(&["id", "notes"]);
        assert_eq!(fields, FieldRoles::default());
        assert_eq!(fields.assigned().count(), 0);
    }

    #[test]
    fn detection_is_idempotent() {
        let headers = vec!["sku".to_string(), "Source".to_string(), "timestamp".to_string()];
        assert_eq!(detect_fields(&headers), detect_fields(&headers));
        assert_eq!(detect_fields(&headers).platform.as_deref(), Some("Source"));
        assert_eq!(detect_fields(&headers).date.as_deref(), Some("timestamp"));
    }
}
