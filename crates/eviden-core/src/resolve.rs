//! Semantic column resolution
//!
//! Maps arbitrary column names to canonical business roles using ordered
//! keyword lists. Keyword priority dominates column order: the first keyword
//! that matches any column wins, even if a later keyword would match a column
//! declared earlier.

/// Revenue-like columns (sales)
pub const SALES_REVENUE: &[&str] = &["revenue", "sales", "total", "amount"];
/// Quantity-like columns (sales)
pub const SALES_QUANTITY: &[&str] = &["quantity", "qty", "units"];
/// Product-like columns (sales)
pub const SALES_PRODUCT: &[&str] = &["product", "item", "sku"];
/// Margin-like columns (sales)
pub const SALES_MARGIN: &[&str] = &["margin", "profit"];
/// Date-like columns
pub const DATE: &[&str] = &["date", "time", "timestamp"];

pub const FINANCE_BALANCE: &[&str] = &["balance", "amount", "value"];
pub const FINANCE_DEBIT: &[&str] = &["debit", "expense", "withdrawal"];
pub const FINANCE_CREDIT: &[&str] = &["credit", "income", "deposit"];
pub const FINANCE_ACCOUNT: &[&str] = &["account", "customer", "id"];
pub const FINANCE_TRANSACTION: &[&str] = &["transaction", "type", "category"];

pub const CUSTOMER_ID: &[&str] = &["customer", "user", "client", "id"];
pub const CUSTOMER_CHURN: &[&str] = &["churn", "churned", "status"];
pub const CUSTOMER_AGE: &[&str] = &["age", "tenure", "duration"];
pub const CUSTOMER_SEGMENT: &[&str] = &["segment", "category", "tier", "group"];
pub const CUSTOMER_VALUE: &[&str] = &["value", "ltv", "lifetime", "revenue"];

/// Find the column matching the highest-priority keyword
///
/// Patterns are tried in the given order; for each pattern, columns are
/// scanned in declaration order and the first whose lower-cased name
/// contains the pattern is returned.
pub fn resolve<'a, S: AsRef<str>>(columns: &'a [S], keyword_patterns: &[&str]) -> Option<&'a str> {
    let lowered: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();

    keyword_patterns.iter().find_map(|pattern| {
        lowered
            .iter()
            .position(|name| name.contains(pattern))
            .map(|idx| columns[idx].as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_case_insensitive_substring() {
        let cols = ["Order_ID", "Total_Revenue", "Units"];
        assert_eq!(resolve(&cols, SALES_REVENUE), Some("Total_Revenue"));
        assert_eq!(resolve(&cols, SALES_QUANTITY), Some("Units"));
    }

    #[test]
    fn test_keyword_priority_beats_column_order() {
        // "amount" matches the first column, but "revenue" is a higher-priority
        // keyword and matches a later column.
        let cols = ["amount_paid", "net_revenue"];
        assert_eq!(resolve(&cols, SALES_REVENUE), Some("net_revenue"));
    }

    #[test]
    fn test_first_column_wins_for_same_keyword() {
        let cols = ["gross_revenue", "net_revenue"];
        assert_eq!(resolve(&cols, &["revenue"]), Some("gross_revenue"));
    }

    #[test]
    fn test_resolve_not_found() {
        let cols = ["alpha", "beta"];
        assert_eq!(resolve(&cols, SALES_PRODUCT), None);
        let empty: [&str; 0] = [];
        assert_eq!(resolve(&empty, SALES_PRODUCT), None);
    }

    #[test]
    fn test_resolve_accepts_owned_names() {
        let cols = vec!["customer_id".to_string(), "status".to_string()];
        assert_eq!(resolve(&cols, CUSTOMER_CHURN), Some("status"));
    }
}
