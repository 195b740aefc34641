//! Required export columns and header resolution.

use crate::error::{TransformError, TransformResult};
use crate::parser::RawTable;

pub const CAMPAIGNS: &str = "Campaigns";
pub const STATUS: &str = "Status";
pub const START_DATE: &str = "Start date";
pub const PORTFOLIO: &str = "Portfolio";
pub const BUDGET_USD: &str = "Budget(USD)";
pub const IMPRESSIONS: &str = "Impressions";
pub const CLICKS: &str = "Clicks";
pub const SPEND_USD: &str = "Spend(USD)";
pub const CPC_USD: &str = "CPC(USD)";
pub const ORDERS: &str = "Orders";
pub const ACOS: &str = "ACOS";
pub const VIEWABLE_IMPRESSIONS: &str = "Viewable impressions";

pub const CATEGORY: &str = "Category";
pub const NOTE: &str = "Note";
pub const ACTION: &str = "Action";

/// Columns every daily export must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    CAMPAIGNS,
    STATUS,
    START_DATE,
    PORTFOLIO,
    BUDGET_USD,
    IMPRESSIONS,
    CLICKS,
    SPEND_USD,
    CPC_USD,
    ORDERS,
    ACOS,
    VIEWABLE_IMPRESSIONS,
];

/// Header row of an exported day table.
pub const OUTPUT_COLUMNS: [&str; 15] = [
    CAMPAIGNS,
    STATUS,
    START_DATE,
    PORTFOLIO,
    BUDGET_USD,
    IMPRESSIONS,
    CLICKS,
    SPEND_USD,
    CPC_USD,
    ORDERS,
    ACOS,
    VIEWABLE_IMPRESSIONS,
    CATEGORY,
    NOTE,
    ACTION,
];

/// Index of each required column within a raw table's header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnMap {
    /// Locate every required column, or report all of the missing ones.
    pub fn resolve(table: &RawTable) -> TransformResult<Self> {
        let mut indices = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();

        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match table.column_index(name) {
                Some(idx) => indices[slot] = idx,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(TransformError::Schema { missing });
        }
        Ok(Self { indices })
    }

    /// Project a raw row onto the required columns, in [`REQUIRED_COLUMNS`] order.
    pub fn project<'a>(&self, row: &'a [String]) -> ProjectedRow<'a> {
        let mut cells = [""; REQUIRED_COLUMNS.len()];
        for (slot, &idx) in self.indices.iter().enumerate() {
            cells[slot] = row.get(idx).map(String::as_str).unwrap_or("");
        }
        ProjectedRow { cells }
    }
}

/// A raw row reduced to the required columns.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedRow<'a> {
    cells: [&'a str; REQUIRED_COLUMNS.len()],
}

impl<'a> ProjectedRow<'a> {
    /// Cell for a required column name.
    pub fn get(&self, column: &str) -> &'a str {
        REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|slot| self.cells[slot])
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv;

    #[test]
    fn test_resolve_reports_every_missing_column() {
        let table = parse_csv("Campaigns,Status\nx,Enabled", ',').unwrap();
        let err = ColumnMap::resolve(&table).unwrap_err();
        match err {
            TransformError::Schema { missing } => {
                assert_eq!(missing.len(), 10);
                assert!(missing.contains(&"Impressions".to_string()));
                assert!(!missing.contains(&"Campaigns".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_projection_ignores_column_order_and_extras() {
        let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().rev().map(|s| s.to_string()).collect();
        headers.insert(3, "Targeting".to_string());
        let row: Vec<String> = headers.iter().map(|h| format!("<{h}>")).collect();
        let table = RawTable {
            headers,
            rows: vec![row],
            lines: vec![2],
            encoding: "utf-8".into(),
            delimiter: ',',
        };

        let map = ColumnMap::resolve(&table).unwrap();
        let projected = map.project(&table.rows[0]);
        assert_eq!(projected.get(CAMPAIGNS), "<Campaigns>");
        assert_eq!(projected.get(ACOS), "<ACOS>");
        assert_eq!(projected.get("Targeting"), "");
    }
}
