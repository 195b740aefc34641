//! Row transformer: one raw daily export in, one ranked [`DayTable`] out.
//!
//! Steps, in order:
//! 1. Check that every required column is present
//! 2. Project each row onto the required columns (everything else is dropped)
//! 3. Parse typed values, including the `MM/DD/YY` start date
//! 4. Rank rows by ACOS ascending, then Impressions descending (stable)
//! 5. Derive the impression category and add empty Note / Action fields
//!
//! # Example
//!
//! ```rust,ignore
//! use campaign_review::transform_file;
//!
//! let day = transform_file("exports/2024-06-05.csv")?;
//! println!("{} campaigns, best ACOS first", day.len());
//! ```

use std::path::Path;

use super::columns::{self, ColumnMap, ProjectedRow};
use super::fields::{parse_acos, parse_count, parse_decimal, parse_start_date};
use crate::api::logs::{log_info, log_success};
use crate::error::{TransformError, TransformResult};
use crate::models::{CampaignRecord, Category, DayTable};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, RawTable};

/// Transform an already-read export.
pub fn transform(raw: &RawTable) -> TransformResult<DayTable> {
    let columns = ColumnMap::resolve(raw)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (idx, row) in raw.rows.iter().enumerate() {
        let line = raw.lines.get(idx).copied().unwrap_or(idx as u64 + 2);
        records.push(build_record(line, columns.project(row))?);
    }

    Ok(DayTable::from_records(records))
}

/// Read and transform CSV bytes (encoding and delimiter auto-detected).
pub fn transform_bytes(bytes: &[u8]) -> TransformResult<DayTable> {
    let raw = parse_bytes_auto(bytes)?;
    transform_logged(&raw)
}

/// Read and transform a CSV file.
pub fn transform_file<P: AsRef<Path>>(path: P) -> TransformResult<DayTable> {
    log_info(format!("📖 Reading {}", path.as_ref().display()));
    let raw = parse_csv_file_auto(path)?;
    transform_logged(&raw)
}

fn transform_logged(raw: &RawTable) -> TransformResult<DayTable> {
    log_success(format!(
        "Read {} rows ({} columns, encoding {}, separator '{}')",
        raw.row_count(),
        raw.headers.len(),
        raw.encoding,
        format_delimiter(raw.delimiter)
    ));

    let extra = raw.headers.len().saturating_sub(columns::REQUIRED_COLUMNS.len());
    if extra > 0 {
        log_info(format!("Dropping {} column(s) not used for review", extra));
    }

    let table = transform(raw)?;
    log_success(format!("Ranked {} campaigns by ACOS", table.len()));
    Ok(table)
}

fn build_record(line: u64, cells: ProjectedRow<'_>) -> TransformResult<CampaignRecord> {
    let impressions = typed(line, &cells, columns::IMPRESSIONS, parse_count)?;

    Ok(CampaignRecord {
        campaign: cells.get(columns::CAMPAIGNS).trim().to_string(),
        status: cells.get(columns::STATUS).trim().to_string(),
        start_date: typed(line, &cells, columns::START_DATE, parse_start_date)?,
        portfolio: cells.get(columns::PORTFOLIO).trim().to_string(),
        budget_usd: typed(line, &cells, columns::BUDGET_USD, parse_decimal)?,
        impressions,
        clicks: typed(line, &cells, columns::CLICKS, parse_count)?,
        spend_usd: typed(line, &cells, columns::SPEND_USD, parse_decimal)?,
        cpc_usd: typed(line, &cells, columns::CPC_USD, parse_decimal)?,
        orders: typed(line, &cells, columns::ORDERS, parse_count)?,
        acos: typed(line, &cells, columns::ACOS, parse_acos)?,
        viewable_impressions: typed(line, &cells, columns::VIEWABLE_IMPRESSIONS, parse_count)?,
        category: Category::from_impressions(impressions),
        note: String::new(),
        action: String::new(),
    })
}

/// Parse one cell, attaching line / column / value context on failure.
fn typed<T>(
    line: u64,
    cells: &ProjectedRow<'_>,
    column: &str,
    parse: fn(&str) -> Result<T, String>,
) -> TransformResult<T> {
    let value = cells.get(column);
    parse(value).map_err(|message| TransformError::parse(line, column, value, message))
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::day_table_to_csv;
    use crate::parser::parse_csv;
    use crate::test_support::{export_csv, row, HEADER};

    fn day(rows: &[String]) -> DayTable {
        transform(&parse_csv(&export_csv(rows), ',').unwrap()).unwrap()
    }

    #[test]
    fn test_row_count_preserved() {
        let rows = vec![
            row("A", "01/02/24", 0, "0.5"),
            row("B", "01/02/24", 150, "0.2"),
            row("C", "01/02/24", 12000, ""),
        ];
        assert_eq!(day(&rows).len(), rows.len());

        let empty = transform(&parse_csv(HEADER, ',').unwrap()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_output_is_ranked() {
        let rows = vec![
            row("high-acos", "01/02/24", 5000, "0.9"),
            row("low-acos-small", "01/02/24", 10, "0.1"),
            row("low-acos-big", "01/02/24", 900, "0.1"),
            row("no-sales", "01/02/24", 20000, ""),
            row("mid", "01/02/24", 1, "0.4"),
        ];
        let table = day(&rows);

        let order: Vec<&str> = table.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(
            order,
            vec!["low-acos-big", "low-acos-small", "mid", "high-acos", "no-sales"]
        );

        for pair in table.records().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match (a.acos, b.acos) {
                (Some(x), Some(y)) => assert!(x < y || (x == y && a.impressions >= b.impressions)),
                (Some(_), None) | (None, None) => {}
                (None, Some(_)) => panic!("blank ACOS sorted before a value"),
            }
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rows = vec![
            row("first", "01/02/24", 50, "0.3"),
            row("second", "01/02/24", 50, "0.3"),
            row("third", "01/02/24", 50, "0.3"),
        ];
        let order: Vec<String> = day(&rows).iter().map(|r| r.campaign.clone()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_categories_and_annotations() {
        let impressions = [0u64, 1, 99, 100, 999, 1000, 9999, 10000];
        let rows: Vec<String> = impressions
            .iter()
            .map(|n| row(&format!("c{n}"), "03/04/24", *n, "0.5"))
            .collect();
        let table = day(&rows);

        for record in table.iter() {
            assert_eq!(record.category, Category::from_impressions(record.impressions));
            assert!(record.note.is_empty());
            assert!(record.action.is_empty());
        }
        let find = |name: &str| table.iter().find(|r| r.campaign == name).unwrap().category;
        assert_eq!(find("c0"), Category::NoImpressions);
        assert_eq!(find("c99"), Category::Tier1_99);
        assert_eq!(find("c100"), Category::Tier100_999);
        assert_eq!(find("c9999"), Category::Tier1000_9999);
        assert_eq!(find("c10000"), Category::Tier10000Plus);
    }

    #[test]
    fn test_parses_typed_fields() {
        let table = day(&[row("BrandX", "06/05/24", 1234, "0.25")]);
        let record = &table.records()[0];
        assert_eq!(record.start_date, chrono::NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());
        assert_eq!(record.impressions, 1234);
        assert_eq!(record.acos, Some(0.25));
        assert_eq!(record.portfolio, "Main");
    }

    #[test]
    fn test_missing_impressions_column() {
        let csv = "Campaigns,Status,Start date,Portfolio,Budget(USD),Clicks,Spend(USD),CPC(USD),Orders,ACOS,Viewable impressions\n\
                   X,Enabled,01/02/24,Main,10,1,1,1,1,0.5,1\n";
        let err = transform(&parse_csv(csv, ',').unwrap()).unwrap_err();
        match err {
            TransformError::Schema { missing } => assert_eq!(missing, vec!["Impressions"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_error_reports_file_line_past_blank_rows() {
        // header, one good row, an empty line, a row of empty cells, then the bad row
        let csv = format!(
            "{}\n\n,,,\n{}\n",
            export_csv(&[row("Good", "01/02/24", 5, "0.1")]).trim_end(),
            row("Bad", "2024-01-02", 5, "0.1"),
        );
        let err = transform(&parse_csv(&csv, ',').unwrap()).unwrap_err();
        match err {
            TransformError::Parse { line, ref value, .. } => {
                assert_eq!(line, 5);
                assert_eq!(value, "2024-01-02");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Line 5,"));
    }

    #[test]
    fn test_malformed_date_is_parse_error() {
        let err = transform(&parse_csv(&export_csv(&[row("X", "13/40/99", 5, "0.1")]), ',').unwrap())
            .unwrap_err();
        match err {
            TransformError::Parse { line, column, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Start date");
                assert_eq!(value, "13/40/99");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_impressions_rejected() {
        let csv = format!("{HEADER}X,Enabled,01/02/24,Main,10,-5,0,0,0,0,0.1,0\n");
        let err = transform(&parse_csv(&csv, ',').unwrap()).unwrap_err();
        assert!(matches!(err, TransformError::Parse { ref column, .. } if column == "Impressions"));
    }

    #[test]
    fn test_extra_columns_dropped() {
        let csv = "Targeting,Campaigns,Status,Start date,Portfolio,Budget(USD),Impressions,Clicks,Spend(USD),CPC(USD),Orders,ACOS,Viewable impressions,Sales(USD)\n\
                   auto,X,Enabled,01/02/24,Main,10,7,1,1,1,1,0.5,3,99\n";
        let table = transform(&parse_csv(csv, ',').unwrap()).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        let obj = json[0].as_object().unwrap();
        assert!(!obj.contains_key("targeting"));
        assert!(!obj.contains_key("salesUsd"));
        assert_eq!(obj["impressions"], 7);
    }

    #[test]
    fn test_retransform_is_idempotent() {
        let rows = vec![
            row("b", "01/02/24", 300, "0.3"),
            row("a", "01/02/24", 10, "0.1"),
            row("c", "01/02/24", 300, "0.3"),
            row("d", "01/02/24", 0, ""),
            row("e", "01/02/24", 9000, "0.3"),
        ];
        let first = day(&rows);
        let csv = day_table_to_csv(&first).unwrap();
        let second = transform(&parse_csv(&csv, ',').unwrap()).unwrap();

        let names = |t: &DayTable| t.iter().map(|r| r.campaign.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_bytes_autodetects() {
        let csv = export_csv(&[row("BrandX", "06/05/24", 10, "0.2")]);
        let table = transform_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_transform_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("day.csv");
        std::fs::write(&path, export_csv(&[row("BrandX", "06/05/24", 10, "0.2")])).unwrap();
        assert_eq!(transform_file(&path).unwrap().len(), 1);
    }
}
