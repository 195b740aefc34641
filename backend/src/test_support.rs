//! Shared fixtures for unit tests.

use chrono::NaiveDate;

use crate::models::DayTable;
use crate::parser::parse_csv;
use crate::transform::transform;

/// Header row of a daily export, with two columns the transformer drops.
pub const HEADER: &str = "Campaigns,Status,Start date,Portfolio,Budget(USD),Impressions,Clicks,Spend(USD),CPC(USD),Orders,ACOS,Viewable impressions,Targeting,Sales(USD)\n";

/// One export row. Clicks and viewable impressions are derived from `impressions`.
pub fn row(campaign: &str, start_date: &str, impressions: u64, acos: &str) -> String {
    format!(
        "{campaign},Enabled,{start_date},Main,25.00,{impressions},{},1.50,0.75,2,{acos},{},auto,12.00",
        impressions / 10,
        impressions / 2,
    )
}

pub fn export_csv(rows: &[String]) -> String {
    let mut csv = HEADER.to_string();
    for r in rows {
        csv.push_str(r);
        csv.push('\n');
    }
    csv
}

pub fn day_table(rows: &[String]) -> DayTable {
    transform(&parse_csv(&export_csv(rows), ',').unwrap()).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three days (June 3-5, 2024) of five rows each. One row per day belongs to
/// `BrandX`, with 0, 150 and 12000 impressions from oldest to newest.
pub fn three_days() -> Vec<(NaiveDate, DayTable)> {
    let brand = [(date(2024, 6, 3), 0u64), (date(2024, 6, 4), 150), (date(2024, 6, 5), 12000)];
    brand
        .iter()
        .map(|(day, impressions)| {
            let rows = vec![
                row("Summer-SHOES-promo", "05/01/24", 420, "0.31"),
                row("BrandX", "04/15/24", *impressions, "0.22"),
                row("Generic Socks", "03/01/24", 0, ""),
                row("Hats - exact", "05/20/24", 75, "0.18"),
                row("Gloves broad", "02/11/24", 15000, "0.45"),
            ];
            (*day, day_table(&rows))
        })
        .collect()
}
