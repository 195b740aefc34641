//! Domain models for daily campaign exports.
//!
//! A [`DayTable`] holds the normalized rows of one day's export, always kept
//! in ranking order (ACOS ascending, then Impressions descending). Each
//! [`CampaignRecord`] carries a derived impression [`Category`] and two
//! free-text annotation fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Category
// =============================================================================

/// Impression bucket of a campaign row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "No Impressions")]
    NoImpressions,
    #[serde(rename = "1-99")]
    Tier1_99,
    #[serde(rename = "100-999")]
    Tier100_999,
    #[serde(rename = "1000-9999")]
    Tier1000_9999,
    #[serde(rename = "10000+")]
    Tier10000Plus,
}

impl Category {
    /// Every category, smallest bucket first.
    pub const ALL: [Category; 5] = [
        Category::NoImpressions,
        Category::Tier1_99,
        Category::Tier100_999,
        Category::Tier1000_9999,
        Category::Tier10000Plus,
    ];

    /// Bucket an impression count.
    pub fn from_impressions(impressions: u64) -> Self {
        match impressions {
            0 => Category::NoImpressions,
            1..=99 => Category::Tier1_99,
            100..=999 => Category::Tier100_999,
            1000..=9999 => Category::Tier1000_9999,
            _ => Category::Tier10000Plus,
        }
    }

    /// Label shown in exports and accepted on input.
    pub fn label(self) -> &'static str {
        match self {
            Category::NoImpressions => "No Impressions",
            Category::Tier1_99 => "1-99",
            Category::Tier100_999 => "100-999",
            Category::Tier1000_9999 => "1000-9999",
            Category::Tier10000Plus => "10000+",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input that names neither a category label nor a variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category '{0}' (expected one of: No Impressions, 1-99, 100-999, 1000-9999, 10000+)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.label().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", c).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Label that expands to every category in a multi-select.
pub const SELECT_ALL_LABEL: &str = "Select all";

/// Category multi-select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    All,
    Only(std::collections::BTreeSet<Category>),
}

impl CategorySelection {
    /// Build a selection from user-facing labels.
    ///
    /// `"Select all"` anywhere in the input wins over the individual labels.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, UnknownCategory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = std::collections::BTreeSet::new();
        let mut all = false;
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if label.eq_ignore_ascii_case(SELECT_ALL_LABEL) || label.eq_ignore_ascii_case("all") {
                all = true;
                continue;
            }
            selected.insert(label.parse::<Category>()?);
        }
        Ok(if all { CategorySelection::All } else { CategorySelection::Only(selected) })
    }

    pub fn contains(&self, category: Category) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Only(set) => set.contains(&category),
        }
    }
}

// =============================================================================
// Metric
// =============================================================================

/// Optional series that can be overlaid on the impressions chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "Orders")]
    Orders,
    #[serde(rename = "SpendUSD")]
    SpendUsd,
    #[serde(rename = "ACOS")]
    Acos,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Orders, Metric::SpendUsd, Metric::Acos];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Orders => "Orders",
            Metric::SpendUsd => "SpendUSD",
            Metric::Acos => "ACOS",
        }
    }

    /// Read this metric from a record. ACOS may be absent.
    pub fn value(self, record: &CampaignRecord) -> Option<f64> {
        match self {
            Metric::Orders => Some(record.orders as f64),
            Metric::SpendUsd => Some(record.spend_usd),
            Metric::Acos => record.acos,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown metric '{0}' (expected Orders, SpendUSD or ACOS)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orders" => Ok(Metric::Orders),
            "spendusd" | "spend(usd)" | "spend_usd" | "spend" => Ok(Metric::SpendUsd),
            "acos" => Ok(Metric::Acos),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

// =============================================================================
// CampaignRecord
// =============================================================================

/// One normalized row of a daily export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub campaign: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub portfolio: String,
    pub budget_usd: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub spend_usd: f64,
    pub cpc_usd: f64,
    pub orders: u64,
    /// `None` when the export leaves ACOS blank (no sales).
    pub acos: Option<f64>,
    pub viewable_impressions: u64,
    pub category: Category,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub action: String,
}

/// Ranking order: ACOS ascending (blank ACOS last), then Impressions descending.
pub fn ranking_order(a: &CampaignRecord, b: &CampaignRecord) -> Ordering {
    compare_acos(a.acos, b.acos).then_with(|| b.impressions.cmp(&a.impressions))
}

fn compare_acos(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        // `+ 0.0` folds -0.0 into 0.0 so equal ACOS falls through to Impressions
        (Some(x), Some(y)) => (x + 0.0).total_cmp(&(y + 0.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// DayTable
// =============================================================================

/// The ranked records of one day. The date is held by the session, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DayTable {
    records: Vec<CampaignRecord>,
}

impl DayTable {
    /// Rank `records` (stable) and wrap them.
    pub fn from_records(mut records: Vec<CampaignRecord>) -> Self {
        records.sort_by(ranking_order);
        Self { records }
    }

    pub fn records(&self) -> &[CampaignRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CampaignRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subsequence of records matching `keep`, order preserved.
    pub fn retain_view<F>(&self, mut keep: F) -> DayTable
    where
        F: FnMut(&CampaignRecord) -> bool,
    {
        DayTable {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut CampaignRecord> {
        self.records.get_mut(index)
    }
}

impl<'a> IntoIterator for &'a DayTable {
    type Item = &'a CampaignRecord;
    type IntoIter = std::slice::Iter<'a, CampaignRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(campaign: &str, acos: Option<f64>, impressions: u64) -> CampaignRecord {
        CampaignRecord {
            campaign: campaign.to_string(),
            status: "Enabled".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            portfolio: String::new(),
            budget_usd: 10.0,
            impressions,
            clicks: 0,
            spend_usd: 0.0,
            cpc_usd: 0.0,
            orders: 0,
            acos,
            viewable_impressions: 0,
            category: Category::from_impressions(impressions),
            note: String::new(),
            action: String::new(),
        }
    }

    #[test]
    fn test_category_boundaries() {
        let cases = [
            (0, Category::NoImpressions),
            (1, Category::Tier1_99),
            (99, Category::Tier1_99),
            (100, Category::Tier100_999),
            (999, Category::Tier100_999),
            (1000, Category::Tier1000_9999),
            (9999, Category::Tier1000_9999),
            (10000, Category::Tier10000Plus),
            (u64::MAX, Category::Tier10000Plus),
        ];
        for (impressions, expected) in cases {
            assert_eq!(Category::from_impressions(impressions), expected, "{impressions}");
        }
    }

    #[test]
    fn test_category_parses_labels_and_variant_names() {
        assert_eq!("1-99".parse::<Category>().unwrap(), Category::Tier1_99);
        assert_eq!("no impressions".parse::<Category>().unwrap(), Category::NoImpressions);
        assert_eq!("Tier10000Plus".parse::<Category>().unwrap(), Category::Tier10000Plus);
        assert!("5-10".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Tier1000_9999).unwrap();
        assert_eq!(json, "\"1000-9999\"");
    }

    #[test]
    fn test_selection_select_all_wins() {
        let selection = CategorySelection::from_labels(["1-99", "Select all"]).unwrap();
        assert_eq!(selection, CategorySelection::All);
        assert!(Category::ALL.iter().all(|c| selection.contains(*c)));
    }

    #[test]
    fn test_empty_selection_contains_nothing() {
        let selection = CategorySelection::from_labels(Vec::<String>::new()).unwrap();
        assert!(Category::ALL.iter().all(|c| !selection.contains(*c)));
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("ACOS".parse::<Metric>().unwrap(), Metric::Acos);
        assert_eq!("Spend(USD)".parse::<Metric>().unwrap(), Metric::SpendUsd);
        assert_eq!(" orders ".parse::<Metric>().unwrap(), Metric::Orders);
        assert!("clicks".parse::<Metric>().is_err());
    }

    #[test]
    fn test_day_table_ranks_by_acos_then_impressions() {
        let table = DayTable::from_records(vec![
            record("c", Some(0.5), 10),
            record("blank", None, 99999),
            record("a", Some(0.1), 5),
            record("b", Some(0.5), 200),
        ]);
        let order: Vec<&str> = table.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "blank"]);
    }

    #[test]
    fn test_day_table_sort_is_stable_on_ties() {
        let table = DayTable::from_records(vec![
            record("first", Some(0.2), 50),
            record("second", Some(0.2), 50),
            record("third", Some(0.2), 50),
        ]);
        let order: Vec<&str> = table.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_negative_zero_acos_ties_with_zero() {
        let table = DayTable::from_records(vec![
            record("small", Some(-0.0), 10),
            record("big", Some(0.0), 5000),
        ]);
        let order: Vec<&str> = table.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(order, vec!["big", "small"]);
    }
}
