//! Cross-day time series for the campaign comparison chart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::CampaignMatch;
use crate::error::{SessionError, SessionResult};
use crate::models::{Category, Metric};

/// What to do when one day has several records matching the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPolicy {
    /// Fail with [`SessionError::AmbiguousMatch`].
    #[default]
    #[serde(alias = "reject")]
    RejectAmbiguous,
    /// Chart the first match in the day's ranking order.
    #[serde(alias = "first")]
    FirstMatch,
}

/// One day of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub label: String,
    pub campaign: String,
    pub category: Category,
    pub impressions: u64,
    pub viewable_impressions: u64,
    /// Requested optional metrics; ACOS is `null` when blank in the export.
    pub metrics: BTreeMap<Metric, Option<f64>>,
}

/// Comparison chart data keyed by date, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub query: String,
    pub metrics: Vec<Metric>,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Values of one optional metric across the points.
    pub fn metric_values(&self, metric: Metric) -> Vec<Option<f64>> {
        self.points
            .iter()
            .map(|p| p.metrics.get(&metric).copied().flatten())
            .collect()
    }
}

/// Collapse matches (already in ascending date order) into one point per day.
pub(super) fn build(
    query: &str,
    matches: &[CampaignMatch],
    extra: &BTreeSet<Metric>,
    policy: MatchPolicy,
) -> SessionResult<TimeSeries> {
    let mut points = Vec::new();

    let mut start = 0;
    while start < matches.len() {
        let day = matches[start].date;
        let end = matches[start..]
            .iter()
            .position(|m| m.date != day)
            .map_or(matches.len(), |offset| start + offset);
        let same_day = &matches[start..end];
        start = end;

        if same_day.len() > 1 && policy == MatchPolicy::RejectAmbiguous {
            return Err(SessionError::AmbiguousMatch {
                query: query.to_string(),
                date: same_day[0].date,
                campaigns: same_day.iter().map(|m| m.record.campaign.clone()).collect(),
            });
        }

        let chosen = &same_day[0];
        let record = &chosen.record;
        points.push(SeriesPoint {
            date: chosen.date,
            label: chosen.label.clone(),
            campaign: record.campaign.clone(),
            category: record.category,
            impressions: record.impressions,
            viewable_impressions: record.viewable_impressions,
            metrics: extra.iter().map(|m| (*m, m.value(record))).collect(),
        });
    }

    Ok(TimeSeries {
        query: query.to_string(),
        metrics: extra.iter().copied().collect(),
        points,
    })
}
