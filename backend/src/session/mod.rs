//! Multi-day aggregator.
//!
//! An [`AggregatorSession`] holds the three ranked day tables of one review,
//! in ascending date order. It is built in one step by
//! [`AggregatorSession::ingest`] and never partially updated: annotation
//! edits return a new session value.
//!
//! [`Session`] is the two-state holder (`Empty` / `Loaded`) the adapters keep
//! around. A failed ingest leaves it untouched.
//!
//! ```text
//! day 0 ─┐
//! day 1 ─┼─▶ ingest ─▶ filter_by_category ─▶ per-day tables
//! day 2 ─┘            find_campaign      ─▶ (date, record) matches
//!                     compare_series     ─▶ time series for charting
//!                     export             ─▶ (sheet label, table)
//! ```

mod series;

pub use series::{MatchPolicy, SeriesPoint, TimeSeries};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::models::{CampaignRecord, Category, CategorySelection, DayTable, Metric};

/// Number of daily exports a review compares.
pub const DAYS_PER_SESSION: usize = 3;

/// The target date and the two days before it, most recent first.
pub fn consecutive_days(target: NaiveDate) -> [NaiveDate; DAYS_PER_SESSION] {
    [target, target - Duration::days(1), target - Duration::days(2)]
}

/// Short day-month label naming a day's sheet, e.g. `05_06`.
pub fn sheet_label(date: NaiveDate) -> String {
    date.format("%d_%m").to_string()
}

/// One loaded day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub date: NaiveDate,
    pub label: String,
    pub table: DayTable,
}

/// A record found by [`AggregatorSession::find_campaign`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMatch {
    pub date: NaiveDate,
    pub label: String,
    /// Position of the record within its day table
    pub index: usize,
    pub record: CampaignRecord,
}

/// Result of [`AggregatorSession::compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub matches: Vec<CampaignMatch>,
    pub series: Option<TimeSeries>,
    /// Why no series was drawn (several matches on one day)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_error: Option<String>,
}

/// Row and category counts of one loaded day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub label: String,
    pub rows: usize,
    pub categories: BTreeMap<Category, usize>,
}

/// Three ranked day tables keyed by distinct dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorSession {
    id: Uuid,
    days: Vec<DayEntry>,
}

impl AggregatorSession {
    /// Build a session from exactly three `(date, table)` pairs.
    pub fn ingest(days: Vec<(NaiveDate, DayTable)>) -> SessionResult<Self> {
        if days.len() != DAYS_PER_SESSION {
            return Err(SessionError::Arity {
                expected: DAYS_PER_SESSION,
                got: days.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for (date, _) in &days {
            if !seen.insert(*date) {
                return Err(SessionError::DuplicateDate(*date));
            }
        }

        let mut entries: Vec<DayEntry> = days
            .into_iter()
            .map(|(date, table)| DayEntry {
                date,
                label: sheet_label(date),
                table,
            })
            .collect();
        entries.sort_by_key(|e| e.date);

        Ok(Self {
            id: Uuid::new_v4(),
            days: entries,
        })
    }

    /// Identifier of this load; changes on every ingest.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Loaded days, oldest first.
    pub fn days(&self) -> &[DayEntry] {
        &self.days
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn day(&self, date: NaiveDate) -> SessionResult<&DayEntry> {
        self.days
            .iter()
            .find(|d| d.date == date)
            .ok_or(SessionError::UnknownDate(date))
    }

    /// Per day, the records whose category is selected, ranking order kept.
    pub fn filter_by_category(&self, selection: &CategorySelection) -> Vec<DayEntry> {
        self.days
            .iter()
            .map(|day| DayEntry {
                date: day.date,
                label: day.label.clone(),
                table: day.table.retain_view(|r| selection.contains(r.category)),
            })
            .collect()
    }

    /// Records whose campaign name contains `query`, oldest day first.
    ///
    /// The query is matched exactly as given; surrounding whitespace is part
    /// of the search text.
    pub fn find_campaign(&self, query: &str, case_insensitive: bool) -> SessionResult<Vec<CampaignMatch>> {
        if query.trim().is_empty() {
            return Err(SessionError::InvalidQuery(
                "campaign search text must not be empty".to_string(),
            ));
        }
        let needle = if case_insensitive {
            query.to_lowercase()
        } else {
            query.to_string()
        };

        let mut matches = Vec::new();
        for day in &self.days {
            for (index, record) in day.table.iter().enumerate() {
                if record.campaign.is_empty() {
                    continue;
                }
                let hit = if case_insensitive {
                    record.campaign.to_lowercase().contains(&needle)
                } else {
                    record.campaign.contains(&needle)
                };
                if hit {
                    matches.push(CampaignMatch {
                        date: day.date,
                        label: day.label.clone(),
                        index,
                        record: record.clone(),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// One chart point per day with a matching campaign.
    ///
    /// Impressions and viewable impressions are always present; `extra`
    /// adds any of Orders, SpendUSD and ACOS.
    pub fn compare_series(
        &self,
        query: &str,
        extra: &BTreeSet<Metric>,
        policy: MatchPolicy,
        case_insensitive: bool,
    ) -> SessionResult<TimeSeries> {
        let matches = self.find_campaign(query, case_insensitive)?;
        series::build(query, &matches, extra, policy)
    }

    /// Matching rows of every day plus, when it can be drawn, the chart series.
    ///
    /// Only an invalid query fails. Same-day ambiguity under
    /// [`MatchPolicy::RejectAmbiguous`] leaves `series` empty and is reported
    /// in `series_error`; the matches are returned either way.
    pub fn compare(
        &self,
        query: &str,
        extra: &BTreeSet<Metric>,
        policy: MatchPolicy,
        case_insensitive: bool,
    ) -> SessionResult<Comparison> {
        let matches = self.find_campaign(query, case_insensitive)?;
        let (series, series_error) = match series::build(query, &matches, extra, policy) {
            Ok(series) => (Some(series), None),
            Err(err @ SessionError::AmbiguousMatch { .. }) => (None, Some(err.to_string())),
            Err(err) => return Err(err),
        };

        Ok(Comparison {
            matches,
            series,
            series_error,
        })
    }

    /// `(sheet label, table)` pairs for the workbook writer, oldest first.
    pub fn export(&self) -> Vec<(String, &DayTable)> {
        self.days.iter().map(|d| (d.label.clone(), &d.table)).collect()
    }

    /// Copy of this session with one record's Note / Action replaced.
    ///
    /// `None` leaves the field as it is.
    pub fn annotate(
        &self,
        date: NaiveDate,
        index: usize,
        note: Option<String>,
        action: Option<String>,
    ) -> SessionResult<Self> {
        let mut next = self.clone();
        let day = next
            .days
            .iter_mut()
            .find(|d| d.date == date)
            .ok_or(SessionError::UnknownDate(date))?;
        let len = day.table.len();
        let record = day
            .table
            .record_mut(index)
            .ok_or(SessionError::RecordOutOfRange { date, index, len })?;

        if let Some(note) = note {
            record.note = note;
        }
        if let Some(action) = action {
            record.action = action;
        }
        Ok(next)
    }

    pub fn summary(&self) -> Vec<DaySummary> {
        self.days
            .iter()
            .map(|day| {
                let mut categories: BTreeMap<Category, usize> =
                    Category::ALL.iter().map(|c| (*c, 0)).collect();
                for record in &day.table {
                    *categories.entry(record.category).or_insert(0) += 1;
                }
                DaySummary {
                    date: day.date,
                    label: day.label.clone(),
                    rows: day.table.len(),
                    categories,
                }
            })
            .collect()
    }
}

/// Session holder: nothing loaded yet, or a complete three-day load.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Empty,
    Loaded(AggregatorSession),
}

impl Session {
    /// Replace the current load with `days`. On error nothing changes.
    pub fn ingest(&mut self, days: Vec<(NaiveDate, DayTable)>) -> SessionResult<&AggregatorSession> {
        let loaded = AggregatorSession::ingest(days)?;
        *self = Session::Loaded(loaded);
        self.loaded()
    }

    /// Swap in an already-built session (used after annotation edits).
    pub fn replace(&mut self, next: AggregatorSession) {
        *self = Session::Loaded(next);
    }

    pub fn reset(&mut self) {
        *self = Session::Empty;
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Session::Loaded(_))
    }

    pub fn loaded(&self) -> SessionResult<&AggregatorSession> {
        match self {
            Session::Loaded(session) => Ok(session),
            Session::Empty => Err(SessionError::NotLoaded),
        }
    }
}
