//! Derived views over the session log.
//!
//! Everything here is a pure function of the records plus a [`LogFilter`].
//! The counts, timeline and table respect the filter. The most-used-type
//! metric in [`AnalyticsReport`] is a session metric and is computed over the
//! whole log, the same as the session total it sits next to.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use chrono::Timelike;
use regex::Regex;
use regex::RegexBuilder;
use thiserror::Error;

use crate::state::AnalysisRecord;
use crate::state::AnalysisType;
use crate::state::TIMESTAMP_FORMAT;

const ACCEPTED_TIMESTAMP_FORMATS: [&str; 3] =
    [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub types: Vec<AnalysisType>,
    pub search: String,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            types: AnalysisType::ALL.to_vec(),
            search: String::new(),
        }
    }
}

impl LogFilter {
    pub fn with_types(types: impl IntoIterator<Item = AnalysisType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}

/// Case-insensitive literal matcher. A blank term matches everything.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    matcher: Option<Matcher>,
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Lowercase(String),
}

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        if term.is_empty() {
            return Self { matcher: None };
        }
        let matcher = match RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Matcher::Regex(re),
            Err(_) => Matcher::Lowercase(term.to_lowercase()),
        };
        Self {
            matcher: Some(matcher),
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        match &self.matcher {
            None => true,
            Some(Matcher::Regex(re)) => re.is_match(haystack),
            Some(Matcher::Lowercase(needle)) => haystack.to_lowercase().contains(needle),
        }
    }

    pub fn matches_record(&self, record: &AnalysisRecord) -> bool {
        self.matches(&record.input_text) || self.matches(&record.output_text)
    }
}

pub fn filter_by_types<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
    types: &[AnalysisType],
) -> Vec<&'a AnalysisRecord> {
    records
        .into_iter()
        .filter(|record| types.contains(&record.analysis_type))
        .collect()
}

pub fn filter_by_search<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
    term: &str,
) -> Vec<&'a AnalysisRecord> {
    let term = SearchTerm::new(term);
    records
        .into_iter()
        .filter(|record| term.matches_record(record))
        .collect()
}

pub fn filter_records<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
    filter: &LogFilter,
) -> Vec<&'a AnalysisRecord> {
    filter_by_search(filter_by_types(records, &filter.types), &filter.search)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCount {
    pub analysis_type: AnalysisType,
    pub count: usize,
}

/// Counts per type, highest first. Equal counts keep enumeration order.
/// Types with no records are omitted.
pub fn count_by_type<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
) -> Vec<TypeCount> {
    let mut counts = [0_usize; 4];
    for record in records {
        counts[record.analysis_type.ordinal()] += 1;
    }
    let mut out: Vec<TypeCount> = AnalysisType::ALL
        .into_iter()
        .filter(|kind| counts[kind.ordinal()] > 0)
        .map(|kind| TypeCount {
            analysis_type: kind,
            count: counts[kind.ordinal()],
        })
        .collect();
    // stable sort keeps enumeration order for ties
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

pub fn most_common_type<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
) -> Option<TypeCount> {
    count_by_type(records).into_iter().next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineBucket {
    pub minute: NaiveDateTime,
    pub count: usize,
}

impl TimelineBucket {
    pub fn label(&self) -> String {
        self.minute.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timestamp {0:?} could not be parsed")]
pub struct TimelineError(pub String);

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn floor_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Records per minute in chronological order. A single unparseable timestamp
/// voids the whole timeline.
pub fn timeline<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
) -> Result<Vec<TimelineBucket>, TimelineError> {
    let mut buckets: BTreeMap<NaiveDateTime, usize> = BTreeMap::new();
    for record in records {
        let at = parse_timestamp(&record.timestamp)
            .ok_or_else(|| TimelineError(record.timestamp.clone()))?;
        *buckets.entry(floor_to_minute(at)).or_default() += 1;
    }
    Ok(buckets
        .into_iter()
        .map(|(minute, count)| TimelineBucket { minute, count })
        .collect())
}

/// Latest `limit` records, newest first.
pub fn recent(records: &[AnalysisRecord], limit: usize) -> Vec<&AnalysisRecord> {
    records.iter().rev().take(limit).collect()
}

#[derive(Debug, Clone)]
pub struct AnalyticsReport<'a> {
    pub total: usize,
    pub most_common: Option<TypeCount>,
    pub filtered: Vec<&'a AnalysisRecord>,
    pub by_type: Vec<TypeCount>,
    pub timeline: Option<Vec<TimelineBucket>>,
}

impl AnalyticsReport<'_> {
    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }
}

pub fn summarize<'a>(records: &'a [AnalysisRecord], filter: &LogFilter) -> AnalyticsReport<'a> {
    let filtered = filter_records(records, filter);
    let by_type = count_by_type(filtered.iter().copied());
    let timeline = match timeline(filtered.iter().copied()) {
        Ok(buckets) => Some(buckets),
        Err(err) => {
            tracing::debug!(error = %err, "timeline unavailable");
            None
        }
    };
    AnalyticsReport {
        total: records.len(),
        most_common: most_common_type(records),
        filtered,
        by_type,
        timeline,
    }
}
