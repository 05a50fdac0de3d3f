//! Submission statistics.
//!
//! [`aggregate`] recomputes every figure from scratch for one model, one
//! inclusive date range and an optional filter set. The pipeline order is
//! significant:
//!
//! 1. model filter,
//! 2. date filter,
//! 3. available filter options (date range only),
//! 4. process and worker filters (whole submissions),
//! 5. part and defect-type filters (individual defect entries).
//!
//! Production is counted per submission once it passes step 4, while defects
//! are counted per surviving entry.

mod range;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use range::{DateRange, shift_date};

use super::{DefectEntry, WorkerSubmission};

/// Optional filters; `None` and empty strings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatFilters {
    /// Exact process name.
    #[serde(default)]
    pub process: Option<String>,
    /// Exact worker name.
    #[serde(default)]
    pub worker: Option<String>,
    /// Exact part name, applied per defect entry.
    #[serde(default)]
    pub part: Option<String>,
    /// Exact defect type, applied per defect entry.
    #[serde(default)]
    pub defect_type: Option<String>,
}

fn matches(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|wanted| wanted.is_empty() || wanted == value)
}

impl StatFilters {
    fn keeps_submission(&self, submission: &WorkerSubmission) -> bool {
        matches(self.process.as_deref(), &submission.process)
            && matches(self.worker.as_deref(), &submission.worker_name)
    }

    fn keeps_defect(&self, defect: &DefectEntry) -> bool {
        matches(self.part.as_deref(), &defect.part)
            && matches(self.defect_type.as_deref(), &defect.defect_type)
    }
}

/// `defects / production * 100`, or zero when nothing was produced.
pub(crate) fn rate(defects: u64, production: u64) -> f64 {
    if production == 0 {
        return 0.0;
    }
    defects as f64 / production as f64 * 100.0
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Figures for one process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    /// Units produced.
    pub production: u64,
    /// Defective units.
    pub defects: u64,
    /// Defect rate in percent.
    pub defect_rate: f64,
    /// Defect counts keyed by `"{part}-{defectType}"`.
    pub defect_details: BTreeMap<String, u64>,
}

/// Figures for one part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartStats {
    /// Defective units.
    pub total: u64,
    /// Counts per defect type.
    pub types: BTreeMap<String, u64>,
}

/// Figures for one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    /// Units produced.
    pub production: u64,
    /// Defective units.
    pub defects: u64,
    /// Defect rate in percent.
    pub defect_rate: f64,
}

/// Totals for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrendPoint {
    /// Work date.
    #[schema(value_type = String, format = Date, example = "2025-01-05")]
    pub date: NaiveDate,
    /// Units produced that day.
    pub production: u64,
    /// Defective units that day.
    pub defects: u64,
    /// Defect rate rounded to one decimal place.
    pub defect_rate: f64,
}

/// A `(name, count)` ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankedCount {
    /// Group name.
    pub name: String,
    /// Count for the group.
    pub count: u64,
}

/// One aggregate snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    /// Submissions that passed the model, date, process and worker filters,
    /// in input order.
    pub submissions: Vec<WorkerSubmission>,
    /// Number of filtered submissions.
    pub submission_count: usize,
    /// Sum of production across filtered submissions.
    pub total_production: u64,
    /// Sum of surviving defect counts.
    pub total_defects: u64,
    /// Overall defect rate in percent.
    pub defect_rate: f64,
    /// Per-process figures.
    pub by_process: BTreeMap<String, ProcessStats>,
    /// Per-part figures.
    pub by_part: BTreeMap<String, PartStats>,
    /// Defect count per defect type.
    pub by_defect_type: BTreeMap<String, u64>,
    /// Per-worker figures.
    pub by_worker: BTreeMap<String, WorkerStats>,
    /// One point per date, ascending.
    pub daily_trend: Vec<DailyTrendPoint>,
    /// Process names seen in the date range, sorted.
    pub available_processes: Vec<String>,
    /// Worker names seen in the date range, sorted.
    pub available_workers: Vec<String>,
    /// Part names seen in the date range, sorted.
    pub available_parts: Vec<String>,
    /// Defect types seen in the date range, sorted.
    pub available_defect_types: Vec<String>,
}

#[derive(Default)]
struct Day {
    production: u64,
    defects: u64,
}

/// Compute statistics for `model` over `range` with `filters`.
///
/// A range whose start lies after its end selects nothing.
///
/// # Examples
/// ```
/// use quality_backend::domain::{DateRange, StatFilters, aggregate};
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 5).expect("date");
/// let stats = aggregate(&[], "ICH-3000", &DateRange::single_day(day), &StatFilters::default());
/// assert_eq!(stats.defect_rate, 0.0);
/// ```
#[must_use]
pub fn aggregate(
    submissions: &[WorkerSubmission],
    model: &str,
    range: &DateRange,
    filters: &StatFilters,
) -> SubmissionStats {
    let in_range: Vec<&WorkerSubmission> = submissions
        .iter()
        .filter(|s| s.model == model && range.contains(s.date))
        .collect();

    let mut stats = SubmissionStats::default();
    collect_available(&mut stats, &in_range);

    let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for submission in in_range.into_iter().filter(|s| filters.keeps_submission(s)) {
        let production = u64::from(submission.production_qty);
        stats.total_production += production;

        let process = stats
            .by_process
            .entry(submission.process.clone())
            .or_default();
        process.production += production;
        let worker = stats
            .by_worker
            .entry(submission.worker_name.clone())
            .or_default();
        worker.production += production;
        let day = days.entry(submission.date).or_default();
        day.production += production;

        for defect in submission.defects.iter().filter(|d| filters.keeps_defect(d)) {
            let count = u64::from(defect.count);
            stats.total_defects += count;
            process.defects += count;
            *process
                .defect_details
                .entry(format!("{}-{}", defect.part, defect.defect_type))
                .or_default() += count;
            worker.defects += count;
            day.defects += count;

            let part = stats.by_part.entry(defect.part.clone()).or_default();
            part.total += count;
            *part.types.entry(defect.defect_type.clone()).or_default() += count;
            *stats
                .by_defect_type
                .entry(defect.defect_type.clone())
                .or_default() += count;
        }

        stats.submissions.push(submission.clone());
    }

    stats.submission_count = stats.submissions.len();
    stats.defect_rate = rate(stats.total_defects, stats.total_production);
    for process in stats.by_process.values_mut() {
        process.defect_rate = rate(process.defects, process.production);
    }
    for worker in stats.by_worker.values_mut() {
        worker.defect_rate = rate(worker.defects, worker.production);
    }
    stats.daily_trend = days
        .into_iter()
        .map(|(date, day)| DailyTrendPoint {
            date,
            production: day.production,
            defects: day.defects,
            defect_rate: round_one_decimal(rate(day.defects, day.production)),
        })
        .collect();
    stats
}

fn collect_available(stats: &mut SubmissionStats, in_range: &[&WorkerSubmission]) {
    let mut processes = BTreeSet::new();
    let mut workers = BTreeSet::new();
    let mut parts = BTreeSet::new();
    let mut types = BTreeSet::new();
    for submission in in_range {
        processes.insert(submission.process.clone());
        workers.insert(submission.worker_name.clone());
        for defect in &submission.defects {
            parts.insert(defect.part.clone());
            types.insert(defect.defect_type.clone());
        }
    }
    stats.available_processes = processes.into_iter().collect();
    stats.available_workers = workers.into_iter().collect();
    stats.available_parts = parts.into_iter().collect();
    stats.available_defect_types = types.into_iter().collect();
}

fn ranked(counts: impl Iterator<Item = (String, u64)>) -> Vec<RankedCount> {
    let mut rows: Vec<RankedCount> = counts
        .map(|(name, count)| RankedCount { name, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows
}

impl SubmissionStats {
    /// Defect types by count, highest first, ties by name.
    #[must_use]
    pub fn ranked_defect_types(&self) -> Vec<RankedCount> {
        ranked(
            self.by_defect_type
                .iter()
                .map(|(name, count)| (name.clone(), *count)),
        )
    }

    /// Parts by total defects, highest first, ties by name.
    #[must_use]
    pub fn ranked_parts(&self) -> Vec<RankedCount> {
        ranked(
            self.by_part
                .iter()
                .map(|(name, part)| (name.clone(), part.total)),
        )
    }

    /// `"{part}-{defectType}"` keys summed across processes, highest first.
    #[must_use]
    pub fn ranked_defect_details(&self) -> Vec<RankedCount> {
        let mut merged: BTreeMap<&str, u64> = BTreeMap::new();
        for process in self.by_process.values() {
            for (key, count) in &process.defect_details {
                *merged.entry(key.as_str()).or_default() += count;
            }
        }
        ranked(
            merged
                .into_iter()
                .map(|(name, count)| (name.to_owned(), count)),
        )
    }

    /// Workers by defect rate, highest first, ties by name.
    #[must_use]
    pub fn ranked_workers(&self) -> Vec<(String, WorkerStats)> {
        let mut rows: Vec<(String, WorkerStats)> = self
            .by_worker
            .iter()
            .map(|(name, stats)| (name.clone(), stats.clone()))
            .collect();
        rows.sort_by(|(a_name, a), (b_name, b)| {
            b.defect_rate
                .total_cmp(&a.defect_rate)
                .then_with(|| a_name.cmp(b_name))
        });
        rows
    }
}

#[cfg(test)]
mod tests;
