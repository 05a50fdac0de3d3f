//! Worker production and defect submissions.
//!
//! A submission is created once from a validated [`SubmissionDraft`] and is
//! never edited afterwards; the only lifecycle transition is deletion of the
//! whole record.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::CodeTable;

/// Model assigned to records created before models existed.
pub const LEGACY_MODEL_ID: &str = "ICH-3000";

/// Calendar date format used on the wire and in range comparisons.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static LEGACY_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})").ok());

/// One defect observation within a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectEntry {
    /// Part name.
    #[schema(example = "솔밸브-온수")]
    pub part: String,
    /// Defect type name.
    #[schema(example = "누수")]
    pub defect_type: String,
    /// Number of defective units, at least one.
    #[schema(example = 2)]
    pub count: u32,
}

impl DefectEntry {
    /// Build an entry.
    pub fn new(part: impl Into<String>, defect_type: impl Into<String>, count: u32) -> Self {
        Self {
            part: part.into(),
            defect_type: defect_type.into(),
            count,
        }
    }
}

/// A recorded submission.
///
/// Deserialisation accepts the legacy `"2025. 1. 5"` date spelling and
/// assigns [`LEGACY_MODEL_ID`] when the model is missing, `null` or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSubmission {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Worker display name.
    pub worker_name: String,
    /// Worker code resolved from the workers table, empty when unknown.
    #[serde(default)]
    pub worker_code: String,
    /// Work date.
    #[serde(deserialize_with = "deserialize_work_date")]
    #[schema(value_type = String, format = Date, example = "2025-01-05")]
    pub date: NaiveDate,
    /// Time of day as `HH:MM`.
    #[serde(default)]
    #[schema(example = "14:30")]
    pub time: String,
    /// Process name.
    pub process: String,
    /// Units produced.
    pub production_qty: u32,
    /// Free-text task labels.
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Defect observations in entry order.
    #[serde(default)]
    pub defects: Vec<DefectEntry>,
    /// Free-text memo.
    #[serde(default)]
    pub memo: String,
    /// Owning model id.
    #[serde(default = "legacy_model", deserialize_with = "deserialize_model")]
    pub model: String,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl WorkerSubmission {
    /// Materialise a validated draft.
    #[must_use]
    pub fn record(valid: ValidSubmission, id: Uuid, created_at: DateTime<Utc>) -> Self {
        let ValidSubmission {
            worker_name,
            worker_code,
            date,
            time,
            process,
            production_qty,
            tasks,
            defects,
            memo,
            model,
        } = valid;
        Self {
            id,
            worker_name,
            worker_code,
            date,
            time,
            process,
            production_qty,
            tasks,
            defects,
            memo,
            model,
            created_at,
        }
    }

    /// Sum of defect counts.
    #[must_use]
    pub fn defect_total(&self) -> u64 {
        self.defects.iter().map(|d| u64::from(d.count)).sum()
    }

    /// Work date as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

fn legacy_model() -> String {
    LEGACY_MODEL_ID.to_owned()
}

fn deserialize_model<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|model| model.trim().to_owned())
        .filter(|model| !model.is_empty())
        .unwrap_or_else(legacy_model))
}

fn deserialize_work_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_work_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

/// Rewrite the legacy `"2025. 1. 5"` spelling as `"2025-01-05"`.
///
/// Other values are returned unchanged.
///
/// # Examples
/// ```
/// use quality_backend::domain::normalize_date;
///
/// assert_eq!(normalize_date("2025. 1. 5"), "2025-01-05");
/// assert_eq!(normalize_date("2025-01-05"), "2025-01-05");
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let Some(pattern) = LEGACY_DATE.as_ref() else {
        return raw.to_owned();
    };
    let Some(caps) = pattern.captures(raw) else {
        return raw.to_owned();
    };
    let part = |idx: usize| {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or_default()
    };
    let year = caps.get(1).map_or("", |m| m.as_str());
    format!("{year}-{:02}-{:02}", part(2), part(3))
}

/// Parse a work date, accepting the legacy spelling.
#[must_use]
pub fn parse_work_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(normalize_date(raw.trim()).as_str(), DATE_FORMAT).ok()
}

/// Defect row as entered, possibly blank or incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftDefect {
    /// Part name.
    #[serde(default)]
    pub part: String,
    /// Defect type name.
    #[serde(default)]
    pub defect_type: String,
    /// Count; blank rows default to one.
    #[serde(default = "default_count")]
    pub count: u32,
}

const fn default_count() -> u32 {
    1
}

impl Default for DraftDefect {
    fn default() -> Self {
        Self {
            part: String::new(),
            defect_type: String::new(),
            count: default_count(),
        }
    }
}

impl DraftDefect {
    fn is_touched(&self) -> bool {
        !self.part.trim().is_empty() || !self.defect_type.trim().is_empty() || self.count > 1
    }

    fn is_complete(&self) -> bool {
        !self.part.trim().is_empty() && !self.defect_type.trim().is_empty() && self.count > 0
    }
}

/// Unvalidated submission input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDraft {
    /// Owning model id.
    pub model: String,
    /// Worker display name.
    pub worker_name: String,
    /// Work date, `YYYY-MM-DD`.
    #[schema(example = "2025-01-05")]
    pub date: String,
    /// Time of day; defaults to the current time.
    #[serde(default)]
    pub time: Option<String>,
    /// Process name.
    pub process: String,
    /// Units produced.
    #[serde(default)]
    pub production_qty: u32,
    /// Task labels.
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Defect rows.
    #[serde(default)]
    pub defects: Vec<DraftDefect>,
    /// Memo.
    #[serde(default)]
    pub memo: String,
}

/// Draft that passed validation, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    worker_name: String,
    worker_code: String,
    date: NaiveDate,
    time: String,
    process: String,
    production_qty: u32,
    tasks: Vec<String>,
    defects: Vec<DefectEntry>,
    memo: String,
    model: String,
}

impl ValidSubmission {
    /// Owning model id.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Retained defect rows.
    #[must_use]
    pub fn defects(&self) -> &[DefectEntry] {
        &self.defects
    }
}

/// Reasons a draft is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionValidationError {
    /// No model id was supplied.
    #[error("model is required")]
    MissingModel,
    /// No worker name was supplied.
    #[error("workerName is required")]
    MissingWorker,
    /// No process was supplied.
    #[error("process is required")]
    MissingProcess,
    /// The date is not a valid `YYYY-MM-DD` calendar date.
    #[error("date '{value}' is not a valid YYYY-MM-DD date")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },
    /// Some defect rows are only partly filled in.
    #[error("{count} defect entries are incomplete")]
    IncompleteDefects {
        /// Number of incomplete rows.
        count: usize,
    },
}

impl SubmissionValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingModel => "model",
            Self::MissingWorker => "workerName",
            Self::MissingProcess => "process",
            Self::InvalidDate { .. } => "date",
            Self::IncompleteDefects { .. } => "defects",
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingModel | Self::MissingWorker | Self::MissingProcess => "required",
            Self::InvalidDate { .. } => "invalid_date",
            Self::IncompleteDefects { .. } => "incomplete_defects",
        }
    }
}

impl SubmissionDraft {
    /// Validate the draft against the model's worker table.
    ///
    /// Blank defect rows are dropped; `now` supplies the time of day when the
    /// draft omits one.
    ///
    /// # Errors
    ///
    /// Returns the first [`SubmissionValidationError`] found, checking model,
    /// worker, process, date and finally defect rows.
    pub fn validate(
        self,
        workers: &CodeTable,
        now: NaiveTime,
    ) -> Result<ValidSubmission, SubmissionValidationError> {
        let model = self.model.trim().to_owned();
        if model.is_empty() {
            return Err(SubmissionValidationError::MissingModel);
        }
        let worker_name = self.worker_name.trim().to_owned();
        if worker_name.is_empty() {
            return Err(SubmissionValidationError::MissingWorker);
        }
        let process = self.process.trim().to_owned();
        if process.is_empty() {
            return Err(SubmissionValidationError::MissingProcess);
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            SubmissionValidationError::InvalidDate {
                value: self.date.clone(),
            }
        })?;

        let incomplete = self
            .defects
            .iter()
            .filter(|row| row.is_touched() && !row.is_complete())
            .count();
        if incomplete > 0 {
            return Err(SubmissionValidationError::IncompleteDefects { count: incomplete });
        }
        let defects = self
            .defects
            .into_iter()
            .filter(DraftDefect::is_complete)
            .map(|row| DefectEntry::new(row.part.trim(), row.defect_type.trim(), row.count))
            .collect();

        let time = self
            .time
            .map(|time| time.trim().to_owned())
            .filter(|time| !time.is_empty())
            .unwrap_or_else(|| now.format("%H:%M").to_string());

        Ok(ValidSubmission {
            worker_code: workers.code_for(&worker_name).unwrap_or_default().to_owned(),
            worker_name,
            date,
            time,
            process,
            production_qty: self.production_qty,
            tasks: self.tasks,
            defects,
            memo: self.memo,
            model,
        })
    }
}

/// Production and defect totals of one model on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Matching submissions.
    pub submission_count: usize,
    /// Units produced.
    pub production: u64,
    /// Defective units.
    pub defects: u64,
    /// `defects / production * 100`, zero when nothing was produced.
    pub defect_rate: f64,
}

impl DailySummary {
    /// Summarise the submissions of `model` dated `date`.
    #[must_use]
    pub fn compute(submissions: &[WorkerSubmission], model: &str, date: NaiveDate) -> Self {
        let day = submissions
            .iter()
            .filter(|s| s.model == model && s.date == date);
        let (count, production, defects) = day.fold((0, 0_u64, 0_u64), |(n, p, d), s| {
            (n + 1, p + u64::from(s.production_qty), d + s.defect_total())
        });
        Self {
            submission_count: count,
            production,
            defects,
            defect_rate: super::stats::rate(defects, production),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::CodeEntry;

    #[fixture]
    fn workers() -> CodeTable {
        CodeTable::from_entries([CodeEntry::new("김철수", "W001")])
    }

    #[fixture]
    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 5, 0).expect("valid time")
    }

    #[fixture]
    fn draft() -> SubmissionDraft {
        SubmissionDraft {
            model: "ICH-3000".to_owned(),
            worker_name: "김철수".to_owned(),
            date: "2025-01-05".to_owned(),
            time: None,
            process: "조립".to_owned(),
            production_qty: 120,
            tasks: vec!["조립".to_owned()],
            defects: vec![],
            memo: String::new(),
        }
    }

    #[rstest]
    fn valid_draft_resolves_worker_code_and_time(
        draft: SubmissionDraft,
        workers: CodeTable,
        noon: NaiveTime,
    ) {
        let valid = draft.validate(&workers, noon).expect("valid draft");
        let record = WorkerSubmission::record(valid, Uuid::nil(), DateTime::<Utc>::default());

        assert_eq!(record.worker_code, "W001");
        assert_eq!(record.time, "12:05");
        assert_eq!(record.date_key(), "2025-01-05");
    }

    #[rstest]
    fn unknown_worker_gets_empty_code(
        mut draft: SubmissionDraft,
        workers: CodeTable,
        noon: NaiveTime,
    ) {
        draft.worker_name = "신입".to_owned();
        let valid = draft.validate(&workers, noon).expect("valid draft");
        let record = WorkerSubmission::record(valid, Uuid::nil(), DateTime::<Utc>::default());
        assert!(record.worker_code.is_empty());
    }

    #[rstest]
    #[case::worker(|d: &mut SubmissionDraft| d.worker_name = " ".to_owned(), "workerName")]
    #[case::process(|d: &mut SubmissionDraft| d.process = String::new(), "process")]
    #[case::model(|d: &mut SubmissionDraft| d.model = String::new(), "model")]
    #[case::date(|d: &mut SubmissionDraft| d.date = "2025-02-30".to_owned(), "date")]
    fn rejects_missing_fields(
        mut draft: SubmissionDraft,
        workers: CodeTable,
        noon: NaiveTime,
        #[case] mutate: fn(&mut SubmissionDraft),
        #[case] field: &str,
    ) {
        mutate(&mut draft);
        let err = draft.validate(&workers, noon).expect_err("invalid draft");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn drops_blank_rows_and_rejects_partial_ones(
        mut draft: SubmissionDraft,
        workers: CodeTable,
        noon: NaiveTime,
    ) {
        draft.defects = vec![
            DraftDefect::default(),
            DraftDefect {
                part: "필터".to_owned(),
                defect_type: String::new(),
                count: 1,
            },
            DraftDefect {
                part: "필터".to_owned(),
                defect_type: "막힘".to_owned(),
                count: 0,
            },
        ];

        let err = draft.validate(&workers, noon).expect_err("incomplete rows");

        assert_eq!(err, SubmissionValidationError::IncompleteDefects { count: 2 });
    }

    #[rstest]
    fn keeps_complete_rows_only(mut draft: SubmissionDraft, workers: CodeTable, noon: NaiveTime) {
        draft.defects = vec![
            DraftDefect::default(),
            DraftDefect {
                part: "필터".to_owned(),
                defect_type: "막힘".to_owned(),
                count: 3,
            },
        ];

        let valid = draft.validate(&workers, noon).expect("valid draft");

        assert_eq!(valid.defects(), &[DefectEntry::new("필터", "막힘", 3)]);
    }

    #[rstest]
    fn count_above_one_on_blank_row_is_incomplete(
        mut draft: SubmissionDraft,
        workers: CodeTable,
        noon: NaiveTime,
    ) {
        draft.defects = vec![DraftDefect {
            count: 4,
            ..DraftDefect::default()
        }];
        let err = draft.validate(&workers, noon).expect_err("incomplete row");
        assert_eq!(err.code(), "incomplete_defects");
    }

    #[rstest]
    #[case("2025. 1. 5", "2025-01-05")]
    #[case("2024.12.31", "2024-12-31")]
    #[case("2025-03-09", "2025-03-09")]
    #[case("garbage", "garbage")]
    fn normalises_legacy_dates(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_date(raw), expected);
    }

    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(json!("")))]
    #[case::blank(Some(json!("  ")))]
    #[case::null(Some(serde_json::Value::Null))]
    fn legacy_records_deserialise_with_defaults(#[case] model: Option<serde_json::Value>) {
        let mut raw = json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "workerName": "이영희",
            "date": "2025. 1. 5",
            "process": "조립",
            "productionQty": 10,
        });
        if let Some(model) = model {
            raw["model"] = model;
        }
        let record: WorkerSubmission = serde_json::from_value(raw).expect("legacy record");

        assert_eq!(record.model, LEGACY_MODEL_ID);
        assert_eq!(record.date_key(), "2025-01-05");
        assert!(record.defects.is_empty());
    }

    #[rstest]
    fn recorded_models_survive_deserialisation() {
        let record: WorkerSubmission = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "workerName": "이영희",
            "date": "2025-01-05",
            "process": "조립",
            "productionQty": 10,
            "model": "EP-7000",
        }))
        .expect("record");

        assert_eq!(record.model, "EP-7000");
    }

    #[rstest]
    fn daily_summary_guards_zero_production() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).expect("date");
        let summary = DailySummary::compute(&[], "ICH-3000", date);
        assert_eq!(summary.submission_count, 0);
        assert!(summary.defect_rate.abs() < f64::EPSILON);
    }
}
