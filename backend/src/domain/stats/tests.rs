//! Aggregation pipeline coverage.

use chrono::{DateTime, NaiveDate, Utc};
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).expect("valid date")
}

fn submission(
    model: &str,
    date: NaiveDate,
    worker: &str,
    process: &str,
    qty: u32,
    defects: Vec<DefectEntry>,
) -> WorkerSubmission {
    WorkerSubmission {
        id: Uuid::new_v4(),
        worker_name: worker.to_owned(),
        worker_code: String::new(),
        date,
        time: "09:00".to_owned(),
        process: process.to_owned(),
        production_qty: qty,
        tasks: vec![],
        defects,
        memo: String::new(),
        model: model.to_owned(),
        created_at: DateTime::<Utc>::default(),
    }
}

#[fixture]
fn pool() -> Vec<WorkerSubmission> {
    vec![
        submission(
            "ICH-3000",
            day(5),
            "김철수",
            "조립",
            10,
            vec![
                DefectEntry::new("필터", "막힘", 2),
                DefectEntry::new("전해조", "누수", 1),
            ],
        ),
        submission(
            "ICH-3000",
            day(6),
            "이영희",
            "공정검사",
            20,
            vec![DefectEntry::new("필터", "누수", 3)],
        ),
        submission("ICH-3000", day(7), "김철수", "조립", 0, vec![]),
        submission(
            "ICH-3000",
            day(4),
            "박민수",
            "에이징",
            50,
            vec![DefectEntry::new("메인PCB", "단선", 5)],
        ),
        submission(
            "EP-7000",
            day(5),
            "김철수",
            "조립",
            99,
            vec![DefectEntry::new("필터", "막힘", 9)],
        ),
    ]
}

fn range() -> DateRange {
    DateRange::new(day(5), day(7))
}

#[rstest]
fn totals_cover_model_and_inclusive_range(pool: Vec<WorkerSubmission>) {
    let stats = aggregate(&pool, "ICH-3000", &range(), &StatFilters::default());

    assert_eq!(stats.submission_count, 3);
    assert_eq!(stats.total_production, 30);
    assert_eq!(stats.total_defects, 6);
    assert!((stats.defect_rate - 20.0).abs() < 1e-9);
}

#[rstest]
fn part_filter_counts_full_production(pool: Vec<WorkerSubmission>) {
    let filters = StatFilters {
        part: Some("전해조".to_owned()),
        ..StatFilters::default()
    };
    let stats = aggregate(&pool[..1], "ICH-3000", &range(), &filters);

    assert_eq!(stats.total_production, 10);
    assert_eq!(stats.total_defects, 1);
    assert_eq!(stats.by_part.keys().collect::<Vec<_>>(), vec!["전해조"]);
}

#[rstest]
fn worker_filter_leaves_available_options_intact(pool: Vec<WorkerSubmission>) {
    let filters = StatFilters {
        worker: Some("이영희".to_owned()),
        ..StatFilters::default()
    };
    let stats = aggregate(&pool, "ICH-3000", &range(), &filters);

    assert_eq!(stats.submission_count, 1);
    assert_eq!(stats.available_processes, vec!["공정검사", "조립"]);
    assert_eq!(stats.available_workers, vec!["김철수", "이영희"]);
    assert_eq!(stats.available_parts, vec!["전해조", "필터"]);
    assert_eq!(stats.available_defect_types, vec!["누수", "막힘"]);
}

#[rstest]
fn empty_filter_strings_are_wildcards(pool: Vec<WorkerSubmission>) {
    let filters = StatFilters {
        process: Some(String::new()),
        worker: Some(String::new()),
        part: Some(String::new()),
        defect_type: Some(String::new()),
    };
    let all = aggregate(&pool, "ICH-3000", &range(), &StatFilters::default());
    let blank = aggregate(&pool, "ICH-3000", &range(), &filters);
    assert_eq!(all, blank);
}

#[rstest]
fn zero_production_never_divides(pool: Vec<WorkerSubmission>) {
    let stats = aggregate(
        &pool,
        "ICH-3000",
        &DateRange::single_day(day(7)),
        &StatFilters::default(),
    );

    assert_eq!(stats.total_production, 0);
    assert!(stats.defect_rate.abs() < f64::EPSILON);
    let worker = stats.by_worker.get("김철수").expect("worker group");
    assert!(worker.defect_rate.abs() < f64::EPSILON);
    assert!(stats.daily_trend[0].defect_rate.abs() < f64::EPSILON);
}

#[rstest]
fn groups_by_process_with_detail_keys(pool: Vec<WorkerSubmission>) {
    let stats = aggregate(&pool, "ICH-3000", &range(), &StatFilters::default());

    let assembly = stats.by_process.get("조립").expect("assembly group");
    assert_eq!(assembly.production, 10);
    assert_eq!(assembly.defects, 3);
    assert_eq!(assembly.defect_details.get("필터-막힘"), Some(&2));
    assert_eq!(assembly.defect_details.get("전해조-누수"), Some(&1));
    assert!((assembly.defect_rate - 30.0).abs() < 1e-9);

    let filter = stats.by_part.get("필터").expect("filter part");
    assert_eq!(filter.total, 5);
    assert_eq!(filter.types.get("누수"), Some(&3));
    assert_eq!(stats.by_defect_type.get("누수"), Some(&4));
}

#[rstest]
fn daily_trend_is_ascending_and_rounded(pool: Vec<WorkerSubmission>) {
    let mut shuffled = pool;
    shuffled.reverse();
    shuffled.push(submission(
        "ICH-3000",
        day(6),
        "김철수",
        "조립",
        10,
        vec![],
    ));

    let stats = aggregate(&shuffled, "ICH-3000", &range(), &StatFilters::default());

    let dates: Vec<NaiveDate> = stats.daily_trend.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![day(5), day(6), day(7)]);
    // 3 / 30 = 10.0 %, 3 / 10 = 30.0 %
    assert!((stats.daily_trend[1].defect_rate - 10.0).abs() < 1e-9);
    assert!((stats.daily_trend[0].defect_rate - 30.0).abs() < 1e-9);
}

#[rstest]
fn trend_rate_rounds_to_one_decimal() {
    let pool = vec![submission(
        "ICH-3000",
        day(5),
        "김철수",
        "조립",
        3,
        vec![DefectEntry::new("필터", "막힘", 1)],
    )];
    let stats = aggregate(&pool, "ICH-3000", &range(), &StatFilters::default());
    assert!((stats.daily_trend[0].defect_rate - 33.3).abs() < 1e-9);
    assert!((stats.defect_rate - 100.0 / 3.0).abs() < 1e-9);
}

#[rstest]
fn inverted_range_yields_nothing(pool: Vec<WorkerSubmission>) {
    let stats = aggregate(
        &pool,
        "ICH-3000",
        &DateRange::new(day(7), day(5)),
        &StatFilters::default(),
    );
    assert_eq!(stats, SubmissionStats::default());
}

#[rstest]
fn rankings_sort_by_count_then_name(pool: Vec<WorkerSubmission>) {
    let stats = aggregate(&pool, "ICH-3000", &range(), &StatFilters::default());

    let types: Vec<(String, u64)> = stats
        .ranked_defect_types()
        .into_iter()
        .map(|row| (row.name, row.count))
        .collect();
    assert_eq!(
        types,
        vec![("누수".to_owned(), 4), ("막힘".to_owned(), 2)]
    );

    let parts = stats.ranked_parts();
    assert_eq!(parts[0].name, "필터");

    let details = stats.ranked_defect_details();
    assert_eq!(details[0].name, "필터-누수");
    assert_eq!(details[0].count, 3);

    let workers = stats.ranked_workers();
    assert_eq!(workers[0].0, "김철수");
}
