//! Behavioural tests driving the dashboard API end to end over in-memory storage.

#[path = "support/dashboard.rs"]
mod dashboard;

use std::sync::Arc;

use dashboard::{Dashboard, code_of};
use mockable::DefaultClock;
use quality_backend::outbound::memory::InMemoryKeyValueStore;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::{Value, json};

#[derive(Default, ScenarioState)]
struct DashboardWorld {
    dashboard: Slot<Dashboard>,
    last: Slot<(u16, Value)>,
}

impl DashboardWorld {
    fn dashboard(&self) -> Dashboard {
        self.dashboard.get().expect("dashboard should be set up")
    }

    fn last(&self) -> (u16, Value) {
        self.last.get().expect("a request should have been sent")
    }

    fn submit(&self, model: &str, qty: u32, defects: Value) {
        let response = self.dashboard().post(
            "/api/v1/submissions",
            json!({
                "model": model,
                "workerName": "김철수",
                "date": "2025-01-05",
                "time": "14:30",
                "process": "조립",
                "productionQty": qty,
                "defects": defects,
            }),
        );
        assert_eq!(response.0, 201, "submission accepted: {}", response.1);
        self.last.set(response);
    }

    fn options(&self, model: &str) -> Value {
        let (status, body) = self
            .dashboard()
            .get(&format!("/api/v1/models/{model}/options"));
        assert_eq!(status, 200);
        body
    }
}

#[fixture]
fn world() -> DashboardWorld {
    DashboardWorld::default()
}

#[given("a fresh quality dashboard")]
fn a_fresh_quality_dashboard(world: &DashboardWorld) {
    world.dashboard.set(Dashboard::over(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(DefaultClock),
    ));
}

#[given("the model WP-100 with product code w10 exists")]
fn the_model_wp_100_exists(world: &DashboardWorld) {
    let (status, body) = world.dashboard().post(
        "/api/v1/models",
        json!({ "id": "WP-100", "productCode": "w10" }),
    );
    assert_eq!(status, 201);
    assert_eq!(body["model"]["productCode"], "W10");
}

#[given("the part 시험부품 with code 801 is added to WP-100")]
fn a_custom_part_is_added_to_wp_100(world: &DashboardWorld) {
    let (status, body) = world.dashboard().post(
        "/api/v1/models/WP-100/options/parts",
        json!({ "name": "시험부품", "code": "801" }),
    );
    assert_eq!(status, 201);
    assert_eq!(code_of(&body["tables"], "parts", "시험부품").as_deref(), Some("801"));
}

#[given("김철수 submitted 10 units for WP-100 on 2025-01-05")]
fn a_submission_exists_for_wp_100(world: &DashboardWorld) {
    world.submit("WP-100", 10, json!([]));
}

#[when("김철수 submits 40 units with two 필터 막힘 defects on 2025-01-05")]
fn a_submission_with_defects_is_recorded(world: &DashboardWorld) {
    world.submit(
        "ICH-3000",
        40,
        json!([{ "part": "필터", "defectType": "막힘", "count": 2 }]),
    );
}

#[when("the part 필터 is added again with code 702")]
fn a_duplicate_part_is_added(world: &DashboardWorld) {
    let response = world.dashboard().post(
        "/api/v1/models/ICH-3000/options/parts",
        json!({ "name": "필터", "code": "702" }),
    );
    world.last.set(response);
}

#[when("the model WP-100 is deleted")]
fn the_model_wp_100_is_deleted(world: &DashboardWorld) {
    let response = world.dashboard().delete("/api/v1/models/WP-100");
    assert_eq!(response.0, 200, "model removed: {}", response.1);
    world.last.set(response);
}

#[when("the model ICH-3000 is deleted")]
fn the_model_ich_3000_is_deleted(world: &DashboardWorld) {
    let response = world.dashboard().delete("/api/v1/models/ICH-3000");
    world.last.set(response);
}

#[when("a code is generated for 솔밸브-온수 누수 at 공정검사")]
fn a_code_is_generated(world: &DashboardWorld) {
    let response = world.dashboard().post(
        "/api/v1/models/ICH-3000/defect-codes",
        json!({
            "observations": [{
                "processName": "공정검사",
                "partName": "솔밸브-온수",
                "defectDescription": "누수",
            }]
        }),
    );
    world.last.set(response);
}

#[then("the submission is recorded with worker code W001")]
fn the_submission_has_a_worker_code(world: &DashboardWorld) {
    let (_, body) = world.last();
    assert_eq!(body["submission"]["workerCode"], "W001");
    assert_eq!(body["submission"]["defects"][0]["count"], 2);
}

#[then("the statistics for 2025-01-05 report a defect rate of 5.0")]
fn the_statistics_report_the_rate(world: &DashboardWorld) {
    let (status, body) = world
        .dashboard()
        .get("/api/v1/stats?model=ICH-3000&start=2025-01-05&end=2025-01-05");
    assert_eq!(status, 200);
    assert_eq!(body["stats"]["totalProduction"], 40);
    assert_eq!(body["stats"]["totalDefects"], 2);
    assert_eq!(body["stats"]["defectRate"], 5.0);
    assert_eq!(body["rankings"]["workers"][0]["name"], "김철수");
}

#[then("the response status is 409")]
fn the_response_status_is_409(world: &DashboardWorld) {
    assert_eq!(world.last().0, 409);
}

#[then("the response status is 400")]
fn the_response_status_is_400(world: &DashboardWorld) {
    assert_eq!(world.last().0, 400);
}

#[then("the error code detail is selected_model")]
fn the_error_detail_is_selected_model(world: &DashboardWorld) {
    let (_, body) = world.last();
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "selected_model");
}

#[then("the part 필터 still maps to code 701")]
fn the_part_keeps_its_code(world: &DashboardWorld) {
    let options = world.options("ICH-3000");
    assert_eq!(code_of(&options, "parts", "필터").as_deref(), Some("701"));
}

#[then("the model list no longer contains WP-100")]
fn the_model_list_omits_wp_100(world: &DashboardWorld) {
    let (status, body) = world.dashboard().get("/api/v1/models");
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["models"]
        .as_array()
        .expect("models array")
        .iter()
        .filter_map(|model| model["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["ICH-3000", "EP-7000"]);
    assert_eq!(body["selected"], "ICH-3000");
}

#[then("the submissions of WP-100 are still listed")]
fn the_orphaned_submissions_remain(world: &DashboardWorld) {
    let (status, body) = world.dashboard().get("/api/v1/submissions?model=WP-100");
    assert_eq!(status, 200);
    let listed = body.as_array().expect("submission array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["productionQty"], 10);
}

#[then("re-adding WP-100 restores the built-in parts")]
fn re_adding_restores_builtin_parts(world: &DashboardWorld) {
    let (status, _) = world.dashboard().post(
        "/api/v1/models",
        json!({ "id": "WP-100", "productCode": "W10" }),
    );
    assert_eq!(status, 201);

    let options = world.options("WP-100");
    assert_eq!(code_of(&options, "parts", "필터").as_deref(), Some("701"));
    assert!(code_of(&options, "parts", "시험부품").is_none());
}

#[then("the generated code is C03B5012")]
fn the_generated_code_matches(world: &DashboardWorld) {
    let (status, body) = world.last();
    assert_eq!(status, 200);
    assert_eq!(body["codes"][0]["code"], "C03B5012");
    assert_eq!(body["codes"][0]["description"], "솔밸브-온수 - 누수");
}

#[scenario(
    path = "tests/features/quality_dashboard.feature",
    name = "A recorded submission feeds the statistics"
)]
fn a_recorded_submission_feeds_the_statistics(world: DashboardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/quality_dashboard.feature",
    name = "Duplicate part names are rejected"
)]
fn duplicate_part_names_are_rejected(world: DashboardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/quality_dashboard.feature",
    name = "Deleting a model purges its tables but keeps its submissions"
)]
fn deleting_a_model_purges_tables_but_keeps_submissions(world: DashboardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/quality_dashboard.feature",
    name = "The selected model cannot be deleted"
)]
fn the_selected_model_cannot_be_deleted(world: DashboardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/quality_dashboard.feature",
    name = "Defect codes use the model product code"
)]
fn defect_codes_use_the_model_product_code(world: DashboardWorld) {
    drop(world);
}
