#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use release_schedule::{
    CriticalPathReport, Dependency, InMemoryPlanStore, Kit, KitStatus, PlanStore, ReleasePlan,
    ReleaseProgress, ResourceAllocation, ResourceLoad, ScheduleAnalysis, Task, http_api,
    parse_datetime,
};
use serde_json::Value;
use tower::util::ServiceExt;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_router() -> axum::Router {
    let mut store = InMemoryPlanStore::new();
    store
        .insert_plan(ReleasePlan::new(
            1,
            "R1",
            parse_datetime("2024-01-01").unwrap(),
            parse_datetime("2024-02-01").unwrap(),
        ))
        .unwrap();
    store
        .insert_kit(Kit::new(1, 1, "Core").with_status(KitStatus::Done))
        .unwrap();
    store.insert_kit(Kit::new(2, 1, "Docs")).unwrap();
    store.insert_kit(Kit::new(3, 1, "UI")).unwrap();
    store.insert_task(Task::new(1, "Build", 8).with_kit(1)).unwrap();
    store.insert_task(Task::new(2, "Test", 4).with_kit(1)).unwrap();
    store.insert_dependency(Dependency::finish_to_start(1, 2)).unwrap();
    store
        .insert_allocation(ResourceAllocation::new(1, "ana", 50, d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap();

    // Second plan whose tasks form a cycle.
    store
        .insert_plan(ReleasePlan::new(
            2,
            "Broken",
            parse_datetime("2024-01-01").unwrap(),
            parse_datetime("2024-02-01").unwrap(),
        ))
        .unwrap();
    store.insert_kit(Kit::new(4, 2, "Loop")).unwrap();
    store.insert_task(Task::new(10, "X", 1).with_kit(4)).unwrap();
    store.insert_task(Task::new(11, "Y", 1).with_kit(4)).unwrap();
    store.insert_dependency(Dependency::finish_to_start(10, 11)).unwrap();
    store.insert_dependency(Dependency::finish_to_start(11, 10)).unwrap();

    http_api::router(http_api::AppState::new(store))
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let (status, bytes) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn critical_path_endpoint() {
    let app = new_router();
    let (status, bytes) = get(&app, "/release-plans/1/critical-path").await;
    assert_eq!(status, StatusCode::OK);
    let report: CriticalPathReport = serde_json::from_slice(&bytes).unwrap();
    let ids: Vec<_> = report.critical_path.iter().map(|t| t.subtask_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(report.total_duration, 12);

    // Unknown plans have no tasks and so an empty path.
    let (status, bytes) = get(&app, "/release-plans/99/critical-path").await;
    assert_eq!(status, StatusCode::OK);
    let report: CriticalPathReport = serde_json::from_slice(&bytes).unwrap();
    assert!(report.critical_path.is_empty());
}

#[tokio::test]
async fn cyclic_plan_is_a_bad_request() {
    let app = new_router();
    let (status, bytes) = get(&app, "/release-plans/2/schedule").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "cyclic_dependency");
}

#[tokio::test]
async fn progress_endpoint() {
    let app = new_router();
    let (status, bytes) = get(&app, "/release-plans/1/progress").await;
    assert_eq!(status, StatusCode::OK);
    let progress: ReleaseProgress = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(progress.progress_percentage, 33);
    assert_eq!(progress.details.unwrap().total_kits, 3);
}

#[tokio::test]
async fn resource_load_endpoint_honours_clip() {
    let app = new_router();
    let (status, bytes) = get(
        &app,
        "/users/ana/resource-load?start_date=2024-01-03&end_date=2024-01-04",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let load: ResourceLoad = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(load.daily_load.len(), 10);

    let (_, bytes) = get(
        &app,
        "/users/ana/resource-load?start_date=2024-01-03&end_date=2024-01-04&clip=true",
    )
    .await;
    let load: ResourceLoad = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(load.daily_load.len(), 2);
    assert_eq!(load.average_load, 50.0);
}

#[tokio::test]
async fn inverted_resource_window_is_rejected() {
    let app = new_router();
    let (status, bytes) = get(
        &app,
        "/users/ana/resource-load?start_date=2024-01-04&end_date=2024-01-03",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn schedule_endpoint_reports_times_and_slack() {
    let app = new_router();
    let (status, bytes) = get(&app, "/release-plans/1/schedule").await;
    assert_eq!(status, StatusCode::OK);
    let analysis: ScheduleAnalysis = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(analysis.tasks.len(), 2);
    let test = analysis.find(2).unwrap();
    assert_eq!(test.earliest_start, parse_datetime("2024-01-01T08:00:00").unwrap());
    assert_eq!(test.earliest_finish, parse_datetime("2024-01-01T12:00:00").unwrap());
    assert_eq!(test.slack_hours, 0.0);
    assert!(analysis.tasks.iter().all(|task| task.is_critical));
}

#[tokio::test]
async fn unknown_plan_yields_empty_bodies() {
    let app = new_router();

    let (status, bytes) = get(&app, "/release-plans/404/schedule").await;
    assert_eq!(status, StatusCode::OK);
    let analysis: ScheduleAnalysis = serde_json::from_slice(&bytes).unwrap();
    assert!(analysis.tasks.is_empty());

    let (status, bytes) = get(&app, "/release-plans/404/progress").await;
    assert_eq!(status, StatusCode::OK);
    let progress: ReleaseProgress = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(progress, ReleaseProgress::default());

    let (status, bytes) = get(&app, "/release-plans/404/critical-path").await;
    assert_eq!(status, StatusCode::OK);
    let report: CriticalPathReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report, CriticalPathReport::default());
}
