//! End-to-end tests with the real HTTP client and file-backed session
//!
//! A local mock backend stands in for the farm server.

mod fixtures;
mod helpers;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use collector::View;
use fixtures::*;
use helpers::*;
use shared::{BoxAddress, RecordKind};

async fn mount_login(server: &MockServer, token: &str, profile: &shared::UserProfile) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(token, profile)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_collect_and_resume() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-w", &worker_profile()).await;

    Mock::given(method("POST"))
        .and(path("/api/cages/eggs/submit-daily-collection/"))
        .and(header("Authorization", "Token tok-w"))
        .and(body_partial_json(json!({"date": "2024-06-01", "shade_eggs": 7})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "Collection recorded"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    assert_eq!(app.login("achieng@farm.test", "pw").await.unwrap(), View::WorkerCollection);

    app.set_collection_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await;
    app.set_shade_eggs("7").await.unwrap();
    app.set_box_count(BoxAddress::new(2, 1, 0, 2), "4").await.unwrap();
    let receipt = app.submit_collection().await.unwrap();
    assert_eq!(receipt.total(), 11);

    assert!(session_dir.path().join("token").exists());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(session_dir.path().join("token")).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
    let resumed = real_app(&server, session_dir.path()).await;
    assert_eq!(resumed.view().await, View::WorkerCollection);
}

#[tokio::test]
async fn test_backend_rejection_keeps_grid() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-w", &worker_profile()).await;

    Mock::given(method("POST"))
        .and(path("/api/cages/eggs/submit-daily-collection/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Collection for this date already exists"})))
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    app.login("achieng@farm.test", "pw").await.unwrap();
    let address = BoxAddress::new(1, 0, 0, 0);
    app.set_box_count(address, "2").await.unwrap();

    let err = app.submit_collection().await.unwrap_err();
    assert_eq!(err.to_string(), "Request rejected (400): Collection for this date already exists");
    assert_eq!(app.grid().await.get_count(&address), Some(2));
    assert_eq!(app.view().await, View::WorkerCollection);
}

#[tokio::test]
async fn test_report_reshaped_into_grid() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-w", &worker_profile()).await;

    Mock::given(method("GET"))
        .and(path("/api/cages/reports/egg-collection-table/"))
        .and(query_param("date", "2024-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_table_body()))
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    app.login("achieng@farm.test", "pw").await.unwrap();

    let report = app.fetch_report(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await.unwrap();
    assert_eq!(report.grand_total, 65);
    assert_eq!(report.laying_percentage, Some(23.44));

    let cage_one = report.cage(shared::CageId(1)).unwrap();
    let front = cage_one.partition(shared::PartitionSide::Front).unwrap();
    assert_eq!(front.rows.len(), 2);
    assert_eq!(front.rows[0].len(), 8);
    assert_eq!(front.rows[1].len(), 3);

    let cage_two = report.cage(shared::CageId(2)).unwrap();
    let middle = cage_two.partition(shared::PartitionSide::Middle1).unwrap();
    assert!(middle.index.is_none());
    assert_eq!(middle.total(), 2);
}

#[tokio::test]
async fn test_expired_token_removes_session_files() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-o", &owner_profile()).await;

    Mock::given(method("GET"))
        .and(path("/api/cages/dashboard/overview/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})))
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    assert_eq!(app.login("joe@farm.test", "pw").await.unwrap(), View::OwnerDashboard);

    let err = app.dashboard().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(app.view().await, View::SignIn);
    assert!(!session_dir.path().join("token").exists());
    assert!(!session_dir.path().join("user").exists());
}

#[tokio::test]
async fn test_owner_dashboard_and_pdf_download() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-o", &owner_profile()).await;

    Mock::given(method("GET"))
        .and(path("/api/cages/dashboard/overview/"))
        .and(header("Authorization", "Token tok-o"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cages/reports/download/medical/"))
        .and(query_param("start_date", "2024-05-01"))
        .and(query_param("end_date", "2024-05-31"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 medical".to_vec()))
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    app.login("joe@farm.test", "pw").await.unwrap();

    let overview = app.dashboard().await.unwrap();
    assert_eq!(overview.total_chickens, Some(250));
    assert_eq!(overview.cage_breakdown(2).back, 35);
    assert!(overview.extra.contains_key("sales_today"));

    let range = shared::DateRange::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
    )
    .unwrap();
    let download = app.download_report(RecordKind::Medical, Some(range)).await.unwrap();
    assert_eq!(download.bytes, b"%PDF-1.4 medical".to_vec());
    assert_eq!(download.file_name(), "medical_report_2024-05-01_to_2024-05-31.pdf");
}

#[tokio::test]
async fn test_pending_watcher_collects_notifications() {
    let server = MockServer::start().await;
    let session_dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-o", &owner_profile()).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/pending-users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_users_body()))
        .mount(&server)
        .await;

    let app = real_app(&server, session_dir.path()).await;
    app.login("joe@farm.test", "pw").await.unwrap();

    let app_ref = &app;
    let watcher = app.watch_pending(tokio::time::sleep(std::time::Duration::from_millis(300)));
    let seen = wait_for_condition(move || async move { app_ref.notifications().await.len() == 2 }, 2000);
    let (result, seen) = tokio::join!(watcher, seen);

    assert!(result.is_ok());
    assert!(seen);
    assert_eq!(app.notifications().await[0].id, 11);
}
