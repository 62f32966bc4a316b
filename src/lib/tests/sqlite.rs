use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::adapters::router;
use crate::core::{DeleteOutcome, ToDo, ToDoError, ToDoService, UpdateOutcome};
use crate::storage::{SqliteStore, ToDoStore};

use super::{new_todo, seed, tomorrow};

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn sqlite_service() -> anyhow::Result<ToDoService<SqliteStore>> {
    let store = SqliteStore::connect("sqlite::memory:", 1).await?;
    Ok(ToDoService::new(Arc::new(store)))
}

#[tokio::test]
async fn expiry_round_trips_as_utc() -> TestResult {
    let service = sqlite_service().await?;
    let offset = FixedOffset::east_opt(5 * 3600).expect("valid offset");
    let local = offset.with_ymd_and_hms(2099, 3, 14, 15, 9, 26).unwrap();
    let expected: DateTime<Utc> = local.with_timezone(&Utc);

    let created = service.create(new_todo("Pi day", expected)).await?;
    let stored = service.find_by_id(created.id).await?.expect("to-do is missing");
    assert_eq!(stored.expiry_date, expected);
    assert_eq!(stored.expiry_date, Utc.with_ymd_and_hms(2099, 3, 14, 10, 9, 26).unwrap());

    let precise = Utc::now() + Duration::days(3);
    let created = service.create(new_todo("Precise", precise)).await?;
    let stored = service.find_by_id(created.id).await?.expect("to-do is missing");
    assert_eq!(stored.expiry_date, precise);
    Ok(())
}

#[tokio::test]
async fn store_assigns_increasing_ids() -> TestResult {
    let service = sqlite_service().await?;
    let first = service.create(new_todo("First", tomorrow())).await?;
    let second = service.create(new_todo("Second", tomorrow())).await?;
    assert!(first.id > 0);
    assert!(second.id > first.id);

    let all = service.get_all().await?;
    assert_eq!(all, vec![first, second]);
    Ok(())
}

#[tokio::test]
async fn expiry_range_is_inclusive_in_sql() -> TestResult {
    let service = sqlite_service().await?;
    let from = Utc.with_ymd_and_hms(2090, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2090, 1, 31, 23, 59, 59).unwrap();
    let at_from = seed(&service, "At from", from, 0).await?;
    let middle = seed(&service, "Middle", from + Duration::milliseconds(1500), 0).await?;
    let at_to = seed(&service, "At to", to, 0).await?;
    seed(&service, "Before", from - Duration::nanoseconds(1), 0).await?;
    seed(&service, "After", to + Duration::milliseconds(1), 0).await?;

    let found = service.find_by_expiry_range(from, to).await?;
    assert_eq!(found, vec![at_from, middle, at_to]);
    Ok(())
}

#[tokio::test]
async fn updates_are_persisted() -> TestResult {
    let service = sqlite_service().await?;
    let created = service.create(new_todo("Write tests", tomorrow())).await?;

    assert_eq!(
        service.update_completion_percentage_by_id(created.id, 65).await?,
        UpdateOutcome::Updated
    );
    assert_eq!(service.mark_done(created.id).await?, UpdateOutcome::Updated);
    assert_eq!(service.mark_done(created.id).await?, UpdateOutcome::Unchanged);

    let stored = service.find_by_id(created.id).await?.expect("to-do is missing");
    assert_eq!(stored.completion_percentage, 100);
    assert_eq!(stored.title, created.title);
    Ok(())
}

#[tokio::test]
async fn missing_ids_are_not_store_errors() -> TestResult {
    let service = sqlite_service().await?;
    assert!(service.find_by_id(12345).await?.is_none());
    assert_eq!(service.delete_by_id(12345).await?, DeleteOutcome::NotFound);
    assert!(!service.store().delete(12345).await?);

    let created = service.create(new_todo("Gone soon", tomorrow())).await?;
    assert_eq!(service.delete_by_id(created.id).await?, DeleteOutcome::Deleted);
    assert!(service.find_by_id(created.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn schema_rejects_out_of_range_completion() -> TestResult {
    let service = sqlite_service().await?;
    let invalid = ToDo {
        id: 0,
        title: Some("Overachiever".into()),
        description: None,
        expiry_date: tomorrow(),
        completion_percentage: 150,
    };
    assert!(service.store().insert(&invalid).await.is_err());
    Ok(())
}

#[tokio::test]
async fn store_failures_surface_as_internal_errors() -> TestResult {
    let service = sqlite_service().await?;
    sqlx::query("DROP TABLE todos").execute(service.store().pool()).await?;

    let err = service.get_all().await.unwrap_err();
    assert!(matches!(err, ToDoError::Storage(_)));
    let err = service.delete_by_id(1).await.unwrap_err();
    assert!(matches!(err, ToDoError::Storage(_)));

    let request = Request::builder().method("GET").uri("/todos").body(Body::empty())?;
    let response = router(service).oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body, json!({ "error": "Internal server error" }));
    Ok(())
}

#[tokio::test]
async fn file_database_is_created_on_connect() -> TestResult {
    let path = std::env::temp_dir().join(format!("prk_todos_{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());

    let store = SqliteStore::connect(&url, 2).await?;
    assert!(path.exists());
    store.insert(&new_todo("On disk", tomorrow()).into_record(Utc::now())?).await?;
    store.pool().close().await;

    let reopened = SqliteStore::connect(&url, 2).await?;
    assert_eq!(reopened.find_all().await?.len(), 1);
    reopened.pool().close().await;

    let _ = std::fs::remove_file(&path);
    Ok(())
}
