mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{testbed, TestBed};
use drover_manager::{ApiServer, ServerConfig};
use drover_worker::{ComponentPath, WorkerApi};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn test_app(active: &[ComponentPath]) -> Result<(Router, TestBed)> {
    let mut bed = testbed(2, active, 1).await;
    bed.start();

    let fleet: Vec<Arc<dyn WorkerApi>> = bed
        .workers
        .iter()
        .map(|w| w.clone() as Arc<dyn WorkerApi>)
        .collect();

    let server = ApiServer::new(
        bed.reconciler.clone(),
        bed.registry.clone(),
        fleet,
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
    );

    Ok((server.into_router(), bed))
}

async fn body_json(response: axum::response::Response) -> Result<serde_json::Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (app, _bed) = test_app(&[]).await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await?;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "drover-manager");

    Ok(())
}

#[tokio::test]
async fn test_declare_and_list_components() -> Result<()> {
    let (app, bed) = test_app(&[]).await?;
    bed.store
        .set_head(ComponentPath::new("alice", "svc"), "h1")
        .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/components/alice/svc")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/components")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let view = body_json(response).await?;
    let active = view["active"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["user"], "alice");
    assert_eq!(active[0]["repo"], "svc");

    Ok(())
}

#[tokio::test]
async fn test_push_update_lands_in_version_index() -> Result<()> {
    let (app, _bed) = test_app(&[]).await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/updates")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"user":"alice","repo":"svc","hash":"h2"}"#,
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The update-applier task folds the event in asynchronously
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/components")
                    .body(Body::empty())?,
            )
            .await?;
        let view = body_json(response).await?;
        if view["versions"]["alice/svc"] == "h2" {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("update never reached the version index");
}

#[tokio::test]
async fn test_push_update_rejects_blank_fields() -> Result<()> {
    let (app, _bed) = test_app(&[]).await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/updates")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"user":"","repo":"svc","hash":"h2"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_remove_unknown_component_is_404() -> Result<()> {
    let (app, _bed) = test_app(&[]).await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/components/nobody/nothing")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_trigger_reconcile_accepted() -> Result<()> {
    let (app, _bed) = test_app(&[]).await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/reconcile")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    Ok(())
}

#[tokio::test]
async fn test_worker_views_report_fleet() -> Result<()> {
    let (app, bed) = test_app(&[]).await?;
    bed.workers[1].set_fail_status(true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/workers")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let views = body_json(response).await?;
    let views = views.as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert!(views[0]["status"].is_object());
    assert!(views[1]["error"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/workers/logs")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let logs = body_json(response).await?;
    assert_eq!(logs.as_array().unwrap().len(), 2);

    Ok(())
}
