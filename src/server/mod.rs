mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};

use crate::api::{DynAPI, API};
use crate::server::handlers::estimates;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/estimates", get(estimates::find).post(estimates::create))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    if let Err(err) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!(error = %err, "server stopped");
    }
}

#[cfg(test)]
fn stub_router(body: &str) -> Router {
    use crate::engine::Engine;
    use crate::test_support::{CannedMatrix, SpyPricing};

    let engine = Engine::with_collaborators(
        Arc::new(CannedMatrix::new(body)),
        Arc::new(SpyPricing::new(Ok(1.0), Ok(10.0))),
    );

    router(Arc::new(engine) as DynAPI)
}

#[tokio::test]
async fn routes_post_and_get_estimates() {
    use crate::entities::Estimate;
    use crate::test_support::{matrix_body, spawn_app};

    let base_url = spawn_app(stub_router(&matrix_body("OK", 5000.0, 600.0)));
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/estimates", base_url))
        .json(&serde_json::json!({
            "origin": {"lat": 12.9716, "lng": 77.5946},
            "destination": {"lat": 12.9352, "lng": 77.6245},
            "vehicle_type": "car",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        res.json::<Estimate>().await.unwrap(),
        Estimate::new(5.0, 10.0, 10.0)
    );

    let res = client
        .get(format!("{}/estimates", base_url))
        .query(&[
            ("origin_lat", "12.9716"),
            ("origin_lng", "77.5946"),
            ("destination_lat", "12.9352"),
            ("destination_lng", "77.6245"),
            ("vehicle_type", "car"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        res.json::<Estimate>().await.unwrap(),
        Estimate::new(5.0, 10.0, 10.0)
    );
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
    use crate::test_support::{matrix_body, spawn_app};

    let base_url = spawn_app(stub_router(&matrix_body("OK", 5000.0, 600.0)));

    let res = reqwest::Client::new()
        .post(format!("{}/estimates", base_url))
        .json(&serde_json::json!({"origin": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 101);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_query_is_a_bad_request() {
    use crate::test_support::{matrix_body, spawn_app};

    let base_url = spawn_app(stub_router(&matrix_body("OK", 5000.0, 600.0)));

    let res = reqwest::Client::new()
        .get(format!("{}/estimates?origin_lat=x", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 101);
}

#[tokio::test]
async fn no_route_stays_distinct_from_bad_input() {
    use crate::test_support::spawn_app;

    let base_url = spawn_app(stub_router(r#"{"rows": [], "status": "OK"}"#));

    let res = reqwest::Client::new()
        .get(format!(
            "{}/estimates?origin_lat=0&origin_lng=0&destination_lat=1&destination_lng=1&vehicle_type=car",
            base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 422);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 102);
}
