//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost first): CORS → Cache-Control → audit logger.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Origin of the bundled web front end.
pub const FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Build the API router.
pub fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/triage", post(endpoints::triage::submit))
        .route("/resources", get(endpoints::resources::list))
        .route(
            "/resources/check/:department",
            get(endpoints::resources::check),
        )
        .route("/resources/admit", post(endpoints::resources::admit))
        .route("/resources/discharge", post(endpoints::resources::discharge))
        .route("/resources/hospitals", post(endpoints::resources::register))
        .route(
            "/resources/hospitals/:hospital_id",
            delete(endpoints::resources::unregister),
        )
        .route("/resources/reset", post(endpoints::resources::reset))
        .route("/meta/symptoms", get(endpoints::meta::symptoms))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static(FRONTEND_ORIGIN))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::config::TriageConfig;
    use crate::triage::{ResourceStore, TriagePipeline};

    fn test_router() -> Router {
        let resources = Arc::new(ResourceStore::new());
        let pipeline = Arc::new(TriagePipeline::with_baseline(
            resources.clone(),
            TriageConfig::default(),
        ));
        api_router(ApiContext::new(pipeline, resources))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn patient_json(spo2: f64) -> serde_json::Value {
        serde_json::json!({
            "name": "Jane Doe",
            "age": 40,
            "gender": "Female",
            "bp_systolic": 120.0,
            "bp_diastolic": 80.0,
            "heart_rate": 75.0,
            "temperature": 36.8,
            "spo2": spo2,
            "symptoms": [],
            "pre_existing_conditions": [],
            "insurance_provider": "Aetna",
            "insurance_response_hours": 3.0
        })
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = test_router().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "Vigil");
        assert_eq!(json["classifier"], "baseline-linear");
    }

    #[tokio::test]
    async fn triage_override_patient() {
        let response = test_router()
            .oneshot(post_json("/api/triage", patient_json(84.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["risk_level"], "High");
        assert_eq!(json["override_applied"], true);
        assert_eq!(json["override_rule"], "OVR-SPO2");
        assert_eq!(json["insurance"]["urgency"], "BYPASS_INSURANCE");
        assert_eq!(json["patient_name"], "Jane Doe");
        assert!(json["patient_id"].as_str().unwrap().starts_with("PT-"));
        let trace = json["stage_trace"].as_array().unwrap();
        assert!(trace.iter().any(|s| s == "classifier_skipped"));
        assert_eq!(json["digital_twin"]["steps"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn triage_out_of_range_vitals_return_400() {
        let response = test_router()
            .oneshot(post_json("/api/triage", patient_json(120.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn triage_malformed_body_returns_400() {
        let response = test_router()
            .oneshot(post_json("/api/triage", serde_json::json!({"age": "old"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resources_list_has_default_network() {
        let response = test_router().oneshot(get_request("/api/resources")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["hospitals"].as_array().unwrap().len(), 3);
        assert_eq!(json["hospitals"][0]["hospital_id"], "HOSP-001");
    }

    #[tokio::test]
    async fn capacity_check_known_and_unknown_targets() {
        let router = test_router();
        let response = router
            .clone()
            .oneshot(get_request("/api/resources/check/Cardiology"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["hospital_id"], "HOSP-001");
        assert_eq!(json["beds_available"], 5);

        // A department the hospital lacks reads as full, with nowhere else to go.
        let response = router
            .clone()
            .oneshot(get_request("/api/resources/check/Oncology"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "full");
        assert_eq!(json["capacity"], 0);
        assert_eq!(json["beds_available"], 0);
        assert_eq!(json["occupancy_percent"], 100);
        assert!(json["alternatives"].as_array().unwrap().is_empty());

        let response = router
            .oneshot(get_request("/api/resources/check/Cardiology?hospital_id=HOSP-404"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admit_until_full_then_conflict() {
        let router = test_router();
        let body = serde_json::json!({"department": "Cardiology"});
        for expected_available in (0..5).rev() {
            let response = router
                .clone()
                .oneshot(post_json("/api/resources/admit", body.clone()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = json_body(response).await;
            assert_eq!(json["department"]["beds_available"], expected_available);
        }

        let response = router
            .clone()
            .oneshot(post_json("/api/resources/admit", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = router
            .oneshot(post_json("/api/resources/discharge", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["department"]["beds_available"], 1);
    }

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let router = test_router();
        let body = serde_json::json!({
            "hospital_id": "HOSP-900",
            "name": "Lakeside Clinic",
            "departments": ["Emergency", "Cardiology"],
            "total_beds": 21
        });
        let response = router
            .clone()
            .oneshot(post_json("/api/resources/hospitals", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(post_json("/api/resources/hospitals", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/resources/hospitals/HOSP-900")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router.oneshot(get_request("/api/resources")).await.unwrap();
        assert_eq!(json_body(response).await["hospitals"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn reset_restores_default_occupancy() {
        let router = test_router();
        router
            .clone()
            .oneshot(post_json("/api/resources/admit", serde_json::json!({"department": "Dermatology"})))
            .await
            .unwrap();
        let response = router
            .clone()
            .oneshot(post_json("/api/resources/reset", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(get_request("/api/resources/check/Dermatology"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["beds_available"], 4);
    }

    #[tokio::test]
    async fn meta_lists_vocabularies() {
        let response = test_router().oneshot(get_request("/api/meta/symptoms")).await.unwrap();
        let json = json_body(response).await;
        assert_eq!(json["symptoms"].as_array().unwrap().len(), 30);
        assert_eq!(json["conditions"].as_array().unwrap().len(), 11);
        assert_eq!(json["departments"][0], "Emergency");
    }

    #[tokio::test]
    async fn cors_allows_frontend_origin() {
        let request = Request::builder()
            .uri("/api/health")
            .header("Origin", FRONTEND_ORIGIN)
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            FRONTEND_ORIGIN
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = test_router().oneshot(get_request("/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
