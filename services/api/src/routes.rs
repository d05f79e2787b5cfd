use crate::infra::{ApiService, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use motor_norm::interchange::interchange_router;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Interchange endpoints plus liveness, readiness and metrics.
pub(crate) fn with_operational_routes(service: Arc<ApiService>) -> axum::Router {
    interchange_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_service;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use motor_norm::codecs::codec_for;
    use motor_norm::config::NormConfig;
    use motor_norm::norms::{NormStandard, ResponseStatus, STANDARD_HEADER};
    use motor_norm::samples;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    fn config() -> NormConfig {
        NormConfig {
            sender_id: "API-TEST".to_string(),
            outbound_timeout: Duration::from_secs(5),
            quote_validity_days: 30,
            deeplink_base_url: Url::parse("https://portal.example.com/access").expect("url"),
            severity_table: None,
        }
    }

    fn app(ready: bool) -> axum::Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_operational_routes(build_service(config()).expect("service builds")).layer(Extension(state))
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(false)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], json!("ok"));
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["status"], json!("initializing"));

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let response = app(true)
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; version=0.0.4");
    }

    #[tokio::test]
    async fn interchange_routes_are_mounted() {
        let payload = samples::tariff_message(NormStandard::BiproRclassic).expect("sample encodes");
        let request = Request::post("/tariff")
            .header(STANDARD_HEADER, NormStandard::BiproRclassic.id())
            .body(Body::from(payload))
            .expect("request");
        let response = app(true).oneshot(request).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let reply = codec_for(NormStandard::BiproRclassic)
            .decode_response(&bytes)
            .expect("soap reply decodes");
        assert_eq!(reply.status, ResponseStatus::Success);
        assert_eq!(reply.header.sender.as_deref(), Some("API-TEST"));
    }
}
