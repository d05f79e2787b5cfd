use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::interchange::{interchange_router, InterchangeService};
use crate::norms::{NormStandard, STANDARD_HEADER};
use crate::runtime::{FixedClock, SequenceIdGenerator};
use crate::testing::{clock, norm_config};

pub(super) type TestService = InterchangeService<FixedClock, SequenceIdGenerator>;

pub(super) const BOUNDARY: &str = "norm-boundary-7MA4YWxk";

pub(super) fn build_service() -> Arc<TestService> {
    Arc::new(
        InterchangeService::from_config(
            norm_config(),
            Arc::new(clock()),
            Arc::new(SequenceIdGenerator::new("T")),
        )
        .expect("embedded tables load"),
    )
}

pub(super) fn router() -> Router {
    interchange_router(build_service())
}

pub(super) fn message_request(path: &str, standard: NormStandard, payload: Vec<u8>) -> Request<Body> {
    Request::post(path)
        .header(STANDARD_HEADER, standard.id())
        .body(Body::from(payload))
        .expect("request builds")
}

pub(super) fn json_request(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializes")))
        .expect("request builds")
}

/// One multipart part: field name, optional file name, content.
pub(super) struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a [u8],
}

pub(super) fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/transfer")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(crate::interchange::SENDER_HEADER, "MAKLER-1")
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}
