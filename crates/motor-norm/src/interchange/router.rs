use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Map, Value};

use super::service::InterchangeService;
use crate::deeplink::{DeepLinkError, DeepLinkRequest};
use crate::error::AppError;
use crate::norms::{Credentials, NormStandard, Operation, ValidationCode, ValidationError, STANDARD_HEADER, VERSION_HEADER};
use crate::orchestrator::{InboundMessage, PipelineError, Stage, TransportError};
use crate::runtime::{Clock, IdGenerator};
use crate::transfer::{TransferError, TransferPackage, TransferStatus, MAX_DOCUMENT_BYTES};

/// Header naming the party uploading a transfer.
pub const SENDER_HEADER: &str = "x-norm-sender";

/// Router exposing the norm endpoints.
pub fn interchange_router<C, G>(service: Arc<InterchangeService<C, G>>) -> Router
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    Router::new()
        .route("/tariff", post(tariff_handler::<C, G>))
        .route("/reserve", post(reserve_handler::<C, G>))
        .route(
            "/transfer",
            post(transfer_handler::<C, G>).layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES as usize)),
        )
        .route("/deeplink", post(deeplink_handler::<C, G>))
        .route("/fields/:standard", get(fields_handler::<C, G>))
        .with_state(service)
}

pub(crate) async fn tariff_handler<C, G>(
    State(service): State<Arc<InterchangeService<C, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    exchange(&service, Operation::Tariff, &headers, &body)
}

pub(crate) async fn reserve_handler<C, G>(
    State(service): State<Arc<InterchangeService<C, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    exchange(&service, Operation::Reserve, &headers, &body)
}

fn exchange<C, G>(
    service: &InterchangeService<C, G>,
    operation: Operation,
    headers: &HeaderMap,
    body: &[u8],
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    let standard = match standard_from(headers) {
        Ok(standard) => standard,
        Err(error) => return AppError::Pipeline(PipelineError::new(Stage::Received, error)).into_response(),
    };
    let version = header_text(headers, VERSION_HEADER);
    let message = InboundMessage {
        standard,
        operation,
        version: version.as_deref(),
        payload: body,
        credentials: bearer(headers),
    };

    match service.exchange(message) {
        Ok(exchange) => {
            let status = exchange
                .failure
                .as_ref()
                .map_or(StatusCode::OK, |error| error.failure.status_code());
            let mut response = (status, exchange.payload).into_response();
            let response_headers = response.headers_mut();
            response_headers.insert(CONTENT_TYPE, HeaderValue::from_static(exchange.content_type));
            response_headers.insert(
                HeaderName::from_static(STANDARD_HEADER),
                HeaderValue::from_static(standard.id()),
            );
            if let Some(version) = exchange
                .response
                .header
                .norm_version
                .as_deref()
                .and_then(|version| HeaderValue::from_str(version).ok())
            {
                response_headers.insert(HeaderName::from_static(VERSION_HEADER), version);
            }
            response
        }
        Err(error) => AppError::Pipeline(error).into_response(),
    }
}

fn standard_from(headers: &HeaderMap) -> Result<NormStandard, TransportError> {
    let raw = header_text(headers, STANDARD_HEADER).ok_or(TransportError::MissingHeader(STANDARD_HEADER))?;
    Ok(raw.parse::<NormStandard>()?)
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn bearer(headers: &HeaderMap) -> Option<Credentials> {
    let raw = header_text(headers, AUTHORIZATION.as_str())?;
    let (scheme, token) = raw.split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty())
        .then(|| Credentials::Bearer(token.trim().to_string()))
}

pub(crate) async fn transfer_handler<C, G>(
    State(service): State<Arc<InterchangeService<C, G>>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return AppError::Transfer(TransferError::Upload(rejection.body_text())).into_response(),
    };
    let package = match read_package(multipart, header_text(&headers, SENDER_HEADER)).await {
        Ok(package) => package,
        Err(error) => return AppError::Transfer(error).into_response(),
    };
    match service.transfer(package) {
        Ok(receipt) => {
            let status = match receipt.status {
                TransferStatus::Error => StatusCode::UNPROCESSABLE_ENTITY,
                TransferStatus::Success | TransferStatus::Partial => StatusCode::ACCEPTED,
            };
            (status, axum::Json(receipt)).into_response()
        }
        Err(error) => AppError::Transfer(error).into_response(),
    }
}

async fn read_package(mut multipart: Multipart, sender: Option<String>) -> Result<TransferPackage, TransferError> {
    let mut package = TransferPackage {
        sender,
        ..TransferPackage::default()
    };
    let upload = |err: axum::extract::multipart::MultipartError| TransferError::Upload(err.to_string());

    while let Some(field) = multipart.next_field().await.map_err(upload)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "transferType" => package.transfer_type = field.text().await.map_err(upload)?,
            "format" => package.format = field.text().await.map_err(upload)?,
            "document" => {
                package.file_name = field.file_name().map(str::to_string);
                package.document = field.bytes().await.map_err(upload)?.to_vec();
            }
            "metadata" => {
                let raw = field.text().await.map_err(upload)?;
                if !raw.trim().is_empty() {
                    package.metadata = parse_metadata(&raw)?;
                }
            }
            _ => {}
        }
    }
    Ok(package)
}

fn parse_metadata(raw: &str) -> Result<Map<String, Value>, TransferError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(TransferError::Validation(vec![ValidationError::new(
            "metadata",
            ValidationCode::InvalidPattern,
            "metadata must be a JSON object",
        )])),
    }
}

pub(crate) async fn deeplink_handler<C, G>(
    State(service): State<Arc<InterchangeService<C, G>>>,
    body: Bytes,
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    let request: DeepLinkRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => return AppError::DeepLink(DeepLinkError::Malformed(error.to_string())).into_response(),
    };
    match service.deep_link(&request) {
        Ok(link) => (StatusCode::OK, axum::Json(link)).into_response(),
        Err(error) => AppError::DeepLink(error).into_response(),
    }
}

pub(crate) async fn fields_handler<C, G>(
    State(service): State<Arc<InterchangeService<C, G>>>,
    Path(standard): Path<String>,
) -> Response
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    match standard.parse::<NormStandard>() {
        Ok(standard) => {
            let payload = json!({
                "standard": standard,
                "versions": standard.supported_versions(),
                "fields": service.fields(standard),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
                "standards": NormStandard::ALL,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}
