use crate::config::ConfigError;
use crate::deeplink::DeepLinkError;
use crate::orchestrator::PipelineError;
use crate::tables::TableError;
use crate::telemetry::TelemetryError;
use crate::transfer::TransferError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Raised by the rating or reserve engine. Valid input never produces one;
/// seeing it means a table or logic defect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("vehicle value must be a positive amount")]
    InvalidVehicleValue,
    #[error("no severity entry for {loss} / {bracket}")]
    MissingSeverityEntry {
        loss: &'static str,
        bracket: &'static str,
    },
    #[error("driver age is outside the insurable range")]
    DriverAgeOutOfRange,
    #[error("model year {year} is outside the rateable range")]
    ModelYearOutOfRange { year: i32 },
    #[error("calculated {stage} is not a positive finite amount")]
    NonPositiveAmount { stage: &'static str },
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Table(TableError),
    Io(std::io::Error),
    Server(axum::Error),
    Pipeline(PipelineError),
    Transfer(TransferError),
    DeepLink(DeepLinkError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Table(err) => write!(f, "table error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
            AppError::Transfer(err) => write!(f, "transfer error: {}", err),
            AppError::DeepLink(err) => write!(f, "deep link error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Table(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Transfer(err) => Some(err),
            AppError::DeepLink(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, category, stage, errors) = match &self {
            AppError::Pipeline(err) => (
                err.failure.status_code(),
                err.failure.category(),
                Some(err.stage.step_name()),
                err.failure.validation_errors(),
            ),
            AppError::Transfer(TransferError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation",
                None,
                errors.clone(),
            ),
            AppError::Transfer(_) => (StatusCode::BAD_REQUEST, "transport", None, Vec::new()),
            AppError::DeepLink(DeepLinkError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation",
                None,
                errors.clone(),
            ),
            AppError::DeepLink(DeepLinkError::InvalidBase(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                None,
                Vec::new(),
            ),
            AppError::DeepLink(_) => (StatusCode::BAD_REQUEST, "transport", None, Vec::new()),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Table(_)
            | AppError::Io(_)
            | AppError::Server(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                None,
                Vec::new(),
            ),
        };

        let mut body = json!({
            "error": self.to_string(),
            "category": category,
        });
        if let Some(stage) = stage {
            body["stage"] = json!(stage);
        }
        if !errors.is_empty() {
            body["errors"] = json!(errors);
        }
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<TableError> for AppError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<TransferError> for AppError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

impl From<DeepLinkError> for AppError {
    fn from(value: DeepLinkError) -> Self {
        Self::DeepLink(value)
    }
}
