use metrics_exporter_prometheus::PrometheusHandle;
use motor_norm::config::NormConfig;
use motor_norm::error::AppError;
use motor_norm::interchange::InterchangeService;
use motor_norm::norms::NormStandard;
use motor_norm::runtime::{SequenceIdGenerator, SystemClock};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ApiService = InterchangeService<SystemClock, SequenceIdGenerator>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wall-clock service; ids are scoped by the configured sender id.
pub(crate) fn build_service(config: NormConfig) -> Result<Arc<ApiService>, AppError> {
    let ids = SequenceIdGenerator::new(config.sender_id.clone());
    let service = InterchangeService::from_config(config, Arc::new(SystemClock), Arc::new(ids))?;
    Ok(Arc::new(service))
}

pub(crate) fn parse_standard(raw: &str) -> Result<NormStandard, String> {
    raw.parse::<NormStandard>().map_err(|_| {
        let known: Vec<&str> = NormStandard::ALL.iter().map(|standard| standard.id()).collect();
        format!("unknown standard '{raw}' (expected one of {})", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standards_parse_case_insensitively() {
        assert_eq!(parse_standard("GDV"), Ok(NormStandard::Gdv));
        assert_eq!(parse_standard(" bipro-rclassic "), Ok(NormStandard::BiproRclassic));
    }

    #[test]
    fn unknown_standards_list_the_alternatives() {
        let message = parse_standard("acord").expect_err("rejected");
        assert!(message.contains("bipro-rnext"));
        assert!(message.contains("'acord'"));
    }
}
