use crate::config::NormConfig;
use crate::deeplink::{DeepLinkError, DeepLinkIssuer, DeepLinkRequest, DeepLinkResponse};
use crate::mapping::{field_definitions, FieldDefinition};
use crate::norms::NormStandard;
use crate::orchestrator::{ComplianceOrchestrator, Exchange, InboundMessage, PipelineError};
use crate::runtime::{Clock, IdGenerator};
use crate::tables::{SeverityTable, TableError};
use crate::transfer::{TransferDesk, TransferError, TransferPackage, TransferReceipt};
use std::sync::Arc;

/// Everything the HTTP surface offers, behind one shared handle.
pub struct InterchangeService<C, G> {
    orchestrator: ComplianceOrchestrator<C, G>,
    transfers: TransferDesk<C, G>,
    deep_links: DeepLinkIssuer<C, G>,
}

impl<C, G> InterchangeService<C, G>
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    pub fn new(config: NormConfig, severity: Arc<SeverityTable>, clock: Arc<C>, ids: Arc<G>) -> Self {
        let transfers = TransferDesk::new(config.sender_id.clone(), clock.clone(), ids.clone());
        let deep_links = DeepLinkIssuer::new(
            config.deeplink_base_url.clone(),
            config.sender_id.clone(),
            clock.clone(),
            ids.clone(),
        );
        Self {
            orchestrator: ComplianceOrchestrator::new(config, severity, clock, ids),
            transfers,
            deep_links,
        }
    }

    pub fn from_config(config: NormConfig, clock: Arc<C>, ids: Arc<G>) -> Result<Self, TableError> {
        let severity = match &config.severity_table {
            Some(path) => SeverityTable::from_path(path)?,
            None => SeverityTable::standard()?,
        };
        Ok(Self::new(config, Arc::new(severity), clock, ids))
    }

    pub fn orchestrator(&self) -> &ComplianceOrchestrator<C, G> {
        &self.orchestrator
    }

    pub fn exchange(&self, message: InboundMessage<'_>) -> Result<Exchange, PipelineError> {
        self.orchestrator.handle(message)
    }

    pub fn transfer(&self, package: TransferPackage) -> Result<TransferReceipt, TransferError> {
        self.transfers.receive(package)
    }

    pub fn deep_link(&self, request: &DeepLinkRequest) -> Result<DeepLinkResponse, DeepLinkError> {
        self.deep_links.issue(request)
    }

    pub fn fields(&self, standard: NormStandard) -> Vec<FieldDefinition> {
        field_definitions(standard)
    }
}
