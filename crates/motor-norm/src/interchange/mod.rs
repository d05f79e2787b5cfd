//! HTTP surface for the interchange: message endpoints, transfers, deep
//! links and the field catalogue.

mod router;
mod service;

pub use router::{interchange_router, SENDER_HEADER};
pub use service::InterchangeService;

#[cfg(test)]
mod tests;
