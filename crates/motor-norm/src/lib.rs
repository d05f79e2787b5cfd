//! Motor-insurance norm interchange.
//!
//! Inbound messages in one of the supported interchange standards are decoded,
//! validated against the standard's rule set, mapped into the canonical risk
//! model, rated or reserved, and mapped back into the caller's wire format.

pub mod canonical;
pub mod codecs;
pub mod config;
pub mod deeplink;
pub mod error;
pub mod interchange;
pub mod mapping;
pub mod norms;
pub mod orchestrator;
pub mod outbound;
pub mod path;
pub mod rating;
pub mod reserve;
pub mod runtime;
pub mod samples;
pub mod tables;
pub mod telemetry;
pub mod transfer;

#[cfg(test)]
mod testing;
