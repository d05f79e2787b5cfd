use crate::infra::{build_service, parse_standard, ApiService};
use clap::Args;
use motor_norm::config::AppConfig;
use motor_norm::deeplink::DeepLinkRequest;
use motor_norm::error::AppError;
use motor_norm::norms::{NormFamily, NormStandard, Operation, StandardResponse};
use motor_norm::orchestrator::InboundMessage;
use motor_norm::path::FieldPath;
use motor_norm::samples;
use motor_norm::transfer::TransferPackage;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct MessageArgs {
    /// Wire standard of the file (bipro-rclassic, bipro-rnext, sivi-afs, gdv)
    #[arg(long, value_parser = parse_standard)]
    pub(crate) standard: NormStandard,
    /// Request file in the standard's wire format
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Norm version to apply instead of the one in the message
    #[arg(long = "norm-version")]
    pub(crate) norm_version: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Limit the demo to one standard
    #[arg(long, value_parser = parse_standard)]
    pub(crate) standard: Option<NormStandard>,
    /// Print every encoded reply after its summary line
    #[arg(long)]
    pub(crate) show_payloads: bool,
}

/// Runs one request file through the pipeline and writes the encoded reply
/// to stdout. A failed exchange still prints its wire-format error reply.
pub(crate) fn run_message(operation: Operation, args: MessageArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(config.norm)?;
    let payload = std::fs::read(&args.file)?;

    let exchange = service.exchange(InboundMessage {
        standard: args.standard,
        operation,
        version: args.norm_version.as_deref(),
        payload: &payload,
        credentials: None,
    })?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&exchange.payload)?;
    stdout.write_all(b"\n")?;

    match exchange.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        standard,
        show_payloads,
    } = args;

    let config = AppConfig::load()?;
    println!("Motor norm interchange demo (sender {})", config.norm.sender_id);
    let service = build_service(config.norm)?;

    let standards: Vec<NormStandard> = match standard {
        Some(standard) => vec![standard],
        None => NormStandard::ALL.to_vec(),
    };

    println!("\nBroker messages");
    for standard in &standards {
        for operation in [Operation::Tariff, Operation::Reserve] {
            run_sample(&service, *standard, operation, show_payloads)?;
        }
    }

    if standards.contains(&NormStandard::Gdv) {
        println!("\nNorm 430 transfer");
        run_transfer(&service)?;
    }

    println!("\nNorm 440 deep link");
    let request = DeepLinkRequest {
        target_system: "claims".to_string(),
        target_function: "status".to_string(),
        parameters: BTreeMap::from([("claim".to_string(), "CLM-2026-0042".to_string())]),
        session_token: "demo-session".to_string(),
        user_id: "demo-agent".to_string(),
        ..DeepLinkRequest::default()
    };
    match service.deep_link(&request) {
        Ok(link) => println!(
            "- {} (session {} until {})",
            link.access_url,
            link.session_id,
            link.expires_at.to_rfc3339()
        ),
        Err(err) => println!("  Deep link unavailable: {}", err),
    }

    Ok(())
}

fn run_sample(
    service: &ApiService,
    standard: NormStandard,
    operation: Operation,
    show_payloads: bool,
) -> Result<(), AppError> {
    let payload = match samples::data(standard, operation) {
        Some(data) => match samples::encode(standard, operation, data) {
            Ok(payload) => payload,
            Err(err) => {
                println!("  {} {}: sample unavailable ({})", standard.display_name(), operation, err);
                return Ok(());
            }
        },
        None => return Ok(()),
    };

    let exchange = service.exchange(InboundMessage {
        standard,
        operation,
        version: None,
        payload: &payload,
        credentials: None,
    })?;

    let response = &exchange.response;
    match (&exchange.failure, headline(response, operation)) {
        (None, Some(amount)) => println!(
            "- {} {}: {} | {} {:.2}",
            standard.display_name(),
            operation,
            response.status.as_str(),
            headline_label(operation),
            amount
        ),
        (None, None) => println!(
            "- {} {}: {}",
            standard.display_name(),
            operation,
            response.status.as_str()
        ),
        (Some(failure), _) => println!(
            "- {} {}: {} at {} ({} error(s))",
            standard.display_name(),
            operation,
            response.status.as_str(),
            failure.stage,
            response.errors.len()
        ),
    }

    if show_payloads {
        println!("{}", String::from_utf8_lossy(&exchange.payload));
    }
    Ok(())
}

fn run_transfer(service: &ApiService) -> Result<(), AppError> {
    let document = match samples::reserve_message(NormStandard::Gdv) {
        Ok(document) => document,
        Err(err) => {
            println!("  Transfer sample unavailable: {}", err);
            return Ok(());
        }
    };

    let receipt = service.transfer(TransferPackage {
        transfer_type: "430.5".to_string(),
        format: "GDV".to_string(),
        document,
        file_name: Some("schaden.gdv".to_string()),
        sender: Some(samples::SAMPLE_SENDER.to_string()),
        metadata: Map::new(),
    })?;

    let status = serde_json::to_value(&receipt.status)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    println!(
        "- {} {} -> {} ({} record(s), {} rejected)",
        receipt.transfer_id, receipt.transfer_type, status, receipt.summary.records, receipt.summary.rejected
    );
    for (record, count) in &receipt.summary.records_by_type {
        println!("    - {record}: {count}");
    }
    Ok(())
}

fn headline_label(operation: Operation) -> &'static str {
    match operation {
        Operation::Reserve => "final reserve",
        _ => "total premium",
    }
}

/// Premium or final reserve from a successful reply, read at the wire path
/// the standard uses for it.
fn headline(response: &StandardResponse, operation: Operation) -> Option<f64> {
    let path = match (response.standard.family(), operation) {
        (NormFamily::Bipro, Operation::Tariff) => "quoteResult.totalPremium",
        (NormFamily::Bipro, Operation::Reserve) => "reserveResult.finalAmount",
        (NormFamily::Sivi, Operation::Tariff) => "premie.brutoPremie",
        (NormFamily::Sivi, Operation::Reserve) => "reservering.eindbedrag",
        (NormFamily::Gdv, Operation::Tariff) => "quote.TOTAL_PREMIUM",
        (NormFamily::Gdv, Operation::Reserve) => "reserve.FINAL_AMOUNT",
        (_, Operation::Transfer) => return None,
    };
    let data = response.data.as_ref()?;
    match FieldPath::parse(path).lookup(data)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
