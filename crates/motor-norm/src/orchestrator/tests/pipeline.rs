use super::common::*;
use axum::http::StatusCode;
use serde_json::json;

use crate::codecs::codec_for;
use crate::norms::{NormStandard, Operation, ResponseStatus};
use crate::orchestrator::{InboundMessage, Stage, TRANSPORT_ERROR_CODE};
use crate::samples;
use crate::testing::quote_request;

#[test]
fn every_standard_quotes_its_sample_tariff() {
    let orchestrator = orchestrator();
    for standard in NormStandard::ALL {
        let payload = samples::tariff_message(standard).expect("sample encodes");
        let exchange = orchestrator
            .handle(inbound(standard, Operation::Tariff, &payload))
            .expect("exchange");

        assert!(exchange.is_success(), "{standard}: {:?}", exchange.failure);
        assert_eq!(exchange.content_type, codec_for(standard).content_type());
        let reply = decode_reply(standard, &exchange.payload);
        assert_eq!(reply.status, ResponseStatus::Success);
        assert!(reply.errors.is_empty());
        assert!(reply.data.is_some(), "{standard} reply carries a result");
    }
}

#[test]
fn every_standard_reserves_its_sample_claim() {
    let orchestrator = orchestrator();
    for standard in NormStandard::ALL {
        let payload = samples::reserve_message(standard).expect("sample encodes");
        let exchange = orchestrator
            .handle(inbound(standard, Operation::Reserve, &payload))
            .expect("exchange");
        assert!(exchange.is_success(), "{standard}: {:?}", exchange.failure);
        assert_eq!(exchange.response.operation.as_deref(), Some("reserve"));
    }
}

#[test]
fn bipro_reserves_carry_the_engine_amounts() {
    let payload = samples::reserve_message(NormStandard::BiproRnext).expect("sample encodes");
    let response = orchestrator()
        .process(inbound(NormStandard::BiproRnext, Operation::Reserve, &payload))
        .expect("reserve");

    let result = &data(&response)["reserveResult"];
    assert_eq!(result["claimNumber"], json!("CLM-2026-0042"));
    assert_eq!(result["baseAmount"], json!(4000.0));
    assert_eq!(result["finalAmount"], json!(4600.0));
}

#[test]
fn replies_are_stamped_with_our_envelope() {
    let payload = samples::tariff_message(NormStandard::BiproRnext).expect("sample encodes");
    let response = orchestrator()
        .process(inbound(NormStandard::BiproRnext, Operation::Tariff, &payload))
        .expect("quote");

    assert_eq!(response.header.message_id.as_deref(), Some("T-MSG-00000001"));
    assert_eq!(response.header.sender.as_deref(), Some(SENDER_ID));
    assert_eq!(response.header.receiver.as_deref(), Some(samples::SAMPLE_SENDER));
    assert_eq!(response.header.timestamp.as_deref(), Some("2026-10-17T00:00:00Z"));
    assert_eq!(response.header.norm_version.as_deref(), Some("RNext.2024.1"));
    assert_eq!(response.metadata["correlationId"], json!("BIPRO-RNEXT-TARIFF-0001"));
    assert_eq!(response.metadata["normIdentifier"], json!("BiPRO RNext RNext.2024.1"));
    assert!(response.metadata.get("extensions").is_none());
}

#[test]
fn validation_failures_list_every_violation() {
    let mut wire = samples::tariff_data(NormStandard::SiviAfs);
    wire["policyholder"]["bsn"] = json!("123456789");
    if let Some(valuation) = wire["vehicle"]["valuation"].as_object_mut() {
        valuation.remove("marketValue");
    }
    let payload = samples::encode(NormStandard::SiviAfs, Operation::Tariff, wire).expect("encodes");

    let exchange = orchestrator()
        .handle(inbound(NormStandard::SiviAfs, Operation::Tariff, &payload))
        .expect("error reply encodes");

    let failure = exchange.failure.as_ref().expect("validation fails");
    assert_eq!(failure.stage, Stage::Validated);
    assert_eq!(failure.failure.category(), "validation");
    assert_eq!(failure.failure.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let reply = decode_reply(NormStandard::SiviAfs, &exchange.payload);
    assert_eq!(reply.status, ResponseStatus::Error);
    assert!(reply.data.is_none());
    assert_eq!(reply.errors.len(), failure.failure.validation_errors().len());
    let fields = error_fields(&reply);
    assert!(fields.contains(&"policyholder.bsn".to_string()));
    assert!(fields.contains(&"vehicle.valuation.marketValue".to_string()));
    assert_eq!(reply.metadata["failedStage"], json!("validate"));
    assert_eq!(reply.metadata["correlationId"], json!("SIVI-AFS-TARIFF-0001"));
}

#[test]
fn undecodable_payloads_fail_at_decode() {
    let exchange = orchestrator()
        .handle(inbound(NormStandard::BiproRnext, Operation::Tariff, b"{not json"))
        .expect("error reply encodes");

    let failure = exchange.failure.as_ref().expect("decode fails");
    assert_eq!(failure.stage, Stage::Decoded);
    assert_eq!(failure.failure.category(), "transport");
    assert_eq!(failure.failure.status_code(), StatusCode::BAD_REQUEST);

    let response = &exchange.response;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, TRANSPORT_ERROR_CODE);
    assert_eq!(response.header.norm_version.as_deref(), Some("RNext.2024.1"));
    assert!(response.metadata.get("correlationId").is_none());
    assert_eq!(response.metadata["failedStage"], json!("decode"));
}

#[test]
fn header_versions_win_over_the_message() {
    let payload = samples::tariff_message(NormStandard::BiproRclassic).expect("sample encodes");
    let message = InboundMessage {
        version: Some("2019.9"),
        ..inbound(NormStandard::BiproRclassic, Operation::Tariff, &payload)
    };
    let exchange = orchestrator().handle(message).expect("error reply encodes");

    let failure = exchange.failure.as_ref().expect("version rejected");
    assert_eq!(failure.stage, Stage::Validated);
    assert_eq!(error_fields(&exchange.response), vec!["messageHeader.normVersion".to_string()]);
    assert_eq!(exchange.response.header.norm_version.as_deref(), Some("2024.1"));

    let message = InboundMessage {
        version: Some("2023.2"),
        ..inbound(NormStandard::BiproRclassic, Operation::Tariff, &payload)
    };
    let exchange = orchestrator().handle(message).expect("exchange");
    assert!(exchange.is_success());
    assert_eq!(exchange.response.header.norm_version.as_deref(), Some("2023.2"));
}

#[test]
fn operations_must_match_the_endpoint() {
    let payload = samples::tariff_message(NormStandard::Gdv).expect("sample encodes");
    let exchange = orchestrator()
        .handle(inbound(NormStandard::Gdv, Operation::Reserve, &payload))
        .expect("error reply encodes");
    let fields = error_fields(&exchange.response);
    assert!(fields.contains(&"operation".to_string()));
    assert!(fields.contains(&"claims".to_string()));
}

#[test]
fn gdv_errors_travel_as_error_records() {
    let mut wire = samples::tariff_data(NormStandard::Gdv);
    wire["address"]["POSTAL_CODE"] = json!("ABCDE");
    wire["vehicle"]["FUEL_TYPE"] = json!("X");
    let payload = samples::encode(NormStandard::Gdv, Operation::Tariff, wire).expect("encodes");

    let exchange = orchestrator()
        .handle(inbound(NormStandard::Gdv, Operation::Tariff, &payload))
        .expect("error reply encodes");
    assert_eq!(exchange.failure.as_ref().map(|error| error.stage), Some(Stage::Validated));

    let text = String::from_utf8(exchange.payload.clone()).expect("utf-8");
    let error_lines = text.lines().filter(|line| line.starts_with("9950")).count();
    assert_eq!(error_lines, 2);
    assert!(text.starts_with("0001"));

    let reply = decode_reply(NormStandard::Gdv, &exchange.payload);
    assert_eq!(reply.status, ResponseStatus::Error);
    assert_eq!(
        error_fields(&reply),
        vec!["address.POSTAL_CODE".to_string(), "vehicle.FUEL_TYPE".to_string()]
    );
}

#[test]
fn unsettled_claims_refer_the_quote() {
    let mut wire = samples::tariff_data(NormStandard::BiproRnext);
    wire["riskData"]["driverData"]["hasClaims"] = json!(true);
    wire["riskData"]["driverData"]["claimsHistory"] = json!([{
        "date": "2025-11-02",
        "type": "KOLLISION",
        "amount": 3200,
        "faultStatus": "UNGEKLAERT",
        "settled": false
    }]);
    let payload = samples::encode(NormStandard::BiproRnext, Operation::Tariff, wire).expect("encodes");

    let response = orchestrator()
        .process(inbound(NormStandard::BiproRnext, Operation::Tariff, &payload))
        .expect("quote");
    let result = &data(&response)["quoteResult"];
    assert_eq!(result["status"], json!("PRUEFUNG"));
    let codes: Vec<&str> = result["referrals"]
        .as_array()
        .expect("referrals")
        .iter()
        .filter_map(|referral| referral["code"].as_str())
        .collect();
    assert!(codes.contains(&"OPEN_CLAIMS"));
}

#[test]
fn unmapped_fields_come_back_as_extensions() {
    let mut wire = samples::tariff_data(NormStandard::BiproRnext);
    wire["brokerReference"] = json!({ "agency": "A-17" });
    let payload = samples::encode(NormStandard::BiproRnext, Operation::Tariff, wire).expect("encodes");

    let response = orchestrator()
        .process(inbound(NormStandard::BiproRnext, Operation::Tariff, &payload))
        .expect("quote");
    assert_eq!(
        response.metadata["extensions"],
        json!({ "brokerReference.agency": "A-17" })
    );
}

#[test]
fn transfers_are_not_carried_by_the_pipeline() {
    let payload = samples::encode(
        NormStandard::Gdv,
        Operation::Transfer,
        samples::tariff_data(NormStandard::Gdv),
    )
    .expect("encodes");
    let error = orchestrator()
        .process(inbound(NormStandard::Gdv, Operation::Transfer, &payload))
        .expect_err("transfer rejected");
    assert_eq!(error.stage, Stage::MappedIn);
    assert_eq!(error.failure.category(), "transport");
}

#[test]
fn quotes_use_the_market_of_the_standard() {
    let orchestrator = orchestrator();
    let request = quote_request();
    let german = orchestrator.quote(NormStandard::Gdv, &request).expect("german quote");
    let dutch = orchestrator.quote(NormStandard::SiviAfs, &request).expect("dutch quote");

    assert_eq!(german, orchestrator.quote(NormStandard::BiproRnext, &request).expect("quote"));
    assert_ne!(german.total_premium, dutch.total_premium);
}
