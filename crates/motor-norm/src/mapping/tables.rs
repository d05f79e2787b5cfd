//! Mapping tables per standard family.

use super::{flag, list, optional, required, values, CodeTable, Rule, Transform};
use crate::norms::{NormFamily, Operation};
use Transform::{Codes, Date, Decimal, Identity, Integer, Scale, YesNo};

pub fn request_rules(family: NormFamily, operation: Operation) -> Option<&'static [Rule]> {
    match (family, operation) {
        (NormFamily::Bipro, Operation::Tariff) => Some(bipro::TARIFF),
        (NormFamily::Bipro, Operation::Reserve) => Some(bipro::RESERVE),
        (NormFamily::Sivi, Operation::Tariff) => Some(sivi::TARIFF),
        (NormFamily::Sivi, Operation::Reserve) => Some(sivi::RESERVE),
        (NormFamily::Gdv, Operation::Tariff) => Some(gdv::TARIFF),
        (NormFamily::Gdv, Operation::Reserve) => Some(gdv::RESERVE),
        (_, Operation::Transfer) => None,
    }
}

pub fn result_rules(family: NormFamily, operation: Operation) -> Option<&'static [Rule]> {
    match (family, operation) {
        (NormFamily::Bipro, Operation::Tariff) => Some(bipro::QUOTE_RESULT),
        (NormFamily::Bipro, Operation::Reserve) => Some(bipro::RESERVE_RESULT),
        (NormFamily::Sivi, Operation::Tariff) => Some(sivi::QUOTE_RESULT),
        (NormFamily::Sivi, Operation::Reserve) => Some(sivi::RESERVE_RESULT),
        (NormFamily::Gdv, Operation::Tariff) => Some(gdv::QUOTE_RESULT),
        (NormFamily::Gdv, Operation::Reserve) => Some(gdv::RESERVE_RESULT),
        (_, Operation::Transfer) => None,
    }
}

pub mod bipro {
    use super::*;

    pub const FUEL: CodeTable = &[
        ("BENZIN", "petrol"),
        ("DIESEL", "diesel"),
        ("ELEKTRO", "electric"),
        ("HYBRID", "hybrid"),
        ("GAS", "lpg"),
    ];
    pub const SECURITY: CodeTable = &[
        ("ALARMANLAGE", "alarm"),
        ("WEGFAHRSPERRE", "immobiliser"),
        ("ORTUNG", "tracking"),
    ];
    pub const LICENCE: CodeTable = &[
        ("FULL", "full_domestic"),
        ("PROVISIONAL", "provisional"),
        ("INTERNATIONAL", "international"),
    ];
    pub const MARITAL: CodeTable = &[
        ("LEDIG", "single"),
        ("VERHEIRATET", "married"),
        ("PARTNERSCHAFT", "partnered"),
        ("GESCHIEDEN", "divorced"),
        ("VERWITWET", "widowed"),
    ];
    pub const USE: CodeTable = &[
        ("PRIVAT", "private"),
        ("PENDEL", "commute"),
        ("GESCHAEFTLICH", "business"),
    ];
    pub const PARKING: CodeTable = &[
        ("GARAGE", "garage"),
        ("STELLPLATZ", "driveway"),
        ("STRASSE", "street"),
    ];
    pub const RISK_AREA: CodeTable = &[("STANDARD", "standard"), ("HOCH", "high")];
    pub const COVER: CodeTable = &[
        ("HAFTPFLICHT", "third_party"),
        ("TEILKASKO", "third_party_fire_theft"),
        ("VOLLKASKO", "comprehensive"),
    ];
    pub const PAYMENT: CodeTable = &[
        ("JAEHRLICH", "annual"),
        ("VIERTELJAEHRLICH", "quarterly"),
        ("MONATLICH", "monthly"),
    ];
    pub const LOSS: CodeTable = &[
        ("KOLLISION", "collision"),
        ("DIEBSTAHL", "theft"),
        ("VANDALISMUS", "vandalism"),
        ("FEUER", "fire"),
        ("UEBERSCHWEMMUNG", "flood"),
        ("GLAS", "glass_damage"),
        ("HAFTPFLICHT", "third_party"),
        ("VOLLKASKO", "comprehensive"),
        ("SONSTIGE", "other"),
    ];
    pub const FAULT: CodeTable = &[
        ("SCHULD", "at_fault"),
        ("KEINE_SCHULD", "not_at_fault"),
        ("TEILSCHULD", "split"),
        ("UNGEKLAERT", "unknown"),
    ];
    pub const FRAUD: CodeTable = &[
        ("SPAETE_MELDUNG", "late_reporting"),
        ("MEHRFACHSCHADEN", "multiple_claims"),
        ("HOHER_WERT", "high_value_for_type"),
        ("WIDERSPRUECHLICH", "inconsistent_story"),
        ("KEINE_ANZEIGE", "no_police_report"),
        ("VERDAECHTIGER_ZEITPUNKT", "suspicious_timing"),
        ("UNGEWOEHNLICHER_ORT", "unusual_location"),
        ("BETRUGSHISTORIE", "prior_fraud_history"),
    ];
    pub const QUOTE_STATUS: CodeTable = &[("ANGEBOT", "QUOTED"), ("PRUEFUNG", "REFERRED")];
    pub const RISK_RATING: CodeTable = &[("NIEDRIG", "low"), ("MITTEL", "medium"), ("HOCH", "high")];

    const CONVICTION: &[Rule] = &[
        required("date", "date", Date),
        required("code", "type", Identity),
        required("points", "points", Integer),
        optional("fineAmount", "fine", Decimal),
    ];

    const CLAIM: &[Rule] = &[
        required("date", "date", Date),
        required("lossType", "type", Codes(LOSS)),
        required("amount", "amount", Decimal),
        required("faultStatus", "faultStatus", Codes(FAULT)),
        required("settled", "settled", YesNo),
    ];

    pub const TARIFF: &[Rule] = &[
        required("risk.vehicle.make", "riskData.vehicleData.make", Identity),
        required("risk.vehicle.model", "riskData.vehicleData.model", Identity),
        required("risk.vehicle.modelYear", "riskData.vehicleData.year", Integer),
        // litres on the wire
        required("risk.vehicle.engineDisplacement", "riskData.vehicleData.engineSize", Scale(1000.0)),
        required("risk.vehicle.fuelType", "riskData.vehicleData.fuelType", Codes(FUEL)),
        required("risk.vehicle.declaredValue", "riskData.vehicleData.vehicleValue", Decimal),
        optional("risk.vehicle.registrationCountry", "riskData.vehicleData.registrationCountry", Identity),
        optional("risk.vehicle.registration", "riskData.vehicleData.registration", Identity),
        values("risk.vehicle.securityFeatures", "riskData.vehicleData.securityFeatures", Codes(SECURITY)),
        values("risk.vehicle.modifications", "riskData.vehicleData.modifications", Identity),
        required("risk.driver.dateOfBirth", "riskData.driverData.dateOfBirth", Date),
        optional("risk.driver.licenseIssueDate", "riskData.driverData.licenseIssueDate", Date),
        optional("risk.driver.licenceType", "riskData.driverData.licenseType", Codes(LICENCE)),
        optional("risk.driver.occupation", "riskData.driverData.occupation", Identity),
        optional("risk.driver.maritalStatus", "riskData.driverData.maritalStatus", Codes(MARITAL)),
        required("risk.driver.noClaimsYears", "riskData.driverData.noClaimsYears", Integer),
        list("risk.driver.convictions", "riskData.driverData.convictions", CONVICTION),
        list("risk.driver.claimsHistory", "riskData.driverData.claimsHistory", CLAIM),
        Rule::Consumed("riskData.driverData.licenseCountry"),
        Rule::Consumed("riskData.driverData.hasConvictions"),
        Rule::Consumed("riskData.driverData.hasClaims"),
        required("risk.usage.annualDistance", "riskData.usageData.annualMileage", Integer),
        required("risk.usage.primaryUse", "riskData.usageData.mainUse", Codes(USE)),
        optional("risk.usage.parkingLocation", "riskData.usageData.overnightParking", Codes(PARKING)),
        required("risk.location.postalCode", "riskData.locationData.postalCode", Identity),
        optional("risk.location.riskArea", "riskData.locationData.riskArea", Codes(RISK_AREA)),
        required("coverage.coverLevel", "coverageData.coverageType", Codes(COVER)),
        optional("coverage.paymentFrequency", "coverageData.paymentFrequency", Codes(PAYMENT)),
        optional("coverage.startDate", "coverageData.startDate", Date),
        optional("coverage.excess", "coverageData.excess", Decimal),
    ];

    pub const RESERVE: &[Rule] = &[
        required("claimNumber", "claimData.claimNumber", Identity),
        optional("policyNumber", "claimData.policyNumber", Identity),
        optional("incidentDate", "claimData.incidentDate", Date),
        required("lossType", "claimData.lossType", Codes(LOSS)),
        required("vehicleValue", "claimData.vehicleValue", Decimal),
        required("faultStatus", "claimData.faultStatus", Codes(FAULT)),
        optional("fraudSignals", "claimData.fraudSignals", YesNo),
        optional("partsBackorder", "claimData.partsBackorder", YesNo),
        values("fraudIndicators", "claimData.fraudIndicators", Codes(FRAUD)),
    ];

    const REFERRAL: &[Rule] = &[
        required("code", "code", Identity),
        required("description", "description", Identity),
        required("category", "category", Identity),
    ];

    const FACTOR: &[Rule] = &[
        required("factorName", "factorName", Identity),
        required("amount", "amount", Decimal),
        values("contributingInputs", "contributingInputs", Identity),
    ];

    const MODIFIER: &[Rule] = &[
        required("name", "name", Identity),
        required("amount", "amount", Decimal),
    ];

    pub const QUOTE_RESULT: &[Rule] = &[
        required("status", "quoteResult.status", Codes(QUOTE_STATUS)),
        required("basePremium", "quoteResult.basePremium", Decimal),
        required("netPremium", "quoteResult.netPremium", Decimal),
        required("taxAmount", "quoteResult.taxAmount", Decimal),
        required("totalPremium", "quoteResult.totalPremium", Decimal),
        required("instalmentAmount", "quoteResult.instalmentAmount", Decimal),
        required("currency", "quoteResult.currency", Identity),
        required("paymentFrequency", "quoteResult.paymentFrequency", Codes(PAYMENT)),
        required("validFrom", "quoteResult.validFrom", Date),
        required("validTo", "quoteResult.validTo", Date),
        required("riskRating", "quoteResult.riskRating", Codes(RISK_RATING)),
        list("referrals", "quoteResult.referrals", REFERRAL),
        list("calculationBreakdown", "quoteResult.calculationBreakdown", FACTOR),
    ];

    pub const RESERVE_RESULT: &[Rule] = &[
        required("claimNumber", "reserveResult.claimNumber", Identity),
        required("estimate.lossType", "reserveResult.lossType", Codes(LOSS)),
        required("estimate.vehicleValue", "reserveResult.vehicleValue", Decimal),
        required("estimate.baseAmount", "reserveResult.baseAmount", Decimal),
        list("estimate.modifiers", "reserveResult.modifiers", MODIFIER),
        required("estimate.finalAmount", "reserveResult.finalAmount", Decimal),
        required("estimate.band", "reserveResult.band", Identity),
        required("estimate.breakdown", "reserveResult.breakdown", Identity),
        required("fraudScore", "reserveResult.fraudScore", Decimal),
        required("fraudLevel", "reserveResult.fraudLevel", Identity),
        required("recommendation", "reserveResult.recommendation", Identity),
    ];
}

pub mod sivi {
    use super::*;

    pub const FUEL: CodeTable = &[
        ("Benzine", "petrol"),
        ("Diesel", "diesel"),
        ("Elektro", "electric"),
        ("Hybride", "hybrid"),
        ("LPG", "lpg"),
    ];
    pub const USE: CodeTable = &[
        ("Prive", "private"),
        ("Woon-werk", "commute"),
        ("Zakelijk", "business"),
    ];
    pub const PARKING: CodeTable = &[("Garage", "garage"), ("Oprit", "driveway"), ("Straat", "street")];
    pub const LICENCE: CodeTable = &[
        ("VOLLEDIG", "full_domestic"),
        ("VOORLOPIG", "provisional"),
        ("INTERNATIONAAL", "international"),
    ];
    pub const COVER: CodeTable = &[
        ("WA", "third_party"),
        ("WA_BEPERKT_CASCO", "third_party_fire_theft"),
        ("WA_VOLLEDIG_CASCO", "comprehensive"),
    ];
    pub const PAYMENT: CodeTable = &[
        ("Jaarlijks", "annual"),
        ("Kwartaal", "quarterly"),
        ("Maandelijks", "monthly"),
    ];
    pub const CLAIM_TYPE: CodeTable = &[
        ("Aanrijding", "collision"),
        ("Diefstal", "theft"),
        ("Vandalisme", "vandalism"),
        ("Brand", "fire"),
        ("Overstroming", "flood"),
        ("Ruitschade", "glass_damage"),
        ("WA", "third_party"),
        ("Casco", "comprehensive"),
        ("Overig", "other"),
    ];
    pub const FAULT: CodeTable = &[
        ("Schuld", "at_fault"),
        ("Geen schuld", "not_at_fault"),
        ("Gedeeld", "split"),
        ("Onduidelijk", "unknown"),
    ];
    pub const FRAUD: CodeTable = &[
        ("LATE_MELDING", "late_reporting"),
        ("MEERDERE_SCHADES", "multiple_claims"),
        ("HOGE_WAARDE", "high_value_for_type"),
        ("TEGENSTRIJDIG", "inconsistent_story"),
        ("GEEN_AANGIFTE", "no_police_report"),
        ("VERDACHT_TIJDSTIP", "suspicious_timing"),
        ("ONGEBRUIKELIJKE_LOCATIE", "unusual_location"),
        ("FRAUDEHISTORIE", "prior_fraud_history"),
    ];
    pub const QUOTE_STATUS: CodeTable = &[("Offerte", "QUOTED"), ("Acceptatie", "REFERRED")];
    pub const RISK_RATING: CodeTable = &[("Laag", "low"), ("Midden", "medium"), ("Hoog", "high")];

    const CLAIM: &[Rule] = &[
        required("date", "date", Date),
        required("lossType", "claimType", Codes(CLAIM_TYPE)),
        required("amount", "amount", Decimal),
        required("faultStatus", "faultStatus", Codes(FAULT)),
        required("settled", "settled", YesNo),
    ];

    /// The first listed driver is rated; further drivers travel as extensions.
    pub const TARIFF: &[Rule] = &[
        required("risk.vehicle.make", "vehicle.vehicleDetails.make", Identity),
        required("risk.vehicle.model", "vehicle.vehicleDetails.model", Identity),
        required("risk.vehicle.modelYear", "vehicle.vehicleDetails.buildYear", Integer),
        required("risk.vehicle.engineDisplacement", "vehicle.technical.engineCapacity", Integer),
        required("risk.vehicle.fuelType", "vehicle.technical.fuelType", Codes(FUEL)),
        required("risk.vehicle.declaredValue", "vehicle.valuation.marketValue", Decimal),
        optional("risk.vehicle.registration", "vehicle.registration.licensePlate", Identity),
        Rule::Consumed("vehicle.registration.apkValid"),
        flag("risk.vehicle.securityFeatures", "alarm", "vehicle.security.alarm"),
        flag("risk.vehicle.securityFeatures", "immobiliser", "vehicle.security.immobiliser"),
        flag("risk.vehicle.securityFeatures", "tracking", "vehicle.security.tracking"),
        values("risk.vehicle.modifications", "vehicle.modifications", Identity),
        required("risk.driver.dateOfBirth", "drivers[0].dateOfBirth", Date),
        optional("risk.driver.licenseIssueDate", "drivers[0].licenceDetails.issueDate", Date),
        optional("risk.driver.licenceType", "drivers[0].licenceDetails.licenceType", Codes(LICENCE)),
        Rule::Consumed("drivers[0].licenceDetails.issuingCountry"),
        optional("risk.driver.occupation", "drivers[0].occupation", Identity),
        required("risk.driver.noClaimsYears", "drivers[0].drivingHistory.claimFreeYears", Integer),
        optional("risk.driver.penaltyPoints", "drivers[0].drivingHistory.penaltyPoints", Integer),
        list("risk.driver.claimsHistory", "drivers[0].claimsHistory", CLAIM),
        required("risk.usage.annualDistance", "vehicle.usage.annualMileage", Integer),
        required("risk.usage.primaryUse", "vehicle.usage.mainUse", Codes(USE)),
        optional("risk.usage.parkingLocation", "vehicle.usage.parkingLocation", Codes(PARKING)),
        required("risk.location.postalCode", "policyholder.address.postalCode", Identity),
        Rule::Consumed("policyholder.bsn"),
        Rule::Consumed("policyHeader.currency"),
        Rule::Consumed("hasEndorsements"),
        required("coverage.coverLevel", "coverage.coverageType", Codes(COVER)),
        Rule::Consumed("coverage.limits"),
        optional("coverage.paymentFrequency", "policyHeader.paymentFrequency", Codes(PAYMENT)),
        optional("coverage.startDate", "policyHeader.startDate", Date),
        optional("coverage.excess", "coverage.excess", Decimal),
    ];

    pub const RESERVE: &[Rule] = &[
        required("claimNumber", "claimHeader.claimNumber", Identity),
        optional("policyNumber", "claimHeader.policyNumber", Identity),
        required("lossType", "claimHeader.claimType", Codes(CLAIM_TYPE)),
        optional("incidentDate", "incident.incidentDate", Date),
        required("vehicleValue", "vehicle.marketValue", Decimal),
        required("faultStatus", "liability.faultStatus", Codes(FAULT)),
        optional("fraudSignals", "indicators.fraudSignals", YesNo),
        optional("partsBackorder", "indicators.partsBackorder", YesNo),
        values("fraudIndicators", "indicators.fraudIndicators", Codes(FRAUD)),
    ];

    const REFERRAL: &[Rule] = &[
        required("code", "code", Identity),
        required("description", "omschrijving", Identity),
        required("category", "categorie", Identity),
    ];

    const FACTOR: &[Rule] = &[
        required("factorName", "factor", Identity),
        required("amount", "bedrag", Decimal),
        values("contributingInputs", "invoer", Identity),
    ];

    const MODIFIER: &[Rule] = &[
        required("name", "soort", Identity),
        required("amount", "bedrag", Decimal),
    ];

    pub const QUOTE_RESULT: &[Rule] = &[
        required("status", "premie.status", Codes(QUOTE_STATUS)),
        required("basePremium", "premie.basisPremie", Decimal),
        required("netPremium", "premie.nettoPremie", Decimal),
        required("taxAmount", "premie.assurantiebelasting", Decimal),
        required("totalPremium", "premie.brutoPremie", Decimal),
        required("instalmentAmount", "premie.termijnbedrag", Decimal),
        required("currency", "premie.valuta", Identity),
        required("paymentFrequency", "premie.betaaltermijn", Codes(PAYMENT)),
        required("validFrom", "premie.ingangsdatum", Date),
        required("validTo", "premie.einddatum", Date),
        required("riskRating", "premie.risicoklasse", Codes(RISK_RATING)),
        list("referrals", "premie.acceptatie", REFERRAL),
        list("calculationBreakdown", "premie.opbouw", FACTOR),
    ];

    pub const RESERVE_RESULT: &[Rule] = &[
        required("claimNumber", "reservering.schadenummer", Identity),
        required("estimate.lossType", "reservering.schadesoort", Codes(CLAIM_TYPE)),
        required("estimate.vehicleValue", "reservering.dagwaarde", Decimal),
        required("estimate.baseAmount", "reservering.basisbedrag", Decimal),
        list("estimate.modifiers", "reservering.opslagen", MODIFIER),
        required("estimate.finalAmount", "reservering.eindbedrag", Decimal),
        required("estimate.band", "reservering.bandbreedte", Identity),
        required("estimate.breakdown", "reservering.toelichting", Identity),
        required("fraudScore", "reservering.fraudescore", Decimal),
        required("fraudLevel", "reservering.fraudeniveau", Identity),
        required("recommendation", "reservering.advies", Identity),
    ];
}

pub mod gdv {
    use super::*;

    pub const FUEL: CodeTable = &[
        ("B", "petrol"),
        ("D", "diesel"),
        ("E", "electric"),
        ("H", "hybrid"),
        ("G", "lpg"),
    ];
    pub const LICENCE: CodeTable = &[("F", "full_domestic"), ("P", "provisional"), ("I", "international")];
    pub const USE: CodeTable = &[("P", "private"), ("W", "commute"), ("G", "business")];
    pub const PARKING: CodeTable = &[("G", "garage"), ("S", "driveway"), ("T", "street")];
    pub const COVER: CodeTable = &[
        ("HP", "third_party"),
        ("TK", "third_party_fire_theft"),
        ("VK", "comprehensive"),
    ];
    pub const PAYMENT: CodeTable = &[("J", "annual"), ("V", "quarterly"), ("M", "monthly")];
    pub const LOSS: CodeTable = &[
        ("KO", "collision"),
        ("DI", "theft"),
        ("VA", "vandalism"),
        ("FE", "fire"),
        ("UE", "flood"),
        ("GL", "glass_damage"),
        ("HP", "third_party"),
        ("VK", "comprehensive"),
        ("SO", "other"),
    ];
    pub const FAULT: CodeTable = &[
        ("A", "at_fault"),
        ("N", "not_at_fault"),
        ("T", "split"),
        ("U", "unknown"),
    ];
    pub const RISK_RATING: CodeTable = &[("LOW", "low"), ("MEDIUM", "medium"), ("HIGH", "high")];

    const CLAIM: &[Rule] = &[
        required("date", "INCIDENT_DATE", Date),
        required("lossType", "LOSS_TYPE", Codes(LOSS)),
        required("amount", "CLAIM_AMOUNT", Decimal),
        required("faultStatus", "FAULT_STATUS", Codes(FAULT)),
        required("settled", "SETTLED", YesNo),
    ];

    pub const TARIFF: &[Rule] = &[
        Rule::Consumed("address.SURNAME"),
        Rule::Consumed("address.FIRST_NAME"),
        Rule::Consumed("address.STREET"),
        Rule::Consumed("address.CITY"),
        required("risk.driver.dateOfBirth", "address.DATE_OF_BIRTH", Date),
        required("risk.location.postalCode", "address.POSTAL_CODE", Identity),
        optional("risk.vehicle.registrationCountry", "address.COUNTRY", Identity),
        required("coverage.coverLevel", "contract.COVERAGE_TYPE", Codes(COVER)),
        optional("coverage.paymentFrequency", "contract.PAYMENT_FREQUENCY", Codes(PAYMENT)),
        optional("coverage.startDate", "contract.START_DATE", Date),
        optional("coverage.excess", "contract.EXCESS", Decimal),
        Rule::Consumed("contract.CURRENCY"),
        required("risk.vehicle.make", "vehicle.MAKE", Identity),
        required("risk.vehicle.model", "vehicle.MODEL", Identity),
        required("risk.vehicle.modelYear", "vehicle.MODEL_YEAR", Integer),
        optional("risk.vehicle.registration", "vehicle.REGISTRATION", Identity),
        required("risk.vehicle.engineDisplacement", "vehicle.ENGINE_CC", Integer),
        required("risk.vehicle.fuelType", "vehicle.FUEL_TYPE", Codes(FUEL)),
        required("risk.vehicle.declaredValue", "vehicle.VEHICLE_VALUE", Decimal),
        flag("risk.vehicle.securityFeatures", "alarm", "vehicle.ALARM"),
        flag("risk.vehicle.securityFeatures", "immobiliser", "vehicle.IMMOBILISER"),
        flag("risk.vehicle.securityFeatures", "tracking", "vehicle.TRACKING"),
        optional("risk.driver.licenseIssueDate", "usage.LICENCE_ISSUE_DATE", Date),
        optional("risk.driver.licenceType", "usage.LICENCE_TYPE", Codes(LICENCE)),
        Rule::Consumed("usage.LICENCE_COUNTRY"),
        required("risk.usage.annualDistance", "usage.ANNUAL_MILEAGE", Integer),
        required("risk.usage.primaryUse", "usage.MAIN_USE", Codes(USE)),
        optional("risk.usage.parkingLocation", "usage.PARKING", Codes(PARKING)),
        required("risk.driver.noClaimsYears", "usage.NO_CLAIMS_YEARS", Integer),
        optional("risk.driver.penaltyPoints", "usage.PENALTY_POINTS", Integer),
        list("risk.driver.claimsHistory", "claims", CLAIM),
    ];

    /// Reserves are computed for the first claim record.
    pub const RESERVE: &[Rule] = &[
        required("claimNumber", "claims[0].CLAIM_NUMBER", Identity),
        optional("policyNumber", "claims[0].POLICY_NUMBER", Identity),
        optional("incidentDate", "claims[0].INCIDENT_DATE", Date),
        required("lossType", "claims[0].LOSS_TYPE", Codes(LOSS)),
        required("vehicleValue", "claims[0].VEHICLE_VALUE", Decimal),
        required("faultStatus", "claims[0].FAULT_STATUS", Codes(FAULT)),
        optional("fraudSignals", "claims[0].FRAUD_FLAG", YesNo),
        optional("partsBackorder", "claims[0].PARTS_FLAG", YesNo),
    ];

    /// Referrals and the factor breakdown have no record type and are not sent.
    pub const QUOTE_RESULT: &[Rule] = &[
        required("status", "quote.STATUS", Identity),
        required("netPremium", "quote.NET_PREMIUM", Decimal),
        required("taxAmount", "quote.TAX_AMOUNT", Decimal),
        required("totalPremium", "quote.TOTAL_PREMIUM", Decimal),
        required("instalmentAmount", "quote.INSTALMENT", Decimal),
        required("currency", "quote.CURRENCY", Identity),
        required("validFrom", "quote.VALID_FROM", Date),
        required("validTo", "quote.VALID_TO", Date),
        required("riskRating", "quote.RISK_RATING", Codes(RISK_RATING)),
        required("paymentFrequency", "quote.PAYMENT_FREQUENCY", Codes(PAYMENT)),
    ];

    pub const RESERVE_RESULT: &[Rule] = &[
        required("claimNumber", "reserve.CLAIM_NUMBER", Identity),
        required("estimate.lossType", "reserve.LOSS_TYPE", Codes(LOSS)),
        required("estimate.baseAmount", "reserve.BASE_AMOUNT", Decimal),
        required("loads.fraud", "reserve.FRAUD_LOAD", Decimal),
        required("loads.liability", "reserve.LIABILITY_LOAD", Decimal),
        required("loads.partsBackorder", "reserve.PARTS_LOAD", Decimal),
        required("estimate.finalAmount", "reserve.FINAL_AMOUNT", Decimal),
        required("estimate.band", "reserve.BAND", Identity),
        required("fraudLevel", "reserve.FRAUD_LEVEL", Identity),
    ];
}
