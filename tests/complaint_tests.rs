mod common;

use std::collections::BTreeSet;

use mediblock::complaint;
use mediblock::models::{
    BatchId, ComplaintDraft, DraftField, Evidence, Outcome, PLACEHOLDER_DISTRIBUTOR,
    PLACEHOLDER_LOCATION, VerificationVerdict, ViolationReason,
};

#[test]
fn complete_draft_validates() {
    let request = complaint::validate(&common::complete_draft()).unwrap();

    assert_eq!(request.pharmacy_name(), "City Meds Store");
    assert_eq!(request.location(), "123 Main St, New York");
    assert_eq!(request.violation_reason(), ViolationReason::CounterfeitPackaging);
    assert_eq!(request.primary_evidence(), &common::evidence());
    assert_eq!(request.attachment_count(), 1);
}

#[test]
fn supplementary_evidence_is_optional() {
    let mut draft = common::complete_draft();
    draft.supplementary_evidence.clear();

    let request = complaint::validate(&draft).unwrap();
    assert_eq!(request.attachment_count(), 0);
}

#[test]
fn reports_each_missing_field() {
    let cases: [(fn(&mut ComplaintDraft), DraftField); 4] = [
        (|d: &mut ComplaintDraft| d.pharmacy_name.clear(), DraftField::PharmacyName),
        (|d: &mut ComplaintDraft| d.location.clear(), DraftField::Location),
        (|d: &mut ComplaintDraft| d.description.clear(), DraftField::Description),
        (|d: &mut ComplaintDraft| d.primary_evidence = None, DraftField::PrimaryEvidence),
    ];

    for (blank, field) in cases {
        let mut draft = common::complete_draft();
        blank(&mut draft);

        let err = complaint::validate(&draft).unwrap_err();
        assert_eq!(err.missing_fields, BTreeSet::from([field]), "blanking {field}");
    }
}

#[test]
fn reports_all_missing_fields_of_an_empty_draft() {
    let err = complaint::validate(&ComplaintDraft::default()).unwrap_err();

    assert_eq!(
        err.missing_fields,
        BTreeSet::from([
            DraftField::PharmacyName,
            DraftField::Location,
            DraftField::Description,
            DraftField::PrimaryEvidence,
        ])
    );
    assert_eq!(
        err.to_string(),
        "Missing required fields: pharmacyName, location, description, primaryEvidence"
    );
}

#[test]
fn empty_text_and_empty_images_count_as_missing() {
    let mut draft = common::complete_draft();
    draft.location.clear();
    draft.primary_evidence = Some(Evidence::jpeg("empty.jpg", Vec::<u8>::new()));

    let err = complaint::validate(&draft).unwrap_err();
    assert!(err.is_missing(DraftField::Location));
    assert!(err.is_missing(DraftField::PrimaryEvidence));
    assert!(!err.is_missing(DraftField::PharmacyName));
}

#[test]
fn whitespace_is_text() {
    let mut draft = common::complete_draft();
    draft.location = " ".to_string();

    let request = complaint::validate(&draft).unwrap();
    assert_eq!(request.location(), " ");
}

#[test]
fn validated_fields_are_kept_as_typed() {
    let mut draft = common::complete_draft();
    draft.pharmacy_name = "  City Meds Store ".to_string();

    let request = complaint::validate(&draft).unwrap();
    assert_eq!(request.pharmacy_name(), "  City Meds Store ");
}

#[test]
fn failed_verdict_prefills_a_valid_draft() {
    let verdict = VerificationVerdict {
        outcome: Outcome::Fail,
        confidence: Some(0.876),
        batch_id: BatchId::new("BATCH_4821"),
        message: None,
    };
    assert!(verdict.offers_complaint());

    let draft = ComplaintDraft::for_failed_verdict(&verdict, common::evidence())
        .with_pharmacy("Corner Pharmacy", "5 Elm Rd");

    assert_eq!(draft.pharmacy_name, "Corner Pharmacy");
    assert_eq!(draft.location, "5 Elm Rd");
    assert!(draft.description.contains("BATCH_4821"));
    assert!(draft.description.contains("0.88"));
    assert!(complaint::validate(&draft).is_ok());
}

#[test]
fn failed_verdict_uses_placeholder_distributor_and_location() {
    let verdict = VerificationVerdict {
        outcome: Outcome::Fail,
        confidence: None,
        batch_id: BatchId::new("BATCH_1"),
        message: Some("Counterfeit suspected".to_string()),
    };
    let draft = ComplaintDraft::for_failed_verdict(&verdict, common::evidence());

    assert_eq!(draft.pharmacy_name, PLACEHOLDER_DISTRIBUTOR);
    assert_eq!(draft.pharmacy_name, "Unknown Distributor");
    assert_eq!(draft.location, PLACEHOLDER_LOCATION);
    assert_eq!(draft.location, "Geolocation Tagged");
    assert!(!draft.description.contains("confidence"));
    assert!(draft.description.ends_with("Counterfeit suspected"));
    assert!(complaint::validate(&draft).is_ok());
}

#[test]
fn violation_reason_labels_round_trip() {
    for reason in ViolationReason::ALL {
        assert_eq!(ViolationReason::from_label(reason.label()), Some(reason));
        let json = serde_json::to_value(reason).unwrap();
        assert_eq!(json, reason.label());
    }
    assert_eq!(ViolationReason::from_label("Stolen"), None);
    assert_eq!(ViolationReason::default(), ViolationReason::CounterfeitPackaging);
}

#[test]
fn generated_batch_ids_follow_the_scanner_format() {
    for _ in 0..50 {
        let id = BatchId::generate();
        let n: u32 = id.as_str().strip_prefix("BATCH_").unwrap().parse().unwrap();
        assert!(n < 10_000);
    }
}
