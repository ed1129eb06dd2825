//! Property tests: classification, mapping and normalization are total.

#![allow(clippy::unwrap_used)]

use ferry_core::OutcomeCategory;
use ferry_delivery::{
    classify, map_system_error, normalize,
    processor::mapping::{construct_payload, MappingField},
    response::{parse_dest_response, BqStreamHandler},
    OutcomeClassifier, ResponseHandler, RetryableStatuses,
};
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        "[a-zA-Z0-9_ ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(
                prop_oneof![
                    Just("response".to_string()),
                    Just("status".to_string()),
                    Just("data".to_string()),
                    Just("error".to_string()),
                    Just("insertErrors".to_string()),
                    "[a-z]{1,6}",
                ],
                inner,
                0..6
            )
            .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

const FIELDS: &[MappingField] = &[
    MappingField::required("id", &["userId", "context.traits.userId"]),
    MappingField::optional("email", &["traits.email", "context.traits.email"]),
    MappingField::optional("first", &["data.0"]),
];

proptest! {
    #[test]
    fn classification_is_total_and_never_success(status in any::<u16>()) {
        let category = classify(status);
        prop_assert_ne!(category, OutcomeCategory::Success);
        prop_assert_eq!(category, classify(status));
        if status == 429 {
            prop_assert_eq!(category, OutcomeCategory::Throttled);
        }
    }

    #[test]
    fn throttling_survives_any_retryable_set(
        statuses in prop::collection::vec(any::<u16>(), 0..20)
    ) {
        let classifier = OutcomeClassifier::new(RetryableStatuses::new(statuses));
        prop_assert_eq!(classifier.classify(429), OutcomeCategory::Throttled);
    }

    #[test]
    fn system_error_mapping_is_total(code in "[A-Z]{0,12}") {
        let mapped = map_system_error(&code);
        prop_assert!(mapped.status == 400 || mapped.status == 500);
        let prefix = format!("[{code}]");
        prop_assert!(mapped.message.starts_with(&prefix));
    }

    #[test]
    fn normalization_never_panics(raw in arb_json()) {
        let normalized = normalize(&raw);
        prop_assert_eq!(normalized.clone(), normalize(&raw));
    }

    #[test]
    fn mapping_is_deterministic(message in arb_json()) {
        let first = construct_payload(&message, FIELDS);
        prop_assert_eq!(first.clone(), construct_payload(&message, FIELDS));
        if let Some(payload) = first {
            prop_assert!(payload.contains_key("id"));
        }
    }

    #[test]
    fn response_parsing_never_panics(proxy in arb_json()) {
        if let Err(error) = parse_dest_response(&proxy, "bqstream") {
            prop_assert_eq!(error.status(), 400);
        }
    }

    #[test]
    fn bqstream_failures_always_carry_failure_status(body in arb_json()) {
        match BqStreamHandler::default().handle(&body, None) {
            Ok(result) => prop_assert_eq!(result.status(), 200),
            Err(error) => {
                prop_assert!(error.status() == 400 || error.status() == 500);
                prop_assert!(error.result().is_failure());
            },
        }
    }
}
