#![no_main]

//! Fuzz target for destination response parsing.
//!
//! Feeds arbitrary bytes through normalization, proxy payload parsing and
//! the BigQuery response transform. None of them may panic.

use ferry_delivery::{
    normalize, parse_dest_response, response::BqStreamHandler, ResponseHandler,
};
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let _ = normalize(&value);
    let _ = parse_dest_response(&value, "bqstream");

    let handler = BqStreamHandler::default();
    let _ = handler.response_transform(&value);

    // Same body wrapped as a well-formed proxy payload, so the handler
    // itself sees the arbitrary response.
    let wrapped = json!({"responseBody": value, "status": 400, "payload": {}});
    let _ = handler.response_transform(&wrapped);
});
