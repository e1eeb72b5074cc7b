//! Fuzz target for JSON-RPC message validation.
//!
//! Run with: cargo +nightly fuzz run fuzz_rpc_parse
//!
//! Feeds arbitrary text through message parsing, per-call validation and
//! parameter binding. Every rejection must carry a standard error code.

#![no_main]

use libfuzzer_sys::fuzz_target;
use switchboard_core::rpc::ErrorCode;
use switchboard_core::rpc::validate::{Incoming, parse_message, validate_call};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let items = match parse_message(raw) {
        Ok(Incoming::Single(value)) => vec![value],
        Ok(Incoming::Batch(items)) => items,
        Err(rejection) => {
            assert!(matches!(
                rejection.error.kind(),
                ErrorCode::ParseError | ErrorCode::InvalidRequest
            ));
            return;
        }
    };

    for item in &items {
        match validate_call(item) {
            Ok(call) => {
                let _ = call.params.bind(&["message"]);
            }
            Err(rejection) => {
                assert_eq!(rejection.error.kind(), ErrorCode::InvalidRequest);
            }
        }
    }
});
