//! Fuzz target: `ControllerConfig::from_json`
//!
//! Feeds arbitrary bytes as a boot-time config literal.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Anything `from_json` accepts also passes `validate()`
//! - An accepted config survives a serialise/parse round trip unchanged
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use vinebot::config::ControllerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = ControllerConfig::from_json(text) else {
        return;
    };
    assert!(cfg.validate().is_ok(), "from_json returned an invalid config");

    let json = serde_json::to_string(&cfg).expect("config serialises");
    let again = ControllerConfig::from_json(&json).expect("round trip parses");
    assert_eq!(cfg, again);
});
