#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(mapping) = conftree::source::codec::decode_json(&text, "fuzz.json") {
        // Re-encoding a decoded document must succeed
        let encoded = conftree::source::codec::encode_json(&mapping);
        assert!(encoded.is_ok());
    }
    let _ = conftree::source::codec::decode_yaml(&text, "fuzz.yaml");
});
