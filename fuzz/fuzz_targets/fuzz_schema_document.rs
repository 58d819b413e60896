#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(document) = conftree::SchemaDocument::from_yaml_str(text) {
        let _ = document.generate(&conftree::Node::new("root"));
    }
});
