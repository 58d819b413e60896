#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Anything that parses must also build a tree and render without panicking
    if let Ok(mapping) = conftree::source::text::parse(text, "fuzz.conf")
        && let Ok(node) = conftree::Node::from_mapping("root", mapping)
    {
        let _ = conftree::source::text::render(&node);
    }
});
