#![no_main]
use dyna_pack::{parse_tag, PARTITION_KEY};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(tag) = std::str::from_utf8(data) {
        let (name, options) = parse_tag(tag);
        assert!(!name.contains(','));
        assert!(options.iter().all(|o| !o.is_empty() && !o.contains(',')));
        let _ = options.contains(PARTITION_KEY);
    }
});
