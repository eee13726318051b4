#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Auto-detect decode and each explicit entry point — must never panic.
    let _ = zenargb::decode(data);
    let _ = zenargb::decode_bmp(data);
    let _ = zenargb::decode_bmp_in_ico(data);
    let _ = zenargb::decode_png(data);
});
