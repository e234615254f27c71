#![no_main]
use libfuzzer_sys::fuzz_target;
use webpbridge::{DecodeRequest, Limits, ScalingMode};

fuzz_target!(|data: &[u8]| {
    // Sniffing and decoding must never panic, whatever the bytes.
    if !webpbridge::is_webp(data) {
        assert!(DecodeRequest::new(data).decode().is_err());
        return;
    }

    let limits = Limits::none()
        .with_max_pixels(1 << 22)
        .with_max_memory(64 * 1024 * 1024);
    let _ = webpbridge::webp_info(data);
    let _ = DecodeRequest::new(data).with_limits(&limits).decode();
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .with_size(33.0, 17.0)
        .with_scaling(ScalingMode::AspectFill)
        .decode();
});
