#![no_main]
use libfuzzer_sys::{arbitrary, fuzz_target};
use webpbridge::pixel::{AlphaConvention, BufferFormat, ByteOrder, RawImageBuffer};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    width: u8,
    height: u8,
    depth: u8,
    components: u8,
    alpha: u8,
    little_endian: bool,
    row_padding: u8,
    data: Vec<u8>,
}

const ALPHAS: [AlphaConvention; 7] = [
    AlphaConvention::None,
    AlphaConvention::SkipFirst,
    AlphaConvention::SkipLast,
    AlphaConvention::PremultipliedFirst,
    AlphaConvention::PremultipliedLast,
    AlphaConvention::StraightFirst,
    AlphaConvention::StraightLast,
];

fuzz_target!(|input: Input| {
    let depth = [1u8, 2, 4, 8, 16][usize::from(input.depth % 5)];
    let components = 1 + input.components % 3;
    let alpha = ALPHAS[usize::from(input.alpha % 7)];
    let order = if input.little_endian {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    };
    let format = BufferFormat::packed(depth, components, alpha, order);
    let width = u32::from(input.width);
    let height = u32::from(input.height);
    let stride = width as usize * format.bytes_per_pixel() + usize::from(input.row_padding % 8);
    let src = RawImageBuffer::new(&input.data, width, height, stride, format);

    // Rejections are fine; panics and wrong-sized output are not.
    if let Ok(out) = webpbridge::normalize(&src) {
        assert_eq!(out.data.len(), out.bytes_per_row() * out.height as usize);
        assert_eq!((out.width, out.height), (width, height));
        if !alpha.has_alpha() {
            assert!(out.data.chunks_exact(4).all(|px| px[3] == 255));
        }
    }
});
