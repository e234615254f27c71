//! Encode/decode round trips through the bundled libwebp.
#![cfg(feature = "libwebp")]

use std::io::Write;

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};
use rstest::rstest;
use webpbridge::pixel::{AlphaConvention, BufferFormat, ByteOrder, RawImageBuffer};
use webpbridge::{
    Bitmap, DecodeRequest, EncodeRequest, PixelFormat, Preset, ScalingMode, Size, WebpError,
    decode_file, is_webp, is_webp_file, webp_info, webp_size, webp_size_at,
};

fn gradient_rgb(width: usize, height: usize) -> ImgVec<RGB8> {
    let buf = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            RGB8::new((x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 90)
        })
        .collect();
    ImgVec::new(buf, width, height)
}

fn gradient_rgba(width: usize, height: usize) -> ImgVec<RGBA8> {
    let buf = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            RGBA8::new(200, (x * 7) as u8, (y * 3) as u8, ((x + y) * 5) as u8)
        })
        .collect();
    ImgVec::new(buf, width, height)
}

#[rstest]
#[case(1, 1)]
#[case(3, 7)]
#[case(128, 64)]
#[case(17, 300)]
fn dimensions_survive_round_trip(#[case] width: usize, #[case] height: usize) {
    let img = gradient_rgb(width, height);
    let webp = EncodeRequest::lossy(Preset::Photo, 75.0).encode(&img).unwrap();
    assert!(is_webp(&webp));
    let bitmap = DecodeRequest::new(&webp).decode().unwrap();
    assert_eq!(
        (bitmap.width(), bitmap.height()),
        (width as u32, height as u32)
    );
}

#[test]
fn lossless_opaque_pixels_are_exact() {
    let img = gradient_rgb(32, 16);
    let webp = EncodeRequest::lossless(6).encode(&img).unwrap();
    let bitmap = DecodeRequest::new(&webp).decode().unwrap();
    assert!(!bitmap.has_alpha());
    assert_eq!(bitmap.pixel_format(), Some(PixelFormat::Rgbx));
    let decoded = bitmap.to_imgvec();
    for (src, out) in img.pixels().zip(decoded.pixels()) {
        assert_eq!((src.r, src.g, src.b, 255), (out.r, out.g, out.b, out.a));
    }
}

#[test]
fn alpha_is_reported_and_premultiplied() {
    let img = gradient_rgba(16, 16);
    let webp = EncodeRequest::lossless(9).with_exact(true).encode(&img).unwrap();
    let info = webp_info(&webp).unwrap();
    assert!(info.has_alpha);
    assert!(!info.has_animation);

    let bitmap = DecodeRequest::new(&webp).decode().unwrap();
    assert_eq!(bitmap.alpha(), AlphaConvention::PremultipliedLast);
    for px in bitmap.pixels().chunks_exact(4) {
        let a = px[3];
        assert!(px[0] <= a && px[1] <= a && px[2] <= a, "{px:?}");
    }
}

#[rstest]
#[case(Some(64.0), None, ScalingMode::AspectFit, Size::new(64, 32))]
#[case(Some(75.0), Some(32.0), ScalingMode::AspectFit, Size::new(64, 32))]
#[case(Some(75.0), Some(32.0), ScalingMode::AspectFill, Size::new(75, 37))]
#[case(Some(40.0), Some(40.0), ScalingMode::Scale, Size::new(40, 40))]
fn scaled_decode(
    #[case] width: Option<f64>,
    #[case] height: Option<f64>,
    #[case] mode: ScalingMode,
    #[case] expected: Size,
) {
    let webp = EncodeRequest::default().encode(&gradient_rgb(128, 64)).unwrap();
    let mut request = DecodeRequest::new(&webp).with_scaling(mode);
    if let Some(w) = width {
        request = request.with_width(w);
    }
    if let Some(h) = height {
        request = request.with_height(h);
    }
    let bitmap = request.decode().unwrap();
    assert_eq!(Size::new(bitmap.width(), bitmap.height()), expected);
}

#[test]
fn native_bgra_is_encoded_directly() {
    // B, G, R, A premultiplied, as compositors store it
    let data: Vec<u8> = [40u8, 80, 120, 255].repeat(8 * 8);
    let src = RawImageBuffer::packed(&data, 8, 8, BufferFormat::bgra8_premultiplied());
    let webp = EncodeRequest::lossless(1).encode(&src).unwrap();
    let bitmap = DecodeRequest::new(&webp).decode().unwrap();
    assert_eq!(&bitmap.pixels()[..4], &[120, 80, 40, 255]);
}

#[test]
fn sixteen_bit_gray_is_normalized_then_encoded() {
    let data: Vec<u8> = (0..6 * 4u16)
        .flat_map(|i| (i * 2000).to_le_bytes())
        .collect();
    let format = BufferFormat::packed(16, 1, AlphaConvention::None, ByteOrder::Little);
    let src = RawImageBuffer::packed(&data, 6, 4, format);
    let webp = EncodeRequest::lossless(3).encode(&src).unwrap();
    assert_eq!(webp_size(&webp), Some(Size::new(6, 4)));
}

#[test]
fn truncated_stream_fails_with_codec_status() {
    let webp = EncodeRequest::default().encode(&gradient_rgb(64, 64)).unwrap();
    let err = DecodeRequest::new(&webp[..20]).decode().unwrap_err();
    assert!(
        matches!(err, WebpError::NotEnoughData | WebpError::BitstreamError),
        "{err:?}"
    );
}

#[test]
fn files_are_sniffed_and_decoded() {
    let webp = EncodeRequest::lossless(2).encode(&gradient_rgb(10, 5)).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let named = dir.path().join("image.bin");
    std::fs::File::create(&named)
        .unwrap()
        .write_all(&webp)
        .unwrap();
    assert!(is_webp_file(&named, false));
    assert!(is_webp_file(&named, true));
    assert_eq!(webp_size_at(&named), Some(Size::new(10, 5)));

    let bitmap = decode_file(&named).unwrap();
    assert_eq!((bitmap.width(), bitmap.height()), (10, 5));

    let fake = dir.path().join("fake.webp");
    std::fs::write(&fake, b"not really a webp").unwrap();
    assert!(is_webp_file(&fake, false));
    assert!(!is_webp_file(&fake, true));
    assert!(matches!(decode_file(&fake), Err(WebpError::InvalidHeader)));

    let tiny = dir.path().join("tiny.webp");
    std::fs::write(&tiny, b"RIFF").unwrap();
    assert!(matches!(decode_file(&tiny), Err(WebpError::InvalidHeader)));
    assert_eq!(webp_size_at(&tiny), None);
}

#[test]
fn normalized_and_direct_paths_agree_on_size() {
    let img = gradient_rgba(9, 9);
    let direct = EncodeRequest::lossless(4).encode(&img).unwrap();

    let bytes: Vec<u8> = img
        .pixels()
        .flat_map(|p| [p.a, p.r, p.g, p.b])
        .collect();
    let argb = BufferFormat::packed(8, 3, AlphaConvention::StraightFirst, ByteOrder::Big);
    let normalized = EncodeRequest::lossless(4)
        .encode(&RawImageBuffer::packed(&bytes, 9, 9, argb))
        .unwrap();

    assert_eq!(webp_size(&direct), webp_size(&normalized));
}
