//! Roundtrip encoding/decoding tests for blockcodec

mod common;

use blockcodec::{
    ChannelData, CodecConfig, Error, Image, Stage, Subsampling, ZeroDivisorPolicy,
};
use common::{gradient, max_abs_error, mean_abs_error, to_bytes, uniform};

fn roundtrip(source: &imgref::ImgVec<rgb::RGB8>, config: CodecConfig) -> imgref::ImgVec<rgb::RGB8> {
    let mut image = Image::new(source.clone(), config).unwrap();
    image.encode().unwrap();
    assert_eq!(image.stage(), Some(Stage::Zigzag));
    image.decode().unwrap();
    assert_eq!(image.stage(), None);
    image.into_raster().unwrap()
}

#[test]
fn test_solid_color_q100_420() {
    let source = uniform(16, 16, 200, 60, 30);
    let config = CodecConfig::new()
        .quality(100.0)
        .subsampling("4:2:0")
        .zero_divisor(ZeroDivisorPolicy::ClampToOne);

    let decoded = roundtrip(&source, config);
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
    let max = max_abs_error(source.as_ref(), decoded.as_ref());
    assert!(max <= 2, "Solid color deviation too high: {}", max);
}

#[test]
fn test_gray_survives_every_ratio() {
    for ratio in ["4:4:4", "4:2:2", "4:2:0"] {
        let source = uniform(32, 32, 128, 128, 128);
        let decoded = roundtrip(&source, CodecConfig::new().quality(90.0).subsampling(ratio));
        let max = max_abs_error(source.as_ref(), decoded.as_ref());
        assert!(max <= 2, "{}: gray deviation {}", ratio, max);
    }
}

#[test]
fn test_gradient_q75() {
    let source = gradient(64, 64);
    let decoded = roundtrip(&source, CodecConfig::new().quality(75.0));
    let mae = mean_abs_error(source.as_ref(), decoded.as_ref());
    assert!(mae < 12.0, "Gradient mean error too high: {:.2}", mae);
}

#[test]
fn test_q100_444_near_lossless() {
    let source = gradient(32, 32);
    let config = CodecConfig::new()
        .quality(100.0)
        .subsampling(Subsampling::S444)
        .zero_divisor(ZeroDivisorPolicy::ClampToOne);
    let decoded = roundtrip(&source, config);
    let mae = mean_abs_error(source.as_ref(), decoded.as_ref());
    assert!(mae < 3.0, "Unit divisors lost too much: {:.2}", mae);
}

#[test]
fn test_from_bytes_matches_from_raster() {
    let source = gradient(16, 16);
    let bytes = to_bytes(source.as_ref());

    let mut a = Image::from_rgb_bytes(&bytes, 16, 16, CodecConfig::new()).unwrap();
    let mut b = Image::from_rgb(source.as_ref(), CodecConfig::new()).unwrap();
    a.encode().unwrap();
    b.encode().unwrap();
    for i in 0..3 {
        assert_eq!(
            a.channel(i).and_then(ChannelData::quantized_blocks),
            b.channel(i).and_then(ChannelData::quantized_blocks)
        );
    }
}

#[test]
fn test_various_block_sizes() {
    for (n, size) in [(4, 16), (8, 32), (16, 32)] {
        let source = gradient(size, size);
        let config = CodecConfig::new().quality(80.0).block_size(n);
        let mut image = Image::new(source.clone(), config).unwrap();
        image.encode().unwrap();

        let grid = image.channel(0).and_then(ChannelData::quantized_blocks).unwrap();
        assert_eq!(grid.block_size(), n);
        assert_eq!(grid.total_blocks(), (size / n) * (size / n));

        image.decode().unwrap();
        let mae = mean_abs_error(source.as_ref(), image.raster().unwrap());
        assert!(mae < 15.0, "N={}: mean error {:.2}", n, mae);
    }
}

#[test]
fn test_tiling_is_lossless_stage() {
    let source = gradient(32, 16);

    let mut shallow = Image::new(source.clone(), CodecConfig::new()).unwrap();
    shallow.encode_through(Stage::Subsample).unwrap();
    shallow.decode().unwrap();

    let mut deeper = Image::new(source, CodecConfig::new()).unwrap();
    deeper.encode_through(Stage::BlockTile).unwrap();
    deeper.decode_from(Stage::BlockTile).unwrap();

    assert_eq!(shallow.raster().unwrap().buf(), deeper.raster().unwrap().buf());
}

#[test]
fn test_encode_in_steps_matches_full_encode() {
    let source = gradient(32, 32);

    let mut stepped = Image::new(source.clone(), CodecConfig::new()).unwrap();
    for stage in Stage::ALL {
        stepped.encode_through(stage).unwrap();
        assert_eq!(stepped.stage(), Some(stage));
    }

    let mut direct = Image::new(source, CodecConfig::new()).unwrap();
    direct.encode().unwrap();

    for i in 0..3 {
        assert_eq!(
            stepped.channel(i).and_then(ChannelData::quantized_blocks),
            direct.channel(i).and_then(ChannelData::quantized_blocks)
        );
    }
}

#[test]
fn test_zero_divisor_rejected_without_mutation() {
    let source = gradient(16, 16);
    let config = CodecConfig::new().quality(100.0);
    let mut image = Image::new(source.clone(), config).unwrap();

    let err = image.encode().unwrap_err();
    assert!(matches!(err, Error::ZeroQuantDivisor { plane: 0, .. }), "got {:?}", err);
    assert_eq!(image.stage(), None);
    assert!(image.channels().is_none());
    assert_eq!(image.raster().unwrap().buf(), source.as_ref().buf());
}

#[test]
fn test_decode_from_wrong_stage() {
    let mut image = Image::new(gradient(16, 16), CodecConfig::new()).unwrap();
    image.encode_through(Stage::ForwardTransform).unwrap();

    let err = image.decode_from(Stage::Zigzag).unwrap_err();
    assert_eq!(
        err,
        Error::StageMismatch {
            expected: Some(Stage::Zigzag),
            found: Some(Stage::ForwardTransform),
        }
    );
    assert_eq!(image.stage(), Some(Stage::ForwardTransform));
    assert!(err.to_string().contains("forward-transform"));
}

#[test]
fn test_invalid_configurations_fail_up_front() {
    let source = gradient(16, 16);
    assert!(matches!(
        Image::new(source.clone(), CodecConfig::new().quality(0.0)),
        Err(Error::InvalidQuality { .. })
    ));
    assert_eq!(
        Image::new(source.clone(), CodecConfig::new().dynamic(true)).unwrap_err(),
        Error::MissingSaliencyMap
    );
    assert!(matches!(
        Image::new(gradient(24, 24), CodecConfig::new().subsampling("4:2:0")),
        Err(Error::InvalidDimensions { .. })
    ));
    assert!(Image::new(gradient(24, 24), CodecConfig::new().subsampling("4:4:4")).is_ok());
}
