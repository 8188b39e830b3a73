//! Crop finalization.
//!
//! The user draws the crop region over the image as displayed on screen. The
//! region is mapped back to natural (source) pixels by scaling each axis
//! independently, then rasterized into a new PNG snapshot.

use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

use crate::{Rect, Size, Snapshot, SnapshotOrigin};

/// Largest device pixel ratio accepted for crop output.
pub const MAX_PIXEL_RATIO: f64 = 8.0;

/// Map a rectangle in displayed pixels to natural pixels.
pub fn map_to_natural(rect: Rect, displayed: Size, natural: Size) -> Result<Rect, CropError> {
    if !displayed.is_valid() || !natural.is_valid() {
        return Err(CropError::InvalidDimensions);
    }
    let scale_x = natural.width / displayed.width;
    let scale_y = natural.height / displayed.height;
    Ok(Rect::new(
        rect.x * scale_x,
        rect.y * scale_y,
        rect.width * scale_x,
        rect.height * scale_y,
    ))
}

/// Cut `region` (natural pixels) out of `source` and scale the result by the
/// device pixel ratio.
pub fn rasterize_crop(
    source: &Snapshot,
    region: Rect,
    device_pixel_ratio: f64,
) -> Result<Snapshot, CropError> {
    if !(device_pixel_ratio > 0.0 && device_pixel_ratio <= MAX_PIXEL_RATIO) {
        return Err(CropError::InvalidPixelRatio(device_pixel_ratio));
    }

    let decoded = image::load_from_memory(source.bytes())?;
    let (img_w, img_h) = (decoded.width(), decoded.height());

    let x = region.x.round().clamp(0.0, img_w as f64) as u32;
    let y = region.y.round().clamp(0.0, img_h as f64) as u32;
    let right = region.right().round().clamp(0.0, img_w as f64) as u32;
    let bottom = region.bottom().round().clamp(0.0, img_h as f64) as u32;
    if right <= x || bottom <= y {
        tracing::warn!(region = ?region, img_w, img_h, "crop region is empty after clamping");
        return Err(CropError::EmptyRegion);
    }

    let (w, h) = (right - x, bottom - y);
    let mut cropped = decoded.crop_imm(x, y, w, h);

    if (device_pixel_ratio - 1.0).abs() > f64::EPSILON {
        let out_w = ((w as f64) * device_pixel_ratio).round().max(1.0) as u32;
        let out_h = ((h as f64) * device_pixel_ratio).round().max(1.0) as u32;
        cropped = cropped.resize_exact(out_w, out_h, FilterType::Lanczos3);
    }

    let mut buf = Cursor::new(Vec::new());
    cropped.write_to(&mut buf, ImageFormat::Png)?;

    tracing::debug!(
        x,
        y,
        w,
        h,
        out_w = cropped.width(),
        out_h = cropped.height(),
        "crop rasterized"
    );

    Ok(Snapshot::new(
        source.name(),
        "image/png",
        buf.into_inner(),
        SnapshotOrigin::Crop,
    ))
}

#[derive(Debug, Error)]
pub enum CropError {
    #[error("displayed and natural dimensions must be positive")]
    InvalidDimensions,

    #[error("device pixel ratio must be in (0, {max}], got {0}", max = MAX_PIXEL_RATIO)]
    InvalidPixelRatio(f64),

    #[error("crop region is empty")]
    EmptyRegion,

    #[error("image codec failure: {0}")]
    Codec(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn png_snapshot(width: u32, height: u32) -> Snapshot {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        Snapshot::upload("src.png", buf.into_inner())
    }

    #[test]
    fn test_map_to_natural_scales_axes() {
        let rect = Rect::from_corners(crate::Point::new(100.0, 50.0), crate::Point::new(200.0, 150.0));
        let mapped = map_to_natural(rect, Size::new(500.0, 300.0), Size::new(1000.0, 600.0)).unwrap();
        assert_eq!(mapped, Rect::new(200.0, 100.0, 200.0, 200.0));
        assert_eq!(mapped.right(), 400.0);
        assert_eq!(mapped.bottom(), 300.0);
    }

    #[test]
    fn test_map_to_natural_independent_axes() {
        let rect = Rect::new(10.0, 10.0, 10.0, 10.0);
        let mapped = map_to_natural(rect, Size::new(100.0, 100.0), Size::new(300.0, 200.0)).unwrap();
        assert_eq!(mapped, Rect::new(30.0, 20.0, 30.0, 20.0));
    }

    #[test]
    fn test_map_rejects_zero_display() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            map_to_natural(rect, Size::new(0.0, 10.0), Size::new(10.0, 10.0)),
            Err(CropError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_rasterize_exact_region() {
        let source = png_snapshot(40, 30);
        let out = rasterize_crop(&source, Rect::new(5.0, 5.0, 20.0, 10.0), 1.0).unwrap();
        assert_eq!(out.origin(), SnapshotOrigin::Crop);
        assert_eq!(out.mime(), "image/png");

        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_rasterize_applies_pixel_ratio() {
        let source = png_snapshot(40, 30);
        let out = rasterize_crop(&source, Rect::new(0.0, 0.0, 10.0, 10.0), 2.0).unwrap();
        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 20));
    }

    #[test]
    fn test_rasterize_clamps_and_rejects_empty() {
        let source = png_snapshot(40, 30);
        let out = rasterize_crop(&source, Rect::new(30.0, 20.0, 50.0, 50.0), 1.0).unwrap();
        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));

        assert!(matches!(
            rasterize_crop(&source, Rect::new(50.0, 50.0, 5.0, 5.0), 1.0),
            Err(CropError::EmptyRegion)
        ));
    }

    #[test]
    fn test_rasterize_rejects_out_of_range_pixel_ratio() {
        let source = png_snapshot(4, 4);
        let region = Rect::new(0.0, 0.0, 4.0, 4.0);
        for dpr in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e12, MAX_PIXEL_RATIO + 0.5] {
            assert!(
                matches!(
                    rasterize_crop(&source, region, dpr),
                    Err(CropError::InvalidPixelRatio(_))
                ),
                "dpr {dpr} should be rejected"
            );
        }
        assert!(rasterize_crop(&source, region, MAX_PIXEL_RATIO).is_ok());
    }
}
