use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};

use crate::error::{PipelineError, PipelineResult};
use crate::geometry::Rect;
use crate::image_data::DataUrl;

/// Cuts `rect` (page coordinates) out of a full-viewport screenshot taken at
/// native resolution. The region is scaled by `device_pixel_ratio` and drawn
/// onto a transparent canvas of the scaled size; anything past the edge of the
/// screenshot stays transparent.
pub fn crop(screenshot: &DataUrl, rect: Rect, device_pixel_ratio: f64) -> PipelineResult<DataUrl> {
    let bytes = screenshot.decode().map_err(|err| {
        PipelineError::Crop(format!("failed to load the screenshot image for cropping: {err}"))
    })?;
    let source = image::load_from_memory(&bytes)
        .map_err(|err| {
            PipelineError::Crop(format!("failed to load the screenshot image for cropping: {err}"))
        })?
        .to_rgba8();

    let region = rect.to_device(device_pixel_ratio);
    if region.width == 0 || region.height == 0 {
        return Err(PipelineError::Crop(format!(
            "selection {}x{} has no area",
            region.width, region.height
        )));
    }

    let (src_width, src_height) = source.dimensions();
    if region.width > src_width || region.height > src_height {
        return Err(PipelineError::Crop(format!(
            "selection {}x{} is larger than the {}x{} screenshot",
            region.width, region.height, src_width, src_height
        )));
    }

    let mut canvas = RgbaImage::new(region.width, region.height);
    if region.x < src_width && region.y < src_height {
        let width = region.width.min(src_width - region.x);
        let height = region.height.min(src_height - region.y);
        let visible = imageops::crop_imm(&source, region.x, region.y, width, height).to_image();
        imageops::replace(&mut canvas, &visible, 0, 0);
    }

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|err| PipelineError::Crop(format!("failed to encode cropped image: {err}")))?;

    Ok(DataUrl::from_png(&encoded.into_inner()))
}
