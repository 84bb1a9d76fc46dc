//! Pixel transforms for the single-step operations.

use image::imageops::FilterType;
use image::DynamicImage;

use super::geometry::{centre_offset, plan_resize, ResizePlan};
use crate::error::ImageError;
use crate::types::{CropParams, FilterKind, FilterParams, ResizeParams, RotateParams, Rotation};

const BLUR_SIGMA: f32 = 5.0;
const SHARPEN_SIGMA: f32 = 1.0;

pub(crate) fn resize(image: &DynamicImage, params: &ResizeParams) -> Result<DynamicImage, ImageError> {
    params.validate()?;
    let plan = plan_resize(
        (image.width(), image.height()),
        params.width,
        params.height,
        params.fit,
    );

    let resized = match plan {
        ResizePlan::Scale { width, height } => scale(image, width, height),
        ResizePlan::ScaleAndCrop {
            width,
            height,
            crop_width,
            crop_height,
        } => scale(image, width, height).crop_imm(
            centre_offset(width, crop_width),
            centre_offset(height, crop_height),
            crop_width,
            crop_height,
        ),
        ResizePlan::ScaleAndPad {
            width,
            height,
            canvas_width,
            canvas_height,
        } => {
            let scaled = scale(image, width, height);
            let mut canvas = DynamicImage::new_rgba8(canvas_width, canvas_height);
            image::imageops::overlay(
                &mut canvas,
                &scaled,
                i64::from(centre_offset(canvas_width, width)),
                i64::from(centre_offset(canvas_height, height)),
            );
            canvas
        }
    };
    Ok(resized)
}

fn scale(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if (image.width(), image.height()) == (width, height) {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }
}

pub(crate) fn crop(image: &DynamicImage, params: &CropParams) -> Result<DynamicImage, ImageError> {
    let region = params.region()?;
    let right = u64::from(region.left) + u64::from(region.width);
    let bottom = u64::from(region.top) + u64::from(region.height);
    if right > u64::from(image.width()) || bottom > u64::from(image.height()) {
        return Err(ImageError::Validation(format!(
            "Crop region exceeds image bounds ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(image.crop_imm(region.left, region.top, region.width, region.height))
}

pub(crate) fn rotate(image: &DynamicImage, params: &RotateParams) -> DynamicImage {
    match params.angle {
        Rotation::Deg90 => image.rotate90(),
        Rotation::Deg180 => image.rotate180(),
        Rotation::Deg270 => image.rotate270(),
    }
}

pub(crate) fn filter(image: &DynamicImage, params: &FilterParams) -> DynamicImage {
    match params.filter {
        FilterKind::Blur => image.blur(BLUR_SIGMA),
        FilterKind::Sharpen => image.unsharpen(SHARPEN_SIGMA, 0),
        FilterKind::Grayscale => image.grayscale(),
    }
}
