//! Pure resize geometry.
//!
//! Nothing here touches pixels; the functions turn a source size and a
//! requested box into the concrete scale/crop/pad steps for each fit mode.
//! Outputs never exceed the source dimensions.

use crate::types::FitMode;

/// Concrete steps for one resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Scale to exactly `width` x `height`.
    Scale { width: u32, height: u32 },
    /// Scale, then centre-crop to the crop size.
    ScaleAndCrop {
        width: u32,
        height: u32,
        crop_width: u32,
        crop_height: u32,
    },
    /// Scale, then centre on a canvas of the canvas size.
    ScaleAndPad {
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },
}

impl ResizePlan {
    /// Final output dimensions.
    #[must_use]
    pub fn output(self) -> (u32, u32) {
        match self {
            Self::Scale { width, height } => (width, height),
            Self::ScaleAndCrop {
                crop_width,
                crop_height,
                ..
            } => (crop_width, crop_height),
            Self::ScaleAndPad {
                canvas_width,
                canvas_height,
                ..
            } => (canvas_width, canvas_height),
        }
    }
}

/// Computes the requested box, filling a missing side from the source aspect
/// ratio. Returns the source size when neither side is given.
#[must_use]
pub fn target_box(source: (u32, u32), width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let (src_w, src_h) = source;
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scaled_dim(f64::from(src_h) * f64::from(w) / f64::from(src_w))),
        (None, Some(h)) => (scaled_dim(f64::from(src_w) * f64::from(h) / f64::from(src_h)), h),
        (None, None) => source,
    }
}

/// Plans a resize of `source` for the requested dimensions and fit mode.
///
/// The requested box is clamped to the source size first, so no fit mode
/// ever enlarges the image.
#[must_use]
pub fn plan_resize(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    fit: FitMode,
) -> ResizePlan {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (box_w, box_h) = target_box((src_w, src_h), width, height);
    let (box_w, box_h) = (box_w.clamp(1, src_w), box_h.clamp(1, src_h));

    let ratio_w = f64::from(box_w) / f64::from(src_w);
    let ratio_h = f64::from(box_h) / f64::from(src_h);
    let scale = |factor: f64| {
        (
            scaled_dim(f64::from(src_w) * factor).min(src_w),
            scaled_dim(f64::from(src_h) * factor).min(src_h),
        )
    };

    match fit {
        FitMode::Fill => ResizePlan::Scale {
            width: box_w,
            height: box_h,
        },
        FitMode::Inside => {
            let (width, height) = scale(ratio_w.min(ratio_h));
            ResizePlan::Scale { width, height }
        }
        FitMode::Outside => {
            let (width, height) = scale(ratio_w.max(ratio_h));
            ResizePlan::Scale { width, height }
        }
        FitMode::Cover => {
            let (width, height) = scale(ratio_w.max(ratio_h));
            ResizePlan::ScaleAndCrop {
                width,
                height,
                crop_width: box_w.min(width),
                crop_height: box_h.min(height),
            }
        }
        FitMode::Contain => {
            let (width, height) = scale(ratio_w.min(ratio_h));
            ResizePlan::ScaleAndPad {
                width,
                height,
                canvas_width: box_w,
                canvas_height: box_h,
            }
        }
    }
}

/// Offset that centres `inner` within `outer`.
#[must_use]
pub fn centre_offset(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_dim(value: f64) -> u32 {
    (value.round() as u32).max(1)
}
