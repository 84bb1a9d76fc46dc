use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImageError;

/// Closed set of operation names understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Resize,
    Crop,
    Format,
    Rotate,
    Filter,
    Pipeline,
}

impl OperationKind {
    /// Every operation kind, in the order endpoints are exposed.
    pub const ALL: [OperationKind; 6] = [
        Self::Resize,
        Self::Crop,
        Self::Format,
        Self::Rotate,
        Self::Filter,
        Self::Pipeline,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
            Self::Format => "format",
            Self::Rotate => "rotate",
            Self::Filter => "filter",
            Self::Pipeline => "pipeline",
        }
    }
}

impl FromStr for OperationKind {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ImageError::UnsupportedOperation(format!("Unknown operation type: {s}")))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resize maps the source onto the requested box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to cover the box, cropping the overflow.
    #[default]
    Cover,
    /// Scale to fit inside the box, padding the remainder.
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
    /// Scale to fit inside the box.
    Inside,
    /// Scale until both sides reach the box.
    Outside,
}

/// Encodings the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// MIME type for responses carrying this format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    #[must_use]
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(ImageError::UnsupportedOperation(format!(
                "Unsupported format: {other}"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clockwise quarter-turn rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u16")]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    #[must_use]
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<f64> for Rotation {
    type Error = ImageError;

    #[allow(clippy::float_cmp)]
    fn try_from(angle: f64) -> Result<Self, Self::Error> {
        if angle == 90.0 {
            Ok(Self::Deg90)
        } else if angle == 180.0 {
            Ok(Self::Deg180)
        } else if angle == 270.0 {
            Ok(Self::Deg270)
        } else {
            Err(ImageError::validation("Angle must be 90, 180, or 270 degrees"))
        }
    }
}

/// Visual filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Blur,
    Sharpen,
    Grayscale,
}

impl FromStr for FilterKind {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blur" => Ok(Self::Blur),
            "sharpen" => Ok(Self::Sharpen),
            "grayscale" => Ok(Self::Grayscale),
            other => Err(ImageError::validation(format!("Unsupported filter: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-operation parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub fit: FitMode,
}

impl ResizeParams {
    /// Checks that at least one non-zero dimension was requested.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Validation` when both dimensions are absent or
    /// either is zero.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.width.is_none() && self.height.is_none() {
            return Err(ImageError::validation(
                "At least width or height must be provided",
            ));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ImageError::validation("Resize dimensions must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropParams {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A validated crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropParams {
    /// Converts the raw numbers into a pixel rectangle.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Validation` if any value is not a finite,
    /// non-negative whole number, or if the region is empty.
    pub fn region(&self) -> Result<CropRegion, ImageError> {
        let region = CropRegion {
            left: pixel_coordinate(self.left)?,
            top: pixel_coordinate(self.top)?,
            width: pixel_coordinate(self.width)?,
            height: pixel_coordinate(self.height)?,
        };
        if region.width == 0 || region.height == 0 {
            return Err(ImageError::validation("Crop width and height must be positive"));
        }
        Ok(region)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_coordinate(value: f64) -> Result<u32, ImageError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ImageError::validation(
            "Crop parameters must be valid non-negative whole numbers",
        ));
    }
    Ok(value as u32)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatParams {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotateParams {
    pub angle: Rotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterParams {
    pub filter: FilterKind,
}

/// One named step of a pipeline, kept in its raw form until the pipeline is
/// planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "empty_object")]
    pub params: Value,
}

impl PipelineStep {
    #[must_use]
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub operations: Vec<PipelineStep>,
}

// ---------------------------------------------------------------------------
// OperationParams
// ---------------------------------------------------------------------------

/// Typed parameters for one operation. The variant is the operation name.
///
/// Serializes untagged, i.e. as the bare parameter object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationParams {
    Resize(ResizeParams),
    Crop(CropParams),
    Format(FormatParams),
    Rotate(RotateParams),
    Filter(FilterParams),
    Pipeline(PipelineParams),
}

#[derive(Deserialize)]
struct RawFormat {
    format: Option<String>,
}

#[derive(Deserialize)]
struct RawRotate {
    angle: Option<f64>,
}

#[derive(Deserialize)]
struct RawFilter {
    filter: Option<String>,
}

#[derive(Deserialize)]
struct RawPipeline {
    operations: Option<Vec<PipelineStep>>,
}

impl OperationParams {
    /// Parses the raw JSON parameter object for `kind`.
    ///
    /// A JSON `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// - `ImageError::Validation` for missing, mistyped or out-of-range fields
    /// - `ImageError::UnsupportedOperation` for an output format outside
    ///   jpeg/png/webp
    pub fn parse(kind: OperationKind, raw: &Value) -> Result<Self, ImageError> {
        let raw = match raw {
            Value::Null => empty_object(),
            Value::Object(_) => raw.clone(),
            _ => {
                return Err(ImageError::validation(format!(
                    "{kind} parameters must be an object"
                )))
            }
        };

        match kind {
            OperationKind::Resize => {
                let params: ResizeParams = from_raw(kind, raw)?;
                params.validate()?;
                Ok(Self::Resize(params))
            }
            OperationKind::Crop => {
                let params: CropParams = from_raw(kind, raw)?;
                params.region()?;
                Ok(Self::Crop(params))
            }
            OperationKind::Format => {
                let RawFormat { format } = from_raw(kind, raw)?;
                let format = format
                    .ok_or_else(|| ImageError::validation("format is required"))?
                    .parse()?;
                Ok(Self::Format(FormatParams { format }))
            }
            OperationKind::Rotate => {
                let RawRotate { angle } = from_raw(kind, raw)?;
                let angle = angle
                    .ok_or_else(|| ImageError::validation("angle is required"))?
                    .try_into()?;
                Ok(Self::Rotate(RotateParams { angle }))
            }
            OperationKind::Filter => {
                let RawFilter { filter } = from_raw(kind, raw)?;
                let filter = filter
                    .ok_or_else(|| ImageError::validation("filter is required"))?
                    .parse()?;
                Ok(Self::Filter(FilterParams { filter }))
            }
            OperationKind::Pipeline => {
                let RawPipeline { operations } = from_raw(kind, raw)?;
                match operations {
                    Some(operations) if !operations.is_empty() => {
                        Ok(Self::Pipeline(PipelineParams { operations }))
                    }
                    _ => Err(ImageError::validation("Operations array is required")),
                }
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Resize(_) => OperationKind::Resize,
            Self::Crop(_) => OperationKind::Crop,
            Self::Format(_) => OperationKind::Format,
            Self::Rotate(_) => OperationKind::Rotate,
            Self::Filter(_) => OperationKind::Filter,
            Self::Pipeline(_) => OperationKind::Pipeline,
        }
    }

    /// Output format tag for a response produced from these parameters.
    ///
    /// Only `format` declares one; everything else reports `jpeg`.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Self::Format(params) => params.format,
            _ => OutputFormat::Jpeg,
        }
    }

    /// The parameters as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn from_raw<T: DeserializeOwned>(kind: OperationKind, raw: Value) -> Result<T, ImageError> {
    serde_json::from_value(raw)
        .map_err(|e| ImageError::validation(format!("Invalid {kind} parameters: {e}")))
}
