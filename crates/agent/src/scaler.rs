//! Coordinate scaling between what the model sees and the real display.
//!
//! The native resolution is read once per run. The model resolution equals it
//! unless a maximum dimension shrinks the screenshots the model is shown, in
//! which case every screenshot is resized before it reaches a turn and every
//! model point is scaled back up before it reaches the desktop.

use std::io::Cursor;
use std::sync::Arc;

use deskpilot_core::action::{Action, CoordinateSpace, ModelPoint, Resolution};
use deskpilot_core::error::{RemoteError, ScreenshotError};
use deskpilot_core::message::Part;
use deskpilot_core::remote::RemoteDesktop;
use image::ImageFormat;
use image::imageops::FilterType;
use tracing::{debug, info};

const PNG: &str = "image/png";

/// A captured frame at model resolution.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub resolution: Resolution,
}

impl Screenshot {
    pub fn to_part(&self) -> Part {
        Part::image(&self.bytes, self.media_type)
    }
}

#[derive(Clone)]
pub struct CoordinateScaler {
    desktop: Arc<dyn RemoteDesktop>,
    native: Resolution,
    model: Resolution,
}

impl std::fmt::Debug for CoordinateScaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateScaler")
            .field("desktop", &self.desktop.name())
            .field("native", &self.native)
            .field("model", &self.model)
            .finish()
    }
}

impl CoordinateScaler {
    /// Query the desktop for its resolution and derive the model resolution.
    pub async fn connect(
        desktop: Arc<dyn RemoteDesktop>,
        max_dimension: Option<u32>,
    ) -> Result<Self, RemoteError> {
        let reported = desktop.native_resolution().await?;
        let native = Resolution::new(reported.width, reported.height)?;
        let scaler = Self::with_resolutions(desktop, native, max_dimension);
        info!(
            desktop = scaler.desktop.name(),
            native = %scaler.native,
            model = %scaler.model,
            "Coordinate scaler ready"
        );
        Ok(scaler)
    }

    /// Build a scaler for an already known native resolution.
    pub fn with_resolutions(
        desktop: Arc<dyn RemoteDesktop>,
        native: Resolution,
        max_dimension: Option<u32>,
    ) -> Self {
        let model = match max_dimension {
            Some(max) => native.fit_within(max),
            None => native,
        };
        Self {
            desktop,
            native,
            model,
        }
    }

    pub fn native_resolution(&self) -> Resolution {
        self.native
    }

    pub fn model_resolution(&self) -> Resolution {
        self.model
    }

    /// Map a model point onto native pixels, clamped inside the display.
    pub fn to_native(&self, point: ModelPoint) -> (u32, u32) {
        let x = self.scale_axis(point.x, point.space, self.native.width, self.model.width);
        let y = self.scale_axis(point.y, point.space, self.native.height, self.model.height);
        (
            clamp_to(x, self.native.width),
            clamp_to(y, self.native.height),
        )
    }

    /// Convert a distance along one axis into native pixels.
    pub fn scale_length(&self, length: f64, space: CoordinateSpace, vertical: bool) -> f64 {
        let (native, model) = if vertical {
            (self.native.height, self.model.height)
        } else {
            (self.native.width, self.model.width)
        };
        self.scale_axis(length, space, native, model).abs()
    }

    /// Rewrite every point of `action` into native space.
    pub fn resolve_action(&self, action: &Action) -> Action {
        let resolved = action.map_points(|p| {
            let (x, y) = self.to_native(p);
            ModelPoint::new(x as f64, y as f64, CoordinateSpace::Native)
        });
        match (action, resolved) {
            (
                Action::ScrollAt { at: original, .. },
                Action::ScrollAt {
                    at,
                    direction,
                    magnitude,
                },
            ) => Action::ScrollAt {
                at,
                direction,
                magnitude: self
                    .scale_length(magnitude, original.space, direction.is_vertical())
                    .round(),
            },
            (_, other) => other,
        }
    }

    /// Capture the display and bring the frame down to model resolution.
    pub async fn capture_screenshot(&self) -> Result<Screenshot, ScreenshotError> {
        let bytes = self.desktop.capture_screenshot().await?;
        if self.model == self.native {
            // passed through untouched, so label it with what it actually is
            let format = image::guess_format(&bytes)
                .map_err(|e| ScreenshotError::Decode(e.to_string()))?;
            return Ok(Screenshot {
                bytes,
                media_type: format.to_mime_type(),
                resolution: self.native,
            });
        }

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ScreenshotError::Decode(e.to_string()))?;
        let resized = decoded.resize_exact(self.model.width, self.model.height, FilterType::Triangle);

        let mut out = Cursor::new(Vec::new());
        resized
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| ScreenshotError::Encode(e.to_string()))?;

        debug!(
            from = %format!("{}x{}", decoded.width(), decoded.height()),
            to = %self.model,
            "Resized screenshot"
        );

        Ok(Screenshot {
            bytes: out.into_inner(),
            media_type: PNG,
            resolution: self.model,
        })
    }

    fn scale_axis(&self, value: f64, space: CoordinateSpace, native: u32, model: u32) -> f64 {
        match space {
            CoordinateSpace::Normalized => value / 1000.0 * native as f64,
            CoordinateSpace::Percentage => value / 100.0 * native as f64,
            CoordinateSpace::Model => value * native as f64 / model as f64,
            CoordinateSpace::Native => value,
        }
    }
}

fn clamp_to(value: f64, dimension: u32) -> u32 {
    let max = dimension.saturating_sub(1) as f64;
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, max) as u32
}
