//! Pure size resolution: settings + host viewport -> concrete pixel, style,
//! and buffer dimensions plus the logical-unit scale factors.

use crate::foundation::error::{CroquisError, CroquisResult};
use crate::settings::model::{Dimensions, Orientation, Settings, Units};
use crate::settings::presets::lookup_preset;
use kurbo::Size;

/// Host viewport the canvas mounts into: parent bounds plus device pixel
/// ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Parent bounds in logical pixels.
    pub size: Size,
    /// Device pixel ratio reported by the host.
    pub pixel_ratio: f64,
}

impl Viewport {
    /// Viewport with the given bounds and device pixel ratio.
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            size: Size::new(width, height),
            pixel_ratio,
        }
    }
}

impl Default for Viewport {
    /// Fixed fallback bounds for headless hosts with no viewport to report.
    fn default() -> Self {
        Self::new(300.0, 150.0, 1.0)
    }
}

/// Concrete dimensions resolved from [`Settings`] for one canvas mount.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SizeProps {
    /// Working width in logical `units`, bleed included.
    pub width: f64,
    /// Working height in logical `units`, bleed included.
    pub height: f64,
    /// Trim width in logical `units`, before bleed.
    pub trim_width: f64,
    /// Trim height in logical `units`, before bleed.
    pub trim_height: f64,
    /// Bleed margin per side in logical `units`.
    pub bleed: f64,
    /// Units the logical dimensions are expressed in.
    pub units: Units,
    /// Pixel density used for unit conversion.
    pub pixels_per_inch: f64,
    /// Resolved pixel ratio (clamped, export-overridden while exporting).
    pub pixel_ratio: f64,
    /// Raw pixel width of the working size at density 1.
    pub real_width: f64,
    /// Raw pixel height of the working size at density 1.
    pub real_height: f64,
    /// On-screen style width in logical pixels.
    pub style_width: f64,
    /// On-screen style height in logical pixels.
    pub style_height: f64,
    /// Canvas buffer width in device pixels. Always a positive integer.
    pub canvas_width: u32,
    /// Canvas buffer height in device pixels. Always a positive integer.
    pub canvas_height: u32,
    /// Horizontal buffer-pixels-per-logical-unit scale for the context
    /// transform.
    pub scale_x: f64,
    /// Vertical buffer-pixels-per-logical-unit scale.
    pub scale_y: f64,
}

/// Resolve concrete canvas dimensions from settings and host bounds.
///
/// Pure: no state is read or written outside the arguments. `exporting`
/// switches to the export pixel ratio and disables viewport fitting.
pub fn resolve_size(
    settings: &Settings,
    viewport: &Viewport,
    exporting: bool,
) -> CroquisResult<SizeProps> {
    if !(settings.pixels_per_inch.is_finite() && settings.pixels_per_inch > 0.0) {
        return Err(CroquisError::config(format!(
            "pixels_per_inch must be finite and > 0, got {}",
            settings.pixels_per_inch
        )));
    }
    if !(settings.bleed.is_finite() && settings.bleed >= 0.0) {
        return Err(CroquisError::config(format!(
            "bleed must be finite and >= 0, got {}",
            settings.bleed
        )));
    }

    let has_dimensions = settings.dimensions.is_some();
    let (mut trim_width, mut trim_height, units) = match &settings.dimensions {
        None => (
            viewport.size.width.max(1.0),
            viewport.size.height.max(1.0),
            Units::Px,
        ),
        Some(Dimensions::Pair([w, h])) => (*w, *h, settings.units),
        Some(Dimensions::Preset(name)) => {
            let preset = lookup_preset(name)?;
            (
                Units::convert(
                    preset.width,
                    preset.units,
                    settings.units,
                    settings.pixels_per_inch,
                ),
                Units::convert(
                    preset.height,
                    preset.units,
                    settings.units,
                    settings.pixels_per_inch,
                ),
                settings.units,
            )
        }
    };

    if !(trim_width.is_finite() && trim_width > 0.0)
        || !(trim_height.is_finite() && trim_height > 0.0)
    {
        return Err(CroquisError::config(format!(
            "dimensions must be finite and > 0, got {trim_width} x {trim_height}"
        )));
    }

    if has_dimensions {
        match settings.orientation {
            Orientation::Initial => {}
            Orientation::Landscape => {
                if trim_width < trim_height {
                    std::mem::swap(&mut trim_width, &mut trim_height);
                }
            }
            Orientation::Portrait => {
                if trim_height < trim_width {
                    std::mem::swap(&mut trim_width, &mut trim_height);
                }
            }
        }
    }

    // On-screen pixel ratio: explicit wins; with dimensions the device ratio
    // only applies under scale_to_view; fullscreen always tracks the device.
    let mut pixel_ratio = match settings.pixel_ratio {
        Some(pr) => pr,
        None if has_dimensions => {
            if settings.scale_to_view {
                viewport.pixel_ratio
            } else {
                1.0
            }
        }
        None => viewport.pixel_ratio,
    };
    if let Some(max) = settings.max_pixel_ratio {
        pixel_ratio = pixel_ratio.min(max);
    }
    if exporting {
        pixel_ratio = settings
            .export_pixel_ratio
            .unwrap_or(if has_dimensions { 1.0 } else { pixel_ratio });
    }
    if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
        return Err(CroquisError::config(format!(
            "resolved pixel ratio must be finite and > 0, got {pixel_ratio}"
        )));
    }

    let bleed = settings.bleed;
    let width = trim_width + bleed * 2.0;
    let height = trim_height + bleed * 2.0;

    let real_width = units.to_pixels(width, settings.pixels_per_inch);
    let real_height = units.to_pixels(height, settings.pixels_per_inch);

    let mut style_width = real_width;
    let mut style_height = real_height;
    if settings.scale_to_fit && !exporting && has_dimensions {
        let max_size = Size::new(
            (viewport.size.width - settings.scale_to_fit_padding * 2.0).max(1.0),
            (viewport.size.height - settings.scale_to_fit_padding * 2.0).max(1.0),
        );
        if style_width > max_size.width || style_height > max_size.height {
            let aspect = style_width / style_height;
            let window_aspect = max_size.width / max_size.height;
            if window_aspect > aspect {
                // Height is the constraining dimension.
                style_height = max_size.height;
                style_width = (style_height * aspect).round().max(1.0);
            } else {
                style_width = max_size.width;
                style_height = (style_width / aspect).round().max(1.0);
            }
        }
    }

    let use_style = settings.scale_to_view && !exporting;
    let canvas_width = buffer_px(pixel_ratio * if use_style { style_width } else { real_width });
    let canvas_height = buffer_px(pixel_ratio * if use_style { style_height } else { real_height });

    Ok(SizeProps {
        width,
        height,
        trim_width,
        trim_height,
        bleed,
        units,
        pixels_per_inch: settings.pixels_per_inch,
        pixel_ratio,
        real_width,
        real_height,
        style_width,
        style_height,
        canvas_width,
        canvas_height,
        scale_x: f64::from(canvas_width) / width,
        scale_y: f64::from(canvas_height) / height,
    })
}

/// Round to a positive integer buffer dimension.
fn buffer_px(v: f64) -> u32 {
    v.round().max(1.0) as u32
}
