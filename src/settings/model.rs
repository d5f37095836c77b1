//! The configuration schema: an explicit struct with named optional fields
//! and defaults, loadable from JSON, plus load-time timing resolution.

use crate::foundation::error::{CroquisError, CroquisResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Physical or logical measurement units for sketch dimensions.
///
/// Conversions are anchored on inches via `pixels_per_inch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Raw pixels (no physical meaning).
    Px,
    /// Points, 1/72 in.
    Pt,
    /// Picas, 1/6 in.
    Pc,
    /// Inches.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// Meters.
    M,
    /// Feet.
    Ft,
}

impl Units {
    /// Number of pixels in one of this unit at the given density.
    pub(crate) fn pixels_per_unit(self, pixels_per_inch: f64) -> f64 {
        match self {
            Self::Px => 1.0,
            Self::Pt => pixels_per_inch / 72.0,
            Self::Pc => pixels_per_inch / 6.0,
            Self::In => pixels_per_inch,
            Self::Cm => pixels_per_inch / 2.54,
            Self::Mm => pixels_per_inch / 25.4,
            Self::M => pixels_per_inch * (100.0 / 2.54),
            Self::Ft => pixels_per_inch * 12.0,
        }
    }

    /// Convert a value in this unit to raw pixels.
    pub fn to_pixels(self, value: f64, pixels_per_inch: f64) -> f64 {
        value * self.pixels_per_unit(pixels_per_inch)
    }

    /// Convert a value between two units at the given density.
    ///
    /// Physical-to-physical conversions are independent of
    /// `pixels_per_inch`; it only matters when `px` is involved.
    pub fn convert(value: f64, from: Self, to: Self, pixels_per_inch: f64) -> f64 {
        value * from.pixels_per_unit(pixels_per_inch) / to.pixels_per_unit(pixels_per_inch)
    }
}

/// Sketch dimensions: an explicit pixel/unit pair or a named paper preset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Dimensions {
    /// Explicit `[width, height]` in [`Settings::units`].
    Pair([f64; 2]),
    /// Named paper-size preset, looked up case/hyphen/space-insensitively.
    Preset(String),
}

/// Canvas orientation applied after dimension resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Keep dimensions exactly as resolved.
    #[default]
    Initial,
    /// Ensure `width >= height`, swapping if needed.
    Landscape,
    /// Ensure `height >= width`, swapping if needed.
    Portrait,
}

/// Pacing mode for the animation clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackRate {
    /// Advance by real elapsed wall time.
    #[default]
    Normal,
    /// Advance by exactly one frame interval per tick, regardless of wall time.
    Fixed,
    /// Advance only once at least one frame interval has elapsed, absorbing
    /// drift exactly; shorter ticks are skipped entirely.
    Throttle,
}

/// User-supplied sketch configuration. Largely immutable per load; runtime
/// changes go through [`SettingsPatch`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Canvas dimensions. `None` sizes the canvas to the host viewport.
    pub dimensions: Option<Dimensions>,
    /// Measurement units for `dimensions` and `bleed`.
    pub units: Units,
    /// Pixel density used for physical-unit conversion.
    pub pixels_per_inch: f64,
    /// Orientation applied after dimension resolution.
    pub orientation: Orientation,

    /// Explicit on-screen pixel ratio. Wins over the device ratio.
    pub pixel_ratio: Option<f64>,
    /// Upper clamp applied to the resolved pixel ratio.
    pub max_pixel_ratio: Option<f64>,
    /// Pixel ratio used while exporting instead of the on-screen ratio.
    pub export_pixel_ratio: Option<f64>,

    /// Shrink the on-screen style size to fit the viewport, preserving aspect.
    pub scale_to_fit: bool,
    /// Render the canvas buffer at the on-screen style size times pixel ratio.
    pub scale_to_view: bool,
    /// Padding in pixels kept on each side when fitting to the viewport.
    pub scale_to_fit_padding: f64,
    /// Extra margin added symmetrically around the trim size, in `units`.
    pub bleed: f64,

    /// Frames per second of the animation clock.
    pub fps: f64,
    /// Total animation length in seconds. Mutually derivable with
    /// `total_frames`; supplying both requires agreement after fps-rounding.
    pub duration: Option<f64>,
    /// Total animation length in frames.
    pub total_frames: Option<u64>,
    /// Start time in seconds. Mutually exclusive with `frame` unless they
    /// agree.
    pub time: Option<f64>,
    /// Start frame index.
    pub frame: Option<u64>,
    /// Multiplier applied to each tick's delta time. May be negative.
    pub time_scale: f64,
    /// Wrap around at the end of a finite duration instead of pausing.
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    /// Pacing mode for the animation clock.
    pub playback_rate: PlaybackRate,
    /// Advance time on [`animate`](crate::session::SketchManager::animate)
    /// pumps. When false the sketch is static.
    pub animate: bool,
    /// Initial playing state of an animated sketch.
    pub playing: bool,
    /// Honor hotkey commands passed to the manager.
    pub hotkeys: bool,

    /// Base file name for exports. Defaults to a timestamp.
    pub name: Option<String>,
    /// Prefix joined before the export file name.
    pub prefix: Option<String>,
    /// Suffix joined after the export file name.
    pub suffix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dimensions: None,
            units: Units::Px,
            pixels_per_inch: 72.0,
            orientation: Orientation::Initial,
            pixel_ratio: None,
            max_pixel_ratio: None,
            export_pixel_ratio: None,
            scale_to_fit: true,
            scale_to_view: false,
            scale_to_fit_padding: 40.0,
            bleed: 0.0,
            fps: 24.0,
            duration: None,
            total_frames: None,
            time: None,
            frame: None,
            time_scale: 1.0,
            loop_playback: true,
            playback_rate: PlaybackRate::Normal,
            animate: false,
            playing: true,
            hotkeys: true,
            name: None,
            prefix: None,
            suffix: None,
        }
    }
}

/// Relative slack used when checking that user-supplied timing pairs agree.
///
/// The stricter exact-equality check rejects values a user would consider
/// equivalent (e.g. `duration = 7.1, fps = 30, total_frames = 213`).
const TIMING_EPSILON: f64 = 1e-6;

/// Timing values derived from [`Settings`] at load time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTiming {
    /// Frames per second, validated finite and positive.
    pub fps: f64,
    /// Finite duration in seconds, if the animation is bounded.
    pub duration: Option<f64>,
    /// Finite frame count, if the animation is bounded.
    pub total_frames: Option<u64>,
    /// Start time in seconds.
    pub start_time: f64,
    /// Delta-time multiplier.
    pub time_scale: f64,
}

impl Settings {
    /// Parse settings from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CroquisResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CroquisError::config(format!("parse settings JSON: {e}")))
    }

    /// Parse settings from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CroquisResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CroquisError::config(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Derive and validate the timing values for a load.
    ///
    /// Fatal configuration errors: non-positive or non-finite `fps`,
    /// `duration`/`total_frames` that disagree after fps-rounding, and start
    /// `time`/`frame` that disagree.
    pub fn resolve_timing(&self) -> CroquisResult<ResolvedTiming> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(CroquisError::config(format!(
                "fps must be finite and > 0, got {}",
                self.fps
            )));
        }
        if !self.time_scale.is_finite() {
            return Err(CroquisError::config("time_scale must be finite"));
        }

        let (duration, total_frames) = match (self.duration, self.total_frames) {
            (None, None) => (None, None),
            (Some(d), None) => {
                if !(d.is_finite() && d > 0.0) {
                    return Err(CroquisError::config(format!(
                        "duration must be finite and > 0, got {d}"
                    )));
                }
                (Some(d), Some(frames_from_duration(self.fps, d)))
            }
            (None, Some(t)) => {
                if t == 0 {
                    return Err(CroquisError::config("total_frames must be > 0"));
                }
                (Some(t as f64 / self.fps), Some(t))
            }
            (Some(d), Some(t)) => {
                let derived = frames_from_duration(self.fps, d);
                if derived != t {
                    return Err(CroquisError::config(format!(
                        "duration ({d}s at {} fps = {derived} frames) disagrees with \
                         total_frames ({t}); specify one, or make them match",
                        self.fps
                    )));
                }
                (Some(d), Some(t))
            }
        };

        let start_time = match (self.time, self.frame) {
            (None, None) => 0.0,
            (Some(t), None) => t,
            (None, Some(f)) => f as f64 / self.fps,
            (Some(t), Some(f)) => {
                let from_frame = f as f64 / self.fps;
                if (t - from_frame).abs() > TIMING_EPSILON * t.abs().max(1.0) {
                    return Err(CroquisError::config(format!(
                        "start time ({t}s) disagrees with start frame ({f} = {from_frame}s \
                         at {} fps); specify one",
                        self.fps
                    )));
                }
                t
            }
        };

        Ok(ResolvedTiming {
            fps: self.fps,
            duration,
            total_frames,
            start_time,
            time_scale: self.time_scale,
        })
    }
}

/// Convert a duration to a whole frame count, tolerating float error.
///
/// Values within [`TIMING_EPSILON`] of an integer snap to it; everything else
/// floors, matching the clock's floor-based frame derivation.
fn frames_from_duration(fps: f64, duration: f64) -> u64 {
    let exact = fps * duration;
    let rounded = exact.round();
    let frames = if (exact - rounded).abs() <= TIMING_EPSILON * exact.abs().max(1.0) {
        rounded
    } else {
        exact.floor()
    };
    frames.max(0.0) as u64
}

/// Partial settings merge applied by
/// [`SketchManager::update`](crate::session::SketchManager::update).
///
/// Patching one of `duration`/`total_frames` clears the other so the pair is
/// re-derived instead of conflicting.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    /// New canvas dimensions.
    pub dimensions: Option<Dimensions>,
    /// New measurement units.
    pub units: Option<Units>,
    /// New pixel density.
    pub pixels_per_inch: Option<f64>,
    /// New orientation.
    pub orientation: Option<Orientation>,
    /// New explicit pixel ratio.
    pub pixel_ratio: Option<f64>,
    /// New pixel-ratio clamp.
    pub max_pixel_ratio: Option<f64>,
    /// New export pixel ratio.
    pub export_pixel_ratio: Option<f64>,
    /// Toggle viewport fitting.
    pub scale_to_fit: Option<bool>,
    /// Toggle style-size rendering.
    pub scale_to_view: Option<bool>,
    /// New fit padding.
    pub scale_to_fit_padding: Option<f64>,
    /// New bleed margin.
    pub bleed: Option<f64>,
    /// New clock rate.
    pub fps: Option<f64>,
    /// New duration in seconds.
    pub duration: Option<f64>,
    /// New frame count.
    pub total_frames: Option<u64>,
    /// New delta-time multiplier.
    pub time_scale: Option<f64>,
    /// Toggle loop-at-end.
    #[serde(rename = "loop")]
    pub loop_playback: Option<bool>,
    /// New pacing mode.
    pub playback_rate: Option<PlaybackRate>,
    /// Toggle animation.
    pub animate: Option<bool>,
    /// New export base name.
    pub name: Option<String>,
    /// New export prefix.
    pub prefix: Option<String>,
    /// New export suffix.
    pub suffix: Option<String>,
}

impl SettingsPatch {
    /// Merge this patch into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.dimensions {
            settings.dimensions = Some(v.clone());
        }
        if let Some(v) = self.units {
            settings.units = v;
        }
        if let Some(v) = self.pixels_per_inch {
            settings.pixels_per_inch = v;
        }
        if let Some(v) = self.orientation {
            settings.orientation = v;
        }
        if let Some(v) = self.pixel_ratio {
            settings.pixel_ratio = Some(v);
        }
        if let Some(v) = self.max_pixel_ratio {
            settings.max_pixel_ratio = Some(v);
        }
        if let Some(v) = self.export_pixel_ratio {
            settings.export_pixel_ratio = Some(v);
        }
        if let Some(v) = self.scale_to_fit {
            settings.scale_to_fit = v;
        }
        if let Some(v) = self.scale_to_view {
            settings.scale_to_view = v;
        }
        if let Some(v) = self.scale_to_fit_padding {
            settings.scale_to_fit_padding = v;
        }
        if let Some(v) = self.bleed {
            settings.bleed = v;
        }
        if let Some(v) = self.fps {
            settings.fps = v;
        }
        match (self.duration, self.total_frames) {
            (Some(d), Some(t)) => {
                settings.duration = Some(d);
                settings.total_frames = Some(t);
            }
            (Some(d), None) => {
                settings.duration = Some(d);
                settings.total_frames = None;
            }
            (None, Some(t)) => {
                settings.total_frames = Some(t);
                settings.duration = None;
            }
            (None, None) => {}
        }
        if let Some(v) = self.time_scale {
            settings.time_scale = v;
        }
        if let Some(v) = self.loop_playback {
            settings.loop_playback = v;
        }
        if let Some(v) = self.playback_rate {
            settings.playback_rate = v;
        }
        if let Some(v) = self.animate {
            settings.animate = v;
        }
        if let Some(v) = &self.name {
            settings.name = Some(v.clone());
        }
        if let Some(v) = &self.prefix {
            settings.prefix = Some(v.clone());
        }
        if let Some(v) = &self.suffix {
            settings.suffix = Some(v.clone());
        }
    }
}
