//! Croquis is a deterministic runtime for generative-art sketches.
//!
//! It owns the three concerns a sketch host should never reimplement:
//!
//! - A deterministic animation clock ([`clock::Timeline`]) with `normal`,
//!   `fixed`, and `throttle` pacing, loop policies, and discrete per-frame
//!   ticks decoupled from continuous rendering.
//! - Physical/logical canvas sizing ([`size::resolve_size`]) across unit
//!   systems, paper presets, pixel densities, bleed, and viewport fitting.
//! - Frame-synchronous export and recording ([`session::SketchManager`])
//!   with backpressure on asynchronous save I/O: at most one save is ever in
//!   flight and output order always matches frame order.
//!
//! Drawing backends stay external: implement [`surface::DrawSurface`] (or use
//! the CPU reference [`surface::PixelSurface`]), supply a sketch factory to
//! [`session::load`], and pump [`session::SketchManager::animate`] once per
//! display refresh.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Deterministic playback clock.
pub mod clock;
/// Export descriptors, naming, and sinks.
pub mod export;
/// Frame-state snapshot handed to sketch callbacks.
pub mod props;
/// Lifecycle manager and reload registry.
pub mod session;
/// Configuration structs, units, and paper presets.
pub mod settings;
/// Canvas size resolution.
pub mod size;
/// The sketch contract.
pub mod sketch;
/// Drawing-surface adapter seam.
pub mod surface;

pub use crate::foundation::error::{CroquisError, CroquisResult};

pub use crate::clock::{TickOutcome, Timeline};
pub use crate::export::{
    DirectorySink, ExportData, ExportDescriptor, ExportSink, MemorySink, PendingSave,
    SaveCompletion, SavedExport,
};
pub use crate::props::Props;
pub use crate::session::{
    ExportFrameOpts, Hotkey, ManagerOpts, PendingExport, RecordInterrupt, RecordStats,
    ReloadRegistry, SketchManager, load,
};
pub use crate::settings::{
    Dimensions, Orientation, PaperPreset, PlaybackRate, Settings, SettingsPatch, Units,
};
pub use crate::size::{SizeProps, Viewport, resolve_size};
pub use crate::sketch::{BoxedSketch, ExportLayer, RenderOutput, Sketch};
pub use crate::surface::{DrawSurface, PixelFrame, PixelSurface};
