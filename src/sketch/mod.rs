//! The sketch contract: a user-supplied collaborator with optional
//! capabilities, created once per load by a factory and signaled `unload`
//! before teardown.

use crate::export::descriptor::ExportData;
use crate::foundation::error::CroquisResult;
use crate::props::Props;
use crate::surface::DrawSurface;
use smallvec::{SmallVec, smallvec};

/// One exportable layer produced by a render.
#[derive(Clone, Debug)]
pub struct ExportLayer {
    /// Layer payload: pixels or pre-encoded bytes.
    pub data: ExportData,
    /// File extension including the dot. `None` defaults to `.png`.
    pub extension: Option<String>,
}

/// What a render call produced, for export purposes.
#[derive(Clone, Debug, Default)]
pub enum RenderOutput {
    /// The sketch drew into the manager's own surface; export captures it.
    #[default]
    Surface,
    /// Explicit layer list; a single entry exports without a layer suffix.
    Layers(SmallVec<[ExportLayer; 1]>),
}

impl RenderOutput {
    /// A single explicit layer.
    pub fn layer(data: ExportData, extension: Option<String>) -> Self {
        Self::Layers(smallvec![ExportLayer { data, extension }])
    }
}

/// A loaded sketch instance.
///
/// Every capability defaults to a no-op so plain render-only sketches stay
/// small; the manager dispatches through these methods without checking which
/// ones are actually implemented.
pub trait Sketch<S: DrawSurface> {
    /// Continuous render callback. Runs once per animation-frame pump and on
    /// demand (resize, export). Must be re-entrant: it owns no state beyond
    /// what it reads from `props`.
    fn render(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<RenderOutput> {
        Ok(RenderOutput::Surface)
    }

    /// Canvas dimensions changed.
    fn resize(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// Start of playback or start of a loop iteration.
    fn begin(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// End of playback or end of a loop iteration.
    fn end(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// Discrete per-frame callback; fires only when the integer frame index
    /// changes, unlike the continuous `render`.
    fn tick(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// About to export or record.
    fn pre_export(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// Export or recording finished.
    fn post_export(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }

    /// Instance is being destroyed (teardown or replacement on reload).
    fn unload(&mut self, _props: &Props, _surface: &mut S) -> CroquisResult<()> {
        Ok(())
    }
}

/// A plain render function is a complete sketch.
impl<S, F> Sketch<S> for F
where
    S: DrawSurface,
    F: FnMut(&Props, &mut S) -> CroquisResult<RenderOutput>,
{
    fn render(&mut self, props: &Props, surface: &mut S) -> CroquisResult<RenderOutput> {
        self(props, surface)
    }
}

/// Boxed sketch instance returned by factories.
pub type BoxedSketch<S> = Box<dyn Sketch<S>>;
