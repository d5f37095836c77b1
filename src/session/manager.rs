//! The lifecycle manager: owns `Props`, composes the size resolver, clock,
//! sketch, surface, and export sink, and drives the single cooperative
//! animation-frame loop and the recording sequence.

use crate::clock::Timeline;
use crate::export::descriptor::{
    ExportData, ExportDescriptor, ExportNaming, normalize_extension, resolve_file_name,
    sequence_digits, timestamp_name, zero_pad,
};
use crate::export::sink::{ExportSink, MemorySink, PendingSave, SavedExport};
use crate::foundation::error::{CroquisError, CroquisResult};
use crate::props::Props;
use crate::settings::{Settings, SettingsPatch};
use crate::size::{Viewport, resolve_size};
use crate::sketch::{BoxedSketch, RenderOutput};
use crate::surface::DrawSurface;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Cancellation token observed by the recording sequencer.
///
/// The loop re-checks it immediately after each save completes; an in-flight
/// save is never aborted. Clone the token out of
/// [`SketchManager::interrupt_handle`] and trip it from wherever the host
/// handles interruption.
#[derive(Clone, Debug, Default)]
pub struct RecordInterrupt(Arc<AtomicBool>);

impl RecordInterrupt {
    /// Request that the recording stop scheduling further frames.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether an interrupt was requested.
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Outcome of a [`SketchManager::record`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Frames in the requested sequence.
    pub frames_total: u64,
    /// Frames whose saves completed.
    pub frames_exported: u64,
    /// Whether the full sequence was exported (false when interrupted).
    pub completed: bool,
}

/// Hotkey commands a host may forward from its key handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hotkey {
    /// Toggle play/pause of an animated sketch.
    TogglePlay,
    /// Export a single frame.
    ExportFrame,
    /// Start a recording, or interrupt one in progress.
    ToggleRecord,
}

/// Options for a single [`SketchManager::export_frame`] call.
#[derive(Clone, Debug, Default)]
pub struct ExportFrameOpts {
    /// Name the file as a zero-padded sequence frame.
    pub sequence: bool,
    /// Base file name overriding the configured one for this call.
    pub name: Option<String>,
    /// Opaque hash part included in the file name.
    pub hash: Option<String>,
}

impl ExportFrameOpts {
    /// Options for one frame of a sequence recording.
    pub fn sequence() -> Self {
        Self {
            sequence: true,
            ..Default::default()
        }
    }
}

/// Handle for the in-flight saves of one export call.
///
/// Waiting is the backpressure point: the recording sequencer blocks here
/// before scheduling the next frame.
#[derive(Debug)]
pub struct PendingExport {
    saves: SmallVec<[PendingSave; 1]>,
}

impl PendingExport {
    /// Number of dispatched layer saves.
    pub fn len(&self) -> usize {
        self.saves.len()
    }

    /// Whether the render produced nothing to save.
    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    /// Block until every layer save completes. The first failure wins.
    pub fn wait(self) -> CroquisResult<Vec<SavedExport>> {
        self.saves.into_iter().map(PendingSave::wait).collect()
    }
}

/// Collaborators handed to [`load`] besides the sketch factory and surface.
pub struct ManagerOpts {
    /// Host viewport the canvas mounts into.
    pub viewport: Viewport,
    /// Destination for export descriptors.
    pub sink: Box<dyn ExportSink>,
}

impl ManagerOpts {
    /// Options writing exports into the given sink.
    pub fn with_sink(sink: impl ExportSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            ..Default::default()
        }
    }
}

impl Default for ManagerOpts {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            sink: Box::new(MemorySink::new()),
        }
    }
}

/// Owns the sketch lifecycle: props, clock, surface, export sequencing.
///
/// Single-threaded by design. The host pumps [`animate`](Self::animate) once
/// per display refresh; every sketch callback runs synchronously to
/// completion on the calling thread. Render errors are not caught here: they
/// propagate and terminate the host's loop, since silently skipping a bad
/// frame would corrupt a deterministic sequence.
pub struct SketchManager<S: DrawSurface> {
    settings: Settings,
    props: Props,
    timeline: Timeline,
    surface: S,
    sketch: BoxedSketch<S>,
    sink: Box<dyn ExportSink>,
    viewport: Viewport,
    epoch: Instant,
    last_time_ms: Option<f64>,
    interrupt: RecordInterrupt,
    unloaded: bool,
}

/// Create a sketch via `factory` and mount it into a manager.
///
/// Fatal configuration errors (timing conflicts, unknown presets) surface
/// before the factory runs. A factory failure is logged with context and
/// propagated; no partially-mounted state is left behind.
#[tracing::instrument(skip_all)]
pub fn load<S, F>(
    factory: F,
    settings: Settings,
    surface: S,
    opts: ManagerOpts,
) -> CroquisResult<SketchManager<S>>
where
    S: DrawSurface,
    F: FnOnce(&Props) -> CroquisResult<BoxedSketch<S>>,
{
    let timing = settings.resolve_timing()?;
    let size = resolve_size(&settings, &opts.viewport, false)?;
    let timeline = Timeline::new(&timing, settings.loop_playback, settings.playback_rate);
    let props = Props::new(&timeline, size, settings.playing);

    let sketch = factory(&props).map_err(|e| {
        tracing::error!(error = %e, "sketch factory failed, nothing was mounted");
        CroquisError::sketch(format!("sketch factory failed: {e}"))
    })?;

    let mut surface = surface;
    surface.resize(size.canvas_width, size.canvas_height)?;
    surface.set_transform(size.scale_x, size.scale_y);

    let mut manager = SketchManager {
        settings,
        props,
        timeline,
        surface,
        sketch,
        sink: opts.sink,
        viewport: opts.viewport,
        epoch: Instant::now(),
        last_time_ms: None,
        interrupt: RecordInterrupt::default(),
        unloaded: false,
    };
    manager.render()?;
    Ok(manager)
}

impl<S: DrawSurface> SketchManager<S> {
    /// Read-only snapshot of the current frame state.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Settings the manager was loaded with (plus applied patches).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Token for interrupting a recording from the host.
    pub fn interrupt_handle(&self) -> RecordInterrupt {
        self.interrupt.clone()
    }

    /// Resume clock advancement. The wall-clock base resets so paused time
    /// is not replayed.
    pub fn play(&mut self) {
        self.props.playing = true;
        self.last_time_ms = None;
    }

    /// Halt clock advancement. An active recording stops scheduling further
    /// frames first.
    pub fn pause(&mut self) {
        self.props.recording = false;
        self.props.playing = false;
        self.last_time_ms = None;
    }

    /// Stop playback: reset frame, time, playhead, and delta to zero and
    /// re-render once.
    pub fn stop(&mut self) -> CroquisResult<()> {
        self.props.recording = false;
        self.props.playing = false;
        self.last_time_ms = None;
        self.timeline.reset();
        self.props.sync_clock(&self.timeline);
        self.render()?;
        Ok(())
    }

    /// Advance the clock against the wall-clock time `now_ms` and render.
    ///
    /// Returns whether a frame was rendered; a throttled short tick renders
    /// nothing and changes no state. The host calls this once per display
    /// refresh with a monotonic millisecond timestamp.
    pub fn animate(&mut self, now_ms: f64) -> CroquisResult<bool> {
        if !(self.settings.animate && self.props.playing) {
            return Ok(false);
        }
        let base = *self.last_time_ms.get_or_insert(now_ms);
        let dt = (now_ms - base).max(0.0);
        let out = self.timeline.tick(dt);
        self.last_time_ms = Some(now_ms - (dt - out.consumed_ms));
        if !out.advanced {
            return Ok(false);
        }

        self.props.sync_clock(&self.timeline);
        if out.looped {
            self.sketch.end(&self.props, &mut self.surface)?;
            self.sketch.begin(&self.props, &mut self.surface)?;
        }
        if out.frame_changed {
            self.sketch.tick(&self.props, &mut self.surface)?;
        }
        self.render()?;
        if out.finished {
            self.sketch.end(&self.props, &mut self.surface)?;
            self.pause();
        }
        Ok(true)
    }

    /// [`animate`](Self::animate) against this process's monotonic clock.
    pub fn animate_now(&mut self) -> CroquisResult<bool> {
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.animate(now_ms)
    }

    /// Render the current frame.
    ///
    /// Fires `begin` before the first render of a load. Safe to re-enter
    /// from resize paths: all state lives in `props`.
    pub fn render(&mut self) -> CroquisResult<RenderOutput> {
        if !self.props.started {
            self.props.started = true;
            self.sketch.begin(&self.props, &mut self.surface)?;
        }
        self.surface
            .set_transform(self.props.size.scale_x, self.props.size.scale_y);
        self.sketch.render(&self.props, &mut self.surface)
    }

    /// Re-resolve canvas dimensions against the current settings and
    /// viewport.
    ///
    /// Idempotent: returns whether anything changed; an unchanged resolution
    /// touches neither the surface nor the sketch.
    pub fn resize(&mut self) -> CroquisResult<bool> {
        let size = resolve_size(&self.settings, &self.viewport, self.props.exporting)?;
        if size == self.props.size {
            return Ok(false);
        }
        self.props.size = size;
        self.surface.resize(size.canvas_width, size.canvas_height)?;
        self.surface.set_transform(size.scale_x, size.scale_y);
        self.sketch.resize(&self.props, &mut self.surface)?;
        tracing::debug!(
            canvas_width = size.canvas_width,
            canvas_height = size.canvas_height,
            "canvas resized"
        );
        Ok(true)
    }

    /// Replace the host viewport (e.g. on window resize) and re-render if
    /// the canvas changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> CroquisResult<bool> {
        self.viewport = viewport;
        let changed = self.resize()?;
        if changed {
            self.render()?;
        }
        Ok(changed)
    }

    /// Merge a settings patch, re-derive timing and size, and re-render.
    ///
    /// The patch is validated against a copy first, so a rejected patch
    /// leaves the manager untouched. The current time is preserved, clamped
    /// into a newly finite duration.
    pub fn update(&mut self, patch: &SettingsPatch) -> CroquisResult<()> {
        let mut next = self.settings.clone();
        patch.apply(&mut next);
        let timing = next.resolve_timing()?;
        resolve_size(&next, &self.viewport, self.props.exporting)?;
        self.settings = next;
        self.timeline.retime(
            &timing,
            self.settings.loop_playback,
            self.settings.playback_rate,
        );
        self.props.sync_clock(&self.timeline);
        self.resize()?;
        self.render()?;
        Ok(())
    }

    /// Export the current frame through the sink.
    ///
    /// The canvas re-resolves at export dimensions (export pixel ratio, no
    /// viewport fitting), renders, dispatches one descriptor per layer, then
    /// restores the on-screen size and re-renders. The returned handle
    /// resolves when the sink finishes writing.
    pub fn export_frame(&mut self, opts: ExportFrameOpts) -> CroquisResult<PendingExport> {
        let standalone = !self.props.recording;
        if standalone {
            self.sketch.pre_export(&self.props, &mut self.surface)?;
        }

        self.props.exporting = true;
        let dispatched = self.dispatch_export(&opts);
        self.props.exporting = false;
        self.resize()?;
        self.render()?;

        if standalone {
            self.sketch.post_export(&self.props, &mut self.surface)?;
        }
        dispatched
    }

    fn dispatch_export(&mut self, opts: &ExportFrameOpts) -> CroquisResult<PendingExport> {
        self.resize()?;
        let output = self.render()?;
        let layers = self.collect_layers(output)?;
        let total_layers = layers.len();
        let frame = self.props.frame;

        let base = if opts.sequence {
            let digits = self.props.total_frames.map(sequence_digits).unwrap_or(4);
            zero_pad(frame, digits)
        } else {
            opts.name
                .clone()
                .or_else(|| self.settings.name.clone())
                .unwrap_or_else(timestamp_name)
        };
        let naming = ExportNaming {
            prefix: self.settings.prefix.as_deref(),
            suffix: self.settings.suffix.as_deref(),
            hash: opts.hash.as_deref(),
        };

        let mut saves: SmallVec<[PendingSave; 1]> = SmallVec::new();
        for (layer, (data, extension)) in layers.into_iter().enumerate() {
            let file_name = resolve_file_name(&naming, &base, layer, total_layers, &extension);
            let descriptor = ExportDescriptor {
                file_name,
                extension,
                data,
                frame,
                layer,
                total_layers,
                sequence: opts.sequence,
            };
            saves.push(self.sink.save(descriptor)?);
        }
        Ok(PendingExport { saves })
    }

    fn collect_layers(
        &self,
        output: RenderOutput,
    ) -> CroquisResult<SmallVec<[(ExportData, String); 1]>> {
        Ok(match output {
            RenderOutput::Surface => {
                let frame = self.surface.capture()?;
                smallvec![(ExportData::Pixels(frame), ".png".to_owned())]
            }
            RenderOutput::Layers(layers) => layers
                .into_iter()
                .map(|l| {
                    let ext = l
                        .extension
                        .map(|e| normalize_extension(&e))
                        .unwrap_or_else(|| ".png".to_owned());
                    (l.data, ext)
                })
                .collect(),
        })
    }

    /// Export every frame of the bounded animation as numbered files.
    ///
    /// The sequencer steps frames under its own control rather than
    /// wall-clock pacing: each iteration forces a one-frame delta, fires
    /// `tick` and `render`, exports, and waits for the save to complete
    /// before scheduling the next frame. The wait bounds memory to one
    /// in-flight save and guarantees output order matches frame order. The
    /// `recording` flag and the interrupt token are re-checked immediately
    /// after each wait; a failed save is fatal to the recording.
    #[tracing::instrument(skip(self))]
    pub fn record(&mut self) -> CroquisResult<RecordStats> {
        let total = self.timeline.total_frames().ok_or_else(|| {
            CroquisError::config("recording requires a finite duration or total_frames")
        })?;

        self.interrupt.clear();
        self.stop()?;
        self.props.recording = true;
        self.props.playing = true;
        self.sketch.pre_export(&self.props, &mut self.surface)?;
        tracing::info!(frames = total, "recording started");

        let mut stats = RecordStats {
            frames_total: total,
            frames_exported: 0,
            completed: false,
        };

        for frame in 0..total {
            self.timeline.step_to_frame(frame);
            self.props.sync_clock(&self.timeline);
            self.sketch.tick(&self.props, &mut self.surface)?;
            self.render()?;

            let pending = self.export_frame(ExportFrameOpts::sequence())?;
            match pending.wait() {
                Ok(_) => stats.frames_exported += 1,
                Err(e) => {
                    self.props.recording = false;
                    self.props.playing = false;
                    tracing::error!(frame, error = %e, "save failed, aborting recording");
                    return Err(e);
                }
            }

            if !self.props.recording || self.interrupt.is_interrupted() {
                tracing::info!(frame, "recording interrupted");
                break;
            }
        }

        stats.completed = stats.frames_exported == total;
        self.sketch.post_export(&self.props, &mut self.surface)?;
        self.sketch.end(&self.props, &mut self.surface)?;
        self.props.recording = false;
        self.stop()?;
        self.play();
        tracing::info!(
            exported = stats.frames_exported,
            completed = stats.completed,
            "recording finished"
        );
        Ok(stats)
    }

    /// Apply a hotkey command, honoring the `hotkeys` setting.
    pub fn handle_hotkey(&mut self, key: Hotkey) -> CroquisResult<()> {
        if !self.settings.hotkeys {
            return Ok(());
        }
        match key {
            Hotkey::TogglePlay => {
                if self.settings.animate {
                    if self.props.playing {
                        self.pause();
                    } else {
                        self.play();
                    }
                }
            }
            Hotkey::ExportFrame => {
                self.export_frame(ExportFrameOpts::default())?.wait()?;
            }
            Hotkey::ToggleRecord => {
                if self.props.recording {
                    self.interrupt.interrupt();
                } else {
                    self.record()?;
                }
            }
        }
        Ok(())
    }

    /// Signal `unload` to the sketch and halt. Idempotent; also runs on
    /// drop if the host never called it.
    pub fn unload(&mut self) -> CroquisResult<()> {
        if self.unloaded {
            return Ok(());
        }
        self.unloaded = true;
        self.props.recording = false;
        self.props.playing = false;
        self.sketch.unload(&self.props, &mut self.surface)
    }
}

impl<S: DrawSurface> Drop for SketchManager<S> {
    fn drop(&mut self) {
        if !self.unloaded {
            let _ = self.unload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Dimensions, PlaybackRate, Units};
    use crate::surface::PixelSurface;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    /// Sink shared between a test and the manager that owns it.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<MemorySink>>);

    impl ExportSink for SharedSink {
        fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
            self.0.lock().unwrap().save(descriptor)
        }
    }

    impl SharedSink {
        fn file_names(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .saves()
                .iter()
                .map(|d| d.file_name.clone())
                .collect()
        }
    }

    /// Sketch that logs every callback it receives.
    struct EventSketch {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl crate::sketch::Sketch<PixelSurface> for EventSketch {
        fn render(
            &mut self,
            props: &Props,
            surface: &mut PixelSurface,
        ) -> CroquisResult<RenderOutput> {
            surface.clear([0, 0, 0, 255]);
            self.log.borrow_mut().push(format!("render:{}", props.frame));
            Ok(RenderOutput::Surface)
        }

        fn begin(&mut self, _props: &Props, _surface: &mut PixelSurface) -> CroquisResult<()> {
            self.log.borrow_mut().push("begin".to_owned());
            Ok(())
        }

        fn end(&mut self, _props: &Props, _surface: &mut PixelSurface) -> CroquisResult<()> {
            self.log.borrow_mut().push("end".to_owned());
            Ok(())
        }

        fn tick(&mut self, props: &Props, _surface: &mut PixelSurface) -> CroquisResult<()> {
            self.log.borrow_mut().push(format!("tick:{}", props.frame));
            Ok(())
        }

        fn unload(&mut self, _props: &Props, _surface: &mut PixelSurface) -> CroquisResult<()> {
            self.log.borrow_mut().push("unload".to_owned());
            Ok(())
        }
    }

    fn animated_settings() -> Settings {
        Settings {
            dimensions: Some(Dimensions::Pair([32.0, 32.0])),
            units: Units::Px,
            fps: 4.0,
            duration: Some(2.0),
            animate: true,
            ..Default::default()
        }
    }

    fn load_with_log(
        settings: Settings,
    ) -> (SketchManager<PixelSurface>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sketch_log = log.clone();
        let manager = load(
            move |_props| {
                Ok(Box::new(EventSketch { log: sketch_log }) as BoxedSketch<PixelSurface>)
            },
            settings,
            PixelSurface::new(1, 1),
            ManagerOpts::default(),
        )
        .unwrap();
        (manager, log)
    }

    #[test]
    fn load_renders_once_and_fires_begin_first() {
        let (manager, log) = load_with_log(animated_settings());
        assert_eq!(log.borrow().as_slice(), ["begin", "render:0"]);
        assert!(manager.props().started);
        assert_eq!(manager.props().size.canvas_width, 32);
    }

    #[test]
    fn loop_wrap_fires_end_then_begin_exactly_at_the_wrap() {
        let (mut manager, log) = load_with_log(animated_settings());
        // First pump establishes the wall-clock base.
        manager.animate(0.0).unwrap();
        log.borrow_mut().clear();

        // 4 fps, duration 2s: wrap on the 8th 250ms tick.
        let mut now = 0.0;
        for _ in 0..8 {
            now += 250.0;
            manager.animate(now).unwrap();
        }
        let events = log.borrow().clone();
        let wrap = events.iter().position(|e| e == "end").unwrap();
        assert_eq!(
            &events[wrap..wrap + 4],
            ["end", "begin", "tick:0", "render:0"],
            "loop end signals end, then begin, then the frame-0 tick"
        );
        // Frames visited before the wrap.
        let ticks: Vec<_> = events
            .iter()
            .filter_map(|e| e.strip_prefix("tick:"))
            .collect();
        assert_eq!(ticks, ["1", "2", "3", "4", "5", "6", "7", "0"]);
    }

    #[test]
    fn non_looping_end_pauses_after_final_render() {
        let mut settings = animated_settings();
        settings.loop_playback = false;
        settings.duration = Some(1.0);
        let (mut manager, log) = load_with_log(settings);
        manager.animate(0.0).unwrap();
        log.borrow_mut().clear();

        let mut now = 0.0;
        for _ in 0..4 {
            now += 250.0;
            manager.animate(now).unwrap();
        }
        assert!(!manager.props().playing);
        assert_eq!(manager.props().time, 1.0);
        let events = log.borrow().clone();
        let last_render = events.iter().rposition(|e| e.starts_with("render")).unwrap();
        let end = events.iter().rposition(|e| e == "end").unwrap();
        assert!(end > last_render, "end fires after the final frame renders");

        // Further pumps are inert while paused.
        log.borrow_mut().clear();
        manager.animate(now + 250.0).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn animate_is_inert_for_static_sketches() {
        let mut settings = animated_settings();
        settings.animate = false;
        let (mut manager, log) = load_with_log(settings);
        log.borrow_mut().clear();
        assert!(!manager.animate(1000.0).unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn throttle_skips_render_until_an_interval_elapses() {
        let mut settings = animated_settings();
        settings.duration = None;
        settings.playback_rate = PlaybackRate::Throttle;
        let (mut manager, log) = load_with_log(settings);
        log.borrow_mut().clear();

        manager.animate(0.0).unwrap();
        // 250ms interval at 4 fps; 100ms later nothing may happen.
        assert!(!manager.animate(100.0).unwrap());
        assert!(log.borrow().is_empty());
        assert!(manager.animate(300.1).unwrap());
        assert_eq!(manager.props().frame, 1);
    }

    #[test]
    fn resize_is_idempotent_for_unchanged_settings() {
        let (mut manager, _log) = load_with_log(animated_settings());
        let first = manager.props().size;
        assert!(!manager.resize().unwrap(), "nothing changed since load");
        assert_eq!(manager.props().size, first);
    }

    #[test]
    fn stop_resets_clock_and_rerenders_once() {
        let (mut manager, log) = load_with_log(animated_settings());
        manager.animate(0.0).unwrap();
        let mut now = 0.0;
        for _ in 0..3 {
            now += 250.0;
            manager.animate(now).unwrap();
        }
        assert_eq!(manager.props().frame, 3);
        log.borrow_mut().clear();
        manager.stop().unwrap();
        assert_eq!(manager.props().frame, 0);
        assert_eq!(manager.props().time, 0.0);
        assert_eq!(manager.props().playhead, 0.0);
        assert_eq!(manager.props().delta_time, 0.0);
        assert_eq!(log.borrow().as_slice(), ["render:0"]);
    }

    #[test]
    fn export_frame_names_single_capture_from_settings() {
        let sink = SharedSink::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sketch_log = log.clone();
        let mut settings = animated_settings();
        settings.name = Some("orbits".to_owned());
        settings.suffix = Some("draft".to_owned());
        let mut manager = load(
            move |_| Ok(Box::new(EventSketch { log: sketch_log }) as BoxedSketch<PixelSurface>),
            settings,
            PixelSurface::new(1, 1),
            ManagerOpts {
                viewport: Viewport::default(),
                sink: Box::new(sink.clone()),
            },
        )
        .unwrap();

        let saved = manager
            .export_frame(ExportFrameOpts::default())
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].file_name, "orbits-draft.png");
        assert_eq!(sink.file_names(), vec!["orbits-draft.png"]);
        assert!(!manager.props().exporting, "export state restored");
    }

    #[test]
    fn record_exports_every_frame_in_order() {
        let sink = SharedSink::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sketch_log = log.clone();
        let mut manager = load(
            move |_| Ok(Box::new(EventSketch { log: sketch_log }) as BoxedSketch<PixelSurface>),
            animated_settings(),
            PixelSurface::new(1, 1),
            ManagerOpts {
                viewport: Viewport::default(),
                sink: Box::new(sink.clone()),
            },
        )
        .unwrap();

        let stats = manager.record().unwrap();
        assert_eq!(
            stats,
            RecordStats {
                frames_total: 8,
                frames_exported: 8,
                completed: true,
            }
        );
        assert_eq!(
            sink.file_names(),
            vec![
                "0.png", "1.png", "2.png", "3.png", "4.png", "5.png", "6.png", "7.png"
            ]
        );
        // Recording resumes normal playback afterwards.
        assert!(manager.props().playing);
        assert!(!manager.props().recording);
        assert_eq!(manager.props().frame, 0);
        // Every frame fired its discrete tick before rendering.
        let ticks: Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix("tick:").map(str::to_owned))
            .collect();
        assert_eq!(ticks, ["0", "1", "2", "3", "4", "5", "6", "7"]);
    }

    #[test]
    fn record_requires_a_bounded_timeline() {
        let mut settings = animated_settings();
        settings.duration = None;
        let (mut manager, _log) = load_with_log(settings);
        assert!(matches!(
            manager.record(),
            Err(CroquisError::Config(_))
        ));
    }

    #[test]
    fn failed_save_aborts_recording() {
        struct FailingSink {
            dispatched: Arc<Mutex<u64>>,
            fail_at: u64,
        }
        impl ExportSink for FailingSink {
            fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
                *self.dispatched.lock().unwrap() += 1;
                if descriptor.frame >= self.fail_at {
                    Ok(PendingSave::ready(Err(CroquisError::export("disk full"))))
                } else {
                    Ok(PendingSave::ready(Ok(SavedExport {
                        file_name: descriptor.file_name,
                        path: None,
                    })))
                }
            }
        }

        let dispatched = Arc::new(Mutex::new(0));
        let log = Rc::new(RefCell::new(Vec::new()));
        let sketch_log = log.clone();
        let mut manager = load(
            move |_| Ok(Box::new(EventSketch { log: sketch_log }) as BoxedSketch<PixelSurface>),
            animated_settings(),
            PixelSurface::new(1, 1),
            ManagerOpts {
                viewport: Viewport::default(),
                sink: Box::new(FailingSink {
                    dispatched: dispatched.clone(),
                    fail_at: 3,
                }),
            },
        )
        .unwrap();

        let err = manager.record().unwrap_err();
        assert!(matches!(err, CroquisError::Export(_)));
        assert!(!manager.props().recording);
        assert!(!manager.props().playing);
        // Frames 0..=2 saved, frame 3 failed, nothing scheduled past it.
        assert_eq!(*dispatched.lock().unwrap(), 4);
    }

    #[test]
    fn interrupt_halts_recording_after_the_in_flight_save() {
        struct InterruptingSink {
            inner: SharedSink,
            interrupt: RecordInterrupt,
            at_frame: u64,
        }
        impl ExportSink for InterruptingSink {
            fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
                if descriptor.frame == self.at_frame {
                    self.interrupt.interrupt();
                }
                self.inner.save(descriptor)
            }
        }

        let sink = SharedSink::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sketch_log = log.clone();
        let interrupt = RecordInterrupt::default();
        let mut manager = load(
            move |_| Ok(Box::new(EventSketch { log: sketch_log }) as BoxedSketch<PixelSurface>),
            animated_settings(),
            PixelSurface::new(1, 1),
            ManagerOpts {
                viewport: Viewport::default(),
                sink: Box::new(InterruptingSink {
                    inner: sink.clone(),
                    interrupt: interrupt.clone(),
                    at_frame: 2,
                }),
            },
        )
        .unwrap();
        // Wire the sink's token to the manager's.
        manager.interrupt = interrupt.clone();

        let stats = manager.record().unwrap();
        assert!(!stats.completed);
        assert_eq!(stats.frames_exported, 3);
        assert_eq!(sink.file_names(), vec!["0.png", "1.png", "2.png"]);
    }

    #[test]
    fn hotkeys_honor_the_settings_flag() {
        let (mut manager, _log) = load_with_log(animated_settings());
        assert!(manager.props().playing);
        manager.handle_hotkey(Hotkey::TogglePlay).unwrap();
        assert!(!manager.props().playing);
        manager.handle_hotkey(Hotkey::TogglePlay).unwrap();
        assert!(manager.props().playing);

        let mut settings = animated_settings();
        settings.hotkeys = false;
        let (mut manager, _log) = load_with_log(settings);
        manager.handle_hotkey(Hotkey::TogglePlay).unwrap();
        assert!(manager.props().playing, "disabled hotkeys are ignored");
    }

    #[test]
    fn factory_failure_is_propagated_as_sketch_error() {
        let result = load(
            |_props| -> CroquisResult<BoxedSketch<PixelSurface>> {
                Err(CroquisError::sketch("shader did not compile"))
            },
            Settings::default(),
            PixelSurface::new(1, 1),
            ManagerOpts::default(),
        );
        let err = result.err().unwrap();
        assert!(matches!(err, CroquisError::Sketch(_)));
        assert!(err.to_string().contains("shader did not compile"));
    }

    #[test]
    fn unload_signals_sketch_once_including_drop() {
        let (mut manager, log) = load_with_log(animated_settings());
        manager.unload().unwrap();
        drop(manager);
        let unloads = log.borrow().iter().filter(|e| *e == "unload").count();
        assert_eq!(unloads, 1);
    }
}
