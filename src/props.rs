use crate::clock::Timeline;
use crate::size::SizeProps;

/// Mutable frame state owned exclusively by the manager and mutated only on
/// the driving thread between frame callbacks. Sketch callbacks receive it as
/// a read-only snapshot.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Props {
    /// Current integer frame index.
    pub frame: u64,
    /// Current time in seconds.
    pub time: f64,
    /// Normalized 0..1 progress through a finite duration, 0 if unbounded.
    pub playhead: f64,
    /// Delta time of the last advancing tick, in seconds.
    pub delta_time: f64,
    /// Finite duration in seconds, if bounded.
    pub duration: Option<f64>,
    /// Finite frame count, if bounded.
    pub total_frames: Option<u64>,
    /// Clock rate in frames per second.
    pub fps: f64,
    /// Delta-time multiplier.
    pub time_scale: f64,
    /// Whether the clock advances on animation-frame pumps.
    pub playing: bool,
    /// Whether a frame-sequence recording is in progress.
    pub recording: bool,
    /// Whether the current render targets export dimensions.
    pub exporting: bool,
    /// Whether the first render (and its `begin` signal) has happened.
    pub started: bool,
    /// Resolved canvas dimensions.
    pub size: SizeProps,
}

impl Props {
    pub(crate) fn new(timeline: &Timeline, size: SizeProps, playing: bool) -> Self {
        Self {
            frame: timeline.frame(),
            time: timeline.time(),
            playhead: timeline.playhead(),
            delta_time: timeline.delta_time(),
            duration: timeline.duration(),
            total_frames: timeline.total_frames(),
            fps: timeline.fps(),
            time_scale: timeline.time_scale(),
            playing,
            recording: false,
            exporting: false,
            started: false,
            size,
        }
    }

    /// Copy the clock-owned fields out of the timeline.
    pub(crate) fn sync_clock(&mut self, timeline: &Timeline) {
        self.frame = timeline.frame();
        self.time = timeline.time();
        self.playhead = timeline.playhead();
        self.delta_time = timeline.delta_time();
        self.duration = timeline.duration();
        self.total_frames = timeline.total_frames();
        self.fps = timeline.fps();
        self.time_scale = timeline.time_scale();
    }
}
