//! Playback clock: advances `time` / `frame` / `playhead` under the three
//! pacing modes and the loop policy. Pure state; the session layer owns the
//! wall-clock base and fires callbacks from the returned [`TickOutcome`].

use crate::settings::model::{PlaybackRate, ResolvedTiming};

/// Result of one [`Timeline::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickOutcome {
    /// Whether the clock advanced at all. A throttled short tick is a
    /// complete no-op and leaves every field of the timeline untouched.
    pub advanced: bool,
    /// Wall-clock milliseconds consumed from the caller's time base. The
    /// caller snaps its base forward by exactly this amount, which is how
    /// throttle mode absorbs drift instead of resetting it.
    pub consumed_ms: f64,
    /// Whether the integer frame index changed (drives the discrete `tick`
    /// callback, distinct from the continuous render).
    pub frame_changed: bool,
    /// Whether time wrapped past the end of a finite duration.
    pub looped: bool,
    /// Whether time clamped at a finite, non-looping duration end.
    pub finished: bool,
}

/// Deterministic playback state.
#[derive(Clone, Debug)]
pub struct Timeline {
    fps: f64,
    duration: Option<f64>,
    total_frames: Option<u64>,
    time_scale: f64,
    loop_playback: bool,
    playback_rate: PlaybackRate,

    time: f64,
    frame: u64,
    playhead: f64,
    delta_time: f64,

    // Fixed-rate stepping derives time from an integer step count off a base
    // value, so N ticks land on exactly `base + N * (1/fps) * time_scale`
    // with no float accumulation.
    fixed_base: f64,
    fixed_steps: u64,
}

impl Timeline {
    /// Build a timeline from resolved timing, positioned at the start time.
    pub fn new(timing: &ResolvedTiming, loop_playback: bool, playback_rate: PlaybackRate) -> Self {
        let mut tl = Self {
            fps: timing.fps,
            duration: timing.duration,
            total_frames: timing.total_frames,
            time_scale: timing.time_scale,
            loop_playback,
            playback_rate,
            time: 0.0,
            frame: 0,
            playhead: 0.0,
            delta_time: 0.0,
            fixed_base: 0.0,
            fixed_steps: 0,
        };
        tl.seek(timing.start_time);
        tl
    }

    /// Current time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Current integer frame index.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Normalized 0..1 progress through a finite duration, 0 if unbounded.
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Delta time of the last advancing tick, in seconds.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Finite duration, if bounded.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Finite frame count, if bounded.
    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Clock rate in frames per second.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Delta-time multiplier.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.fps
    }

    /// Duration of one frame in seconds.
    pub fn frame_interval_secs(&self) -> f64 {
        1.0 / self.fps
    }

    /// Replace the timing parameters, preserving the current position
    /// (clamped into a newly finite duration).
    pub fn retime(
        &mut self,
        timing: &ResolvedTiming,
        loop_playback: bool,
        playback_rate: PlaybackRate,
    ) {
        self.fps = timing.fps;
        self.duration = timing.duration;
        self.total_frames = timing.total_frames;
        self.time_scale = timing.time_scale;
        self.loop_playback = loop_playback;
        self.playback_rate = playback_rate;
        let t = match self.duration {
            Some(d) => self.time.clamp(0.0, d),
            None => self.time,
        };
        self.seek(t);
    }

    /// Jump to an absolute time, recomputing playhead and frame.
    pub fn seek(&mut self, time: f64) {
        self.time = time;
        self.playhead = compute_playhead(time, self.duration);
        self.frame = compute_frame(self.playhead, time, self.total_frames, self.fps);
        self.fixed_base = time;
        self.fixed_steps = 0;
    }

    /// Position exactly on a frame index with a forced one-frame delta.
    ///
    /// Used by the recording sequencer, which steps under its own control;
    /// the frame index is assigned directly so float error in the
    /// playhead-based derivation can never desynchronize the sequence.
    pub fn step_to_frame(&mut self, frame: u64) {
        self.time = frame as f64 * self.frame_interval_secs();
        self.playhead = compute_playhead(self.time, self.duration);
        self.frame = frame;
        self.delta_time = self.frame_interval_secs();
        self.fixed_base = self.time;
        self.fixed_steps = 0;
    }

    /// Reset to the zero state: time, frame, playhead, and delta all 0.
    pub fn reset(&mut self) {
        self.delta_time = 0.0;
        self.seek(0.0);
    }

    /// Advance by `dt_ms` wall-clock milliseconds since the caller's base.
    pub fn tick(&mut self, dt_ms: f64) -> TickOutcome {
        let interval_ms = self.frame_interval_ms();
        let mut out = TickOutcome::default();

        let delta_secs = match self.playback_rate {
            PlaybackRate::Normal => {
                out.consumed_ms = dt_ms;
                dt_ms / 1000.0
            }
            PlaybackRate::Fixed => {
                out.consumed_ms = dt_ms;
                self.frame_interval_secs()
            }
            PlaybackRate::Throttle => {
                if dt_ms > interval_ms {
                    let consumed = dt_ms - (dt_ms % interval_ms);
                    out.consumed_ms = consumed;
                    consumed / 1000.0
                } else {
                    return out;
                }
            }
        };
        out.advanced = true;
        self.delta_time = delta_secs;

        let mut new_time = if self.playback_rate == PlaybackRate::Fixed {
            self.fixed_steps += 1;
            self.fixed_base + self.fixed_steps as f64 * self.frame_interval_secs() * self.time_scale
        } else {
            self.time + delta_secs * self.time_scale
        };

        if new_time < 0.0 {
            if let Some(d) = self.duration {
                new_time += d;
                self.rebase_fixed(new_time);
            }
        }

        if let Some(d) = self.duration {
            if new_time >= d {
                if self.loop_playback {
                    new_time %= d;
                    out.looped = true;
                } else {
                    new_time = d;
                    out.finished = true;
                }
                self.rebase_fixed(new_time);
            }
        }

        let prev_frame = self.frame;
        self.time = new_time;
        self.playhead = compute_playhead(new_time, self.duration);
        self.frame = compute_frame(self.playhead, new_time, self.total_frames, self.fps);
        out.frame_changed = self.frame != prev_frame;
        out
    }

    fn rebase_fixed(&mut self, time: f64) {
        self.fixed_base = time;
        self.fixed_steps = 0;
    }
}

/// Normalized progress through a finite duration, 0 if unbounded.
fn compute_playhead(time: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 => time / d,
        _ => 0.0,
    }
}

/// Integer frame index consistent with `playhead` and `total_frames`.
///
/// Bounded timelines derive the frame from the playhead and clamp to the
/// final index so the clamped-at-duration end state reports the last frame;
/// unbounded timelines floor `fps * time`.
fn compute_frame(playhead: f64, time: f64, total_frames: Option<u64>, fps: f64) -> u64 {
    match total_frames {
        Some(t) if t > 1 => {
            let raw = (playhead * t as f64).floor();
            (raw.max(0.0) as u64).min(t - 1)
        }
        _ => (fps * time).floor().max(0.0) as u64,
    }
}
