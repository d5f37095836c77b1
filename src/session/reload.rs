//! Reload-time state transfer for development hot-reload hosts.
//!
//! The registry is an explicit value owned by the host, keyed by a stable
//! sketch identity. Only the clock `time` is carried across a reload, and
//! only for animated sketches; recording flags, export queues, and user-held
//! closures are intentionally dropped.

use crate::props::Props;
use crate::settings::Settings;
use std::collections::HashMap;

/// Host-owned store of reload state, keyed by sketch identity.
#[derive(Debug, Default)]
pub struct ReloadRegistry {
    times: HashMap<String, f64>,
}

impl ReloadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the manager's current time under `key`, before the old
    /// instance is destroyed. No-op for non-animated sketches.
    pub fn capture(&mut self, key: impl Into<String>, settings: &Settings, props: &Props) {
        if settings.animate {
            self.times.insert(key.into(), props.time);
        }
    }

    /// Merge captured state for `key` into the settings used to construct
    /// the replacement instance. Consumes the entry; returns whether one
    /// existed.
    pub fn adopt(&mut self, key: &str, settings: &mut Settings) -> bool {
        match self.times.remove(key) {
            Some(time) => {
                settings.time = Some(time);
                settings.frame = None;
                true
            }
            None => false,
        }
    }

    /// Whether state is held for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.times.contains_key(key)
    }
}
