pub mod model;
pub mod presets;

pub use model::{
    Dimensions, Orientation, PlaybackRate, ResolvedTiming, Settings, SettingsPatch, Units,
};
pub use presets::{PaperPreset, lookup_preset, normalize_preset_key};
