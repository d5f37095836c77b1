//! Named paper-size presets.

use crate::foundation::error::{CroquisError, CroquisResult};
use crate::settings::model::Units;

/// A named paper-size preset: trim `[width, height]` in `units`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaperPreset {
    /// Trim width.
    pub width: f64,
    /// Trim height.
    pub height: f64,
    /// Units the preset is defined in.
    pub units: Units,
}

const MM: Units = Units::Mm;
const IN: Units = Units::In;

/// Preset table. Keys are stored pre-normalized (lowercase, no separators);
/// lookup goes through [`normalize_preset_key`].
const PAPER_PRESETS: &[(&str, f64, f64, Units)] = &[
    // ISO A series
    ("a0", 841.0, 1189.0, MM),
    ("a1", 594.0, 841.0, MM),
    ("a2", 420.0, 594.0, MM),
    ("a3", 297.0, 420.0, MM),
    ("a4", 210.0, 297.0, MM),
    ("a5", 148.0, 210.0, MM),
    ("a6", 105.0, 148.0, MM),
    ("a7", 74.0, 105.0, MM),
    ("a8", 52.0, 74.0, MM),
    ("a9", 37.0, 52.0, MM),
    ("a10", 26.0, 37.0, MM),
    // ISO B series
    ("b0", 1000.0, 1414.0, MM),
    ("b1", 707.0, 1000.0, MM),
    ("b2", 500.0, 707.0, MM),
    ("b3", 353.0, 500.0, MM),
    ("b4", 250.0, 353.0, MM),
    ("b5", 176.0, 250.0, MM),
    ("b6", 125.0, 176.0, MM),
    ("b7", 88.0, 125.0, MM),
    ("b8", 62.0, 88.0, MM),
    // ISO C series (envelopes)
    ("c0", 917.0, 1297.0, MM),
    ("c1", 648.0, 917.0, MM),
    ("c2", 458.0, 648.0, MM),
    ("c3", 324.0, 458.0, MM),
    ("c4", 229.0, 324.0, MM),
    ("c5", 162.0, 229.0, MM),
    ("c6", 114.0, 162.0, MM),
    // US / ANSI
    ("letter", 8.5, 11.0, IN),
    ("halfletter", 5.5, 8.5, IN),
    ("legal", 8.5, 14.0, IN),
    ("juniorlegal", 5.0, 8.0, IN),
    ("tabloid", 11.0, 17.0, IN),
    ("ledger", 17.0, 11.0, IN),
    ("ansia", 8.5, 11.0, IN),
    ("ansib", 11.0, 17.0, IN),
    ("ansic", 17.0, 22.0, IN),
    ("ansid", 22.0, 34.0, IN),
    ("ansie", 34.0, 44.0, IN),
    // Architectural
    ("archa", 9.0, 12.0, IN),
    ("archb", 12.0, 18.0, IN),
    ("archc", 18.0, 24.0, IN),
    ("archd", 24.0, 36.0, IN),
    ("arche", 36.0, 48.0, IN),
    ("arche1", 30.0, 42.0, IN),
    // Photo print sizes
    ("2r", 2.5, 3.5, IN),
    ("3r", 3.5, 5.0, IN),
    ("4r", 4.0, 6.0, IN),
    ("5r", 5.0, 7.0, IN),
    ("6r", 6.0, 8.0, IN),
    ("8r", 8.0, 10.0, IN),
    ("10r", 10.0, 12.0, IN),
    ("11r", 11.0, 14.0, IN),
    // Misc print formats
    ("postcard", 100.0, 148.0, MM),
    ("businesscard", 2.0, 3.5, IN),
    ("postersmall", 11.0, 17.0, IN),
    ("poster", 18.0, 24.0, IN),
    ("posterlarge", 24.0, 36.0, IN),
];

/// Normalize a preset name: lowercase with spaces, hyphens, and underscores
/// removed, so `"ARCH A"`, `"arch-a"`, and `"arch_a"` all match `archa`.
pub fn normalize_preset_key(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Look up a paper preset by name.
///
/// Unknown names are a fatal configuration error; the message carries both
/// the original and the normalized key.
pub fn lookup_preset(name: &str) -> CroquisResult<PaperPreset> {
    let key = normalize_preset_key(name);
    PAPER_PRESETS
        .iter()
        .find(|(k, _, _, _)| *k == key)
        .map(|&(_, width, height, units)| PaperPreset {
            width,
            height,
            units,
        })
        .ok_or_else(|| {
            CroquisError::config(format!(
                "unknown dimensions preset '{name}' (normalized '{key}')"
            ))
        })
}
