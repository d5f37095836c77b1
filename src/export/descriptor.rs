//! Export descriptors and file-name resolution.

use crate::surface::PixelFrame;

/// Payload of one export descriptor.
#[derive(Clone, Debug)]
pub enum ExportData {
    /// Straight-alpha RGBA8 pixels, encoded by the sink.
    Pixels(PixelFrame),
    /// Pre-encoded bytes written verbatim.
    Bytes(Vec<u8>),
}

/// One named, serialized file produced from a render's return value.
#[derive(Clone, Debug)]
pub struct ExportDescriptor {
    /// Resolved file name, extension included.
    pub file_name: String,
    /// File extension including the dot.
    pub extension: String,
    /// Payload.
    pub data: ExportData,
    /// Frame index the descriptor was captured at.
    pub frame: u64,
    /// 0-based layer index within this export.
    pub layer: usize,
    /// Number of layers in this export.
    pub total_layers: usize,
    /// Whether this descriptor belongs to a frame-sequence recording.
    pub sequence: bool,
}

/// Naming inputs for one export call, joined around the base name.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExportNaming<'a> {
    /// Part joined before the base name.
    pub prefix: Option<&'a str>,
    /// Part joined after the hash.
    pub suffix: Option<&'a str>,
    /// Opaque hash part (e.g. a VCS commit) joined after the layer index.
    pub hash: Option<&'a str>,
}

/// Resolve a single-export or sequence-frame file name.
///
/// Non-empty parts are joined with `-`:
/// `{prefix}-{base}-{layer if total > 1}-{hash}-{suffix}{extension}`, where
/// `base` is the zero-padded frame index for sequence exports and otherwise
/// the configured name or a timestamp.
pub fn resolve_file_name(
    naming: &ExportNaming<'_>,
    base: &str,
    layer: usize,
    total_layers: usize,
    extension: &str,
) -> String {
    let layer_part = (total_layers > 1).then(|| layer.to_string());
    let parts: Vec<&str> = [
        naming.prefix,
        Some(base),
        layer_part.as_deref(),
        naming.hash,
        naming.suffix,
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect();
    format!("{}{}", parts.join("-"), extension)
}

/// Zero-pad a sequence frame index to the given width.
pub fn zero_pad(frame: u64, digits: usize) -> String {
    format!("{frame:0digits$}")
}

/// Sequence padding width: the digit count of the frame total.
pub fn sequence_digits(total_frames: u64) -> usize {
    total_frames.max(1).to_string().len()
}

/// Timestamp base name used when no explicit name is configured.
pub fn timestamp_name() -> String {
    chrono::Local::now().format("%Y.%m.%d-%H.%M.%S").to_string()
}

/// Normalize an extension to include the leading dot.
pub(crate) fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_owned()
    } else {
        format!(".{ext}")
    }
}
