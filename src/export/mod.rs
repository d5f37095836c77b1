pub mod descriptor;
pub mod dir;
pub mod sink;

pub use descriptor::{
    ExportData, ExportDescriptor, ExportNaming, resolve_file_name, sequence_digits,
    timestamp_name, zero_pad,
};
pub use dir::DirectorySink;
pub use sink::{ExportSink, MemorySink, PendingSave, SaveCompletion, SavedExport};
