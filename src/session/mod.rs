pub mod manager;
pub mod reload;

pub use manager::{
    ExportFrameOpts, Hotkey, ManagerOpts, PendingExport, RecordInterrupt, RecordStats,
    SketchManager, load,
};
pub use reload::ReloadRegistry;
