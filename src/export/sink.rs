//! Sink contract for export I/O, the system's only asynchronous boundary.

use crate::export::descriptor::ExportDescriptor;
use crate::foundation::error::{CroquisError, CroquisResult};
use std::path::PathBuf;
use std::sync::mpsc;

/// Result of one completed save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedExport {
    /// File name the export resolved to.
    pub file_name: String,
    /// Destination path, for sinks that write to a filesystem.
    pub path: Option<PathBuf>,
}

/// Completion handle for one dispatched save.
///
/// The recording sequencer waits on this before scheduling the next frame,
/// which is the system's backpressure point: at most one save is ever in
/// flight and output ordering matches frame order. Dropping a `PendingSave`
/// without waiting does not abort the underlying save.
#[derive(Debug)]
pub struct PendingSave(PendingSaveInner);

#[derive(Debug)]
enum PendingSaveInner {
    Ready(CroquisResult<SavedExport>),
    Channel(mpsc::Receiver<CroquisResult<SavedExport>>),
}

impl PendingSave {
    /// A save that completed synchronously.
    pub fn ready(result: CroquisResult<SavedExport>) -> Self {
        Self(PendingSaveInner::Ready(result))
    }

    /// A save completed later through the returned [`SaveCompletion`].
    pub fn deferred() -> (SaveCompletion, Self) {
        let (tx, rx) = mpsc::channel();
        (SaveCompletion { tx }, Self(PendingSaveInner::Channel(rx)))
    }

    /// Block until the save completes.
    pub fn wait(self) -> CroquisResult<SavedExport> {
        match self.0 {
            PendingSaveInner::Ready(result) => result,
            PendingSaveInner::Channel(rx) => rx.recv().map_err(|_| {
                CroquisError::export("save worker disconnected before completing")
            })?,
        }
    }
}

/// Completion side of a deferred [`PendingSave`].
#[derive(Debug)]
pub struct SaveCompletion {
    tx: mpsc::Sender<CroquisResult<SavedExport>>,
}

impl SaveCompletion {
    /// Resolve the paired [`PendingSave`]. A dropped waiter is not an error.
    pub fn complete(self, result: CroquisResult<SavedExport>) {
        let _ = self.tx.send(result);
    }
}

/// Consumer of export descriptors.
///
/// `save` dispatches the descriptor and returns immediately; the I/O may
/// complete later. Callers that need ordering wait on the returned handle.
pub trait ExportSink: Send {
    /// Dispatch one descriptor.
    fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave>;
}

/// In-memory sink for tests and debugging: completes synchronously and keeps
/// every descriptor in dispatch order.
#[derive(Debug, Default)]
pub struct MemorySink {
    saves: Vec<ExportDescriptor>,
}

impl MemorySink {
    /// Create an empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors in dispatch order.
    pub fn saves(&self) -> &[ExportDescriptor] {
        &self.saves
    }
}

impl ExportSink for MemorySink {
    fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
        let saved = SavedExport {
            file_name: descriptor.file_name.clone(),
            path: None,
        };
        self.saves.push(descriptor);
        Ok(PendingSave::ready(Ok(saved)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::descriptor::ExportData;

    fn descriptor(name: &str) -> ExportDescriptor {
        ExportDescriptor {
            file_name: name.to_owned(),
            extension: ".png".to_owned(),
            data: ExportData::Bytes(vec![1, 2, 3]),
            frame: 0,
            layer: 0,
            total_layers: 1,
            sequence: false,
        }
    }

    #[test]
    fn memory_sink_completes_synchronously_in_order() {
        let mut sink = MemorySink::new();
        for name in ["a.png", "b.png"] {
            let saved = sink.save(descriptor(name)).unwrap().wait().unwrap();
            assert_eq!(saved.file_name, name);
            assert_eq!(saved.path, None);
        }
        let names: Vec<_> = sink.saves().iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn deferred_save_resolves_through_completion() {
        let (done, pending) = PendingSave::deferred();
        let handle = std::thread::spawn(move || pending.wait());
        done.complete(Ok(SavedExport {
            file_name: "x.png".to_owned(),
            path: None,
        }));
        let saved = handle.join().unwrap().unwrap();
        assert_eq!(saved.file_name, "x.png");
    }

    #[test]
    fn dropped_completion_surfaces_as_export_error() {
        let (done, pending) = PendingSave::deferred();
        drop(done);
        assert!(matches!(pending.wait(), Err(CroquisError::Export(_))));
    }
}
