//! Filesystem sink: encodes and writes descriptors on a dedicated worker
//! thread so save I/O never blocks the render thread, while the manager's
//! wait discipline keeps at most one save in flight.

use crate::export::descriptor::{ExportData, ExportDescriptor};
use crate::export::sink::{ExportSink, PendingSave, SaveCompletion, SavedExport};
use crate::foundation::error::{CroquisError, CroquisResult};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

struct SaveJob {
    descriptor: ExportDescriptor,
    done: SaveCompletion,
}

/// Sink that writes each descriptor as a file under one output directory.
///
/// Pixel payloads with a `.png` extension are PNG-encoded; byte payloads are
/// written verbatim. Sequence descriptors are checked for strictly increasing
/// frame order.
pub struct DirectorySink {
    dir: PathBuf,
    tx: Option<mpsc::Sender<SaveJob>>,
    worker: Option<JoinHandle<()>>,
    last_sequence_frame: Option<u64>,
}

impl DirectorySink {
    /// Create a sink writing into `dir`, spawning its worker thread.
    ///
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (tx, rx) = mpsc::channel::<SaveJob>();
        let worker_dir = dir.clone();
        let worker = std::thread::spawn(move || {
            for job in rx {
                job.done.complete(write_descriptor(&worker_dir, job.descriptor));
            }
        });
        Self {
            dir,
            tx: Some(tx),
            worker: Some(worker),
            last_sequence_frame: None,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
        if descriptor.sequence {
            if let Some(last) = self.last_sequence_frame {
                if descriptor.frame <= last {
                    return Err(CroquisError::export(format!(
                        "sequence frame {} arrived after frame {last}; \
                         frames must be strictly increasing",
                        descriptor.frame
                    )));
                }
            }
            self.last_sequence_frame = Some(descriptor.frame);
        } else {
            self.last_sequence_frame = None;
        }

        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| CroquisError::export("directory sink is already finalized"))?;
        let (done, pending) = PendingSave::deferred();
        tx.send(SaveJob { descriptor, done })
            .map_err(|_| CroquisError::export("directory sink worker is not accepting saves"))?;
        Ok(pending)
    }
}

impl Drop for DirectorySink {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn write_descriptor(dir: &Path, descriptor: ExportDescriptor) -> CroquisResult<SavedExport> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CroquisError::export(format!(
            "failed to create output directory '{}': {e}",
            dir.display()
        ))
    })?;
    let path = dir.join(&descriptor.file_name);

    match &descriptor.data {
        ExportData::Pixels(frame) => {
            if !descriptor.extension.eq_ignore_ascii_case(".png") {
                return Err(CroquisError::export(format!(
                    "pixel payloads only encode to .png, got '{}'",
                    descriptor.extension
                )));
            }
            let expected = frame.width as usize * frame.height as usize * 4;
            if frame.data.len() != expected {
                return Err(CroquisError::export(
                    "pixel payload size mismatch with width*height*4",
                ));
            }
            image::save_buffer_with_format(
                &path,
                &frame.data,
                frame.width,
                frame.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .map_err(|e| {
                CroquisError::export(format!("write png '{}': {e}", path.display()))
            })?;
        }
        ExportData::Bytes(bytes) => {
            std::fs::write(&path, bytes).map_err(|e| {
                CroquisError::export(format!("write '{}': {e}", path.display()))
            })?;
        }
    }

    Ok(SavedExport {
        file_name: descriptor.file_name,
        path: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelFrame;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("croquis_dir_sink_{tag}_{}", std::process::id()))
    }

    fn pixels_descriptor(name: &str, frame: u64, sequence: bool) -> ExportDescriptor {
        ExportDescriptor {
            file_name: name.to_owned(),
            extension: ".png".to_owned(),
            data: ExportData::Pixels(PixelFrame::new(2, 2)),
            frame,
            layer: 0,
            total_layers: 1,
            sequence,
        }
    }

    #[test]
    fn writes_png_and_raw_bytes() {
        let dir = temp_dir("write");
        let _ = std::fs::remove_dir_all(&dir);
        let mut sink = DirectorySink::new(&dir);

        let saved = sink
            .save(pixels_descriptor("frame.png", 0, false))
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(saved.path.as_deref(), Some(dir.join("frame.png").as_path()));
        assert!(dir.join("frame.png").exists());

        let bytes = ExportDescriptor {
            file_name: "meta.json".to_owned(),
            extension: ".json".to_owned(),
            data: ExportData::Bytes(b"{}".to_vec()),
            frame: 0,
            layer: 0,
            total_layers: 1,
            sequence: false,
        };
        sink.save(bytes).unwrap().wait().unwrap();
        assert_eq!(std::fs::read(dir.join("meta.json")).unwrap(), b"{}");

        drop(sink);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_out_of_order_sequence_frames() {
        let dir = temp_dir("order");
        let _ = std::fs::remove_dir_all(&dir);
        let mut sink = DirectorySink::new(&dir);

        sink.save(pixels_descriptor("0.png", 0, true))
            .unwrap()
            .wait()
            .unwrap();
        sink.save(pixels_descriptor("1.png", 1, true))
            .unwrap()
            .wait()
            .unwrap();
        let err = sink.save(pixels_descriptor("1b.png", 1, true)).unwrap_err();
        assert!(matches!(err, CroquisError::Export(_)));

        // A non-sequence export resets the guard.
        sink.save(pixels_descriptor("single.png", 0, false))
            .unwrap()
            .wait()
            .unwrap();
        sink.save(pixels_descriptor("0b.png", 0, true))
            .unwrap()
            .wait()
            .unwrap();

        drop(sink);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn pixel_payload_with_foreign_extension_fails() {
        let dir = temp_dir("ext");
        let _ = std::fs::remove_dir_all(&dir);
        let mut sink = DirectorySink::new(&dir);
        let mut descriptor = pixels_descriptor("frame.webp", 0, false);
        descriptor.extension = ".webp".to_owned();
        let err = sink.save(descriptor).unwrap().wait().unwrap_err();
        assert!(err.to_string().contains(".webp"));
        drop(sink);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
