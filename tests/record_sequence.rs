//! Recording sequencer properties: exactly one save in flight, output order
//! matching frame order, and real files on disk through the directory sink.

use croquis::{
    BoxedSketch, CroquisResult, Dimensions, ExportDescriptor, ExportSink, ManagerOpts,
    PendingSave, PixelSurface, Props, RenderOutput, SavedExport, Settings, Viewport, load,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn solid_sketch_factory(_props: &Props) -> CroquisResult<BoxedSketch<PixelSurface>> {
    let render = |props: &Props, surface: &mut PixelSurface| -> CroquisResult<RenderOutput> {
        let shade = (props.playhead * 255.0) as u8;
        surface.clear([shade, 0, 255 - shade, 255]);
        Ok(RenderOutput::Surface)
    };
    Ok(Box::new(render))
}

fn bounded_settings(total_frames: u64) -> Settings {
    Settings {
        dimensions: Some(Dimensions::Pair([16.0, 16.0])),
        fps: 6.0,
        total_frames: Some(total_frames),
        animate: true,
        ..Default::default()
    }
}

/// Sink that completes each save on its own thread after a delay, tracking
/// how many saves ever overlap.
#[derive(Clone)]
struct ThreadedSink {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    completed: Arc<Mutex<Vec<u64>>>,
}

impl ThreadedSink {
    fn new() -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ExportSink for ThreadedSink {
    fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
        let (done, pending) = PendingSave::deferred();
        let in_flight = self.in_flight.clone();
        let max_in_flight = self.max_in_flight.clone();
        let completed = self.completed.clone();
        std::thread::spawn(move || {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(3));
            completed.lock().unwrap().push(descriptor.frame);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            done.complete(Ok(SavedExport {
                file_name: descriptor.file_name,
                path: None,
            }));
        });
        Ok(pending)
    }
}

#[test]
fn record_serializes_saves_with_at_most_one_in_flight() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let sink = ThreadedSink::new();
    let mut manager = load(
        solid_sketch_factory,
        bounded_settings(12),
        PixelSurface::new(1, 1),
        ManagerOpts {
            viewport: Viewport::default(),
            sink: Box::new(sink.clone()),
        },
    )
    .unwrap();

    let stats = manager.record().unwrap();
    assert_eq!(stats.frames_total, 12);
    assert_eq!(stats.frames_exported, 12);
    assert!(stats.completed);

    let completed = sink.completed.lock().unwrap().clone();
    assert_eq!(
        completed,
        (0..12).collect::<Vec<_>>(),
        "saves complete in strictly increasing frame order"
    );
    assert_eq!(
        sink.max_in_flight.load(Ordering::SeqCst),
        1,
        "the sequencer must wait out each save before scheduling the next"
    );
}

#[test]
fn sequence_file_names_are_padded_to_the_frame_total() {
    #[derive(Clone, Default)]
    struct NameSink(Arc<Mutex<Vec<String>>>);
    impl ExportSink for NameSink {
        fn save(&mut self, descriptor: ExportDescriptor) -> CroquisResult<PendingSave> {
            self.0.lock().unwrap().push(descriptor.file_name.clone());
            Ok(PendingSave::ready(Ok(SavedExport {
                file_name: descriptor.file_name,
                path: None,
            })))
        }
    }

    let sink = NameSink::default();
    let mut manager = load(
        solid_sketch_factory,
        bounded_settings(12),
        PixelSurface::new(1, 1),
        ManagerOpts {
            viewport: Viewport::default(),
            sink: Box::new(sink.clone()),
        },
    )
    .unwrap();
    manager.record().unwrap();

    let names = sink.0.lock().unwrap().clone();
    assert_eq!(names.first().map(String::as_str), Some("00.png"));
    assert_eq!(names.last().map(String::as_str), Some("11.png"));
    assert!(names.iter().all(|n| n.len() == "00.png".len()));
}

#[test]
fn record_writes_decodable_pngs_through_the_directory_sink() {
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "croquis_record_it_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);

    let mut manager = load(
        solid_sketch_factory,
        bounded_settings(4),
        PixelSurface::new(1, 1),
        ManagerOpts {
            viewport: Viewport::default(),
            sink: Box::new(croquis::DirectorySink::new(&dir)),
        },
    )
    .unwrap();
    let stats = manager.record().unwrap();
    assert!(stats.completed);

    for frame in 0..4 {
        let path = dir.join(format!("{frame}.png"));
        let (w, h) = image::image_dimensions(&path)
            .unwrap_or_else(|e| panic!("decode {}: {e}", path.display()));
        assert_eq!((w, h), (16, 16));
    }
    let _ = std::fs::remove_dir_all(&dir);
}
