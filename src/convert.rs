/// Batch conversion of DNG files to JPEG
///
/// The per-file loop lives here, away from the UI: it reports progress
/// through a callback so the caller decides where log lines go.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::ConvertError;
use crate::raw::RawDecoder;

/// Fixed JPEG quality for every output
pub const JPEG_QUALITY: u8 = 90;

/// Extension given to converted files
pub const OUTPUT_EXTENSION: &str = "jpg";

/// One run of the converter, built when the user presses Convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub folder: PathBuf,
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Converted,
    Skipped,
    Failed(String),
}

/// What happened to one discovered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub filename: String,
    pub output_name: String,
    pub outcome: FileOutcome,
}

/// Result of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub skipped: usize,
    pub errors: usize,
    pub records: Vec<FileRecord>,
}

impl ConversionSummary {
    /// Number of files the run saw; always converted + skipped + errors
    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.errors
    }

    fn record(&mut self, record: FileRecord) {
        match record.outcome {
            FileOutcome::Converted => self.converted += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed(_) => self.errors += 1,
        }
        self.records.push(record);
    }

    /// Records of the files that failed
    pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Failed(_)))
    }

    pub fn log_lines(&self) -> Vec<String> {
        vec![
            String::new(),
            "Conversion complete.".to_string(),
            format!("Converted: {}", self.converted),
            format!("Skipped (existing JPG): {}", self.skipped),
            format!("Errors: {}", self.errors),
        ]
    }

    /// Body of the completion dialog
    pub fn dialog_text(&self) -> String {
        format!(
            "Conversion complete.\n\nConverted: {}\nSkipped (existing JPG): {}\nErrors: {}",
            self.converted, self.skipped, self.errors
        )
    }
}

/// Progress reported while a job runs. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    Started { total: usize },
    Skipped { index: usize, total: usize, output_name: String },
    Converting { index: usize, total: usize, filename: String },
    Converted { index: usize, total: usize, filename: String },
    Failed { index: usize, total: usize, filename: String, message: String },
}

impl ConversionEvent {
    /// Lines this event adds to the log pane
    pub fn log_lines(&self) -> Vec<String> {
        match self {
            ConversionEvent::Started { total } => vec![
                format!("Found {} DNG file(s). Starting conversion...", total),
                String::new(),
            ],
            ConversionEvent::Skipped { index, total, output_name } => {
                vec![format!("[{}/{}] Skipping existing: {}", index, total, output_name)]
            }
            ConversionEvent::Converting { index, total, filename } => {
                vec![format!("[{}/{}] Converting: {}", index, total, filename)]
            }
            ConversionEvent::Converted { .. } => Vec::new(),
            ConversionEvent::Failed { filename, message, .. } => {
                vec![format!("  ERROR converting {}: {}", filename, message)]
            }
        }
    }
}

/// `<folder>/<basename>.jpg` for `<folder>/<basename>.<ext>`
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Encode an RGB raster as JPEG at `path`.
///
/// A file left half-written by a failed encode is removed.
pub fn encode_jpeg(raster: &RgbImage, path: &Path, quality: u8) -> Result<(), ConvertError> {
    let mut writer = BufWriter::new(File::create(path)?);

    let result = write_jpeg(raster, &mut writer, quality);
    drop(writer);

    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("could not remove partial output {}: {}", path.display(), e);
        }
    }
    result
}

fn write_jpeg<W: Write>(raster: &RgbImage, writer: &mut W, quality: u8) -> Result<(), ConvertError> {
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut *writer, quality);
        encoder.encode_image(raster)?;
    }
    writer.flush()?;
    Ok(())
}

/// Decode one RAW file and write it as JPEG
pub fn convert_file(
    decoder: &dyn RawDecoder,
    input: &Path,
    output: &Path,
) -> Result<(), ConvertError> {
    let raster = decoder.decode(input)?;
    encode_jpeg(&raster, output, JPEG_QUALITY)
}

/// Convert `files` one after another.
///
/// A failing file is recorded and the loop moves on; the run never
/// aborts early. Events are delivered in order through `on_event`.
pub fn run_job(
    job: &ConversionJob,
    files: &[PathBuf],
    decoder: &dyn RawDecoder,
    mut on_event: impl FnMut(ConversionEvent),
) -> ConversionSummary {
    let total = files.len();
    let mut summary = ConversionSummary::default();

    tracing::info!(
        "Starting conversion of {} file(s) in {} (overwrite: {})",
        total,
        job.folder.display(),
        job.overwrite
    );
    on_event(ConversionEvent::Started { total });

    for (i, input) in files.iter().enumerate() {
        let index = i + 1;
        let filename = input
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let output = output_path_for(input);
        let output_name = output
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        if output.exists() && !job.overwrite {
            tracing::info!("[{}/{}] Skipping existing: {}", index, total, output_name);
            on_event(ConversionEvent::Skipped { index, total, output_name: output_name.clone() });
            summary.record(FileRecord { filename, output_name, outcome: FileOutcome::Skipped });
            continue;
        }

        on_event(ConversionEvent::Converting { index, total, filename: filename.clone() });

        let outcome = match convert_file(decoder, input, &output) {
            Ok(()) => {
                tracing::info!("[{}/{}] ✅ {} -> {}", index, total, filename, output_name);
                on_event(ConversionEvent::Converted { index, total, filename: filename.clone() });
                FileOutcome::Converted
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("[{}/{}] ❌ {}: {:?}", index, total, filename, e);
                on_event(ConversionEvent::Failed {
                    index,
                    total,
                    filename: filename.clone(),
                    message: message.clone(),
                });
                FileOutcome::Failed(message)
            }
        };
        summary.record(FileRecord { filename, output_name, outcome });
    }

    tracing::info!(
        "📊 Conversion summary: {} converted, {} skipped, {} errors",
        summary.converted,
        summary.skipped,
        summary.errors
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawloaderDecoder;
    use crate::scan::scan_folder;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decodes any file to a small raster unless its content starts
    /// with "corrupt"
    #[derive(Default)]
    struct FakeDecoder {
        calls: AtomicUsize,
    }

    impl RawDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<RgbImage, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let bytes = fs::read(path)?;
            if bytes.starts_with(b"corrupt") {
                return Err(ConvertError::Decode("bad header".to_string()));
            }
            Ok(RgbImage::from_pixel(16, 8, Rgb([200, 120, 40])))
        }
    }

    fn folder_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn run(dir: &Path, overwrite: bool, decoder: &dyn RawDecoder) -> ConversionSummary {
        let job = ConversionJob { folder: dir.to_path_buf(), overwrite };
        let files = scan_folder(dir).unwrap();
        run_job(&job, &files, decoder, |_| {})
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(output_path_for(Path::new("/p/a.DNG")), PathBuf::from("/p/a.jpg"));
        assert_eq!(output_path_for(Path::new("/p/x.y.dng")), PathBuf::from("/p/x.y.jpg"));
    }

    #[test]
    fn test_converts_every_file() {
        let dir = folder_with(&[("a.DNG", "raw"), ("b.dng", "raw"), ("note.txt", "")]);
        let decoder = FakeDecoder::default();

        let summary = run(dir.path(), false, &decoder);
        assert_eq!((summary.converted, summary.skipped, summary.errors), (2, 0, 0));
        assert_eq!(summary.total(), 2);

        let jpg = image::open(dir.path().join("a.jpg")).unwrap();
        assert_eq!((jpg.width(), jpg.height()), (16, 8));
        assert!(dir.path().join("b.jpg").exists());
        assert!(!dir.path().join("note.jpg").exists());
    }

    #[test]
    fn test_existing_outputs_are_skipped() {
        let dir = folder_with(&[
            ("a.dng", "raw"),
            ("b.dng", "raw"),
            ("c.dng", "raw"),
            ("a.jpg", "old"),
            ("c.jpg", "old"),
        ]);
        let decoder = FakeDecoder::default();

        let summary = run(dir.path(), false, &decoder);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.converted, 1);
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"old");
    }

    #[test]
    fn test_rerun_without_overwrite_is_idempotent() {
        let dir = folder_with(&[("a.dng", "raw"), ("b.dng", "raw")]);
        let decoder = FakeDecoder::default();

        let first = run(dir.path(), false, &decoder);
        assert_eq!(first.converted, 2);

        let second = run(dir.path(), false, &decoder);
        assert_eq!((second.converted, second.skipped, second.errors), (0, 2, 0));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_overwrite_reprocesses_everything() {
        let dir = folder_with(&[("a.dng", "raw"), ("b.dng", "raw"), ("a.jpg", "old")]);
        let decoder = FakeDecoder::default();

        run(dir.path(), false, &decoder);
        let summary = run(dir.path(), true, &decoder);
        assert_eq!((summary.converted, summary.skipped, summary.errors), (2, 0, 0));
        assert_ne!(fs::read(dir.path().join("a.jpg")).unwrap(), b"old");
    }

    #[test]
    fn test_corrupt_file_does_not_stop_the_batch() {
        let dir = folder_with(&[
            ("a.dng", "raw"),
            ("bad.dng", "corrupt data"),
            ("c.dng", "raw"),
        ]);
        let decoder = FakeDecoder::default();

        let summary = run(dir.path(), false, &decoder);
        assert_eq!((summary.converted, summary.skipped, summary.errors), (2, 0, 1));
        assert_eq!(summary.total(), 3);
        assert!(dir.path().join("a.jpg").exists());
        assert!(dir.path().join("c.jpg").exists());
        assert!(!dir.path().join("bad.jpg").exists());

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        let failed = failures[0];
        assert_eq!(failed.filename, "bad.dng");
        assert_eq!(failed.output_name, "bad.jpg");
        assert_eq!(failed.outcome, FileOutcome::Failed("failed to decode RAW: bad header".to_string()));
    }

    #[test]
    fn test_real_decoder_rejects_garbage() {
        let dir = folder_with(&[("broken.dng", "definitely not a DNG")]);

        let summary = run(dir.path(), false, &RawloaderDecoder);
        assert_eq!((summary.converted, summary.skipped, summary.errors), (0, 0, 1));
        assert!(!dir.path().join("broken.jpg").exists());
    }

    #[test]
    fn test_empty_folder_reports_zero_counters() {
        let dir = folder_with(&[("readme.md", "")]);
        let mut events = Vec::new();
        let job = ConversionJob { folder: dir.path().to_path_buf(), overwrite: false };

        let summary = run_job(&job, &[], &FakeDecoder::default(), |e| events.push(e));
        assert_eq!(summary, ConversionSummary::default());
        assert_eq!(events, vec![ConversionEvent::Started { total: 0 }]);
    }

    #[test]
    fn test_events_and_log_lines() {
        let dir = folder_with(&[("a.dng", "raw"), ("a.jpg", "old")]);
        let files = vec![dir.path().join("a.dng"), dir.path().join("z.dng")];
        fs::write(&files[1], b"corrupt").unwrap();
        let job = ConversionJob { folder: dir.path().to_path_buf(), overwrite: false };

        let mut lines = Vec::new();
        let summary = run_job(&job, &files, &FakeDecoder::default(), |e| lines.extend(e.log_lines()));
        lines.extend(summary.log_lines());

        assert_eq!(
            lines,
            vec![
                "Found 2 DNG file(s). Starting conversion...",
                "",
                "[1/2] Skipping existing: a.jpg",
                "[2/2] Converting: z.dng",
                "  ERROR converting z.dng: failed to decode RAW: bad header",
                "",
                "Conversion complete.",
                "Converted: 0",
                "Skipped (existing JPG): 1",
                "Errors: 1",
            ]
        );
        assert_eq!(
            summary.dialog_text(),
            "Conversion complete.\n\nConverted: 0\nSkipped (existing JPG): 1\nErrors: 1"
        );
    }

    #[test]
    fn test_encode_jpeg_writes_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let raster = RgbImage::from_pixel(32, 24, Rgb([10, 200, 30]));

        encode_jpeg(&raster, &path, JPEG_QUALITY).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_failed_encode_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("too_wide.jpg");
        // Wider than the JPEG format allows
        let raster = RgbImage::new(70_000, 1);

        let result = encode_jpeg(&raster, &path, JPEG_QUALITY);
        assert!(matches!(result, Err(ConvertError::Encode(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_encode_jpeg_to_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.jpg");
        let raster = RgbImage::new(2, 2);

        assert!(matches!(encode_jpeg(&raster, &path, JPEG_QUALITY), Err(ConvertError::Io(_))));
    }
}
