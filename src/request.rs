//! Per-request plumbing around the pipeline: where the upload comes from,
//! where the card goes, and the scratch file in between.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::pipeline::{PaletteCard, PaletteCardPipeline};

/// Supplies the raw bytes of an uploaded image.
pub trait ImageSource {
    fn fetch(&mut self) -> Result<Vec<u8>>;
}

/// Receives the finished card.
pub trait ResponseSink {
    fn send(&mut self, png: &[u8], caption: &str) -> Result<()>;
}

/// Reads an image from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileSource {
    fn fetch(&mut self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// An uploaded image parked on disk for the duration of one request.
///
/// The file name starts with the request id so concurrent requests never
/// collide. The file is removed when the value is dropped, on success and
/// on every error path alike.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
}

impl TempUpload {
    pub fn create(dir: &Path, request_id: &str, bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}_", sanitize_id(request_id)))
            .suffix(".upload")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), size = bytes.len(), "Stored upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.path())?)
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "Removing upload");
    }
}

fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "request".to_string()
    } else {
        cleaned
    }
}

/// Fetch one upload, run it through `pipeline` and deliver the card.
pub fn handle_request(
    source: &mut dyn ImageSource,
    sink: &mut dyn ResponseSink,
    pipeline: &PaletteCardPipeline,
    scratch_dir: &Path,
    request_id: &str,
) -> Result<PaletteCard> {
    let bytes = source.fetch()?;
    let upload = TempUpload::create(scratch_dir, request_id, &bytes)?;
    let card = pipeline.run(&upload.read()?)?;
    sink.send(&card.png, &card.caption)?;
    tracing::info!(request = request_id, colors = card.palette.len(), "Request handled");
    Ok(card)
}
