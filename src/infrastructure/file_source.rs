// Recording file source
use crate::application::line_source::{text_line, LineSource};
use crate::domain::error::IngestError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads a recording line by line.
///
/// The first line is the manifest declaration and is held back; `next_line`
/// yields the data lines that follow, skipping blank ones. Re-open the file
/// to replay it from the start.
pub struct FileLineSource {
    path: PathBuf,
    manifest_line: String,
    reader: BufReader<File>,
    // Bytes of a line whose read was cancelled part way.
    pending: Vec<u8>,
}

impl FileLineSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| IngestError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;

        let mut source = Self {
            path,
            manifest_line: String::new(),
            reader: BufReader::new(file),
            pending: Vec::new(),
        };

        let raw = source
            .read_raw()
            .await
            .map_err(|e| IngestError::SourceUnavailable(format!("{}: {}", source.path.display(), e)))?
            .ok_or_else(|| {
                IngestError::MalformedManifest(format!("{} is empty", source.path.display()))
            })?;
        source.manifest_line = text_line(raw).map_err(|e| {
            IngestError::MalformedManifest(format!("{}: {}", source.path.display(), e))
        })?;

        tracing::debug!("Opened recording {}", source.path.display());
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest_line(&self) -> &str {
        &self.manifest_line
    }

    /// Next line as raw bytes, or `None` at end of file.
    async fn read_raw(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending)))
    }
}

#[async_trait]
impl LineSource for FileLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, IngestError> {
        loop {
            let raw = match self.read_raw().await {
                Ok(Some(raw)) => raw,
                Ok(None) => return Ok(None),
                Err(e) => {
                    return Err(IngestError::StreamInterrupted(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    )))
                }
            };

            match text_line(raw) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Ok(Some(line)),
                Err(e) => {
                    return Err(IngestError::MalformedSample(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    )))
                }
            }
        }
    }

    fn describe(&self) -> String {
        format!("recording {}", self.path.display())
    }
}
