//! Local OCR through the `tesseract` command-line program.
//!
//! The image is written to a scratch file, the program is run as
//! `tesseract <input> <output-base> -l <language>`, and the text is read back
//! from `<output-base>.txt`. Scratch names carry a random suffix so concurrent
//! requests never share files, and [`ScratchFiles`] removes them on drop.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use uuid::Uuid;

use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError, OcrOutput};

pub const DEFAULT_EXECUTABLE: &str = "tesseract";
/// Simplified Chinese plus English.
pub const DEFAULT_LANGUAGE: &str = "chi_sim+eng";

pub struct TesseractRecognizer {
    executable: String,
    language: String,
    preprocess: bool,
    scratch_dir: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(executable: &str, language: &str) -> Self {
        Self {
            executable: executable.to_string(),
            language: language.to_string(),
            preprocess: false,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Convert the image to high-contrast grayscale PNG before recognition.
    pub fn with_preprocess(mut self, preprocess: bool) -> Self {
        self.preprocess = preprocess;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTABLE, DEFAULT_LANGUAGE)
    }
}

impl OcrBackend for TesseractRecognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        if image_bytes.is_empty() {
            return Err(OcrError::EmptyImage);
        }

        let prepared;
        let input_bytes = if self.preprocess {
            prepared = preprocess::prepare_for_ocr(image_bytes)?;
            prepared.as_slice()
        } else {
            image_bytes
        };

        let scratch = ScratchFiles::new(&self.scratch_dir);
        tokio::fs::write(&scratch.input, input_bytes).await?;

        let output = Command::new(&self.executable)
            .arg(&scratch.input)
            .arg(&scratch.output_base)
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::ExecutableNotFound(self.executable.clone()),
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!("{} exited with {}: {stderr}", self.executable, output.status);
            return Err(OcrError::ProcessFailed { status: output.status.to_string(), stderr });
        }

        let text = tokio::fs::read_to_string(scratch.text_output()).await?;
        Ok(OcrOutput::Text(text.trim().to_string()))
    }
}

/// Per-invocation input and output paths, deleted when dropped.
struct ScratchFiles {
    input: PathBuf,
    output_base: PathBuf,
}

impl ScratchFiles {
    fn new(dir: &Path) -> Self {
        let stem = format!("billsnap-ocr-{}", Uuid::new_v4().simple());
        Self {
            input: dir.join(format!("{stem}.img")),
            output_base: dir.join(format!("{stem}-out")),
        }
    }

    fn text_output(&self) -> PathBuf {
        let mut name = self.output_base.clone().into_os_string();
        name.push(".txt");
        PathBuf::from(name)
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.text_output()] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove OCR scratch file {}: {e}", path.display());
                }
            }
        }
    }
}
