use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::extraction::error::{ExtractionError, ToolError};
use crate::extraction::repair::repair;
use crate::extraction::stats::ExtractionStats;
use crate::extraction::MIN_STAGE_CHARS;

const SCRATCH_PDF_NAME: &str = "input.pdf";

/// Turns a PDF on disk into page images inside `out_dir`.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ToolError>;
}

/// Recognizes the text of a single image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String, ToolError>;
}

/// Run an external tool to completion, killing it if the deadline passes.
async fn run_tool(
    mut command: Command,
    tool: &str,
    timeout: Duration,
) -> Result<Output, ToolError> {
    command.stdin(Stdio::null()).kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ToolError::Timeout {
            tool: tool.to_string(),
            timeout,
        })?
        .map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// PNG images in `dir`, or JPEG images when there are no PNGs, sorted by name.
async fn list_images(dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let mut png = Vec::new();
    let mut jpeg = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("png") => png.push(path),
            Some("jpg") | Some("jpeg") => jpeg.push(path),
            _ => {}
        }
    }

    let mut images = if png.is_empty() { jpeg } else { png };
    images.sort();
    Ok(images)
}

/// `pdfimages -png`, falling back to ImageMagick `convert -density N`.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    pub pdfimages_bin: String,
    pub convert_bin: String,
    pub density: u32,
    pub timeout: Duration,
}

impl CommandRasterizer {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            pdfimages_bin: config.pdfimages_bin.clone(),
            convert_bin: config.convert_bin.clone(),
            density: config.rasterize_density,
            timeout: config.rasterize_timeout,
        }
    }

    async fn run_pdfimages(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
        let mut command = Command::new(&self.pdfimages_bin);
        command.arg("-png").arg(pdf).arg(out_dir.join("page"));
        run_tool(command, &self.pdfimages_bin, self.timeout).await?;
        list_images(out_dir).await
    }

    async fn run_convert(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
        let mut command = Command::new(&self.convert_bin);
        command
            .arg("-density")
            .arg(self.density.to_string())
            .arg(pdf)
            .arg(out_dir.join("page-%03d.png"));
        run_tool(command, &self.convert_bin, self.timeout).await?;
        list_images(out_dir).await
    }
}

#[async_trait]
impl Rasterizer for CommandRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
        match self.run_pdfimages(pdf, out_dir).await {
            Ok(images) if !images.is_empty() => return Ok(images),
            Ok(_) => info!(
                "{} extracted no images, trying {}",
                self.pdfimages_bin, self.convert_bin
            ),
            Err(e) => warn!(
                "{} failed ({}), trying {}",
                self.pdfimages_bin, e, self.convert_bin
            ),
        }

        let images = self.run_convert(pdf, out_dir).await?;
        if images.is_empty() {
            return Err(ToolError::NoOutput {
                tool: self.convert_bin.clone(),
            });
        }
        Ok(images)
    }
}

/// Tesseract CLI writing recognized text to stdout.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    pub tesseract_bin: String,
    pub language: String,
    pub timeout: Duration,
}

impl TesseractEngine {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            tesseract_bin: config.tesseract_bin.clone(),
            language: config.ocr_language.clone(),
            timeout: config.ocr_timeout,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &Path) -> Result<String, ToolError> {
        let mut command = Command::new(&self.tesseract_bin);
        command
            .arg(image)
            .arg("stdout")
            .arg("-c")
            .arg("preserve_interword_spaces=1");
        if !self.language.is_empty() {
            command.arg("-l").arg(&self.language);
        }

        let output = run_tool(command, &self.tesseract_bin, self.timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Last stage of the chain: rasterize every page and OCR the images.
#[derive(Clone)]
pub struct OcrFallback {
    rasterizer: Arc<dyn Rasterizer>,
    engine: Arc<dyn OcrEngine>,
}

impl OcrFallback {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self { rasterizer, engine }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            Arc::new(CommandRasterizer::from_config(config)),
            Arc::new(TesseractEngine::from_config(config)),
        )
    }

    /// OCR `pdf_bytes` inside a scratch directory that is removed on every exit path.
    pub async fn extract(
        &self,
        pdf_bytes: &[u8],
        stats: &mut ExtractionStats,
    ) -> Result<String, ExtractionError> {
        let scratch = tempfile::Builder::new()
            .prefix("resume-ocr-")
            .tempdir()
            .map_err(|e| ExtractionError::RasterizationFailed {
                details: format!("failed to create scratch directory: {}", e),
            })?;
        let scratch_path = scratch.path().to_path_buf();

        let outcome = self.extract_in(&scratch_path, pdf_bytes, stats).await;

        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove OCR scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }

        outcome
    }

    async fn extract_in(
        &self,
        scratch: &Path,
        pdf_bytes: &[u8],
        stats: &mut ExtractionStats,
    ) -> Result<String, ExtractionError> {
        let pdf_path = scratch.join(SCRATCH_PDF_NAME);
        tokio::fs::write(&pdf_path, pdf_bytes)
            .await
            .map_err(|e| ExtractionError::RasterizationFailed {
                details: format!("failed to stage PDF for rasterization: {}", e),
            })?;

        let images = self
            .rasterizer
            .rasterize(&pdf_path, scratch)
            .await
            .map_err(|e| ExtractionError::RasterizationFailed {
                details: e.to_string(),
            })?;

        if images.is_empty() {
            return Err(ExtractionError::RasterizationFailed {
                details: "no page images were produced".to_string(),
            });
        }
        stats.ocr_images = images.len();
        info!("Running OCR on {} page images", images.len());

        let mut combined = String::new();
        for image in &images {
            match self.engine.recognize(image).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        debug!("No text recognized in {}", image.display());
                        continue;
                    }
                    combined.push_str(text);
                    combined.push_str("\n\n");
                    stats.ocr_images_recognized += 1;
                }
                Err(e) => {
                    warn!("OCR failed on {}, skipping: {}", image.display(), e);
                }
            }
        }

        let chars = combined.trim().chars().count();
        if chars < MIN_STAGE_CHARS {
            return Err(ExtractionError::OcrInsufficientText { chars });
        }

        Ok(repair(&combined))
    }
}
