use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::extraction::{ExtractionStats, SourceDocument, TextExtractor};

/// An upload that was staged on disk and produced usable text.
#[derive(Debug, Clone, Serialize)]
pub struct StagedDocument {
    pub id: Uuid,
    pub path: PathBuf,
    pub original_filename: String,
    pub extension: String,
    pub extracted_text: String,
    pub stats: ExtractionStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct FileService {
    upload_path: String,
}

impl FileService {
    pub fn new(upload_path: String) -> Self {
        Self { upload_path }
    }

    pub fn get_documents_path(&self) -> PathBuf {
        Path::new(&self.upload_path).join("documents")
    }

    /// Write `data` as `documents/<uuid>.<ext>` and return the id and path.
    pub async fn save_file(&self, filename: &str, data: &[u8]) -> Result<(Uuid, PathBuf)> {
        let file_id = Uuid::new_v4();
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let saved_filename = if extension.is_empty() {
            file_id.to_string()
        } else {
            format!("{}.{}", file_id, extension)
        };

        let documents_dir = self.get_documents_path();
        let file_path = documents_dir.join(&saved_filename);

        if let Err(e) = fs::create_dir_all(&documents_dir).await {
            error!("Failed to create documents directory: {}", e);
            return Err(anyhow::anyhow!("Failed to create documents directory: {}", e));
        }

        fs::write(&file_path, data)
            .await
            .with_context(|| format!("Failed to write staged upload {}", file_path.display()))?;

        Ok((file_id, file_path))
    }

    /// Remove a staged file. A file that is already gone is not an error.
    pub async fn delete_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(_) => {
                info!("Deleted file: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("File already deleted: {}", path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete file {}: {}", path.display(), e);
                Err(anyhow::anyhow!("Failed to delete file {}: {}", path.display(), e))
            }
        }
    }

    /// Stage an upload, extract its text, and discard the staged file when
    /// extraction fails. The returned error wraps the `ExtractionError`.
    pub async fn stage_and_extract(
        &self,
        extractor: &TextExtractor,
        original_filename: &str,
        data: &[u8],
    ) -> Result<StagedDocument> {
        let (id, path) = self.save_file(original_filename, data).await?;
        info!(
            "Staged upload '{}' ({} bytes) as {}",
            original_filename,
            data.len(),
            path.display()
        );

        let source = match SourceDocument::open(&path).await {
            Ok(source) => source,
            Err(e) => {
                self.discard_staged(&path).await;
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read staged upload '{}'", original_filename)));
            }
        };

        match extractor.extract_with_stats(&source).await {
            Ok(extracted) => Ok(StagedDocument {
                id,
                path,
                original_filename: original_filename.to_string(),
                extension: source.extension().to_string(),
                extracted_text: extracted.text,
                stats: extracted.stats,
                created_at: Utc::now(),
            }),
            Err(e) => {
                warn!(
                    "Extraction failed for '{}' [{}], removing staged file",
                    original_filename,
                    e.error_code()
                );
                self.discard_staged(&path).await;
                Err(anyhow::Error::new(e)
                    .context(format!("Failed to extract text from '{}'", original_filename)))
            }
        }
    }

    async fn discard_staged(&self, path: &Path) {
        if let Err(e) = self.delete_file(path).await {
            error!("Staged file {} could not be removed: {}", path.display(), e);
        }
    }
}
