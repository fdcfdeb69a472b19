// src/storage/mod.rs
use crate::export::ExportArtifact;
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Saves the workbook bytes as `<file_id>.xlsx` under the base directory
    pub fn save_export(&self, artifact: &ExportArtifact) -> Result<PathBuf, StorageError> {
        let file_path = self.export_path(artifact.file_id);

        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(&artifact.content)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved export to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves the artifact metadata sidecar in JSON format
    pub fn save_export_metadata(&self, artifact: &ExportArtifact) -> Result<PathBuf, StorageError> {
        let file_path = self
            .base_dir
            .join(format!("{}_meta.json", artifact.file_id));

        let metadata = serde_json::json!({
            "file_id": artifact.file_id,
            "download_name": artifact.download_name,
            "record_count": artifact.record_count,
            "content_length": artifact.content.len(),
            "export_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }

    /// Path where the workbook for `file_id` lives (or would live).
    pub fn export_path(&self, file_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.xlsx", file_id))
    }

    /// Checks whether the workbook for `file_id` exists on disk.
    pub fn export_exists(&self, file_id: Uuid) -> bool {
        self.export_path(file_id).is_file()
    }

    /// Deletes stored exports and metadata sidecars older than
    /// `max_age_hours`. Entries that cannot be inspected are skipped rather
    /// than aborting the sweep.
    pub fn cleanup_expired(&self, max_age_hours: i64) -> Result<usize, StorageError> {
        let now = chrono::Utc::now();
        let mut deleted = 0usize;

        for entry in fs::read_dir(&self.base_dir).map_err(StorageError::IoError)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            let age = now - chrono::DateTime::<chrono::Utc>::from(modified);
            if age.num_hours() >= max_age_hours && fs::remove_file(&path).is_ok() {
                tracing::debug!("Deleted expired artifact {}", path.display());
                deleted += 1;
            }
        }

        if deleted > 0 {
            tracing::info!("Cleaned up {} expired export artifact(s)", deleted);
        }

        Ok(deleted)
    }
}
