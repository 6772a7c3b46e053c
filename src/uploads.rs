// ABOUTME: Credential document storage for professional signups
// ABOUTME: PDF-only, sanitized filenames, atomic writes with cleanup on failure
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Credential document store.
//!
//! Professional signups attach a credential file. Only the `pdf` extension is
//! accepted; the filename is reduced to a safe basename before it touches the
//! filesystem. The payload is written to a temporary sibling and renamed into
//! place, and the temporary file is removed on any failure, so partial writes
//! are never observable.

use crate::errors::{AppError, AppResult};
use rand::{distributions::Alphanumeric, Rng};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Server-controlled asset directory for professional credentials
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open (creating if needed) the asset directory
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::storage(format!("cannot create upload dir: {e}")))?;
        Ok(Self { root })
    }

    /// The asset directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a credential document under its sanitized filename and return
    /// that name. Rejects anything that is not a `.pdf`.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> AppResult<String> {
        let filename = sanitize_filename(original_name)?;
        if !has_pdf_extension(&filename) {
            return Err(AppError::invalid_input(
                "invalid file type: only PDF files are allowed",
            ));
        }

        let destination = self.root.join(&filename);
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let staging = self.root.join(format!(".{filename}.{suffix}.part"));

        if let Err(e) = write_all(&staging, data).await {
            // Best-effort cleanup of the partial write
            let _ = fs::remove_file(&staging).await;
            return Err(AppError::storage(format!("credential upload failed: {e}")));
        }

        if let Err(e) = fs::rename(&staging, &destination).await {
            let _ = fs::remove_file(&staging).await;
            return Err(AppError::storage(format!(
                "credential upload could not be finalized: {e}"
            )));
        }

        Ok(filename)
    }

    /// Remove a stored credential document. A missing file is not an
    /// error; removal backs out signups that failed after the upload.
    pub async fn remove(&self, filename: &str) -> AppResult<()> {
        let filename = sanitize_filename(filename)?;
        match fs::remove_file(self.root.join(&filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(format!(
                "could not remove credential: {e}"
            ))),
        }
    }
}

async fn write_all(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

/// Whether the filename carries the one permitted extension
#[must_use]
pub fn has_pdf_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reduce an untrusted filename to a safe basename: strip any path
/// components, keep only alphanumerics plus `.`, `-`, `_`, and refuse names
/// that sanitize away to nothing
pub fn sanitize_filename(original: &str) -> AppResult<String> {
    let basename = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = basename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();

    if cleaned.is_empty() {
        return Err(AppError::invalid_input("missing or unusable filename"));
    }
    Ok(cleaned)
}
