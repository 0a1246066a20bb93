//! Document ingestion handlers
//!
//! Uploads documents into a backend folder: plain text via `/store-text`,
//! scanned PDFs via `/ocr-pdf`. Text extraction and OCR happen entirely on
//! the backend; this side only reads the file and ships the bytes.

use crate::client::{HttpBackend, IngestReceipt};
use crate::config::Config;
use crate::error::{FolioError, Result};
use colored::Colorize;
use std::path::Path;

/// Upload a plain-text file into a folder
pub async fn run_ingest_text(
    config: &Config,
    file: &Path,
    folder: &str,
    title: Option<String>,
    author: Option<String>,
) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    let filename = file_name_or(file, "unknown.txt");
    let text = tokio::fs::read_to_string(file).await?;

    println!("Uploading {} into \"{}\"...", filename.cyan(), folder);
    let receipt = backend
        .store_text(&text, &filename, folder, title.as_deref(), author.as_deref())
        .await?;

    report_receipt(&receipt)
}

/// Upload a scanned PDF into a folder for backend OCR
pub async fn run_ingest_pdf(
    config: &Config,
    file: &Path,
    folder: &str,
    title: Option<String>,
    author: Option<String>,
) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    let filename = file_name_or(file, "unknown.pdf");
    let bytes = tokio::fs::read(file).await?;

    println!(
        "Uploading {} ({} bytes) into \"{}\" for OCR...",
        filename.cyan(),
        bytes.len(),
        folder
    );
    let receipt = backend
        .ocr_pdf(bytes, &filename, folder, title.as_deref(), author.as_deref())
        .await?;

    report_receipt(&receipt)
}

fn file_name_or(file: &Path, fallback: &str) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Print an ingestion receipt, surfacing a backend-reported error
fn report_receipt(receipt: &IngestReceipt) -> Result<()> {
    if let Some(error) = &receipt.error {
        eprintln!("{}", format!("Ingestion failed: {}", error).red());
        return Err(FolioError::Backend(error.clone()).into());
    }

    let title = receipt.document_title.as_deref().unwrap_or("(untitled)");
    println!("{}", format!("Stored \"{}\"", title).green());
    if let Some(author) = &receipt.document_author {
        println!("Author: {}", author);
    }
    if let Some(total_chunks) = receipt.total_chunks {
        println!("Chunks: {}", total_chunks);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_name_or_uses_basename() {
        let path = PathBuf::from("/tmp/papers/attention.pdf");
        assert_eq!(file_name_or(&path, "unknown.pdf"), "attention.pdf");
    }

    #[test]
    fn test_file_name_or_falls_back() {
        let path = PathBuf::from("..");
        assert_eq!(file_name_or(&path, "unknown.pdf"), "unknown.pdf");
    }

    #[test]
    fn test_report_receipt_error_propagates() {
        let receipt = IngestReceipt {
            folder_name: None,
            document_title: None,
            document_author: None,
            total_chunks: None,
            error: Some("folder_name is required".to_string()),
        };
        assert!(report_receipt(&receipt).is_err());
    }

    #[test]
    fn test_report_receipt_success() {
        let receipt = IngestReceipt {
            folder_name: Some("docs".to_string()),
            document_title: Some("Paper".to_string()),
            document_author: Some("Ada".to_string()),
            total_chunks: Some(7),
            error: None,
        };
        assert!(report_receipt(&receipt).is_ok());
    }
}
