//! HTTP backend implementation
//!
//! `reqwest`-based client for the four backend endpoints. `/chat` is handed
//! back as an uninterpreted body (streamed or unary per configuration); the
//! ingestion and outline endpoints are plain JSON round trips.

use crate::client::{
    ChatBackend, ChatBody, ChatRequest, IngestReceipt, OutlineBatch,
};
use crate::config::{BackendConfig, ResponseMode};
use crate::error::{FolioError, Result};
use crate::protocol::record::ChatCompletion;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::multipart;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// HTTP client for the document-chat backend
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    response_mode: ResponseMode,
}

#[derive(Debug, Serialize)]
struct StoreTextRequest<'a> {
    text: &'a str,
    filename: &'a str,
    folder_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OutlineRequest<'a> {
    questions: &'a [String],
    folder_name: &'a str,
}

impl HttpBackend {
    /// Create a backend client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host is not a valid URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.host).map_err(|e| {
            FolioError::Config(format!("invalid backend host '{}': {}", config.host, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("foliochat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FolioError::Backend(format!("failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized backend client: host={}, response_mode={}",
            config.host,
            config.response_mode
        );

        Ok(Self {
            client,
            base_url,
            response_mode: config.response_mode,
        })
    }

    /// The configured response mode for `/chat`
    pub fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FolioError::Config(format!("invalid endpoint path '{}': {}", path, e)).into())
    }

    /// Upload already-extracted text for ingestion via `/store-text`
    pub async fn store_text(
        &self,
        text: &str,
        filename: &str,
        folder_name: &str,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<IngestReceipt> {
        let url = self.endpoint("/store-text")?;
        tracing::debug!(
            "Storing text: filename={}, folder={}, {} bytes",
            filename,
            folder_name,
            text.len()
        );

        let response = self
            .client
            .post(url)
            .json(&StoreTextRequest {
                text,
                filename,
                folder_name,
                title,
                author,
            })
            .send()
            .await
            .map_err(|e| FolioError::Backend(format!("store-text request failed: {}", e)))?;

        Self::read_json(response, "store-text").await
    }

    /// Upload a scanned PDF for backend OCR and ingestion via `/ocr-pdf`
    ///
    /// The file bytes are sent verbatim; text extraction happens entirely on
    /// the backend.
    pub async fn ocr_pdf(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
        folder_name: &str,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<IngestReceipt> {
        let url = self.endpoint("/ocr-pdf")?;
        tracing::debug!(
            "Uploading PDF for OCR: filename={}, folder={}, {} bytes",
            filename,
            folder_name,
            file_bytes.len()
        );

        let file_part = multipart::Part::bytes(file_bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| FolioError::Backend(format!("invalid multipart payload: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("folder_name", folder_name.to_string());
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        if let Some(author) = author {
            form = form.text("author", author.to_string());
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FolioError::Backend(format!("ocr-pdf request failed: {}", e)))?;

        Self::read_json(response, "ocr-pdf").await
    }

    /// Request outlines for a set of questions via `/generate-outline`
    pub async fn generate_outline(
        &self,
        questions: &[String],
        folder_name: &str,
    ) -> Result<OutlineBatch> {
        let url = self.endpoint("/generate-outline")?;
        tracing::debug!(
            "Requesting outlines: folder={}, {} questions",
            folder_name,
            questions.len()
        );

        let response = self
            .client
            .post(url)
            .json(&OutlineRequest {
                questions,
                folder_name,
            })
            .send()
            .await
            .map_err(|e| FolioError::Backend(format!("outline request failed: {}", e)))?;

        Self::read_json(response, "generate-outline").await
    }

    /// Check the status and deserialize a JSON response body
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FolioError::Backend(format!(
                "{} returned HTTP {}: {}",
                what, status, body
            ))
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FolioError::Backend(format!("failed to parse {} response: {}", what, e)).into())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatBody> {
        let url = self.endpoint("/chat")?;
        tracing::debug!(
            "Sending chat request: folder={}, history_len={}",
            request.folder_name,
            request.conversation_history.len()
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| FolioError::Backend(format!("chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Chat request failed with HTTP {}: {}", status, body);
            return Err(FolioError::Backend(format!(
                "backend returned HTTP {}: {}",
                status, body
            ))
            .into());
        }

        match self.response_mode {
            ResponseMode::Streaming => {
                let stream = response.bytes_stream().map_err(|e| {
                    anyhow::anyhow!(FolioError::Backend(format!("stream read failed: {}", e)))
                });
                Ok(ChatBody::Streamed(Box::pin(stream)))
            }
            ResponseMode::Unary => {
                let completion = response.json::<ChatCompletion>().await.map_err(|e| {
                    FolioError::Backend(format!("failed to parse chat response: {}", e))
                })?;
                Ok(ChatBody::Unary(completion))
            }
        }
    }
}
