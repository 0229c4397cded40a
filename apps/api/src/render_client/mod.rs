/// Render Client — the single point of entry for the external rendering service.
///
/// The service owns presentation: it turns `ReportContent` into one tall PNG surface
/// (plus the bounds of each top-level section) and turns sliced page images into a
/// PDF. This module only moves bytes and retries transient failures.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::geometry::PageGeometry;
use crate::layout::page_break::ProtectedBlock;
use crate::layout::slicer::PageImage;
use crate::report::assembler::{DocumentWriter, RenderedSurface, ReportError, ReportRenderer};
use crate::report::content::ReportContent;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum RenderClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("render service returned an invalid surface: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("render service unavailable after {retries} retries")]
    Unavailable { retries: u32 },
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RenderResponse {
    png_base64: String,
    width: u32,
    height: u32,
    #[serde(default)]
    blocks: Vec<ProtectedBlock>,
}

#[derive(Debug, Serialize)]
struct DocumentRequest<'a> {
    page: &'a PageGeometry,
    pages: Vec<DocumentPage<'a>>,
}

#[derive(Debug, Serialize)]
struct DocumentPage<'a> {
    png_base64: String,
    #[serde(flatten)]
    placement: &'a PageImage,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RenderClient {
    client: Client,
    base_url: String,
}

impl RenderClient {
    pub fn new(base_url: &str) -> Result<Self, RenderClientError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Renders report content to a PNG surface with its section bounds.
    pub async fn render_surface(
        &self,
        content: &ReportContent,
    ) -> Result<RenderedSurface, RenderClientError> {
        let response: RenderResponse = self.post("/render", content).await?.json().await?;
        let png = STANDARD.decode(response.png_base64.as_bytes())?;

        debug!(
            width = response.width,
            height = response.height,
            blocks = response.blocks.len(),
            "Render service returned surface"
        );

        Ok(RenderedSurface {
            png: Bytes::from(png),
            width: response.width,
            height: response.height,
            blocks: response.blocks,
        })
    }

    /// Builds the final PDF from ordered page images.
    pub async fn write_document(
        &self,
        pages: &[PageImage],
        geometry: &PageGeometry,
    ) -> Result<Bytes, RenderClientError> {
        let request = DocumentRequest {
            page: geometry,
            pages: pages
                .iter()
                .map(|p| DocumentPage {
                    png_base64: STANDARD.encode(&p.png),
                    placement: p,
                })
                .collect(),
        };
        Ok(self.post("/documents", &request).await?.bytes().await?)
    }

    /// POSTs JSON, retrying on 429 and 5xx with exponential backoff.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, RenderClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<RenderClientError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Render service call to {} failed (attempt {}), retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(RenderClientError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Render service returned {}: {}", status, body);
                last_error = Some(RenderClientError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RenderClientError::Api {
                    status: status.as_u16(),
                    message: service_message(body),
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(RenderClientError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ReportRenderer for RenderClient {
    async fn render(&self, content: &ReportContent) -> Result<RenderedSurface, ReportError> {
        self.render_surface(content)
            .await
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}

#[async_trait]
impl DocumentWriter for RenderClient {
    async fn write(
        &self,
        pages: &[PageImage],
        geometry: &PageGeometry,
    ) -> Result<Bytes, ReportError> {
        self.write_document(pages, geometry)
            .await
            .map_err(|e| ReportError::Document(e.to_string()))
    }
}

/// Extracts `{"error": "..."}` from a service error body, or returns the body as-is.
fn service_message(body: String) -> String {
    serde_json::from_str::<ServiceError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
