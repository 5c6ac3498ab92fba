use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Exporter, ExportResult};
use crate::aggregator::{AnnotationBlock, RenderedDocument};
use crate::app_config::JoplinConfig;
use crate::errors::ExportError;

/// Separator line between annotation blocks in a note body
const BLOCK_SEPARATOR: &str = "---";

/// Joplin client for the Web Clipper HTTP API.
///
/// All calls are awaited one at a time; the token is passed as a query
/// parameter per the Web Clipper protocol.
pub struct JoplinClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the Web Clipper service
    base_url: String,
    /// Web Clipper port
    port: u16,
    /// API token for authentication
    token: String,
}

/// Note creation request
#[derive(Debug, Serialize)]
struct NoteRequest<'a> {
    /// Note title
    title: &'a str,
    /// Markdown body
    body: &'a str,
    /// Destination notebook id
    parent_id: &'a str,
}

/// Object-id response returned by `/notes` and `/resources`
#[derive(Debug, Deserialize)]
struct IdResponse {
    /// Identifier of the created object
    id: String,
}

/// Resource properties sent alongside the file part
#[derive(Debug, Serialize)]
struct ResourceProps<'a> {
    /// Resource title
    title: &'a str,
}

impl JoplinClient {
    /// Create a new client from connection settings.
    pub fn new(config: &JoplinConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            port: config.port,
            token: config.token.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}:{}/{}?token={}",
            self.base_url, self.port, path, self.token
        )
    }

    /// Check that the Web Clipper service is answering.
    pub async fn ping(&self) -> Result<(), ExportError> {
        let url = format!("{}:{}/ping", self.base_url, self.port);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExportError::ExportFailed {
                item: "ping".to_string(),
                reason: e.to_string(),
            })?;

        let body = response.text().await.unwrap_or_default();
        if body.trim() == "JoplinClipperServer" {
            Ok(())
        } else {
            Err(ExportError::ExportFailed {
                item: "ping".to_string(),
                reason: format!("unexpected ping response: {}", body),
            })
        }
    }

    /// Create a note and return its id.
    pub async fn create_note(
        &self,
        title: &str,
        body: &str,
        parent_id: &str,
    ) -> Result<String, ExportError> {
        let request = NoteRequest {
            title,
            body,
            parent_id,
        };

        let response = self
            .client
            .post(self.endpoint("notes"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::send_error(title, e))?;

        Self::parse_id_response(title, response).await
    }

    /// Upload a raster image as a note resource and return its id.
    pub async fn create_resource(
        &self,
        item: &str,
        title: &str,
        data: Vec<u8>,
    ) -> Result<String, ExportError> {
        let props = serde_json::to_string(&ResourceProps { title }).map_err(|e| {
            ExportError::ExportFailed {
                item: item.to_string(),
                reason: format!("failed to encode resource props: {}", e),
            }
        })?;

        let file_part = reqwest::multipart::Part::bytes(data)
            .file_name(format!("{}.jpg", title))
            .mime_str("image/jpeg")
            .map_err(|e| ExportError::ExportFailed {
                item: item.to_string(),
                reason: e.to_string(),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("data", file_part)
            .text("props", props);

        let response = self
            .client
            .post(self.endpoint("resources"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::send_error(item, e))?;

        Self::parse_id_response(item, response).await
    }

    fn send_error(item: &str, e: reqwest::Error) -> ExportError {
        error!("Joplin request failed for '{}': {}", item, e);
        ExportError::ExportFailed {
            item: item.to_string(),
            reason: e.to_string(),
        }
    }

    async fn parse_id_response(
        item: &str,
        response: reqwest::Response,
    ) -> Result<String, ExportError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Joplin API error for '{}' ({}): {}", item, status, text);
            return Err(ExportError::ExportFailed {
                item: item.to_string(),
                reason: format!("HTTP {}: {}", status, text),
            });
        }

        let parsed: IdResponse =
            response
                .json()
                .await
                .map_err(|e| ExportError::ExportFailed {
                    item: item.to_string(),
                    reason: format!("failed to parse API response: {}", e),
                })?;

        Ok(parsed.id)
    }
}

/// Exporter that writes one Joplin note per book.
pub struct JoplinExporter {
    /// Web Clipper client
    client: JoplinClient,
    /// Destination notebook
    notebook_id: String,
}

impl JoplinExporter {
    /// Create an exporter from connection settings.
    pub fn new(config: &JoplinConfig) -> Self {
        Self {
            client: JoplinClient::new(config),
            notebook_id: config.notebook_id.clone(),
        }
    }

    /// Check connectivity to the Web Clipper service.
    pub async fn test_connection(&self) -> Result<(), ExportError> {
        self.client.ping().await
    }

    /// Build the note body, uploading markup rasters as resources along the
    /// way. A failed upload is recorded against the result and the block is
    /// omitted; the note is still created with the remaining content.
    async fn build_body(&self, document: &RenderedDocument, result: &mut ExportResult) -> String {
        let mut body = String::new();
        let note_title = document.display_title();

        for section in &document.sections {
            body.push_str(&format!("## {}\n\n", section.title));

            let mut first_block = true;
            for block in &section.blocks {
                if !first_block {
                    body.push_str(&format!("{}\n\n", BLOCK_SEPARATOR));
                }

                match block {
                    AnnotationBlock::Text {
                        text,
                        note,
                        created,
                        ..
                    } => {
                        body.push_str(&format!(
                            "### {}\n\n",
                            created.format("%Y-%m-%d %H:%M:%S")
                        ));
                        body.push_str(&format!("```text\n{}\n```\n\n", text));
                        if let Some(note) = note {
                            if !note.trim().is_empty() {
                                body.push_str(&format!("> {}\n\n", note));
                            }
                        }
                        first_block = false;
                    }
                    AnnotationBlock::Markup {
                        annotation_id,
                        raster,
                        caption,
                        created,
                    } => {
                        let item = format!("{} / markup {}", note_title, annotation_id);
                        let resource_title = format!("Markup {}", annotation_id);
                        match self
                            .client
                            .create_resource(&item, &resource_title, raster.clone())
                            .await
                        {
                            Ok(resource_id) => {
                                body.push_str(&format!(
                                    "### {}\n\n",
                                    created.format("%Y-%m-%d %H:%M:%S")
                                ));
                                body.push_str(&format!("![markup](:/{})\n\n", resource_id));
                                if let Some(caption) = caption {
                                    if !caption.trim().is_empty() {
                                        body.push_str(&format!("{}\n\n", caption));
                                    }
                                }
                                result.record_success();
                                first_block = false;
                            }
                            Err(error) => {
                                result.record_failure(item, error);
                            }
                        }
                    }
                }
            }
        }

        body
    }
}

#[async_trait]
impl Exporter for JoplinExporter {
    fn name(&self) -> &'static str {
        "joplin"
    }

    async fn export(&self, document: &RenderedDocument) -> ExportResult {
        let mut result = ExportResult::new();
        let note_title = document.display_title();

        let body = self.build_body(document, &mut result).await;

        match self
            .client
            .create_note(&note_title, &body, &self.notebook_id)
            .await
        {
            Ok(note_id) => {
                debug!("Created note {} for '{}'", note_id, note_title);
                result.record_success();
            }
            Err(error) => {
                result.record_failure(note_title, error);
            }
        }

        result
    }
}
