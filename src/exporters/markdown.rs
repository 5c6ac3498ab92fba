use async_trait::async_trait;
use log::{debug, error, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use super::{Exporter, ExportResult};
use crate::aggregator::{AnnotationBlock, RenderedDocument};
use crate::app_config::{MarkdownConfig, WritePolicy};
use crate::errors::ExportError;
use crate::template::{Template, TemplateBindings};

/// Exporter that renders one Markdown file per book through the configured
/// template.
///
/// Markup annotations are not representable in a plain Markdown file; they
/// are reported as skipped-unsupported, never silently dropped, while the
/// text annotations of the same book are still exported.
pub struct MarkdownExporter {
    /// Directory the files are written into
    output_dir: PathBuf,
    /// Existing-file policy
    write_policy: WritePolicy,
    /// Annotation template
    template: Template,
}

impl MarkdownExporter {
    /// Create an exporter from output settings and a template.
    pub fn new(config: &MarkdownConfig, template: Template) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            write_policy: config.write_policy,
            template,
        }
    }

    /// Derive a filesystem-safe filename from a book title.
    pub fn sanitize_filename(title: &str) -> String {
        let name: String = title
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else if c.is_whitespace() {
                    ' '
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(120)
            .collect();
        let trimmed = name.trim().trim_matches('_').to_string();
        if trimmed.is_empty() {
            "untitled".to_string()
        } else {
            trimmed
        }
    }

    /// Output path for a document.
    pub fn output_path(&self, document: &RenderedDocument) -> PathBuf {
        self.output_dir
            .join(format!("{}.md", Self::sanitize_filename(&document.display_title())))
    }

    /// Render the document body; markup blocks are recorded as skipped.
    fn render(&self, document: &RenderedDocument, result: &mut ExportResult) -> String {
        let mut content = format!("# {}\n\n", document.display_title());

        for section in &document.sections {
            for block in &section.blocks {
                match block {
                    AnnotationBlock::Text {
                        text,
                        note,
                        colors,
                        created,
                        ..
                    } => {
                        let bindings = TemplateBindings {
                            chapter_title: section.title.clone(),
                            anno_date: created.format("%Y-%m-%d").to_string(),
                            anno_time: created.format("%H:%M:%S").to_string(),
                            anno_type: block.type_label().to_string(),
                            colors: colors.clone(),
                            anno_text: text.clone(),
                        };
                        content.push_str(&self.template.render(&bindings));
                        if let Some(note) = note {
                            if !note.trim().is_empty() {
                                content.push_str(&format!("> {}\n\n", note));
                            }
                        }
                    }
                    AnnotationBlock::Markup { annotation_id, .. } => {
                        warn!(
                            "Markdown export cannot represent markup annotation {}",
                            annotation_id
                        );
                        result.record_skip(format!(
                            "{} / markup {}",
                            document.display_title(),
                            annotation_id
                        ));
                    }
                }
            }
        }

        content
    }

    /// Write the rendered content per the configured policy. A write
    /// failure is fatal for the book; there is no retry unit smaller than
    /// the file.
    fn write(&self, path: &PathBuf, content: &str) -> Result<(), ExportError> {
        let to_export_error = |e: std::io::Error| ExportError::ExportFailed {
            item: path.display().to_string(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.output_dir).map_err(to_export_error)?;

        match self.write_policy {
            WritePolicy::Overwrite => std::fs::write(path, content).map_err(to_export_error),
            WritePolicy::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(to_export_error)?;
                file.write_all(content.as_bytes()).map_err(to_export_error)
            }
        }
    }
}

#[async_trait]
impl Exporter for MarkdownExporter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    async fn export(&self, document: &RenderedDocument) -> ExportResult {
        let mut result = ExportResult::new();
        let path = self.output_path(document);

        let content = self.render(document, &mut result);

        match self.write(&path, &content) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                result.record_success();
            }
            Err(error) => {
                error!("Failed to write {}: {}", path.display(), error);
                result.record_failure(path.display().to_string(), error);
            }
        }

        result
    }
}
