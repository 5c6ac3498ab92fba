use serde::{Deserialize, Serialize};

use crate::colors::ColorPair;

// @module: Annotation template rendering

/// Placeholder for the chapter title
pub const PLACEHOLDER_CHAPTER_TITLE: &str = "%chapter_title%";
/// Placeholder for the annotation date (ISO, `YYYY-MM-DD`)
pub const PLACEHOLDER_ANNO_DATE: &str = "%anno_date%";
/// Placeholder for the annotation time (24-hour, `HH:MM:SS`)
pub const PLACEHOLDER_ANNO_TIME: &str = "%anno_time%";
/// Placeholder for the annotation type ("highlight", "note", "markup")
pub const PLACEHOLDER_ANNO_TYPE: &str = "%anno_type%";
/// Placeholder for the highlight background color
pub const PLACEHOLDER_HIGHLIGHT_BACKGROUND: &str = "%highlight_background%";
/// Placeholder for the highlight foreground color
pub const PLACEHOLDER_HIGHLIGHT_FOREGROUND: &str = "%highlight_foreground%";
/// Placeholder for the annotation text
pub const PLACEHOLDER_ANNO_TEXT: &str = "%anno_text%";

/// Template used when the user has not supplied one.
const DEFAULT_TEMPLATE: &str = "\
## %chapter_title%

### %anno_date% %anno_time% (%anno_type%)

<mark style=\"background-color:%highlight_background%;color:%highlight_foreground%\">%anno_text%</mark>

";

/// A user-configurable annotation template.
///
/// Rendering is pure text replacement over a fixed placeholder vocabulary;
/// there is no control flow. Tokens outside the vocabulary are left verbatim
/// rather than rejected, so templates written for a newer placeholder set
/// keep working unchanged against this version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Default for Template {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

/// String values substituted into a template for one annotation.
#[derive(Debug, Clone)]
pub struct TemplateBindings {
    /// Chapter title (or the untitled-chapter fallback)
    pub chapter_title: String,
    /// Annotation date, `YYYY-MM-DD`
    pub anno_date: String,
    /// Annotation time, `HH:MM:SS`
    pub anno_time: String,
    /// Annotation type label
    pub anno_type: String,
    /// Resolved highlight colors
    pub colors: ColorPair,
    /// Annotation text content
    pub anno_text: String,
}

impl Template {
    /// Create a template from a raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every known placeholder with its binding.
    pub fn render(&self, bindings: &TemplateBindings) -> String {
        self.0
            .replace(PLACEHOLDER_CHAPTER_TITLE, &bindings.chapter_title)
            .replace(PLACEHOLDER_ANNO_DATE, &bindings.anno_date)
            .replace(PLACEHOLDER_ANNO_TIME, &bindings.anno_time)
            .replace(PLACEHOLDER_ANNO_TYPE, &bindings.anno_type)
            .replace(PLACEHOLDER_HIGHLIGHT_BACKGROUND, &bindings.colors.background)
            .replace(PLACEHOLDER_HIGHLIGHT_FOREGROUND, &bindings.colors.foreground)
            .replace(PLACEHOLDER_ANNO_TEXT, &bindings.anno_text)
    }
}
