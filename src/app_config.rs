use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::colors::ColorMap;
use crate::template::Template;

/// Export configuration module
/// This module defines the configuration value objects the core consumes.
/// The core never reads configuration files itself; callers load and parse
/// whatever on-disk representation they use and hand over these values.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExportConfig {
    /// Which destination the export writes to
    #[serde(default)]
    pub target: ExportTarget,

    /// Joplin Web Clipper settings
    #[serde(default)]
    pub joplin: JoplinConfig,

    /// Markdown file output settings
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Highlight color map
    #[serde(default)]
    pub colors: ColorMap,

    /// Annotation template
    #[serde(default)]
    pub template: Template,
}

/// Export destination type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    // @target: Joplin Web Clipper API
    #[default]
    Joplin,
    // @target: Local Markdown files
    Markdown,
}

impl ExportTarget {
    // @returns: Capitalized target name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Joplin => "Joplin",
            Self::Markdown => "Markdown",
        }
    }
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joplin => write!(f, "joplin"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl std::str::FromStr for ExportTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "joplin" => Ok(Self::Joplin),
            "markdown" => Ok(Self::Markdown),
            _ => Err(anyhow!("Invalid export target: {}", s)),
        }
    }
}

/// Joplin Web Clipper connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JoplinConfig {
    // @field: Base URL of the Web Clipper service
    #[serde(default = "default_joplin_url")]
    pub base_url: String,

    // @field: Web Clipper port
    #[serde(default = "default_joplin_port")]
    pub port: u16,

    // @field: Static API token
    #[serde(default = "String::new")]
    pub token: String,

    // @field: Destination notebook id
    #[serde(default = "String::new")]
    pub notebook_id: String,

    // @field: Request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for JoplinConfig {
    fn default() -> Self {
        Self {
            base_url: default_joplin_url(),
            port: default_joplin_port(),
            token: String::new(),
            notebook_id: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How the Markdown exporter treats an existing output file
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    // @policy: Replace the file content
    #[default]
    Overwrite,
    // @policy: Append to the existing file
    Append,
}

/// Markdown file output settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarkdownConfig {
    // @field: Directory the per-book files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    // @field: Existing-file policy
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            write_policy: WritePolicy::default(),
        }
    }
}

impl ExportConfig {
    /// Validate the configuration for the selected target.
    pub fn validate(&self) -> Result<()> {
        match self.target {
            ExportTarget::Joplin => {
                if self.joplin.base_url.trim().is_empty() {
                    return Err(anyhow!("Joplin base URL must not be empty"));
                }
                if self.joplin.port == 0 {
                    return Err(anyhow!("Joplin port must not be zero"));
                }
                if self.joplin.token.trim().is_empty() {
                    return Err(anyhow!("Joplin API token must not be empty"));
                }
                if self.joplin.notebook_id.trim().is_empty() {
                    return Err(anyhow!("Joplin notebook id must not be empty"));
                }
            }
            ExportTarget::Markdown => {
                if self.markdown.output_dir.as_os_str().is_empty() {
                    return Err(anyhow!("Markdown output directory must not be empty"));
                }
            }
        }
        Ok(())
    }
}

fn default_joplin_url() -> String {
    "http://localhost".to_string()
}

fn default_joplin_port() -> u16 {
    41184
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("annotations")
}
