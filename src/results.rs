use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A heading captured from the page, levels 1 through 4
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// A direct child of the page's main container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    /// Element name, e.g. `section`
    pub tag_name: String,

    /// Class list in source order
    #[serde(default)]
    pub class_names: Vec<String>,

    /// Element id, if any
    #[serde(default)]
    pub id: Option<String>,

    /// Trimmed text content, at most 500 chars
    #[serde(default)]
    pub text: String,

    /// Inner markup, at most 800 chars
    #[serde(default)]
    pub markup_snippet: String,
}

impl ContentBlock {
    /// Label shown for the block: its class list, or the tag when it has none
    pub fn label(&self) -> String {
        if self.class_names.is_empty() {
            self.tag_name.clone()
        } else {
            self.class_names.join(" ")
        }
    }
}

/// A known third-party integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSignature {
    pub slug: String,
    pub name: String,
    pub author: String,
}

impl PluginSignature {
    pub fn new(slug: &str, name: &str, author: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            author: author.to_string(),
        }
    }
}

/// How urgently a bridge finding should be addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Recommended,
    Required,
}

/// A compatibility concern tied to a known integration pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFinding {
    pub issue_id: String,
    pub description: String,
    pub severity: Severity,
}

impl BridgeFinding {
    pub fn new(issue_id: &str, description: &str, severity: Severity) -> Self {
        Self {
            issue_id: issue_id.to_string(),
            description: description.to_string(),
            severity,
        }
    }
}

/// Immutable summary of one fetched page.
///
/// Built once by the pipeline; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    url: String,
    title: String,
    meta_desc: String,
    headings: Vec<Heading>,
    blocks: Vec<ContentBlock>,
    images: Vec<String>,
    plugin_signatures: Vec<PluginSignature>,
    bridge_findings: Vec<BridgeFinding>,
    analyzed_at: DateTime<Utc>,
}

impl Analysis {
    pub(crate) fn assemble(
        url: String,
        extraction: crate::parsers::Extraction,
        detection: crate::parsers::signatures::Detection,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url,
            title: extraction.title,
            meta_desc: extraction.meta_desc,
            headings: extraction.headings,
            blocks: extraction.blocks,
            images: extraction.images,
            plugin_signatures: detection.plugins,
            bridge_findings: detection.bridges,
            analyzed_at,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn meta_desc(&self) -> &str {
        &self.meta_desc
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn plugin_signatures(&self) -> &[PluginSignature] {
        &self.plugin_signatures
    }

    pub fn bridge_findings(&self) -> &[BridgeFinding] {
        &self.bridge_findings
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }
}

/// One block of an editable project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectBlock {
    /// Optional heading
    pub title: String,
    /// Pre-serialized markup, embedded as-is
    pub content: String,
    /// Plain text fallback when `content` is empty
    pub text: String,
}

/// Client-editable description of a site, the input to export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub meta_desc: String,
    pub blocks: Vec<ProjectBlock>,
    pub plugins: Vec<PluginSignature>,
}

impl Project {
    /// Derive a project from an analysis, presenting blocks the way the preview does
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let blocks = analysis
            .blocks()
            .iter()
            .map(|block| ProjectBlock {
                title: block.label(),
                content: block.markup_snippet.clone(),
                text: block.text.clone(),
            })
            .collect();

        Self {
            title: analysis.title().to_string(),
            meta_desc: analysis.meta_desc().to_string(),
            blocks,
            plugins: analysis.plugin_signatures().to_vec(),
        }
    }
}
