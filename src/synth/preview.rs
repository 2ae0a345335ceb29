use crate::results::{Analysis, Project, ProjectBlock};
use crate::synth::render::{RenderMode, escape_html, render_blocks};
use serde::Serialize;

/// Headings shown in the key headings section
pub const PREVIEW_HEADINGS: usize = 6;
/// Blocks shown in the content blocks section
pub const PREVIEW_BLOCKS: usize = 6;

const DEFAULT_TITLE: &str = "Inspired site";
const DEFAULT_DESCRIPTION: &str = "Generated from inspiration.";
const HERO_TEXT: &str = "Auto-generated hero based on headings.";
const NO_PLUGINS: &str = "None detected";

/// One section of the preview, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewSection {
    Header { title: String, description: String },
    Hero { text: String },
    KeyHeadings { headings: Vec<String> },
    ContentBlocks { blocks: Vec<ProjectBlock> },
    Plugins { summary: String },
}

/// In-memory preview of what an analysis would export to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub sections: Vec<PreviewSection>,
    /// Project the preview was derived from; exporting it yields the same blocks
    pub project: Project,
}

/// Builds the preview for an analysis.
///
/// Key headings and content blocks are left out when the page had none.
pub fn preview(analysis: &Analysis) -> Preview {
    let project = Project::from_analysis(analysis);
    let mut sections = Vec::new();

    sections.push(PreviewSection::Header {
        title: or_default(analysis.title(), DEFAULT_TITLE),
        description: or_default(analysis.meta_desc(), DEFAULT_DESCRIPTION),
    });

    sections.push(PreviewSection::Hero {
        text: HERO_TEXT.to_string(),
    });

    if !analysis.headings().is_empty() {
        sections.push(PreviewSection::KeyHeadings {
            headings: analysis
                .headings()
                .iter()
                .take(PREVIEW_HEADINGS)
                .map(|h| h.text.clone())
                .collect(),
        });
    }

    if !project.blocks.is_empty() {
        sections.push(PreviewSection::ContentBlocks {
            blocks: project.blocks.iter().take(PREVIEW_BLOCKS).cloned().collect(),
        });
    }

    let summary = analysis
        .plugin_signatures()
        .iter()
        .map(|p| format!("{} by {}", p.name, p.author))
        .collect::<Vec<_>>()
        .join(", ");
    sections.push(PreviewSection::Plugins {
        summary: or_default(&summary, NO_PLUGINS),
    });

    Preview { sections, project }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl Preview {
    /// Renders the preview as a markup fragment
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            match section {
                PreviewSection::Header { title, description } => {
                    out.push_str(&format!(
                        "<header class=\"hero-preview\"><h1>{}</h1><p>{}</p></header>",
                        escape_html(title),
                        escape_html(description)
                    ));
                }
                PreviewSection::Hero { text } => {
                    out.push_str(&format!(
                        "<section class=\"preview-hero\"><div class=\"hero-preview\"><h3>Hero</h3><p>{}</p></div></section>",
                        escape_html(text)
                    ));
                }
                PreviewSection::KeyHeadings { headings } => {
                    out.push_str("<section><div class=\"hero-preview\"><h3>Key headings</h3><ul>");
                    for heading in headings {
                        out.push_str(&format!("<li>{}</li>", escape_html(heading)));
                    }
                    out.push_str("</ul></div></section>");
                }
                PreviewSection::ContentBlocks { blocks } => {
                    out.push_str("<section><div class=\"hero-preview\"><h3>Content Blocks</h3>");
                    out.push_str(&render_blocks(blocks, RenderMode::PreviewCard));
                    out.push_str("</div></section>");
                }
                PreviewSection::Plugins { summary } => {
                    out.push_str(&format!(
                        "<section><div class=\"hero-preview\"><h3>Plugins</h3><p>{}</p></div></section>",
                        escape_html(summary)
                    ));
                }
            }
        }
        out
    }
}
