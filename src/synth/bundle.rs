use crate::error::SynthesisError;
use crate::results::Project;
use crate::synth::render::{RenderMode, escape_html, render_blocks};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime as ZipDateTime, ZipWriter};

/// Download name of every bundle
pub const BUNDLE_FILENAME: &str = "inspired2site-export.zip";
/// Content type of every bundle
pub const BUNDLE_CONTENT_TYPE: &str = "application/zip";

pub const INDEX_ENTRY: &str = "index.html";
pub const STYLESHEET_ENTRY: &str = "miracle.css";
pub const PLUGIN_REPORT_ENTRY: &str = "plugin-list.txt";
pub const README_ENTRY: &str = "README.md";

const NO_PLUGINS: &str = "No plugins detected";

/// A packaged static site
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Zip archive bytes
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub content_type: &'static str,
}

/// Builds the exported page markup. Deterministic for a given project.
pub fn index_html(project: &Project) -> String {
    let mut out = String::from(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\"><title>",
    );
    out.push_str(&escape_html(or_default(&project.title, "Inspired Export")));
    out.push_str("</title><link rel=\"stylesheet\" href=\"miracle.css\"></head><body><div class=\"site\">");

    if project.blocks.is_empty() {
        out.push_str("<main class=\"container\"><h1>");
        out.push_str(&escape_html(or_default(&project.title, "Generated site")));
        out.push_str("</h1><p>");
        out.push_str(&escape_html(&project.meta_desc));
        out.push_str("</p></main>");
    } else {
        out.push_str(&render_blocks(&project.blocks, RenderMode::ExportSection));
    }

    out.push_str("</div></body></html>");
    out
}

/// One line per plugin, name and author
pub fn plugin_report(project: &Project) -> String {
    if project.plugins.is_empty() {
        return NO_PLUGINS.to_string();
    }
    project
        .plugins
        .iter()
        .map(|p| format!("{} — {}", p.name, p.author))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn readme(generated_at: DateTime<Utc>) -> String {
    format!(
        "Inspired2Site export\nGeneratedAt: {}\nNotes: verify assets/licenses.",
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Packages a project into a zip archive.
///
/// Entries carry a fixed modification time, so two calls with the same
/// project, stylesheet and timestamp produce identical bytes.
pub fn build_bundle(
    project: &Project,
    stylesheet: &str,
    generated_at: DateTime<Utc>,
) -> Result<Bundle, SynthesisError> {
    let entries = [
        (INDEX_ENTRY, index_html(project)),
        (STYLESHEET_ENTRY, stylesheet.to_string()),
        (PLUGIN_REPORT_ENTRY, plugin_report(project)),
        (README_ENTRY, readme(generated_at)),
    ];

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(ZipDateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in &entries {
        writer.start_file(*name, options)?;
        writer.write_all(contents.as_bytes())?;
    }
    let bytes = writer.finish()?.into_inner();

    ::log::debug!(
        "built bundle with {} blocks ({} bytes)",
        project.blocks.len(),
        bytes.len()
    );

    Ok(Bundle {
        bytes,
        filename: BUNDLE_FILENAME,
        content_type: BUNDLE_CONTENT_TYPE,
    })
}

/// Exports projects, copying one fixed stylesheet into each bundle
#[derive(Debug, Clone)]
pub struct Synthesizer {
    stylesheet_path: PathBuf,
}

impl Synthesizer {
    pub fn new(stylesheet_path: impl Into<PathBuf>) -> Self {
        Self {
            stylesheet_path: stylesheet_path.into(),
        }
    }

    pub fn stylesheet_path(&self) -> &Path {
        &self.stylesheet_path
    }

    /// Export a project stamped with the current time
    pub fn export(&self, project: &Project) -> Result<Bundle, SynthesisError> {
        self.export_at(project, Utc::now())
    }

    pub fn export_at(
        &self,
        project: &Project,
        generated_at: DateTime<Utc>,
    ) -> Result<Bundle, SynthesisError> {
        let stylesheet = std::fs::read_to_string(&self.stylesheet_path).map_err(|source| {
            SynthesisError::Stylesheet {
                path: self.stylesheet_path.clone(),
                source,
            }
        })?;
        build_bundle(project, &stylesheet, generated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{PluginSignature, ProjectBlock};
    use chrono::TimeZone;
    use std::io::Read;

    fn read_entries(bundle: &Bundle) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.bytes.clone())).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut contents = String::new();
                file.read_to_string(&mut contents).unwrap();
                (file.name().to_string(), contents)
            })
            .collect()
    }

    fn entry<'a>(entries: &'a [(String, String)], name: &str) -> &'a str {
        entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
            .unwrap()
    }

    fn demo_project() -> Project {
        Project {
            title: "Demo".to_string(),
            blocks: vec![ProjectBlock {
                title: "A".to_string(),
                text: "hello".to_string(),
                ..ProjectBlock::default()
            }],
            ..Project::default()
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_demo_project_bundle() {
        let bundle = build_bundle(&demo_project(), "body{}", timestamp()).unwrap();
        assert_eq!(bundle.filename, "inspired2site-export.zip");
        assert_eq!(bundle.content_type, "application/zip");

        let entries = read_entries(&bundle);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["index.html", "miracle.css", "plugin-list.txt", "README.md"]);

        let index = entry(&entries, INDEX_ENTRY);
        assert_eq!(index.matches("<section").count(), 1);
        assert!(index.contains("<h2>A</h2><p>hello</p>"));
        assert!(index.contains("<title>Demo</title>"));

        assert_eq!(entry(&entries, PLUGIN_REPORT_ENTRY), "No plugins detected");
        assert_eq!(entry(&entries, STYLESHEET_ENTRY), "body{}");
        assert_eq!(
            entry(&entries, README_ENTRY),
            "Inspired2Site export\nGeneratedAt: 2024-05-01T12:30:00.000Z\nNotes: verify assets/licenses."
        );
    }

    #[test]
    fn test_export_is_reproducible() {
        let project = demo_project();
        assert_eq!(index_html(&project), index_html(&project.clone()));
        assert_eq!(plugin_report(&project), plugin_report(&project.clone()));

        let first = build_bundle(&project, "css", timestamp()).unwrap();
        let second = build_bundle(&project.clone(), "css", timestamp()).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_empty_project_falls_back_to_main() {
        let html = index_html(&Project::default());
        assert!(html.contains("<title>Inspired Export</title>"));
        assert!(html.contains(
            "<div class=\"site\"><main class=\"container\"><h1>Generated site</h1><p></p></main></div>"
        ));

        let project = Project {
            title: "My <Site>".to_string(),
            meta_desc: "Tea & cake".to_string(),
            ..Project::default()
        };
        let html = index_html(&project);
        assert!(html.contains("<h1>My &lt;Site&gt;</h1><p>Tea &amp; cake</p>"));
    }

    #[test]
    fn test_index_document_shell() {
        let html = index_html(&demo_project());
        assert!(html.starts_with("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"miracle.css\">"));
        assert!(html.ends_with("</div></body></html>"));
    }

    #[test]
    fn test_plugin_report_lines() {
        let project = Project {
            plugins: vec![
                PluginSignature::new("elementor", "Elementor", "Elementor Ltd"),
                PluginSignature::new("metform", "MetForm", "WpMet"),
            ],
            ..Project::default()
        };
        assert_eq!(
            plugin_report(&project),
            "Elementor — Elementor Ltd\nMetForm — WpMet"
        );
    }

    #[test]
    fn test_synthesizer_reads_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miracle.css");
        std::fs::write(&path, ".site{margin:0}").unwrap();

        let bundle = Synthesizer::new(&path)
            .export_at(&demo_project(), timestamp())
            .unwrap();
        let entries = read_entries(&bundle);
        assert_eq!(entry(&entries, STYLESHEET_ENTRY), ".site{margin:0}");
    }

    #[test]
    fn test_missing_stylesheet_is_synthesis_error() {
        let err = Synthesizer::new("/no/such/miracle.css")
            .export(&demo_project())
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Stylesheet { .. }));
        assert_eq!(err.code(), "synthesis_failed");
    }

    #[test]
    fn test_shipped_stylesheet_exists() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/miracle.css");
        assert!(Synthesizer::new(path).export(&demo_project()).is_ok());
    }
}
