use crate::results::ProjectBlock;
use crate::utils::truncate_chars;

/// Characters of block text shown on a preview card
pub const PREVIEW_TEXT_CHARS: usize = 120;

/// How a block list is turned into markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Compact card inside the preview's content section
    PreviewCard,
    /// Full section of the exported page
    ExportSection,
}

/// Escapes `&`, `<` and `>` for embedding text in markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders blocks in order. Text is escaped; `content` is already markup and
/// is embedded verbatim.
pub fn render_blocks(blocks: &[ProjectBlock], mode: RenderMode) -> String {
    let mut out = String::new();
    for block in blocks {
        match mode {
            RenderMode::PreviewCard => render_card(&mut out, block),
            RenderMode::ExportSection => render_section(&mut out, block),
        }
    }
    out
}

fn render_card(out: &mut String, block: &ProjectBlock) {
    out.push_str("<article class=\"preview-card\"><h4>");
    out.push_str(&escape_html(&block.title));
    out.push_str("</h4><p>");
    out.push_str(&escape_html(truncate_chars(&block.text, PREVIEW_TEXT_CHARS)));
    out.push_str("</p>");
    if !block.content.is_empty() {
        out.push_str("<div class=\"preview-snippet\">");
        out.push_str(&block.content);
        out.push_str("</div>");
    }
    out.push_str("</article>");
}

fn render_section(out: &mut String, block: &ProjectBlock) {
    out.push_str("<section class=\"miracle-section\"><div class=\"container\">");
    if !block.title.is_empty() {
        out.push_str("<h2>");
        out.push_str(&escape_html(&block.title));
        out.push_str("</h2>");
    }
    if block.content.is_empty() {
        let text = if block.text.is_empty() { "..." } else { &block.text };
        out.push_str("<p>");
        out.push_str(&escape_html(text));
        out.push_str("</p>");
    } else {
        out.push_str(&block.content);
    }
    out.push_str("</div></section>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(title: &str, content: &str, text: &str) -> ProjectBlock {
        ProjectBlock {
            title: title.to_string(),
            content: content.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("\"quotes\" stay"), "\"quotes\" stay");
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_export_section_with_text_fallback() {
        let html = render_blocks(&[block("A", "", "hello")], RenderMode::ExportSection);
        assert_eq!(
            html,
            "<section class=\"miracle-section\"><div class=\"container\"><h2>A</h2><p>hello</p></div></section>"
        );
    }

    #[test]
    fn test_export_section_content_is_verbatim() {
        let html = render_blocks(&[block("", "<ul><li>x</li></ul>", "ignored")], RenderMode::ExportSection);
        assert_eq!(
            html,
            "<section class=\"miracle-section\"><div class=\"container\"><ul><li>x</li></ul></div></section>"
        );
    }

    #[test]
    fn test_export_section_placeholder_text() {
        let html = render_blocks(&[block("", "", "")], RenderMode::ExportSection);
        assert!(html.contains("<p>...</p>"));
    }

    #[test]
    fn test_untrusted_text_is_escaped() {
        let blocks = [block("<script>", "", "1 < 2 & 3")];
        let export = render_blocks(&blocks, RenderMode::ExportSection);
        assert!(export.contains("<h2>&lt;script&gt;</h2>"));
        assert!(export.contains("<p>1 &lt; 2 &amp; 3</p>"));

        let preview = render_blocks(&blocks, RenderMode::PreviewCard);
        assert!(preview.contains("<h4>&lt;script&gt;</h4>"));
        assert!(!preview.contains("<script>"));
    }

    #[test]
    fn test_preview_card_truncates_text() {
        let text = "é".repeat(200);
        let html = render_blocks(&[block("hero", "", &text)], RenderMode::PreviewCard);
        let expected = format!(
            "<article class=\"preview-card\"><h4>hero</h4><p>{}</p></article>",
            "é".repeat(120)
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_preview_card_embeds_snippet() {
        let html = render_blocks(&[block("hero", "<b>Hi</b>", "Hi")], RenderMode::PreviewCard);
        assert!(html.contains("<div class=\"preview-snippet\"><b>Hi</b></div>"));
    }

    #[test]
    fn test_block_order_is_shared_between_modes() {
        let blocks = [block("first", "", "1"), block("second", "", "2")];
        for mode in [RenderMode::PreviewCard, RenderMode::ExportSection] {
            let html = render_blocks(&blocks, mode);
            let first = html.find("first").unwrap();
            let second = html.find("second").unwrap();
            assert!(first < second, "{:?} reordered blocks", mode);
        }
    }
}
