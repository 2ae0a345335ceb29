use crate::parsers::{
    Extraction, MAX_BLOCK_SNIPPET, MAX_BLOCK_TEXT, MAX_BLOCKS, MAX_HEADING_LEVEL,
};
use crate::results::{ContentBlock, Heading};
use crate::utils::truncate_chars;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static MAIN: LazyLock<Selector> = LazyLock::new(|| selector("main"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// `h1` through `h{MAX_HEADING_LEVEL}`, index 0 is `h1`
static HEADINGS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    (1..=MAX_HEADING_LEVEL)
        .map(|level| selector(&format!("h{}", level)))
        .collect()
});

/// Parses page markup into its structural model. Pure, no I/O.
pub fn extract(markup: &str) -> Extraction {
    let doc = Html::parse_document(markup);

    let extraction = Extraction {
        title: extract_title(&doc),
        meta_desc: extract_meta_description(&doc),
        headings: extract_headings(&doc),
        blocks: extract_blocks(&doc),
        images: extract_images(&doc),
    };

    ::log::debug!(
        "HTML extractor found {} headings, {} blocks, {} images",
        extraction.headings.len(),
        extraction.blocks.len(),
        extraction.images.len()
    );

    extraction
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Text of the first title element, untrimmed
pub fn extract_title(doc: &Html) -> String {
    doc.select(&TITLE)
        .next()
        .map(|el| el.text().collect())
        .unwrap_or_default()
}

pub fn extract_meta_description(doc: &Html) -> String {
    doc.select(&META_DESCRIPTION)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Collects headings one level at a time: every h1, then every h2, and so on.
///
/// Within a level headings keep document order. The result is not a
/// document-order merge across levels.
pub fn extract_headings(doc: &Html) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (level, heading_selector) in (1..=MAX_HEADING_LEVEL).zip(HEADINGS.iter()) {
        for el in doc.select(heading_selector) {
            let text = el.text().collect::<String>();
            headings.push(Heading::new(level, text.trim()));
        }
    }
    headings
}

/// First `MAX_BLOCKS` element children of the first `main`, or of `body`
pub fn extract_blocks(doc: &Html) -> Vec<ContentBlock> {
    let container = doc
        .select(&MAIN)
        .next()
        .or_else(|| doc.select(&BODY).next());

    let Some(container) = container else {
        return Vec::new();
    };

    container
        .children()
        .filter_map(ElementRef::wrap)
        .take(MAX_BLOCKS)
        .map(to_block)
        .collect()
}

fn to_block(el: ElementRef) -> ContentBlock {
    let element = el.value();
    let text = el.text().collect::<String>();
    let inner = el.inner_html();

    ContentBlock {
        tag_name: element.name().to_string(),
        class_names: element
            .attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        id: element.attr("id").map(str::to_string),
        text: truncate_chars(text.trim(), MAX_BLOCK_TEXT).to_string(),
        markup_snippet: truncate_chars(&inner, MAX_BLOCK_SNIPPET).to_string(),
    }
}

/// Every image's `src`, falling back to `data-src`; images with neither are skipped
pub fn extract_images(doc: &Html) -> Vec<String> {
    doc.select(&IMG)
        .filter_map(|el| {
            let element = el.value();
            element
                .attr("src")
                .filter(|src| !src.is_empty())
                .or_else(|| element.attr("data-src").filter(|src| !src.is_empty()))
                .map(str::to_string)
        })
        .collect()
}
