pub mod html;
pub mod signatures;


use crate::results::{ContentBlock, Heading};

/// Maximum number of content blocks taken from a page
pub const MAX_BLOCKS: usize = 20;
/// Maximum characters of block text kept
pub const MAX_BLOCK_TEXT: usize = 500;
/// Maximum characters of block markup kept
pub const MAX_BLOCK_SNIPPET: usize = 800;
/// Highest heading level collected
pub const MAX_HEADING_LEVEL: u8 = 4;

/// Structural model extracted from page markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Text of the first `<title>`, or empty
    pub title: String,
    /// Content of the first description meta tag, or empty
    pub meta_desc: String,
    /// Headings, grouped level by level
    pub headings: Vec<Heading>,
    /// Direct children of the main container
    pub blocks: Vec<ContentBlock>,
    /// Image sources in document order
    pub images: Vec<String>,
}
