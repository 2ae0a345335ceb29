//! Preview and export of sites.
//!
//! Both paths render blocks through [`render::render_blocks`], so a preview
//! lists blocks in exactly the order and escaping the export will use.

pub mod bundle;
pub mod preview;
pub mod render;

pub use bundle::{BUNDLE_CONTENT_TYPE, BUNDLE_FILENAME, Bundle, Synthesizer, build_bundle};
pub use preview::{Preview, PreviewSection, preview};
pub use render::{RenderMode, escape_html, render_blocks};
