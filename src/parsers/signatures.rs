//! Fingerprint matching for known third-party integrations.
//!
//! Matching is plain substring search over the lowercased markup. There is
//! no word-boundary check, so a page that merely mentions a token in prose
//! is reported as using it.

use crate::config::ConfigError;
use crate::results::{BridgeFinding, PluginSignature, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A plugin keyed by its lowercase fingerprint token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub token: String,
    pub plugin: PluginSignature,
}

/// A fixed substring that, when present, yields a bridge finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeCheck {
    pub needle: String,
    pub finding: BridgeFinding,
}

/// Immutable lookup table handed to the detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRegistry {
    #[serde(default)]
    plugins: Vec<SignatureEntry>,
    #[serde(default)]
    bridges: Vec<BridgeCheck>,
}

impl SignatureRegistry {
    /// Build a registry; tokens and needles are lowercased
    pub fn new(plugins: Vec<SignatureEntry>, bridges: Vec<BridgeCheck>) -> Self {
        let plugins = plugins
            .into_iter()
            .map(|entry| SignatureEntry {
                token: entry.token.to_lowercase(),
                ..entry
            })
            .collect();
        let bridges = bridges
            .into_iter()
            .map(|check| BridgeCheck {
                needle: check.needle.to_lowercase(),
                ..check
            })
            .collect();
        Self { plugins, bridges }
    }

    /// The integrations this tool knows about out of the box
    pub fn builtin() -> Self {
        let plugin = |token: &str, name: &str, author: &str| SignatureEntry {
            token: token.to_string(),
            plugin: PluginSignature::new(token, name, author),
        };

        Self::new(
            vec![
                plugin("elementor", "Elementor", "Elementor Ltd"),
                plugin("metform", "MetForm", "WpMet"),
                plugin("woocommerce", "WooCommerce", "Automattic"),
                plugin("contact-form-7", "Contact Form 7", "Takayuki Miyoshi"),
            ],
            vec![
                BridgeCheck {
                    needle: "rev_slider".to_string(),
                    finding: BridgeFinding::new(
                        "revslider",
                        "RevSlider-like content found",
                        Severity::Recommended,
                    ),
                },
                BridgeCheck {
                    needle: "metform".to_string(),
                    finding: BridgeFinding::new(
                        "metform",
                        "MetForm-like form found",
                        Severity::Required,
                    ),
                },
            ],
        )
    }

    /// Load a registry from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: SignatureRegistry = serde_json::from_str(&contents)?;
        Ok(Self::new(raw.plugins, raw.bridges))
    }

    pub fn plugins(&self) -> &[SignatureEntry] {
        &self.plugins
    }

    pub fn bridges(&self) -> &[BridgeCheck] {
        &self.bridges
    }
}

/// Findings for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// Matched plugins in registry order, one per slug
    pub plugins: Vec<PluginSignature>,
    /// Triggered bridge checks in registry order
    pub bridges: Vec<BridgeFinding>,
}

/// Scans raw markup for plugin fingerprints and bridge patterns
pub fn detect(registry: &SignatureRegistry, markup: &str) -> Detection {
    let lower = markup.to_lowercase();

    let mut seen = HashSet::new();
    let mut plugins = Vec::new();
    for entry in registry.plugins() {
        let compact = entry.token.replace('-', "");
        let matched = lower.contains(&entry.token) || lower.contains(&compact);
        if matched && seen.insert(entry.plugin.slug.clone()) {
            ::log::debug!("matched plugin signature {}", entry.plugin.slug);
            plugins.push(entry.plugin.clone());
        }
    }

    let bridges = registry
        .bridges()
        .iter()
        .filter(|check| lower.contains(&check.needle))
        .map(|check| check.finding.clone())
        .collect();

    Detection { plugins, bridges }
}
