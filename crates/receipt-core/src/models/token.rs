//! Positioned text token produced by the text extraction tool.

use serde::{Deserialize, Serialize};

/// A word on the page with its horizontal position and vertical band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text content.
    pub text: String,

    /// Horizontal offset of the word's left edge.
    pub left: f64,

    /// Vertical band key. Tokens with equal bands form one printed line.
    pub band: String,

    /// Ordinal in the extraction output, used only to break ties.
    pub source_order: usize,

    /// Line number reported by the extraction tool, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_num: Option<u32>,
}

impl Token {
    /// Create a token without an extraction line number.
    pub fn new(
        text: impl Into<String>,
        left: f64,
        band: impl Into<String>,
        source_order: usize,
    ) -> Self {
        Self {
            text: text.into(),
            left,
            band: band.into(),
            source_order,
            line_num: None,
        }
    }

    /// Check if the text contains any numeric character.
    ///
    /// Superscripts count, so a unit such as `м³` ends a row name.
    pub fn has_digits(&self) -> bool {
        self.text.chars().any(char::is_numeric)
    }
}
