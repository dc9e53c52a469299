//! Grouping of tokens into vertical bands (printed lines).

use std::collections::HashMap;

use tracing::{debug, enabled, Level};

use crate::models::token::Token;

/// Tokens sharing one vertical band, in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub key: String,
    pub tokens: Vec<Token>,
}

/// Partition tokens by band key.
///
/// Bands are returned in order of first appearance; tokens keep their input
/// order within a band. Empty-text tokens are kept.
pub fn group_by_band(tokens: impl IntoIterator<Item = Token>) -> Vec<Band> {
    let mut bands: Vec<Band> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in tokens {
        match index.get(&token.band) {
            Some(&i) => bands[i].tokens.push(token),
            None => {
                index.insert(token.band.clone(), bands.len());
                bands.push(Band {
                    key: token.band.clone(),
                    tokens: vec![token],
                });
            }
        }
    }

    if enabled!(Level::DEBUG) {
        for band in &bands {
            let text: Vec<&str> = band.tokens.iter().map(|t| t.text.as_str()).collect();
            debug!("band {}: {}", band.key, text.join(" "));
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_preserves_order() {
        let tokens = vec![
            Token::new("a", 0.0, "10", 0),
            Token::new("x", 0.0, "20", 1),
            Token::new("b", 5.0, "10", 2),
            Token::new("", 9.0, "20", 3),
            Token::new("c", 1.0, "10", 4),
        ];

        let bands = group_by_band(tokens);

        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].key, "10");
        assert_eq!(
            bands[0].tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(bands[1].key, "20");
        assert_eq!(bands[1].tokens.len(), 2);
        assert_eq!(bands[1].tokens[1].text, "");
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_band(Vec::new()).is_empty());
    }
}
