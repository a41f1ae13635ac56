//! Keyword tables for rule-based extraction
//!
//! Every table is configuration: the defaults describe the demo article
//! index, and `config.yml` can replace any of them.

use serde::{Deserialize, Serialize};

/// Phrases that turn a multi-tag query into a conjunction
pub const AND_INDICATORS: [&str; 4] = [
    "containing both",
    "with both",
    "having both",
    "includes both",
];

/// Surface forms that map to one canonical tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAlias {
    /// Canonical hashtag, e.g. `#RohitSharma`
    pub tag: String,

    /// Case-insensitive whole-word aliases, e.g. `rohit sharma`, `rohit`
    pub aliases: Vec<String>,
}

impl TagAlias {
    pub fn new(tag: &str, aliases: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Known authors, entity tags, topic tags and boolean cue phrases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Known authors, matched as case-insensitive substrings in list order
    #[serde(default = "default_authors")]
    pub authors: Vec<String>,

    /// Entity tags (people); several may match one query
    #[serde(default = "default_entities")]
    pub entities: Vec<TagAlias>,

    /// Team/topic tags consulted only when no entity matched; first match wins
    #[serde(default = "default_topics")]
    pub topics: Vec<TagAlias>,

    /// Phrases requesting that all matched tags be present
    #[serde(default = "default_and_indicators")]
    pub and_indicators: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            authors: default_authors(),
            entities: default_entities(),
            topics: default_topics(),
            and_indicators: default_and_indicators(),
        }
    }
}

fn default_authors() -> Vec<String> {
    ["Jane Doe", "Mary Poppins", "Akainu"]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn default_entities() -> Vec<TagAlias> {
    vec![
        TagAlias::new("#RohitSharma", &["rohit sharma", "rohit"]),
        TagAlias::new("#ShubmanGill", &["shubman gill", "shubman"]),
        TagAlias::new("#ViratKohli", &["virat kohli", "virat"]),
        TagAlias::new("#ShikharDhawan", &["shikhar dhawan", "shikhar"]),
    ]
}

fn default_topics() -> Vec<TagAlias> {
    vec![
        TagAlias::new("#MumbaiIndians", &["mumbai indians", "mi"]),
        TagAlias::new("#RajasthanRoyals", &["rajasthan royals", "rr"]),
        TagAlias::new("#GujaratTitans", &["gujarat titans", "gt"]),
        TagAlias::new("#IPL2025", &["ipl 2025", "ipl2025", "ipl"]),
        TagAlias::new("#Cricket", &["cricket"]),
    ]
}

fn default_and_indicators() -> Vec<String> {
    AND_INDICATORS
        .iter()
        .map(|p| p.to_string())
        .chain(std::iter::once("and also".to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let vocab: Vocabulary = serde_yaml::from_str("authors: [\"Alice Zhang\"]\n").unwrap();
        assert_eq!(vocab.authors, vec!["Alice Zhang".to_string()]);
        assert_eq!(vocab.entities, default_entities());
        assert!(vocab.and_indicators.iter().any(|p| p == "containing both"));
    }
}
