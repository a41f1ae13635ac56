//! Rule-based filter extraction
//!
//! Deterministic, network-free fallback used when no text-generation
//! provider produced a usable filter. Always succeeds; the result may be the
//! empty filter.

mod dates;
mod vocabulary;

pub use dates::extract_date_range;
pub use vocabulary::{TagAlias, Vocabulary, AND_INDICATORS};

use crate::error::Result;
use crate::filter::{Field, FieldValue, Filter};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::ops::Range;

struct CompiledAlias {
    tag: String,
    patterns: Vec<Regex>,
}

impl CompiledAlias {
    fn compile(alias: &TagAlias) -> Result<Self> {
        let patterns = alias
            .aliases
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(|a| Regex::new(&alias_pattern(a)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            tag: alias.tag.clone(),
            patterns,
        })
    }

    /// Byte ranges of every alias occurrence
    fn spans<'q>(&'q self, query: &'q str) -> impl Iterator<Item = Range<usize>> + 'q {
        self.patterns
            .iter()
            .flat_map(move |re| re.find_iter(query).map(|m| m.range()))
    }

    /// Byte offset of the earliest alias occurrence
    fn first_position(&self, query: &str) -> Option<usize> {
        self.spans(query).map(|span| span.start).min()
    }
}

/// Case-insensitive pattern with `\b` on the alias edges that are word characters
fn alias_pattern(alias: &str) -> String {
    let boundary = |c: Option<char>| match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    };
    format!(
        "(?i){}{}{}",
        boundary(alias.chars().next()),
        regex::escape(alias),
        boundary(alias.chars().next_back())
    )
}

/// Keyword and date-pattern extractor
pub struct RuleBasedExtractor {
    authors: Vec<(String, String)>,
    entities: Vec<CompiledAlias>,
    topics: Vec<CompiledAlias>,
    and_indicators: Vec<String>,
}

impl RuleBasedExtractor {
    /// Compile the vocabulary tables
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        Ok(Self {
            authors: vocabulary
                .authors
                .iter()
                .map(|a| (a.clone(), a.to_lowercase()))
                .collect(),
            entities: vocabulary
                .entities
                .iter()
                .map(CompiledAlias::compile)
                .collect::<Result<_>>()?,
            topics: vocabulary
                .topics
                .iter()
                .map(CompiledAlias::compile)
                .collect::<Result<_>>()?,
            and_indicators: vocabulary
                .and_indicators
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        })
    }

    /// Extract a filter relative to the current time
    pub fn extract(&self, query: &str) -> Filter {
        self.extract_at(query, Utc::now())
    }

    /// Extract a filter relative to `now`
    pub fn extract_at(&self, query: &str, now: DateTime<Utc>) -> Filter {
        let author = self.find_author(query);
        let tags = self.find_tags(query);
        let date = extract_date_range(&self.mask_aliases(query), now);

        tracing::debug!(
            "Rule-based extraction: author={:?}, tags={:?}, date={:?}",
            author,
            tags,
            date.map(|d| (d.gte(), d.lt()))
        );

        if tags.len() > 1 && self.wants_conjunction(query) {
            let mut members: Vec<Filter> = tags
                .into_iter()
                .map(|tag| Filter::field(Field::Tags, tag))
                .collect();
            if let Some(author) = author {
                members.push(Filter::field(Field::Author, author));
            }
            if let Some(date) = date {
                members.push(Filter::field(Field::PublishedTimestamp, date.to_field_value()));
            }
            return Filter::and(members);
        }

        let mut filter = Filter::empty();

        if let Some(author) = author {
            filter = filter.with(Field::Author, author);
        }

        let tag_value = match tags.len() {
            0 => self.find_topic(query).map(FieldValue::from),
            1 => tags.into_iter().next().map(FieldValue::from),
            _ => Some(FieldValue::any_of(tags)),
        };
        if let Some(tag_value) = tag_value {
            filter = filter.with(Field::Tags, tag_value);
        }

        if let Some(date) = date {
            filter = filter.with(Field::PublishedTimestamp, date.to_field_value());
        }

        filter
    }

    /// First known author mentioned in the query, in list order
    pub fn find_author(&self, query: &str) -> Option<&str> {
        let lower = query.to_lowercase();
        self.authors
            .iter()
            .find(|(_, needle)| !needle.is_empty() && lower.contains(needle.as_str()))
            .map(|(name, _)| name.as_str())
    }

    /// Distinct entity tags in order of first appearance in the query
    pub fn find_tags(&self, query: &str) -> Vec<String> {
        let mut found: Vec<(usize, &str)> = self
            .entities
            .iter()
            .filter_map(|e| e.first_position(query).map(|pos| (pos, e.tag.as_str())))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        let mut tags: Vec<String> = Vec::with_capacity(found.len());
        for (_, tag) in found {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }

    /// Whether the query demands every tag be present
    pub fn wants_conjunction(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        self.and_indicators
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
    }

    /// Blank out tag aliases so a name like "IPL 2025" is not read as a date
    fn mask_aliases(&self, query: &str) -> String {
        let mut masked = query.to_string();
        for span in self
            .entities
            .iter()
            .chain(&self.topics)
            .flat_map(|alias| alias.spans(query))
        {
            let blank = " ".repeat(span.len());
            masked.replace_range(span, &blank);
        }
        masked
    }

    fn find_topic(&self, query: &str) -> Option<String> {
        self.topics
            .iter()
            .find(|t| t.first_position(query).is_some())
            .map(|t| t.tag.clone())
    }
}
