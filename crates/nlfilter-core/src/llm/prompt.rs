//! Prompt construction for natural-language-to-filter generation

use crate::filter::{DateRange, Field, FieldValue, Filter};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use std::fmt::Write;

/// Query/filter pair shown to the model
#[derive(Debug, Clone, PartialEq)]
pub struct PromptExample {
    pub query: String,
    pub filter: Value,
    pub note: Option<String>,
}

impl PromptExample {
    pub fn new(query: &str, filter: Value) -> Self {
        Self {
            query: query.to_string(),
            filter,
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Builds the few-shot filter-generation prompt
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    examples: Vec<PromptExample>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    /// Builder with the built-in example set
    pub fn new() -> Self {
        Self {
            examples: fixed_examples(),
        }
    }

    /// Builder with a caller-supplied example set
    pub fn with_examples(examples: Vec<PromptExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[PromptExample] {
        &self.examples
    }

    /// Render the prompt for `query`, anchoring relative dates to `today`
    pub fn build(&self, query: &str, today: NaiveDate) -> String {
        let now = today.and_time(NaiveTime::MIN).and_utc();
        let year = today.year();

        let mut prompt = String::with_capacity(6 * 1024);

        prompt.push_str(
            "You are an expert at converting natural language queries into vector database metadata filters.\n\n",
        );

        prompt.push_str("DATABASE SCHEMA:\n");
        prompt.push_str("- author: string (e.g., \"Jane Doe\", \"Mary Poppins\", \"Akainu\")\n");
        prompt.push_str(
            "- tags: string holding a list rendering (e.g., \"['#RohitSharma', '#DRS', '#RRvsMI']\"); match individual hashtags\n",
        );
        prompt.push_str(
            "- publishedTimestamp: integer Unix seconds; the ONLY date field to filter on\n\n",
        );

        let _ = writeln!(prompt, "TODAY: {} (UTC)\n", today.format("%Y-%m-%d"));

        prompt.push_str("SUPPORTED OPERATORS:\n");
        prompt.push_str("- Equality: $eq (exact match), $ne (not equal)\n");
        prompt.push_str("- Comparison: $gt, $gte, $lt, $lte (for dates and numbers)\n");
        prompt.push_str("- Arrays: $in (any of these values), $nin (none of these values)\n");
        prompt.push_str("- Logic: $and (all conditions), $or (any condition)\n\n");

        prompt.push_str("BOOLEAN LOGIC RULES:\n");
        prompt.push_str(
            "1. \"containing both\", \"with both\", \"having both\", \"includes both\" -> AND logic: {\"$and\": [{\"tags\": \"#Tag1\"}, {\"tags\": \"#Tag2\"}]}\n",
        );
        prompt.push_str(
            "2. \"about X and Y\", \"related to X, Y\", lists -> OR logic: {\"tags\": {\"$in\": [\"#Tag1\", \"#Tag2\"]}}\n",
        );
        prompt.push_str("3. Explicit \"or\" / \"either\" -> OR logic\n");
        prompt.push_str("4. Two or more tags with no explicit connector -> OR logic\n\n");

        prompt.push_str("DATE RULES:\n");
        prompt.push_str("- Always use whole calendar ranges in UTC: {\"$gte\": start, \"$lt\": end}\n");
        if let (Some(this_year), Some(last_year)) =
            (DateRange::year(year), DateRange::year(year - 1))
        {
            let _ = writeln!(
                prompt,
                "- \"this year\" is {}: {} to {}",
                year,
                this_year.gte(),
                this_year.lt()
            );
            let _ = writeln!(
                prompt,
                "- \"last year\" is {}: {} to {}",
                year - 1,
                last_year.gte(),
                last_year.lt()
            );
        }
        prompt.push_str("- A month without a year means that month of the current year\n\n");

        prompt.push_str("OUTPUT RULES:\n");
        prompt.push_str("- Return ONLY valid JSON, no explanations\n");
        prompt.push_str("- Return ONE single JSON object, not several separate objects\n");
        prompt.push_str("- Use individual hashtags like \"#RohitSharma\" for tags\n\n");

        prompt.push_str("EXAMPLES:\n\n");
        for example in self.examples.iter().chain(relative_examples(now).iter()) {
            match &example.note {
                Some(note) => {
                    let _ = writeln!(prompt, "Query: \"{}\" ({})", example.query, note);
                }
                None => {
                    let _ = writeln!(prompt, "Query: \"{}\"", example.query);
                }
            }
            let _ = writeln!(prompt, "Filter: {}\n", example.filter);
        }

        let _ = write!(prompt, "Now convert: \"{}\"\n\nJSON filter:", query);
        prompt
    }
}

/// Render the prompt with the built-in examples
pub fn build_prompt(query: &str, today: NaiveDate) -> String {
    PromptBuilder::new().build(query, today)
}

fn fixed_examples() -> Vec<PromptExample> {
    vec![
        PromptExample::new("articles by Jane Doe", json!({"author": "Jane Doe"})),
        PromptExample::new("posts about Rohit Sharma", json!({"tags": "#RohitSharma"})),
        PromptExample::new("Mumbai Indians posts", json!({"tags": "#MumbaiIndians"})),
        PromptExample::new("IPL 2025 articles", json!({"tags": "#IPL2025"})),
        PromptExample::new(
            "articles from May 2025",
            json!({"publishedTimestamp": {"$gte": 1746057600, "$lt": 1748736000}}),
        ),
        PromptExample::new(
            "posts from June 2023",
            json!({"publishedTimestamp": {"$gte": 1685577600, "$lt": 1688169600}}),
        ),
        PromptExample::new(
            "articles from 2024",
            json!({"publishedTimestamp": {"$gte": 1704067200, "$lt": 1735689600}}),
        ),
        PromptExample::new(
            "posts about Rohit Sharma and Shubman Gill",
            json!({"tags": {"$in": ["#RohitSharma", "#ShubmanGill"]}}),
        )
        .with_note("OR logic: posts about either"),
        PromptExample::new(
            "posts containing both Rohit Sharma and Shubman Gill",
            json!({"$and": [{"tags": "#RohitSharma"}, {"tags": "#ShubmanGill"}]}),
        )
        .with_note("AND logic: must have both"),
        PromptExample::new(
            "posts related to Rohit Sharma, Shubman Gill",
            json!({"tags": {"$in": ["#RohitSharma", "#ShubmanGill"]}}),
        )
        .with_note("OR logic: posts about any"),
        PromptExample::new(
            "posts with Rohit Sharma and also Shubman Gill",
            json!({"$and": [{"tags": "#RohitSharma"}, {"tags": "#ShubmanGill"}]}),
        )
        .with_note("AND logic: must have both"),
        PromptExample::new(
            "articles about cricket or football",
            json!({"tags": {"$in": ["#Cricket", "#Football"]}}),
        )
        .with_note("explicit OR"),
        PromptExample::new(
            "IPL articles by Mary Poppins",
            json!({"author": "Mary Poppins", "tags": "#IPL2025"}),
        ),
        PromptExample::new("posts not by Jane Doe", json!({"author": {"$ne": "Jane Doe"}})),
        PromptExample::new(
            "articles from 2024 or later",
            json!({"publishedTimestamp": {"$gte": 1704067200}}),
        ),
    ]
}

/// Examples whose filters depend on the reference moment
fn relative_examples(now: DateTime<Utc>) -> Vec<PromptExample> {
    let mut examples = Vec::new();

    if let Some(range) = DateRange::year(now.year()) {
        examples.push(PromptExample::new(
            "articles from this year",
            date_filter(range),
        ));
    }
    if let Some(range) = DateRange::previous_month(now) {
        examples.push(PromptExample::new("posts from last month", date_filter(range)));
    }
    if let Some(range) = DateRange::trailing_days(now, 15) {
        examples.push(PromptExample::new(
            "articles from previous 15 days",
            date_filter(range),
        ));
    }
    if let Some(range) = DateRange::year(now.year() - 1) {
        let filter = Filter::and(vec![
            Filter::field(Field::Author, "Jane Doe"),
            Filter::field(Field::PublishedTimestamp, range.to_field_value()),
            Filter::field(Field::Tags, FieldValue::from("#Cricket")),
        ]);
        examples.push(PromptExample::new(
            "cricket articles by Jane Doe from last year",
            filter.to_value(),
        ));
    }

    examples
}

fn date_filter(range: DateRange) -> Value {
    Filter::field(Field::PublishedTimestamp, range.to_field_value()).to_value()
}
