//! Schema command

use crate::app::OutputFormat;
use anyhow::Result;
use nlfilter_core::filter::{AND_KEY, OR_KEY};
use nlfilter_core::{Field, Operator};
use serde::Serialize;

#[derive(Serialize)]
struct FieldInfo {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct Schema {
    fields: Vec<FieldInfo>,
    operators: Vec<&'static str>,
    logical: Vec<&'static str>,
    examples: Vec<serde_json::Value>,
}

fn describe(field: &Field) -> (&'static str, &'static str) {
    match field {
        Field::Author => ("string", "Exact author name"),
        Field::Tags => ("string", "Hashtag, matched within the stored tag list"),
        Field::PublishedTimestamp => ("integer", "Unix seconds, UTC"),
        _ => ("any", "Legacy date field, passed through unchanged"),
    }
}

fn schema() -> Schema {
    let fields = [Field::Author, Field::Tags]
        .into_iter()
        .chain(Field::DATE_FIELDS)
        .map(|field| {
            let (kind, description) = describe(&field);
            FieldInfo {
                name: field.as_str().to_string(),
                kind,
                description,
            }
        })
        .collect();

    Schema {
        fields,
        operators: Operator::ALL.into_iter().map(Operator::key).collect(),
        logical: vec![AND_KEY, OR_KEY],
        examples: vec![
            serde_json::json!({"author": "Jane Doe"}),
            serde_json::json!({"tags": {"$in": ["#RohitSharma", "#ShubmanGill"]}}),
            serde_json::json!({"$and": [{"tags": "#RohitSharma"}, {"tags": "#ShubmanGill"}]}),
            serde_json::json!({"publishedTimestamp": {"$gte": 1704067200, "$lt": 1735689600}}),
        ],
    }
}

pub async fn run(format: OutputFormat) -> Result<()> {
    let schema = schema();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        OutputFormat::Cli => {
            println!("Fields:");
            for field in &schema.fields {
                println!("  {:<20} {:<8} {}", field.name, field.kind, field.description);
            }
            println!();
            println!("Operators:  {}", schema.operators.join(" "));
            println!("Logical:    {}", schema.logical.join(" "));
            println!();
            println!("Examples:");
            for example in &schema.examples {
                println!("  {}", example);
            }
        }
    }

    Ok(())
}
