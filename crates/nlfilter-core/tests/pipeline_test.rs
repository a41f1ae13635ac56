//! Integration tests for the natural-language-to-filter pipeline
//!
//! Providers are replaced with scripted generators so the fallback order,
//! timeouts and cancellation can be observed without network access.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nlfilter_core::{
    FailureReason, FallbackReason, FilterPipeline, FilterSource, GenerationOutcome,
    GenerationRequest, NlFilterError, ProviderChain, Result, RuleBasedExtractor, TextGenerator,
    Vocabulary,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum Behavior {
    Fail,
    Reply(String),
    Hang,
}

struct Scripted {
    name: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(name: &str, behavior: Behavior) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: calls.clone(),
        });
        (generator, calls)
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fail => Err(NlFilterError::ExternalError(format!(
                "{} error (HTTP 429): rate limited",
                self.name
            ))),
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 9, 30, 0).unwrap()
}

fn chain() -> ProviderChain {
    ProviderChain::new(500, 0.1, Duration::from_secs(10))
}

fn pipeline(chain: ProviderChain) -> FilterPipeline {
    let extractor = RuleBasedExtractor::new(&Vocabulary::default()).unwrap();
    FilterPipeline::new(chain, extractor)
}

#[tokio::test]
async fn test_all_providers_failing_falls_back_to_rules() {
    let (a, a_calls) = Scripted::new("openrouter", Behavior::Fail);
    let (b, b_calls) = Scripted::new("openai", Behavior::Fail);
    let chain = chain()
        .with_candidate("google/gemma-3n-e4b-it:free", a.clone())
        .with_candidate("qwen/qwen3-8b:free", a)
        .with_candidate("gpt-3.5-turbo", b);

    let outcome = pipeline(chain)
        .generate_filter_at("posts about Rohit Sharma", now())
        .await;

    assert_eq!(outcome.filter.to_value(), json!({"tags": "#RohitSharma"}));
    assert_eq!(a_calls.load(Ordering::SeqCst), 2);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);

    match outcome.source {
        FilterSource::RuleBased {
            reason: FallbackReason::GenerationFailed { attempts },
        } => {
            assert_eq!(attempts.len(), 3);
            assert_eq!(attempts[2].provider, "openai");
            assert!(matches!(attempts[0].reason, FailureReason::Error { .. }));
        }
        other => panic!("unexpected source: {:?}", other),
    }
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let (first, first_calls) = Scripted::new(
        "openrouter",
        Behavior::Reply("```json\n{\"author\": \"Akainu\"}\n```".to_string()),
    );
    let (second, second_calls) =
        Scripted::new("openai", Behavior::Reply(r#"{"author": "Jane Doe"}"#.to_string()));
    let chain = chain()
        .with_candidate("m1", first)
        .with_candidate("m2", second);

    let outcome = pipeline(chain)
        .generate_filter_at("whatever Akainu wrote", now())
        .await;

    assert_eq!(outcome.filter.to_value(), json!({"author": "Akainu"}));
    assert_eq!(
        outcome.source,
        FilterSource::Model {
            provider: "openrouter".to_string(),
            model: "m1".to_string()
        }
    );
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_advance_to_next_candidate() {
    let (bad, _) = Scripted::new("openrouter", Behavior::Fail);
    let (good, _) = Scripted::new(
        "openai",
        Behavior::Reply(r##"{"tags": ["#ViratKohli", "#RohitSharma"], "category": "sport"}"##.to_string()),
    );
    let chain = chain().with_candidate("m1", bad).with_candidate("gpt-3.5-turbo", good);

    let outcome = chain.call_with_fallback("prompt").await;
    match outcome {
        GenerationOutcome::Success {
            provider, failures, ..
        } => {
            assert_eq!(provider, "openai");
            assert_eq!(failures.len(), 1);
        }
        GenerationOutcome::Failure { .. } => panic!("expected success"),
    }

    let outcome = pipeline(chain).generate_filter_at("kohli or rohit", now()).await;
    assert_eq!(
        outcome.filter.to_value(),
        json!({"tags": {"$in": ["#ViratKohli", "#RohitSharma"]}})
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_advances_to_next_candidate() {
    let (slow, slow_calls) = Scripted::new("openrouter", Behavior::Hang);
    let (fast, fast_calls) = Scripted::new(
        "openai",
        Behavior::Reply(r##"{"tags": "#IPL2025"}"##.to_string()),
    );
    let chain = chain().with_candidate("slow", slow).with_candidate("fast", fast);

    let outcome = chain.call_with_fallback("prompt").await;

    assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fast_calls.load(Ordering::SeqCst), 1);
    match outcome {
        GenerationOutcome::Success {
            model, failures, ..
        } => {
            assert_eq!(model, "fast");
            assert_eq!(
                failures[0].reason,
                FailureReason::Timeout { after_ms: 10_000 }
            );
        }
        GenerationOutcome::Failure { .. } => panic!("expected success"),
    }
}

#[tokio::test]
async fn test_unparseable_reply_falls_back_to_rules() {
    let (chatty, _) = Scripted::new(
        "openrouter",
        Behavior::Reply("Sure! Here are some articles you might like.".to_string()),
    );
    let outcome = pipeline(chain().with_candidate("m1", chatty))
        .generate_filter_at("articles by Jane Doe", now())
        .await;

    assert_eq!(outcome.filter.to_value(), json!({"author": "Jane Doe"}));
    assert_eq!(
        outcome.source,
        FilterSource::RuleBased {
            reason: FallbackReason::Unparseable {
                provider: "openrouter".to_string(),
                model: "m1".to_string()
            }
        }
    );
}

#[tokio::test]
async fn test_blank_reply_falls_back_to_rules() {
    let (blank, _) = Scripted::new("openrouter", Behavior::Reply(String::new()));
    let outcome = pipeline(chain().with_candidate("m1", blank))
        .generate_filter_at("articles from 2024", now())
        .await;

    assert!(outcome.is_fallback());
    assert_eq!(
        outcome.filter.to_value(),
        json!({"publishedTimestamp": {"$gte": 1704067200, "$lt": 1735689600}})
    );
}

#[tokio::test]
async fn test_concatenated_objects_from_model_are_merged() {
    let (split, _) = Scripted::new(
        "openrouter",
        Behavior::Reply(r##"{"author":"A"}{"tags":"#X"}"##.to_string()),
    );
    let outcome = pipeline(chain().with_candidate("m1", split))
        .generate_filter_at("anything", now())
        .await;

    assert_eq!(outcome.filter.to_value(), json!({"author": "A", "tags": "#X"}));
    assert!(!outcome.is_fallback());
}

#[tokio::test]
async fn test_unrecognized_fields_only_falls_back() {
    let (odd, _) = Scripted::new(
        "openrouter",
        Behavior::Reply(r#"{"category": "sports"}"#.to_string()),
    );
    let outcome = pipeline(chain().with_candidate("m1", odd))
        .generate_filter_at("Mumbai Indians posts", now())
        .await;

    assert_eq!(outcome.filter.to_value(), json!({"tags": "#MumbaiIndians"}));
    assert!(matches!(
        outcome.source,
        FilterSource::RuleBased {
            reason: FallbackReason::NoRecognizedFields { .. }
        }
    ));
}

#[tokio::test]
async fn test_abort_before_start_makes_no_calls() {
    let (generator, calls) = Scripted::new(
        "openrouter",
        Behavior::Reply(r#"{"author": "Jane Doe"}"#.to_string()),
    );
    let pipeline = pipeline(chain().with_candidate("m1", generator));

    let (future, handle) = pipeline.generate_filter_abortable("articles by Jane Doe");
    handle.abort();

    assert!(future.await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_in_flight_call() {
    let (slow, slow_calls) = Scripted::new("openrouter", Behavior::Hang);
    let (fast, fast_calls) =
        Scripted::new("openai", Behavior::Reply(r#"{"author": "Akainu"}"#.to_string()));
    let pipeline = pipeline(chain().with_candidate("slow", slow).with_candidate("fast", fast));

    let (future, handle) = pipeline.generate_filter_abortable("posts by Akainu");
    let abort_later = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();
    };
    let (result, _) = tokio::join!(future, abort_later);

    assert!(result.is_err());
    assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fast_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rule_based_scenarios() {
    let pipeline = FilterPipeline::offline(&Vocabulary::default()).unwrap();
    let cases: Vec<(&str, Value)> = vec![
        (
            "posts about Rohit Sharma and Shubman Gill",
            json!({"tags": {"$in": ["#RohitSharma", "#ShubmanGill"]}}),
        ),
        (
            "posts containing both Rohit Sharma and Shubman Gill",
            json!({"$and": [{"tags": "#RohitSharma"}, {"tags": "#ShubmanGill"}]}),
        ),
        ("articles by Jane Doe", json!({"author": "Jane Doe"})),
        (
            "articles from 2024",
            json!({"publishedTimestamp": {"$gte": 1704067200, "$lt": 1735689600}}),
        ),
        (
            "articles from May",
            json!({"publishedTimestamp": {"$gte": 1746057600, "$lt": 1748736000}}),
        ),
        (
            "Shubman Gill articles from this year",
            json!({
                "tags": "#ShubmanGill",
                "publishedTimestamp": {"$gte": 1735689600, "$lt": 1767225600}
            }),
        ),
    ];

    for (query, expected) in cases {
        let outcome = pipeline.generate_filter_at(query, now()).await;
        assert_eq!(outcome.filter.to_value(), expected, "query: {}", query);
        assert!(outcome.is_fallback());
    }
}

#[tokio::test]
async fn test_tag_year_is_not_a_date_filter() {
    let pipeline = FilterPipeline::offline(&Vocabulary::default()).unwrap();
    for now in [now(), Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()] {
        let outcome = pipeline.generate_filter_at("IPL 2025 articles", now).await;
        assert_eq!(outcome.filter.to_value(), json!({"tags": "#IPL2025"}), "now: {}", now);
    }

    let outcome = pipeline
        .generate_filter_at("IPL 2025 articles from May this year", now())
        .await;
    assert_eq!(
        outcome.filter.to_value(),
        json!({
            "tags": "#IPL2025",
            "publishedTimestamp": {"$gte": 1746057600, "$lt": 1748736000}
        })
    );
}
