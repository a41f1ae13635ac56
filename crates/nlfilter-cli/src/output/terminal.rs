//! Terminal output formatter

use super::{FilterReport, SearchReport};
use nlfilter_core::{FallbackReason, FilterSource, SearchMatch};
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout with colors only when attached to a terminal
pub fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn label<W: WriteColor>(out: &mut W, name: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{:<9}", format!("{}:", name))?;
    out.reset()
}

pub fn write_filter<W: WriteColor>(out: &mut W, report: &FilterReport) -> io::Result<()> {
    let outcome = report.outcome;

    label(out, "Query", Color::Cyan)?;
    writeln!(out, "{}", report.query)?;
    label(out, "Filter", Color::Cyan)?;
    writeln!(out, "{}", outcome.filter)?;

    let color = if outcome.is_fallback() {
        Color::Yellow
    } else {
        Color::Green
    };
    label(out, "Source", color)?;
    writeln!(out, "{}", outcome.source)?;

    if let FilterSource::RuleBased {
        reason: FallbackReason::GenerationFailed { attempts },
    } = &outcome.source
    {
        for attempt in attempts {
            writeln!(
                out,
                "  {} / {}: {} ({}ms)",
                attempt.provider, attempt.model, attempt.reason, attempt.elapsed_ms
            )?;
        }
    }

    label(out, "Time", Color::Cyan)?;
    writeln!(out, "{}ms", outcome.elapsed_ms)
}

pub fn write_search<W: WriteColor>(out: &mut W, report: &SearchReport) -> io::Result<()> {
    write_filter(out, &report.filter)?;
    let search = report.search;

    if search.native_filter != search.filter_applied {
        label(out, "Native", Color::Cyan)?;
        writeln!(out, "{}", search.native_filter)?;
    }
    if let Some(model) = &search.embedding_model {
        label(out, "Embedder", Color::Cyan)?;
        writeln!(out, "{}", model)?;
    }
    writeln!(out)?;

    if let Some(error) = &search.error {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(out, "Search failed: {}", error)?;
        return out.reset();
    }

    if search.matches.is_empty() {
        writeln!(out, "No matches")?;
    }
    for m in &search.matches {
        write_match(out, m)?;
    }

    writeln!(
        out,
        "\n{} results (embed {}ms, query {}ms, total {}ms)",
        search.total_count,
        search.timings.embedding_ms,
        search.timings.query_ms,
        search.timings.total_ms
    )
}

fn write_match<W: WriteColor>(out: &mut W, m: &SearchMatch) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{:>5.1}%", m.score * 100.0)?;
    out.reset()?;

    let title = m.metadata_str("title").unwrap_or("(untitled)");
    writeln!(out, " {} #{}", title, m.id)?;

    let author = m.metadata_str("author").unwrap_or("unknown");
    let tags = nlfilter_core::search::stored_tags(&m.metadata);
    if tags.is_empty() {
        writeln!(out, "       {}", author)
    } else {
        writeln!(out, "       {} {}", author, tags)
    }
}
