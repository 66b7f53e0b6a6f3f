//! Output rendering.

use serde_json::json;
use spanstore::{DependencyLink, Span, Trace, TraceId};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One item per line, readable text.
    Human,
    /// A single JSON document.
    Json,
}

/// Render a list of names.
pub fn format_names(names: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Human if names.is_empty() => "(empty list)".to_string(),
        OutputMode::Human => names.join("\n"),
        OutputMode::Json => json!(names).to_string(),
    }
}

/// Render trace ids.
pub fn format_trace_ids(ids: &[TraceId], mode: OutputMode) -> String {
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format_names(&ids, mode)
}

fn span_line(span: &Span) -> String {
    let parent = span
        .parent_span_id()
        .map(|p| format!(" parent={:x}", p.0))
        .unwrap_or_default();
    format!(
        "  {} {:x}{} {} {} {}us",
        span.start_time.to_rfc3339(),
        span.span_id.0,
        parent,
        span.service_name(),
        span.operation_name,
        span.duration.as_micros()
    )
}

/// Render traces.
pub fn format_traces(traces: &[Trace], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(traces).unwrap_or_default(),
        OutputMode::Human if traces.is_empty() => "(no traces)".to_string(),
        OutputMode::Human => {
            let mut out = Vec::new();
            for trace in traces {
                out.push(format!("trace {} ({} spans)", trace.trace_id, trace.spans.len()));
                out.extend(trace.spans.iter().map(span_line));
            }
            out.join("\n")
        }
    }
}

/// Render dependency links.
pub fn format_dependencies(links: &[DependencyLink], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string(links).unwrap_or_default(),
        OutputMode::Human if links.is_empty() => "(no dependencies)".to_string(),
        OutputMode::Human => links
            .iter()
            .map(|l| format!("{} -> {} ({})", l.parent, l.child, l.call_count))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render an error.
pub fn format_error(err: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => format!("(error) {:#}", err),
        OutputMode::Json => json!({ "error": format!("{:#}", err) }).to_string(),
    }
}
