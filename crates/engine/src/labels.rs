//! Span → label set mapping
//!
//! Every span is indexed under three reserved labels plus one label per tag,
//! process tag and log field:
//!
//! | Label | Value |
//! |-------|-------|
//! | `__svc__` | process service name |
//! | `__op__` | operation name |
//! | `__traceid__` | trace id in its canonical hex form |
//! | `<tag key>` | tag value rendered as a string |
//!
//! Reserved labels are emitted first and canonicalisation keeps the first
//! occurrence of a name, so a user tag named like a reserved label never
//! displaces it. Such a tag stays in the payload but is not indexed.

use spanstore_core::{KeyValue, Label, Labels, Span, TraceId};

/// Service name label
pub const SERVICE_LABEL: &str = "__svc__";

/// Operation name label
pub const OPERATION_LABEL: &str = "__op__";

/// Trace id label
pub const TRACE_ID_LABEL: &str = "__traceid__";

/// Label names owned by the index
pub const RESERVED_LABELS: [&str; 3] = [SERVICE_LABEL, OPERATION_LABEL, TRACE_ID_LABEL];

/// Whether `name` is a reserved label name
pub fn is_reserved(name: &str) -> bool {
    RESERVED_LABELS.contains(&name)
}

fn kv_label(kv: &KeyValue) -> Label {
    Label::new(kv.key.clone(), kv.value.as_string())
}

/// Labels of a span in emission order, duplicates included
///
/// Order: service, operation, trace id, span tags, process tags, log fields
/// (log by log).
pub fn labels_for(span: &Span) -> Vec<Label> {
    let mut out = Vec::with_capacity(
        3 + span.tags.len()
            + span.process.tags.len()
            + span.logs.iter().map(|l| l.fields.len()).sum::<usize>(),
    );
    out.push(Label::new(SERVICE_LABEL, span.service_name()));
    out.push(Label::new(OPERATION_LABEL, span.operation_name.as_str()));
    out.push(Label::new(TRACE_ID_LABEL, span.trace_id.to_string()));
    out.extend(span.tags.iter().map(kv_label));
    out.extend(span.process.tags.iter().map(kv_label));
    for log in &span.logs {
        out.extend(log.fields.iter().map(kv_label));
    }
    out
}

/// Canonical label set a span is indexed under
pub fn index_labels(span: &Span) -> Labels {
    Labels::from_pairs(labels_for(span))
}

/// Blob-store key of a trace
pub fn trace_key(trace_id: TraceId) -> [u8; 16] {
    trace_id.to_bytes()
}
