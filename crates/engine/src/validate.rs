//! Trace query validation

use spanstore_core::{Error, Result, TraceQueryParameters};

/// Check a find-traces / find-trace-ids request
///
/// The first failing rule wins:
/// 1. missing query → `MalformedRequest`
/// 2. empty service → `ServiceNameNotSet`
/// 3. a start bound missing → `StartAndEndTimeNotSet`
/// 4. max start before min start → `StartTimeMinGreaterThanMax`
/// 5. both durations set and min above max → `DurationMinGreaterThanMax`
///
/// Pure: touches no storage and gives the same answer every time.
pub fn validate_query(query: Option<&TraceQueryParameters>) -> Result<()> {
    let query = query.ok_or(Error::MalformedRequest)?;

    if query.service_name.is_empty() {
        return Err(Error::ServiceNameNotSet);
    }

    let (min, max) = match (query.start_time_min, query.start_time_max) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(Error::StartAndEndTimeNotSet),
    };
    if max < min {
        return Err(Error::StartTimeMinGreaterThanMax);
    }

    if !query.duration_min.is_zero()
        && !query.duration_max.is_zero()
        && query.duration_min > query.duration_max
    {
        return Err(Error::DurationMinGreaterThanMax);
    }

    Ok(())
}
