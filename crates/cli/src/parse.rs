//! ArgMatches → CliAction conversion.
//!
//! Pure: the current time is passed in so default windows are testable.

use chrono::{DateTime, Utc};
use clap::ArgMatches;
use spanstore::{TraceId, TraceQueryParameters};
use std::time::Duration;

/// The result of parsing a command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// List services.
    Services,
    /// List operations of a service; empty means all.
    Operations { service: String },
    /// Print one trace.
    Trace { trace_id: TraceId },
    /// Search traces.
    Find {
        query: TraceQueryParameters,
        ids_only: bool,
    },
    /// Load spans from a JSON file, `-` for stdin.
    Write { file: String },
    /// List dependency links.
    Dependencies {
        end: DateTime<Utc>,
        lookback: Duration,
    },
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches, now: DateTime<Utc>) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "services" => Ok(CliAction::Services),
        "operations" => Ok(CliAction::Operations {
            service: m.get_one::<String>("service").cloned().unwrap_or_default(),
        }),
        "trace" => {
            let raw = required(m, "trace-id")?;
            let trace_id = raw.parse().map_err(|e| format!("{}", e))?;
            Ok(CliAction::Trace { trace_id })
        }
        "find" => parse_find(m, now),
        "write" => Ok(CliAction::Write {
            file: required(m, "file")?.to_string(),
        }),
        "dependencies" => {
            let end = optional_time(m, "end")?.unwrap_or(now);
            let lookback = parse_duration(required(m, "lookback")?)?;
            Ok(CliAction::Dependencies { end, lookback })
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument: {}", name))
}

fn optional_time(m: &ArgMatches, name: &str) -> Result<Option<DateTime<Utc>>, String> {
    m.get_one::<String>(name)
        .map(|raw| parse_time(raw))
        .transpose()
}

// =========================================================================
// Find
// =========================================================================

fn parse_find(m: &ArgMatches, now: DateTime<Utc>) -> Result<CliAction, String> {
    let end = optional_time(m, "end")?.unwrap_or(now);
    let start = match optional_time(m, "start")? {
        Some(start) => start,
        None => {
            let lookback = parse_duration(required(m, "lookback")?)?;
            let lookback = chrono::Duration::from_std(lookback).map_err(|e| e.to_string())?;
            end - lookback
        }
    };

    let service = m.get_one::<String>("service").cloned().unwrap_or_default();
    let mut query = TraceQueryParameters::new(service, start, end);
    if let Some(op) = m.get_one::<String>("operation") {
        query = query.with_operation(op.as_str());
    }
    if let Some(tags) = m.get_many::<String>("tag") {
        for tag in tags {
            let (key, value) = parse_tag(tag)?;
            query = query.with_tag(key, value);
        }
    }

    let min = m
        .get_one::<String>("min-duration")
        .map(|s| parse_duration(s))
        .transpose()?
        .unwrap_or_default();
    let max = m
        .get_one::<String>("max-duration")
        .map(|s| parse_duration(s))
        .transpose()?
        .unwrap_or_default();
    query = query.with_duration(min, max);

    if let Some(limit) = m.get_one::<usize>("limit") {
        query = query.with_limit(*limit);
    }

    Ok(CliAction::Find {
        query,
        ids_only: m.get_flag("ids-only"),
    })
}

/// Split `key=value`; the value may itself contain `=`.
pub fn parse_tag(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(format!("invalid tag filter {:?}, expected key=value", raw)),
    }
}

/// Parse an RFC 3339 timestamp.
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid time {:?}: {}", raw, e))
}

/// Parse `<integer><unit>` with unit one of `us`, `ms`, `s`, `m`, `h`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration {:?}, expected e.g. 250ms, 2s, 5m", raw);
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, unit) = raw.split_at(split);
    let n: u64 = digits.parse().map_err(|_| invalid())?;
    match unit {
        "us" => Ok(Duration::from_micros(n)),
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n * 60)),
        "h" => Ok(Duration::from_secs(n * 3600)),
        _ => Err(invalid()),
    }
}
