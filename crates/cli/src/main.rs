//! spanstore CLI: inspect and load a spanstore storage directory.
//!
//! ```text
//! spanstore --db ./spans services
//! spanstore --db ./spans find -s checkout -t error=true --lookback 30m
//! spanstore --db ./spans --backend blob write spans.json
//! ```
//!
//! Logs go to stderr as JSON at WARN; set `RUST_LOG` to change the level.

mod commands;
mod format;
mod parse;

use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ArgMatches;
use spanstore::{
    DependencyReader, EngineConfig, JsonCodec, PayloadBackend, QueryContext, SpanReader,
    SpanWriter, Store, TracingObserver,
};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_dependencies, format_error, format_names, format_trace_ids, format_traces, OutputMode,
};
use parse::{matches_to_action, CliAction};

fn main() {
    init_logging();

    let matches = build_cli().get_matches();
    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match run(&matches, mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(db) = matches.get_one::<String>("db") {
        config.storage_path = PathBuf::from(db);
    }
    if let Some(secs) = matches.get_one::<u64>("retention-secs") {
        config.retention_secs = *secs;
    }
    match matches.get_one::<String>("backend").map(String::as_str) {
        Some("blob") => config.payload_backend = PayloadBackend::Blob,
        Some("series") => config.payload_backend = PayloadBackend::Series,
        _ => {}
    }
    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches, mode: OutputMode) -> Result<String> {
    let action = matches_to_action(matches, Utc::now()).map_err(anyhow::Error::msg)?;
    let config = load_config(matches)?;
    let path = config.storage_path.clone();
    debug!(path = %path.display(), ?action, "Running command");

    let store = Store::builder()
        .config(config)
        .observer(Arc::new(TracingObserver))
        .open()
        .with_context(|| format!("failed to open {}", path.display()))?;

    let result = execute(&store, action, mode);
    let closed = store.close().context("failed to close store");
    let output = result?;
    closed?;
    Ok(output)
}

fn execute(store: &Store, action: CliAction, mode: OutputMode) -> Result<String> {
    let ctx = QueryContext::background();
    let output = match action {
        CliAction::Services => format_names(&store.get_services(&ctx)?, mode),
        CliAction::Operations { service } => {
            format_names(&store.get_operations(&ctx, &service)?, mode)
        }
        CliAction::Trace { trace_id } => {
            format_traces(&[store.get_trace(&ctx, trace_id)?], mode)
        }
        CliAction::Find { query, ids_only } if ids_only => {
            format_trace_ids(&store.find_trace_ids(&ctx, Some(&query))?, mode)
        }
        CliAction::Find { query, .. } => {
            format_traces(&store.find_traces(&ctx, Some(&query))?, mode)
        }
        CliAction::Write { file } => {
            let written = write_spans(store, &file)?;
            match mode {
                OutputMode::Human => format!("wrote {} spans", written),
                OutputMode::Json => serde_json::json!({ "written": written }).to_string(),
            }
        }
        CliAction::Dependencies { end, lookback } => {
            format_dependencies(&store.get_dependencies(end, lookback)?, mode)
        }
    };
    Ok(output)
}

fn write_spans(store: &Store, file: &str) -> Result<usize> {
    let bytes = if file == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read(file).with_context(|| format!("failed to read {}", file))?
    };

    let spans = JsonCodec
        .decode_many(&bytes)
        .with_context(|| format!("{} is not a JSON array of spans", file))?;
    for (i, span) in spans.iter().enumerate() {
        store
            .write_span(span)
            .with_context(|| format!("span #{} (trace {})", i, span.trace_id))?;
    }
    Ok(spans.len())
}
