//! clap command tree.

use clap::{Arg, ArgAction, Command};

/// Build the top-level command.
pub fn build_cli() -> Command {
    Command::new("spanstore")
        .about("Inspect and load a spanstore storage directory")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Storage directory (overrides storage_path)"),
        )
        .arg(
            Arg::new("retention-secs")
                .long("retention-secs")
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Data retention in seconds"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(["series", "blob"])
                .help("Payload backend for trace lookups"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of text"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("services").about("List service names"))
        .subcommand(
            Command::new("operations")
                .about("List operation names of a service")
                .arg(Arg::new("service").help("Service name; omit for all services")),
        )
        .subcommand(
            Command::new("trace")
                .about("Print every span of a trace")
                .arg(Arg::new("trace-id").required(true).help("Trace id in hex")),
        )
        .subcommand(find_command())
        .subcommand(
            Command::new("write")
                .about("Write spans from a JSON array file")
                .arg(Arg::new("file").required(true).help("Path, or - for stdin")),
        )
        .subcommand(
            Command::new("dependencies")
                .about("List service dependency links")
                .arg(
                    Arg::new("end")
                        .long("end")
                        .help("End of the window, RFC 3339 (default: now)"),
                )
                .arg(
                    Arg::new("lookback")
                        .long("lookback")
                        .default_value("1h")
                        .help("Window length, e.g. 30m"),
                ),
        )
}

fn find_command() -> Command {
    Command::new("find")
        .about("Search traces")
        .arg(
            Arg::new("service")
                .long("service")
                .short('s')
                .help("Service name"),
        )
        .arg(
            Arg::new("operation")
                .long("operation")
                .short('o')
                .help("Operation name"),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .short('t')
                .action(ArgAction::Append)
                .help("Tag filter key=value; repeatable"),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .help("Earliest start time, RFC 3339 (default: end - lookback)"),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .help("Latest start time, RFC 3339 (default: now)"),
        )
        .arg(
            Arg::new("lookback")
                .long("lookback")
                .default_value("1h")
                .help("Window length when --start is omitted"),
        )
        .arg(
            Arg::new("min-duration")
                .long("min-duration")
                .help("Minimum span duration, e.g. 250ms"),
        )
        .arg(
            Arg::new("max-duration")
                .long("max-duration")
                .help("Maximum span duration, e.g. 2s"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .value_parser(clap::value_parser!(usize))
                .help("Maximum number of traces"),
        )
        .arg(
            Arg::new("ids-only")
                .long("ids-only")
                .action(ArgAction::SetTrue)
                .help("Print trace ids only"),
        )
}
