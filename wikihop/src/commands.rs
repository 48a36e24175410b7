use clap::{arg, command};

pub const DEFAULT_CACHE_DB: &str = "~/.config/wikihop/links.db";
pub const DEFAULT_CACHE_TTL_HOURS: &str = "24";
pub const CACHE_DB_ENV: &str = "WIKIHOP_CACHE_DB";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn cache_db_arg() -> clap::Arg {
    arg!(--"db" <PATH>)
        .required(false)
        .help("Location of the link cache database")
        .env(CACHE_DB_ENV)
        .default_value(DEFAULT_CACHE_DB)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikihop")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikihop")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" ... "Log more detail to stderr (-v info, -vv debug)")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("find")
                .about(
                    "Find the shortest chain of links from one page to another. Pages may be \
                given as full URLs or as bare titles.",
                )
                .arg(arg!(<START> "Page to start from").required(true))
                .arg(arg!(<END> "Page to reach").required(true))
                .arg(
                    arg!(--"max-expanded" <COUNT>)
                        .required(false)
                        .help("Give up after expanding this many pages")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page fetch deadline in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("6"),
                )
                .arg(
                    arg!(--"max-links" <COUNT>)
                        .required(false)
                        .help("Maximum outbound links kept per page")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of fetch workers (default: available parallelism)")
                        .value_parser(clap::value_parser!(usize))
                        .conflicts_with("sequential"),
                )
                .arg(
                    arg!(--"sequential")
                        .required(false)
                        .help("Fetch pages inline, one at a time")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"verify-links")
                        .required(false)
                        .help("Only keep outbound links that answer a request")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"cache-db" <PATH>)
                        .required(false)
                        .help("Persist resolved links in this SQLite database (default: in memory)")
                        .env(CACHE_DB_ENV),
                )
                .arg(
                    arg!(--"cache-ttl" <HOURS>)
                        .required(false)
                        .help("Refetch cached pages older than this many hours")
                        .value_parser(clap::value_parser!(u64))
                        .requires("cache-db"),
                )
                .arg(
                    arg!(--"site" <PREFIX>)
                        .required(false)
                        .help("Only follow links under this URL prefix")
                        .default_value(wikihop_scanner::DEFAULT_SITE_PREFIX),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("cache")
                .about("Manage the persistent link cache")
                .subcommand_required(true)
                .subcommand(
                    command!("init")
                        .about("Creates the link cache database on your filesystem")
                        .arg(
                            arg!([PATH])
                                .required(false)
                                .help("Location to store the link cache database")
                                .env(CACHE_DB_ENV)
                                .default_value(DEFAULT_CACHE_DB),
                        )
                        .arg(
                            arg!(-f --"force")
                                .help("Replaces any existing database at the specified location.")
                                .required(false),
                        ),
                )
                .subcommand(
                    command!("stats")
                        .about("Shows how many pages are cached and how old they are")
                        .arg(cache_db_arg())
                        .arg(
                            arg!(--"ttl" <HOURS>)
                                .required(false)
                                .help("Count entries older than this many hours as expired")
                                .value_parser(clap::value_parser!(u64)),
                        ),
                )
                .subcommand(
                    command!("purge")
                        .about("Deletes cached pages older than the given age")
                        .arg(cache_db_arg())
                        .arg(
                            arg!(--"ttl" <HOURS>)
                                .required(false)
                                .help("Maximum age in hours of entries to keep")
                                .value_parser(clap::value_parser!(u64))
                                .default_value(DEFAULT_CACHE_TTL_HOURS),
                        ),
                )
                .subcommand(
                    command!("clear")
                        .about("Deletes every cached page")
                        .arg(cache_db_arg()),
                ),
        )
}
