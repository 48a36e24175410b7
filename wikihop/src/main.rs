use clap::ArgMatches;
use colored::Colorize;
use wikihop::command_argument_builder;
use wikihop::handlers::{
    EXIT_INVALID, handle_cache_clear, handle_cache_init, handle_cache_purge, handle_cache_stats,
    handle_find, init_tracing,
};
use wikihop_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let outcome = match chosen_command.subcommand() {
        // No subcommand provided, just show the banner
        None => return,
        Some(("find", primary_command)) => handle_find(primary_command, quiet).await,
        Some(("cache", primary_command)) => handle_cache(primary_command, quiet),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(EXIT_INVALID);
        }
    }
}

fn handle_cache(args: &ArgMatches, quiet: bool) -> anyhow::Result<i32> {
    match args.subcommand() {
        Some(("init", secondary_command)) => handle_cache_init(secondary_command, quiet)?,
        Some(("stats", secondary_command)) => handle_cache_stats(secondary_command)?,
        Some(("purge", secondary_command)) => handle_cache_purge(secondary_command, quiet)?,
        Some(("clear", secondary_command)) => handle_cache_clear(secondary_command, quiet)?,
        _ => unreachable!("clap should ensure we don't get here"),
    }
    Ok(0)
}
