use anyhow::{Context, bail, ensure};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{Level, info};
use wikihop_core::report::{SearchReport, generate_cache_report, render, save_report};
use wikihop_core::{
    CacheBackend, FetchMode, FinderConfig, QueryStatus, ReportFormat, SqliteLinkCache, run_query,
};

pub const EXIT_FOUND: i32 = 0;
pub const EXIT_NOT_FOUND: i32 = 1;
pub const EXIT_INVALID: i32 = 2;

/// Install the stderr log subscriber; repeated `-v` flags raise the level.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Turn a bare page title into a URL under `prefix`. Anything that already looks
/// like a URL, or is blank, is passed through for the finder to validate.
pub fn normalize_page_arg(raw: &str, prefix: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        return trimmed.to_string();
    }
    format!(
        "{}/wiki/{}",
        prefix.trim_end_matches('/'),
        trimmed.replace(' ', "_")
    )
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(3600))
}

/// Build finder settings from the arguments of the `find` subcommand.
pub fn config_from_matches(args: &ArgMatches) -> anyhow::Result<FinderConfig> {
    let mut config = FinderConfig::default();

    if let Some(site) = args.get_one::<String>("site") {
        config.site_prefix = site.trim_end_matches('/').to_string();
    }
    if let Some(max_expanded) = args.get_one::<usize>("max-expanded") {
        ensure!(*max_expanded > 0, "--max-expanded must be at least 1");
        config.max_expanded = *max_expanded;
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config.fetch_timeout = Duration::from_secs(*timeout);
    }
    if let Some(max_links) = args.get_one::<usize>("max-links") {
        ensure!(*max_links > 0, "--max-links must be at least 1");
        config.max_links = *max_links;
    }

    config.fetch_mode = if args.get_flag("sequential") {
        FetchMode::Sequential
    } else if let Some(workers) = args.get_one::<usize>("threads") {
        ensure!(*workers > 0, "--threads must be at least 1");
        FetchMode::Parallel { workers: *workers }
    } else {
        FetchMode::default()
    };
    config.verify_links = args.get_flag("verify-links");

    if let Some(db) = args.get_one::<String>("cache-db") {
        config.cache = CacheBackend::Sqlite {
            path: expand_path(db),
            ttl: args.get_one::<u64>("cache-ttl").map(|h| hours(*h)),
        };
    }

    Ok(config)
}

fn exit_code(status: QueryStatus) -> i32 {
    match status {
        QueryStatus::Found => EXIT_FOUND,
        QueryStatus::NotFound => EXIT_NOT_FOUND,
        QueryStatus::BadRequest => EXIT_INVALID,
    }
}

fn search_spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}

/// Run one search and print (or save) the report. Returns the process exit code.
pub async fn handle_find(args: &ArgMatches, quiet: bool) -> anyhow::Result<i32> {
    let config = config_from_matches(args)?;
    let format: ReportFormat = args
        .get_one::<String>("format")
        .map(|f| f.parse::<ReportFormat>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(ReportFormat::Text);

    let start = normalize_page_arg(
        args.get_one::<String>("START").map(String::as_str).unwrap_or_default(),
        &config.site_prefix,
    );
    let end = normalize_page_arg(
        args.get_one::<String>("END").map(String::as_str).unwrap_or_default(),
        &config.site_prefix,
    );

    let finder = config.build().context("Failed to set up the path finder")?;
    info!(
        "Searching {} -> {} (cap {}, {:?})",
        start,
        end,
        finder.max_expanded(),
        finder.fetch_mode()
    );

    let spinner = search_spinner(quiet, format!("Searching for a path to {}", end));
    let started = Instant::now();
    let response = run_query(&finder, &start, &end).await;
    spinner.finish_and_clear();

    let report = SearchReport::new(&start, &end, &response, started.elapsed());
    let rendered = render(&report, format).context("Failed to render report")?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", rendered),
    }

    Ok(exit_code(response.status))
}

fn open_existing_cache(path: &Path) -> anyhow::Result<SqliteLinkCache> {
    if !SqliteLinkCache::exists(path) {
        bail!(
            "No link cache at {} (run `wikihop cache init` first)",
            path.display()
        );
    }
    SqliteLinkCache::open(path)
        .with_context(|| format!("Failed to open link cache at {}", path.display()))
}

fn cache_path(args: &ArgMatches, id: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<String>(id)
        .map(|p| expand_path(p))
        .context("No cache database path given")
}

pub fn handle_cache_init(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let db_path = cache_path(args, "PATH")?;
    let force = args.get_flag("force");

    if SqliteLinkCache::exists(&db_path) {
        if !force {
            bail!(
                "A link cache already exists at {} (use --force to replace it)",
                db_path.display()
            );
        }
        SqliteLinkCache::drop(&db_path)
            .with_context(|| format!("Failed to delete {}", db_path.display()))?;
        if !quiet {
            println!("{} Deleted existing cache", "✓".green());
        }
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    SqliteLinkCache::open(&db_path)
        .with_context(|| format!("Failed to create link cache at {}", db_path.display()))?;

    if !quiet {
        println!(
            "{} Link cache initialised at {}",
            "✓".green().bold(),
            db_path.display()
        );
    }
    Ok(())
}

pub fn handle_cache_stats(args: &ArgMatches) -> anyhow::Result<()> {
    let db_path = cache_path(args, "db")?;
    let ttl = args.get_one::<u64>("ttl").map(|h| hours(*h));

    let mut cache = open_existing_cache(&db_path)?;
    if let Some(ttl) = ttl {
        cache = cache.with_ttl(ttl);
    }
    let stats = cache.stats()?;
    print!("{}", generate_cache_report(&stats, &db_path, ttl));
    Ok(())
}

pub fn handle_cache_purge(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let db_path = cache_path(args, "db")?;
    let ttl = args
        .get_one::<u64>("ttl")
        .copied()
        .context("No purge age given")?;

    let removed = open_existing_cache(&db_path)?.purge_older_than(hours(ttl))?;
    if !quiet {
        println!(
            "{} Purged {} entries older than {}h",
            "✓".green().bold(),
            removed,
            ttl
        );
    }
    Ok(())
}

pub fn handle_cache_clear(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let db_path = cache_path(args, "db")?;

    let removed = open_existing_cache(&db_path)?.clear()?;
    if !quiet {
        println!("{} Removed {} cached pages", "✓".green().bold(), removed);
    }
    Ok(())
}
