//! Journal Archiver main entry point
//!
//! This is the command-line interface for the journal archiver.

use clap::Parser;
use journal_archiver::config::{load_config_with_hash, Config};
use journal_archiver::crawler::{discover_first_post, fetch_profile, CrawlDriver, CrawlOptions};
use journal_archiver::output::{load_statistics, print_statistics, ArchiveStatistics};
use journal_archiver::storage::{ArchiveStorage, JsonDirectoryStorage, PostSink, SqliteStorage};
use journal_archiver::{ArchiveError, Credentials, JournalArchive, JournalUrls, Session};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Journal Archiver: archives a hosted journal with every comment thread
///
/// Walks the journal from its oldest post forward, one post at a time,
/// and stores each post together with its fully threaded comments.
#[derive(Parser, Debug)]
#[command(name = "journal-archiver")]
#[command(version = "1.0.0")]
#[command(about = "Archives a hosted journal with its comment threads", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Account to log in with
    #[arg(long, conflicts_with = "anonymous")]
    user: Option<String>,

    /// Password for --user
    #[arg(long, env = "JOURNAL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Archive without logging in (public posts only)
    #[arg(long)]
    anonymous: bool,

    /// Start from this post instead of walking the calendar
    #[arg(long, value_name = "URL")]
    first_post: Option<String>,

    /// Keep the raw page HTML of every post
    #[arg(long)]
    capture_source: bool,

    /// Validate config and show what would be archived without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the last run from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_archive(&config, &config_hash, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("journal_archiver=info,warn"),
            1 => EnvFilter::new("journal_archiver=debug,info"),
            2 => EnvFilter::new("journal_archiver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be archived
fn handle_dry_run(config: &Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let urls = JournalUrls::new(&config.site, &config.journal.name)?;

    println!("=== Journal Archiver Dry Run ===\n");

    println!("Journal: {}", config.journal.name);
    println!("  Journal URL: {}", urls.journal);
    println!("  Profile: {}", urls.profile);
    println!("  Calendar: {}", urls.calendar);
    println!("  Login form: {}", urls.login());

    println!("\nCrawler Configuration:");
    println!("  Delay between posts: {}ms", config.crawler.post_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!(
        "  Capture source: {}",
        config.crawler.capture_source || cli.capture_source
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Directory: {}",
        Path::new(&config.output.directory)
            .join(&config.journal.name)
            .display()
    );
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: (none)"),
    }

    println!("\n✓ Configuration is valid");
    match &cli.first_post {
        Some(url) => println!("✓ Would start at {}", url),
        None => println!("✓ Would discover the first post from {}", urls.calendar),
    }
    match &cli.user {
        Some(user) => println!("✓ Would log in as {}", user),
        None => println!("✓ Would archive anonymously"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = config
        .output
        .database_path
        .as_deref()
        .ok_or("--stats needs output.database-path in the configuration")?;

    println!("Database: {}\n", path);

    let storage = SqliteStorage::new(Path::new(path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Establishes the session the whole run fetches under
async fn open_session(config: &Config, cli: &Cli) -> Result<Session, Box<dyn std::error::Error>> {
    match &cli.user {
        Some(user) => {
            let password = cli
                .password
                .as_deref()
                .ok_or("--user needs --password or JOURNAL_PASSWORD")?;
            let credentials = Credentials::new(user.as_str(), password);
            Ok(Session::login(config, &credentials).await?)
        }
        None => {
            tracing::info!("Archiving anonymously, only public posts will be visible");
            Ok(Session::anonymous(config)?)
        }
    }
}

/// Handles the main archive operation
async fn handle_archive(
    config: &Config,
    config_hash: &str,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(config, cli).await?;
    let urls = session.urls().clone();

    let profile = fetch_profile(&session, &urls).await?;
    tracing::info!("{} is a {}", config.journal.name, profile.journal_type);

    let first_post = match &cli.first_post {
        Some(url) => url.clone(),
        None => discover_first_post(&session, &urls).await?,
    };

    let mut archive =
        JournalArchive::new(session.operator(), &config.journal.name, profile.journal_type);
    archive.profile = profile.profile;

    let json = JsonDirectoryStorage::new(Path::new(&config.output.directory), &config.journal.name)?;
    let sqlite = match &config.output.database_path {
        Some(path) => {
            let mut sqlite = SqliteStorage::new(Path::new(path))?;
            let run_id = sqlite.create_run(&config.journal.name, session.operator(), config_hash)?;
            tracing::info!("Recording run {} in {}", run_id, path);
            Some(sqlite)
        }
        None => None,
    };
    let mut storage = ArchiveStorage::new(json, sqlite);

    let mut options = CrawlOptions::from_config(&config.crawler);
    options.capture_source |= cli.capture_source;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping before the next post is stored");
            interrupt.cancel();
        }
    });

    let mut driver = CrawlDriver::new(&session, &mut storage, urls, archive, options);
    driver.start(first_post)?;
    let result = driver.run(&cancel).await;

    match result {
        Ok(()) => {
            let archive = driver.finish()?;
            tracing::info!(
                "Archive written to {}",
                storage.json().directory().display()
            );
            print_statistics(&ArchiveStatistics::from_archive(&archive));
            Ok(())
        }
        Err(ArchiveError::Cancelled) => {
            let archived = driver.archive().posts.len();
            drop(driver);
            storage.record_failure("cancelled")?;
            tracing::warn!("Archive cancelled after {} posts", archived);
            Err(ArchiveError::Cancelled.into())
        }
        Err(e) => {
            tracing::error!("Archive failed: {}", e);
            Err(e.into())
        }
    }
}
