//! DarkLens CLI
//!
//! Hidden-service crawler with risk scoring and a trending link catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use darklens_core::{LinkRecord, RiskClassifier, Vocabulary, DEFAULT_SEEDS};
use darklens_runtime::{CrawlContext, Crawler, CrawlerConfig, Harvester};
use darklens_store::{FsBlobStore, LinkStore, SqliteLinkStore};
use darklens_tor::{canonical_url, check_tor_connection, PageFetcher, TorConfig, TorPageFetcher};

#[derive(Parser)]
#[command(name = "darklens")]
#[command(author, version, about = "DarkLens: hidden-service crawler and link catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// SQLite catalog path
    #[arg(long, env = "DARKLENS_DB", default_value = "darklens.db", global = true)]
    db: PathBuf,
}

#[derive(Args, Clone)]
struct TorArgs {
    /// Tor SOCKS host
    #[arg(long, env = "TOR_HOST", default_value = "127.0.0.1")]
    tor_host: String,

    /// Tor SOCKS port
    #[arg(long, env = "TOR_PORT", default_value = "9050")]
    tor_port: u16,

    /// Seconds allowed to read a page once it responds
    #[arg(long, env = "SCRIPT_TIMEOUT_SECS", default_value = "30")]
    script_timeout: u64,
}

impl TorArgs {
    fn config(&self) -> TorConfig {
        TorConfig {
            socks_host: self.tor_host.clone(),
            socks_port: self.tor_port,
            script_timeout: Duration::from_secs(self.script_timeout),
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct CrawlArgs {
    #[command(flatten)]
    tor: TorArgs,

    /// Deepest hop followed below a seed
    #[arg(long, env = "MAX_DEPTH", default_value = "2")]
    max_depth: usize,

    /// Seconds to sleep between crawl cycles
    #[arg(long, env = "CRAWL_INTERVAL_SECS", default_value = "10")]
    interval: u64,

    /// Seconds allowed for a single navigation
    #[arg(long, env = "NAV_TIMEOUT_SECS", default_value = "60")]
    nav_timeout: u64,

    /// Directory for page captures
    #[arg(long, env = "SCREENSHOT_DIR", default_value = "screenshots")]
    screenshot_dir: PathBuf,

    /// Public URL prefix for stored captures
    #[arg(long, env = "SCREENSHOT_PUBLIC_BASE")]
    screenshot_public_base: Option<String>,

    /// TOML file replacing the built-in keyword vocabulary
    #[arg(long, env = "VOCABULARY_FILE")]
    vocabulary: Option<PathBuf>,

    /// Harvest sources into the frontier before every cycle
    #[arg(long)]
    harvest: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the frontier continuously until interrupted
    Crawl(CrawlArgs),

    /// Run a single crawl cycle and print its summary
    Once(CrawlArgs),

    /// Add seed URLs to the frontier
    Seed {
        /// Seed URLs
        urls: Vec<String>,

        /// Description stored with new seeds
        #[arg(short, long)]
        description: Option<String>,

        /// Also add the built-in directory seeds
        #[arg(long)]
        defaults: bool,

        /// Disable the given seeds instead of adding them
        #[arg(long, conflicts_with = "defaults")]
        disable: bool,

        /// List every frontier entry
        #[arg(long, conflicts_with_all = ["defaults", "disable"])]
        list: bool,
    },

    /// Add or list harvest sources
    Sources {
        /// Source URLs
        urls: Vec<String>,

        /// Description stored with new sources
        #[arg(short, long)]
        description: Option<String>,

        /// Also add the built-in directory pages
        #[arg(long)]
        defaults: bool,

        /// List the active sources
        #[arg(long, conflicts_with = "defaults")]
        list: bool,
    },

    /// Harvest every active source into the frontier
    Harvest {
        #[command(flatten)]
        tor: TorArgs,

        /// Seconds allowed for a single navigation
        #[arg(long, env = "NAV_TIMEOUT_SECS", default_value = "60")]
        nav_timeout: u64,
    },

    /// List the top trending links
    Trending {
        /// Number of links to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show the stored record for a URL
    Show {
        url: String,

        /// Also explain the risk score
        #[arg(long)]
        explain: bool,

        /// TOML file replacing the built-in keyword vocabulary
        #[arg(long, env = "VOCABULARY_FILE")]
        vocabulary: Option<PathBuf>,
    },

    /// Check Tor connection status
    Status {
        #[command(flatten)]
        tor: TorArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Crawl(args) => run_crawl(&cli.db, args).await?,
        Commands::Once(args) => run_once(&cli.db, args).await?,
        Commands::Seed {
            urls,
            description,
            defaults,
            disable,
            list,
        } => {
            if list {
                list_frontier(&cli.db).await?
            } else {
                seed(&cli.db, urls, description, defaults, disable).await?
            }
        }
        Commands::Sources {
            urls,
            description,
            defaults,
            list,
        } => sources(&cli.db, urls, description, defaults, list).await?,
        Commands::Harvest { tor, nav_timeout } => harvest(&cli.db, tor.config(), nav_timeout).await?,
        Commands::Trending { limit } => trending(&cli.db, limit).await?,
        Commands::Show {
            url,
            explain,
            vocabulary,
        } => show(&cli.db, &url, explain, vocabulary.as_deref()).await?,
        Commands::Status { tor } => check_status(tor.config()).await?,
    }

    Ok(())
}

fn load_vocabulary(path: Option<&Path>) -> Result<Vocabulary> {
    match path {
        Some(path) => Vocabulary::from_file(path)
            .with_context(|| format!("Failed to load vocabulary from {}", path.display())),
        None => Ok(Vocabulary::default()),
    }
}

fn open_store(db: &Path) -> Result<Arc<SqliteLinkStore>> {
    let store = SqliteLinkStore::open(db)
        .with_context(|| format!("Failed to open catalog at {}", db.display()))?;
    Ok(Arc::new(store))
}

async fn build_crawler(db: &Path, args: CrawlArgs) -> Result<Crawler> {
    let vocabulary = load_vocabulary(args.vocabulary.as_deref())?;
    let store = open_store(db)?;
    let blobs = FsBlobStore::new(args.screenshot_dir.clone(), args.screenshot_public_base.clone())
        .await
        .with_context(|| format!("Failed to prepare {}", args.screenshot_dir.display()))?;

    let config = CrawlerConfig::default()
        .with_max_depth(args.max_depth)
        .with_crawl_interval(Duration::from_secs(args.interval))
        .with_navigation_timeout(Duration::from_secs(args.nav_timeout));

    let context = CrawlContext::new(store, Arc::new(blobs), &vocabulary, config);
    let tor_config = args.tor.config();

    info!(
        "Catalog: {} | Proxy: {} | Max depth: {}",
        db.display(),
        tor_config.socks_addr(),
        args.max_depth
    );

    let crawler = Crawler::new(context, move || {
        let fetcher = TorPageFetcher::new(tor_config.clone())?;
        Ok(Arc::new(fetcher) as Arc<dyn PageFetcher>)
    });
    Ok(crawler.with_harvest(args.harvest))
}

async fn run_crawl(db: &Path, args: CrawlArgs) -> Result<()> {
    let crawler = build_crawler(db, args).await?;

    info!("Starting crawler, press Ctrl-C to stop");
    tokio::select! {
        _ = crawler.run(None) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

async fn run_once(db: &Path, args: CrawlArgs) -> Result<()> {
    let crawler = build_crawler(db, args).await?;
    let summary = crawler.run_cycle().await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn seed(
    db: &Path,
    mut urls: Vec<String>,
    description: Option<String>,
    defaults: bool,
    disable: bool,
) -> Result<()> {
    let store = open_store(db)?;

    if disable {
        if urls.is_empty() {
            bail!("No seed URLs given to disable");
        }
        for url in urls.iter().map(|url| canonical_url(url)) {
            if store.set_frontier_active(&url, false).await? {
                println!("⏸️  Disabled {}", url);
            } else {
                println!("❓ Unknown seed {}", url);
            }
        }
        return Ok(());
    }

    let mut entries: Vec<(String, Option<String>)> = Vec::new();
    if defaults {
        entries.extend(
            DEFAULT_SEEDS
                .iter()
                .map(|s| (s.url.to_string(), Some(s.description.to_string()))),
        );
    }
    entries.extend(urls.drain(..).map(|url| (canonical_url(&url), description.clone())));

    if entries.is_empty() {
        bail!("No seed URLs given (pass URLs or --defaults)");
    }

    for (url, description) in entries {
        if store.add_frontier(&url, description.as_deref()).await? {
            println!("🌱 Added {}", url);
        } else {
            println!("   Already present {}", url);
        }
    }

    Ok(())
}

async fn list_frontier(db: &Path) -> Result<()> {
    let store = open_store(db)?;
    let entries = store.frontier_entries().await?;

    if entries.is_empty() {
        println!("Frontier is empty.");
        return Ok(());
    }

    println!("🌱 {} frontier entries\n", entries.len());
    for entry in &entries {
        let state = if entry.is_active { "active" } else { "off" };
        println!(
            "[{:<6}] {} (added {})",
            state,
            entry.url,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(description) = &entry.description {
            println!("         {}", description);
        }
    }

    Ok(())
}

async fn sources(
    db: &Path,
    urls: Vec<String>,
    description: Option<String>,
    defaults: bool,
    list: bool,
) -> Result<()> {
    let store = open_store(db)?;

    if list {
        let sources = store.list_active_sources().await?;
        if sources.is_empty() {
            println!("No harvest sources.");
        }
        for source in &sources {
            let checked = source
                .last_checked_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!("📚 {} (checked {})", source.url, checked);
        }
        return Ok(());
    }

    let mut entries: Vec<(String, Option<String>)> = Vec::new();
    if defaults {
        entries.extend(
            DEFAULT_SEEDS
                .iter()
                .map(|s| (s.url.to_string(), Some(s.description.to_string()))),
        );
    }
    entries.extend(urls.iter().map(|url| (canonical_url(url), description.clone())));

    if entries.is_empty() {
        bail!("No source URLs given (pass URLs or --defaults)");
    }

    for (url, description) in entries {
        if store.add_source(&url, description.as_deref()).await? {
            println!("📚 Added source {}", url);
        } else {
            println!("   Already present {}", url);
        }
    }

    Ok(())
}

async fn harvest(db: &Path, config: TorConfig, nav_timeout: u64) -> Result<()> {
    let store = open_store(db)?;
    let fetcher = TorPageFetcher::new(config).context("Failed to build Tor client")?;

    let summary = Harvester::new(store, Arc::new(fetcher), Duration::from_secs(nav_timeout))
        .run()
        .await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn trending(db: &Path, limit: usize) -> Result<()> {
    let store = open_store(db)?;
    let records = store.top_trending(limit).await?;

    if records.is_empty() {
        println!("No links crawled yet.");
        return Ok(());
    }

    println!("📈 Top {} trending links\n", records.len());
    for (rank, record) in records.iter().enumerate() {
        let title = if record.title.is_empty() { "(untitled)" } else { record.title.as_str() };
        println!(
            "{:>3}. [{:<6}] {} ({} sources, crawled {})",
            rank + 1,
            record.risk_score.as_str(),
            record.url,
            record.source_count,
            record.last_crawled_at.format("%Y-%m-%d %H:%M")
        );
        println!("      {}", title);
    }

    Ok(())
}

/// Stored record for a URL as typed on the command line
async fn find_record(store: &dyn LinkStore, url: &str) -> Result<Option<LinkRecord>> {
    Ok(store.find_by_url(&canonical_url(url)).await?)
}

async fn show(db: &Path, url: &str, explain: bool, vocabulary: Option<&Path>) -> Result<()> {
    let store = open_store(db)?;
    let Some(record) = find_record(store.as_ref(), url).await? else {
        bail!("No record for {}", url);
    };

    println!("{}", serde_json::to_string_pretty(&record)?);

    if explain {
        let vocabulary = load_vocabulary(vocabulary)?;
        let assessment = RiskClassifier::new(&vocabulary.risk).classify_detailed(&record.title, &record.content);
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    }

    Ok(())
}

async fn check_status(config: TorConfig) -> Result<()> {
    println!("🔌 Checking Tor connection...\n");

    match check_tor_connection(&config, Duration::from_secs(30)).await {
        Ok(true) => {
            println!("✅ Tor is running and accessible");
            println!("   Proxy: {}", config.socks_addr());
        }
        Ok(false) => {
            println!("❌ Tor is not accessible");
            println!("   Expected proxy at: {}", config.socks_addr());
            println!("\n   To install Tor:");
            println!("   - Linux: sudo apt install tor");
            println!("   - Mac: brew install tor");
            println!("   - Then start: sudo systemctl start tor (or brew services start tor)");
        }
        Err(e) => {
            println!("❌ Error checking Tor: {}", e);
        }
    }

    Ok(())
}
