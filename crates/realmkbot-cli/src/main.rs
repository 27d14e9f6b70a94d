//! Realmkbot - Telegram Channel Archiver CLI
//!
//! The `realmkbot` command archives a Telegram channel into a local
//! embedded database and inspects the result.
//!
//! ## Commands
//!
//! - `run`: archive the channel until interrupted (or `--once` to drain)
//! - `status`: show cursor state and gap count
//! - `list`: print archived posts, newest first
//! - `gaps`: list message ids missing below the high-water mark

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use realmkbot_core::{
    missing_ids, ArchiveHandle, Archiver, BotClient, Config, PostArchive,
};

#[derive(Parser)]
#[command(name = "realmkbot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Telegram channel archiver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Username of the channel to archive
    #[arg(long, env = "REALMKBOT_CHAT", global = true)]
    chat: Option<String>,

    /// Directory holding the archive database
    #[arg(long, env = "REALMKBOT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive the channel until interrupted
    Run {
        /// Bot API token
        #[arg(long, env = "REALMKBOT_BOT_TOKEN", hide_env_values = true)]
        bot_token: String,

        /// Long-poll timeout in seconds
        #[arg(long, env = "REALMKBOT_POLL_TIMEOUT", default_value = "30")]
        poll_timeout: u64,

        /// Alternative Bot API host (self-hosted gateway)
        #[arg(long, env = "REALMKBOT_API_BASE")]
        api_base: Option<String>,

        /// Drain pending updates and exit instead of polling forever
        #[arg(long)]
        once: bool,
    },

    /// Show archive status for the channel
    Status,

    /// Print archived posts, newest first
    List {
        /// Maximum number of posts to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List message ids missing below the high-water mark
    Gaps,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    realmkbot_core::init_tracing(cli.json, cli.verbose);

    let chat = cli
        .chat
        .clone()
        .context("channel not set: pass --chat or set REALMKBOT_CHAT")?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("./data"));

    match cli.command {
        Commands::Run {
            bot_token,
            poll_timeout,
            api_base,
            once,
        } => {
            let mut config = Config::new(bot_token, chat)
                .with_data_dir(data_dir)
                .with_poll_timeout(poll_timeout);
            if let Some(base) = api_base {
                config = config.with_api_base(base);
            }
            run_archiver(config, once).await
        }
        Commands::Status => show_status(&data_dir, &chat).await,
        Commands::List { limit } => list_posts(&data_dir, &chat, limit).await,
        Commands::Gaps => list_gaps(&data_dir, &chat).await,
    }
}

async fn run_archiver(config: Config, once: bool) -> Result<()> {
    info!("Using archive at {}", config.data_dir.display());

    let archive = ArchiveHandle::open(&config.data_dir)
        .await
        .context("Failed to open archive")?;

    let mut client = BotClient::new(&config.bot_token);
    if let Some(base) = &config.api_base {
        client = client.with_api_base(base);
    }

    let archiver = Archiver::new(archive, client, config);
    archiver.login().await.context("Failed to log in")?;

    let report = if once {
        archiver.drain().await?
    } else {
        let shutdown = async {
            tokio::signal::ctrl_c().await.ok();
        };
        archiver.run(shutdown).await?
    };

    println!(
        "Done: {} batches, {} updates, {} posts archived",
        report.batches, report.updates, report.archived
    );
    Ok(())
}

async fn show_status(data_dir: &Path, chat: &str) -> Result<()> {
    let archive = ArchiveHandle::open(data_dir)
        .await
        .context("Failed to open archive")?;

    let cursor = archive.load_cursor(chat).await?;
    let count = archive.post_count(chat).await?;
    let present = archive.archived_ids(chat).await?;
    let gaps = missing_ids(&present, cursor.last_index).count();

    println!("Channel:       @{chat}");
    println!("Archived:      {count} post(s)");
    println!("Last index:    {}", cursor.last_index);
    println!("Gaps:          {gaps}");
    println!("Update offset: {}", cursor.update_offset);
    Ok(())
}

async fn list_posts(data_dir: &Path, chat: &str, limit: usize) -> Result<()> {
    let archive = ArchiveHandle::open(data_dir)
        .await
        .context("Failed to open archive")?;

    let posts = archive.list_posts(chat, limit).await?;
    if posts.is_empty() {
        println!("Nothing archived for @{chat}");
        return Ok(());
    }

    for post in posts {
        let line = post.text.lines().next().unwrap_or("");
        println!("{:>6}  {}  {}", post.message_id, post.posted_at, line);
    }
    Ok(())
}

async fn list_gaps(data_dir: &Path, chat: &str) -> Result<()> {
    let archive = ArchiveHandle::open(data_dir)
        .await
        .context("Failed to open archive")?;

    let high = archive.last_index(chat).await?;
    let present = archive.archived_ids(chat).await?;
    let gaps: Vec<u32> = missing_ids(&present, high).collect();

    if gaps.is_empty() {
        println!("No gaps below index {high}");
        return Ok(());
    }

    println!("{} gap(s) below index {high}:", gaps.len());
    for id in gaps {
        println!("{id}");
    }
    Ok(())
}
