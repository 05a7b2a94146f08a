use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use mogile_client::{ClientConfig, StorageClient};
use mogile_types::{Key, StorageClass, TrackerAddr};

use crate::cli::*;
use crate::config::FileConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::resolve(&cli)?;
    match cli.command {
        Command::Put(args) => cmd_put(&settings, args).await,
        Command::Get(args) => cmd_get(&settings, args).await,
        Command::Rm(args) => cmd_rm(&settings, args).await,
        Command::Mv(args) => cmd_mv(&settings, args).await,
        Command::Paths(args) => cmd_paths(&settings, args).await,
        Command::Watch(args) => cmd_watch(&settings, args).await,
    }
}

/// Flags merged over the config file.
#[derive(Debug)]
struct Settings {
    trackers: Vec<String>,
    domain: String,
    class: StorageClass,
}

impl Settings {
    fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                debug!(path = %path, "loading config file");
                FileConfig::load(Path::new(path))?
            }
            None => FileConfig::default(),
        };
        let trackers = cli
            .trackers
            .clone()
            .or(file.trackers)
            .context("no trackers configured; pass --trackers or a config file")?;
        let domain = cli
            .domain
            .clone()
            .or(file.domain)
            .context("no domain configured; pass --domain or a config file")?;
        let addrs = TrackerAddr::parse_list(&trackers)?;
        Ok(Self {
            trackers: addrs.iter().map(|a| a.to_string()).collect(),
            domain,
            class: StorageClass::new(file.class.unwrap_or_default()),
        })
    }

    fn client(&self) -> anyhow::Result<StorageClient> {
        let config = ClientConfig::new(self.domain.as_str(), self.trackers.clone());
        Ok(StorageClient::new(config)?)
    }
}

async fn cmd_put(settings: &Settings, args: PutArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let key = Key::new(args.key.as_str())?;
    let class = match &args.class {
        Some(class) => StorageClass::from(class.as_str()),
        None => settings.class.clone(),
    };
    let size = if args.file == "-" {
        client.store_reader(&key, &class, tokio::io::stdin()).await?
    } else {
        client.store_file(&key, &class, &args.file).await?
    };
    println!(
        "{} Stored {} ({} bytes)",
        "✓".green().bold(),
        key.as_str().yellow(),
        size
    );
    Ok(())
}

async fn cmd_get(settings: &Settings, args: GetArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let key = Key::new(args.key.as_str())?;
    match &args.output {
        Some(path) => {
            let size = client.get_file(&key, path).await?;
            println!(
                "{} Fetched {} → {} ({} bytes)",
                "✓".green().bold(),
                key.as_str().yellow(),
                path.bold(),
                size
            );
        }
        None => {
            let data = client.get_file_data(&key).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn cmd_rm(settings: &Settings, args: RmArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let key = Key::new(args.key.as_str())?;
    client.delete(&key).await?;
    println!("{} Deleted {}", "✓".green().bold(), key.as_str().yellow());
    Ok(())
}

async fn cmd_mv(settings: &Settings, args: MvArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let from = Key::new(args.from.as_str())?;
    let to = Key::new(args.to.as_str())?;
    client.rename(&from, &to).await?;
    println!(
        "{} Renamed {} → {}",
        "✓".green().bold(),
        from.as_str().yellow(),
        to.as_str().yellow()
    );
    Ok(())
}

async fn cmd_paths(settings: &Settings, args: PathsArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let key = Key::new(args.key.as_str())?;
    let paths = client.get_paths(&key, !args.verify).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for (i, path) in paths.iter().enumerate() {
            println!("{} {}", format!("{}:", i + 1).dimmed(), path);
        }
    }
    Ok(())
}

async fn cmd_watch(settings: &Settings, args: WatchArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let mut watch = client.watch()?;
    eprintln!(
        "Watching {} tracker events (ctrl-c to stop)",
        settings.domain.yellow()
    );
    loop {
        if args.cache {
            let payload = watch.next_cache_event().await;
            println!("{} {}", "cache".cyan(), payload);
        } else {
            println!("{}", watch.next_line().await);
        }
    }
}
