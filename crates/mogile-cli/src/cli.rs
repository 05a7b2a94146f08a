use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mog",
    about = "Client for a MogileFS-style distributed file store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tracker addresses as host:port, comma separated
    #[arg(short, long, global = true)]
    pub trackers: Option<String>,

    /// Domain the keys live in
    #[arg(short, long, global = true)]
    pub domain: Option<String>,

    /// TOML file with trackers, domain, and default class
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a local file under a key
    Put(PutArgs),
    /// Fetch a key to a file or stdout
    Get(GetArgs),
    /// Delete a key
    Rm(RmArgs),
    /// Rename a key
    Mv(MvArgs),
    /// Print the storage URLs holding a key
    Paths(PathsArgs),
    /// Follow the tracker event stream
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    /// Local file to read; `-` reads stdin
    pub file: String,
    /// Storage class for the new content
    #[arg(long)]
    pub class: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    pub key: String,
}

#[derive(Args)]
pub struct MvArgs {
    pub from: String,
    pub to: String,
}

#[derive(Args)]
pub struct PathsArgs {
    pub key: String,
    /// Have the tracker verify each path is live before returning it
    #[arg(long)]
    pub verify: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Only print cache invalidation payloads
    #[arg(long)]
    pub cache: bool,
}
