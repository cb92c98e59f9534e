pub mod commands;
pub mod dispatch;

use crate::config::{API_KEY_ENV, Config, ConfigOverrides};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tweet-collector")]
#[command(version, about = "Paginated tweet, reply and retweeter collector")]
#[command(
    long_about = "Collects search results, replies and retweeters from a cursor-paginated Twitter data API into JSON files, and flattens them to CSV"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: commands::Command,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pub pretty: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = API_KEY_ENV,
        hide_env_values = true,
        help = "API key for the upstream service"
    )]
    pub api_key: Option<String>,

    #[arg(long, global = true, help = "Base URL of the upstream API")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Directory for collected JSON files")]
    pub raw_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: self.base_url.clone(),
            raw_dir: self.raw_dir.clone(),
            csv_dir: None,
            json_pretty: self.pretty.then_some(true),
            timeout: self.timeout,
        }
    }
}

pub async fn run() -> crate::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        let content = std::fs::read_to_string(config_path)?;
        toml::from_str(&content)?
    } else {
        Config::load()?
    };

    let config = Arc::new(config.load_with_overrides(cli.overrides()));
    config.validate()?;

    dispatch::dispatch(cli, config).await
}
