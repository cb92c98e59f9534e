use crate::collector::ResourceKind;
use clap::{Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Collect tweets matching an advanced search query")]
    Search {
        #[arg(help = "Advanced search query, e.g. \"from:user since:2024-01-01\"")]
        query: String,
        #[command(flatten)]
        paging: PagingArgs,
    },

    #[command(about = "Collect the replies to a tweet")]
    Replies {
        #[arg(value_parser = parse_tweet_id, help = "Tweet ID")]
        tweet_id: String,
        #[arg(long, help = "Only replies after this unix timestamp (seconds)")]
        since: Option<i64>,
        #[arg(long, help = "Only replies before this unix timestamp (seconds)")]
        until: Option<i64>,
        #[command(flatten)]
        paging: PagingArgs,
    },

    #[command(about = "Collect the users who retweeted a tweet")]
    Retweeters {
        #[arg(value_parser = parse_tweet_id, help = "Tweet ID")]
        tweet_id: String,
        #[command(flatten)]
        paging: PagingArgs,
    },

    #[command(about = "Convert a collected JSON file to CSV")]
    Flatten {
        #[arg(help = "Collection file written by search, replies or retweeters")]
        file: PathBuf,
        #[arg(long, value_enum, help = "Record kind (detected from the file if omitted)")]
        kind: Option<KindArg>,
        #[arg(long, help = "Directory for the CSV file")]
        csv_dir: Option<PathBuf>,
    },

    #[command(about = "Concatenate CSV files, taking the union of their columns")]
    Merge {
        #[arg(required = true, help = "CSV files to merge")]
        files: Vec<PathBuf>,
        #[arg(short, long, help = "Output CSV file")]
        output: PathBuf,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommand,
    },
}

/// Tweet ids are numeric; anything else would only fail after a full run.
fn parse_tweet_id(value: &str) -> Result<String, String> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a numeric tweet id", value))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct PagingArgs {
    #[arg(short, long, help = "Stop after this many items")]
    pub limit: Option<NonZeroUsize>,
    #[arg(long, value_name = "CURSOR", help = "Continue from a cursor printed by an earlier run")]
    pub resume: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Search,
    Replies,
    Retweeters,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Search => ResourceKind::Search,
            KindArg::Replies => ResourceKind::Replies,
            KindArg::Retweeters => ResourceKind::Retweeters,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    #[command(about = "Initialize config file with defaults")]
    Init,

    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Show config file path")]
    Path,
}
