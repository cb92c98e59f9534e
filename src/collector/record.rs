//! The persisted result of one collection session.
//!
//! Field names on disk stay compatible with files produced by earlier
//! collection scripts (`total_paginas`, `ultimo_cursor`, ...), so existing
//! `raw_data/` directories remain readable by the flattener.

use super::resource::{Collection, ResourceKind, Target};
use crate::{CollectorError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const FETCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordParams {
    pub query: Option<String>,
    pub since_time: Option<i64>,
    pub until_time: Option<i64>,
    pub item_limit: Option<usize>,
    pub resume_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    pub kind: ResourceKind,
    pub tweet_id: Option<String>,
    pub items: Vec<Value>,
    pub total_items: usize,
    pub total_pages: usize,
    pub fetch_timestamp: String,
    pub last_cursor: String,
    pub params: RecordParams,
}

impl CollectionRecord {
    pub fn new(
        collection: &Collection,
        items: Vec<Value>,
        total_pages: usize,
        last_cursor: String,
        fetched_at: &DateTime<Local>,
    ) -> Self {
        let (query, since_time, until_time) = match &collection.target {
            Target::Search { query } => (Some(query.clone()), None, None),
            Target::Replies {
                since_time,
                until_time,
                ..
            } => (None, *since_time, *until_time),
            Target::Retweeters { .. } => (None, None, None),
        };

        Self {
            kind: collection.kind(),
            tweet_id: collection.target.tweet_id().map(str::to_string),
            total_items: items.len(),
            items,
            total_pages,
            fetch_timestamp: fetched_at.format(FETCH_TIMESTAMP_FORMAT).to_string(),
            last_cursor,
            params: RecordParams {
                query,
                since_time,
                until_time,
                item_limit: collection.item_limit,
                resume_cursor: collection.resume_cursor.clone(),
            },
        }
    }

    /// Deterministic file name: resource kind, tweet id when there is one,
    /// and the generation timestamp.
    pub fn file_name(&self, generated_at: &DateTime<Local>) -> String {
        let stamp = generated_at.format(FILE_TIMESTAMP_FORMAT);
        let id = self
            .tweet_id
            .as_deref()
            .map(file_safe)
            .unwrap_or_else(|| "unknown".to_string());
        match self.kind {
            ResourceKind::Search => format!("twitter_search_request_{}.json", stamp),
            ResourceKind::Replies => format!("twitter_replies_{}_{}.json", id, stamp),
            ResourceKind::Retweeters => format!("twitter_retweeters_{}_{}.json", id, stamp),
        }
    }

    pub fn to_file_value(&self) -> Result<Value> {
        let value = match self.kind {
            ResourceKind::Search => serde_json::to_value(SearchFile {
                tweets: self.items.clone(),
                total_tweets: self.total_items,
                total_paginas: self.total_pages,
                fecha_obtencion: self.fetch_timestamp.clone(),
                ultimo_cursor: self.last_cursor.clone(),
                parametros: SearchParams {
                    query: self.params.query.clone(),
                    limit_tweets: self.params.item_limit,
                    continue_in: self.params.resume_cursor.clone(),
                },
            })?,
            ResourceKind::Replies => serde_json::to_value(RepliesFile {
                tweet_id: self.tweet_id.clone(),
                replies: self.items.clone(),
                total_replies: self.total_items,
                total_paginas: self.total_pages,
                fecha_obtencion: self.fetch_timestamp.clone(),
                ultimo_cursor: self.last_cursor.clone(),
                parametros: RepliesParams {
                    since_time: self.params.since_time,
                    until_time: self.params.until_time,
                    limit_responses: self.params.item_limit,
                    continue_in: self.params.resume_cursor.clone(),
                },
            })?,
            ResourceKind::Retweeters => serde_json::to_value(RetweetersFile {
                tweet_id: self.tweet_id.clone(),
                retweeters: self.items.clone(),
                total_retweeters: self.total_items,
                total_paginas: self.total_pages,
                fecha_obtencion: self.fetch_timestamp.clone(),
                ultimo_cursor: self.last_cursor.clone(),
                parametros: RetweetersParams {
                    limit_responses: self.params.item_limit,
                    continue_in: self.params.resume_cursor.clone(),
                },
            })?,
        };
        Ok(value)
    }

    /// Reads a record back, detecting its kind from the top-level keys.
    /// A bare JSON array is accepted as a search result without metadata.
    pub fn from_file_value(value: Value) -> Result<Self> {
        if let Value::Array(items) = value {
            return Ok(Self {
                kind: ResourceKind::Search,
                tweet_id: None,
                total_items: items.len(),
                items,
                total_pages: 0,
                fetch_timestamp: String::new(),
                last_cursor: String::new(),
                params: RecordParams::default(),
            });
        }

        let kind = match &value {
            Value::Object(map) if map.contains_key("replies") => ResourceKind::Replies,
            Value::Object(map) if map.contains_key("retweeters") => ResourceKind::Retweeters,
            Value::Object(map) if map.contains_key("tweets") => ResourceKind::Search,
            _ => {
                return Err(CollectorError::InvalidRecord(
                    "expected a 'tweets', 'replies' or 'retweeters' field".into(),
                ));
            }
        };

        let record = match kind {
            ResourceKind::Replies => {
                let file: RepliesFile = serde_json::from_value(value)?;
                Self {
                    kind,
                    tweet_id: file.tweet_id,
                    total_items: file.replies.len(),
                    items: file.replies,
                    total_pages: file.total_paginas,
                    fetch_timestamp: file.fecha_obtencion,
                    last_cursor: file.ultimo_cursor,
                    params: RecordParams {
                        query: None,
                        since_time: file.parametros.since_time,
                        until_time: file.parametros.until_time,
                        item_limit: file.parametros.limit_responses,
                        resume_cursor: file.parametros.continue_in,
                    },
                }
            }
            ResourceKind::Retweeters => {
                let file: RetweetersFile = serde_json::from_value(value)?;
                Self {
                    kind,
                    tweet_id: file.tweet_id,
                    total_items: file.retweeters.len(),
                    items: file.retweeters,
                    total_pages: file.total_paginas,
                    fetch_timestamp: file.fecha_obtencion,
                    last_cursor: file.ultimo_cursor,
                    params: RecordParams {
                        item_limit: file.parametros.limit_responses,
                        resume_cursor: file.parametros.continue_in,
                        ..Default::default()
                    },
                }
            }
            ResourceKind::Search => {
                let file: SearchFile = serde_json::from_value(value)?;
                Self {
                    kind,
                    tweet_id: None,
                    total_items: file.tweets.len(),
                    items: file.tweets,
                    total_pages: file.total_paginas,
                    fetch_timestamp: file.fecha_obtencion,
                    last_cursor: file.ultimo_cursor,
                    params: RecordParams {
                        query: file.parametros.query,
                        item_limit: file.parametros.limit_tweets,
                        resume_cursor: file.parametros.continue_in,
                        ..Default::default()
                    },
                }
            }
        };
        Ok(record)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        Self::from_file_value(value)
    }
}

/// Keeps an id usable as a single path component.
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes records into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save(&self, record: &CollectionRecord, generated_at: &DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(record.file_name(generated_at));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &record.to_file_value()?)?;
        writer.flush()?;

        Ok(path)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchFile {
    tweets: Vec<Value>,
    #[serde(default)]
    total_tweets: usize,
    #[serde(default)]
    total_paginas: usize,
    #[serde(default)]
    fecha_obtencion: String,
    #[serde(default)]
    ultimo_cursor: String,
    #[serde(default)]
    parametros: SearchParams,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SearchParams {
    query: Option<String>,
    limit_tweets: Option<usize>,
    continue_in: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RepliesFile {
    #[serde(default)]
    tweet_id: Option<String>,
    replies: Vec<Value>,
    #[serde(default)]
    total_replies: usize,
    #[serde(default)]
    total_paginas: usize,
    #[serde(default)]
    fecha_obtencion: String,
    #[serde(default)]
    ultimo_cursor: String,
    #[serde(default)]
    parametros: RepliesParams,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RepliesParams {
    since_time: Option<i64>,
    until_time: Option<i64>,
    limit_responses: Option<usize>,
    continue_in: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RetweetersFile {
    #[serde(default)]
    tweet_id: Option<String>,
    retweeters: Vec<Value>,
    #[serde(default)]
    total_retweeters: usize,
    #[serde(default)]
    total_paginas: usize,
    #[serde(default)]
    fecha_obtencion: String,
    #[serde(default)]
    ultimo_cursor: String,
    #[serde(default)]
    parametros: RetweetersParams,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RetweetersParams {
    limit_responses: Option<usize>,
    continue_in: Option<String>,
}
