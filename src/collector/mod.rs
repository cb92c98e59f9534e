//! Cursor-paginated collection against the upstream API.
//!
//! A [`Collector`] fetches one page at a time, appends the items to a
//! [`CollectionSession`], and stops on the item cap, on the last page, on a
//! repeated cursor (replies and retweeters only) or on a non-retriable error.
//! Whatever was accumulated is persisted once at the end.

pub mod record;
pub mod resource;
pub mod session;
pub mod shape;

pub use record::{CollectionRecord, RecordParams, RecordStore};
pub use resource::{Collection, PageRequest, ResourceKind, Target};
pub use session::{CollectionSession, Step};
pub use shape::{PageResult, ShapeError, parse_page};

use crate::Result;
use crate::api::{HttpReply, PageSource};
use crate::timeouts::{ms, secs};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    CapReached,
    Exhausted,
    CursorUnchanged,
    AuthFailed { status: u16 },
    MalformedResponse { message: String },
    HttpStatus { status: u16, body: String },
    Transport { message: String },
}

impl Termination {
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::CapReached | Self::Exhausted | Self::CursorUnchanged
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapReached => write!(f, "item limit reached"),
            Self::Exhausted => write!(f, "no more pages"),
            Self::CursorUnchanged => write!(f, "cursor did not change"),
            Self::AuthFailed { status: 401 } => write!(f, "invalid API key (401)"),
            Self::AuthFailed { status } => write!(f, "access forbidden ({})", status),
            Self::MalformedResponse { message } => write!(f, "malformed response: {}", message),
            Self::HttpStatus { status, .. } => write!(f, "HTTP {}", status),
            Self::Transport { message } => write!(f, "transport error: {}", message),
        }
    }
}

/// Fixed sleeps between pages and after a rate-limit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub page_delay: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(ms::PAGE_DELAY),
            rate_limit_cooldown: Duration::from_secs(secs::RATE_LIMIT_COOLDOWN),
        }
    }
}

impl Pacing {
    pub fn immediate() -> Self {
        Self {
            page_delay: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
        }
    }
}

/// Result of one session. `record` is `None` when nothing was collected.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub kind: ResourceKind,
    pub record: Option<CollectionRecord>,
    pub saved_to: Option<PathBuf>,
    pub termination: Termination,
    pub pages_fetched: usize,
    pub requests_sent: usize,
    pub rate_limited: usize,
}

enum PageOutcome {
    Page(PageResult),
    RateLimited,
    Terminal(Termination),
}

const STATUS_OK: u16 = 200;
const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

fn classify(kind: ResourceKind, reply: HttpReply) -> PageOutcome {
    match reply.status {
        STATUS_OK => match parse_page(kind, &reply.body) {
            Ok(page) => PageOutcome::Page(page),
            Err(e) => PageOutcome::Terminal(Termination::MalformedResponse {
                message: e.to_string(),
            }),
        },
        STATUS_TOO_MANY_REQUESTS => PageOutcome::RateLimited,
        STATUS_UNAUTHORIZED | STATUS_FORBIDDEN => {
            PageOutcome::Terminal(Termination::AuthFailed {
                status: reply.status,
            })
        }
        status => PageOutcome::Terminal(Termination::HttpStatus {
            status,
            body: reply.body,
        }),
    }
}

fn short_cursor(cursor: &str) -> String {
    cursor.chars().take(20).collect()
}

pub struct Collector<S> {
    source: S,
    pacing: Pacing,
    store: RecordStore,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: S, pacing: Pacing, store: RecordStore) -> Self {
        Self {
            source,
            pacing,
            store,
        }
    }

    /// Runs one session to completion.
    ///
    /// Upstream failures end the session and are reported through
    /// [`CollectionOutcome::termination`]; only a failure to persist the
    /// record is returned as `Err`.
    pub async fn run(&self, collection: &Collection) -> Result<CollectionOutcome> {
        let kind = collection.kind();
        let noun = kind.item_noun();
        let mut session = CollectionSession::new(collection);
        let mut requests_sent = 0;
        let mut rate_limited = 0;

        info!(
            kind = %kind,
            limit = ?collection.item_limit,
            "Starting {} collection",
            kind
        );
        if let Some(cursor) = &collection.resume_cursor {
            info!(
                cursor = %short_cursor(cursor),
                "Resuming from cursor; page numbering restarts at 1"
            );
        }

        let termination = loop {
            let params = session.request().query_params();
            debug!(page = session.page(), "Requesting page");

            requests_sent += 1;
            let reply = match self.source.get(kind.endpoint(), &params).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(page = session.page(), error = %e, "Request failed");
                    break Termination::Transport {
                        message: e.to_string(),
                    };
                }
            };

            let page = match classify(kind, reply) {
                PageOutcome::Page(page) => page,
                PageOutcome::RateLimited => {
                    rate_limited += 1;
                    warn!(
                        page = session.page(),
                        cooldown_secs = self.pacing.rate_limit_cooldown.as_secs(),
                        "Rate limited (429), retrying the same page after cooldown"
                    );
                    tokio::time::sleep(self.pacing.rate_limit_cooldown).await;
                    continue;
                }
                PageOutcome::Terminal(termination) => {
                    warn!(page = session.page(), reason = %termination, "Aborting collection");
                    break termination;
                }
            };

            let batch = page.items.len();
            match session.absorb(page) {
                Step::Continue => {
                    info!(
                        page = session.page() - 1,
                        batch,
                        total = session.items().len(),
                        resume_cursor = %session.cursor(),
                        "Page fetched, more available"
                    );
                    tokio::time::sleep(self.pacing.page_delay).await;
                }
                Step::Stop(termination) => {
                    info!(
                        page = session.page(),
                        batch,
                        total = session.items().len(),
                        reason = %termination,
                        "Last page fetched"
                    );
                    break termination;
                }
            }
        };

        let pages_fetched = session.pages_fetched();
        let (items, total_pages, last_cursor) = session.into_parts();

        if items.is_empty() {
            warn!(reason = %termination, "No {} collected", noun);
            return Ok(CollectionOutcome {
                kind,
                record: None,
                saved_to: None,
                termination,
                pages_fetched,
                requests_sent,
                rate_limited,
            });
        }

        let now = Local::now();
        let record = CollectionRecord::new(collection, items, total_pages, last_cursor, &now);
        let path = self.store.save(&record, &now)?;

        info!(
            total = record.total_items,
            pages = record.total_pages,
            path = %path.display(),
            reason = %termination,
            "Collected {} {}",
            record.total_items,
            noun
        );

        Ok(CollectionOutcome {
            kind,
            record: Some(record),
            saved_to: Some(path),
            termination,
            pages_fetched,
            requests_sent,
            rate_limited,
        })
    }
}
