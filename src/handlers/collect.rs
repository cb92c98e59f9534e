use crate::{
    CollectorError, Result,
    api::{ApiClient, PageSource},
    collector::{Collection, CollectionOutcome, Collector, RecordStore, ResourceKind, Termination},
    config::Config,
    output,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub kind: ResourceKind,
    pub tweet_id: Option<String>,
    pub termination: Termination,
    pub items: usize,
    pub pages_fetched: usize,
    pub requests_sent: usize,
    pub rate_limited: usize,
    pub saved_to: Option<PathBuf>,
    pub last_cursor: Option<String>,
}

impl CollectionSummary {
    fn from_outcome(collection: &Collection, outcome: CollectionOutcome) -> Self {
        let (items, last_cursor) = match &outcome.record {
            Some(record) => (
                record.total_items,
                Some(record.last_cursor.clone()).filter(|c| !c.is_empty()),
            ),
            None => (0, None),
        };

        Self {
            kind: outcome.kind,
            tweet_id: collection.target.tweet_id().map(str::to_string),
            termination: outcome.termination,
            items,
            pages_fetched: outcome.pages_fetched,
            requests_sent: outcome.requests_sent,
            rate_limited: outcome.rate_limited,
            saved_to: outcome.saved_to,
            last_cursor,
        }
    }
}

impl output::OutputFormatter for CollectionSummary {
    fn format_text(&self) -> String {
        use crate::output::text;

        let noun = self.kind.item_noun();
        let headline = match &self.tweet_id {
            Some(id) => format!("Collected {} {} for tweet {}", self.items, noun, id),
            None => format!("Collected {} {}", self.items, noun),
        };

        let mut lines = Vec::new();
        if self.termination.is_error() {
            lines.push(text::warning(&headline));
        } else {
            lines.push(text::success(&headline));
        }
        lines.push(text::key_value("Pages", &self.pages_fetched.to_string()));
        lines.push(text::key_value("Requests", &self.requests_sent.to_string()));
        if self.rate_limited > 0 {
            lines.push(text::key_value(
                "Rate Limited",
                &format!("{} time(s)", self.rate_limited),
            ));
        }
        lines.push(text::key_value("Stopped", &self.termination.to_string()));
        if let Some(path) = &self.saved_to {
            lines.push(text::key_value("Saved To", &path.display().to_string()));
        }
        if let Some(cursor) = &self.last_cursor {
            lines.push(text::key_value("Last Cursor", cursor));
            if self.termination.is_error() {
                lines.push(text::info(&format!(
                    "Continue later with --resume {}",
                    cursor
                )));
            }
        }

        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

/// Runs one collection against the configured API and persists the result.
pub async fn handle_collect(config: &Config, collection: Collection) -> Result<CollectionSummary> {
    let client = ApiClient::new(&config.api, config.pagination.request_timeout())?;
    run_collection(client, config, collection).await
}

pub async fn run_collection<S: PageSource>(
    source: S,
    config: &Config,
    collection: Collection,
) -> Result<CollectionSummary> {
    let collector = Collector::new(
        source,
        config.pagination.pacing(),
        RecordStore::new(&config.output.raw_dir),
    );
    let outcome = collector.run(&collection).await?;

    if outcome.record.is_none() && outcome.termination.is_error() {
        return Err(CollectorError::NothingCollected(
            outcome.termination.to_string(),
        ));
    }

    Ok(CollectionSummary::from_outcome(&collection, outcome))
}
