use super::Termination;
use super::resource::{Collection, PageRequest, ResourceKind};
use super::shape::PageResult;
use serde_json::Value;

/// What the loop does after a page has been absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(Termination),
}

/// Accumulator owned by one collection run.
#[derive(Debug)]
pub struct CollectionSession<'a> {
    collection: &'a Collection,
    items: Vec<Value>,
    page: usize,
    pages_fetched: usize,
    cursor: String,
}

impl<'a> CollectionSession<'a> {
    pub fn new(collection: &'a Collection) -> Self {
        Self {
            collection,
            items: Vec::new(),
            page: 1,
            pages_fetched: 0,
            cursor: collection.resume_cursor.clone().unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.collection.kind()
    }

    /// 1-based number of the page about to be requested. Restarts at 1 for
    /// every session, resumed or not.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn request(&self) -> PageRequest<'_> {
        PageRequest {
            target: &self.collection.target,
            cursor: &self.cursor,
        }
    }

    /// Appends a page and decides whether another one should be requested.
    pub fn absorb(&mut self, page: PageResult) -> Step {
        self.items.extend(page.items);
        self.pages_fetched += 1;

        if let Some(limit) = self.collection.item_limit
            && self.items.len() >= limit
        {
            self.items.truncate(limit);
            return Step::Stop(Termination::CapReached);
        }

        if !page.has_next_page || page.next_cursor.is_empty() {
            return Step::Stop(Termination::Exhausted);
        }

        if self.kind().guards_repeated_cursor() && page.next_cursor == self.cursor {
            return Step::Stop(Termination::CursorUnchanged);
        }

        self.cursor = page.next_cursor;
        self.page += 1;
        Step::Continue
    }

    pub fn into_parts(self) -> (Vec<Value>, usize, String) {
        (self.items, self.pages_fetched, self.cursor)
    }
}
