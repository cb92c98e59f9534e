use super::shape::{ShapeMatcher, SuccessMarker};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Search,
    Replies,
    Retweeters,
}

const SEARCH_SHAPES: &[ShapeMatcher] = &[
    ShapeMatcher::new(SuccessMarker::Field("tweets"), "tweets"),
    ShapeMatcher::new(SuccessMarker::StatusSuccess, "tweets"),
];

// The replies endpoint returns its items under `tweets`, not `replies`.
const REPLIES_SHAPES: &[ShapeMatcher] =
    &[ShapeMatcher::new(SuccessMarker::StatusSuccess, "tweets")];

const RETWEETERS_SHAPES: &[ShapeMatcher] = &[
    ShapeMatcher::new(SuccessMarker::StatusSuccess, "users"),
    ShapeMatcher::new(SuccessMarker::Field("users"), "users"),
];

impl ResourceKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Search => "/twitter/tweet/advanced_search",
            Self::Replies => "/twitter/tweet/replies",
            Self::Retweeters => "/twitter/tweet/retweeters",
        }
    }

    /// Accepted success shapes, tried in order.
    pub fn shapes(self) -> &'static [ShapeMatcher] {
        match self {
            Self::Search => SEARCH_SHAPES,
            Self::Replies => REPLIES_SHAPES,
            Self::Retweeters => RETWEETERS_SHAPES,
        }
    }

    /// Whether a `next_cursor` equal to the cursor just used ends the session.
    ///
    /// Search trusts `has_next_page` alone.
    pub fn guards_repeated_cursor(self) -> bool {
        !matches!(self, Self::Search)
    }

    /// Plural noun for the collected items, used in logs and record keys.
    pub fn item_noun(self) -> &'static str {
        match self {
            Self::Search => "tweets",
            Self::Replies => "replies",
            Self::Retweeters => "retweeters",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Search => "search",
            Self::Replies => "replies",
            Self::Retweeters => "retweeters",
        };
        f.write_str(name)
    }
}

/// Immutable query parameters of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Search {
        query: String,
    },
    Replies {
        tweet_id: String,
        since_time: Option<i64>,
        until_time: Option<i64>,
    },
    Retweeters {
        tweet_id: String,
    },
}

impl Target {
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
        }
    }

    pub fn replies(tweet_id: impl Into<String>) -> Self {
        Self::Replies {
            tweet_id: tweet_id.into(),
            since_time: None,
            until_time: None,
        }
    }

    pub fn retweeters(tweet_id: impl Into<String>) -> Self {
        Self::Retweeters {
            tweet_id: tweet_id.into(),
        }
    }

    /// Restricts replies to a unix-seconds window. No effect on other kinds.
    pub fn with_window(mut self, since: Option<i64>, until: Option<i64>) -> Self {
        if let Self::Replies {
            since_time,
            until_time,
            ..
        } = &mut self
        {
            *since_time = since;
            *until_time = until;
        }
        self
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Search { .. } => ResourceKind::Search,
            Self::Replies { .. } => ResourceKind::Replies,
            Self::Retweeters { .. } => ResourceKind::Retweeters,
        }
    }

    pub fn tweet_id(&self) -> Option<&str> {
        match self {
            Self::Search { .. } => None,
            Self::Replies { tweet_id, .. } | Self::Retweeters { tweet_id } => Some(tweet_id),
        }
    }

    fn base_params(&self) -> Vec<(String, String)> {
        match self {
            Self::Search { query } => vec![
                ("query".into(), query.clone()),
                ("queryType".into(), "Latest".into()),
            ],
            Self::Replies {
                tweet_id,
                since_time,
                until_time,
            } => {
                let mut params = vec![("tweetId".to_string(), tweet_id.clone())];
                if let Some(since) = since_time {
                    params.push(("sinceTime".into(), since.to_string()));
                }
                if let Some(until) = until_time {
                    params.push(("untilTime".into(), until.to_string()));
                }
                params
            }
            Self::Retweeters { tweet_id } => vec![("tweetId".into(), tweet_id.clone())],
        }
    }
}

/// What to collect and how far to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub target: Target,
    pub item_limit: Option<usize>,
    pub resume_cursor: Option<String>,
}

impl Collection {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            item_limit: None,
            resume_cursor: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.item_limit = limit.map(NonZeroUsize::get);
        self
    }

    /// Seeds the first request with a cursor observed in an earlier session.
    /// Blank cursors are ignored.
    pub fn resume_from(mut self, cursor: Option<String>) -> Self {
        self.resume_cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.target.kind()
    }
}

/// One page request: the target's parameters plus the current cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub target: &'a Target,
    pub cursor: &'a str,
}

impl PageRequest<'_> {
    /// Query string pairs. The cursor is omitted while empty.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = self.target.base_params();
        if !self.cursor.is_empty() {
            params.push(("cursor".into(), self.cursor.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_search_params_first_page() {
        let target = Target::search("from:someone");
        let params = PageRequest {
            target: &target,
            cursor: "",
        }
        .query_params();

        assert_eq!(param(&params, "query"), Some("from:someone"));
        assert_eq!(param(&params, "queryType"), Some("Latest"));
        assert_eq!(param(&params, "cursor"), None);
    }

    #[test]
    fn test_replies_params_with_window_and_cursor() {
        let target = Target::replies("123").with_window(Some(1700000000), Some(1700086400));
        let params = PageRequest {
            target: &target,
            cursor: "abc",
        }
        .query_params();

        assert_eq!(param(&params, "tweetId"), Some("123"));
        assert_eq!(param(&params, "sinceTime"), Some("1700000000"));
        assert_eq!(param(&params, "untilTime"), Some("1700086400"));
        assert_eq!(param(&params, "cursor"), Some("abc"));
    }

    #[test]
    fn test_window_ignored_for_retweeters() {
        let target = Target::retweeters("9").with_window(Some(1), Some(2));
        assert_eq!(target, Target::retweeters("9"));
    }

    #[test]
    fn test_loop_guard_per_kind() {
        assert!(!ResourceKind::Search.guards_repeated_cursor());
        assert!(ResourceKind::Replies.guards_repeated_cursor());
        assert!(ResourceKind::Retweeters.guards_repeated_cursor());
    }

    #[test]
    fn test_resume_from_ignores_blank_cursor() {
        let collection = Collection::new(Target::replies("1")).resume_from(Some(String::new()));
        assert!(collection.resume_cursor.is_none());
    }

    #[test]
    fn test_with_limit() {
        let collection =
            Collection::new(Target::search("q")).with_limit(NonZeroUsize::new(25));
        assert_eq!(collection.item_limit, Some(25));
    }
}
