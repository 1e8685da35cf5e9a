//! History query filters.

use chrono::{DateTime, Utc};

/// Row limit applied when a query asks for zero or fewer rows.
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Filters for received and sent history lookups.
///
/// Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Maximum rows. Values `<= 0` mean [`DEFAULT_HISTORY_LIMIT`].
    pub limit: i64,
    /// Inclusive lower time bound.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper time bound.
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring over body and title.
    pub search: Option<String>,
}

impl HistoryQuery {
    /// Create a query with the given limit and no filters.
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Set the inclusive lower time bound.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Set the inclusive upper time bound.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Set the search term. Blank terms are ignored.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }

    /// The limit after default substitution.
    pub fn effective_limit(&self) -> i64 {
        if self.limit <= 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            self.limit
        }
    }
}
