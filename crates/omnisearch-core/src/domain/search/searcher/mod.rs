//! Per-domain searchers
//!
//! Each searcher turns one parsed query into scored results for its entity
//! type through its store collaborators. Searchers are stateless and
//! read-only, so the orchestrator runs them concurrently.

mod channel;
mod file;
mod message;
mod user;

pub use channel::ChannelSearcher;
pub use file::FileSearcher;
pub use message::{DirectMessageSearcher, MessageSearcher};
pub use user::UserSearcher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

use super::entity::{SearchDomain, SearchFilters, SearchResult};
use super::query::{Operators, ParsedQuery};
use super::repository_trait::{ChannelStore, TextMatch, UserStore};
use super::scoring;
use super::specification::{earliest, latest};

/// Everything a searcher needs for one lookup
#[derive(Debug, Clone, Default)]
pub struct DomainRequest {
    pub base_query: String,
    pub operators: Operators,
    pub filters: SearchFilters,
    /// The requesting user
    pub user_id: String,
    /// Channels the requesting user belongs to; `None` when membership is unknown
    pub user_channel_ids: Option<Vec<String>>,
    /// Rows to fetch from the store
    pub limit: u32,
    pub offset: u32,
    /// Chars kept either side of the first match in `SearchResult::context`
    pub context_radius: usize,
}

impl DomainRequest {
    pub fn new(parsed: ParsedQuery, user_id: impl Into<String>) -> Self {
        Self {
            base_query: parsed.base_query,
            operators: parsed.operators,
            user_id: user_id.into(),
            limit: 100,
            context_radius: 50,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_channel_ids(mut self, channel_ids: impl Into<Option<Vec<String>>>) -> Self {
        self.user_channel_ids = channel_ids.into();
        self
    }

    pub fn with_window(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    pub fn has_text(&self) -> bool {
        !self.base_query.trim().is_empty()
    }

    /// Free text or at least one narrowing operator is present
    pub fn has_criteria(&self) -> bool {
        self.has_text() || !self.operators.is_unrestricted()
    }

    /// Text condition handed to the store
    pub fn text_match(&self) -> TextMatch {
        let mut text = TextMatch {
            exclude: self.operators.exclude.clone(),
            ..Default::default()
        };
        if self.operators.match_any {
            text.any_of = self
                .base_query
                .split_whitespace()
                .map(str::to_string)
                .collect();
        } else {
            text.phrase = self.base_query.clone();
        }
        text
    }

    /// Lower date bound: the later of `after:` and `filters.date_from`
    pub fn after(&self) -> Option<DateTime<Utc>> {
        latest(self.operators.after, self.filters.date_from)
    }

    /// Upper date bound: the earlier of `before:` and `filters.date_to`
    pub fn before(&self) -> Option<DateTime<Utc>> {
        earliest(self.operators.before, self.filters.date_to)
    }
}

/// A searcher for one entity domain
#[async_trait]
pub trait DomainSearcher: Send + Sync {
    fn domain(&self) -> SearchDomain;

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>>;
}

/// Fill score, highlights and context from the primary text field
pub(crate) fn annotate(
    mut result: SearchResult,
    primary: &str,
    request: &DomainRequest,
) -> SearchResult {
    let query = request.base_query.as_str();
    result.score = scoring::score(primary, query);
    result.highlights = scoring::highlights(primary, query);
    result.context = scoring::context_window(primary, query, request.context_radius);
    result
}

/// Map `in:` names to channel ids; no names or no matches mean no restriction
pub(crate) async fn resolve_channels(
    channels: &dyn ChannelStore,
    names: &[String],
) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let ids = channels.resolve_channel_ids(names).await?;
    if ids.is_empty() {
        tracing::debug!(?names, "No channel matched the in: operator");
    }
    Ok(ids)
}

/// Map `from:` names to user ids; no names or no matches mean no restriction
pub(crate) async fn resolve_users(users: &dyn UserStore, names: &[String]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let ids = users.resolve_user_ids(names).await?;
    if ids.is_empty() {
        tracing::debug!(?names, "No user matched the from: operator");
    }
    Ok(ids)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::query::parse_query;
    use chrono::TimeZone;

    #[test]
    fn test_text_match_modes() {
        let request = DomainRequest::new(parse_query("sales -rejected"), "u1");
        let text = request.text_match();
        assert_eq!(text.phrase, "sales");
        assert!(text.any_of.is_empty());
        assert_eq!(text.exclude, vec!["rejected"]);

        let request = DomainRequest::new(parse_query("deploy OR rollback"), "u1");
        let text = request.text_match();
        assert_eq!(text.any_of, vec!["deploy", "rollback"]);
        assert!(text.phrase.is_empty());
    }

    #[test]
    fn test_criteria() {
        assert!(!DomainRequest::new(parse_query("   "), "u1").has_criteria());
        assert!(DomainRequest::new(parse_query("has:link"), "u1").has_criteria());
        assert!(!DomainRequest::new(parse_query("has:link"), "u1").has_text());
    }

    #[test]
    fn test_date_bounds_take_narrowest() {
        let filters = SearchFilters::default().with_date_range(
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
        );
        let request = DomainRequest::new(
            parse_query("after:2024-01-01 before:2024-06-01 report"),
            "u1",
        )
        .with_filters(filters);

        assert_eq!(request.after(), Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert_eq!(request.before(), Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
    }
}
