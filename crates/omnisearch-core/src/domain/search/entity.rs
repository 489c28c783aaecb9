//! Search entity and related types
//!
//! Defines the request, result, history and saved-search types shared by the
//! parser, the domain searchers and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Entity domains a search can fan out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDomain {
    /// Channel messages
    Messages,
    /// One-to-one direct messages
    #[serde(rename = "dms")]
    DirectMessages,
    /// File uploads
    Files,
    /// Channels themselves
    Channels,
    /// Workspace members
    Users,
}

impl SearchDomain {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::DirectMessages => "dms",
            Self::Files => "files",
            Self::Channels => "channels",
            Self::Users => "users",
        }
    }

    /// Every domain, in merge order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Messages,
            Self::DirectMessages,
            Self::Files,
            Self::Channels,
            Self::Users,
        ]
    }
}

impl fmt::Display for SearchDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which domains a search call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    Messages,
    #[serde(rename = "dms")]
    DirectMessages,
    Files,
    Channels,
    Users,
}

impl SearchScope {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Messages => "messages",
            Self::DirectMessages => "dms",
            Self::Files => "files",
            Self::Channels => "channels",
            Self::Users => "users",
        }
    }

    /// Domains covered by this scope; `All` expands to every domain
    pub fn domains(&self) -> Vec<SearchDomain> {
        match self {
            Self::All => SearchDomain::all(),
            Self::Messages => vec![SearchDomain::Messages],
            Self::DirectMessages => vec![SearchDomain::DirectMessages],
            Self::Files => vec![SearchDomain::Files],
            Self::Channels => vec![SearchDomain::Channels],
            Self::Users => vec![SearchDomain::Users],
        }
    }
}

impl FromStr for SearchScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "messages" => Ok(Self::Messages),
            "dms" | "direct_messages" => Ok(Self::DirectMessages),
            "files" => Ok(Self::Files),
            "channels" => Ok(Self::Channels),
            "users" => Ok(Self::Users),
            other => Err(Error::Validation(format!("unknown search scope '{}'", other))),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordering key for the merged result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "date" => Ok(Self::Date),
            other => Err(Error::Validation(format!("unknown sort key '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(Error::Validation(format!("unknown sort order '{}'", other))),
        }
    }
}

/// Caller-supplied restrictions, ANDed with the operators parsed from the query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub channel_id: Option<String>,
    pub user_id: Option<String>,
    pub file_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub has_attachment: Option<bool>,
    pub message_type: Option<String>,
    /// Channel tier restriction (channel domain only)
    pub channel_tier: Option<String>,
    /// Admin-status restriction (user domain only)
    pub is_admin: Option<bool>,
}

impl SearchFilters {
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }
}

/// A search call as issued by the service layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Raw query, operators included
    pub query: String,
    pub filters: SearchFilters,
    pub scope: SearchScope,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// The requesting user
    pub user_id: String,
    /// Channels the requesting user belongs to. Once set, message search never
    /// leaves this set, and an empty set matches no channel message
    #[serde(default)]
    pub user_channel_ids: Option<Vec<String>>,
}

impl SearchOptions {
    /// Create a new search over every domain with default paging
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            scope: SearchScope::All,
            limit: 20,
            offset: 0,
            sort_by: SortBy::Relevance,
            sort_order: SortOrder::Desc,
            user_id: user_id.into(),
            user_channel_ids: None,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn with_channel_ids(mut self, channel_ids: Vec<String>) -> Self {
        self.user_channel_ids = Some(channel_ids);
        self
    }

    /// Reject malformed paging before any domain is queried
    pub fn validate(&self) -> Result<()> {
        if self.limit < 0 {
            return Err(Error::Validation(format!(
                "limit must not be negative (got {})",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(Error::Validation(format!(
                "offset must not be negative (got {})",
                self.offset
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation("user_id is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultAuthor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultChannel {
    pub id: String,
    pub name: String,
}

/// Fields that only make sense for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultDetails {
    Message {
        message_type: String,
        attachment_id: Option<String>,
        reaction_count: i64,
    },
    #[serde(rename = "dm")]
    DirectMessage {
        receiver: ResultAuthor,
        attachment_id: Option<String>,
    },
    File {
        file_type: String,
        file_size: i64,
        url: Option<String>,
        message_id: Option<String>,
    },
    Channel {
        tier: String,
        member_count: i64,
    },
    User {
        username: String,
        email: String,
        is_admin: bool,
        avatar_url: Option<String>,
    },
}

impl ResultDetails {
    pub fn domain(&self) -> SearchDomain {
        match self {
            Self::Message { .. } => SearchDomain::Messages,
            Self::DirectMessage { .. } => SearchDomain::DirectMessages,
            Self::File { .. } => SearchDomain::Files,
            Self::Channel { .. } => SearchDomain::Channels,
            Self::User { .. } => SearchDomain::Users,
        }
    }
}

/// A single ranked hit from any domain
///
/// The merge and sort stages only look at the shared projection
/// (`id`, `timestamp`, `score`); `details` carries the per-domain payload and
/// serializes as the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub title: Option<String>,
    /// Window around the first match, `...` marking truncated ends
    pub context: Option<String>,
    pub author: Option<ResultAuthor>,
    pub channel: Option<ResultChannel>,
    pub timestamp: DateTime<Utc>,
    /// Every per-word match in the primary field, duplicates kept
    pub highlights: Vec<String>,
    /// Relevance score; only comparable within one search call
    pub score: f64,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub details: ResultDetails,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        details: ResultDetails,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            title: None,
            context: None,
            author: None,
            channel: None,
            timestamp,
            highlights: Vec::new(),
            score: 0.0,
            metadata: serde_json::Map::new(),
            details,
        }
    }

    pub fn domain(&self) -> SearchDomain {
        self.details.domain()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.author = Some(ResultAuthor {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_channel(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.channel = Some(ResultChannel {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One page of merged results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Size of the merged set before pagination.
    ///
    /// Each domain contributes at most its fetch window of
    /// `max(offset + limit, max_results_per_domain)` rows, so this is a lower
    /// bound on the matches in the store rather than an exact count.
    pub total: usize,
}

/// A recorded search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    /// Raw query including operators
    pub query: String,
    pub filters: SearchFilters,
    pub scope: SearchScope,
    pub created_at: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(
        user_id: impl Into<String>,
        query: impl Into<String>,
        filters: SearchFilters,
        scope: SearchScope,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            query: query.into(),
            filters,
            scope,
            created_at: Utc::now(),
        }
    }
}

/// A named, reusable search owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub query: String,
    pub filters: SearchFilters,
    pub scope: SearchScope,
    pub is_pinned: bool,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedSearch {
    pub fn from_request(request: SaveSearchRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            name: request.name,
            query: request.query,
            filters: request.filters,
            scope: request.scope,
            is_pinned: false,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Turn the saved search back into a runnable search
    pub fn to_options(&self) -> SearchOptions {
        SearchOptions::new(self.user_id.clone(), self.query.clone())
            .with_scope(self.scope)
            .with_filters(self.filters.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSearchRequest {
    pub user_id: String,
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub scope: SearchScope,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedSearchUpdate {
    pub name: Option<String>,
    pub query: Option<String>,
    pub filters: Option<SearchFilters>,
    pub scope: Option<SearchScope>,
    pub is_pinned: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<SearchScope>().unwrap(), SearchScope::All);
        assert_eq!("Channels".parse::<SearchScope>().unwrap(), SearchScope::Channels);
        assert_eq!("dms".parse::<SearchScope>().unwrap(), SearchScope::DirectMessages);

        let err = "everything".parse::<SearchScope>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_scope_domains() {
        assert_eq!(SearchScope::All.domains().len(), 5);
        assert_eq!(SearchScope::Channels.domains(), vec![SearchDomain::Channels]);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("date".parse::<SortBy>().unwrap(), SortBy::Date);
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("newest".parse::<SortBy>().is_err());
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_options_validation() {
        let options = SearchOptions::new("u1", "hello");
        assert!(options.validate().is_ok());

        let negative_limit = SearchOptions::new("u1", "hello").with_limit(-1);
        assert!(matches!(negative_limit.validate(), Err(Error::Validation(_))));

        let negative_offset = SearchOptions::new("u1", "hello").with_offset(-5);
        assert!(matches!(negative_offset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_result_serializes_type_tag() {
        let result = SearchResult::new(
            "c1",
            "general",
            Utc::now(),
            ResultDetails::Channel {
                tier: "public".to_string(),
                member_count: 4,
            },
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "channel");
        assert_eq!(json["member_count"], 4);
        assert_eq!(result.domain(), SearchDomain::Channels);

        let dm = SearchResult::new(
            "d1",
            "hi",
            Utc::now(),
            ResultDetails::DirectMessage {
                receiver: ResultAuthor {
                    id: "u2".to_string(),
                    name: "Bo".to_string(),
                },
                attachment_id: None,
            },
        );
        assert_eq!(serde_json::to_value(&dm).unwrap()["type"], "dm");
    }

    #[test]
    fn test_saved_search_from_request() {
        let saved = SavedSearch::from_request(SaveSearchRequest {
            user_id: "u1".to_string(),
            name: "Design reviews".to_string(),
            query: "review in:#design".to_string(),
            filters: SearchFilters::default(),
            scope: SearchScope::Messages,
        });

        assert_eq!(saved.usage_count, 0);
        assert!(saved.last_used_at.is_none());
        assert!(saved.is_owned_by("u1"));
        assert!(!saved.is_owned_by("u2"));

        let options = saved.to_options();
        assert_eq!(options.scope, SearchScope::Messages);
        assert_eq!(options.query, "review in:#design");
    }
}
