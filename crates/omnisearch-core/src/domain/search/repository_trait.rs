//! Store traits for search persistence
//!
//! The searchers, the suggestion engine and the saved-search manager only
//! talk to these traits. `SearchRepository` implements all of them on SQLite;
//! any other backend can implement them the same way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

use super::entity::{SavedSearch, SearchFilters, SearchHistoryEntry};

// ========== Lookup Inputs ==========

/// Free-text condition pushed down to a store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMatch {
    /// Phrase matched as a case-insensitive substring; empty means no text condition
    pub phrase: String,
    /// When non-empty, any one of these words matching is enough (`OR` queries)
    pub any_of: Vec<String>,
    /// Rows whose primary text contains any of these are dropped
    pub exclude: Vec<String>,
}

impl TextMatch {
    pub fn phrase(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrase.trim().is_empty() && self.any_of.is_empty()
    }
}

/// Channel message lookup. Operator-derived and caller filters are both
/// present; the store ANDs every populated field.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub text: TextMatch,
    /// Channel ids resolved from `in:`
    pub channel_ids: Vec<String>,
    /// Sender ids resolved from `from:`
    pub sender_ids: Vec<String>,
    /// The caller's channel memberships. `None` leaves membership unchecked;
    /// `Some` with no ids matches nothing
    pub accessible_channel_ids: Option<Vec<String>>,
    pub filters: SearchFilters,
    pub require_attachment: bool,
    pub require_link: bool,
    pub require_reaction: bool,
    /// Inclusive bounds combining the date operators with the filter range;
    /// stores read these instead of `filters.date_from` / `filters.date_to`
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

/// Direct message lookup, always scoped to one participant
#[derive(Debug, Clone, Default)]
pub struct DirectMessageQuery {
    pub text: TextMatch,
    /// Only conversations where this user is sender or receiver
    pub participant_id: String,
    pub sender_ids: Vec<String>,
    pub filters: SearchFilters,
    pub require_attachment: bool,
    pub require_link: bool,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub text: TextMatch,
    pub uploader_ids: Vec<String>,
    /// Restrict to uploads linked to these message ids
    pub message_ids: Option<Vec<String>>,
    pub filters: SearchFilters,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelQuery {
    pub text: TextMatch,
    pub tier: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub text: TextMatch,
    pub is_admin: Option<bool>,
    pub limit: u32,
    pub offset: u32,
}

// ========== Raw Rows ==========

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub formatted_content: Option<String>,
    pub message_type: String,
    pub attachment_id: Option<String>,
    pub reaction_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DirectMessageRow {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub content: String,
    pub formatted_content: Option<String>,
    pub attachment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FileRow {
    pub id: String,
    pub message_id: Option<String>,
    pub uploader_id: Option<String>,
    pub uploader_name: Option<String>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub url: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub purpose: Option<String>,
    pub tier: String,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

// ========== Store Traits ==========

/// Channel messages and direct messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn search_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>>;

    async fn search_direct_messages(&self, query: &DirectMessageQuery)
    -> Result<Vec<DirectMessageRow>>;

    /// Ids of messages in these channels that carry an attachment
    async fn attachment_message_ids(&self, channel_ids: &[String]) -> Result<Vec<String>>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn search_files(&self, query: &FileQuery) -> Result<Vec<FileRow>>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn search_channels(&self, query: &ChannelQuery) -> Result<Vec<ChannelRow>>;

    /// Map channel names (or ids) to ids; unknown names are skipped
    async fn resolve_channel_ids(&self, names: &[String]) -> Result<Vec<String>>;

    async fn channel_names_with_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<String>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn search_users(&self, query: &UserQuery) -> Result<Vec<UserRow>>;

    /// Map usernames, emails or ids to user ids; unknown names are skipped
    async fn resolve_user_ids(&self, names: &[String]) -> Result<Vec<String>>;

    /// Full names ("First Last") containing the fragment anywhere
    async fn full_names_containing(&self, fragment: &str, limit: u32) -> Result<Vec<String>>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record_search(&self, entry: &SearchHistoryEntry) -> Result<()>;

    /// Distinct queries starting with `prefix`, most recently used first
    async fn recent_queries_with_prefix(
        &self,
        user_id: &str,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<String>>;

    async fn list_history(&self, user_id: &str, limit: u32) -> Result<Vec<SearchHistoryEntry>>;

    /// Delete every history row of the user, returning how many were removed
    async fn clear_history(&self, user_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait SavedSearchStore: Send + Sync {
    async fn insert_saved_search(&self, saved: &SavedSearch) -> Result<()>;

    async fn get_saved_search(&self, id: Uuid) -> Result<Option<SavedSearch>>;

    async fn list_saved_searches(&self, user_id: &str) -> Result<Vec<SavedSearch>>;

    async fn update_saved_search(&self, saved: &SavedSearch) -> Result<()>;

    async fn delete_saved_search(&self, id: Uuid) -> Result<bool>;
}
