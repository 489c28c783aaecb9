//! Search repository for database operations
//!
//! SQLite implementation of every store trait in `repository_trait`. Text
//! conditions are `LIKE` substring matches (ASCII case-insensitive in SQLite)
//! with `%` and `_` escaped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::entity::{SavedSearch, SearchFilters, SearchHistoryEntry, SearchScope};
use super::repository_trait::{
    ChannelQuery, ChannelRow, ChannelStore, DirectMessageQuery, DirectMessageRow, FileQuery,
    FileRow, FileStore, HistoryStore, MessageQuery, MessageRow, MessageStore, SavedSearchStore,
    TextMatch, UserQuery, UserRow, UserStore,
};

/// Display name of a user row: "First Last", falling back to the username
const USER_DISPLAY_NAME: &str =
    "COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.username)";

/// Repository for search database operations
#[derive(Debug, Clone)]
pub struct SearchRepository {
    pool: SqlitePool,
}

impl SearchRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ========== Query Building ==========

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

fn prefix_pattern(value: &str) -> String {
    format!("{}%", escape_like(value))
}

/// Push ` AND (col LIKE ? OR ...)` for the text and ` AND col NOT LIKE ?` for
/// each exclusion against `primary_column`
fn push_text_match(
    qb: &mut QueryBuilder<'_, Sqlite>,
    columns: &[&str],
    primary_column: &str,
    text: &TextMatch,
) {
    let needles: Vec<&str> = if !text.any_of.is_empty() {
        text.any_of.iter().map(String::as_str).collect()
    } else if !text.phrase.trim().is_empty() {
        vec![text.phrase.trim()]
    } else {
        Vec::new()
    };

    if !needles.is_empty() {
        qb.push(" AND (");
        let mut first = true;
        for needle in needles {
            for column in columns {
                if !first {
                    qb.push(" OR ");
                }
                first = false;
                qb.push(format!("COALESCE({}, '') LIKE ", column));
                qb.push_bind(contains_pattern(needle));
                qb.push(r" ESCAPE '\'");
            }
        }
        qb.push(")");
    }

    for term in text.exclude.iter().filter(|t| !t.trim().is_empty()) {
        qb.push(format!(" AND COALESCE({}, '') NOT LIKE ", primary_column));
        qb.push_bind(contains_pattern(term.trim()));
        qb.push(r" ESCAPE '\'");
    }
}

/// Push `?, ?, ...)` closing an already opened `IN (` list
fn push_bind_list(qb: &mut QueryBuilder<'_, Sqlite>, values: &[String]) {
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

/// Push ` AND column IN (?, ...)`; no-op for an empty list
fn push_in_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    qb.push(format!(" AND {} IN (", column));
    push_bind_list(qb, values);
}

/// Inclusive bounds compared as julian days, so `YYYY-MM-DD HH:MM:SS` column
/// defaults and RFC 3339 binds order correctly against each other
fn push_date_bounds(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) {
    if let Some(after) = after {
        qb.push(format!(" AND julianday({}) >= julianday(", column));
        qb.push_bind(after);
        qb.push(")");
    }
    if let Some(before) = before {
        qb.push(format!(" AND julianday({}) <= julianday(", column));
        qb.push_bind(before);
        qb.push(")");
    }
}

fn push_attachment_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    required: bool,
    filters: &SearchFilters,
) {
    if required || filters.has_attachment == Some(true) {
        qb.push(format!(" AND {} IS NOT NULL", column));
    } else if filters.has_attachment == Some(false) {
        qb.push(format!(" AND {} IS NULL", column));
    }
}

fn push_paging(qb: &mut QueryBuilder<'_, Sqlite>, limit: u32, offset: u32) {
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::from(offset));
}

// ========== Messages ==========

#[async_trait]
impl MessageStore for SearchRepository {
    async fn search_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>> {
        if matches!(query.accessible_channel_ids, Some(ref ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            r#"
            SELECT m.id, m.channel_id, c.name AS channel_name,
                   m.sender_id, {} AS sender_name,
                   m.content, m.formatted_content, m.message_type, m.attachment_id,
                   (SELECT COUNT(*) FROM message_reactions r WHERE r.message_id = m.id) AS reaction_count,
                   m.created_at
            FROM messages m
            JOIN channels c ON c.id = m.channel_id
            JOIN users u ON u.id = m.sender_id
            WHERE 1 = 1
            "#,
            USER_DISPLAY_NAME
        ));

        push_text_match(
            &mut qb,
            &["m.content", "m.formatted_content"],
            "m.content",
            &query.text,
        );
        push_in_list(&mut qb, "m.channel_id", &query.channel_ids);
        push_in_list(&mut qb, "m.sender_id", &query.sender_ids);
        if let Some(ref accessible) = query.accessible_channel_ids {
            push_in_list(&mut qb, "m.channel_id", accessible);
        }

        if let Some(ref channel_id) = query.filters.channel_id {
            qb.push(" AND m.channel_id = ");
            qb.push_bind(channel_id.clone());
        }
        if let Some(ref user_id) = query.filters.user_id {
            qb.push(" AND m.sender_id = ");
            qb.push_bind(user_id.clone());
        }
        if let Some(ref message_type) = query.filters.message_type {
            qb.push(" AND m.message_type = ");
            qb.push_bind(message_type.clone());
        }

        push_attachment_filter(&mut qb, "m.attachment_id", query.require_attachment, &query.filters);
        if query.require_link {
            qb.push(" AND m.content LIKE '%http%'");
        }
        if query.require_reaction {
            qb.push(" AND EXISTS (SELECT 1 FROM message_reactions r WHERE r.message_id = m.id)");
        }
        push_date_bounds(&mut qb, "m.created_at", query.after, query.before);

        qb.push(" ORDER BY julianday(m.created_at) DESC, m.id ASC");
        push_paging(&mut qb, query.limit, query.offset);

        let rows = qb
            .build_query_as::<MessageRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows)
    }

    async fn search_direct_messages(
        &self,
        query: &DirectMessageQuery,
    ) -> Result<Vec<DirectMessageRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT d.id,
                   d.sender_id,
                   COALESCE(NULLIF(TRIM(s.first_name || ' ' || s.last_name), ''), s.username) AS sender_name,
                   d.receiver_id,
                   COALESCE(NULLIF(TRIM(r.first_name || ' ' || r.last_name), ''), r.username) AS receiver_name,
                   d.content, d.formatted_content, d.attachment_id, d.created_at
            FROM direct_messages d
            JOIN users s ON s.id = d.sender_id
            JOIN users r ON r.id = d.receiver_id
            WHERE (d.sender_id = "#,
        );
        qb.push_bind(query.participant_id.clone());
        qb.push(" OR d.receiver_id = ");
        qb.push_bind(query.participant_id.clone());
        qb.push(")");

        push_text_match(
            &mut qb,
            &["d.content", "d.formatted_content"],
            "d.content",
            &query.text,
        );
        push_in_list(&mut qb, "d.sender_id", &query.sender_ids);

        // The filter user is the other side of the conversation
        if let Some(ref user_id) = query.filters.user_id {
            qb.push(" AND (d.sender_id = ");
            qb.push_bind(user_id.clone());
            qb.push(" OR d.receiver_id = ");
            qb.push_bind(user_id.clone());
            qb.push(")");
        }

        push_attachment_filter(&mut qb, "d.attachment_id", query.require_attachment, &query.filters);
        if query.require_link {
            qb.push(" AND d.content LIKE '%http%'");
        }
        push_date_bounds(&mut qb, "d.created_at", query.after, query.before);

        qb.push(" ORDER BY julianday(d.created_at) DESC, d.id ASC");
        push_paging(&mut qb, query.limit, query.offset);

        let rows = qb
            .build_query_as::<DirectMessageRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows)
    }

    async fn attachment_message_ids(&self, channel_ids: &[String]) -> Result<Vec<String>> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.id FROM messages m WHERE m.attachment_id IS NOT NULL",
        );
        push_in_list(&mut qb, "m.channel_id", channel_ids);

        let rows: Vec<(String,)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

// ========== Files ==========

#[async_trait]
impl FileStore for SearchRepository {
    async fn search_files(&self, query: &FileQuery) -> Result<Vec<FileRow>> {
        if matches!(query.message_ids, Some(ref ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            r#"
            SELECT f.id, f.message_id, f.uploader_id, {} AS uploader_name,
                   f.file_name, f.file_type, f.file_size, f.url,
                   m.channel_id, c.name AS channel_name, f.created_at
            FROM files f
            LEFT JOIN users u ON u.id = f.uploader_id
            LEFT JOIN messages m ON m.id = f.message_id
            LEFT JOIN channels c ON c.id = m.channel_id
            WHERE 1 = 1
            "#,
            USER_DISPLAY_NAME
        ));

        push_text_match(&mut qb, &["f.file_name", "f.file_type"], "f.file_name", &query.text);
        push_in_list(&mut qb, "f.uploader_id", &query.uploader_ids);
        if let Some(ref message_ids) = query.message_ids {
            push_in_list(&mut qb, "f.message_id", message_ids);
        }

        if let Some(ref file_type) = query.filters.file_type {
            qb.push(" AND f.file_type LIKE ");
            qb.push_bind(contains_pattern(file_type));
            qb.push(r" ESCAPE '\'");
        }
        if let Some(ref user_id) = query.filters.user_id {
            qb.push(" AND f.uploader_id = ");
            qb.push_bind(user_id.clone());
        }
        push_date_bounds(&mut qb, "f.created_at", query.after, query.before);

        qb.push(" ORDER BY julianday(f.created_at) DESC, f.id ASC");
        push_paging(&mut qb, query.limit, query.offset);

        let rows = qb
            .build_query_as::<FileRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows)
    }
}

// ========== Channels ==========

#[async_trait]
impl ChannelStore for SearchRepository {
    async fn search_channels(&self, query: &ChannelQuery) -> Result<Vec<ChannelRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT c.id, c.name, c.description, c.purpose, c.tier,
                   (SELECT COUNT(*) FROM channel_members cm WHERE cm.channel_id = c.id) AS member_count,
                   c.created_at
            FROM channels c
            WHERE 1 = 1
            "#,
        );

        push_text_match(
            &mut qb,
            &["c.name", "c.description", "c.purpose"],
            "c.name",
            &query.text,
        );
        if let Some(ref tier) = query.tier {
            qb.push(" AND c.tier = ");
            qb.push_bind(tier.clone());
        }

        qb.push(" ORDER BY c.name ASC");
        push_paging(&mut qb, query.limit, query.offset);

        let rows = qb
            .build_query_as::<ChannelRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows)
    }

    async fn resolve_channel_ids(&self, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM channels WHERE 0 = 1");
        qb.push(" OR LOWER(name) IN (");
        push_bind_list(&mut qb, &lowered);
        qb.push(" OR id IN (");
        push_bind_list(&mut qb, names);
        qb.push(" ORDER BY name ASC");

        let rows: Vec<(String,)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn channel_names_with_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT name FROM channels
            WHERE name LIKE ? ESCAPE '\'
            ORDER BY name ASC
            LIMIT ?
            "#,
        )
        .bind(prefix_pattern(prefix))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

// ========== Users ==========

#[async_trait]
impl UserStore for SearchRepository {
    async fn search_users(&self, query: &UserQuery) -> Result<Vec<UserRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email,
                   u.avatar_url, u.is_admin, u.created_at
            FROM users u
            WHERE 1 = 1
            "#,
        );

        push_text_match(
            &mut qb,
            &[
                "u.first_name",
                "u.last_name",
                "u.email",
                "(u.first_name || ' ' || u.last_name)",
            ],
            "(u.first_name || ' ' || u.last_name)",
            &query.text,
        );
        if let Some(is_admin) = query.is_admin {
            qb.push(" AND u.is_admin = ");
            qb.push_bind(is_admin);
        }

        qb.push(" ORDER BY u.first_name ASC, u.last_name ASC, u.id ASC");
        push_paging(&mut qb, query.limit, query.offset);

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows)
    }

    async fn resolve_user_ids(&self, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM users WHERE 0 = 1");
        for column in ["LOWER(username)", "LOWER(email)"] {
            qb.push(format!(" OR {} IN (", column));
            push_bind_list(&mut qb, &lowered);
        }
        qb.push(" OR id IN (");
        push_bind_list(&mut qb, names);
        qb.push(" ORDER BY username ASC");

        let rows: Vec<(String,)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn full_names_containing(&self, fragment: &str, limit: u32) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT TRIM(first_name || ' ' || last_name) AS full_name
            FROM users
            WHERE (first_name || ' ' || last_name) LIKE ? ESCAPE '\'
            ORDER BY full_name ASC
            LIMIT ?
            "#,
        )
        .bind(contains_pattern(fragment))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

// ========== Search History ==========

#[async_trait]
impl HistoryStore for SearchRepository {
    async fn record_search(&self, entry: &SearchHistoryEntry) -> Result<()> {
        let filters = serde_json::to_string(&entry.filters)
            .map_err(|e| Error::Parse(format!("Failed to serialize filters: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO search_history (id, user_id, query, filters, scope, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.user_id)
        .bind(&entry.query)
        .bind(&filters)
        .bind(entry.scope.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    async fn recent_queries_with_prefix(
        &self,
        user_id: &str,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT query
            FROM search_history
            WHERE user_id = ? AND query LIKE ? ESCAPE '\'
            GROUP BY query
            ORDER BY MAX(created_at) DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(prefix_pattern(prefix))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(query,)| query).collect())
    }

    async fn list_history(&self, user_id: &str, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, query, filters, scope, created_at
            FROM search_history
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(HistoryRow::into_entry).collect()
    }

    async fn clear_history(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM search_history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected())
    }
}

// ========== Saved Searches ==========

#[async_trait]
impl SavedSearchStore for SearchRepository {
    async fn insert_saved_search(&self, saved: &SavedSearch) -> Result<()> {
        let filters = serde_json::to_string(&saved.filters)
            .map_err(|e| Error::Parse(format!("Failed to serialize filters: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO saved_searches (
                id, user_id, name, query, filters, scope, is_pinned,
                usage_count, last_used_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(saved.id.to_string())
        .bind(&saved.user_id)
        .bind(&saved.name)
        .bind(&saved.query)
        .bind(&filters)
        .bind(saved.scope.as_str())
        .bind(saved.is_pinned)
        .bind(saved.usage_count)
        .bind(saved.last_used_at)
        .bind(saved.created_at)
        .bind(saved.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    async fn get_saved_search(&self, id: Uuid) -> Result<Option<SavedSearch>> {
        let row: Option<SavedSearchRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, query, filters, scope, is_pinned,
                   usage_count, last_used_at, created_at, updated_at
            FROM saved_searches
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => Ok(Some(row.into_saved_search()?)),
            None => Ok(None),
        }
    }

    async fn list_saved_searches(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        let rows: Vec<SavedSearchRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, query, filters, scope, is_pinned,
                   usage_count, last_used_at, created_at, updated_at
            FROM saved_searches
            WHERE user_id = ?
            ORDER BY is_pinned DESC, last_used_at IS NULL, last_used_at DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(SavedSearchRow::into_saved_search).collect()
    }

    async fn update_saved_search(&self, saved: &SavedSearch) -> Result<()> {
        let filters = serde_json::to_string(&saved.filters)
            .map_err(|e| Error::Parse(format!("Failed to serialize filters: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE saved_searches
            SET name = ?, query = ?, filters = ?, scope = ?, is_pinned = ?,
                usage_count = ?, last_used_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&saved.name)
        .bind(&saved.query)
        .bind(&filters)
        .bind(saved.scope.as_str())
        .bind(saved.is_pinned)
        .bind(saved.usage_count)
        .bind(saved.last_used_at)
        .bind(saved.updated_at)
        .bind(saved.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    async fn delete_saved_search(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_searches WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }
}

// ========== Database Row Types ==========

fn parse_filters(raw: &str) -> Result<SearchFilters> {
    serde_json::from_str(raw).map_err(|e| Error::Parse(format!("Invalid filters: {}", e)))
}

fn parse_scope(raw: &str) -> Result<SearchScope> {
    raw.parse()
        .map_err(|_| Error::Parse(format!("Invalid scope: {}", raw)))
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    user_id: String,
    query: String,
    filters: String,
    scope: String,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_entry(self) -> Result<SearchHistoryEntry> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid history ID: {}", e)))?;

        Ok(SearchHistoryEntry {
            id,
            user_id: self.user_id,
            query: self.query,
            filters: parse_filters(&self.filters)?,
            scope: parse_scope(&self.scope)?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SavedSearchRow {
    id: String,
    user_id: String,
    name: String,
    query: String,
    filters: String,
    scope: String,
    is_pinned: bool,
    usage_count: i64,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SavedSearchRow {
    fn into_saved_search(self) -> Result<SavedSearch> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid saved search ID: {}", e)))?;

        Ok(SavedSearch {
            id,
            user_id: self.user_id,
            name: self.name,
            query: self.query,
            filters: parse_filters(&self.filters)?,
            scope: parse_scope(&self.scope)?,
            is_pinned: self.is_pinned,
            usage_count: self.usage_count,
            last_used_at: self.last_used_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
