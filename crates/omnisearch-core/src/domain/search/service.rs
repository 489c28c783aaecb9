//! Search service for orchestrating federated search
//!
//! Parses the query once, fans out to the domain searchers in scope, then
//! merges, sorts and paginates the combined results. History is written on a
//! tracked background task so the response never waits on it.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{Error, Result};

use super::entity::{
    SearchDomain, SearchHistoryEntry, SearchOptions, SearchResponse, SearchResult, SortBy,
    SortOrder,
};
use super::query::parse_query;
use super::repository::SearchRepository;
use super::repository_trait::{ChannelStore, FileStore, HistoryStore, MessageStore, UserStore};
use super::searcher::{
    ChannelSearcher, DirectMessageSearcher, DomainRequest, DomainSearcher, FileSearcher,
    MessageSearcher, UserSearcher,
};

/// Store collaborators the service is built from
#[derive(Clone)]
pub struct SearchStores {
    pub messages: Arc<dyn MessageStore>,
    pub files: Arc<dyn FileStore>,
    pub channels: Arc<dyn ChannelStore>,
    pub users: Arc<dyn UserStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl SearchStores {
    /// Use one SQLite repository for every store
    pub fn from_repository(repository: SearchRepository) -> Self {
        let repository = Arc::new(repository);
        Self {
            messages: repository.clone(),
            files: repository.clone(),
            channels: repository.clone(),
            users: repository.clone(),
            history: repository,
        }
    }
}

/// Service for federated search across every workspace domain
#[derive(Clone)]
pub struct SearchService {
    searchers: Vec<Arc<dyn DomainSearcher>>,
    history: Arc<dyn HistoryStore>,
    config: SearchConfig,
    tracker: TaskTracker,
}

impl SearchService {
    /// Create a service with the standard searcher for every domain
    pub fn new(stores: SearchStores, config: SearchConfig) -> Self {
        let searchers: Vec<Arc<dyn DomainSearcher>> = vec![
            Arc::new(MessageSearcher::new(
                stores.messages.clone(),
                stores.channels.clone(),
                stores.users.clone(),
            )),
            Arc::new(DirectMessageSearcher::new(
                stores.messages.clone(),
                stores.users.clone(),
            )),
            Arc::new(FileSearcher::new(
                stores.files.clone(),
                stores.messages.clone(),
                stores.channels.clone(),
                stores.users.clone(),
            )),
            Arc::new(ChannelSearcher::new(stores.channels.clone())),
            Arc::new(UserSearcher::new(stores.users.clone())),
        ];

        Self {
            searchers,
            history: stores.history,
            config,
            tracker: TaskTracker::new(),
        }
    }

    /// Create a service backed by one SQLite repository
    pub fn from_repository(repository: SearchRepository, config: SearchConfig) -> Self {
        Self::new(SearchStores::from_repository(repository), config)
    }

    /// Replace the searcher registered for the searcher's domain
    pub fn with_searcher(mut self, searcher: Arc<dyn DomainSearcher>) -> Self {
        let domain = searcher.domain();
        self.searchers.retain(|s| s.domain() != domain);
        self.searchers.push(searcher);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Options for a new search using the configured page size
    pub fn options(&self, user_id: impl Into<String>, query: impl Into<String>) -> SearchOptions {
        SearchOptions::new(user_id, query).with_limit(self.config.default_limit)
    }

    /// Execute a search
    pub async fn search(&self, options: &SearchOptions) -> Result<SearchResponse> {
        self.search_with_cancellation(options, CancellationToken::new())
            .await
    }

    /// Execute a search that fails with [`Error::Cancelled`] once `cancel` fires
    ///
    /// A cancelled call returns no partial results. Its history row is still
    /// written.
    pub async fn search_with_cancellation(
        &self,
        options: &SearchOptions,
        cancel: CancellationToken,
    ) -> Result<SearchResponse> {
        options.validate()?;
        self.record_history(options);

        let parsed = parse_query(&options.query);
        debug!(
            user_id = %options.user_id,
            base_query = %parsed.base_query,
            operators = ?parsed.operators,
            "Parsed search query"
        );

        let request = DomainRequest::new(parsed, options.user_id.clone())
            .with_filters(options.filters.clone())
            .with_channel_ids(options.user_channel_ids.clone())
            .with_window(self.fetch_limit(options), 0)
            .with_context_radius(self.config.context_radius);

        let searchers: Vec<Arc<dyn DomainSearcher>> = options
            .scope
            .domains()
            .into_iter()
            .filter_map(|domain| self.searcher_for(domain))
            .collect();

        let lookups = join_all(
            searchers
                .iter()
                .map(|searcher| self.run_domain(searcher.as_ref(), &request)),
        );

        let per_domain = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(user_id = %options.user_id, "Search cancelled");
                return Err(Error::Cancelled);
            }
            results = lookups => results,
        };

        let mut merged: Vec<SearchResult> = per_domain.into_iter().flatten().collect();
        sort_results(&mut merged, options.sort_by, options.sort_order);

        let total = merged.len();
        let results: Vec<SearchResult> = merged
            .into_iter()
            .skip(options.offset as usize)
            .take(options.limit as usize)
            .collect();

        info!(
            user_id = %options.user_id,
            scope = %options.scope,
            total,
            returned = results.len(),
            "Search completed"
        );

        Ok(SearchResponse { results, total })
    }

    /// Most recent history entries of a user
    pub async fn history(&self, user_id: &str, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
        self.history.list_history(user_id, limit).await
    }

    /// Delete a user's history, returning the number of removed entries
    pub async fn clear_history(&self, user_id: &str) -> Result<u64> {
        let removed = self.history.clear_history(user_id).await?;
        info!(user_id, removed, "Cleared search history");
        Ok(removed)
    }

    /// Wait until every queued history write has finished
    pub async fn wait_for_pending_history(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn searcher_for(&self, domain: SearchDomain) -> Option<Arc<dyn DomainSearcher>> {
        let searcher = self.searchers.iter().find(|s| s.domain() == domain).cloned();
        if searcher.is_none() {
            warn!(domain = %domain, "No searcher registered for domain");
        }
        searcher
    }

    /// Rows each domain must supply so the merged page is complete
    fn fetch_limit(&self, options: &SearchOptions) -> u32 {
        let window = options.offset.saturating_add(options.limit);
        let window = u32::try_from(window).unwrap_or(u32::MAX);
        window.max(self.config.max_results_per_domain)
    }

    /// Run one domain under the configured timeout; failures degrade to no results
    async fn run_domain(
        &self,
        searcher: &dyn DomainSearcher,
        request: &DomainRequest,
    ) -> Vec<SearchResult> {
        let domain = searcher.domain();
        let timeout = self.config.domain_timeout();

        let failure = match tokio::time::timeout(timeout, searcher.search(request)).await {
            Ok(Ok(results)) => {
                debug!(domain = %domain, count = results.len(), "Domain search finished");
                return results;
            }
            Ok(Err(e)) => Error::DomainFailure {
                domain: domain.to_string(),
                reason: e.to_string(),
            },
            Err(_) => Error::DomainTimeout {
                domain: domain.to_string(),
                timeout_ms: duration_ms(timeout),
            },
        };

        warn!(domain = %domain, error = %failure, code = failure.code(), "Search domain degraded");
        Vec::new()
    }

    fn record_history(&self, options: &SearchOptions) {
        let entry = SearchHistoryEntry::new(
            options.user_id.clone(),
            options.query.clone(),
            options.filters.clone(),
            options.scope,
        );
        let history = self.history.clone();

        self.tracker.spawn(async move {
            if let Err(e) = history.record_search(&entry).await {
                warn!(user_id = %entry.user_id, error = %e, "Failed to record search history");
            }
        });
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Stable sort; ties keep domain order and per-domain order
fn sort_results(results: &mut [SearchResult], sort_by: SortBy, sort_order: SortOrder) {
    match sort_by {
        SortBy::Relevance => {
            results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        }
        SortBy::Date => match sort_order {
            SortOrder::Asc => results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::Desc => results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::entity::{SearchFilters, SearchScope};
    use crate::domain::search::repository_trait::{ChannelRow, MessageRow, UserRow};
    use crate::domain::search::searcher::testing::MockStores;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHistory {
        entries: Mutex<Vec<SearchHistoryEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl HistoryStore for MockHistory {
        async fn record_search(&self, entry: &SearchHistoryEntry) -> Result<()> {
            if self.fail {
                return Err(Error::Internal("history store offline".to_string()));
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn recent_queries_with_prefix(
            &self,
            _user_id: &str,
            _prefix: &str,
            _limit: u32,
        ) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn list_history(&self, user_id: &str, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|e| e.user_id == user_id)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn clear_history(&self, user_id: &str) -> Result<u64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.user_id != user_id);
            Ok((before - entries.len()) as u64)
        }
    }

    /// Searcher that never answers in time
    struct StalledSearcher(SearchDomain);

    #[async_trait]
    impl DomainSearcher for StalledSearcher {
        fn domain(&self) -> SearchDomain {
            self.0
        }

        async fn search(&self, _request: &DomainRequest) -> Result<Vec<SearchResult>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn message(id: &str, content: &str, minute: u32) -> MessageRow {
        MessageRow {
            id: id.to_string(),
            channel_id: "c1".to_string(),
            channel_name: "general".to_string(),
            sender_id: "u1".to_string(),
            sender_name: "Jane Doe".to_string(),
            content: content.to_string(),
            formatted_content: None,
            message_type: "text".to_string(),
            attachment_id: None,
            reaction_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    fn channel(id: &str, name: &str) -> ChannelRow {
        ChannelRow {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            purpose: None,
            tier: "public".to_string(),
            member_count: 3,
            created_at: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn user(id: &str, first: &str, last: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            username: first.to_lowercase(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            avatar_url: None,
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn service(stores: &Arc<MockStores>, history: &Arc<MockHistory>) -> SearchService {
        SearchService::new(
            SearchStores {
                messages: stores.clone(),
                files: stores.clone(),
                channels: stores.clone(),
                users: stores.clone(),
                history: history.clone(),
            },
            SearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let stores = Arc::new(MockStores {
            channels: vec![channel("c1", "launch")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let options = SearchOptions::new("u1", "launch").with_scope(SearchScope::Channels);
        let response = service.search(&options).await.unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(MockStores::calls(&stores.channel_calls), 1);
        assert_eq!(MockStores::calls(&stores.message_calls), 0);
        assert_eq!(MockStores::calls(&stores.dm_calls), 0);
        assert_eq!(MockStores::calls(&stores.file_calls), 0);
        assert_eq!(MockStores::calls(&stores.user_calls), 0);
    }

    #[tokio::test]
    async fn test_all_scope_merges_domains() {
        let stores = Arc::new(MockStores {
            messages: vec![message("m1", "launch checklist", 0)],
            channels: vec![channel("c1", "launch")],
            users: vec![user("u7", "Launch", "Bot")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let response = service
            .search(&SearchOptions::new("u1", "launch"))
            .await
            .unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.results.len(), 3);
        for counter in [
            &stores.message_calls,
            &stores.dm_calls,
            &stores.file_calls,
            &stores.channel_calls,
            &stores.user_calls,
        ] {
            assert_eq!(MockStores::calls(counter), 1);
        }

        // channel "launch" is an exact match and ranks first
        assert_eq!(response.results[0].domain(), SearchDomain::Channels);
    }

    #[tokio::test]
    async fn test_merged_pagination() {
        let messages = (0..25)
            .map(|i| message(&format!("m{:02}", i), "weekly sync notes", i))
            .collect();
        let stores = Arc::new(MockStores {
            messages,
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let base = SearchOptions::new("u1", "sync")
            .with_scope(SearchScope::Messages)
            .with_sort(SortBy::Date, SortOrder::Desc);

        let page = service
            .search(&base.clone().with_limit(10).with_offset(10))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        let ids: Vec<_> = page.results.iter().map(|r| r.id.clone()).collect();
        let expected: Vec<_> = (5..15).rev().map(|i| format!("m{:02}", i)).collect();
        assert_eq!(ids, expected);

        let mut collected = Vec::new();
        for offset in (0..30).step_by(7) {
            let page = service
                .search(&base.clone().with_limit(7).with_offset(offset))
                .await
                .unwrap();
            let expected_len = 7.min((25 - offset).max(0)) as usize;
            assert_eq!(page.results.len(), expected_len);
            collected.extend(page.results.into_iter().map(|r| r.id));
        }
        let full: Vec<_> = (0..25).rev().map(|i| format!("m{:02}", i)).collect();
        assert_eq!(collected, full);

        let past_end = service
            .search(&base.clone().with_offset(40))
            .await
            .unwrap();
        assert!(past_end.results.is_empty());
        assert_eq!(past_end.total, 25);
    }

    #[tokio::test]
    async fn test_fetch_limit_covers_page() {
        let stores = Arc::new(MockStores::default());
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let options = SearchOptions::new("u1", "x").with_limit(150).with_offset(20);
        assert_eq!(service.fetch_limit(&options), 170);
        let options = SearchOptions::new("u1", "x").with_limit(5);
        assert_eq!(service.fetch_limit(&options), 100);
        assert_eq!(service.options("u1", "x").limit, 20);
    }

    #[tokio::test]
    async fn test_history_recorded_for_empty_results() {
        let stores = Arc::new(MockStores::default());
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let raw = r#""nothing" from:@nobody in:#void"#;
        let options = SearchOptions::new("u1", raw)
            .with_filters(SearchFilters::default().with_file_type("pdf"));
        let response = service.search(&options).await.unwrap();
        service.wait_for_pending_history().await;

        assert_eq!(response.total, 0);
        let recorded = service.history("u1", 10).await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].query, raw);
        assert_eq!(recorded[0].filters.file_type.as_deref(), Some("pdf"));

        assert_eq!(service.clear_history("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_search() {
        let stores = Arc::new(MockStores {
            channels: vec![channel("c1", "ops")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory {
            fail: true,
            ..Default::default()
        });
        let service = service(&stores, &history);

        let response = service
            .search(&SearchOptions::new("u1", "ops").with_scope(SearchScope::Channels))
            .await
            .unwrap();
        service.wait_for_pending_history().await;

        assert_eq!(response.total, 1);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_dispatch() {
        let stores = Arc::new(MockStores::default());
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let err = service
            .search(&SearchOptions::new("u1", "x").with_limit(-1))
            .await
            .unwrap_err();
        service.wait_for_pending_history().await;

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(MockStores::calls(&stores.message_calls), 0);
        assert!(history.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_domain_degrades() {
        let stores = Arc::new(MockStores {
            fail_messages: true,
            channels: vec![channel("c1", "incident")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let response = service
            .search(&SearchOptions::new("u1", "incident"))
            .await
            .unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].id, "c1");
        assert_eq!(MockStores::calls(&stores.message_calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_domain_times_out() {
        let stores = Arc::new(MockStores {
            users: vec![user("u2", "Ada", "Lovelace")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history)
            .with_searcher(Arc::new(StalledSearcher(SearchDomain::Messages)));

        let response = service
            .search(&SearchOptions::new("u1", "ada"))
            .await
            .unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].domain(), SearchDomain::Users);
    }

    #[tokio::test]
    async fn test_cancelled_search_returns_error() {
        let stores = Arc::new(MockStores {
            channels: vec![channel("c1", "launch")],
            ..Default::default()
        });
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history);

        let token = CancellationToken::new();
        token.cancel();
        let err = service
            .search_with_cancellation(&SearchOptions::new("u1", "launch"), token)
            .await
            .unwrap_err();
        service.wait_for_pending_history().await;

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(history.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_abandons_in_flight_domains() {
        let stores = Arc::new(MockStores::default());
        let history = Arc::new(MockHistory::default());
        let service = service(&stores, &history)
            .with_searcher(Arc::new(StalledSearcher(SearchDomain::Channels)));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = service
            .search_with_cancellation(
                &SearchOptions::new("u1", "launch").with_scope(SearchScope::Channels),
                token,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_sort_is_stable() {
        let at = |minute| Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap();
        let details = || crate::domain::search::entity::ResultDetails::Channel {
            tier: "public".to_string(),
            member_count: 0,
        };
        let mut results = vec![
            SearchResult::new("a", "", at(1), details()).with_score(10.0),
            SearchResult::new("b", "", at(3), details()).with_score(20.0),
            SearchResult::new("c", "", at(2), details()).with_score(10.0),
        ];

        sort_results(&mut results, SortBy::Relevance, SortOrder::Desc);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        sort_results(&mut results, SortBy::Date, SortOrder::Asc);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }
}
