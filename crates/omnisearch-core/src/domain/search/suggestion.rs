//! Query autocomplete
//!
//! Suggestions come from three sources, in this order: the user's own recent
//! queries, channel names (`in:#name`) and user full names (`from:@Name`).
//! A source that fails is logged and skipped.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::SuggestionConfig;

use super::repository::SearchRepository;
use super::repository_trait::{ChannelStore, HistoryStore, UserStore};

pub struct SuggestionEngine {
    history: Arc<dyn HistoryStore>,
    channels: Arc<dyn ChannelStore>,
    users: Arc<dyn UserStore>,
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        channels: Arc<dyn ChannelStore>,
        users: Arc<dyn UserStore>,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            history,
            channels,
            users,
            config,
        }
    }

    pub fn from_repository(repository: SearchRepository, config: SuggestionConfig) -> Self {
        let repository = Arc::new(repository);
        Self::new(repository.clone(), repository.clone(), repository, config)
    }

    /// Suggestions for `prefix`, deduplicated with the first occurrence kept
    pub async fn suggest(&self, user_id: &str, prefix: &str) -> Vec<String> {
        if prefix.chars().count() < self.config.min_prefix_len {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        match self
            .history
            .recent_queries_with_prefix(user_id, prefix, self.config.history_limit)
            .await
        {
            Ok(queries) => candidates.extend(queries),
            Err(e) => warn!(user_id, error = %e, "History suggestions unavailable"),
        }

        match self
            .channels
            .channel_names_with_prefix(prefix, self.config.channel_limit)
            .await
        {
            Ok(names) => candidates.extend(names.into_iter().map(|name| format!("in:#{}", name))),
            Err(e) => warn!(error = %e, "Channel suggestions unavailable"),
        }

        match self
            .users
            .full_names_containing(prefix, self.config.user_limit)
            .await
        {
            Ok(names) => candidates.extend(names.into_iter().map(|name| format!("from:@{}", name))),
            Err(e) => warn!(error = %e, "User suggestions unavailable"),
        }

        let mut seen = HashSet::new();
        candidates.retain(|candidate| seen.insert(candidate.clone()));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::entity::SearchHistoryEntry;
    use crate::domain::search::repository_trait::UserRow;
    use crate::domain::search::searcher::testing::MockStores;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedHistory(Vec<&'static str>);

    #[async_trait]
    impl HistoryStore for FixedHistory {
        async fn record_search(&self, _entry: &SearchHistoryEntry) -> Result<()> {
            Ok(())
        }

        async fn recent_queries_with_prefix(
            &self,
            _user_id: &str,
            prefix: &str,
            limit: u32,
        ) -> Result<Vec<String>> {
            Ok(self
                .0
                .iter()
                .filter(|q| q.starts_with(prefix))
                .take(limit as usize)
                .map(|q| q.to_string())
                .collect())
        }

        async fn list_history(&self, _user_id: &str, _limit: u32) -> Result<Vec<SearchHistoryEntry>> {
            Ok(Vec::new())
        }

        async fn clear_history(&self, _user_id: &str) -> Result<u64> {
            Ok(0)
        }
    }

    struct BrokenHistory;

    #[async_trait]
    impl HistoryStore for BrokenHistory {
        async fn record_search(&self, _entry: &SearchHistoryEntry) -> Result<()> {
            Err(Error::Internal("down".to_string()))
        }

        async fn recent_queries_with_prefix(
            &self,
            _user_id: &str,
            _prefix: &str,
            _limit: u32,
        ) -> Result<Vec<String>> {
            Err(Error::Internal("down".to_string()))
        }

        async fn list_history(&self, _user_id: &str, _limit: u32) -> Result<Vec<SearchHistoryEntry>> {
            Err(Error::Internal("down".to_string()))
        }

        async fn clear_history(&self, _user_id: &str) -> Result<u64> {
            Err(Error::Internal("down".to_string()))
        }
    }

    fn user(first: &str, last: &str) -> UserRow {
        UserRow {
            id: first.to_lowercase(),
            username: first.to_lowercase(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            avatar_url: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn stores() -> Arc<MockStores> {
        Arc::new(MockStores {
            channel_names: vec![
                ("design".to_string(), "c1".to_string()),
                ("dev".to_string(), "c2".to_string()),
                ("devops".to_string(), "c3".to_string()),
                ("devrel".to_string(), "c4".to_string()),
            ],
            users: vec![user("Devon", "Lane"), user("Ada", "Devlin")],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_short_prefix_returns_nothing() {
        let stores = stores();
        let engine = SuggestionEngine::new(
            Arc::new(FixedHistory(vec!["d"])),
            stores.clone(),
            stores.clone(),
            SuggestionConfig::default(),
        );

        assert!(engine.suggest("u1", "d").await.is_empty());
        assert!(engine.suggest("u1", "").await.is_empty());
    }

    #[tokio::test]
    async fn test_sources_in_order_with_limits() {
        let stores = stores();
        let engine = SuggestionEngine::new(
            Arc::new(FixedHistory(vec![
                "dev standup",
                "dev standup notes",
                "deploy plan",
                "dev retro",
                "dev review",
                "dev sync",
                "dev budget",
            ])),
            stores.clone(),
            stores.clone(),
            SuggestionConfig::default(),
        );

        let suggestions = engine.suggest("u1", "dev").await;
        assert_eq!(
            suggestions,
            vec![
                "dev standup",
                "dev standup notes",
                "dev retro",
                "dev review",
                "dev sync",
                "in:#dev",
                "in:#devops",
                "in:#devrel",
                "from:@Devon Lane",
                "from:@Ada Devlin",
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_removed_keeping_first() {
        let stores = Arc::new(MockStores {
            channel_names: vec![("infra".to_string(), "c9".to_string())],
            users: vec![user("Ada", "Devlin")],
            ..Default::default()
        });
        let engine = SuggestionEngine::new(
            Arc::new(FixedHistory(vec!["in:#infra"])),
            stores.clone(),
            stores.clone(),
            SuggestionConfig::default(),
        );

        let suggestions = engine.suggest("u1", "in").await;
        assert_eq!(suggestions, vec!["in:#infra", "from:@Ada Devlin"]);
    }

    #[tokio::test]
    async fn test_failing_source_is_skipped() {
        let stores = stores();
        let engine = SuggestionEngine::new(
            Arc::new(BrokenHistory),
            stores.clone(),
            stores.clone(),
            SuggestionConfig::default(),
        );

        let suggestions = engine.suggest("u1", "des").await;
        assert_eq!(suggestions, vec!["in:#design"]);
    }
}
