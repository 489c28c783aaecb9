//! Channel message and direct message searchers

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::search::entity::{ResultAuthor, ResultDetails, SearchDomain, SearchResult};
use crate::domain::search::repository_trait::{
    ChannelStore, DirectMessageQuery, DirectMessageRow, MessageQuery, MessageRow, MessageStore,
    UserStore,
};
use crate::domain::search::specification::ResultSpecBuilder;
use crate::error::Result;

use super::{DomainRequest, DomainSearcher, annotate, resolve_channels, resolve_users};

/// Searches channel messages inside the caller's channels
pub struct MessageSearcher {
    messages: Arc<dyn MessageStore>,
    channels: Arc<dyn ChannelStore>,
    users: Arc<dyn UserStore>,
}

impl MessageSearcher {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        channels: Arc<dyn ChannelStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            messages,
            channels,
            users,
        }
    }

    fn to_result(row: MessageRow, request: &DomainRequest) -> SearchResult {
        let content = row.content.clone();
        let mut result = SearchResult::new(
            row.id,
            row.content,
            row.created_at,
            ResultDetails::Message {
                message_type: row.message_type,
                attachment_id: row.attachment_id,
                reaction_count: row.reaction_count,
            },
        )
        .with_author(row.sender_id, row.sender_name)
        .with_channel(row.channel_id, row.channel_name);

        if let Some(formatted) = row.formatted_content {
            result = result.with_metadata("formatted_content", serde_json::Value::String(formatted));
        }

        annotate(result, &content, request)
    }
}

#[async_trait]
impl DomainSearcher for MessageSearcher {
    fn domain(&self) -> SearchDomain {
        SearchDomain::Messages
    }

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>> {
        if !request.has_criteria() {
            return Ok(Vec::new());
        }
        if matches!(request.user_channel_ids, Some(ref ids) if ids.is_empty()) {
            debug!(user_id = %request.user_id, "Caller belongs to no channels");
            return Ok(Vec::new());
        }

        let operators = &request.operators;
        let query = MessageQuery {
            text: request.text_match(),
            channel_ids: resolve_channels(self.channels.as_ref(), &operators.in_channels).await?,
            sender_ids: resolve_users(self.users.as_ref(), &operators.from).await?,
            accessible_channel_ids: request.user_channel_ids.clone(),
            filters: request.filters.clone(),
            require_attachment: operators.wants_attachment(),
            require_link: operators.wants_link(),
            require_reaction: operators.wants_reaction(),
            after: request.after(),
            before: request.before(),
            limit: request.limit,
            offset: request.offset,
        };

        let rows = self.messages.search_messages(&query).await?;
        debug!(rows = rows.len(), "Message store returned rows");

        let spec = ResultSpecBuilder::new()
            .with_exclusions(&operators.exclude)
            .with_date_range(query.after, query.before);

        Ok(spec.filter(
            rows.into_iter()
                .map(|row| Self::to_result(row, request))
                .collect(),
        ))
    }
}

/// Searches direct messages the caller sent or received
pub struct DirectMessageSearcher {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
}

impl DirectMessageSearcher {
    pub fn new(messages: Arc<dyn MessageStore>, users: Arc<dyn UserStore>) -> Self {
        Self { messages, users }
    }

    fn to_result(row: DirectMessageRow, request: &DomainRequest) -> SearchResult {
        let content = row.content.clone();
        let mut result = SearchResult::new(
            row.id,
            row.content,
            row.created_at,
            ResultDetails::DirectMessage {
                receiver: ResultAuthor {
                    id: row.receiver_id,
                    name: row.receiver_name,
                },
                attachment_id: row.attachment_id,
            },
        )
        .with_author(row.sender_id, row.sender_name);

        if let Some(formatted) = row.formatted_content {
            result = result.with_metadata("formatted_content", serde_json::Value::String(formatted));
        }

        annotate(result, &content, request)
    }
}

#[async_trait]
impl DomainSearcher for DirectMessageSearcher {
    fn domain(&self) -> SearchDomain {
        SearchDomain::DirectMessages
    }

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>> {
        if !request.has_criteria() {
            return Ok(Vec::new());
        }

        let operators = &request.operators;
        let query = DirectMessageQuery {
            text: request.text_match(),
            participant_id: request.user_id.clone(),
            sender_ids: resolve_users(self.users.as_ref(), &operators.from).await?,
            filters: request.filters.clone(),
            require_attachment: operators.wants_attachment(),
            require_link: operators.wants_link(),
            after: request.after(),
            before: request.before(),
            limit: request.limit,
            offset: request.offset,
        };

        let rows = self.messages.search_direct_messages(&query).await?;
        debug!(rows = rows.len(), "Direct message store returned rows");

        let spec = ResultSpecBuilder::new()
            .with_exclusions(&operators.exclude)
            .with_date_range(query.after, query.before);

        // Rows outside the caller's conversations never leave this searcher
        let participant = request.user_id.as_str();
        Ok(spec.filter(
            rows.into_iter()
                .filter(|row| row.sender_id == participant || row.receiver_id == participant)
                .map(|row| Self::to_result(row, request))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::query::parse_query;
    use crate::domain::search::searcher::testing::MockStores;
    use chrono::{TimeZone, Utc};

    fn row(id: &str, content: &str, day: u32) -> MessageRow {
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
            created_at: Utc.with_ymd_and_hms(2024, 4, day, 10, 0, 0).unwrap(),
        }
    }

    fn dm(id: &str, sender: &str, receiver: &str, content: &str) -> DirectMessageRow {
        DirectMessageRow {
            id: id.to_string(),
            sender_id: sender.to_string(),
            sender_name: sender.to_uppercase(),
            receiver_id: receiver.to_string(),
            receiver_name: receiver.to_uppercase(),
            content: content.to_string(),
            formatted_content: None,
            attachment_id: None,
            created_at: Utc::now(),
        }
    }

    fn message_searcher(stores: &Arc<MockStores>) -> MessageSearcher {
        MessageSearcher::new(stores.clone(), stores.clone(), stores.clone())
    }

    #[tokio::test]
    async fn test_operators_resolve_to_ids() {
        let stores = Arc::new(MockStores {
            messages: vec![row("m1", "hello there", 1)],
            channel_names: vec![("general".to_string(), "c1".to_string())],
            user_names: vec![("jane".to_string(), "u1".to_string())],
            ..Default::default()
        });
        let searcher = message_searcher(&stores);

        let request = DomainRequest::new(parse_query(r#""hello" from:@jane in:#general"#), "u9")
            .with_channel_ids(vec!["c1".to_string(), "c2".to_string()]);
        let results = searcher.search(&request).await.unwrap();

        let query = stores.last_message_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.channel_ids, vec!["c1"]);
        assert_eq!(query.sender_ids, vec!["u1"]);
        assert_eq!(
            query.accessible_channel_ids,
            Some(vec!["c1".to_string(), "c2".to_string()])
        );
        assert_eq!(query.text.phrase, "hello");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].highlights, vec!["hello"]);
        assert_eq!(results[0].channel.as_ref().unwrap().name, "general");
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_unresolved_names_add_no_restriction() {
        let stores = Arc::new(MockStores::default());
        let searcher = message_searcher(&stores);

        let request = DomainRequest::new(parse_query("hello from:@ghost in:#nowhere"), "u1");
        searcher.search(&request).await.unwrap();

        let query = stores.last_message_query.lock().unwrap().clone().unwrap();
        assert!(query.channel_ids.is_empty());
        assert!(query.sender_ids.is_empty());
    }

    #[tokio::test]
    async fn test_caller_without_channels_skips_store() {
        let stores = Arc::new(MockStores {
            messages: vec![row("m1", "hello there", 1)],
            ..Default::default()
        });
        let searcher = message_searcher(&stores);

        let request =
            DomainRequest::new(parse_query("hello"), "u1").with_channel_ids(Some(Vec::new()));
        let results = searcher.search(&request).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(MockStores::calls(&stores.message_calls), 0);

        let unknown = DomainRequest::new(parse_query("hello"), "u1");
        assert_eq!(searcher.search(&unknown).await.unwrap().len(), 1);
        let query = stores.last_message_query.lock().unwrap().clone().unwrap();
        assert!(query.accessible_channel_ids.is_none());
    }

    #[tokio::test]
    async fn test_excluded_terms_are_filtered() {
        let stores = Arc::new(MockStores {
            messages: vec![
                row("m1", "sales are up", 1),
                row("m2", "sales rejected by finance", 2),
            ],
            ..Default::default()
        });
        let searcher = message_searcher(&stores);

        let request = DomainRequest::new(parse_query("sales -rejected"), "u1");
        let results = searcher.search(&request).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "m1");
        let query = stores.last_message_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.text.exclude, vec!["rejected"]);
    }

    #[tokio::test]
    async fn test_has_flags_and_dates_reach_store() {
        let stores = Arc::new(MockStores {
            messages: vec![row("m1", "see attached", 5), row("m2", "old attachment", 1)],
            ..Default::default()
        });
        let searcher = message_searcher(&stores);

        let request = DomainRequest::new(
            parse_query("has:file has:reaction has:link after:2024-04-03"),
            "u1",
        );
        let results = searcher.search(&request).await.unwrap();

        let query = stores.last_message_query.lock().unwrap().clone().unwrap();
        assert!(query.require_attachment);
        assert!(query.require_link);
        assert!(query.require_reaction);
        assert_eq!(query.after, Some(Utc.with_ymd_and_hms(2024, 4, 3, 0, 0, 0).unwrap()));

        // The post-filter drops the row the mock returned outside the range
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "m1");
        assert_eq!(results[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_empty_query_skips_store() {
        let stores = Arc::new(MockStores::default());
        let searcher = message_searcher(&stores);

        let results = searcher
            .search(&DomainRequest::new(parse_query("  "), "u1"))
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(MockStores::calls(&stores.message_calls), 0);
    }

    #[tokio::test]
    async fn test_direct_messages_stay_with_participant() {
        let stores = Arc::new(MockStores {
            direct_messages: vec![
                dm("d1", "u1", "u2", "hello bob"),
                dm("d2", "u2", "u3", "hello carol"),
                dm("d3", "u3", "u1", "hello jane"),
            ],
            ..Default::default()
        });
        let searcher = DirectMessageSearcher::new(stores.clone(), stores.clone());

        let request = DomainRequest::new(parse_query("hello"), "u1");
        let results = searcher.search(&request).await.unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
        let query = stores.last_dm_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.participant_id, "u1");
        assert_eq!(searcher.domain(), SearchDomain::DirectMessages);
    }
}
