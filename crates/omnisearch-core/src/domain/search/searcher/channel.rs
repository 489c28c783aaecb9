//! Channel searcher

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::search::entity::{ResultDetails, SearchDomain, SearchResult};
use crate::domain::search::repository_trait::{ChannelQuery, ChannelRow, ChannelStore};
use crate::domain::search::specification::ResultSpecBuilder;
use crate::error::Result;

use super::{DomainRequest, DomainSearcher, annotate};

pub struct ChannelSearcher {
    channels: Arc<dyn ChannelStore>,
}

impl ChannelSearcher {
    pub fn new(channels: Arc<dyn ChannelStore>) -> Self {
        Self { channels }
    }

    fn to_result(row: ChannelRow, request: &DomainRequest) -> SearchResult {
        let name = row.name.clone();
        let mut result = SearchResult::new(
            row.id.clone(),
            row.name.clone(),
            row.created_at,
            ResultDetails::Channel {
                tier: row.tier,
                member_count: row.member_count,
            },
        )
        .with_title(format!("#{}", row.name))
        .with_channel(row.id, row.name);

        if let Some(description) = row.description {
            result = result.with_metadata("description", serde_json::Value::String(description));
        }
        if let Some(purpose) = row.purpose {
            result = result.with_metadata("purpose", serde_json::Value::String(purpose));
        }

        annotate(result, &name, request)
    }
}

#[async_trait]
impl DomainSearcher for ChannelSearcher {
    fn domain(&self) -> SearchDomain {
        SearchDomain::Channels
    }

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>> {
        if !request.has_text() {
            return Ok(Vec::new());
        }

        let query = ChannelQuery {
            text: request.text_match(),
            tier: request.filters.channel_tier.clone(),
            limit: request.limit,
            offset: request.offset,
        };
        let rows = self.channels.search_channels(&query).await?;

        let spec = ResultSpecBuilder::new()
            .with_exclusions(&request.operators.exclude);

        Ok(spec.filter(
            rows.into_iter()
                .map(|row| Self::to_result(row, request))
                .collect(),
        ))
    }
}
