//! File upload searcher

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::search::entity::{ResultDetails, SearchDomain, SearchResult};
use crate::domain::search::repository_trait::{
    ChannelStore, FileQuery, FileRow, FileStore, MessageStore, UserStore,
};
use crate::domain::search::specification::ResultSpecBuilder;
use crate::error::Result;

use super::{DomainRequest, DomainSearcher, annotate, resolve_channels, resolve_users};

pub struct FileSearcher {
    files: Arc<dyn FileStore>,
    messages: Arc<dyn MessageStore>,
    channels: Arc<dyn ChannelStore>,
    users: Arc<dyn UserStore>,
}

impl FileSearcher {
    pub fn new(
        files: Arc<dyn FileStore>,
        messages: Arc<dyn MessageStore>,
        channels: Arc<dyn ChannelStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            files,
            messages,
            channels,
            users,
        }
    }

    /// Channels a file's message must be in, or `None` when unrestricted.
    ///
    /// The caller's channel filter and resolved `in:` names must both hold, so
    /// when both are given only their common channels remain.
    async fn channel_restriction(&self, request: &DomainRequest) -> Result<Option<Vec<String>>> {
        let named = resolve_channels(self.channels.as_ref(), &request.operators.in_channels).await?;

        Ok(match (&request.filters.channel_id, named.is_empty()) {
            (None, true) => None,
            (None, false) => Some(named),
            (Some(channel_id), true) => Some(vec![channel_id.clone()]),
            (Some(channel_id), false) => Some(
                named
                    .into_iter()
                    .filter(|id| id == channel_id)
                    .collect(),
            ),
        })
    }

    fn to_result(row: FileRow, request: &DomainRequest) -> SearchResult {
        let file_name = row.file_name.clone();
        let mut result = SearchResult::new(
            row.id,
            row.file_name.clone(),
            row.created_at,
            ResultDetails::File {
                file_type: row.file_type,
                file_size: row.file_size,
                url: row.url,
                message_id: row.message_id,
            },
        )
        .with_title(row.file_name);

        if let Some(uploader_id) = row.uploader_id {
            result = result.with_author(uploader_id, row.uploader_name.unwrap_or_default());
        }
        if let (Some(channel_id), Some(channel_name)) = (row.channel_id, row.channel_name) {
            result = result.with_channel(channel_id, channel_name);
        }

        annotate(result, &file_name, request)
    }
}

#[async_trait]
impl DomainSearcher for FileSearcher {
    fn domain(&self) -> SearchDomain {
        SearchDomain::Files
    }

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>> {
        if !request.has_criteria() {
            return Ok(Vec::new());
        }

        let message_ids = match self.channel_restriction(request).await? {
            None => None,
            Some(channel_ids) if channel_ids.is_empty() => {
                debug!("Channel filter and in: operator share no channel");
                return Ok(Vec::new());
            }
            Some(channel_ids) => {
                let ids = self.messages.attachment_message_ids(&channel_ids).await?;
                if ids.is_empty() {
                    debug!(?channel_ids, "No attachments in the requested channels");
                    return Ok(Vec::new());
                }
                Some(ids)
            }
        };

        let query = FileQuery {
            text: request.text_match(),
            uploader_ids: resolve_users(self.users.as_ref(), &request.operators.from).await?,
            message_ids,
            filters: request.filters.clone(),
            after: request.after(),
            before: request.before(),
            limit: request.limit,
            offset: request.offset,
        };

        let rows = self.files.search_files(&query).await?;
        debug!(rows = rows.len(), "File store returned rows");

        let spec = ResultSpecBuilder::new()
            .with_exclusions(&request.operators.exclude)
            .with_date_range(query.after, query.before);

        Ok(spec.filter(
            rows.into_iter()
                .map(|row| Self::to_result(row, request))
                .collect(),
        ))
    }
}
