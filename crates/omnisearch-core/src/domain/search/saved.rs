//! Saved search management
//!
//! Users keep named queries they can pin and re-run. Only the owner may read
//! or change a saved search, and the ownership check happens before any write.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::entity::{SaveSearchRequest, SavedSearch, SavedSearchUpdate};
use super::repository::SearchRepository;
use super::repository_trait::SavedSearchStore;

/// CRUD and usage tracking for saved searches
#[derive(Clone)]
pub struct SavedSearchManager {
    store: Arc<dyn SavedSearchStore>,
}

impl SavedSearchManager {
    pub fn new(store: Arc<dyn SavedSearchStore>) -> Self {
        Self { store }
    }

    pub fn from_repository(repository: SearchRepository) -> Self {
        Self::new(Arc::new(repository))
    }

    /// Persist a new saved search for `request.user_id`
    pub async fn save(&self, request: SaveSearchRequest) -> Result<SavedSearch> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "saved search name must not be empty".to_string(),
            ));
        }

        let saved = SavedSearch::from_request(SaveSearchRequest { name, ..request });
        self.store.insert_saved_search(&saved).await?;

        info!(user_id = %saved.user_id, saved_search_id = %saved.id, "Saved search created");
        Ok(saved)
    }

    /// All saved searches of a user, pinned first, then most recently used
    pub async fn list(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        let mut saved = self.store.list_saved_searches(user_id).await?;
        saved.sort_by(list_order);
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid, caller: &str) -> Result<SavedSearch> {
        self.owned(id, caller).await
    }

    /// Apply a partial update; an update with a blank name is rejected
    pub async fn update(
        &self,
        id: Uuid,
        caller: &str,
        update: SavedSearchUpdate,
    ) -> Result<SavedSearch> {
        let mut saved = self.owned(id, caller).await?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Validation(
                    "saved search name must not be empty".to_string(),
                ));
            }
            saved.name = name.to_string();
        }
        if let Some(query) = update.query {
            saved.query = query;
        }
        if let Some(filters) = update.filters {
            saved.filters = filters;
        }
        if let Some(scope) = update.scope {
            saved.scope = scope;
        }
        if let Some(is_pinned) = update.is_pinned {
            saved.is_pinned = is_pinned;
        }
        saved.updated_at = Utc::now();

        self.store.update_saved_search(&saved).await?;
        debug!(saved_search_id = %id, "Saved search updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid, caller: &str) -> Result<()> {
        self.owned(id, caller).await?;

        if !self.store.delete_saved_search(id).await? {
            return Err(Error::SavedSearchNotFound(id.to_string()));
        }
        info!(saved_search_id = %id, "Saved search deleted");
        Ok(())
    }

    /// Bump the usage counter and return the updated record
    pub async fn mark_used(&self, id: Uuid, caller: &str) -> Result<SavedSearch> {
        let mut saved = self.owned(id, caller).await?;

        let now = Utc::now();
        saved.usage_count += 1;
        saved.last_used_at = Some(now);
        saved.updated_at = now;

        self.store.update_saved_search(&saved).await?;
        Ok(saved)
    }

    async fn owned(&self, id: Uuid, caller: &str) -> Result<SavedSearch> {
        let saved = self
            .store
            .get_saved_search(id)
            .await?
            .ok_or_else(|| Error::SavedSearchNotFound(id.to_string()))?;

        if !saved.is_owned_by(caller) {
            return Err(Error::PermissionDenied {
                user_id: caller.to_string(),
                saved_search_id: id.to_string(),
            });
        }
        Ok(saved)
    }
}

fn list_order(a: &SavedSearch, b: &SavedSearch) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| match (a.last_used_at, b.last_used_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}
