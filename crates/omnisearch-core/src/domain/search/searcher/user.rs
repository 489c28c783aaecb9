//! Workspace member searcher

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::search::entity::{ResultDetails, SearchDomain, SearchResult};
use crate::domain::search::repository_trait::{UserQuery, UserRow, UserStore};
use crate::domain::search::specification::ResultSpecBuilder;
use crate::error::Result;

use super::{DomainRequest, DomainSearcher, annotate};

pub struct UserSearcher {
    users: Arc<dyn UserStore>,
}

impl UserSearcher {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    fn to_result(row: UserRow, request: &DomainRequest) -> SearchResult {
        let full_name = row.full_name();
        let result = SearchResult::new(
            row.id.clone(),
            full_name.clone(),
            row.created_at,
            ResultDetails::User {
                username: row.username.clone(),
                email: row.email,
                is_admin: row.is_admin,
                avatar_url: row.avatar_url,
            },
        )
        .with_title(format!("@{}", row.username))
        .with_author(row.id, full_name.clone());

        annotate(result, &full_name, request)
    }
}

#[async_trait]
impl DomainSearcher for UserSearcher {
    fn domain(&self) -> SearchDomain {
        SearchDomain::Users
    }

    async fn search(&self, request: &DomainRequest) -> Result<Vec<SearchResult>> {
        if !request.has_text() {
            return Ok(Vec::new());
        }

        let query = UserQuery {
            text: request.text_match(),
            is_admin: request.filters.is_admin,
            limit: request.limit,
            offset: request.offset,
        };
        let rows = self.users.search_users(&query).await?;

        let spec = ResultSpecBuilder::new()
            .with_exclusions(&request.operators.exclude);

        Ok(spec.filter(
            rows.into_iter()
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
    use chrono::Utc;

    fn user(id: &str, first: &str, last: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            username: first.to_lowercase(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            avatar_url: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_full_name_is_primary_field() {
        let stores = Arc::new(MockStores {
            users: vec![user("u1", "Jane", "Doe"), user("u2", "Janet", "Jackson")],
            ..Default::default()
        });
        let searcher = UserSearcher::new(stores.clone());

        let results = searcher
            .search(&DomainRequest::new(parse_query("jane doe"), "u9"))
            .await
            .unwrap();

        let jane = results.iter().find(|r| r.id == "u1").unwrap();
        let janet = results.iter().find(|r| r.id == "u2").unwrap();
        // exact match: 100 + 50 + 20 + 2 words
        assert_eq!(jane.score, 190.0);
        assert_eq!(janet.score, 10.0);
        assert_eq!(jane.content, "Jane Doe");
        assert_eq!(jane.title.as_deref(), Some("@jane"));
        assert_eq!(jane.highlights, vec!["Jane", "Doe"]);
    }

    #[tokio::test]
    async fn test_exclusion_applies_to_names() {
        let stores = Arc::new(MockStores {
            users: vec![user("u1", "Jane", "Doe"), user("u2", "Janet", "Jackson")],
            ..Default::default()
        });
        let searcher = UserSearcher::new(stores.clone());

        let results = searcher
            .search(&DomainRequest::new(parse_query("jan -jackson"), "u9"))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "u1");
    }
}
