//! Search domain module
//!
//! Federated search over a chat workspace: channel messages, direct messages,
//! files, channels and users.
//!
//! # Architecture
//!
//! - **Entities**: `SearchOptions`, `SearchResult`, `SearchHistoryEntry`, `SavedSearch`
//! - **Query**: `parse_query` turns a raw string into base text plus `Operators`
//! - **Searchers**: one `DomainSearcher` per entity domain
//! - **Repository**: `SearchRepository`, the SQLite implementation of every store trait
//! - **Service**: `SearchService` fans a query out to the searchers and merges the results
//!
//! # Features
//!
//! - Inline operators: `from:@user`, `in:#channel`, `has:file|link|reaction`,
//!   `before:`/`after:` dates, quoted phrases, `NOT term`/`-term`, `OR`
//! - Per-domain timeouts and caller cancellation
//! - Relevance or date ordering with pagination over the merged set
//! - Search history, autocomplete suggestions and saved searches
//!
//! # Example
//!
//! ```ignore
//! use omnisearch_core::domain::search::{SearchRepository, SearchScope, SearchService};
//!
//! let service = SearchService::from_repository(SearchRepository::new(pool), config.search);
//!
//! let options = service
//!     .options("u1", "from:@jane budget after:2024-01-01")
//!     .with_scope(SearchScope::Messages)
//!     .with_channel_ids(member_of);
//! let response = service.search(&options).await?;
//! ```

pub mod entity;
pub mod query;
pub mod repository;
pub mod repository_trait;
pub mod saved;
pub mod scoring;
pub mod searcher;
pub mod service;
pub mod specification;
pub mod suggestion;

// Re-export main types
pub use entity::{
    ResultAuthor, ResultChannel, ResultDetails, SaveSearchRequest, SavedSearch,
    SavedSearchUpdate, SearchDomain, SearchFilters, SearchHistoryEntry, SearchOptions,
    SearchResponse, SearchResult, SearchScope, SortBy, SortOrder,
};
pub use query::{HasTag, Operators, ParsedQuery, parse_query};
pub use repository::SearchRepository;
pub use repository_trait::{
    ChannelStore, FileStore, HistoryStore, MessageStore, SavedSearchStore, UserStore,
};
pub use saved::SavedSearchManager;
pub use searcher::{
    ChannelSearcher, DirectMessageSearcher, DomainRequest, DomainSearcher, FileSearcher,
    MessageSearcher, UserSearcher,
};
pub use service::{SearchService, SearchStores};
pub use specification::{MentionsAnyTermSpec, ResultSpecBuilder, WithinDateRangeSpec};
pub use suggestion::SuggestionEngine;
