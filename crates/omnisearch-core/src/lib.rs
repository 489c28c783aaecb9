//! Omnisearch Core Library
//!
//! This crate provides the core functionality for Omnisearch, including:
//! - Query parsing with inline operators (`from:`, `in:`, `has:`, dates, exclusions)
//! - Relevance scoring, highlights and context windows
//! - Concurrent per-domain search with timeouts and cancellation
//! - Search history and autocomplete suggestions
//! - Saved searches with ownership checks
//! - Storage (SQLite) and configuration

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::search::{
        SaveSearchRequest, SavedSearchManager, SearchFilters, SearchOptions, SearchRepository,
        SearchResponse, SearchScope, SearchService, SuggestionEngine,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
