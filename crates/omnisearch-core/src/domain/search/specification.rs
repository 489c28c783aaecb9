//! Search specifications
//!
//! Composable post-filters applied by the domain searchers after the store
//! lookup. The store already pushes the same conditions down; these catch
//! anything a backend matched more loosely.

use chrono::{DateTime, Utc};

use crate::domain::specification::{Specification, TrueSpec};

use super::entity::SearchResult;

/// Matches results whose primary text contains any of the terms, ignoring case
pub struct MentionsAnyTermSpec {
    terms: Vec<String>,
}

impl MentionsAnyTermSpec {
    pub fn new(terms: &[String]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|term| term.trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }
}

impl Specification<SearchResult> for MentionsAnyTermSpec {
    fn is_satisfied_by(&self, result: &SearchResult) -> bool {
        let content = result.content.to_lowercase();
        self.terms.iter().any(|term| content.contains(term.as_str()))
    }
}

/// Inclusive timestamp bounds; a missing bound is open
pub struct WithinDateRangeSpec {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl WithinDateRangeSpec {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }
}

impl Specification<SearchResult> for WithinDateRangeSpec {
    fn is_satisfied_by(&self, result: &SearchResult) -> bool {
        if let Some(from) = self.from {
            if result.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if result.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Builder for composing search specifications
pub struct ResultSpecBuilder {
    spec: Box<dyn Specification<SearchResult>>,
}

impl Default for ResultSpecBuilder {
    fn default() -> Self {
        Self {
            spec: Box::new(TrueSpec::new()),
        }
    }
}

impl ResultSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn and_also<S: Specification<SearchResult> + 'static>(self, next: S) -> Self {
        Self {
            spec: Box::new(self.spec.and(next)),
        }
    }

    /// Drop results mentioning any of `terms`; blank terms are ignored
    pub fn with_exclusions(self, terms: &[String]) -> Self {
        if terms.iter().all(|term| term.trim().is_empty()) {
            return self;
        }
        self.and_also(MentionsAnyTermSpec::new(terms).not())
    }

    /// Inclusive bounds; no spec is added when both are open
    pub fn with_date_range(self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        if from.is_none() && to.is_none() {
            return self;
        }
        self.and_also(WithinDateRangeSpec::new(from, to))
    }

    pub fn is_satisfied_by(&self, result: &SearchResult) -> bool {
        self.spec.is_satisfied_by(result)
    }

    /// Filter a collection of results, keeping their order
    pub fn filter(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        results
            .into_iter()
            .filter(|r| self.is_satisfied_by(r))
            .collect()
    }
}

/// Later of two optional lower bounds
pub fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Earlier of two optional upper bounds
pub fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
