//! Specification pattern for composable result predicates
//!
//! Specifications are predicate objects that can be combined using
//! `and` and `not`. [`TrueSpec`] is the identity a composed chain starts from.

use std::sync::Arc;

/// Core specification trait
pub trait Specification<T>: Send + Sync {
    /// Check if the entity satisfies this specification
    fn is_satisfied_by(&self, entity: &T) -> bool;

    /// Combine with another specification using AND
    fn and<S: Specification<T> + 'static>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
    {
        AndSpecification {
            left: Arc::new(self),
            right: Arc::new(other),
        }
    }

    /// Negate this specification
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification {
            spec: Arc::new(self),
        }
    }
}

/// AND composite specification
pub struct AndSpecification<T> {
    left: Arc<dyn Specification<T>>,
    right: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for AndSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) && self.right.is_satisfied_by(entity)
    }
}

/// NOT specification wrapper
pub struct NotSpecification<T> {
    spec: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for NotSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        !self.spec.is_satisfied_by(entity)
    }
}

/// Always true specification (identity for AND)
pub struct TrueSpec<T>(std::marker::PhantomData<T>);

impl<T> TrueSpec<T> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<T> Default for TrueSpec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Specification<T> for TrueSpec<T> {
    fn is_satisfied_by(&self, _entity: &T) -> bool {
        true
    }
}

impl<T: Send + Sync> Specification<T> for Box<dyn Specification<T>> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.as_ref().is_satisfied_by(entity)
    }
}
