use async_trait::async_trait;

use super::domain::{
    Dependent, NewDependent, Property, PropertyDetail, PropertyId, PropertyListing,
    PropertySubmission,
};
use super::pagination::PageRequest;
use super::query::Predicate;
use super::ranges::AggregateBounds;

/// Storage abstraction so the service and router can be exercised in isolation.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Writes the property and every included dependent atomically.
    async fn insert(&self, submission: PropertySubmission) -> Result<Property, RepositoryError>;

    /// Attaches one dependent row to an existing property.
    async fn insert_dependent(
        &self,
        property_id: PropertyId,
        dependent: NewDependent,
    ) -> Result<Dependent, RepositoryError>;

    async fn fetch(&self, id: PropertyId) -> Result<Option<PropertyDetail>, RepositoryError>;

    /// Returns up to `page.fetch_limit()` listing rows starting at `page.skip()`.
    async fn listings(
        &self,
        predicates: &[Predicate],
        page: PageRequest,
    ) -> Result<Vec<PropertyListing>, RepositoryError>;

    async fn market_value_bounds(&self) -> Result<AggregateBounds, RepositoryError>;

    async fn square_footage_bounds(&self) -> Result<AggregateBounds, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("property {0} does not exist")]
    MissingProperty(PropertyId),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}
