use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    Dependent, NewDependent, Property, PropertyDetail, PropertyId, PropertyListing,
    PropertySubmission, SubmissionError,
};
use super::pagination::{Page, PageRequest, PaginationError};
use super::query::PropertyFilter;
use super::ranges::SliderRanges;
use super::repository::{PropertyRepository, RepositoryError};

/// Service composing the record repository with filtering, pagination, and slider ranges.
pub struct PropertyService<R> {
    repository: Arc<R>,
}

impl<R> PropertyService<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Create a property together with any dependent sections in one atomic write.
    pub async fn create(
        &self,
        submission: PropertySubmission,
    ) -> Result<Property, PropertyServiceError> {
        submission.validate()?;
        let property = self.repository.insert(submission).await?;
        info!(property_id = %property.id, "property created");
        Ok(property)
    }

    /// Attach a dependent section to an existing property.
    pub async fn add_dependent(
        &self,
        property_id: PropertyId,
        dependent: NewDependent,
    ) -> Result<Dependent, PropertyServiceError> {
        let kind = dependent.kind();
        match self.repository.insert_dependent(property_id, dependent).await {
            Ok(stored) => {
                info!(%property_id, kind, "dependent section created");
                Ok(stored)
            }
            Err(RepositoryError::MissingProperty(id)) => {
                warn!(property_id = %id, kind, "dependent rejected for unknown property");
                Err(PropertyServiceError::NotFound(id))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Fetch a property and whichever dependent sections exist for it.
    pub async fn detail(&self, id: PropertyId) -> Result<PropertyDetail, PropertyServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or(PropertyServiceError::NotFound(id))
    }

    /// Filtered listing with an over-fetch to detect a following page.
    pub async fn list(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Page<PropertyListing>, PropertyServiceError> {
        let predicates = filter.predicates();
        let rows = self.repository.listings(&predicates, page).await?;
        let page = Page::from_overfetch(rows, page);
        debug!(
            predicates = predicates.len(),
            returned = page.data.len(),
            more_exists = page.more_exists,
            "property listing served"
        );
        Ok(page)
    }

    pub async fn slider_ranges(&self) -> Result<SliderRanges, PropertyServiceError> {
        let market_value = self.repository.market_value_bounds().await?;
        let square_footage = self.repository.square_footage_bounds().await?;
        Ok(SliderRanges::from_aggregates(market_value, square_footage))
    }
}

/// Error raised by the property service.
#[derive(Debug, thiserror::Error)]
pub enum PropertyServiceError {
    #[error("property {0} not found")]
    NotFound(PropertyId),
    #[error(transparent)]
    Invalid(#[from] SubmissionError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
