//! Property records: the parcel table, its dependent sections, and the filtered listing.
//!
//! Listings are built from an ordered set of optional predicates, fetched one row past
//! the requested window so the response can say whether another page follows.

pub mod domain;
pub mod pagination;
pub mod query;
pub mod ranges;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use domain::{
    Assessment, AssessmentFields, Classification, ClassificationFields, Dependent, Feature,
    FeatureFields, MiscInfo, MiscInfoFields, NewDependent, Property, PropertyAddress,
    PropertyDetail, PropertyId, PropertyListing, PropertySubmission, SalesAppeal,
    SalesAppealFields, SubmissionError,
};
pub use pagination::{Page, PageParams, PageRequest, PaginationError};
pub use query::{PropertyFilter, Predicate};
pub use ranges::{AggregateBounds, Range, SliderRanges};
pub use repository::{PropertyRepository, RepositoryError};
pub use router::{records_router, RecordsState};
pub use service::{PropertyService, PropertyServiceError};
pub use sqlite::SqlitePropertyRepository;
