use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{token_router, Authenticator};
use crate::config::AuthConfig;
use crate::records::domain::{
    AssessmentFields, ClassificationFields, Dependent, FeatureFields, NewDependent, Property,
    PropertyAddress, PropertyDetail, PropertyId, PropertyListing, PropertySubmission,
};
use crate::records::pagination::PageRequest;
use crate::records::query::Predicate;
use crate::records::ranges::AggregateBounds;
use crate::records::repository::{PropertyRepository, RepositoryError};
use crate::records::{records_router, PropertyService, SqlitePropertyRepository};

pub(super) type SqliteService = PropertyService<SqlitePropertyRepository>;

pub(super) fn address(house_no: &str, street: &str, suffix: Option<&str>, city: &str) -> PropertyAddress {
    PropertyAddress {
        longitude: Some(-87.63),
        latitude: Some(41.88),
        zip: Some("60601".to_string()),
        house_no: house_no.to_string(),
        dir: None,
        street: street.to_string(),
        suffix: suffix.map(str::to_string),
        apt: None,
        city: city.to_string(),
    }
}

/// A submission carrying the three sections the listing joins against.
pub(super) fn listed(
    address: PropertyAddress,
    class_description: &str,
    bldg_use: &str,
    market_value: Option<i64>,
    building_sq_ft: Option<i64>,
) -> PropertySubmission {
    PropertySubmission {
        classification: Some(ClassificationFields {
            class_description: Some(class_description.to_string()),
            bldg_use: Some(bldg_use.to_string()),
            ..ClassificationFields::default()
        }),
        assessment: Some(AssessmentFields {
            estimated_market_value: market_value,
            ..AssessmentFields::default()
        }),
        feature: Some(FeatureFields {
            building_sq_ft,
            ..FeatureFields::default()
        }),
        ..PropertySubmission::new(address)
    }
}

pub(super) fn house(house_no: &str, building_sq_ft: i64) -> PropertySubmission {
    listed(
        address(house_no, "Oak", Some("Ave"), "Evanston"),
        "Two Story",
        "Single Family",
        Some(200_000),
        Some(building_sq_ft),
    )
}

pub(super) async fn sqlite_service() -> SqliteService {
    let repository = SqlitePropertyRepository::in_memory()
        .await
        .expect("in-memory store opens");
    PropertyService::new(Arc::new(repository))
}

pub(super) async fn seeded_service(
    submissions: Vec<PropertySubmission>,
) -> (SqliteService, Vec<PropertyId>) {
    let service = sqlite_service().await;
    let mut ids = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let property = service.create(submission).await.expect("seed row stored");
        ids.push(property.id);
    }
    (service, ids)
}

pub(super) async fn property_count(service: &SqliteService) -> i64 {
    row_count(service, "properties").await
}

pub(super) async fn row_count(service: &SqliteService, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(service.repository().pool())
        .await
        .expect("count query runs");
    count
}

pub(super) fn listing_ids(listings: &[PropertyListing]) -> Vec<PropertyId> {
    listings.iter().map(|listing| listing.id).collect()
}

/// Repository double whose every call fails.
pub(super) struct UnavailableRepository;

#[async_trait]
impl PropertyRepository for UnavailableRepository {
    async fn insert(&self, _submission: PropertySubmission) -> Result<Property, RepositoryError> {
        Err(unavailable())
    }

    async fn insert_dependent(
        &self,
        _property_id: PropertyId,
        _dependent: NewDependent,
    ) -> Result<Dependent, RepositoryError> {
        Err(unavailable())
    }

    async fn fetch(&self, _id: PropertyId) -> Result<Option<PropertyDetail>, RepositoryError> {
        Err(unavailable())
    }

    async fn listings(
        &self,
        _predicates: &[Predicate],
        _page: PageRequest,
    ) -> Result<Vec<PropertyListing>, RepositoryError> {
        Err(unavailable())
    }

    async fn market_value_bounds(&self) -> Result<AggregateBounds, RepositoryError> {
        Err(unavailable())
    }

    async fn square_footage_bounds(&self) -> Result<AggregateBounds, RepositoryError> {
        Err(unavailable())
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Storage(sqlx::Error::PoolClosed)
}

pub(super) fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-signing-secret".to_string(),
        username: "admin".to_string(),
        password: "password".to_string(),
        token_ttl_minutes: 5,
    }
}

pub(super) fn authenticator() -> Arc<Authenticator> {
    Arc::new(Authenticator::new(&auth_config()))
}

pub(super) fn bearer(authenticator: &Authenticator) -> String {
    let token = authenticator.issue("admin").expect("token issued");
    format!("Bearer {}", token.access_token)
}

pub(super) fn app<R>(service: PropertyService<R>, authenticator: Arc<Authenticator>) -> Router
where
    R: PropertyRepository + 'static,
{
    records_router(Arc::new(service), authenticator.clone()).merge(token_router(authenticator))
}

pub(super) async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

pub(super) fn authorized_get(uri: &str, authorization: &str) -> Request<Body> {
    Request::get(uri)
        .header(AUTHORIZATION, authorization)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}
