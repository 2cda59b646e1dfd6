use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::domain::{
    AssessmentFields, ClassificationFields, FeatureFields, MiscInfoFields, NewDependent,
    PropertyId, PropertySubmission, SalesAppealFields,
};
use super::pagination::PageParams;
use super::query::PropertyFilter;
use super::repository::{PropertyRepository, RepositoryError};
use super::service::{PropertyService, PropertyServiceError};
use crate::auth::{AuthenticatedUser, Authenticator};

/// Shared handler state: the record service plus the token verifier guarding it.
pub struct RecordsState<R> {
    pub service: Arc<PropertyService<R>>,
    pub authenticator: Arc<Authenticator>,
}

impl<R> Clone for RecordsState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<R> FromRef<RecordsState<R>> for Arc<PropertyService<R>> {
    fn from_ref(state: &RecordsState<R>) -> Self {
        Arc::clone(&state.service)
    }
}

impl<R> FromRef<RecordsState<R>> for Arc<Authenticator> {
    fn from_ref(state: &RecordsState<R>) -> Self {
        Arc::clone(&state.authenticator)
    }
}

/// Router builder exposing the bearer-protected property endpoints.
pub fn records_router<R>(
    service: Arc<PropertyService<R>>,
    authenticator: Arc<Authenticator>,
) -> Router
where
    R: PropertyRepository + 'static,
{
    Router::new()
        .route("/properties", post(create_handler::<R>))
        .route("/properties/range", get(range_handler::<R>))
        .route("/properties/:property_id", get(detail_handler::<R>))
        .route(
            "/properties/:property_id/classification",
            post(dependent_handler::<R, ClassificationFields>),
        )
        .route(
            "/properties/:property_id/assessment",
            post(dependent_handler::<R, AssessmentFields>),
        )
        .route(
            "/properties/:property_id/sales_appeal",
            post(dependent_handler::<R, SalesAppealFields>),
        )
        .route(
            "/properties/:property_id/feature",
            post(dependent_handler::<R, FeatureFields>),
        )
        .route(
            "/properties/:property_id/misc_info",
            post(dependent_handler::<R, MiscInfoFields>),
        )
        .route("/properties_listings", get(listings_handler::<R>))
        .with_state(RecordsState {
            service,
            authenticator,
        })
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<PropertyService<R>>>,
    _user: AuthenticatedUser,
    Json(submission): Json<PropertySubmission>,
) -> Response
where
    R: PropertyRepository + 'static,
{
    match service.create(submission).await {
        Ok(property) => (StatusCode::CREATED, Json(property)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dependent_handler<R, F>(
    State(service): State<Arc<PropertyService<R>>>,
    _user: AuthenticatedUser,
    Path(property_id): Path<i64>,
    Json(fields): Json<F>,
) -> Response
where
    R: PropertyRepository + 'static,
    F: Into<NewDependent> + DeserializeOwned + Send + 'static,
{
    match service
        .add_dependent(PropertyId(property_id), fields.into())
        .await
    {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<PropertyService<R>>>,
    _user: AuthenticatedUser,
    Path(property_id): Path<i64>,
) -> Response
where
    R: PropertyRepository + 'static,
{
    match service.detail(PropertyId(property_id)).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn listings_handler<R>(
    State(service): State<Arc<PropertyService<R>>>,
    _user: AuthenticatedUser,
    Query(filter): Query<PropertyFilter>,
    Query(params): Query<PageParams>,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let page = match params.into_request() {
        Ok(page) => page,
        Err(err) => return error_response(err.into()),
    };

    match service.list(&filter, page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn range_handler<R>(
    State(service): State<Arc<PropertyService<R>>>,
    _user: AuthenticatedUser,
) -> Response
where
    R: PropertyRepository + 'static,
{
    match service.slider_ranges().await {
        Ok(ranges) => (StatusCode::OK, Json(ranges)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PropertyServiceError) -> Response {
    let status = match &err {
        PropertyServiceError::NotFound(_)
        | PropertyServiceError::Repository(RepositoryError::MissingProperty(_)) => {
            StatusCode::NOT_FOUND
        }
        PropertyServiceError::Invalid(_) | PropertyServiceError::Pagination(_) => {
            StatusCode::BAD_REQUEST
        }
        PropertyServiceError::Repository(source) => {
            tracing::error!(error = %source, "property store request failed");
            let payload = json!({ "error": "internal error" });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
