use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::records::domain::{
    AssessmentFields, Dependent, FeatureFields, MiscInfoFields, NewDependent, PropertyId,
    PropertySubmission, SalesAppealFields, SubmissionError,
};
use crate::records::pagination::PageRequest;
use crate::records::query::PropertyFilter;
use crate::records::ranges::Range;
use crate::records::repository::RepositoryError;
use crate::records::service::{PropertyService, PropertyServiceError};

#[tokio::test]
async fn create_writes_every_supplied_section() {
    let service = sqlite_service().await;
    let mut submission = house("77", 1600);
    submission.sales_appeal = Some(SalesAppealFields {
        multi_sale: Some(false),
        deed_type: Some(3),
        sale_date: NaiveDate::from_ymd_opt(2020, 5, 1),
        sale_amount: Some(180_000),
    });

    let property = service.create(submission).await.expect("create succeeds");
    let detail = service.detail(property.id).await.expect("detail found");

    assert_eq!(detail.property, property);
    assert_eq!(
        detail
            .classification
            .as_ref()
            .and_then(|c| c.fields.bldg_use.as_deref()),
        Some("Single Family")
    );
    assert_eq!(
        detail.feature.as_ref().map(|f| f.property_id),
        Some(property.id)
    );
    assert_eq!(
        detail.sales_appeal.and_then(|s| s.fields.sale_date),
        NaiveDate::from_ymd_opt(2020, 5, 1)
    );
    assert!(detail.misc_info.is_none());
}

#[tokio::test]
async fn failed_section_rolls_back_the_whole_creation() {
    let service = sqlite_service().await;
    sqlx::query("DROP TABLE misc_info")
        .execute(service.repository().pool())
        .await
        .expect("table dropped");

    let mut submission = house("12", 1500);
    submission.misc_info = Some(MiscInfoFields {
        pin: Some(16_000_001),
        ..MiscInfoFields::default()
    });

    let result = service.create(submission).await;
    assert!(matches!(
        result,
        Err(PropertyServiceError::Repository(RepositoryError::Storage(_)))
    ));
    assert_eq!(property_count(&service).await, 0);
    assert_eq!(row_count(&service, "property_features").await, 0);

    service
        .create(house("13", 1500))
        .await
        .expect("store still usable");
    assert_eq!(property_count(&service).await, 1);
}

#[tokio::test]
async fn negative_figures_are_stored_as_submitted() {
    let service = sqlite_service().await;
    let mut submission = house("14", 1500);
    submission.assessment = Some(AssessmentFields {
        estimated_market_value: Some(-100),
        ..AssessmentFields::default()
    });
    submission.feature = Some(FeatureFields {
        building_sq_ft: Some(-1),
        land_sq_ft: Some(-20),
        ..FeatureFields::default()
    });

    let property = service.create(submission).await.expect("create succeeds");
    let detail = service.detail(property.id).await.expect("detail found");
    assert_eq!(
        detail.assessment.and_then(|a| a.fields.estimated_market_value),
        Some(-100)
    );
    assert_eq!(detail.feature.and_then(|f| f.fields.land_sq_ft), Some(-20));
}

#[tokio::test]
async fn blank_required_address_part_is_invalid() {
    let service = sqlite_service().await;
    let submission = PropertySubmission::new(address("1", " ", None, "Chicago"));

    let result = service.create(submission).await;
    assert!(matches!(
        result,
        Err(PropertyServiceError::Invalid(SubmissionError::BlankField(
            "street"
        )))
    ));
    assert_eq!(property_count(&service).await, 0);
}

#[tokio::test]
async fn dependent_attaches_to_existing_property() {
    let service = sqlite_service().await;
    let property = service
        .create(PropertySubmission::new(address("8", "Birch", None, "Cicero")))
        .await
        .expect("property stored");

    let stored = service
        .add_dependent(
            property.id,
            NewDependent::from(MiscInfoFields {
                pin: Some(16_000_123),
                rec_type: Some("P".to_string()),
                ..MiscInfoFields::default()
            }),
        )
        .await
        .expect("dependent stored");
    let Dependent::MiscInfo(misc) = stored else {
        panic!("expected misc info row");
    };
    assert_eq!(misc.property_id, property.id);

    let detail = service.detail(property.id).await.expect("detail found");
    assert_eq!(detail.misc_info, Some(misc));
    assert!(detail.assessment.is_none());
}

#[tokio::test]
async fn dependent_for_unknown_property_is_not_found() {
    let service = sqlite_service().await;
    let result = service
        .add_dependent(
            PropertyId(404),
            NewDependent::from(AssessmentFields::default()),
        )
        .await;
    assert!(matches!(
        result,
        Err(PropertyServiceError::NotFound(PropertyId(404)))
    ));
}

#[tokio::test]
async fn detail_for_unknown_property_is_not_found() {
    let service = sqlite_service().await;
    assert!(matches!(
        service.detail(PropertyId(1)).await,
        Err(PropertyServiceError::NotFound(PropertyId(1)))
    ));
}

#[tokio::test]
async fn slider_ranges_fall_back_on_empty_store() {
    let service = sqlite_service().await;
    let ranges = service.slider_ranges().await.expect("ranges computed");
    assert_eq!(
        ranges.estimated_market_value,
        Range {
            min: 0,
            max: 10_000_000
        }
    );
    assert_eq!(ranges.building_sq_ft, Range { min: 0, max: 20_000 });
}

#[tokio::test]
async fn slider_ranges_reflect_stored_values_including_zero() {
    let (service, _) = seeded_service(vec![
        listed(
            address("1", "Ash", None, "Berwyn"),
            "Vacant",
            "Land",
            Some(0),
            Some(0),
        ),
        listed(
            address("2", "Ash", None, "Berwyn"),
            "Two Story",
            "Single Family",
            Some(325_000),
            Some(2400),
        ),
        listed(
            address("3", "Ash", None, "Berwyn"),
            "Two Story",
            "Single Family",
            None,
            None,
        ),
    ])
    .await;

    let ranges = service.slider_ranges().await.expect("ranges computed");
    assert_eq!(
        ranges.estimated_market_value,
        Range {
            min: 0,
            max: 325_000
        }
    );
    assert_eq!(ranges.building_sq_ft, Range { min: 0, max: 2400 });
}

#[tokio::test]
async fn storage_failures_surface_as_repository_errors() {
    let service = PropertyService::new(Arc::new(UnavailableRepository));

    assert!(matches!(
        service
            .list(&PropertyFilter::default(), PageRequest::default())
            .await,
        Err(PropertyServiceError::Repository(RepositoryError::Storage(_)))
    ));
    assert!(matches!(
        service.slider_ranges().await,
        Err(PropertyServiceError::Repository(_))
    ));
    assert!(matches!(
        service.create(house("1", 1000)).await,
        Err(PropertyServiceError::Repository(_))
    ));
}
