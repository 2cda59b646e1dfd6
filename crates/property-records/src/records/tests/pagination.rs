use proptest::prelude::*;

use super::common::*;
use crate::records::pagination::{Page, PageParams, PageRequest, PaginationError};
use crate::records::query::PropertyFilter;

#[test]
fn defaults_are_first_five_rows() {
    let request = PageParams::default().into_request().expect("defaults valid");
    assert_eq!(request, PageRequest::default());
    assert_eq!((request.skip(), request.limit()), (0, 5));
    assert_eq!(request.fetch_limit(), 6);
}

#[test]
fn negative_and_overflowing_windows_are_rejected() {
    assert_eq!(
        PageRequest::new(-1, 5),
        Err(PaginationError::NegativeSkip(-1))
    );
    assert_eq!(
        PageRequest::new(0, -3),
        Err(PaginationError::NegativeLimit(-3))
    );
    assert_eq!(
        PageRequest::new(0, i64::MAX),
        Err(PaginationError::LimitTooLarge(i64::MAX))
    );
    assert!(PageRequest::new(i64::MAX, i64::MAX - 1).is_ok());
}

#[test]
fn overfetched_row_sets_more_exists_and_is_dropped() {
    let request = PageRequest::new(0, 2).expect("window");

    let page = Page::from_overfetch(vec![1, 2, 3], request);
    assert_eq!(page.data, vec![1, 2]);
    assert!(page.more_exists);

    let page = Page::from_overfetch(vec![1, 2], request);
    assert_eq!(page.data, vec![1, 2]);
    assert!(!page.more_exists);
}

#[test]
fn zero_limit_reports_whether_a_row_exists_at_skip() {
    let request = PageRequest::new(3, 0).expect("window");
    let page = Page::from_overfetch(vec!["row"], request);
    assert!(page.data.is_empty());
    assert!(page.more_exists);

    let page = Page::<&str>::from_overfetch(Vec::new(), request);
    assert!(!page.more_exists);
}

#[test]
fn page_serializes_with_data_and_more_exists() {
    let page = Page::from_overfetch(vec![10], PageRequest::default());
    let value = serde_json::to_value(page.map(|n| n * 2)).expect("serializes");
    assert_eq!(value, serde_json::json!({ "data": [20], "more_exists": false }));
}

proptest! {
    #[test]
    fn window_arithmetic_matches_slice(total in 0i64..40, skip in 0i64..45, limit in 0i64..12) {
        let request = PageRequest::new(skip, limit).expect("non-negative window");
        let fetched: Vec<i64> = (skip..total).take(request.fetch_limit() as usize).collect();
        let page = Page::from_overfetch(fetched, request);

        let expected_len = (total - skip).clamp(0, limit) as usize;
        prop_assert_eq!(page.data.len(), expected_len);
        prop_assert_eq!(page.more_exists, total > skip + limit);
        prop_assert!(page.data.iter().all(|row| *row >= skip && *row < skip + limit));
    }
}

#[tokio::test]
async fn five_matching_rows_page_in_twos() {
    let (service, ids) = seeded_service(
        (1..=5)
            .map(|n| house(&n.to_string(), 1000 + n * 100))
            .collect(),
    )
    .await;
    let filter = PropertyFilter::default();

    let first = service
        .list(&filter, PageRequest::new(0, 2).expect("window"))
        .await
        .expect("first page");
    assert_eq!(listing_ids(&first.data), ids[0..2].to_vec());
    assert!(first.more_exists);

    let second = service
        .list(&filter, PageRequest::new(2, 2).expect("window"))
        .await
        .expect("second page");
    assert_eq!(listing_ids(&second.data), ids[2..4].to_vec());
    assert!(second.more_exists);

    let last = service
        .list(&filter, PageRequest::new(4, 2).expect("window"))
        .await
        .expect("last page");
    assert_eq!(listing_ids(&last.data), vec![ids[4]]);
    assert!(!last.more_exists);

    let beyond = service
        .list(&filter, PageRequest::new(10, 2).expect("window"))
        .await
        .expect("empty page");
    assert!(beyond.data.is_empty());
    assert!(!beyond.more_exists);
}

#[tokio::test]
async fn zero_limit_probes_storage_for_a_following_row() {
    let (service, _) = seeded_service(vec![house("1", 900), house("2", 950)]).await;
    let filter = PropertyFilter::default();

    let probe = service
        .list(&filter, PageRequest::new(1, 0).expect("window"))
        .await
        .expect("probe runs");
    assert!(probe.data.is_empty());
    assert!(probe.more_exists);

    let probe = service
        .list(&filter, PageRequest::new(2, 0).expect("window"))
        .await
        .expect("probe runs");
    assert!(!probe.more_exists);
}
