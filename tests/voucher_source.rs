use serde_json::{json, Value};
use voucher_distributor::config::VoucherSourceConfig;
use voucher_distributor::models::ArrivalPeriod;
use voucher_distributor::source::VoucherQuery;
use voucher_distributor::{FetchError, RecordSource, VoucherApiClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/api/v1.0/voucher/";

fn client(server: &MockServer) -> VoucherApiClient {
    client_with_page_size(server, 2)
}

fn client_with_page_size(server: &MockServer, page_size: usize) -> VoucherApiClient {
    VoucherApiClient::new(&VoucherSourceConfig {
        url: server.uri(),
        status_code: "2".to_string(),
        page_size,
        max_attempts: 3,
        backoff_ms: 1,
        timeout_secs: 5,
    })
    .unwrap()
}

fn row(id: i64) -> Value {
    json!({
        "id": id,
        "sanatorium_id": 1,
        "organization_id": null,
        "number": 500 + id,
        "date_begin": "2021-06-01",
        "date_end": "2021-06-22",
        "duration": 21,
        "arrival_number": 1,
        "status": {"code": 2}
    })
}

fn page(ids: &[i64], total: usize) -> ResponseTemplate {
    let rows: Vec<Value> = ids.iter().map(|&id| row(id)).collect();
    ResponseTemplate::new(200).set_body_json(json!({"rows": rows, "total": total}))
}

fn query() -> VoucherQuery {
    VoucherQuery {
        facility_ids: vec![1, 2],
        period: Some(ArrivalPeriod {
            from: "2021-06-01".parse().unwrap(),
            to: "2021-08-31".parse().unwrap(),
        }),
    }
}

#[tokio::test]
async fn walks_pages_until_the_reported_total() {
    let server = MockServer::start().await;
    for (offset, ids) in [("0", vec![1, 2]), ("2", vec![3, 4]), ("4", vec![5])] {
        Mock::given(method("GET"))
            .and(path(LISTING))
            .and(query_param("offset", offset))
            .and(query_param("limit", "2"))
            .and(query_param("status__code", "2"))
            .and(query_param("sanatorium_id__in", "1,2"))
            .and(query_param("date_begin__gte", "2021-06-01"))
            .and(query_param("date_begin__lte", "2021-08-31"))
            .respond_with(page(&ids, 5))
            .expect(1)
            .mount(&server)
            .await;
    }

    let vouchers = client(&server).fetch(&query()).await.unwrap();
    let ids: Vec<i64> = vouchers.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(vouchers.iter().all(|v| v.facility_id == 1 && v.status.is_none()));
}

#[tokio::test]
async fn short_pages_from_a_capped_limit_still_complete() {
    let server = MockServer::start().await;
    for offset in [0, 2, 4, 6, 8] {
        Mock::given(method("GET"))
            .and(path(LISTING))
            .and(query_param("limit", "4"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(page(&[offset + 1, offset + 2], 10))
            .expect(1)
            .mount(&server)
            .await;
    }

    let vouchers = client_with_page_size(&server, 4).fetch(&query()).await.unwrap();
    let ids: Vec<i64> = vouchers.iter().map(|v| v.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn empty_listing_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(page(&[], 0))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).fetch(&query()).await.unwrap().is_empty());
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(page(&[1], 1))
        .expect(1)
        .mount(&server)
        .await;

    let vouchers = client(&server).fetch(&query()).await.unwrap();
    assert_eq!(vouchers.len(), 1);
}

#[tokio::test]
async fn persistent_failures_surface_after_the_last_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).fetch(&query()).await.unwrap_err();
    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                *last,
                FetchError::Status { status: 503, ref body } if body == "maintenance"
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch(&query()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 400, .. }));
}

#[tokio::test]
async fn stalled_listing_does_not_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("offset", "0"))
        .respond_with(page(&[1, 2], 10))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("offset", "2"))
        .respond_with(page(&[], 10))
        .mount(&server)
        .await;

    let err = client(&server).fetch(&query()).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::PaginationDidNotTerminate {
            fetched: 2,
            total: 10,
            pages: 2
        }
    ));
}

#[tokio::test]
async fn undecodable_page_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch(&query()).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}
