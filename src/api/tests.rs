//! Tests for the API module

use super::*;
use crate::config::ApiConfig;
use crate::error::Error;
use crate::pagination::{FetchMode, PageCountPolicy};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPANY: u64 = 42;

fn api_for(server: &MockServer) -> YClientsApi {
    api_with(server, |b| b)
}

fn api_with(
    server: &MockServer,
    tweak: impl FnOnce(crate::config::ApiConfigBuilder) -> crate::config::ApiConfigBuilder,
) -> YClientsApi {
    let builder = ApiConfig::builder("partner", COMPANY, 7)
        .api_url(server.uri())
        .form_url(server.uri());
    YClientsApi::new(tweak(builder).build().unwrap()).unwrap()
}

fn page(ids: std::ops::Range<u64>, total: u64) -> Value {
    let data: Vec<Value> = ids.map(|id| json!({"id": id})).collect();
    json!({"success": true, "data": data, "meta": {"total_count": total}})
}

fn visit(attendance: i64, datetime: &str) -> Value {
    json!({"attendance": attendance, "datetime": datetime})
}

fn ids(records: &[crate::types::Record]) -> Vec<u64> {
    records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_u64))
        .collect()
}

// ============================================================================
// Booking types
// ============================================================================

#[test]
fn test_booking_payload() {
    let request = BookingRequest::new(1, "Ivan Petrov", "79000000000", "ivan@example.com", 55, "2024-05-01T10:00:00+03:00")
        .comment("first visit");

    assert_eq!(
        request.payload(),
        json!({
            "phone": "79000000000",
            "fullname": "Ivan Petrov",
            "email": "ivan@example.com",
            "comment": "first visit",
            "notify_by_email": 0,
            "appointments": [{
                "id": 1,
                "services": [55],
                "staff_id": 0,
                "datetime": "2024-05-01T10:00:00+03:00"
            }]
        })
    );

    let with_staff = request.staff(9).payload();
    assert_eq!(with_staff["appointments"][0]["staff_id"], json!(9));
}

#[test]
fn test_booking_outcome_from_response() {
    assert_eq!(
        BookingOutcome::from_response(&json!({"success": true, "data": []})),
        BookingOutcome::accepted()
    );
    assert_eq!(
        BookingOutcome::from_response(&json!({"errors": {"code": 433, "message": "Slot taken"}})),
        BookingOutcome::rejected("Slot taken")
    );
    assert_eq!(
        BookingOutcome::from_response(&json!({"errors": {"code": 1}})),
        BookingOutcome::rejected("")
    );
    // falsy `errors` is not a rejection
    assert!(BookingOutcome::from_response(&json!({"errors": null})).success);
    assert!(BookingOutcome::from_response(&json!({"errors": []})).success);
    // non-object bodies are accepted
    assert!(BookingOutcome::from_response(&json!([1, 2])).success);
}

// ============================================================================
// Booking form endpoints
// ============================================================================

#[tokio::test]
async fn test_book_success() {
    let server = MockServer::start().await;
    let request = BookingRequest::new(3, "Anna", "79001112233", "anna@example.com", 10, "2024-05-01T10:00:00+03:00")
        .staff(4);

    Mock::given(method("POST"))
        .and(path(format!("/book_record/{COMPANY}/")))
        .and(header("Authorization", "Bearer partner"))
        .and(body_json(request.payload()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 3, "record_id": 900}])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = api_for(&server).book(&request).await.unwrap();
    assert_eq!(outcome, BookingOutcome::accepted());
}

#[tokio::test]
async fn test_book_rejected_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/book_record/{COMPANY}/")))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"errors": {"code": 433, "message": "Selected time is busy"}})),
        )
        .mount(&server)
        .await;

    let request = BookingRequest::new(1, "A", "7", "a@b.c", 1, "2024-05-01T10:00:00+03:00");
    let outcome = api_for(&server).book(&request).await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Selected time is busy");
}

#[tokio::test]
async fn test_book_non_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let request = BookingRequest::new(1, "A", "7", "a@b.c", 1, "2024-05-01T10:00:00+03:00");
    let err = api_for(&server).book(&request).await.unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_staff_and_service_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/staff/{COMPANY}/5")))
        .and(header("Accept", "application/vnd.yclients.v2+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "Olga"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/services/{COMPANY}/8")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8, "title": "Haircut"})))
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.get_staff_info(5).await.unwrap()["name"], json!("Olga"));
    assert_eq!(api.get_service_info(8).await.unwrap()["title"], json!("Haircut"));
}

#[tokio::test]
async fn test_discovery_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/book_staff/{COMPANY}")))
        .and(query_param("service_ids[]", "10"))
        .and(query_param("datetime", "2024-05-01T10:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/book_services/{COMPANY}")))
        .and(query_param("staff_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/book_dates/{COMPANY}")))
        .and(query_param("staff_id", "4"))
        .and(query_param("service_ids[]", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"booking_dates": ["2024-05-01"]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/book_times/{COMPANY}/4/2024-05-01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"time": "10:00"}])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.get_staff(Some(10), Some("2024-05-01T10:00:00")).await.unwrap();
    api.get_services(Some(4), None).await.unwrap();
    let days = api.get_available_days(Some(4), Some(10)).await.unwrap();
    assert_eq!(days["booking_dates"][0], json!("2024-05-01"));
    let times = api.get_available_times(4, "2024-05-01", None).await.unwrap();
    assert_eq!(times[0]["time"], json!("10:00"));
}

#[tokio::test]
async fn test_optional_parameters_are_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/book_services/{COMPANY}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    api_for(&server).get_services(None, None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

// ============================================================================
// User authorization
// ============================================================================

#[tokio::test]
async fn test_login_installs_user_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(query_param("login", "admin"))
        .and(query_param("password", "secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "data": {"user_token": "u-123"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/user/permissions/{COMPANY}")))
        .and(headers("Authorization", vec!["Bearer partner", "User u-123"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"clients": true}})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.login("admin", "secret").await.unwrap();
    assert_eq!(api.authorization().await, "Bearer partner, User u-123");

    let permissions = api.user_permissions().await.unwrap();
    assert_eq!(permissions, json!({"clients": true}));
}

#[tokio::test]
async fn test_update_user_token_replaces_previous() {
    let server = MockServer::start().await;
    let api = api_for(&server);

    api.update_user_token("first").await;
    api.update_user_token("second").await;
    assert_eq!(api.authorization().await, "Bearer partner, User second");
}

#[tokio::test]
async fn test_get_user_token_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false, "data": null, "meta": {"message": "Wrong password"}})))
        .mount(&server)
        .await;

    let err = api_for(&server).get_user_token("a", "b").await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("Wrong password"));
}

#[tokio::test]
async fn test_permissions_without_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/user/permissions/{COMPANY}")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let err = api_for(&server).user_permissions().await.unwrap_err();
    assert!(err.is_decode());
}

// ============================================================================
// Clients and visits
// ============================================================================

#[tokio::test]
async fn test_get_clients_data_all_pages() {
    let server = MockServer::start().await;
    for (page_no, range) in [(1, 0..2), (2, 2..4), (3, 4..5)] {
        Mock::given(method("GET"))
            .and(path(format!("/clients/{COMPANY}")))
            .and(query_param("count", "2"))
            .and(query_param("page", page_no.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(range, 5)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let clients = api_for(&server).get_clients_data(2).await.unwrap();
    assert_eq!(ids(&clients), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_get_clients_data_concurrent_mode() {
    let server = MockServer::start().await;
    for (page_no, range) in [(1, 0..2), (2, 2..4), (3, 4..5)] {
        Mock::given(method("GET"))
            .and(path(format!("/clients/{COMPANY}")))
            .and(query_param("page", page_no.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(range, 5)))
            .mount(&server)
            .await;
    }

    let api = api_with(&server, |b| {
        b.fetch_mode(FetchMode::Concurrent { limit: 2 })
    });
    let clients = api.get_clients_data(2).await.unwrap();
    assert_eq!(ids(&clients), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_get_clients_data_ceil_policy_skips_empty_page() {
    let server = MockServer::start().await;
    for (page_no, range) in [(1, 0..2), (2, 2..4)] {
        Mock::given(method("GET"))
            .and(path(format!("/clients/{COMPANY}")))
            .and(query_param("page", page_no.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(range, 4)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(format!("/clients/{COMPANY}")))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..0, 4)))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_with(&server, |b| b.page_count_policy(PageCountPolicy::Ceil));
    let clients = api.get_clients_data(2).await.unwrap();
    assert_eq!(clients.len(), 4);
}

#[tokio::test]
async fn test_get_clients_data_failure_discards_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..2, 5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = api_for(&server).get_clients_data(2).await.unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_get_clients_data_malformed_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let err = api_for(&server).get_clients_data(2).await.unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_get_visits_for_client_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/records/{COMPANY}")))
        .and(query_param("client_id", "77"))
        .and(query_param("count", "200"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [visit(1, "2024-01-01T10:00:00+03:00")],
            "meta": {"total_count": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let visits = api_for(&server)
        .get_visits_for_client(77, 200, None)
        .await
        .unwrap();
    assert_eq!(visits.len(), 1);
}

#[tokio::test]
async fn test_visits_batch_shares_context() {
    let server = MockServer::start().await;
    for client in [1, 2, 3] {
        Mock::given(method("GET"))
            .and(path(format!("/records/{COMPANY}")))
            .and(query_param("client_id", client.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(client * 10..client * 10 + 1, 1)))
            .mount(&server)
            .await;
    }

    let api = api_for(&server);
    let context = api.open_context().unwrap();
    let visits = api
        .get_visits_data_for_clients_list(&[3, 1, 2], 200, Some(&context))
        .await
        .unwrap();

    assert_eq!(visits.keys().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    assert_eq!(ids(visits.get(&1).unwrap()), vec![10]);
    assert_eq!(context.requests_sent(), 3);
}

#[tokio::test]
async fn test_attended_visits_and_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/records/{COMPANY}")))
        .and(query_param("client_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                visit(2, "2024-03-01T10:00:00+03:00"),
                visit(1, "2024-02-10T10:00:00+03:00"),
                visit(0, "2024-01-01T10:00:00+03:00"),
                visit(-1, "2023-01-01T10:00:00+03:00"),
                visit(1, "2023-12-31T23:30:00-05:00"),
            ],
            "meta": {"total_count": 5}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/records/{COMPANY}")))
        .and(query_param("client_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "meta": {"total_count": 0}})))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let attended = api.get_attended_visits_for_client(1, 200, None).await.unwrap();
    assert_eq!(attended.len(), 2);
    assert_eq!(attended[0]["datetime"], json!("2024-02-10T10:00:00+03:00"));

    let summaries = api
        .get_attended_visits_dates_information(&[1, 2], 200, None)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, 1);
    assert_eq!(summaries[0].visits_number, 2);
    assert_eq!(summaries[0].first_visit, NaiveDate::from_ymd_opt(2023, 12, 31));
    assert_eq!(summaries[0].last_visit, NaiveDate::from_ymd_opt(2024, 2, 10));
    assert_eq!(summaries[1], crate::visits::VisitSummary::empty(2));
}

#[test]
fn test_parse_clients_data_uses_column_policy() {
    let records: Vec<crate::types::Record> = [json!({"id": 1}), json!({"id": 2, "phone": "7"})]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

    let config = ApiConfig::builder("t", 1, 1)
        .column_policy(crate::output::ColumnPolicy::Union)
        .build()
        .unwrap();
    let api = YClientsApi::new(config).unwrap();
    let batch = api.parse_clients_data(&records).unwrap();
    assert_eq!(batch.num_columns(), 2);

    let api = YClientsApi::with_token("t", 1, 1).unwrap();
    let batch = api.parse_clients_data(&records).unwrap();
    assert_eq!(batch.num_columns(), 1);
}
