//! `StripeClient` against a mocked Stripe API.

use relay_billing::{BillingApi, BillingError, BillingResource, StripeClient};
use serde_json::json;
use wiremock::{
    matchers::{body_string, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> StripeClient {
    match StripeClient::with_client(reqwest::Client::new(), &server.uri(), "sk_test_relay") {
        Ok(c) => c,
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn create_posts_bracket_encoded_form_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/customers"))
        .and(header("authorization", "Bearer sk_test_relay"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("email=jane%40example.com&metadata%5Btier%5D=gold"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "object": "customer",
            "email": "jane@example.com",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create(
            BillingResource::Customers,
            &json!({"email": "jane@example.com", "metadata": {"tier": "gold"}}),
        )
        .await;
    match created {
        Ok(v) => assert_eq!(v["id"], "cus_123"),
        Err(e) => panic!("create failed: {e}"),
    }
}

#[tokio::test]
async fn list_forwards_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/invoices"))
        .and(query_param("customer", "cus_123"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "url": "/v1/invoices",
            "has_more": false,
            "data": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .list(BillingResource::Invoices, Some("customer=cus_123&limit=2"))
        .await;
    match page {
        Ok(v) => assert_eq!(v["object"], "list"),
        Err(e) => panic!("list failed: {e}"),
    }
}

#[tokio::test]
async fn payments_are_retrieved_as_payment_intents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_42",
            "object": "payment_intent",
            "amount": 2000,
            "currency": "usd",
            "status": "requires_payment_method",
        })))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).retrieve(BillingResource::Payments, "pi_42").await {
        Ok(v) => assert_eq!(v["amount"], 2000),
        Err(e) => panic!("retrieve failed: {e}"),
    }
}

#[tokio::test]
async fn stripe_error_object_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "resource_missing",
                "message": "No such customer: 'cus_missing'",
                "param": "id",
                "type": "invalid_request_error",
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).retrieve(BillingResource::Customers, "cus_missing").await {
        Err(BillingError::Stripe { status, error }) => {
            assert_eq!(status, 404);
            assert_eq!(error.message, "No such customer: 'cus_missing'");
            assert_eq!(error.code.as_deref(), Some("resource_missing"));
            assert_eq!(error.kind.as_deref(), Some("invalid_request_error"));
        }
        other => panic!("expected Stripe error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_failure_falls_back_to_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/invoices/in_1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).retrieve(BillingResource::Invoices, "in_1").await {
        Err(err @ BillingError::Stripe { .. }) => {
            assert_eq!(err.to_string(), "Request failed with status code 502");
        }
        other => panic!("expected Stripe error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_object_create_body_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server)
        .create(BillingResource::Payments, &json!(["not", "an", "object"]))
        .await;
    assert!(matches!(result, Err(BillingError::InvalidRequest(_))));
}
