// storefront/tests/webhook_tests.rs
mod common;

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use common::*;
use storefront::db::OrderStore;
use storefront::models::OrderStatus;
use storefront::services::signature::{self, SIGNATURE_HEADER};
use storefront::web::configure_app_routes;

fn webhook_request(payload: Vec<u8>, header: Option<String>) -> test::TestRequest {
  let req = test::TestRequest::post()
    .uri("/api/v1/webhook")
    .insert_header(("content-type", "application/json"))
    .set_payload(payload);
  match header {
    Some(h) => req.insert_header((SIGNATURE_HEADER, h)),
    None => req,
  }
}

/// Posts a webhook delivery and returns its status and JSON body.
macro_rules! deliver {
  ($service:expr, $payload:expr, $header:expr) => {{
    let resp = test::call_service(&$service, webhook_request($payload, $header).to_request()).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
  }};
}

macro_rules! init_app {
  ($test_app:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($test_app.state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
async fn test_invalid_signature_is_rejected_without_effect() {
  let app = TestApp::new();
  let order = app.pending_order(None).await;
  let service = init_app!(app);

  let payload = session_event("checkout.session.completed", &order.id.to_string(), Some("pi_1"));
  let forged = signature::sign(&payload, "whsec_wrong", Utc::now().timestamp()).unwrap();
  let (status, body) = deliver!(service, payload, Some(forged));

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Invalid signature" }));
  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Pending);
  assert_eq!(stored.stripe_payment_intent_id, None);
}

#[actix_web::test]
async fn test_missing_or_stale_signature_is_rejected() {
  let app = TestApp::new();
  let order = app.pending_order(None).await;
  let service = init_app!(app);

  let payload = session_event("checkout.session.completed", &order.id.to_string(), None);
  let (status, _) = deliver!(service, payload.clone(), None);
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let stale = signature::sign(&payload, WEBHOOK_SECRET, Utc::now().timestamp() - 3600).unwrap();
  let (status, _) = deliver!(service, payload.clone(), Some(stale));
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let header = sign_now(&payload);
  let mut tampered = payload.clone();
  tampered.extend_from_slice(b" ");
  let (status, _) = deliver!(service, tampered, Some(header));
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Pending);
}

#[actix_web::test]
async fn test_completed_session_marks_order_paid() {
  let app = TestApp::new();
  let order = app.pending_order(None).await;
  let service = init_app!(app);

  let payload = session_event("checkout.session.completed", &order.id.to_string(), Some("pi_123"));
  let header = sign_now(&payload);
  let (status, body) = deliver!(service, payload, Some(header));

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "received": true }));
  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Paid);
  assert_eq!(stored.stripe_payment_intent_id.as_deref(), Some("pi_123"));
}

#[actix_web::test]
async fn test_duplicate_delivery_is_a_no_op() {
  let app = TestApp::new();
  let order = app.pending_order(None).await;
  let service = init_app!(app);

  let payload = session_event("checkout.session.completed", &order.id.to_string(), Some("pi_123"));
  let (first, _) = deliver!(service, payload.clone(), Some(sign_now(&payload)));
  let paid_at = app.store.get_order(order.id).await.unwrap().unwrap().updated_at;
  let (second, body) = deliver!(service, payload.clone(), Some(sign_now(&payload)));

  assert_eq!(first, StatusCode::OK);
  assert_eq!(second, StatusCode::OK);
  assert_eq!(body, json!({ "received": true }));
  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Paid);
  assert_eq!(stored.updated_at, paid_at);
}

#[actix_web::test]
async fn test_expired_session_cancels_pending_order() {
  let app = TestApp::new();
  let order = app.pending_order(None).await;
  let service = init_app!(app);

  let payload = session_event("checkout.session.expired", &order.id.to_string(), None);
  let (status, _) = deliver!(service, payload.clone(), Some(sign_now(&payload)));

  assert_eq!(status, StatusCode::OK);
  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Cancelled);
}

#[actix_web::test]
async fn test_payment_failure_is_matched_by_payment_intent() {
  let app = TestApp::new();
  let order = app.pending_order(Some("pi_fail_1")).await;
  let other = app.pending_order(Some("pi_other")).await;
  let service = init_app!(app);

  let payload = payment_failed_event("pi_fail_1");
  let (status, _) = deliver!(service, payload.clone(), Some(sign_now(&payload)));

  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    app.store.get_order(order.id).await.unwrap().unwrap().status,
    OrderStatus::Failed
  );
  assert_eq!(
    app.store.get_order(other.id).await.unwrap().unwrap().status,
    OrderStatus::Pending
  );
}

#[actix_web::test]
async fn test_payment_failure_reaches_order_created_by_checkout() {
  let app = TestApp::new();
  app.seed_product("prod_a", 1999, "USD").await;
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .set_json(checkout_body(&[("prod_a", 1)]))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let order_id: Uuid = body["orderId"].as_str().unwrap().parse().unwrap();

  let stored = app.store.get_order(order_id).await.unwrap().unwrap();
  let payment_intent = stored.stripe_payment_intent_id.expect("payment intent recorded at checkout");

  let payload = payment_failed_event(&payment_intent);
  let (status, _) = deliver!(service, payload.clone(), Some(sign_now(&payload)));

  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    app.store.get_order(order_id).await.unwrap().unwrap().status,
    OrderStatus::Failed
  );
}

#[actix_web::test]
async fn test_terminal_orders_never_move_again() {
  let app = TestApp::new();
  let order = app.pending_order(Some("pi_9")).await;
  let service = init_app!(app);

  let completed = session_event("checkout.session.completed", &order.id.to_string(), Some("pi_9"));
  deliver!(service, completed.clone(), Some(sign_now(&completed)));

  let expired = session_event("checkout.session.expired", &order.id.to_string(), None);
  let (status, _) = deliver!(service, expired.clone(), Some(sign_now(&expired)));
  assert_eq!(status, StatusCode::OK);

  let failed = payment_failed_event("pi_9");
  let (status, _) = deliver!(service, failed.clone(), Some(sign_now(&failed)));
  assert_eq!(status, StatusCode::OK);

  let stored = app.store.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Paid);
}

#[actix_web::test]
async fn test_unknown_orders_and_event_types_are_acknowledged() {
  let app = TestApp::new();
  let service = init_app!(app);

  let unknown_order = session_event("checkout.session.completed", &Uuid::new_v4().to_string(), None);
  let (status, body) = deliver!(service, unknown_order.clone(), Some(sign_now(&unknown_order)));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "received": true }));

  let malformed_ref = session_event("checkout.session.completed", "not-a-uuid", None);
  let (status, _) = deliver!(service, malformed_ref.clone(), Some(sign_now(&malformed_ref)));
  assert_eq!(status, StatusCode::OK);

  let other = json!({ "id": "evt_x", "type": "customer.created", "data": { "object": {} } })
    .to_string()
    .into_bytes();
  let (status, _) = deliver!(service, other.clone(), Some(sign_now(&other)));
  assert_eq!(status, StatusCode::OK);

  assert!(app.all_orders().await.is_empty());
}

#[actix_web::test]
async fn test_signed_but_malformed_body_is_a_client_error() {
  let app = TestApp::new();
  let service = init_app!(app);

  let payload = b"{not json".to_vec();
  let (status, body) = deliver!(service, payload.clone(), Some(sign_now(&payload)));

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some_and(|m| m.starts_with("Malformed webhook event")));
}

#[actix_web::test]
async fn test_bad_signature_wins_over_malformed_body() {
  let app = TestApp::new();
  let service = init_app!(app);

  let payload = b"{not json".to_vec();
  let forged = signature::sign(&payload, "whsec_wrong", Utc::now().timestamp()).unwrap();
  let (status, body) = deliver!(service, payload, Some(forged));

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Invalid signature" }));
}

#[actix_web::test]
async fn test_checkout_then_webhook_round_trip() {
  let app = TestApp::new();
  app.seed_product("prod_a", 1999, "USD").await;
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .set_json(checkout_body(&[("prod_a", 2)]))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["orderId"].as_str().unwrap().to_string();

  let payload = session_event("checkout.session.completed", &order_id, Some("pi_rt"));
  let (status, _) = deliver!(service, payload.clone(), Some(sign_now(&payload)));
  assert_eq!(status, StatusCode::OK);

  let order_id: Uuid = order_id.parse().unwrap();
  let stored = app.store.get_order(order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Paid);
  assert_eq!(stored.total_amount, 3998);
}
