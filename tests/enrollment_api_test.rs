mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, setup_file_db, spawn_app, spawn_app_with_pool};

async fn create_class(app: &TestApp, seats: i64) -> String {
    let (_, ack) = app
        .send(
            Method::POST,
            "/classes",
            Some(json!({ "instructorEmail": "coach@camp.test", "title": "Canoeing", "seats": seats })),
        )
        .await;
    ack["insertedId"].as_str().expect("insertedId").to_string()
}

fn payment_body(class_id: &str) -> serde_json::Value {
    json!({
        "classId": class_id,
        "userEmail": "kid@camp.test",
        "amount": 20,
        "transactionId": "pi_3Nabc"
    })
}

#[tokio::test]
async fn test_selecting_twice_keeps_both_selections() {
    let app = spawn_app().await;
    let class_id = create_class(&app, 10).await;
    let body = json!({ "userEmail": "kid@camp.test", "classId": class_id, "title": "Canoeing" });

    let (status, first) = app.send(Method::POST, "/classes/select", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = app.send(Method::POST, "/classes/select", Some(body)).await;
    assert_ne!(first["insertedId"], second["insertedId"]);

    let (_, selections) = app.send(Method::GET, "/classes/select/kid@camp.test", None).await;
    let selections = selections.as_array().expect("array");
    assert_eq!(selections.len(), 2);
    assert_eq!(selections[0]["title"], json!("Canoeing"));
}

#[tokio::test]
async fn test_remove_selection() {
    let app = spawn_app().await;
    let (_, ack) = app
        .send(
            Method::POST,
            "/classes/select",
            Some(json!({ "userEmail": "kid@camp.test", "classId": "c1" })),
        )
        .await;
    let id = ack["insertedId"].as_str().expect("insertedId").to_string();

    let (status, ack) = app
        .send(Method::DELETE, &format!("/classes/select/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["deletedCount"], json!(1));

    let (_, selections) = app.send(Method::GET, "/classes/select/kid@camp.test", None).await;
    assert_eq!(selections, json!([]));

    let (status, _) = app.send(Method::DELETE, "/classes/select/garbage", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_payment_takes_one_seat() {
    let app = spawn_app().await;
    let class_id = create_class(&app, 10).await;

    let (status, ack) = app
        .send(Method::POST, "/process-payment", Some(payment_body(&class_id)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(ack["insertedId"].is_string());

    let class = app.find_class(&class_id).await;
    assert_eq!(class.enrolled, 1);
    assert_eq!(class.seats, 9);
    assert_eq!(app.count_payments().await, 1);
}

#[tokio::test]
async fn test_process_payment_with_no_seats_left_still_succeeds() {
    let app = spawn_app().await;
    let class_id = create_class(&app, 0).await;

    let (status, _) = app
        .send(Method::POST, "/process-payment", Some(payment_body(&class_id)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let class = app.find_class(&class_id).await;
    assert_eq!(class.seats, -1);
    assert_eq!(class.enrolled, 1);
}

#[tokio::test]
async fn test_process_payment_for_unknown_class_records_payment() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(Method::POST, "/process-payment", Some(payment_body("gone")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.count_payments().await, 1);

    let (_, history) = app.send(Method::GET, "/payments/kid@camp.test", None).await;
    assert_eq!(history[0]["classId"], json!("gone"));
    assert_eq!(history[0]["transactionRef"], json!("pi_3Nabc"));
}

#[tokio::test]
async fn test_payment_does_not_clear_selection() {
    let app = spawn_app().await;
    let class_id = create_class(&app, 5).await;
    app.send(
        Method::POST,
        "/classes/select",
        Some(json!({ "userEmail": "kid@camp.test", "classId": class_id })),
    )
    .await;

    app.send(Method::POST, "/process-payment", Some(payment_body(&class_id)))
        .await;

    let (_, selections) = app.send(Method::GET, "/classes/select/kid@camp.test", None).await;
    assert_eq!(selections.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_concurrent_payments_do_not_lose_updates() {
    let file_db = setup_file_db(8).await;
    let app = spawn_app_with_pool(file_db.pool.clone());
    let class_id = create_class(&app, 20).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let router = app.router.clone();
        let db = app.db.clone();
        let gateway = app.gateway.clone();
        let body = payment_body(&class_id);
        tasks.push(tokio::spawn(async move {
            let app = TestApp { router, db, gateway };
            app.send(Method::POST, "/process-payment", Some(body)).await.0
        }));
    }
    for task in tasks {
        assert_eq!(task.await.expect("task panicked"), StatusCode::CREATED);
    }

    let class = app.find_class(&class_id).await;
    assert_eq!(class.enrolled, 8);
    assert_eq!(class.seats, 12);
    assert_eq!(app.count_payments().await, 8);
}

#[tokio::test]
async fn test_payment_intent_converts_price_to_minor_units() {
    let app = spawn_app().await;

    let (status, body) = app
        .send(Method::POST, "/create-payment-intent", Some(json!({ "price": 20 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authorizationToken"], json!("pi_test_2000_secret"));
    assert_eq!(app.gateway.calls(), vec![2000]);
}

#[tokio::test]
async fn test_payment_intent_without_price_makes_no_request() {
    let app = spawn_app().await;

    let (status, body) = app
        .send_raw(Method::POST, "/create-payment-intent", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert!(app.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_payment_intent_without_body_makes_no_request() {
    let app = spawn_app().await;

    let (status, body) = app.send_raw(Method::POST, "/create-payment-intent", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert!(app.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_payment_intent_rejects_price_too_large_for_minor_units() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(Method::POST, "/create-payment-intent", Some(json!({ "price": 1e300 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.gateway.calls().is_empty());
}
