mod common;

use chrono::{DateTime, Duration, Utc};
use common::{token_for, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

const OWNER_ACTIONS: &[&str] = &["create", "list", "listAll", "update"];

fn pix_body(user_id: Uuid, amount: &str) -> Value {
    json!({
        "amount": amount,
        "paymentMethod": "PIX",
        "userId": user_id,
        "pixData": {
            "pixKey": "charge@example.com",
            "expiresAt": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }
    })
}

async fn create_charge(app: &TestApp, token: &str, body: &Value) -> Value {
    let response = app.post_json("/charges", token, body).await;
    assert_eq!(response.status(), 201, "charge creation should succeed");
    response.json().await.unwrap()
}

#[tokio::test]
async fn pix_charge_is_created_pending() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Alice", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let expires_at = Utc::now() + Duration::hours(2);
    let body = json!({
        "amount": "150.75",
        "paymentMethod": "PIX",
        "userId": user_id,
        "description": "Monthly subscription",
        "pixData": { "pixKey": "alice@example.com", "expiresAt": expires_at.to_rfc3339() }
    });

    let envelope = create_charge(&app, &token, &body).await;
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["message"], "Charge created successfully");

    let data = &envelope["data"];
    assert_eq!(data["amount"], "150.75");
    assert_eq!(data["currency"], "BRL");
    assert_eq!(data["paymentMethod"], "PIX");
    assert_eq!(data["status"], "PENDING");
    assert_eq!(data["description"], "Monthly subscription");
    assert!(data["paidAt"].is_null());
    assert_eq!(data["user"]["name"], "Alice");

    let pix = &data["pixData"];
    assert_eq!(pix["pixKey"], "alice@example.com");
    assert!(pix["emvCode"].as_str().unwrap().starts_with("00020126"));
    assert!(!pix["qrCode"].as_str().unwrap().is_empty());

    // The charge expires with its QR code.
    let charge_expiry: DateTime<Utc> = data["expiresAt"].as_str().unwrap().parse().unwrap();
    let pix_expiry: DateTime<Utc> = pix["expiresAt"].as_str().unwrap().parse().unwrap();
    assert_eq!(charge_expiry, pix_expiry);
}

#[tokio::test]
async fn credit_card_charge_computes_installment_amount() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Bruno", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let body = json!({
        "amount": "100.00",
        "paymentMethod": "CREDIT_CARD",
        "userId": user_id,
        "creditCardData": {
            "cardHolderName": "BRUNO M SILVA",
            "cardToken": "tok_visa_test",
            "cardLastDigits": "4242",
            "cardBrand": "visa",
            "installments": 3
        }
    });

    let envelope = create_charge(&app, &token, &body).await;
    let card = &envelope["data"]["creditCardData"];
    assert_eq!(card["installments"], 3);
    assert_eq!(card["installmentAmount"], "33.33");
    assert_eq!(card["cardLastDigits"], "4242");
    // Credit-card charges never expire.
    assert!(envelope["data"]["expiresAt"].is_null());
}

#[tokio::test]
async fn credit_card_installments_default_to_one() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Carla", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let body = json!({
        "amount": "59.90",
        "paymentMethod": "CREDIT_CARD",
        "userId": user_id,
        "creditCardData": {
            "cardHolderName": "CARLA DIAS",
            "cardToken": "tok_master_test",
            "cardLastDigits": "1881",
            "cardBrand": "mastercard"
        }
    });

    let envelope = create_charge(&app, &token, &body).await;
    let card = &envelope["data"]["creditCardData"];
    assert_eq!(card["installments"], 1);
    assert_eq!(card["installmentAmount"], "59.90");
}

#[tokio::test]
async fn boleto_charge_expires_on_due_date() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Diego", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let body = json!({
        "amount": "430.00",
        "paymentMethod": "BOLETO",
        "userId": user_id,
        "boletoData": { "dueDate": "2026-09-30" }
    });

    let envelope = create_charge(&app, &token, &body).await;
    let data = &envelope["data"];

    let boleto = &data["boletoData"];
    assert_eq!(boleto["dueDate"], "2026-09-30");
    let barcode = boleto["barcode"].as_str().unwrap();
    assert_eq!(barcode.len(), 44);
    assert!(barcode.starts_with("2379"));
    assert!(!boleto["digitableLine"].as_str().unwrap().is_empty());
    assert!(boleto["boletoUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://boleto.example.com/"));

    let expires: DateTime<Utc> = data["expiresAt"].as_str().unwrap().parse().unwrap();
    assert_eq!(expires, "2026-09-30T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
}

#[tokio::test]
async fn duplicate_idempotency_key_conflicts() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Elisa", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let key = format!("order-{}", Uuid::new_v4());
    let mut body = pix_body(user_id, "25.00");
    body["idempotencyKey"] = json!(key);

    create_charge(&app, &token, &body).await;

    let response = app.post_json("/charges", &token, &body).await;
    assert_eq!(response.status(), 409);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["message"], "Idempotency key already used");
    assert_eq!(error["statusCode"], 409);
    assert_eq!(error["path"], "/charges");
}

#[tokio::test]
async fn charge_for_unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Fabio", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let body = pix_body(Uuid::new_v4(), "10.00");
    let response = app.post_json("/charges", &token, &body).await;

    assert_eq!(response.status(), 404);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "User not found");
}

#[tokio::test]
async fn missing_payment_data_is_rejected() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Gabi", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let body = json!({
        "amount": "10.00",
        "paymentMethod": "PIX",
        "userId": user_id
    });
    let response = app.post_json("/charges", &token, &body).await;

    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["errors"][0]["field"], "pixData");
}

#[tokio::test]
async fn mismatched_payment_data_is_rejected() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Hugo", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let mut body = pix_body(user_id, "10.00");
    body["boletoData"] = json!({ "dueDate": "2026-09-30" });
    let response = app.post_json("/charges", &token, &body).await;

    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["errors"][0]["field"], "boletoData");
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Iara", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let response = app
        .post_json("/charges", &token, &pix_body(user_id, "0"))
        .await;

    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["errors"][0]["field"], "amount");
}

#[tokio::test]
async fn list_filters_by_user_newest_first() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Joana", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let first = create_charge(&app, &token, &pix_body(user_id, "10.00")).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let second = create_charge(
        &app,
        &token,
        &json!({
            "amount": "20.00",
            "paymentMethod": "BOLETO",
            "userId": user_id,
            "boletoData": { "dueDate": "2026-10-15" }
        }),
    )
    .await;

    // The database is shared between tests, so scope by user.
    let response = app.get(&format!("/charges?userId={user_id}"), &token).await;
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["count"], 2);
    assert_eq!(envelope["data"][0]["id"], second["data"]["id"]);
    assert_eq!(envelope["data"][1]["id"], first["data"]["id"]);

    let response = app
        .get(&format!("/charges?userId={user_id}&paymentMethod=PIX"), &token)
        .await;
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["count"], 1);
    assert_eq!(envelope["data"][0]["id"], first["data"]["id"]);
}

#[tokio::test]
async fn get_charge_by_id() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Kleber", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let created = create_charge(&app, &token, &pix_body(user_id, "75.00")).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app.get(&format!("/charges/{charge_id}"), &token).await;
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["data"]["id"], charge_id);
    assert_eq!(envelope["data"]["amount"], "75.00");

    let response = app
        .get(&format!("/charges/{}", Uuid::new_v4()), &token)
        .await;
    assert_eq!(response.status(), 404);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Charge not found");
}

#[tokio::test]
async fn paying_a_charge_stamps_paid_at() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Luana", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let created = create_charge(&app, &token, &pix_body(user_id, "99.90")).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app
        .patch_json(
            &format!("/charges/{charge_id}/status"),
            &token,
            &json!({ "status": "PAID" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["message"], "Charge status updated successfully");
    assert_eq!(envelope["data"]["status"], "PAID");
    assert!(envelope["data"]["paidAt"].is_string());
}

#[tokio::test]
async fn invalid_transitions_are_rejected() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Marcos", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let created = create_charge(&app, &token, &pix_body(user_id, "42.00")).await;
    let charge_id = created["data"]["id"].as_str().unwrap();
    let status_path = format!("/charges/{charge_id}/status");

    // PENDING cannot be refunded.
    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "REFUNDED" }))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "Cannot change status from PENDING to REFUNDED"
    );

    // PAID cannot go back to PENDING, but can be refunded.
    app.patch_json(&status_path, &token, &json!({ "status": "PAID" }))
        .await;
    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "PENDING" }))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Cannot change status from PAID to PENDING");

    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "REFUNDED" }))
        .await;
    assert_eq!(response.status(), 200);

    // REFUNDED is terminal.
    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "PAID" }))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn cancelling_a_pending_charge_is_terminal() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Nina", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let created = create_charge(&app, &token, &pix_body(user_id, "15.00")).await;
    let charge_id = created["data"]["id"].as_str().unwrap();
    let status_path = format!("/charges/{charge_id}/status");

    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "PAID" }))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "Cannot change status from CANCELLED to PAID"
    );
}

#[tokio::test]
async fn unknown_status_value_is_rejected_with_the_error_envelope() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Paula", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let created = create_charge(&app, &token, &pix_body(user_id, "12.00")).await;
    let charge_id = created["data"]["id"].as_str().unwrap();
    let status_path = format!("/charges/{charge_id}/status");

    let response = app
        .patch_json(&status_path, &token, &json!({ "status": "NOT_A_STATUS" }))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["statusCode"], 400);
    assert_eq!(error["path"], status_path);
}

#[tokio::test]
async fn malformed_json_body_is_rejected_with_the_error_envelope() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Rui", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let response = app
        .client
        .post(format!("{}/charges", app.address))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["statusCode"], 400);
    assert_eq!(error["path"], "/charges");
}

#[tokio::test]
async fn unknown_query_filter_value_is_rejected_with_the_error_envelope() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Sara", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let response = app.get("/charges?status=BOGUS", &token).await;

    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["statusCode"], 400);
}

#[tokio::test]
async fn updating_status_of_unknown_charge_is_not_found() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Otto", None, OWNER_ACTIONS).await;
    let token = token_for(user_id);

    let response = app
        .patch_json(
            &format!("/charges/{}/status", Uuid::new_v4()),
            &token,
            &json!({ "status": "PAID" }),
        )
        .await;
    assert_eq!(response.status(), 404);
}
