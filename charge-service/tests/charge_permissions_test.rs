mod common;

use chrono::{Duration, Utc};
use common::{token_for, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

const ADMIN_ACTIONS: &[&str] = &["create", "list", "listAll", "update"];

fn pix_body(user_id: Uuid) -> Value {
    json!({
        "amount": "50.00",
        "paymentMethod": "PIX",
        "userId": user_id,
        "pixData": {
            "pixKey": "owner@example.com",
            "expiresAt": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }
    })
}

async fn create_charge(app: &TestApp, token: &str, body: &Value) -> Value {
    let response = app.post_json("/charges", token, body).await;
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/charges", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["message"], "Missing or invalid Authorization header");
}

#[tokio::test]
async fn requests_with_an_unknown_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app.get("/charges", "not-a-session").await;

    assert_eq!(response.status(), 401);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Invalid or expired session");
}

#[tokio::test]
async fn creating_without_the_create_capability_is_forbidden() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Reader", None, &["list"]).await;
    let token = token_for(user_id);

    let response = app.post_json("/charges", &token, &pix_body(user_id)).await;

    assert_eq!(response.status(), 403);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "You do not have permission to create charges"
    );
}

#[tokio::test]
async fn listing_without_the_list_all_capability_is_forbidden() {
    let app = TestApp::spawn().await;
    // `list` only covers single-charge reads; the listing needs `listAll`.
    let user_id = app.seed_user("Reader", None, &["create", "list"]).await;
    let token = token_for(user_id);

    let response = app.get("/charges", &token).await;

    assert_eq!(response.status(), 403);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "You do not have permission to list charges"
    );
}

#[tokio::test]
async fn updating_without_the_update_capability_is_forbidden() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("Owner", None, &["create", "list"]).await;
    let owner_token = token_for(owner);

    let created = create_charge(&app, &owner_token, &pix_body(owner)).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app
        .patch_json(
            &format!("/charges/{charge_id}/status"),
            &owner_token,
            &json!({ "status": "PAID" }),
        )
        .await;

    assert_eq!(response.status(), 403);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "You do not have permission to update charges"
    );
}

#[tokio::test]
async fn owners_cannot_view_charges_of_others() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("Owner", None, &["create", "list"]).await;
    let other = app.seed_user("Other", None, &["list"]).await;

    let created = create_charge(&app, &token_for(owner), &pix_body(owner)).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    // The charge exists, but ownership wins over existence.
    let response = app
        .get(&format!("/charges/{charge_id}"), &token_for(other))
        .await;

    assert_eq!(response.status(), 403);
    let error: Value = response.json().await.unwrap();
    assert_eq!(
        error["message"],
        "You do not have permission to view this charge"
    );
}

#[tokio::test]
async fn admins_can_view_any_charge() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("Owner", None, &["create", "list"]).await;
    let admin = app.seed_user("Admin", Some("admin"), ADMIN_ACTIONS).await;

    let created = create_charge(&app, &token_for(owner), &pix_body(owner)).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app
        .get(&format!("/charges/{charge_id}"), &token_for(admin))
        .await;

    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["data"]["id"], charge_id);
    assert_eq!(envelope["data"]["userId"], owner.to_string());
}

#[tokio::test]
async fn list_all_holders_can_list_any_users_charges() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("Owner", None, &["create", "list"]).await;
    // `listAll` alone is enough; the listing does not require the admin role.
    let lister = app.seed_user("Lister", None, &["listAll"]).await;

    let created = create_charge(&app, &token_for(owner), &pix_body(owner)).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app
        .get(&format!("/charges?userId={owner}"), &token_for(lister))
        .await;
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["count"], 1);
    assert_eq!(envelope["data"][0]["id"], charge_id);
    assert_eq!(envelope["data"][0]["userId"], owner.to_string());
}

#[tokio::test]
async fn list_all_does_not_grant_single_charge_reads() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("Owner", None, &["create", "list"]).await;
    // Single-charge reads resolve admin-first (role + listAll), then owner
    // (list + ownership); bare listAll matches neither branch.
    let lister = app.seed_user("Lister", None, &["listAll"]).await;

    let created = create_charge(&app, &token_for(owner), &pix_body(owner)).await;
    let charge_id = created["data"]["id"].as_str().unwrap();

    let response = app
        .get(&format!("/charges/{charge_id}"), &token_for(lister))
        .await;
    assert_eq!(response.status(), 403);
}
