//! Role dashboards through the full router.

use axum::http::StatusCode;
use httpmock::Method::HEAD;
use httpmock::prelude::*;
use serde_json::json;

use scorekeep_core::Role;
use scorekeep_integration_tests::{SERVICE_KEY, TestApp, USER_ID};

const STORE_A: &str = "5b7f2a8e-3c1d-4e9f-8a6b-2d4c6e8f0a1b";
const STORE_B: &str = "0c4e6a8b-2d1f-4a3c-9e5b-7f6d8c0a2e4b";
const RATER_ID: &str = "1f0c6a4e-7d2b-4c8a-b1e3-5a9d7c2e4f60";
const NEW_ID: &str = "3e5a7c9b-1d2f-4b6a-8c0e-9f1a3b5c7d9e";

fn stores_with_ratings() -> serde_json::Value {
    json!([
        {
            "id": STORE_A,
            "name": "Corner Books",
            "email": "hello@cornerbooks.test",
            "address": "12 High Street",
            "owner_id": null,
            "ratings": [
                { "rating": 4, "user_id": USER_ID },
                { "rating": 3, "user_id": RATER_ID }
            ]
        },
        {
            "id": STORE_B,
            "name": "Harbour Fish Bar",
            "email": "orders@harbourfish.test",
            "address": "3 Quay Road",
            "owner_id": null,
            "ratings": []
        }
    ])
}

// ============================================================================
// User dashboard
// ============================================================================

#[tokio::test]
async fn test_user_dashboard_lists_stores_with_own_rating() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/stores")
            .query_param("select", "*,ratings(rating,user_id)")
            .header("authorization", "Bearer user-token");
        then.status(200).json_body(stores_with_ratings());
    });

    let page = app.get("/user").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Corner Books"));
    assert!(page.body.contains("Overall 3.5"));
    assert!(page.body.contains("Harbour Fish Bar"));
    assert!(page.body.contains("Not rated"));
    assert!(page.body.contains("Update Rating"));
}

#[tokio::test]
async fn test_user_dashboard_filters_by_address() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(stores_with_ratings());
    });

    let page = app.get("/user?q=quay").await;

    assert!(page.body.contains("Harbour Fish Bar"));
    assert!(!page.body.contains("Corner Books"));
}

#[tokio::test]
async fn test_user_dashboard_load_failure_shows_toast() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(500).json_body(json!({ "message": "boom" }));
    });

    let page = app.get("/user").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Failed to load stores"));
}

#[tokio::test]
async fn test_submit_rating_upserts() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    let upsert = app.backend.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/ratings")
            .query_param("on_conflict", "user_id,store_id")
            .json_body(json!({ "user_id": USER_ID, "store_id": STORE_A, "rating": 5 }));
        then.status(201);
    });
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(stores_with_ratings());
    });

    let response = app
        .post_form("/user/ratings", &[("store_id", STORE_A), ("rating", "5")])
        .await;
    assert_eq!(response.location(), Some("/user"));
    upsert.assert();

    let page = app.get("/user").await;
    assert!(page.body.contains("Rating submitted successfully"));
}

#[tokio::test]
async fn test_rating_out_of_range_is_not_sent() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    let upsert = app.backend.mock(|when, then| {
        when.method(POST).path("/rest/v1/ratings");
        then.status(201);
    });

    let response = app
        .post_form("/user/ratings", &[("store_id", STORE_A), ("rating", "6")])
        .await;

    assert_eq!(response.location(), Some("/user"));
    upsert.assert_hits(0);
}

#[tokio::test]
async fn test_weak_password_is_refused() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;
    let update = app.backend.mock(|when, then| {
        when.method(PUT).path("/auth/v1/user");
        then.status(200).json_body(json!({ "id": USER_ID }));
    });
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(json!([]));
    });

    app.post_form("/user/password", &[("password", "aaaaaaaa")])
        .await;
    update.assert_hits(0);

    let page = app.get("/user").await;
    assert!(page.body.contains(
        "Password must be 8-16 characters with 1 uppercase and 1 special character"
    ));
}

// ============================================================================
// Role guard
// ============================================================================

#[tokio::test]
async fn test_wrong_role_gets_access_denied_page() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::User), "A Perfectly Reasonable Name")
        .await;

    let page = app.get("/admin").await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
    assert!(page.body.contains("Access Denied"));
    assert!(page.body.contains("Your current role"));
    assert!(page.body.contains("admin"));

    let page = app.get("/store-owner").await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
    assert!(page.body.contains("store owner"));
}

// ============================================================================
// Store owner dashboard
// ============================================================================

#[tokio::test]
async fn test_store_owner_sees_ratings_newest_first() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::StoreOwner), "Owner Of Corner Books Ltd")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/stores")
            .query_param("owner_id", format!("eq.{USER_ID}"));
        then.status(200).json_body(json!([{
            "id": STORE_A,
            "name": "Corner Books",
            "email": "hello@cornerbooks.test",
            "address": "12 High Street",
            "owner_id": USER_ID
        }]));
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/ratings")
            .query_param("store_id", format!("eq.{STORE_A}"))
            .query_param("order", "created_at.desc");
        then.status(200).json_body(json!([
            {
                "id": "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d",
                "user_id": RATER_ID,
                "store_id": STORE_A,
                "rating": 2,
                "created_at": "2024-03-07T09:30:00+00:00"
            }
        ]));
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/profiles")
            .query_param("user_id", format!("in.({RATER_ID})"));
        then.status(200).json_body(json!([]));
    });

    let page = app.get("/store-owner").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Store Owner Dashboard"));
    assert!(page.body.contains("Corner Books"));
    assert!(page.body.contains("Anonymous"));
    assert!(page.body.contains("3/7/2024"));
    assert!(page.body.contains("Update Password"));
    assert!(!page.body.contains("Admin Access"));
}

#[tokio::test]
async fn test_store_owner_without_store() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::StoreOwner), "Owner Of Corner Books Ltd")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(json!([]));
    });

    let page = app.get("/store-owner").await;

    assert!(page.body.contains("No Store Found"));
    assert!(page.body.contains("have a store assigned to your account"));
}

#[tokio::test]
async fn test_admin_manages_store_owner_page() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/stores")
            .query_param("order", "name.asc");
        then.status(200).json_body(json!([]));
    });

    let page = app.get("/store-owner").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Store Owner Profile Management"));
    assert!(page.body.contains("Admin Access"));
    assert!(page.body.contains("No stores are currently registered in the system."));
    assert!(!page.body.contains("Update Password"));
}

#[tokio::test]
async fn test_admin_cannot_change_password_from_store_owner_page() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;
    let update = app.backend.mock(|when, then| {
        when.method(PUT).path("/auth/v1/user");
        then.status(200).json_body(json!({ "id": USER_ID }));
    });

    let page = app
        .post_form("/store-owner/password", &[("password", "N3w!Passw0rd")])
        .await;

    assert_eq!(page.status, StatusCode::FORBIDDEN);
    assert!(page.body.contains("Access Denied"));
    assert!(page.body.contains("store owner"));
    update.assert_hits(0);
}

// ============================================================================
// Admin dashboard
// ============================================================================

#[tokio::test]
async fn test_admin_dashboard_totals_and_directory() {
    let mut app = TestApp::with_service_key();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;

    for (table, total) in [("profiles", "2"), ("stores", "2"), ("ratings", "17")] {
        app.backend.mock(|when, then| {
            when.method(HEAD).path(format!("/rest/v1/{table}"));
            then.status(200)
                .header("content-range", format!("0-0/{total}"));
        });
    }
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/profiles")
            .query_param("order", "name.asc");
        then.status(200).json_body(json!([
            { "user_id": USER_ID, "name": "Administrator Of ScoreKeep", "address": "1 Admin Way" },
            { "user_id": RATER_ID, "name": "Regular Reviewer Of Shops", "address": "9 Side Street" }
        ]));
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/user_roles")
            .query_param("select", "user_id,role");
        then.status(200).json_body(json!([
            { "user_id": USER_ID, "role": "admin" },
            { "user_id": RATER_ID, "role": "user" }
        ]));
    });
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(stores_with_ratings());
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path(format!("/auth/v1/admin/users/{RATER_ID}"))
            .header("apikey", SERVICE_KEY);
        then.status(200)
            .json_body(json!({ "id": RATER_ID, "email": "reviewer@example.com" }));
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path(format!("/auth/v1/admin/users/{USER_ID}"))
            .header("apikey", SERVICE_KEY);
        then.status(404).json_body(json!({ "msg": "User not found" }));
    });

    let page = app.get("/admin?role=user").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("17"));
    assert!(page.body.contains("Regular Reviewer Of Shops"));
    assert!(page.body.contains("reviewer@example.com"));
    assert!(!page.body.contains("1 Admin Way"));
    assert!(page.body.contains("Harbour Fish Bar"));
}

#[tokio::test]
async fn test_admin_create_user_sets_role_of_new_account() {
    let mut app = TestApp::with_service_key();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;
    let create = app.backend.mock(|when, then| {
        when.method(POST)
            .path("/auth/v1/admin/users")
            .header("apikey", SERVICE_KEY);
        then.status(200)
            .json_body(json!({ "id": NEW_ID, "email": "owner@example.com" }));
    });
    let set_role = app.backend.mock(|when, then| {
        when.method(PATCH)
            .path("/rest/v1/user_roles")
            .query_param("user_id", format!("eq.{NEW_ID}"))
            .header("authorization", "Bearer user-token")
            .json_body(json!({ "role": "store_owner" }));
        then.status(200)
            .json_body(json!([{ "user_id": NEW_ID, "role": "store_owner" }]));
    });

    let response = app
        .post_form(
            "/admin/users",
            &[
                ("name", "Owner Of Corner Books Ltd"),
                ("email", "owner@example.com"),
                ("address", "12 High Street"),
                ("password", "Str0ng!Pass"),
                ("role", "store_owner"),
            ],
        )
        .await;

    assert_eq!(response.location(), Some("/admin"));
    create.assert();
    set_role.assert();
}

#[tokio::test]
async fn test_admin_create_store_validates_name() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;
    let insert = app.backend.mock(|when, then| {
        when.method(POST).path("/rest/v1/stores");
        then.status(201).json_body(json!([]));
    });

    let long_name = "x".repeat(101);
    let response = app
        .post_form(
            "/admin/stores",
            &[
                ("name", long_name.as_str()),
                ("email", "hello@cornerbooks.test"),
                ("address", "12 High Street"),
                ("owner_id", ""),
            ],
        )
        .await;

    assert_eq!(response.location(), Some("/admin"));
    insert.assert_hits(0);
}

#[tokio::test]
async fn test_admin_creates_store_with_owner() {
    let mut app = TestApp::new();
    app.sign_in_as(Some(Role::Admin), "Administrator Of ScoreKeep")
        .await;
    let insert = app.backend.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/stores")
            .header("authorization", "Bearer user-token")
            .header("prefer", "return=representation")
            .json_body(json!({
                "name": "Corner Books",
                "email": "hello@cornerbooks.test",
                "address": "12 High Street",
                "owner_id": RATER_ID
            }));
        then.status(201).json_body(json!([{
            "id": STORE_A,
            "name": "Corner Books",
            "email": "hello@cornerbooks.test",
            "address": "12 High Street",
            "owner_id": RATER_ID
        }]));
    });

    let response = app
        .post_form(
            "/admin/stores",
            &[
                ("name", "  Corner Books "),
                ("email", "hello@cornerbooks.test"),
                ("address", "12 High Street"),
                ("owner_id", RATER_ID),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin"));
    insert.assert();

    for table in ["profiles", "stores", "ratings"] {
        app.backend.mock(|when, then| {
            when.method(HEAD).path(format!("/rest/v1/{table}"));
            then.status(200).header("content-range", "*/0");
        });
    }
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/profiles").query_param("order", "name.asc");
        then.status(200).json_body(json!([]));
    });
    app.backend.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/user_roles")
            .query_param("select", "user_id,role");
        then.status(200).json_body(json!([]));
    });
    app.backend.mock(|when, then| {
        when.method(GET).path("/rest/v1/stores");
        then.status(200).json_body(json!([]));
    });

    let page = app.get("/admin").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Store created successfully"));
    assert!(!page.body.contains("Failed to load dashboard data"));
}
