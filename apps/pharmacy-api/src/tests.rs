//! Router tests, driven in-process with `oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pharmacy_core::{Role, User};
use pharmacy_db::{new_id, Database, DbConfig};

use crate::auth::hash_password;
use crate::config::ApiConfig;
use crate::{create_router, AppState};

const PASSWORD: &str = "correct horse";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    password_hash: String,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(false).await
    }

    /// An app started with `REQUIRE_VERIFIED_LOGIN=true`.
    async fn requiring_verification() -> Self {
        Self::build(true).await
    }

    async fn build(require_verified_login: bool) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig {
            http_port: 0,
            database_url: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            session_lifetime_secs: 3600,
            db_max_connections: 1,
            require_verified_login,
        };
        let state = Arc::new(AppState::new(db, config));

        TestApp {
            router: create_router(state.clone()),
            state,
            password_hash: hash_password(PASSWORD).await.unwrap(),
        }
    }

    async fn user(&self, role: Role, verified: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: format!("Test {role}"),
            email: format!("{role}-{}@pharmacy.ug", &new_id()[..8]),
            role,
            verified,
            created_at: now,
            updated_at: now,
        };
        self.state
            .db
            .users()
            .insert(&user, &self.password_hash)
            .await
            .unwrap();
        user
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, user: &User) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": user.email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn login_as(&self, role: Role) -> String {
        let user = self.user(role, true).await;
        self.login(&user).await
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_anonymous_requests_are_unauthenticated() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales",
            None,
            Some(json!({ "drug_id": new_id(), "quantity_sold": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = app
        .send(Method::GET, "/api/me", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;
    let active = app.user(Role::Cashier, true).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": active.email, "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@pharmacy.ug", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Emails match exactly; a different case is a different (unknown) account.
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": active.email.to_uppercase(), "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unverified_login_is_allowed_by_default() {
    let app = TestApp::new().await;
    let pending = app.user(Role::Cashier, false).await;

    let token = app.login(&pending).await;
    let (status, body) = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["verified"], false);
}

#[tokio::test]
async fn test_verified_login_gate_when_enabled() {
    let app = TestApp::requiring_verification().await;
    let pending = app.user(Role::Cashier, false).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": pending.email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let active = app.user(Role::Cashier, true).await;
    app.login(&active).await;
}

#[tokio::test]
async fn test_me_lists_permissions_and_logout_ends_session() {
    let app = TestApp::new().await;
    let token = app.login_as(Role::Cashier).await;

    let (status, body) = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "cashier");
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(permissions.contains(&"record_sale"));
    assert!(!permissions.contains(&"record_purchase"));

    let (status, _) = app
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gates_routes() {
    let app = TestApp::new().await;
    let cashier = app.login_as(Role::Cashier).await;
    let supervisor = app.login_as(Role::Supervisor).await;

    let purchase = json!({
        "drug": { "name": "Paracetamol" },
        "supplier": { "name": "Acme Ltd" },
        "quantity_purchased": 10,
        "unit_cost": 300
    });
    let (status, body) = app
        .send(Method::POST, "/api/purchases", Some(&cashier), Some(purchase))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
    assert_eq!(app.state.db.suppliers().count().await.unwrap(), 0);

    let (status, _) = app.send(Method::GET, "/api/users", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Supervisors see the numbers but not the catalog.
    let (status, _) = app
        .send(Method::GET, "/api/summary", Some(&supervisor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::GET, "/api/drugs", Some(&supervisor), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_purchase_sale_and_summary_flow() {
    let app = TestApp::new().await;
    let admin = app.login_as(Role::Admin).await;
    let cashier = app.login_as(Role::Cashier).await;

    let (status, drug) = app
        .send(
            Method::POST,
            "/api/drugs",
            Some(&admin),
            Some(json!({
                "name": "Paracetamol",
                "category": "Pain Relief",
                "price": 500,
                "stock_quantity": 100
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{drug}");
    let drug_id = drug["id"].as_str().unwrap().to_string();

    let (status, receipt) = app
        .send(
            Method::POST,
            "/api/sales",
            Some(&cashier),
            Some(json!({ "drug_id": drug_id, "quantity_sold": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert_eq!(receipt["sale"]["total_price"], 5000);
    assert_eq!(receipt["new_stock"], 90);

    let (status, receipt) = app
        .send(
            Method::POST,
            "/api/purchases",
            Some(&admin),
            Some(json!({
                "drug": { "id": drug_id },
                "supplier": { "name": "Acme Ltd" },
                "quantity_purchased": 50,
                "unit_cost": 300
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert_eq!(receipt["new_stock"], 140);
    assert_eq!(receipt["supplier_created"], true);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales",
            Some(&cashier),
            Some(json!({ "drug_id": drug_id, "quantity_sold": 141 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, summary) = app
        .send(Method::GET, "/api/summary?period=yearly", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["total_income"], 5000);
    assert_eq!(summary["total_expenditure"], 15000);
    assert_eq!(summary["net_profit"], -10000);

    let (status, inventory) = app
        .send(Method::GET, "/api/inventory", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory[0]["supplier_name"], Value::Null);
    assert_eq!(inventory[0]["stock_quantity"], 140);
}

#[tokio::test]
async fn test_summary_at_the_amount_limit() {
    use pharmacy_core::{MAX_LINE_QUANTITY, MAX_UNIT_AMOUNT};

    let app = TestApp::new().await;
    let procurement = app.login_as(Role::Procurement).await;
    let admin = app.login_as(Role::Admin).await;

    let purchase = |cost: i64| {
        json!({
            "drug": { "name": "Insulin Glargine" },
            "supplier": { "name": "Acme Ltd" },
            "quantity_purchased": MAX_LINE_QUANTITY,
            "unit_cost": cost
        })
    };

    for _ in 0..3 {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&procurement),
                Some(purchase(MAX_UNIT_AMOUNT)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/api/purchases",
            Some(&procurement),
            Some(purchase(MAX_UNIT_AMOUNT + 1)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, summary) = app
        .send(Method::GET, "/api/summary?period=daily", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    let spent = 3 * MAX_LINE_QUANTITY * MAX_UNIT_AMOUNT;
    assert_eq!(summary["total_expenditure"], spent);
    assert_eq!(summary["net_profit"], -spent);
}

#[tokio::test]
async fn test_user_administration() {
    let app = TestApp::new().await;
    let admin = app.login_as(Role::Admin).await;
    let founder = app.user(Role::Founder, true).await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Grace Namuli",
                "email": "grace@pharmacy.ug",
                "password": "another horse",
                "role": "pharmacist"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["verified"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Boss",
                "email": "boss@pharmacy.ug",
                "password": "another horse",
                "role": "founder"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{id}/verified"),
            Some(&admin),
            Some(json!({ "verified": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/users/{}", founder.id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Cannot delete the founder account");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let app = TestApp::new().await;
    let user = app.user(Role::Pharmacist, true).await;
    let token = app.login(&user).await;
    let other_device = app.login(&user).await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/me/password",
            Some(&token),
            Some(json!({ "current_password": "guess", "new_password": "brand new horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/me/password",
            Some(&token),
            Some(json!({ "current_password": PASSWORD, "new_password": "brand new horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::GET, "/api/me", Some(&other_device), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new().await;
    let cashier = app.login_as(Role::Cashier).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales",
            Some(&cashier),
            Some(json!({ "drug_id": 42 })),
        )
        .await;
    assert!(status.is_client_error());
    assert_eq!(body["error"]["code"], "bad_request");
}
