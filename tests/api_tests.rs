//! HTTP surface tests: requests go through the full router and middleware
//! stack against the in-memory store

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use loanlink_server::config::{Config, DuplicateEmailPolicy, Environment, StoreBackend};
    use loanlink_server::models::{NewUser, UserRole};
    use loanlink_server::store::{MemoryStore, UserStore};
    use loanlink_server::{build_router, AppState};

    fn test_config() -> Config {
        Config {
            environment: Environment::Development,
            store_backend: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            store_timeout: Duration::from_secs(5),
            port: 0,
            jwt_secret: "api-test-secret".to_string(),
            bcrypt_cost: 4,
            duplicate_email_policy: DuplicateEmailPolicy::Conflict,
            cors_allowed_origins: None,
            static_dir: None,
            log_level: "debug".to_string(),
        }
    }

    fn setup() -> (Router, Arc<MemoryStore>) {
        setup_with(test_config())
    }

    fn setup_with(config: Config) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), &config), &config);
        (app, store)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn seed(store: &MemoryStore, email: &str, role: UserRole) {
        store
            .insert_user(NewUser {
                email: email.to_string(),
                name: None,
                photo_url: None,
                password_hash: None,
                role,
            })
            .await
            .unwrap();
    }

    async fn token_for(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_banner() {
        let (app, _) = setup();

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404_behind_static_assets() {
        let dir = std::env::temp_dir().join(format!("loanlink-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>app</html>").unwrap();
        let (app, _) = setup_with(Config {
            static_dir: Some(dir.to_string_lossy().into_owned()),
            ..test_config()
        });

        let (status, body) = send(&app, Method::GET, "/api/lonas", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let response = app
            .clone()
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>app</html>");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_register_login_and_cookie_session() {
        let (app, _) = setup();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Rahim",
                "email": "rahim@example.com",
                "password": "secret1",
                "role": "admin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "borrower");
        assert!(body.get("passwordHash").is_none());

        let login = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": "rahim@example.com", "password": "secret1" }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let me = Request::get("/api/auth/me")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(me).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let profile: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(profile["email"], "rahim@example.com");
    }

    #[tokio::test]
    async fn test_bad_credentials_and_tokens() {
        let (app, _) = setup();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

        let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(&app, Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_application_flow_over_http() {
        let (app, store) = setup();
        seed(&store, "mo@example.com", UserRole::Manager).await;
        let borrower = token_for(&app, "bo@example.com").await;
        let manager = token_for(&app, "mo@example.com").await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/applications",
            Some(&borrower),
            Some(json!({ "requestedAmount": 5000, "purpose": "medical" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "Pending");
        assert_eq!(created["fee_status"], "Unpaid");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/applications/{}/approve", id),
            Some(&borrower),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, approved) = send(
            &app,
            Method::PATCH,
            &format!("/api/applications/{}/approve", id),
            Some(&manager),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "Approved");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/applications/{}/reject", id),
            Some(&manager),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, listed) = send(
            &app,
            Method::GET,
            "/api/applications?status=Approved&page=1&limit=10",
            Some(&manager),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, mine) = send(
            &app,
            Method::GET,
            "/api/applications/mine",
            Some(&borrower),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine[0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_catalog_over_http() {
        let (app, store) = setup();
        seed(&store, "mo@example.com", UserRole::Manager).await;
        seed(&store, "ad@example.com", UserRole::Admin).await;
        let manager = token_for(&app, "mo@example.com").await;
        let admin = token_for(&app, "ad@example.com").await;

        let (status, offer) = send(
            &app,
            Method::POST,
            "/api/loans",
            Some(&manager),
            Some(json!({
                "title": "Starter",
                "interestRate": 9.5,
                "minAmount": 500,
                "maxAmount": 5000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = offer["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/loans",
            Some(&manager),
            Some(json!({
                "title": "Inverted",
                "interestRate": 9.5,
                "minAmount": 5000,
                "maxAmount": 500
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, home) = send(&app, Method::GET, "/api/loans/home", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(home.as_array().unwrap().is_empty());

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/loans/{}/show-on-home", id),
            Some(&admin),
            Some(json!({ "showOnHome": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, home) = send(&app, Method::GET, "/api/loans/home", None, None).await;
        assert_eq!(home.as_array().unwrap().len(), 1);

        let (status, public) = send(&app, Method::GET, "/api/loans?limit=5&page=1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/loans/00000000-0000-0000-0000-000000000000",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_admin_over_http() {
        let (app, store) = setup();
        seed(&store, "ad@example.com", UserRole::Admin).await;
        let admin = token_for(&app, "ad@example.com").await;
        let borrower = token_for(&app, "bo@example.com").await;

        let (status, _) = send(&app, Method::GET, "/api/users", Some(&borrower), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, users) = send(&app, Method::GET, "/api/users?search=BO@", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 1);
        let id = users[0]["id"].as_str().unwrap().to_string();

        let (status, found) = send(
            &app,
            Method::GET,
            "/api/users/email/bo@example.com",
            Some(&borrower),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], id.as_str());

        let (status, suspended) = send(
            &app,
            Method::PATCH,
            &format!("/api/users/{}/suspend", id),
            Some(&admin),
            Some(json!({ "reason": "fraud" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(suspended["status"], "suspended");

        let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&borrower), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/users/{}/activate", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&borrower), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_emi_calculator() {
        let (app, _) = setup();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/emi/calculate",
            None,
            Some(json!({ "principal": 100000, "interestRate": 12, "months": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emi"], 8884.88);
        assert_eq!(body["totalInterest"], 6618.55);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/emi/calculate",
            None,
            Some(json!({ "principal": 100000, "interestRate": 12, "months": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
