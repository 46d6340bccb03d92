use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use homecare_core::config::HomecareConfig;

use crate::auth::SessionRegistry;
use crate::http;
use crate::service::HomecareService;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub service: HomecareService,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: &HomecareConfig, service: HomecareService) -> Self {
        Self {
            service,
            sessions: SessionRegistry::new(config.auth.session_ttl_mins),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/login", post(http::login::login_handler))
        .route("/logout", post(http::login::logout_handler))
        .route("/dashboard", get(http::dashboard::dashboard_handler))
        .route(
            "/patients",
            get(http::patients::list).post(http::patients::create),
        )
        .route(
            "/patients/{id}",
            get(http::patients::get_one)
                .patch(http::patients::update)
                .delete(http::patients::delete),
        )
        .route("/staff", get(http::staff::list).post(http::staff::create))
        .route(
            "/staff/{id}",
            get(http::staff::get_one)
                .patch(http::staff::update)
                .delete(http::staff::delete),
        )
        .route(
            "/schedules",
            get(http::schedules::list).post(http::schedules::create),
        )
        .route(
            "/schedules/{id}",
            get(http::schedules::get_one)
                .patch(http::schedules::update)
                .delete(http::schedules::delete),
        )
        .route("/analytics", get(http::analytics::overview))
        .route("/analytics/{name}", get(http::analytics::distribution))
        .route("/export/csv/{kind}", get(http::export::csv_handler))
        .route("/export/xlsx", get(http::export::xlsx_handler))
        .route("/export/report", get(http::export::report_handler))
        .route("/backup", post(http::backup::backup_handler))
        .route(
            "/users",
            get(http::users::list).post(http::users::create),
        )
        .route("/users/{username}", get(http::users::get_one))
        .route(
            "/users/{username}/password",
            put(http::users::reset_password),
        )
        .route("/account/password", put(http::users::change_password))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use homecare_records::RecordStore;
    use homecare_users::UserDirectory;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        let config = HomecareConfig::default();
        let users = UserDirectory::open_in_memory().unwrap();
        users.seed(&config.auth.seed_users).unwrap();
        let service = HomecareService::new(RecordStore::open_in_memory().unwrap(), users, &config);
        build_router(Arc::new(AppState::new(&config, service)))
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn login(router: &Router, username: &str) -> String {
        login_with(router, username, "change-me").await
    }

    async fn login_with(router: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            router,
            json_request(
                "POST",
                "/login",
                None,
                json!({"username": username, "password": password}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let router = router();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn records_require_a_token() {
        let router = router();
        let req = Request::builder().uri("/patients").body(Body::empty()).unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let router = router();
        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/login",
                None,
                json!({"username": "admin", "password": "nope"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_FAILED");
    }

    #[tokio::test]
    async fn create_then_fetch_patient() {
        let router = router();
        let token = login(&router, "doctor").await;

        let (status, created) = send(
            &router,
            json_request(
                "POST",
                "/patients",
                Some(&token),
                json!({"name": "A. Said", "age": 70, "allergies": ["Penicillin"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["created_by"], "doctor");

        let req = Request::builder()
            .uri(format!("/patients/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, fetched) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "A. Said");
        assert_eq!(fetched["allergies"], json!(["Penicillin"]));
    }

    #[tokio::test]
    async fn doctor_cannot_back_up() {
        let router = router();
        let token = login(&router, "doctor").await;
        let (status, body) = send(&router, json_request("POST", "/backup", Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn validation_failure_is_422() {
        let router = router();
        let token = login(&router, "admin").await;
        let (status, body) = send(
            &router,
            json_request("POST", "/patients", Some(&token), json!({"name": " ", "age": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let router = router();
        let token = login(&router, "admin").await;
        let (status, _) = send(&router, json_request("POST", "/logout", Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let req = Request::builder()
            .uri("/staff")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mistyped_field_is_a_json_422() {
        let router = router();
        let token = login(&router, "admin").await;
        let resp = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/patients",
                Some(&token),
                json!({"name": "A", "age": "seventy"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("application/json"), "{content_type}");
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("age"), "{body}");
    }

    #[tokio::test]
    async fn malformed_json_and_path_are_400() {
        let router = router();
        let token = login(&router, "admin").await;

        let req = Request::builder()
            .method("POST")
            .uri("/patients")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from("{\"name\": "))
            .unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let req = Request::builder()
            .uri("/patients/abc")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn admin_reset_revokes_sessions_and_old_password() {
        let router = router();
        let admin = login(&router, "admin").await;
        let doctor = login(&router, "doctor").await;

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                "/users/doctor/password",
                Some(&doctor),
                json!({"new_password": "fresh-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                "/users/doctor/password",
                Some(&admin),
                json!({"new_password": "fresh-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["username"], "doctor");

        let req = Request::builder()
            .uri("/patients")
            .header(header::AUTHORIZATION, format!("Bearer {doctor}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/login",
                None,
                json!({"username": "doctor", "password": "change-me"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        login_with(&router, "doctor", "fresh-pass").await;
    }

    #[tokio::test]
    async fn account_password_change_needs_the_current_one() {
        let router = router();
        let token = login(&router, "doctor").await;

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                "/account/password",
                Some(&token),
                json!({"current_password": "wrong", "new_password": "next-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_FAILED");

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                "/account/password",
                Some(&token),
                json!({"current_password": "change-me", "new_password": "next-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        login_with(&router, "doctor", "next-pass").await;
    }
}
