use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        middleware::require_auth,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route_layer(from_fn_with_state(state.auth.keys().clone(), require_auth))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(mut payload) = payload?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let res = state
        .auth
        .register(
            &payload.first_name,
            &payload.last_name,
            &payload.email,
            &payload.password,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(mut payload) = payload?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let res = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(res))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let me = state.auth.get_user_by_id(user.user_id).await?;
    Ok(Json(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, auth::memory::MemoryUserStore};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Arc<MemoryUserStore>, Router) {
        let store = Arc::new(MemoryUserStore::default());
        let state = AppState::for_tests(store.clone());
        (store, build_app(state))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn scenario_user() -> Value {
        json!({
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.com",
            "password": "password1"
        })
    }

    #[tokio::test]
    async fn register_then_register_again() {
        let (store, app) = app();

        let (status, body) = send(&app, post_json("/api/auth/register", scenario_user())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["firstName"], "A");
        assert_eq!(body["message"], "Registration successful");
        assert!(!body["token"].as_str().unwrap().is_empty());
        let user = body["user"].as_object().unwrap();
        assert!(user.keys().all(|k| !k.to_lowercase().contains("password")));

        let (status, body) = send(&app, post_json("/api/auth/register", scenario_user())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "error": "email already exists" }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_bad_input_before_engine() {
        let (store, app) = app();

        let mut bad_email = scenario_user();
        bad_email["email"] = json!("not-an-email");
        let (status, body) = send(&app, post_json("/api/auth/register", bad_email)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let mut short = scenario_user();
        short["password"] = json!("1234567");
        let (status, _) = send(&app, post_json("/api/auth/register", short)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            post_json("/api/auth/register", json!({ "email": "a@b.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_oversized_fields_with_400() {
        let (store, app) = app();

        let mut long_name = scenario_user();
        long_name["firstName"] = json!("x".repeat(101));
        let (status, body) = send(&app, post_json("/api/auth/register", long_name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "firstName must be at most 100 characters");

        let mut long_email = scenario_user();
        long_email["email"] = json!(format!("{}@b.com", "a".repeat(250)));
        let (status, body) = send(&app, post_json("/api/auth/register", long_email)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email must be at most 255 characters");

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn login_and_me() {
        let (_store, app) = app();
        send(&app, post_json("/api/auth/register", scenario_user())).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "A@B.com", "password": "password1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].clone();

        let req = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["email"], "a@b.com");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (_store, app) = app();
        send(&app, post_json("/api/auth/register", scenario_user())).await;

        let wrong = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "a@b.com", "password": "password2" }),
            ),
        )
        .await;
        let unknown = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "x@b.com", "password": "password1" }),
            ),
        )
        .await;
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let (_store, app) = app();
        let req = Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header required");
    }

    #[tokio::test]
    async fn me_for_deleted_user_is_not_found() {
        let (store, app) = app();
        let (_, body) = send(&app, post_json("/api/auth/register", scenario_user())).await;
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        assert!(store.soft_delete(id));

        let req = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "user not found");
    }

    #[tokio::test]
    async fn health() {
        let (_store, app) = app();
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
