use axum::{Router, middleware};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AppState,
    handler::{
        about::about_handler, auth::auth_handler, category::category_handler,
        dashboard::dashboard_handler, drawing::drawing_handler, feedback::feedback_handler,
        post::post_handler, project::project_handler, settings::settings_handler,
        site::site_handler, slide::slide_handler, upload::upload_handler, users::users_handler,
        video::video_handler,
    },
    middleware::auth,
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(app_state.clone()))
        .nest(
            "/users",
            users_handler().layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .nest("/posts", post_handler(app_state.clone()))
        .nest("/projects", project_handler(app_state.clone()))
        .nest("/categories", category_handler(app_state.clone()))
        .nest("/videos", video_handler(app_state.clone()))
        .nest("/slides", slide_handler(app_state.clone()))
        .nest("/drawings", drawing_handler(app_state.clone()))
        .nest("/feedback", feedback_handler(app_state.clone()))
        .nest("/settings", settings_handler(app_state.clone()))
        .nest("/about", about_handler(app_state.clone()))
        .nest("/upload", upload_handler(app_state.clone()))
        .nest("/dashboard", dashboard_handler(app_state.clone()))
        .nest("/site", site_handler())
        .with_state(app_state.clone());

    Router::new()
        .nest("/api", api_route)
        .nest_service("/uploads", ServeDir::new(&app_state.env.upload_dir))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::DBClient};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    // The pool never connects: every request below is answered before a query runs.
    fn app() -> Router {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(AppState {
            env: Arc::new(config),
            db_client: DBClient::new(pool),
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn creating_a_post_requires_a_session() {
        let (status, body) = send(json_request(
            "POST",
            "/api/posts",
            r#"{"title":"Tin","content":"<p>x</p>"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Bạn chưa đăng nhập");
    }

    #[tokio::test]
    async fn mutating_routes_reject_anonymous_callers() {
        let cases = [
            ("PUT", "/api/projects/1"),
            ("DELETE", "/api/categories/1"),
            ("POST", "/api/videos"),
            ("DELETE", "/api/slides/1"),
            ("POST", "/api/drawings"),
            ("PUT", "/api/feedback/1"),
            ("PUT", "/api/settings/1"),
            ("POST", "/api/about"),
            ("DELETE", "/api/users/2"),
            ("GET", "/api/users"),
            ("GET", "/api/feedback"),
            ("GET", "/api/dashboard"),
            ("GET", "/api/auth/me"),
        ];

        for (method, uri) in cases {
            let (status, _) = send(json_request(method, uri, "{}")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn upload_requires_a_session() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .body(Body::from("--x--\r\n"))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let token = crate::utils::token::create_token(1, b"some-other-secret", 60).unwrap();
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/posts/1")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Phiên đăng nhập không hợp lệ hoặc đã hết hạn");
    }

    #[tokio::test]
    async fn invalid_feedback_is_rejected_with_field_errors() {
        let (status, body) = send(json_request(
            "POST",
            "/api/feedback",
            r#"{"name":"","email":"sai","subject":"Góp ý","message":"Nội dung"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["name"].is_array());
        assert!(body["errors"]["email"].is_array());
    }

    #[tokio::test]
    async fn feedback_missing_a_field_gets_the_error_envelope() {
        let (status, body) = send(json_request(
            "POST",
            "/api/feedback",
            r#"{"name":"Nguyễn Văn A","subject":"Góp ý","message":"Nội dung"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Dữ liệu không hợp lệ");

        let (status, body) = send(json_request(
            "POST",
            "/api/feedback",
            r#"{"name":"A","email":"a@example.vn","phone":12,"subject":"S","message":"M"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn malformed_query_and_path_get_the_error_envelope() {
        for uri in [
            "/api/site/news?page=abc",
            "/api/site/news?page=9223372036854775807",
            "/api/site/drawings/abc",
            "/api/posts/abc",
        ] {
            let (status, body) = send(json_request("GET", uri, "")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["success"], false, "{}", uri);
        }
    }

    #[tokio::test]
    async fn empty_login_is_a_validation_error() {
        let (status, body) = send(json_request(
            "POST",
            "/api/auth/login",
            r#"{"username":"","password":""}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["username"].is_array());
    }

    #[tokio::test]
    async fn logout_expires_the_session_cookie() {
        let response = app()
            .oneshot(json_request("POST", "/api/auth/logout", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("access_token="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (status, _) = send(json_request("GET", "/api/khong-ton-tai", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
