use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::HttpError;

/// `axum::Json` whose rejection is rendered as an [`HttpError`] envelope.
///
/// Also usable as a response, so handlers import a single `Json`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(HttpError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct Path<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::{InputPostDto, SitePageQuery};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/posts",
                post(|Json(body): Json<InputPostDto>| async move { Json(body.title) }),
            )
            .route(
                "/news",
                get(|Query(params): Query<SitePageQuery>| async move { Json(params.page) }),
            )
            .route(
                "/posts/{post_id}",
                get(|Path(post_id): Path<i64>| async move { Json(post_id) }),
            )
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/posts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_uri(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let (status, body) = send(json_post(r#"{"title":"Tin","content":"x"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Tin");
    }

    #[tokio::test]
    async fn unknown_status_value_is_a_400_envelope() {
        let (status, body) =
            send(json_post(r#"{"title":"Tin","content":"x","status":"foo"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Dữ liệu không hợp lệ");
    }

    #[tokio::test]
    async fn malformed_json_is_a_400_envelope() {
        let (status, body) = send(json_post("{\"title\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_numeric_page_is_a_400_envelope() {
        let (status, body) = send(get_uri("/news?page=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(get_uri("/news?page=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, 2);
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_400_envelope() {
        let (status, body) = send(get_uri("/posts/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Dữ liệu không hợp lệ");
    }
}
