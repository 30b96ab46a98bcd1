//! Request extractors that reject with [`AppError`].
//!
//! axum's own extractors answer failures with a plain-text body. These
//! wrappers route every rejection through `AppError` so clients always get
//! the JSON error shape.

use axum::{
    Form, Json,
    extract::{
        FromRequest, FromRequestParts, Multipart, Path, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::{StatusCode, header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;

use taxpoint_core::FieldErrors;

use crate::error::AppError;

/// Map a rejection's status and text onto the matching `AppError`.
fn rejected(status: StatusCode, text: String) -> AppError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(text),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(FieldErrors::single("body", text)),
        s if s.is_server_error() => AppError::Internal(text),
        _ => AppError::BadRequest(text),
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        rejected(e.status(), e.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(e: FormRejection) -> Self {
        rejected(e.status(), e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        rejected(e.status(), e.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(e: MultipartRejection) -> Self {
        rejected(e.status(), e.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        rejected(e.status(), e.body_text())
    }
}

/// JSON body. Syntax errors are `400`; well-formed JSON of the wrong shape
/// is `422` with the problem under `errors.body`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Path parameters. An unparseable segment such as `/records/users/abc` is
/// a `400`.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `multipart/form-data` body. Field read errors convert into `AppError`
/// too, so `?` works while walking the fields.
pub struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

/// Accepts either a JSON body or a urlencoded form, picked by `Content-Type`.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, extract::DefaultBodyLimit, response::Response, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SignIn {
        email: String,
        password: String,
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_json_and_form() {
        let expected = SignIn {
            email: "a@b.test".to_string(),
            password: "pw".to_string(),
        };

        let JsonOrForm(json) = JsonOrForm::<SignIn>::from_request(
            request("application/json", r#"{"email":"a@b.test","password":"pw"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(json, expected);

        let JsonOrForm(form) = JsonOrForm::<SignIn>::from_request(
            request(
                "application/x-www-form-urlencoded",
                "email=a%40b.test&password=pw",
            ),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(form, expected);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let Err(err) =
            JsonOrForm::<SignIn>::from_request(request("application/json", "{"), &()).await
        else {
            panic!("expected rejection");
        };
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[derive(Debug, Deserialize)]
    struct Item {
        #[allow(dead_code)]
        title: String,
    }

    async fn item_index(ApiPath(index): ApiPath<usize>) -> String {
        index.to_string()
    }

    async fn create_item(ApiJson(_item): ApiJson<Item>) -> StatusCode {
        StatusCode::CREATED
    }

    async fn upload(ApiMultipart(mut multipart): ApiMultipart) -> Result<String, AppError> {
        let mut total = 0;
        while let Some(field) = multipart.next_field().await? {
            total += field.bytes().await?.len();
        }
        Ok(total.to_string())
    }

    fn router() -> Router {
        Router::new()
            .route("/items/{index}", post(item_index))
            .route("/items", post(create_item))
            .route("/upload", post(upload).layer(DefaultBodyLimit::max(64)))
    }

    async fn send(req: Request) -> (StatusCode, serde_json::Value) {
        let response: Response = router().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        assert_eq!(content_type.unwrap(), "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_to(uri: &str, content_type: &str, body: impl Into<Body>) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_bad_path_segment_is_json_400() {
        let (status, body) = send(post_to("/items/abc", "text/plain", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_json_syntax_and_shape_errors() {
        let (status, body) = send(post_to("/items", "application/json", "{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, body) = send(post_to("/items", "application/json", r#"{"title":7}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["body"].is_array());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_json_400() {
        let (status, body) = send(post_to("/upload", "application/json", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_multipart_is_413() {
        let payload = format!(
            concat!(
                "--XBOUNDARY\r\n",
                "Content-Disposition: form-data; name=\"files\"; filename=\"a.pdf\"\r\n",
                "\r\n{}\r\n--XBOUNDARY--\r\n",
            ),
            "x".repeat(1024)
        );
        let (status, body) = send(post_to(
            "/upload",
            "multipart/form-data; boundary=XBOUNDARY",
            payload,
        ))
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["message"].is_string());
    }
}
