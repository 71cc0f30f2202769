use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, rejection::FormRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Accepts JSON or urlencoded bodies. Any other content type, or an empty
/// JSON body, yields `T::default()` so handlers see the fields as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOrForm<T>(pub T);

#[derive(Debug, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(content_type: Option<&str>) -> BodyKind {
    let mime = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json")) {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = body_kind(
            req.headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );

        match kind {
            BodyKind::Form => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(form_rejection)?;
                Ok(JsonOrForm(value))
            }
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(bytes_rejection)?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(JsonOrForm(T::default()));
                }
                Ok(JsonOrForm(serde_json::from_slice(&bytes)?))
            }
            BodyKind::Other => Ok(JsonOrForm(T::default())),
        }
    }
}

fn bytes_rejection(err: BytesRejection) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidBody(err.body_text())
    }
}

fn form_rejection(err: FormRejection) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidBody(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Probe {
        email: Option<String>,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Probe, AppError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body)).unwrap();
        JsonOrForm::<Probe>::from_request(req, &())
            .await
            .map(|JsonOrForm(probe)| probe)
    }

    #[test]
    fn classifies_content_types() {
        assert_eq!(body_kind(Some("application/json")), BodyKind::Json);
        assert_eq!(body_kind(Some("Application/JSON; charset=utf-8")), BodyKind::Json);
        assert_eq!(body_kind(Some("application/merge-patch+json")), BodyKind::Json);
        assert_eq!(
            body_kind(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(body_kind(Some("text/plain")), BodyKind::Other);
        assert_eq!(body_kind(None), BodyKind::Other);
    }

    #[tokio::test]
    async fn reads_json_and_form_bodies() {
        let expected = Probe {
            email: Some("a@b.com".into()),
        };
        assert_eq!(
            extract(Some("application/json"), r#"{"email":"a@b.com","extra":1}"#)
                .await
                .unwrap(),
            expected
        );
        assert_eq!(
            extract(Some("application/x-www-form-urlencoded"), "email=a%40b.com")
                .await
                .unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn empty_or_foreign_bodies_default() {
        assert_eq!(extract(Some("application/json"), "").await.unwrap(), Probe::default());
        assert_eq!(extract(Some("text/plain"), "email=a@b.com").await.unwrap(), Probe::default());
        assert_eq!(extract(None, "").await.unwrap(), Probe::default());
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let err = extract(Some("application/json"), "{\"email\":").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidBody(_)));
    }
}
