//! Decoding `POST /api/gemini` bodies into an [`InferenceRequest`].
//!
//! The `Content-Type` media type alone picks the variant. The body is read
//! once, bounded by `max_body_bytes`, before either branch parses it.

use super::InferenceRequest;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::prompts::DEFAULT_IMAGE_PROMPT;
use axum::body::{Body, Bytes};
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{self, HeaderMap, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use tracing::debug;

/// Body encodings the endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Multipart,
}

/// Classify a request by the media type of its `Content-Type` header,
/// ignoring parameters such as `charset` or `boundary`.
pub fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split(';').next()?.trim();
    if media_type.eq_ignore_ascii_case("application/json") {
        Some(BodyKind::Json)
    } else if media_type.eq_ignore_ascii_case("multipart/form-data") {
        Some(BodyKind::Multipart)
    } else {
        None
    }
}

impl InferenceRequest {
    /// Decode an HTTP request.
    ///
    /// # Errors
    /// - [`ApiError::PayloadTooLarge`] when the declared or actual body size
    ///   exceeds `config.max_body_bytes`.
    /// - [`ApiError::UnsupportedContentType`] for anything but JSON or
    ///   multipart form data.
    /// - [`ApiError::MissingQuestion`] / [`ApiError::MissingImage`] when the
    ///   required field is absent (or, for `question`, empty).
    /// - [`ApiError::MalformedRequest`] when the body cannot be parsed.
    pub async fn from_http(req: Request, config: &ServerConfig) -> Result<Self, ApiError> {
        let limit = config.max_body_bytes;

        if declared_length(req.headers()).is_some_and(|len| len > limit as u64) {
            return Err(ApiError::PayloadTooLarge { limit });
        }

        let kind = body_kind(req.headers()).ok_or(ApiError::UnsupportedContentType)?;

        let (parts, body) = req.into_parts();
        let bytes = read_limited(body, limit).await?;
        debug!("Read {} byte {:?} body", bytes.len(), kind);

        match kind {
            BodyKind::Json => parse_json(&bytes),
            BodyKind::Multipart => {
                let req = http::Request::from_parts(parts, Body::from(bytes));
                parse_multipart(req, limit).await
            }
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ApiError::MalformedRequest(format!(
            "failed to read request body: {e}"
        ))),
    }
}

fn parse_json(bytes: &[u8]) -> Result<InferenceRequest, ApiError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ApiError::MalformedRequest(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ApiError::MalformedRequest("expected a JSON object".into()))?;

    let question = object
        .get("question")
        .and_then(Value::as_str)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuestion)?;

    Ok(InferenceRequest::Text {
        question: question.to_string(),
    })
}

async fn parse_multipart(req: Request, limit: usize) -> Result<InferenceRequest, ApiError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))?;

    let mut image: Option<(String, Bytes)> = None;
    let mut prompt: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") if image.is_none() => {
                // A part without a filename is a form value, not a file.
                let Some(filename) = field.file_name().map(str::to_owned) else {
                    continue;
                };
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                image = Some((filename, data));
            }
            Some("prompt") => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                prompt = Some(text);
            }
            _ => {}
        }
    }

    let (filename, image_bytes) = image.ok_or(ApiError::MissingImage)?;
    let prompt = prompt.unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_string());

    Ok(InferenceRequest::Image {
        image_bytes,
        filename,
        prompt,
    })
}

fn multipart_error(e: MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::MalformedRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::Request as HttpRequest;

    const BOUNDARY: &str = "XdocbridgeX";

    fn config(limit: usize) -> ServerConfig {
        ServerConfig::builder().max_body_bytes(limit).build().unwrap()
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/api/gemini")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        HttpRequest::builder()
            .method("POST")
            .uri("/api/gemini")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn body_kind_ignores_parameters_and_case() {
        let mut headers = HeaderMap::new();
        assert_eq!(body_kind(&headers), None);

        let json = HeaderValue::from_static("Application/JSON; charset=utf-8");
        headers.insert(CONTENT_TYPE, json);
        assert_eq!(body_kind(&headers), Some(BodyKind::Json));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data; boundary=x"));
        assert_eq!(body_kind(&headers), Some(BodyKind::Multipart));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(body_kind(&headers), None);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/jsonx"));
        assert_eq!(body_kind(&headers), None);
    }

    #[tokio::test]
    async fn json_question_is_decoded() {
        let req = json_request(r#"{"question": "What is Rust?"}"#);
        let decoded = InferenceRequest::from_http(req, &config(1024)).await.unwrap();
        assert!(matches!(
            decoded,
            InferenceRequest::Text { question } if question == "What is Rust?"
        ));
    }

    #[tokio::test]
    async fn json_without_usable_question_is_missing() {
        for body in [r#"{}"#, r#"{"question": ""}"#, r#"{"question": 7}"#] {
            let err = InferenceRequest::from_http(json_request(body), &config(1024))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::MissingQuestion), "{body}: {err:?}");
        }
    }

    #[tokio::test]
    async fn whitespace_question_is_passed_through() {
        let req = json_request(r#"{"question": "   "}"#);
        let decoded = InferenceRequest::from_http(req, &config(1024)).await.unwrap();
        assert!(matches!(decoded, InferenceRequest::Text { question } if question == "   "));
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        for body in ["{not json", "[1, 2]", ""] {
            let err = InferenceRequest::from_http(json_request(body), &config(1024))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::MalformedRequest(_)), "{body}: {err:?}");
        }
    }

    #[tokio::test]
    async fn other_content_types_are_unsupported() {
        let req = HttpRequest::builder()
            .method("POST")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let err = InferenceRequest::from_http(req, &config(1024)).await.unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedContentType));

        let req = HttpRequest::builder().method("POST").body(Body::empty()).unwrap();
        let err = InferenceRequest::from_http(req, &config(1024)).await.unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedContentType));
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let body = format!(r#"{{"question": "{}"}}"#, "x".repeat(200));
        let err = InferenceRequest::from_http(json_request(&body), &config(64))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { limit: 64 }));

        // Declared length is checked before the content type.
        let req = HttpRequest::builder()
            .method("POST")
            .header(CONTENT_TYPE, "text/plain")
            .header(CONTENT_LENGTH, "100000")
            .body(Body::empty())
            .unwrap();
        let err = InferenceRequest::from_http(req, &config(64)).await.unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn multipart_image_with_default_prompt() {
        let req = multipart_request(&[("image", Some("cat.png"), b"\x89PNG")]);
        let decoded = InferenceRequest::from_http(req, &config(4096)).await.unwrap();
        match decoded {
            InferenceRequest::Image {
                image_bytes,
                filename,
                prompt,
            } => {
                assert_eq!(&image_bytes[..], b"\x89PNG");
                assert_eq!(filename, "cat.png");
                assert_eq!(prompt, DEFAULT_IMAGE_PROMPT);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn multipart_prompt_and_unknown_fields() {
        let req = multipart_request(&[
            ("note", None, b"ignored"),
            ("prompt", None, b"Count the cats"),
            ("image", Some("cats.jpg"), b"jpeg"),
        ]);
        let decoded = InferenceRequest::from_http(req, &config(4096)).await.unwrap();
        assert!(matches!(
            decoded,
            InferenceRequest::Image { prompt, .. } if prompt == "Count the cats"
        ));
    }

    #[tokio::test]
    async fn multipart_empty_prompt_is_kept() {
        let req = multipart_request(&[("prompt", None, b""), ("image", Some("cat.png"), b"png")]);
        let decoded = InferenceRequest::from_http(req, &config(4096)).await.unwrap();
        assert!(matches!(decoded, InferenceRequest::Image { prompt, .. } if prompt.is_empty()));
    }

    #[tokio::test]
    async fn multipart_without_image_file_is_missing() {
        let req = multipart_request(&[("prompt", None, b"hi")]);
        let err = InferenceRequest::from_http(req, &config(4096)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingImage));

        // `image` sent as a plain form value.
        let req = multipart_request(&[("image", None, b"not a file")]);
        let err = InferenceRequest::from_http(req, &config(4096)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingImage));
    }

    #[tokio::test]
    async fn multipart_without_boundary_is_malformed() {
        let req = HttpRequest::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("junk"))
            .unwrap();
        let err = InferenceRequest::from_http(req, &config(4096)).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }
}
