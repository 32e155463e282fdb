//! HTTP client for the similarity service.

use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::form::{CheckRequest, UploadRequest};

/// Similarity check endpoint, relative to the base URL.
pub const CHECK_PATH: &str = "/check_similarity/";
/// Reference image upload endpoint, relative to the base URL.
pub const UPLOAD_PATH: &str = "/add_image/";

/// Request failures. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The selected image could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx from the similarity endpoint.
    #[error("{}", server_message(.status, .detail))]
    Server { status: u16, detail: Option<String> },
    /// Non-2xx from the upload endpoint.
    #[error("Failed to upload file")]
    UploadFailed,
    /// A 2xx body that is not JSON.
    #[error("{0}")]
    Decode(String),
}

fn server_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(d) => d.clone(),
        None => format!("HTTP error! status: {status}"),
    }
}

/// Thin wrapper over a shared reqwest client and the service base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Full URL for an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a similarity check and return the response body as-is.
    pub async fn check_similarity(&self, req: &CheckRequest) -> Result<Value, ClientError> {
        let form = Form::new()
            .text("product_code", req.product_code.clone())
            .part("target_image", file_part(&req.image).await?)
            .text("model", req.model.index().to_string());

        let resp = self.post_multipart(CHECK_PATH, form).await?;
        let status = resp.status();
        if !status.is_success() {
            // An unreadable error body is treated like an empty one.
            let body = resp.bytes().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                detail: detail_from_body(&body),
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Upload a reference image for a product code. The response body is ignored.
    pub async fn add_image(&self, req: &UploadRequest) -> Result<(), ClientError> {
        let form = Form::new()
            .text("product_code", req.product_code.clone())
            .part("image_file", file_part(&req.image).await?);

        let resp = self.post_multipart(UPLOAD_PATH, form).await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("upload rejected with status {status}");
            return Err(ClientError::UploadFailed);
        }
        Ok(())
    }

    /// POST a multipart form to an endpoint. Status is left to the caller.
    async fn post_multipart(&self, path: &str, form: Form) -> Result<Response, ClientError> {
        let url = self.endpoint(path);
        tracing::debug!("POST {url}");
        Ok(self.http.post(url).multipart(form).send().await?)
    }
}

/// Read a file into a multipart part carrying its name and MIME type.
async fn file_part(path: &Path) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    let mime = detect_mime(&bytes);
    Ok(Part::bytes(bytes).file_name(name).mime_str(mime)?)
}

/// MIME type sniffed from the file contents.
fn detect_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|t| t.mime_type())
        .unwrap_or("application/octet-stream")
}

/// `detail` from a JSON error body, when present and non-empty.
fn detail_from_body(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    match v.get("detail")? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ModelChoice;
    use mockito::Matcher;
    use std::io::Write;
    use uuid::Uuid;

    fn image_file(name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"FAKEPNGDATA").unwrap();
        (dir, path)
    }

    fn check_req(image: PathBuf) -> CheckRequest {
        CheckRequest {
            id: Uuid::new_v4(),
            product_code: "P-100".into(),
            image,
            model: ModelChoice::DenseNet121,
        }
    }

    fn upload_req(image: PathBuf) -> UploadRequest {
        UploadRequest {
            id: Uuid::new_v4(),
            product_code: "P-100".into(),
            image,
        }
    }

    #[test]
    fn test_endpoint_join() {
        let c = ApiClient::new("http://127.0.0.1:8000/");
        assert_eq!(
            c.endpoint(CHECK_PATH),
            "http://127.0.0.1:8000/check_similarity/"
        );
        assert_eq!(c.endpoint(UPLOAD_PATH), "http://127.0.0.1:8000/add_image/");
    }

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_detect_mime_from_magic_bytes() {
        assert_eq!(detect_mime(PNG_MAGIC), "image/png");
        assert_eq!(detect_mime(JPEG_MAGIC), "image/jpeg");
        assert_eq!(detect_mime(b"FAKEPNGDATA"), "application/octet-stream");
        assert_eq!(detect_mime(b""), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_extensionless_png_is_sent_as_png() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", UPLOAD_PATH)
            .match_body(Matcher::Regex(
                r#"name="image_file"; filename="scan"\r\nContent-Type: image/png"#.into(),
            ))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan");
        std::fs::write(&path, PNG_MAGIC).unwrap();
        ApiClient::new(server.url())
            .add_image(&upload_req(path))
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[test]
    fn test_detail_from_body() {
        assert_eq!(
            detail_from_body(br#"{"detail":"model unavailable"}"#).as_deref(),
            Some("model unavailable")
        );
        assert_eq!(detail_from_body(br#"{"detail":""}"#), None);
        assert_eq!(detail_from_body(br#"{"other":1}"#), None);
        assert_eq!(detail_from_body(br#"{"detail":0}"#), None);
        assert_eq!(detail_from_body(br#"{"detail":0.0}"#), None);
        assert_eq!(detail_from_body(br#"{"detail":7}"#).as_deref(), Some("7"));
        assert_eq!(detail_from_body(b""), None);
        assert_eq!(detail_from_body(b"<html>"), None);
        assert_eq!(
            detail_from_body(br#"{"detail":[{"msg":"field required"}]}"#).as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn test_server_error_display() {
        let e = ClientError::Server {
            status: 500,
            detail: None,
        };
        assert_eq!(e.to_string(), "HTTP error! status: 500");
        let e = ClientError::UploadFailed;
        assert_eq!(e.to_string(), "Failed to upload file");
    }

    #[tokio::test]
    async fn test_check_similarity_success() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", CHECK_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="product_code"\r\n\r\nP-100"#.into()),
                Matcher::Regex(r#"name="target_image"; filename="a.png""#.into()),
                Matcher::Regex(r#"name="model"\r\n\r\n2"#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"status":"match","similarity":0.87}}"#)
            .expect(1)
            .create_async()
            .await;

        let (_dir, path) = image_file("a.png");
        let client = ApiClient::new(server.url());
        let body = client.check_similarity(&check_req(path)).await.unwrap();

        assert_eq!(body["status"]["status"], "match");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_similarity_server_detail() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", CHECK_PATH)
            .with_status(500)
            .with_body(r#"{"detail":"model unavailable"}"#)
            .create_async()
            .await;

        let (_dir, path) = image_file("a.png");
        let err = ApiClient::new(server.url())
            .check_similarity(&check_req(path))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "model unavailable");
    }

    #[tokio::test]
    async fn test_check_similarity_server_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", CHECK_PATH)
            .with_status(500)
            .create_async()
            .await;

        let (_dir, path) = image_file("a.png");
        let err = ApiClient::new(server.url())
            .check_similarity(&check_req(path))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_check_similarity_malformed_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", CHECK_PATH)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (_dir, path) = image_file("a.png");
        let err = ApiClient::new(server.url())
            .check_similarity(&check_req(path))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_image_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", CHECK_PATH)
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = ApiClient::new(server.url())
            .check_similarity(&check_req(dir.path().join("gone.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_error() {
        let (_dir, path) = image_file("a.png");
        let err = ApiClient::new("http://127.0.0.1:1")
            .check_similarity(&check_req(path))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_add_image_success() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", UPLOAD_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="product_code"\r\n\r\nP-100"#.into()),
                Matcher::Regex(r#"name="image_file"; filename="b.jpg""#.into()),
            ]))
            .with_status(201)
            .with_body("anything")
            .expect(1)
            .create_async()
            .await;

        let (_dir, path) = image_file("b.jpg");
        ApiClient::new(server.url())
            .add_image(&upload_req(path))
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_image_failure_ignores_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", UPLOAD_PATH)
            .with_status(422)
            .with_body(r#"{"detail":"bad file"}"#)
            .create_async()
            .await;

        let (_dir, path) = image_file("b.jpg");
        let err = ApiClient::new(server.url())
            .add_image(&upload_req(path))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload file");
    }
}
