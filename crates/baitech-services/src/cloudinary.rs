//! Cloudinary client
//!
//! Signed uploads with eager transformations, destroy, delivery URL building
//! and the two Admin API lookups the admin tooling uses. Endpoints come from
//! [`CloudinaryConfig`], so tests can point the client at a mock server.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use baitech_core::config::CloudinaryConfig;
use baitech_core::models::{DerivedUrl, RemoteImage, SizeTag};
use baitech_core::AppError;
use bytes::Bytes;
use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Remote CDN errors
#[derive(Debug, thiserror::Error)]
pub enum CdnError {
    #[error("Cloudinary is not configured. Please add credentials to .env")]
    NotConfigured,

    #[error("Remote CDN request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote CDN request failed: {0}")]
    Transport(String),

    #[error("Remote CDN rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to delete {public_id}: {result}")]
    DeleteRejected { public_id: String, result: String },

    #[error("Unexpected remote CDN response: {0}")]
    InvalidResponse(String),
}

impl CdnError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            CdnError::Timeout(timeout)
        } else {
            CdnError::Transport(err.to_string())
        }
    }
}

impl From<CdnError> for AppError {
    fn from(err: CdnError) -> Self {
        match err {
            CdnError::NotConfigured => AppError::Configuration(err.to_string()),
            other => AppError::RemoteCdn(other.to_string()),
        }
    }
}

/// Named delivery transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationPreset {
    Thumbnail,
    Medium,
    Large,
    Hero,
}

impl TransformationPreset {
    /// Presets generated eagerly on upload.
    pub const EAGER: [TransformationPreset; 3] = [
        TransformationPreset::Thumbnail,
        TransformationPreset::Medium,
        TransformationPreset::Large,
    ];

    fn params(self) -> (&'static str, u32, u32, &'static str) {
        match self {
            TransformationPreset::Thumbnail => ("fill", 150, 150, "auto:good"),
            TransformationPreset::Medium => ("limit", 600, 600, "auto:good"),
            TransformationPreset::Large => ("limit", 1200, 1200, "auto:best"),
            TransformationPreset::Hero => ("fill", 1920, 1080, "auto:best"),
        }
    }

    pub fn size_tag(self) -> Option<SizeTag> {
        match self {
            TransformationPreset::Thumbnail => Some(SizeTag::Thumbnail),
            TransformationPreset::Medium => Some(SizeTag::Medium),
            TransformationPreset::Large => Some(SizeTag::Large),
            TransformationPreset::Hero => None,
        }
    }

    /// Transformation string, parameters in alphabetical order
    /// (`c_fill,f_auto,h_150,q_auto:good,w_150`).
    pub fn transformation(self, format: Option<&str>) -> String {
        let (crop, width, height, quality) = self.params();
        format!(
            "c_{},f_{},h_{},q_{},w_{}",
            crop,
            format.unwrap_or("auto"),
            height,
            quality,
            width
        )
    }
}

impl Display for TransformationPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            TransformationPreset::Thumbnail => "thumbnail",
            TransformationPreset::Medium => "medium",
            TransformationPreset::Large => "large",
            TransformationPreset::Hero => "hero",
        };
        f.write_str(name)
    }
}

impl FromStr for TransformationPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thumbnail" => Ok(TransformationPreset::Thumbnail),
            "medium" => Ok(TransformationPreset::Medium),
            "large" => Ok(TransformationPreset::Large),
            "hero" => Ok(TransformationPreset::Hero),
            _ => Err(anyhow::anyhow!("Invalid transformation preset: {}", s)),
        }
    }
}

/// The operations the upload pipeline needs from a remote image CDN.
#[async_trait]
pub trait RemoteImageCdn: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Upload under `{folder}/{public_id}`, replacing any existing object.
    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        public_id: &str,
        folder: &str,
    ) -> Result<RemoteImage, CdnError>;

    async fn delete(&self, public_id: &str) -> Result<(), CdnError>;
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    public_id: String,
    secure_url: String,
    url: Option<String>,
    format: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResourceListResponse {
    #[serde(default)]
    resources: Vec<ResourceResponse>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

struct Credentials<'a> {
    cloud_name: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

/// HTTP client for the Cloudinary upload and admin APIs.
pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryClient")
            .field("config", &self.config)
            .finish()
    }
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, CdnError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CdnError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn credentials(&self) -> Result<Credentials<'_>, CdnError> {
        match (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Credentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => Err(CdnError::NotConfigured),
        }
    }

    fn api_url(&self, cloud_name: &str, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            cloud_name,
            path
        )
    }

    /// Delivery URL of `public_id` under a preset, optionally forcing a format.
    ///
    /// Returns `None` when no cloud name is configured.
    pub fn build_url(
        &self,
        public_id: &str,
        preset: TransformationPreset,
        format: Option<&str>,
    ) -> Option<String> {
        let cloud_name = self.config.cloud_name.as_deref()?;
        Some(format!(
            "{}/{}/image/upload/{}/{}",
            self.config.delivery_base_url.trim_end_matches('/'),
            cloud_name,
            preset.transformation(format),
            public_id
        ))
    }

    fn derived_urls(&self, public_id: &str) -> Vec<DerivedUrl> {
        TransformationPreset::EAGER
            .into_iter()
            .filter_map(|preset| {
                let size = preset.size_tag()?;
                let url = self.build_url(public_id, preset, None)?;
                Some(DerivedUrl { size, url })
            })
            .collect()
    }

    fn to_remote_image(&self, resource: ResourceResponse) -> RemoteImage {
        let derived_urls = self.derived_urls(&resource.public_id);
        RemoteImage {
            public_id: resource.public_id,
            secure_url: resource.secure_url,
            url: resource.url,
            format: resource.format,
            width: resource.width,
            height: resource.height,
            bytes: resource.bytes,
            derived_urls,
        }
    }

    /// Run a request under the configured deadline and decode a JSON body.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CdnError> {
        let timeout = self.config.timeout;
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| CdnError::from_reqwest(e, timeout))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| CdnError::from_reqwest(e, timeout))?;

            if !status.is_success() {
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(CdnError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            serde_json::from_str::<T>(&body).map_err(|e| CdnError::InvalidResponse(e.to_string()))
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| CdnError::Timeout(timeout))?
    }

    /// Metadata of an uploaded image (Admin API).
    pub async fn resource(&self, public_id: &str) -> Result<RemoteImage, CdnError> {
        let creds = self.credentials()?;
        let url = self.api_url(
            creds.cloud_name,
            &format!("resources/image/upload/{}", public_id),
        );
        let request = self
            .http
            .get(url)
            .basic_auth(creds.api_key, Some(creds.api_secret));

        let resource: ResourceResponse = self.execute(request).await?;
        Ok(self.to_remote_image(resource))
    }

    /// Images whose public id starts with `folder` (Admin API).
    pub async fn list_folder(
        &self,
        folder: &str,
        max_results: u32,
    ) -> Result<Vec<RemoteImage>, CdnError> {
        let creds = self.credentials()?;
        let url = self.api_url(creds.cloud_name, "resources/image/upload");
        let request = self
            .http
            .get(url)
            .basic_auth(creds.api_key, Some(creds.api_secret))
            .query(&[
                ("prefix", folder.to_string()),
                ("max_results", max_results.to_string()),
            ]);

        let list: ResourceListResponse = self.execute(request).await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| self.to_remote_image(r))
            .collect())
    }
}

#[async_trait]
impl RemoteImageCdn for CloudinaryClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        public_id: &str,
        folder: &str,
    ) -> Result<RemoteImage, CdnError> {
        let creds = self.credentials()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params: Vec<(&str, String)> = vec![
            ("folder", folder.to_string()),
            ("overwrite", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
        ];
        if self.config.eager_transformations {
            let eager = TransformationPreset::EAGER
                .iter()
                .map(|p| p.transformation(None))
                .collect::<Vec<_>>()
                .join("|");
            params.push(("eager", eager));
            params.push(("eager_async", "true".to_string()));
        }
        let signature = sign(&params, creds.api_secret);

        let file = reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", creds.api_key.to_string())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = self.api_url(creds.cloud_name, "image/upload");
        let request = self.http.post(url).multipart(form);

        let start = std::time::Instant::now();
        let resource: ResourceResponse = self.execute(request).await?;

        tracing::info!(
            public_id = %resource.public_id,
            bytes = ?resource.bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(self.to_remote_image(resource))
    }

    async fn delete(&self, public_id: &str) -> Result<(), CdnError> {
        let creds = self.credentials()?;
        let params: Vec<(&str, String)> = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ];
        let signature = sign(&params, creds.api_secret);

        let mut form: Vec<(&str, String)> = params;
        form.push(("api_key", creds.api_key.to_string()));
        form.push(("signature", signature));

        let url = self.api_url(creds.cloud_name, "image/destroy");
        let response: DestroyResponse = self.execute(self.http.post(url).form(&form)).await?;

        if response.result != "ok" {
            return Err(CdnError::DeleteRejected {
                public_id: public_id.to_string(),
                result: response.result,
            });
        }

        tracing::info!(public_id = %public_id, "Cloudinary delete successful");
        Ok(())
    }
}

/// Request signature: parameters sorted by name, joined as `k=v&k=v`, secret
/// appended, SHA-1, lowercase hex.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recover the public id from a delivery URL.
///
/// `https://res.cloudinary.com/demo/image/upload/v1712/baitech/products/widget.jpg`
/// yields `baitech/products/widget`. A leading version segment is skipped.
pub fn extract_public_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/upload/")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);

    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .first()
        .map(|s| s.len() > 1 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
    {
        segments.remove(0);
    }

    let last = segments.pop()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => last,
    };
    segments.push(stem);

    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(server_url: &str) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("123456".to_string()),
            api_secret: Some("abcd".to_string()),
            api_base_url: server_url.to_string(),
            delivery_base_url: "https://res.cloudinary.com".to_string(),
            timeout: Duration::from_secs(5),
            ..CloudinaryConfig::unconfigured()
        }
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        assert_eq!(
            sign(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_preset_transformations() {
        assert_eq!(
            TransformationPreset::Thumbnail.transformation(None),
            "c_fill,f_auto,h_150,q_auto:good,w_150"
        );
        assert_eq!(
            TransformationPreset::Hero.transformation(Some("webp")),
            "c_fill,f_webp,h_1080,q_auto:best,w_1920"
        );
        assert_eq!(
            "LARGE".parse::<TransformationPreset>().unwrap(),
            TransformationPreset::Large
        );
    }

    #[test]
    fn test_build_url() {
        let client = CloudinaryClient::new(config("http://unused")).unwrap();
        assert_eq!(
            client
                .build_url("baitech/products/widget", TransformationPreset::Medium, None)
                .unwrap(),
            "https://res.cloudinary.com/demo/image/upload/c_limit,f_auto,h_600,q_auto:good,w_600/baitech/products/widget"
        );

        let unconfigured = CloudinaryClient::new(CloudinaryConfig::unconfigured()).unwrap();
        assert!(unconfigured
            .build_url("x", TransformationPreset::Medium, None)
            .is_none());
    }

    #[test]
    fn test_extract_public_id() {
        assert_eq!(
            extract_public_id(
                "https://res.cloudinary.com/demo/image/upload/v1712/baitech/products/widget.jpg"
            )
            .as_deref(),
            Some("baitech/products/widget")
        );
        assert_eq!(
            extract_public_id("https://res.cloudinary.com/demo/image/upload/sample.png?x=1")
                .as_deref(),
            Some("sample")
        );
        assert_eq!(extract_public_id("https://example.com/images/widget.jpg"), None);
    }

    #[tokio::test]
    async fn test_upload_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1_1/demo/image/upload")
            .match_body(mockito::Matcher::Regex("sample_widget".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "public_id": "baitech/products/sample_widget",
                    "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/baitech/products/sample_widget.jpg",
                    "url": "http://res.cloudinary.com/demo/image/upload/v1/baitech/products/sample_widget.jpg",
                    "format": "jpg",
                    "width": 800,
                    "height": 600,
                    "bytes": 12345
                }"#,
            )
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let image = client
            .upload(
                Bytes::from_static(b"fake"),
                "sample_widget.jpg",
                "sample_widget",
                "baitech/products",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(image.public_id, "baitech/products/sample_widget");
        assert_eq!(image.width, Some(800));
        assert_eq!(image.derived_urls.len(), 3);
        assert!(image
            .derived_url(SizeTag::Thumbnail)
            .unwrap()
            .contains("c_fill,f_auto,h_150"));
    }

    #[tokio::test]
    async fn test_upload_error_message_surfaces() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/upload")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"message":"Invalid Signature"}}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let err = client
            .upload(Bytes::from_static(b"x"), "a.jpg", "a", "f")
            .await
            .unwrap_err();

        match err {
            CdnError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_client_makes_no_request() {
        let client = CloudinaryClient::new(CloudinaryConfig::unconfigured()).unwrap();
        assert!(!client.is_configured());
        let err = client
            .upload(Bytes::from_static(b"x"), "a.jpg", "a", "f")
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::NotConfigured));
    }

    #[tokio::test]
    async fn test_delete_result_not_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/destroy")
            .with_status(200)
            .with_body(r#"{"result":"not found"}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let err = client.delete("baitech/products/missing").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_resource_metadata() {
        let mut server = mockito::Server::new_async().await;
        let lookup = server
            .mock("GET", "/v1_1/demo/resources/image/upload/baitech/products/widget")
            .match_header("authorization", "Basic MTIzNDU2OmFiY2Q=")
            .with_status(200)
            .with_body(
                r#"{"public_id":"baitech/products/widget","secure_url":"https://x/widget.jpg","format":"jpg","width":3000,"height":2000,"bytes":48213}"#,
            )
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let image = client.resource("baitech/products/widget").await.unwrap();

        lookup.assert_async().await;
        assert_eq!(image.public_id, "baitech/products/widget");
        assert_eq!((image.width, image.height), (Some(3000), Some(2000)));
        assert!(image.derived_urls.iter().all(|d| d.url.ends_with("/baitech/products/widget")));
        assert!(!image.derived_urls.is_empty());
    }

    #[tokio::test]
    async fn test_resource_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1_1/demo/resources/image/upload/baitech/products/missing")
            .with_status(404)
            .with_body(r#"{"error":{"message":"Resource not found - baitech/products/missing"}}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let err = client.resource("baitech/products/missing").await.unwrap_err();
        assert!(matches!(err, CdnError::Api { status: 404, .. }));
        assert!(err.to_string().contains("Resource not found"));
    }

    #[tokio::test]
    async fn test_list_folder() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1_1/demo/resources/image/upload")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("prefix".into(), "baitech/products".into()),
                mockito::Matcher::UrlEncoded("max_results".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"resources":[{"public_id":"baitech/products/a","secure_url":"https://x/a.jpg"}]}"#,
            )
            .create_async()
            .await;

        let client = CloudinaryClient::new(config(&server.url())).unwrap();
        let images = client.list_folder("baitech/products", 10).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].public_id, "baitech/products/a");
    }
}
